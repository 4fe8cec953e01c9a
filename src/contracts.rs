//! Destination contract ABI definitions
//!
//! Uses alloy's sol! macro to generate call encoders for the minter
//! (multi-sig verifier) and the wrapped token contracts.

use alloy::sol;

sol! {
    /// Bridge minter: verifies the ordered signer set before minting
    interface Minter {
        /// Mint `amount` of `token` to `to` for source transfer `txHash`.
        /// `signatures` must be ordered by ascending signer address.
        function mint(
            address token,
            address to,
            uint256 amount,
            bytes32 txHash,
            bytes[] signatures
        ) external;
    }

    /// Wrapped token, mintable by its owner
    interface WrappedToken {
        function mint(address to, uint256 amount) external;

        function transferOwnership(address newOwner) external;
    }
}
