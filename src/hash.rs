//! Hashing for mint authorizations and signed transactions
//!
//! The authorization message must match what the minter contract recomputes:
//! ```solidity
//! keccak256(abi.encodePacked(uint256 minterNonce, bytes32 txHash))
//! ```

use alloy::primitives::B256;
use tiny_keccak::{Hasher, Keccak};

/// Compute keccak256 hash of data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Compute the mint authorization message each signer signs.
pub fn compute_authorization_message(minter_nonce: u64, source_tx_hash: &B256) -> B256 {
    // abi.encodePacked layout: 32 (uint256) + 32 (bytes32) = 64 bytes
    let mut data = [0u8; 64];

    // minterNonce (uint256, big-endian, left padded)
    data[24..32].copy_from_slice(&minter_nonce.to_be_bytes());

    // txHash (bytes32)
    data[32..64].copy_from_slice(source_tx_hash.as_slice());

    B256::from(keccak256(&data))
}

/// Hash of a signed raw transaction, as the node reports it
pub fn compute_tx_hash(raw: &[u8]) -> B256 {
    B256::from(keccak256(raw))
}

/// Parse a source-chain transaction hash.
///
/// Terra reports hashes as bare uppercase hex; a `0x` prefix is tolerated.
pub fn parse_source_tx_hash(tx_hash: &str) -> Option<B256> {
    let trimmed = tx_hash.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if stripped.len() != 64 {
        return None;
    }

    let bytes = hex::decode(stripped).ok()?;
    Some(B256::from_slice(&bytes))
}
