//! Transaction building for mint and ownership calls
//!
//! A transfer with a minter reference goes through the minter contract with
//! the full authorization signature set. Without one, the wrapped token's
//! own `mint(to, amount)` is called directly by the relaying identity.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::client::ChainClient;
use crate::contracts::{Minter, WrappedToken};
use crate::error::RelayError;
use crate::hash::{compute_authorization_message, parse_source_tx_hash};
use crate::metrics;
use crate::relayer::RelayContext;
use crate::signatures::SignatureCoordinator;
use crate::types::{TransferIntent, UnsignedTransaction};

/// Source amounts carry 6 decimals, wrapped tokens 18
pub const AMOUNT_SCALE_DECIMALS: usize = 12;

/// Expand a source-chain amount to destination units (`amount * 10^12`).
///
/// Works on the decimal string so nothing is lost to floating point.
pub fn scale_amount(amount: &str) -> Result<U256, RelayError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RelayError::InvalidAmount(amount.to_string()));
    }

    let scaled = format!("{}{}", trimmed, "0".repeat(AMOUNT_SCALE_DECIMALS));
    U256::from_str_radix(&scaled, 10).map_err(|_| RelayError::InvalidAmount(amount.to_string()))
}

/// Parse an address using the usual wallet rules.
///
/// 40 hex digits, `0x` optional. All-lowercase and all-uppercase forms are
/// accepted as-is; mixed case must carry a valid EIP-55 checksum.
pub fn parse_address(value: &str) -> Option<Address> {
    let hex_part = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    if hex_part.len() != 40 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let has_lower = hex_part.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex_part.bytes().any(|b| b.is_ascii_uppercase());

    if has_lower && has_upper {
        Address::parse_checksummed(format!("0x{}", hex_part), None).ok()
    } else {
        Address::from_str(hex_part).ok()
    }
}

/// The transfer's recipient, or `donation` when it is not a valid address
pub fn resolve_recipient(to: &str, donation: Address) -> Address {
    match parse_address(to) {
        Some(address) => address,
        None => {
            warn!(
                recipient = %to,
                donation = %donation,
                "Invalid recipient address, redirecting to donation address"
            );
            metrics::DONATION_SUBSTITUTIONS.inc();
            donation
        }
    }
}

fn parse_contract(value: &str) -> Result<Address, RelayError> {
    parse_address(value).ok_or_else(|| RelayError::InvalidContractAddress(value.to_string()))
}

/// Encodes contract calls and assembles unsigned transactions
pub struct TransactionBuilder<C> {
    context: Arc<RelayContext>,
    coordinator: SignatureCoordinator<C>,
}

impl<C: ChainClient> TransactionBuilder<C> {
    pub fn new(context: Arc<RelayContext>, client: Arc<C>) -> Self {
        let coordinator =
            SignatureCoordinator::new(client, context.identities().authorization().clone());
        Self {
            context,
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &SignatureCoordinator<C> {
        &self.coordinator
    }

    /// Build the mint transaction for a transfer.
    ///
    /// `minter_nonce` only matters on the multi-sig path, where it is bound
    /// into the authorization message together with the source tx hash.
    pub async fn build_mint(
        &self,
        intent: &TransferIntent,
        nonce: u64,
        minter_nonce: u64,
        gas_price: u128,
    ) -> Result<UnsignedTransaction, RelayError> {
        let amount = scale_amount(&intent.amount)?;
        let token = parse_contract(&intent.contract_addr)?;
        let recipient = resolve_recipient(&intent.to, self.context.donation());

        let (to, input) = match &intent.minter_addr {
            Some(minter_addr) => {
                let minter = parse_contract(minter_addr)?;
                let source_tx_hash = parse_source_tx_hash(&intent.tx_hash)
                    .ok_or_else(|| RelayError::InvalidSourceTxHash(intent.tx_hash.clone()))?;

                let message = compute_authorization_message(minter_nonce, &source_tx_hash);
                let signatures = self.coordinator.collect_signatures(&message).await?;

                debug!(
                    minter = %minter,
                    token = %token,
                    minter_nonce,
                    signatures = signatures.len(),
                    "Encoding multi-sig mint"
                );

                let call = Minter::mintCall {
                    token,
                    to: recipient,
                    amount,
                    txHash: source_tx_hash,
                    signatures,
                };
                (minter, Bytes::from(call.abi_encode()))
            }
            None => {
                debug!(token = %token, "Encoding direct wrapped token mint");
                let call = WrappedToken::mintCall {
                    to: recipient,
                    amount,
                };
                (token, Bytes::from(call.abi_encode()))
            }
        };

        Ok(self.envelope(to, input, self.context.gas_limits().mint, nonce, gas_price))
    }

    /// Build `transferOwnership(new_owner)` on `token_contract`
    pub fn build_transfer_ownership(
        &self,
        new_owner: Address,
        token_contract: Address,
        nonce: u64,
        gas_price: u128,
    ) -> UnsignedTransaction {
        let call = WrappedToken::transferOwnershipCall {
            newOwner: new_owner,
        };
        self.envelope(
            token_contract,
            Bytes::from(call.abi_encode()),
            self.context.gas_limits().transfer_ownership,
            nonce,
            gas_price,
        )
    }

    fn envelope(
        &self,
        to: Address,
        input: Bytes,
        gas_limit: u64,
        nonce: u64,
        gas_price: u128,
    ) -> UnsignedTransaction {
        UnsignedTransaction {
            from: self.context.relayer_address(),
            to,
            value: U256::ZERO,
            gas_limit,
            gas_price,
            input,
            nonce,
            chain_id: self.context.chain_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{donation_address, test_context, MockChainClient, TEST_CHAIN_ID};
    use alloy::primitives::{address, B256};

    const TOKEN: &str = "0x00000000000000000000000000000000000000aa";
    const MINTER: &str = "0x00000000000000000000000000000000000000bb";

    fn builder(signer_indexes: &[u32]) -> (TransactionBuilder<MockChainClient>, MockChainClient) {
        let context = test_context(signer_indexes);
        let client = MockChainClient::new(context.identities());
        (
            TransactionBuilder::new(context, Arc::new(client.clone())),
            client,
        )
    }

    fn intent(to: &str, minter: Option<&str>) -> TransferIntent {
        TransferIntent {
            to: to.to_string(),
            amount: "5".to_string(),
            contract_addr: TOKEN.to_string(),
            minter_addr: minter.map(str::to_string),
            tx_hash: "AB".repeat(32),
        }
    }

    #[test]
    fn test_scale_amount_exact() {
        assert_eq!(scale_amount("5").unwrap(), U256::from(5_000_000_000_000u64));
        assert_eq!(scale_amount("0").unwrap(), U256::ZERO);
        assert_eq!(
            scale_amount("123456789012345678901234567890").unwrap(),
            U256::from_str_radix("123456789012345678901234567890000000000000", 10).unwrap()
        );
    }

    #[test]
    fn test_scale_amount_rejects_non_integers() {
        for bad in ["", "5.5", "-1", "0x10", "1e6", "abc"] {
            assert!(
                matches!(scale_amount(bad), Err(RelayError::InvalidAmount(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_scale_amount_overflow() {
        let huge = "9".repeat(70);
        assert!(scale_amount(&huge).is_err());
    }

    #[test]
    fn test_parse_address_rules() {
        let lower = "0x742d35cc6634c0532925a3b844bc454e4438f44e";
        let upper = "0x742D35CC6634C0532925A3B844BC454E4438F44E";
        let checksummed = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
        let bad_checksum = "0x742d35cC6634C0532925a3b844Bc454e4438f44e";

        let expected = address!("742d35cc6634c0532925a3b844bc454e4438f44e");
        assert_eq!(parse_address(lower), Some(expected));
        assert_eq!(parse_address(upper), Some(expected));
        assert_eq!(parse_address(checksummed), Some(expected));
        assert_eq!(parse_address(&lower[2..]), Some(expected));
        assert_eq!(parse_address(bad_checksum), None);
        assert_eq!(parse_address("0xInvalidAddr"), None);
        assert_eq!(parse_address("terra1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq"), None);
        assert_eq!(parse_address(""), None);
    }

    #[test]
    fn test_resolve_recipient_falls_back_to_donation() {
        let donation = donation_address();
        assert_eq!(resolve_recipient("0xInvalidAddr", donation), donation);
        assert_eq!(
            resolve_recipient("0x742d35cc6634c0532925a3b844bc454e4438f44e", donation),
            address!("742d35cc6634c0532925a3b844bc454e4438f44e")
        );
    }

    #[tokio::test]
    async fn test_direct_mint_with_invalid_recipient() {
        let (builder, client) = builder(&[1, 2]);
        let tx = builder
            .build_mint(&intent("0xInvalidAddr", None), 4, 0, 100)
            .await
            .unwrap();

        assert_eq!(tx.to, address!("00000000000000000000000000000000000000aa"));
        assert_eq!(tx.value, U256::ZERO);
        assert_eq!(tx.nonce, 4);
        assert_eq!(tx.gas_price, 100);
        assert_eq!(tx.gas_limit, 100_000);
        assert_eq!(tx.chain_id, TEST_CHAIN_ID);

        let call = WrappedToken::mintCall::abi_decode(&tx.input, true).unwrap();
        assert_eq!(call.to, donation_address());
        assert_eq!(call.amount, U256::from(5_000_000_000_000u64));

        // Direct path never asks signers
        assert_eq!(client.message_sign_calls(), 0);
    }

    #[tokio::test]
    async fn test_multisig_mint_carries_ordered_signatures() {
        let (builder, _client) = builder(&[3, 1, 2]);
        let recipient = "0x742d35cc6634c0532925a3b844bc454e4438f44e";
        let tx = builder
            .build_mint(&intent(recipient, Some(MINTER)), 9, 17, 100)
            .await
            .unwrap();

        assert_eq!(tx.to, address!("00000000000000000000000000000000000000bb"));

        let call = Minter::mintCall::abi_decode(&tx.input, true).unwrap();
        assert_eq!(call.token, address!("00000000000000000000000000000000000000aa"));
        assert_eq!(call.to, address!("742d35cc6634c0532925a3b844bc454e4438f44e"));
        assert_eq!(call.amount, U256::from(5_000_000_000_000u64));
        assert_eq!(call.txHash, B256::repeat_byte(0xab));
        assert_eq!(call.signatures.len(), 3);

        let message = compute_authorization_message(17, &B256::repeat_byte(0xab));
        let signers = builder.coordinator().signers().addresses();
        for (signature, expected) in call.signatures.iter().zip(&signers) {
            let parsed =
                alloy::primitives::PrimitiveSignature::try_from(signature.as_ref()).unwrap();
            assert_eq!(
                parsed.recover_address_from_msg(message.as_slice()).unwrap(),
                *expected
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_contract_is_an_error() {
        let (builder, _client) = builder(&[]);
        let mut bad = intent("0xInvalidAddr", None);
        bad.contract_addr = "not-a-contract".to_string();

        assert!(matches!(
            builder.build_mint(&bad, 0, 0, 1).await,
            Err(RelayError::InvalidContractAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_source_hash_on_multisig_path() {
        let (builder, client) = builder(&[1]);
        let mut bad = intent("0xInvalidAddr", Some(MINTER));
        bad.tx_hash = "1234".to_string();

        assert!(matches!(
            builder.build_mint(&bad, 0, 0, 1).await,
            Err(RelayError::InvalidSourceTxHash(_))
        ));
        assert_eq!(client.message_sign_calls(), 0);
    }

    #[test]
    fn test_transfer_ownership_encoding() {
        let (builder, _client) = builder(&[]);
        let new_owner = Address::repeat_byte(0x0b);
        let token = Address::repeat_byte(0x0a);

        let tx = builder.build_transfer_ownership(new_owner, token, 2, 50);
        assert_eq!(tx.to, token);
        assert_eq!(tx.gas_limit, 100_000);

        let call = WrappedToken::transferOwnershipCall::abi_decode(&tx.input, true).unwrap();
        assert_eq!(call.newOwner, new_owner);
    }
}
