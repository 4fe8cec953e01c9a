//! Relay data types
//!
//! `TransferIntent` is what the monitoring feed hands us, `UnsignedTransaction`
//! is the envelope before signing, and `RelayRecord` is one signed relay attempt.

use alloy::consensus::TxLegacy;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A confirmed source-chain transfer to be relayed.
///
/// Field names follow the monitoring feed's JSON records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferIntent {
    /// Recipient on the destination chain (not validated by the feed)
    pub to: String,
    /// Amount in source-chain units, decimal integer string
    pub amount: String,
    /// Wrapped token contract on the destination chain
    pub contract_addr: String,
    /// Minter contract; when set, the mint goes through multi-sig authorization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minter_addr: Option<String>,
    /// Source-chain transaction hash (hex, `0x` prefix optional)
    pub tx_hash: String,
}

impl TransferIntent {
    /// Whether this transfer takes the multi-sig minter path
    pub fn is_multisig(&self) -> bool {
        self.minter_addr.is_some()
    }
}

/// Unsigned legacy (EIP-155) transaction envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub input: Bytes,
    pub nonce: u64,
    pub chain_id: u64,
}

impl UnsignedTransaction {
    /// Same transaction with a different gas price (replacement)
    pub fn with_gas_price(&self, gas_price: u128) -> Self {
        Self {
            gas_price,
            ..self.clone()
        }
    }
}

impl From<&UnsignedTransaction> for TxLegacy {
    fn from(tx: &UnsignedTransaction) -> Self {
        TxLegacy {
            chain_id: Some(tx.chain_id),
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            to: TxKind::Call(tx.to),
            value: tx.value,
            input: tx.input.clone(),
        }
    }
}

/// Output of signing an `UnsignedTransaction`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// RLP-encoded signed transaction
    pub raw: Bytes,
    /// keccak256 of `raw`
    pub hash: B256,
}

/// One signed relay attempt.
///
/// Escalation produces a new record for the same nonce; the previous one is
/// consumed rather than mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRecord {
    pub transaction: UnsignedTransaction,
    pub signed_tx: Bytes,
    pub tx_hash: B256,
    pub created_at: DateTime<Utc>,
}

impl RelayRecord {
    pub fn nonce(&self) -> u64 {
        self.transaction.nonce
    }

    pub fn gas_price(&self) -> u128 {
        self.transaction.gas_price
    }
}
