//! Relay error kinds
//!
//! An invalid recipient is not represented here: it is recovered by donation
//! substitution inside the builder. A below-floor escalation is not an error
//! either; the unchanged record is returned.

use alloy::primitives::Address;
use thiserror::Error;

use crate::client::ClientError;
use crate::retry::BroadcastErrorKind;

#[derive(Debug, Error)]
pub enum RelayError {
    /// An authorization signer failed; no partial signature set is returned
    #[error("authorization signer {signer} failed: {reason}")]
    SignerFailure { signer: Address, reason: String },

    /// The chain client refused to sign the transaction
    #[error("failed to sign transaction from {from}: {reason}")]
    SigningFailure { from: Address, reason: String },

    /// The node rejected the signed transaction
    #[error("broadcast rejected ({kind}): {message}")]
    BroadcastFailure {
        kind: BroadcastErrorKind,
        message: String,
    },

    /// RPC read failed (nonce, gas price, transaction lookup)
    #[error("rpc error: {0}")]
    Rpc(ClientError),

    #[error("invalid amount {0:?}: expected a non-negative decimal integer")]
    InvalidAmount(String),

    #[error("invalid source transaction hash {0:?}")]
    InvalidSourceTxHash(String),

    #[error("invalid contract address {0:?}")]
    InvalidContractAddress(String),
}

impl RelayError {
    /// Broadcast rejection kind, if this is a broadcast failure
    pub fn broadcast_kind(&self) -> Option<BroadcastErrorKind> {
        match self {
            RelayError::BroadcastFailure { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<ClientError> for RelayError {
    fn from(err: ClientError) -> Self {
        RelayError::Rpc(err)
    }
}
