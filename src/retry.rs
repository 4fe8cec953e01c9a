//! Broadcast rejection classification
//!
//! The relayer never retries on its own. It tags each rejected broadcast with
//! a kind so the external scheduler can pick between escalating the gas
//! price, dropping the record, or backing off.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a node rejected a signed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastErrorKind {
    /// Nonce already used (the transaction or a replacement was mined)
    NonceTooLow,
    /// Gas price too low, including underpriced replacements
    Underpriced,
    /// Relaying identity cannot cover gas
    InsufficientFunds,
    /// Network trouble talking to the node
    Transient,
    /// Anything else the node refused
    Rejected,
}

impl BroadcastErrorKind {
    /// True when a higher gas price could get the transaction accepted
    pub fn suggests_escalation(&self) -> bool {
        matches!(self, BroadcastErrorKind::Underpriced)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastErrorKind::NonceTooLow => "nonce_too_low",
            BroadcastErrorKind::Underpriced => "underpriced",
            BroadcastErrorKind::InsufficientFunds => "insufficient_funds",
            BroadcastErrorKind::Transient => "transient",
            BroadcastErrorKind::Rejected => "rejected",
        }
    }
}

impl fmt::Display for BroadcastErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a node's rejection message
pub fn classify_broadcast_error(error: &str) -> BroadcastErrorKind {
    let error_lower = error.to_lowercase();

    if error_lower.contains("nonce too low")
        || error_lower.contains("already known")
        || error_lower.contains("known transaction")
    {
        return BroadcastErrorKind::NonceTooLow;
    }

    if error_lower.contains("underpriced")
        || error_lower.contains("replacement transaction")
        || error_lower.contains("gas price too low")
        || error_lower.contains("fee too low")
    {
        return BroadcastErrorKind::Underpriced;
    }

    if error_lower.contains("insufficient funds") {
        return BroadcastErrorKind::InsufficientFunds;
    }

    if error_lower.contains("timeout")
        || error_lower.contains("timed out")
        || error_lower.contains("connection")
        || error_lower.contains("rate limit")
        || error_lower.contains("too many requests")
        || error_lower.contains("503")
        || error_lower.contains("502")
    {
        return BroadcastErrorKind::Transient;
    }

    BroadcastErrorKind::Rejected
}
