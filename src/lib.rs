//! Bridge Relayer: Terra → EVM wrapped token relay
//!
//! Turns confirmed source-chain transfers into signed mint transactions on a
//! destination EVM chain:
//!
//! - **Identity** - Relaying identity and the ordered authorization signer set
//! - **Client** - Destination chain RPC and signing capability
//! - **Signatures** - Concurrent multi-signature collection over mint authorizations
//! - **Builder** - Contract call encoding and unsigned transaction assembly
//! - **Relayer** - Build, sign, replace (gas escalation) and broadcast
//!
//! Event ingestion, persistence of relay records and retry scheduling live
//! outside this crate; callers drive the [`Relayer`] directly.

pub mod builder;
pub mod client;
pub mod config;
pub mod contracts;
pub mod error;
pub mod gas;
pub mod hash;
pub mod identity;
pub mod metrics;
pub mod networks;
pub mod nonce;
pub mod relayer;
pub mod retry;
pub mod signatures;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{resolve_recipient, scale_amount, TransactionBuilder};
pub use client::{ChainClient, ClientError, EvmChainClient};
pub use config::Config;
pub use error::RelayError;
pub use identity::{AuthorizationSet, SignerIdentity, SignerIdentitySet};
pub use networks::Network;
pub use nonce::NonceSequencer;
pub use relayer::{RelayContext, Relayer};
pub use retry::BroadcastErrorKind;
pub use signatures::SignatureCoordinator;
pub use types::{RelayRecord, SignedTransaction, TransferIntent, UnsignedTransaction};
