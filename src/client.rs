//! Destination chain client
//!
//! `ChainClient` is the capability boundary between the relay core and the
//! chain: nonce and gas price reads, transaction and message signing,
//! broadcasting, and transaction lookup. `EvmChainClient` implements it with
//! an alloy HTTP provider and a local keyring holding every derived identity.
//!
//! No call retries internally. Each RPC call is bounded by the configured
//! timeout.

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::Transaction;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::IntoFuture;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::hash::compute_tx_hash;
use crate::identity::SignerIdentitySet;
use crate::types::{SignedTransaction, UnsignedTransaction};

/// Errors surfaced by a `ChainClient`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("rpc call {method} failed: {message}")]
    Rpc { method: &'static str, message: String },

    #[error("rpc call {method} timed out after {timeout:?}")]
    Timeout {
        method: &'static str,
        timeout: Duration,
    },

    #[error("no key held for {0}")]
    UnknownSigner(Address),

    #[error("signing failed: {0}")]
    Signing(String),

    /// The node refused a raw transaction
    #[error("{0}")]
    Rejected(String),
}

/// Destination chain capabilities consumed by the relayer
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Transaction count of `address` including pending transactions
    async fn get_transaction_count(&self, address: Address) -> Result<u64, ClientError>;

    async fn get_gas_price(&self) -> Result<u128, ClientError>;

    /// Sign `tx` with the key of `tx.from`
    async fn sign_transaction(
        &self,
        tx: &UnsignedTransaction,
    ) -> Result<SignedTransaction, ClientError>;

    /// EIP-191 personal signature of `message` by `signer`, as 65 bytes `r‖s‖v`
    async fn sign_message(&self, message: &[u8], signer: Address) -> Result<Bytes, ClientError>;

    /// Broadcast a signed transaction; resolves once the node returns its hash
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ClientError>;

    async fn get_transaction(&self, hash: B256) -> Result<Option<Transaction>, ClientError>;
}

/// Keys by address, like a wallet provider's account list
#[derive(Clone, Default)]
pub struct Keyring {
    keys: HashMap<Address, PrivateKeySigner>,
}

impl Keyring {
    pub fn from_identities(identities: &SignerIdentitySet) -> Self {
        let keys = identities
            .all()
            .map(|identity| (identity.address(), identity.signer().clone()))
            .collect();
        Self { keys }
    }

    pub fn get(&self, address: &Address) -> Result<&PrivateKeySigner, ClientError> {
        self.keys
            .get(address)
            .ok_or(ClientError::UnknownSigner(*address))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sign a legacy transaction locally and RLP-encode it
    pub fn sign_transaction(
        &self,
        tx: &UnsignedTransaction,
    ) -> Result<SignedTransaction, ClientError> {
        let signer = self.get(&tx.from)?;

        let mut unsigned = TxLegacy::from(tx);
        let signature = signer
            .sign_transaction_sync(&mut unsigned)
            .map_err(|e| ClientError::Signing(format!("Failed to sign transaction: {}", e)))?;

        let envelope = TxEnvelope::from(unsigned.into_signed(signature));
        let raw = envelope.encoded_2718();
        let hash = compute_tx_hash(&raw);

        Ok(SignedTransaction {
            raw: Bytes::from(raw),
            hash,
        })
    }

    /// EIP-191 personal signature by `signer`
    pub fn sign_message(&self, message: &[u8], signer: Address) -> Result<Bytes, ClientError> {
        let key = self.get(&signer)?;
        let signature = key
            .sign_message_sync(message)
            .map_err(|e| ClientError::Signing(format!("Failed to sign message: {}", e)))?;

        Ok(Bytes::copy_from_slice(&signature.as_bytes()))
    }
}

/// `ChainClient` over an alloy HTTP provider with local keys
pub struct EvmChainClient {
    provider: RootProvider<Http<Client>>,
    keyring: Keyring,
    chain_id: u64,
    timeout: Duration,
}

impl EvmChainClient {
    pub fn new(
        rpc_url: &str,
        chain_id: u64,
        identities: &SignerIdentitySet,
        timeout: Duration,
    ) -> eyre::Result<Self> {
        let provider = ProviderBuilder::new().on_http(
            rpc_url
                .parse()
                .map_err(|e| eyre::eyre!("Invalid RPC URL: {}", e))?,
        );
        let keyring = Keyring::from_identities(identities);

        info!(
            rpc_url = %rpc_url,
            chain_id = chain_id,
            keys = keyring.len(),
            "Created EVM chain client"
        );

        Ok(Self {
            provider,
            keyring,
            chain_id,
            timeout,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Chain id reported by the node, for a startup sanity check
    pub async fn get_chain_id(&self) -> Result<u64, ClientError> {
        self.with_timeout("eth_chainId", self.provider.get_chain_id())
            .await
    }

    async fn with_timeout<T, E, F>(&self, method: &'static str, call: F) -> Result<T, ClientError>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ClientError::Rpc {
                method,
                message: e.to_string(),
            }),
            Err(_) => Err(ClientError::Timeout {
                method,
                timeout: self.timeout,
            }),
        }
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    async fn get_transaction_count(&self, address: Address) -> Result<u64, ClientError> {
        let nonce = self
            .with_timeout(
                "eth_getTransactionCount",
                self.provider.get_transaction_count(address).pending(),
            )
            .await?;
        debug!(address = %address, nonce, "Loaded pending nonce");
        Ok(nonce)
    }

    async fn get_gas_price(&self) -> Result<u128, ClientError> {
        self.with_timeout("eth_gasPrice", self.provider.get_gas_price())
            .await
    }

    async fn sign_transaction(
        &self,
        tx: &UnsignedTransaction,
    ) -> Result<SignedTransaction, ClientError> {
        if tx.chain_id != self.chain_id {
            return Err(ClientError::Signing(format!(
                "transaction chain id {} does not match client chain id {}",
                tx.chain_id, self.chain_id
            )));
        }
        self.keyring.sign_transaction(tx)
    }

    async fn sign_message(&self, message: &[u8], signer: Address) -> Result<Bytes, ClientError> {
        self.keyring.sign_message(message, signer)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ClientError> {
        match tokio::time::timeout(self.timeout, self.provider.send_raw_transaction(raw)).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => Err(ClientError::Rejected(e.to_string())),
            Err(_) => Err(ClientError::Timeout {
                method: "eth_sendRawTransaction",
                timeout: self.timeout,
            }),
        }
    }

    async fn get_transaction(&self, hash: B256) -> Result<Option<Transaction>, ClientError> {
        self.with_timeout(
            "eth_getTransactionByHash",
            self.provider.get_transaction_by_hash(hash),
        )
        .await
    }
}
