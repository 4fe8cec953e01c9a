//! Relayer: build, sign, replace and broadcast relay transactions
//!
//! Every operation is a single attempt. Retry, escalation timing and
//! confirmation tracking belong to the caller, which polls
//! [`Relayer::get_transaction`] and [`Relayer::get_gas_price`] and decides
//! when to call [`Relayer::increase_gas_price`].
//!
//! Callers must not build two transactions with the same nonce. Either pass
//! nonces from a single writer or use [`Relayer::build_next`] /
//! [`Relayer::transfer_ownership_next`], which go through a
//! [`NonceSequencer`].

use alloy::primitives::{Address, B256};
use alloy::rpc::types::Transaction;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::builder::TransactionBuilder;
use crate::client::ChainClient;
use crate::error::RelayError;
use crate::gas::{exceeds_escalation_floor, minimum_replacement_price};
use crate::identity::SignerIdentitySet;
use crate::metrics;
use crate::nonce::NonceSequencer;
use crate::retry::classify_broadcast_error;
use crate::types::{RelayRecord, TransferIntent, UnsignedTransaction};

/// Default gas limit for `mint` calls (both paths)
pub const DEFAULT_MINT_GAS_LIMIT: u64 = 100_000;

/// Default gas limit for `transferOwnership`
pub const DEFAULT_TRANSFER_OWNERSHIP_GAS_LIMIT: u64 = 100_000;

/// Fixed gas limits per call type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasLimits {
    pub mint: u64,
    pub transfer_ownership: u64,
}

impl Default for GasLimits {
    fn default() -> Self {
        Self {
            mint: DEFAULT_MINT_GAS_LIMIT,
            transfer_ownership: DEFAULT_TRANSFER_OWNERSHIP_GAS_LIMIT,
        }
    }
}

/// Process-wide relay settings.
///
/// Built once at startup and shared read-only; identities are never rotated
/// while the process runs.
#[derive(Debug)]
pub struct RelayContext {
    identities: SignerIdentitySet,
    donation: Address,
    chain_id: u64,
    gas_limits: GasLimits,
}

impl RelayContext {
    pub fn new(
        identities: SignerIdentitySet,
        donation: Address,
        chain_id: u64,
        gas_limits: GasLimits,
    ) -> Self {
        Self {
            identities,
            donation,
            chain_id,
            gas_limits,
        }
    }

    pub fn identities(&self) -> &SignerIdentitySet {
        &self.identities
    }

    pub fn relayer_address(&self) -> Address {
        self.identities.relayer_address()
    }

    pub fn donation(&self) -> Address {
        self.donation
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn gas_limits(&self) -> GasLimits {
        self.gas_limits
    }
}

pub struct Relayer<C> {
    context: Arc<RelayContext>,
    client: Arc<C>,
    builder: TransactionBuilder<C>,
    sequencer: NonceSequencer,
}

impl<C: ChainClient> Relayer<C> {
    pub fn new(context: Arc<RelayContext>, client: Arc<C>) -> Self {
        let builder = TransactionBuilder::new(Arc::clone(&context), Arc::clone(&client));

        info!(
            relayer = %context.relayer_address(),
            signers = context.identities().authorization().len(),
            chain_id = context.chain_id(),
            "Relayer initialized"
        );

        Self {
            context,
            client,
            builder,
            sequencer: NonceSequencer::new(),
        }
    }

    pub fn context(&self) -> &RelayContext {
        &self.context
    }

    pub fn address(&self) -> Address {
        self.context.relayer_address()
    }

    pub fn sequencer(&self) -> &NonceSequencer {
        &self.sequencer
    }

    /// Pending transaction count of the relaying identity
    pub async fn load_nonce(&self) -> Result<u64, RelayError> {
        Ok(self
            .client
            .get_transaction_count(self.context.relayer_address())
            .await?)
    }

    /// Build and sign the mint transaction for `intent`
    pub async fn build(
        &self,
        intent: &TransferIntent,
        nonce: u64,
        minter_nonce: u64,
        gas_price: u128,
    ) -> Result<RelayRecord, RelayError> {
        let tx = self
            .builder
            .build_mint(intent, nonce, minter_nonce, gas_price)
            .await?;
        let record = self.sign(tx).await?;

        let path = if intent.is_multisig() {
            metrics::PATH_MULTISIG
        } else {
            metrics::PATH_DIRECT
        };
        metrics::RECORDS_BUILT.with_label_values(&[path]).inc();

        info!(
            source_tx = %intent.tx_hash,
            to = %record.transaction.to,
            nonce,
            gas_price,
            tx_hash = %record.tx_hash,
            path,
            "Built relay transaction"
        );
        Ok(record)
    }

    /// Build and sign `transferOwnership(new_owner)` on `token_contract`
    pub async fn transfer_ownership(
        &self,
        new_owner: Address,
        token_contract: Address,
        nonce: u64,
        gas_price: u128,
    ) -> Result<RelayRecord, RelayError> {
        let tx = self
            .builder
            .build_transfer_ownership(new_owner, token_contract, nonce, gas_price);
        let record = self.sign(tx).await?;

        metrics::RECORDS_BUILT
            .with_label_values(&[metrics::PATH_OWNERSHIP])
            .inc();

        info!(
            token = %token_contract,
            new_owner = %new_owner,
            nonce,
            gas_price,
            tx_hash = %record.tx_hash,
            "Built ownership transfer"
        );
        Ok(record)
    }

    /// [`Relayer::build`] with the nonce assigned by the internal sequencer
    pub async fn build_next(
        &self,
        intent: &TransferIntent,
        minter_nonce: u64,
        gas_price: u128,
    ) -> Result<RelayRecord, RelayError> {
        let pending = self.load_nonce().await?;
        self.sequencer
            .sequence(pending, |nonce| {
                self.build(intent, nonce, minter_nonce, gas_price)
            })
            .await
    }

    /// [`Relayer::transfer_ownership`] with the nonce assigned by the internal sequencer
    pub async fn transfer_ownership_next(
        &self,
        new_owner: Address,
        token_contract: Address,
        gas_price: u128,
    ) -> Result<RelayRecord, RelayError> {
        let pending = self.load_nonce().await?;
        self.sequencer
            .sequence(pending, |nonce| {
                self.transfer_ownership(new_owner, token_contract, nonce, gas_price)
            })
            .await
    }

    /// Replace `record` with a higher-priced copy if `target_gas_price`
    /// clears the escalation floor; otherwise hand `record` back untouched.
    ///
    /// The replacement keeps the nonce and gets a fresh signature, hash and
    /// timestamp.
    pub async fn increase_gas_price(
        &self,
        record: RelayRecord,
        target_gas_price: u128,
    ) -> Result<RelayRecord, RelayError> {
        let current = record.gas_price();
        if !exceeds_escalation_floor(current, target_gas_price) {
            metrics::ESCALATIONS.with_label_values(&["noop"]).inc();
            debug!(
                tx_hash = %record.tx_hash,
                current_gas_price = current,
                target_gas_price,
                minimum_gas_price = minimum_replacement_price(current),
                "Target gas price below escalation floor, keeping record"
            );
            return Ok(record);
        }

        let replaced_hash = record.tx_hash;
        let replacement = self
            .sign(record.transaction.with_gas_price(target_gas_price))
            .await?;

        metrics::ESCALATIONS.with_label_values(&["replaced"]).inc();
        info!(
            nonce = replacement.nonce(),
            old_gas_price = current,
            new_gas_price = target_gas_price,
            old_tx_hash = %replaced_hash,
            new_tx_hash = %replacement.tx_hash,
            "Escalated gas price"
        );
        Ok(replacement)
    }

    /// Broadcast the signed transaction; resolves with the hash the node reports
    pub async fn relay(&self, record: &RelayRecord) -> Result<B256, RelayError> {
        match self.client.send_raw_transaction(&record.signed_tx).await {
            Ok(hash) => {
                metrics::BROADCASTS.with_label_values(&["accepted"]).inc();
                if hash != record.tx_hash {
                    warn!(
                        expected = %record.tx_hash,
                        reported = %hash,
                        "Node reported a different transaction hash"
                    );
                }
                info!(tx_hash = %hash, nonce = record.nonce(), "Relayed transaction");
                Ok(hash)
            }
            Err(e) => {
                let message = e.to_string();
                let kind = classify_broadcast_error(&message);
                metrics::BROADCASTS.with_label_values(&[kind.as_str()]).inc();
                warn!(
                    tx_hash = %record.tx_hash,
                    nonce = record.nonce(),
                    kind = %kind,
                    escalate = kind.suggests_escalation(),
                    error = %message,
                    "Broadcast rejected"
                );
                Err(RelayError::BroadcastFailure { kind, message })
            }
        }
    }

    pub async fn get_gas_price(&self) -> Result<u128, RelayError> {
        Ok(self.client.get_gas_price().await?)
    }

    pub async fn get_transaction(&self, hash: B256) -> Result<Option<Transaction>, RelayError> {
        Ok(self.client.get_transaction(hash).await?)
    }

    async fn sign(&self, tx: UnsignedTransaction) -> Result<RelayRecord, RelayError> {
        let signed = self
            .client
            .sign_transaction(&tx)
            .await
            .map_err(|e| RelayError::SigningFailure {
                from: tx.from,
                reason: e.to_string(),
            })?;

        Ok(RelayRecord {
            transaction: tx,
            tx_hash: crate::hash::compute_tx_hash(&signed.raw),
            signed_tx: signed.raw,
            created_at: Utc::now(),
        })
    }
}
