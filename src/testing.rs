//! Test helpers: deterministic identities and an in-memory chain client

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::Transaction;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::{ChainClient, ClientError, Keyring};
use crate::identity::SignerIdentitySet;
use crate::relayer::{GasLimits, RelayContext};
use crate::types::{SignedTransaction, UnsignedTransaction};

/// Hardhat/Anvil development mnemonic
pub const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";

pub const TEST_CHAIN_ID: u64 = 31337;

pub fn donation_address() -> Address {
    Address::repeat_byte(0xd0)
}

/// Relayer at index 0, authorization signers at `signer_indexes`
pub fn test_identities(signer_indexes: &[u32]) -> SignerIdentitySet {
    SignerIdentitySet::from_mnemonic(TEST_MNEMONIC, 0, signer_indexes).unwrap()
}

pub fn test_context(signer_indexes: &[u32]) -> Arc<RelayContext> {
    Arc::new(RelayContext::new(
        test_identities(signer_indexes),
        donation_address(),
        TEST_CHAIN_ID,
        GasLimits::default(),
    ))
}

pub fn unsigned_fixture(from: Address) -> UnsignedTransaction {
    UnsignedTransaction {
        from,
        to: Address::repeat_byte(0x22),
        value: U256::ZERO,
        gas_limit: 100_000,
        gas_price: 100,
        input: Bytes::from_static(&[0x40, 0xc1, 0x0f, 0x19]),
        nonce: 3,
        chain_id: TEST_CHAIN_ID,
    }
}

#[derive(Default)]
struct MockState {
    nonce: u64,
    gas_price: u128,
    sent: Vec<Bytes>,
    sign_calls: usize,
    broadcast_error: Option<String>,
    fail_transaction_signing: bool,
}

/// In-memory `ChainClient` signing with real local keys
#[derive(Clone)]
pub struct MockChainClient {
    keyring: Keyring,
    delays: HashMap<Address, Duration>,
    failing_signers: HashSet<Address>,
    truncating_signers: HashSet<Address>,
    low_recovery_byte: bool,
    state: Arc<Mutex<MockState>>,
}

impl MockChainClient {
    pub fn new(identities: &SignerIdentitySet) -> Self {
        Self {
            keyring: Keyring::from_identities(identities),
            delays: HashMap::new(),
            failing_signers: HashSet::new(),
            truncating_signers: HashSet::new(),
            low_recovery_byte: false,
            state: Arc::new(Mutex::new(MockState {
                gas_price: 1_000_000_000,
                ..Default::default()
            })),
        }
    }

    /// Delay `signer`'s message signature by `delay`
    pub fn with_delay(mut self, signer: Address, delay: Duration) -> Self {
        self.delays.insert(signer, delay);
        self
    }

    pub fn with_failing_signer(mut self, signer: Address) -> Self {
        self.failing_signers.insert(signer);
        self
    }

    /// Have `signer` answer with a 10-byte blob instead of a signature
    pub fn with_truncated_signature(mut self, signer: Address) -> Self {
        self.truncating_signers.insert(signer);
        self
    }

    /// Return recovery bytes as 0/1 (ganache style) instead of 27/28
    pub fn with_low_recovery_byte(mut self) -> Self {
        self.low_recovery_byte = true;
        self
    }

    pub fn set_nonce(&self, nonce: u64) {
        self.state.lock().unwrap().nonce = nonce;
    }

    pub fn set_gas_price(&self, gas_price: u128) {
        self.state.lock().unwrap().gas_price = gas_price;
    }

    pub fn reject_broadcasts(&self, message: &str) {
        self.state.lock().unwrap().broadcast_error = Some(message.to_string());
    }

    pub fn fail_transaction_signing(&self) {
        self.state.lock().unwrap().fail_transaction_signing = true;
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn message_sign_calls(&self) -> usize {
        self.state.lock().unwrap().sign_calls
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn get_transaction_count(&self, _address: Address) -> Result<u64, ClientError> {
        Ok(self.state.lock().unwrap().nonce)
    }

    async fn get_gas_price(&self) -> Result<u128, ClientError> {
        Ok(self.state.lock().unwrap().gas_price)
    }

    async fn sign_transaction(
        &self,
        tx: &UnsignedTransaction,
    ) -> Result<SignedTransaction, ClientError> {
        if self.state.lock().unwrap().fail_transaction_signing {
            return Err(ClientError::Signing("malformed transaction".to_string()));
        }
        self.keyring.sign_transaction(tx)
    }

    async fn sign_message(&self, message: &[u8], signer: Address) -> Result<Bytes, ClientError> {
        self.state.lock().unwrap().sign_calls += 1;

        if let Some(delay) = self.delays.get(&signer) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_signers.contains(&signer) {
            return Err(ClientError::Signing(format!("{} is offline", signer)));
        }

        if self.truncating_signers.contains(&signer) {
            return Ok(Bytes::from(vec![0u8; 10]));
        }

        let signature = self.keyring.sign_message(message, signer)?;
        if self.low_recovery_byte {
            let mut bytes = signature.to_vec();
            bytes[64] -= 27;
            return Ok(Bytes::from(bytes));
        }
        Ok(signature)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ClientError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.broadcast_error {
            return Err(ClientError::Rejected(message.clone()));
        }
        state.sent.push(Bytes::copy_from_slice(raw));
        Ok(crate::hash::compute_tx_hash(raw))
    }

    async fn get_transaction(&self, _hash: B256) -> Result<Option<Transaction>, ClientError> {
        Ok(None)
    }
}
