//! Multi-signature collection over mint authorizations
//!
//! Every authorization signer signs the same message concurrently. The join
//! is all-or-nothing: the first failure aborts the collection and the
//! remaining requests are dropped. Results come back in authorization set
//! order, which is ascending signer address, regardless of which signer
//! answered first.

use alloy::primitives::{Bytes, B256};
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::client::ChainClient;
use crate::error::RelayError;
use crate::identity::AuthorizationSet;
use crate::metrics;

/// Length of an `r‖s‖v` signature
const SIGNATURE_LEN: usize = 65;

/// Offset of the recovery byte in a 65-byte `r‖s‖v` signature
const RECOVERY_BYTE_INDEX: usize = 64;

/// Map a 0/1 recovery byte to 27/28; values >= 27 are left alone.
///
/// Some signers emit 0/1 and others 27/28. The minter only accepts 27/28.
pub fn normalize_recovery_byte(signature: &[u8]) -> Bytes {
    let mut bytes = signature.to_vec();
    if let Some(v) = bytes.get_mut(RECOVERY_BYTE_INDEX) {
        if *v < 27 {
            *v += 27;
        }
    }
    Bytes::from(bytes)
}

/// Collects one signature per authorization signer
pub struct SignatureCoordinator<C> {
    client: Arc<C>,
    signers: AuthorizationSet,
}

impl<C: ChainClient> SignatureCoordinator<C> {
    pub fn new(client: Arc<C>, signers: AuthorizationSet) -> Self {
        Self { client, signers }
    }

    pub fn signers(&self) -> &AuthorizationSet {
        &self.signers
    }

    /// Sign `message` with every authorization signer.
    ///
    /// Output index `i` is the signature of the `i`-th signer in ascending
    /// address order.
    pub async fn collect_signatures(&self, message: &B256) -> Result<Vec<Bytes>, RelayError> {
        let started = Instant::now();

        let requests = self.signers.iter().map(|identity| {
            let client = Arc::clone(&self.client);
            let signer = identity.address();
            async move {
                let signature = client
                    .sign_message(message.as_slice(), signer)
                    .await
                    .map_err(|e| RelayError::SignerFailure {
                        signer,
                        reason: e.to_string(),
                    })?;
                if signature.len() != SIGNATURE_LEN {
                    return Err(RelayError::SignerFailure {
                        signer,
                        reason: format!(
                            "expected {}-byte signature, got {}",
                            SIGNATURE_LEN,
                            signature.len()
                        ),
                    });
                }
                Ok::<_, RelayError>(normalize_recovery_byte(&signature))
            }
        });

        let signatures = try_join_all(requests).await?;

        metrics::SIGNATURE_COLLECTION_SECONDS.observe(started.elapsed().as_secs_f64());
        debug!(
            message = %message,
            signatures = signatures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Collected authorization signatures"
        );

        Ok(signatures)
    }
}
