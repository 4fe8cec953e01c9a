//! Single-writer nonce sequencing
//!
//! The relayer itself keeps no nonce state. Two builds that read the same
//! pending nonce would produce colliding transactions, so callers that build
//! concurrently go through a `NonceSequencer`: it serializes nonce
//! acquisition with building and remembers the next nonce it handed out,
//! since a built but not yet broadcast transaction is invisible to the
//! node's pending count.

use std::future::Future;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
pub struct NonceSequencer {
    next: Mutex<Option<u64>>,
}

impl NonceSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `build` with the next nonce while holding the sequencer.
    ///
    /// The nonce used is `max(pending, local next)`. It is consumed only if
    /// `build` succeeds.
    pub async fn sequence<T, E, F, Fut>(&self, pending: u64, build: F) -> Result<T, E>
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut next = self.next.lock().await;
        let nonce = match *next {
            Some(local) => local.max(pending),
            None => pending,
        };

        let result = build(nonce).await;
        if result.is_ok() {
            *next = Some(nonce + 1);
            debug!(nonce, "Nonce consumed");
        }
        result
    }

    /// Forget local state; the next build uses the chain's pending nonce.
    ///
    /// Call after a sequenced transaction is abandoned without broadcast.
    pub async fn reset(&self) {
        *self.next.lock().await = None;
    }

    /// Next nonce this sequencer would hand out, if it has one
    pub async fn peek(&self) -> Option<u64> {
        *self.next.lock().await
    }
}
