//! In-flight call table.
//!
//! Pairs each outstanding invocation id with the channel that unblocks
//! its caller. Removal from the table is the atomic decision point for
//! a response racing a deadline: whichever side takes the entry acts;
//! the loser finds nothing and is a no-op.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::debug;

use lodestar_core::{Error, Response};

/// What a caller eventually receives for one invocation.
pub type CallOutcome = Result<Response, Error>;

#[derive(Debug)]
struct PendingCall {
    tx: oneshot::Sender<CallOutcome>,
}

/// Table of calls awaiting a response, keyed by invocation id.
#[derive(Debug)]
pub struct CorrelationRegistry {
    pending: DashMap<u64, PendingCall>,
    next_id: AtomicU64,
}

impl CorrelationRegistry {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate a process-unique invocation id.
    ///
    /// The counter is monotonic for the runtime's lifetime, so an id is
    /// never reused while a pending entry for it exists.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Park a caller until the outcome for `id` arrives.
    pub fn register(&self, id: u64) -> oneshot::Receiver<CallOutcome> {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, PendingCall { tx });
        rx
    }

    /// Deliver a wire response to whoever is waiting on its id.
    ///
    /// Returns false if no entry was pending: the call already expired,
    /// or the id was never ours. Such late responses are dropped.
    pub fn resolve(&self, response: Response) -> bool {
        match self.pending.remove(&response.id) {
            Some((_, call)) => {
                // The receiver may have been dropped already; delivery
                // is best-effort once the entry is claimed.
                let _ = call.tx.send(Ok(response));
                true
            }
            None => {
                debug!(id = response.id, "dropping response with no pending call");
                false
            }
        }
    }

    /// Fail a single pending call locally.
    pub fn fail(&self, id: u64, error: Error) {
        if let Some((_, call)) = self.pending.remove(&id) {
            let _ = call.tx.send(Err(error));
        }
    }

    /// Drop the entry for a call whose deadline elapsed.
    ///
    /// Returns false if a response claimed the entry first.
    pub fn expire(&self, id: u64) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Number of calls currently awaiting a response.
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }
}

impl Default for CorrelationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
