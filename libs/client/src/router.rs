use dashmap::DashMap;
use rand::Rng;

use lodestar_core::{Error, Result};

/// Selection strategy over a service's connected providers.
///
/// The variant is resolved once from configuration and lives for the
/// runtime's lifetime. Selection never blocks and never mutates the
/// candidate set.
#[derive(Debug)]
pub enum Router {
    /// Uniform random pick, independent across calls.
    Random,
    /// Per-service rotation with a persistent cursor.
    RoundRobin { cursors: DashMap<String, Cursor> },
}

/// Rotation state for one service.
#[derive(Debug, Default, Clone, Copy)]
pub struct Cursor {
    next: usize,
    seen_len: usize,
}

impl Router {
    pub fn random() -> Self {
        Self::Random
    }

    pub fn round_robin() -> Self {
        Self::RoundRobin {
            cursors: DashMap::new(),
        }
    }

    /// Pick one candidate for `service`.
    ///
    /// Fails with `NoAvailableProvider` on an empty set. The round-robin
    /// cursor persists across calls for a service and resets whenever
    /// the candidate count changes, so a membership change starts a
    /// fresh cycle instead of carrying a stale index.
    pub fn select<'a, T>(&self, service: &str, candidates: &'a [T]) -> Result<&'a T> {
        if candidates.is_empty() {
            return Err(Error::no_available_provider(service));
        }

        let index = match self {
            Self::Random => rand::thread_rng().gen_range(0..candidates.len()),
            Self::RoundRobin { cursors } => {
                let mut cursor = cursors.entry(service.to_string()).or_default();
                if cursor.seen_len != candidates.len() {
                    *cursor = Cursor {
                        next: 0,
                        seen_len: candidates.len(),
                    };
                }
                let index = cursor.next;
                cursor.next = (cursor.next + 1) % candidates.len();
                index
            }
        };

        Ok(&candidates[index])
    }
}
