//! Outgoing invocation pipeline.
//!
//! Callers enqueue invocations; a single worker drains them in FIFO
//! order, resolves the target connection, serializes, and hands the
//! payload to that connection's write queue. Ordering holds per
//! connection, not across connections or services.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use lodestar_core::{Error, Invocation};
use lodestar_fabric::serializer::Serializer;

use crate::correlation::CorrelationRegistry;
use crate::pool::ConnectionPool;

pub(crate) fn spawn(
    mut queue: mpsc::Receiver<Invocation>,
    pool: Arc<ConnectionPool>,
    serializer: Serializer,
    correlation: Arc<CorrelationRegistry>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(invocation) = queue.recv().await {
            dispatch_one(invocation, &pool, serializer, &correlation).await;
        }
        debug!("dispatch queue closed; worker exiting");
    })
}

async fn dispatch_one(
    invocation: Invocation,
    pool: &ConnectionPool,
    serializer: Serializer,
    correlation: &CorrelationRegistry,
) {
    let id = invocation.id;

    // A service with no connected providers fails the call immediately;
    // retry policy belongs to the caller, not this worker.
    let entry = match pool.select(&invocation.target_service) {
        Ok(entry) => entry,
        Err(e) => {
            warn!(service = %invocation.target_service, id, "no provider available");
            correlation.fail(id, e);
            return;
        }
    };

    let payload = match serializer.serialize(&invocation) {
        Ok(bytes) => bytes,
        // Encode failures never touch the network.
        Err(e) => {
            correlation.fail(id, Error::Serialization(e.to_string()));
            return;
        }
    };

    debug!(id, target = %entry.address, "dispatching invocation");
    if entry.write(payload).await.is_err() {
        correlation.fail(id, Error::ConnectionLost);
    }
}
