//! Per-connection I/O task.
//!
//! Each pooled connection is owned by a single task multiplexing two
//! directions: outgoing frames from the dispatch pipeline, and inbound
//! responses resolved against the correlation table. Write order on a
//! connection is the order frames enter its queue.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use lodestar_core::{Response, ServiceAddress};
use lodestar_fabric::serializer::Serializer;
use lodestar_fabric::transport::Transport;

use crate::correlation::CorrelationRegistry;
use crate::pool::{ConnectionState, StateCell};

/// Frames queued per connection before the dispatcher feels backpressure.
const WRITE_QUEUE_DEPTH: usize = 64;

/// Spawn the I/O task for a freshly dialed connection.
///
/// Returns the sender feeding the connection's outgoing queue. The task
/// runs until the queue closes and drains (pool removal) or the
/// transport fails, then marks the shared state Closed and releases the
/// socket.
pub(crate) fn spawn(
    transport: Box<dyn Transport>,
    state: StateCell,
    correlation: Arc<CorrelationRegistry>,
    serializer: Serializer,
    address: ServiceAddress,
) -> mpsc::Sender<Vec<u8>> {
    let (tx, mut outgoing) = mpsc::channel::<Vec<u8>>(WRITE_QUEUE_DEPTH);

    tokio::spawn(async move {
        let (mut send_half, mut receive_half) = transport.into_split();

        loop {
            tokio::select! {
                frame = outgoing.recv() => match frame {
                    Some(bytes) => {
                        if let Err(e) = send_half.send(&bytes).await {
                            warn!(%address, error = %e, "write failed; closing connection");
                            break;
                        }
                    }
                    // Queue closed and drained: the pool withdrew this
                    // connection and every queued write is out.
                    None => break,
                },
                inbound = receive_half.receive() => match inbound {
                    Ok(bytes) => match serializer.deserialize::<Response>(&bytes) {
                        Ok(response) => {
                            correlation.resolve(response);
                        }
                        // The id inside an undecodable frame cannot be
                        // trusted, so there is no caller to notify.
                        Err(e) => {
                            warn!(%address, error = %e, "dropping undecodable response");
                        }
                    },
                    // Covers remote close and oversized/malformed
                    // frames; in-flight calls fail through their own
                    // deadlines.
                    Err(e) => {
                        debug!(%address, error = %e, "connection read ended");
                        break;
                    }
                },
            }
        }

        state.set(ConnectionState::Closed);
        let _ = send_half.close().await;
    });

    tx
}
