//! Topology reconciliation.
//!
//! Applies registry change notifications to the connection pool as a
//! minimal diff: providers present in both the old and new sets keep
//! their connections and their in-flight calls.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use lodestar_core::ServiceAddress;

use crate::pool::ConnectionPool;
use crate::registry::TopologyChange;

/// Apply one provider-set notification for `service`.
///
/// Removal and addition touch disjoint addresses, so their relative
/// order carries no correctness weight. A dial failure is logged and
/// skipped; the remaining additions still process, and the absent
/// address is retried on the next notification.
pub async fn reconcile(pool: &ConnectionPool, service: &str, providers: &[ServiceAddress]) {
    let old: HashSet<ServiceAddress> = pool.addresses(service).into_iter().collect();
    let new: HashSet<ServiceAddress> = providers.iter().cloned().collect();

    for address in old.difference(&new) {
        pool.remove(service, address);
    }
    for address in new.difference(&old) {
        if let Err(e) = pool.connect(service, address.clone()).await {
            warn!(service, %address, error = %e, "provider dial failed during reconciliation");
        }
    }

    info!(
        service,
        providers = providers.len(),
        "provider set reconciled"
    );
}

/// Consume change notifications, in receipt order, until the registry
/// stream ends.
pub(crate) fn spawn(
    mut changes: mpsc::Receiver<TopologyChange>,
    pool: Arc<ConnectionPool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(change) = changes.recv().await {
            reconcile(&pool, &change.service, &change.providers).await;
        }
    })
}
