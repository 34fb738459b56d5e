//! Registry collaborator contract.
//!
//! The registry is consumed, never implemented here: it reports the
//! live provider set for a named service and pushes change
//! notifications as providers come and go.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;

use lodestar_core::{ServiceAddress, ServiceUrl};

use crate::error::Result;

/// A provider-set change for one service.
#[derive(Debug, Clone)]
pub struct TopologyChange {
    pub service: String,
    pub providers: Vec<ServiceAddress>,
}

#[async_trait]
pub trait Registry: Send + Sync {
    /// Register interest in a service; change notifications follow on
    /// the stream returned by `take_changes`.
    async fn subscribe(&self, url: &ServiceUrl) -> Result<()>;

    /// Current provider addresses for a service.
    async fn provider_addresses(&self, service: &str) -> Result<Vec<ServiceAddress>>;

    /// Advertised weight per provider.
    ///
    /// Captured at subscribe time for future weighted routing; current
    /// routers ignore it.
    async fn weight_map(&self, service: &str) -> Result<HashMap<ServiceAddress, u32>>;

    /// Take the change-notification stream.
    ///
    /// Yields the receiver at most once; later calls return None.
    fn take_changes(&self) -> Option<mpsc::Receiver<TopologyChange>>;
}
