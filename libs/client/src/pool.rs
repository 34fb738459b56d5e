//! Per-service connection pool.
//!
//! Owns the live set of provider connections for each subscribed
//! service. Entry sets are guarded per service through a sharded map, so
//! reconciliation for one service never blocks selection for another.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::info;

use lodestar_core::{Error as CallError, ServiceAddress};
use lodestar_fabric::serializer::Serializer;
use lodestar_fabric::transport::Connector;

use crate::connection;
use crate::correlation::CorrelationRegistry;
use crate::error::Result;
use crate::router::Router;

/// Lifecycle of one pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Draining,
    Closed,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            x if x == Self::Connecting as u8 => Self::Connecting,
            x if x == Self::Connected as u8 => Self::Connected,
            x if x == Self::Draining as u8 => Self::Draining,
            _ => Self::Closed,
        }
    }
}

/// Connection state shared between the pool and the connection's task.
#[derive(Debug, Clone)]
pub struct StateCell(Arc<AtomicU8>);

impl StateCell {
    pub(crate) fn new(state: ConnectionState) -> Self {
        Self(Arc::new(AtomicU8::new(state as u8)))
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// One live connection to a provider, owned by the pool.
///
/// `writer` feeds the connection task's outgoing queue; frames written
/// through it leave the socket in queue order.
#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    pub address: ServiceAddress,
    state: StateCell,
    writer: mpsc::Sender<Vec<u8>>,
}

impl ConnectionEntry {
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Queue one serialized payload for this connection.
    pub(crate) async fn write(&self, payload: Vec<u8>) -> Result<(), CallError> {
        self.writer
            .send(payload)
            .await
            .map_err(|_| CallError::ConnectionLost)
    }
}

/// Per-service connection sets, plus the router that picks from them.
pub struct ConnectionPool {
    services: DashMap<String, Vec<ConnectionEntry>>,
    connector: Box<dyn Connector>,
    router: Router,
    correlation: Arc<CorrelationRegistry>,
    serializer: Serializer,
}

impl ConnectionPool {
    pub fn new(
        connector: Box<dyn Connector>,
        router: Router,
        correlation: Arc<CorrelationRegistry>,
        serializer: Serializer,
    ) -> Self {
        Self {
            services: DashMap::new(),
            connector,
            router,
            correlation,
            serializer,
        }
    }

    /// Dial `address` and add the connection to `service`'s set.
    ///
    /// On dial failure nothing is inserted; retrying is the caller's
    /// concern (the reconciler retries on the next registry
    /// notification).
    pub async fn connect(&self, service: &str, address: ServiceAddress) -> Result<()> {
        let state = StateCell::new(ConnectionState::Connecting);
        let transport = match self.connector.connect(&address).await {
            Ok(transport) => transport,
            Err(e) => {
                state.set(ConnectionState::Closed);
                return Err(e.into());
            }
        };
        state.set(ConnectionState::Connected);

        let writer = connection::spawn(
            transport,
            state.clone(),
            self.correlation.clone(),
            self.serializer,
            address.clone(),
        );
        let entry = ConnectionEntry {
            address: address.clone(),
            state,
            writer,
        };

        self.services
            .entry(service.to_string())
            .or_default()
            .push(entry);
        info!(service, %address, "provider connected");
        Ok(())
    }

    /// Pick a connection for `service` through the router.
    ///
    /// Only Connected entries are offered; entries whose task has
    /// already closed are swept out here rather than lingering until the
    /// next reconciliation.
    pub fn select(&self, service: &str) -> Result<ConnectionEntry, CallError> {
        let Some(mut entries) = self.services.get_mut(service) else {
            return Err(CallError::no_available_provider(service));
        };
        entries.retain(|entry| entry.state() != ConnectionState::Closed);

        let connected: Vec<ConnectionEntry> = entries
            .iter()
            .filter(|entry| entry.state() == ConnectionState::Connected)
            .cloned()
            .collect();
        self.router.select(service, &connected).cloned()
    }

    /// Withdraw `address` from `service`, letting queued writes flush.
    ///
    /// The entry stops being offered immediately; its task closes the
    /// transport once the outgoing queue drains.
    pub fn remove(&self, service: &str, address: &ServiceAddress) {
        if let Some(mut entries) = self.services.get_mut(service) {
            if let Some(pos) = entries.iter().position(|entry| &entry.address == address) {
                let entry = entries.remove(pos);
                entry.state.set(ConnectionState::Draining);
                info!(service, %address, "provider connection draining");
            }
        }
    }

    /// Addresses currently held for `service`, Closed entries excluded.
    pub fn addresses(&self, service: &str) -> Vec<ServiceAddress> {
        match self.services.get_mut(service) {
            Some(mut entries) => {
                entries.retain(|entry| entry.state() != ConnectionState::Closed);
                entries.iter().map(|entry| entry.address.clone()).collect()
            }
            None => Vec::new(),
        }
    }

    /// Drain every connection in every service set.
    pub fn drain(&self) {
        for mut entries in self.services.iter_mut() {
            for entry in entries.value_mut().drain(..) {
                entry.state.set(ConnectionState::Draining);
            }
        }
    }
}
