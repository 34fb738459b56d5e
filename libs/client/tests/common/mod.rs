//! Shared helpers: an in-process provider speaking the wire protocol
//! over loopback TCP, and a channel-backed mock registry.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use lodestar_client::registry::{Registry, TopologyChange};
use lodestar_core::{Invocation, Response, ServiceAddress, ServiceUrl};
use lodestar_fabric::serializer::Serializer;
use lodestar_fabric::transport::{TcpTransportListener, Transport};

#[derive(Clone, Copy)]
pub enum ProviderMode {
    /// Reply immediately, echoing the first argument as the payload.
    Echo,
    /// Reply after a fixed delay.
    DelayedEcho(Duration),
}

pub struct TestProvider {
    pub address: ServiceAddress,
    pub accepts: Arc<AtomicUsize>,
    /// Invocation ids in arrival order, one list per accepted connection.
    pub received: Arc<Mutex<Vec<Vec<u64>>>>,
}

impl TestProvider {
    pub fn accept_count(&self) -> usize {
        self.accepts.load(Ordering::SeqCst)
    }

    pub fn received_ids(&self) -> Vec<Vec<u64>> {
        self.received.lock().unwrap().clone()
    }
}

pub async fn spawn_provider(serializer: Serializer, mode: ProviderMode) -> TestProvider {
    let listener = TcpTransportListener::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = ServiceAddress::new("127.0.0.1", port);
    let accepts = Arc::new(AtomicUsize::new(0));
    let received = Arc::new(Mutex::new(Vec::new()));

    let accepts_task = accepts.clone();
    let received_task = received.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut transport, _)) = listener.accept().await else {
                break;
            };
            accepts_task.fetch_add(1, Ordering::SeqCst);
            let slot = {
                let mut log = received_task.lock().unwrap();
                log.push(Vec::new());
                log.len() - 1
            };
            let received_conn = received_task.clone();
            tokio::spawn(async move {
                while let Ok(bytes) = transport.receive().await {
                    let Ok(invocation) = serializer.deserialize::<Invocation>(&bytes) else {
                        continue;
                    };
                    received_conn.lock().unwrap()[slot].push(invocation.id);

                    if let ProviderMode::DelayedEcho(delay) = mode {
                        tokio::time::sleep(delay).await;
                    }
                    let payload = invocation.arguments.into_iter().next().unwrap_or_default();
                    let reply = serializer
                        .serialize(&Response::ok(invocation.id, payload))
                        .unwrap();
                    if transport.send(&reply).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    TestProvider {
        address,
        accepts,
        received,
    }
}

pub struct MockRegistry {
    providers: Mutex<HashMap<String, Vec<ServiceAddress>>>,
    changes: Mutex<Option<mpsc::Receiver<TopologyChange>>>,
    pub subscribed: Mutex<Vec<ServiceUrl>>,
}

impl MockRegistry {
    pub fn new(
        providers: HashMap<String, Vec<ServiceAddress>>,
    ) -> (Arc<Self>, mpsc::Sender<TopologyChange>) {
        let (tx, rx) = mpsc::channel(16);
        let registry = Arc::new(Self {
            providers: Mutex::new(providers),
            changes: Mutex::new(Some(rx)),
            subscribed: Mutex::new(Vec::new()),
        });
        (registry, tx)
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn subscribe(&self, url: &ServiceUrl) -> lodestar_client::Result<()> {
        self.subscribed.lock().unwrap().push(url.clone());
        Ok(())
    }

    async fn provider_addresses(
        &self,
        service: &str,
    ) -> lodestar_client::Result<Vec<ServiceAddress>> {
        Ok(self
            .providers
            .lock()
            .unwrap()
            .get(service)
            .cloned()
            .unwrap_or_default())
    }

    async fn weight_map(
        &self,
        service: &str,
    ) -> lodestar_client::Result<HashMap<ServiceAddress, u32>> {
        // Every known provider advertises unit weight.
        let weights = self
            .providers
            .lock()
            .unwrap()
            .get(service)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|address| (address, 1))
            .collect();
        Ok(weights)
    }

    fn take_changes(&self) -> Option<mpsc::Receiver<TopologyChange>> {
        self.changes.lock().unwrap().take()
    }
}
