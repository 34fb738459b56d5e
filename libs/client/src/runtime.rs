//! Client runtime.
//!
//! One `ClientRuntime` owns every shared piece of client state — the
//! connection pool, the correlation table, the dispatch queue, and the
//! registry subscription — with explicit construction and teardown.
//! Several independent runtimes can coexist in one process.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use lodestar_core::{Error as CallError, Invocation, Response, ServiceUrl};
use lodestar_fabric::serializer::Serializer;
use lodestar_fabric::transport::{Connector, TcpConnector};

use crate::config::{ClientConfig, RouterKind, SerializerKind};
use crate::correlation::{CallOutcome, CorrelationRegistry};
use crate::dispatch;
use crate::error::{Error, Result};
use crate::pool::ConnectionPool;
use crate::reconciler;
use crate::registry::Registry;
use crate::router::Router;

/// Resolvable handle for one outstanding call.
///
/// The deadline starts counting when the invocation is accepted, not
/// when the caller begins waiting.
#[derive(Debug)]
pub struct CallHandle {
    id: u64,
    deadline: Instant,
    rx: oneshot::Receiver<CallOutcome>,
    correlation: Arc<CorrelationRegistry>,
}

impl CallHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Suspend until the result, a local failure, or the deadline.
    ///
    /// On expiry the pending entry is withdrawn, so a response arriving
    /// later finds nothing and is dropped.
    pub async fn result(self) -> Result<Response, CallError> {
        match tokio::time::timeout_at(self.deadline, self.rx).await {
            Ok(Ok(outcome)) => outcome,
            // Sender dropped without delivering: the runtime tore down
            // while this call was in flight.
            Ok(Err(_)) => Err(CallError::ConnectionLost),
            Err(_) => {
                self.correlation.expire(self.id);
                Err(CallError::Timeout)
            }
        }
    }
}

pub struct ClientRuntime {
    config: ClientConfig,
    serializer: Serializer,
    pool: Arc<ConnectionPool>,
    correlation: Arc<CorrelationRegistry>,
    registry: Arc<dyn Registry>,
    subscriptions: DashMap<String, ServiceUrl>,
    queue: Mutex<Option<mpsc::Sender<Invocation>>>,
    queue_rx: Mutex<Option<mpsc::Receiver<Invocation>>>,
    dispatch_worker: Mutex<Option<JoinHandle<()>>>,
    reconciler_worker: Mutex<Option<JoinHandle<()>>>,
}

impl ClientRuntime {
    /// Build a runtime from configuration with an explicit dialer.
    pub fn new(
        config: ClientConfig,
        registry: Arc<dyn Registry>,
        connector: Box<dyn Connector>,
    ) -> Result<Self> {
        if config.dispatch_queue_depth == 0 {
            return Err(Error::InvalidConfig(
                "dispatch_queue_depth must be at least 1".to_string(),
            ));
        }

        let router = match config.router {
            RouterKind::Random => Router::random(),
            RouterKind::RoundRobin => Router::round_robin(),
        };
        let serializer = match config.serializer {
            SerializerKind::Bincode => Serializer::Bincode,
            SerializerKind::Json => Serializer::Json,
        };

        let correlation = Arc::new(CorrelationRegistry::new());
        let pool = Arc::new(ConnectionPool::new(
            connector,
            router,
            correlation.clone(),
            serializer,
        ));
        let (queue, queue_rx) = mpsc::channel(config.dispatch_queue_depth);

        Ok(Self {
            config,
            serializer,
            pool,
            correlation,
            registry,
            subscriptions: DashMap::new(),
            queue: Mutex::new(Some(queue)),
            queue_rx: Mutex::new(Some(queue_rx)),
            dispatch_worker: Mutex::new(None),
            reconciler_worker: Mutex::new(None),
        })
    }

    /// Build a runtime dialing providers over TCP, configured from
    /// `config`'s frame and timeout settings.
    pub fn with_tcp(config: ClientConfig, registry: Arc<dyn Registry>) -> Result<Self> {
        let connector = TcpConnector::new(Some(config.connect_timeout), config.max_frame_len);
        Self::new(config, registry, Box::new(connector))
    }

    /// The serializer this runtime was configured with.
    pub fn serializer(&self) -> Serializer {
        self.serializer
    }

    /// Subscribe to a service and connect its currently known providers.
    ///
    /// The registry's weight map is captured into the subscription's
    /// parameters; routing currently ignores it. Individual dial
    /// failures are logged and left for reconciliation to retry.
    pub async fn subscribe(&self, service: &str) -> Result<()> {
        let mut url = ServiceUrl::new(&self.config.application_name, service);
        if let Some(host) = &self.config.advertised_host {
            url.set_parameter("host", host);
        }
        for (address, weight) in self.registry.weight_map(service).await? {
            url.set_parameter(format!("weight:{address}"), weight.to_string());
        }
        self.registry.subscribe(&url).await?;
        info!(service, "subscribed");

        for address in self.registry.provider_addresses(service).await? {
            if let Err(e) = self.pool.connect(service, address.clone()).await {
                warn!(service, %address, error = %e, "initial provider dial failed");
            }
        }

        self.subscriptions.insert(service.to_string(), url);
        Ok(())
    }

    /// The subscription record for a service, if one exists.
    pub fn subscription(&self, service: &str) -> Option<ServiceUrl> {
        self.subscriptions
            .get(service)
            .map(|entry| entry.value().clone())
    }

    /// Start the dispatch worker and the topology reconciler.
    pub fn start(&self) -> Result<()> {
        let Some(queue_rx) = self.queue_rx.lock().unwrap().take() else {
            return Err(Error::AlreadyStarted);
        };

        let worker = dispatch::spawn(
            queue_rx,
            self.pool.clone(),
            self.serializer,
            self.correlation.clone(),
        );
        *self.dispatch_worker.lock().unwrap() = Some(worker);

        if let Some(changes) = self.registry.take_changes() {
            *self.reconciler_worker.lock().unwrap() =
                Some(reconciler::spawn(changes, self.pool.clone()));
        }

        Ok(())
    }

    /// Enqueue an invocation; returns a handle resolvable to its
    /// outcome.
    ///
    /// The arguments are already serializer-encoded by the caller
    /// adapter. Queue backpressure is the only point where this
    /// suspends.
    pub async fn invoke(
        &self,
        target_service: &str,
        method: &str,
        argument_types: Vec<String>,
        arguments: Vec<Vec<u8>>,
        timeout: Option<Duration>,
    ) -> Result<CallHandle> {
        let queue = self
            .queue
            .lock()
            .unwrap()
            .clone()
            .ok_or(Error::ShuttingDown)?;

        let id = self.correlation.next_id();
        let rx = self.correlation.register(id);
        let deadline = Instant::now() + timeout.unwrap_or(self.config.default_timeout);

        let invocation = Invocation {
            id,
            target_service: target_service.to_string(),
            method: method.to_string(),
            argument_types,
            arguments,
        };
        if queue.send(invocation).await.is_err() {
            self.correlation.expire(id);
            return Err(Error::ShuttingDown);
        }

        Ok(CallHandle {
            id,
            deadline,
            rx,
            correlation: self.correlation.clone(),
        })
    }

    /// Enqueue and suspend until the outcome arrives.
    pub async fn invoke_blocking(
        &self,
        target_service: &str,
        method: &str,
        argument_types: Vec<String>,
        arguments: Vec<Vec<u8>>,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let handle = self
            .invoke(target_service, method, argument_types, arguments, timeout)
            .await?;
        handle.result().await.map_err(Error::Call)
    }

    /// Number of calls currently awaiting a response.
    pub fn pending_calls(&self) -> usize {
        self.correlation.pending_calls()
    }

    /// Provider addresses currently connected for a service.
    pub fn connected_providers(&self, service: &str) -> Vec<lodestar_core::ServiceAddress> {
        self.pool.addresses(service)
    }

    /// Drain the dispatch queue, then release every connection.
    ///
    /// Invocations already accepted are still dispatched; `invoke`
    /// fails with `ShuttingDown` from this point on.
    pub async fn shutdown(&self) {
        drop(self.queue.lock().unwrap().take());

        let worker = self.dispatch_worker.lock().unwrap().take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
        let reconciler = self.reconciler_worker.lock().unwrap().take();
        if let Some(reconciler) = reconciler {
            reconciler.abort();
        }

        self.pool.drain();
        info!("client runtime shut down");
    }
}
