mod common;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lodestar_client::adapter::ServiceAdapter;
use lodestar_client::registry::TopologyChange;
use lodestar_client::{ClientConfig, ClientRuntime, Error, RouterKind, SerializerKind};
use lodestar_core::Error as CallError;
use lodestar_core::ServiceAddress;
use lodestar_fabric::serializer::Serializer;

use common::{spawn_provider, MockRegistry, ProviderMode, TestProvider};

const SERVICE: &str = "demo.DataService";

fn config(router: RouterKind) -> ClientConfig {
    ClientConfig {
        router,
        serializer: SerializerKind::Bincode,
        default_timeout: Duration::from_secs(2),
        ..ClientConfig::default()
    }
}

fn providers_map(providers: &[&TestProvider]) -> HashMap<String, Vec<ServiceAddress>> {
    HashMap::from([(
        SERVICE.to_string(),
        providers.iter().map(|p| p.address.clone()).collect(),
    )])
}

async fn invoke_once(
    runtime: &ClientRuntime,
    body: &str,
    timeout: Option<Duration>,
) -> lodestar_client::Result<lodestar_client::CallHandle> {
    let argument = Serializer::Bincode.serialize(&body).unwrap();
    runtime
        .invoke(
            SERVICE,
            "sendData",
            vec!["str".to_string()],
            vec![argument],
            timeout,
        )
        .await
}

#[tokio::test]
async fn end_to_end_round_robin_resolves_all_calls() {
    let p1 = spawn_provider(Serializer::Bincode, ProviderMode::Echo).await;
    let p2 = spawn_provider(Serializer::Bincode, ProviderMode::Echo).await;
    let (registry, _changes) = MockRegistry::new(providers_map(&[&p1, &p2]));

    let runtime = ClientRuntime::with_tcp(config(RouterKind::RoundRobin), registry).unwrap();
    runtime.subscribe(SERVICE).await.unwrap();
    runtime.start().unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let body = format!("msg-{i}");
        handles.push(invoke_once(&runtime, &body, None).await.unwrap());
    }
    for handle in handles {
        let response = handle.result().await.unwrap();
        assert!(response.failure.is_none());
    }
    assert_eq!(runtime.pending_calls(), 0);

    tokio::time::sleep(Duration::from_millis(50)).await;

    // One connection per provider, five invocations each, in dispatch
    // order on that connection
    let mut all_ids = HashSet::new();
    for provider in [&p1, &p2] {
        let log = provider.received_ids();
        assert_eq!(log.len(), 1, "expected exactly one connection");
        assert_eq!(log[0].len(), 5);
        for window in log[0].windows(2) {
            assert!(window[0] < window[1], "out-of-order dispatch on connection");
        }
        all_ids.extend(log[0].iter().copied());
    }
    assert_eq!(all_ids.len(), 10);

    runtime.shutdown().await;
}

#[tokio::test]
async fn timeout_expires_pending_call_and_drops_late_response() {
    let provider = spawn_provider(
        Serializer::Bincode,
        ProviderMode::DelayedEcho(Duration::from_millis(400)),
    )
    .await;
    let (registry, _changes) = MockRegistry::new(providers_map(&[&provider]));

    let runtime = ClientRuntime::with_tcp(config(RouterKind::RoundRobin), registry).unwrap();
    runtime.subscribe(SERVICE).await.unwrap();
    runtime.start().unwrap();

    let started = Instant::now();
    let handle = invoke_once(&runtime, "slow", Some(Duration::from_millis(50)))
        .await
        .unwrap();
    let err = handle.result().await.unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err, CallError::Timeout);
    assert!(elapsed >= Duration::from_millis(45), "fired early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(350), "fired late: {elapsed:?}");
    assert_eq!(runtime.pending_calls(), 0);

    // The provider's reply lands after expiry and is silently dropped;
    // the runtime stays serviceable
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(runtime.pending_calls(), 0);

    let response = invoke_once(&runtime, "patient", None)
        .await
        .unwrap()
        .result()
        .await
        .unwrap();
    assert!(response.failure.is_none());

    runtime.shutdown().await;
}

#[tokio::test]
async fn missing_provider_fails_with_no_available_provider() {
    let (registry, _changes) = MockRegistry::new(HashMap::new());

    let runtime = ClientRuntime::with_tcp(config(RouterKind::Random), registry).unwrap();
    runtime.subscribe(SERVICE).await.unwrap();
    runtime.start().unwrap();

    let err = invoke_once(&runtime, "nobody home", None)
        .await
        .unwrap()
        .result()
        .await
        .unwrap_err();

    match err {
        CallError::NoAvailableProvider { service } => assert_eq!(service, SERVICE),
        other => panic!("Expected NoAvailableProvider, got {:?}", other),
    }

    runtime.shutdown().await;
}

#[tokio::test]
async fn topology_change_moves_traffic_to_new_provider() {
    let p1 = spawn_provider(Serializer::Bincode, ProviderMode::Echo).await;
    let p2 = spawn_provider(Serializer::Bincode, ProviderMode::Echo).await;
    let (registry, changes) = MockRegistry::new(providers_map(&[&p1]));

    let runtime = ClientRuntime::with_tcp(config(RouterKind::RoundRobin), registry).unwrap();
    runtime.subscribe(SERVICE).await.unwrap();
    runtime.start().unwrap();

    invoke_once(&runtime, "before", None)
        .await
        .unwrap()
        .result()
        .await
        .unwrap();

    changes
        .send(TopologyChange {
            service: SERVICE.to_string(),
            providers: vec![p2.address.clone()],
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        runtime.connected_providers(SERVICE),
        vec![p2.address.clone()]
    );

    invoke_once(&runtime, "after", None)
        .await
        .unwrap()
        .result()
        .await
        .unwrap();

    assert_eq!(p1.received_ids().concat().len(), 1);
    assert_eq!(p2.received_ids().concat().len(), 1);

    runtime.shutdown().await;
}

#[tokio::test]
async fn adapter_stub_round_trips_typed_call() {
    struct DataServiceStub {
        adapter: ServiceAdapter,
    }

    impl DataServiceStub {
        async fn send_data(&self, body: &str) -> lodestar_client::Result<String> {
            self.adapter
                .call("sendData", self.adapter.args().push(body))
                .await
        }
    }

    let provider = spawn_provider(Serializer::Bincode, ProviderMode::Echo).await;
    let (registry, _changes) = MockRegistry::new(providers_map(&[&provider]));

    let runtime = Arc::new(ClientRuntime::with_tcp(config(RouterKind::Random), registry).unwrap());
    runtime.subscribe(SERVICE).await.unwrap();
    runtime.start().unwrap();

    let stub = DataServiceStub {
        adapter: ServiceAdapter::new(runtime.clone(), SERVICE)
            .with_timeout(Duration::from_secs(1)),
    };

    let reply = stub.send_data("hello provider").await.unwrap();
    assert_eq!(reply, "hello provider");

    // Subscribe captured the weight map into the subscription record
    let url = runtime.subscription(SERVICE).unwrap();
    assert_eq!(url.service_name, SERVICE);
    let weight_key = format!("weight:{}", provider.address);
    assert_eq!(url.parameter(&weight_key), Some("1"));

    runtime.shutdown().await;
}

#[tokio::test]
async fn shutdown_drains_accepted_invocations_and_rejects_new_ones() {
    let provider = spawn_provider(Serializer::Bincode, ProviderMode::Echo).await;
    let (registry, _changes) = MockRegistry::new(providers_map(&[&provider]));

    let runtime = ClientRuntime::with_tcp(config(RouterKind::Random), registry).unwrap();
    runtime.subscribe(SERVICE).await.unwrap();
    runtime.start().unwrap();

    for i in 0..3 {
        let body = format!("drain-{i}");
        invoke_once(&runtime, &body, None).await.unwrap();
    }
    runtime.shutdown().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Already-accepted invocations reached the provider
    assert_eq!(provider.received_ids().concat().len(), 3);

    let err = invoke_once(&runtime, "too late", None).await.unwrap_err();
    assert!(matches!(err, Error::ShuttingDown));
}
