//! Integration tests for Organon
//!
//! These tests drive the full pipeline against the simulated collaborators:
//! - organon-core: session construction, gating, stage sequencing, shutdown
//! - organon-sim: actuation, model store, health, policy, encoder

use std::sync::Arc;
use std::time::Duration;

use organon_core::{
    ActuationError, Error, EventBus, NodeIdentity, NodePool, OrchestratorConfig, Request,
    SessionEvent, SessionOrchestrator, SessionState, ThinkOptions, ThinkResult, NODE_OVERLOADED,
    POLICY_VIOLATION, STIMULATE_CANCELLED,
};
use organon_sim::{ActuationStats, SimBundle, SimConfig};
use serde_json::json;
use tokio_util::sync::CancellationToken;

const NODE: &str = "cl1-organoid-7x";
const MODEL: &str = "organoid-v1";

async fn open(sim: SimConfig, config: OrchestratorConfig) -> (SessionOrchestrator, SimBundle) {
    let bundle = sim.build();
    let session = SessionOrchestrator::connect(NODE, MODEL, bundle.collaborators.clone(), config)
        .await
        .expect("session should connect");
    (session, bundle)
}

fn structured(value: serde_json::Value) -> Request {
    match value {
        serde_json::Value::Object(map) => Request::structured(map, Default::default()),
        _ => unreachable!(),
    }
}

// ============================================================================
// Gating
// ============================================================================

#[tokio::test]
async fn test_overloaded_node_fails() {
    let sim = SimConfig {
        load: 0.9,
        ..SimConfig::default()
    };
    let (session, bundle) = open(sim, OrchestratorConfig::default()).await;
    let stats = bundle.actuation.stats();

    let result = session.think(Request::text("hello")).await.unwrap();

    assert_eq!(result, ThinkResult::failed(NODE_OVERLOADED));
    assert_eq!(ActuationStats::count(&stats.stimulates), 0);
    assert!(bundle.models.feedback().is_empty());
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_blocked_term_is_rejected() {
    let sim = SimConfig {
        blocked_terms: vec!["weapon".to_string()],
        ..SimConfig::default()
    };
    let (session, bundle) = open(sim, OrchestratorConfig::default()).await;
    let stats = bundle.actuation.stats();

    let result = session
        .think(Request::text("design a Weapon"))
        .await
        .unwrap();

    assert_eq!(result, ThinkResult::rejected(POLICY_VIOLATION));
    assert_eq!(ActuationStats::count(&stats.stimulates), 0);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json, json!({"status": "rejected", "error": "ethics/policy violation"}));
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_ceiling_override_admits_load() {
    let sim = SimConfig {
        load: 0.9,
        ..SimConfig::default()
    };
    let (session, _bundle) = open(sim, OrchestratorConfig::new().with_load_ceiling(0.95)).await;

    let result = session.think(Request::text("hello")).await.unwrap();
    assert!(result.is_success());
    assert_eq!(result.metadata().unwrap().load, 0.9);
    session.shutdown().await.unwrap();
}

// ============================================================================
// Success path
// ============================================================================

#[tokio::test]
async fn test_successful_think() {
    let (session, bundle) = open(SimConfig::default(), OrchestratorConfig::default()).await;

    let result = session.think(Request::text("hello organoid")).await.unwrap();

    assert!(result.is_success());
    let response = result.response().unwrap();
    assert!(response.starts_with("[organoid-v1] neural_response: 14 samples"));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "success");
    let metadata = json["metadata"].as_object().unwrap();
    let mut keys: Vec<_> = metadata.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["load", "nodeIdentity", "processingTime"]);
    assert_eq!(metadata["nodeIdentity"], NODE);
    assert_eq!(metadata["load"], 0.3);
    assert_eq!(metadata["processingTime"], 0.05);

    let feedback = bundle.models.feedback();
    assert_eq!(feedback.len(), 1);
    assert_eq!(feedback[0].response, response);
    assert_eq!(feedback[0].storage_ref, "feedback");
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_structured_request_with_content() {
    let (session, _bundle) = open(SimConfig::default(), OrchestratorConfig::default()).await;

    let result = session
        .think(structured(json!({"content": "abc", "tag": "probe"})))
        .await
        .unwrap();
    assert!(result.response().unwrap().contains("3 samples"));
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_feedback_failure_still_succeeds() {
    let sim = SimConfig {
        feedback_fails: true,
        ..SimConfig::default()
    };
    let (session, bundle) = open(sim, OrchestratorConfig::default()).await;

    let result = session.think(Request::text("hello")).await.unwrap();
    assert!(result.is_success());
    assert!(bundle.models.feedback().is_empty());
    session.shutdown().await.unwrap();
}

// ============================================================================
// Stage failures
// ============================================================================

#[tokio::test]
async fn test_structured_request_without_content() {
    let (session, bundle) = open(SimConfig::default(), OrchestratorConfig::default()).await;
    let stats = bundle.actuation.stats();

    let result = session
        .think(structured(json!({"pixels": [1, 2, 3]})))
        .await
        .unwrap();

    assert_eq!(result.status(), "failed");
    assert!(result.reason().unwrap().starts_with("encoding failed: "));
    assert_eq!(ActuationStats::count(&stats.stimulates), 0);
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stimulate_fault_keeps_session_usable() {
    let (session, bundle) = open(SimConfig::default(), OrchestratorConfig::default()).await;
    bundle
        .actuation
        .fail_next_stimulate(ActuationError::Fault("electrode drift".to_string()));

    let failed = session.think(Request::text("hello")).await.unwrap();
    assert_eq!(failed.reason(), Some("actuation fault: electrode drift"));
    assert_eq!(session.state(), SessionState::Ready);

    let retried = session.think(Request::text("hello")).await.unwrap();
    assert!(retried.is_success());
    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_health_outage_fails_request() {
    let (session, bundle) = open(SimConfig::default(), OrchestratorConfig::default()).await;
    bundle.health.set_available(false);

    let result = session.think(Request::text("hello")).await.unwrap();
    assert!(result
        .reason()
        .unwrap()
        .starts_with("health check failed: "));
    session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stimulate_timeout() {
    let sim = SimConfig {
        latency_ms: 500,
        ..SimConfig::default()
    };
    let config = OrchestratorConfig::new().with_stimulate_timeout(Duration::from_millis(100));
    let (session, _bundle) = open(sim, config).await;

    let result = session.think(Request::text("hello")).await.unwrap();
    assert_eq!(result.reason(), Some("stimulate timed out after 100ms"));
    assert_eq!(session.state(), SessionState::Ready);
    session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stimulate_cancelled() {
    let sim = SimConfig {
        latency_ms: 500,
        ..SimConfig::default()
    };
    let (session, _bundle) = open(sim, OrchestratorConfig::default()).await;

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let result = session
        .think_with(
            Request::text("hello"),
            ThinkOptions::new().with_cancel(token),
        )
        .await
        .unwrap();
    assert_eq!(result.reason(), Some(STIMULATE_CANCELLED));
    session.shutdown().await.unwrap();
}

// ============================================================================
// Construction and lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_connect_timeout() {
    let bundle = SimConfig {
        handshake_ms: 5_000,
        ..SimConfig::default()
    }
    .build();
    let config = OrchestratorConfig::new().with_connect_timeout(Duration::from_secs(1));

    let err = SessionOrchestrator::connect(NODE, MODEL, bundle.collaborators, config)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConnectTimeout { .. }));
    assert_eq!(bundle.models.load_count(), 0);
}

#[tokio::test]
async fn test_unreachable_node() {
    let bundle = SimConfig::default().build();
    bundle.actuation.mark_unreachable(NODE);

    let err = SessionOrchestrator::connect(
        NODE,
        MODEL,
        bundle.collaborators,
        OrchestratorConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Connection {
            source: ActuationError::Unreachable(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_unknown_model_releases_connection() {
    let bundle = SimConfig::default().build();
    let stats = bundle.actuation.stats();

    let err = SessionOrchestrator::connect(
        NODE,
        "organoid-v9",
        bundle.collaborators,
        OrchestratorConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::ModelLoad { .. }));
    assert_eq!(ActuationStats::count(&stats.connects), 1);
    assert_eq!(ActuationStats::count(&stats.disconnects), 1);
}

#[tokio::test]
async fn test_shutdown_releases_resources() {
    let (session, bundle) = open(SimConfig::default(), OrchestratorConfig::default()).await;
    let stats = bundle.actuation.stats();

    session.shutdown().await.unwrap();

    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(ActuationStats::count(&stats.disconnects), 1);
    assert_eq!(bundle.models.unload_count(), 1);

    let err = session.think(Request::text("hello")).await.unwrap_err();
    assert!(matches!(err, Error::SessionClosed { .. }));
    assert!(matches!(
        session.shutdown().await.unwrap_err(),
        Error::SessionClosed { .. }
    ));
    assert_eq!(ActuationStats::count(&stats.disconnects), 1);
}

#[tokio::test]
async fn test_event_stream() {
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let bundle = SimConfig::default().build();

    let session = SessionOrchestrator::builder(NODE, MODEL, bundle.collaborators)
        .with_event_bus(bus.clone())
        .connect()
        .await
        .unwrap();
    session.think(Request::text("hello")).await.unwrap();
    session.shutdown().await.unwrap();

    assert!(matches!(rx.recv().await.unwrap(), SessionEvent::Ready { .. }));
    assert!(matches!(
        rx.recv().await.unwrap(),
        SessionEvent::Completed { .. }
    ));
    assert!(matches!(rx.recv().await.unwrap(), SessionEvent::Closed { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_calls_are_serialized() {
    let sim = SimConfig {
        latency_ms: 50,
        ..SimConfig::default()
    };
    let (session, bundle) = open(sim, OrchestratorConfig::default()).await;

    let started = tokio::time::Instant::now();
    let (first, second) = tokio::join!(
        session.think(Request::text("first")),
        session.think(Request::text("second"))
    );

    assert!(first.unwrap().is_success());
    assert!(second.unwrap().is_success());
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(bundle.models.feedback().len(), 2);
    session.shutdown().await.unwrap();
}

// ============================================================================
// Node pool
// ============================================================================

#[tokio::test]
async fn test_pool_shards_by_node() {
    let bundle = SimConfig::default().build();
    let stats = bundle.actuation.stats();
    let pool = NodePool::new(bundle.collaborators, OrchestratorConfig::default());

    pool.open("node-a", MODEL).await.unwrap();
    pool.open("node-b", MODEL).await.unwrap();
    assert!(matches!(
        pool.open("node-a", MODEL).await.unwrap_err(),
        Error::NodeAlreadyOpen(_)
    ));

    let a = NodeIdentity::from("node-a");
    let result = pool.think(&a, Request::text("hello")).await.unwrap();
    assert_eq!(
        result.metadata().unwrap().node_identity,
        NodeIdentity::from("node-a")
    );

    let missing = NodeIdentity::from("node-z");
    assert!(matches!(
        pool.think(&missing, Request::text("hello")).await.unwrap_err(),
        Error::UnknownNode(_)
    ));

    pool.close(&a).await.unwrap();
    assert_eq!(pool.nodes().await, vec![NodeIdentity::from("node-b")]);
    assert_eq!(pool.shutdown_all().await, 1);
    assert_eq!(ActuationStats::count(&stats.disconnects), 2);
}

#[test]
fn test_blocking_caller() {
    let (session, bundle) =
        tokio_test::block_on(open(SimConfig::default(), OrchestratorConfig::default()));

    let result = tokio_test::block_on(session.think(Request::text("hi"))).unwrap();
    assert!(result.is_success());

    tokio_test::block_on(session.shutdown()).unwrap();
    assert_eq!(bundle.models.unload_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pool_handshake_does_not_stall_open_nodes() {
    let bundle = SimConfig {
        handshake_ms: 5_000,
        ..SimConfig::default()
    }
    .build();
    let pool = Arc::new(NodePool::new(
        bundle.collaborators,
        OrchestratorConfig::default(),
    ));
    pool.open("node-a", MODEL).await.unwrap();

    let opening = tokio::spawn({
        let pool = pool.clone();
        async move { pool.open("node-b", MODEL).await.map(|_| ()) }
    });
    tokio::task::yield_now().await;

    let started = tokio::time::Instant::now();
    let result = pool
        .think(&NodeIdentity::from("node-a"), Request::text("hello"))
        .await
        .unwrap();
    assert!(result.is_success());
    assert!(started.elapsed() < Duration::from_secs(1));

    opening.await.unwrap().unwrap();
    assert_eq!(pool.shutdown_all().await, 2);
}
