use super::*;
use crate::orchestrator::StageKind;
use crate::types::NodeIdentity;

#[tokio::test]
async fn test_publish_subscribe() {
    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();

    bus.publish(SessionEvent::Ready {
        node: NodeIdentity::from("n1"),
    });

    let event = rx.recv().await.unwrap();
    assert_eq!(event.node().as_str(), "n1");
    assert!(matches!(event, SessionEvent::Ready { .. }));
}

#[tokio::test]
async fn test_multiple_subscribers() {
    let bus = EventBus::new(16);
    let mut rx1 = bus.subscribe();
    let mut rx2 = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 2);

    let count = bus.publish(SessionEvent::Closed {
        node: NodeIdentity::from("n1"),
    });
    assert_eq!(count, 2);

    assert_eq!(rx1.recv().await.unwrap().node().as_str(), "n1");
    assert_eq!(rx2.recv().await.unwrap().node().as_str(), "n1");
}

#[test]
fn test_publish_without_subscribers() {
    let bus = EventBus::default();
    let count = bus.publish(SessionEvent::Rejected {
        node: NodeIdentity::from("n1"),
    });
    assert_eq!(count, 0);
}

#[test]
fn test_event_serialization() {
    let event = SessionEvent::StageFailed {
        node: NodeIdentity::from("n1"),
        stage: StageKind::Encode,
        error: "encoding failed: malformed input".to_string(),
    };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"stage_failed\""));
    assert!(json.contains("\"stage\":\"encode\""));
    assert!(json.contains("\"node\":\"n1\""));
}

#[test]
fn test_receiver_wakes_on_publish() {
    let bus = EventBus::new(4);
    let mut rx = bus.subscribe();
    let mut recv = tokio_test::task::spawn(async move { rx.recv().await });

    tokio_test::assert_pending!(recv.poll());

    bus.publish(SessionEvent::Closed {
        node: NodeIdentity::from("n1"),
    });
    assert!(recv.is_woken());

    let event = tokio_test::assert_ready!(recv.poll()).unwrap();
    assert!(matches!(event, SessionEvent::Closed { .. }));
}

#[tokio::test]
async fn test_node_subscription_skips_other_nodes() {
    let bus = EventBus::new(16);
    let mut events = bus.subscribe_node("n2");
    assert_eq!(events.node().as_str(), "n2");

    bus.publish(SessionEvent::Ready {
        node: NodeIdentity::from("n1"),
    });
    bus.publish(SessionEvent::Rejected {
        node: NodeIdentity::from("n2"),
    });
    bus.publish(SessionEvent::Closed {
        node: NodeIdentity::from("n1"),
    });
    bus.publish(SessionEvent::Closed {
        node: NodeIdentity::from("n2"),
    });

    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::Rejected { .. }
    ));
    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::Closed { .. }
    ));
}

#[tokio::test]
async fn test_node_subscription_reports_closed_bus() {
    let bus = EventBus::new(4);
    let mut events = bus.subscribe_node("n1");
    drop(bus);

    assert!(matches!(
        events.recv().await,
        Err(tokio::sync::broadcast::error::RecvError::Closed)
    ));
}
