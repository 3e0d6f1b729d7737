#![forbid(unsafe_code)]

use mapdeck_bridge::{ActionRequest, BridgeError, BridgeHub, COLLECTION_BRIDGE};
use serde_json::json;

#[tokio::test]
async fn last_value_wins_for_slow_consumers() {
    let hub = BridgeHub::new();
    let mut rx = hub.subscribe(COLLECTION_BRIDGE);

    hub.publish_value(COLLECTION_BRIDGE, &json!({ "searchQuery": "first" })).unwrap();
    hub.publish_value(COLLECTION_BRIDGE, &json!({ "searchQuery": "second" })).unwrap();

    rx.changed().await.unwrap();
    let seen = rx.borrow_and_update().clone().unwrap();
    assert_eq!(seen.field("searchQuery"), Some(&json!("second")));
    // Nothing else pending; the first value was overwritten, not queued.
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn late_subscriber_observes_retained_value() {
    let hub = BridgeHub::new();
    hub.publish_value(COLLECTION_BRIDGE, &json!({ "viewMode": "list" })).unwrap();

    let rx = hub.subscribe(COLLECTION_BRIDGE);
    let seen = rx.borrow().clone().unwrap();
    assert_eq!(seen.field("viewMode"), Some(&json!("list")));
}

#[tokio::test]
async fn malformed_payload_is_rejected_at_the_edge() {
    let hub = BridgeHub::new();
    let err = hub.publish_value(COLLECTION_BRIDGE, &json!("not an object")).unwrap_err();
    assert!(matches!(err, BridgeError::MalformedPayload { .. }));
    // Topic untouched.
    assert!(hub.subscribe(COLLECTION_BRIDGE).borrow().is_none());
}

#[tokio::test]
async fn action_requests_fan_out_to_every_listener() {
    let hub = BridgeHub::new();
    let mut a = hub.actions();
    let mut b = hub.actions();
    hub.request(ActionRequest::ClearAll);
    hub.request(ActionRequest::ImportByMapper);
    assert_eq!(a.recv().await.unwrap(), ActionRequest::ClearAll);
    assert_eq!(a.recv().await.unwrap(), ActionRequest::ImportByMapper);
    assert_eq!(b.recv().await.unwrap(), ActionRequest::ClearAll);
}

#[test]
fn action_request_without_listener_is_silent() {
    let hub = BridgeHub::new();
    // Fire-and-forget: must not panic or error.
    hub.request(ActionRequest::RefreshLastDirectory);
}

#[test]
fn action_channel_names_are_stable() {
    assert_eq!(ActionRequest::ImportFile.channel(), "import-file");
    assert_eq!(ActionRequest::ClearAll.channel(), "clear-all");
}
