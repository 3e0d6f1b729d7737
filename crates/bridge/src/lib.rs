//! Mapdeck bridge: named-topic snapshot delivery plus fire-and-forget
//! action requests toward the backend.
//!
//! Topics are `tokio::sync::watch` channels, which gives exactly the
//! delivery contract the reconciler assumes: at-least-once, last-value-wins,
//! in order. A topic with no subscribers retains the latest value for late
//! ones. Ordering, retries and connection state are the embedding
//! transport's problem; this hub only models the in-process endpoint.

#![forbid(unsafe_code)]

use std::sync::Mutex;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use mapdeck_core::RawSnapshot;

/// Topic carrying collection-state snapshots from the backend.
pub const COLLECTION_BRIDGE: &str = "collection-state";

/// Backend-side mutations the frontend can trigger. No payload, no reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionRequest {
    ImportFile,
    ImportByMapper,
    ImportFromFolder,
    RefreshLastDirectory,
    ClearAll,
}

impl ActionRequest {
    /// Wire name of the action channel.
    pub fn channel(&self) -> &'static str {
        match self {
            Self::ImportFile => "import-file",
            Self::ImportByMapper => "import-by-mapper",
            Self::ImportFromFolder => "import-from-folder",
            Self::RefreshLastDirectory => "refresh-last-directory",
            Self::ClearAll => "clear-all",
        }
    }
}

/// Transport-edge errors. Malformed payloads are reported here and dropped;
/// they never reach the reconciler.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("malformed payload on '{topic}': not a JSON object")]
    MalformedPayload { topic: String },
}

/// In-process topic hub. Owned and injected explicitly; one per app.
pub struct BridgeHub {
    topics: Mutex<FxHashMap<String, watch::Sender<Option<RawSnapshot>>>>,
    actions: broadcast::Sender<ActionRequest>,
}

impl BridgeHub {
    pub fn new() -> Self {
        let (actions, _) = broadcast::channel(64);
        Self { topics: Mutex::new(FxHashMap::default()), actions }
    }

    fn topic(&self, name: &str) -> watch::Sender<Option<RawSnapshot>> {
        let mut topics = self.topics.lock().unwrap();
        topics
            .entry(name.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .clone()
    }

    /// Publish an already-decoded snapshot. Last value wins.
    pub fn publish(&self, topic: &str, snap: RawSnapshot) {
        self.topic(topic).send_replace(Some(snap));
    }

    /// Decode and publish a wire payload. Non-object payloads are rejected
    /// at this edge so `apply_snapshot` stays infallible downstream.
    pub fn publish_value(&self, topic: &str, raw: &Value) -> Result<(), BridgeError> {
        match RawSnapshot::from_value(raw) {
            Some(snap) => {
                self.publish(topic, snap);
                Ok(())
            }
            None => {
                debug!(topic, "dropping non-object snapshot payload");
                Err(BridgeError::MalformedPayload { topic: topic.to_string() })
            }
        }
    }

    /// Subscribe to a topic. A receiver created after a publish immediately
    /// observes the retained value via `borrow`.
    pub fn subscribe(&self, topic: &str) -> watch::Receiver<Option<RawSnapshot>> {
        self.topic(topic).subscribe()
    }

    /// Fire-and-forget action request. Nobody listening is not an error.
    pub fn request(&self, action: ActionRequest) {
        if self.actions.send(action).is_err() {
            debug!(channel = action.channel(), "action request with no listener");
        }
    }

    pub fn actions(&self) -> broadcast::Receiver<ActionRequest> {
        self.actions.subscribe()
    }
}

impl Default for BridgeHub {
    fn default() -> Self {
        Self::new()
    }
}
