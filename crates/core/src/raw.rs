//! Raw snapshot boundary: the untrusted wire payload, with the three bulk
//! sequences hoisted into shared vectors so the reconciler can compare them
//! by identity.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{MapId, MapItem};

/// A loosely-typed snapshot as delivered by the bridge.
///
/// `None` on a sequence field covers absent, null and wrong-typed alike; the
/// reconciler falls back to the last accepted reference in all three cases,
/// which is what lets the sender omit unchanged bulk arrays. Everything else
/// stays in `body` and is normalized field by field at reconcile time.
#[derive(Debug, Clone)]
pub struct RawSnapshot {
    pub items: Option<Arc<Vec<MapItem>>>,
    pub todo_ids: Option<Arc<Vec<MapId>>>,
    pub done_ids: Option<Arc<Vec<MapId>>>,
    /// Remaining wire fields, untrusted. Always a JSON object.
    pub body: Value,
}

impl RawSnapshot {
    /// Decode a wire payload. Returns `None` when the payload is not an
    /// object; callers treat that as a complete no-op. The bulk arrays are
    /// copied out of the payload exactly once, here.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let items = obj
            .get("beatmapItems")
            .and_then(Value::as_array)
            .map(|a| Arc::new(a.clone()));
        let todo_ids = obj
            .get("todoIds")
            .and_then(Value::as_array)
            .map(|a| Arc::new(id_seq(a)));
        let done_ids = obj
            .get("doneIds")
            .and_then(Value::as_array)
            .map(|a| Arc::new(id_seq(a)));
        let mut body = Map::with_capacity(obj.len());
        for (k, v) in obj {
            if !matches!(k.as_str(), "beatmapItems" | "todoIds" | "doneIds") {
                body.insert(k.clone(), v.clone());
            }
        }
        Some(Self { items, todo_ids, done_ids, body: Value::Object(body) })
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Sender intent flag; absent or wrong-typed reads as "changed".
    pub fn items_changed(&self) -> bool {
        self.field("itemsChanged").and_then(Value::as_bool).unwrap_or(true)
    }
}

/// Identifier sequences arrive as arrays of strings; non-string elements
/// are dropped.
pub fn id_seq(arr: &[Value]) -> Vec<MapId> {
    arr.iter().filter_map(Value::as_str).map(str::to_owned).collect()
}

/// Numeric coercion for filter bounds: a JSON number, or a string that
/// parses as one. NaN and infinities are rejected.
pub fn coerce_f64(v: Option<&Value>) -> Option<f64> {
    match v {
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// String coercion: anything that is not a JSON string reads as empty.
pub fn coerce_string(v: Option<&Value>) -> String {
    v.and_then(Value::as_str).unwrap_or_default().to_owned()
}
