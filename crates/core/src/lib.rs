//! Mapdeck core types: collection and view state shared across the sync layer.

#![forbid(unsafe_code)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod raw;

pub use raw::{coerce_f64, coerce_string, id_seq, RawSnapshot};

/// Beatmap identifier (the `.osu` file path on the backend side).
pub type MapId = String;

/// Opaque item record. The sync layer adopts these wholesale by reference
/// and never inspects their contents.
pub type MapItem = Value;

/// Bulk dataset slice: the full item list plus the todo/done partition.
///
/// Sequences are shared; an unchanged slice keeps its `Arc` identity across
/// updates so reference-equality change detectors downstream stay quiet.
#[derive(Debug, Clone, Default)]
pub struct CollectionState {
    pub items: Arc<Vec<MapItem>>,
    pub todo_ids: Arc<Vec<MapId>>,
    pub done_ids: Arc<Vec<MapId>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    /// Wire string or the default on anything else.
    pub fn parse(v: Option<&Value>) -> Self {
        match v.and_then(Value::as_str) {
            Some("grid") => Self::Grid,
            Some("list") => Self::List,
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortMode {
    #[default]
    Title,
    Artist,
    Mapper,
    StarRating,
    LastModified,
}

impl SortMode {
    pub fn parse(v: Option<&Value>) -> Self {
        match v.and_then(Value::as_str) {
            Some("title") => Self::Title,
            Some("artist") => Self::Artist,
            Some("mapper") => Self::Mapper,
            Some("starRating") => Self::StarRating,
            Some("lastModified") => Self::LastModified,
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn parse(v: Option<&Value>) -> Self {
        match v.and_then(Value::as_str) {
            Some("asc") => Self::Ascending,
            Some("desc") => Self::Descending,
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SortState {
    pub mode: SortMode,
    pub direction: SortDirection,
}

impl SortState {
    /// Expects `{ "mode": ..., "direction": ... }`; each half defaults
    /// independently.
    pub fn parse(v: Option<&Value>) -> Self {
        match v.and_then(Value::as_object) {
            Some(obj) => Self {
                mode: SortMode::parse(obj.get("mode")),
                direction: SortDirection::parse(obj.get("direction")),
            },
            None => Self::default(),
        }
    }
}

/// Star-rating range filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SrFilter {
    pub min: f64,
    pub max: f64,
}

impl Default for SrFilter {
    fn default() -> Self {
        Self { min: 0.0, max: 10.0 }
    }
}

impl SrFilter {
    /// Bounds are coerced to numbers (`"5"` reads as `5`); a missing or
    /// non-numeric bound keeps its default.
    pub fn parse(v: Option<&Value>) -> Self {
        let base = Self::default();
        match v.and_then(Value::as_object) {
            Some(obj) => Self {
                min: coerce_f64(obj.get("min")).unwrap_or(base.min),
                max: coerce_f64(obj.get("max")).unwrap_or(base.max),
            },
            None => base,
        }
    }
}

/// Named toggles, always a full map over the default configuration.
/// Unknown keys sent by the backend pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings(serde_json::Map<String, Value>);

impl Default for Settings {
    /// The documented default configuration, not an empty map.
    fn default() -> Self {
        let mut m = serde_json::Map::new();
        m.insert("groupMapsBySong".into(), Value::Bool(false));
        m.insert("ignoreGuestDifficulties".into(), Value::Bool(false));
        m.insert("showBackgrounds".into(), Value::Bool(true));
        m.insert("autoRefreshOnFocus".into(), Value::Bool(false));
        m.insert("confirmBeforeClear".into(), Value::Bool(true));
        Self(m)
    }
}

impl Settings {
    /// Shallow merge: defaults first, then every key present in the incoming
    /// object overlaid. A non-object input yields the plain defaults.
    pub fn merged(v: Option<&Value>) -> Self {
        let mut out = Self::default();
        if let Some(obj) = v.and_then(Value::as_object) {
            for (k, val) in obj {
                out.0.insert(k.clone(), val.clone());
            }
        }
        out
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Cheap, frequently-changing UI-facing slice.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub view_mode: ViewMode,
    pub sort: SortState,
    pub search_query: String,
    pub sr_filter: SrFilter,
    pub settings: Settings,
    pub effective_mapper_name: String,
    /// Subset/order of `CollectionState::items` currently visible.
    pub items_to_render_ids: Arc<Vec<MapId>>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::default(),
            sort: SortState::default(),
            search_query: String::new(),
            sr_filter: SrFilter::default(),
            settings: Settings::default(),
            effective_mapper_name: String::new(),
            items_to_render_ids: Arc::new(Vec::new()),
        }
    }
}
