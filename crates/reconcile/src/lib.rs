//! Snapshot reconciler: decides, per incoming snapshot, which slices of
//! local state to republish and which to leave reference-stable so that
//! identity-based change detectors downstream do not fire spuriously.
//!
//! Two slices, two policies. The bulk collection slice is compared by
//! sequence identity against the last accepted references, O(1) regardless
//! of item count; the sender keeps a reference stable when content is
//! unchanged. The cheap view slice is rebuilt in full from the payload and
//! compared field by field against the published value.

#![forbid(unsafe_code)]

use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use tracing::debug;

use mapdeck_core::{
    coerce_string, id_seq, CollectionState, MapId, MapItem, RawSnapshot, Settings, SortState,
    SrFilter, ViewMode, ViewState,
};
use mapdeck_store::StateStore;

/// Settings keys that participate in view change detection. Keys outside
/// this list ride along with any publish but never trigger one on their
/// own, which keeps toggle churn from re-render-storming the item grid.
pub const RENDER_RELEVANT_SETTINGS: [&str; 3] =
    ["groupMapsBySong", "ignoreGuestDifficulties", "showBackgrounds"];

/// Last accepted bulk sequence references. Identity, not content: trusting
/// the sender's same-reference-means-same-content contract is what keeps
/// the check constant-time.
#[derive(Default)]
struct ChangeGuard {
    items: Option<Arc<Vec<MapItem>>>,
    todo_ids: Option<Arc<Vec<MapId>>>,
    done_ids: Option<Arc<Vec<MapId>>>,
}

pub struct Reconciler {
    collection: Arc<dyn StateStore<CollectionState>>,
    view: Arc<dyn StateStore<ViewState>>,
    guard: ChangeGuard,
}

impl Reconciler {
    pub fn new(
        collection: Arc<dyn StateStore<CollectionState>>,
        view: Arc<dyn StateStore<ViewState>>,
    ) -> Self {
        Self { collection, view, guard: ChangeGuard::default() }
    }

    /// Apply a wire payload. Anything that is not a JSON object is a
    /// complete no-op; malformed fields inside an object degrade to their
    /// defaults. Never fails, never panics, safe to call in bursts.
    pub fn apply_value(&mut self, raw: &Value) {
        if let Some(snap) = RawSnapshot::from_value(raw) {
            self.apply_snapshot(&snap);
        }
    }

    /// Apply a decoded snapshot: collection slice first, then view slice.
    /// Each may publish at most once; publishing notifies store subscribers
    /// synchronously before this call returns.
    pub fn apply_snapshot(&mut self, snap: &RawSnapshot) {
        counter!("reconcile_snapshots_total", 1u64);
        self.reconcile_collection(snap);
        self.reconcile_view(snap);
    }

    fn reconcile_collection(&mut self, snap: &RawSnapshot) {
        // A missing or wrong-typed sequence falls back to the last accepted
        // reference, so the sender may omit unchanged bulk arrays.
        let items = snap.items.clone().or_else(|| self.guard.items.clone());
        let todo_ids = snap.todo_ids.clone().or_else(|| self.guard.todo_ids.clone());
        let done_ids = snap.done_ids.clone().or_else(|| self.guard.done_ids.clone());

        // Explicit "unchanged" from the sender skips the identity check
        // outright. A sender that asserts this while shipping new content
        // leaves the collection stale; that is the sender's contract to
        // honor, not ours to second-guess.
        if !snap.items_changed() {
            debug!("sender asserted itemsChanged=false; collection left untouched");
            return;
        }

        let changed = !same_seq(&items, &self.guard.items)
            || !same_seq(&todo_ids, &self.guard.todo_ids)
            || !same_seq(&done_ids, &self.guard.done_ids);
        if !changed {
            return;
        }

        self.guard.items = items.clone();
        self.guard.todo_ids = todo_ids.clone();
        self.guard.done_ids = done_ids.clone();
        counter!("reconcile_collection_published_total", 1u64);
        debug!(items = items.as_deref().map_or(0, Vec::len), "collection snapshot adopted");
        self.collection.set(CollectionState {
            items: items.unwrap_or_default(),
            todo_ids: todo_ids.unwrap_or_default(),
            done_ids: done_ids.unwrap_or_default(),
        });
    }

    fn reconcile_view(&mut self, snap: &RawSnapshot) {
        let current = self.view.get();
        let candidate = view_candidate(snap, &current);
        if !view_differs(&candidate, &current) {
            return;
        }
        counter!("reconcile_view_published_total", 1u64);
        debug!("view snapshot adopted");
        self.view.set(candidate);
    }
}

/// Identity comparison on optional shared sequences.
fn same_seq<T>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Build a fully typed view candidate. Every field defaults independently;
/// one malformed field never drags the rest down with it.
fn view_candidate(snap: &RawSnapshot, current: &ViewState) -> ViewState {
    ViewState {
        view_mode: ViewMode::parse(snap.field("viewMode")),
        sort: SortState::parse(snap.field("sortState")),
        search_query: coerce_string(snap.field("searchQuery")),
        sr_filter: SrFilter::parse(snap.field("srFilter")),
        settings: Settings::merged(snap.field("settings")),
        effective_mapper_name: coerce_string(snap.field("effectiveMapperName")),
        items_to_render_ids: render_ids(snap.field("itemsToRenderIds"), current),
    }
}

/// Sequence field: falls back to the currently published value, not to
/// empty, when the sender omits it.
fn render_ids(v: Option<&Value>, current: &ViewState) -> Arc<Vec<MapId>> {
    match v.and_then(Value::as_array) {
        Some(arr) => Arc::new(id_seq(arr)),
        None => Arc::clone(&current.items_to_render_ids),
    }
}

/// The fixed comparison list gating a view publish. `items_to_render_ids`
/// and settings keys outside [`RENDER_RELEVANT_SETTINGS`] are absent on
/// purpose: they ride along whenever anything listed here changes, but a
/// change limited to them alone does not publish.
fn view_differs(candidate: &ViewState, current: &ViewState) -> bool {
    if candidate.view_mode != current.view_mode
        || candidate.sort != current.sort
        || candidate.search_query != current.search_query
        || candidate.effective_mapper_name != current.effective_mapper_name
        || candidate.sr_filter.min != current.sr_filter.min
        || candidate.sr_filter.max != current.sr_filter.max
    {
        return true;
    }
    RENDER_RELEVANT_SETTINGS
        .iter()
        .any(|key| candidate.settings.get(key) != current.settings.get(key))
}
