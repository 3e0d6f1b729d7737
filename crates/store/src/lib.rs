//! Reactive store primitive: a reference-stable current value plus
//! synchronous subscriber notification on every `set`.
//!
//! The store is deliberately dumb: it notifies on every `set` call and does
//! no value diffing of its own. All change suppression lives in the
//! reconciler, which is what makes reference stability an end-to-end
//! guarantee rather than a store heuristic.

#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use arc_swap::ArcSwap;

pub type Callback<T> = Box<dyn Fn(&Arc<T>) + Send + Sync>;

type SubscriberList<T> = Arc<Mutex<Vec<(u64, Callback<T>)>>>;

/// Minimal capability interface the reconciler depends on. Concrete
/// reactive frameworks sit behind this; tests use [`Store`] directly.
pub trait StateStore<T>: Send + Sync {
    /// Current value. The returned `Arc` keeps its identity until the next
    /// `set`, so callers may use pointer equality as a change detector.
    fn get(&self) -> Arc<T>;

    /// Replace the value wholesale and synchronously notify every current
    /// subscriber with the new value, in subscription order.
    fn set(&self, next: T);

    /// Register a change callback. Dropping the returned handle
    /// unsubscribes.
    fn subscribe(&self, callback: Callback<T>) -> Subscription<T>;
}

/// RAII unsubscribe handle.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription<T> {
    id: u64,
    subs: Weak<Mutex<Vec<(u64, Callback<T>)>>>,
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(subs) = self.subs.upgrade() {
            if let Ok(mut subs) = subs.lock() {
                subs.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

/// In-memory [`StateStore`] backed by an `ArcSwap`.
pub struct Store<T> {
    value: ArcSwap<T>,
    subs: SubscriberList<T>,
    next_id: AtomicU64,
}

impl<T> Store<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: ArcSwap::from_pointee(initial),
            subs: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T: Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Send + Sync> StateStore<T> for Store<T> {
    fn get(&self) -> Arc<T> {
        self.value.load_full()
    }

    fn set(&self, next: T) {
        let next = Arc::new(next);
        self.value.store(Arc::clone(&next));
        // Subscriber list stays locked while callbacks run; callbacks must
        // not re-enter the same store.
        let subs = self.subs.lock().unwrap();
        for (_, cb) in subs.iter() {
            cb(&next);
        }
    }

    fn subscribe(&self, callback: Callback<T>) -> Subscription<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subs.lock().unwrap().push((id, callback));
        Subscription { id, subs: Arc::downgrade(&self.subs) }
    }
}
