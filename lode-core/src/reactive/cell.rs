//! Observable Cell
//!
//! The cell is the unit all state flows through: one value plus the set of
//! callbacks that want to hear when it is replaced. Atoms and selectors are
//! both built on top of it.
//!
//! # Change Detection
//!
//! Values are stored as `Arc<T>` and compared with `Arc::ptr_eq`. Two
//! structurally equal values in different allocations count as a change.
//! Callers that want an update to be a no-op pass back the `Arc` they got
//! from `snapshot`.
//!
//! # Re-entrancy
//!
//! No lock is held while a subscriber runs. Emit works on a copy of the
//! subscriber list taken when notification starts, so callbacks may
//! subscribe, disconnect or write to the same cell without disturbing the
//! pass in progress.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::trace;

use super::subscriber::{Detach, Disconnect, Notify, Subscriber, SubscriberId};
use crate::error::Result;

/// Process-unique identity of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u64);

impl CellId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A value plus the subscribers interested in it.
pub struct ObservableCell<T>
where
    T: Send + Sync + 'static,
{
    id: CellId,

    /// Debug tag. Has no effect on behavior.
    key: Arc<str>,

    value: RwLock<Arc<T>>,

    /// Insertion ordered so every emit walks subscribers in the same order.
    subscribers: RwLock<IndexMap<SubscriberId, Subscriber>>,
}

impl<T> ObservableCell<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(key: Arc<str>, value: Arc<T>) -> Self {
        Self {
            id: CellId::next(),
            key,
            value: RwLock::new(value),
            subscribers: RwLock::new(IndexMap::new()),
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The current value.
    pub fn snapshot(&self) -> Arc<T> {
        Arc::clone(&self.value.read())
    }

    /// Register `callback` to run after every change.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Disconnect
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.attach(Arc::new(move || -> Result<()> {
            callback();
            Ok(())
        }))
    }

    /// Register a callback whose failure aborts the emit in progress.
    pub(crate) fn attach(self: &Arc<Self>, notify: Notify) -> Disconnect {
        let subscriber = Subscriber::new(notify);
        let id = subscriber.id();
        self.subscribers.write().insert(id, subscriber);

        let source: Weak<dyn Detach> = Arc::downgrade(self) as Weak<dyn Detach>;
        Disconnect::new(id, source)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Replace the value if `value` is a different allocation, then notify.
    ///
    /// Returns the first subscriber error, if any. The new value stays in
    /// place even when a subscriber fails.
    pub(crate) fn update(&self, value: Arc<T>) -> Result<()> {
        {
            let mut current = self.value.write();
            if Arc::ptr_eq(&current, &value) {
                return Ok(());
            }
            *current = value;
        }
        self.emit()
    }

    fn emit(&self) -> Result<()> {
        let callbacks: SmallVec<[Notify; 4]> = self
            .subscribers
            .read()
            .values()
            .map(Subscriber::callback)
            .collect();

        trace!(cell = %self.key, subscribers = callbacks.len(), "value replaced");

        for notify in callbacks {
            notify()?;
        }
        Ok(())
    }
}

impl<T> Detach for ObservableCell<T>
where
    T: Send + Sync + 'static,
{
    fn detach(&self, id: SubscriberId) -> bool {
        self.subscribers.write().shift_remove(&id).is_some()
    }
}

/// Type-erased view of a cell, used by selectors to attach their recompute
/// hook to dependencies of any value type.
pub(crate) trait Attach: Send + Sync {
    fn cell_key(&self) -> &str;

    fn attach_erased(self: Arc<Self>, notify: Notify) -> Disconnect;
}

impl<T> Attach for ObservableCell<T>
where
    T: Send + Sync + 'static,
{
    fn cell_key(&self) -> &str {
        &self.key
    }

    fn attach_erased(self: Arc<Self>, notify: Notify) -> Disconnect {
        self.attach(notify)
    }
}

impl<T> std::fmt::Debug for ObservableCell<T>
where
    T: Send + Sync + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableCell")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("value", &self.snapshot())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;

    fn cell(value: i32) -> Arc<ObservableCell<i32>> {
        Arc::new(ObservableCell::new(Arc::from("test"), Arc::new(value)))
    }

    fn counter() -> (Arc<AtomicI32>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();
        (count, move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn same_allocation_does_not_notify() {
        let cell = cell(1);
        let (count, callback) = counter();
        let _handle = cell.subscribe(callback);

        cell.update(cell.snapshot()).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn equal_value_in_new_allocation_notifies() {
        let cell = cell(1);
        let (count, callback) = counter();
        let _handle = cell.subscribe(callback);

        cell.update(Arc::new(1)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn detach_keeps_remaining_order() {
        let cell = cell(0);
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..3)
            .map(|n| {
                let order = order.clone();
                cell.subscribe(move || order.lock().push(n))
            })
            .collect();

        handles[1].disconnect();
        cell.update(Arc::new(1)).unwrap();

        assert_eq!(*order.lock(), vec![0, 2]);
        assert_eq!(cell.subscriber_count(), 2);
    }

    #[test]
    fn failing_subscriber_stops_the_pass() {
        let cell = cell(0);
        let _failing = cell.attach(Arc::new(|| -> Result<()> {
            Err(crate::Error::Subscriber {
                key: Arc::from("test"),
                source: "boom".into(),
            })
        }));
        let (count, callback) = counter();
        let _after = cell.subscribe(callback);

        assert!(cell.update(Arc::new(1)).is_err());
        assert_eq!(*cell.snapshot(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn subscriber_added_during_emit_waits_for_next_pass() {
        let cell = cell(0);
        let (late_count, late_callback) = counter();
        let late_callback = Arc::new(late_callback);
        let late_handle = Arc::new(parking_lot::Mutex::new(None));

        let cell_clone = cell.clone();
        let late_handle_clone = late_handle.clone();
        let _adder = cell.subscribe(move || {
            let mut slot = late_handle_clone.lock();
            if slot.is_none() {
                let callback = late_callback.clone();
                *slot = Some(cell_clone.subscribe(move || callback()));
            }
        });

        cell.update(Arc::new(1)).unwrap();
        assert_eq!(late_count.load(Ordering::SeqCst), 0);

        cell.update(Arc::new(2)).unwrap();
        assert_eq!(late_count.load(Ordering::SeqCst), 1);
    }
}
