//! Subscriber types for the reactive system.
//!
//! A Subscriber is a callback registered on an observable cell. Selectors
//! register their recompute hook this way, and so do UI bindings.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::error::Result;

/// Unique identifier for a subscriber.
///
/// Every call to `subscribe` allocates a fresh ID, so subscribing the same
/// closure twice yields two independently removable entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// The callback stored for each subscriber.
///
/// Callbacks take no arguments: a subscriber that needs the new value reads it
/// through `snapshot`, never from a captured copy.
pub(crate) type Notify = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// A subscriber to an observable cell.
pub(crate) struct Subscriber {
    id: SubscriberId,
    notify: Notify,
}

impl Subscriber {
    pub(crate) fn new(notify: Notify) -> Self {
        Self {
            id: SubscriberId::new(),
            notify,
        }
    }

    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    /// A shared handle to the callback, used when snapshotting for an emit.
    pub(crate) fn callback(&self) -> Notify {
        Arc::clone(&self.notify)
    }
}

/// Something a subscriber can be removed from.
pub(crate) trait Detach: Send + Sync {
    /// Remove the subscriber. Returns `false` if it was already gone.
    fn detach(&self, id: SubscriberId) -> bool;
}

/// Handle returned by `subscribe`.
///
/// Calling [`disconnect`](Disconnect::disconnect) removes exactly the callback
/// this handle was created for. Further calls do nothing. Dropping the handle
/// does **not** disconnect: the subscription lives until `disconnect` is
/// called or the cell itself goes away.
pub struct Disconnect {
    id: SubscriberId,
    source: Weak<dyn Detach>,
    connected: AtomicBool,
}

impl Disconnect {
    pub(crate) fn new(id: SubscriberId, source: Weak<dyn Detach>) -> Self {
        Self {
            id,
            source,
            connected: AtomicBool::new(true),
        }
    }

    /// The subscriber this handle removes.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the subscription. Idempotent.
    pub fn disconnect(&self) {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(source) = self.source.upgrade() {
            source.detach(self.id);
        }
    }

    /// Whether `disconnect` has not been called yet.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Disconnect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disconnect")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicI32;

    #[derive(Default)]
    struct Recorder {
        detached: Mutex<Vec<SubscriberId>>,
    }

    impl Detach for Recorder {
        fn detach(&self, id: SubscriberId) -> bool {
            self.detached.lock().push(id);
            true
        }
    }

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn subscriber_callback_shares_closure() {
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let subscriber = Subscriber::new(Arc::new(move || -> Result<()> {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        let first = subscriber.callback();
        let second = subscriber.callback();
        assert!(first().is_ok());
        assert!(second().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn disconnect_detaches_once() {
        let recorder = Arc::new(Recorder::default());
        let weak: Weak<dyn Detach> = Arc::downgrade(&recorder) as Weak<dyn Detach>;
        let id = SubscriberId::new();
        let handle = Disconnect::new(id, weak);

        assert!(handle.is_connected());
        handle.disconnect();
        handle.disconnect();

        assert!(!handle.is_connected());
        assert_eq!(*recorder.detached.lock(), vec![id]);
    }

    #[test]
    fn disconnect_after_source_dropped_is_noop() {
        let recorder = Arc::new(Recorder::default());
        let weak: Weak<dyn Detach> = Arc::downgrade(&recorder) as Weak<dyn Detach>;
        let handle = Disconnect::new(SubscriberId::new(), weak);

        drop(recorder);
        handle.disconnect();
        assert!(!handle.is_connected());
    }
}
