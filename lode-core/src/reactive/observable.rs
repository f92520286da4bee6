//! The read side shared by atoms and selectors.

use std::sync::Arc;

use super::cell::{CellId, ObservableCell};
use super::subscriber::Disconnect;

/// A handle to an [`ObservableCell`].
///
/// Implemented by [`Atom`](super::Atom) and [`Selector`](super::Selector).
/// Everything except [`cell`](Observable::cell) has a default body.
pub trait Observable {
    type Value: Send + Sync + 'static;

    /// The underlying cell.
    fn cell(&self) -> &Arc<ObservableCell<Self::Value>>;

    fn id(&self) -> CellId {
        self.cell().id()
    }

    fn key(&self) -> &str {
        self.cell().key()
    }

    /// The current value. Never stale, never has side effects.
    fn snapshot(&self) -> Arc<Self::Value> {
        self.cell().snapshot()
    }

    /// Run `callback` synchronously after each change to the value.
    ///
    /// The callback receives nothing; it should read the new value through
    /// [`snapshot`](Observable::snapshot).
    fn subscribe<F>(&self, callback: F) -> Disconnect
    where
        F: Fn() + Send + Sync + 'static,
        Self: Sized,
    {
        self.cell().subscribe(callback)
    }

    fn subscriber_count(&self) -> usize {
        self.cell().subscriber_count()
    }
}
