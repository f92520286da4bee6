//! Atom Implementation
//!
//! An Atom is the mutable source of state. External code replaces its value
//! with [`Atom::set_state`]; everything downstream (selectors, bindings)
//! hears about it through the cell's subscriber set.
//!
//! # How Atoms Work
//!
//! 1. `set_state` hands the new value to the cell's update path.
//!
//! 2. If the new `Arc` is the one already stored, nothing happens.
//!
//! 3. Otherwise the value is replaced and every subscriber runs before
//!    `set_state` returns, including any selector recomputation that follows.
//!
//! Atoms do no validation or merging. Callers build the complete next value
//! themselves.

use std::fmt::Debug;
use std::sync::Arc;

use super::cell::ObservableCell;
use super::observable::Observable;
use crate::error::Result;

/// A mutable reactive cell holding a value of type `T`.
///
/// Cloning an `Atom` yields another handle to the same cell.
///
/// # Example
///
/// ```rust
/// use lode_core::reactive::{Atom, Observable};
///
/// let count = Atom::new("count", 0);
/// count.set_state(5).unwrap();
/// assert_eq!(*count.snapshot(), 5);
/// ```
pub struct Atom<T>
where
    T: Send + Sync + 'static,
{
    cell: Arc<ObservableCell<T>>,
}

impl<T> Atom<T>
where
    T: Send + Sync + 'static,
{
    /// Create a new atom. `key` is a debugging tag only.
    pub fn new(key: impl Into<Arc<str>>, value: T) -> Self {
        Self {
            cell: Arc::new(ObservableCell::new(key.into(), Arc::new(value))),
        }
    }

    /// Replace the value and notify subscribers.
    ///
    /// Passing the `Arc` currently stored (for example the result of
    /// `snapshot`) is a no-op. Errors raised by downstream selectors come back
    /// through here.
    pub fn set_state(&self, value: impl Into<Arc<T>>) -> Result<()> {
        self.cell.update(value.into())
    }

    /// Build the next value from the current one, then `set_state` it.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.cell.snapshot());
        self.set_state(next)
    }
}

impl<T> Observable for Atom<T>
where
    T: Send + Sync + 'static,
{
    type Value = T;

    fn cell(&self) -> &Arc<ObservableCell<T>> {
        &self.cell
    }
}

impl<T> Clone for Atom<T>
where
    T: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> Debug for Atom<T>
where
    T: Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Atom")
            .field("id", &self.cell.id())
            .field("key", &self.cell.key())
            .field("value", &self.cell.snapshot())
            .field("subscriber_count", &self.cell.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn atom_snapshot_and_set_state() {
        let atom = Atom::new("count", 0);
        assert_eq!(*atom.snapshot(), 0);

        atom.set_state(42).unwrap();
        assert_eq!(*atom.snapshot(), 42);
    }

    #[test]
    fn atom_update() {
        let atom = Atom::new("count", 10);
        atom.update(|v| v + 5).unwrap();
        assert_eq!(*atom.snapshot(), 15);
    }

    #[test]
    fn atom_notifies_subscribers() {
        let atom = Atom::new("count", 0);
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let _handle = atom.subscribe(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(call_count.load(Ordering::SeqCst), 0);

        atom.set_state(1).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        atom.set_state(2).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn atom_set_state_with_current_value_is_noop() {
        let atom = Atom::new("user", String::from("John"));
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let _handle = atom.subscribe(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        let current = atom.snapshot();
        atom.set_state(current).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn atom_disconnect() {
        let atom = Atom::new("count", 0);
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let before = atom.subscriber_count();
        let handle = atom.subscribe(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(atom.subscriber_count(), before + 1);

        atom.set_state(1).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        handle.disconnect();
        handle.disconnect();
        atom.set_state(2).unwrap();

        // Should not have been called again
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(atom.subscriber_count(), before);
    }

    #[test]
    fn atom_clone_shares_state() {
        let atom1 = Atom::new("shared", 0);
        let atom2 = atom1.clone();

        atom1.set_state(42).unwrap();
        assert_eq!(*atom2.snapshot(), 42);

        atom2.set_state(100).unwrap();
        assert_eq!(*atom1.snapshot(), 100);
        assert_eq!(atom1.id(), atom2.id());
    }

    #[test]
    fn atom_ids_are_unique_and_keys_are_inert() {
        let a1 = Atom::new("same", 0);
        let a2 = Atom::new("same", 0);

        assert_ne!(a1.id(), a2.id());
        assert_eq!(a1.key(), "same");

        a1.set_state(7).unwrap();
        assert_eq!(*a2.snapshot(), 0);
    }
}
