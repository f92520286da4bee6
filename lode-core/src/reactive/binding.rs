//! Binding Adapter
//!
//! Connects a component's re-render trigger to a cell without tying the crate
//! to any UI framework. Create one binding per mounted component instance:
//!
//! - The first [`Binding::value`] call subscribes the trigger. Later calls
//!   only read.
//! - [`Binding::unbind`], or dropping the binding on teardown, disconnects.
//!
//! So each (cell, mounted component) pair has at most one live subscription,
//! and none once the component is gone.

use std::sync::Arc;

use parking_lot::Mutex;

use super::atom::Atom;
use super::observable::Observable;
use super::subscriber::Disconnect;
use crate::error::Result;

type Rerender = Arc<dyn Fn() + Send + Sync>;

/// Read-only binding of a component to a cell.
pub struct Binding<S>
where
    S: Observable,
{
    source: S,
    rerender: Rerender,
    connection: Mutex<Option<Disconnect>>,
}

impl<S> Binding<S>
where
    S: Observable,
{
    /// Bind `source` to the component's `rerender` trigger.
    ///
    /// Nothing is subscribed until the first call to [`value`](Self::value).
    pub fn new<F>(source: S, rerender: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            source,
            rerender: Arc::new(rerender),
            connection: Mutex::new(None),
        }
    }

    /// Current value of the bound cell, subscribing on first use.
    pub fn value(&self) -> Arc<S::Value> {
        let mut connection = self.connection.lock();
        if connection.is_none() {
            let rerender = Arc::clone(&self.rerender);
            *connection = Some(self.source.subscribe(move || rerender()));
        }
        drop(connection);
        self.source.snapshot()
    }

    /// Disconnect the trigger. A later `value` call subscribes again.
    pub fn unbind(&self) {
        if let Some(connection) = self.connection.lock().take() {
            connection.disconnect();
        }
    }

    pub fn is_bound(&self) -> bool {
        self.connection.lock().is_some()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S> Drop for Binding<S>
where
    S: Observable,
{
    fn drop(&mut self) {
        self.unbind();
    }
}

/// Stable setter for an atom, handed out by [`StateBinding::setter`].
///
/// Two setters compare equal when they write to the same atom.
pub struct Setter<T>
where
    T: Send + Sync + 'static,
{
    atom: Atom<T>,
}

impl<T> Setter<T>
where
    T: Send + Sync + 'static,
{
    /// Same as [`Atom::set_state`].
    pub fn set(&self, value: impl Into<Arc<T>>) -> Result<()> {
        self.atom.set_state(value)
    }
}

impl<T> Clone for Setter<T>
where
    T: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            atom: self.atom.clone(),
        }
    }
}

impl<T> PartialEq for Setter<T>
where
    T: Send + Sync + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        self.atom.id() == other.atom.id()
    }
}

impl<T> Eq for Setter<T> where T: Send + Sync + 'static {}

impl<T> std::fmt::Debug for Setter<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Setter")
            .field("atom", &self.atom.id())
            .field("key", &self.atom.key())
            .finish()
    }
}

/// Read-write binding of a component to an atom.
pub struct StateBinding<T>
where
    T: Send + Sync + 'static,
{
    binding: Binding<Atom<T>>,
    setter: Setter<T>,
}

impl<T> StateBinding<T>
where
    T: Send + Sync + 'static,
{
    pub fn new<F>(atom: Atom<T>, rerender: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let setter = Setter { atom: atom.clone() };
        Self {
            binding: Binding::new(atom, rerender),
            setter,
        }
    }

    pub fn value(&self) -> Arc<T> {
        self.binding.value()
    }

    /// The setter for this binding. Every call returns an equal setter.
    pub fn setter(&self) -> Setter<T> {
        self.setter.clone()
    }

    /// Current value together with the setter.
    pub fn state(&self) -> (Arc<T>, Setter<T>) {
        (self.value(), self.setter())
    }

    pub fn unbind(&self) {
        self.binding.unbind();
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_bound()
    }
}
