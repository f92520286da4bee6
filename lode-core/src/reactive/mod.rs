//! Reactive Primitives
//!
//! This module implements the core reactive system: atoms, selectors, and
//! the bindings that connect them to a UI.
//!
//! # Concepts
//!
//! ## Observable Cells
//!
//! Every node in the system is an [`ObservableCell`]: one value behind an
//! `Arc`, plus an ordered set of subscriber callbacks. Replacing the value
//! with a different `Arc` runs every subscriber before the write returns.
//!
//! ## Atoms
//!
//! An [`Atom`] is a cell that outside code writes to with `set_state`.
//!
//! ## Selectors
//!
//! A [`Selector`] is a cell whose value is computed from other cells. Its
//! generator is given a [`Getter`]; each cell read through it becomes a
//! dependency, subscribed exactly once. A change to any dependency re-runs the
//! generator and forwards the result to the selector's own subscribers.
//!
//! # Implementation Notes
//!
//! Propagation is push-based and synchronous. There is no scheduler, no
//! batching and no global registry: each selector owns the handles for the
//! subscriptions it holds. Dependency tracking goes through the explicit
//! `Getter` argument rather than a thread-local "current observer".

mod atom;
mod binding;
mod cell;
mod getter;
mod observable;
mod selector;
mod subscriber;

pub use atom::Atom;
pub use binding::{Binding, Setter, StateBinding};
pub use cell::{CellId, ObservableCell};
pub use getter::Getter;
pub use observable::Observable;
pub use selector::Selector;
pub use subscriber::{Disconnect, SubscriberId};

#[cfg(feature = "python")]
pub(crate) use subscriber::Notify;
