//! Lode Core
//!
//! This crate provides the core of the Lode reactive state container.
//! It implements:
//!
//! - Atoms: shared mutable state
//! - Selectors: derived values with runtime-discovered dependencies
//! - Bindings: the hook between a cell and a component's re-render trigger
//!
//! The crate is designed to be used both as a native Rust library and, with
//! the `python` feature, as a Python extension module via PyO3.
//!
//! # Architecture
//!
//! - `reactive`: cells, atoms, selectors, bindings and dependency tracking
//! - `error`: the error type returned when a generator fails mid-update
//!
//! # Example
//!
//! ```rust
//! use lode_core::reactive::{Atom, Observable, Selector};
//!
//! let name = Atom::new("name", String::from("John"));
//! let age = Atom::new("age", 20);
//!
//! let (n, a) = (name.clone(), age.clone());
//! let info = Selector::new("info", move |cx| format!("{} is {}", cx.get(&n), cx.get(&a)));
//! assert_eq!(info.snapshot().as_str(), "John is 20");
//!
//! name.set_state(String::from("Sarah")).unwrap();
//! age.set_state(30).unwrap();
//! assert_eq!(info.snapshot().as_str(), "Sarah is 30");
//! ```

pub mod error;
pub mod reactive;

#[cfg(feature = "python")]
mod python;

pub use error::{BoxError, Error, Result};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module definition.
///
/// This function is called by Python when importing the module.
/// It registers all Python-exposed types and functions.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyAtom>()?;
    m.add_class::<python::PyDisconnect>()?;

    // Add version info
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
