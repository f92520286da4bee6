//! Python Bindings
//!
//! Exposes atoms to Python. Values are arbitrary Python objects, and the
//! change test is Python identity (`is`), so `atom.set_state(atom.value)`
//! never notifies.

use std::sync::Arc;

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

use crate::error::Error;
use crate::reactive::{Atom, Disconnect, Notify, Observable};

/// Python-exposed Atom type.
///
/// `Py<PyAny>` is Send + Sync, so the Rust atom can hold it directly.
#[pyclass(name = "Atom")]
pub struct PyAtom {
    atom: Atom<Py<PyAny>>,
}

#[pymethods]
impl PyAtom {
    #[new]
    fn new(key: String, value: PyObject) -> Self {
        Self {
            atom: Atom::new(key, value),
        }
    }

    /// Get the current value.
    #[getter]
    fn value(&self, py: Python<'_>) -> PyObject {
        self.atom.snapshot().clone_ref(py)
    }

    #[getter]
    fn key(&self) -> String {
        self.atom.key().to_string()
    }

    /// Replace the value. The same object is a no-op.
    fn set_state(&self, value: PyObject) -> PyResult<()> {
        if self.atom.snapshot().is(&value) {
            return Ok(());
        }
        self.atom
            .set_state(value)
            .map_err(|err| PyRuntimeError::new_err(err.to_string()))
    }

    /// Call `callback()` after every change. Returns a `Disconnect` handle.
    fn subscribe(&self, callback: PyObject) -> PyDisconnect {
        let key: Arc<str> = Arc::from(self.atom.key());
        let notify: Notify = Arc::new(move || {
            Python::with_gil(|py| {
                callback
                    .call0(py)
                    .map(drop)
                    .map_err(|err| Error::Subscriber {
                        key: Arc::clone(&key),
                        source: Box::new(err),
                    })
            })
        });

        PyDisconnect {
            inner: self.atom.cell().attach(notify),
        }
    }

    fn subscriber_count(&self) -> usize {
        self.atom.subscriber_count()
    }

    fn __repr__(&self, py: Python<'_>) -> String {
        let value = self.atom.snapshot();
        let repr = value
            .bind(py)
            .repr()
            .map(|r| r.to_string())
            .unwrap_or_else(|_| "?".to_string());
        format!(
            "Atom(key={}, value={}, subscribers={})",
            self.atom.key(),
            repr,
            self.atom.subscriber_count()
        )
    }
}

/// Handle returned by `Atom.subscribe`.
#[pyclass(name = "Disconnect")]
pub struct PyDisconnect {
    inner: Disconnect,
}

#[pymethods]
impl PyDisconnect {
    /// Remove the subscription. Calling it again does nothing.
    fn disconnect(&self) {
        self.inner.disconnect();
    }

    #[getter]
    fn connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn __repr__(&self) -> String {
        format!("Disconnect(connected={})", self.inner.is_connected())
    }
}
