//! Selector Implementation
//!
//! A Selector is a derived value. Its generator reads other cells through a
//! [`Getter`], and the selector subscribes to whatever the generator read.
//!
//! # How Selectors Work
//!
//! 1. On construction, the generator runs once. Its result becomes the
//!    initial value directly, without going through the change check.
//!
//! 2. Every cell the generator read gets the selector's recompute hook as a
//!    subscriber, once. Dependencies are discovered, not declared, so a
//!    generator may read different cells depending on runtime data.
//!
//! 3. When any dependency changes, the hook re-runs the generator. New cells
//!    read on this pass are subscribed; cells no longer read stay subscribed.
//!
//! 4. The fresh value goes through the cell's update path: a different `Arc`
//!    replaces the value and notifies the selector's own subscribers, the
//!    same `Arc` stops propagation here.
//!
//! # Failure
//!
//! A generator error leaves the previous value and subscriptions untouched.
//! Cells read during the failed run are not subscribed. The error is returned
//! to whoever triggered the recompute.
//!
//! # Glitches
//!
//! There is no transaction. A selector that reads two cells sharing an
//! upstream source recomputes once per upstream notification and can expose
//! an intermediate value in between. Callers that need a consistent view
//! must combine their updates into a single `set_state`.

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;

use super::cell::{CellId, ObservableCell};
use super::getter::{Getter, Staged};
use super::observable::Observable;
use super::subscriber::{Disconnect, Notify};
use crate::error::{BoxError, Error, Result};

type GeneratorResult<T> = std::result::Result<Arc<T>, BoxError>;

type Generator<T> = Box<dyn Fn(&Getter) -> GeneratorResult<T> + Send + Sync>;

struct SelectorInner<T>
where
    T: Send + Sync + 'static,
{
    cell: Arc<ObservableCell<T>>,

    generator: Generator<T>,

    /// Subscriptions held on dependencies. Only ever grows while the
    /// selector is alive.
    dependencies: Mutex<IndexMap<CellId, Disconnect>>,
}

impl<T> SelectorInner<T>
where
    T: Send + Sync + 'static,
{
    /// Re-run the generator and push the result through the update path.
    fn recompute(self: &Arc<Self>) -> Result<()> {
        let subscribed = self.dependencies.lock().keys().copied().collect();
        let (value, staged) = evaluate(self.cell.key(), &self.generator, subscribed)?;
        self.attach_staged(staged);
        self.cell.update(value)
    }

    fn attach_staged(self: &Arc<Self>, staged: Staged) {
        if staged.is_empty() {
            return;
        }

        // A nested recompute may have attached some of these already.
        let mut dependencies = self.dependencies.lock();
        for (id, source) in staged {
            if dependencies.contains_key(&id) {
                continue;
            }
            debug!(
                selector = %self.cell.key(),
                dependency = %source.cell_key(),
                "subscribing to dependency"
            );
            let disconnect = source.attach_erased(recompute_hook(Arc::downgrade(self)));
            dependencies.insert(id, disconnect);
        }
    }
}

/// The callback a selector places on each of its dependencies.
///
/// Holds the selector weakly, so dependencies never keep it alive.
fn recompute_hook<T>(selector: Weak<SelectorInner<T>>) -> Notify
where
    T: Send + Sync + 'static,
{
    Arc::new(move || match selector.upgrade() {
        Some(inner) => inner.recompute(),
        None => Ok(()),
    })
}

fn evaluate<T>(
    key: &str,
    generator: &Generator<T>,
    subscribed: HashSet<CellId>,
) -> Result<(Arc<T>, Staged)>
where
    T: Send + Sync + 'static,
{
    let getter = Getter::new(subscribed);
    match generator(&getter) {
        Ok(value) => Ok((value, getter.into_staged())),
        Err(source) => {
            debug!(selector = %key, error = %source, "generator failed");
            Err(Error::Generator {
                key: Arc::from(key),
                source,
            })
        }
    }
}

impl<T> Drop for SelectorInner<T>
where
    T: Send + Sync + 'static,
{
    fn drop(&mut self) {
        for (_, disconnect) in self.dependencies.get_mut().drain(..) {
            disconnect.disconnect();
        }
    }
}

/// A value derived from other cells.
///
/// Cloning a `Selector` yields another handle to the same selector. The
/// selector stops recomputing once every handle has been dropped.
///
/// # Example
///
/// ```rust
/// use lode_core::reactive::{Atom, Observable, Selector};
///
/// let count = Atom::new("count", 2);
/// let source = count.clone();
/// let doubled = Selector::new("doubled", move |cx| *cx.get(&source) * 2);
///
/// count.set_state(5).unwrap();
/// assert_eq!(*doubled.snapshot(), 10);
/// ```
pub struct Selector<T>
where
    T: Send + Sync + 'static,
{
    inner: Arc<SelectorInner<T>>,
}

impl<T> Selector<T>
where
    T: Send + Sync + 'static,
{
    /// Create a selector from an infallible generator.
    ///
    /// Each run wraps its result in a new `Arc`, so every recompute counts as
    /// a change for this selector's subscribers.
    pub fn new<F>(key: impl Into<Arc<str>>, generator: F) -> Self
    where
        F: Fn(&Getter) -> T + Send + Sync + 'static,
    {
        let getter = Getter::new(HashSet::new());
        let value = Arc::new(generator(&getter));
        let generator: Generator<T> =
            Box::new(move |cx: &Getter| -> GeneratorResult<T> { Ok(Arc::new(generator(cx))) });
        Self::assemble(key.into(), generator, value, getter.into_staged())
    }

    /// Create a selector whose generator may fail.
    ///
    /// A failure during this first run is returned here.
    pub fn try_new<F, E>(key: impl Into<Arc<str>>, generator: F) -> Result<Self>
    where
        F: Fn(&Getter) -> std::result::Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let key = key.into();
        let generator: Generator<T> =
            Box::new(move |cx: &Getter| -> GeneratorResult<T> {
                generator(cx).map(Arc::new).map_err(Into::into)
            });
        let (value, staged) = evaluate(&key, &generator, HashSet::new())?;
        Ok(Self::assemble(key, generator, value, staged))
    }

    /// Create a selector whose generator decides the identity of its result.
    ///
    /// Returning the `Arc` already held (for instance one passed through
    /// from a dependency) stops propagation at this selector.
    pub fn new_shared<F>(key: impl Into<Arc<str>>, generator: F) -> Self
    where
        F: Fn(&Getter) -> Arc<T> + Send + Sync + 'static,
    {
        let getter = Getter::new(HashSet::new());
        let value = generator(&getter);
        let generator: Generator<T> =
            Box::new(move |cx: &Getter| -> GeneratorResult<T> { Ok(generator(cx)) });
        Self::assemble(key.into(), generator, value, getter.into_staged())
    }

    /// Wrap the first run's result. Initialization skips the change check.
    fn assemble(key: Arc<str>, generator: Generator<T>, value: Arc<T>, staged: Staged) -> Self {
        let inner = Arc::new(SelectorInner {
            cell: Arc::new(ObservableCell::new(key, value)),
            generator,
            dependencies: Mutex::new(IndexMap::new()),
        });
        inner.attach_staged(staged);

        Self { inner }
    }

    /// Number of cells this selector is subscribed to.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.lock().len()
    }
}

impl<T> Observable for Selector<T>
where
    T: Send + Sync + 'static,
{
    type Value = T;

    fn cell(&self) -> &Arc<ObservableCell<T>> {
        &self.inner.cell
    }
}

impl<T> Clone for Selector<T>
where
    T: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Selector<T>
where
    T: Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("id", &self.inner.cell.id())
            .field("key", &self.inner.cell.key())
            .field("value", &self.inner.cell.snapshot())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
