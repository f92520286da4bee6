//! Read capability handed to selector generators.
//!
//! A generator never reaches for ambient state to find out who is reading.
//! It receives a `&Getter` and reads every dependency through
//! [`Getter::get`]. The getter returns the current snapshot and remembers
//! which cells the selector is not yet subscribed to, so the selector can
//! attach to them once the generator has finished successfully.

use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use super::cell::{Attach, CellId};
use super::observable::Observable;

/// Cells read during one generator run that still need a subscription.
pub(crate) type Staged = IndexMap<CellId, Arc<dyn Attach>>;

/// Dependency-tracking reader passed to a selector's generator.
pub struct Getter {
    /// Cells the selector was already subscribed to when the run started.
    subscribed: HashSet<CellId>,
    staged: RefCell<Staged>,
}

impl Getter {
    pub(crate) fn new(subscribed: HashSet<CellId>) -> Self {
        Self {
            subscribed,
            staged: RefCell::new(IndexMap::new()),
        }
    }

    /// Read `source` and record it as a dependency.
    ///
    /// Reading the same cell again, in this run or a later one, adds nothing.
    pub fn get<S>(&self, source: &S) -> Arc<S::Value>
    where
        S: Observable,
    {
        let cell = source.cell();
        let id = cell.id();
        if !self.subscribed.contains(&id) {
            self.staged
                .borrow_mut()
                .entry(id)
                .or_insert_with(|| Arc::clone(cell) as Arc<dyn Attach>);
        }
        cell.snapshot()
    }

    pub(crate) fn into_staged(self) -> Staged {
        self.staged.into_inner()
    }
}

impl std::fmt::Debug for Getter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Getter")
            .field("subscribed", &self.subscribed.len())
            .field("staged", &self.staged.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Atom;

    #[test]
    fn getter_returns_current_snapshot() {
        let atom = Atom::new("count", 3);
        let getter = Getter::new(HashSet::new());

        assert_eq!(*getter.get(&atom), 3);
    }

    #[test]
    fn getter_stages_each_cell_once() {
        let a = Atom::new("a", 1);
        let b = Atom::new("b", 2);
        let getter = Getter::new(HashSet::new());

        getter.get(&a);
        getter.get(&b);
        getter.get(&a);

        let staged = getter.into_staged();
        assert_eq!(staged.len(), 2);
        assert_eq!(staged.keys().copied().collect::<Vec<_>>(), vec![a.id(), b.id()]);
    }

    #[test]
    fn getter_skips_already_subscribed_cells() {
        let a = Atom::new("a", 1);
        let b = Atom::new("b", 2);
        let getter = Getter::new(HashSet::from([a.id()]));

        getter.get(&a);
        getter.get(&b);

        let staged = getter.into_staged();
        assert_eq!(staged.len(), 1);
        assert!(staged.contains_key(&b.id()));
        // Staging never subscribes by itself.
        assert_eq!(b.subscriber_count(), 0);
    }
}
