//! Display callbacks
//!
//! Callbacks run after sizing and before rasterization, and may adjust any
//! style option of the [`MoleculeDisplay`].

use std::fmt;
use std::sync::Arc;

use molview_mol::Molecule;

use crate::display::MoleculeDisplay;

/// A mutator applied to every display before it is rasterized
pub trait DisplayCallback: Send + Sync {
    fn apply(&self, display: &mut MoleculeDisplay, mol: &Molecule);
}

impl<F> DisplayCallback for F
where
    F: Fn(&mut MoleculeDisplay, &Molecule) + Send + Sync,
{
    fn apply(&self, display: &mut MoleculeDisplay, mol: &Molecule) {
        self(display, mol)
    }
}

/// Ordered list of display callbacks
///
/// Cloning produces a new list that shares the callbacks themselves but not
/// the list: pushing onto a clone never affects the original.
#[derive(Clone, Default)]
pub struct CallbackList {
    callbacks: Vec<Arc<dyn DisplayCallback>>,
}

impl CallbackList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, callback: impl DisplayCallback + 'static) {
        self.callbacks.push(Arc::new(callback));
    }

    /// Append an already shared callback
    pub fn push_shared(&mut self, callback: Arc<dyn DisplayCallback>) {
        self.callbacks.push(callback);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DisplayCallback>> {
        self.callbacks.iter()
    }

    /// Run every callback in order
    pub fn apply_all(&self, display: &mut MoleculeDisplay, mol: &Molecule) {
        for callback in &self.callbacks {
            callback.apply(display, mol);
        }
    }

    /// Whether both lists are the same allocation
    pub fn same_list(&self, other: &CallbackList) -> bool {
        std::ptr::eq(&self.callbacks, &other.callbacks)
            || (!self.callbacks.is_empty() && self.callbacks.as_ptr() == other.callbacks.as_ptr())
    }
}

impl fmt::Debug for CallbackList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackList")
            .field("len", &self.callbacks.len())
            .finish()
    }
}

impl<C: DisplayCallback + 'static> FromIterator<C> for CallbackList {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        let mut list = CallbackList::new();
        for callback in iter {
            list.push(callback);
        }
        list
    }
}
