//! Thread-safe handle serialising every mutation of a [`Graph`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Graph, GraphError, RecordStatus};
use crate::item::{Item, ItemType};
use crate::label::Label;
use crate::loader::Loader;
use crate::location::Location;

/// Cloneable handle to a graph behind one lock.
///
/// Each method takes the lock for exactly one graph operation, so several
/// evaluator threads can feed declarations while the graph itself stays
/// single-writer.
#[derive(Debug)]
pub struct SharedGraph<L> {
    inner: Arc<Mutex<Graph<L>>>,
}

impl<L> Clone for SharedGraph<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: Loader> SharedGraph<L> {
    /// Wrap `graph`.
    pub fn new(graph: Graph<L>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Graph<L>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`Graph::define_item`].
    ///
    /// # Errors
    ///
    /// Propagates the graph's error.
    pub fn define_item(&self, item: Item) -> Result<(), GraphError> {
        self.lock().define_item(item)
    }

    /// See [`Graph::get_or_create_record`]; returns the record's status.
    ///
    /// # Errors
    ///
    /// Propagates the graph's error.
    pub fn get_or_create_record(
        &self,
        label: &Label,
        item_type: ItemType,
        origin: &Location,
    ) -> Result<RecordStatus, GraphError> {
        self.lock()
            .get_or_create_record(label, item_type, origin)
            .map(super::Record::status)
    }

    /// See [`Graph::mark_should_generate`].
    pub fn mark_should_generate(&self, label: &Label, force: bool) {
        self.lock().mark_should_generate(label, force);
    }

    /// See [`Graph::check_for_bad_items`].
    ///
    /// # Errors
    ///
    /// Propagates the graph's error.
    pub fn check_for_bad_items(&self) -> Result<(), GraphError> {
        self.lock().check_for_bad_items()
    }

    /// Run `f` with exclusive access to the graph.
    pub fn with<R>(&self, f: impl FnOnce(&mut Graph<L>) -> R) -> R {
        f(&mut self.lock())
    }

    /// Recover the graph once every other handle is gone.
    ///
    /// # Errors
    ///
    /// Returns the handle unchanged while other clones are alive.
    pub fn into_inner(self) -> Result<Graph<L>, Self> {
        Arc::try_unwrap(self.inner)
            .map(|mutex| mutex.into_inner().unwrap_or_else(PoisonError::into_inner))
            .map_err(|inner| Self { inner })
    }
}
