//! Incremental dependency graph.
//!
//! Declarations arrive in any order. The graph keeps one [`Record`] per label
//! in a map keyed by [`Label`]; records point at each other only by label,
//! so forward references cost nothing. An item resolves once every blocking
//! dependency has resolved, which in turn may release the records waiting
//! on it. Both the resolution cascade and the should-generate flood run on
//! explicit worklists, so deep chains never grow the call stack.
//!
//! ```
//! use musubi::graph::{Graph, RecordStatus};
//! use musubi::item::{Item, ItemKind, Pool};
//! use musubi::label::Label;
//! use musubi::loader::Loader;
//! use musubi::location::Location;
//! use musubi::source::{SourceDir, SourceFile};
//!
//! struct NoLoads(Label);
//!
//! impl Loader for NoLoads {
//!     fn load(&mut self, _: &Label, _: &Location) {}
//!     fn toolchain_loaded(&mut self, _: &Label) {}
//!     fn default_toolchain(&self) -> Label {
//!         self.0.clone()
//!     }
//! }
//!
//! let root = SourceDir::root();
//! let mut graph = Graph::new(NoLoads(Label::new(root.clone(), "tc")));
//! let pool = Label::new(root, "jobs");
//! let at = Location::new(SourceFile::new("//BUILD.gn").expect("file"), 1, 1);
//! graph
//!     .define_item(Item::new(pool.clone(), at, ItemKind::Pool(Pool { depth: 4 })))
//!     .expect("define pool");
//! assert_eq!(graph.record(&pool).map(|r| r.status()), Some(RecordStatus::Resolved));
//! ```

mod cycle;
mod error;
mod record;
mod resolve;
mod shared;

pub use error::GraphError;
pub use record::{Record, RecordStatus};
pub use shared::SharedGraph;

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::{debug, trace};

use crate::item::{Item, ItemReference, ItemType, ReferenceKind};
use crate::label::Label;
use crate::loader::Loader;
use crate::location::Location;

/// Records keyed by label plus the loader that feeds them.
#[derive(Debug)]
pub struct Graph<L> {
    records: BTreeMap<Label, Record>,
    loader: L,
    generated: Vec<Label>,
}

impl<L: Loader> Graph<L> {
    /// An empty graph driving `loader`.
    #[must_use]
    pub const fn new(loader: L) -> Self {
        Self {
            records: BTreeMap::new(),
            loader,
            generated: Vec::new(),
        }
    }

    /// The injected loader.
    #[must_use]
    pub const fn loader(&self) -> &L {
        &self.loader
    }

    /// Mutable access to the injected loader.
    pub const fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    /// Consume the graph, returning its loader.
    #[must_use]
    pub fn into_loader(self) -> L {
        self.loader
    }

    /// Toolchain whose targets are generated by default.
    #[must_use]
    pub fn default_toolchain(&self) -> Label {
        self.loader.default_toolchain()
    }

    /// Record for `label`, if the label was ever mentioned.
    #[must_use]
    pub fn record(&self, label: &Label) -> Option<&Record> {
        self.records.get(label)
    }

    /// Every record in label order.
    #[must_use]
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Definition of `label`, if it arrived.
    #[must_use]
    pub fn item(&self, label: &Label) -> Option<&Item> {
        self.records.get(label).and_then(Record::item)
    }

    /// Resolved items in label order.
    #[must_use]
    pub fn resolved_items(&self) -> Vec<&Item> {
        self.records
            .values()
            .filter(|record| record.is_resolved())
            .filter_map(Record::item)
            .collect()
    }

    /// Drain the labels that became resolved and should-generate since the
    /// last call, in the order that happened.
    pub fn take_generated(&mut self) -> Vec<Label> {
        std::mem::take(&mut self.generated)
    }

    /// Look up the record for `label`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::TypeMismatch`] when the label is already known
    /// as a different item type.
    pub fn get_or_create_record(
        &mut self,
        label: &Label,
        item_type: ItemType,
        origin: &Location,
    ) -> Result<&Record, GraphError> {
        self.ensure_record(label, item_type, origin).map(|record| &*record)
    }

    fn ensure_record(
        &mut self,
        label: &Label,
        item_type: ItemType,
        origin: &Location,
    ) -> Result<&mut Record, GraphError> {
        match self.records.entry(label.clone()) {
            Entry::Vacant(slot) => {
                trace!(label = %label, kind = %item_type, "record created");
                Ok(slot.insert(Record::new(label.clone(), item_type, origin.clone())))
            }
            Entry::Occupied(slot) => {
                let record = slot.into_mut();
                if record.item_type() == item_type {
                    Ok(record)
                } else {
                    Err(GraphError::type_mismatch(
                        label.clone(),
                        (record.item_type(), record.site().clone()),
                        (item_type, origin.clone()),
                    ))
                }
            }
        }
    }

    /// Add a declaration to the graph.
    ///
    /// Wires the item's references, schedules loads for anything still
    /// undefined, propagates the should-generate flag and resolves whatever
    /// becomes resolvable as a result.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::TypeMismatch`] or
    /// [`GraphError::DuplicateDefinition`] for inconsistent declarations, and
    /// the resolution errors ([`GraphError::MissingTool`],
    /// [`GraphError::TestonlyDependency`]) raised by items this definition
    /// allows to resolve.
    pub fn define_item(&mut self, item: Item) -> Result<(), GraphError> {
        let label = item.label().clone();
        let item_type = item.item_type();
        let location = item.location().clone();
        let references = item.references();

        let record = self.ensure_record(&label, item_type, &location)?;
        if let Some(existing) = record.item() {
            return Err(GraphError::duplicate_definition(
                label,
                existing.location().clone(),
                location,
            ));
        }
        record.set_item(item);
        debug!(label = %label, kind = %item_type, "item defined");

        for reference in &references {
            self.add_reference(&label, reference, &location)?;
        }

        let default_toolchain = self.loader.default_toolchain();
        let seeds_generation = match item_type {
            ItemType::Target => label.is_in_toolchain(&default_toolchain),
            ItemType::Toolchain => {
                self.loader.toolchain_loaded(&label);
                label.without_toolchain() == default_toolchain.without_toolchain()
            }
            ItemType::Config | ItemType::Pool => false,
        };
        let already_marked = self
            .records
            .get(&label)
            .is_some_and(Record::should_generate);
        if seeds_generation || already_marked {
            self.mark_should_generate(&label, true);
        }

        self.resolve_from(&label)
    }

    fn add_reference(
        &mut self,
        from: &Label,
        reference: &ItemReference,
        origin: &Location,
    ) -> Result<(), GraphError> {
        let dep = self.ensure_record(&reference.label, reference.item_type, origin)?;
        let dep_defined = dep.item().is_some();
        let dep_resolved = dep.is_resolved();
        if reference.kind == ReferenceKind::Blocking && !dep_resolved {
            dep.add_waiter(from.clone());
        }

        if let Some(source) = self.records.get_mut(from) {
            match reference.kind {
                ReferenceKind::Blocking => {
                    source.add_blocking_dep(reference.label.clone(), dep_resolved);
                }
                ReferenceKind::Gen => source.add_gen_dep(reference.label.clone()),
            }
        }

        if !dep_defined {
            self.schedule_load(&reference.label);
        }
        Ok(())
    }

    fn schedule_load(&mut self, label: &Label) {
        if let Some(record) = self.records.get(label)
            && record.item().is_none()
        {
            trace!(label = %label, origin = %record.origin(), "load requested");
            self.loader.load(label, record.origin());
        }
    }

    /// Flood the should-generate flag from `label` over blocking and gen
    /// deps.
    ///
    /// Records already marked stop the flood, except the starting record when
    /// `force` is set; that re-walks its deps so ones wired after the first
    /// marking are reached too. Dependencies that are still undefined get a
    /// load request.
    pub fn mark_should_generate(&mut self, label: &Label, force: bool) {
        let mut stack = vec![(label.clone(), force)];
        while let Some((current, forced)) = stack.pop() {
            let Some(record) = self.records.get_mut(&current) else {
                continue;
            };
            if !record.should_generate() {
                record.set_should_generate();
                debug!(label = %current, "marked for generation");
                if record.is_resolved() {
                    self.generated.push(current.clone());
                }
            } else if !forced {
                continue;
            }

            let deps: Vec<Label> = record.all_deps().cloned().collect();
            for dep in deps {
                if self.records.get(&dep).is_some_and(|r| !r.should_generate()) {
                    self.schedule_load(&dep);
                    stack.push((dep, false));
                }
            }
        }
    }

    fn resolve_from(&mut self, label: &Label) -> Result<(), GraphError> {
        let mut worklist = vec![label.clone()];
        while let Some(current) = worklist.pop() {
            if !self.records.get(&current).is_some_and(Record::can_resolve) {
                continue;
            }
            for waiter in self.resolve_record(&current)? {
                if let Some(record) = self.records.get_mut(&waiter) {
                    record.dependency_resolved(&current);
                    if record.can_resolve() {
                        worklist.push(waiter);
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve_record(&mut self, label: &Label) -> Result<Vec<Label>, GraphError> {
        let resolution = match self.records.get(label).and_then(Record::item) {
            Some(item) => resolve::resolve_item(&self.records, item)?,
            None => return Ok(Vec::new()),
        };
        let Some(record) = self.records.get_mut(label) else {
            return Ok(Vec::new());
        };
        if let Some(item) = record.item_mut() {
            resolve::apply(item, resolution);
        }
        record.set_resolved();
        debug!(label = %label, "item resolved");
        if record.should_generate() {
            self.generated.push(label.clone());
        }
        Ok(record.take_waiters().into_iter().collect())
    }

    /// Verify that everything marked for generation resolved.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnresolvedDependencies`] when some blocking
    /// dependency was never defined, [`GraphError::DependencyCycle`] when the
    /// stuck items wait on each other, and [`GraphError::UnresolvedItems`]
    /// otherwise.
    pub fn check_for_bad_items(&self) -> Result<(), GraphError> {
        let bad: Vec<&Record> = self
            .records
            .values()
            .filter(|record| record.should_generate() && !record.is_resolved())
            .collect();
        if bad.is_empty() {
            return Ok(());
        }

        let mut missing: Vec<(Label, Label)> = bad
            .iter()
            .flat_map(|record| {
                record
                    .unresolved_deps()
                    .iter()
                    .filter(|dep| self.item(dep).is_none())
                    .map(|dep| (record.label().clone(), dep.clone()))
            })
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(GraphError::UnresolvedDependencies { missing });
        }

        let starts = bad.iter().copied().map(Record::label);
        if let Some(cycle) = cycle::find_cycle(&self.records, starts) {
            return Err(GraphError::DependencyCycle { cycle });
        }

        Err(GraphError::UnresolvedItems {
            labels: bad.iter().map(|record| record.label().clone()).collect(),
        })
    }
}
