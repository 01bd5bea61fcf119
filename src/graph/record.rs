//! Per-label bookkeeping.

use crate::item::{Item, ItemType};
use crate::label::Label;
use crate::location::Location;
use std::collections::BTreeSet;

/// Coarse state of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    /// Referenced but not yet defined.
    Unknown,
    /// Defined, still waiting on blocking deps.
    DefinedUnresolved,
    /// Defined with every blocking dep resolved.
    Resolved,
}

/// Everything the graph knows about one label.
///
/// A record exists as soon as the label is referenced. It gains its item
/// when the declaration arrives and becomes resolved once every blocking
/// dependency has resolved.
#[derive(Debug, Clone)]
pub struct Record {
    label: Label,
    item_type: ItemType,
    origin: Location,
    item: Option<Item>,
    should_generate: bool,
    resolved: bool,
    blocking_deps: BTreeSet<Label>,
    unresolved_deps: BTreeSet<Label>,
    gen_deps: BTreeSet<Label>,
    waiters: BTreeSet<Label>,
}

impl Record {
    pub(crate) const fn new(label: Label, item_type: ItemType, origin: Location) -> Self {
        Self {
            label,
            item_type,
            origin,
            item: None,
            should_generate: false,
            resolved: false,
            blocking_deps: BTreeSet::new(),
            unresolved_deps: BTreeSet::new(),
            gen_deps: BTreeSet::new(),
            waiters: BTreeSet::new(),
        }
    }

    /// Label this record tracks.
    #[must_use]
    pub const fn label(&self) -> &Label {
        &self.label
    }

    /// Type every reference and the definition must agree on.
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Site of the first reference or definition.
    #[must_use]
    pub const fn origin(&self) -> &Location {
        &self.origin
    }

    /// The definition, once it has arrived.
    #[must_use]
    pub const fn item(&self) -> Option<&Item> {
        self.item.as_ref()
    }

    /// Declaration site when defined, first reference otherwise.
    #[must_use]
    pub fn site(&self) -> &Location {
        self.item.as_ref().map_or(&self.origin, Item::location)
    }

    /// Whether the item must be generated.
    #[must_use]
    pub const fn should_generate(&self) -> bool {
        self.should_generate
    }

    /// Whether the item has resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Coarse state.
    #[must_use]
    pub const fn status(&self) -> RecordStatus {
        match (&self.item, self.resolved) {
            (None, _) => RecordStatus::Unknown,
            (Some(_), false) => RecordStatus::DefinedUnresolved,
            (Some(_), true) => RecordStatus::Resolved,
        }
    }

    /// Deps that hold back resolution.
    #[must_use]
    pub const fn blocking_deps(&self) -> &BTreeSet<Label> {
        &self.blocking_deps
    }

    /// Blocking deps not yet resolved.
    #[must_use]
    pub const fn unresolved_deps(&self) -> &BTreeSet<Label> {
        &self.unresolved_deps
    }

    /// Deps that only inherit the should-generate flag.
    #[must_use]
    pub const fn gen_deps(&self) -> &BTreeSet<Label> {
        &self.gen_deps
    }

    /// Records blocked on this one.
    #[must_use]
    pub const fn waiters(&self) -> &BTreeSet<Label> {
        &self.waiters
    }

    /// Blocking deps followed by gen deps.
    pub fn all_deps(&self) -> impl Iterator<Item = &Label> {
        self.blocking_deps.iter().chain(&self.gen_deps)
    }

    /// Defined, not yet resolved, and nothing left to wait for.
    #[must_use]
    pub fn can_resolve(&self) -> bool {
        self.item.is_some() && !self.resolved && self.unresolved_deps.is_empty()
    }

    pub(crate) fn set_item(&mut self, item: Item) {
        self.item = Some(item);
    }

    pub(crate) const fn item_mut(&mut self) -> Option<&mut Item> {
        self.item.as_mut()
    }

    pub(crate) const fn set_should_generate(&mut self) {
        self.should_generate = true;
    }

    pub(crate) const fn set_resolved(&mut self) {
        self.resolved = true;
    }

    pub(crate) fn add_blocking_dep(&mut self, dep: Label, dep_resolved: bool) {
        if !dep_resolved {
            self.unresolved_deps.insert(dep.clone());
        }
        self.blocking_deps.insert(dep);
    }

    pub(crate) fn add_gen_dep(&mut self, dep: Label) {
        self.gen_deps.insert(dep);
    }

    pub(crate) fn add_waiter(&mut self, waiter: Label) {
        self.waiters.insert(waiter);
    }

    pub(crate) fn dependency_resolved(&mut self, dep: &Label) {
        self.unresolved_deps.remove(dep);
    }

    pub(crate) fn take_waiters(&mut self) -> BTreeSet<Label> {
        std::mem::take(&mut self.waiters)
    }
}
