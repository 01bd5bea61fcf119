//! Declared build entities.
//!
//! Every entity the evaluator produces is an [`Item`]: a label, the place it
//! was declared, the files consumed while evaluating it, and one of four
//! payloads (see [`ItemKind`]). Items refer to each other only through
//! labels, so an item may be defined before anything it mentions exists.
//!
//! # Examples
//!
//! ```
//! use musubi::item::{Item, ItemKind, ItemType, OutputType, ReferenceKind, Target};
//! use musubi::label::Label;
//! use musubi::location::Location;
//! use musubi::source::{SourceDir, SourceFile};
//!
//! let root = SourceDir::root();
//! let toolchain = Label::resolve(&root, None, "//tc:host").expect("toolchain");
//! let label = Label::resolve(&root, Some(&toolchain), "//:app").expect("label");
//! let mut target = Target::new(OutputType::Executable, toolchain.clone());
//! target.private_deps.push(Label::resolve(&root, Some(&toolchain), "//:lib").expect("dep"));
//! let location = Location::new(SourceFile::new("//BUILD.gn").expect("file"), 1, 1);
//! let item = Item::new(label, location, ItemKind::Target(target));
//!
//! assert_eq!(item.item_type(), ItemType::Target);
//! let refs = item.references();
//! assert_eq!(refs.len(), 2);
//! assert!(refs.iter().all(|r| r.kind == ReferenceKind::Blocking));
//! ```

mod config;
mod pool;
mod target;
mod toolchain;

pub use config::{Config, ConfigValues};
pub use pool::Pool;
pub use target::{ActionValues, OutputType, ResolvedTarget, Target};
pub use toolchain::{Tool, Toolchain};

use crate::label::Label;
use crate::location::Location;
use crate::source::SourceFile;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Type tag for an [`Item`] or a record that expects one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// A buildable target.
    Target,
    /// A reusable bundle of compiler settings.
    Config,
    /// A set of tools used to build targets.
    Toolchain,
    /// A concurrency limit shared by actions or tools.
    Pool,
}

impl ItemType {
    /// Lower-case name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Target => "target",
            Self::Config => "config",
            Self::Toolchain => "toolchain",
            Self::Pool => "pool",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an edge holds back resolution of its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// The source cannot resolve before the destination.
    Blocking,
    /// The edge only carries the should-generate flag.
    Gen,
}

/// One outgoing reference of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReference {
    /// Referenced label.
    pub label: Label,
    /// Type the referenced item must have.
    pub item_type: ItemType,
    /// Edge kind.
    pub kind: ReferenceKind,
}

impl ItemReference {
    fn blocking(label: &Label, item_type: ItemType) -> Self {
        Self {
            label: label.clone(),
            item_type,
            kind: ReferenceKind::Blocking,
        }
    }

    fn generated(label: &Label) -> Self {
        Self {
            label: label.clone(),
            item_type: ItemType::Target,
            kind: ReferenceKind::Gen,
        }
    }
}

/// Type-specific payload of an [`Item`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// See [`Target`].
    Target(Target),
    /// See [`Config`].
    Config(Config),
    /// See [`Toolchain`].
    Toolchain(Toolchain),
    /// See [`Pool`].
    Pool(Pool),
}

/// A declared build entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    label: Label,
    location: Location,
    build_dependency_files: BTreeSet<SourceFile>,
    #[serde(flatten)]
    kind: ItemKind,
}

impl Item {
    /// Construct an item with no build dependency files.
    #[must_use]
    pub const fn new(label: Label, location: Location, kind: ItemKind) -> Self {
        Self {
            label,
            location,
            build_dependency_files: BTreeSet::new(),
            kind,
        }
    }

    /// Attach the files consumed while evaluating the declaration.
    #[must_use]
    pub fn with_build_dependency_files(
        mut self,
        files: impl IntoIterator<Item = SourceFile>,
    ) -> Self {
        self.build_dependency_files.extend(files);
        self
    }

    /// Identity of the item.
    #[must_use]
    pub const fn label(&self) -> &Label {
        &self.label
    }

    /// Where the item was declared.
    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// Files read while evaluating the declaration.
    #[must_use]
    pub const fn build_dependency_files(&self) -> &BTreeSet<SourceFile> {
        &self.build_dependency_files
    }

    /// Type-specific payload.
    #[must_use]
    pub const fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub(crate) const fn kind_mut(&mut self) -> &mut ItemKind {
        &mut self.kind
    }

    /// Type tag of the payload.
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        match self.kind {
            ItemKind::Target(_) => ItemType::Target,
            ItemKind::Config(_) => ItemType::Config,
            ItemKind::Toolchain(_) => ItemType::Toolchain,
            ItemKind::Pool(_) => ItemType::Pool,
        }
    }

    /// The target payload, if this is a target.
    #[must_use]
    pub const fn as_target(&self) -> Option<&Target> {
        match &self.kind {
            ItemKind::Target(target) => Some(target),
            _ => None,
        }
    }

    /// The config payload, if this is a config.
    #[must_use]
    pub const fn as_config(&self) -> Option<&Config> {
        match &self.kind {
            ItemKind::Config(config) => Some(config),
            _ => None,
        }
    }

    /// The toolchain payload, if this is a toolchain.
    #[must_use]
    pub const fn as_toolchain(&self) -> Option<&Toolchain> {
        match &self.kind {
            ItemKind::Toolchain(toolchain) => Some(toolchain),
            _ => None,
        }
    }

    /// The pool payload, if this is a pool.
    #[must_use]
    pub const fn as_pool(&self) -> Option<&Pool> {
        match &self.kind {
            ItemKind::Pool(pool) => Some(pool),
            _ => None,
        }
    }

    /// Every outgoing reference, in wiring order.
    ///
    /// Targets list their public, private and data deps, their configs,
    /// all-dependent configs and public configs, their pool, their toolchain
    /// and finally their gen deps. Configs list nested configs. Toolchains
    /// list their deps followed by the pools of their tools. Pools reference
    /// nothing.
    #[must_use]
    pub fn references(&self) -> Vec<ItemReference> {
        let mut refs = Vec::new();
        match &self.kind {
            ItemKind::Target(target) => {
                refs.extend(
                    target
                        .all_deps()
                        .map(|dep| ItemReference::blocking(dep, ItemType::Target)),
                );
                refs.extend(
                    target
                        .configs
                        .iter()
                        .chain(&target.all_dependent_configs)
                        .chain(&target.public_configs)
                        .map(|config| ItemReference::blocking(config, ItemType::Config)),
                );
                if let Some(pool) = &target.pool {
                    refs.push(ItemReference::blocking(pool, ItemType::Pool));
                }
                refs.push(ItemReference::blocking(
                    &target.toolchain,
                    ItemType::Toolchain,
                ));
                refs.extend(target.gen_deps.iter().map(ItemReference::generated));
            }
            ItemKind::Config(config) => {
                refs.extend(
                    config
                        .configs
                        .iter()
                        .map(|nested| ItemReference::blocking(nested, ItemType::Config)),
                );
            }
            ItemKind::Toolchain(toolchain) => {
                refs.extend(
                    toolchain
                        .deps
                        .iter()
                        .map(|dep| ItemReference::blocking(dep, ItemType::Target)),
                );
                refs.extend(
                    toolchain
                        .tool_pools()
                        .map(|pool| ItemReference::blocking(pool, ItemType::Pool)),
                );
            }
            ItemKind::Pool(_) => {}
        }
        refs
    }
}
