//! The collaborator that turns labels into declarations.
//!
//! The graph never reads files. When it learns about a label whose item is
//! still unknown it asks the [`Loader`] to schedule whatever build file
//! defines that label; the loader later feeds the resulting items back
//! through [`Graph::define_item`](crate::graph::Graph::define_item).
//! Requests may repeat, so implementations de-duplicate them.

use crate::label::Label;
use crate::location::Location;

/// Scheduling interface injected into the graph.
pub trait Loader {
    /// Schedule loading of the build file defining `label`.
    ///
    /// `origin` is the site that first referenced the label.
    fn load(&mut self, label: &Label, origin: &Location);

    /// Report that `toolchain` has been defined and may now be used.
    fn toolchain_loaded(&mut self, toolchain: &Label);

    /// The toolchain whose items are generated by default.
    fn default_toolchain(&self) -> Label;
}
