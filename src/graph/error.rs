//! Fatal graph construction errors.
//!
//! Each variant is reported once, with the declaration sites needed to fix
//! the offending declarations; none of them is recoverable.

// The miette and thiserror derives trip `unused_assignments` on some
// compiler versions, and `#[expect]` fails on the versions where it does not.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use crate::item::ItemType;
use crate::label::Label;
use crate::location::Location;
use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while building or checking the graph.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A label was used as one item type and declared as another.
    ///
    /// The two uses are ordered by site, so the report does not depend on
    /// which declaration arrived first.
    #[error("{label} is used as a {first} (at {first_site}) and as a {second} (at {second_site})")]
    #[diagnostic(
        code(musubi::graph::type_mismatch),
        help("a label names exactly one item; rename one of the two")
    )]
    TypeMismatch {
        /// Label in question.
        label: Label,
        /// Type used at `first_site`.
        first: ItemType,
        /// Earlier of the two sites.
        first_site: Location,
        /// Type used at `second_site`.
        second: ItemType,
        /// Later of the two sites.
        second_site: Location,
    },

    /// A label was defined twice.
    #[error("{label} is defined twice: at {first} and at {second}")]
    #[diagnostic(code(musubi::graph::duplicate_definition))]
    DuplicateDefinition {
        /// Label in question.
        label: Label,
        /// Earlier definition site.
        first: Location,
        /// Later definition site.
        second: Location,
    },

    /// Items needed for generation depend on items that were never defined.
    #[error("unresolved dependencies:\n{}", render_missing(.missing))]
    #[diagnostic(
        code(musubi::graph::unresolved_dependencies),
        help("declare the missing items or remove the references to them")
    )]
    UnresolvedDependencies {
        /// `(dependent, missing dependency)` pairs in label order.
        missing: Vec<(Label, Label)>,
    },

    /// Unresolved items wait on each other.
    #[error("dependency cycle:\n{}", render_cycle(.cycle))]
    #[diagnostic(code(musubi::graph::dependency_cycle))]
    DependencyCycle {
        /// Cycle starting and ending at its smallest label.
        cycle: Vec<Label>,
    },

    /// Items needed for generation never resolved and no cause was found.
    #[error("items were needed but never resolved: {}", .labels.iter().join(", "))]
    #[diagnostic(code(musubi::graph::unresolved_items))]
    UnresolvedItems {
        /// Unresolved labels in order.
        labels: Vec<Label>,
    },

    /// The toolchain cannot build the target's output type.
    #[error("toolchain {toolchain} used by {target} (at {location}) has no \"{tool}\" tool")]
    #[diagnostic(code(musubi::graph::missing_tool))]
    MissingTool {
        /// Target that cannot be built.
        target: Label,
        /// Toolchain lacking the tool.
        toolchain: Label,
        /// Name of the missing tool.
        tool: String,
        /// Declaration of the target.
        location: Location,
    },

    /// A regular target depends on a test-only target.
    #[error("{target} (at {location}) is not testonly but depends on testonly {dependency}")]
    #[diagnostic(
        code(musubi::graph::testonly_dependency),
        help("mark the dependent target testonly or drop the dependency")
    )]
    TestonlyDependency {
        /// Non-testonly target.
        target: Label,
        /// Test-only dependency.
        dependency: Label,
        /// Declaration of the target.
        location: Location,
    },
}

impl GraphError {
    pub(crate) fn type_mismatch(
        label: Label,
        one: (ItemType, Location),
        other: (ItemType, Location),
    ) -> Self {
        let ((first, first_site), (second, second_site)) =
            if (&one.1, one.0) <= (&other.1, other.0) {
                (one, other)
            } else {
                (other, one)
            };
        Self::TypeMismatch {
            label,
            first,
            first_site,
            second,
            second_site,
        }
    }

    pub(crate) fn duplicate_definition(label: Label, one: Location, other: Location) -> Self {
        let (first, second) = if one <= other {
            (one, other)
        } else {
            (other, one)
        };
        Self::DuplicateDefinition {
            label,
            first,
            second,
        }
    }
}

fn render_missing(missing: &[(Label, Label)]) -> String {
    missing
        .iter()
        .map(|(dependent, dependency)| format!("  {dependency}\n    needed by {dependent}"))
        .join("\n")
}

fn render_cycle(cycle: &[Label]) -> String {
    cycle.iter().map(|label| format!("  {label}")).join(" ->\n")
}
