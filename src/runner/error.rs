//! Error types for the runner module.
//!
//! Kept in a submodule so the lint suppression below stays narrow.

// The miette and thiserror derives trip `unused_assignments` on some
// compiler versions, and `#[expect]` fails on the versions where it does not.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use crate::graph::GraphError;
use crate::label::LabelError;
use crate::manifest::ManifestError;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised during command execution.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The manifest file does not exist at the expected path.
    #[error("{manifest_name} not found in {directory}")]
    #[diagnostic(
        code(musubi::runner::manifest_not_found),
        help("create a manifest or pass its path with --file")
    )]
    ManifestNotFound {
        /// Name of the expected manifest file (e.g., "Musubifile").
        manifest_name: String,
        /// Directory description (e.g., "the current directory").
        directory: String,
        /// The path that was attempted.
        path: PathBuf,
    },

    /// A path given on the command line is not valid UTF-8.
    #[error("path {} is not valid UTF-8", path.display())]
    #[diagnostic(code(musubi::runner::path_utf8))]
    NonUtf8Path {
        /// Offending path.
        path: PathBuf,
    },

    /// The manifest could not be read or instantiated.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Manifest(#[from] ManifestError),

    /// The declarations do not form a resolvable graph.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    /// A label given on the command line does not parse.
    #[error("invalid label \"{label}\"")]
    #[diagnostic(code(musubi::runner::label))]
    InvalidLabel {
        /// Label as typed.
        label: String,
        /// Parse failure.
        #[source]
        source: LabelError,
    },

    /// A label names nothing that was resolved.
    #[error("no resolved item named {label}")]
    #[diagnostic(
        code(musubi::runner::unknown_item),
        help("only items reachable from the root build file are resolved")
    )]
    UnknownItem {
        /// Label as resolved against the root directory.
        label: String,
    },
}
