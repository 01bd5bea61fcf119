//! Manifest error types and diagnostic mapping.
//!
//! Parser failures become [`miette`] diagnostics: [`map_yaml_error`] keeps
//! the YAML source and a span, [`map_data_error`] reports schema violations
//! against the manifest name. Failures found while turning declarations into
//! items carry the declaration's [`Location`].

// The miette and thiserror derives trip `unused_assignments` on some
// compiler versions, and `#[expect]` fails on the versions where it does not.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use crate::label::LabelError;
use crate::location::Location;
use crate::source::{PathError, SourceDir};
use miette::Diagnostic;
use thiserror::Error;

mod yaml;

pub use yaml::map_yaml_error;

/// Display name of a manifest used in diagnostics.
///
/// ```rust
/// use musubi::manifest::ManifestName;
/// let name = ManifestName::new("Musubifile");
/// assert_eq!(name.as_str(), "Musubifile");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestName(String);

impl ManifestName {
    /// Wrap a manifest path or name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ManifestName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a single declaration could not become an item.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    /// A label field did not parse.
    #[error(transparent)]
    Label(#[from] LabelError),
    /// A path field did not normalise.
    #[error(transparent)]
    Path(#[from] PathError),
    /// Action targets need a script.
    #[error("{output_type} targets require a script")]
    MissingScript {
        /// Output type of the declaration.
        output_type: &'static str,
    },
}

/// Error raised while reading the manifest or instantiating its build files.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    /// Manifest parsing failed and produced the supplied diagnostic.
    #[error("failed to parse {name}")]
    #[diagnostic(code(musubi::manifest::parse))]
    Parse {
        /// Underlying diagnostic reported by the parser or validator.
        #[source]
        #[diagnostic_source]
        source: Box<dyn Diagnostic + Send + Sync + 'static>,
        /// Manifest being parsed.
        name: ManifestName,
    },

    /// A `build_files` key is not a directory.
    #[error("build file key \"{dir}\" is not a valid directory")]
    #[diagnostic(code(musubi::manifest::build_dir))]
    InvalidBuildDir {
        /// Offending key.
        dir: String,
        /// Underlying path failure.
        #[source]
        source: PathError,
    },

    /// A manifest-level label or path is malformed.
    #[error("invalid {field} \"{value}\"")]
    #[diagnostic(code(musubi::manifest::field))]
    InvalidField {
        /// Manifest key.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Underlying failure.
        #[source]
        source: DeclarationError,
    },

    /// A label points into a directory without a build file.
    #[error("no build file for {dir}, referenced at {origin}")]
    #[diagnostic(
        code(musubi::manifest::missing_build_file),
        help("add the directory under build_files or fix the reference")
    )]
    MissingBuildFile {
        /// Directory that was requested.
        dir: SourceDir,
        /// Site of the reference.
        origin: Location,
    },

    /// A declaration is malformed.
    #[error("invalid declaration of \"{name}\" at {location}: {source}")]
    #[diagnostic(code(musubi::manifest::declaration))]
    Declaration {
        /// Declared name.
        name: String,
        /// Declaration site.
        location: Location,
        /// What is wrong with it.
        #[source]
        source: DeclarationError,
    },
}

#[derive(Debug, Error, Diagnostic)]
#[error("{name} does not match the manifest schema: {source}")]
#[diagnostic(code(musubi::manifest::structure))]
struct DataDiagnostic {
    #[source]
    source: serde_json::Error,
    name: ManifestName,
}

/// Map a [`serde_json`] structural error into a diagnostic.
///
/// Schema errors arrive after the YAML was converted to JSON values, so no
/// byte offsets survive; the diagnostic names the manifest and the failing
/// field.
#[must_use]
pub fn map_data_error(
    err: serde_json::Error,
    name: &ManifestName,
) -> Box<dyn Diagnostic + Send + Sync + 'static> {
    Box::new(DataDiagnostic {
        source: err,
        name: name.clone(),
    })
}
