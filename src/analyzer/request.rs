//! Analyzer request schema and validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::label::{Label, LabelError};
use crate::source::{PathError, SourceDir, SourceFile, is_absolute};

/// Sentinel standing for every root target.
pub const ALL: &str = "all";

/// A "what is affected" query as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Changed files, source-absolute or system-absolute.
    pub files: Vec<String>,
    /// Targets the caller wants compiled.
    pub additional_compile_targets: CompileTargets,
    /// Test targets the caller wants run.
    pub test_targets: Vec<String>,
}

/// Either a list of labels (possibly containing `"all"`) or the bare string
/// `"all"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompileTargets {
    /// Explicit labels.
    List(Vec<String>),
    /// A single string; only `"all"` is meaningful.
    Single(String),
}

impl Default for CompileTargets {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// Reasons a request cannot be interpreted at all.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The input is not valid request JSON.
    #[error("malformed request: {0}")]
    Json(#[from] serde_json::Error),
    /// A file entry is neither source-absolute nor absolute.
    #[error("\"{path}\" is not a source-absolute or absolute path")]
    RelativePath {
        /// Offending entry.
        path: String,
    },
    /// A file entry could not be normalised.
    #[error("invalid file \"{path}\": {source}")]
    InvalidPath {
        /// Offending entry.
        path: String,
        /// Underlying failure.
        #[source]
        source: PathError,
    },
    /// A label entry is relative.
    #[error("\"{label}\" is not a source-absolute or absolute label")]
    RelativeLabel {
        /// Offending entry.
        label: String,
    },
    /// A label entry does not parse.
    #[error("invalid label \"{label}\": {source}")]
    InvalidLabel {
        /// Offending entry.
        label: String,
        /// Underlying failure.
        #[source]
        source: LabelError,
    },
    /// `additional_compile_targets` was a string other than `"all"`.
    #[error("additional_compile_targets must be a list or \"all\", got \"{value}\"")]
    BadCompileTargets {
        /// Offending value.
        value: String,
    },
}

/// A request with every path and label parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Query {
    pub(crate) files: BTreeSet<SourceFile>,
    pub(crate) compile_labels: BTreeSet<Label>,
    pub(crate) compile_all: bool,
    pub(crate) test_labels: BTreeSet<Label>,
}

impl AnalyzeRequest {
    /// Parse a request from JSON. Every key is required.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Json`] for malformed input.
    pub fn from_json(input: &str) -> Result<Self, RequestError> {
        Ok(serde_json::from_str(input)?)
    }

    pub(crate) fn to_query(&self, default_toolchain: &Label) -> Result<Query, RequestError> {
        let mut query = Query::default();
        for path in &self.files {
            query.files.insert(parse_file(path)?);
        }

        let compile_entries: &[String] = match &self.additional_compile_targets {
            CompileTargets::List(entries) => entries,
            CompileTargets::Single(value) if value == ALL => {
                query.compile_all = true;
                &[]
            }
            CompileTargets::Single(value) => {
                return Err(RequestError::BadCompileTargets {
                    value: value.clone(),
                });
            }
        };
        for entry in compile_entries {
            if entry == ALL {
                query.compile_all = true;
            } else {
                query
                    .compile_labels
                    .insert(parse_label(entry, default_toolchain)?);
            }
        }

        for entry in &self.test_targets {
            query
                .test_labels
                .insert(parse_label(entry, default_toolchain)?);
        }
        Ok(query)
    }
}

fn parse_file(path: &str) -> Result<SourceFile, RequestError> {
    if !is_absolute(path) {
        return Err(RequestError::RelativePath {
            path: path.to_owned(),
        });
    }
    SourceFile::new(path).map_err(|source| RequestError::InvalidPath {
        path: path.to_owned(),
        source,
    })
}

fn parse_label(input: &str, default_toolchain: &Label) -> Result<Label, RequestError> {
    if !is_absolute(input) {
        return Err(RequestError::RelativeLabel {
            label: input.to_owned(),
        });
    }
    Label::resolve(&SourceDir::root(), Some(default_toolchain), input).map_err(|source| {
        RequestError::InvalidLabel {
            label: input.to_owned(),
            source,
        }
    })
}
