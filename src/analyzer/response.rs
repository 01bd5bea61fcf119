//! Analyzer response schema.

use serde::{Deserialize, Serialize};

use super::request::ALL;

/// Outcome of a successful analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Nothing requested is affected.
    #[serde(rename = "No dependency")]
    NoDependency,
    /// Some requested targets are affected.
    #[serde(rename = "Found dependency")]
    FoundDependency,
    /// A file every target depends on changed.
    #[serde(rename = "Found dependency (all)")]
    FoundDependencyAll,
}

/// Reply to an [`AnalyzeRequest`](super::AnalyzeRequest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalyzeResponse {
    /// The query was answered.
    Success {
        /// Overall outcome.
        status: Status,
        /// Affected compile targets, or `["all"]`.
        compile_targets: Vec<String>,
        /// Affected test targets.
        test_targets: Vec<String>,
    },
    /// The query could not be answered.
    Error {
        /// Human-readable reason.
        error: String,
        /// Labels naming no known target.
        invalid_targets: Vec<String>,
    },
}

impl AnalyzeResponse {
    /// Nothing affected.
    #[must_use]
    pub const fn no_dependency() -> Self {
        Self::Success {
            status: Status::NoDependency,
            compile_targets: Vec::new(),
            test_targets: Vec::new(),
        }
    }

    /// A request that could not be interpreted.
    #[must_use]
    pub fn malformed(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
            invalid_targets: Vec::new(),
        }
    }

    /// Status of a successful response.
    #[must_use]
    pub const fn status(&self) -> Option<Status> {
        match self {
            Self::Success { status, .. } => Some(*status),
            Self::Error { .. } => None,
        }
    }

    /// Returns `true` when the compile targets collapsed to the sentinel.
    #[must_use]
    pub fn compiles_all(&self) -> bool {
        matches!(self, Self::Success { compile_targets, .. } if is_all(compile_targets))
    }
}

/// The rendered form of the "all" sentinel.
pub(crate) fn all_sentinel() -> Vec<String> {
    vec![ALL.to_owned()]
}

fn is_all(targets: &[String]) -> bool {
    matches!(targets, [only] if only == ALL)
}
