//! Declaration sites.

use crate::source::SourceFile;
use serde::Serialize;
use std::fmt;

/// Position of a declaration or reference inside a build file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    /// Build file holding the declaration.
    pub file: SourceFile,
    /// One-based line.
    pub line: u32,
    /// One-based column.
    pub column: u32,
}

impl Location {
    /// Construct a location.
    #[must_use]
    pub const fn new(file: SourceFile, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
