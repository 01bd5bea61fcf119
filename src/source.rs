//! Source-tree path values.
//!
//! Declarations name files and directories either relative to the source
//! root (`//base/file.cc`) or as system-absolute paths (`/usr/include/`).
//! [`SourceDir`] and [`SourceFile`] store such paths in normalised form so
//! that equality and ordering are purely structural.
//!
//! ```
//! use musubi::source::{SourceDir, SourceFile};
//!
//! let dir = SourceDir::new("//base/../net/").expect("dir");
//! assert_eq!(dir.as_str(), "//net/");
//! let file = dir.resolve_file("socket.cc").expect("file");
//! assert_eq!(file, SourceFile::new("//net/socket.cc").expect("file"));
//! ```

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Marker prefix for paths relative to the source root.
pub const SOURCE_ROOT: &str = "//";

/// Errors raised while normalising a path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The input string was empty.
    #[error("path is empty")]
    Empty,
    /// A `..` component tried to leave the root.
    #[error("\"{path}\" climbs above the root")]
    AboveRoot {
        /// Offending input.
        path: String,
    },
    /// A directory was given where a file was expected.
    #[error("\"{path}\" names a directory where a file was expected")]
    NotAFile {
        /// Offending input.
        path: String,
    },
    /// The input neither starts with `//` nor with `/`.
    #[error("\"{path}\" is not a source-absolute or absolute path")]
    NotAbsolute {
        /// Offending input.
        path: String,
    },
}

/// Split an absolute path into its root marker and normalised components.
fn normalise(path: &str) -> Result<(&'static str, Vec<&str>), PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    let (root, rest) = if let Some(rest) = path.strip_prefix(SOURCE_ROOT) {
        (SOURCE_ROOT, rest)
    } else if let Some(rest) = path.strip_prefix('/') {
        ("/", rest)
    } else {
        return Err(PathError::NotAbsolute {
            path: path.to_owned(),
        });
    };
    let mut parts: Vec<&str> = Vec::new();
    for component in rest.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(PathError::AboveRoot {
                        path: path.to_owned(),
                    });
                }
            }
            other => parts.push(other),
        }
    }
    Ok((root, parts))
}

/// Returns `true` when `value` uses one of the accepted absolute forms.
#[must_use]
pub fn is_absolute(value: &str) -> bool {
    value.starts_with('/')
}

/// A normalised directory, always terminated by `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceDir(String);

impl SourceDir {
    /// Normalise `path` into a directory.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] when the path is empty, relative or climbs
    /// above its root.
    pub fn new(path: &str) -> Result<Self, PathError> {
        let (root, parts) = normalise(path)?;
        let mut value = String::from(root);
        for part in parts {
            value.push_str(part);
            value.push('/');
        }
        Ok(Self(value))
    }

    /// The source root, `//`.
    #[must_use]
    pub fn root() -> Self {
        Self(SOURCE_ROOT.to_owned())
    }

    /// View the directory as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns `true` for directories below the source root.
    #[must_use]
    pub fn is_source_absolute(&self) -> bool {
        self.0.starts_with(SOURCE_ROOT)
    }

    /// The final path component, or an empty string for a root.
    #[must_use]
    pub fn last_component(&self) -> &str {
        self.0
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// Resolve `input` as a directory relative to this one.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if the combined path is invalid.
    pub fn resolve_dir(&self, input: &str) -> Result<Self, PathError> {
        if input.is_empty() {
            return Err(PathError::Empty);
        }
        if is_absolute(input) {
            Self::new(input)
        } else {
            Self::new(&format!("{}{input}", self.0))
        }
    }

    /// Resolve `input` as a file relative to this directory.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if the combined path is invalid or names a
    /// directory.
    pub fn resolve_file(&self, input: &str) -> Result<SourceFile, PathError> {
        if input.is_empty() {
            return Err(PathError::Empty);
        }
        if is_absolute(input) {
            SourceFile::new(input)
        } else {
            SourceFile::new(&format!("{}{input}", self.0))
        }
    }
}

impl fmt::Display for SourceDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SourceDir {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A normalised file path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceFile(String);

impl SourceFile {
    /// Normalise `path` into a file.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] when the path is empty, relative, climbs above
    /// its root or names a directory.
    pub fn new(path: &str) -> Result<Self, PathError> {
        if path.ends_with('/') {
            return Err(PathError::NotAFile {
                path: path.to_owned(),
            });
        }
        let (root, parts) = normalise(path)?;
        if parts.is_empty() {
            return Err(PathError::NotAFile {
                path: path.to_owned(),
            });
        }
        Ok(Self(format!("{root}{}", parts.join("/"))))
    }

    /// View the file as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The directory containing this file.
    #[must_use]
    pub fn dir(&self) -> SourceDir {
        let end = self.0.rfind('/').map_or(0, |idx| idx + 1);
        SourceDir(self.0.get(..end).unwrap_or(SOURCE_ROOT).to_owned())
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SourceFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
