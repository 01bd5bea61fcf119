//! Labels identify every declared entity.
//!
//! A [`Label`] is the triple `(directory, name, toolchain)`. Labels are the
//! only way entities refer to each other, which lets a declaration mention a
//! label long before the entity behind it has been defined.
//!
//! ```
//! use musubi::label::Label;
//! use musubi::source::SourceDir;
//!
//! let toolchain = Label::resolve(&SourceDir::root(), None, "//tc:host").expect("toolchain");
//! let label = Label::resolve(&SourceDir::root(), Some(&toolchain), "//base:net").expect("label");
//! assert_eq!(label.to_string(), "//base:net(//tc:host)");
//! assert_eq!(label.user_visible_name(&toolchain), "//base:net");
//! ```

use crate::source::{PathError, SourceDir};
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Errors raised while parsing a label.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabelError {
    /// The input string was empty.
    #[error("label is empty")]
    Empty,
    /// The label names no entity.
    #[error("label \"{input}\" has an empty name")]
    EmptyName {
        /// Offending input.
        input: String,
    },
    /// Names are single path components.
    #[error("label \"{input}\" has a name containing '/'")]
    InvalidName {
        /// Offending input.
        input: String,
    },
    /// The toolchain suffix is malformed or nested.
    #[error("label \"{input}\" has a malformed toolchain suffix")]
    MalformedToolchain {
        /// Offending input.
        input: String,
    },
    /// The directory part did not normalise.
    #[error("label \"{input}\" has an invalid directory")]
    InvalidDir {
        /// Offending input.
        input: String,
        /// Underlying path failure.
        #[source]
        source: PathError,
    },
}

/// Globally unique, totally ordered entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    dir: SourceDir,
    name: String,
    toolchain_dir: Option<SourceDir>,
    toolchain_name: String,
}

impl Label {
    /// Construct a label without a toolchain qualifier.
    #[must_use]
    pub fn new(dir: SourceDir, name: impl Into<String>) -> Self {
        Self {
            dir,
            name: name.into(),
            toolchain_dir: None,
            toolchain_name: String::new(),
        }
    }

    /// Parse `input` relative to `current_dir`.
    ///
    /// Labels written without a `(toolchain)` suffix inherit
    /// `current_toolchain`.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError`] for empty or malformed input.
    pub fn resolve(
        current_dir: &SourceDir,
        current_toolchain: Option<&Self>,
        input: &str,
    ) -> Result<Self, LabelError> {
        if input.is_empty() {
            return Err(LabelError::Empty);
        }
        let (body, toolchain) = split_toolchain(input)?;
        if body.is_empty() {
            return Err(LabelError::Empty);
        }
        let (dir_part, name_part) = body
            .rfind(':')
            .map_or((body, None), |idx| {
                (body.get(..idx).unwrap_or_default(), body.get(idx + 1..))
            });
        let dir = if dir_part.is_empty() {
            current_dir.clone()
        } else {
            current_dir
                .resolve_dir(dir_part)
                .map_err(|source| LabelError::InvalidDir {
                    input: input.to_owned(),
                    source,
                })?
        };
        let name = match name_part {
            Some(name) if name.contains('/') => {
                return Err(LabelError::InvalidName {
                    input: input.to_owned(),
                });
            }
            Some(name) => name.to_owned(),
            None => dir.last_component().to_owned(),
        };
        if name.is_empty() {
            return Err(LabelError::EmptyName {
                input: input.to_owned(),
            });
        }
        let label = Self::new(dir, name);
        match toolchain {
            Some(raw) => {
                let toolchain = Self::resolve(current_dir, None, raw)?;
                Ok(label.with_toolchain(&toolchain))
            }
            None => Ok(match current_toolchain {
                Some(toolchain) => label.with_toolchain(toolchain),
                None => label,
            }),
        }
    }

    /// Directory part.
    #[must_use]
    pub const fn dir(&self) -> &SourceDir {
        &self.dir
    }

    /// Name part.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns `true` if the label carries a toolchain qualifier.
    #[must_use]
    pub const fn has_toolchain(&self) -> bool {
        self.toolchain_dir.is_some()
    }

    /// The toolchain qualifier as a label of its own.
    #[must_use]
    pub fn toolchain(&self) -> Option<Self> {
        self.toolchain_dir
            .as_ref()
            .map(|dir| Self::new(dir.clone(), self.toolchain_name.clone()))
    }

    /// Returns `true` when this label is qualified with `toolchain`.
    #[must_use]
    pub fn is_in_toolchain(&self, toolchain: &Self) -> bool {
        self.toolchain_dir.as_ref() == Some(&toolchain.dir)
            && self.toolchain_name == toolchain.name
    }

    /// Copy of this label qualified with `toolchain`.
    ///
    /// Any qualifier carried by `toolchain` itself is ignored.
    #[must_use]
    pub fn with_toolchain(&self, toolchain: &Self) -> Self {
        Self {
            dir: self.dir.clone(),
            name: self.name.clone(),
            toolchain_dir: Some(toolchain.dir.clone()),
            toolchain_name: toolchain.name.clone(),
        }
    }

    /// Copy of this label with the toolchain qualifier removed.
    #[must_use]
    pub fn without_toolchain(&self) -> Self {
        Self::new(self.dir.clone(), self.name.clone())
    }

    /// Render the label, omitting the qualifier for `default_toolchain`.
    #[must_use]
    pub fn user_visible_name(&self, default_toolchain: &Self) -> String {
        if self.is_in_toolchain(default_toolchain) {
            self.without_toolchain().to_string()
        } else {
            self.to_string()
        }
    }
}

/// Split `input` into its body and the contents of a trailing `(...)`.
fn split_toolchain(input: &str) -> Result<(&str, Option<&str>), LabelError> {
    let malformed = || LabelError::MalformedToolchain {
        input: input.to_owned(),
    };
    match input.find('(') {
        Some(open) => {
            let inner = input
                .strip_suffix(')')
                .and_then(|rest| rest.get(open + 1..))
                .ok_or_else(malformed)?;
            if inner.is_empty() || inner.contains(['(', ')']) {
                return Err(malformed());
            }
            Ok((input.get(..open).unwrap_or_default(), Some(inner)))
        }
        None if input.contains(')') => Err(malformed()),
        None => Ok((input, None)),
    }
}

fn write_dir_and_name(f: &mut fmt::Formatter<'_>, dir: &SourceDir, name: &str) -> fmt::Result {
    let dir = dir.as_str();
    let trimmed = dir.trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "/" {
        write!(f, "{dir}:{name}")
    } else {
        write!(f, "{trimmed}:{name}")
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_dir_and_name(f, &self.dir, &self.name)?;
        if let Some(dir) = &self.toolchain_dir {
            f.write_str("(")?;
            write_dir_and_name(f, dir, &self.toolchain_name)?;
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
