//! Config payload.

use crate::label::Label;
use crate::source::{SourceDir, SourceFile};
use indexmap::IndexSet;
use serde::Serialize;
use std::hash::Hash;

/// Settings carried by a config.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ConfigValues {
    /// Preprocessor defines.
    pub defines: Vec<String>,
    /// Include search directories.
    pub include_dirs: Vec<SourceDir>,
    /// Compiler flags.
    pub cflags: Vec<String>,
    /// Linker flags.
    pub ldflags: Vec<String>,
    /// Extra files read by anything using the config.
    pub inputs: Vec<SourceFile>,
}

impl ConfigValues {
    /// Append `other`, keeping first occurrences only.
    pub fn append(&mut self, other: &Self) {
        merge_unique(&mut self.defines, &other.defines);
        merge_unique(&mut self.include_dirs, &other.include_dirs);
        merge_unique(&mut self.cflags, &other.cflags);
        merge_unique(&mut self.ldflags, &other.ldflags);
        merge_unique(&mut self.inputs, &other.inputs);
    }
}

fn merge_unique<T: Clone + Eq + Hash>(into: &mut Vec<T>, from: &[T]) {
    let mut merged: IndexSet<T> = into.drain(..).collect();
    merged.extend(from.iter().cloned());
    into.extend(merged);
}

/// A named bundle of settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Config {
    /// Nested configs applied along with this one.
    pub configs: Vec<Label>,
    /// Settings declared directly on this config.
    pub values: ConfigValues,
    /// Own values followed by every nested config's values, filled in at
    /// resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ConfigValues>,
}

impl Config {
    /// Resolved values, once resolved.
    #[must_use]
    pub const fn resolved(&self) -> Option<&ConfigValues> {
        self.resolved.as_ref()
    }
}
