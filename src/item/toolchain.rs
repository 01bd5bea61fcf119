//! Toolchain payload.

use crate::label::Label;
use serde::Serialize;
use std::collections::BTreeMap;

/// One tool of a toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tool {
    /// Command template.
    pub command: String,
    /// Pool limiting concurrent invocations.
    pub pool: Option<Label>,
}

/// A named set of tools.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Toolchain {
    /// Targets that must exist before the toolchain is usable.
    pub deps: Vec<Label>,
    /// Tools keyed by name (`link`, `alink`, `stamp`, ...).
    pub tools: BTreeMap<String, Tool>,
}

impl Toolchain {
    /// Look up a tool by name.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Pools referenced by any tool, in tool-name order.
    pub fn tool_pools(&self) -> impl Iterator<Item = &Label> {
        self.tools.values().filter_map(|tool| tool.pool.as_ref())
    }
}
