//! Target payload.

use crate::label::Label;
use crate::source::SourceFile;
use serde::{Deserialize, Serialize};

/// What kind of output a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    /// Pure aggregation of other targets.
    Group,
    /// Linked executable.
    Executable,
    /// Linked shared library.
    SharedLibrary,
    /// Archived static library.
    StaticLibrary,
    /// Compiled objects without a link step.
    SourceSet,
    /// Runs a script once.
    Action,
    /// Runs a script once per source.
    ActionForeach,
    /// Copies sources to outputs.
    Copy,
    /// Writes a file at generation time.
    GeneratedFile,
}

impl OutputType {
    /// Name used in manifests and rendered output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Executable => "executable",
            Self::SharedLibrary => "shared_library",
            Self::StaticLibrary => "static_library",
            Self::SourceSet => "source_set",
            Self::Action => "action",
            Self::ActionForeach => "action_foreach",
            Self::Copy => "copy",
            Self::GeneratedFile => "generated_file",
        }
    }

    /// Name of the toolchain tool this output type is built with.
    #[must_use]
    pub const fn required_tool(self) -> &'static str {
        match self {
            Self::Executable => "link",
            Self::SharedLibrary => "solink",
            Self::StaticLibrary => "alink",
            Self::Copy => "copy",
            Self::Group
            | Self::SourceSet
            | Self::Action
            | Self::ActionForeach
            | Self::GeneratedFile => "stamp",
        }
    }

    /// Returns `true` for aggregation-only targets.
    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(self, Self::Group)
    }
}

/// Script and outputs of an action-like target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionValues {
    /// Script executed by the action.
    pub script: SourceFile,
    /// Files the action writes.
    pub outputs: Vec<SourceFile>,
    /// Arguments passed to the script.
    pub args: Vec<String>,
}

/// Values computed when the target resolves.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResolvedTarget {
    /// Configs applied to this target, own first, then inherited.
    pub configs: Vec<Label>,
    /// Configs this target forces onto everything that depends on it.
    pub all_dependent_configs: Vec<Label>,
    /// Configs this target forces onto its direct dependents.
    pub public_configs: Vec<Label>,
    /// Toolchain tool used to build the target.
    pub tool: String,
}

/// A buildable target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Output kind.
    pub output_type: OutputType,
    /// Toolchain the target is built with.
    pub toolchain: Label,
    /// Compiled or processed sources.
    pub sources: Vec<SourceFile>,
    /// Headers exported to dependents.
    pub public_headers: Vec<SourceFile>,
    /// Extra files the build step reads.
    pub inputs: Vec<SourceFile>,
    /// Runtime data; entries ending in `/` denote directories.
    pub data: Vec<String>,
    /// Deps whose public configs propagate to dependents.
    pub public_deps: Vec<Label>,
    /// Ordinary linked deps.
    pub private_deps: Vec<Label>,
    /// Runtime-only deps.
    pub data_deps: Vec<Label>,
    /// Targets generated alongside this one without blocking it.
    pub gen_deps: Vec<Label>,
    /// Configs applied to this target.
    pub configs: Vec<Label>,
    /// Configs applied to this target and everything depending on it.
    pub all_dependent_configs: Vec<Label>,
    /// Configs applied to this target and its direct dependents.
    pub public_configs: Vec<Label>,
    /// Concurrency pool for the build step.
    pub pool: Option<Label>,
    /// Script and outputs for action-like targets.
    pub action: Option<ActionValues>,
    /// Only test targets may depend on this one.
    pub testonly: bool,
    /// Filled in at resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedTarget>,
}

impl Target {
    /// An empty target of `output_type` built with `toolchain`.
    #[must_use]
    pub const fn new(output_type: OutputType, toolchain: Label) -> Self {
        Self {
            output_type,
            toolchain,
            sources: Vec::new(),
            public_headers: Vec::new(),
            inputs: Vec::new(),
            data: Vec::new(),
            public_deps: Vec::new(),
            private_deps: Vec::new(),
            data_deps: Vec::new(),
            gen_deps: Vec::new(),
            configs: Vec::new(),
            all_dependent_configs: Vec::new(),
            public_configs: Vec::new(),
            pool: None,
            action: None,
            testonly: false,
            resolved: None,
        }
    }

    /// Public then private deps.
    pub fn linked_deps(&self) -> impl Iterator<Item = &Label> {
        self.public_deps.iter().chain(&self.private_deps)
    }

    /// Public, private and data deps.
    pub fn all_deps(&self) -> impl Iterator<Item = &Label> {
        self.linked_deps().chain(&self.data_deps)
    }

    /// Resolution results, once resolved.
    #[must_use]
    pub const fn resolved(&self) -> Option<&ResolvedTarget> {
        self.resolved.as_ref()
    }
}
