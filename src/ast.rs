//! Musubi manifest Abstract Syntax Tree structures.
//!
//! A `Musubifile` carries pre-evaluated declarations: for every build file
//! directory it lists the items that file declares. These structures mirror
//! the YAML schema one-to-one and are deserialised through `serde_json`
//! after `serde-saphyr` has parsed the YAML.
//!
//! ```rust
//! use musubi::ast::{ItemDecl, MusubiManifest};
//!
//! let yaml = concat!(
//!     "musubi_version: \"1.0.0\"\n",
//!     "default_toolchain: \"//tc:host\"\n",
//!     "build_files:\n",
//!     "  \"//\":\n",
//!     "    items:\n",
//!     "      - kind: target\n",
//!     "        name: app\n",
//!     "        type: executable\n",
//!     "        sources: main.cc\n",
//! );
//! let manifest: MusubiManifest = serde_saphyr::from_str(yaml).expect("parse");
//! let root = manifest.build_files.get("//").expect("root build file");
//! assert!(matches!(root.items.first(), Some(ItemDecl::Target(_))));
//! ```

use std::collections::BTreeMap;

use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::item::OutputType;

fn default_dotfile() -> String {
    "//.gn".to_owned()
}

fn default_build_file_name() -> String {
    "BUILD.gn".to_owned()
}

/// Top-level manifest structure parsed from a `Musubifile`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MusubiManifest {
    /// Semantic version of the manifest format.
    pub musubi_version: Version,

    /// Toolchain whose targets are generated by default.
    pub default_toolchain: String,

    /// Main entry declaration file; changing it affects everything.
    #[serde(default = "default_dotfile")]
    pub dotfile: String,

    /// Root build configuration file.
    #[serde(default)]
    pub build_config: Option<String>,

    /// Files read while evaluating build arguments.
    #[serde(default)]
    pub build_args_files: Vec<String>,

    /// File name of a build file within its directory.
    #[serde(default = "default_build_file_name")]
    pub build_file_name: String,

    /// Build files keyed by directory (`//` for the root).
    pub build_files: IndexMap<String, BuildFileDecl>,
}

/// Declarations of one build file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuildFileDecl {
    /// Files imported while evaluating the build file.
    #[serde(default)]
    pub imports: StringOrList,

    /// Declared items, in declaration order.
    #[serde(default)]
    pub items: Vec<ItemDecl>,
}

/// One declaration; `kind` selects the variant.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemDecl {
    /// A buildable target.
    Target(TargetDecl),
    /// A settings bundle.
    Config(ConfigDecl),
    /// A toolchain.
    Toolchain(ToolchainDecl),
    /// A concurrency pool.
    Pool(PoolDecl),
}

impl ItemDecl {
    /// Declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Target(decl) => &decl.name,
            Self::Config(decl) => &decl.name,
            Self::Toolchain(decl) => &decl.name,
            Self::Pool(decl) => &decl.name,
        }
    }
}

/// A target declaration. Paths and labels may be relative to the build
/// file's directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDecl {
    /// Name within the directory.
    pub name: String,
    /// Output kind.
    #[serde(rename = "type")]
    pub output_type: OutputType,
    /// Compiled or processed sources.
    #[serde(default)]
    pub sources: StringOrList,
    /// Headers exported to dependents.
    #[serde(default)]
    pub public: StringOrList,
    /// Extra files read by the build step.
    #[serde(default)]
    pub inputs: StringOrList,
    /// Runtime data files or directories (trailing `/`).
    #[serde(default)]
    pub data: StringOrList,
    /// Deps whose public configs propagate.
    #[serde(default)]
    pub public_deps: StringOrList,
    /// Ordinary deps.
    #[serde(default)]
    pub deps: StringOrList,
    /// Runtime-only deps.
    #[serde(default)]
    pub data_deps: StringOrList,
    /// Targets generated alongside without blocking.
    #[serde(default)]
    pub gen_deps: StringOrList,
    /// Configs applied to the target.
    #[serde(default)]
    pub configs: StringOrList,
    /// Configs applied to everything depending on the target.
    #[serde(default)]
    pub all_dependent_configs: StringOrList,
    /// Configs applied to direct dependents.
    #[serde(default)]
    pub public_configs: StringOrList,
    /// Concurrency pool.
    #[serde(default)]
    pub pool: Option<String>,
    /// Script run by action targets.
    #[serde(default)]
    pub script: Option<String>,
    /// Files written by action targets.
    #[serde(default)]
    pub outputs: StringOrList,
    /// Script arguments.
    #[serde(default)]
    pub args: StringOrList,
    /// Only test targets may depend on this one.
    #[serde(default)]
    pub testonly: bool,
}

/// A config declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigDecl {
    /// Name within the directory.
    pub name: String,
    /// Nested configs.
    #[serde(default)]
    pub configs: StringOrList,
    /// Preprocessor defines.
    #[serde(default)]
    pub defines: StringOrList,
    /// Include directories.
    #[serde(default)]
    pub include_dirs: StringOrList,
    /// Compiler flags.
    #[serde(default)]
    pub cflags: StringOrList,
    /// Linker flags.
    #[serde(default)]
    pub ldflags: StringOrList,
    /// Extra files read by users of the config.
    #[serde(default)]
    pub inputs: StringOrList,
}

/// A toolchain declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainDecl {
    /// Name within the directory.
    pub name: String,
    /// Targets the toolchain needs.
    #[serde(default)]
    pub deps: StringOrList,
    /// Tools keyed by name.
    #[serde(default)]
    pub tools: BTreeMap<String, ToolDecl>,
}

/// One tool of a toolchain.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolDecl {
    /// Command template.
    pub command: String,
    /// Pool limiting the tool.
    #[serde(default)]
    pub pool: Option<String>,
}

/// A pool declaration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PoolDecl {
    /// Name within the directory.
    pub name: String,
    /// Maximum concurrent jobs.
    pub depth: u32,
}

/// A helper for fields that accept either a single string or a list of
/// strings.
///
/// ```yaml
/// # Scalar
/// sources: main.cc
/// # Sequence
/// sources:
///   - main.cc
///   - util.cc
/// ```
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum StringOrList {
    /// No value provided.
    #[default]
    Empty,
    /// A single string item.
    String(String),
    /// A list of string items.
    List(Vec<String>),
}

impl StringOrList {
    /// Iterate the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::Empty => &[],
            Self::String(value) => std::slice::from_ref(value),
            Self::List(values) => values,
        };
        slice.iter().map(String::as_str)
    }
}
