//! Label and item builders plus a recording [`Loader`].
//!
//! Labels written without a toolchain land in [`default_toolchain`], the same
//! way a build file instantiated in the default toolchain would write them.

use musubi::item::{
    Config, ConfigValues, Item, ItemKind, OutputType, Pool, Target, Tool, Toolchain,
};
use musubi::label::Label;
use musubi::loader::Loader;
use musubi::location::Location;
use musubi::source::{SourceDir, SourceFile};

/// Tools [`toolchain_item`] declares.
pub const ALL_TOOLS: [&str; 5] = ["alink", "copy", "link", "solink", "stamp"];

/// `//tc:default`.
pub fn default_toolchain() -> Label {
    Label::new(SourceDir::new("//tc/").expect("toolchain dir"), "default")
}

/// Parse `input` from the source root in the default toolchain.
pub fn label(input: &str) -> Label {
    Label::resolve(&SourceDir::root(), Some(&default_toolchain()), input).expect("label")
}

/// Parse `input` from the source root without a toolchain.
pub fn bare_label(input: &str) -> Label {
    Label::resolve(&SourceDir::root(), None, input).expect("label")
}

/// A source-absolute file.
pub fn file(path: &str) -> SourceFile {
    SourceFile::new(path).expect("source file")
}

/// The build file of `label`'s directory.
pub fn build_file(label: &Label) -> SourceFile {
    label.dir().resolve_file("BUILD.gn").expect("build file")
}

fn declared(label: Label, kind: ItemKind) -> Item {
    let file = build_file(&label);
    Item::new(label, Location::new(file.clone(), 1, 1), kind).with_build_dependency_files([file])
}

/// A toolchain item declaring every tool in [`ALL_TOOLS`] except `missing`.
pub fn toolchain_without(label: &Label, missing: &[&str]) -> Item {
    let tools = ALL_TOOLS
        .iter()
        .filter(|tool| !missing.contains(tool))
        .map(|tool| {
            (
                (*tool).to_owned(),
                Tool {
                    command: format!("{tool} {{in}}"),
                    pool: None,
                },
            )
        })
        .collect();
    declared(
        label.clone(),
        ItemKind::Toolchain(Toolchain {
            deps: Vec::new(),
            tools,
        }),
    )
}

/// A toolchain item declaring every tool.
pub fn toolchain_item(label: &Label) -> Item {
    toolchain_without(label, &[])
}

/// A config with `defines` and nested `configs`.
pub fn config_item(name: &str, configs: &[&str], defines: &[&str]) -> Item {
    declared(
        label(name),
        ItemKind::Config(Config {
            configs: configs.iter().map(|c| label(c)).collect(),
            values: ConfigValues {
                defines: defines.iter().map(|d| (*d).to_owned()).collect(),
                ..ConfigValues::default()
            },
            resolved: None,
        }),
    )
}

/// A pool of `depth`.
pub fn pool_item(name: &str, depth: u32) -> Item {
    declared(label(name), ItemKind::Pool(Pool { depth }))
}

/// Fluent builder for target items.
///
/// ```
/// use musubi::item::OutputType;
/// use test_support::TargetBuilder;
///
/// let item = TargetBuilder::new("//app", OutputType::Executable)
///     .deps(&["//lib"])
///     .sources(&["//app/main.cc"])
///     .build();
/// assert_eq!(item.label().name(), "app");
/// ```
#[derive(Debug, Clone)]
pub struct TargetBuilder {
    label: Label,
    target: Target,
    files: Vec<SourceFile>,
}

fn labels(values: &[&str]) -> Vec<Label> {
    values.iter().map(|value| label(value)).collect()
}

impl TargetBuilder {
    /// Start a target in the default toolchain.
    pub fn new(name: &str, output_type: OutputType) -> Self {
        let target_label = label(name);
        let file = build_file(&target_label);
        Self {
            label: target_label,
            target: Target::new(output_type, default_toolchain()),
            files: vec![file],
        }
    }

    /// Move the target into `toolchain`.
    #[must_use]
    pub fn in_toolchain(mut self, toolchain: &Label) -> Self {
        self.label = self.label.with_toolchain(toolchain);
        self.target.toolchain = toolchain.clone();
        self
    }

    /// Private deps.
    #[must_use]
    pub fn deps(mut self, deps: &[&str]) -> Self {
        self.target.private_deps = labels(deps);
        self
    }

    /// Deps given as labels, for cross-toolchain references.
    #[must_use]
    pub fn dep_labels(mut self, deps: impl IntoIterator<Item = Label>) -> Self {
        self.target.private_deps.extend(deps);
        self
    }

    /// Public deps.
    #[must_use]
    pub fn public_deps(mut self, deps: &[&str]) -> Self {
        self.target.public_deps = labels(deps);
        self
    }

    /// Data deps.
    #[must_use]
    pub fn data_deps(mut self, deps: &[&str]) -> Self {
        self.target.data_deps = labels(deps);
        self
    }

    /// Gen deps.
    #[must_use]
    pub fn gen_deps(mut self, deps: &[&str]) -> Self {
        self.target.gen_deps = labels(deps);
        self
    }

    /// Gen deps given as already resolved labels.
    #[must_use]
    pub fn gen_dep_labels(mut self, deps: impl IntoIterator<Item = Label>) -> Self {
        self.target.gen_deps.extend(deps);
        self
    }

    /// Own configs.
    #[must_use]
    pub fn configs(mut self, configs: &[&str]) -> Self {
        self.target.configs = labels(configs);
        self
    }

    /// Public configs.
    #[must_use]
    pub fn public_configs(mut self, configs: &[&str]) -> Self {
        self.target.public_configs = labels(configs);
        self
    }

    /// All-dependent configs.
    #[must_use]
    pub fn all_dependent_configs(mut self, configs: &[&str]) -> Self {
        self.target.all_dependent_configs = labels(configs);
        self
    }

    /// Sources.
    #[must_use]
    pub fn sources(mut self, sources: &[&str]) -> Self {
        self.target.sources = sources.iter().map(|s| file(s)).collect();
        self
    }

    /// Extra inputs.
    #[must_use]
    pub fn inputs(mut self, inputs: &[&str]) -> Self {
        self.target.inputs = inputs.iter().map(|s| file(s)).collect();
        self
    }

    /// Runtime data entries.
    #[must_use]
    pub fn data(mut self, data: &[&str]) -> Self {
        self.target.data = data.iter().map(|d| (*d).to_owned()).collect();
        self
    }

    /// Pool for the build step.
    #[must_use]
    pub fn pool(mut self, pool: &str) -> Self {
        self.target.pool = Some(label(pool));
        self
    }

    /// Mark the target testonly.
    #[must_use]
    pub const fn testonly(mut self) -> Self {
        self.target.testonly = true;
        self
    }

    /// Add a build dependency file, such as an import.
    #[must_use]
    pub fn build_dependency(mut self, path: &str) -> Self {
        self.files.push(file(path));
        self
    }

    /// Finish the item.
    pub fn build(self) -> Item {
        let location = Location::new(build_file(&self.label), 1, 1);
        Item::new(self.label, location, ItemKind::Target(self.target))
            .with_build_dependency_files(self.files)
    }
}

/// A [`Loader`] that remembers every request instead of acting on it.
#[derive(Debug, Clone)]
pub struct RecordingLoader {
    default_toolchain: Label,
    /// Labels passed to [`Loader::load`], in call order.
    pub loads: Vec<Label>,
    /// Toolchains reported through [`Loader::toolchain_loaded`].
    pub toolchains: Vec<Label>,
}

impl RecordingLoader {
    /// A loader whose default toolchain is [`default_toolchain`].
    pub fn new() -> Self {
        Self::with_default(default_toolchain())
    }

    /// A loader with a custom default toolchain.
    pub const fn with_default(default_toolchain: Label) -> Self {
        Self {
            default_toolchain,
            loads: Vec::new(),
            toolchains: Vec::new(),
        }
    }
}

impl Default for RecordingLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader for RecordingLoader {
    fn load(&mut self, label: &Label, _origin: &Location) {
        self.loads.push(label.clone());
    }

    fn toolchain_loaded(&mut self, toolchain: &Label) {
        self.toolchains.push(toolchain.clone());
    }

    fn default_toolchain(&self) -> Label {
        self.default_toolchain.clone()
    }
}
