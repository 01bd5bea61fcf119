//! A [`Loader`] backed by a parsed manifest.
//!
//! Every `(directory, toolchain)` pair is instantiated at most once. Requests
//! for a non-default toolchain wait until that toolchain has been defined,
//! and asking for one also asks for the build file declaring it.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, trace};

use super::convert::BuildFileScope;
use super::{DeclarationError, ManifestError};
use crate::analyzer::AnalyzerInputs;
use crate::ast::{BuildFileDecl, MusubiManifest};
use crate::item::Item;
use crate::label::Label;
use crate::loader::Loader;
use crate::location::Location;
use crate::source::{SourceDir, SourceFile};

type Request = (SourceDir, Label);

/// Serves build file instances to the graph in request order.
#[derive(Debug)]
pub struct ManifestLoader {
    build_files: BTreeMap<SourceDir, BuildFileDecl>,
    build_file_name: String,
    default_toolchain: Label,
    inputs: AnalyzerInputs,
    requested: BTreeSet<Request>,
    pending: VecDeque<(Request, Location)>,
    deferred: BTreeMap<Label, Vec<(Request, Location)>>,
    loaded_toolchains: BTreeSet<Label>,
    instantiated: Vec<Request>,
}

fn field_error(
    field: &'static str,
    value: &str,
    source: impl Into<DeclarationError>,
) -> ManifestError {
    ManifestError::InvalidField {
        field,
        value: value.to_owned(),
        source: source.into(),
    }
}

impl ManifestLoader {
    /// Validate the manifest-level fields and index build files by directory.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if the default toolchain, a special file or
    /// a build file key is malformed.
    pub fn new(manifest: MusubiManifest) -> Result<Self, ManifestError> {
        let root = SourceDir::root();
        let default_toolchain = Label::resolve(&root, None, &manifest.default_toolchain)
            .map_err(|e| field_error("default_toolchain", &manifest.default_toolchain, e))?;
        let dot_file = SourceFile::new(&manifest.dotfile)
            .map_err(|e| field_error("dotfile", &manifest.dotfile, e))?;
        let build_config_file = manifest
            .build_config
            .as_deref()
            .map(|path| SourceFile::new(path).map_err(|e| field_error("build_config", path, e)))
            .transpose()?;
        let build_args_dependency_files = manifest
            .build_args_files
            .iter()
            .map(|path| SourceFile::new(path).map_err(|e| field_error("build_args_files", path, e)))
            .collect::<Result<_, _>>()?;

        let mut build_files = BTreeMap::new();
        for (key, decl) in manifest.build_files {
            let dir = SourceDir::new(&key)
                .map_err(|source| ManifestError::InvalidBuildDir { dir: key, source })?;
            build_files.insert(dir, decl);
        }

        Ok(Self {
            build_files,
            build_file_name: manifest.build_file_name,
            default_toolchain,
            inputs: AnalyzerInputs {
                dot_file,
                build_config_file,
                build_args_dependency_files,
            },
            requested: BTreeSet::new(),
            pending: VecDeque::new(),
            deferred: BTreeMap::new(),
            loaded_toolchains: BTreeSet::new(),
            instantiated: Vec::new(),
        })
    }

    /// Files every item implicitly depends on.
    #[must_use]
    pub const fn analyzer_inputs(&self) -> &AnalyzerInputs {
        &self.inputs
    }

    /// Instances produced so far, in order.
    #[must_use]
    pub fn instantiated(&self) -> &[(SourceDir, Label)] {
        &self.instantiated
    }

    /// Toolchains still blocking deferred requests.
    pub fn waiting_toolchains(&self) -> impl Iterator<Item = &Label> {
        self.deferred.keys()
    }

    /// Request the root build file in the default toolchain.
    pub fn schedule_root(&mut self) {
        let origin = Location::new(self.inputs.dot_file.clone(), 1, 1);
        self.schedule(SourceDir::root(), self.default_toolchain.clone(), origin);
    }

    fn schedule(&mut self, dir: SourceDir, toolchain: Label, origin: Location) {
        if self.requested.contains(&(dir.clone(), toolchain.clone())) {
            return;
        }
        self.requested.insert((dir.clone(), toolchain.clone()));
        if toolchain == self.default_toolchain || self.loaded_toolchains.contains(&toolchain) {
            trace!(dir = %dir, toolchain = %toolchain, "build file queued");
            self.pending.push_back(((dir, toolchain), origin));
        } else {
            trace!(dir = %dir, toolchain = %toolchain, "build file waits for toolchain");
            let declaring_dir = toolchain.dir().clone();
            self.deferred
                .entry(toolchain.clone())
                .or_default()
                .push(((dir, toolchain), origin.clone()));
            self.schedule(declaring_dir, self.default_toolchain.clone(), origin);
        }
    }

    /// Instantiate the next queued build file.
    ///
    /// Returns `Ok(None)` once nothing is queued.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingBuildFile`] when the requested
    /// directory has no build file, or a declaration error.
    pub fn next_batch(&mut self) -> Result<Option<Vec<Item>>, ManifestError> {
        let Some(((dir, toolchain), origin)) = self.pending.pop_front() else {
            return Ok(None);
        };
        let Some(decl) = self.build_files.get(&dir) else {
            return Err(ManifestError::MissingBuildFile { dir, origin });
        };
        let file = dir
            .resolve_file(&self.build_file_name)
            .map_err(|e| field_error("build_file_name", &self.build_file_name, e))?;
        let imports = decl
            .imports
            .iter()
            .map(|import| {
                dir.resolve_file(import).map_err(|source| ManifestError::Declaration {
                    name: import.to_owned(),
                    location: Location::new(file.clone(), 1, 1),
                    source: source.into(),
                })
            })
            .collect::<Result<_, _>>()?;
        let scope = BuildFileScope {
            dir: &dir,
            file,
            imports,
            toolchain: &toolchain,
            default_toolchain: &self.default_toolchain,
        };
        let items = scope.instantiate(decl)?;
        debug!(dir = %dir, toolchain = %toolchain, items = items.len(), "build file loaded");
        self.instantiated.push((dir, toolchain));
        Ok(Some(items))
    }
}

impl Loader for ManifestLoader {
    fn load(&mut self, label: &Label, origin: &Location) {
        let toolchain = label
            .toolchain()
            .unwrap_or_else(|| self.default_toolchain.clone());
        self.schedule(label.dir().clone(), toolchain, origin.clone());
    }

    fn toolchain_loaded(&mut self, toolchain: &Label) {
        let key = toolchain.without_toolchain();
        if let Some(waiting) = self.deferred.remove(&key) {
            debug!(toolchain = %key, released = waiting.len(), "toolchain loaded");
            self.pending.extend(waiting);
        }
        self.loaded_toolchains.insert(key);
    }

    fn default_toolchain(&self) -> Label {
        self.default_toolchain.clone()
    }
}
