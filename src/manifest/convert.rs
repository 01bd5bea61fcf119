//! Declarations to items.
//!
//! A build file is instantiated once per toolchain. Relative paths resolve
//! against the build file's directory and relative labels additionally
//! inherit the instantiating toolchain.

use crate::ast::{
    BuildFileDecl, ConfigDecl, ItemDecl, PoolDecl, StringOrList, TargetDecl, ToolchainDecl,
};
use crate::item::{
    ActionValues, Config, ConfigValues, Item, ItemKind, OutputType, Pool, Target, Tool, Toolchain,
};
use crate::label::Label;
use crate::location::Location;
use crate::source::{SourceDir, SourceFile};

use super::{DeclarationError, ManifestError};

/// One build file being instantiated in one toolchain.
pub(crate) struct BuildFileScope<'a> {
    pub(crate) dir: &'a SourceDir,
    pub(crate) file: SourceFile,
    pub(crate) imports: Vec<SourceFile>,
    pub(crate) toolchain: &'a Label,
    pub(crate) default_toolchain: &'a Label,
}

impl BuildFileScope<'_> {
    fn is_default(&self) -> bool {
        self.toolchain == self.default_toolchain
    }

    /// Turn every declaration into an item.
    ///
    /// Toolchains are only declared by the default toolchain's instance.
    pub(crate) fn instantiate(&self, decl: &BuildFileDecl) -> Result<Vec<Item>, ManifestError> {
        let mut items = Vec::with_capacity(decl.items.len());
        for (ordinal, item_decl) in decl.items.iter().enumerate() {
            if matches!(item_decl, ItemDecl::Toolchain(_)) && !self.is_default() {
                continue;
            }
            let line = u32::try_from(ordinal + 1).unwrap_or(u32::MAX);
            let location = Location::new(self.file.clone(), line, 1);
            let item = self.convert(item_decl, location.clone()).map_err(|source| {
                ManifestError::Declaration {
                    name: item_decl.name().to_owned(),
                    location,
                    source,
                }
            })?;
            items.push(item);
        }
        Ok(items)
    }

    fn convert(&self, decl: &ItemDecl, location: Location) -> Result<Item, DeclarationError> {
        let (label, kind) = match decl {
            ItemDecl::Target(target) => (self.own_label(&target.name)?, self.target(target)?),
            ItemDecl::Config(config) => (self.own_label(&config.name)?, self.config(config)?),
            ItemDecl::Toolchain(toolchain) => (
                Label::resolve(self.dir, None, &format!(":{}", toolchain.name))?,
                self.toolchain_kind(toolchain)?,
            ),
            ItemDecl::Pool(PoolDecl { name, depth }) => {
                (self.own_label(name)?, ItemKind::Pool(Pool { depth: *depth }))
            }
        };
        let mut dependency_files = Vec::with_capacity(self.imports.len() + 1);
        dependency_files.push(self.file.clone());
        dependency_files.extend(self.imports.iter().cloned());
        Ok(Item::new(label, location, kind).with_build_dependency_files(dependency_files))
    }

    fn own_label(&self, name: &str) -> Result<Label, DeclarationError> {
        Ok(Label::resolve(
            self.dir,
            Some(self.toolchain),
            &format!(":{name}"),
        )?)
    }

    fn labels(&self, values: &StringOrList) -> Result<Vec<Label>, DeclarationError> {
        values
            .iter()
            .map(|value| Label::resolve(self.dir, Some(self.toolchain), value).map_err(Into::into))
            .collect()
    }

    fn files(&self, values: &StringOrList) -> Result<Vec<SourceFile>, DeclarationError> {
        values
            .iter()
            .map(|value| self.dir.resolve_file(value).map_err(Into::into))
            .collect()
    }

    fn dirs(&self, values: &StringOrList) -> Result<Vec<SourceDir>, DeclarationError> {
        values
            .iter()
            .map(|value| self.dir.resolve_dir(value).map_err(Into::into))
            .collect()
    }

    /// Data entries keep their trailing `/` when they name a directory.
    fn data(&self, values: &StringOrList) -> Result<Vec<String>, DeclarationError> {
        values
            .iter()
            .map(|value| {
                if value.ends_with('/') {
                    Ok(self.dir.resolve_dir(value)?.as_str().to_owned())
                } else {
                    Ok(self.dir.resolve_file(value)?.as_str().to_owned())
                }
            })
            .collect()
    }

    fn target(&self, decl: &TargetDecl) -> Result<ItemKind, DeclarationError> {
        let mut target = Target::new(decl.output_type, self.toolchain.clone());
        target.sources = self.files(&decl.sources)?;
        target.public_headers = self.files(&decl.public)?;
        target.inputs = self.files(&decl.inputs)?;
        target.data = self.data(&decl.data)?;
        target.public_deps = self.labels(&decl.public_deps)?;
        target.private_deps = self.labels(&decl.deps)?;
        target.data_deps = self.labels(&decl.data_deps)?;
        target.gen_deps = self.labels(&decl.gen_deps)?;
        target.configs = self.labels(&decl.configs)?;
        target.all_dependent_configs = self.labels(&decl.all_dependent_configs)?;
        target.public_configs = self.labels(&decl.public_configs)?;
        target.pool = decl
            .pool
            .as_deref()
            .map(|pool| Label::resolve(self.dir, Some(self.toolchain), pool))
            .transpose()?;
        target.testonly = decl.testonly;
        target.action = match (&decl.script, decl.output_type) {
            (Some(script), _) => Some(ActionValues {
                script: self.dir.resolve_file(script)?,
                outputs: self.files(&decl.outputs)?,
                args: decl.args.iter().map(str::to_owned).collect(),
            }),
            (None, OutputType::Action | OutputType::ActionForeach) => {
                return Err(DeclarationError::MissingScript {
                    output_type: decl.output_type.as_str(),
                });
            }
            (None, _) => None,
        };
        Ok(ItemKind::Target(target))
    }

    fn config(&self, decl: &ConfigDecl) -> Result<ItemKind, DeclarationError> {
        Ok(ItemKind::Config(Config {
            configs: self.labels(&decl.configs)?,
            values: ConfigValues {
                defines: decl.defines.iter().map(str::to_owned).collect(),
                include_dirs: self.dirs(&decl.include_dirs)?,
                cflags: decl.cflags.iter().map(str::to_owned).collect(),
                ldflags: decl.ldflags.iter().map(str::to_owned).collect(),
                inputs: self.files(&decl.inputs)?,
            },
            resolved: None,
        }))
    }

    fn toolchain_kind(&self, decl: &ToolchainDecl) -> Result<ItemKind, DeclarationError> {
        let tools = decl
            .tools
            .iter()
            .map(|(name, tool)| {
                let pool = tool
                    .pool
                    .as_deref()
                    .map(|pool| Label::resolve(self.dir, Some(self.default_toolchain), pool))
                    .transpose()?;
                Ok((
                    name.clone(),
                    Tool {
                        command: tool.command.clone(),
                        pool,
                    },
                ))
            })
            .collect::<Result<_, DeclarationError>>()?;
        Ok(ItemKind::Toolchain(Toolchain {
            deps: self.labels(&decl.deps)?,
            tools,
        }))
    }
}
