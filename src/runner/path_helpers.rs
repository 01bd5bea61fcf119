//! Path resolution helpers for the runner module.
//!
//! `-C/--directory` behaves like a working directory change for every path
//! supplied on the command line.

use crate::cli::Cli;
use camino::{Utf8Path, Utf8PathBuf};
use std::borrow::Cow;
use std::path::Path;

use super::RunnerError;

/// Stdin or stdout, depending on direction.
pub(super) const STDIO_PATH: &str = "-";

pub(super) fn is_stdio_path(path: &Path) -> bool {
    path.as_os_str() == STDIO_PATH
}

fn utf8(path: &Path) -> Result<Utf8PathBuf, RunnerError> {
    Utf8PathBuf::from_path_buf(path.to_path_buf())
        .map_err(|path| RunnerError::NonUtf8Path { path })
}

/// Determine the manifest path respecting the CLI's directory option.
///
/// # Errors
/// Returns an error when the CLI `file` or `directory` paths are not valid UTF-8.
pub(super) fn resolve_manifest_path(cli: &Cli) -> Result<Utf8PathBuf, RunnerError> {
    let file = utf8(&cli.file)?;
    match &cli.directory {
        Some(dir) => Ok(utf8(dir)?.join(file)),
        None => Ok(file),
    }
}

/// Resolve a command line path relative to the CLI working directory.
#[must_use]
pub(super) fn resolve_cli_path<'a>(cli: &Cli, path: &'a Path) -> Cow<'a, Path> {
    if path.is_relative() {
        cli.directory
            .as_ref()
            .map_or_else(|| Cow::Borrowed(path), |dir| Cow::Owned(dir.join(path)))
    } else {
        Cow::Borrowed(path)
    }
}

pub(super) fn ensure_manifest_exists(
    cli: &Cli,
    manifest_path: &Utf8Path,
) -> Result<(), RunnerError> {
    if manifest_path.as_std_path().exists() {
        return Ok(());
    }
    let manifest_name = manifest_path
        .file_name()
        .unwrap_or(manifest_path.as_str())
        .to_owned();
    let directory = if cli.directory.is_some() {
        let parent = manifest_path
            .parent()
            .map_or_else(|| manifest_path.as_str(), Utf8Path::as_str);
        format!("directory {parent}")
    } else {
        String::from("the current directory")
    };
    Err(RunnerError::ManifestNotFound {
        manifest_name,
        directory,
        path: manifest_path.as_std_path().to_path_buf(),
    })
}
