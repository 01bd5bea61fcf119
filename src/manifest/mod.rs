//! Manifest loading.
//!
//! A `Musubifile` is YAML. It is parsed into a [`ManifestValue`] first so
//! YAML errors keep their spans, then deserialised into the typed
//! [`MusubiManifest`] so schema errors name the failing field. The
//! [`ManifestLoader`] then serves as the graph's [`Loader`](crate::loader::Loader),
//! instantiating build files per toolchain as labels are requested.

use crate::ast::MusubiManifest;
use anyhow::{Context, Result};
use std::{fs, path::Path};

mod convert;
mod diagnostics;
mod loader;

/// JSON representation of a manifest after YAML parsing.
pub type ManifestValue = serde_json::Value;

pub use diagnostics::{
    DeclarationError, ManifestError, ManifestName, map_data_error, map_yaml_error,
};
pub use loader::ManifestLoader;

/// Parse manifest text, naming it `name` in diagnostics.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] if the YAML is malformed or does not
/// match the manifest schema.
pub fn from_str_named(yaml: &str, name: &ManifestName) -> Result<MusubiManifest, ManifestError> {
    let doc: ManifestValue = serde_saphyr::from_str(yaml).map_err(|e| ManifestError::Parse {
        source: map_yaml_error(e, yaml, name),
        name: name.clone(),
    })?;
    serde_json::from_value(doc).map_err(|e| ManifestError::Parse {
        source: map_data_error(e, name),
        name: name.clone(),
    })
}

/// Parse manifest text.
///
/// # Errors
///
/// Returns an error if the YAML is malformed or does not match the schema.
pub fn from_str(yaml: &str) -> Result<MusubiManifest> {
    Ok(from_str_named(yaml, &ManifestName::new("Musubifile"))?)
}

/// Load a [`MusubiManifest`] from the given file path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails to parse.
pub fn from_path(path: impl AsRef<Path>) -> Result<MusubiManifest> {
    let path_ref = path.as_ref();
    let data = fs::read_to_string(path_ref)
        .with_context(|| format!("failed to read {}", path_ref.display()))?;
    let name = ManifestName::new(path_ref.display().to_string());
    Ok(from_str_named(&data, &name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;
    use rstest::rstest;

    #[rstest]
    fn parses_minimal_manifest() {
        let manifest = from_str(concat!(
            "musubi_version: \"1.0.0\"\n",
            "default_toolchain: \"//tc:host\"\n",
            "build_files: {}\n",
        ))
        .expect("parse");
        assert_eq!(manifest.dotfile, "//.gn");
        assert_eq!(manifest.build_file_name, "BUILD.gn");
        assert!(manifest.build_files.is_empty());
    }

    #[rstest]
    #[case::bad_yaml("musubi_version: [1\n", "musubi::yaml::parse")]
    #[case::missing_key("musubi_version: \"1.0.0\"\n", "musubi::manifest::structure")]
    #[case::bad_version(
        "musubi_version: one\ndefault_toolchain: \"//tc:x\"\nbuild_files: {}\n",
        "musubi::manifest::structure"
    )]
    fn parse_failures_keep_inner_code(#[case] yaml: &str, #[case] code: &str) {
        let err = from_str_named(yaml, &ManifestName::new("Musubifile")).expect_err("should fail");
        let ManifestError::Parse { source, .. } = err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert_eq!(source.code().map(|c| c.to_string()).as_deref(), Some(code));
    }
}
