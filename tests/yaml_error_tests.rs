//! Regression tests for YAML parse errors.
//!
//! These tests ensure diagnostics include line numbers and that schema
//! errors name the manifest and the failing type.

use anyhow::{Result, bail, ensure};
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};
use musubi::manifest::{self, ManifestError, ManifestName};
use rstest::rstest;

fn error_chain(err: &anyhow::Error) -> String {
    err.chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[rstest]
#[case(
    "build_files:\n\t- name: test\n",
    &[
        "line 2, column 2",
        "tabs disallowed within this context",
    ],
)]
#[case(
    "build_files:\n  - name: hi\n    items echo\n",
    &[
        "line 4, column 1",
        "simple key expect ':'",
    ],
)]
#[case(
    concat!(
        "build_files:\n",
        "  - name: ok\n",
        "    items: []\n",
        "  name: missing\n",
        "    items: []\n",
    ),
    &["line 4", "did not find expected '-'"],
)]
#[case(
    "build_files:\n  - name: 'unterminated\n",
    &["YAML parse error", "line 2"],
)]
#[case(
    "",
    &[
        "failed to parse Musubifile",
        "does not match the manifest schema",
        "invalid type: null, expected struct MusubiManifest",
    ],
)]
#[case(
    "# just a comment\n# another comment",
    &[
        "does not match the manifest schema",
        "invalid type: null, expected struct MusubiManifest",
    ],
)]
// No location information should default to the start of the file.
#[case(
    "not: yaml: at all: %$#@!",
    &["YAML parse error", "line 1, column 1"],
)]
fn yaml_diagnostics_are_actionable(#[case] yaml: &str, #[case] needles: &[&str]) -> Result<()> {
    let Err(err) = manifest::from_str(yaml) else {
        bail!("parse should fail");
    };
    let msg = error_chain(&err);
    for needle in needles {
        ensure!(msg.contains(needle), "missing: {needle}\nmessage: {msg}");
    }
    Ok(())
}

#[rstest]
fn schema_errors_name_the_failing_field() -> Result<()> {
    let yaml = concat!(
        "musubi_version: \"1.0.0\"\n",
        "default_toolchain: \"//tc:host\"\n",
        "build_files:\n",
        "  \"//\":\n",
        "    items:\n",
        "      - kind: pool\n",
        "        name: jobs\n",
        "        depth: many\n",
    );
    let Err(err) = manifest::from_str(yaml) else {
        bail!("a non-numeric depth should fail");
    };
    let msg = error_chain(&err);
    ensure!(msg.contains("invalid type"), "message: {msg}");
    Ok(())
}

#[rstest]
fn rendered_reports_point_at_the_offending_line() -> Result<()> {
    let yaml = "musubi_version: \"1.0.0\"\nbuild_files:\n\t- oops\n";
    let name = ManifestName::new("Musubifile");
    let Err(ManifestError::Parse { source, .. }) = manifest::from_str_named(yaml, &name) else {
        bail!("tabs should fail to parse");
    };
    ensure!(
        source.code().map(|code| code.to_string()).as_deref() == Some("musubi::yaml::parse"),
        "unexpected code"
    );
    let mut rendered = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
        .render_report(&mut rendered, source.as_ref())?;
    ensure!(rendered.contains("Musubifile"), "report: {rendered}");
    ensure!(rendered.contains("parse error here"), "report: {rendered}");
    Ok(())
}
