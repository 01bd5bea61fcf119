#![allow(
    clippy::expect_used,
    reason = "runner tests use expect for descriptive failures"
)]

//! In-process tests for command dispatch.
//!
//! These tests write a manifest into a temporary directory and drive
//! [`runner::run_with_output`] directly, capturing what each command writes.

use musubi::cli::{Cli, Commands};
use musubi::runner;
use rstest::{fixture, rstest};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use test_support::manifest::{app_manifest_body, host_toolchain_build_file, write_manifest};

#[fixture]
fn project() -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    write_manifest(dir.path(), &app_manifest_body());
    dir
}

fn cli_in(dir: &TempDir, command: Commands) -> Cli {
    Cli {
        directory: Some(dir.path().to_path_buf()),
        command: Some(command),
        ..Cli::default()
    }
}

fn run(cli: &Cli) -> String {
    let mut out = Vec::new();
    runner::run_with_output(cli, &mut out).expect("command succeeds");
    String::from_utf8(out).expect("utf-8 output")
}

#[rstest]
fn check_reports_counts_and_fingerprint(project: TempDir) {
    let output = run(&cli_in(&project, Commands::Check));
    let mut lines = output.lines();
    assert_eq!(lines.next(), Some("5 items resolved, 5 generated"));
    let fingerprint = lines
        .next()
        .and_then(|line| line.strip_prefix("fingerprint "))
        .expect("fingerprint line");
    assert_eq!(fingerprint.len(), 64);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));

    let again = run(&cli_in(&project, Commands::Check));
    assert_eq!(output, again, "fingerprint is stable across runs");
}

#[rstest]
fn manifest_path_is_taken_from_the_file_flag() {
    let dir = tempfile::tempdir().expect("temp dir");
    let custom = dir.path().join("custom.yml");
    fs::write(
        &custom,
        test_support::manifest::manifest_yaml(&app_manifest_body()),
    )
    .expect("write manifest");
    let cli = Cli {
        file: custom,
        command: Some(Commands::Check),
        ..Cli::default()
    };
    assert!(run(&cli).starts_with("5 items resolved"));
}

#[rstest]
fn analyze_reads_and_writes_relative_to_the_directory(project: TempDir) {
    fs::write(
        project.path().join("request.json"),
        r#"{"files": ["//lib/lib.cc"], "additional_compile_targets": ["//:app"], "test_targets": ["//:unit"]}"#,
    )
    .expect("write request");
    let cli = cli_in(
        &project,
        Commands::Analyze {
            input: PathBuf::from("request.json"),
            output: PathBuf::from("response.json"),
        },
    );
    assert_eq!(run(&cli), "", "the response goes to the output file");

    let response = fs::read_to_string(project.path().join("response.json")).expect("response");
    let value: Value = serde_json::from_str(&response).expect("response JSON");
    assert_eq!(
        value,
        serde_json::json!({
            "status": "Found dependency",
            "compile_targets": ["//:app"],
            "test_targets": ["//:unit"],
        })
    );
}

#[rstest]
fn analyze_short_circuits_on_the_build_config(project: TempDir) {
    fs::write(
        project.path().join("request.json"),
        r#"{"files": ["//build/BUILDCONFIG.gn"], "additional_compile_targets": "all", "test_targets": []}"#,
    )
    .expect("write request");
    let cli = cli_in(
        &project,
        Commands::Analyze {
            input: PathBuf::from("request.json"),
            output: PathBuf::from("-"),
        },
    );
    let value: Value = serde_json::from_str(&run(&cli)).expect("response JSON");
    assert_eq!(value["status"], "Found dependency (all)");
    assert_eq!(value["compile_targets"], serde_json::json!(["all"]));
}

#[rstest]
fn graph_prints_dot(project: TempDir) {
    let output = run(&cli_in(&project, Commands::Graph));
    assert!(output.starts_with("digraph musubi {"), "{output}");
    assert!(output.contains("\"//:app\" -> \"//lib:lib\";"), "{output}");
    assert!(output.contains("\"//lib:warnings\" [shape=ellipse"), "{output}");
}

#[rstest]
#[case::target("//lib", "//lib:lib(//tc:host)", "target")]
#[case::config("//lib:warnings", "//lib:warnings(//tc:host)", "config")]
#[case::toolchain("//tc:host", "//tc:host", "toolchain")]
fn desc_prints_resolved_items(
    project: TempDir,
    #[case] input: &str,
    #[case] label: &str,
    #[case] kind: &str,
) {
    let output = run(&cli_in(
        &project,
        Commands::Desc {
            label: input.to_owned(),
        },
    ));
    let value: Value = serde_json::from_str(&output).expect("item JSON");
    assert_eq!(value["label"], label);
    assert!(value.get(kind).is_some(), "missing {kind} payload: {output}");
}

#[rstest]
fn desc_shows_resolved_configs(project: TempDir) {
    let output = run(&cli_in(
        &project,
        Commands::Desc {
            label: "//:app".to_owned(),
        },
    ));
    let value: Value = serde_json::from_str(&output).expect("item JSON");
    assert_eq!(
        value["target"]["resolved"]["configs"],
        serde_json::json!(["//lib:warnings(//tc:host)"])
    );
    assert_eq!(value["target"]["resolved"]["tool"], "link");
}

#[rstest]
#[case::unknown("//nowhere:thing", "//nowhere:thing")]
#[case::malformed("//:", "invalid label")]
fn desc_rejects_labels_without_items(
    project: TempDir,
    #[case] input: &str,
    #[case] needle: &str,
) {
    let cli = cli_in(
        &project,
        Commands::Desc {
            label: input.to_owned(),
        },
    );
    let err = runner::run_with_output(&cli, &mut Vec::new()).expect_err("no such item");
    assert!(err.to_string().contains(needle), "unexpected error: {err}");
}

#[rstest]
fn unresolvable_manifests_fail_before_dispatch() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_manifest(
        dir.path(),
        &format!(
            concat!(
                "build_files:\n",
                "{}",
                "  \"//\":\n",
                "    items:\n",
                "      - {{ kind: target, name: app, type: group, deps: \"//:ghost\" }}\n",
            ),
            host_toolchain_build_file()
        ),
    );
    let err = runner::run_with_output(&cli_in(&dir, Commands::Graph), &mut Vec::new())
        .expect_err("ghost is undefined");
    let rendered = format!("{err:?}");
    assert!(rendered.contains("//:ghost"), "{rendered}");
}
