#![allow(
    clippy::expect_used,
    reason = "manifest loader tests use expect for descriptive failures"
)]

//! Building graphs from manifests: which build files get instantiated, in
//! which toolchains, and what happens when a reference leads nowhere.

use anyhow::{Context, Result, ensure};
use miette::Diagnostic;
use musubi::graph::{Graph, GraphError};
use musubi::label::Label;
use musubi::manifest::{self, ManifestError, ManifestLoader};
use musubi::runner::{RunnerError, build_graph};
use musubi::source::{SourceDir, SourceFile};
use rstest::rstest;
use std::collections::BTreeSet;
use test_support::error::display_error_chain;
use test_support::manifest::{HOST_TOOLCHAIN, host_toolchain_build_file, manifest_yaml};

fn host() -> Label {
    Label::resolve(&SourceDir::root(), None, HOST_TOOLCHAIN).expect("host toolchain")
}

fn dir(path: &str) -> SourceDir {
    SourceDir::new(path).expect("dir")
}

fn in_host(input: &str) -> Label {
    Label::resolve(&SourceDir::root(), Some(&host()), input).expect("label")
}

fn try_graph(build_files: &str) -> Result<Graph<ManifestLoader>, RunnerError> {
    let yaml = manifest_yaml(&format!(
        "build_files:\n{}{build_files}",
        host_toolchain_build_file()
    ));
    let manifest = manifest::from_str(&yaml).expect("manifest parses");
    build_graph(manifest)
}

fn instantiated(graph: &Graph<ManifestLoader>) -> BTreeSet<(SourceDir, Label)> {
    graph.loader().instantiated().iter().cloned().collect()
}

const APP_AND_LIB: &str = concat!(
    "  \"//\":\n",
    "    items:\n",
    "      - kind: target\n",
    "        name: app\n",
    "        type: executable\n",
    "        sources: main.cc\n",
    "        deps: //lib\n",
    "  \"//lib/\":\n",
    "    imports: //build/rules.gni\n",
    "    items:\n",
    "      - kind: target\n",
    "        name: lib\n",
    "        type: static_library\n",
    "        sources: [lib.cc, ../shared/util.cc]\n",
    "  \"//unused/\":\n",
    "    items:\n",
    "      - kind: target\n",
    "        name: unused\n",
    "        type: executable\n",
);

#[rstest]
fn only_reachable_build_files_are_instantiated() -> Result<()> {
    let graph = try_graph(APP_AND_LIB)?;
    let loaded = instantiated(&graph);
    let expected = BTreeSet::from([
        (SourceDir::root(), host()),
        (dir("//lib/"), host()),
        (dir("//tc/"), host()),
    ]);
    ensure!(loaded == expected, "unexpected build files: {loaded:?}");
    ensure!(
        graph.record(&in_host("//unused")).is_none(),
        "unreferenced build file leaked into the graph"
    );
    Ok(())
}

#[rstest]
fn paths_resolve_against_the_declaring_directory() -> Result<()> {
    let graph = try_graph(APP_AND_LIB)?;
    let lib = graph
        .item(&in_host("//lib"))
        .context("lib should be defined")?;
    let target = lib.as_target().context("lib should be a target")?;
    let sources: Vec<&str> = target.sources.iter().map(SourceFile::as_str).collect();
    ensure!(
        sources == ["//lib/lib.cc", "//shared/util.cc"],
        "unexpected sources: {sources:?}"
    );
    let dependency_files: Vec<&str> = lib
        .build_dependency_files()
        .iter()
        .map(SourceFile::as_str)
        .collect();
    ensure!(
        dependency_files == ["//build/rules.gni", "//lib/BUILD.gn"],
        "unexpected build dependency files: {dependency_files:?}"
    );
    Ok(())
}

#[rstest]
fn every_default_toolchain_target_is_generated() -> Result<()> {
    let mut graph = try_graph(APP_AND_LIB)?;
    let generated: BTreeSet<Label> = graph.take_generated().into_iter().collect();
    let expected = BTreeSet::from([in_host("//:app"), in_host("//lib"), host()]);
    ensure!(generated == expected, "unexpected generated set: {generated:?}");
    Ok(())
}

#[rstest]
fn a_second_toolchain_instantiates_build_files_again() -> Result<()> {
    let graph = try_graph(concat!(
        "  \"//tc2/\":\n",
        "    items:\n",
        "      - kind: toolchain\n",
        "        name: other\n",
        "        tools:\n",
        "          link: { command: cc }\n",
        "          alink: { command: ar }\n",
        "          stamp: { command: touch }\n",
        "  \"//\":\n",
        "    items:\n",
        "      - kind: target\n",
        "        name: app\n",
        "        type: executable\n",
        "        deps: //lib\n",
        "        data_deps: \"//tools:gen(//tc2:other)\"\n",
        "  \"//tools/\":\n",
        "    items:\n",
        "      - kind: target\n",
        "        name: gen\n",
        "        type: executable\n",
        "        deps: //lib\n",
        "  \"//lib/\":\n",
        "    items:\n",
        "      - kind: target\n",
        "        name: lib\n",
        "        type: static_library\n",
    ))?;
    let tc2 = Label::resolve(&SourceDir::root(), None, "//tc2:other").expect("tc2");
    let loaded = instantiated(&graph);
    let expected = BTreeSet::from([
        (SourceDir::root(), host()),
        (dir("//lib/"), host()),
        (dir("//lib/"), tc2.clone()),
        (dir("//tc/"), host()),
        (dir("//tc2/"), host()),
        (dir("//tools/"), tc2.clone()),
    ]);
    ensure!(loaded == expected, "unexpected build files: {loaded:?}");

    let gen_lib = Label::resolve(&SourceDir::root(), Some(&tc2), "//lib").expect("label");
    let record = graph.record(&gen_lib).context("lib in tc2")?;
    ensure!(record.is_resolved(), "lib in tc2 should resolve");
    ensure!(
        record.should_generate(),
        "lib in tc2 is reachable from a generated target"
    );
    ensure!(
        graph.loader().waiting_toolchains().next().is_none(),
        "no request should still wait for a toolchain"
    );
    Ok(())
}

#[rstest]
fn references_into_an_undeclared_toolchain_stay_unresolved() {
    let err = try_graph(concat!(
        "  \"//\":\n",
        "    items:\n",
        "      - kind: target\n",
        "        name: app\n",
        "        type: group\n",
        "        deps: \"//tc:helper(//tc:other)\"\n",
    ))
    .expect_err("//tc:other is never declared");
    assert!(
        matches!(err, RunnerError::Graph(GraphError::UnresolvedDependencies { .. })),
        "unexpected error: {err:?}"
    );
    assert!(err.to_string().contains("//tc:helper(//tc:other)"), "{err}");
}

#[rstest]
fn a_reference_into_an_undeclared_directory_fails() {
    let err = try_graph(concat!(
        "  \"//\":\n",
        "    items:\n",
        "      - kind: target\n",
        "        name: app\n",
        "        type: executable\n",
        "        deps: //nowhere:x\n",
    ))
    .expect_err("//nowhere/ has no build file");
    let RunnerError::Manifest(ManifestError::MissingBuildFile { dir: missing, origin }) = &err
    else {
        panic!("expected a missing build file, got {err:?}");
    };
    assert_eq!(*missing, dir("//nowhere/"));
    assert_eq!(origin.file.as_str(), "//BUILD.gn");
    assert_eq!(
        err.code().map(|code| code.to_string()).as_deref(),
        Some("musubi::manifest::missing_build_file")
    );
}

#[rstest]
fn an_undeclared_name_in_a_loaded_build_file_is_unresolved() {
    let err = try_graph(concat!(
        "  \"//\":\n",
        "    items:\n",
        "      - kind: target\n",
        "        name: app\n",
        "        type: executable\n",
        "        deps: //lib:ghost\n",
        "  \"//lib/\":\n",
        "    items:\n",
        "      - kind: target\n",
        "        name: lib\n",
        "        type: static_library\n",
    ))
    .expect_err("ghost is never declared");
    let RunnerError::Graph(GraphError::UnresolvedDependencies { missing }) = &err else {
        panic!("expected unresolved dependencies, got {err:?}");
    };
    assert_eq!(*missing, vec![(in_host("//:app"), in_host("//lib:ghost"))]);
}

#[rstest]
fn declaration_errors_name_the_item_and_site() {
    let err = try_graph(concat!(
        "  \"//\":\n",
        "    items:\n",
        "      - kind: pool\n",
        "        name: jobs\n",
        "        depth: 1\n",
        "      - kind: target\n",
        "        name: gen\n",
        "        type: action\n",
    ))
    .expect_err("action without a script");
    let RunnerError::Manifest(ManifestError::Declaration { name, location, .. }) = &err else {
        panic!("expected a declaration error, got {err:?}");
    };
    assert_eq!(name, "gen");
    assert_eq!(location.file.as_str(), "//BUILD.gn");
    assert_eq!(location.line, 2, "the second declaration in the file");
}

#[rstest]
fn analyzer_inputs_come_from_the_manifest() -> Result<()> {
    let yaml = manifest_yaml(concat!(
        "build_config: //build/BUILDCONFIG.gn\n",
        "build_args_files: [//build/args.gni, //out/args.gn]\n",
        "build_files: {}\n",
    ));
    let loader = ManifestLoader::new(manifest::from_str(&yaml)?)?;
    let inputs = loader.analyzer_inputs();
    ensure!(inputs.dot_file.as_str() == "//.gn", "dotfile default");
    ensure!(
        inputs.build_config_file.as_ref().map(SourceFile::as_str)
            == Some("//build/BUILDCONFIG.gn"),
        "build config: {:?}",
        inputs.build_config_file
    );
    let args: Vec<&str> = inputs
        .build_args_dependency_files
        .iter()
        .map(SourceFile::as_str)
        .collect();
    ensure!(
        args == ["//build/args.gni", "//out/args.gn"],
        "args: {args:?}"
    );
    Ok(())
}

#[rstest]
#[case::default_toolchain("default_toolchain: \"//:\"\n", "default_toolchain")]
#[case::build_dir("build_files: { \"relative/\": {} }\n", "relative/")]
fn malformed_manifest_fields_are_rejected(#[case] body: &str, #[case] needle: &str) {
    let yaml = if body.starts_with("default_toolchain") {
        format!("musubi_version: \"1.0.0\"\n{body}build_files: {{}}\n")
    } else {
        manifest_yaml(body)
    };
    let manifest = manifest::from_str(&yaml).expect("schema is valid");
    let err = ManifestLoader::new(manifest).expect_err("field is malformed");
    let chain = display_error_chain(&err);
    assert!(chain.contains(needle), "unexpected error: {chain}");
}
