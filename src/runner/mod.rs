//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! loads the manifest, drives the graph to completion and hands the result
//! to the selected command.

mod error;
mod path_helpers;

pub use error::RunnerError;

use crate::analyzer::Analyzer;
use crate::ast::MusubiManifest;
use crate::cli::{Cli, Commands};
use crate::diagnostics::ResultExt;
use crate::graph::{Graph, Record};
use crate::hasher::GraphHasher;
use crate::label::Label;
use crate::manifest::{self, ManifestLoader, ManifestName};
use crate::{dot, source::SourceDir};
use camino::Utf8Path;
use miette::Result;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{debug, info};

use path_helpers::{ensure_manifest_exists, is_stdio_path, resolve_cli_path, resolve_manifest_path};

/// Execute the parsed [`Cli`] command, writing results to stdout.
///
/// # Errors
///
/// Returns a diagnostic if the manifest cannot be loaded, the graph does not
/// resolve, or output cannot be written.
pub fn run(cli: &Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_output(cli, &mut out)
}

/// Execute the parsed [`Cli`] command, writing results to `out`.
///
/// `analyze` writes its response to the path it was given unless that path
/// is `-`.
///
/// # Errors
///
/// See [`run`].
pub fn run_with_output(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let command = cli.command.clone().unwrap_or(Commands::Check);
    let graph = load_graph(cli)?;
    match command {
        Commands::Check => handle_check(&graph, out),
        Commands::Analyze { input, output } => handle_analyze(cli, &graph, &input, &output, out),
        Commands::Graph => write!(out, "{}", dot::generate(&graph)).diag("write DOT output"),
        Commands::Desc { label } => handle_desc(&graph, &label, out),
    }
}

/// Drive `manifest` through the graph until every reachable build file has
/// been instantiated, then check for unresolved items.
///
/// # Errors
///
/// Returns [`RunnerError::Manifest`] if a build file cannot be instantiated
/// and [`RunnerError::Graph`] if the declarations do not resolve.
///
/// # Examples
///
/// ```
/// use musubi::{manifest, runner};
///
/// let manifest = manifest::from_str(concat!(
///     "musubi_version: \"1.0.0\"\n",
///     "default_toolchain: \"//tc:host\"\n",
///     "build_files:\n",
///     "  \"//\":\n",
///     "    items:\n",
///     "      - { kind: target, name: root, type: group }\n",
///     "  \"//tc/\":\n",
///     "    items:\n",
///     "      - kind: toolchain\n",
///     "        name: host\n",
///     "        tools: { stamp: { command: touch } }\n",
/// ))
/// .expect("parse");
/// let graph = runner::build_graph(manifest).expect("graph");
/// assert_eq!(graph.resolved_items().len(), 2);
/// ```
pub fn build_graph(manifest: MusubiManifest) -> Result<Graph<ManifestLoader>, RunnerError> {
    let mut loader = ManifestLoader::new(manifest)?;
    loader.schedule_root();
    let mut graph = Graph::new(loader);
    while let Some(items) = graph.loader_mut().next_batch()? {
        for item in items {
            graph.define_item(item)?;
        }
    }
    graph.check_for_bad_items()?;
    info!(
        build_files = graph.loader().instantiated().len(),
        resolved = graph.resolved_items().len(),
        "graph resolved"
    );
    Ok(graph)
}

fn load_graph(cli: &Cli) -> Result<Graph<ManifestLoader>> {
    let manifest_path = resolve_manifest_path(cli)?;
    ensure_manifest_exists(cli, &manifest_path)?;
    let manifest = load_manifest(&manifest_path)?;
    if tracing::enabled!(tracing::Level::DEBUG) {
        let ast_json = serde_json::to_string_pretty(&manifest).diag("serialise manifest")?;
        debug!("AST:\n{ast_json}");
    }
    Ok(build_graph(manifest)?)
}

fn load_manifest(path: &Utf8Path) -> Result<MusubiManifest> {
    let text = fs::read_to_string(path).diag_with(|| format!("read manifest {path}"))?;
    Ok(manifest::from_str_named(&text, &ManifestName::new(path.as_str()))?)
}

fn handle_check(graph: &Graph<ManifestLoader>, out: &mut impl Write) -> Result<()> {
    let fingerprint = GraphHasher::hash(graph).diag("fingerprint graph")?;
    let generated = graph
        .records()
        .filter(|record| record.should_generate())
        .count();
    writeln!(
        out,
        "{} items resolved, {generated} generated",
        graph.resolved_items().len()
    )
    .diag("write check summary")?;
    writeln!(out, "fingerprint {fingerprint}").diag("write check summary")
}

fn handle_analyze(
    cli: &Cli,
    graph: &Graph<ManifestLoader>,
    input: &Path,
    output: &Path,
    out: &mut impl Write,
) -> Result<()> {
    let request = if is_stdio_path(input) {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .diag("read analyzer request from stdin")?;
        text
    } else {
        let path = resolve_cli_path(cli, input);
        fs::read_to_string(&path)
            .diag_with(|| format!("read analyzer request {}", path.display()))?
    };

    let analyzer = Analyzer::new(
        graph.resolved_items(),
        graph.default_toolchain(),
        graph.loader().analyzer_inputs().clone(),
    );
    let mut response = analyzer
        .analyze_json(&request)
        .diag("serialise analyzer response")?;
    response.push('\n');

    if is_stdio_path(output) {
        out.write_all(response.as_bytes())
            .diag("write analyzer response")
    } else {
        let path = resolve_cli_path(cli, output);
        fs::write(&path, response)
            .diag_with(|| format!("write analyzer response {}", path.display()))
    }
}

fn handle_desc(graph: &Graph<ManifestLoader>, input: &str, out: &mut impl Write) -> Result<()> {
    let default_toolchain = graph.default_toolchain();
    let label = Label::resolve(&SourceDir::root(), Some(&default_toolchain), input).map_err(
        |source| RunnerError::InvalidLabel {
            label: input.to_owned(),
            source,
        },
    )?;
    // Toolchains are recorded without a toolchain of their own.
    let item = graph
        .record(&label)
        .or_else(|| graph.record(&label.without_toolchain()))
        .filter(|record| record.is_resolved())
        .and_then(Record::item)
        .ok_or_else(|| RunnerError::UnknownItem {
            label: label.user_visible_name(&default_toolchain),
        })?;
    let json = serde_json::to_string_pretty(item).diag("serialise item")?;
    writeln!(out, "{json}").diag("write item description")
}
