//! Command line interface definition using clap.
//!
//! [`Cli`] is parsed by clap and then merged with configuration layers by
//! `ortho_config`: built-in defaults, a discovered `.musubi.toml` (or the
//! file named by `MUSUBI_CONFIG_PATH`), `MUSUBI_*` environment variables and
//! finally the flags given on the command line.

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use ortho_config::declarative::LayerComposition;
use ortho_config::figment::{Figment, providers::Env};
use ortho_config::uncased::Uncased;
use ortho_config::{
    ConfigDiscovery, MergeComposer, OrthoConfig, OrthoMergeExt, OrthoResult, sanitize_value,
};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

const CONFIG_ENV_VAR: &str = "MUSUBI_CONFIG_PATH";
const ENV_PREFIX: &str = "MUSUBI_";

/// Only these fields have clap defaults that would mask lower layers.
const DEFAULTED_FIELDS: [&str; 2] = ["file", "verbose"];

/// Resolve a declarative build graph and answer change impact queries.
#[derive(Debug, Parser, Serialize, Deserialize, OrthoConfig)]
#[command(author, version, about, long_about = None)]
#[ortho_config(prefix = "MUSUBI")]
pub struct Cli {
    /// Path to the Musubi manifest file to use.
    #[arg(short, long, value_name = "FILE", default_value = "Musubifile")]
    #[ortho_config(default = default_manifest_path())]
    pub file: PathBuf,

    /// Run as if started in this directory.
    ///
    /// This affects manifest lookup, analyzer file paths and config
    /// discovery.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Enable verbose diagnostic logging.
    #[arg(short, long)]
    #[ortho_config(default = false)]
    pub verbose: bool,

    /// Optional subcommand to execute; defaults to `check` when omitted.
    ///
    /// `OrthoConfig` merging ignores this field; CLI parsing supplies it.
    #[serde(skip)]
    #[command(subcommand)]
    #[ortho_config(skip_cli)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Check);
        }
        self
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            file: default_manifest_path(),
            directory: None,
            verbose: false,
            command: None,
        }
        .with_default_command()
    }
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Commands {
    /// Load and resolve the whole graph, then print its fingerprint.
    Check,

    /// Answer a change impact query.
    Analyze {
        /// JSON request naming changed files and candidate targets.
        ///
        /// Use `-` to read from stdin.
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Where to write the JSON response.
        ///
        /// Use `-` to write to stdout.
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Print the resolved graph in DOT format.
    Graph,

    /// Print a resolved item as JSON.
    Desc {
        /// Label of the item, for example `//base:net`.
        #[arg(value_name = "LABEL")]
        label: String,
    },
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("Musubifile")
}

/// Parse CLI arguments.
///
/// Returns both the parsed CLI struct and the `ArgMatches` required for
/// configuration merging.
///
/// # Errors
///
/// Returns a `clap::Error` when the arguments do not parse.
pub fn parse_from<I, T>(iter: I) -> Result<(Cli, ArgMatches), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut command = Cli::command();
    let matches = command.try_get_matches_from_mut(iter)?;
    // Clone matches before from_arg_matches_mut consumes the values.
    let mut matches_for_parse = matches.clone();
    let cli = Cli::from_arg_matches_mut(&mut matches_for_parse)
        .map_err(|err| err.with_cmd(&command))?;
    Ok((cli, matches))
}

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX)
}

/// Build configuration discovery rooted in the optional working directory.
fn config_discovery(directory: Option<&PathBuf>) -> ConfigDiscovery {
    let mut builder = ConfigDiscovery::builder("musubi").env_var(CONFIG_ENV_VAR);
    if let Some(dir) = directory {
        builder = builder.clear_project_roots().add_project_root(dir);
    }
    builder.build()
}

/// An empty JSON object means "no overrides".
fn is_empty_value(value: &serde_json::Value) -> bool {
    matches!(value, serde_json::Value::Object(map) if map.is_empty())
}

fn cli_overrides_from_matches(cli: &Cli, matches: &ArgMatches) -> OrthoResult<serde_json::Value> {
    let mut map = match sanitize_value(cli)? {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(Arc::new(ortho_config::OrthoError::Validation {
                key: String::from("cli"),
                message: format!(
                    "expected parsed CLI values to serialize to an object, got {other:?}"
                ),
            }));
        }
    };

    map.remove("command");
    for field in DEFAULTED_FIELDS {
        if matches.value_source(field) != Some(ValueSource::CommandLine) {
            map.remove(field);
        }
    }

    Ok(serde_json::Value::Object(map))
}

/// Merge configuration layers over the parsed CLI values.
///
/// # Errors
///
/// Returns an [`ortho_config::OrthoError`] if layer composition or merging
/// fails.
pub fn merge_with_config(cli: &Cli, matches: &ArgMatches) -> OrthoResult<Cli> {
    let command = cli.command.clone();
    let mut errors = Vec::new();
    let mut composer = MergeComposer::with_capacity(4);

    match sanitize_value(&Cli::default()) {
        Ok(value) => composer.push_defaults(value),
        Err(err) => errors.push(err),
    }

    let discovery = config_discovery(cli.directory.as_ref());
    let mut file_layers = discovery.compose_layers();
    errors.append(&mut file_layers.required_errors);
    if file_layers.value.is_empty() {
        errors.append(&mut file_layers.optional_errors);
    }
    for layer in file_layers.value {
        composer.push_layer(layer);
    }

    let env_provider = env_provider()
        .map(|key| Uncased::new(key.as_str().to_ascii_uppercase()))
        .split("__");
    match Figment::from(env_provider)
        .extract::<serde_json::Value>()
        .into_ortho_merge()
    {
        Ok(value) => composer.push_environment(value),
        Err(err) => errors.push(err),
    }

    match cli_overrides_from_matches(cli, matches) {
        Ok(value) if !is_empty_value(&value) => composer.push_cli(value),
        Ok(_) => {}
        Err(err) => errors.push(err),
    }

    let composition = LayerComposition::new(composer.layers(), errors);
    let mut merged = composition.into_merge_result(Cli::merge_from_layers)?;
    merged.command = command;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::no_args(&["musubi"], Commands::Check)]
    #[case::graph(&["musubi", "graph"], Commands::Graph)]
    #[case::desc(&["musubi", "desc", "//base:net"], Commands::Desc { label: "//base:net".into() })]
    #[case::analyze(
        &["musubi", "analyze", "-", "out.json"],
        Commands::Analyze { input: "-".into(), output: "out.json".into() }
    )]
    fn parses_subcommands(#[case] args: &[&str], #[case] expected: Commands) {
        let (cli, _) = parse_from(args).expect("parse");
        assert_eq!(cli.with_default_command().command, Some(expected));
    }

    #[rstest]
    fn overrides_only_keep_explicit_flags() {
        let (cli, matches) = parse_from(["musubi", "-v"]).expect("parse");
        let value = cli_overrides_from_matches(&cli, &matches).expect("overrides");
        let map = value.as_object().expect("object");
        assert_eq!(map.get("verbose"), Some(&serde_json::Value::Bool(true)));
        assert!(!map.contains_key("file"));
        assert!(!map.contains_key("command"));
    }

    #[rstest]
    fn analyze_requires_both_paths() {
        assert!(parse_from(["musubi", "analyze", "in.json"]).is_err());
    }
}
