//! Application entry point.
//!
//! Parses command-line arguments, merges configuration layers and delegates
//! execution to [`runner::run`]. Failures are printed once as a `miette`
//! report.

use musubi::{cli, runner};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt;

fn report(diagnostic: &miette::Report) {
    let mut stderr = io::stderr().lock();
    if writeln!(stderr, "{diagnostic:?}").is_err() {
        tracing::error!(error = %diagnostic, "failed to write diagnostic");
    }
}

fn main() -> ExitCode {
    let (parsed, matches) = match cli::parse_from(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(err) => err.exit(),
    };
    let merged = match cli::merge_with_config(&parsed, &matches) {
        Ok(merged) => merged.with_default_command(),
        Err(err) => {
            report(&miette::miette!("{err}"));
            return ExitCode::FAILURE;
        }
    };

    let max_level = if merged.verbose {
        Level::DEBUG
    } else {
        Level::ERROR
    };
    fmt()
        .with_max_level(max_level)
        .with_writer(io::stderr)
        .init();

    match runner::run(&merged) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}
