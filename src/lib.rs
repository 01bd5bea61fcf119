//! Musubi core library.
//!
//! Declarations arrive in any order and are resolved into a build graph as
//! soon as their dependencies are known. The resolved graph answers change
//! impact queries through the [`analyzer`]. The binary reads pre-evaluated
//! declarations from a YAML `Musubifile`.

pub mod analyzer;
pub mod ast;
pub mod cli;
mod diagnostics;
pub mod dot;
pub mod graph;
pub mod hasher;
pub mod item;
pub mod label;
pub mod loader;
pub mod location;
pub mod manifest;
pub mod runner;
pub mod source;
