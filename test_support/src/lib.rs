//! Shared fixtures for the Musubi test suites.
//!
//! Builders for labels and items, a loader that records what the graph asked
//! for, manifest helpers and guards that serialise environment mutations.

pub mod env_lock;
pub mod env_var_guard;
pub mod error;
pub mod graph;
pub mod manifest;

pub use env_lock::EnvLock;
pub use env_var_guard::EnvVarGuard;
pub use graph::{RecordingLoader, TargetBuilder};
