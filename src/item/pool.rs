//! Pool payload.

use serde::Serialize;

/// Limits how many jobs of a kind run at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pool {
    /// Maximum concurrent jobs.
    pub depth: u32,
}
