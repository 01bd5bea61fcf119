//! Graph fingerprinting.
//!
//! [`GraphHasher`] computes a stable SHA-256 digest over the observable state
//! of every record: label, type, status, should-generate flag, wired edges
//! and the resolved item. Two graphs built from the same declarations hash
//! identically whatever order the declarations arrived in.
//!
//! # Examples
//!
//! ```
//! use musubi::graph::Graph;
//! use musubi::hasher::GraphHasher;
//! use musubi::label::Label;
//! use musubi::loader::Loader;
//! use musubi::location::Location;
//! use musubi::source::SourceDir;
//!
//! struct NoLoads;
//!
//! impl Loader for NoLoads {
//!     fn load(&mut self, _: &Label, _: &Location) {}
//!     fn toolchain_loaded(&mut self, _: &Label) {}
//!     fn default_toolchain(&self) -> Label {
//!         Label::new(SourceDir::root(), "tc")
//!     }
//! }
//!
//! let digest = GraphHasher::hash(&Graph::new(NoLoads)).expect("hash");
//! assert_eq!(digest.len(), 64);
//! ```

use sha2::{Digest, Sha256};

use crate::graph::{Graph, Record, RecordStatus};
use crate::label::Label;
use crate::loader::Loader;

/// Computes stable digests for [`Graph`] state.
pub struct GraphHasher;

impl GraphHasher {
    /// Calculate the hash of `graph` as lower-case hex.
    ///
    /// # Errors
    ///
    /// Returns an error if an item cannot be serialised.
    pub fn hash<L: Loader>(graph: &Graph<L>) -> Result<String, serde_json::Error> {
        let mut hasher = Sha256::new();
        for record in graph.records() {
            Self::hash_record(&mut hasher, record)?;
        }
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn hash_record(hasher: &mut Sha256, record: &Record) -> Result<(), serde_json::Error> {
        Self::hash_label(hasher, record.label());
        hasher.update(record.item_type().as_str().as_bytes());
        hasher.update(match record.status() {
            RecordStatus::Unknown => b"u",
            RecordStatus::DefinedUnresolved => b"d",
            RecordStatus::Resolved => b"r",
        });
        hasher.update(if record.should_generate() { b"1" } else { b"0" });
        Self::hash_labels(hasher, b"blk", record.blocking_deps());
        Self::hash_labels(hasher, b"unr", record.unresolved_deps());
        Self::hash_labels(hasher, b"gen", record.gen_deps());
        match record.item() {
            Some(item) => {
                hasher.update(b"1");
                Self::update_with_len(hasher, &serde_json::to_vec(item)?);
            }
            None => hasher.update(b"0"),
        }
        Ok(())
    }

    fn hash_labels<'a>(
        hasher: &mut Sha256,
        tag: &[u8],
        labels: impl IntoIterator<Item = &'a Label>,
    ) {
        hasher.update(tag);
        for label in labels {
            Self::hash_label(hasher, label);
        }
    }

    fn hash_label(hasher: &mut Sha256, label: &Label) {
        Self::update_with_len(hasher, label.to_string().as_bytes());
    }

    fn update_with_len(hasher: &mut Sha256, bytes: &[u8]) {
        let len = bytes.len();
        hasher.update(format!("{len}:").as_bytes());
        hasher.update(bytes);
    }
}
