//! Change impact analysis.
//!
//! The [`Analyzer`] answers "which of these targets must be rebuilt or
//! re-run if these files changed?" against a fully resolved graph. It
//! indexes every item by label and records, for each item, which items
//! reference it. A query marks the items touching a changed file, walks the
//! reverse edges to collect everything downstream, and intersects that with
//! the requested targets.
//!
//! Files every target implicitly depends on (the dotfile, the build config
//! and the build argument files) short-circuit the walk: when one of them
//! changes, everything requested is affected.

mod request;
mod response;

pub use request::{ALL, AnalyzeRequest, CompileTargets, RequestError};
pub use response::{AnalyzeResponse, Status};

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use tracing::{debug, info};

use crate::item::{Item, ItemKind, ItemType, Target};
use crate::label::Label;
use crate::source::SourceFile;
use request::Query;
use response::all_sentinel;

/// Files outside any item that every item depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerInputs {
    /// Main entry declaration file.
    pub dot_file: SourceFile,
    /// Root build configuration file, if any.
    pub build_config_file: Option<SourceFile>,
    /// Files read while evaluating build arguments.
    pub build_args_dependency_files: BTreeSet<SourceFile>,
}

impl AnalyzerInputs {
    fn affects_everything(&self, file: &SourceFile) -> bool {
        *file == self.dot_file
            || self.build_config_file.as_ref() == Some(file)
            || self.build_args_dependency_files.contains(file)
    }
}

/// Read-only index over the resolved items of a graph.
#[derive(Debug)]
pub struct Analyzer<'a> {
    labels_to_items: BTreeMap<Label, &'a Item>,
    reverse_edges: BTreeMap<Label, BTreeSet<Label>>,
    default_toolchain: Label,
    inputs: AnalyzerInputs,
}

impl<'a> Analyzer<'a> {
    /// Index `items`, typically [`Graph::resolved_items`](crate::graph::Graph::resolved_items).
    pub fn new(
        items: impl IntoIterator<Item = &'a Item>,
        default_toolchain: Label,
        inputs: AnalyzerInputs,
    ) -> Self {
        let labels_to_items: BTreeMap<Label, &'a Item> = items
            .into_iter()
            .map(|item| (item.label().clone(), item))
            .collect();
        let mut reverse_edges: BTreeMap<Label, BTreeSet<Label>> = BTreeMap::new();
        for (label, item) in &labels_to_items {
            for reference in item.references() {
                reverse_edges
                    .entry(reference.label)
                    .or_default()
                    .insert(label.clone());
            }
        }
        Self {
            labels_to_items,
            reverse_edges,
            default_toolchain,
            inputs,
        }
    }

    /// Answer `request`.
    #[must_use]
    pub fn analyze(&self, request: &AnalyzeRequest) -> AnalyzeResponse {
        let query = match request.to_query(&self.default_toolchain) {
            Ok(query) => query,
            Err(err) => return AnalyzeResponse::malformed(err.to_string()),
        };

        let invalid = self.invalid_labels(&query);
        if !invalid.is_empty() {
            return AnalyzeResponse::Error {
                error: "Invalid targets".to_owned(),
                invalid_targets: self.render(invalid.into_iter()),
            };
        }

        if query
            .files
            .iter()
            .any(|file| self.inputs.affects_everything(file))
        {
            info!("build configuration changed; everything is affected");
            let compile_targets = if query.compile_all {
                all_sentinel()
            } else {
                self.render(query.compile_labels.union(&query.test_labels))
            };
            return AnalyzeResponse::Success {
                status: Status::FoundDependencyAll,
                compile_targets,
                test_targets: self.render(query.test_labels.iter()),
            };
        }

        let affected = self.all_affected(&query.files);
        let any_target = affected.iter().any(|label| {
            self.labels_to_items
                .get(*label)
                .is_some_and(|item| item.item_type() == ItemType::Target)
        });
        if !any_target {
            return AnalyzeResponse::no_dependency();
        }

        let mut universe = query.compile_labels.clone();
        if query.compile_all {
            universe.extend(self.root_targets());
        }
        let filtered = self.filter_targets(&universe);
        let compile: BTreeSet<&Label> = filtered
            .iter()
            .filter(|label| affected.contains(**label))
            .copied()
            .collect();
        let tests: BTreeSet<&Label> = query
            .test_labels
            .iter()
            .filter(|label| affected.contains(*label))
            .collect();
        debug!(
            affected = affected.len(),
            compile = compile.len(),
            tests = tests.len(),
            "analysis complete"
        );

        let status = if compile.is_empty() && tests.is_empty() {
            Status::NoDependency
        } else {
            Status::FoundDependency
        };
        let collapse = query.compile_all && !compile.is_empty() && compile.len() == filtered.len();
        let compile_targets = if collapse {
            all_sentinel()
        } else {
            self.render(compile.into_iter())
        };
        AnalyzeResponse::Success {
            status,
            compile_targets,
            test_targets: self.render(tests.into_iter()),
        }
    }

    /// Parse `input` as a request, answer it and serialise the reply.
    ///
    /// Malformed requests produce an error response rather than failing.
    ///
    /// # Errors
    ///
    /// Returns an error only if the response cannot be serialised.
    pub fn analyze_json(&self, input: &str) -> Result<String, serde_json::Error> {
        let response = match AnalyzeRequest::from_json(input) {
            Ok(request) => self.analyze(&request),
            Err(err) => AnalyzeResponse::malformed(err.to_string()),
        };
        serde_json::to_string_pretty(&response)
    }

    fn target(&self, label: &Label) -> Option<&'a Target> {
        self.labels_to_items
            .get(label)
            .copied()
            .and_then(Item::as_target)
    }

    fn invalid_labels<'q>(&self, query: &'q Query) -> BTreeSet<&'q Label> {
        query
            .compile_labels
            .iter()
            .chain(&query.test_labels)
            .filter(|label| self.target(label).is_none())
            .collect()
    }

    /// Targets nothing else references.
    fn root_targets(&self) -> impl Iterator<Item = Label> + '_ {
        self.labels_to_items
            .iter()
            .filter(|(label, item)| {
                item.item_type() == ItemType::Target && !self.reverse_edges.contains_key(*label)
            })
            .map(|(label, _)| label.clone())
    }

    fn all_affected(&self, files: &BTreeSet<SourceFile>) -> BTreeSet<&Label> {
        let mut affected: BTreeSet<&Label> = BTreeSet::new();
        let mut stack: Vec<&Label> = self
            .labels_to_items
            .iter()
            .filter(|(_, item)| files.iter().any(|file| refers_to_file(item, file)))
            .map(|(label, _)| label)
            .collect();
        while let Some(label) = stack.pop() {
            if !affected.insert(label) {
                continue;
            }
            if let Some(dependents) = self.reverse_edges.get(label) {
                stack.extend(dependents.iter().filter(|dep| !affected.contains(*dep)));
            }
        }
        affected
    }

    /// Replace groups by the non-group targets they depend on, transitively.
    fn filter_targets(&self, labels: &BTreeSet<Label>) -> BTreeSet<&Label> {
        let mut filtered = BTreeSet::new();
        let mut seen: BTreeSet<&Label> = BTreeSet::new();
        let mut stack: Vec<&Label> = labels.iter().collect();
        while let Some(label) = stack.pop() {
            let Some((key, item)) = self.labels_to_items.get_key_value(label) else {
                continue;
            };
            if !seen.insert(key) {
                continue;
            }
            let Some(target) = item.as_target() else {
                continue;
            };
            if target.output_type.is_group() {
                stack.extend(target.all_deps());
            } else {
                filtered.insert(key);
            }
        }
        filtered
    }

    fn render<'l>(&self, labels: impl Iterator<Item = &'l Label>) -> Vec<String> {
        labels
            .map(|label| label.user_visible_name(&self.default_toolchain))
            .sorted()
            .dedup()
            .collect()
    }
}

/// Whether `item` names `file` in any file-bearing attribute.
fn refers_to_file(item: &Item, file: &SourceFile) -> bool {
    if item.build_dependency_files().contains(file) {
        return true;
    }
    match item.kind() {
        ItemKind::Target(target) => {
            target
                .sources
                .iter()
                .chain(&target.public_headers)
                .chain(&target.inputs)
                .any(|candidate| candidate == file)
                || target.data.iter().any(|entry| data_matches(entry, file))
                || target.action.as_ref().is_some_and(|action| {
                    action.script == *file || action.outputs.contains(file)
                })
        }
        ItemKind::Config(config) => config.values.inputs.contains(file),
        ItemKind::Toolchain(_) | ItemKind::Pool(_) => false,
    }
}

fn data_matches(entry: &str, file: &SourceFile) -> bool {
    entry == file.as_str() || (entry.ends_with('/') && file.as_str().starts_with(entry))
}
