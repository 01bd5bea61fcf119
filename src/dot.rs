//! Graphviz DOT writer.
//!
//! Renders the resolved items marked for generation as a `digraph`. Nodes
//! and edges are sorted so the output is stable enough for snapshot tests:
//! solid edges are blocking deps, dashed edges are gen deps.

use std::fmt::{self, Display, Formatter};

use crate::graph::{Graph, Record};
use crate::item::{Item, ItemKind, ItemType};
use crate::label::Label;
use crate::loader::Loader;

/// Render `graph` as DOT text.
#[must_use]
pub fn generate<L: Loader>(graph: &Graph<L>) -> String {
    let default_toolchain = graph.default_toolchain();
    let records: Vec<&Record> = graph
        .records()
        .filter(|record| record.should_generate() && record.is_resolved())
        .collect();
    DisplayGraph {
        records: &records,
        default_toolchain: &default_toolchain,
    }
    .to_string()
}

/// Quote `value` as a DOT string.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

const fn shape(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Target => "box",
        ItemType::Config => "ellipse",
        ItemType::Toolchain => "hexagon",
        ItemType::Pool => "diamond",
    }
}

struct DisplayGraph<'a> {
    records: &'a [&'a Record],
    default_toolchain: &'a Label,
}

impl DisplayGraph<'_> {
    fn name(&self, label: &Label) -> String {
        quote(&label.user_visible_name(self.default_toolchain))
    }

    fn included(&self, label: &Label) -> bool {
        self.records.iter().any(|record| record.label() == label)
    }
}

impl Display for DisplayGraph<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph musubi {{")?;
        for record in self.records {
            let detail = match record.item().map(Item::kind) {
                Some(ItemKind::Target(target)) => target.output_type.as_str(),
                _ => record.item_type().as_str(),
            };
            writeln!(
                f,
                "  {} [shape={}, tooltip={}];",
                self.name(record.label()),
                shape(record.item_type()),
                quote(detail),
            )?;
        }
        for record in self.records {
            let from = self.name(record.label());
            for dep in record.blocking_deps() {
                if self.included(dep) {
                    writeln!(f, "  {from} -> {};", self.name(dep))?;
                }
            }
            for dep in record.gen_deps() {
                if self.included(dep) {
                    writeln!(f, "  {from} -> {} [style=dashed];", self.name(dep))?;
                }
            }
        }
        writeln!(f, "}}")
    }
}
