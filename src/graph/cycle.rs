//! Cycle reconstruction over records stuck waiting on each other.

use std::collections::{BTreeMap, HashMap, btree_set};

use super::record::Record;
use crate::label::Label;

/// Tracks the visitation state of a record during cycle detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

/// Depth-first search along unresolved deps, starting from each of `starts`
/// in turn. The first cycle found is returned in canonical form.
pub(crate) fn find_cycle<'a>(
    records: &'a BTreeMap<Label, Record>,
    starts: impl IntoIterator<Item = &'a Label>,
) -> Option<Vec<Label>> {
    let mut detector = CycleDetector::new(records);
    for node in starts {
        if detector.is_visited(node) {
            continue;
        }
        if let Some(found) = detector.visit(node) {
            return Some(found);
        }
    }
    None
}

/// A path entry: the record being explored and the deps not yet tried.
type Frame<'a> = (&'a Label, btree_set::Iter<'a, Label>);

struct CycleDetector<'a> {
    records: &'a BTreeMap<Label, Record>,
    path: Vec<Frame<'a>>,
    states: HashMap<&'a Label, VisitState>,
}

impl<'a> CycleDetector<'a> {
    fn new(records: &'a BTreeMap<Label, Record>) -> Self {
        Self {
            records,
            path: Vec::new(),
            states: HashMap::new(),
        }
    }

    fn is_visited(&self, node: &Label) -> bool {
        matches!(self.states.get(node), Some(VisitState::Visited))
    }

    fn enter(&mut self, node: &'a Label) {
        self.states.insert(node, VisitState::Visiting);
        let deps = self
            .records
            .get(node)
            .map(|record| record.unresolved_deps().iter())
            .unwrap_or_default();
        self.path.push((node, deps));
    }

    /// Walk from `start` with an explicit path stack.
    fn visit(&mut self, start: &'a Label) -> Option<Vec<Label>> {
        self.enter(start);
        loop {
            let next = match self.path.last_mut() {
                Some((_, deps)) => deps.next(),
                None => return None,
            };
            let Some(dep) = next else {
                if let Some((done, _)) = self.path.pop() {
                    self.states.insert(done, VisitState::Visited);
                }
                continue;
            };
            match self.states.get(dep) {
                Some(VisitState::Visited) => {}
                Some(VisitState::Visiting) => return Some(self.close_cycle(dep)),
                None => self.enter(dep),
            }
        }
    }

    /// The path from `node`'s frame to the top, closed with `node` again.
    fn close_cycle(&self, node: &Label) -> Vec<Label> {
        let idx = self
            .path
            .iter()
            .position(|(label, _)| *label == node)
            .unwrap_or_else(|| {
                debug_assert!(false, "visiting node must be on the path");
                0
            });
        let mut cycle: Vec<Label> = self
            .path
            .iter()
            .skip(idx)
            .map(|(label, _)| (*label).clone())
            .collect();
        cycle.push(node.clone());
        canonicalize_cycle(cycle)
    }
}

/// Rotate a closed cycle so it starts and ends at its smallest label.
fn canonicalize_cycle(mut cycle: Vec<Label>) -> Vec<Label> {
    if cycle.len() < 2 {
        return cycle;
    }
    let len = cycle.len() - 1;
    let start = cycle
        .iter()
        .take(len)
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(idx, _)| idx);
    let (prefix, suffix) = cycle.split_at_mut(len);
    prefix.rotate_left(start);
    if let (Some(first), Some(slot)) = (prefix.first().cloned(), suffix.first_mut()) {
        slot.clone_from(&first);
    }
    cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemType;
    use crate::location::Location;
    use crate::source::{SourceDir, SourceFile};

    fn label(name: &str) -> Label {
        Label::new(SourceDir::root(), name)
    }

    fn records(edges: &[(&str, &[&str])]) -> BTreeMap<Label, Record> {
        let origin = Location::new(SourceFile::new("//BUILD.gn").expect("file"), 1, 1);
        edges
            .iter()
            .map(|(name, deps)| {
                let mut record = Record::new(label(name), ItemType::Target, origin.clone());
                for dep in *deps {
                    record.add_blocking_dep(label(dep), false);
                }
                (label(name), record)
            })
            .collect()
    }

    #[test]
    fn self_edge_is_a_cycle() {
        let graph = records(&[("a", &["a"])]);
        let cycle = find_cycle(&graph, graph.keys());
        assert_eq!(cycle, Some(vec![label("a"), label("a")]));
    }

    #[test]
    fn cycle_is_rotated_to_smallest_label() {
        let graph = records(&[("c", &["a"]), ("a", &["b"]), ("b", &["c"])]);
        let start = label("b");
        let cycle = find_cycle(&graph, [graph.keys().find(|l| **l == start).expect("b")]);
        assert_eq!(
            cycle,
            Some(vec![label("a"), label("b"), label("c"), label("a")])
        );
    }

    #[test]
    fn acyclic_chain_has_no_cycle() {
        let graph = records(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        assert_eq!(find_cycle(&graph, graph.keys()), None);
    }

    #[test]
    fn dependency_without_record_is_skipped() {
        let graph = records(&[("a", &["ghost"])]);
        assert_eq!(find_cycle(&graph, graph.keys()), None);
    }

    #[test]
    fn long_rings_do_not_exhaust_the_stack() {
        const LEN: usize = 100_000;
        let origin = Location::new(SourceFile::new("//BUILD.gn").expect("file"), 1, 1);
        let name = |idx: usize| label(&format!("t{idx:06}"));
        let graph: BTreeMap<Label, Record> = (0..LEN)
            .map(|idx| {
                let mut record = Record::new(name(idx), ItemType::Target, origin.clone());
                record.add_blocking_dep(name((idx + 1) % LEN), false);
                (name(idx), record)
            })
            .collect();
        let cycle = find_cycle(&graph, graph.keys()).expect("ring");
        assert_eq!(cycle.len(), LEN + 1);
        assert_eq!(cycle.first(), Some(&name(0)));
        assert_eq!(cycle.last(), Some(&name(0)));
    }

    #[test]
    fn canonicalize_handles_trivial_input() {
        assert_eq!(canonicalize_cycle(Vec::new()), Vec::<Label>::new());
        assert_eq!(canonicalize_cycle(vec![label("x")]), vec![label("x")]);
    }
}
