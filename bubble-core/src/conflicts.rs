//! Adjacency conflict analysis.
//!
//! Two read-only checks over the graph store:
//! - expected pairs (from user text) that have no `necessary` link
//! - `necessary` links stretched well past their rest distance
//!
//! [`auto_connect`] is the only mutation: it turns reported missing pairs into links.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::Serialize;

use crate::graph::{GraphStore, LinkChoice, LinkId, LinkKind, NodeId, pair_key};
use crate::layout::{dedup_links, rest_distance};
use crate::parser::{normalize_name, parse_expected_pairs};

/// Default long-link tolerance: flag at 1.8x the rest distance.
pub const DEFAULT_TOLERANCE: f64 = 1.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingPair {
    pub a: NodeId,
    pub b: NodeId,
    pub a_name: String,
    pub b_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Conflicts {
    pub missing_pairs: Vec<MissingPair>,
    pub overlong_link_ids: Vec<LinkId>,
}

impl Conflicts {
    pub fn is_empty(&self) -> bool {
        self.missing_pairs.is_empty() && self.overlong_link_ids.is_empty()
    }
}

pub fn compute_conflicts(store: &GraphStore, buffer: f64, expected: &str, tolerance: f64) -> Conflicts {
    Conflicts {
        missing_pairs: missing_pairs(store, expected),
        overlong_link_ids: overlong_links(store, buffer, tolerance),
    }
}

/// Normalized name -> first node carrying it, in store order.
fn name_index(store: &GraphStore) -> HashMap<String, NodeId> {
    let mut index = HashMap::new();
    for node in store.nodes() {
        index.entry(normalize_name(&node.name)).or_insert(node.id);
    }
    index
}

/// Expected pairs without a `necessary` link, in text order, each pair reported once.
/// Unknown names and same-node pairs are skipped.
pub fn missing_pairs(store: &GraphStore, expected: &str) -> Vec<MissingPair> {
    let index = name_index(store);
    let mut seen: HashSet<(NodeId, NodeId)> = HashSet::new();
    let mut out = Vec::new();

    for (left, right) in parse_expected_pairs(expected) {
        let (Some(&a), Some(&b)) = (index.get(&normalize_name(&left)), index.get(&normalize_name(&right))) else {
            debug!("skipping unresolved pair '{}' / '{}'", left, right);
            continue;
        };
        if a == b || store.has_necessary_link(a, b) || !seen.insert(pair_key(a, b)) {
            continue;
        }
        let name = |id: NodeId| store.node(id).map(|n| n.name.clone()).unwrap_or_default();
        out.push(MissingPair { a, b, a_name: name(a), b_name: name(b) });
    }
    out
}

/// `necessary` links whose length exceeds `tolerance` times their unexploded rest distance.
pub fn overlong_links(store: &GraphStore, buffer: f64, tolerance: f64) -> Vec<LinkId> {
    let tolerance = if tolerance.is_finite() && tolerance > 0.0 { tolerance } else { DEFAULT_TOLERANCE };
    let nodes = store.nodes();
    let radii = store.radii();

    dedup_links(store)
        .into_iter()
        .filter(|l| l.kind == LinkKind::Necessary)
        .filter(|l| {
            let baseline = rest_distance(radii[l.source], radii[l.target], LinkKind::Necessary, buffer, 1.0);
            nodes[l.source].pos.distance(nodes[l.target].pos) > baseline * tolerance
        })
        .map(|l| l.id)
        .collect()
}

/// Create a `necessary` link for each missing pair. Pairs repeated in the input, or
/// already covered earlier in the same batch, are skipped.
pub fn auto_connect(store: &mut GraphStore, missing: &[MissingPair]) -> Vec<LinkId> {
    let mut done: HashSet<(NodeId, NodeId)> = HashSet::new();
    let mut created = Vec::new();
    for pair in missing {
        let key = pair_key(pair.a, pair.b);
        if done.contains(&key) || store.has_necessary_link(pair.a, pair.b) {
            continue;
        }
        if let Some(id) = store.upsert_link(pair.a, pair.b, LinkChoice::Kind(LinkKind::Necessary)) {
            done.insert(key);
            created.push(id);
        }
    }
    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeSpec, Point};

    fn store_with(names: &[&str]) -> GraphStore {
        let mut store = GraphStore::new();
        store.upsert_nodes(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| NodeSpec::new(*n, 10.0).at(Point::new(i as f64 * 60.0, 0.0)))
                .collect(),
        );
        store
    }

    #[test]
    fn test_missing_pair_then_auto_connect() {
        let mut store = store_with(&["A", "B"]);
        let conflicts = compute_conflicts(&store, 6.0, "A - B", DEFAULT_TOLERANCE);
        assert_eq!(conflicts.missing_pairs.len(), 1);
        assert_eq!(conflicts.missing_pairs[0].a, NodeId(0));
        assert_eq!(conflicts.missing_pairs[0].b, NodeId(1));

        let created = auto_connect(&mut store, &conflicts.missing_pairs);
        assert_eq!(created.len(), 1);
        let again = compute_conflicts(&store, 6.0, "A - B", DEFAULT_TOLERANCE);
        assert!(again.missing_pairs.is_empty());
    }

    #[test]
    fn test_pair_order_does_not_matter() {
        let mut store = store_with(&["A", "B", "C"]);
        store.upsert_link(NodeId(1), NodeId(2), LinkChoice::Kind(LinkKind::Necessary));
        let keys = |text: &str| -> HashSet<(NodeId, NodeId)> {
            missing_pairs(&store, text).iter().map(|p| pair_key(p.a, p.b)).collect()
        };
        assert_eq!(keys("A - B"), keys("B - A"));
        assert_eq!(keys("A - B"), [(NodeId(0), NodeId(1))].into_iter().collect());
        assert!(keys("B, C").is_empty());
        assert!(keys("C, B").is_empty());
    }

    #[test]
    fn test_ideal_link_still_counts_as_missing() {
        let mut store = store_with(&["A", "B"]);
        store.upsert_link(NodeId(0), NodeId(1), LinkChoice::Kind(LinkKind::Ideal));
        assert_eq!(missing_pairs(&store, "a, b").len(), 1);
        let missing = missing_pairs(&store, "a, b");
        auto_connect(&mut store, &missing);
        assert_eq!(store.links().len(), 1);
        assert_eq!(store.links()[0].kind, LinkKind::Necessary);
    }

    #[test]
    fn test_names_normalized_and_unknown_skipped() {
        let store = store_with(&["Living Room", "Kitchen"]);
        let missing = missing_pairs(&store, "  living   ROOM - kitchen\nGarage - Kitchen\nKitchen - kitchen");
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].a_name, "Living Room");
    }

    #[test]
    fn test_duplicate_names_resolve_to_first_node() {
        let store = store_with(&["Bed", "Bed", "Bath"]);
        let missing = missing_pairs(&store, "Bed - Bath");
        assert_eq!(missing[0].a, NodeId(0));
    }

    #[test]
    fn test_repeated_pairs_reported_once_and_connected_once() {
        let mut store = store_with(&["A", "B"]);
        let missing = missing_pairs(&store, "A - B\nB, A\nA-B");
        assert_eq!(missing.len(), 1);
        let doubled = vec![missing[0].clone(), missing[0].clone()];
        assert_eq!(auto_connect(&mut store, &doubled).len(), 1);
        assert_eq!(store.links().len(), 1);
    }

    #[test]
    fn test_overlong_necessary_link_flagged_until_pulled_in() {
        let mut store = store_with(&["A", "B"]);
        let summed = store.radius(NodeId(0)) + store.radius(NodeId(1));
        store.set_position(NodeId(1), Point::new(summed * 10.0, 0.0));
        let link = store.upsert_link(NodeId(0), NodeId(1), LinkChoice::Kind(LinkKind::Necessary)).unwrap();
        assert_eq!(overlong_links(&store, 6.0, 1.8), vec![link]);

        let baseline = rest_distance(store.radius(NodeId(0)), store.radius(NodeId(1)), LinkKind::Necessary, 6.0, 1.0);
        store.set_position(NodeId(1), Point::new(baseline * 1.8 - 1.0, 0.0));
        assert!(overlong_links(&store, 6.0, 1.8).is_empty());
    }

    #[test]
    fn test_overlong_ignores_ideal_links() {
        let mut store = store_with(&["A", "B"]);
        store.set_position(NodeId(1), Point::new(5000.0, 0.0));
        store.upsert_link(NodeId(0), NodeId(1), LinkChoice::Kind(LinkKind::Ideal));
        assert!(overlong_links(&store, 6.0, 1.8).is_empty());
    }
}
