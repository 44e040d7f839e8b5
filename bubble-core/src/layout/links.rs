// Link dedup and rest-distance computation.
//
// The link force and the conflict analyzer both see links through `dedup_links`,
// so a store that momentarily holds two links for one pair still yields one force
// per pair, with `necessary` preferred.

use std::collections::HashMap;

use crate::graph::{GraphStore, Link, LinkId, LinkKind, NodeId};

/// A deduplicated link with its endpoints resolved to store indices.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ResolvedLink {
    pub id: LinkId,
    pub source: usize,
    pub target: usize,
    pub kind: LinkKind,
}

/// Collapse links by unordered pair, first occurrence kept, `necessary` preferred.
/// Self-links and links with unknown endpoints are dropped.
pub fn dedup_links(store: &GraphStore) -> Vec<ResolvedLink> {
    let index: HashMap<NodeId, usize> = store
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id, i))
        .collect();

    let mut by_pair: HashMap<(NodeId, NodeId), usize> = HashMap::new();
    let mut out: Vec<ResolvedLink> = Vec::new();

    for link in store.links() {
        let Some(resolved) = resolve(link, &index) else {
            continue;
        };
        match by_pair.get(&link.pair()) {
            Some(&i) => out[i].kind = out[i].kind.merge(link.kind),
            None => {
                by_pair.insert(link.pair(), out.len());
                out.push(resolved);
            }
        }
    }
    out
}

fn resolve(link: &Link, index: &HashMap<NodeId, usize>) -> Option<ResolvedLink> {
    if link.source == link.target {
        return None;
    }
    Some(ResolvedLink {
        id: link.id,
        source: *index.get(&link.source)?,
        target: *index.get(&link.target)?,
        kind: link.kind,
    })
}

/// Rest distance of a link: `(ra + rb) * 1.05 * kind_factor + 40 + buffer * 1.5`,
/// scaled by the active explode multiplier.
pub fn rest_distance(ra: f64, rb: f64, kind: LinkKind, buffer: f64, explode: f64) -> f64 {
    ((ra + rb) * 1.05 * kind.rest_factor() + 40.0 + buffer * 1.5) * explode
}

/// Number of deduped links touching each node, by store index.
pub fn degrees(node_count: usize, links: &[ResolvedLink]) -> Vec<usize> {
    let mut count = vec![0usize; node_count];
    for l in links {
        count[l.source] += 1;
        count[l.target] += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeSpec, Point};

    fn store_abc() -> GraphStore {
        let mut store = GraphStore::new();
        store.upsert_nodes(vec![
            NodeSpec::new("A", 10.0).at(Point::new(0.0, 0.0)),
            NodeSpec::new("B", 20.0).at(Point::new(100.0, 0.0)),
            NodeSpec::new("C", 30.0).at(Point::new(0.0, 100.0)),
        ]);
        store
    }

    #[test]
    fn test_dedup_prefers_necessary_even_with_raw_duplicates() {
        let mut store = store_abc();
        store.push_raw_link(Link { id: LinkId(0), source: NodeId(0), target: NodeId(1), kind: LinkKind::Ideal });
        store.push_raw_link(Link { id: LinkId(1), source: NodeId(1), target: NodeId(0), kind: LinkKind::Necessary });
        store.push_raw_link(Link { id: LinkId(2), source: NodeId(1), target: NodeId(2), kind: LinkKind::Ideal });
        store.push_raw_link(Link { id: LinkId(3), source: NodeId(2), target: NodeId(2), kind: LinkKind::Ideal });

        let links = dedup_links(&store);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].id, LinkId(0));
        assert_eq!(links[0].kind, LinkKind::Necessary);
        assert_eq!(links[1].kind, LinkKind::Ideal);
    }

    #[test]
    fn test_rest_distance_formula() {
        let d = rest_distance(20.0, 30.0, LinkKind::Necessary, 6.0, 1.0);
        assert!((d - (50.0 * 1.05 * 1.1 + 40.0 + 9.0)).abs() < 1e-9);
        let ideal = rest_distance(20.0, 30.0, LinkKind::Ideal, 6.0, 1.0);
        assert!(ideal < d);
        let exploded = rest_distance(20.0, 30.0, LinkKind::Ideal, 6.0, 2.0);
        assert!((exploded - 2.0 * ideal).abs() < 1e-9);
    }

    #[test]
    fn test_degrees() {
        let links = vec![
            ResolvedLink { id: LinkId(0), source: 0, target: 1, kind: LinkKind::Ideal },
            ResolvedLink { id: LinkId(1), source: 1, target: 2, kind: LinkKind::Ideal },
        ];
        assert_eq!(degrees(3, &links), vec![1, 2, 1]);
    }
}
