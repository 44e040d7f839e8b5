// Authoritative node/link collections.
//
// Invariants kept here:
// - at most one link per unordered node pair; `necessary` wins over `ideal`
// - no self-links, no links to unknown nodes
// - the radius scale always reflects the current node set
//
// Every mutation is total: unknown ids and invalid input are logged no-ops.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use super::{GOLDEN_ANGLE, Link, LinkChoice, LinkId, LinkKind, Node, NodeId, Point, RadiusScale, pair_key};

/// Spacing of the seeding spiral (px per sqrt(index)).
const SEED_SPACING: f64 = 60.0;

/// Input for `upsert_nodes`: update when `id` names an existing node, insert otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub id: Option<NodeId>,
    pub name: String,
    pub area: f64,
    pub pos: Option<Point>,
    pub locked: Option<bool>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>, area: f64) -> Self {
        Self { id: None, name: name.into(), area, pos: None, locked: None }
    }

    pub fn at(mut self, pos: Point) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    links: Vec<Link>,
    scale: RadiusScale,
    next_node: u32,
    next_link: u32,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    pub fn link_between(&self, a: NodeId, b: NodeId) -> Option<&Link> {
        let key = pair_key(a, b);
        self.links.iter().find(|l| l.pair() == key)
    }

    pub fn scale(&self) -> RadiusScale {
        self.scale
    }

    /// Radius of a node under the current scale. Unknown ids get the minimum radius.
    pub fn radius(&self, id: NodeId) -> f64 {
        match self.node(id) {
            Some(n) => self.scale.radius(n.area),
            None => self.scale.radius(0.0),
        }
    }

    pub fn radius_of(&self, node: &Node) -> f64 {
        self.scale.radius(node.area)
    }

    /// Radii for every node, in store order.
    pub fn radii(&self) -> Vec<f64> {
        self.nodes.iter().map(|n| self.scale.radius(n.area)).collect()
    }

    fn refresh_scale(&mut self) {
        self.scale = RadiusScale::from_nodes(&self.nodes);
    }

    fn seed_position(index: usize) -> Point {
        let r = SEED_SPACING * (index as f64 + 1.0).sqrt();
        let theta = index as f64 * GOLDEN_ANGLE;
        Point::new(r * theta.cos(), r * theta.sin())
    }

    /// Insert or update nodes. Returns the id of each spec, in order.
    pub fn upsert_nodes(&mut self, specs: Vec<NodeSpec>) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(specs.len());
        for spec in specs {
            let area_ok = spec.area.is_finite() && spec.area > 0.0;
            if !area_ok {
                warn!("ignoring non-positive area {} for '{}'", spec.area, spec.name);
            }

            if let Some(node) = spec.id.and_then(|id| self.node_mut(id)) {
                node.name = spec.name;
                if area_ok {
                    node.area = spec.area;
                }
                if let Some(p) = spec.pos {
                    node.place(p);
                }
                if let Some(locked) = spec.locked {
                    node.locked = locked;
                    node.fixed = if locked { Some(node.pos) } else { None };
                }
                ids.push(node.id);
                continue;
            }

            let id = match spec.id {
                Some(id) => {
                    self.next_node = self.next_node.max(id.0.saturating_add(1));
                    id
                }
                None => self.fresh_node_id(),
            };

            let pos = spec.pos.unwrap_or_else(|| Self::seed_position(self.nodes.len()));
            let locked = spec.locked.unwrap_or(false);
            self.nodes.push(Node {
                id,
                name: spec.name,
                area: if area_ok { spec.area } else { 1.0 },
                pos,
                vel: Point::ZERO,
                fixed: if locked { Some(pos) } else { None },
                locked,
            });
            ids.push(id);
        }
        self.refresh_scale();
        ids
    }

    /// Remove nodes and every link touching them. Returns the ids actually removed.
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        let doomed: HashSet<NodeId> = ids.iter().copied().collect();
        let removed: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| doomed.contains(&n.id))
            .map(|n| n.id)
            .collect();
        if removed.is_empty() {
            debug!("remove_nodes: no known ids in {:?}", ids);
            return removed;
        }
        self.nodes.retain(|n| !doomed.contains(&n.id));
        self.links
            .retain(|l| !doomed.contains(&l.source) && !doomed.contains(&l.target));
        self.refresh_scale();
        removed
    }

    pub fn rename_node(&mut self, id: NodeId, name: &str) -> bool {
        match self.node_mut(id) {
            Some(n) => {
                n.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_area(&mut self, id: NodeId, area: f64) -> bool {
        if !(area.is_finite() && area > 0.0) {
            warn!("set_area: rejecting area {} for {:?}", area, id);
            return false;
        }
        let Some(n) = self.node_mut(id) else {
            return false;
        };
        n.area = area;
        self.refresh_scale();
        true
    }

    /// Lock pins a node at its current position; unlock releases the pin.
    pub fn set_locked(&mut self, id: NodeId, locked: bool) -> bool {
        let Some(n) = self.node_mut(id) else {
            return false;
        };
        n.locked = locked;
        n.fixed = if locked { Some(n.pos) } else { None };
        n.vel = Point::ZERO;
        true
    }

    /// Externally set a position. A locked node's pin follows.
    pub fn set_position(&mut self, id: NodeId, p: Point) -> bool {
        let Some(n) = self.node_mut(id) else {
            return false;
        };
        n.place(p);
        n.vel = Point::ZERO;
        true
    }

    /// Create, upgrade or drop the link between `a` and `b`.
    ///
    /// An existing `necessary` link is never downgraded by an `ideal` request.
    /// Returns the id of the link now covering the pair, if any.
    pub fn upsert_link(&mut self, a: NodeId, b: NodeId, choice: LinkChoice) -> Option<LinkId> {
        if a == b {
            debug!("upsert_link: ignoring self-link on {:?}", a);
            return None;
        }
        if self.node(a).is_none() || self.node(b).is_none() {
            debug!("upsert_link: unknown endpoint in ({:?}, {:?})", a, b);
            return None;
        }

        let key = pair_key(a, b);
        let existing = self.links.iter().position(|l| l.pair() == key);

        match (choice, existing) {
            (LinkChoice::None, Some(i)) => {
                self.links.remove(i);
                None
            }
            (LinkChoice::None, None) => None,
            (LinkChoice::Kind(kind), Some(i)) => {
                let link = &mut self.links[i];
                link.kind = link.kind.merge(kind);
                Some(link.id)
            }
            (LinkChoice::Kind(kind), None) => {
                let id = self.fresh_link_id();
                self.links.push(Link { id, source: a, target: b, kind });
                Some(id)
            }
        }
    }

    /// Insert a link record verbatim (used on import). Pair dedup still applies.
    pub(crate) fn insert_link_record(&mut self, link: Link) -> Option<LinkId> {
        if link.source == link.target
            || self.node(link.source).is_none()
            || self.node(link.target).is_none()
        {
            return None;
        }
        if let Some(existing) = self.links.iter_mut().find(|l| l.pair() == link.pair()) {
            existing.kind = existing.kind.merge(link.kind);
            return Some(existing.id);
        }
        let id = if self.link(link.id).is_some() {
            self.fresh_link_id()
        } else {
            self.next_link = self.next_link.max(link.id.0.saturating_add(1));
            link.id
        };
        self.links.push(Link { id, ..link });
        Some(id)
    }

    /// Next unused node id. Wraps past `u32::MAX` and skips ids still in use.
    fn fresh_node_id(&mut self) -> NodeId {
        let mut candidate = self.next_node;
        while self.node(NodeId(candidate)).is_some() {
            candidate = candidate.wrapping_add(1);
        }
        self.next_node = candidate.wrapping_add(1);
        NodeId(candidate)
    }

    fn fresh_link_id(&mut self) -> LinkId {
        let mut candidate = self.next_link;
        while self.link(LinkId(candidate)).is_some() {
            candidate = candidate.wrapping_add(1);
        }
        self.next_link = candidate.wrapping_add(1);
        LinkId(candidate)
    }

    pub fn remove_link(&mut self, id: LinkId) -> bool {
        let before = self.links.len();
        self.links.retain(|l| l.id != id);
        before != self.links.len()
    }

    /// Collapse duplicate pair links, keeping the first record and the strongest kind.
    pub fn normalize_links(&mut self) {
        let mut seen: HashMap<(NodeId, NodeId), usize> = HashMap::new();
        let mut kept: Vec<Link> = Vec::with_capacity(self.links.len());
        for link in self.links.drain(..) {
            if link.source == link.target {
                continue;
            }
            match seen.get(&link.pair()) {
                Some(&i) => kept[i].kind = kept[i].kind.merge(link.kind),
                None => {
                    seen.insert(link.pair(), kept.len());
                    kept.push(link);
                }
            }
        }
        self.links = kept;
    }

    pub fn has_necessary_link(&self, a: NodeId, b: NodeId) -> bool {
        self.link_between(a, b)
            .is_some_and(|l| l.kind == LinkKind::Necessary)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.refresh_scale();
    }

    /// Topmost node (last in store order) whose circle contains `p`.
    pub fn node_at(&self, p: Point) -> Option<NodeId> {
        self.nodes
            .iter()
            .rev()
            .find(|n| n.pos.distance(p) <= self.radius_of(n))
            .map(|n| n.id)
    }

    #[cfg(test)]
    pub(crate) fn push_raw_link(&mut self, link: Link) {
        self.next_link = self.next_link.max(link.id.0.saturating_add(1));
        self.links.push(link);
    }
}
