//! Persisted diagram shape.
//!
//! Node and link records are the only persisted state. Positions and lock flags
//! round-trip; radii do not (they are derived from the area set on load).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::conflicts::DEFAULT_TOLERANCE;
use crate::graph::{GraphStore, Link, LinkId, LinkKind, NodeId, NodeSpec, Point};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate node id {0}")]
    DuplicateNode(u32),
    #[error("node {id} has invalid area {area}")]
    InvalidArea { id: u32, area: f64 },
    #[error("link {link} references unknown node {node}")]
    UnknownEndpoint { link: u32, node: u32 },
    #[error("link {0} connects a node to itself")]
    SelfLink(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub name: String,
    pub area: f64,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

/// Editor settings stored alongside the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub buffer: f64,
    pub rotation_sensitivity: f64,
    pub physics_enabled: bool,
    pub link_kind: LinkKind,
    pub tolerance: f64,
    pub expected_pairs: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            buffer: 6.0,
            rotation_sensitivity: 0.0,
            physics_enabled: true,
            link_kind: LinkKind::Necessary,
            tolerance: DEFAULT_TOLERANCE,
            expected_pairs: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramDocument {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
    #[serde(default)]
    pub settings: Settings,
}

impl DiagramDocument {
    pub fn from_store(store: &GraphStore, settings: Settings) -> Self {
        let nodes = store
            .nodes()
            .iter()
            .map(|n| NodeRecord {
                id: n.id,
                name: n.name.clone(),
                area: n.area,
                x: n.pos.x,
                y: n.pos.y,
                locked: n.locked,
            })
            .collect();
        let links = store
            .links()
            .iter()
            .map(|l| LinkRecord { id: l.id, source: l.source, target: l.target, kind: l.kind })
            .collect();
        Self { nodes, links, settings }
    }

    pub fn validate(&self) -> Result<(), DocumentError> {
        let mut ids = HashSet::new();
        for n in &self.nodes {
            if !ids.insert(n.id) {
                return Err(DocumentError::DuplicateNode(n.id.0));
            }
            if !(n.area.is_finite() && n.area > 0.0) {
                return Err(DocumentError::InvalidArea { id: n.id.0, area: n.area });
            }
        }
        for l in &self.links {
            if l.source == l.target {
                return Err(DocumentError::SelfLink(l.id.0));
            }
            for end in [l.source, l.target] {
                if !ids.contains(&end) {
                    return Err(DocumentError::UnknownEndpoint { link: l.id.0, node: end.0 });
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let doc: DiagramDocument = serde_json::from_str(json)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Build a store from the records. Duplicate pair links collapse, `necessary` first.
    pub fn to_store(&self) -> GraphStore {
        let mut store = GraphStore::new();
        store.upsert_nodes(
            self.nodes
                .iter()
                .map(|n| {
                    NodeSpec::new(n.name.clone(), n.area)
                        .with_id(n.id)
                        .at(Point::new(n.x, n.y))
                        .locked(n.locked)
                })
                .collect(),
        );
        for l in &self.links {
            store.insert_link_record(Link { id: l.id, source: l.source, target: l.target, kind: l.kind });
        }
        store
    }
}
