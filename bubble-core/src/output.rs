//! Output types for frontend consumption.
//!
//! These structs are serialized to JSON and handed to the renderer each frame.

use serde::Serialize;

use crate::conflicts::MissingPair;
use crate::graph::{LinkId, LinkKind, NodeId, Point};
use crate::interaction::Mode;

/// A space ready to draw
#[derive(Debug, Clone, Serialize)]
pub struct NodeOutput {
    pub id: NodeId,
    pub name: String,
    pub area: f64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub locked: bool,
    pub selected: bool,
}

/// A link between two spaces
#[derive(Debug, Clone, Serialize)]
pub struct LinkOutput {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: LinkKind,
    /// Necessary link stretched past the tolerance
    pub overlong: bool,
}

/// Error information for the host UI
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub message: String,
}

/// The combined scene sent to the frontend
#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneOutput {
    pub nodes: Vec<NodeOutput>,
    pub links: Vec<LinkOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_pairs: Vec<MissingPair>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lasso: Vec<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_source: Option<NodeId>,
    pub mode: Mode,
    pub physics_enabled: bool,
    pub pan_zoom_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl SceneOutput {
    pub fn error(message: impl Into<String>) -> Self {
        Self { error: Some(ErrorInfo { message: message.into() }), ..Self::default() }
    }
}
