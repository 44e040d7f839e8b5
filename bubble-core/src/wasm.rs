//! WASM bindings for the bubble-core library.
//!
//! One `DiagramHandle` per open diagram. Structured arguments and results cross the
//! boundary as JSON strings; failures come back as `{"error": {"message": ...}}` and
//! are also written to the browser console.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::diagram::Diagram;
use crate::document::DiagramDocument;
use crate::graph::{LinkChoice, LinkId, LinkKind, NodeId, NodeSpec, Point};
use crate::interaction::{Mode, Modifiers};
use crate::output::SceneOutput;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn console_error(s: &str);
}

/// Route `log` output to the console and panics to `console.error`.
#[wasm_bindgen]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    // a second call finds the logger already set
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// Node payload accepted by `upsert_nodes`.
#[derive(Debug, Deserialize)]
struct NodeInput {
    #[serde(default)]
    id: Option<NodeId>,
    name: String,
    area: f64,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    /// Absent leaves an existing node's lock untouched.
    #[serde(default)]
    locked: Option<bool>,
}

impl NodeInput {
    fn into_spec(self) -> NodeSpec {
        let mut spec = NodeSpec::new(self.name, self.area);
        if let Some(locked) = self.locked {
            spec = spec.locked(locked);
        }
        if let Some(id) = self.id {
            spec = spec.with_id(id);
        }
        if let (Some(x), Some(y)) = (self.x, self.y) {
            spec = spec.at(Point::new(x, y));
        }
        spec
    }
}

fn error_json(message: &str) -> String {
    console_error(message);
    serde_json::json!({ "error": { "message": message } }).to_string()
}

fn to_json<T: Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => error_json(&format!("Error serializing output: {}", e)),
    }
}

#[wasm_bindgen]
pub struct DiagramHandle {
    inner: Diagram,
}

impl Default for DiagramHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl DiagramHandle {
    #[wasm_bindgen(constructor)]
    pub fn new() -> DiagramHandle {
        DiagramHandle { inner: Diagram::new() }
    }

    /// Replace the diagram with a persisted document. Returns the scene, or an error.
    pub fn load(&mut self, json: &str) -> String {
        match DiagramDocument::from_json(json) {
            Ok(doc) => {
                self.inner.load_document(&doc);
                self.scene()
            }
            Err(e) => to_json(&SceneOutput::error(format!("Error loading diagram: {}", e))),
        }
    }

    pub fn export(&self) -> String {
        match self.inner.to_document().to_json() {
            Ok(json) => json,
            Err(e) => error_json(&format!("Error exporting diagram: {}", e)),
        }
    }

    pub fn scene(&self) -> String {
        to_json(&self.inner.scene())
    }

    /// Advance physics one frame. Returns whether positions changed.
    pub fn tick(&mut self) -> bool {
        self.inner.tick()
    }

    pub fn set_buffer(&mut self, px: f64) {
        self.inner.set_buffer(px);
    }

    pub fn set_rotation_sensitivity(&mut self, s: f64) {
        self.inner.set_rotation_sensitivity(s);
    }

    pub fn set_physics_enabled(&mut self, enabled: bool) {
        self.inner.set_physics_enabled(enabled);
    }

    pub fn trigger_detangle(&mut self) {
        self.inner.trigger_detangle();
    }

    pub fn resolve_once(&mut self) -> usize {
        self.inner.resolve_once()
    }

    /// `json` is an array of `{id?, name, area, x?, y?, locked?}`. Returns the ids.
    pub fn upsert_nodes(&mut self, json: &str) -> String {
        match serde_json::from_str::<Vec<NodeInput>>(json) {
            Ok(inputs) => {
                let ids = self.inner.upsert_nodes(inputs.into_iter().map(NodeInput::into_spec).collect());
                to_json(&ids)
            }
            Err(e) => error_json(&format!("Error reading nodes: {}", e)),
        }
    }

    /// `json` is an array of node ids. Returns the ids actually removed.
    pub fn remove_nodes(&mut self, json: &str) -> String {
        match serde_json::from_str::<Vec<NodeId>>(json) {
            Ok(ids) => to_json(&self.inner.remove_nodes(&ids)),
            Err(e) => error_json(&format!("Error reading node ids: {}", e)),
        }
    }

    /// `kind` is `necessary`, `ideal` or `none`. Returns the link id, or -1.
    pub fn upsert_link(&mut self, a: u32, b: u32, kind: &str) -> i64 {
        let Some(choice) = LinkChoice::parse(kind) else {
            console_error(&format!("Unknown link type '{}'", kind));
            return -1;
        };
        match self.inner.upsert_link(NodeId(a), NodeId(b), choice) {
            Some(id) => i64::from(id.0),
            None => -1,
        }
    }

    pub fn remove_link(&mut self, id: u32) -> bool {
        self.inner.remove_link(LinkId(id))
    }

    pub fn rename_node(&mut self, id: u32, name: &str) -> bool {
        self.inner.rename_node(NodeId(id), name)
    }

    pub fn set_area(&mut self, id: u32, area: f64) -> bool {
        self.inner.set_area(NodeId(id), area)
    }

    pub fn set_locked(&mut self, id: u32, locked: bool) -> bool {
        self.inner.set_locked(NodeId(id), locked)
    }

    pub fn lock_all(&mut self) {
        self.inner.lock_all();
    }

    pub fn unlock_all(&mut self) {
        self.inner.unlock_all();
    }

    /// Bulk-create spaces from a pasted list. Returns the new ids.
    pub fn generate(&mut self, text: &str, replace: bool) -> String {
        to_json(&self.inner.generate_from_list(text, replace))
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn select_all(&mut self) {
        self.inner.select_all();
    }

    pub fn delete_selection(&mut self) -> String {
        to_json(&self.inner.delete_selection())
    }

    pub fn set_expected_pairs(&mut self, text: &str) {
        self.inner.set_expected_pairs(text);
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.inner.set_tolerance(tolerance);
    }

    pub fn compute_conflicts(&self, expected: &str, tolerance: f64) -> String {
        to_json(&self.inner.compute_conflicts(expected, tolerance))
    }

    pub fn auto_connect(&mut self, expected: &str) -> String {
        to_json(&self.inner.auto_connect(expected))
    }

    pub fn set_mode(&mut self, mode: &str) {
        match mode {
            "select" => self.inner.set_mode(Mode::Select),
            "connect" => self.inner.set_mode(Mode::Connect),
            other => console_error(&format!("Unknown mode '{}'", other)),
        }
    }

    pub fn set_link_kind(&mut self, kind: &str) {
        match LinkKind::parse(kind) {
            Some(k) => self.inner.set_link_kind(k),
            None => console_error(&format!("Unknown link type '{}'", kind)),
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, multi: bool, lasso: bool) -> String {
        to_json(&self.inner.pointer_down(Point::new(x, y), Modifiers { multi, lasso }))
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> String {
        to_json(&self.inner.pointer_move(Point::new(x, y)))
    }

    pub fn pointer_up(&mut self, x: f64, y: f64) -> String {
        to_json(&self.inner.pointer_up(Point::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_input_without_lock_leaves_it_unset() {
        let inputs: Vec<NodeInput> =
            serde_json::from_str(r#"[{"id": 0, "name": "Kitchen", "area": 10}]"#).unwrap();
        let spec = inputs.into_iter().next().unwrap().into_spec();
        assert_eq!(spec.locked, None);
        assert_eq!(spec.id, Some(NodeId(0)));
        assert_eq!(spec.pos, None);
    }

    #[test]
    fn test_node_input_needs_both_coordinates() {
        let inputs: Vec<NodeInput> =
            serde_json::from_str(r#"[{"name": "Hall", "area": 6, "x": 4}, {"name": "Bath", "area": 5, "x": 4, "y": -2, "locked": true}]"#)
                .unwrap();
        let specs: Vec<NodeSpec> = inputs.into_iter().map(NodeInput::into_spec).collect();
        assert_eq!(specs[0].pos, None);
        assert_eq!(specs[1].pos, Some(Point::new(4.0, -2.0)));
        assert_eq!(specs[1].locked, Some(true));
    }

    #[test]
    fn test_upsert_without_lock_keeps_node_locked() {
        let mut handle = DiagramHandle::new();
        handle.set_physics_enabled(false);
        let ids = handle.upsert_nodes(r#"[{"name": "Kitchen", "area": 10, "x": 0, "y": 0, "locked": true}]"#);
        assert_eq!(ids, "[0]");
        handle.upsert_nodes(r#"[{"id": 0, "name": "Kitchen", "area": 12}]"#);

        let doc = DiagramDocument::from_json(&handle.export()).unwrap();
        assert!(doc.nodes[0].locked);
        assert_eq!(doc.nodes[0].area, 12.0);
    }

    #[test]
    fn test_handle_link_and_round_trip() {
        let mut handle = DiagramHandle::new();
        handle.upsert_nodes(r#"[{"name": "A", "area": 10, "x": 0, "y": 0}, {"name": "B", "area": 20, "x": 200, "y": 0}]"#);
        assert_eq!(handle.upsert_link(0, 1, "ideal"), 0);
        assert_eq!(handle.upsert_link(1, 0, "necessary"), 0);
        assert_eq!(handle.upsert_link(0, 0, "ideal"), -1);
        let exported = handle.export();
        assert!(exported.contains("\"type\":\"necessary\""));

        let mut other = DiagramHandle::new();
        let scene: serde_json::Value = serde_json::from_str(&other.load(&exported)).unwrap();
        assert_eq!(scene["nodes"].as_array().map(Vec::len), Some(2));
        assert!(scene.get("error").is_none());
        assert_eq!(other.export(), exported);
    }
}
