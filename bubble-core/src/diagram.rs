//! Per-diagram facade.
//!
//! A `Diagram` owns the graph store, its simulation and the interaction controller.
//! It is built per open diagram and dropped with it. Every public mutation here is
//! one discrete, undoable unit; a history collaborator wraps calls in snapshot
//! boundaries.
//!
//! Position authority: with physics enabled, `tick` commits simulation frames
//! (skipping nodes held by a drag). With physics paused, nothing ticks and every
//! change that could introduce overlap runs the static resolver.

use std::collections::HashSet;

use log::info;

use crate::conflicts::{self, Conflicts};
use crate::document::{DiagramDocument, Settings};
use crate::graph::{GraphStore, LinkChoice, LinkId, LinkKind, NodeId, NodeSpec, Point};
use crate::interaction::{Interaction, InteractionController, Mode, Modifiers};
use crate::layout::{Disturbance, Simulation, SimulationConfig, resolve_batch};
use crate::output::{LinkOutput, NodeOutput, SceneOutput};
use crate::parser::parse_space_list;

#[derive(Debug, Clone)]
pub struct Diagram {
    store: GraphStore,
    sim: Simulation,
    controller: InteractionController,
    expected_pairs: String,
    tolerance: f64,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::with_config(SimulationConfig::default())
    }
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            store: GraphStore::new(),
            sim: Simulation::new(config),
            controller: InteractionController::new(),
            expected_pairs: String::new(),
            tolerance: conflicts::DEFAULT_TOLERANCE,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn physics_enabled(&self) -> bool {
        self.sim.is_running()
    }

    fn settle_if_paused(&mut self) {
        if !self.sim.is_running() {
            self.resolve_once();
        }
    }

    // ---- simulation controls ----

    pub fn set_buffer(&mut self, px: f64) {
        self.sim.set_buffer(px);
        self.settle_if_paused();
    }

    pub fn set_rotation_sensitivity(&mut self, s: f64) {
        self.sim.set_rotation_sensitivity(s);
    }

    /// Pausing hands position authority to the static resolver, which runs once
    /// right away.
    pub fn set_physics_enabled(&mut self, enabled: bool) {
        self.sim.set_running(enabled);
        self.settle_if_paused();
    }

    pub fn trigger_detangle(&mut self) {
        self.sim.trigger_detangle();
    }

    /// Batch collision pass. Only acts while physics is paused.
    pub fn resolve_once(&mut self) -> usize {
        if self.sim.is_running() {
            return 0;
        }
        let cfg = self.sim.config();
        resolve_batch(&mut self.store, cfg.buffer, cfg.resolve_passes)
    }

    /// Advance the simulation one tick and publish the result.
    /// Returns false when nothing was committed (paused, settled, or stale).
    pub fn tick(&mut self) -> bool {
        let Some(frame) = self.sim.step(&self.store) else {
            return false;
        };
        let held = self.controller.held();
        self.sim.commit(&frame, &mut self.store, &held)
    }

    // ---- structure ----

    pub fn upsert_nodes(&mut self, specs: Vec<NodeSpec>) -> Vec<NodeId> {
        if specs.is_empty() {
            return Vec::new();
        }
        let ids = self.store.upsert_nodes(specs);
        self.sim.disturb(Disturbance::Structure);
        self.settle_if_paused();
        ids
    }

    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        let removed = self.store.remove_nodes(ids);
        if !removed.is_empty() {
            self.controller.prune(&self.store);
            self.sim.disturb(Disturbance::Structure);
            self.settle_if_paused();
        }
        removed
    }

    pub fn upsert_link(&mut self, a: NodeId, b: NodeId, choice: LinkChoice) -> Option<LinkId> {
        let before = self.store.link_between(a, b).map(|l| (l.id, l.kind));
        let id = self.store.upsert_link(a, b, choice);
        let after = self.store.link_between(a, b).map(|l| (l.id, l.kind));
        if before != after {
            self.sim.disturb(Disturbance::Structure);
        }
        id
    }

    pub fn remove_link(&mut self, id: LinkId) -> bool {
        let removed = self.store.remove_link(id);
        if removed {
            self.sim.disturb(Disturbance::Structure);
        }
        removed
    }

    pub fn rename_node(&mut self, id: NodeId, name: &str) -> bool {
        self.store.rename_node(id, name)
    }

    pub fn set_area(&mut self, id: NodeId, area: f64) -> bool {
        let changed = self.store.set_area(id, area);
        if changed {
            self.sim.disturb(Disturbance::Structure);
            self.settle_if_paused();
        }
        changed
    }

    pub fn set_locked(&mut self, id: NodeId, locked: bool) -> bool {
        self.store.set_locked(id, locked)
    }

    pub fn lock_all(&mut self) {
        self.set_all_locked(true);
    }

    pub fn unlock_all(&mut self) {
        self.set_all_locked(false);
    }

    fn set_all_locked(&mut self, locked: bool) {
        let ids: Vec<NodeId> = self.store.nodes().iter().map(|n| n.id).collect();
        for id in ids {
            self.store.set_locked(id, locked);
        }
    }

    /// Create one node per line of a space list. `replace` clears the diagram first.
    pub fn generate_from_list(&mut self, text: &str, replace: bool) -> Vec<NodeId> {
        if replace {
            self.clear();
        }
        let specs: Vec<NodeSpec> = parse_space_list(text)
            .into_iter()
            .map(|e| NodeSpec::new(e.name, e.area))
            .collect();
        info!("generating {} spaces from list", specs.len());
        self.upsert_nodes(specs)
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.controller.prune(&self.store);
        self.sim.discard_pending();
    }

    pub fn delete_selection(&mut self) -> Vec<NodeId> {
        let ids: Vec<NodeId> = self.controller.selection().iter().copied().collect();
        self.remove_nodes(&ids)
    }

    // ---- conflicts ----

    pub fn compute_conflicts(&self, expected: &str, tolerance: f64) -> Conflicts {
        conflicts::compute_conflicts(&self.store, self.sim.config().buffer, expected, tolerance)
    }

    /// Conflicts against the stored expected-pairs text and tolerance.
    pub fn current_conflicts(&self) -> Conflicts {
        self.compute_conflicts(&self.expected_pairs, self.tolerance)
    }

    pub fn set_expected_pairs(&mut self, text: &str) {
        self.expected_pairs = text.to_string();
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }

    /// Link every missing expected pair as `necessary`.
    pub fn auto_connect(&mut self, expected: &str) -> Vec<LinkId> {
        let missing = conflicts::missing_pairs(&self.store, expected);
        let created = conflicts::auto_connect(&mut self.store, &missing);
        if !created.is_empty() {
            self.sim.disturb(Disturbance::Structure);
        }
        created
    }

    // ---- interaction ----

    pub fn set_mode(&mut self, mode: Mode) {
        self.controller.set_mode(mode);
    }

    pub fn set_link_kind(&mut self, kind: LinkKind) {
        self.controller.set_link_kind(kind);
    }

    pub fn select_all(&mut self) {
        self.controller.select_all(&self.store);
    }

    pub fn pointer_down(&mut self, p: Point, mods: Modifiers) -> Interaction {
        self.controller.pointer_down(&mut self.store, &mut self.sim, p, mods)
    }

    pub fn pointer_move(&mut self, p: Point) -> Interaction {
        self.controller.pointer_move(&mut self.store, &mut self.sim, p)
    }

    pub fn pointer_up(&mut self, p: Point) -> Interaction {
        self.controller.pointer_up(&mut self.store, &mut self.sim, p)
    }

    // ---- persistence and output ----

    pub fn settings(&self) -> Settings {
        let cfg = self.sim.config();
        Settings {
            buffer: cfg.buffer,
            rotation_sensitivity: cfg.rotation_sensitivity,
            physics_enabled: self.sim.is_running(),
            link_kind: self.controller.link_kind(),
            tolerance: self.tolerance,
            expected_pairs: self.expected_pairs.clone(),
        }
    }

    pub fn to_document(&self) -> DiagramDocument {
        DiagramDocument::from_store(&self.store, self.settings())
    }

    /// Replace the current graph and settings with a document's.
    pub fn load_document(&mut self, doc: &DiagramDocument) {
        self.store = doc.to_store();
        self.controller = InteractionController::new();
        self.controller.set_link_kind(doc.settings.link_kind);
        self.expected_pairs = doc.settings.expected_pairs.clone();
        self.tolerance = doc.settings.tolerance;
        self.sim.discard_pending();
        self.sim.set_rotation_sensitivity(doc.settings.rotation_sensitivity);
        self.sim.set_buffer(doc.settings.buffer);
        self.sim.set_running(doc.settings.physics_enabled);
        info!("loaded {} nodes, {} links", self.store.nodes().len(), self.store.links().len());
    }

    pub fn scene(&self) -> SceneOutput {
        let conflicts = self.current_conflicts();
        let overlong: HashSet<LinkId> = conflicts.overlong_link_ids.iter().copied().collect();
        let selection = self.controller.selection();

        let nodes = self
            .store
            .nodes()
            .iter()
            .map(|n| NodeOutput {
                id: n.id,
                name: n.name.clone(),
                area: n.area,
                x: n.pos.x,
                y: n.pos.y,
                radius: self.store.radius_of(n),
                locked: n.locked,
                selected: selection.contains(&n.id),
            })
            .collect();
        let links = self
            .store
            .links()
            .iter()
            .map(|l| LinkOutput {
                id: l.id,
                source: l.source,
                target: l.target,
                kind: l.kind,
                overlong: overlong.contains(&l.id),
            })
            .collect();

        SceneOutput {
            nodes,
            links,
            missing_pairs: conflicts.missing_pairs,
            lasso: self.controller.lasso_points().to_vec(),
            pending_source: self.controller.pending_source(),
            mode: self.controller.mode(),
            physics_enabled: self.sim.is_running(),
            pan_zoom_enabled: self.controller.pan_zoom_enabled(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::R_MAX;

    fn paused() -> Diagram {
        let mut d = Diagram::new();
        d.set_physics_enabled(false);
        d
    }

    #[test]
    fn test_resolve_scenario_coincident_pair() {
        let mut d = paused();
        let ids = d.upsert_nodes(vec![
            NodeSpec::new("A", 90.0).at(Point::ZERO),
            NodeSpec::new("B", 45.0).at(Point::ZERO),
        ]);
        d.resolve_once();
        let s = d.store();
        let dist = s.node(ids[0]).unwrap().pos.distance(s.node(ids[1]).unwrap().pos);
        assert!(dist >= s.radius(ids[0]) + s.radius(ids[1]) + 6.0 - 1e-9);
    }

    #[test]
    fn test_resolve_once_twice_is_stable() {
        let mut d = paused();
        d.generate_from_list("A, 90\nB, 45\nC, 20\nD, 60", false);
        d.set_buffer(30.0);
        for _ in 0..200 {
            d.resolve_once();
        }
        let before: Vec<Point> = d.store().nodes().iter().map(|n| n.pos).collect();
        d.resolve_once();
        let after: Vec<Point> = d.store().nodes().iter().map(|n| n.pos).collect();
        for (a, b) in before.iter().zip(&after) {
            assert!(a.distance(*b) < 1e-6);
        }
    }

    #[test]
    fn test_resolve_once_is_noop_while_running() {
        let mut d = Diagram::new();
        d.upsert_nodes(vec![
            NodeSpec::new("A", 90.0).at(Point::ZERO),
            NodeSpec::new("B", 45.0).at(Point::ZERO),
        ]);
        assert_eq!(d.resolve_once(), 0);
    }

    #[test]
    fn test_area_edit_while_paused_keeps_no_overlap() {
        let mut d = paused();
        let ids = d.upsert_nodes(vec![
            NodeSpec::new("A", 10.0).at(Point::new(0.0, 0.0)),
            NodeSpec::new("B", 10.0).at(Point::new(50.0, 0.0)),
            NodeSpec::new("C", 10.0).at(Point::new(500.0, 0.0)),
        ]);
        d.set_area(ids[0], 400.0);
        assert_eq!(d.store().radius(ids[0]), R_MAX);
        let s = d.store();
        let dist = s.node(ids[0]).unwrap().pos.distance(s.node(ids[1]).unwrap().pos);
        assert!(dist >= s.radius(ids[0]) + s.radius(ids[1]) + 6.0 - 1e-6);
    }

    #[test]
    fn test_tick_runs_only_with_physics() {
        let mut d = Diagram::new();
        d.generate_from_list("A 10\nB 20", false);
        assert!(d.tick());
        d.set_physics_enabled(false);
        assert!(!d.tick());
    }

    #[test]
    fn test_tick_does_not_clobber_dragged_node() {
        let mut d = Diagram::new();
        let ids = d.upsert_nodes(vec![
            NodeSpec::new("A", 10.0).at(Point::new(0.0, 0.0)),
            NodeSpec::new("B", 10.0).at(Point::new(300.0, 0.0)),
        ]);
        d.pointer_down(Point::new(0.0, 0.0), Modifiers::default());
        d.pointer_move(Point::new(-100.0, 40.0));
        for _ in 0..20 {
            d.tick();
        }
        assert_eq!(d.store().node(ids[0]).unwrap().pos, Point::new(-100.0, 40.0));
        d.pointer_up(Point::new(-100.0, 40.0));
        assert!(d.store().node(ids[0]).unwrap().fixed.is_none());
    }

    #[test]
    fn test_conflict_scenario_through_facade() {
        let mut d = paused();
        d.generate_from_list("A, 10\nB, 20", false);
        assert_eq!(d.compute_conflicts("A - B", 1.8).missing_pairs.len(), 1);
        assert_eq!(d.auto_connect("A - B").len(), 1);
        assert!(d.compute_conflicts("A - B", 1.8).missing_pairs.is_empty());
        assert!(d.auto_connect("A - B").is_empty());
    }

    #[test]
    fn test_delete_selection_clears_it() {
        let mut d = paused();
        d.generate_from_list("A\nB\nC", false);
        d.select_all();
        let removed = d.delete_selection();
        assert_eq!(removed.len(), 3);
        assert!(d.store().is_empty());
        assert!(d.controller().selection().is_empty());
    }

    #[test]
    fn test_generate_replace_clears_previous() {
        let mut d = paused();
        d.generate_from_list("A\nB", false);
        d.generate_from_list("C", true);
        assert_eq!(d.store().nodes().len(), 1);
        assert_eq!(d.store().nodes()[0].name, "C");
    }

    #[test]
    fn test_document_round_trip_restores_settings() {
        let mut d = paused();
        d.generate_from_list("Kitchen, 12\nDining, 18", false);
        d.upsert_link(NodeId(0), NodeId(1), LinkChoice::Kind(LinkKind::Ideal));
        d.set_buffer(12.0);
        d.set_expected_pairs("Kitchen - Dining");
        d.set_link_kind(LinkKind::Ideal);
        d.set_locked(NodeId(1), true);
        let doc = d.to_document();

        let mut e = Diagram::new();
        e.load_document(&doc);
        assert_eq!(e.to_document(), doc);
        assert!(!e.physics_enabled());
        assert_eq!(e.current_conflicts().missing_pairs.len(), 1);
    }

    #[test]
    fn test_scene_marks_selection_and_overlong() {
        let mut d = paused();
        let ids = d.upsert_nodes(vec![
            NodeSpec::new("A", 10.0).at(Point::new(0.0, 0.0)),
            NodeSpec::new("B", 10.0).at(Point::new(2000.0, 0.0)),
        ]);
        d.upsert_link(ids[0], ids[1], LinkChoice::Kind(LinkKind::Necessary));
        d.select_all();
        let scene = d.scene();
        assert!(scene.nodes.iter().all(|n| n.selected));
        assert!(scene.links[0].overlong);
        assert!(!scene.physics_enabled);
    }

    #[test]
    fn test_rejected_structure_edits_leave_alpha_alone() {
        let mut d = Diagram::new();
        let ids = d.upsert_nodes(vec![
            NodeSpec::new("A", 10.0).at(Point::new(0.0, 0.0)),
            NodeSpec::new("B", 10.0).at(Point::new(200.0, 0.0)),
        ]);
        for _ in 0..5 {
            d.tick();
        }
        let cooled = d.simulation().alpha();
        assert!(cooled < Disturbance::Structure.alpha());

        assert_eq!(d.upsert_link(ids[0], ids[0], LinkChoice::Kind(LinkKind::Ideal)), None);
        assert_eq!(d.upsert_link(ids[0], NodeId(99), LinkChoice::Kind(LinkKind::Ideal)), None);
        assert_eq!(d.upsert_link(ids[0], ids[1], LinkChoice::None), None);
        assert!(d.upsert_nodes(Vec::new()).is_empty());
        assert_eq!(d.simulation().alpha(), cooled);

        d.upsert_link(ids[0], ids[1], LinkChoice::Kind(LinkKind::Necessary));
        assert_eq!(d.simulation().alpha(), Disturbance::Structure.alpha());

        d.tick();
        let cooled = d.simulation().alpha();
        // ideal never downgrades, so nothing changed
        d.upsert_link(ids[1], ids[0], LinkChoice::Kind(LinkKind::Ideal));
        assert_eq!(d.simulation().alpha(), cooled);
    }
}
