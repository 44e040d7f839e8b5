//! Pointer-driven editing: selection, group drag, lasso and connect mode.
//!
//! The controller reads and writes the graph store directly. While a drag is in
//! progress the dragged nodes are pinned and reported by [`InteractionController::held`],
//! so simulation frames never overwrite them. With physics paused, every move runs
//! the drag-time collision pass and releasing runs one batch pass.
//!
//! Each handler returns an [`Interaction`] so a history collaborator can snapshot once
//! per discrete action (one connect, one completed drag).

use std::collections::{BTreeSet, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::graph::{GraphStore, LinkChoice, LinkId, LinkKind, NodeId, Point};
use crate::layout::{Disturbance, Simulation, resolve_batch, resolve_dragged};

pub mod lasso;

/// Alpha floor kept while a drag is in progress with physics running.
const DRAG_ALPHA_TARGET: f64 = 0.3;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Select,
    Connect,
}

/// Modifier keys held at pointer-down.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Add to the selection instead of replacing it.
    pub multi: bool,
    /// Start a lasso instead of a drag.
    pub lasso: bool,
}

/// Result of a pointer event, for history and UI refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interaction {
    None,
    SelectionChanged,
    Armed { node: NodeId },
    Disarmed,
    LinkCreated { link: LinkId },
    DragCommitted { nodes: Vec<NodeId> },
}

#[derive(Debug, Clone)]
struct DragState {
    pointer_start: Point,
    starts: Vec<(NodeId, Point)>,
    moved: bool,
}

#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    Drag(DragState),
    Lasso(Vec<Point>),
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    mode: Mode,
    link_kind: LinkKind,
    selection: BTreeSet<NodeId>,
    gesture: Gesture,
    pending_source: Option<NodeId>,
    pan_zoom_enabled: bool,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self {
            mode: Mode::Select,
            link_kind: LinkKind::Necessary,
            selection: BTreeSet::new(),
            gesture: Gesture::Idle,
            pending_source: None,
            pan_zoom_enabled: true,
        }
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switching mode disarms connect and abandons any lasso.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.pending_source = None;
        if matches!(self.gesture, Gesture::Lasso(_)) {
            self.gesture = Gesture::Idle;
            self.pan_zoom_enabled = true;
        }
    }

    pub fn link_kind(&self) -> LinkKind {
        self.link_kind
    }

    pub fn set_link_kind(&mut self, kind: LinkKind) {
        self.link_kind = kind;
    }

    pub fn selection(&self) -> &BTreeSet<NodeId> {
        &self.selection
    }

    pub fn pending_source(&self) -> Option<NodeId> {
        self.pending_source
    }

    pub fn pan_zoom_enabled(&self) -> bool {
        self.pan_zoom_enabled
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Drag(_))
    }

    pub fn lasso_points(&self) -> &[Point] {
        match &self.gesture {
            Gesture::Lasso(points) => points,
            _ => &[],
        }
    }

    /// Nodes whose position is currently owned by a drag.
    pub fn held(&self) -> HashSet<NodeId> {
        match &self.gesture {
            Gesture::Drag(drag) => drag.starts.iter().map(|(id, _)| *id).collect(),
            _ => HashSet::new(),
        }
    }

    pub fn select_all(&mut self, store: &GraphStore) {
        self.selection = store.nodes().iter().map(|n| n.id).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.selection = ids.into_iter().collect();
    }

    /// Forget selected, armed or dragged ids that no longer exist in the store.
    pub fn prune(&mut self, store: &GraphStore) {
        self.selection.retain(|id| store.node(*id).is_some());
        if self.pending_source.is_some_and(|id| store.node(id).is_none()) {
            self.pending_source = None;
        }
        if let Gesture::Drag(drag) = &mut self.gesture {
            drag.starts.retain(|(id, _)| store.node(*id).is_some());
            if drag.starts.is_empty() {
                self.gesture = Gesture::Idle;
            }
        }
    }

    pub fn pointer_down(
        &mut self,
        store: &mut GraphStore,
        sim: &mut Simulation,
        p: Point,
        mods: Modifiers,
    ) -> Interaction {
        match self.mode {
            Mode::Connect => self.connect_click(store, sim, p),
            Mode::Select if mods.lasso => {
                self.gesture = Gesture::Lasso(vec![p]);
                self.pan_zoom_enabled = false;
                Interaction::None
            }
            Mode::Select => self.begin_drag(store, sim, p, mods),
        }
    }

    fn begin_drag(
        &mut self,
        store: &mut GraphStore,
        sim: &mut Simulation,
        p: Point,
        mods: Modifiers,
    ) -> Interaction {
        let Some(hit) = store.node_at(p) else {
            if !mods.multi && !self.selection.is_empty() {
                self.selection.clear();
                return Interaction::SelectionChanged;
            }
            return Interaction::None;
        };

        let mut changed = false;
        if !self.selection.contains(&hit) {
            if !mods.multi {
                self.selection.clear();
            }
            self.selection.insert(hit);
            changed = true;
        }

        let mut starts = Vec::with_capacity(self.selection.len());
        for &id in &self.selection {
            if let Some(node) = store.node_mut(id) {
                node.fixed = Some(node.pos);
                node.vel = Point::ZERO;
                starts.push((id, node.pos));
            }
        }
        debug!("drag start on {:?} with {} nodes", hit, starts.len());
        self.gesture = Gesture::Drag(DragState { pointer_start: p, starts, moved: false });

        if sim.is_running() {
            sim.set_alpha_target(DRAG_ALPHA_TARGET);
            sim.disturb(Disturbance::DragStart);
        }

        if changed { Interaction::SelectionChanged } else { Interaction::None }
    }

    fn connect_click(&mut self, store: &mut GraphStore, sim: &mut Simulation, p: Point) -> Interaction {
        let hit = store.node_at(p);
        match (self.pending_source, hit) {
            (None, Some(id)) => {
                self.pending_source = Some(id);
                Interaction::Armed { node: id }
            }
            (None, None) => Interaction::None,
            (Some(_), None) => {
                self.pending_source = None;
                Interaction::Disarmed
            }
            (Some(src), Some(id)) if src == id => {
                self.pending_source = None;
                Interaction::Disarmed
            }
            (Some(src), Some(id)) => {
                self.pending_source = None;
                match store.upsert_link(src, id, LinkChoice::Kind(self.link_kind)) {
                    Some(link) => {
                        sim.disturb(Disturbance::Structure);
                        Interaction::LinkCreated { link }
                    }
                    None => Interaction::Disarmed,
                }
            }
        }
    }

    pub fn pointer_move(&mut self, store: &mut GraphStore, sim: &mut Simulation, p: Point) -> Interaction {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Lasso(points) => points.push(p),
            Gesture::Drag(drag) => {
                let delta = p - drag.pointer_start;
                for &(id, start) in &drag.starts {
                    if let Some(node) = store.node_mut(id) {
                        let q = start + delta;
                        node.pos = q;
                        node.fixed = Some(q);
                    }
                }
                drag.moved = drag.moved || delta.length_squared() > 0.0;
                if !sim.is_running() {
                    let held: HashSet<NodeId> = drag.starts.iter().map(|(id, _)| *id).collect();
                    resolve_dragged(store, &held, sim.config().buffer);
                }
            }
        }
        Interaction::None
    }

    pub fn pointer_up(&mut self, store: &mut GraphStore, sim: &mut Simulation, p: Point) -> Interaction {
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => Interaction::None,
            Gesture::Lasso(mut points) => {
                points.push(p);
                self.pan_zoom_enabled = true;
                self.selection = store
                    .nodes()
                    .iter()
                    .filter(|n| lasso::contains(&points, n.pos))
                    .map(|n| n.id)
                    .collect();
                Interaction::SelectionChanged
            }
            Gesture::Drag(drag) => {
                for &(id, _) in &drag.starts {
                    if let Some(node) = store.node_mut(id) {
                        node.fixed = if node.locked { Some(node.pos) } else { None };
                    }
                }
                sim.set_alpha_target(0.0);
                if !sim.is_running() {
                    resolve_batch(store, sim.config().buffer, sim.config().resolve_passes);
                }
                if drag.moved {
                    Interaction::DragCommitted { nodes: drag.starts.iter().map(|(id, _)| *id).collect() }
                } else {
                    Interaction::None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeSpec;

    fn setup() -> (GraphStore, Simulation, InteractionController) {
        let mut store = GraphStore::new();
        store.upsert_nodes(vec![
            NodeSpec::new("A", 10.0).at(Point::new(0.0, 0.0)),
            NodeSpec::new("B", 10.0).at(Point::new(200.0, 0.0)),
            NodeSpec::new("C", 10.0).at(Point::new(0.0, 200.0)),
        ]);
        let mut sim = Simulation::default();
        sim.set_running(false);
        (store, sim, InteractionController::new())
    }

    fn pos(store: &GraphStore, id: u32) -> Point {
        store.node(NodeId(id)).unwrap().pos
    }

    #[test]
    fn test_click_replaces_selection_multi_adds() {
        let (mut store, mut sim, mut ctl) = setup();
        ctl.pointer_down(&mut store, &mut sim, Point::new(0.0, 0.0), Modifiers::default());
        ctl.pointer_up(&mut store, &mut sim, Point::new(0.0, 0.0));
        ctl.pointer_down(&mut store, &mut sim, Point::new(200.0, 0.0), Modifiers::default());
        ctl.pointer_up(&mut store, &mut sim, Point::new(200.0, 0.0));
        assert_eq!(ctl.selection().iter().copied().collect::<Vec<_>>(), vec![NodeId(1)]);

        let multi = Modifiers { multi: true, lasso: false };
        ctl.pointer_down(&mut store, &mut sim, Point::new(0.0, 200.0), multi);
        ctl.pointer_up(&mut store, &mut sim, Point::new(0.0, 200.0));
        assert_eq!(ctl.selection().len(), 2);
    }

    #[test]
    fn test_empty_click_clears_selection() {
        let (mut store, mut sim, mut ctl) = setup();
        ctl.select_all(&store);
        let out = ctl.pointer_down(&mut store, &mut sim, Point::new(900.0, 900.0), Modifiers::default());
        assert_eq!(out, Interaction::SelectionChanged);
        assert!(ctl.selection().is_empty());
    }

    #[test]
    fn test_group_drag_translates_selection() {
        let (mut store, mut sim, mut ctl) = setup();
        ctl.set_selection([NodeId(0), NodeId(1)]);
        ctl.pointer_down(&mut store, &mut sim, Point::new(0.0, 0.0), Modifiers::default());
        assert!(ctl.is_dragging());
        assert_eq!(ctl.held().len(), 2);
        ctl.pointer_move(&mut store, &mut sim, Point::new(10.0, 500.0));
        let out = ctl.pointer_up(&mut store, &mut sim, Point::new(10.0, 500.0));

        assert_eq!(pos(&store, 0), Point::new(10.0, 500.0));
        assert_eq!(pos(&store, 1), Point::new(210.0, 500.0));
        assert_eq!(pos(&store, 2), Point::new(0.0, 200.0));
        assert_eq!(out, Interaction::DragCommitted { nodes: vec![NodeId(0), NodeId(1)] });
        // released: unlocked nodes drop their pin
        assert!(store.node(NodeId(0)).unwrap().fixed.is_none());
    }

    #[test]
    fn test_paused_drag_never_overlaps_and_others_stay() {
        let (mut store, mut sim, mut ctl) = setup();
        ctl.pointer_down(&mut store, &mut sim, Point::new(0.0, 0.0), Modifiers::default());
        // drop A right on top of B
        ctl.pointer_move(&mut store, &mut sim, Point::new(195.0, 0.0));
        let a = pos(&store, 0);
        let need = 20.0 + 20.0 + sim.config().buffer;
        assert!(a.distance(pos(&store, 1)) >= need - 1e-9);
        assert_eq!(pos(&store, 1), Point::new(200.0, 0.0));
        ctl.pointer_up(&mut store, &mut sim, Point::new(195.0, 0.0));
        assert!(pos(&store, 0).distance(pos(&store, 1)) >= need - 1e-9);
    }

    #[test]
    fn test_locked_node_keeps_pin_after_drag() {
        let (mut store, mut sim, mut ctl) = setup();
        store.set_locked(NodeId(2), true);
        ctl.pointer_down(&mut store, &mut sim, Point::new(0.0, 200.0), Modifiers::default());
        ctl.pointer_move(&mut store, &mut sim, Point::new(0.0, 400.0));
        ctl.pointer_up(&mut store, &mut sim, Point::new(0.0, 400.0));
        let c = store.node(NodeId(2)).unwrap();
        assert_eq!(c.fixed, Some(Point::new(0.0, 400.0)));
        assert!(c.locked);
    }

    #[test]
    fn test_click_without_move_is_not_a_commit() {
        let (mut store, mut sim, mut ctl) = setup();
        ctl.pointer_down(&mut store, &mut sim, Point::new(0.0, 0.0), Modifiers::default());
        assert_eq!(ctl.pointer_up(&mut store, &mut sim, Point::new(0.0, 0.0)), Interaction::None);
    }

    #[test]
    fn test_running_drag_raises_alpha_target() {
        let (mut store, mut sim, mut ctl) = setup();
        sim.set_running(true);
        ctl.pointer_down(&mut store, &mut sim, Point::new(0.0, 0.0), Modifiers::default());
        assert_eq!(sim.alpha(), Disturbance::DragStart.alpha());
        ctl.pointer_up(&mut store, &mut sim, Point::new(0.0, 0.0));
        for _ in 0..2000 {
            if let Some(frame) = sim.step(&store) {
                sim.commit(&frame, &mut store, &HashSet::new());
            }
        }
        assert!(sim.is_settled());
    }

    #[test]
    fn test_lasso_selects_contained_nodes() {
        let (mut store, mut sim, mut ctl) = setup();
        ctl.set_selection([NodeId(2)]);
        let lasso = Modifiers { multi: false, lasso: true };
        ctl.pointer_down(&mut store, &mut sim, Point::new(-50.0, -50.0), lasso);
        assert!(!ctl.pan_zoom_enabled());
        ctl.pointer_move(&mut store, &mut sim, Point::new(300.0, -50.0));
        ctl.pointer_move(&mut store, &mut sim, Point::new(300.0, 50.0));
        let out = ctl.pointer_up(&mut store, &mut sim, Point::new(-50.0, 50.0));
        assert_eq!(out, Interaction::SelectionChanged);
        assert!(ctl.pan_zoom_enabled());
        assert_eq!(ctl.selection().iter().copied().collect::<Vec<_>>(), vec![NodeId(0), NodeId(1)]);
        // nodes do not move during a lasso
        assert_eq!(pos(&store, 0), Point::ZERO);
    }

    #[test]
    fn test_connect_mode_creates_link() {
        let (mut store, mut sim, mut ctl) = setup();
        ctl.set_mode(Mode::Connect);
        ctl.set_link_kind(LinkKind::Ideal);
        let a = ctl.pointer_down(&mut store, &mut sim, Point::new(0.0, 0.0), Modifiers::default());
        assert_eq!(a, Interaction::Armed { node: NodeId(0) });
        let b = ctl.pointer_down(&mut store, &mut sim, Point::new(200.0, 0.0), Modifiers::default());
        assert!(matches!(b, Interaction::LinkCreated { .. }));
        assert_eq!(store.links().len(), 1);
        assert_eq!(store.links()[0].kind, LinkKind::Ideal);
        assert_eq!(ctl.pending_source(), None);
    }

    #[test]
    fn test_connect_same_node_disarms_without_link() {
        let (mut store, mut sim, mut ctl) = setup();
        ctl.set_mode(Mode::Connect);
        ctl.pointer_down(&mut store, &mut sim, Point::new(0.0, 0.0), Modifiers::default());
        let out = ctl.pointer_down(&mut store, &mut sim, Point::new(1.0, 1.0), Modifiers::default());
        assert_eq!(out, Interaction::Disarmed);
        assert!(store.links().is_empty());
    }

    #[test]
    fn test_connect_existing_pair_does_not_duplicate() {
        let (mut store, mut sim, mut ctl) = setup();
        ctl.set_mode(Mode::Connect);
        for _ in 0..2 {
            ctl.pointer_down(&mut store, &mut sim, Point::new(0.0, 0.0), Modifiers::default());
            ctl.pointer_down(&mut store, &mut sim, Point::new(200.0, 0.0), Modifiers::default());
        }
        assert_eq!(store.links().len(), 1);
    }

    #[test]
    fn test_prune_drops_deleted_ids() {
        let (mut store, _sim, mut ctl) = setup();
        ctl.select_all(&store);
        store.remove_nodes(&[NodeId(1)]);
        ctl.prune(&store);
        assert_eq!(ctl.selection().len(), 2);
        assert!(!ctl.selection().contains(&NodeId(1)));
    }
}
