// Force simulation.
//
// One `Simulation` per diagram. It owns only transient state: alpha, the tick
// counter, the detangle pulse and the id of an uncommitted frame. Node positions
// and velocities live in the graph store; `step` reads them and returns a
// candidate `Frame`, and `commit` merges that frame back in one go, skipping any
// node held by an active drag.
//
// While paused nothing integrates and alpha is left as it was, so re-enabling
// resumes with the same energy.

use std::collections::HashSet;

use log::{debug, info};

use crate::graph::{GraphStore, NodeId, Point};

use super::SimulationConfig;
use super::forces::{
    Bodies, apply_axis_pull, apply_centering, apply_collision, apply_links, apply_repulsion,
    apply_spin, effective_charge,
};
use super::links::{degrees, dedup_links};

/// Events that put energy back into the layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Disturbance {
    DragStart,
    RotationChange,
    BufferChange,
    PhysicsEnabled,
    Structure,
    DetangleSettle,
    Detangle,
}

impl Disturbance {
    /// Alpha the simulation restarts at.
    pub fn alpha(self) -> f64 {
        match self {
            Disturbance::DragStart | Disturbance::RotationChange => 0.3,
            Disturbance::BufferChange
            | Disturbance::PhysicsEnabled
            | Disturbance::DetangleSettle => 0.5,
            Disturbance::Structure => 0.6,
            Disturbance::Detangle => 1.0,
        }
    }
}

/// Transient explode state, checked at the start of every tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pulse {
    pub active: bool,
    pub multiplier: f64,
    pub expires_at_tick: u64,
}

impl Default for Pulse {
    fn default() -> Self {
        Self { active: false, multiplier: 1.0, expires_at_tick: 0 }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameEntry {
    pub id: NodeId,
    pub pos: Point,
    pub vel: Point,
}

/// Candidate next state produced by one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub tick: u64,
    pub alpha: f64,
    pub entries: Vec<FrameEntry>,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    running: bool,
    alpha: f64,
    alpha_target: f64,
    tick: u64,
    pulse: Pulse,
    pending: Option<u64>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            running: true,
            alpha: 1.0,
            alpha_target: 0.0,
            tick: 0,
            pulse: Pulse::default(),
            pending: None,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn pulse(&self) -> Pulse {
        self.pulse
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }

    /// True once alpha has decayed below `alpha_min` with nothing holding it up.
    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
    }

    pub fn disturb(&mut self, d: Disturbance) {
        self.alpha = d.alpha();
        debug!("simulation disturbed by {:?}, alpha = {}", d, self.alpha);
    }

    /// Keep alpha from decaying below `target` (used while dragging).
    pub fn set_alpha_target(&mut self, target: f64) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    pub fn set_buffer(&mut self, px: f64) {
        self.config.set_buffer(px);
        self.disturb(Disturbance::BufferChange);
    }

    pub fn set_rotation_sensitivity(&mut self, s: f64) {
        self.config.set_rotation_sensitivity(s);
        self.disturb(Disturbance::RotationChange);
    }

    pub fn set_running(&mut self, running: bool) {
        if self.running == running {
            return;
        }
        self.running = running;
        if running {
            self.disturb(Disturbance::PhysicsEnabled);
        } else {
            // a frame computed before pausing must not land afterwards
            self.pending = None;
        }
        info!("physics {}", if running { "enabled" } else { "paused" });
    }

    /// Start (or restart) a detangle pulse. A running pulse has its expiry replaced.
    pub fn trigger_detangle(&mut self) {
        self.pulse = Pulse {
            active: true,
            multiplier: self.config.explode_multiplier,
            expires_at_tick: self.tick + self.config.pulse_ticks,
        };
        self.disturb(Disturbance::Detangle);
        info!("detangle pulse until tick {}", self.pulse.expires_at_tick);
    }

    fn expire_pulse(&mut self) {
        if self.pulse.active && self.tick >= self.pulse.expires_at_tick {
            self.pulse = Pulse::default();
            self.disturb(Disturbance::DetangleSettle);
            info!("detangle pulse ended at tick {}", self.tick);
        }
    }

    /// Drop an uncommitted frame, e.g. after the store was replaced.
    pub fn discard_pending(&mut self) {
        self.pending = None;
    }

    /// Advance one tick against the store and return the candidate frame.
    ///
    /// Returns `None` while paused, once settled, or while a previous frame is still
    /// waiting for `commit`.
    pub fn step(&mut self, store: &GraphStore) -> Option<Frame> {
        if !self.running || self.pending.is_some() {
            return None;
        }
        if self.is_settled() && !self.pulse.active {
            return None;
        }

        self.tick += 1;
        self.expire_pulse();
        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

        let mut bodies = Bodies {
            pos: store.nodes().iter().map(|n| n.pos).collect(),
            vel: store.nodes().iter().map(|n| n.vel).collect(),
            radius: store.radii(),
            fixed: store.nodes().iter().map(|n| n.fixed).collect(),
        };
        self.apply_forces(store, &mut bodies);
        self.integrate(&mut bodies);

        let entries = store
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| FrameEntry { id: n.id, pos: bodies.pos[i], vel: bodies.vel[i] })
            .collect();

        self.pending = Some(self.tick);
        Some(Frame { tick: self.tick, alpha: self.alpha, entries })
    }

    fn apply_forces(&self, store: &GraphStore, bodies: &mut Bodies) {
        let cfg = &self.config;
        let alpha = self.alpha;
        let explode = self.pulse.multiplier;

        apply_repulsion(bodies, effective_charge(cfg.charge, explode), alpha);

        let links = dedup_links(store);
        let degree = degrees(bodies.len(), &links);
        apply_links(bodies, &links, &degree, cfg.buffer, explode, alpha);

        apply_spin(bodies, cfg.rotation_sensitivity * cfg.spin_gain, alpha);
        apply_axis_pull(bodies, cfg.axis_strength, alpha);

        let margin = if self.pulse.active { cfg.explode_margin } else { 0.0 };
        apply_collision(bodies, (cfg.buffer + margin) / 2.0, cfg.collide_strength * alpha);

        apply_centering(bodies, cfg.center_strength);
    }

    fn integrate(&self, bodies: &mut Bodies) {
        let keep = 1.0 - self.config.velocity_decay;
        for i in 0..bodies.len() {
            match bodies.fixed[i] {
                Some(f) => {
                    bodies.pos[i] = f;
                    bodies.vel[i] = Point::ZERO;
                }
                None => {
                    bodies.vel[i] = bodies.vel[i] * keep;
                    let v = bodies.vel[i];
                    bodies.pos[i] += v;
                }
            }
        }
    }

    /// Publish a frame into the store.
    ///
    /// Nodes in `held` are owned by a drag and left alone; pinned nodes snap to
    /// their pin. Returns false for a stale or already-committed frame.
    pub fn commit(&mut self, frame: &Frame, store: &mut GraphStore, held: &HashSet<NodeId>) -> bool {
        if self.pending != Some(frame.tick) {
            debug!("dropping stale frame {}", frame.tick);
            return false;
        }
        self.pending = None;

        for entry in &frame.entries {
            if held.contains(&entry.id) {
                continue;
            }
            let Some(node) = store.node_mut(entry.id) else {
                continue;
            };
            match node.fixed {
                Some(f) => {
                    node.pos = f;
                    node.vel = Point::ZERO;
                }
                None => {
                    node.pos = entry.pos;
                    node.vel = entry.vel;
                }
            }
        }
        true
    }
}
