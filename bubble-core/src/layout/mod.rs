// Layout engine for bubble diagrams.
//
// Two position authorities share the graph store:
// - the continuous force simulation, while physics is enabled
// - the static collision resolver, while physics is paused (including during drags)
//
// Submodules:
// - links: pair dedup and the rest-distance baseline
// - forces: repulsion, collision, link, centering and spin
// - simulation: alpha/decay integrator, detangle pulse, frame commit
// - collision: one-shot and drag-time overlap correction

use serde::{Deserialize, Serialize};

pub mod collision;
pub mod forces;
pub mod links;
pub mod simulation;

pub use collision::{resolve_batch, resolve_dragged};
pub use links::{ResolvedLink, dedup_links, rest_distance};
pub use simulation::{Disturbance, Frame, Pulse, Simulation};

/// Small distance substituted for coincident nodes.
pub const EPSILON: f64 = 1e-6;

/// Tunables for the simulation and the static resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Required gap between circle boundaries (px).
    pub buffer: f64,
    /// Rotational drift, 0..=100.
    pub rotation_sensitivity: f64,
    /// Base charge; negative repels.
    pub charge: f64,
    /// Fraction of velocity lost per tick.
    pub velocity_decay: f64,
    /// Rate at which alpha approaches its target per tick.
    pub alpha_decay: f64,
    /// Below this alpha (and with a zero target) the simulation stops ticking.
    pub alpha_min: f64,
    /// Strength of the centroid shift toward the origin.
    pub center_strength: f64,
    /// Strength of the independent pull toward the x and y axes.
    pub axis_strength: f64,
    /// Fraction of overlap corrected per tick at alpha 1.
    pub collide_strength: f64,
    /// Repulsion and rest-distance multiplier while a detangle pulse is active.
    pub explode_multiplier: f64,
    /// Extra collision gap while a detangle pulse is active (px).
    pub explode_margin: f64,
    /// Length of a detangle pulse, in ticks.
    pub pulse_ticks: u64,
    /// Passes made by `resolve_once`.
    pub resolve_passes: usize,
    /// Scales rotation sensitivity into an angular velocity.
    pub spin_gain: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            buffer: 6.0,
            rotation_sensitivity: 0.0,
            charge: -220.0,
            velocity_decay: 0.4,
            alpha_decay: 0.03,
            alpha_min: 0.001,
            center_strength: 0.05,
            axis_strength: 0.02,
            collide_strength: 1.0,
            explode_multiplier: 2.2,
            explode_margin: 24.0,
            pulse_ticks: 72,
            resolve_passes: 2,
            spin_gain: 0.0004,
        }
    }
}

impl SimulationConfig {
    /// Buffer is never negative.
    pub fn set_buffer(&mut self, px: f64) {
        self.buffer = if px.is_finite() { px.max(0.0) } else { 0.0 };
    }

    pub fn set_rotation_sensitivity(&mut self, s: f64) {
        self.rotation_sensitivity = if s.is_finite() { s.clamp(0.0, 100.0) } else { 0.0 };
    }
}
