// Per-tick forces.
//
// Every force reads the positions captured at the start of the tick and adds to
// velocities (centering shifts positions directly). Pinned bodies still receive
// force contributions; the integrator discards them by snapping to the pin.

use crate::graph::{GOLDEN_ANGLE, Point};

use super::EPSILON;
use super::links::{ResolvedLink, rest_distance};

/// Working copy of node state for one tick, in store order.
#[derive(Debug, Clone, Default)]
pub struct Bodies {
    pub pos: Vec<Point>,
    pub vel: Vec<Point>,
    pub radius: Vec<f64>,
    pub fixed: Vec<Option<Point>>,
}

impl Bodies {
    pub fn len(&self) -> usize {
        self.pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }
}

/// Unit direction from body `a` toward body `b` for a coincident pair.
/// Antisymmetric: `nudge(b, a) == -nudge(a, b)`.
pub fn nudge(a: usize, b: usize) -> Point {
    let (lo, hi, sign) = if a < b { (a, b, 1.0) } else { (b, a, -1.0) };
    let theta = (lo * 31 + hi) as f64 * GOLDEN_ANGLE;
    Point::new(theta.cos(), theta.sin()) * sign
}

/// Charge applied for a given explode multiplier.
///
/// Amplification only kicks in above 1, where it jumps to `1.8 * multiplier`.
pub fn effective_charge(base: f64, explode: f64) -> f64 {
    if explode > 1.0 { base * 1.8 * explode } else { base }
}

/// All-pairs charge force. Negative strength repels.
pub fn apply_repulsion(bodies: &mut Bodies, strength: f64, alpha: f64) {
    let n = bodies.len();
    for i in 0..n {
        let mut dv = Point::ZERO;
        for j in 0..n {
            if i == j {
                continue;
            }
            let mut d = bodies.pos[j] - bodies.pos[i];
            let mut l = d.length_squared();
            if l < EPSILON * EPSILON {
                d = nudge(i, j) * EPSILON;
                l = EPSILON * EPSILON;
            }
            // soften very close pairs, like a minimum interaction distance of 1
            if l < 1.0 {
                l = l.sqrt();
            }
            dv += d * (strength * alpha / l);
        }
        bodies.vel[i] += dv;
    }
}

/// Pairwise collision constraint toward `radius_a + radius_b + 2 * pad`.
///
/// Uses positions predicted from the current velocities and splits the correction
/// so smaller bodies move more. `strength` is the fraction of overlap corrected.
pub fn apply_collision(bodies: &mut Bodies, pad: f64, strength: f64) {
    let n = bodies.len();
    for i in 0..n {
        let ri = bodies.radius[i] + pad;
        let ri2 = ri * ri;
        for j in (i + 1)..n {
            let rj = bodies.radius[j] + pad;
            let rj2 = rj * rj;
            let r = ri + rj;

            let pi = bodies.pos[i] + bodies.vel[i];
            let pj = bodies.pos[j] + bodies.vel[j];
            let mut d = pi - pj;
            let mut l = d.length_squared();
            if l >= r * r {
                continue;
            }
            if l < EPSILON * EPSILON {
                d = nudge(j, i) * EPSILON;
                l = EPSILON * EPSILON;
            }
            let dist = l.sqrt();
            let k = (r - dist) / dist * strength;
            let push = d * k;
            let share = rj2 / (ri2 + rj2);
            bodies.vel[i] += push * share;
            bodies.vel[j] -= push * (1.0 - share);
        }
    }
}

/// Spring toward each link's rest distance. Better-connected endpoints move less.
pub fn apply_links(
    bodies: &mut Bodies,
    links: &[ResolvedLink],
    degrees: &[usize],
    buffer: f64,
    explode: f64,
    alpha: f64,
) {
    for link in links {
        let (s, t) = (link.source, link.target);
        let rest = rest_distance(bodies.radius[s], bodies.radius[t], link.kind, buffer, explode);

        let mut d = (bodies.pos[t] + bodies.vel[t]) - (bodies.pos[s] + bodies.vel[s]);
        let mut l = d.length();
        if l < EPSILON {
            d = nudge(s, t) * EPSILON;
            l = EPSILON;
        }
        let k = (l - rest) / l * alpha * link.kind.strength();
        let pull = d * k;

        let ds = degrees[s].max(1) as f64;
        let dt = degrees[t].max(1) as f64;
        let bias = ds / (ds + dt);
        bodies.vel[t] -= pull * bias;
        bodies.vel[s] += pull * (1.0 - bias);
    }
}

/// Shift free bodies so the centroid drifts toward the origin.
pub fn apply_centering(bodies: &mut Bodies, strength: f64) {
    if bodies.is_empty() {
        return;
    }
    let mut sum = Point::ZERO;
    for p in &bodies.pos {
        sum += *p;
    }
    let shift = sum * (strength / bodies.len() as f64);
    for (p, fixed) in bodies.pos.iter_mut().zip(&bodies.fixed) {
        if fixed.is_none() {
            *p -= shift;
        }
    }
}

/// Independent pull toward the x axis and the y axis.
pub fn apply_axis_pull(bodies: &mut Bodies, strength: f64, alpha: f64) {
    for (v, p) in bodies.vel.iter_mut().zip(&bodies.pos) {
        v.x -= p.x * strength * alpha;
        v.y -= p.y * strength * alpha;
    }
}

/// Rotational drift around the origin. `rate` is sensitivity times gain.
pub fn apply_spin(bodies: &mut Bodies, rate: f64, alpha: f64) {
    if rate == 0.0 {
        return;
    }
    for ((v, p), fixed) in bodies.vel.iter_mut().zip(&bodies.pos).zip(&bodies.fixed) {
        if fixed.is_some() {
            continue;
        }
        *v += p.perp() * (rate * alpha);
    }
}
