// Static collision resolver, used whenever physics is paused.
//
// Two entry points:
// - resolve_batch: symmetric pairwise nudging over all unordered pairs for a fixed
//   number of passes
// - resolve_dragged: asymmetric, only the dragged set moves away from everything else
//
// Both are no-ops on a configuration without overlaps. A pinned node (locked, or
// held by a drag) is never displaced by the batch pass; its partner takes the whole
// correction instead.

use std::collections::HashSet;

use log::debug;

use crate::graph::{GraphStore, NodeId, Point};

use super::EPSILON;
use super::forces::nudge;

/// Overlaps at or below this are treated as touching.
const TOLERANCE: f64 = 1e-9;

/// Push overlapping pairs apart, half the overlap each. Returns the number of
/// corrections made across all passes.
pub fn resolve_batch(store: &mut GraphStore, buffer: f64, passes: usize) -> usize {
    let radii = store.radii();
    let nodes = store.nodes_mut();
    let n = nodes.len();
    let mut total = 0;

    for pass in 0..passes {
        let mut moved = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                let pinned_i = nodes[i].fixed.is_some();
                let pinned_j = nodes[j].fixed.is_some();
                if pinned_i && pinned_j {
                    continue;
                }

                let d = nodes[j].pos - nodes[i].pos;
                let dist = d.length();
                let overlap = radii[i] + radii[j] + buffer - dist;
                if overlap <= TOLERANCE {
                    continue;
                }
                let dir = if dist < EPSILON { nudge(i, j) } else { d * (1.0 / dist) };

                if pinned_i {
                    let p = nodes[j].pos + dir * overlap;
                    nodes[j].pos = p;
                } else if pinned_j {
                    let p = nodes[i].pos - dir * overlap;
                    nodes[i].pos = p;
                } else {
                    let half = dir * (overlap / 2.0);
                    nodes[i].pos -= half;
                    nodes[j].pos += half;
                }
                moved += 1;
            }
        }
        total += moved;
        if moved == 0 {
            break;
        }
        debug!("resolve pass {}: {} corrections", pass, moved);
    }

    for node in nodes.iter_mut() {
        node.snap_to_fixed();
    }
    total
}

/// Cap on drag-time passes. A node wedged between stationary neighbours
/// needs several alternating pushes to reach a gap that clears all of them.
const DRAG_PASSES: usize = 32;

/// Push each dragged node out of every non-dragged node, repeating until a pass
/// moves nothing. Non-dragged nodes stay put.
pub fn resolve_dragged(store: &mut GraphStore, dragged: &HashSet<NodeId>, buffer: f64) -> usize {
    if dragged.is_empty() {
        return 0;
    }
    let radii = store.radii();
    let nodes = store.nodes_mut();
    let n = nodes.len();
    let mut total = 0;

    for _ in 0..DRAG_PASSES {
        let mut moved = 0;
        for i in 0..n {
            if !dragged.contains(&nodes[i].id) {
                continue;
            }
            for j in 0..n {
                if i == j || dragged.contains(&nodes[j].id) {
                    continue;
                }
                let d = nodes[i].pos - nodes[j].pos;
                let dist = d.length();
                let overlap = radii[i] + radii[j] + buffer - dist;
                if overlap <= TOLERANCE {
                    continue;
                }
                let dir = if dist < EPSILON { nudge(j, i) } else { d * (1.0 / dist) };
                let p: Point = nodes[i].pos + dir * overlap;
                nodes[i].place(p);
                moved += 1;
            }
        }
        total += moved;
        if moved == 0 {
            break;
        }
    }
    total
}
