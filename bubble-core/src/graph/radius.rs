// Area -> radius scale.
//
// Radii are a square-root scale of area, rescaled between the smallest and largest
// sqrt(area) in the current node set and clamped to [R_MIN, R_MAX]. The scale depends
// on the extrema of the whole set, so it is rebuilt whenever any node is added,
// removed or resized.

use super::Node;

/// Smallest drawn radius (px).
pub const R_MIN: f64 = 20.0;
/// Largest drawn radius (px).
pub const R_MAX: f64 = 80.0;

/// Areas below this are treated as this, so sqrt never sees zero or negatives.
const AREA_FLOOR: f64 = 1.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RadiusScale {
    min_sqrt: f64,
    max_sqrt: f64,
}

impl Default for RadiusScale {
    fn default() -> Self {
        Self { min_sqrt: 1.0, max_sqrt: 1.0 }
    }
}

impl RadiusScale {
    /// Build the scale from the areas of the given nodes.
    pub fn from_nodes(nodes: &[Node]) -> Self {
        Self::from_areas(nodes.iter().map(|n| n.area))
    }

    pub fn from_areas(areas: impl IntoIterator<Item = f64>) -> Self {
        let mut min_sqrt = f64::INFINITY;
        let mut max_sqrt = f64::NEG_INFINITY;
        for a in areas {
            let s = floored_sqrt(a);
            min_sqrt = min_sqrt.min(s);
            max_sqrt = max_sqrt.max(s);
        }
        if !min_sqrt.is_finite() || !max_sqrt.is_finite() {
            return Self::default();
        }
        Self { min_sqrt, max_sqrt }
    }

    pub fn radius(&self, area: f64) -> f64 {
        let span = self.max_sqrt - self.min_sqrt;
        if span <= f64::EPSILON {
            return R_MIN;
        }
        let t = (floored_sqrt(area) - self.min_sqrt) / span;
        (R_MIN + t * (R_MAX - R_MIN)).clamp(R_MIN, R_MAX)
    }
}

fn floored_sqrt(area: f64) -> f64 {
    if area.is_nan() {
        return AREA_FLOOR;
    }
    area.max(AREA_FLOOR).sqrt()
}
