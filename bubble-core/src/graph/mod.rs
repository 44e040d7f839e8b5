//! Graph data model: spaces (nodes), typed adjacency links and the store that owns them.

use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use serde::{Deserialize, Serialize};

mod radius;
mod store;

pub use radius::{R_MAX, R_MIN, RadiusScale};
pub use store::{GraphStore, NodeSpec};

/// Golden angle in radians. Seeds the spawn spiral and spreads substitute
/// directions for coincident pairs.
pub const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub u32);

#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn distance(&self, other: Point) -> f64 {
        (other - *self).length()
    }

    /// Perpendicular vector, rotated a quarter turn counter-clockwise.
    pub fn perp(&self) -> Point {
        Point { x: -self.y, y: self.x }
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, k: f64) -> Point {
        Point { x: self.x * k, y: self.y * k }
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// Adjacency requirement between two spaces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Necessary,
    Ideal,
}

impl LinkKind {
    /// Multiplier on the rest distance of the link force.
    pub fn rest_factor(self) -> f64 {
        match self {
            LinkKind::Necessary => 1.1,
            LinkKind::Ideal => 1.0,
        }
    }

    /// Pull strength of the link force.
    pub fn strength(self) -> f64 {
        match self {
            LinkKind::Necessary => 0.5,
            LinkKind::Ideal => 0.25,
        }
    }

    /// Merge two kinds for the same pair: `necessary` always wins.
    pub fn merge(self, other: LinkKind) -> LinkKind {
        if self == LinkKind::Necessary || other == LinkKind::Necessary {
            LinkKind::Necessary
        } else {
            LinkKind::Ideal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::Necessary => "necessary",
            LinkKind::Ideal => "ideal",
        }
    }

    pub fn parse(s: &str) -> Option<LinkKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "necessary" => Some(LinkKind::Necessary),
            "ideal" => Some(LinkKind::Ideal),
            _ => None,
        }
    }
}

/// What `upsert_link` should do with a pair: create/upgrade a link, or drop it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinkChoice {
    Kind(LinkKind),
    None,
}

impl LinkChoice {
    /// Parse the wire form: `"necessary"`, `"ideal"` or `"none"`.
    pub fn parse(s: &str) -> Option<LinkChoice> {
        if s.trim().eq_ignore_ascii_case("none") {
            return Some(LinkChoice::None);
        }
        LinkKind::parse(s).map(LinkChoice::Kind)
    }
}

/// A circular, area-sized space.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// Declared area in m².
    pub area: f64,
    pub pos: Point,
    pub vel: Point,
    /// Pinned coordinate. Set while locked or while a drag owns the node.
    pub fixed: Option<Point>,
    pub locked: bool,
}

impl Node {
    /// Move the node, keeping any pin in step with the new position.
    pub fn place(&mut self, p: Point) {
        self.pos = p;
        if self.fixed.is_some() {
            self.fixed = Some(p);
        }
    }

    /// Snap back onto the pin, if any.
    pub fn snap_to_fixed(&mut self) {
        if let Some(f) = self.fixed {
            self.pos = f;
            self.vel = Point::ZERO;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: LinkKind,
}

impl Link {
    /// Unordered pair key, smaller id first.
    pub fn pair(&self) -> (NodeId, NodeId) {
        pair_key(self.source, self.target)
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.source == id || self.target == id
    }
}

/// Normalize an unordered node pair so `(a, b)` and `(b, a)` share a key.
pub fn pair_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}
