use rkyv::{Archive, Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
}

pub fn lerp_vec(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

pub fn rotate_vec(v: Vec2, angle: f32) -> Vec2 {
    let cos = angle.cos();
    let sin = angle.sin();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Wraps an angle in radians into (-PI, PI].
pub fn normalize_angle(angle: f32) -> f32 {
    let tau = std::f32::consts::TAU;
    let mut next = angle % tau;
    if next > std::f32::consts::PI {
        next -= tau;
    }
    if next < -std::f32::consts::PI {
        next += tau;
    }
    next
}

/// Minimal angular distance between two angles, always in [0, PI].
pub fn angle_distance(a: f32, b: f32) -> f32 {
    let mut diff = (a - b).abs() % std::f32::consts::TAU;
    if diff > std::f32::consts::PI {
        diff = std::f32::consts::TAU - diff;
    }
    diff
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum SeamOrientation {
    Horizontal,
    Vertical,
}

/// The interlocking protrusion carried by a seam. `sign` is +1 or -1,
/// chosen once at generation time and never mutated; it selects which
/// side of the seam the knob bulges toward.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct SeamTab {
    pub center_t: f32,
    pub amplitude: f32,
    pub width: f32,
    pub sign: i8,
}

/// A cubic Bezier boundary curve shared by exactly two adjacent cells.
/// Control points live in unit-square coordinates relative to `a_cell`'s
/// origin: vertical seams run down the shared right edge (p0=(1,0),
/// p3=(1,1)), horizontal seams along the shared bottom edge (p0=(0,1),
/// p3=(1,1)).
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
pub struct Seam {
    pub id: u32,
    pub a_cell: u32,
    pub b_cell: u32,
    pub orientation: SeamOrientation,
    pub p0: Vec2,
    pub p1: Vec2,
    pub p2: Vec2,
    pub p3: Vec2,
    pub tab: SeamTab,
    pub jitter: f32,
}

/// Per-cell, per-side edge descriptor. Outer (grid boundary) edges have
/// no seam and sign +1. Interior edges carry the seam's tab sign on both
/// sides of the seam; the path builder resolves the direction of the
/// protrusion from sign plus traversal orientation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct EdgeSpec {
    pub seam_id: Option<u32>,
    pub orientation: SeamOrientation,
    pub is_outer: bool,
    pub sign: i8,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct CellEdges {
    pub top: EdgeSpec,
    pub right: EdgeSpec,
    pub bottom: EdgeSpec,
    pub left: EdgeSpec,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct CellTopology {
    pub row: u32,
    pub col: u32,
    pub index: u32,
    pub edges: CellEdges,
}

/// The authoritative geometric description of a puzzle. Immutable once
/// built; pieces regenerate byte-identical from `{rows, cols, seams}`.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
pub struct PuzzleTopology {
    pub rows: u32,
    pub cols: u32,
    pub seams: Vec<Seam>,
    pub cells: Vec<CellTopology>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct PuzzleBoard {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
}
