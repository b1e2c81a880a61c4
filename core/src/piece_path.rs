use std::collections::HashMap;

use crate::model::{CellTopology, EdgeSpec, PuzzleTopology, Seam, SeamOrientation, Vec2};

pub const SAMPLES_PER_EDGE_DEFAULT: u32 = 28;
pub const PADDING_RATIO: f32 = 0.12;

const WAVE_PHASE_STEP: f32 = 0.618_033_99;
const WAVE_GAIN: f32 = 0.35;
const END_FADE_SPAN: f32 = 0.12;

/// Placement metadata of a rendered piece relative to the source image:
/// the padded axis-aligned bounds of its boundary polygon.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PieceGeometry {
    pub cell_index: u32,
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Builds the closed boundary polygon of a cell in unit-cell coordinates:
/// top, right, bottom, left edges concatenated with duplicate corner
/// samples dropped. Bottom and left run in reverse so the polygon winds
/// consistently.
pub fn build_piece_path_points(
    cell: &CellTopology,
    topology: &PuzzleTopology,
    samples_per_edge: u32,
) -> Vec<Vec2> {
    let samples = samples_per_edge.max(1);
    let seam_by_id: HashMap<u32, &Seam> =
        topology.seams.iter().map(|seam| (seam.id, seam)).collect();

    let top = edge_points(EdgeSide::Top, cell, topology, &seam_by_id, samples);
    let right = edge_points(EdgeSide::Right, cell, topology, &seam_by_id, samples);
    let bottom = edge_points(EdgeSide::Bottom, cell, topology, &seam_by_id, samples);
    let left = edge_points(EdgeSide::Left, cell, topology, &seam_by_id, samples);

    let mut points = top;
    points.extend(right.into_iter().skip(1));
    points.extend(bottom.into_iter().skip(1));
    points.extend(left.into_iter().skip(1));
    points
}

/// Same polygon in image-pixel space.
pub fn piece_world_points(
    cell: &CellTopology,
    topology: &PuzzleTopology,
    cell_width: f32,
    cell_height: f32,
    samples_per_edge: u32,
) -> Vec<Vec2> {
    build_piece_path_points(cell, topology, samples_per_edge)
        .into_iter()
        .map(|point| {
            Vec2::new(
                (cell.col as f32 + point.x) * cell_width,
                (cell.row as f32 + point.y) * cell_height,
            )
        })
        .collect()
}

/// Computes a piece's padded world-space bounds without rasterizing,
/// matching the surface the rasterizer would allocate for it.
pub fn piece_geometry(
    cell: &CellTopology,
    topology: &PuzzleTopology,
    cell_width: f32,
    cell_height: f32,
    padding: f32,
    samples_per_edge: u32,
) -> PieceGeometry {
    let points = piece_world_points(cell, topology, cell_width, cell_height, samples_per_edge);
    let (min_x, min_y, max_x, max_y) = point_bounds(&points);
    PieceGeometry {
        cell_index: cell.index,
        width: (max_x - min_x + padding * 2.0).ceil(),
        height: (max_y - min_y + padding * 2.0).ceil(),
        offset_x: min_x - padding,
        offset_y: min_y - padding,
    }
}

pub fn point_bounds(points: &[Vec2]) -> (f32, f32, f32, f32) {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }
    if !min_x.is_finite() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    (min_x, min_y, max_x, max_y)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EdgeSide {
    Top,
    Right,
    Bottom,
    Left,
}

fn edge_points(
    side: EdgeSide,
    cell: &CellTopology,
    topology: &PuzzleTopology,
    seam_by_id: &HashMap<u32, &Seam>,
    samples: u32,
) -> Vec<Vec2> {
    let edge = edge_for_side(cell, side);
    let reverse = matches!(side, EdgeSide::Bottom | EdgeSide::Left);

    let seam = match edge.seam_id {
        Some(id) if !edge.is_outer => seam_by_id.get(&id).copied(),
        _ => None,
    };

    let Some(seam) = seam else {
        return outer_edge_points(side, reverse);
    };

    let seam_points = sample_seam_points(seam, edge.sign, topology.cols, samples);
    let mut local: Vec<Vec2> = seam_points
        .into_iter()
        .map(|point| Vec2::new(point.x - cell.col as f32, point.y - cell.row as f32))
        .collect();
    if reverse {
        local.reverse();
    }
    local
}

fn edge_for_side(cell: &CellTopology, side: EdgeSide) -> EdgeSpec {
    match side {
        EdgeSide::Top => cell.edges.top,
        EdgeSide::Right => cell.edges.right,
        EdgeSide::Bottom => cell.edges.bottom,
        EdgeSide::Left => cell.edges.left,
    }
}

fn outer_edge_points(side: EdgeSide, reverse: bool) -> Vec<Vec2> {
    let mut points = match side {
        EdgeSide::Top => vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)],
        EdgeSide::Right => vec![Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)],
        EdgeSide::Bottom => vec![Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0)],
        EdgeSide::Left => vec![Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0)],
    };
    if reverse {
        points.reverse();
    }
    points
}

/// Samples a seam curve in grid coordinates (relative to the grid, with
/// the seam's A cell origin applied). The knob is a raised-cosine bump
/// plus a faint sine ripple; both are pushed along the curve's A-to-B
/// normal, flipped by the negated edge sign. End fades force the ripple
/// to zero at the corners, and the first and last samples are pinned to
/// the exact baseline endpoints so adjoining pieces close without gaps.
fn sample_seam_points(seam: &Seam, edge_sign: i8, cols: u32, samples: u32) -> Vec<Vec2> {
    let origin = cell_origin(seam.a_cell, cols);
    let phase = (seam.id as f32 * WAVE_PHASE_STEP) % 1.0;
    let mut points = Vec::with_capacity(samples as usize + 1);

    for i in 0..=samples {
        let t = i as f32 / samples as f32;
        let base = cubic_point(seam.p0, seam.p1, seam.p2, seam.p3, t);
        let tangent = cubic_tangent(seam.p0, seam.p1, seam.p2, seam.p3, t);
        let normal = normal_to_b(seam.orientation, tangent);
        let bump = knob_profile(t, seam.tab.center_t, seam.tab.width);
        let end_fade =
            smoothstep(0.0, END_FADE_SPAN, t) * smoothstep(0.0, END_FADE_SPAN, 1.0 - t);
        let wave = ((t + phase) * std::f32::consts::TAU).sin()
            * seam.jitter
            * WAVE_GAIN
            * end_fade
            * (0.2 + 0.8 * bump);
        let amount = seam.tab.amplitude * bump + wave;
        let offset = -(edge_sign as f32) * amount;
        points.push(Vec2::new(
            origin.x + base.x + normal.x * offset,
            origin.y + base.y + normal.y * offset,
        ));
    }

    let last = points.len() - 1;
    points[0] = Vec2::new(origin.x + seam.p0.x, origin.y + seam.p0.y);
    points[last] = Vec2::new(origin.x + seam.p3.x, origin.y + seam.p3.y);
    points
}

fn cell_origin(index: u32, cols: u32) -> Vec2 {
    Vec2::new((index % cols) as f32, (index / cols) as f32)
}

pub fn cubic_point(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    let uu = u * u;
    let tt = t * t;
    let uuu = uu * u;
    let ttt = tt * t;
    Vec2::new(
        uuu * p0.x + 3.0 * uu * t * p1.x + 3.0 * u * tt * p2.x + ttt * p3.x,
        uuu * p0.y + 3.0 * uu * t * p1.y + 3.0 * u * tt * p2.y + ttt * p3.y,
    )
}

pub fn cubic_tangent(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    Vec2::new(
        3.0 * u * u * (p1.x - p0.x) + 6.0 * u * t * (p2.x - p1.x) + 3.0 * t * t * (p3.x - p2.x),
        3.0 * u * u * (p1.y - p0.y) + 6.0 * u * t * (p2.y - p1.y) + 3.0 * t * t * (p3.y - p2.y),
    )
}

// Unit normal pointing from the A cell toward the B cell. The left-hand
// perpendicular of the tangent already faces B for horizontal seams;
// vertical seams need it negated.
fn normal_to_b(orientation: SeamOrientation, tangent: Vec2) -> Vec2 {
    let mut normal = Vec2::new(-tangent.y, tangent.x);
    let length = normal.length();
    let length = if length == 0.0 { 1.0 } else { length };
    normal = Vec2::new(normal.x / length, normal.y / length);
    match orientation {
        SeamOrientation::Vertical => Vec2::new(-normal.x, -normal.y),
        SeamOrientation::Horizontal => normal,
    }
}

/// Raised-cosine bump centered at `center_t`, zero outside the half-width.
fn knob_profile(t: f32, center_t: f32, width: f32) -> f32 {
    let half = width * 0.5;
    let distance = (t - center_t).abs();
    if distance >= half || half == 0.0 {
        return 0.0;
    }
    let normalized = distance / half;
    0.5 * (1.0 + (std::f32::consts::PI * normalized).cos())
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
