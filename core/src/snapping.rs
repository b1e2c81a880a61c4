use std::collections::HashMap;

use crate::model::{angle_distance, rotate_vec, PuzzleTopology, SeamOrientation, Vec2};
use crate::spatial_index::{Aabb, SpatialIndex};

pub const MAX_NEIGHBOR_DISTANCE_FACTOR: f32 = 1.6;

/// Pose snapshot of one piece, as the snap scan sees it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapPiece {
    pub cell_index: u32,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub width: f32,
    pub height: f32,
    pub cluster_id: u32,
    pub anchor_offset: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeighborInfo {
    pub neighbor_cell: u32,
    pub seam_id: u32,
    pub orientation: SeamOrientation,
}

/// Topological adjacency, indexed by cell: one entry per seam endpoint
/// in each direction.
pub type NeighborGraph = Vec<Vec<NeighborInfo>>;

pub fn build_neighbor_graph(topology: &PuzzleTopology) -> NeighborGraph {
    let total = (topology.rows * topology.cols) as usize;
    let mut graph: NeighborGraph = vec![Vec::new(); total];
    for seam in &topology.seams {
        let a = seam.a_cell as usize;
        let b = seam.b_cell as usize;
        if a >= total || b >= total {
            continue;
        }
        graph[a].push(NeighborInfo {
            neighbor_cell: seam.b_cell,
            seam_id: seam.id,
            orientation: seam.orientation,
        });
        graph[b].push(NeighborInfo {
            neighbor_cell: seam.a_cell,
            seam_id: seam.id,
            orientation: seam.orientation,
        });
    }
    graph
}

#[derive(Clone, Copy, Debug)]
pub struct SnapOptions {
    pub translation_tolerance: f32,
    pub rotation_tolerance_deg: f32,
    pub max_neighbor_distance: Option<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapResult {
    pub cell_index: u32,
    pub neighbor_cell: u32,
    pub delta_x: f32,
    pub delta_y: f32,
    pub translation_error: f32,
    pub rotation_error: f32,
}

/// Scans the released cluster's topological neighbors for the alignment
/// with the smallest translation error inside both tolerances. Candidates
/// must belong to a different cluster, sit near enough to be plausible,
/// and pass the spatial-index broad phase. Returns None when nothing
/// qualifies, which is the normal outcome of most drags.
pub fn find_snap_candidate(
    pieces: &[SnapPiece],
    active_cluster_id: u32,
    topology: &PuzzleTopology,
    cell_width: f32,
    cell_height: f32,
    spatial: &SpatialIndex,
    graph: &NeighborGraph,
    options: &SnapOptions,
) -> Option<SnapResult> {
    let by_cell: HashMap<u32, &SnapPiece> =
        pieces.iter().map(|piece| (piece.cell_index, piece)).collect();
    let cluster_pieces: Vec<&SnapPiece> = pieces
        .iter()
        .filter(|piece| piece.cluster_id == active_cluster_id)
        .collect();
    if cluster_pieces.is_empty() {
        return None;
    }

    let cluster_bounds = compute_cluster_bounds(cluster_pieces.iter().copied());
    let query_bounds = cluster_bounds.expand(options.translation_tolerance);
    let nearby = spatial.query(&query_bounds);

    let rotation_tolerance = options.rotation_tolerance_deg.to_radians();
    let max_distance = options
        .max_neighbor_distance
        .unwrap_or(cell_width.max(cell_height) * MAX_NEIGHBOR_DISTANCE_FACTOR);

    let mut best: Option<SnapResult> = None;

    for piece in &cluster_pieces {
        let Some(neighbors) = graph.get(piece.cell_index as usize) else {
            continue;
        };
        for info in neighbors {
            let Some(neighbor) = by_cell.get(&info.neighbor_cell) else {
                continue;
            };
            if neighbor.cluster_id == active_cluster_id {
                continue;
            }
            if !nearby.contains(&neighbor.cell_index) {
                continue;
            }

            let rotation_error = angle_distance(piece.rotation, neighbor.rotation);
            if rotation_error > rotation_tolerance {
                continue;
            }

            let expected = cell_offset(
                piece.cell_index,
                neighbor.cell_index,
                topology.cols,
                cell_width,
                cell_height,
            );
            let rotated = rotate_vec(expected, piece.rotation);
            let piece_anchor = anchor_position(piece);
            let neighbor_anchor = anchor_position(neighbor);
            let dx = neighbor_anchor.x - (piece_anchor.x + rotated.x);
            let dy = neighbor_anchor.y - (piece_anchor.y + rotated.y);
            let translation_error = dx.hypot(dy);
            if translation_error > options.translation_tolerance {
                continue;
            }

            let center_distance = (neighbor.x - piece.x).hypot(neighbor.y - piece.y);
            if center_distance > max_distance {
                continue;
            }

            let better = match &best {
                Some(current) => translation_error < current.translation_error,
                None => true,
            };
            if better {
                best = Some(SnapResult {
                    cell_index: piece.cell_index,
                    neighbor_cell: neighbor.cell_index,
                    delta_x: dx,
                    delta_y: dy,
                    translation_error,
                    rotation_error,
                });
            }
        }
    }

    best
}

/// AABB of a rotated piece rectangle.
pub fn piece_aabb(x: f32, y: f32, rotation: f32, width: f32, height: f32) -> Aabb {
    let half_w = width / 2.0;
    let half_h = height / 2.0;
    let cos = rotation.cos();
    let sin = rotation.sin();
    let extent_x = (half_w * cos).abs() + (half_h * sin).abs();
    let extent_y = (half_w * sin).abs() + (half_h * cos).abs();
    Aabb {
        min_x: x - extent_x,
        min_y: y - extent_y,
        max_x: x + extent_x,
        max_y: y + extent_y,
    }
}

pub fn compute_cluster_bounds<'a>(pieces: impl Iterator<Item = &'a SnapPiece>) -> Aabb {
    let mut bounds = Aabb {
        min_x: f32::INFINITY,
        min_y: f32::INFINITY,
        max_x: f32::NEG_INFINITY,
        max_y: f32::NEG_INFINITY,
    };
    for piece in pieces {
        let piece_bounds = piece_aabb(piece.x, piece.y, piece.rotation, piece.width, piece.height);
        bounds.min_x = bounds.min_x.min(piece_bounds.min_x);
        bounds.min_y = bounds.min_y.min(piece_bounds.min_y);
        bounds.max_x = bounds.max_x.max(piece_bounds.max_x);
        bounds.max_y = bounds.max_y.max(piece_bounds.max_y);
    }
    if !bounds.min_x.is_finite() {
        return Aabb {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        };
    }
    bounds
}

fn cell_offset(
    cell_index: u32,
    neighbor_index: u32,
    cols: u32,
    cell_width: f32,
    cell_height: f32,
) -> Vec2 {
    let row = (cell_index / cols) as i64;
    let col = (cell_index % cols) as i64;
    let neighbor_row = (neighbor_index / cols) as i64;
    let neighbor_col = (neighbor_index % cols) as i64;
    Vec2::new(
        (neighbor_col - col) as f32 * cell_width,
        (neighbor_row - row) as f32 * cell_height,
    )
}

// Anchor = bbox center shifted by the rotated anchor offset, i.e. where
// the piece's true cell center currently sits in world space.
fn anchor_position(piece: &SnapPiece) -> Vec2 {
    let rotated = rotate_vec(piece.anchor_offset, piece.rotation);
    Vec2::new(piece.x + rotated.x, piece.y + rotated.y)
}
