use std::collections::HashMap;

use crate::edge_field::generate_edge_field;
use crate::model::{CellEdges, CellTopology, EdgeSpec, PuzzleTopology, Seam, SeamOrientation};
use crate::seed::SeededRng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSpec {
    pub rows: u32,
    pub cols: u32,
}

/// Parses an aspect ratio written as `"w:h"`. Anything unparseable or
/// non-positive falls back to square.
pub fn parse_aspect_ratio(aspect_ratio: &str) -> f32 {
    let mut parts = aspect_ratio.split(':');
    let w = parts
        .next()
        .and_then(|part| part.trim().parse::<f32>().ok())
        .unwrap_or(0.0);
    let h = parts
        .next()
        .and_then(|part| part.trim().parse::<f32>().ok())
        .unwrap_or(0.0);
    if w <= 0.0 || h <= 0.0 || !w.is_finite() || !h.is_finite() {
        return 1.0;
    }
    w / h
}

/// Searches row counts from 1 to the target piece count, scoring each
/// candidate by piece-count error (weighted 10x) plus aspect error, and
/// keeps the strict minimum, so earlier (smaller-row) grids win ties.
pub fn compute_grid_spec(piece_count: u32, aspect_ratio: &str) -> GridSpec {
    let target = piece_count.max(1);
    let ratio = parse_aspect_ratio(aspect_ratio);
    let mut best = GridSpec {
        rows: 1,
        cols: (ratio.round() as u32).max(1),
    };
    let mut best_score = f32::INFINITY;

    for rows in 1..=target {
        let cols = ((rows as f32 * ratio).round() as u32).max(1);
        let count_delta = (rows as i64 * cols as i64 - target as i64).abs() as f32;
        let ratio_delta = (cols as f32 / rows as f32 - ratio).abs();
        let score = count_delta * 10.0 + ratio_delta;
        if score < best_score {
            best_score = score;
            best = GridSpec { rows, cols };
        }
    }

    best
}

pub fn build_puzzle_topology(
    piece_count: u32,
    aspect_ratio: &str,
    rng: &mut SeededRng,
) -> PuzzleTopology {
    let grid = compute_grid_spec(piece_count, aspect_ratio);
    let seams = generate_edge_field(grid.rows, grid.cols, rng);
    build_topology_from_seams(grid.rows, grid.cols, seams)
}

/// Derives per-cell edge specs from the seam list. Lookup misses resolve
/// to outer edges rather than failing, so partial seam lists still
/// produce a usable (if degenerate) topology.
pub fn build_topology_from_seams(rows: u32, cols: u32, seams: Vec<Seam>) -> PuzzleTopology {
    if rows == 0 || cols == 0 {
        return PuzzleTopology {
            rows,
            cols,
            seams,
            cells: Vec::new(),
        };
    }

    let maps = SeamMaps::build(&seams, cols);
    let mut cells = Vec::with_capacity((rows * cols) as usize);

    for row in 0..rows {
        for col in 0..cols {
            let index = row * cols + col;
            let edges = CellEdges {
                top: resolve_top(row, col, &seams, &maps),
                right: resolve_right(row, col, cols, &seams, &maps),
                bottom: resolve_bottom(row, col, rows, &seams, &maps),
                left: resolve_left(row, col, &seams, &maps),
            };
            cells.push(CellTopology {
                row,
                col,
                index,
                edges,
            });
        }
    }

    PuzzleTopology {
        rows,
        cols,
        seams,
        cells,
    }
}

struct SeamMaps {
    vertical: HashMap<(u32, u32), usize>,
    horizontal: HashMap<(u32, u32), usize>,
}

impl SeamMaps {
    fn build(seams: &[Seam], cols: u32) -> Self {
        let mut vertical = HashMap::new();
        let mut horizontal = HashMap::new();
        for (idx, seam) in seams.iter().enumerate() {
            let row = seam.a_cell / cols;
            let col = seam.a_cell % cols;
            match seam.orientation {
                SeamOrientation::Vertical => {
                    vertical.insert((col, row), idx);
                }
                SeamOrientation::Horizontal => {
                    horizontal.insert((col, row), idx);
                }
            }
        }
        Self {
            vertical,
            horizontal,
        }
    }
}

fn resolve_top(row: u32, col: u32, seams: &[Seam], maps: &SeamMaps) -> EdgeSpec {
    if row == 0 {
        return outer_edge(SeamOrientation::Horizontal);
    }
    match maps.horizontal.get(&(col, row - 1)) {
        Some(&idx) => seam_edge(&seams[idx]),
        None => outer_edge(SeamOrientation::Horizontal),
    }
}

fn resolve_right(row: u32, col: u32, cols: u32, seams: &[Seam], maps: &SeamMaps) -> EdgeSpec {
    if col == cols - 1 {
        return outer_edge(SeamOrientation::Vertical);
    }
    match maps.vertical.get(&(col, row)) {
        Some(&idx) => seam_edge(&seams[idx]),
        None => outer_edge(SeamOrientation::Vertical),
    }
}

fn resolve_bottom(row: u32, col: u32, rows: u32, seams: &[Seam], maps: &SeamMaps) -> EdgeSpec {
    if row == rows - 1 {
        return outer_edge(SeamOrientation::Horizontal);
    }
    match maps.horizontal.get(&(col, row)) {
        Some(&idx) => seam_edge(&seams[idx]),
        None => outer_edge(SeamOrientation::Horizontal),
    }
}

fn resolve_left(row: u32, col: u32, seams: &[Seam], maps: &SeamMaps) -> EdgeSpec {
    if col == 0 {
        return outer_edge(SeamOrientation::Vertical);
    }
    match maps.vertical.get(&(col - 1, row)) {
        Some(&idx) => seam_edge(&seams[idx]),
        None => outer_edge(SeamOrientation::Vertical),
    }
}

fn outer_edge(orientation: SeamOrientation) -> EdgeSpec {
    EdgeSpec {
        seam_id: None,
        orientation,
        is_outer: true,
        sign: 1,
    }
}

// Both sides of a seam carry the tab sign unchanged; the path builder
// interprets it together with traversal direction, never per side.
fn seam_edge(seam: &Seam) -> EdgeSpec {
    EdgeSpec {
        seam_id: Some(seam.id),
        orientation: seam.orientation,
        is_outer: false,
        sign: seam.tab.sign,
    }
}
