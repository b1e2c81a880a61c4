use std::f32::consts::{FRAC_PI_2, PI, TAU};

use kiriko_core::model::{angle_distance, normalize_angle, Vec2};
use kiriko_core::seed::SeededRng;
use kiriko_core::selection::{hit_test_pieces, point_in_rotated_rect};
use kiriko_core::session::PieceRuntime;
use kiriko_core::snapping::{
    build_neighbor_graph, find_snap_candidate, piece_aabb, SnapOptions, SnapPiece,
};
use kiriko_core::spatial_index::{Aabb, SpatialIndex};
use kiriko_core::topology::build_puzzle_topology;
use kiriko_core::union_find::UnionFind;

fn snap_piece(cell_index: u32, x: f32, y: f32, cluster_id: u32) -> SnapPiece {
    SnapPiece {
        cell_index,
        x,
        y,
        rotation: 0.0,
        width: 100.0,
        height: 100.0,
        cluster_id,
        anchor_offset: Vec2::ZERO,
    }
}

fn indexed(pieces: &[SnapPiece]) -> SpatialIndex {
    let mut spatial = SpatialIndex::new(125.0);
    for piece in pieces {
        spatial.insert(
            piece.cell_index,
            piece_aabb(piece.x, piece.y, piece.rotation, piece.width, piece.height),
        );
    }
    spatial
}

fn default_options() -> SnapOptions {
    SnapOptions {
        translation_tolerance: 8.0,
        rotation_tolerance_deg: 12.0,
        max_neighbor_distance: None,
    }
}

#[test]
fn union_find_merges_and_counts() {
    let mut uf = UnionFind::new(6);
    assert!(!uf.connected(0, 1));
    uf.union(0, 1);
    uf.union(1, 2);
    assert!(uf.connected(0, 2));
    assert_eq!(uf.size_of(0), 3);
    assert_eq!(uf.size_of(4), 1);
    uf.union(3, 4);
    uf.union(0, 4);
    assert_eq!(uf.size_of(2), 5);
    assert!(!uf.connected(0, 5));
}

#[test]
fn union_find_restores_from_snapshot() {
    let mut uf = UnionFind::new(4);
    uf.union(0, 3);
    uf.union(1, 2);
    let mut restored = UnionFind::from_parents(&uf.snapshot());
    assert!(restored.connected(0, 3));
    assert!(restored.connected(1, 2));
    assert!(!restored.connected(0, 1));
}

#[test]
fn union_find_rejects_out_of_range_parents() {
    let mut uf = UnionFind::from_parents(&[0, 99, 1]);
    assert_eq!(uf.find(1), 1);
    assert!(uf.connected(1, 2));
    assert!(!uf.connected(0, 1));
}

#[test]
fn spatial_index_queries_overlapping_items() {
    let mut spatial = SpatialIndex::new(100.0);
    spatial.insert(
        1,
        Aabb {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 50.0,
            max_y: 50.0,
        },
    );
    spatial.insert(
        2,
        Aabb {
            min_x: 300.0,
            min_y: 300.0,
            max_x: 350.0,
            max_y: 350.0,
        },
    );
    let hits = spatial.query(&Aabb {
        min_x: 40.0,
        min_y: 40.0,
        max_x: 60.0,
        max_y: 60.0,
    });
    assert!(hits.contains(&1));
    assert!(!hits.contains(&2));

    spatial.update(
        2,
        Aabb {
            min_x: 45.0,
            min_y: 45.0,
            max_x: 95.0,
            max_y: 95.0,
        },
    );
    let hits = spatial.query(&Aabb {
        min_x: 40.0,
        min_y: 40.0,
        max_x: 60.0,
        max_y: 60.0,
    });
    assert!(hits.contains(&2));

    spatial.remove(1);
    assert!(spatial.bounds(1).is_none());
    let hits = spatial.query(&Aabb {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 10.0,
        max_y: 10.0,
    });
    assert!(!hits.contains(&1));
}

#[test]
fn angle_helpers_wrap_correctly() {
    assert!((normalize_angle(TAU + 0.25) - 0.25).abs() < 1e-5);
    assert!((normalize_angle(-PI - 0.5) - (PI - 0.5)).abs() < 1e-5);
    assert!((angle_distance(0.1, TAU - 0.1) - 0.2).abs() < 1e-5);
    assert!((angle_distance(FRAC_PI_2, -FRAC_PI_2) - PI).abs() < 1e-5);
}

#[test]
fn snap_accepts_alignment_inside_tolerance() {
    let mut rng = SeededRng::new(5);
    let topology = build_puzzle_topology(2, "2:1", &mut rng);
    assert_eq!((topology.rows, topology.cols), (1, 2));
    let graph = build_neighbor_graph(&topology);

    // Neighbor sits 104px right of the dragged piece; ideal is 100.
    let pieces = vec![snap_piece(0, 50.0, 50.0, 0), snap_piece(1, 154.0, 50.0, 1)];
    let spatial = indexed(&pieces);
    let result = find_snap_candidate(
        &pieces,
        0,
        &topology,
        100.0,
        100.0,
        &spatial,
        &graph,
        &default_options(),
    )
    .unwrap();
    assert_eq!(result.cell_index, 0);
    assert_eq!(result.neighbor_cell, 1);
    assert!((result.translation_error - 4.0).abs() < 1e-3);
    assert!((result.delta_x - 4.0).abs() < 1e-3);
    assert!(result.delta_y.abs() < 1e-3);
}

#[test]
fn snap_rejects_translation_outside_tolerance() {
    let mut rng = SeededRng::new(5);
    let topology = build_puzzle_topology(2, "2:1", &mut rng);
    let graph = build_neighbor_graph(&topology);
    let pieces = vec![snap_piece(0, 50.0, 50.0, 0), snap_piece(1, 170.0, 50.0, 1)];
    let spatial = indexed(&pieces);
    let result = find_snap_candidate(
        &pieces,
        0,
        &topology,
        100.0,
        100.0,
        &spatial,
        &graph,
        &default_options(),
    );
    assert!(result.is_none());
}

#[test]
fn snap_rejects_rotation_mismatch() {
    let mut rng = SeededRng::new(5);
    let topology = build_puzzle_topology(2, "2:1", &mut rng);
    let graph = build_neighbor_graph(&topology);
    let mut rotated = snap_piece(1, 152.0, 50.0, 1);
    rotated.rotation = FRAC_PI_2;
    let pieces = vec![snap_piece(0, 50.0, 50.0, 0), rotated];
    let spatial = indexed(&pieces);
    let result = find_snap_candidate(
        &pieces,
        0,
        &topology,
        100.0,
        100.0,
        &spatial,
        &graph,
        &default_options(),
    );
    assert!(result.is_none());
}

#[test]
fn snap_ignores_same_cluster_neighbors() {
    let mut rng = SeededRng::new(5);
    let topology = build_puzzle_topology(2, "2:1", &mut rng);
    let graph = build_neighbor_graph(&topology);
    let pieces = vec![snap_piece(0, 50.0, 50.0, 7), snap_piece(1, 152.0, 50.0, 7)];
    let spatial = indexed(&pieces);
    let result = find_snap_candidate(
        &pieces,
        7,
        &topology,
        100.0,
        100.0,
        &spatial,
        &graph,
        &default_options(),
    );
    assert!(result.is_none());
}

fn runtime_piece(cell_index: u32, x: f32, y: f32, rotation: f32, z_index: u32) -> PieceRuntime {
    PieceRuntime {
        cell_index,
        x,
        y,
        rotation,
        width: 100.0,
        height: 60.0,
        anchor_offset: Vec2::ZERO,
        cluster_id: cell_index,
        z_index,
        is_dragging: false,
    }
}

#[test]
fn hit_test_picks_topmost_piece() {
    let pieces = vec![
        runtime_piece(0, 100.0, 100.0, 0.0, 1),
        runtime_piece(1, 110.0, 100.0, 0.0, 5),
        runtime_piece(2, 400.0, 400.0, 0.0, 9),
    ];
    assert_eq!(hit_test_pieces(&pieces, Vec2::new(105.0, 100.0)), Some(1));
    assert_eq!(hit_test_pieces(&pieces, Vec2::new(60.0, 100.0)), Some(0));
    assert_eq!(hit_test_pieces(&pieces, Vec2::new(0.0, 0.0)), None);
}

#[test]
fn rotated_rect_hit_test_respects_rotation() {
    let center = Vec2::new(0.0, 0.0);
    // Unrotated: wide and short.
    assert!(point_in_rotated_rect(
        Vec2::new(45.0, 0.0),
        center,
        0.0,
        100.0,
        60.0
    ));
    assert!(!point_in_rotated_rect(
        Vec2::new(0.0, 45.0),
        center,
        0.0,
        100.0,
        60.0
    ));
    // Quarter turn swaps the extents.
    assert!(point_in_rotated_rect(
        Vec2::new(0.0, 45.0),
        center,
        FRAC_PI_2,
        100.0,
        60.0
    ));
    assert!(!point_in_rotated_rect(
        Vec2::new(45.0, 0.0),
        center,
        FRAC_PI_2,
        100.0,
        60.0
    ));
}
