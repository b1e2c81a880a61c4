use proptest::prelude::*;

use kiriko_core::edge_field::generate_edge_field;
use kiriko_core::model::Vec2;
use kiriko_core::piece_path::build_piece_path_points;
use kiriko_core::seed::SeededRng;
use kiriko_core::topology::build_topology_from_seams;

const SAMPLES: u32 = 16;

// For a 1x2 grid the boundary of cell 0 is: top (2 points), then the
// shared seam down the right edge (SAMPLES more points). Recover the
// seam run from t=0 to t=1, in cell-local coordinates.
fn right_edge(points: &[Vec2]) -> Vec<Vec2> {
    let mut edge = vec![points[1]];
    edge.extend_from_slice(&points[2..2 + SAMPLES as usize]);
    edge
}

// Cell 1's boundary: top (2 points), right (1), bottom (1), then the
// shared seam traversed upward along the left edge. Reverse it back to
// the t=0..1 direction.
fn left_edge(points: &[Vec2]) -> Vec<Vec2> {
    let mut edge = vec![points[3]];
    edge.extend_from_slice(&points[4..4 + SAMPLES as usize]);
    edge.reverse();
    edge
}

proptest! {
    // The two pieces flanking a seam must trace the same curve, so the
    // knob of one is exactly the socket of the other.
    #[test]
    fn adjacent_pieces_share_the_seam_curve(seed in any::<u32>()) {
        let mut rng = SeededRng::new(seed);
        let seams = generate_edge_field(1, 2, &mut rng);
        let topology = build_topology_from_seams(1, 2, seams);

        let a = build_piece_path_points(&topology.cells[0], &topology, SAMPLES);
        let b = build_piece_path_points(&topology.cells[1], &topology, SAMPLES);

        let a_edge = right_edge(&a);
        let b_edge = left_edge(&b);
        prop_assert_eq!(a_edge.len(), b_edge.len());

        for (pa, pb) in a_edge.iter().zip(&b_edge) {
            // Cell 1 localizes the seam by shifting one cell left.
            prop_assert!((pa.x - (pb.x + 1.0)).abs() < 1e-4);
            prop_assert!((pa.y - pb.y).abs() < 1e-4);
        }
    }

    #[test]
    fn boundary_points_stay_near_the_unit_cell(seed in any::<u32>()) {
        let mut rng = SeededRng::new(seed);
        let seams = generate_edge_field(3, 3, &mut rng);
        let topology = build_topology_from_seams(3, 3, seams);

        for cell in &topology.cells {
            for point in build_piece_path_points(cell, &topology, SAMPLES) {
                prop_assert!((-0.5..=1.5).contains(&point.x));
                prop_assert!((-0.5..=1.5).contains(&point.y));
            }
        }
    }
}
