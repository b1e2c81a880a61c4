use kiriko_core::codec::{decode, encode};
use kiriko_core::edge_field::generate_edge_field;
use kiriko_core::model::PuzzleBoard;
use kiriko_core::seed::SeededRng;
use kiriko_core::snapshot::{
    PersistedPiece, ProgressRecord, PuzzleDescriptor, GENERATOR_VERSION,
};
use kiriko_core::view::ViewTransform;

fn build_descriptor(seed: u32) -> PuzzleDescriptor {
    let mut rng = SeededRng::new(seed);
    PuzzleDescriptor {
        puzzle_id: format!("puzzle-{seed:08x}"),
        seed,
        piece_count: 12,
        generator_version: GENERATOR_VERSION.to_string(),
        aspect_ratio: "4:3".to_string(),
        board: PuzzleBoard {
            width: 400.0,
            height: 300.0,
            padding: 12.0,
        },
        rows: 3,
        cols: 4,
        seams: generate_edge_field(3, 4, &mut rng),
    }
}

#[test]
fn descriptor_round_trips() {
    let descriptor = build_descriptor(808);
    let bytes = encode(&descriptor).unwrap();
    let decoded: PuzzleDescriptor = decode(&bytes).unwrap();
    assert_eq!(decoded, descriptor);
}

#[test]
fn progress_record_round_trips() {
    let record = ProgressRecord {
        puzzle_id: "puzzle-00000001".to_string(),
        pieces: vec![
            PersistedPiece {
                cell_index: 0,
                x: 12.5,
                y: -3.0,
                rotation: 1.5707964,
                z_index: 4,
                cluster_id: Some(0),
            },
            PersistedPiece {
                cell_index: 1,
                x: 120.0,
                y: 44.0,
                rotation: 0.0,
                z_index: 2,
                cluster_id: None,
            },
        ],
        clusters: vec![0, 0, 2, 2],
        view: ViewTransform {
            scale: 1.25,
            tx: -40.0,
            ty: 16.0,
        },
        last_saved_at: 123_456,
        completed_at: Some(99_000),
    };
    let bytes = encode(&record).unwrap();
    let decoded: ProgressRecord = decode(&bytes).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn corrupt_bytes_decode_to_none() {
    let descriptor = build_descriptor(11);
    let mut bytes = encode(&descriptor).unwrap();
    bytes.truncate(bytes.len() / 2);
    assert!(decode::<PuzzleDescriptor>(&bytes).is_none());
    assert!(decode::<ProgressRecord>(b"garbage").is_none());
}
