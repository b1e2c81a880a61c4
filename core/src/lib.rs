pub mod codec;
pub mod edge_field;
pub mod model;
pub mod persistence;
pub mod piece_path;
pub mod seed;
pub mod selection;
pub mod session;
pub mod snapping;
pub mod snapshot;
pub mod spatial_index;
pub mod topology;
pub mod union_find;
pub mod view;

pub use codec::{decode, encode};
pub use model::{
    CellTopology, EdgeSpec, PuzzleBoard, PuzzleTopology, Seam, SeamOrientation, SeamTab, Vec2,
};
pub use seed::SeededRng;
pub use session::{PieceRuntime, PuzzleSession};
pub use snapshot::{
    GameSettings, PersistedPiece, ProgressRecord, ProgressSnapshot, PuzzleDescriptor,
    GENERATOR_VERSION,
};
pub use topology::{build_puzzle_topology, build_topology_from_seams, compute_grid_spec, GridSpec};
pub use view::ViewTransform;
