use rkyv::{Archive, Deserialize, Serialize};

use crate::model::{PuzzleBoard, Seam};
use crate::view::ViewTransform;

/// Bumped whenever generation semantics change, so stored puzzles stay
/// reproducible against the algorithm that created them.
pub const GENERATOR_VERSION: &str = "1.0.0";

pub const SNAPPING_TOLERANCE_DEFAULT: f32 = 0.08;
pub const ROTATION_STEP_DEFAULT_DEG: f32 = 90.0;
pub const BACKGROUND_OPACITY_DEFAULT: f32 = 0.35;
pub const PIECE_COUNT_DEFAULT: u32 = 100;
pub const ASPECT_RATIO_DEFAULT: &str = "1:1";

/// Read-only play settings supplied by the settings collaborator.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
pub struct GameSettings {
    pub snapping_tolerance: f32,
    pub rotation_enabled: bool,
    pub rotation_step_deg: f32,
    pub background_guide_opacity: f32,
    pub preferred_aspect_ratio: String,
    pub default_piece_count: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            snapping_tolerance: SNAPPING_TOLERANCE_DEFAULT,
            rotation_enabled: false,
            rotation_step_deg: ROTATION_STEP_DEFAULT_DEG,
            background_guide_opacity: BACKGROUND_OPACITY_DEFAULT,
            preferred_aspect_ratio: ASPECT_RATIO_DEFAULT.to_string(),
            default_piece_count: PIECE_COUNT_DEFAULT,
        }
    }
}

/// Everything needed to regenerate a puzzle byte-identical: the seam
/// list plus grid, seed and board metadata.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
pub struct PuzzleDescriptor {
    pub puzzle_id: String,
    pub seed: u32,
    pub piece_count: u32,
    pub generator_version: String,
    pub aspect_ratio: String,
    pub board: PuzzleBoard,
    pub rows: u32,
    pub cols: u32,
    pub seams: Vec<Seam>,
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
pub struct PersistedPiece {
    pub cell_index: u32,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub z_index: u32,
    pub cluster_id: Option<u32>,
}

/// Play state produced by the session on demand. `clusters` is the raw
/// union-find parent array, so restores reconstruct cluster membership
/// exactly without replaying snap history.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
pub struct ProgressSnapshot {
    pub pieces: Vec<PersistedPiece>,
    pub clusters: Vec<u32>,
    pub view: ViewTransform,
    pub completed_at: Option<u64>,
}

/// The record handed to the save collaborator.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
pub struct ProgressRecord {
    pub puzzle_id: String,
    pub pieces: Vec<PersistedPiece>,
    pub clusters: Vec<u32>,
    pub view: ViewTransform,
    pub last_saved_at: u64,
    pub completed_at: Option<u64>,
}
