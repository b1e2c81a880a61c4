use crate::model::{normalize_angle, rotate_vec, PuzzleBoard, PuzzleTopology, Vec2};
use crate::piece_path::PieceGeometry;
use crate::seed::SeededRng;
use crate::selection::{hit_test_pieces, SelectionState};
use crate::snapping::{
    build_neighbor_graph, find_snap_candidate, piece_aabb, NeighborGraph, SnapOptions, SnapPiece,
    SnapResult,
};
use crate::snapshot::{GameSettings, PersistedPiece, ProgressSnapshot};
use crate::spatial_index::SpatialIndex;
use crate::union_find::UnionFind;
use crate::view::{fit_view_to_board, zoom_at, ViewTransform, MAX_SCALE, MIN_SCALE};

const SPATIAL_CELL_FACTOR: f32 = 1.25;
const SCATTER_BUFFER_RATIO: f32 = 0.25;
const ROTATION_TOLERANCE_COARSE_DEG: f32 = 12.0;
const ROTATION_TOLERANCE_FINE_DEG: f32 = 6.0;

/// Live pose of one piece. `(x, y)` is the center of the piece's padded
/// bounding box; `anchor_offset` points from there to the cell center,
/// in the piece's unrotated frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PieceRuntime {
    pub cell_index: u32,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub width: f32,
    pub height: f32,
    pub anchor_offset: Vec2,
    pub cluster_id: u32,
    pub z_index: u32,
    pub is_dragging: bool,
}

/// The assembly engine: owns piece poses, cluster membership, selection
/// and the view, and drives scatter, drag, rotate, snap and restore.
pub struct PuzzleSession {
    topology: PuzzleTopology,
    board: PuzzleBoard,
    cell_width: f32,
    cell_height: f32,
    settings: GameSettings,
    pieces: Vec<PieceRuntime>,
    union_find: UnionFind,
    spatial: SpatialIndex,
    neighbor_graph: NeighborGraph,
    selection: SelectionState,
    active_cluster: Option<u32>,
    z_counter: u32,
    cluster_count: usize,
    completed_at: Option<u64>,
    view: ViewTransform,
}

impl PuzzleSession {
    /// Scatters every piece across the padded board with the seeded RNG.
    /// Per piece the draw order is fixed (x, y, then rotation step when
    /// rotation is enabled) so a seed always yields the same layout.
    pub fn new(
        topology: PuzzleTopology,
        board: PuzzleBoard,
        settings: GameSettings,
        geometry: &[PieceGeometry],
        seed: u32,
    ) -> Self {
        assert!(topology.rows >= 1 && topology.cols >= 1, "empty grid");
        let total = (topology.rows * topology.cols) as usize;
        assert_eq!(geometry.len(), total, "geometry count mismatch");

        let cell_width = board.width / topology.cols as f32;
        let cell_height = board.height / topology.rows as f32;
        let buffer = board.padding * SCATTER_BUFFER_RATIO;
        let step_rad = settings.rotation_step_deg.to_radians();
        let steps = if settings.rotation_enabled && step_rad > 0.0 {
            ((std::f32::consts::TAU / step_rad).round() as u32).max(1)
        } else {
            1
        };

        let mut rng = SeededRng::new(seed);
        let mut pieces: Vec<PieceRuntime> = Vec::with_capacity(total);
        for (order, geom) in geometry.iter().enumerate() {
            let target_x = rng.next_range(-buffer, board.width + buffer);
            let target_y = rng.next_range(-buffer, board.height + buffer);
            let rotation = if settings.rotation_enabled {
                normalize_angle(rng.next_int(steps) as f32 * step_rad)
            } else {
                0.0
            };

            let row = geom.cell_index / topology.cols;
            let col = geom.cell_index % topology.cols;
            let cell_center = Vec2::new(
                (col as f32 + 0.5) * cell_width,
                (row as f32 + 0.5) * cell_height,
            );
            let bbox_center = Vec2::new(
                geom.offset_x + geom.width / 2.0,
                geom.offset_y + geom.height / 2.0,
            );
            let anchor_offset = Vec2::new(
                cell_center.x - bbox_center.x,
                cell_center.y - bbox_center.y,
            );

            let radius = geom.width.hypot(geom.height) / 2.0;
            let x = clamp_center(target_x, radius, board.width, board.padding);
            let y = clamp_center(target_y, radius, board.height, board.padding);

            pieces.push(PieceRuntime {
                cell_index: geom.cell_index,
                x,
                y,
                rotation,
                width: geom.width,
                height: geom.height,
                anchor_offset,
                cluster_id: geom.cell_index,
                z_index: order as u32,
                is_dragging: false,
            });
        }
        pieces.sort_by_key(|piece| piece.cell_index);

        let neighbor_graph = build_neighbor_graph(&topology);
        let spatial = SpatialIndex::new(cell_width.max(cell_height) * SPATIAL_CELL_FACTOR);
        let mut session = Self {
            topology,
            board,
            cell_width,
            cell_height,
            settings,
            pieces,
            union_find: UnionFind::new(total),
            spatial,
            neighbor_graph,
            selection: SelectionState::default(),
            active_cluster: None,
            z_counter: total as u32,
            cluster_count: total,
            completed_at: None,
            view: ViewTransform::identity(),
        };
        session.refresh_spatial_index();
        session
    }

    pub fn pieces(&self) -> &[PieceRuntime] {
        &self.pieces
    }

    pub fn board(&self) -> &PuzzleBoard {
        &self.board
    }

    pub fn topology(&self) -> &PuzzleTopology {
        &self.topology
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    pub fn is_solved(&self) -> bool {
        !self.pieces.is_empty() && self.cluster_count <= 1
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn set_view(&mut self, view: ViewTransform) {
        self.view = view;
    }

    pub fn zoom_at(&mut self, screen: Vec2, factor: f32) {
        self.view = zoom_at(self.view, screen, factor);
    }

    pub fn fit_to_container(&mut self, container_width: f32, container_height: f32) {
        self.view = fit_view_to_board(&self.board, container_width, container_height);
    }

    /// Hit-tests a world-space point and updates the selection. Returns
    /// the picked piece, if any.
    pub fn select_at(&mut self, point: Vec2) -> Option<u32> {
        match hit_test_pieces(&self.pieces, point) {
            Some(id) => {
                let cluster = self.cluster_of(id);
                self.selection = SelectionState::select(id, cluster);
                Some(id)
            }
            None => {
                self.selection.clear();
                None
            }
        }
    }

    /// Starts a drag on the piece's whole cluster: the cluster is raised
    /// above everything else and marked as dragging.
    pub fn begin_drag(&mut self, piece_id: u32) -> bool {
        let Some(index) = self.piece_index(piece_id) else {
            return false;
        };
        let cluster = self.pieces[index].cluster_id;
        let mut members: Vec<usize> = (0..self.pieces.len())
            .filter(|&i| self.pieces[i].cluster_id == cluster)
            .collect();
        members.sort_by_key(|&i| self.pieces[i].z_index);
        for i in members {
            self.pieces[i].z_index = self.z_counter;
            self.pieces[i].is_dragging = true;
            self.z_counter += 1;
        }
        self.active_cluster = Some(cluster);
        self.selection = SelectionState::select(piece_id, cluster);
        true
    }

    /// Moves the active cluster by a world-space delta, keeping every
    /// member inside the padded board.
    pub fn drag_by(&mut self, delta: Vec2) {
        let Some(cluster) = self.active_cluster else {
            return;
        };
        for piece in &mut self.pieces {
            if piece.cluster_id == cluster {
                piece.x += delta.x;
                piece.y += delta.y;
            }
        }
        self.clamp_cluster(cluster);
        self.update_spatial_for_cluster(cluster);
    }

    /// Ends the drag and attempts a snap against topological neighbors.
    /// On success the clusters are merged and the result is returned.
    pub fn end_drag(&mut self) -> Option<SnapResult> {
        let cluster = self.active_cluster.take()?;
        for piece in &mut self.pieces {
            if piece.cluster_id == cluster {
                piece.is_dragging = false;
            }
        }
        self.clamp_cluster(cluster);
        self.update_spatial_for_cluster(cluster);
        self.attempt_snap(cluster)
    }

    /// Rotates the selected cluster by `delta` radians about its centroid.
    /// No-op while rotation is disabled in settings.
    pub fn rotate_active(&mut self, delta: f32) {
        if !self.settings.rotation_enabled {
            return;
        }
        let Some(cluster) = self.selection.cluster else {
            return;
        };
        let members: Vec<usize> = (0..self.pieces.len())
            .filter(|&i| self.pieces[i].cluster_id == cluster)
            .collect();
        if members.is_empty() {
            return;
        }
        let count = members.len() as f32;
        let centroid = members.iter().fold(Vec2::ZERO, |acc, &i| {
            Vec2::new(acc.x + self.pieces[i].x, acc.y + self.pieces[i].y)
        });
        let centroid = Vec2::new(centroid.x / count, centroid.y / count);
        for &i in &members {
            let piece = &mut self.pieces[i];
            let offset = Vec2::new(piece.x - centroid.x, piece.y - centroid.y);
            let rotated = rotate_vec(offset, delta);
            piece.x = centroid.x + rotated.x;
            piece.y = centroid.y + rotated.y;
            piece.rotation = normalize_angle(piece.rotation + delta);
        }
        self.clamp_cluster(cluster);
        self.update_spatial_for_cluster(cluster);
    }

    /// Builds a progress snapshot, stamping the completion time the first
    /// time the puzzle is observed solved.
    pub fn progress_snapshot(&mut self, now_ms: u64) -> ProgressSnapshot {
        if self.is_solved() && self.completed_at.is_none() {
            self.completed_at = Some(now_ms);
        }
        let pieces = self
            .pieces
            .iter()
            .map(|piece| PersistedPiece {
                cell_index: piece.cell_index,
                x: piece.x,
                y: piece.y,
                rotation: piece.rotation,
                z_index: piece.z_index,
                cluster_id: Some(piece.cluster_id),
            })
            .collect();
        ProgressSnapshot {
            pieces,
            clusters: self.union_find.snapshot(),
            view: self.view,
            completed_at: self.completed_at,
        }
    }

    /// Applies a saved snapshot best-effort: entries that fail validation
    /// are dropped individually and the rest still restore. A snapshot
    /// whose cluster array is unusable falls back to rebuilding the
    /// union-find from per-piece cluster ids, or to singletons.
    pub fn restore(&mut self, snapshot: &ProgressSnapshot) {
        let total = self.pieces.len();
        let valid: Vec<&PersistedPiece> = snapshot
            .pieces
            .iter()
            .filter(|piece| {
                (piece.cell_index as usize) < total
                    && piece.x.is_finite()
                    && piece.y.is_finite()
                    && piece.rotation.is_finite()
            })
            .collect();
        if valid.is_empty() {
            return;
        }

        self.union_find = if snapshot.clusters.len() == total {
            UnionFind::from_parents(&snapshot.clusters)
        } else {
            rebuild_union_find(total, &valid)
        };

        for saved in &valid {
            let index = saved.cell_index as usize;
            let piece = &mut self.pieces[index];
            piece.x = saved.x;
            piece.y = saved.y;
            piece.rotation = normalize_angle(saved.rotation);
            piece.z_index = saved.z_index;
            piece.is_dragging = false;
        }
        for i in 0..self.pieces.len() {
            let root = self.union_find.find(i) as u32;
            self.pieces[i].cluster_id = root;
        }

        if snapshot.view.scale.is_finite()
            && snapshot.view.tx.is_finite()
            && snapshot.view.ty.is_finite()
            && snapshot.view.scale > 0.0
        {
            self.view = ViewTransform {
                scale: snapshot.view.scale.clamp(MIN_SCALE, MAX_SCALE),
                tx: snapshot.view.tx,
                ty: snapshot.view.ty,
            };
        }
        self.completed_at = snapshot.completed_at;
        self.z_counter = self
            .pieces
            .iter()
            .map(|piece| piece.z_index)
            .max()
            .map(|z| z + 1)
            .unwrap_or(0);
        self.selection.clear();
        self.active_cluster = None;
        self.clamp_all_clusters();
        self.refresh_spatial_index();
        self.recount_clusters();
    }

    pub fn completed_at(&self) -> Option<u64> {
        self.completed_at
    }

    fn attempt_snap(&mut self, cluster: u32) -> Option<SnapResult> {
        let snap_pieces: Vec<SnapPiece> = self
            .pieces
            .iter()
            .map(|piece| SnapPiece {
                cell_index: piece.cell_index,
                x: piece.x,
                y: piece.y,
                rotation: piece.rotation,
                width: piece.width,
                height: piece.height,
                cluster_id: piece.cluster_id,
                anchor_offset: piece.anchor_offset,
            })
            .collect();
        let options = SnapOptions {
            translation_tolerance: self.translation_tolerance(),
            rotation_tolerance_deg: self.rotation_tolerance_deg(),
            max_neighbor_distance: None,
        };
        let result = find_snap_candidate(
            &snap_pieces,
            cluster,
            &self.topology,
            self.cell_width,
            self.cell_height,
            &self.spatial,
            &self.neighbor_graph,
            &options,
        )?;

        for piece in &mut self.pieces {
            if piece.cluster_id == cluster {
                piece.x += result.delta_x;
                piece.y += result.delta_y;
            }
        }
        self.union_find
            .union(result.cell_index as usize, result.neighbor_cell as usize);
        for i in 0..self.pieces.len() {
            let root = self.union_find.find(i) as u32;
            self.pieces[i].cluster_id = root;
        }
        self.clamp_all_clusters();
        self.refresh_spatial_index();
        self.recount_clusters();
        self.selection.cluster = self
            .selection
            .piece
            .map(|id| self.cluster_of(id));
        Some(result)
    }

    fn translation_tolerance(&self) -> f32 {
        self.cell_width.min(self.cell_height) * self.settings.snapping_tolerance
    }

    fn rotation_tolerance_deg(&self) -> f32 {
        if self.settings.rotation_step_deg >= 45.0 {
            ROTATION_TOLERANCE_COARSE_DEG
        } else {
            ROTATION_TOLERANCE_FINE_DEG
        }
    }

    fn cluster_of(&self, piece_id: u32) -> u32 {
        self.piece_index(piece_id)
            .map(|i| self.pieces[i].cluster_id)
            .unwrap_or(piece_id)
    }

    fn piece_index(&self, piece_id: u32) -> Option<usize> {
        // Pieces are sorted by cell index at construction.
        let index = piece_id as usize;
        (index < self.pieces.len()).then_some(index)
    }

    // Shifts the whole cluster so every member's bounding circle stays
    // inside the padded board.
    fn clamp_cluster(&mut self, cluster: u32) {
        let mut delta_x: f32 = 0.0;
        let mut delta_y: f32 = 0.0;
        for piece in &self.pieces {
            if piece.cluster_id != cluster {
                continue;
            }
            let radius = piece.width.hypot(piece.height) / 2.0;
            let min_x = -self.board.padding + radius;
            let max_x = self.board.width + self.board.padding - radius;
            let min_y = -self.board.padding + radius;
            let max_y = self.board.height + self.board.padding - radius;
            if min_x <= max_x {
                if piece.x + delta_x < min_x {
                    delta_x = min_x - piece.x;
                }
                if piece.x + delta_x > max_x {
                    delta_x = max_x - piece.x;
                }
            }
            if min_y <= max_y {
                if piece.y + delta_y < min_y {
                    delta_y = min_y - piece.y;
                }
                if piece.y + delta_y > max_y {
                    delta_y = max_y - piece.y;
                }
            }
        }
        if delta_x != 0.0 || delta_y != 0.0 {
            for piece in &mut self.pieces {
                if piece.cluster_id == cluster {
                    piece.x += delta_x;
                    piece.y += delta_y;
                }
            }
        }
    }

    fn clamp_all_clusters(&mut self) {
        let mut clusters: Vec<u32> = self.pieces.iter().map(|piece| piece.cluster_id).collect();
        clusters.sort_unstable();
        clusters.dedup();
        for cluster in clusters {
            self.clamp_cluster(cluster);
        }
    }

    fn update_spatial_for_cluster(&mut self, cluster: u32) {
        for piece in &self.pieces {
            if piece.cluster_id == cluster {
                let bounds =
                    piece_aabb(piece.x, piece.y, piece.rotation, piece.width, piece.height);
                self.spatial.update(piece.cell_index, bounds);
            }
        }
    }

    fn refresh_spatial_index(&mut self) {
        self.spatial.clear();
        for piece in &self.pieces {
            let bounds = piece_aabb(piece.x, piece.y, piece.rotation, piece.width, piece.height);
            self.spatial.insert(piece.cell_index, bounds);
        }
    }

    fn recount_clusters(&mut self) {
        let mut roots: Vec<u32> = self.pieces.iter().map(|piece| piece.cluster_id).collect();
        roots.sort_unstable();
        roots.dedup();
        self.cluster_count = roots.len();
    }
}

fn clamp_center(value: f32, radius: f32, extent: f32, padding: f32) -> f32 {
    let min = -padding + radius;
    let max = extent + padding - radius;
    if min > max {
        return (min + max) / 2.0;
    }
    value.clamp(min, max)
}

// Reconstructs cluster membership from per-piece cluster ids when the
// saved parent array is missing or the wrong length.
fn rebuild_union_find(total: usize, pieces: &[&PersistedPiece]) -> UnionFind {
    let mut union_find = UnionFind::new(total.max(1));
    let mut groups: std::collections::HashMap<u32, usize> = std::collections::HashMap::new();
    for piece in pieces {
        let Some(cluster) = piece.cluster_id else {
            continue;
        };
        let cell = piece.cell_index as usize;
        if cell >= total {
            continue;
        }
        match groups.get(&cluster) {
            Some(&first) => {
                union_find.union(first, cell);
            }
            None => {
                groups.insert(cluster, cell);
            }
        }
    }
    union_find
}
