use crate::model::Vec2;
use crate::session::PieceRuntime;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub piece: Option<u32>,
    pub cluster: Option<u32>,
}

impl SelectionState {
    pub fn select(piece: u32, cluster: u32) -> Self {
        Self {
            piece: Some(piece),
            cluster: Some(cluster),
        }
    }

    pub fn clear(&mut self) {
        self.piece = None;
        self.cluster = None;
    }

    pub fn is_selected(&self, piece: u32) -> bool {
        self.piece == Some(piece)
    }
}

/// Topmost piece (by z-index) whose rotated rectangle contains the point.
pub fn hit_test_pieces(pieces: &[PieceRuntime], point: Vec2) -> Option<u32> {
    let mut order: Vec<&PieceRuntime> = pieces.iter().collect();
    order.sort_by(|a, b| b.z_index.cmp(&a.z_index));
    order
        .into_iter()
        .find(|piece| {
            point_in_rotated_rect(
                point,
                Vec2::new(piece.x, piece.y),
                piece.rotation,
                piece.width,
                piece.height,
            )
        })
        .map(|piece| piece.cell_index)
}

pub fn point_in_rotated_rect(
    point: Vec2,
    center: Vec2,
    rotation: f32,
    width: f32,
    height: f32,
) -> bool {
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    let cos = (-rotation).cos();
    let sin = (-rotation).sin();
    let local_x = dx * cos - dy * sin;
    let local_y = dx * sin + dy * cos;
    local_x.abs() <= width / 2.0 && local_y.abs() <= height / 2.0
}
