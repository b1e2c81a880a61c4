use rkyv::{Archive, Deserialize, Serialize};

use crate::model::{PuzzleBoard, Vec2};

pub const MIN_SCALE: f32 = 0.2;
pub const MAX_SCALE: f32 = 5.0;
pub const WHEEL_ZOOM_SPEED: f32 = 0.0015;

/// Screen = world * scale + (tx, ty).
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
pub struct ViewTransform {
    pub scale: f32,
    pub tx: f32,
    pub ty: f32,
}

impl ViewTransform {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn world_to_screen(&self, point: Vec2) -> Vec2 {
        Vec2::new(point.x * self.scale + self.tx, point.y * self.scale + self.ty)
    }

    pub fn screen_to_world(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            (point.x - self.tx) / self.scale,
            (point.y - self.ty) / self.scale,
        )
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Zoom toward a fixed screen point: the world position under the cursor
/// stays under the cursor.
pub fn zoom_at(view: ViewTransform, screen: Vec2, factor: f32) -> ViewTransform {
    let scale = (view.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
    let world = view.screen_to_world(screen);
    ViewTransform {
        scale,
        tx: screen.x - world.x * scale,
        ty: screen.y - world.y * scale,
    }
}

/// Centers the padded board inside the container at the largest scale
/// that fits.
pub fn fit_view_to_board(
    board: &PuzzleBoard,
    container_width: f32,
    container_height: f32,
) -> ViewTransform {
    let content_width = board.width + board.padding * 2.0;
    let content_height = board.height + board.padding * 2.0;
    let scale = (container_width / content_width).min(container_height / content_height);
    let offset_x = (container_width - content_width * scale) / 2.0;
    let offset_y = (container_height - content_height * scale) / 2.0;
    ViewTransform {
        scale,
        tx: offset_x + board.padding * scale,
        ty: offset_y + board.padding * scale,
    }
}

/// Exponential wheel-to-zoom mapping; negative deltas zoom in.
pub fn wheel_zoom_factor(delta_y: f32) -> f32 {
    (-delta_y * WHEEL_ZOOM_SPEED).exp()
}
