use crate::model::{lerp_vec, Seam, SeamOrientation, SeamTab, Vec2};
use crate::seed::SeededRng;

pub const CONTROL_T1: f32 = 0.33;
pub const CONTROL_T2: f32 = 0.66;
pub const CONTROL_T_JITTER: f32 = 0.06;
pub const CONTROL_OFFSET_MIN: f32 = 0.7;
pub const CONTROL_OFFSET_MAX: f32 = 1.3;
pub const JITTER_MIN: f32 = 0.02;
pub const JITTER_MAX: f32 = 0.08;
pub const TAB_CENTER_JITTER: f32 = 0.12;
pub const TAB_CENTER_MIN: f32 = 0.35;
pub const TAB_CENTER_MAX: f32 = 0.65;
pub const TAB_AMPLITUDE_MIN: f32 = 0.18;
pub const TAB_AMPLITUDE_MAX: f32 = 0.28;
pub const TAB_WIDTH_MIN: f32 = 0.22;
pub const TAB_WIDTH_MAX: f32 = 0.36;

/// Synthesizes one seam per adjacent cell pair: first all vertical seams
/// in row-major order, then all horizontal ones. Seam ids follow that
/// ordering, so `rows * (cols - 1) + (rows - 1) * cols` seams total.
pub fn generate_edge_field(rows: u32, cols: u32, rng: &mut SeededRng) -> Vec<Seam> {
    let mut seams = Vec::new();
    let mut id = 0u32;

    for row in 0..rows {
        for col in 0..cols.saturating_sub(1) {
            seams.push(vertical_seam(id, row, col, cols, rng));
            id += 1;
        }
    }

    for row in 0..rows.saturating_sub(1) {
        for col in 0..cols {
            seams.push(horizontal_seam(id, row, col, cols, rng));
            id += 1;
        }
    }

    seams
}

fn vertical_seam(id: u32, row: u32, col: u32, cols: u32, rng: &mut SeededRng) -> Seam {
    let a_cell = row * cols + col;
    let b_cell = a_cell + 1;
    let p0 = Vec2::new(1.0, 0.0);
    let p3 = Vec2::new(1.0, 1.0);
    let (p1, p2, jitter) = control_points(p0, p3, rng, JitterAxis::X);

    Seam {
        id,
        a_cell,
        b_cell,
        orientation: SeamOrientation::Vertical,
        p0,
        p1,
        p2,
        p3,
        tab: random_tab(rng),
        jitter,
    }
}

fn horizontal_seam(id: u32, row: u32, col: u32, cols: u32, rng: &mut SeededRng) -> Seam {
    let a_cell = row * cols + col;
    let b_cell = a_cell + cols;
    let p0 = Vec2::new(0.0, 1.0);
    let p3 = Vec2::new(1.0, 1.0);
    let (p1, p2, jitter) = control_points(p0, p3, rng, JitterAxis::Y);

    Seam {
        id,
        a_cell,
        b_cell,
        orientation: SeamOrientation::Horizontal,
        p0,
        p1,
        p2,
        p3,
        tab: random_tab(rng),
        jitter,
    }
}

#[derive(Clone, Copy)]
enum JitterAxis {
    X,
    Y,
}

/// Places the two interior control points near t=0.33/0.66 along the
/// baseline with bounded random displacement perpendicular to it. The
/// clamps keep the curve from self-intersecting.
fn control_points(p0: Vec2, p3: Vec2, rng: &mut SeededRng, axis: JitterAxis) -> (Vec2, Vec2, f32) {
    let t1 = (CONTROL_T1 + rng.next_range(-CONTROL_T_JITTER, CONTROL_T_JITTER)).clamp(0.2, 0.45);
    let t2 = (CONTROL_T2 + rng.next_range(-CONTROL_T_JITTER, CONTROL_T_JITTER)).clamp(0.55, 0.8);
    let base1 = lerp_vec(p0, p3, t1);
    let base2 = lerp_vec(p0, p3, t2);
    let jitter = rng.next_range(JITTER_MIN, JITTER_MAX);
    let offset1 = rng.next_range(-jitter, jitter);
    let offset2 = rng.next_range(-jitter, jitter);

    match axis {
        JitterAxis::X => (
            Vec2::new(
                (base1.x + offset1).clamp(CONTROL_OFFSET_MIN, CONTROL_OFFSET_MAX),
                base1.y,
            ),
            Vec2::new(
                (base2.x + offset2).clamp(CONTROL_OFFSET_MIN, CONTROL_OFFSET_MAX),
                base2.y,
            ),
            jitter,
        ),
        JitterAxis::Y => (
            Vec2::new(
                base1.x,
                (base1.y + offset1).clamp(CONTROL_OFFSET_MIN, CONTROL_OFFSET_MAX),
            ),
            Vec2::new(
                base2.x,
                (base2.y + offset2).clamp(CONTROL_OFFSET_MIN, CONTROL_OFFSET_MAX),
            ),
            jitter,
        ),
    }
}

fn random_tab(rng: &mut SeededRng) -> SeamTab {
    let sign = if rng.next() < 0.5 { 1 } else { -1 };
    SeamTab {
        center_t: (0.5 + rng.next_range(-TAB_CENTER_JITTER, TAB_CENTER_JITTER))
            .clamp(TAB_CENTER_MIN, TAB_CENTER_MAX),
        amplitude: rng.next_range(TAB_AMPLITUDE_MIN, TAB_AMPLITUDE_MAX),
        width: rng.next_range(TAB_WIDTH_MIN, TAB_WIDTH_MAX),
        sign,
    }
}
