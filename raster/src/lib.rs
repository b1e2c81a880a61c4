use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use thiserror::Error;

use kiriko_core::model::{PuzzleTopology, Vec2};
use kiriko_core::piece_path::{
    piece_world_points, point_bounds, PieceGeometry, PADDING_RATIO, SAMPLES_PER_EDGE_DEFAULT,
};

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("failed to decode source image: {0}")]
    Decode(String),
    #[error("failed to encode piece image: {0}")]
    Encode(String),
    #[error("invalid geometry: {0}")]
    Geometry(String),
    #[error("source image has zero dimension: {width}x{height}")]
    Dimensions { width: u32, height: u32 },
}

/// Rendering knobs. `padding` and `stroke_width` default to values
/// derived from the cell size when left unset.
#[derive(Clone, Copy, Debug)]
pub struct RasterOptions {
    pub samples_per_edge: u32,
    pub oversample: u32,
    pub padding: Option<f32>,
    pub stroke_width: Option<f32>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            samples_per_edge: SAMPLES_PER_EDGE_DEFAULT,
            oversample: 2,
            padding: None,
            stroke_width: None,
        }
    }
}

/// One cut-out piece: an RGBA bitmap, its placement within the source
/// image, and the boundary polygon (in source-pixel space) it was cut
/// along.
pub struct PieceRaster {
    pub cell_index: u32,
    pub image: RgbaImage,
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub path: Vec<Vec2>,
}

impl PieceRaster {
    pub fn geometry(&self) -> PieceGeometry {
        PieceGeometry {
            cell_index: self.cell_index,
            width: self.width,
            height: self.height,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
        }
    }
}

pub fn load_rgba(bytes: &[u8]) -> Result<RgbaImage, RasterError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|err| RasterError::Decode(err.to_string()))?;
    Ok(decoded.to_rgba8())
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RasterError> {
    let mut bytes = Vec::new();
    image
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .map_err(|err| RasterError::Encode(err.to_string()))?;
    Ok(bytes)
}

/// Cuts the source image into one bitmap per cell. Pieces are rendered
/// oversampled, filled with the source pixels under their boundary
/// polygon, stroked with a dark bevel along the outline, then box-downsampled.
/// A piece whose polygon degenerates is logged and emitted blank so the
/// rest of the batch still renders.
pub fn rasterize_pieces(
    source: &RgbaImage,
    topology: &PuzzleTopology,
    options: &RasterOptions,
) -> Result<Vec<PieceRaster>, RasterError> {
    if source.width() == 0 || source.height() == 0 {
        return Err(RasterError::Dimensions {
            width: source.width(),
            height: source.height(),
        });
    }
    if topology.rows == 0 || topology.cols == 0 {
        return Err(RasterError::Geometry(format!(
            "grid {}x{} has no cells",
            topology.rows, topology.cols
        )));
    }

    let cell_width = source.width() as f32 / topology.cols as f32;
    let cell_height = source.height() as f32 / topology.rows as f32;
    let padding = options
        .padding
        .unwrap_or(cell_width.max(cell_height) * PADDING_RATIO);
    let stroke_width = options
        .stroke_width
        .unwrap_or((cell_width.min(cell_height) * 0.035).max(1.0));
    let oversample = options.oversample.max(1);
    let samples = options.samples_per_edge.max(1);

    let mut pieces = Vec::with_capacity(topology.cells.len());
    for cell in &topology.cells {
        let points = piece_world_points(cell, topology, cell_width, cell_height, samples);
        let (min_x, min_y, max_x, max_y) = point_bounds(&points);
        let width = (max_x - min_x + padding * 2.0).ceil();
        let height = (max_y - min_y + padding * 2.0).ceil();
        let offset_x = min_x - padding;
        let offset_y = min_y - padding;

        let image = match paint_piece(
            source, &points, width, height, offset_x, offset_y, oversample, stroke_width,
        ) {
            Some(image) => image,
            None => {
                log::warn!(
                    "cell {} produced a degenerate outline; emitting blank piece",
                    cell.index
                );
                RgbaImage::new(width.max(1.0) as u32, height.max(1.0) as u32)
            }
        };

        pieces.push(PieceRaster {
            cell_index: cell.index,
            image,
            width,
            height,
            offset_x,
            offset_y,
            path: points,
        });
    }
    Ok(pieces)
}

#[allow(clippy::too_many_arguments)]
fn paint_piece(
    source: &RgbaImage,
    world_points: &[Vec2],
    width: f32,
    height: f32,
    offset_x: f32,
    offset_y: f32,
    oversample: u32,
    stroke_width: f32,
) -> Option<RgbaImage> {
    if world_points.len() < 3 || width < 1.0 || height < 1.0 {
        return None;
    }
    let canvas_w = width as u32 * oversample;
    let canvas_h = height as u32 * oversample;
    let scale = oversample as f32;

    let polygon: Vec<Vec2> = world_points
        .iter()
        .map(|point| Vec2::new((point.x - offset_x) * scale, (point.y - offset_y) * scale))
        .collect();

    let mut canvas = RgbaImage::new(canvas_w, canvas_h);
    fill_polygon(&mut canvas, &polygon, |cx, cy| {
        let sx = offset_x + cx / scale;
        let sy = offset_y + cy / scale;
        if sx < 0.0 || sy < 0.0 {
            return None;
        }
        let (sx, sy) = (sx as u32, sy as u32);
        if sx >= source.width() || sy >= source.height() {
            return None;
        }
        let pixel = source.get_pixel(sx, sy);
        Some(Rgba([pixel[0], pixel[1], pixel[2], 255]))
    });

    // Inner line first, then a wider soft shade clipped to the piece.
    let inner = stroke_mask(canvas_w, canvas_h, &polygon, stroke_width * scale / 2.0);
    blend_mask(&mut canvas, &inner, [0.0, 0.0, 0.0, 0.25], false);
    let outer = stroke_mask(canvas_w, canvas_h, &polygon, stroke_width * scale * 1.1);
    blend_mask(&mut canvas, &outer, [0.0, 0.0, 0.0, 0.15], true);

    if oversample > 1 {
        canvas = image::imageops::resize(&canvas, width as u32, height as u32, FilterType::Triangle);
    }
    Some(canvas)
}

/// Even-odd scanline fill over pixel centers.
fn fill_polygon(
    canvas: &mut RgbaImage,
    polygon: &[Vec2],
    mut sample: impl FnMut(f32, f32) -> Option<Rgba<u8>>,
) {
    let width = canvas.width();
    let height = canvas.height();
    let mut crossings: Vec<f32> = Vec::new();

    for y in 0..height {
        let sample_y = y as f32 + 0.5;
        crossings.clear();
        for i in 0..polygon.len() {
            let a = polygon[i];
            let b = polygon[(i + 1) % polygon.len()];
            if (a.y > sample_y) != (b.y > sample_y) {
                let t = (sample_y - a.y) / (b.y - a.y);
                crossings.push(a.x + t * (b.x - a.x));
            }
        }
        crossings.sort_by(|p, q| p.total_cmp(q));
        for pair in crossings.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil().max(0.0) as u32;
            let end = (pair[1] - 0.5).floor().min(width as f32 - 1.0);
            if end < 0.0 {
                continue;
            }
            for x in start..=end as u32 {
                if let Some(pixel) = sample(x as f32 + 0.5, sample_y) {
                    canvas.put_pixel(x, y, pixel);
                }
            }
        }
    }
}

/// Boolean coverage of the polygon outline at the given radius, built by
/// stamping disks along each segment.
fn stroke_mask(width: u32, height: u32, polygon: &[Vec2], radius: f32) -> Vec<bool> {
    let mut mask = vec![false; (width * height) as usize];
    let radius = radius.max(0.5);
    let step = (radius * 0.5).max(0.25);

    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        let length = (b.x - a.x).hypot(b.y - a.y);
        let stamps = (length / step).ceil().max(1.0) as u32;
        for s in 0..=stamps {
            let t = s as f32 / stamps as f32;
            let cx = a.x + (b.x - a.x) * t;
            let cy = a.y + (b.y - a.y) * t;
            stamp_disk(&mut mask, width, height, cx, cy, radius);
        }
    }
    mask
}

fn stamp_disk(mask: &mut [bool], width: u32, height: u32, cx: f32, cy: f32, radius: f32) {
    let min_x = ((cx - radius).floor().max(0.0)) as u32;
    let max_x = ((cx + radius).ceil().min(width as f32 - 1.0).max(0.0)) as u32;
    let min_y = ((cy - radius).floor().max(0.0)) as u32;
    let max_y = ((cy + radius).ceil().min(height as f32 - 1.0).max(0.0)) as u32;
    let radius_sq = radius * radius;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= radius_sq {
                mask[(y * width + x) as usize] = true;
            }
        }
    }
}

/// Blends a premixed RGBA color over every masked pixel. With `clip` set
/// the blend only touches pixels that already carry coverage, so the
/// shade never grows the piece silhouette.
fn blend_mask(canvas: &mut RgbaImage, mask: &[bool], color: [f32; 4], clip: bool) {
    let width = canvas.width();
    for (i, covered) in mask.iter().enumerate() {
        if !covered {
            continue;
        }
        let x = i as u32 % width;
        let y = i as u32 / width;
        let dst = canvas.get_pixel_mut(x, y);
        if clip && dst[3] == 0 {
            continue;
        }
        let src_a = color[3];
        let dst_a = dst[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            continue;
        }
        for channel in 0..3 {
            let src_c = color[channel];
            let dst_c = dst[channel] as f32 / 255.0;
            let out = (src_c * src_a + dst_c * dst_a * (1.0 - src_a)) / out_a;
            dst[channel] = (out * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}
