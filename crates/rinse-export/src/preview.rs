//! Preview renderers: thumbnails, a contact sheet of every candidate with
//! the selection highlighted, and a source-over-selection comparison.
//!
//! The contact sheet is composed in a `tiny-skia` pixmap and converted
//! to a straight-alpha [`RgbaImage`] at the end.

use image::imageops::FilterType;
use image::{Rgb, Rgba, RgbaImage};
use rinse_pipeline::{Candidate, RgbImage};
use tiny_skia::{
    Color, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

/// Thumbnail box width on the contact sheet.
pub const THUMB_WIDTH: u32 = 200;

/// Thumbnail box height on the contact sheet.
pub const THUMB_HEIGHT: u32 = 150;

/// Width of the highlight frame around the selected candidate.
pub const FRAME_WIDTH: u32 = 5;

/// Box width for each image in the comparison view.
pub const COMPARE_WIDTH: u32 = 400;

/// Box height for each image in the comparison view.
pub const COMPARE_HEIGHT: u32 = 300;

/// Vertical gap between the two images of the comparison view.
pub const COMPARE_GAP: u32 = 10;

/// Highlight color (opaque red).
const HIGHLIGHT: [u8; 4] = [255, 0, 0, 255];

/// Scale `image` to fit inside `max_width x max_height`, preserving the
/// aspect ratio.
///
/// Never upscales: an image already inside the box is returned as-is.
/// Downscaling uses a Lanczos3 filter.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn thumbnail(image: &RgbImage, max_width: u32, max_height: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || (w <= max_width && h <= max_height) {
        return image.clone();
    }

    let scale = (f64::from(max_width) / f64::from(w)).min(f64::from(max_height) / f64::from(h));
    let tw = ((f64::from(w) * scale).round() as u32).clamp(1, max_width.max(1));
    let th = ((f64::from(h) * scale).round() as u32).clamp(1, max_height.max(1));

    image::imageops::resize(image, tw, th, FilterType::Lanczos3)
}

/// Render all candidates as thumbnails in a single row.
///
/// Each candidate gets a cell of `THUMB_WIDTH x THUMB_HEIGHT` plus a
/// `FRAME_WIDTH` margin on every side; the thumbnail is centred in its
/// cell. The cell at `selected` is outlined in red. An out-of-range or
/// absent `selected` draws no frame.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn contact_sheet(candidates: &[Candidate], selected: Option<usize>) -> RgbaImage {
    let cell_w = THUMB_WIDTH + 2 * FRAME_WIDTH;
    let cell_h = THUMB_HEIGHT + 2 * FRAME_WIDTH;
    let width = cell_w * candidates.len() as u32;
    let height = cell_h;

    let Some(mut pixmap) = Pixmap::new(width, height) else {
        return RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    };
    pixmap.fill(Color::WHITE);

    for (i, candidate) in candidates.iter().enumerate() {
        let thumb = thumbnail(&candidate.image, THUMB_WIDTH, THUMB_HEIGHT);
        let Some(thumb_pixmap) = rgb_to_pixmap(&thumb) else {
            continue;
        };
        let cell_x = cell_w * i as u32;
        let x = cell_x + FRAME_WIDTH + (THUMB_WIDTH - thumb.width()) / 2;
        let y = FRAME_WIDTH + (THUMB_HEIGHT - thumb.height()) / 2;
        pixmap.draw_pixmap(
            x as i32,
            y as i32,
            thumb_pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    if let Some(index) = selected.filter(|&i| i < candidates.len()) {
        stroke_frame(&mut pixmap, cell_w * index as u32, cell_w, cell_h);
    }

    pixmap_to_rgba(&pixmap)
}

/// Stack the source above the selected candidate, each fitted into
/// `COMPARE_WIDTH x COMPARE_HEIGHT` and centred horizontally on a white
/// background.
#[must_use]
pub fn side_by_side(source: &RgbImage, selected: &RgbImage) -> RgbImage {
    let top = thumbnail(source, COMPARE_WIDTH, COMPARE_HEIGHT);
    let bottom = thumbnail(selected, COMPARE_WIDTH, COMPARE_HEIGHT);

    let width = top.width().max(bottom.width());
    let height = top.height() + COMPARE_GAP + bottom.height();
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    let top_x = i64::from((width - top.width()) / 2);
    let bottom_x = i64::from((width - bottom.width()) / 2);
    let bottom_y = i64::from(top.height() + COMPARE_GAP);
    image::imageops::overlay(&mut canvas, &top, top_x, 0);
    image::imageops::overlay(&mut canvas, &bottom, bottom_x, bottom_y);
    canvas
}

/// Outline the cell starting at `cell_x` with a `FRAME_WIDTH` red stroke
/// lying entirely inside the cell.
#[allow(clippy::cast_precision_loss)]
fn stroke_frame(pixmap: &mut Pixmap, cell_x: u32, cell_w: u32, cell_h: u32) {
    let half = FRAME_WIDTH as f32 / 2.0;
    let Some(rect) = Rect::from_xywh(
        cell_x as f32 + half,
        half,
        (cell_w - FRAME_WIDTH) as f32,
        (cell_h - FRAME_WIDTH) as f32,
    ) else {
        return;
    };
    let path = PathBuilder::from_rect(rect);

    let stroke = Stroke {
        width: FRAME_WIDTH as f32,
        ..Stroke::default()
    };

    let mut paint = Paint::default();
    let [r, g, b, a] = HIGHLIGHT;
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = false;

    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

/// Wrap an opaque RGB raster in a pixmap.
///
/// Opaque pixels are identical in premultiplied and straight form.
fn rgb_to_pixmap(image: &RgbImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let data = image
        .pixels()
        .flat_map(|p| [p.0[0], p.0[1], p.0[2], 255])
        .collect();
    Pixmap::from_vec(data, size)
}

/// Convert a pixmap (premultiplied RGBA) to an `RgbaImage` (straight RGBA).
#[allow(clippy::cast_possible_truncation)]
fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let data = pixmap.data();
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (i, pixel) in img.pixels_mut().enumerate() {
        let off = i * 4;
        let a = data[off + 3];
        if a == 0 {
            *pixel = Rgba([0, 0, 0, 0]);
        } else {
            let r = u16::from(data[off]) * 255 / u16::from(a);
            let g = u16::from(data[off + 1]) * 255 / u16::from(a);
            let b = u16::from(data[off + 2]) * 255 / u16::from(a);
            *pixel = Rgba([r as u8, g as u8, b as u8, a]);
        }
    }
    img
}
