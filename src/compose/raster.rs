//! PNG preview: replays a draw-command list into an RGBA raster.
//!
//! The preview consumes the exact command sequence the PDF canvas consumes,
//! in the same order, so the two outputs always agree on layout. Page
//! coordinates are bottom-up points; the raster is top-down pixels, scaled
//! by a pixels-per-point factor.

use image::{Rgba, RgbaImage, RgbImage};
use rusttype::{point, Scale};

use crate::compose::DrawCommand;
use crate::error::{Error, Result};
use crate::font::{FontCatalog, FontFace};
use crate::{PageGeometry, Rgb};

/// Default preview resolution: 2 pixels per point (144 dpi)
pub const PREVIEW_SCALE: f64 = 2.0;

fn blend(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgb, alpha: f64) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let mix = |src: u8, dst: u8| (src as f64 * alpha + dst as f64 * (1.0 - alpha)).round() as u8;
    *dst = Rgba([
        mix(color.r, dst[0]),
        mix(color.g, dst[1]),
        mix(color.b, dst[2]),
        255,
    ]);
}

/// Fill a page-space rectangle, blending with the given alpha
fn fill_rect(
    canvas: &mut RgbaImage,
    page_height: f64,
    scale: f64,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    color: Rgb,
    alpha: f64,
) {
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    let x0 = (x * scale).round() as i64;
    let y0 = ((page_height - y - height) * scale).round() as i64;
    let x1 = ((x + width) * scale).round() as i64;
    let y1 = ((page_height - y) * scale).round() as i64;
    for py in y0..y1 {
        for px in x0..x1 {
            blend(canvas, px, py, color, alpha);
        }
    }
}

/// Nearest-neighbour resample of the poster raster into its page-space box
fn draw_image(
    canvas: &mut RgbaImage,
    page_height: f64,
    scale: f64,
    poster: &RgbImage,
    cx: f64,
    cy: f64,
    width: f64,
    height: f64,
) {
    let x0 = ((cx - 0.5 * width) * scale).round() as i64;
    let y0 = ((page_height - cy - 0.5 * height) * scale).round() as i64;
    let x1 = ((cx + 0.5 * width) * scale).round() as i64;
    let y1 = ((page_height - cy + 0.5 * height) * scale).round() as i64;
    let (dst_w, dst_h) = ((x1 - x0).max(1) as f64, (y1 - y0).max(1) as f64);

    for py in y0..y1 {
        for px in x0..x1 {
            let sx = ((px - x0) as f64 / dst_w * poster.width() as f64) as u32;
            let sy = ((py - y0) as f64 / dst_h * poster.height() as f64) as u32;
            let src = poster.get_pixel(sx.min(poster.width() - 1), sy.min(poster.height() - 1));
            blend(canvas, px, py, Rgb::new(src[0], src[1], src[2]), 1.0);
        }
    }
}

/// Rasterize one text run with rusttype glyph coverage
fn draw_text(
    canvas: &mut RgbaImage,
    page_height: f64,
    scale: f64,
    font: &rusttype::Font<'static>,
    x: f64,
    y: f64,
    style: &crate::TextStyle,
) {
    let px_size = Scale::uniform((style.size * scale) as f32);
    let baseline = ((page_height - y) * scale) as f32;
    let alpha = style.alpha as f64 / 255.0;

    let mut cursor = (x * scale) as f32;
    let mut last = None;
    for c in style.text.chars() {
        let glyph = font.glyph(c);
        if let Some(prev) = last {
            cursor += font.pair_kerning(px_size, prev, glyph.id());
        }
        last = Some(glyph.id());

        let scaled = glyph.scaled(px_size);
        let advance = scaled.h_metrics().advance_width;
        let positioned = scaled.positioned(point(cursor, baseline));
        if let Some(bb) = positioned.pixel_bounding_box() {
            positioned.draw(|gx, gy, coverage| {
                let px = gx as i64 + bb.min.x as i64;
                let py = gy as i64 + bb.min.y as i64;
                blend(canvas, px, py, style.color, coverage as f64 * alpha);
            });
        }
        cursor += advance + (style.char_space * scale) as f32;
    }
}

/// Replay `commands` into a preview raster at `pixels_per_point` resolution.
///
/// Base-14 faces carry no glyph outlines, so their text runs are skipped
/// with a warning; the document output is unaffected. Register a TrueType
/// face under the same name to get preview glyphs.
pub fn render_preview(
    commands: &[DrawCommand],
    geometry: &PageGeometry,
    poster: &RgbImage,
    fonts: &FontCatalog,
    pixels_per_point: f64,
) -> Result<RgbaImage> {
    if !pixels_per_point.is_finite() || pixels_per_point <= 0.0 {
        return Err(Error::Render(format!(
            "preview scale must be positive (got {pixels_per_point})"
        )));
    }
    let width = (geometry.width * pixels_per_point).ceil() as u32;
    let height = (geometry.height * pixels_per_point).ceil() as u32;
    if width == 0 || height == 0 {
        return Err(Error::Render("preview raster would be empty".into()));
    }

    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    for command in commands {
        match command {
            DrawCommand::FilledRect { x, y, width, height, color } => {
                fill_rect(&mut canvas, geometry.height, pixels_per_point, *x, *y, *width, *height, *color, 1.0);
            }
            DrawCommand::Band { x, y, width, height, color, alpha } => {
                fill_rect(
                    &mut canvas,
                    geometry.height,
                    pixels_per_point,
                    *x,
                    *y,
                    *width,
                    *height,
                    *color,
                    *alpha as f64 / 255.0,
                );
            }
            DrawCommand::Image { cx, cy, width, height } => {
                draw_image(&mut canvas, geometry.height, pixels_per_point, poster, *cx, *cy, *width, *height);
            }
            DrawCommand::Text { x, y, style } => match fonts.face(&style.font)? {
                FontFace::TrueType { font, .. } => {
                    draw_text(&mut canvas, geometry.height, pixels_per_point, font, *x, *y, style);
                }
                FontFace::Builtin { base_font, .. } => {
                    log::warn!(
                        "preview: no outlines for builtin face {base_font}; skipping text {:?}",
                        style.text
                    );
                }
            },
            DrawCommand::FrameRect { x, y, width, height, stroke_width, color } => {
                // The stroke straddles the path: fill the band between the
                // outer and inner boxes as four rectangles.
                let sw = *stroke_width;
                let s = 0.5 * sw;
                let (ox, oy) = (x - s, y - s);
                let (ow, oh) = (width + sw, height + sw);
                fill_rect(&mut canvas, geometry.height, pixels_per_point, ox, oy, ow, sw, *color, 1.0);
                fill_rect(&mut canvas, geometry.height, pixels_per_point, ox, y + height - s, ow, sw, *color, 1.0);
                fill_rect(&mut canvas, geometry.height, pixels_per_point, ox, oy, sw, oh, *color, 1.0);
                fill_rect(&mut canvas, geometry.height, pixels_per_point, x + width - s, oy, sw, oh, *color, 1.0);
            }
        }
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poster_1x1(color: Rgb) -> RgbImage {
        RgbImage::from_pixel(1, 1, image::Rgb([color.r, color.g, color.b]))
    }

    #[test]
    fn preview_has_scaled_dimensions() {
        let geometry = PageGeometry::new(100.0, 50.0, 10.0);
        let canvas = render_preview(&[], &geometry, &poster_1x1(Rgb::new(0, 0, 0)), &FontCatalog::new(), 2.0).unwrap();
        assert_eq!(canvas.width(), 200);
        assert_eq!(canvas.height(), 100);
    }

    #[test]
    fn background_fill_covers_printable_area() {
        let geometry = PageGeometry::new(100.0, 50.0, 10.0);
        let commands = vec![DrawCommand::FilledRect {
            x: 10.0,
            y: 10.0,
            width: 80.0,
            height: 30.0,
            color: Rgb::new(10, 20, 30),
        }];
        let canvas =
            render_preview(&commands, &geometry, &poster_1x1(Rgb::new(0, 0, 0)), &FontCatalog::new(), 1.0).unwrap();
        // Center of the page is painted, the margin corner is not
        assert_eq!(canvas.get_pixel(50, 25), &Rgba([10, 20, 30, 255]));
        assert_eq!(canvas.get_pixel(2, 2), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn band_alpha_blends_over_background() {
        let geometry = PageGeometry::new(100.0, 50.0, 0.0);
        let commands = vec![DrawCommand::Band {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 50.0,
            color: Rgb::new(0, 0, 0),
            alpha: 128,
        }];
        let canvas =
            render_preview(&commands, &geometry, &poster_1x1(Rgb::new(0, 0, 0)), &FontCatalog::new(), 1.0).unwrap();
        let px = canvas.get_pixel(50, 25);
        // Roughly half-black over white
        assert!(px[0] > 120 && px[0] < 135, "got {px:?}");
    }

    #[test]
    fn builtin_face_text_is_skipped_not_fatal() {
        let geometry = PageGeometry::new(100.0, 50.0, 0.0);
        let commands = vec![DrawCommand::Text {
            x: 10.0,
            y: 10.0,
            style: crate::TextStyle::title_default(),
        }];
        assert!(render_preview(&commands, &geometry, &poster_1x1(Rgb::new(0, 0, 0)), &FontCatalog::new(), 1.0).is_ok());
    }
}
