//! Pure placement math for the page compositor.
//!
//! Everything here is arithmetic over page coordinates (points, origin at
//! the bottom-left): fitting the map image into the printable area, sizing
//! and positioning the header band, and aligning text runs inside it.

use crate::error::{Error, Result};
use crate::{BoundingBox, CropMode, HAlign, PageGeometry, TextStyle, VAlign};

/// Horizontal inset applied to left/right-aligned text runs
pub const SPACER_Y: f64 = 10.0;

/// Vertical padding inside the header band
pub const MARGIN_Y: f64 = 10.0;

/// Fit the map image into the printable area and return its bounding box.
///
/// `crop` selects which page dimension the image spans edge to edge;
/// the other follows from `aspect_ratio` (image height over image width).
/// The alignments then slide the image along the free axis, keeping it
/// inside the printable area.
pub fn place_image(
    geometry: &PageGeometry,
    halign: HAlign,
    valign: VAlign,
    crop: CropMode,
    aspect_ratio: f64,
) -> Result<BoundingBox> {
    if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
        return Err(Error::InvalidGeometry(format!(
            "aspect ratio must be positive (got {aspect_ratio})"
        )));
    }
    geometry.validate()?;

    let PageGeometry { width: page_width, height: page_height, margin } = *geometry;

    let (width, height) = match crop {
        CropMode::Width => {
            let width = page_width - 2.0 * margin;
            (width, width * aspect_ratio)
        }
        CropMode::Height => {
            let height = page_height - 2.0 * margin;
            (height / aspect_ratio, height)
        }
    };

    // Image alignment is page-relative; the box-relative variants fall back
    // to centering, same as any alignment other than top/bottom.
    let cy = match valign {
        VAlign::Top => page_height - 0.5 * height - margin,
        VAlign::Bottom => margin + 0.5 * height,
        _ => 0.5 * page_height,
    };

    let cx = match halign {
        HAlign::Right => page_width - 0.5 * width - margin,
        HAlign::Left => margin + 0.5 * width,
        HAlign::Center => 0.5 * page_width,
    };

    Ok(BoundingBox {
        x_min: cx - 0.5 * width,
        y_min: cy - 0.5 * height,
        x_max: cx + 0.5 * width,
        y_max: cy + 0.5 * height,
    })
}

/// Height of the header band: both text sizes stacked plus padding.
///
/// The 0.65 factor approximates the subtitle's cap height relative to its
/// point size.
pub fn header_height(title: &TextStyle, subtitle: &TextStyle) -> f64 {
    let font_height = title.size + 0.65 * subtitle.size;
    font_height + SPACER_Y + 2.0 * MARGIN_Y
}

/// Vertical position of the header band for a given alignment, clamped so
/// the band never leaves the printable area even when a box-relative rule
/// would push it outside.
pub fn header_y(
    valign: VAlign,
    page_height: f64,
    margin: f64,
    image_bounds: &BoundingBox,
    header_height: f64,
) -> f64 {
    let y = match valign {
        VAlign::Top => page_height - margin - header_height,
        VAlign::Bottom => margin,
        VAlign::Center => 0.5 * (page_height - header_height),
        VAlign::Above => image_bounds.y_max,
        VAlign::Below => image_bounds.y_min - header_height,
        VAlign::InsideTop => image_bounds.y_max - header_height,
        VAlign::InsideBottom => image_bounds.y_min,
    };

    y.min(page_height - margin - header_height).max(margin)
}

/// Horizontal origin of a text run of the given width
pub fn text_x(align: crate::TextAlign, page_width: f64, margin: f64, text_width: f64) -> f64 {
    match align {
        crate::TextAlign::Left => margin + SPACER_Y,
        crate::TextAlign::Center => 0.5 * (page_width - text_width),
        crate::TextAlign::Right => page_width - margin - text_width - SPACER_Y,
    }
}
