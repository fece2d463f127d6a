//! Page compositor: turns a poster configuration and a placed map raster
//! into an ordered [`DrawCommand`] list.
//!
//! The compositor is pure. It measures text through the [`TextMeasure`]
//! seam, computes every placement up front, and emits commands in the fixed
//! z-order background, image, band, subtitle, title, margin frame. Page
//! renderers replay the list without further layout decisions.

pub mod layout;
pub mod paint;
mod raster;

pub use paint::DrawCommand;
pub use raster::{render_preview, PREVIEW_SCALE};

use crate::error::Result;
use crate::{BoundingBox, CropMode, HAlign, PageGeometry, Rgb, TextStyle, VAlign};

/// String-width measurement, delegated to the page renderer since glyph
/// advances depend on font data. Tests substitute a fixed-advance fake.
pub trait TextMeasure {
    /// Width of `text` at `size` points in the named face, excluding any
    /// extra character spacing
    fn string_width(&self, text: &str, font: &str, size: f64) -> Result<f64>;
}

/// Everything the compositor needs to lay out one poster page
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    pub geometry: PageGeometry,
    pub background_color: Rgb,
    pub margin_color: Rgb,
    pub image_halign: HAlign,
    pub image_valign: VAlign,
    pub image_crop: CropMode,
    /// Map raster height over width; must be positive
    pub aspect_ratio: f64,
    pub header_valign: VAlign,
    pub band_color: Rgb,
    pub band_alpha: u8,
    pub title: TextStyle,
    pub subtitle: TextStyle,
}

/// Width of a text run including character spacing
fn run_width(style: &TextStyle, measure: &dyn TextMeasure) -> Result<f64> {
    let glyphs = measure.string_width(&style.text, &style.font, style.size)?;
    let chars = style.text.chars().count();
    Ok(glyphs + style.char_space * chars.saturating_sub(1) as f64)
}

/// Lay out the header: the translucent band plus both text runs.
///
/// The subtitle is emitted first and the cursor advances upward, so the
/// subtitle sits visually below the title. That ordering is intentional.
pub fn emit_header(
    title: &TextStyle,
    subtitle: &TextStyle,
    image_bounds: &BoundingBox,
    geometry: &PageGeometry,
    valign: VAlign,
    band_color: Rgb,
    band_alpha: u8,
    measure: &dyn TextMeasure,
) -> Result<Vec<DrawCommand>> {
    title.validate()?;
    subtitle.validate()?;

    let band_height = layout::header_height(title, subtitle);
    let band_y = layout::header_y(valign, geometry.height, geometry.margin, image_bounds, band_height);

    let mut commands = vec![DrawCommand::Band {
        x: geometry.margin,
        y: band_y,
        width: geometry.width - 2.0 * geometry.margin,
        height: band_height,
        color: band_color,
        alpha: band_alpha,
    }];

    let mut y = band_y + layout::MARGIN_Y;
    for style in [subtitle, title] {
        let width = run_width(style, measure)?;
        let x = layout::text_x(style.align, geometry.width, geometry.margin, width);
        commands.push(DrawCommand::Text { x, y, style: style.clone() });
        y += style.size + layout::SPACER_Y;
    }

    Ok(commands)
}

/// Compose the full poster page.
///
/// All preconditions (geometry, aspect ratio, text styles) are checked
/// before the first command is produced, so a failed compose emits nothing.
pub fn compose_poster(opts: &ComposeOptions, measure: &dyn TextMeasure) -> Result<Vec<DrawCommand>> {
    let geometry = &opts.geometry;
    geometry.validate()?;
    opts.title.validate()?;
    opts.subtitle.validate()?;

    let image_bounds = layout::place_image(
        geometry,
        opts.image_halign,
        opts.image_valign,
        opts.image_crop,
        opts.aspect_ratio,
    )?;

    let mut commands = Vec::with_capacity(6);

    commands.push(DrawCommand::FilledRect {
        x: geometry.margin,
        y: geometry.margin,
        width: geometry.width - 2.0 * geometry.margin,
        height: geometry.height - 2.0 * geometry.margin,
        color: opts.background_color,
    });

    commands.push(DrawCommand::Image {
        cx: 0.5 * (image_bounds.x_min + image_bounds.x_max),
        cy: 0.5 * (image_bounds.y_min + image_bounds.y_max),
        width: image_bounds.width(),
        height: image_bounds.height(),
    });

    commands.extend(emit_header(
        &opts.title,
        &opts.subtitle,
        &image_bounds,
        geometry,
        opts.header_valign,
        opts.band_color,
        opts.band_alpha,
        measure,
    )?);

    // Frame stroke straddles the page edge: a stroke as wide as the margin
    // centered on margin/2 covers everything outside the printable area.
    commands.push(DrawCommand::FrameRect {
        x: 0.5 * geometry.margin,
        y: 0.5 * geometry.margin,
        width: geometry.width - geometry.margin,
        height: geometry.height - geometry.margin,
        stroke_width: geometry.margin,
        color: opts.margin_color,
    });

    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextAlign;

    /// Fixed-advance measurement: every character is 0.5 * size wide
    struct FixedMeasure;

    impl TextMeasure for FixedMeasure {
        fn string_width(&self, text: &str, _font: &str, size: f64) -> Result<f64> {
            Ok(text.chars().count() as f64 * size * 0.5)
        }
    }

    fn options() -> ComposeOptions {
        ComposeOptions {
            geometry: PageGeometry::new(210.0, 297.0, 15.0),
            background_color: Rgb::new(0xf5, 0xe8, 0xd7),
            margin_color: Rgb::new(0xff, 0xff, 0xff),
            image_halign: HAlign::Center,
            image_valign: VAlign::Center,
            image_crop: CropMode::Width,
            aspect_ratio: 1.0,
            header_valign: VAlign::Center,
            band_color: Rgb::new(0, 0, 0),
            band_alpha: 10,
            title: TextStyle::title_default(),
            subtitle: TextStyle::subtitle_default(),
        }
    }

    #[test]
    fn compose_emits_fixed_z_order() {
        let commands = compose_poster(&options(), &FixedMeasure).unwrap();
        assert_eq!(commands.len(), 6);
        assert!(matches!(commands[0], DrawCommand::FilledRect { .. }));
        assert!(matches!(commands[1], DrawCommand::Image { .. }));
        assert!(matches!(commands[2], DrawCommand::Band { .. }));
        assert!(matches!(commands[3], DrawCommand::Text { .. }));
        assert!(matches!(commands[4], DrawCommand::Text { .. }));
        assert!(matches!(commands[5], DrawCommand::FrameRect { .. }));
    }

    #[test]
    fn header_stacks_subtitle_below_title() {
        let commands = compose_poster(&options(), &FixedMeasure).unwrap();
        let (subtitle_y, title_y) = match (&commands[3], &commands[4]) {
            (
                DrawCommand::Text { y: sy, style: s, .. },
                DrawCommand::Text { y: ty, style: t, .. },
            ) => {
                assert_eq!(s.text, "Country");
                assert_eq!(t.text, "CITY");
                (*sy, *ty)
            }
            other => panic!("unexpected commands: {other:?}"),
        };
        // Cursor advances upward by the subtitle size plus the spacer
        assert!((title_y - subtitle_y - (14.0 + layout::SPACER_Y)).abs() < 1e-9);
    }

    #[test]
    fn char_space_widens_runs() {
        let mut opts = options();
        opts.title.align = TextAlign::Center;
        let centered_x = |opts: &ComposeOptions| {
            let commands = compose_poster(opts, &FixedMeasure).unwrap();
            match &commands[4] {
                DrawCommand::Text { x, .. } => *x,
                other => panic!("unexpected command: {other:?}"),
            }
        };
        let without = centered_x(&opts);
        opts.title.char_space = 4.0;
        let with = centered_x(&opts);
        // "CITY" has 3 inter-character gaps; a centered run shifts left by half
        assert!((without - with - 0.5 * 3.0 * 4.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_style_emits_nothing() {
        let mut opts = options();
        opts.title.size = 0.0;
        assert!(matches!(
            compose_poster(&opts, &FixedMeasure),
            Err(crate::Error::MissingStyle(_))
        ));
    }

    #[test]
    fn compose_is_deterministic() {
        let a = compose_poster(&options(), &FixedMeasure).unwrap();
        let b = compose_poster(&options(), &FixedMeasure).unwrap();
        assert_eq!(a, b);
    }
}
