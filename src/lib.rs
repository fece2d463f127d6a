//! Mapposter
//!
//! A decorative city-map poster generator. The pipeline fetches street
//! geometry for a place, rasterizes it, recolors the raster as a duotone,
//! composes it onto a page with a translucent header band and title text,
//! and materializes both a PDF document and a PNG preview.
//!
//! # Example
//!
//! ```no_run
//! use mapposter::{PosterBuilder, PosterConfig};
//! use mapposter::cache::DiskCache;
//! use mapposter::mapper::OverpassSource;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PosterConfig {
//!     place: "Lyon, France".to_string(),
//!     ..Default::default()
//! };
//!
//! let builder = PosterBuilder::new(
//!     Box::new(OverpassSource::default_endpoints()?),
//!     Box::new(DiskCache::new("data")),
//!     "posters",
//! );
//! let output = builder.build("lyon", &config)?;
//! println!("pdf: {}", output.pdf.display());
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod cache;
pub mod compose;
pub mod font;
pub mod mapper;
pub mod pdf;
pub mod pipeline;
pub mod recolor;

// Re-export the main entry points at the crate root for ergonomic use
pub use pipeline::{PosterBuilder, PosterOutput};

/// Points per millimetre (1 inch = 72 points, 1 inch = 25.4 mm)
pub const MM: f64 = 72.0 / 25.4;

/// An opaque RGB color, configured as a `#rrggbb` hex string.
///
/// Alpha is carried separately (0 to 255) wherever translucency applies,
/// mirroring the way band and text colors are configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::Config(format!("invalid hex color {s:?}")));
        }
        let bytes = hex::decode(digits).map_err(|e| Error::Config(format!("invalid hex color {s:?}: {e}")))?;
        Ok(Self::new(bytes[0], bytes[1], bytes[2]))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation between two colors, `t` in [0, 1]
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

/// Page size and printable-margin geometry, in points.
///
/// The margin is applied on all four sides; every placement computation in
/// [`compose`] keeps its output inside the printable area
/// `[margin, width - margin] x [margin, height - margin]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl PageGeometry {
    pub fn new(width: f64, height: f64, margin: f64) -> Self {
        Self { width, height, margin }
    }

    /// A4 portrait (210 x 297 mm)
    pub fn a4_portrait(margin: f64) -> Self {
        Self::new(210.0 * MM, 297.0 * MM, margin)
    }

    /// A4 landscape (297 x 210 mm)
    pub fn a4_landscape(margin: f64) -> Self {
        Self::new(297.0 * MM, 210.0 * MM, margin)
    }

    /// Check the geometry preconditions: positive dimensions, non-negative
    /// margin strictly below half of the smaller page dimension.
    pub fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.height.is_finite() && self.margin.is_finite()) {
            return Err(Error::InvalidGeometry("page dimensions must be finite".into()));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "page dimensions must be positive (got {} x {})",
                self.width, self.height
            )));
        }
        if self.margin < 0.0 || self.margin >= 0.5 * self.width.min(self.height) {
            return Err(Error::InvalidGeometry(format!(
                "margin {} must stay below half of the smaller page dimension ({} x {})",
                self.margin, self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4_landscape(25.0)
    }
}

/// Horizontal placement of the map image on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HAlign {
    Left,
    Center,
    Right,
}

impl FromStr for HAlign {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(HAlign::Left),
            "center" => Ok(HAlign::Center),
            "right" => Ok(HAlign::Right),
            other => Err(Error::InvalidAlignment(other.to_string())),
        }
    }
}

/// Vertical placement of the map image or the header band.
///
/// `Above`, `Below`, `InsideTop` and `InsideBottom` are relative to the
/// placed image's bounding box rather than the page. The set is closed on
/// purpose: an unrecognized token fails to parse instead of yielding an
/// undefined position downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VAlign {
    Top,
    Bottom,
    Center,
    Above,
    Below,
    InsideTop,
    InsideBottom,
}

impl FromStr for VAlign {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "top" => Ok(VAlign::Top),
            "bottom" => Ok(VAlign::Bottom),
            "center" => Ok(VAlign::Center),
            "above" => Ok(VAlign::Above),
            "below" => Ok(VAlign::Below),
            "inside-top" => Ok(VAlign::InsideTop),
            "inside-bottom" => Ok(VAlign::InsideBottom),
            other => Err(Error::InvalidAlignment(other.to_string())),
        }
    }
}

/// Which page dimension the map image is fit to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CropMode {
    /// The image spans the printable width; height follows the aspect ratio
    Width,
    /// The image spans the printable height; width follows the aspect ratio
    Height,
}

impl FromStr for CropMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "width" => Ok(CropMode::Width),
            "height" => Ok(CropMode::Height),
            other => Err(Error::Config(format!("unknown crop mode {other:?}"))),
        }
    }
}

/// Text-run alignment. Configured as 0 (left), 1 (center) or 2 (right);
/// any other wire value means right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TryFrom<u8> for TextAlign {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => TextAlign::Left,
            1 => TextAlign::Center,
            _ => TextAlign::Right,
        })
    }
}

impl From<TextAlign> for u8 {
    fn from(value: TextAlign) -> Self {
        match value {
            TextAlign::Left => 0,
            TextAlign::Center => 1,
            TextAlign::Right => 2,
        }
    }
}

/// A single run of header text: content, face, size and paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub text: String,
    /// Font face name, resolved against the [`font::FontCatalog`]
    pub font: String,
    /// Font size in points
    pub size: f64,
    /// Additional spacing between characters, in points
    pub char_space: f64,
    pub color: Rgb,
    pub alpha: u8,
    pub align: TextAlign,
}

impl TextStyle {
    /// The default title run
    pub fn title_default() -> Self {
        Self {
            text: "CITY".to_string(),
            font: "Helvetica-Bold".to_string(),
            size: 55.0,
            char_space: 0.0,
            color: Rgb::new(0xba, 0x89, 0x7a),
            alpha: 255,
            align: TextAlign::Right,
        }
    }

    /// The default subtitle run
    pub fn subtitle_default() -> Self {
        Self {
            text: "Country".to_string(),
            font: "Helvetica-Bold".to_string(),
            size: 14.0,
            char_space: 0.0,
            color: Rgb::new(0xba, 0x89, 0x7a),
            alpha: 255,
            align: TextAlign::Right,
        }
    }

    /// Check the style preconditions before any drawing happens
    pub fn validate(&self) -> Result<()> {
        if self.font.trim().is_empty() {
            return Err(Error::MissingStyle("font name is empty".into()));
        }
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(Error::MissingStyle(format!(
                "font size must be positive (got {} for {:?})",
                self.size, self.text
            )));
        }
        Ok(())
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::title_default()
    }
}

/// Axis-aligned rectangle in page coordinates (origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// Full configuration of one poster build.
///
/// Every field has an explicit default matching the classic look: warm paper
/// background, terracotta streets, white margin frame and a near-transparent
/// black band behind right-aligned header text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosterConfig {
    /// Place query passed to the map source (e.g. "Lyon, France")
    pub place: String,
    /// Street layers to draw; defaults to the standard road-class set
    pub layers: Vec<mapper::Layer>,
    pub geometry: PageGeometry,
    /// When set, the page takes the size of the map raster plus margin
    pub auto_size: bool,
    pub background_color: Rgb,
    pub street_color: Rgb,
    pub margin_color: Rgb,
    pub band_color: Rgb,
    pub band_alpha: u8,
    pub image_halign: HAlign,
    pub image_valign: VAlign,
    pub image_crop: CropMode,
    pub header_valign: VAlign,
    pub title: TextStyle,
    pub subtitle: TextStyle,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            place: String::new(),
            layers: vec![mapper::Layer::streets()],
            geometry: PageGeometry::default(),
            auto_size: false,
            background_color: Rgb::new(0xf5, 0xe8, 0xd7),
            street_color: Rgb::new(0xba, 0x89, 0x7a),
            margin_color: Rgb::new(0xff, 0xff, 0xff),
            band_color: Rgb::new(0x00, 0x00, 0x00),
            band_alpha: 10,
            image_halign: HAlign::Center,
            image_valign: VAlign::Center,
            image_crop: CropMode::Width,
            header_valign: VAlign::Center,
            title: TextStyle::title_default(),
            subtitle: TextStyle::subtitle_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PosterConfig::default();
        assert_eq!(config.band_alpha, 10);
        assert_eq!(config.title.size, 55.0);
        assert_eq!(config.image_crop, CropMode::Width);
        assert!(!config.auto_size);
    }

    #[test]
    fn test_hex_color_round_trip() {
        let c = Rgb::from_hex("#ba897a").unwrap();
        assert_eq!(c, Rgb::new(0xba, 0x89, 0x7a));
        assert_eq!(c.to_hex(), "#ba897a");
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("zzzzzz").is_err());
    }

    #[test]
    fn test_lerp_endpoints() {
        let black = Rgb::new(0, 0, 0);
        let white = Rgb::new(255, 255, 255);
        assert_eq!(black.lerp(white, 0.0), black);
        assert_eq!(black.lerp(white, 1.0), white);
        assert_eq!(black.lerp(white, 0.5), Rgb::new(128, 128, 128));
    }

    #[test]
    fn test_geometry_margin_invariant() {
        assert!(PageGeometry::new(100.0, 200.0, 49.9).validate().is_ok());
        assert!(PageGeometry::new(100.0, 200.0, 50.0).validate().is_err());
        assert!(PageGeometry::new(100.0, 200.0, -1.0).validate().is_err());
        assert!(PageGeometry::new(0.0, 200.0, 10.0).validate().is_err());
    }

    #[test]
    fn test_text_align_wire_values() {
        assert_eq!(TextAlign::try_from(0u8).unwrap(), TextAlign::Left);
        assert_eq!(TextAlign::try_from(1u8).unwrap(), TextAlign::Center);
        assert_eq!(TextAlign::try_from(2u8).unwrap(), TextAlign::Right);
        // Any other value means right
        assert_eq!(TextAlign::try_from(7u8).unwrap(), TextAlign::Right);
    }
}
