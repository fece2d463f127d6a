//! Font catalog: named faces with string-width measurement.
//!
//! Two kinds of face are supported. The base-14 PDF faces need no font
//! file; their advances are approximated with a per-face average factor,
//! which is plenty for band-relative alignment. TrueType faces are loaded
//! from font files and measured exactly through rusttype; they are also the
//! only faces the PNG preview can draw glyphs for, since the base-14 faces
//! carry no outlines.

use std::collections::BTreeMap;
use std::path::Path;

use rusttype::{Font, Scale};

use crate::compose::TextMeasure;
use crate::error::{Error, Result};

/// A registered font face
pub enum FontFace {
    /// One of the base-14 PDF faces; no font program is embedded
    Builtin {
        base_font: &'static str,
        /// Average glyph advance as a fraction of the point size
        avg_advance: f64,
    },
    /// A TrueType face loaded from a file and embedded into the document
    TrueType { data: Vec<u8>, font: Font<'static> },
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontFace::Builtin { base_font, .. } => write!(f, "Builtin({base_font})"),
            FontFace::TrueType { data, .. } => write!(f, "TrueType({} bytes)", data.len()),
        }
    }
}

/// Named font faces available to the compositor and the page renderers
#[derive(Debug)]
pub struct FontCatalog {
    faces: BTreeMap<String, FontFace>,
}

impl FontCatalog {
    /// A catalog holding the base-14 faces used by the default styles
    pub fn new() -> Self {
        let mut faces = BTreeMap::new();
        for (name, base_font, avg_advance) in [
            ("Helvetica", "Helvetica", 0.52),
            ("Helvetica-Bold", "Helvetica-Bold", 0.60),
            ("Times-Roman", "Times-Roman", 0.50),
            ("Courier", "Courier", 0.60),
        ] {
            faces.insert(name.to_string(), FontFace::Builtin { base_font, avg_advance });
        }
        Self { faces }
    }

    /// Register a TrueType face under `name`, replacing any existing face
    pub fn register_ttf_bytes(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let font = Font::try_from_vec(data.clone())
            .ok_or_else(|| Error::Config(format!("{name}: not a usable TrueType font")))?;
        self.faces.insert(name.to_string(), FontFace::TrueType { data, font });
        Ok(())
    }

    /// Register a TrueType face from a font file on disk
    pub fn register_ttf_file(&mut self, name: &str, path: &Path) -> Result<()> {
        let data = std::fs::read(path)?;
        self.register_ttf_bytes(name, data)
    }

    /// Look up a face; unknown names are a style precondition failure
    pub fn face(&self, name: &str) -> Result<&FontFace> {
        self.faces
            .get(name)
            .ok_or_else(|| Error::MissingStyle(format!("unknown font face {name:?}")))
    }

    pub fn face_names(&self) -> impl Iterator<Item = &str> {
        self.faces.keys().map(|s| s.as_str())
    }
}

impl Default for FontCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for FontCatalog {
    fn string_width(&self, text: &str, font: &str, size: f64) -> Result<f64> {
        match self.face(font)? {
            FontFace::Builtin { avg_advance, .. } => {
                Ok(text.chars().count() as f64 * size * avg_advance)
            }
            FontFace::TrueType { font, .. } => {
                let scale = Scale::uniform(size as f32);
                let mut width = 0.0f32;
                let mut last = None;
                for c in text.chars() {
                    let glyph = font.glyph(c);
                    let id = glyph.id();
                    if let Some(prev) = last {
                        width += font.pair_kerning(scale, prev, id);
                    }
                    width += glyph.scaled(scale).h_metrics().advance_width;
                    last = Some(id);
                }
                Ok(width as f64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_measurement_scales_linearly() {
        let catalog = FontCatalog::new();
        let w1 = catalog.string_width("CITY", "Helvetica-Bold", 10.0).unwrap();
        let w2 = catalog.string_width("CITY", "Helvetica-Bold", 20.0).unwrap();
        assert!((w2 - 2.0 * w1).abs() < 1e-9);
        assert_eq!(w1, 4.0 * 10.0 * 0.60);
    }

    #[test]
    fn unknown_face_is_missing_style() {
        let catalog = FontCatalog::new();
        assert!(matches!(
            catalog.string_width("x", "Comic Sans", 10.0),
            Err(Error::MissingStyle(_))
        ));
    }

    #[test]
    fn bad_ttf_bytes_are_rejected() {
        let mut catalog = FontCatalog::new();
        assert!(catalog.register_ttf_bytes("Broken", vec![0u8; 16]).is_err());
    }
}
