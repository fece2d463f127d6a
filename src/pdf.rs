//! Page renderer: materializes a draw-command list into a one-page PDF.
//!
//! Commands are translated into a single content stream in emission order,
//! so z-order matches the compositor's list. Band and text translucency go
//! through ExtGState alpha entries; the poster raster is embedded as a
//! DCTDecode image XObject; base-14 faces are referenced as Type1 dicts
//! while TrueType faces are embedded with their widths and font program.

use std::collections::BTreeMap;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use rusttype::Scale;

use crate::compose::DrawCommand;
use crate::error::{Error, Result};
use crate::font::{FontCatalog, FontFace};
use crate::{PageGeometry, Rgb, TextStyle};

/// JPEG quality for the embedded poster raster
const IMAGE_QUALITY: u8 = 90;

/// Resource name of the poster raster XObject
const IMAGE_NAME: &str = "Im0";

/// Render `commands` into PDF bytes.
///
/// Nothing is written to disk here; callers persist the returned bytes only
/// after the whole document rendered successfully, so no partial documents
/// ever land on disk.
pub fn render_pdf(
    commands: &[DrawCommand],
    geometry: &PageGeometry,
    poster: &RgbImage,
    fonts: &FontCatalog,
) -> Result<Vec<u8>> {
    geometry.validate()?;
    let mut canvas = PdfCanvas::new(fonts);
    for command in commands {
        canvas.apply(command)?;
    }
    canvas.finish(geometry, poster)
}

/// Accumulates content-stream operations and the resources they reference
struct PdfCanvas<'a> {
    fonts: &'a FontCatalog,
    operations: Vec<Operation>,
    /// Face name to content-stream resource name (/F1, /F2, ...)
    font_aliases: BTreeMap<String, String>,
    /// Alpha value to ExtGState resource name (/GS1, ...)
    alpha_aliases: BTreeMap<u8, String>,
    uses_image: bool,
}

impl<'a> PdfCanvas<'a> {
    fn new(fonts: &'a FontCatalog) -> Self {
        Self {
            fonts,
            operations: Vec::new(),
            font_aliases: BTreeMap::new(),
            alpha_aliases: BTreeMap::new(),
            uses_image: false,
        }
    }

    fn font_alias(&mut self, face: &str) -> Result<String> {
        // Resolve first so an unknown face fails before any ops are kept
        self.fonts.face(face)?;
        if let Some(alias) = self.font_aliases.get(face) {
            return Ok(alias.clone());
        }
        let alias = format!("F{}", self.font_aliases.len() + 1);
        self.font_aliases.insert(face.to_string(), alias.clone());
        Ok(alias)
    }

    fn alpha_alias(&mut self, alpha: u8) -> String {
        if let Some(alias) = self.alpha_aliases.get(&alpha) {
            return alias.clone();
        }
        let alias = format!("GS{}", self.alpha_aliases.len() + 1);
        self.alpha_aliases.insert(alpha, alias.clone());
        alias
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    fn fill_color(&mut self, color: Rgb) {
        self.push(
            "rg",
            vec![
                (color.r as f32 / 255.0).into(),
                (color.g as f32 / 255.0).into(),
                (color.b as f32 / 255.0).into(),
            ],
        );
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push(
            "re",
            vec![
                (x as f32).into(),
                (y as f32).into(),
                (width as f32).into(),
                (height as f32).into(),
            ],
        );
    }

    fn apply(&mut self, command: &DrawCommand) -> Result<()> {
        match command {
            DrawCommand::FilledRect { x, y, width, height, color } => {
                self.push("q", vec![]);
                self.fill_color(*color);
                self.rect(*x, *y, *width, *height);
                self.push("f", vec![]);
                self.push("Q", vec![]);
            }
            DrawCommand::Band { x, y, width, height, color, alpha } => {
                let gs = self.alpha_alias(*alpha);
                self.push("q", vec![]);
                self.push("gs", vec![gs.as_str().into()]);
                self.fill_color(*color);
                self.rect(*x, *y, *width, *height);
                self.push("f", vec![]);
                self.push("Q", vec![]);
            }
            DrawCommand::Image { cx, cy, width, height } => {
                self.uses_image = true;
                self.push("q", vec![]);
                self.push(
                    "cm",
                    vec![
                        (*width as f32).into(),
                        0.into(),
                        0.into(),
                        (*height as f32).into(),
                        ((cx - 0.5 * width) as f32).into(),
                        ((cy - 0.5 * height) as f32).into(),
                    ],
                );
                self.push("Do", vec![IMAGE_NAME.into()]);
                self.push("Q", vec![]);
            }
            DrawCommand::Text { x, y, style } => self.text(*x, *y, style)?,
            DrawCommand::FrameRect { x, y, width, height, stroke_width, color } => {
                self.push("q", vec![]);
                self.push("w", vec![(*stroke_width as f32).into()]);
                self.push(
                    "RG",
                    vec![
                        (color.r as f32 / 255.0).into(),
                        (color.g as f32 / 255.0).into(),
                        (color.b as f32 / 255.0).into(),
                    ],
                );
                self.rect(*x, *y, *width, *height);
                self.push("S", vec![]);
                self.push("Q", vec![]);
            }
        }
        Ok(())
    }

    fn text(&mut self, x: f64, y: f64, style: &TextStyle) -> Result<()> {
        style.validate()?;
        let alias = self.font_alias(&style.font)?;

        self.push("q", vec![]);
        if style.alpha < 255 {
            let gs = self.alpha_alias(style.alpha);
            self.push("gs", vec![gs.as_str().into()]);
        }
        self.push("BT", vec![]);
        self.push("Tf", vec![alias.as_str().into(), (style.size as f32).into()]);
        if style.char_space != 0.0 {
            self.push("Tc", vec![(style.char_space as f32).into()]);
        }
        self.fill_color(style.color);
        self.push("Td", vec![(x as f32).into(), (y as f32).into()]);
        self.push("Tj", vec![Object::String(encode_latin1(&style.text), StringFormat::Literal)]);
        self.push("ET", vec![]);
        self.push("Q", vec![]);
        Ok(())
    }

    fn finish(self, geometry: &PageGeometry, poster: &RgbImage) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut resources = Dictionary::new();

        if !self.font_aliases.is_empty() {
            let mut font_dict = Dictionary::new();
            for (face, alias) in &self.font_aliases {
                let id = add_font_object(&mut doc, self.fonts.face(face)?, face)?;
                font_dict.set(alias.as_bytes(), Object::Reference(id));
            }
            resources.set("Font", Object::Dictionary(font_dict));
        }

        if !self.alpha_aliases.is_empty() {
            let mut gs_dict = Dictionary::new();
            for (alpha, alias) in &self.alpha_aliases {
                let value = *alpha as f32 / 255.0;
                let id = doc.add_object(dictionary! {
                    "Type" => "ExtGState",
                    "ca" => value,
                    "CA" => value,
                });
                gs_dict.set(alias.as_bytes(), Object::Reference(id));
            }
            resources.set("ExtGState", Object::Dictionary(gs_dict));
        }

        if self.uses_image {
            let id = add_image_object(&mut doc, poster)?;
            resources.set("XObject", dictionary! { IMAGE_NAME => id });
        }

        let content = Content { operations: self.operations };
        let encoded = content
            .encode()
            .map_err(|e| Error::Render(format!("failed to encode content stream: {e}")))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                (geometry.width as f32).into(),
                (geometry.height as f32).into(),
            ],
            "Contents" => content_id,
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| Error::Render(format!("failed to serialize document: {e}")))?;
        Ok(bytes)
    }
}

/// Map a text run to single-byte Latin-1; anything outside becomes '?'
fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
        .collect()
}

fn add_font_object(doc: &mut Document, face: &FontFace, name: &str) -> Result<lopdf::ObjectId> {
    match face {
        FontFace::Builtin { base_font, .. } => Ok(doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => *base_font,
            "Encoding" => "WinAnsiEncoding",
        })),
        FontFace::TrueType { data, font } => {
            // Glyph-space metrics: 1000 units per em
            let em = Scale::uniform(1000.0);
            let metrics = font.v_metrics(em);

            let widths: Vec<Object> = (32u32..=255)
                .map(|code| {
                    let c = char::from_u32(code).unwrap_or('?');
                    let advance = font.glyph(c).scaled(em).h_metrics().advance_width;
                    (advance.round() as i64).into()
                })
                .collect();

            let ps_name = name.replace(' ', "-");
            let file_id = doc.add_object(Stream::new(
                dictionary! { "Length1" => data.len() as i64 },
                data.clone(),
            ));
            let descriptor_id = doc.add_object(dictionary! {
                "Type" => "FontDescriptor",
                "FontName" => ps_name.as_str(),
                "Flags" => 32,
                "FontBBox" => vec![
                    (-200).into(),
                    (metrics.descent.round() as i64).into(),
                    1200.into(),
                    (metrics.ascent.round() as i64).into(),
                ],
                "ItalicAngle" => 0,
                "Ascent" => metrics.ascent.round() as i64,
                "Descent" => metrics.descent.round() as i64,
                "CapHeight" => metrics.ascent.round() as i64,
                "StemV" => 80,
                "MissingWidth" => 500,
                "FontFile2" => file_id,
            });

            Ok(doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "TrueType",
                "BaseFont" => ps_name.as_str(),
                "FirstChar" => 32,
                "LastChar" => 255,
                "Widths" => widths,
                "FontDescriptor" => descriptor_id,
                "Encoding" => "WinAnsiEncoding",
            }))
        }
    }
}

fn add_image_object(doc: &mut Document, poster: &RgbImage) -> Result<lopdf::ObjectId> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, IMAGE_QUALITY).encode(
        poster.as_raw(),
        poster.width(),
        poster.height(),
        image::ExtendedColorType::Rgb8,
    )?;

    Ok(doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => poster.width() as i64,
            "Height" => poster.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    )))
}
