//! Poster build orchestration.
//!
//! One build is a straight line: resolve the street raster (cache or map
//! source), recolor it, compose the page, materialize the PDF and the PNG
//! preview, then write both files. Rendering happens entirely in memory and
//! files are written last, so a failing build leaves nothing on disk.

use std::path::PathBuf;

use crate::cache::{cache_key, ArtifactCache};
use crate::compose::{self, ComposeOptions, PREVIEW_SCALE};
use crate::error::{Error, Result};
use crate::font::FontCatalog;
use crate::mapper::MapSource;
use crate::{pdf, recolor, PageGeometry, PosterConfig, MM};

/// Paths of a finished poster build
#[derive(Debug, Clone, PartialEq)]
pub struct PosterOutput {
    pub pdf: PathBuf,
    pub png: PathBuf,
}

/// Builds posters from a map source, an artifact cache and a font catalog
pub struct PosterBuilder {
    source: Box<dyn MapSource>,
    cache: Box<dyn ArtifactCache>,
    out_dir: PathBuf,
    fonts: FontCatalog,
    preview_scale: f64,
}

impl PosterBuilder {
    pub fn new(
        source: Box<dyn MapSource>,
        cache: Box<dyn ArtifactCache>,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            cache,
            out_dir: out_dir.into(),
            fonts: FontCatalog::new(),
            preview_scale: PREVIEW_SCALE,
        }
    }

    /// Replace the font catalog (e.g. after registering TrueType faces)
    pub fn with_fonts(mut self, fonts: FontCatalog) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn fonts_mut(&mut self) -> &mut FontCatalog {
        &mut self.fonts
    }

    /// Preview resolution in pixels per point
    pub fn with_preview_scale(mut self, pixels_per_point: f64) -> Self {
        self.preview_scale = pixels_per_point;
        self
    }

    /// Resolve the street raster: reuse the cached artifact when one exists
    /// for this (place, layers) configuration, otherwise fetch and store it.
    fn street_raster(&self, config: &PosterConfig) -> Result<Vec<u8>> {
        let key = cache_key(&config.place, &config.layers);
        if let Some(bytes) = self.cache.load(&key)? {
            log::info!("cache hit for {:?} ({key})", config.place);
            return Ok(bytes);
        }
        log::info!("cache miss for {:?}; fetching map data", config.place);
        let bytes = self.source.fetch(&config.place, &config.layers)?;
        self.cache.store(&key, &bytes)?;
        Ok(bytes)
    }

    /// Build one poster and return the written document and preview paths
    pub fn build(&self, name: &str, config: &PosterConfig) -> Result<PosterOutput> {
        if name.is_empty() {
            return Err(Error::Config("poster name is empty".into()));
        }
        if config.place.is_empty() {
            return Err(Error::Config("place query is empty".into()));
        }

        let raster = self.street_raster(config)?;
        let poster = recolor::duotone(&raster, config.background_color, config.street_color)?;
        let (image_width, image_height) = poster.dimensions();

        let geometry = if config.auto_size {
            auto_geometry(image_width, image_height, config.geometry.margin)
        } else {
            config.geometry
        };

        let options = ComposeOptions {
            geometry,
            background_color: config.background_color,
            margin_color: config.margin_color,
            image_halign: config.image_halign,
            image_valign: config.image_valign,
            image_crop: config.image_crop,
            aspect_ratio: image_height as f64 / image_width as f64,
            header_valign: config.header_valign,
            band_color: config.band_color,
            band_alpha: config.band_alpha,
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
        };
        let commands = compose::compose_poster(&options, &self.fonts)?;

        let pdf_bytes = pdf::render_pdf(&commands, &geometry, &poster, &self.fonts)?;
        let preview = compose::render_preview(&commands, &geometry, &poster, &self.fonts, self.preview_scale)?;

        std::fs::create_dir_all(&self.out_dir)?;
        let pdf_path = self.out_dir.join(format!("{name}.poster.pdf"));
        let png_path = self.out_dir.join(format!("{name}.poster.png"));

        std::fs::write(&pdf_path, &pdf_bytes)?;
        preview
            .save_with_format(&png_path, image::ImageFormat::Png)
            .map_err(Error::Image)?;

        log::info!("built poster {name:?}: {} and {}", pdf_path.display(), png_path.display());
        Ok(PosterOutput { pdf: pdf_path, png: png_path })
    }
}

/// Page size for auto-sized posters: the raster's pixel dimensions read as
/// points, capped at 1000 mm, plus the margin.
fn auto_geometry(image_width: u32, image_height: u32, margin: f64) -> PageGeometry {
    let cap = 1000.0 * MM;
    PageGeometry::new(
        (image_width as f64).min(cap) + margin,
        (image_height as f64).min(cap) + margin,
        margin,
    )
}
