//! Street-map raster source.
//!
//! A [`MapSource`] turns a place query and a set of street layers into a
//! grayscale PNG: white streets on a black background, later recolored as a
//! duotone by the pipeline. The default backend geocodes the place through
//! Nominatim and pulls way geometry from the Overpass API; a deterministic
//! synthetic backend is provided for tests, demos and offline use.

use std::collections::BTreeMap;

use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named style configuration: which road classes to draw and how wide.
///
/// Stroke widths are keyed by road-class tag, with an `"other"` entry as the
/// fallback for classes not listed. A `BTreeMap` keeps serialization stable,
/// which the content-addressed cache key depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    /// Pipe-separated list of road classes to include
    pub filter: String,
    /// Stroke width per road class, in style units
    pub widths: BTreeMap<String, f64>,
}

impl Layer {
    /// The standard street layer: major roads wide, residential thin
    pub fn streets() -> Self {
        let mut widths = BTreeMap::new();
        widths.insert("motorway".to_string(), 1.5);
        widths.insert("trunk".to_string(), 1.5);
        widths.insert("primary".to_string(), 0.8);
        widths.insert("secondary".to_string(), 0.5);
        widths.insert("tertiary".to_string(), 0.5);
        widths.insert("other".to_string(), 0.3);
        Self {
            name: "street".to_string(),
            filter: "motorway|trunk|primary|secondary|tertiary|service|unclassified|pedestrian|footway|steps|residential|living_street"
                .to_string(),
            widths,
        }
    }

    /// Does this layer draw the given road class?
    pub fn matches(&self, class: &str) -> bool {
        self.filter.split('|').any(|f| f == class)
    }

    /// Stroke width for a road class, falling back to the `"other"` entry
    pub fn width_for(&self, class: &str) -> f64 {
        self.widths
            .get(class)
            .or_else(|| self.widths.get("other"))
            .copied()
            .unwrap_or(0.3)
    }
}

/// Geographic bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// One way: its road class and its node coordinates as (lat, lon)
#[derive(Debug, Clone)]
pub struct Way {
    pub class: String,
    pub points: Vec<(f64, f64)>,
}

/// Produces the street raster for a place query
pub trait MapSource {
    /// Fetch and rasterize street geometry; returns PNG bytes
    fn fetch(&self, place: &str, layers: &[Layer]) -> Result<Vec<u8>>;
}

/// Longest canvas edge of the street raster, in pixels
pub const RASTER_EDGE: u32 = 2000;

/// Pixels of stroke per style-width unit on a 1200px edge; strokes scale
/// with the canvas so the relative weight of road classes is resolution
/// independent.
fn stroke_px(width_units: f64, long_edge: u32) -> f64 {
    (width_units * long_edge as f64 / 1200.0).max(1.0)
}

/// Draw one way segment with a round-capped stroke
fn draw_segment(canvas: &mut GrayImage, a: (f64, f64), b: (f64, f64), stroke: f64) {
    let white = Luma([255u8]);
    if stroke < 1.5 {
        draw_line_segment_mut(canvas, (a.0 as f32, a.1 as f32), (b.0 as f32, b.1 as f32), white);
        return;
    }

    let half = 0.5 * stroke;
    let radius = half.round().max(1.0) as i32;
    draw_filled_circle_mut(canvas, (a.0.round() as i32, a.1.round() as i32), radius, white);
    draw_filled_circle_mut(canvas, (b.0.round() as i32, b.1.round() as i32), radius, white);

    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len < 0.75 {
        return;
    }
    let (nx, ny) = (-dy / len * half, dx / len * half);
    let quad = [
        Point::new((a.0 + nx).round() as i32, (a.1 + ny).round() as i32),
        Point::new((b.0 + nx).round() as i32, (b.1 + ny).round() as i32),
        Point::new((b.0 - nx).round() as i32, (b.1 - ny).round() as i32),
        Point::new((a.0 - nx).round() as i32, (a.1 - ny).round() as i32),
    ];
    if quad[0] != quad[3] && quad[0] != quad[1] {
        draw_polygon_mut(canvas, &quad, white);
    }
}

/// Rasterize ways into a white-on-black street image.
///
/// Coordinates are projected equirectangularly with a cosine correction at
/// the mid latitude; the canvas long edge is `long_edge` pixels and the
/// short edge follows the geographic aspect ratio.
pub fn rasterize_ways(ways: &[Way], bounds: GeoBounds, layers: &[Layer], long_edge: u32) -> Result<GrayImage> {
    let lat_extent = bounds.north - bounds.south;
    let lon_extent = bounds.east - bounds.west;
    if lat_extent <= 0.0 || lon_extent <= 0.0 {
        return Err(Error::MapData(format!("degenerate bounding box: {bounds:?}")));
    }

    let mid_lat = 0.5 * (bounds.north + bounds.south);
    let x_extent = lon_extent * mid_lat.to_radians().cos();
    let aspect = lat_extent / x_extent;

    let (width, height) = if aspect <= 1.0 {
        (long_edge, ((long_edge as f64 * aspect).round() as u32).max(1))
    } else {
        (((long_edge as f64 / aspect).round() as u32).max(1), long_edge)
    };

    let mut canvas = GrayImage::from_pixel(width, height, Luma([0u8]));

    let project = |lat: f64, lon: f64| -> (f64, f64) {
        let x = (lon - bounds.west) / lon_extent * width as f64;
        let y = (bounds.north - lat) / lat_extent * height as f64;
        (x, y)
    };

    for way in ways {
        let Some(layer) = layers.iter().find(|l| l.matches(&way.class)) else {
            continue;
        };
        let stroke = stroke_px(layer.width_for(&way.class), long_edge);
        for pair in way.points.windows(2) {
            let a = project(pair[0].0, pair[0].1);
            let b = project(pair[1].0, pair[1].1);
            draw_segment(&mut canvas, a, b, stroke);
        }
    }

    Ok(canvas)
}

/// Encode the street raster as PNG bytes
pub fn encode_gray_png(img: &GrayImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageLuma8(img.clone())
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

/// Deterministic offline source: draws a street-like grid with a diagonal
/// avenue. Useful for demos and for pipeline tests that must not touch the
/// network.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    pub long_edge: u32,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self { long_edge: 800 }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSource for SyntheticSource {
    fn fetch(&self, _place: &str, layers: &[Layer]) -> Result<Vec<u8>> {
        let bounds = GeoBounds { south: 45.0, west: 4.0, north: 45.5, east: 4.7 };
        let mut ways = Vec::new();

        // Grid of residential streets
        for i in 1..10 {
            let lat = bounds.south + i as f64 * 0.05;
            ways.push(Way {
                class: "residential".to_string(),
                points: vec![(lat, bounds.west), (lat, bounds.east)],
            });
            let lon = bounds.west + i as f64 * 0.07;
            ways.push(Way {
                class: "residential".to_string(),
                points: vec![(bounds.south, lon), (bounds.north, lon)],
            });
        }
        // One diagonal motorway
        ways.push(Way {
            class: "motorway".to_string(),
            points: vec![(bounds.south, bounds.west), (bounds.north, bounds.east)],
        });

        let canvas = rasterize_ways(&ways, bounds, layers, self.long_edge)?;
        encode_gray_png(&canvas)
    }
}

#[cfg(feature = "overpass")]
pub use self::overpass::{OverpassConfig, OverpassSource};

#[cfg(feature = "overpass")]
mod overpass {
    use super::*;
    use std::time::Duration;

    /// Endpoints and fetch options for the Overpass-backed source
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct OverpassConfig {
        pub nominatim_endpoint: String,
        pub overpass_endpoint: String,
        pub user_agent: String,
        pub timeout_ms: u64,
        /// Longest raster edge in pixels
        pub raster_edge: u32,
    }

    impl Default for OverpassConfig {
        fn default() -> Self {
            Self {
                nominatim_endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
                overpass_endpoint: "https://overpass-api.de/api/interpreter".to_string(),
                user_agent: format!("mapposter/{}", env!("CARGO_PKG_VERSION")),
                timeout_ms: 60_000,
                raster_edge: RASTER_EDGE,
            }
        }
    }

    #[derive(Deserialize)]
    struct NominatimPlace {
        boundingbox: Vec<String>,
    }

    #[derive(Deserialize)]
    struct OverpassResponse {
        #[serde(default)]
        elements: Vec<OverpassElement>,
    }

    #[derive(Deserialize)]
    struct OverpassElement {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        tags: BTreeMap<String, String>,
        #[serde(default)]
        geometry: Vec<OverpassNode>,
    }

    #[derive(Deserialize)]
    struct OverpassNode {
        lat: f64,
        lon: f64,
    }

    /// Street source backed by Nominatim geocoding and the Overpass API
    pub struct OverpassSource {
        client: reqwest::blocking::Client,
        config: OverpassConfig,
    }

    impl OverpassSource {
        pub fn new(config: OverpassConfig) -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_millis(config.timeout_ms))
                .user_agent(config.user_agent.clone())
                .build()
                .map_err(|e| Error::MapData(format!("failed to build HTTP client: {e}")))?;
            Ok(Self { client, config })
        }

        /// A source talking to the public OSM endpoints
        pub fn default_endpoints() -> Result<Self> {
            Self::new(OverpassConfig::default())
        }

        fn geocode(&self, place: &str) -> Result<GeoBounds> {
            let mut url = url::Url::parse(&self.config.nominatim_endpoint)
                .map_err(|e| Error::MapData(format!("bad nominatim endpoint: {e}")))?;
            url.query_pairs_mut()
                .append_pair("q", place)
                .append_pair("format", "json")
                .append_pair("limit", "1");

            let body = self
                .client
                .get(url)
                .send()
                .map_err(|e| Error::MapData(format!("geocoding {place:?} failed: {e}")))?
                .text()
                .map_err(|e| Error::MapData(format!("failed to read geocoding response: {e}")))?;
            let places: Vec<NominatimPlace> = serde_json::from_str(&body)
                .map_err(|e| Error::MapData(format!("bad geocoding response: {e}")))?;

            let place_entry = places
                .first()
                .ok_or_else(|| Error::MapData(format!("no geocoding result for {place:?}")))?;
            // Nominatim bounding boxes are [south, north, west, east] strings
            if place_entry.boundingbox.len() != 4 {
                return Err(Error::MapData("geocoding result has no bounding box".into()));
            }
            let parse = |i: usize| -> Result<f64> {
                place_entry.boundingbox[i]
                    .parse()
                    .map_err(|e| Error::MapData(format!("bad bounding box value: {e}")))
            };
            Ok(GeoBounds {
                south: parse(0)?,
                north: parse(1)?,
                west: parse(2)?,
                east: parse(3)?,
            })
        }

        fn query_ways(&self, bounds: GeoBounds, layers: &[Layer]) -> Result<Vec<Way>> {
            let classes: Vec<&str> = layers.iter().flat_map(|l| l.filter.split('|')).collect();
            let query = format!(
                "[out:json][timeout:{timeout}];way[\"highway\"~\"^({filter})$\"]({s},{w},{n},{e});out geom;",
                timeout = self.config.timeout_ms / 1000,
                filter = classes.join("|"),
                s = bounds.south,
                w = bounds.west,
                n = bounds.north,
                e = bounds.east,
            );

            let body = self
                .client
                .post(&self.config.overpass_endpoint)
                .form(&[("data", query.as_str())])
                .send()
                .map_err(|e| Error::MapData(format!("overpass query failed: {e}")))?
                .text()
                .map_err(|e| Error::MapData(format!("failed to read overpass response: {e}")))?;
            let response: OverpassResponse = serde_json::from_str(&body)
                .map_err(|e| Error::MapData(format!("bad overpass response: {e}")))?;

            let ways = response
                .elements
                .into_iter()
                .filter(|e| e.kind == "way" && e.geometry.len() >= 2)
                .filter_map(|e| {
                    let class = e.tags.get("highway")?.clone();
                    Some(Way {
                        class,
                        points: e.geometry.iter().map(|n| (n.lat, n.lon)).collect(),
                    })
                })
                .collect();
            Ok(ways)
        }
    }

    impl MapSource for OverpassSource {
        fn fetch(&self, place: &str, layers: &[Layer]) -> Result<Vec<u8>> {
            let bounds = self.geocode(place)?;
            log::info!("geocoded {place:?} to {bounds:?}");

            let ways = self.query_ways(bounds, layers)?;
            log::info!("fetched {} ways for {place:?}", ways.len());
            if ways.is_empty() {
                log::warn!("no ways matched the layer filters for {place:?}");
            }

            let canvas = rasterize_ways(&ways, bounds, layers, self.config.raster_edge)?;
            encode_gray_png(&canvas)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn street_layer_widths() {
        let layer = Layer::streets();
        assert_eq!(layer.width_for("motorway"), 1.5);
        assert_eq!(layer.width_for("primary"), 0.8);
        // Unlisted classes fall back to "other"
        assert_eq!(layer.width_for("residential"), 0.3);
        assert!(layer.matches("footway"));
        assert!(!layer.matches("proposed"));
    }

    #[test]
    fn rasterize_draws_streets() {
        let bounds = GeoBounds { south: 0.0, west: 0.0, north: 1.0, east: 1.0 };
        let ways = vec![Way {
            class: "motorway".to_string(),
            points: vec![(0.1, 0.1), (0.9, 0.9)],
        }];
        let img = rasterize_ways(&ways, bounds, &[Layer::streets()], 200).unwrap();
        let lit = img.pixels().filter(|p| p[0] > 0).count();
        assert!(lit > 0, "no street pixels drawn");
    }

    #[test]
    fn rasterize_rejects_degenerate_bounds() {
        let bounds = GeoBounds { south: 1.0, west: 0.0, north: 1.0, east: 1.0 };
        assert!(matches!(
            rasterize_ways(&[], bounds, &[Layer::streets()], 200),
            Err(Error::MapData(_))
        ));
    }

    #[test]
    fn synthetic_source_is_deterministic() {
        let source = SyntheticSource::new();
        let a = source.fetch("anywhere", &[Layer::streets()]).unwrap();
        let b = source.fetch("anywhere", &[Layer::streets()]).unwrap();
        assert_eq!(a, b);
        // Decodes as a PNG with the configured long edge
        let img = image::load_from_memory(&a).unwrap();
        assert_eq!(img.width().max(img.height()), 800);
    }
}
