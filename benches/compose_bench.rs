use criterion::{criterion_group, criterion_main, Criterion};

use mapposter::compose::{self, ComposeOptions, TextMeasure};
use mapposter::font::FontCatalog;
use mapposter::{CropMode, HAlign, PageGeometry, Rgb, TextStyle, VAlign};

struct FixedMeasure;

impl TextMeasure for FixedMeasure {
    fn string_width(&self, text: &str, _font: &str, size: f64) -> mapposter::Result<f64> {
        Ok(text.chars().count() as f64 * size * 0.5)
    }
}

fn options() -> ComposeOptions {
    ComposeOptions {
        geometry: PageGeometry::new(297.0, 210.0, 25.0),
        background_color: Rgb::new(0xf5, 0xe8, 0xd7),
        margin_color: Rgb::new(0xff, 0xff, 0xff),
        image_halign: HAlign::Center,
        image_valign: VAlign::Center,
        image_crop: CropMode::Width,
        aspect_ratio: 0.6,
        header_valign: VAlign::Center,
        band_color: Rgb::new(0, 0, 0),
        band_alpha: 10,
        title: TextStyle::title_default(),
        subtitle: TextStyle::subtitle_default(),
    }
}

fn bench_compose(c: &mut Criterion) {
    let opts = options();
    c.bench_function("compose_poster", |b| {
        b.iter(|| compose::compose_poster(&opts, &FixedMeasure).unwrap())
    });
}

fn bench_compose_with_catalog_metrics(c: &mut Criterion) {
    let opts = options();
    let fonts = FontCatalog::new();
    c.bench_function("compose_poster_catalog", |b| {
        b.iter(|| compose::compose_poster(&opts, &fonts).unwrap())
    });
}

criterion_group!(benches, bench_compose, bench_compose_with_catalog_metrics);
criterion_main!(benches);
