//! Offline demo: builds a poster from the synthetic map source.
//!
//! Run with: cargo run --example poster_demo

use mapposter::cache::MemoryCache;
use mapposter::mapper::SyntheticSource;
use mapposter::{PosterBuilder, PosterConfig, Rgb, VAlign};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = PosterConfig {
        place: "Demoville".to_string(),
        band_alpha: 60,
        header_valign: VAlign::Bottom,
        background_color: Rgb::from_hex("#f5e8d7")?,
        street_color: Rgb::from_hex("#ba897a")?,
        ..Default::default()
    };

    let builder = PosterBuilder::new(
        Box::new(SyntheticSource::new()),
        Box::new(MemoryCache::new()),
        "demo-posters",
    );

    println!("building your poster of Demoville");
    let output = builder.build("demoville", &config)?;
    println!("document: {}", output.pdf.display());
    println!("preview:  {}", output.png.display());

    Ok(())
}
