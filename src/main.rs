use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use mapposter::cache::DiskCache;
use mapposter::font::FontCatalog;
use mapposter::mapper::{MapSource, SyntheticSource};
use mapposter::{PosterBuilder, PosterConfig};

/// Build decorative city-map posters from a JSON configuration file.
///
/// The configuration maps poster names to build settings; see
/// `PosterConfig` for the available fields. Every field has a default, so
/// `{"lyon": {"place": "Lyon, France"}}` is a complete configuration.
#[derive(Parser, Debug)]
#[command(name = "mapposter", version, about)]
struct Args {
    /// Path to the JSON city configuration
    #[arg(long)]
    config: PathBuf,

    /// Directory for the generated posters
    #[arg(long, default_value = "posters")]
    out_dir: PathBuf,

    /// Directory for cached street rasters
    #[arg(long, default_value = "data")]
    cache_dir: PathBuf,

    /// Register a TrueType face: NAME=path/to/font.ttf (repeatable)
    #[arg(long = "font", value_name = "NAME=PATH")]
    fonts: Vec<String>,

    /// Use the synthetic offline map source instead of the network
    #[arg(long)]
    offline: bool,
}

fn map_source(args: &Args) -> anyhow::Result<Box<dyn MapSource>> {
    if args.offline {
        return Ok(Box::new(SyntheticSource::new()));
    }

    #[cfg(feature = "overpass")]
    {
        Ok(Box::new(mapposter::mapper::OverpassSource::default_endpoints()?))
    }

    #[cfg(not(feature = "overpass"))]
    {
        anyhow::bail!(
            "built without the 'overpass' feature; rerun with --offline or rebuild with --features overpass"
        )
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config_text = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read {}", args.config.display()))?;
    let cities: BTreeMap<String, PosterConfig> =
        serde_json::from_str(&config_text).context("failed to parse city configuration")?;

    let mut fonts = FontCatalog::new();
    for entry in &args.fonts {
        let (name, path) = entry
            .split_once('=')
            .with_context(|| format!("font registration {entry:?} is not NAME=PATH"))?;
        fonts
            .register_ttf_file(name, std::path::Path::new(path))
            .with_context(|| format!("failed to load font {path}"))?;
    }

    let builder = PosterBuilder::new(
        map_source(&args)?,
        Box::new(DiskCache::new(&args.cache_dir)),
        &args.out_dir,
    )
    .with_fonts(fonts);

    for (name, city) in &cities {
        println!("building your poster of {name}");
        let output = builder
            .build(name, city)
            .with_context(|| format!("failed to build poster {name:?}"))?;
        println!("poster of {name} created: {}", output.pdf.display());
    }

    Ok(())
}
