//! Golden test: the compositor's command sequence for a reference
//! configuration is content-addressed with a digest. Run with
//! `UPDATE_GOLDENS=1` to (re)create the fixture.

use std::fs;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use mapposter::compose::{self, ComposeOptions, TextMeasure};
use mapposter::{CropMode, HAlign, PageGeometry, Rgb, TextStyle, VAlign};

struct FixedMeasure;

impl TextMeasure for FixedMeasure {
    fn string_width(&self, text: &str, _font: &str, size: f64) -> mapposter::Result<f64> {
        Ok(text.chars().count() as f64 * size * 0.5)
    }
}

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

fn reference_options() -> ComposeOptions {
    ComposeOptions {
        geometry: PageGeometry::new(297.0, 210.0, 25.0),
        background_color: Rgb::new(0xf5, 0xe8, 0xd7),
        margin_color: Rgb::new(0xff, 0xff, 0xff),
        image_halign: HAlign::Center,
        image_valign: VAlign::Center,
        image_crop: CropMode::Width,
        aspect_ratio: 0.6,
        header_valign: VAlign::Bottom,
        band_color: Rgb::new(0x15, 0x64, 0x89),
        band_alpha: 60,
        title: TextStyle::title_default(),
        subtitle: TextStyle::subtitle_default(),
    }
}

#[test]
fn golden_command_digest_matches_fixture() {
    let commands = compose::compose_poster(&reference_options(), &FixedMeasure).unwrap();

    // Two invocations must agree bit for bit before any digesting
    let again = compose::compose_poster(&reference_options(), &FixedMeasure).unwrap();
    assert_eq!(commands, again);

    let mut hasher = Sha256::new();
    hasher.update(format!("{commands:#?}").as_bytes());
    let digest = hex::encode(hasher.finalize());

    let expected_path = golden_path("compose_commands.digest");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, &digest).expect("write golden");
        println!("Updated golden: {expected_path:?}");
        return;
    }

    if !expected_path.exists() {
        println!("No golden at {expected_path:?}; run with UPDATE_GOLDENS=1 to create it. Skipping.");
        return;
    }

    let expected = fs::read_to_string(&expected_path).expect("unable to read golden");
    assert_eq!(digest, expected.trim());
}
