//! Duotone recolorizer: maps a grayscale raster onto a two-color gradient.
//!
//! Luminance 0 becomes the `black` color and 255 the `white` color, with
//! linear interpolation in between. For the poster this turns the
//! black-background/white-street map raster into paper and street tones.

use image::RgbImage;

use crate::error::Result;
use crate::Rgb;

/// Decode `png`, convert to grayscale and recolor it as a duotone.
///
/// Returns the recolored raster; its dimensions match the input.
pub fn duotone(png: &[u8], black: Rgb, white: Rgb) -> Result<RgbImage> {
    let gray = image::load_from_memory(png)?.to_luma8();
    let (width, height) = gray.dimensions();

    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        let t = pixel[0] as f64 / 255.0;
        let c = black.lerp(white, t);
        out.put_pixel(x, y, image::Rgb([c.r, c.g, c.b]));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    fn gray_png(levels: &[u8]) -> Vec<u8> {
        let img = GrayImage::from_raw(levels.len() as u32, 1, levels.to_vec()).unwrap();
        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn endpoints_map_to_the_two_colors() {
        let background = Rgb::new(0xf5, 0xe8, 0xd7);
        let street = Rgb::new(0xba, 0x89, 0x7a);
        let out = duotone(&gray_png(&[0, 255]), background, street).unwrap();
        assert_eq!(out.get_pixel(0, 0), &image::Rgb([0xf5, 0xe8, 0xd7]));
        assert_eq!(out.get_pixel(1, 0), &image::Rgb([0xba, 0x89, 0x7a]));
    }

    #[test]
    fn midtone_interpolates() {
        let out = duotone(&gray_png(&[128]), Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)).unwrap();
        let px = out.get_pixel(0, 0);
        assert!(px[0] >= 127 && px[0] <= 129, "got {px:?}");
    }

    #[test]
    fn garbage_bytes_are_an_image_error() {
        assert!(matches!(
            duotone(b"not a png", Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)),
            Err(crate::Error::Image(_))
        ));
    }
}
