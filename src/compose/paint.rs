//! Draw-command display list emitted by the compositor.
//!
//! Commands are consumed in emission order by both page renderers (the PDF
//! canvas and the PNG preview), so z-order is simply the order of the list.

use crate::{Rgb, TextStyle};

/// A single drawing instruction, in page coordinates (points, origin at the
/// bottom-left corner of the page).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Opaque rectangle fill
    FilledRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Rgb,
    },

    /// Translucent rectangle overlay (the header band)
    Band {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Rgb,
        alpha: u8,
    },

    /// The poster raster, placed by center point and final size
    Image {
        cx: f64,
        cy: f64,
        width: f64,
        height: f64,
    },

    /// A text run with its baseline origin at (x, y)
    Text { x: f64, y: f64, style: TextStyle },

    /// Stroked rectangle; the stroke straddles the path (the margin frame)
    FrameRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        stroke_width: f64,
        color: Rgb,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_command_fields() {
        let cmd = DrawCommand::Band {
            x: 15.0,
            y: 40.0,
            width: 180.0,
            height: 55.0,
            color: Rgb::new(0, 0, 0),
            alpha: 10,
        };
        match cmd {
            DrawCommand::Band { width, alpha, .. } => {
                assert_eq!(width, 180.0);
                assert_eq!(alpha, 10);
            }
            _ => panic!("unexpected"),
        }
    }
}
