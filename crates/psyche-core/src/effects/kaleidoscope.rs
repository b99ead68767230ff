//! Mirrored-quad kaleidoscope.

use crate::frame::Frame;
use crate::transform::{Interpolation, crop, mirror_quad, resize};

/// Takes the top-left square of side `min(w, h) / tiles`, mirrors it into a
/// 2×2 composite and stretches the composite over the full frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kaleidoscope {
    pub tiles: u32,
}

impl Kaleidoscope {
    pub fn new(tiles: u32) -> Self {
        Self { tiles }
    }

    /// Side length of the square sampled from the source.
    pub fn tile_side(&self, width: u32, height: u32) -> u32 {
        (width.min(height) / self.tiles.max(1)).max(1)
    }

    pub fn apply(&self, frame: &Frame) -> Frame {
        let (w, h) = frame.dimensions();
        let side = self.tile_side(w, h);
        let quad = crop(frame, 0, 0, side, side);
        let composite = mirror_quad(&quad);
        resize(&composite, w, h, Interpolation::Bilinear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagonal(w: u32, h: u32) -> Frame {
        Frame::from_fn(w, h, |x, y| [(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
    }

    fn channel_gap(a: [u8; 3], b: [u8; 3]) -> u8 {
        a.iter().zip(b).map(|(p, q)| p.abs_diff(q)).max().unwrap_or(0)
    }

    #[test]
    fn test_tile_side_never_zero() {
        let fx = Kaleidoscope::new(20);
        assert_eq!(fx.tile_side(5, 40), 1);
        assert_eq!(Kaleidoscope::new(4).tile_side(64, 48), 12);
        assert_eq!(Kaleidoscope::new(0).tile_side(9, 9), 9);
    }

    #[test]
    fn test_output_keeps_dimensions() {
        let frame = diagonal(40, 30);
        for tiles in [1, 3, 20] {
            assert_eq!(Kaleidoscope::new(tiles).apply(&frame).dimensions(), (40, 30));
        }
    }

    #[test]
    fn test_output_is_mirror_symmetric() {
        let frame = diagonal(48, 48);
        for tiles in [1, 2, 5] {
            let out = Kaleidoscope::new(tiles).apply(&frame);
            let (w, h) = out.dimensions();
            for y in 0..h {
                for x in 0..w {
                    let px = out.pixel(x, y);
                    assert!(channel_gap(px, out.pixel(w - 1 - x, y)) <= 1);
                    assert!(channel_gap(px, out.pixel(x, h - 1 - y)) <= 1);
                }
            }
        }
    }

    #[test]
    fn test_single_pixel_tile_gives_solid_frame() {
        let frame = diagonal(10, 10);
        let out = Kaleidoscope::new(20).apply(&frame);
        let first = frame.pixel(0, 0);
        assert!(out.pixels().iter().all(|px| *px == first));
    }
}
