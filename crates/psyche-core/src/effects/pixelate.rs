//! Block mosaic via smooth downscale and nearest upscale.

use crate::frame::Frame;
use crate::transform::{Interpolation, resize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixelate {
    pub tile_size: u32,
}

impl Pixelate {
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }

    pub fn apply(&self, frame: &Frame) -> Frame {
        let (w, h) = frame.dimensions();
        let ts = self.tile_size.max(1);
        let small = resize(frame, (w / ts).max(1), (h / ts).max(1), Interpolation::Bilinear);
        resize(&small, w, h, Interpolation::Nearest)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn noisy(w: u32, h: u32) -> Frame {
        Frame::from_fn(w, h, |x, y| {
            let v = (x * 37 + y * 91) % 256;
            [v as u8, (255 - v) as u8, ((x ^ y) * 13 % 256) as u8]
        })
    }

    fn distinct(frame: &Frame) -> usize {
        frame.pixels().iter().collect::<HashSet<_>>().len()
    }

    #[test]
    fn test_distinct_colors_bounded_by_block_count() {
        let frame = noisy(50, 30);
        for ts in [2u32, 3, 7, 16, 100] {
            let out = Pixelate::new(ts).apply(&frame);
            let bound = 50u32.div_ceil(ts) * 30u32.div_ceil(ts);
            assert!(distinct(&out) as u32 <= bound, "tile {ts}");
            assert_eq!(out.dimensions(), (50, 30));
        }
    }

    #[test]
    fn test_full_size_tile_collapses_to_one_color() {
        let frame = noisy(24, 24);
        assert_eq!(distinct(&Pixelate::new(24).apply(&frame)), 1);
    }

    #[test]
    fn test_blocks_are_uniform() {
        let frame = noisy(16, 16);
        let out = Pixelate::new(4).apply(&frame);
        for by in 0..4 {
            for bx in 0..4 {
                let anchor = out.pixel(bx * 4, by * 4);
                for dy in 0..4 {
                    for dx in 0..4 {
                        assert_eq!(out.pixel(bx * 4 + dx, by * 4 + dy), anchor);
                    }
                }
            }
        }
    }
}
