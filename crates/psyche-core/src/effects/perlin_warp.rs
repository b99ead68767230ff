//! Noise-driven displacement warp.

use glam::Vec2;

use crate::frame::Frame;
use crate::noise::placeholder_noise;
use crate::transform::remap;

/// Displaces every sample by `amplitude × noise(x, y)` along both axes.
///
/// `hits` sets the noise frequency: the placeholder field spans `hits`
/// radians across each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerlinWarp {
    pub amplitude: f32,
    pub hits: u32,
}

impl PerlinWarp {
    pub fn new(amplitude: f32, hits: u32) -> Self {
        Self { amplitude, hits }
    }

    pub fn apply(&self, frame: &Frame) -> Frame {
        if self.amplitude == 0.0 {
            return frame.clone();
        }

        let (w, h) = frame.dimensions();
        let noise = placeholder_noise(w, h, self.hits as f32);
        let amplitude = self.amplitude;
        remap(frame, |x, y| {
            Vec2::splat(amplitude * noise[(y * w + x) as usize])
        })
    }
}
