//! Synthetic moving test pattern.

use psyche_core::Frame;

use super::FrameReader;
use crate::error::SourceError;

/// Pixels the bright disc travels per frame.
const DRIFT_PER_FRAME: f32 = 2.0;

/// Generates a color gradient with a bright disc drifting across it, so the
/// motion warp has something to follow without a camera.
#[derive(Debug, Clone)]
pub struct PatternReader {
    width: u32,
    height: u32,
    limit: Option<u64>,
    produced: u64,
}

impl PatternReader {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            limit: None,
            produced: 0,
        }
    }

    /// End the stream after `frames` frames.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    /// Render frame number `index`.
    pub fn render(&self, index: u64) -> Frame {
        let (w, h) = (self.width as f32, self.height as f32);
        let radius = w.min(h) * 0.15;
        let travel = (w + 2.0 * radius).max(1.0);
        let cx = (index as f32 * DRIFT_PER_FRAME) % travel - radius;
        let cy = h * 0.5;

        Frame::from_fn(self.width, self.height, |x, y| {
            let (fx, fy) = (x as f32, y as f32);
            let dist = ((fx - cx).powi(2) + (fy - cy).powi(2)).sqrt();
            if dist <= radius {
                [250, 240, 200]
            } else {
                [
                    (fx / w * 255.0) as u8,
                    (fy / h * 255.0) as u8,
                    ((index * 3) % 256) as u8,
                ]
            }
        })
    }
}

impl FrameReader for PatternReader {
    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        if self.limit.is_some_and(|limit| self.produced >= limit) {
            return Ok(None);
        }
        let frame = self.render(self.produced);
        self.produced += 1;
        Ok(Some(frame))
    }
}
