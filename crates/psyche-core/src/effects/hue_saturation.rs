//! Hue rotation with dosage-proportional saturation boost.

use crate::frame::Frame;
use crate::transform::color::{CHANNEL_MAX, HUE_SPAN, hsv_to_rgb, rgb_to_hsv};

/// Dosage at which saturation is doubled.
const SATURATION_DOSAGE_SCALE: f32 = 500.0;

/// Rotates hue by `dosage` half-degrees and scales saturation by
/// `1 + dosage / 500`, clamped to the channel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueSaturation {
    pub dosage: f32,
}

impl HueSaturation {
    pub fn new(dosage: f32) -> Self {
        Self { dosage }
    }

    pub fn apply(&self, frame: &Frame) -> Frame {
        if self.dosage.abs() < 1e-7 {
            return frame.clone();
        }

        let saturation_gain = 1.0 + self.dosage / SATURATION_DOSAGE_SCALE;
        let (w, h) = frame.dimensions();
        Frame::from_fn(w, h, |x, y| {
            let mut hsv = rgb_to_hsv(frame.pixel(x, y));
            hsv.h = (hsv.h + self.dosage).rem_euclid(HUE_SPAN);
            hsv.s = (hsv.s * saturation_gain).clamp(0.0, CHANNEL_MAX);
            hsv_to_rgb(hsv)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HUE_TOLERANCE: f32 = 1.5;

    fn hue_distance(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(HUE_SPAN);
        d.min(HUE_SPAN - d)
    }

    fn swatches() -> Frame {
        Frame::from_pixels(
            4,
            1,
            vec![[200, 60, 30], [30, 180, 90], [40, 70, 220], [230, 200, 20]],
        )
        .unwrap()
    }

    #[test]
    fn test_zero_dosage_is_identity() {
        let frame = swatches();
        assert_eq!(HueSaturation::new(0.0).apply(&frame), frame);
    }

    #[test]
    fn test_hue_advances_by_dosage_modulo_span() {
        let frame = swatches();
        for dosage in [17.0, 90.0, 179.0, 250.0, 500.0] {
            let out = HueSaturation::new(dosage).apply(&frame);
            for x in 0..frame.width() {
                let before = rgb_to_hsv(frame.pixel(x, 0)).h;
                let after = rgb_to_hsv(out.pixel(x, 0)).h;
                let expected = (before + dosage) % HUE_SPAN;
                assert!(
                    hue_distance(after, expected) < HUE_TOLERANCE,
                    "dosage {dosage}, swatch {x}: {after} vs {expected}"
                );
            }
        }
    }

    #[test]
    fn test_saturation_grows_and_clamps() {
        let muted = Frame::filled(1, 1, [150, 120, 110]);
        let before = rgb_to_hsv(muted.pixel(0, 0)).s;
        let after = rgb_to_hsv(HueSaturation::new(250.0).apply(&muted).pixel(0, 0)).s;
        assert!((after - before * 1.5).abs() < 3.0, "{before} -> {after}");

        let vivid = Frame::filled(1, 1, [255, 0, 0]);
        let out = rgb_to_hsv(HueSaturation::new(500.0).apply(&vivid).pixel(0, 0));
        assert!(out.s <= CHANNEL_MAX);
    }

    #[test]
    fn test_gray_stays_gray() {
        let gray = Frame::filled(2, 2, [90, 90, 90]);
        assert_eq!(HueSaturation::new(123.0).apply(&gray), gray);
    }
}
