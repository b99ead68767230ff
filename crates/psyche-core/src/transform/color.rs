//! RGB ↔ HSV conversion in the 8-bit video convention.
//!
//! Hue is expressed in half-degrees so that the full wheel fits in `[0, 180)`,
//! and saturation and value span `[0, 255]`. The math itself is delegated to
//! `palette`; this module only handles the scaling.

use palette::{FromColor, Hsv, Srgb};

/// Span of the hue wheel in half-degree units.
pub const HUE_SPAN: f32 = 180.0;

/// Upper bound of the saturation and value channels.
pub const CHANNEL_MAX: f32 = 255.0;

/// A pixel in HSV space, not yet quantized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsvPixel {
    /// Hue in half-degrees, `[0, 180)`.
    pub h: f32,
    /// Saturation, `[0, 255]`.
    pub s: f32,
    /// Value, `[0, 255]`.
    pub v: f32,
}

/// Convert an 8-bit RGB pixel to HSV.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> HsvPixel {
    let srgb: Srgb<f32> = Srgb::<u8>::new(rgb[0], rgb[1], rgb[2]).into_format();
    let hsv: Hsv = Hsv::from_color(srgb);
    let h = (hsv.hue.into_positive_degrees() / 2.0) % HUE_SPAN;
    HsvPixel {
        h,
        s: hsv.saturation * CHANNEL_MAX,
        v: hsv.value * CHANNEL_MAX,
    }
}

/// Convert an HSV pixel back to 8-bit RGB, rounding each channel.
///
/// Hue wraps; saturation and value are clamped into range first.
pub fn hsv_to_rgb(px: HsvPixel) -> [u8; 3] {
    let hue_degrees = px.h.rem_euclid(HUE_SPAN) * 2.0;
    let s = (px.s / CHANNEL_MAX).clamp(0.0, 1.0);
    let v = (px.v / CHANNEL_MAX).clamp(0.0, 1.0);
    let hsv: Hsv = Hsv::new(hue_degrees, s, v);
    let rgb: Srgb<f32> = Srgb::from_color(hsv);
    [
        quantize(rgb.red),
        quantize(rgb.green),
        quantize(rgb.blue),
    ]
}

#[inline]
fn quantize(unit: f32) -> u8 {
    (unit * CHANNEL_MAX).round().clamp(0.0, CHANNEL_MAX) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    #[test]
    fn test_primary_hues_use_half_degrees() {
        assert!(rgb_to_hsv([255, 0, 0]).h.abs() < EPSILON);
        assert!((rgb_to_hsv([0, 255, 0]).h - 60.0).abs() < EPSILON);
        assert!((rgb_to_hsv([0, 0, 255]).h - 120.0).abs() < EPSILON);
    }

    #[test]
    fn test_gray_has_zero_saturation() {
        let hsv = rgb_to_hsv([128, 128, 128]);
        assert!(hsv.s.abs() < EPSILON);
        assert!((hsv.v - 128.0).abs() < EPSILON);
    }

    #[test]
    fn test_round_trip_is_lossless_for_bytes() {
        for rgb in [[200, 60, 30], [12, 250, 99], [0, 0, 0], [255, 255, 255], [17, 17, 200]] {
            assert_eq!(hsv_to_rgb(rgb_to_hsv(rgb)), rgb, "round trip of {rgb:?}");
        }
    }

    #[test]
    fn test_hue_wraps_past_span() {
        let red = HsvPixel { h: 180.0, s: 255.0, v: 255.0 };
        assert_eq!(hsv_to_rgb(red), [255, 0, 0]);
    }
}
