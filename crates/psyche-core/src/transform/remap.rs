//! Coordinate remapping with bilinear sampling and reflective edges.

use glam::Vec2;

use crate::frame::Frame;
use crate::transform::resize::blend_rgb;

/// Mirror an out-of-range index back into `[0, len)`.
///
/// The edge sample is repeated (`fedcba|abcdefgh|hgfedcb`), so `-1` maps to
/// `0` and `len` maps to `len - 1`.
#[inline]
pub fn reflect_index(i: i64, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let len = len as i64;
    let period = 2 * len;
    let m = i.rem_euclid(period);
    if m >= len {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}

/// Sample `frame` at a fractional coordinate.
#[inline]
pub fn sample_bilinear(frame: &Frame, x: f32, y: f32) -> [u8; 3] {
    let (w, h) = (frame.width() as usize, frame.height() as usize);
    let x = if x.is_finite() { x } else { 0.0 };
    let y = if y.is_finite() { y } else { 0.0 };
    let x0 = x.floor();
    let y0 = y.floor();
    let wx = x - x0;
    let wy = y - y0;

    let xa = reflect_index(x0 as i64, w) as u32;
    let xb = reflect_index(x0 as i64 + 1, w) as u32;
    let ya = reflect_index(y0 as i64, h) as u32;
    let yb = reflect_index(y0 as i64 + 1, h) as u32;

    blend_rgb(
        frame.pixel(xa, ya),
        frame.pixel(xb, ya),
        frame.pixel(xa, yb),
        frame.pixel(xb, yb),
        wx,
        wy,
    )
}

/// Produce a new frame where each output pixel `(x, y)` samples the source at
/// `(x, y) + offset(x, y)`.
pub fn remap(frame: &Frame, offset: impl Fn(u32, u32) -> Vec2) -> Frame {
    let (w, h) = frame.dimensions();
    let mut pixels = Vec::with_capacity(w as usize * h as usize);
    for y in 0..h {
        for x in 0..w {
            let d = offset(x, y);
            pixels.push(sample_bilinear(frame, x as f32 + d.x, y as f32 + d.y));
        }
    }
    Frame::from_raw_parts(w, h, pixels)
}
