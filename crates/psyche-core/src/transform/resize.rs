//! Image resizing.
//!
//! Both interpolation modes are separable: each output row and column is
//! described by an [`AxisTap`] computed once per axis, then the same taps are
//! shared by every sample type that needs resizing (color frames here, float
//! planes and flow fields inside the optical-flow estimator).

use crate::frame::Frame;

/// Interpolation rule used when resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Pixel-center bilinear interpolation with edge replication.
    Bilinear,
    /// Nearest neighbor, `src = floor(dst · scale)`.
    Nearest,
}

/// Source taps for one output coordinate along a single axis.
///
/// The output sample is `src[i0] · (1 − w1) + src[i1] · w1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisTap {
    pub i0: usize,
    pub i1: usize,
    pub w1: f32,
}

/// Bilinear taps using the pixel-center mapping `src = (dst + 0.5)·scale − 0.5`.
pub(crate) fn linear_taps(src_len: usize, dst_len: usize) -> Vec<AxisTap> {
    let scale = src_len as f64 / dst_len as f64;
    let last = src_len.saturating_sub(1);
    (0..dst_len)
        .map(|d| {
            let f = (d as f64 + 0.5) * scale - 0.5;
            if f <= 0.0 {
                return AxisTap { i0: 0, i1: 0, w1: 0.0 };
            }
            let i0 = f.floor() as usize;
            if i0 >= last {
                return AxisTap { i0: last, i1: last, w1: 0.0 };
            }
            AxisTap {
                i0,
                i1: i0 + 1,
                w1: (f - i0 as f64) as f32,
            }
        })
        .collect()
}

/// Nearest-neighbor taps.
pub(crate) fn nearest_taps(src_len: usize, dst_len: usize) -> Vec<AxisTap> {
    let scale = src_len as f64 / dst_len as f64;
    let last = src_len.saturating_sub(1);
    (0..dst_len)
        .map(|d| {
            let i = ((d as f64 * scale).floor() as usize).min(last);
            AxisTap { i0: i, i1: i, w1: 0.0 }
        })
        .collect()
}

/// Resample a row-major grid through precomputed taps.
///
/// `blend(p00, p10, p01, p11, wx, wy)` combines the four neighbors.
pub(crate) fn resample_grid<T: Copy>(
    src: &[T],
    src_width: usize,
    x_taps: &[AxisTap],
    y_taps: &[AxisTap],
    blend: impl Fn(T, T, T, T, f32, f32) -> T,
) -> Vec<T> {
    let mut out = Vec::with_capacity(x_taps.len() * y_taps.len());
    for ty in y_taps {
        let row0 = ty.i0 * src_width;
        let row1 = ty.i1 * src_width;
        for tx in x_taps {
            out.push(blend(
                src[row0 + tx.i0],
                src[row0 + tx.i1],
                src[row1 + tx.i0],
                src[row1 + tx.i1],
                tx.w1,
                ty.w1,
            ));
        }
    }
    out
}

/// Bilinear blend of four 8-bit RGB neighbors.
#[inline]
pub(crate) fn blend_rgb(
    p00: [u8; 3],
    p10: [u8; 3],
    p01: [u8; 3],
    p11: [u8; 3],
    wx: f32,
    wy: f32,
) -> [u8; 3] {
    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as f32 * (1.0 - wx) + p10[c] as f32 * wx;
        let bottom = p01[c] as f32 * (1.0 - wx) + p11[c] as f32 * wx;
        let v = top * (1.0 - wy) + bottom * wy;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Resize a frame to `width × height` (each raised to at least 1).
pub fn resize(frame: &Frame, width: u32, height: u32, interpolation: Interpolation) -> Frame {
    let width = width.max(1);
    let height = height.max(1);
    if frame.dimensions() == (width, height) {
        return frame.clone();
    }

    let (src_w, src_h) = (frame.width() as usize, frame.height() as usize);
    let (x_taps, y_taps) = match interpolation {
        Interpolation::Bilinear => (
            linear_taps(src_w, width as usize),
            linear_taps(src_h, height as usize),
        ),
        Interpolation::Nearest => (
            nearest_taps(src_w, width as usize),
            nearest_taps(src_h, height as usize),
        ),
    };

    let pixels = resample_grid(frame.pixels(), src_w, &x_taps, &y_taps, blend_rgb);
    Frame::from_raw_parts(width, height, pixels)
}
