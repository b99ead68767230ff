//! Single-channel float images used inside the flow estimator.

use crate::frame::GrayFrame;
use crate::transform::resize::{linear_taps, resample_grid};

/// Row-major `f32` image.
#[derive(Debug, Clone)]
pub(crate) struct Plane {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl Plane {
    pub fn from_gray(gray: &GrayFrame) -> Self {
        Self {
            width: gray.width() as usize,
            height: gray.height() as usize,
            data: gray.luma().iter().map(|&v| v as f32).collect(),
        }
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Separable Gaussian blur with `gfedcb|abcdefgh|gfedcba` borders.
    ///
    /// A non-positive `sigma` is derived from the kernel size.
    pub fn gaussian_blur(&self, ksize: usize, sigma: f64) -> Plane {
        let kernel = gaussian_kernel(ksize, sigma);
        let radius = (kernel.len() / 2) as i64;
        let (w, h) = (self.width, self.height);

        let mut horizontal = vec![0.0f32; w * h];
        for y in 0..h {
            let row = &self.data[y * w..(y + 1) * w];
            for x in 0..w {
                let mut acc = 0.0f32;
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = reflect101(x as i64 + k as i64 - radius, w);
                    acc += row[sx] * weight;
                }
                horizontal[y * w + x] = acc;
            }
        }

        let mut data = vec![0.0f32; w * h];
        for y in 0..h {
            for (k, weight) in kernel.iter().enumerate() {
                let sy = reflect101(y as i64 + k as i64 - radius, h);
                let src = &horizontal[sy * w..(sy + 1) * w];
                let dst = &mut data[y * w..(y + 1) * w];
                for (d, s) in dst.iter_mut().zip(src) {
                    *d += s * weight;
                }
            }
        }

        Plane {
            width: w,
            height: h,
            data,
        }
    }

    /// Bilinear resize to `width × height`.
    pub fn resized(&self, width: usize, height: usize) -> Plane {
        if (width, height) == (self.width, self.height) {
            return self.clone();
        }
        let x_taps = linear_taps(self.width, width);
        let y_taps = linear_taps(self.height, height);
        let data = resample_grid(&self.data, self.width, &x_taps, &y_taps, |p00, p10, p01, p11, wx, wy| {
            let top = p00 * (1.0 - wx) + p10 * wx;
            let bottom = p01 * (1.0 - wx) + p11 * wx;
            top * (1.0 - wy) + bottom * wy
        });
        Plane {
            width,
            height,
            data,
        }
    }
}

/// Normalized 1D Gaussian kernel of odd length `ksize`.
pub(crate) fn gaussian_kernel(ksize: usize, sigma: f64) -> Vec<f32> {
    let ksize = ksize.max(1) | 1;
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let radius = (ksize / 2) as f64;
    let weights: Vec<f64> = (0..ksize)
        .map(|i| {
            let x = i as f64 - radius;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / sum) as f32).collect()
}

/// Mirror an index into `[0, len)` without repeating the edge sample.
#[inline]
pub(crate) fn reflect101(i: i64, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len as i64 - 1);
    let m = i.rem_euclid(period);
    if m >= len as i64 {
        (period - m) as usize
    } else {
        m as usize
    }
}
