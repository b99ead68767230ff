//! Dense optical flow between consecutive grayscale frames.
//!
//! A coarse-to-fine polynomial-expansion estimator: each pyramid level fits
//! a local quadratic to both frames, then refines the displacement field by
//! repeatedly solving window-averaged 2×2 normal equations. The result of a
//! coarse level seeds the next finer one.

mod plane;
mod poly;

use glam::Vec2;

use crate::error::CoreError;
use crate::frame::GrayFrame;
use crate::transform::resize::{linear_taps, resample_grid};

use plane::Plane;
use poly::{PolyExpansion, box_blur, update_matrices};

/// Pyramid levels whose shorter side falls below this are skipped.
const MIN_LEVEL_SIZE: f64 = 32.0;

/// Tuning for [`compute_optical_flow_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowParams {
    /// Downscale factor between pyramid levels, in `(0, 1)`.
    pub pyr_scale: f64,
    /// Number of levels below full resolution.
    pub levels: u32,
    /// Side of the averaging window for the normal equations.
    pub win_size: usize,
    /// Refinement passes per level.
    pub iterations: u32,
    /// Side of the polynomial-fit neighborhood (5 → 5×5).
    pub poly_n: usize,
    /// Gaussian sigma weighting the polynomial fit.
    pub poly_sigma: f64,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            pyr_scale: 0.5,
            levels: 3,
            win_size: 15,
            iterations: 3,
            poly_n: 5,
            poly_sigma: 1.2,
        }
    }
}

/// Per-pixel displacement such that `prev(x, y) ≈ next(x + d.x, y + d.y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowField {
    width: u32,
    height: u32,
    vectors: Vec<Vec2>,
}

impl FlowField {
    /// A field of zero motion.
    pub fn zeros(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            vectors: vec![Vec2::ZERO; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Displacement at `(x, y)`.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Vec2 {
        self.vectors[(y * self.width + x) as usize]
    }

    pub fn vectors(&self) -> &[Vec2] {
        &self.vectors
    }

    /// Largest displacement length in the field.
    pub fn max_magnitude(&self) -> f32 {
        self.vectors.iter().map(|v| v.length()).fold(0.0, f32::max)
    }
}

/// Dense optical flow with the default parameters.
pub fn compute_optical_flow(prev: &GrayFrame, next: &GrayFrame) -> Result<FlowField, CoreError> {
    compute_optical_flow_with(prev, next, &FlowParams::default())
}

/// Dense optical flow from `prev` to `next`.
///
/// Fails with [`CoreError::ShapeMismatch`] when the frames differ in size.
pub fn compute_optical_flow_with(
    prev: &GrayFrame,
    next: &GrayFrame,
    params: &FlowParams,
) -> Result<FlowField, CoreError> {
    if prev.dimensions() != next.dimensions() {
        return Err(CoreError::ShapeMismatch {
            expected: prev.dimensions(),
            actual: next.dimensions(),
        });
    }

    let (width, height) = (prev.width() as usize, prev.height() as usize);
    let pyr_scale = params.pyr_scale.clamp(0.1, 0.9);
    let planes = [Plane::from_gray(prev), Plane::from_gray(next)];
    let expansion = PolyExpansion::new(params.poly_n / 2, params.poly_sigma);

    let mut levels = 0;
    let mut scale = 1.0;
    while levels < params.levels {
        scale *= pyr_scale;
        if (width as f64) * scale < MIN_LEVEL_SIZE || (height as f64) * scale < MIN_LEVEL_SIZE {
            break;
        }
        levels += 1;
    }

    let mut coarser: Option<(usize, usize, Vec<Vec2>)> = None;
    for level in (0..=levels).rev() {
        let scale = pyr_scale.powi(level as i32);
        let sigma = (1.0 / scale - 1.0) * 0.5;
        let ksize = (((sigma * 5.0).round() as usize) | 1).max(3);
        let lw = ((width as f64 * scale).round() as usize).max(1);
        let lh = ((height as f64 * scale).round() as usize).max(1);

        let mut flow = match coarser.take() {
            None => vec![Vec2::ZERO; lw * lh],
            Some((cw, ch, coarse)) => upscale_flow(&coarse, cw, ch, lw, lh, (1.0 / pyr_scale) as f32),
        };

        let [r0, r1] = planes
            .each_ref()
            .map(|p| expansion.expand(&p.gaussian_blur(ksize, sigma).resized(lw, lh)));

        let mut matrices = update_matrices(&r0, &r1, &flow, lw, lh);
        for pass in 0..params.iterations {
            flow = box_blur(&matrices, lw, lh, params.win_size)
                .iter()
                .map(|eq| eq.solve())
                .collect();
            if pass + 1 < params.iterations {
                matrices = update_matrices(&r0, &r1, &flow, lw, lh);
            }
        }

        tracing::trace!(level, lw, lh, "flow level refined");
        coarser = Some((lw, lh, flow));
    }

    let vectors = coarser.map_or_else(|| vec![Vec2::ZERO; width * height], |(_, _, flow)| flow);
    Ok(FlowField {
        width: prev.width(),
        height: prev.height(),
        vectors,
    })
}

/// Bilinearly resize a flow field and scale its vectors.
fn upscale_flow(
    flow: &[Vec2],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    factor: f32,
) -> Vec<Vec2> {
    let x_taps = linear_taps(src_w, dst_w);
    let y_taps = linear_taps(src_h, dst_h);
    resample_grid(flow, src_w, &x_taps, &y_taps, |p00, p10, p01, p11, wx, wy| {
        let top = p00.lerp(p10, wx);
        let bottom = p01.lerp(p11, wx);
        top.lerp(bottom, wy) * factor
    })
}
