//! Displacement noise for the warp effect.
//!
//! This is not gradient noise. It is a separable sine/cosine pattern that
//! stands in for Perlin noise, and the warp effect's look depends on it, so
//! it is kept exactly as-is.

/// Evaluate the placeholder noise field, row-major, `width × height` samples.
///
/// `noise[y][x] = sin(x · scale / width) · cos(y · scale / height)`: the
/// coordinates run from 0 up to (but excluding) `scale` across each axis.
/// Values lie in `[-1, 1]`.
pub fn placeholder_noise(width: u32, height: u32, scale: f32) -> Vec<f32> {
    let xs: Vec<f32> = linspace_exclusive(scale, width).map(f32::sin).collect();
    let ys: Vec<f32> = linspace_exclusive(scale, height).map(f32::cos).collect();

    let mut field = Vec::with_capacity(xs.len() * ys.len());
    for cy in &ys {
        field.extend(xs.iter().map(|sx| sx * cy));
    }
    field
}

/// `n` evenly spaced samples over `[0, end)`.
fn linspace_exclusive(end: f32, n: u32) -> impl Iterator<Item = f32> {
    let step = if n == 0 { 0.0 } else { end as f64 / n as f64 };
    (0..n).map(move |i| (i as f64 * step) as f32)
}
