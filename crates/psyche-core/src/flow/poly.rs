//! Quadratic polynomial expansion and the per-pixel normal equations.
//!
//! Every pixel neighborhood is approximated as
//! `f(x, y) ≈ c + bx·x + by·y + axx·x² + ayy·y² + axy·xy`
//! using a Gaussian-weighted least-squares fit. Displacement between two
//! frames then follows from how the linear coefficients shift while the
//! quadratic ones stay put.

use std::ops::{Add, Mul, Sub};

use glam::{DMat3, Vec2};

use crate::flow::plane::Plane;

/// Attenuation applied to the five outermost rows/columns, whose expansion
/// is dominated by replicated border samples.
const BORDER_WEIGHTS: [f32; 5] = [0.14, 0.14, 0.4472, 0.4472, 0.4472];

/// Regularizer added to the 2×2 determinant.
const DET_EPSILON: f64 = 1e-3;

/// Fitted polynomial coefficients for one pixel (the constant term is unused).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Poly {
    pub bx: f32,
    pub by: f32,
    pub axx: f32,
    pub ayy: f32,
    pub axy: f32,
}

/// Accumulated normal equations `G·d = h` for one pixel, with `G` symmetric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct NormalEq {
    pub gxx: f32,
    pub gxy: f32,
    pub gyy: f32,
    pub hx: f32,
    pub hy: f32,
}

impl Add for NormalEq {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        Self {
            gxx: self.gxx + o.gxx,
            gxy: self.gxy + o.gxy,
            gyy: self.gyy + o.gyy,
            hx: self.hx + o.hx,
            hy: self.hy + o.hy,
        }
    }
}

impl Sub for NormalEq {
    type Output = Self;

    fn sub(self, o: Self) -> Self {
        Self {
            gxx: self.gxx - o.gxx,
            gxy: self.gxy - o.gxy,
            gyy: self.gyy - o.gyy,
            hx: self.hx - o.hx,
            hy: self.hy - o.hy,
        }
    }
}

impl Mul<f32> for NormalEq {
    type Output = Self;

    fn mul(self, s: f32) -> Self {
        Self {
            gxx: self.gxx * s,
            gxy: self.gxy * s,
            gyy: self.gyy * s,
            hx: self.hx * s,
            hy: self.hy * s,
        }
    }
}

impl NormalEq {
    /// Solve for the displacement.
    pub fn solve(&self) -> Vec2 {
        let (gxx, gxy, gyy) = (self.gxx as f64, self.gxy as f64, self.gyy as f64);
        let (hx, hy) = (self.hx as f64, self.hy as f64);
        let inv_det = 1.0 / (gxx * gyy - gxy * gxy + DET_EPSILON);
        Vec2::new(
            ((gyy * hx - gxy * hy) * inv_det) as f32,
            ((gxx * hy - gxy * hx) * inv_det) as f32,
        )
    }
}

/// Precomputed Gaussian weights and inverse moment terms for a fit radius.
#[derive(Debug, Clone)]
pub(crate) struct PolyExpansion {
    radius: usize,
    /// `g[k]` for `k = 0..=radius`; the kernel is symmetric.
    g: Vec<f32>,
    xg: Vec<f32>,
    xxg: Vec<f32>,
    ig11: f32,
    ig03: f32,
    ig33: f32,
    ig34: f32,
    ig55: f32,
}

impl PolyExpansion {
    /// Prepare a fit over a `(2·radius + 1)²` window with Gaussian weight `sigma`.
    pub fn new(radius: usize, sigma: f64) -> Self {
        let radius = radius.max(1);
        let sigma = if sigma > f64::EPSILON {
            sigma
        } else {
            radius as f64 * 0.3
        };

        let raw: Vec<f64> = (0..=radius)
            .map(|k| (-((k * k) as f64) / (2.0 * sigma * sigma)).exp())
            .collect();
        let total: f64 = raw[0] + 2.0 * raw[1..].iter().sum::<f64>();
        let g: Vec<f64> = raw.iter().map(|v| v / total).collect();

        // Moments of the separable weight; Σg = 1 by construction.
        let m2: f64 = (1..=radius).map(|k| 2.0 * g[k] * (k * k) as f64).sum();
        let m4: f64 = (1..=radius).map(|k| 2.0 * g[k] * (k * k * k * k) as f64).sum();
        let m22 = m2 * m2;

        // The {1, x², y²} block of the normal matrix; x, y and xy decouple.
        let block = DMat3::from_cols_array(&[1.0, m2, m2, m2, m4, m22, m2, m22, m4]);
        let inv = block.inverse();

        Self {
            radius,
            xg: g.iter().enumerate().map(|(k, v)| (k as f64 * v) as f32).collect(),
            xxg: g
                .iter()
                .enumerate()
                .map(|(k, v)| ((k * k) as f64 * v) as f32)
                .collect(),
            g: g.iter().map(|&v| v as f32).collect(),
            ig11: (1.0 / m2) as f32,
            ig03: inv.x_axis.y as f32,
            ig33: inv.y_axis.y as f32,
            ig34: inv.z_axis.y as f32,
            ig55: (1.0 / m22) as f32,
        }
    }

    /// Fit the polynomial at every pixel of `plane`. Borders replicate.
    pub fn expand(&self, plane: &Plane) -> Vec<Poly> {
        let (w, h, r) = (plane.width, plane.height, self.radius);
        let mut out = Vec::with_capacity(w * h);
        // Vertical pass results: [Σg·I, Σy·g·I, Σy²·g·I], padded by `r` on both sides.
        let mut row = vec![[0.0f32; 3]; w + 2 * r];

        for y in 0..h {
            for x in 0..w {
                let mut acc = [plane.at(x, y) * self.g[0], 0.0, 0.0];
                for k in 1..=r {
                    let up = plane.at(x, y.saturating_sub(k));
                    let down = plane.at(x, (y + k).min(h - 1));
                    let even = down + up;
                    acc[0] += self.g[k] * even;
                    acc[1] += self.xg[k] * (down - up);
                    acc[2] += self.xxg[k] * even;
                }
                row[x + r] = acc;
            }
            for k in 0..r {
                row[k] = row[r];
                row[w + r + k] = row[w + r - 1];
            }

            for x in 0..w {
                let c = row[x + r];
                let mut b1 = c[0] * self.g[0];
                let mut b2 = 0.0;
                let mut b3 = c[1] * self.g[0];
                let mut b4 = 0.0;
                let mut b5 = c[2] * self.g[0];
                let mut b6 = 0.0;
                for k in 1..=r {
                    let right = row[x + r + k];
                    let left = row[x + r - k];
                    let even = right[0] + left[0];
                    b1 += even * self.g[k];
                    b4 += even * self.xxg[k];
                    b2 += (right[0] - left[0]) * self.xg[k];
                    b3 += (right[1] + left[1]) * self.g[k];
                    b6 += (right[1] - left[1]) * self.xg[k];
                    b5 += (right[2] + left[2]) * self.g[k];
                }
                out.push(Poly {
                    bx: b2 * self.ig11,
                    by: b3 * self.ig11,
                    axx: b1 * self.ig03 + b4 * self.ig33 + b5 * self.ig34,
                    ayy: b1 * self.ig03 + b4 * self.ig34 + b5 * self.ig33,
                    axy: b6 * self.ig55,
                });
            }
        }
        out
    }
}

/// Build the per-pixel normal equations for the current flow estimate.
///
/// `r1` is sampled at each pixel displaced by `flow`; samples that fall off
/// the grid fall back to the `r0` coefficients alone.
pub(crate) fn update_matrices(
    r0: &[Poly],
    r1: &[Poly],
    flow: &[Vec2],
    width: usize,
    height: usize,
) -> Vec<NormalEq> {
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let p0 = r0[i];
            let d = flow[i];
            let fx = x as f32 + d.x;
            let fy = y as f32 + d.y;
            let x1 = fx.floor();
            let y1 = fy.floor();

            let inside = x1 >= 0.0
                && y1 >= 0.0
                && (x1 as usize) + 1 < width
                && (y1 as usize) + 1 < height;

            let (dbx, dby, mut axx, mut ayy, mut axy) = if inside {
                let q = sample_poly(r1, width, x1 as usize, y1 as usize, fx - x1, fy - y1);
                (
                    (p0.bx - q.bx) * 0.5,
                    (p0.by - q.by) * 0.5,
                    (p0.axx + q.axx) * 0.5,
                    (p0.ayy + q.ayy) * 0.5,
                    (p0.axy + q.axy) * 0.25,
                )
            } else {
                (p0.bx * 0.5, p0.by * 0.5, p0.axx, p0.ayy, p0.axy * 0.5)
            };

            let mut hx = dbx + axx * d.x + axy * d.y;
            let mut hy = dby + axy * d.x + ayy * d.y;

            let s = border_scale(x, width) * border_scale(y, height);
            if s != 1.0 {
                hx *= s;
                hy *= s;
                axx *= s;
                ayy *= s;
                axy *= s;
            }

            out.push(NormalEq {
                gxx: axx * axx + axy * axy,
                gxy: (axx + ayy) * axy,
                gyy: ayy * ayy + axy * axy,
                hx: axx * hx + axy * hy,
                hy: axy * hx + ayy * hy,
            });
        }
    }
    out
}

fn sample_poly(r: &[Poly], width: usize, x: usize, y: usize, ax: f32, ay: f32) -> Poly {
    let w00 = (1.0 - ax) * (1.0 - ay);
    let w10 = ax * (1.0 - ay);
    let w01 = (1.0 - ax) * ay;
    let w11 = ax * ay;
    let i = y * width + x;
    let (p00, p10, p01, p11) = (r[i], r[i + 1], r[i + width], r[i + width + 1]);
    let mix = |f: fn(&Poly) -> f32| w00 * f(&p00) + w10 * f(&p10) + w01 * f(&p01) + w11 * f(&p11);
    Poly {
        bx: mix(|p| p.bx),
        by: mix(|p| p.by),
        axx: mix(|p| p.axx),
        ayy: mix(|p| p.ayy),
        axy: mix(|p| p.axy),
    }
}

#[inline]
fn border_scale(i: usize, len: usize) -> f32 {
    let border = BORDER_WEIGHTS.len();
    let mut s = 1.0;
    if i < border {
        s *= BORDER_WEIGHTS[i];
    }
    if i + border >= len {
        s *= BORDER_WEIGHTS[len - 1 - i];
    }
    s
}

/// Box-average the normal equations over a `window × window` neighborhood
/// with replicated borders.
pub(crate) fn box_blur(m: &[NormalEq], width: usize, height: usize, window: usize) -> Vec<NormalEq> {
    let radius = window.max(1) / 2;
    let scale = 1.0 / ((2 * radius + 1) * (2 * radius + 1)) as f32;

    let mut vertical = vec![NormalEq::default(); width * height];
    for x in 0..width {
        let mut acc = NormalEq::default();
        for k in 0..=2 * radius {
            let sy = k.saturating_sub(radius).min(height - 1);
            acc = acc + m[sy * width + x];
        }
        for y in 0..height {
            vertical[y * width + x] = acc;
            let leaving = y.saturating_sub(radius);
            let entering = (y + radius + 1).min(height - 1);
            acc = acc - m[leaving * width + x] + m[entering * width + x];
        }
    }

    let mut out = vec![NormalEq::default(); width * height];
    for y in 0..height {
        let row = &vertical[y * width..(y + 1) * width];
        let mut acc = NormalEq::default();
        for k in 0..=2 * radius {
            acc = acc + row[k.saturating_sub(radius).min(width - 1)];
        }
        for x in 0..width {
            out[y * width + x] = acc * scale;
            let leaving = x.saturating_sub(radius);
            let entering = (x + radius + 1).min(width - 1);
            acc = acc - row[leaving] + row[entering];
        }
    }
    out
}
