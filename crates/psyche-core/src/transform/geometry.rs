//! Cropping and mirrored tiling.

use crate::frame::Frame;

/// Copy the `width × height` region whose top-left corner is `(x, y)`.
///
/// The region is clipped to the frame and kept at least one pixel in size.
pub fn crop(frame: &Frame, x: u32, y: u32, width: u32, height: u32) -> Frame {
    let x = x.min(frame.width() - 1);
    let y = y.min(frame.height() - 1);
    let width = width.clamp(1, frame.width() - x);
    let height = height.clamp(1, frame.height() - y);
    Frame::from_fn(width, height, |cx, cy| frame.pixel(x + cx, y + cy))
}

/// Tile `quad` 2×2 with mirroring: original top-left, horizontal mirror
/// top-right, vertical mirror bottom-left, and both axes bottom-right.
///
/// The result is symmetric about both of its midlines.
pub fn mirror_quad(quad: &Frame) -> Frame {
    let (w, h) = quad.dimensions();
    Frame::from_fn(2 * w, 2 * h, |x, y| {
        let qx = if x < w { x } else { 2 * w - 1 - x };
        let qy = if y < h { y } else { 2 * h - 1 - y };
        quad.pixel(qx, qy)
    })
}
