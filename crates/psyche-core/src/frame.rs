//! Image representation for the effects pipeline.

use std::fmt;

use image::RgbImage;

use crate::error::CoreError;

/// BT.601 luma weights used for the grayscale conversion.
const LUMA_BT601: [f32; 3] = [0.299, 0.587, 0.114];

/// A color frame. Always stored as 8-bit RGB, row-major.
///
/// Frames are treated as immutable once produced: every effect returns a new
/// `Frame` instead of writing into its input.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
}

impl Frame {
    /// Build a frame from row-major RGB pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<[u8; 3]>) -> Result<Self, CoreError> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidFrame(format!(
                "dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(CoreError::InvalidFrame(format!(
                "{width}x{height} frame needs {expected} pixels, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a frame from a packed `RGBRGB...` byte buffer.
    pub fn from_rgb_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() % 3 != 0 {
            return Err(CoreError::InvalidFrame(format!(
                "byte length {} is not a multiple of 3",
                bytes.len()
            )));
        }
        let pixels: &[[u8; 3]] = bytemuck::cast_slice(bytes);
        Self::from_pixels(width, height, pixels.to_vec())
    }

    /// Internal constructor for buffers whose size is correct by construction.
    pub(crate) fn from_raw_parts(width: u32, height: u32, pixels: Vec<[u8; 3]>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A frame filled with a single color. Zero dimensions are raised to 1.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![rgb; width as usize * height as usize],
        }
    }

    /// Build a frame by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 3]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }

    /// Packed `RGBRGB...` view of the pixel data.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Pixel at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Grayscale copy using BT.601 luma weights.
    pub fn to_gray(&self) -> GrayFrame {
        let luma = self
            .pixels
            .iter()
            .map(|px| {
                let l = px[0] as f32 * LUMA_BT601[0]
                    + px[1] as f32 * LUMA_BT601[1]
                    + px[2] as f32 * LUMA_BT601[2];
                l.round().clamp(0.0, 255.0) as u8
            })
            .collect();
        GrayFrame {
            width: self.width,
            height: self.height,
            luma,
        }
    }

    /// Copy into an `image` buffer for encoding or display.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| image::Rgb(self.pixel(x, y)))
    }
}

impl From<RgbImage> for Frame {
    fn from(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Self::filled(1, 1, [0, 0, 0]);
        }
        let pixels = img.pixels().map(|p| p.0).collect();
        Self {
            width,
            height,
            pixels,
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Single-channel 8-bit luminance image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    width: u32,
    height: u32,
    luma: Vec<u8>,
}

impl GrayFrame {
    pub fn from_luma(width: u32, height: u32, luma: Vec<u8>) -> Result<Self, CoreError> {
        if width == 0 || height == 0 || luma.len() != width as usize * height as usize {
            return Err(CoreError::InvalidFrame(format!(
                "{width}x{height} gray frame cannot hold {} samples",
                luma.len()
            )));
        }
        Ok(Self {
            width,
            height,
            luma,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn luma(&self) -> &[u8] {
        &self.luma
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pixels_rejects_wrong_length() {
        let err = Frame::from_pixels(2, 2, vec![[0, 0, 0]; 3]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidFrame(_)));
    }

    #[test]
    fn test_from_pixels_rejects_zero_dimension() {
        assert!(Frame::from_pixels(0, 4, Vec::new()).is_err());
    }

    #[test]
    fn test_bytes_round_trip_preserves_layout() {
        let frame = Frame::from_fn(3, 2, |x, y| [x as u8, y as u8, 7]);
        let rebuilt = Frame::from_rgb_bytes(3, 2, frame.as_bytes()).unwrap();
        assert_eq!(rebuilt, frame);
        assert_eq!(&frame.as_bytes()[3..6], &[1u8, 0, 7]);
    }

    #[test]
    fn test_gray_of_primaries_uses_bt601() {
        let frame = Frame::from_pixels(3, 1, vec![[255, 0, 0], [0, 255, 0], [0, 0, 255]]).unwrap();
        let gray = frame.to_gray();
        assert_eq!(gray.luma(), &[76u8, 150, 29]);
    }

    #[test]
    fn test_rgb_image_conversion_keeps_pixels() {
        let frame = Frame::from_fn(4, 3, |x, y| [x as u8 * 10, y as u8 * 20, 5]);
        let img = frame.to_rgb_image();
        assert_eq!(img.get_pixel(2, 1).0, [20, 20, 5]);
        assert_eq!(Frame::from(img), frame);
    }
}
