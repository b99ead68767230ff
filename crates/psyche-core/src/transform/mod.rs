//! Pixel-level building blocks shared by the effects: HSV conversion,
//! remapping, resizing and mirrored tiling of [`Frame`](crate::frame::Frame)s.

pub mod color;
pub mod geometry;
pub mod remap;
pub mod resize;

pub use color::{HsvPixel, hsv_to_rgb, rgb_to_hsv};
pub use geometry::{crop, mirror_quad};
pub use remap::remap;
pub use resize::{Interpolation, resize};
