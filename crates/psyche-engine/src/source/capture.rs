//! Live capture from a camera or video file through OpenCV.
//!
//! The reader itself needs the `video` feature. Device-name parsing is always
//! available so front ends can validate input without linking OpenCV.

#[cfg(feature = "video")]
use opencv::{
    core::{self, Mat, MatTraitConstManual},
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait},
};
#[cfg(feature = "video")]
use psyche_core::Frame;

#[cfg(feature = "video")]
use super::FrameReader;
#[cfg(feature = "video")]
use crate::error::SourceError;

/// Camera index named by `uri`: a bare number (`"0"`) or a V4L device path
/// (`"/dev/video2"`). Anything else is treated as a file or stream URL.
pub fn parse_device_index(uri: &str) -> Option<i32> {
    if let Ok(index) = uri.parse::<i32>() {
        return (index >= 0).then_some(index);
    }
    let digits = uri.strip_prefix("/dev/video")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Reads BGR frames from OpenCV and hands them on as RGB.
#[cfg(feature = "video")]
pub struct VideoCaptureReader {
    uri: String,
    capture: Option<VideoCapture>,
    mat: Mat,
}

#[cfg(feature = "video")]
impl VideoCaptureReader {
    /// Open a camera (by index or `/dev/videoN`) or a video file.
    pub fn open(uri: &str) -> Result<Self, SourceError> {
        let capture = match parse_device_index(uri) {
            Some(index) => VideoCapture::new(index, videoio::CAP_ANY),
            None => VideoCapture::from_file(uri, videoio::CAP_ANY),
        }
        .map_err(|err| capture_error(uri, &err))?;

        if !capture.is_opened().map_err(|err| capture_error(uri, &err))? {
            return Err(SourceError::Open {
                path: uri.into(),
                reason: "capture device did not open".into(),
            });
        }
        tracing::info!(uri, "video capture opened");

        Ok(Self {
            uri: uri.to_string(),
            capture: Some(capture),
            mat: Mat::default(),
        })
    }

    fn mat_to_frame(&self) -> Result<Frame, SourceError> {
        let mat = &self.mat;
        if mat.typ() != core::CV_8UC3 {
            return Err(SourceError::Capture(format!(
                "{}: unsupported pixel type {}",
                self.uri,
                mat.typ()
            )));
        }

        let owned;
        let mat = if mat.is_continuous() {
            mat
        } else {
            owned = mat.try_clone().map_err(|err| capture_error(&self.uri, &err))?;
            &owned
        };
        let bytes = mat.data_bytes().map_err(|err| capture_error(&self.uri, &err))?;
        let pixels = bytes
            .chunks_exact(3)
            .map(|bgr| [bgr[2], bgr[1], bgr[0]])
            .collect();

        Frame::from_pixels(mat.cols() as u32, mat.rows() as u32, pixels)
            .map_err(|err| SourceError::Capture(format!("{}: {err}", self.uri)))
    }
}

#[cfg(feature = "video")]
impl FrameReader for VideoCaptureReader {
    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        let Some(capture) = self.capture.as_mut() else {
            return Err(SourceError::Disconnected);
        };
        let grabbed = capture
            .read(&mut self.mat)
            .map_err(|err| capture_error(&self.uri, &err))?;
        if !grabbed || self.mat.empty() {
            return Ok(None);
        }
        self.mat_to_frame().map(Some)
    }

    fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Err(err) = capture.release() {
                tracing::warn!(uri = %self.uri, error = %err, "video capture release failed");
            }
        }
    }
}

#[cfg(feature = "video")]
fn capture_error(uri: &str, err: &opencv::Error) -> SourceError {
    SourceError::Capture(format!("{uri}: {err}"))
}
