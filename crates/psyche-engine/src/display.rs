//! Display sinks: where processed frames go.

use std::path::{Path, PathBuf};

use image::ImageFormat;
use psyche_core::Frame;

use crate::error::DisplayError;

/// Receives processed frames in presentation order.
pub trait DisplaySink: Send {
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError>;
}

/// Writes each frame as `frame_NNNNNN.png` into a directory.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    written: u64,
}

impl PngSequenceSink {
    /// Create the output directory if needed.
    pub fn create(dir: &Path) -> Result<Self, DisplayError> {
        std::fs::create_dir_all(dir)?;
        tracing::info!(dir = %dir.display(), "writing frames as PNG");
        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

impl DisplaySink for PngSequenceSink {
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let index = self.written;
        frame
            .to_rgb_image()
            .save_with_format(self.path_for(index), ImageFormat::Png)
            .map_err(|source| DisplayError::Encode { index, source })?;
        self.written += 1;
        Ok(())
    }
}

/// Discards frames, keeping only a count.
#[derive(Debug, Default)]
pub struct NullSink {
    presented: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl DisplaySink for NullSink {
    fn present(&mut self, _frame: &Frame) -> Result<(), DisplayError> {
        self.presented += 1;
        Ok(())
    }
}
