//! Frames decoded from a directory of still images.

use std::path::{Path, PathBuf};

use psyche_core::Frame;

use super::FrameReader;
use crate::error::SourceError;

/// File extensions picked up from the directory (case-insensitive).
const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Reads every supported image in a directory, in file-name order.
#[derive(Debug)]
pub struct ImageSequenceReader {
    paths: Vec<PathBuf>,
    next: usize,
    looping: bool,
}

impl ImageSequenceReader {
    /// Scan `dir` for images. Fails when it cannot be listed or holds none.
    pub fn open(dir: &Path, looping: bool) -> Result<Self, SourceError> {
        let entries = std::fs::read_dir(dir).map_err(|err| SourceError::Open {
            path: dir.to_path_buf(),
            reason: err.to_string(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(SourceError::Open {
                path: dir.to_path_buf(),
                reason: "no PNG, JPEG or BMP files found".into(),
            });
        }

        tracing::info!(dir = %dir.display(), frames = paths.len(), looping, "image sequence opened");
        Ok(Self {
            paths,
            next: 0,
            looping,
        })
    }

    /// Number of images in the sequence.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameReader for ImageSequenceReader {
    fn read(&mut self) -> Result<Option<Frame>, SourceError> {
        if self.next >= self.paths.len() {
            if !self.looping {
                return Ok(None);
            }
            self.next = 0;
        }
        let path = &self.paths[self.next];
        self.next += 1;
        load_frame(path).map(Some)
    }

    fn release(&mut self) {
        self.paths.clear();
        self.next = 0;
    }
}

/// Decode one image file into an RGB frame.
fn load_frame(path: &Path) -> Result<Frame, SourceError> {
    let img = image::open(path).map_err(|source| SourceError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Frame::from(img.to_rgb8()))
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("psyche-seq-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(dir: &Path, name: &str, shade: u8) {
        Frame::filled(4, 3, [shade, shade, shade])
            .to_rgb_image()
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_reads_in_name_order_and_ends() {
        let dir = scratch_dir("order");
        write_png(&dir, "b.png", 20);
        write_png(&dir, "a.png", 10);
        std::fs::write(dir.join("notes.txt"), "skip me").unwrap();

        let mut reader = ImageSequenceReader::open(&dir, false).unwrap();
        assert_eq!(reader.len(), 2);
        assert_eq!(reader.read().unwrap().unwrap().pixel(0, 0), [10, 10, 10]);
        assert_eq!(reader.read().unwrap().unwrap().pixel(0, 0), [20, 20, 20]);
        assert!(reader.read().unwrap().is_none());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_looping_wraps_around() {
        let dir = scratch_dir("loop");
        write_png(&dir, "only.png", 77);
        let mut reader = ImageSequenceReader::open(&dir, true).unwrap();
        for _ in 0..3 {
            assert_eq!(reader.read().unwrap().unwrap().dimensions(), (4, 3));
        }
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_directory_is_an_open_error() {
        let dir = scratch_dir("empty");
        assert!(matches!(
            ImageSequenceReader::open(&dir, false),
            Err(SourceError::Open { .. })
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_a_decode_error() {
        let dir = scratch_dir("corrupt");
        std::fs::write(dir.join("broken.png"), b"not a png").unwrap();
        let mut reader = ImageSequenceReader::open(&dir, false).unwrap();
        assert!(matches!(reader.read(), Err(SourceError::Decode { .. })));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
