//! Frame sources.
//!
//! A [`FrameReader`] produces frames one at a time. A [`VideoSource`] wraps a
//! reader and decides where the reading happens: on the caller's thread, or
//! ahead of time on a background thread feeding a bounded queue.

mod capture;
mod image_sequence;
mod pattern;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use psyche_core::Frame;

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::join::join_within;

#[cfg(feature = "video")]
pub use capture::VideoCaptureReader;
pub use capture::parse_device_index;
pub use image_sequence::ImageSequenceReader;
pub use pattern::PatternReader;

/// Something that yields frames in capture order.
pub trait FrameReader: Send {
    /// Next frame, or `None` at end of stream.
    fn read(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Free whatever the reader holds. Called once, after the last read.
    fn release(&mut self) {}
}

/// Where a [`VideoSource`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceBackend {
    /// Read on the calling thread at fetch time.
    Blocking,
    /// Read ahead on a background thread into a queue of `capacity` frames.
    Buffered { capacity: usize },
}

/// Outcome of [`VideoSource::fetch_within`].
#[derive(Debug)]
pub enum Fetched {
    Frame(Frame),
    /// Nothing arrived within the wait; the stream is still open.
    Pending,
    EndOfStream,
}

type Delivery = Result<Frame, SourceError>;

enum Backend {
    Blocking(Box<dyn FrameReader>),
    Buffered {
        frames: Receiver<Delivery>,
        stop: Arc<AtomicBool>,
        thread: JoinHandle<()>,
    },
    Released,
}

/// A frame source with one of two interchangeable backends.
pub struct VideoSource {
    backend: Backend,
    release_timeout: Duration,
}

impl VideoSource {
    /// Open `reader` with the configured backend.
    pub fn open(reader: Box<dyn FrameReader>, config: SourceConfig) -> Result<Self, SourceError> {
        let backend = match config.backend {
            SourceBackend::Blocking => Backend::Blocking(reader),
            SourceBackend::Buffered { capacity } => {
                let (tx, rx) = bounded(capacity.max(1));
                let stop = Arc::new(AtomicBool::new(false));
                let thread_stop = Arc::clone(&stop);
                let thread = thread::Builder::new()
                    .name("psyche-source".into())
                    .spawn(move || read_ahead(reader, tx, &thread_stop))?;
                Backend::Buffered {
                    frames: rx,
                    stop,
                    thread,
                }
            }
        };
        tracing::info!(backend = ?config.backend, "video source opened");
        Ok(Self {
            backend,
            release_timeout: config.release_timeout,
        })
    }

    /// Next frame, or `None` at end of stream.
    pub fn fetch(&mut self) -> Result<Option<Frame>, SourceError> {
        match &mut self.backend {
            Backend::Blocking(reader) => reader.read(),
            Backend::Buffered { frames, .. } => match frames.recv() {
                Ok(delivery) => delivery.map(Some),
                // Reader thread finished and the queue is drained.
                Err(_) => Ok(None),
            },
            Backend::Released => Err(SourceError::Disconnected),
        }
    }

    /// Like [`fetch`](Self::fetch), but a buffered source gives up after
    /// `timeout` and reports [`Fetched::Pending`]. A blocking source reads
    /// on the calling thread and cannot be interrupted.
    pub fn fetch_within(&mut self, timeout: Duration) -> Result<Fetched, SourceError> {
        match &mut self.backend {
            Backend::Blocking(reader) => {
                Ok(reader.read()?.map_or(Fetched::EndOfStream, Fetched::Frame))
            }
            Backend::Buffered { frames, .. } => match frames.recv_timeout(timeout) {
                Ok(delivery) => delivery.map(Fetched::Frame),
                Err(RecvTimeoutError::Timeout) => Ok(Fetched::Pending),
                Err(RecvTimeoutError::Disconnected) => Ok(Fetched::EndOfStream),
            },
            Backend::Released => Err(SourceError::Disconnected),
        }
    }

    pub fn is_released(&self) -> bool {
        matches!(self.backend, Backend::Released)
    }

    /// Stop reading and free the reader. Safe to call more than once.
    pub fn release(&mut self) {
        match std::mem::replace(&mut self.backend, Backend::Released) {
            Backend::Released => {}
            Backend::Blocking(mut reader) => {
                reader.release();
                tracing::info!("video source released");
            }
            Backend::Buffered {
                frames,
                stop,
                thread,
            } => {
                stop.store(true, Ordering::Release);
                // Dropping the receiver unblocks a reader waiting on a full queue.
                drop(frames);
                join_within(thread, self.release_timeout);
                tracing::info!("video source released");
            }
        }
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// Background loop for the buffered backend.
fn read_ahead(mut reader: Box<dyn FrameReader>, tx: Sender<Delivery>, stop: &AtomicBool) {
    while !stop.load(Ordering::Acquire) {
        let delivery = match reader.read() {
            Ok(Some(frame)) => Ok(frame),
            Ok(None) => {
                tracing::debug!("reader reached end of stream");
                break;
            }
            Err(err) => Err(err),
        };
        let failed = delivery.is_err();
        if tx.send(delivery).is_err() || failed {
            break;
        }
    }
    reader.release();
}
