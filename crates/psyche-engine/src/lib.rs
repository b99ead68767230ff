//! Psyche Engine: the fixed-cadence run loop and the seams around it.
//!
//! Frames come from a [`VideoSource`] (blocking or background-buffered),
//! go through a [`FrameExecutor`] that runs the core [`FrameProcessor`]
//! inline or on a worker pool, and end up in a [`DisplaySink`].
//!
//! [`FrameProcessor`]: psyche_core::FrameProcessor

pub mod config;
pub mod display;
pub mod error;
mod join;
pub mod run_loop;
pub mod source;
pub mod worker;

pub use config::{EngineConfig, SourceConfig};
pub use display::{DisplaySink, NullSink, PngSequenceSink};
pub use error::{DisplayError, EngineError, SourceError};
pub use run_loop::{RunLoop, RunSummary, StopHandle, StopReason};
pub use source::{
    Fetched, FrameReader, ImageSequenceReader, PatternReader, SourceBackend, VideoSource,
    parse_device_index,
};
#[cfg(feature = "video")]
pub use source::VideoCaptureReader;
pub use worker::{FrameExecutor, ProcessingMode};
