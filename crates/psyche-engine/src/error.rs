//! Error types for the engine.

use std::path::PathBuf;

use psyche_core::CoreError;

/// Errors raised while fetching frames.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot open source {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The capture backend reported an error.
    #[error("capture failed: {0}")]
    Capture(String),

    /// The source was released or its reader thread is gone.
    #[error("frame source disconnected")]
    Disconnected,
}

/// Errors raised while presenting frames.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("failed to encode frame {index}: {source}")]
    Encode {
        index: u64,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("display failed: {0}")]
    Display(#[from] DisplayError),

    #[error("frame processing failed: {0}")]
    Processing(#[from] CoreError),

    /// A worker dropped a job without answering.
    #[error("processing worker lost")]
    WorkerLost,

    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] std::io::Error),
}
