//! Engine configuration.

use std::time::Duration;

use crate::source::SourceBackend;
use crate::worker::ProcessingMode;

/// Target interval between ticks (about 30 Hz).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(33);
/// How long shutdown waits for background threads before detaching them.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);
/// Workers used by the offload mode unless configured otherwise.
pub const DEFAULT_WORKERS: usize = 2;

/// Runtime configuration for a [`RunLoop`](crate::RunLoop).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Time from the start of one tick to the start of the next.
    pub tick_interval: Duration,
    /// Stop after presenting this many frames.
    pub max_frames: Option<u64>,
    /// Where frame processing runs.
    pub processing: ProcessingMode,
    /// Bound on every wait for a background thread during shutdown.
    pub shutdown_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            max_frames: None,
            processing: ProcessingMode::Offload {
                workers: DEFAULT_WORKERS,
            },
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

/// Source settings, kept separate so a source can be opened before the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceConfig {
    pub backend: SourceBackend,
    pub release_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            backend: SourceBackend::Blocking,
            release_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}
