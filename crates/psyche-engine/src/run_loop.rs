//! Fixed-cadence run loop: fetch, process, present, wait for the next tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use psyche_core::{FlowOutcome, FrameProcessor};

use crate::config::EngineConfig;
use crate::display::DisplaySink;
use crate::error::{EngineError, SourceError};
use crate::source::{Fetched, VideoSource};
use crate::worker::FrameExecutor;

/// Shortest wait on a buffered source, so a zero interval does not spin.
const MIN_FETCH_WAIT: Duration = Duration::from_millis(1);

/// Requests a running loop to stop at its next tick boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Why a run ended without an error.
#[derive(Debug)]
pub enum StopReason {
    /// A [`StopHandle`] was triggered.
    Requested,
    /// The source reported end of stream.
    EndOfStream,
    /// `max_frames` frames were presented.
    FrameLimit,
    /// The source failed to produce a frame.
    SourceFailed(SourceError),
}

/// Totals for a finished run.
#[derive(Debug)]
pub struct RunSummary {
    /// Frames handed to the display sink.
    pub frames: u64,
    /// Frames whose motion warp was skipped after a size change.
    pub flow_skips: u64,
    pub reason: StopReason,
}

/// Drives a source, a processor and a sink at a fixed cadence.
pub struct RunLoop {
    source: VideoSource,
    executor: FrameExecutor,
    sink: Box<dyn DisplaySink>,
    config: EngineConfig,
    stop: StopHandle,
}

impl RunLoop {
    pub fn new(
        source: VideoSource,
        processor: FrameProcessor,
        sink: Box<dyn DisplaySink>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let executor = FrameExecutor::new(processor, config.processing, config.shutdown_timeout)?;
        Ok(Self {
            source,
            executor,
            sink,
            config,
            stop: StopHandle::new(),
        })
    }

    /// Handle that stops this loop from any thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Shared processor, for edits that must land between frames (such as
    /// dropping the motion reference).
    pub fn processor(&self) -> Arc<Mutex<FrameProcessor>> {
        Arc::clone(self.executor.processor())
    }

    /// Run until stopped, out of frames, or failed. The source is released
    /// and the workers shut down before this returns.
    pub fn run(mut self) -> Result<RunSummary, EngineError> {
        tracing::info!(
            interval = ?self.config.tick_interval,
            max_frames = ?self.config.max_frames,
            "run loop started"
        );
        let result = self.ticks();
        self.source.release();
        self.executor.shutdown();

        match &result {
            Ok(summary) => tracing::info!(
                frames = summary.frames,
                flow_skips = summary.flow_skips,
                reason = ?summary.reason,
                "run loop finished"
            ),
            Err(err) => tracing::error!(error = %err, "run loop failed"),
        }
        result
    }

    fn ticks(&mut self) -> Result<RunSummary, EngineError> {
        let mut frames = 0u64;
        let mut flow_skips = 0u64;

        let reason = loop {
            if self.stop.is_stopped() {
                break StopReason::Requested;
            }
            if self.config.max_frames.is_some_and(|max| frames >= max) {
                break StopReason::FrameLimit;
            }

            let tick_start = Instant::now();
            let wait = self.config.tick_interval.max(MIN_FETCH_WAIT);
            let frame = match self.source.fetch_within(wait) {
                Ok(Fetched::Frame(frame)) => frame,
                Ok(Fetched::Pending) => {
                    tracing::debug!(waited = ?wait, "no frame ready, skipping tick");
                    continue;
                }
                Ok(Fetched::EndOfStream) => break StopReason::EndOfStream,
                Err(err) => {
                    tracing::warn!(error = %err, "frame source failed, ending run");
                    break StopReason::SourceFailed(err);
                }
            };

            let processed = self.executor.process(frame)?;
            if processed.flow == FlowOutcome::Skipped {
                flow_skips += 1;
            }
            self.sink.present(&processed.frame)?;
            frames += 1;
            tracing::debug!(frame = frames, flow = ?processed.flow, elapsed = ?tick_start.elapsed(), "tick");

            if let Some(remaining) = self.config.tick_interval.checked_sub(tick_start.elapsed()) {
                thread::sleep(remaining);
            }
        };

        Ok(RunSummary {
            frames,
            flow_skips,
            reason,
        })
    }
}
