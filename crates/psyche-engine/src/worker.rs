//! Frame processing, inline or on a worker pool.
//!
//! The offload mode exists so the control thread is not the one burning CPU,
//! but it never runs two frames at once: each submission waits for its
//! result before the next one can be queued, so the processor's flow state
//! always advances in capture order.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;
use psyche_core::{CoreError, Frame, FrameProcessor, Processed};

use crate::error::EngineError;
use crate::join::join_within;

/// Where frames are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// On the control thread.
    Inline,
    /// On a pool of `workers` threads.
    Offload { workers: usize },
}

struct Job {
    frame: Frame,
    reply: Sender<Result<Processed, CoreError>>,
}

struct Pool {
    jobs: Sender<Job>,
    backlog: Receiver<Job>,
    workers: Vec<JoinHandle<()>>,
}

/// Runs the shared [`FrameProcessor`] according to a [`ProcessingMode`].
pub struct FrameExecutor {
    processor: Arc<Mutex<FrameProcessor>>,
    pool: Option<Pool>,
    shutdown_timeout: Duration,
}

impl FrameExecutor {
    pub fn new(
        processor: FrameProcessor,
        mode: ProcessingMode,
        shutdown_timeout: Duration,
    ) -> Result<Self, EngineError> {
        let processor = Arc::new(Mutex::new(processor));
        let pool = match mode {
            ProcessingMode::Inline => None,
            ProcessingMode::Offload { workers } => Some(spawn_pool(&processor, workers.max(1))?),
        };
        tracing::info!(?mode, "frame executor started");
        Ok(Self {
            processor,
            pool,
            shutdown_timeout,
        })
    }

    /// Shared handle to the processor, e.g. to reset its flow state.
    pub fn processor(&self) -> &Arc<Mutex<FrameProcessor>> {
        &self.processor
    }

    /// Process one frame and wait for the result.
    pub fn process(&self, frame: Frame) -> Result<Processed, EngineError> {
        let Some(pool) = &self.pool else {
            return Ok(self.processor.lock().process(&frame)?);
        };
        let (reply, result) = bounded(1);
        pool.jobs
            .send(Job { frame, reply })
            .map_err(|_| EngineError::WorkerLost)?;
        match result.recv() {
            Ok(processed) => Ok(processed?),
            Err(_) => Err(EngineError::WorkerLost),
        }
    }

    /// Close the job queue, drop anything still queued and wait a bounded
    /// time for the workers. Safe to call more than once.
    pub fn shutdown(&mut self) {
        let Some(Pool {
            jobs,
            backlog,
            workers,
        }) = self.pool.take()
        else {
            return;
        };
        drop(jobs);
        let discarded = backlog.try_iter().count();
        if discarded > 0 {
            tracing::debug!(discarded, "dropped queued frames on shutdown");
        }
        for handle in workers {
            join_within(handle, self.shutdown_timeout);
        }
        tracing::info!("frame executor stopped");
    }
}

impl Drop for FrameExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_pool(processor: &Arc<Mutex<FrameProcessor>>, count: usize) -> Result<Pool, EngineError> {
    // One slot: a frame can only be queued once the previous one was taken.
    let (tx, rx) = bounded::<Job>(1);
    let mut workers = Vec::with_capacity(count);
    for id in 0..count {
        let rx = rx.clone();
        let processor = Arc::clone(processor);
        let handle = thread::Builder::new()
            .name(format!("psyche-worker-{id}"))
            .spawn(move || worker_loop(&rx, &processor))
            .map_err(EngineError::Spawn)?;
        workers.push(handle);
    }
    Ok(Pool {
        jobs: tx,
        backlog: rx,
        workers,
    })
}

fn worker_loop(jobs: &Receiver<Job>, processor: &Mutex<FrameProcessor>) {
    while let Ok(job) = jobs.recv() {
        let result = processor.lock().process(&job.frame);
        // The submitter may have given up; nothing to do then.
        let _ = job.reply.send(result);
    }
}

#[cfg(test)]
mod tests {
    use psyche_core::{FlowOutcome, ParameterSet};

    use super::*;

    fn executor(mode: ProcessingMode) -> FrameExecutor {
        let processor = FrameProcessor::new(Arc::new(ParameterSet::standard()));
        FrameExecutor::new(processor, mode, Duration::from_millis(200)).unwrap()
    }

    #[test]
    fn test_both_modes_advance_flow_state() {
        for mode in [ProcessingMode::Inline, ProcessingMode::Offload { workers: 2 }] {
            let exec = executor(mode);
            let frame = Frame::filled(32, 32, [10, 20, 30]);
            assert_eq!(exec.process(frame.clone()).unwrap().flow, FlowOutcome::Primed);
            assert_eq!(exec.process(frame).unwrap().flow, FlowOutcome::Warped);
            assert_eq!(exec.processor().lock().processed(), 2);
        }
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut exec = executor(ProcessingMode::Offload { workers: 1 });
        exec.process(Frame::filled(8, 8, [0, 0, 0])).unwrap();
        exec.shutdown();
        exec.shutdown();
        // With the pool gone, frames are processed on the caller's thread.
        assert!(exec.process(Frame::filled(8, 8, [0, 0, 0])).is_ok());
    }
}
