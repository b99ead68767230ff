//! Frame processor: owns the cross-frame state and runs one tick's pipeline.

use std::sync::Arc;

use crate::effects::{EffectKind, FlowState};
use crate::error::CoreError;
use crate::frame::Frame;
use crate::params::ParameterSet;
use crate::pipeline::{EffectSettings, Pipeline};

/// What the flow warp did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// No reference frame existed; this frame became the reference.
    Primed,
    /// The frame was warped along the measured motion.
    Warped,
    /// Warp strength was zero: the reference advanced but the frame was
    /// passed on unwarped.
    Held,
    /// The frame size changed; the warp was skipped and the state reset.
    Skipped,
}

/// Output of one processed frame.
#[derive(Debug, Clone)]
pub struct Processed {
    pub frame: Frame,
    pub flow: FlowOutcome,
}

/// Rebuilds the pipeline from the shared parameters for every frame.
#[derive(Debug)]
pub struct FrameProcessor {
    params: Arc<ParameterSet>,
    flow_state: FlowState,
    processed: u64,
}

impl FrameProcessor {
    pub fn new(params: Arc<ParameterSet>) -> Self {
        Self {
            params,
            flow_state: FlowState::new(),
            processed: 0,
        }
    }

    pub fn flow_state(&self) -> &FlowState {
        &self.flow_state
    }

    /// Number of frames processed so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Drop the flow reference so the next frame primes again.
    pub fn reset_flow(&mut self) {
        self.flow_state.reset();
    }

    /// Apply the five effects to `frame` with the current parameter values.
    ///
    /// A frame whose size differs from the flow reference is passed on
    /// without the motion warp, and the reference is reset so that the
    /// following frame primes at the new size. Any other failure is returned.
    pub fn process(&mut self, frame: &Frame) -> Result<Processed, CoreError> {
        let settings = EffectSettings::read(&self.params);
        let was_primed = self.flow_state.is_primed();

        let result = Pipeline::assemble(&settings, &mut self.flow_state).apply(frame);
        self.processed += 1;

        match result {
            Ok(frame) => Ok(Processed {
                frame,
                flow: if !was_primed {
                    FlowOutcome::Primed
                } else if settings.flow_strength == 0.0 {
                    FlowOutcome::Held
                } else {
                    FlowOutcome::Warped
                },
            }),
            Err(stage)
                if stage.kind == EffectKind::FlowWarp
                    && matches!(stage.source, CoreError::ShapeMismatch { .. }) =>
            {
                tracing::warn!(
                    error = %stage.source,
                    frame = self.processed,
                    "frame size changed, skipping flow warp and resetting its reference"
                );
                self.flow_state.reset();
                Ok(Processed {
                    frame: stage.input,
                    flow: FlowOutcome::Skipped,
                })
            }
            Err(stage) => Err(stage.source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    fn quiet_params() -> Arc<ParameterSet> {
        let set = ParameterSet::standard();
        set.set_parameter(params::DOSAGE, 0.0).unwrap();
        set.set_parameter(params::TILES, 1.0).unwrap();
        set.set_parameter(params::PIXEL_SIZE, 2.0).unwrap();
        set.set_parameter(params::FLOW_STRENGTH, 0.0).unwrap();
        Arc::new(set)
    }

    #[test]
    fn test_outcome_sequence() {
        let mut proc = FrameProcessor::new(quiet_params());
        let frame = Frame::filled(40, 40, [90, 90, 90]);
        assert_eq!(proc.process(&frame).unwrap().flow, FlowOutcome::Primed);
        assert_eq!(proc.process(&frame).unwrap().flow, FlowOutcome::Held);
        assert_eq!(proc.processed(), 2);
    }

    #[test]
    fn test_resize_mid_stream_skips_then_reprimes() {
        let mut proc = FrameProcessor::new(quiet_params());
        proc.process(&Frame::filled(40, 40, [90, 90, 90])).unwrap();

        let bigger = Frame::filled(64, 48, [90, 90, 90]);
        let out = proc.process(&bigger).unwrap();
        assert_eq!(out.flow, FlowOutcome::Skipped);
        assert_eq!(out.frame.dimensions(), (64, 48));
        assert!(!proc.flow_state().is_primed());

        assert_eq!(proc.process(&bigger).unwrap().flow, FlowOutcome::Primed);
        assert_eq!(proc.process(&bigger).unwrap().flow, FlowOutcome::Held);
    }

    #[test]
    fn test_warped_only_with_nonzero_strength() {
        let set = quiet_params();
        let mut proc = FrameProcessor::new(Arc::clone(&set));
        let frame = Frame::filled(24, 24, [50, 60, 70]);
        assert_eq!(proc.process(&frame).unwrap().flow, FlowOutcome::Primed);
        assert_eq!(proc.process(&frame).unwrap().flow, FlowOutcome::Held);

        set.set_parameter(params::FLOW_STRENGTH, 5.0).unwrap();
        assert_eq!(proc.process(&frame).unwrap().flow, FlowOutcome::Warped);

        set.set_parameter(params::FLOW_STRENGTH, 0.0).unwrap();
        assert_eq!(proc.process(&frame).unwrap().flow, FlowOutcome::Held);
        assert!(proc.flow_state().is_primed());
    }

    #[test]
    fn test_reset_flow() {
        let mut proc = FrameProcessor::new(quiet_params());
        let frame = Frame::filled(32, 32, [1, 2, 3]);
        proc.process(&frame).unwrap();
        proc.reset_flow();
        assert_eq!(proc.process(&frame).unwrap().flow, FlowOutcome::Primed);
    }

    #[test]
    fn test_parameter_changes_apply_next_frame() {
        let set = quiet_params();
        let mut proc = FrameProcessor::new(Arc::clone(&set));
        let frame = Frame::filled(16, 16, [200, 40, 40]);
        assert_eq!(proc.process(&frame).unwrap().frame, frame);

        set.set_parameter(params::DOSAGE, 60.0).unwrap();
        assert_ne!(proc.process(&frame).unwrap().frame, frame);
    }
}
