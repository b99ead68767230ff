//! Psyche Core: domain layer for the psychedelic video effects.
//!
//! Frame types, the transform primitives, dense optical flow, the five effect
//! units, the runtime parameter set and the per-frame processor. No threads
//! and no video I/O.

pub mod effects;
pub mod error;
pub mod flow;
pub mod frame;
pub mod noise;
pub mod params;
pub mod pipeline;
pub mod processor;
pub mod transform;

// Re-exports for convenience.
pub use effects::{Effect, EffectKind, FlowState};
pub use error::{CoreError, ParamError};
pub use flow::{FlowField, FlowParams, compute_optical_flow};
pub use frame::{Frame, GrayFrame};
pub use params::{ParameterSet, ParameterSpec};
pub use pipeline::{EffectSettings, Pipeline};
pub use processor::{FlowOutcome, FrameProcessor, Processed};
