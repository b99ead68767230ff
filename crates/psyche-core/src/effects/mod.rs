//! The five effect units and their fixed application order.
//!
//! Units are cheap value types rebuilt every tick from the current parameter
//! values. Only [`FlowWarp`] touches state that outlives a tick, and it does
//! so through a borrowed [`FlowState`] owned elsewhere.

pub mod flow_warp;
pub mod hue_saturation;
pub mod kaleidoscope;
pub mod perlin_warp;
pub mod pixelate;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::frame::Frame;

pub use flow_warp::{FlowState, FlowWarp};
pub use hue_saturation::HueSaturation;
pub use kaleidoscope::Kaleidoscope;
pub use perlin_warp::PerlinWarp;
pub use pixelate::Pixelate;

/// Identifies an effect kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    HueSaturation,
    PerlinWarp,
    Kaleidoscope,
    Pixelate,
    FlowWarp,
}

impl EffectKind {
    /// The order in which every pipeline applies its units.
    pub const ORDER: [EffectKind; 5] = [
        EffectKind::HueSaturation,
        EffectKind::PerlinWarp,
        EffectKind::Kaleidoscope,
        EffectKind::Pixelate,
        EffectKind::FlowWarp,
    ];

    /// Human-readable label for logs and status text.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::HueSaturation => "hue/saturation",
            Self::PerlinWarp => "perlin warp",
            Self::Kaleidoscope => "kaleidoscope",
            Self::Pixelate => "pixelate",
            Self::FlowWarp => "flow warp",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A configured per-frame transform.
pub trait Effect {
    /// Which kind of effect this is.
    fn kind(&self) -> EffectKind;

    /// Produce a new frame from `frame`. Only stateful effects mutate `self`.
    fn apply(&mut self, frame: &Frame) -> Result<Frame, CoreError>;
}

/// One slot of a pipeline.
#[derive(Debug)]
pub enum EffectUnit<'s> {
    HueSaturation(HueSaturation),
    PerlinWarp(PerlinWarp),
    Kaleidoscope(Kaleidoscope),
    Pixelate(Pixelate),
    FlowWarp(FlowWarp<'s>),
}

impl Effect for EffectUnit<'_> {
    fn kind(&self) -> EffectKind {
        match self {
            Self::HueSaturation(_) => EffectKind::HueSaturation,
            Self::PerlinWarp(_) => EffectKind::PerlinWarp,
            Self::Kaleidoscope(_) => EffectKind::Kaleidoscope,
            Self::Pixelate(_) => EffectKind::Pixelate,
            Self::FlowWarp(_) => EffectKind::FlowWarp,
        }
    }

    fn apply(&mut self, frame: &Frame) -> Result<Frame, CoreError> {
        match self {
            Self::HueSaturation(fx) => Ok(fx.apply(frame)),
            Self::PerlinWarp(fx) => Ok(fx.apply(frame)),
            Self::Kaleidoscope(fx) => Ok(fx.apply(frame)),
            Self::Pixelate(fx) => Ok(fx.apply(frame)),
            Self::FlowWarp(fx) => fx.apply(frame),
        }
    }
}
