//! Per-tick pipeline assembly.

use crate::effects::{
    Effect, EffectKind, EffectUnit, FlowState, FlowWarp, HueSaturation, Kaleidoscope, PerlinWarp,
    Pixelate,
};
use crate::error::CoreError;
use crate::frame::Frame;
use crate::params::{self, ParameterSet};

/// Dosage units per unit of warp amplitude.
const DOSAGE_PER_AMPLITUDE: f64 = 100.0;

/// Parameter values for one tick, clamped and quantized for the units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSettings {
    pub dosage: f32,
    pub hits: u32,
    pub tiles: u32,
    pub pixel_size: u32,
    pub flow_strength: f32,
}

impl EffectSettings {
    /// Read every parameter once. Missing names fall back to the standard
    /// default, and every value is re-clamped before integer parameters are
    /// truncated toward zero.
    pub fn read(set: &ParameterSet) -> Self {
        let value = |name: &str| {
            let spec = params::standard_spec(name);
            let raw = set
                .get(name)
                .ok()
                .or(spec.map(|s| s.default))
                .unwrap_or_default();
            spec.map_or(raw, |s| s.clamp(raw))
        };

        Self {
            dosage: value(params::DOSAGE) as f32,
            hits: value(params::HITS).trunc() as u32,
            tiles: value(params::TILES).trunc() as u32,
            pixel_size: value(params::PIXEL_SIZE).trunc() as u32,
            flow_strength: value(params::FLOW_STRENGTH) as f32,
        }
    }

    /// Warp amplitude derived from dosage.
    pub fn amplitude(&self) -> f32 {
        (self.dosage as f64 / DOSAGE_PER_AMPLITUDE) as f32
    }
}

/// A unit failed; carries the frame that was fed to it.
#[derive(Debug, thiserror::Error)]
#[error("{kind} failed: {source}")]
pub struct StageError {
    pub kind: EffectKind,
    pub source: CoreError,
    pub input: Frame,
}

/// Five units in fixed order, built for a single tick.
#[derive(Debug)]
pub struct Pipeline<'s> {
    units: [EffectUnit<'s>; 5],
}

impl<'s> Pipeline<'s> {
    /// Build the pipeline for this tick, lending `flow_state` to the flow warp.
    pub fn assemble(settings: &EffectSettings, flow_state: &'s mut FlowState) -> Self {
        Self {
            units: [
                EffectUnit::HueSaturation(HueSaturation::new(settings.dosage)),
                EffectUnit::PerlinWarp(PerlinWarp::new(settings.amplitude(), settings.hits)),
                EffectUnit::Kaleidoscope(Kaleidoscope::new(settings.tiles)),
                EffectUnit::Pixelate(Pixelate::new(settings.pixel_size)),
                EffectUnit::FlowWarp(FlowWarp::new(settings.flow_strength, flow_state)),
            ],
        }
    }

    /// Kinds in application order.
    pub fn kinds(&self) -> [EffectKind; 5] {
        self.units.each_ref().map(|unit| unit.kind())
    }

    /// Run `frame` through every unit in order.
    pub fn apply(&mut self, frame: &Frame) -> Result<Frame, StageError> {
        let mut current = frame.clone();
        for unit in &mut self.units {
            match unit.apply(&current) {
                Ok(next) => current = next,
                Err(source) => {
                    return Err(StageError {
                        kind: unit.kind(),
                        source,
                        input: current,
                    });
                }
            }
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterSpec;

    #[test]
    fn test_settings_truncate_integer_parameters() {
        let set = ParameterSet::standard();
        set.set_parameter(params::HITS, 7.9).unwrap();
        set.set_parameter(params::TILES, 3.5).unwrap();
        set.set_parameter(params::PIXEL_SIZE, 2.99).unwrap();
        set.set_parameter(params::DOSAGE, 250.5).unwrap();
        let s = EffectSettings::read(&set);
        assert_eq!((s.hits, s.tiles, s.pixel_size), (7, 3, 2));
        assert_eq!(s.dosage, 250.5);
        assert!((s.amplitude() - 2.505).abs() < 1e-6);
    }

    #[test]
    fn test_settings_reclamp_foreign_ranges() {
        // A set with looser ranges than the units accept.
        let set = ParameterSet::new(vec![
            ParameterSpec::new(params::DOSAGE, -100.0, 1000.0, 900.0),
            ParameterSpec::new(params::TILES, 0.0, 100.0, 0.0),
        ]);
        let s = EffectSettings::read(&set);
        assert_eq!(s.dosage, 500.0);
        assert_eq!(s.tiles, 1);
        assert_eq!(s.hits, 5);
        assert_eq!(s.pixel_size, 10);
    }

    #[test]
    fn test_pipeline_order_is_fixed() {
        let mut state = FlowState::new();
        let pipeline = Pipeline::assemble(&EffectSettings::read(&ParameterSet::standard()), &mut state);
        assert_eq!(pipeline.kinds(), EffectKind::ORDER);
    }

    #[test]
    fn test_stage_error_carries_flow_input() {
        let set = ParameterSet::standard();
        set.set_parameter(params::DOSAGE, 0.0).unwrap();
        let settings = EffectSettings::read(&set);
        let mut state = FlowState::new();

        Pipeline::assemble(&settings, &mut state)
            .apply(&Frame::filled(32, 32, [50, 50, 50]))
            .unwrap();
        let err = Pipeline::assemble(&settings, &mut state)
            .apply(&Frame::filled(48, 32, [50, 50, 50]))
            .unwrap_err();
        assert_eq!(err.kind, EffectKind::FlowWarp);
        assert_eq!(err.input.dimensions(), (48, 32));
        assert!(matches!(err.source, CoreError::ShapeMismatch { .. }));
    }
}
