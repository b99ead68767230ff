//! Runtime-adjustable effect parameters.
//!
//! A [`ParameterSet`] is shared between the control thread, which reads it
//! once per tick, and whatever input surface edits it. Each value lives in
//! its own atomic cell, so reads and writes of a single parameter never tear
//! and no lock is held across a tick.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ParamError;

pub const DOSAGE: &str = "dosage";
pub const HITS: &str = "hits";
pub const TILES: &str = "tiles";
pub const PIXEL_SIZE: &str = "pixel_size";
pub const FLOW_STRENGTH: &str = "flow_strength";

/// Static metadata for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, min: f64, max: f64, default: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            default,
        }
    }

    /// Clamp `value` into `[min, max]`.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// The standard five-parameter table.
pub fn standard_specs() -> Vec<ParameterSpec> {
    vec![
        ParameterSpec::new(DOSAGE, 0.0, 500.0, 100.0),
        ParameterSpec::new(HITS, 1.0, 50.0, 5.0),
        ParameterSpec::new(TILES, 1.0, 20.0, 4.0),
        ParameterSpec::new(PIXEL_SIZE, 2.0, 100.0, 10.0),
        ParameterSpec::new(FLOW_STRENGTH, 0.0, 20.0, 5.0),
    ]
}

static STANDARD_SPECS: LazyLock<Vec<ParameterSpec>> = LazyLock::new(standard_specs);

/// Entry `name` of the standard table.
pub fn standard_spec(name: &str) -> Option<&'static ParameterSpec> {
    STANDARD_SPECS.iter().find(|s| s.name == name)
}

/// Current value of one parameter, stored as `f64` bits.
#[derive(Debug)]
struct Cell(AtomicU64);

impl Cell {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

/// Point-in-time copy of every parameter value, in table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub values: Vec<(String, f64)>,
}

/// Named, range-bounded real values. Last write wins.
#[derive(Debug)]
pub struct ParameterSet {
    specs: Vec<ParameterSpec>,
    cells: Vec<Cell>,
}

impl ParameterSet {
    /// Build a set from `specs`, each starting at its clamped default.
    pub fn new(specs: Vec<ParameterSpec>) -> Self {
        let cells = specs.iter().map(|s| Cell::new(s.clamp(s.default))).collect();
        Self { specs, cells }
    }

    /// The standard effect parameters at their defaults.
    pub fn standard() -> Self {
        Self::new(standard_specs())
    }

    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.name == name)
    }

    /// Current value of `name`.
    pub fn get(&self, name: &str) -> Result<f64, ParamError> {
        self.index_of(name)
            .map(|i| self.cells[i].load())
            .ok_or_else(|| ParamError::Unknown(name.to_string()))
    }

    /// Set `name` to `value` clamped into its range. Returns the stored value.
    pub fn set_parameter(&self, name: &str, value: f64) -> Result<f64, ParamError> {
        let i = self
            .index_of(name)
            .ok_or_else(|| ParamError::Unknown(name.to_string()))?;
        if !value.is_finite() {
            return Err(ParamError::NotFinite {
                name: name.to_string(),
                value,
            });
        }

        let stored = self.specs[i].clamp(value);
        self.cells[i].store(stored);
        tracing::debug!(name, requested = value, stored, "parameter updated");
        Ok(stored)
    }

    /// Put every parameter back to its default.
    pub fn reset_defaults(&self) {
        for (spec, cell) in self.specs.iter().zip(&self.cells) {
            cell.store(spec.clamp(spec.default));
        }
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            values: self
                .specs
                .iter()
                .zip(&self.cells)
                .map(|(s, c)| (s.name.clone(), c.load()))
                .collect(),
        }
    }

    /// Parameter metadata as JSON, for control surfaces that build sliders.
    pub fn describe_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.specs)
    }

    /// Current values as a JSON object keyed by name.
    pub fn values_json(&self) -> serde_json::Result<String> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .snapshot()
            .values
            .into_iter()
            .map(|(name, v)| (name, serde_json::Value::from(v)))
            .collect();
        serde_json::to_string(&map)
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_standard_defaults() {
        let set = ParameterSet::standard();
        assert_eq!(set.get(DOSAGE).unwrap(), 100.0);
        assert_eq!(set.get(HITS).unwrap(), 5.0);
        assert_eq!(set.get(TILES).unwrap(), 4.0);
        assert_eq!(set.get(PIXEL_SIZE).unwrap(), 10.0);
        assert_eq!(set.get(FLOW_STRENGTH).unwrap(), 5.0);
    }

    #[test]
    fn test_standard_spec_lookup_is_shared() {
        let tiles = standard_spec(TILES).unwrap();
        assert_eq!((tiles.min, tiles.max, tiles.default), (1.0, 20.0, 4.0));
        assert!(std::ptr::eq(tiles, standard_spec(TILES).unwrap()));
        assert!(standard_spec("gain").is_none());
    }

    #[test]
    fn test_set_clamps_to_range() {
        let set = ParameterSet::standard();
        assert_eq!(set.set_parameter(DOSAGE, 900.0).unwrap(), 500.0);
        assert_eq!(set.set_parameter(PIXEL_SIZE, 0.0).unwrap(), 2.0);
        assert_eq!(set.get(PIXEL_SIZE).unwrap(), 2.0);
    }

    #[test]
    fn test_unknown_and_non_finite_are_rejected() {
        let set = ParameterSet::standard();
        assert_eq!(
            set.set_parameter("gain", 1.0),
            Err(ParamError::Unknown("gain".into()))
        );
        assert!(matches!(
            set.set_parameter(HITS, f64::NAN),
            Err(ParamError::NotFinite { .. })
        ));
        assert_eq!(set.get(HITS).unwrap(), 5.0);
    }

    #[test]
    fn test_reset_defaults() {
        let set = ParameterSet::standard();
        set.set_parameter(TILES, 17.0).unwrap();
        set.reset_defaults();
        assert_eq!(set.get(TILES).unwrap(), 4.0);
    }

    #[test]
    fn test_writes_from_other_threads_are_visible() {
        let set = Arc::new(ParameterSet::standard());
        let writer = Arc::clone(&set);
        std::thread::spawn(move || writer.set_parameter(FLOW_STRENGTH, 12.5).unwrap())
            .join()
            .unwrap();
        assert_eq!(set.get(FLOW_STRENGTH).unwrap(), 12.5);
    }

    #[test]
    fn test_json_views() {
        let set = ParameterSet::standard();
        let specs: Vec<ParameterSpec> = serde_json::from_str(&set.describe_json().unwrap()).unwrap();
        assert_eq!(specs, standard_specs());

        let values: serde_json::Value = serde_json::from_str(&set.values_json().unwrap()).unwrap();
        assert_eq!(values["dosage"], 100.0);
        assert_eq!(values["pixel_size"], 10.0);
    }
}
