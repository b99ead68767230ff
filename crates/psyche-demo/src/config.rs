//! Application configuration for the demo.

use std::path::PathBuf;
use std::time::Duration;

use psyche_engine::config::DEFAULT_WORKERS;
use psyche_engine::{EngineConfig, ProcessingMode, SourceBackend, SourceConfig};

/// Default tick interval in milliseconds (about 30 Hz).
const DEFAULT_TICK_MS: u64 = 33;
/// Frames buffered ahead by the background reader.
const BUFFER_CAPACITY: usize = 4;
/// Size of the synthetic pattern when no input directory is given.
pub const PATTERN_SIZE: (u32, u32) = (320, 240);

/// Runtime configuration for the demo, read from `PSYCHE_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Camera index, `/dev/videoN` path or video file to capture from.
    /// Takes precedence over `input`; needs the `video` feature.
    pub capture: Option<String>,
    /// Directory of input images. The synthetic pattern is used when unset.
    pub input: Option<PathBuf>,
    /// Directory for PNG output. Frames are only counted when unset.
    pub output: Option<PathBuf>,
    /// Read frames ahead on a background thread.
    pub buffered: bool,
    /// Worker threads for processing; 0 processes on the control thread.
    pub workers: usize,
    /// Time between ticks.
    pub tick: Duration,
    /// Stop after this many frames.
    pub max_frames: Option<u64>,
    /// Restart the input directory when it runs out.
    pub looping: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl AppConfig {
    /// Build the configuration from any variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| {
            lookup(key).is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes" | "on"))
        };
        Self {
            capture: lookup("PSYCHE_CAPTURE")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            input: lookup("PSYCHE_INPUT").map(PathBuf::from),
            output: lookup("PSYCHE_OUTPUT").map(PathBuf::from),
            buffered: flag("PSYCHE_BUFFERED"),
            workers: lookup("PSYCHE_WORKERS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_WORKERS),
            tick: Duration::from_millis(
                lookup("PSYCHE_TICK_MS")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(DEFAULT_TICK_MS),
            ),
            max_frames: lookup("PSYCHE_FRAMES").and_then(|s| s.trim().parse().ok()),
            looping: flag("PSYCHE_LOOP"),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            tick_interval: self.tick,
            max_frames: self.max_frames,
            processing: match self.workers {
                0 => ProcessingMode::Inline,
                workers => ProcessingMode::Offload { workers },
            },
            ..EngineConfig::default()
        }
    }

    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            backend: if self.buffered {
                SourceBackend::Buffered {
                    capacity: BUFFER_CAPACITY,
                }
            } else {
                SourceBackend::Blocking
            },
            ..SourceConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = config_from(&[]);
        assert_eq!(config.input, None);
        assert_eq!(config.capture, None);
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.tick, Duration::from_millis(33));
        assert!(!config.buffered);
        assert_eq!(config.source_config().backend, SourceBackend::Blocking);
    }

    #[test]
    fn test_variables_are_applied() {
        let config = config_from(&[
            ("PSYCHE_INPUT", "/tmp/frames"),
            ("PSYCHE_BUFFERED", "1"),
            ("PSYCHE_WORKERS", "0"),
            ("PSYCHE_TICK_MS", "50"),
            ("PSYCHE_FRAMES", "120"),
            ("PSYCHE_LOOP", "true"),
        ]);
        assert_eq!(config.input, Some(PathBuf::from("/tmp/frames")));
        assert!(config.looping);
        assert_eq!(config.max_frames, Some(120));

        let engine = config.engine_config();
        assert_eq!(engine.processing, ProcessingMode::Inline);
        assert_eq!(engine.tick_interval, Duration::from_millis(50));
        assert_eq!(
            config.source_config().backend,
            SourceBackend::Buffered {
                capacity: BUFFER_CAPACITY
            }
        );
    }

    #[test]
    fn test_capture_uri() {
        let config = config_from(&[("PSYCHE_CAPTURE", " /dev/video0 ")]);
        assert_eq!(config.capture.as_deref(), Some("/dev/video0"));
        assert_eq!(config_from(&[("PSYCHE_CAPTURE", "  ")]).capture, None);
    }

    #[test]
    fn test_unparsable_numbers_fall_back() {
        let config = config_from(&[("PSYCHE_WORKERS", "many"), ("PSYCHE_TICK_MS", "-3")]);
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.tick, Duration::from_millis(DEFAULT_TICK_MS));
    }
}
