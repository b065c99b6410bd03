//! Session tuning knobs.
//!
//! # Responsibility
//! - Hold every interval, window and geometry constant a session uses.
//! - Load overrides from a JSON file; absent fields keep their defaults.
//!
//! # Invariants
//! - A validated config has non-zero intervals and a non-empty canvas.
//! - Spawn region lies inside the canvas.

use crate::model::note::{CanvasBounds, Point};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_SYNC_INTERVAL_MS: u64 = 3_000;
const DEFAULT_LIVENESS_WINDOW_MS: u64 = 30_000;
const DEFAULT_TYPING_DEBOUNCE_MS: u64 = 2_000;
const DEFAULT_GENERATION_LATENCY_MIN_MS: u64 = 500;
const DEFAULT_GENERATION_LATENCY_MAX_MS: u64 = 1_500;

/// Configuration load/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Rectangle where freshly created notes are placed before jitter.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpawnRegion {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for SpawnRegion {
    fn default() -> Self {
        Self {
            origin_x: 350.0,
            origin_y: 150.0,
            width: 100.0,
            height: 150.0,
        }
    }
}

impl SpawnRegion {
    /// Maps unit-square jitter `(u, v) in [0, 1)^2` into the region.
    pub fn point_at(&self, u: f64, v: f64) -> Point {
        Point::new(self.origin_x + u * self.width, self.origin_y + v * self.height)
    }
}

/// Per-session configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Interval between periodic sync ticks.
    pub sync_interval_ms: u64,
    /// Participants idle longer than this are expired.
    pub liveness_window_ms: u64,
    /// Typing indicator clears after this much keystroke inactivity.
    pub typing_debounce_ms: u64,
    pub generation_latency_min_ms: u64,
    pub generation_latency_max_ms: u64,
    pub canvas: CanvasBounds,
    pub spawn: SpawnRegion,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
            liveness_window_ms: DEFAULT_LIVENESS_WINDOW_MS,
            typing_debounce_ms: DEFAULT_TYPING_DEBOUNCE_MS,
            generation_latency_min_ms: DEFAULT_GENERATION_LATENCY_MIN_MS,
            generation_latency_max_ms: DEFAULT_GENERATION_LATENCY_MAX_MS,
            canvas: CanvasBounds::default(),
            spawn: SpawnRegion::default(),
        }
    }
}

impl SessionConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "sync_interval_ms must be positive".to_string(),
            ));
        }
        if self.typing_debounce_ms == 0 {
            return Err(ConfigError::Invalid(
                "typing_debounce_ms must be positive".to_string(),
            ));
        }
        if self.generation_latency_min_ms > self.generation_latency_max_ms {
            return Err(ConfigError::Invalid(format!(
                "generation latency range is inverted: {}..{}",
                self.generation_latency_min_ms, self.generation_latency_max_ms
            )));
        }
        if !(self.canvas.max_x > 0.0 && self.canvas.max_y > 0.0) {
            return Err(ConfigError::Invalid(
                "canvas bounds must be positive".to_string(),
            ));
        }
        let spawn = &self.spawn;
        let far_corner = spawn.point_at(1.0, 1.0);
        if spawn.width < 0.0
            || spawn.height < 0.0
            || !self.canvas.contains(Point::new(spawn.origin_x, spawn.origin_y))
            || !self.canvas.contains(far_corner)
        {
            return Err(ConfigError::Invalid(
                "spawn region must lie inside the canvas".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SessionConfig};

    #[test]
    fn defaults_match_session_timing() {
        let config = SessionConfig::default();
        assert_eq!(config.sync_interval_ms, 3_000);
        assert_eq!(config.liveness_window_ms, 30_000);
        assert_eq!(config.typing_debounce_ms, 2_000);
        assert_eq!(config.canvas.max_x, 800.0);
        config.validate().expect("defaults should validate");
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = SessionConfig::from_json_str(r#"{"sync_interval_ms": 500}"#)
            .expect("partial config should parse");
        assert_eq!(config.sync_interval_ms, 500);
        assert_eq!(config.typing_debounce_ms, 2_000);
    }

    #[test]
    fn rejects_unknown_fields_and_invalid_values() {
        let err = SessionConfig::from_json_str(r#"{"sync_every": 1}"#).expect_err("unknown field");
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = SessionConfig::from_json_str(r#"{"sync_interval_ms": 0}"#)
            .expect_err("zero interval must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SessionConfig::from_json_str(r#"{"canvas": {"max_x": 100.0, "max_y": 100.0}}"#)
            .expect_err("spawn outside canvas must fail");
        assert!(err.to_string().contains("spawn region"));
    }

    #[test]
    fn load_reports_missing_file_path() {
        let err = SessionConfig::load("/definitely/not/here.json").expect_err("missing file");
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
