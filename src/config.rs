//! Player Configuration
//!
//! Settings for the player, kept as RON in the user's config directory
//! (`<config_dir>/questmap/config.ron`). A missing file means defaults;
//! a file that exists but does not parse is an error.

use crate::game::{PlayerRole, SessionOptions};
use crate::geo::WatchOptions;
use crate::map::pinch::PINCH_THRESHOLD;
use crate::map::ZoomLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Game API root used when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("config serialize error: {0}")]
    Serialize(#[from] ron::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub api_base: String,
    pub watch: WatchOptions,
    /// Relative distance change a pinch must exceed before zooming
    pub pinch_threshold: f64,
    pub zoom: ZoomLimits,
    pub test_mode: bool,
    pub role: PlayerRole,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            watch: WatchOptions::default(),
            pinch_threshold: PINCH_THRESHOLD,
            zoom: ZoomLimits::default(),
            test_mode: false,
            role: PlayerRole::Player,
        }
    }
}

impl PlayerConfig {
    /// `<config_dir>/questmap/config.ron`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("questmap")
            .join("config.ron")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config: PlayerConfig = ron::from_str(&contents)?;
        Ok(config.sanitized())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .indentor("  ".to_string());
        let text = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Swap inverted zoom bounds and reject a non-positive pinch threshold
    fn sanitized(mut self) -> Self {
        if self.zoom.min > self.zoom.max {
            std::mem::swap(&mut self.zoom.min, &mut self.zoom.max);
        }
        if !(self.pinch_threshold.is_finite() && self.pinch_threshold > 0.0) {
            tracing::warn!(value = self.pinch_threshold, "invalid pinch threshold, using default");
            self.pinch_threshold = PINCH_THRESHOLD;
        }
        self
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            test_mode: self.test_mode,
            role: self.role,
            watch: self.watch,
            api_base: self.api_base.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = PlayerConfig::load(dir.path().join("config.ron")).unwrap();
        assert_eq!(config, PlayerConfig::default());
        assert!(config.watch.high_accuracy);
        assert_eq!(config.watch.maximum_age_ms, 2000);
        assert_eq!(config.watch.timeout_ms, 10000);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ron");
        let config = PlayerConfig {
            test_mode: true,
            role: PlayerRole::Mod,
            api_base: "https://example.org/api".into(),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(PlayerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(test_mode: true, zoom: (min: 4.0, max: 1.0))").unwrap();
        let config = PlayerConfig::load(&path).unwrap();
        assert!(config.test_mode);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!((config.zoom.min - 1.0).abs() < 1e-12);
        assert!((config.zoom.max - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(test_mode: maybe)").unwrap();
        assert!(matches!(PlayerConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
