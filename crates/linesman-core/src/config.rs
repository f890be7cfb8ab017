//! Editor configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest stroke width a path may carry, in pixels.
pub const MIN_PATH_WIDTH: f64 = 1.0;
/// Largest stroke width a path may carry, in pixels.
pub const MAX_PATH_WIDTH: f64 = 20.0;
/// Snap radius in screen pixels.
pub const DEFAULT_SNAP_RADIUS: f64 = 20.0;
/// Identifier of the layer every path falls back to.
pub const DEFAULT_LAYER_ID: &str = "default";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tunable settings for the editor.
///
/// Every field has a default, so a partial JSON object (or `{}`) is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Pointer proximity (screen pixels) that triggers snapping and node hits.
    pub snap_radius_px: f64,
    /// Hex color assigned to newly drawn paths.
    pub default_color: String,
    /// Stroke width assigned to newly drawn paths.
    pub default_width: f64,
    /// Layer that new paths and orphaned paths belong to.
    pub default_layer_id: String,
    /// Storage key holding the path collection.
    pub paths_key: String,
    /// Storage key holding the monotonic path counter.
    pub path_counter_key: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_radius_px: DEFAULT_SNAP_RADIUS,
            default_color: "#3388ff".to_string(),
            default_width: 4.0,
            default_layer_id: DEFAULT_LAYER_ID.to_string(),
            paths_key: "linesman.paths".to_string(),
            path_counter_key: "linesman.path_counter".to_string(),
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON, filling in defaults for missing fields.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.snap_radius_px.is_finite() && self.snap_radius_px > 0.0) {
            log::warn!("Rejecting snap radius {}", self.snap_radius_px);
            return Err(ConfigError::Invalid(format!(
                "snap_radius_px must be positive, got {}",
                self.snap_radius_px
            )));
        }
        if self.paths_key == self.path_counter_key {
            return Err(ConfigError::Invalid(
                "paths_key and path_counter_key must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Clamp a stroke width into `[MIN_PATH_WIDTH, MAX_PATH_WIDTH]`.
/// NaN maps to the minimum.
pub fn clamp_width(width: f64) -> f64 {
    if width.is_nan() {
        MIN_PATH_WIDTH
    } else {
        width.clamp(MIN_PATH_WIDTH, MAX_PATH_WIDTH)
    }
}
