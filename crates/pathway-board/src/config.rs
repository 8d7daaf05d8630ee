//! Board configuration

use crate::sort::SavedOrder;
use crate::zones::{Rect, ZoneRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Flag key shared with the web client's local storage
pub const DEFAULT_FLAG_KEY: &str = "hasSeenTargetExplanation";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Program board configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Pointer travel before a press becomes a drag
    pub activation_distance_px: f32,
    /// Key of the durable explanation flag
    pub explanation_flag_key: String,
    /// Re-read the snapshot when the store reports a missing record
    pub refresh_on_not_found: bool,
    /// Saved ordering when a filter does not name one
    pub default_saved_order: SavedOrder,
    /// Saved drop zone bounds
    pub saved_zone: Rect,
    /// Target drop zone bounds
    pub target_zone: Rect,
}

impl BoardConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With activation distance
    #[inline]
    #[must_use]
    pub fn with_activation_distance(mut self, px: f32) -> Self {
        self.activation_distance_px = px;
        self
    }

    /// With flag key
    #[inline]
    #[must_use]
    pub fn with_flag_key(mut self, key: impl Into<String>) -> Self {
        self.explanation_flag_key = key.into();
        self
    }

    /// With default saved ordering
    #[inline]
    #[must_use]
    pub fn with_saved_order(mut self, order: SavedOrder) -> Self {
        self.default_saved_order = order;
        self
    }

    /// With zone bounds
    #[inline]
    #[must_use]
    pub fn with_zones(mut self, saved: Rect, target: Rect) -> Self {
        self.saved_zone = saved;
        self.target_zone = target;
        self
    }

    /// Drop zones built from the configured bounds
    #[inline]
    #[must_use]
    pub fn zones(&self) -> ZoneRegistry {
        ZoneRegistry::new(self.saved_zone, self.target_zone)
    }

    /// Parse from TOML, missing keys take defaults
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML
    /// - `ConfigError::Invalid` on out-of-range values
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// See [`BoardConfig::from_toml_str`]; also `ConfigError::Io`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// - `ConfigError::Invalid` if serialization fails
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.activation_distance_px.is_finite() || self.activation_distance_px < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "activation_distance_px must be a non-negative number, got {}",
                self.activation_distance_px
            )));
        }
        if self.explanation_flag_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "explanation_flag_key must not be empty".to_string(),
            ));
        }
        for (name, rect) in [("saved_zone", self.saved_zone), ("target_zone", self.target_zone)] {
            if rect.width <= 0.0 || rect.height <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} has no area")));
            }
        }
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            activation_distance_px: 8.0,
            explanation_flag_key: DEFAULT_FLAG_KEY.to_string(),
            refresh_on_not_found: true,
            default_saved_order: SavedOrder::AsStored,
            saved_zone: Rect::new(0.0, 0.0, 640.0, 900.0),
            target_zone: Rect::new(680.0, 0.0, 360.0, 900.0),
        }
    }
}
