//! Simulation settings
//!
//! Stored as JSON next to the scene. Every field has a default, so a partial
//! file only overrides what it names.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::normalize_axis;

/// Tunables for the bounce pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Thresholds ===
    /// Hit distance below which a falling cube bounces
    pub bounce_threshold: f32,
    /// Hit distance below which the proximity signal reads "near"
    pub near_threshold: f32,

    // === Motion ===
    /// Velocity a bouncing cube is reset to
    pub bounce_impulse: f32,
    /// Velocity subtracted every tick
    pub gravity_step: f32,
    /// Velocity assigned on activation
    pub initial_velocity: f32,
    /// Axis velocity is applied along (rays are cast the opposite way)
    pub up_axis: Vec3,
    /// Longest ray the intersection pass will trace
    pub max_ray_distance: f32,

    // === Scheduling ===
    /// Objects per parallel work item
    pub batch_size: usize,
    /// Worker threads (None = one per core)
    pub worker_threads: Option<usize>,
    /// Let position apply overlap the rest of the frame
    pub deferred_apply: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bounce_threshold: BOUNCE_THRESHOLD,
            near_threshold: NEAR_THRESHOLD,

            bounce_impulse: BOUNCE_IMPULSE,
            gravity_step: GRAVITY_STEP,
            initial_velocity: INITIAL_VELOCITY,
            up_axis: Vec3::Y,
            max_ray_distance: MAX_RAY_DISTANCE,

            batch_size: BATCH_SIZE,
            worker_threads: None,
            deferred_apply: true,
        }
    }
}

impl Settings {
    /// Normalized up axis
    pub fn up(&self) -> Vec3 {
        normalize_axis(self.up_axis)
    }

    /// Direction every ground ray is cast in
    pub fn ray_direction(&self) -> Vec3 {
        -self.up()
    }

    /// Check that the pipeline can run with these values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("bounce_threshold", self.bounce_threshold),
            ("near_threshold", self.near_threshold),
            ("bounce_impulse", self.bounce_impulse),
            ("gravity_step", self.gravity_step),
            ("initial_velocity", self.initial_velocity),
            ("max_ray_distance", self.max_ray_distance),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be a finite number",
                });
            }
        }

        if self.bounce_threshold < 0.0 {
            return Err(invalid("bounce_threshold", "must not be negative"));
        }
        if self.near_threshold < 0.0 {
            return Err(invalid("near_threshold", "must not be negative"));
        }
        if self.max_ray_distance <= 0.0 {
            return Err(invalid("max_ray_distance", "must be positive"));
        }
        if !self.up_axis.is_finite() || self.up_axis.length_squared() == 0.0 {
            return Err(invalid("up_axis", "must be a non-zero finite vector"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size", "must be at least 1"));
        }
        if self.worker_threads == Some(0) {
            return Err(invalid("worker_threads", "must be at least 1 when set"));
        }

        if self.near_threshold <= self.bounce_threshold {
            log::warn!(
                "near_threshold ({}) <= bounce_threshold ({}): cubes will bounce before the UI reports near",
                self.near_threshold,
                self.bounce_threshold
            );
        }

        Ok(())
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, using defaults when the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.batch_size, 20);
        assert_eq!(settings.ray_direction(), Vec3::NEG_Y);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "bounce_impulse": 3.0, "batch_size": 8 }"#).unwrap();
        assert_eq!(settings.bounce_impulse, 3.0);
        assert_eq!(settings.batch_size, 8);
        assert_eq!(settings.gravity_step, GRAVITY_STEP);
        assert!(settings.deferred_apply);
    }

    #[test]
    fn test_rejects_zero_batch() {
        let err = Settings::from_json(r#"{ "batch_size": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "batch_size",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_values() {
        let settings = Settings {
            up_axis: Vec3::ZERO,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            bounce_threshold: f32::NAN,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            worker_threads: Some(0),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("bounce_cubes_settings_{}.json", std::process::id()));
        let settings = Settings {
            near_threshold: 1.5,
            worker_threads: Some(2),
            ..Default::default()
        };
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("bounce_cubes_settings_does_not_exist.json");
        let settings = Settings::load_or_default(&path).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
