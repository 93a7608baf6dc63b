use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::collab::LayerMask;
use crate::grid::CellGrid;
use crate::math::Vec3;

pub const CONFIG_ENV_VAR: &str = "BUILDGRID_CONFIG";

pub const DEFAULT_REMOVAL_RANGE: f32 = 3.0;
pub const DEFAULT_RAY_MAX_DISTANCE: f32 = 100.0;
pub const DEFAULT_SEAT_FACING_THRESHOLD: f32 = -0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacementConfig {
    pub removal_range: f32,
    pub ray_max_distance: f32,
    pub placement_mask: LayerMask,
    pub cell_size: f32,
    pub grid_origin: Vec3,
    /// A seat faces the anchor when the dot product of its forward vector and
    /// the direction to the anchor is at or below this value.
    pub seat_facing_threshold: f32,
    pub seat_occluder_mask: LayerMask,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            removal_range: DEFAULT_REMOVAL_RANGE,
            ray_max_distance: DEFAULT_RAY_MAX_DISTANCE,
            placement_mask: LayerMask::ALL,
            cell_size: 1.0,
            grid_origin: Vec3::ZERO,
            seat_facing_threshold: DEFAULT_SEAT_FACING_THRESHOLD,
            seat_occluder_mask: LayerMask::ALL,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config json at {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl PlacementConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config: PlacementConfig = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|error| {
                let path = error.path().to_string();
                let location = if path.is_empty() || path == "." {
                    "<root>".to_string()
                } else {
                    path
                };
                ConfigError::Parse {
                    location,
                    source: error.into_inner(),
                }
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive_finite("removal_range", self.removal_range)?;
        positive_finite("ray_max_distance", self.ray_max_distance)?;
        positive_finite("cell_size", self.cell_size)?;
        if !self.grid_origin.is_finite() {
            return Err(ConfigError::Invalid {
                field: "grid_origin",
                message: "expected finite coordinates".to_string(),
            });
        }
        if !(-1.0..=1.0).contains(&self.seat_facing_threshold) {
            return Err(ConfigError::Invalid {
                field: "seat_facing_threshold",
                message: format!(
                    "expected a value in [-1, 1], got {}",
                    self.seat_facing_threshold
                ),
            });
        }
        Ok(())
    }

    pub fn cell_grid(&self) -> CellGrid {
        CellGrid::new(self.grid_origin, self.cell_size)
    }
}

fn positive_finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            message: format!("expected a positive finite number, got {value}"),
        })
    }
}

pub fn load_config(path: &Path) -> Result<PlacementConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = PlacementConfig::from_json_str(&raw)?;
    debug!(path = %path.display(), "config_loaded");
    Ok(config)
}

/// Config path from `BUILDGRID_CONFIG`, or `None` when unset.
pub fn resolve_config_path() -> Result<Option<PathBuf>, ConfigError> {
    match env::var(CONFIG_ENV_VAR) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(PathBuf::from(value.trim()))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(ConfigError::EnvVar {
            var: CONFIG_ENV_VAR,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_yields_defaults() {
        let config = PlacementConfig::from_json_str("{}").expect("defaults");
        assert_eq!(config, PlacementConfig::default());
        assert_eq!(config.removal_range, 3.0);
        assert_eq!(config.ray_max_distance, 100.0);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = PlacementConfig::from_json_str(
            r#"{ "removal_range": 4.5, "placement_mask": 6, "grid_origin": { "x": -8.0, "y": 0.0, "z": -6.0 } }"#,
        )
        .expect("parse");
        assert_eq!(config.removal_range, 4.5);
        assert_eq!(config.placement_mask, LayerMask(6));
        assert_eq!(config.cell_size, 1.0);
        assert_eq!(
            config.cell_grid().cell_to_world(crate::math::Cell::new(0, 0, 0)),
            Vec3::new(-8.0, 0.0, -6.0)
        );
    }

    #[test]
    fn type_errors_name_the_json_path() {
        let err = PlacementConfig::from_json_str(r#"{ "grid_origin": { "x": "left" } }"#)
            .expect_err("bad type");
        match err {
            ConfigError::Parse { location, .. } => assert_eq!(location, "grid_origin.x"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = PlacementConfig::from_json_str(r#"{ "removal_rnage": 2.0 }"#)
            .expect_err("typo");
        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    }

    #[test]
    fn non_positive_range_is_invalid() {
        let err = PlacementConfig::from_json_str(r#"{ "removal_range": 0.0 }"#)
            .expect_err("zero range");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "removal_range",
                ..
            }
        ));
    }

    #[test]
    fn facing_threshold_outside_unit_range_is_invalid() {
        let err = PlacementConfig::from_json_str(r#"{ "seat_facing_threshold": -1.5 }"#)
            .expect_err("threshold");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "seat_facing_threshold",
                ..
            }
        ));
    }

    #[test]
    fn load_config_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "removal_range": 2.5, "cell_size": 0.5 }}"#).expect("write");
        let config = load_config(file.path()).expect("load");
        assert_eq!(config.removal_range, 2.5);
        assert_eq!(config.cell_grid().cell_size(), 0.5);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing.json");
        let err = load_config(&path).expect_err("missing");
        match err {
            ConfigError::Read { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
