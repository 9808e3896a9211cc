//! Engine configuration structures

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::foundation::logging::DEFAULT_HISTORY_CAPACITY;
use crate::foundation::math::Vec3;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Logging service settings
    pub logging: LoggingConfig,
    /// Physics controller settings
    pub physics: PhysicsConfig,
    /// Simulation stepping
    pub timestep: TimestepConfig,
    /// Script libraries loaded at startup
    pub scripts: ScriptConfig,
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Check every section for out-of-range values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.physics.validate()?;
        self.timestep.validate()
    }
}

/// Logging service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Number of messages kept for in-engine inspection
    pub history_capacity: usize,
    /// Echo every message to stdout/stderr
    pub echo_to_console: bool,
    /// `RUST_LOG`-style directives for records arriving through the `log` facade
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            echo_to_console: true,
            filter: "info".to_string(),
        }
    }
}

/// Surface response of the default physics material
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    /// Friction coefficient at rest
    pub static_friction: f32,
    /// Friction coefficient while sliding
    pub dynamic_friction: f32,
    /// Bounciness (0 = none, 1 = perfectly elastic)
    pub restitution: f32,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            static_friction: 0.5,
            dynamic_friction: 0.5,
            restitution: 0.6,
        }
    }
}

/// Physics controller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// World gravity in m/s^2
    pub gravity: Vec3,
    /// Default material applied to every collider
    pub material: MaterialConfig,
    /// Density used to derive mass and inertia of dynamic actors
    pub reference_density: f32,
    /// Build the debug-visualization pipeline on init
    pub debug_visualization: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            material: MaterialConfig::default(),
            reference_density: 10.0,
            debug_visualization: false,
        }
    }
}

impl PhysicsConfig {
    /// Reject values the simulation cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gravity.iter().all(|component| component.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "physics.gravity",
                reason: format!("must be finite, got {:?}", self.gravity),
            });
        }

        let coefficients = [
            ("physics.material.static_friction", self.material.static_friction),
            ("physics.material.dynamic_friction", self.material.dynamic_friction),
            ("physics.material.restitution", self.material.restitution),
        ];
        for (field, value) in coefficients {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a non-negative number, got {value}"),
                });
            }
        }

        if !self.reference_density.is_finite() || self.reference_density <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "physics.reference_density",
                reason: format!("must be positive, got {}", self.reference_density),
            });
        }

        Ok(())
    }
}

/// Simulation stepping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestepConfig {
    /// Fixed simulation step in seconds; `None` steps once per frame with the frame time
    pub fixed_delta: Option<f32>,
    /// Upper bound on fixed steps per frame
    pub max_substeps: u32,
}

impl Default for TimestepConfig {
    fn default() -> Self {
        Self {
            fixed_delta: Some(1.0 / 60.0),
            max_substeps: 8,
        }
    }
}

impl TimestepConfig {
    /// Reject a non-positive fixed step
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.fixed_delta {
            Some(step) if !step.is_finite() || step <= 0.0 => Err(ConfigError::Invalid {
                field: "timestep.fixed_delta",
                reason: format!("must be positive, got {step}"),
            }),
            _ => Ok(()),
        }
    }
}

/// Script libraries loaded at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Shared library paths
    pub libraries: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [physics]
            gravity = [0.0, -1.62, 0.0]

            [timestep]
            max_substeps = 2
            "#,
        )
        .expect("valid config");

        assert_eq!(config.physics.gravity, Vec3::new(0.0, -1.62, 0.0));
        assert_eq!(config.physics.material, MaterialConfig::default());
        assert_eq!(config.timestep.max_substeps, 2);
        assert_eq!(config.timestep.fixed_delta, Some(1.0 / 60.0));
        assert_eq!(config.logging.history_capacity, DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_restitution() {
        let mut config = PhysicsConfig::default();
        config.material.restitution = -0.1;

        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => {
                assert_eq!(field, "physics.material.restitution");
            }
            other => panic!("expected invalid restitution, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_zero_fixed_step() {
        let config = TimestepConfig {
            fixed_delta: Some(0.0),
            max_substeps: 4,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_ron_file() {
        let path = std::env::temp_dir().join(format!("elixir_config_{}.ron", std::process::id()));

        let mut config = EngineConfig::default();
        config.physics.reference_density = 4.0;
        config.scripts.libraries.push("libgame.so".to_string());
        config.save_to_file(&path).expect("config written");

        let loaded = EngineConfig::load_from_file(&path).expect("config read back");
        let _ = std::fs::remove_file(&path);

        assert!((loaded.physics.reference_density - 4.0).abs() < f32::EPSILON);
        assert_eq!(loaded.scripts.libraries, vec!["libgame.so".to_string()]);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert!(matches!(
            EngineConfig::load_from_file("engine.yaml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            EngineConfig::default().save_to_file("engine.json"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_and_malformed_files_name_the_path() {
        let missing = std::env::temp_dir().join("elixir_config_missing.toml");
        let error = EngineConfig::load_from_file(&missing).expect_err("file does not exist");
        assert!(matches!(&error, ConfigError::Io { path, .. } if path == &missing));

        let broken = std::env::temp_dir().join(format!("elixir_config_broken_{}.toml", std::process::id()));
        std::fs::write(&broken, "physics = [").expect("temp file written");
        let result = EngineConfig::load_from_file(&broken);
        let _ = std::fs::remove_file(&broken);

        assert!(matches!(result, Err(ConfigError::Parse { path, .. }) if path == broken));
    }
}
