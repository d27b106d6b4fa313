// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Engine configuration
//!
//! Tuning values for the scheduler and the core systems. Every section has a
//! sensible default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! [world]
//! max_x = 1280.0
//! max_y = 720.0
//!
//! [collision]
//! cell_size = 64.0
//! ```
//!
//! Set `ARCADE_CORE_CONFIG` to a file path to load it with
//! [`EngineConfig::from_env`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable naming a TOML config file
pub const CONFIG_ENV_VAR: &str = "ARCADE_CORE_CONFIG";

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Playable rectangle in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldBounds {
    /// Left edge
    pub min_x: f64,
    /// Top edge
    pub min_y: f64,
    /// Right edge
    pub max_x: f64,
    /// Bottom edge
    pub max_y: f64,
}

impl WorldBounds {
    /// Create bounds from edges
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        WorldBounds {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Bounds from the origin to `(width, height)`
    pub fn from_size(width: f64, height: f64) -> Self {
        WorldBounds::new(0.0, 0.0, width, height)
    }

    /// Width of the rectangle
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the rectangle
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        WorldBounds::from_size(800.0, 600.0)
    }
}

/// Collision grid tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Side length of a grid cell in world units
    pub cell_size: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        CollisionConfig { cell_size: 100.0 }
    }
}

/// Movement tuning shared by all entities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Bounds inset for entities without a collision component
    pub default_radius: f64,
    /// Turn rate toward the direction of travel, radians per second
    pub rotation_speed: f64,
    /// Below this speed the facing is left alone
    pub min_rotation_speed: f64,
    /// Velocity components smaller than this snap to zero while damping
    pub velocity_epsilon: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        MovementConfig {
            default_radius: 16.0,
            rotation_speed: 10.0,
            min_rotation_speed: 10.0,
            velocity_epsilon: 0.01,
        }
    }
}

/// Frame delta clamping for [`Scheduler::tick`](crate::ecs::scheduler::Scheduler::tick)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Longest simulated sub-step in seconds
    pub max_step: f64,
    /// Maximum sub-steps per host frame
    pub max_substeps: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        FrameConfig {
            max_step: 1.0 / 30.0,
            max_substeps: 4,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Playable area
    pub world: WorldBounds,
    /// Collision grid
    pub collision: CollisionConfig,
    /// Movement feel
    pub movement: MovementConfig,
    /// Frame clamping
    pub frame: FrameConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load from the file named by `ARCADE_CORE_CONFIG`
    ///
    /// Falls back to defaults when the variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => {
                log::info!("loading engine config from {}", path);
                Self::load_from_file(path)
            }
            Err(_) => Ok(EngineConfig::default()),
        }
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if !(world.max_x > world.min_x && world.max_y > world.min_y) {
            return Err(ConfigError::Invalid(format!(
                "world bounds are empty or inverted: ({}, {})..({}, {})",
                world.min_x, world.min_y, world.max_x, world.max_y
            )));
        }
        if !(self.collision.cell_size > 0.0 && self.collision.cell_size.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "cell_size must be positive and finite, got {}",
                self.collision.cell_size
            )));
        }
        if self.movement.default_radius < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "default_radius must be non-negative, got {}",
                self.movement.default_radius
            )));
        }
        if !(self.movement.velocity_epsilon >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "velocity_epsilon must be non-negative, got {}",
                self.movement.velocity_epsilon
            )));
        }
        if !(self.frame.max_step > 0.0 && self.frame.max_step.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "max_step must be positive and finite, got {}",
                self.frame.max_step
            )));
        }
        if self.frame.max_substeps == 0 {
            return Err(ConfigError::Invalid("max_substeps must be at least 1".into()));
        }
        Ok(())
    }
}
