//! Simulation parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Spatial index implementation backing an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    /// Quadtree with subtree pruning.
    Optimized,
    /// Flat list scanned on every query.
    Linear,
}

/// Simulation parameters that control environment behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Environment width.
    pub width: f32,
    /// Environment height.
    pub height: f32,
    /// Spatial index implementation.
    pub index: IndexKind,
    /// Objects a quadtree leaf holds before it splits.
    pub node_capacity: usize,
    /// Maximum quadtree depth.
    pub max_depth: u32,
    /// Quadtree leaves whose shorter side is at most this never split.
    pub min_node_size: f32,
    /// Starting energy of organisms placed by [`super::environment::Environment::populate`].
    pub initial_energy: f32,
    /// Energy of food spawned by [`super::environment::Environment::spawn_food_randomly`].
    pub food_energy: f32,
    /// Energy above which an organism reproduces.
    pub reproduction_threshold: f32,
    /// Whether organisms eat much smaller organisms within their reaction radius.
    pub predation: bool,
    /// Size factor separating predator from prey (and prey from predator).
    pub predation_size_ratio: f32,
    /// Probability of keeping the previous heading when nothing caught an organism's attention.
    pub movement_persistence: f32,
    /// Run perception on the rayon thread pool.
    pub parallel: bool,
    /// Seed for movement and spawning randomness; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
            index: IndexKind::Optimized,
            node_capacity: 10,
            max_depth: 10,
            min_node_size: 10.0,
            initial_energy: 500.0,
            food_energy: 100.0,
            reproduction_threshold: 1000.0,
            predation: true,
            predation_size_ratio: 1.5,
            movement_persistence: 0.8,
            parallel: true,
            seed: None,
        }
    }
}

impl Params {
    /// Checks that the parameters describe a usable environment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(ConfigError::Invalid("width must be positive and finite"));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(ConfigError::Invalid("height must be positive and finite"));
        }
        if self.node_capacity == 0 {
            return Err(ConfigError::Invalid("node_capacity must be at least 1"));
        }
        if self.food_energy <= 0.0 {
            return Err(ConfigError::Invalid("food_energy must be positive"));
        }
        if !(0.0..=1.0).contains(&self.movement_persistence) {
            return Err(ConfigError::Invalid(
                "movement_persistence must be between 0 and 1",
            ));
        }
        Ok(())
    }

    /// Saves the parameters to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads and validates parameters from a JSON file.
    ///
    /// Missing fields fall back to [`Params::default`].
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }
}
