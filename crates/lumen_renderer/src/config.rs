//! Render configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid combinations of render settings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("samples_per_pixel must be at least 1")]
    NoSamples,

    #[error("threads must be at least 1")]
    NoThreads,

    #[error("leaf_size must be at least 1")]
    EmptyLeaves,

    #[error("russian_roulette must be within [0, 1], got {0}")]
    RouletteOutOfRange(f32),

    #[error("russian_roulette = 1 never terminates a path; set max_depth")]
    Unbounded,
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Samples per pixel
    pub samples_per_pixel: u32,
    /// Worker threads; rows are split into this many ranges
    pub threads: usize,
    /// Probability of continuing a path at each bounce
    pub russian_roulette: f32,
    /// Optional hard cap on path length (bounces)
    pub max_depth: Option<u32>,
    /// Objects per BVH leaf
    pub leaf_size: usize,
    /// Base seed for the per-worker generators; entropy when unset
    pub seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 32,
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            russian_roulette: 0.8,
            max_depth: None,
            leaf_size: 1,
            seed: None,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::NoSamples);
        }
        if self.threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        if self.leaf_size == 0 {
            return Err(ConfigError::EmptyLeaves);
        }
        if !(0.0..=1.0).contains(&self.russian_roulette) {
            return Err(ConfigError::RouletteOutOfRange(self.russian_roulette));
        }
        if self.russian_roulette >= 1.0 && self.max_depth.is_none() {
            return Err(ConfigError::Unbounded);
        }
        Ok(())
    }
}
