// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::in_memory_state_store::StoreConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("store_initial_capacity must be at least 1")]
    ZeroInitialCapacity,

    #[error("store_growth_ratio must be a finite number >= 1.0, got {0}")]
    InvalidGrowthRatio(f64),

    #[error("split_pattern is not a valid regex: {0}")]
    InvalidPattern(#[from] regex::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Number of distinct-key slots the store starts with
    pub store_initial_capacity: usize,
    /// Multiplier applied to the store capacity when it runs out of slots
    pub store_growth_ratio: f64,
    /// Regex a line must match to become an input split
    pub split_pattern: String,
    /// Treat an unreadable input file as an empty input instead of failing the job
    pub skip_unreadable_input: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_initial_capacity: StoreConfig::DEFAULT_INITIAL_CAPACITY,
            store_growth_ratio: StoreConfig::DEFAULT_GROWTH_RATIO,
            split_pattern: ".+".to_string(),
            skip_unreadable_input: true,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store_config()?;
        Regex::new(&self.split_pattern)?;
        Ok(())
    }

    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        StoreConfig::new(self.store_initial_capacity, self.store_growth_ratio)
    }
}
