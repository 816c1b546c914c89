//! Store configuration
//!
//! Loaded from TOML or built in code with `with_*` methods. Validation runs
//! when a store is constructed, so an invalid configuration never produces a
//! store.

use crate::error::ConfigError;
use crate::level::Level;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use strata_merge::SequenceMerge;

/// Default number of cached top-level keys
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Attribute store configuration
///
/// ```toml
/// levels = ["default", "normal", "override", "automatic"]
/// cache_capacity = 512
/// slot_sequences = "union"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Configured precedence levels; others are unknown to the store
    pub levels: Vec<Level>,
    /// Maximum number of cached merge results
    pub cache_capacity: u64,
    /// How sequences combine between sub-levels of the same slot
    pub slot_sequences: SequenceMerge,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            levels: Level::ALL.to_vec(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            slot_sequences: SequenceMerge::default(),
        }
    }
}

impl StoreConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With configured levels
    #[inline]
    #[must_use]
    pub fn with_levels(mut self, levels: impl IntoIterator<Item = Level>) -> Self {
        self.levels = levels.into_iter().collect();
        self
    }

    /// With cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// With slot sequence handling
    #[inline]
    #[must_use]
    pub fn with_slot_sequences(mut self, mode: SequenceMerge) -> Self {
        self.slot_sequences = mode;
        self
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns error if the TOML is malformed or the configuration is invalid
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or its content is invalid
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Check structural validity
    ///
    /// # Errors
    /// Returns error if no level is configured or a level repeats
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        let mut seen = HashSet::with_capacity(self.levels.len());
        for level in &self.levels {
            if !seen.insert(*level) {
                return Err(ConfigError::DuplicateLevel(*level));
            }
        }
        Ok(())
    }

    /// Whether `level` is configured
    #[inline]
    #[must_use]
    pub fn has_level(&self, level: Level) -> bool {
        self.levels.contains(&level)
    }
}
