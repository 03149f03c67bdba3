//! Configuration system for TreeForge.
//!
//! Load resolver configuration from TOML or YAML files to control tree
//! shape, chunking and caching without code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use treeforge_config::ResolverConfig;
//!
//! let config = ResolverConfig::from_toml_str(r#"
//!     tree_depth = 12
//!     feature_count = 100
//!     function_depth = 6
//!     switch_depth = 3
//!     cache_dir = "/tmp/treeforge"
//! "#).unwrap();
//!
//! assert_eq!(config.tree_depth, 12);
//! assert!(config.validate().is_ok());
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use treeforge_config::ResolverConfig;
//!
//! let config = ResolverConfig::load("treeforge.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use treeforge_core::Geometry;


/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Resolver configuration.
///
/// Describes the tree to compile and how its levels are chunked:
/// `function_depth` levels per compiled function, `switch_depth` levels per
/// jump table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ResolverConfig {
    /// Levels of interior nodes.
    #[serde(default = "default_tree_depth")]
    pub tree_depth: u32,

    /// Length of the feature vectors the tree is evaluated on.
    #[serde(default = "default_feature_count")]
    pub feature_count: u32,

    /// Tree levels folded into one compiled function.
    #[serde(default = "default_function_depth")]
    pub function_depth: u32,

    /// Tree levels folded into one jump table.
    #[serde(default = "default_switch_depth")]
    pub switch_depth: u32,

    /// Directory holding cached evaluators. No caching when unset.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Random seed for generated trees and data sets.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

fn default_tree_depth() -> u32 {
    8
}

fn default_feature_count() -> u32 {
    16
}

fn default_function_depth() -> u32 {
    4
}

fn default_switch_depth() -> u32 {
    2
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            tree_depth: default_tree_depth(),
            feature_count: default_feature_count(),
            function_depth: default_function_depth(),
            switch_depth: default_switch_depth(),
            cache_dir: None,
            random_seed: None,
        }
    }
}

impl ResolverConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the tree depth.
    pub fn with_tree_depth(mut self, depth: u32) -> Self {
        self.tree_depth = depth;
        self
    }

    /// Sets the feature count.
    pub fn with_feature_count(mut self, count: u32) -> Self {
        self.feature_count = count;
        self
    }

    /// Sets function and switch depth together.
    pub fn with_chunking(mut self, function_depth: u32, switch_depth: u32) -> Self {
        self.function_depth = function_depth;
        self.switch_depth = switch_depth;
        self
    }

    /// Enables the object cache in `dir`.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Returns the chunking geometry.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the depths are not divisible as required.
    ///
    /// ```
    /// use treeforge_config::ResolverConfig;
    ///
    /// let config = ResolverConfig::new().with_tree_depth(6).with_chunking(3, 3);
    /// assert_eq!(config.geometry().unwrap().function_count(), 9);
    ///
    /// let bad = ResolverConfig::new().with_tree_depth(6).with_chunking(4, 2);
    /// assert!(bad.geometry().is_err());
    /// ```
    pub fn geometry(&self) -> Result<Geometry, ConfigError> {
        Geometry::new(self.tree_depth, self.function_depth, self.switch_depth)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Validates depths and feature count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feature_count == 0 {
            return Err(ConfigError::Invalid(
                "feature count must be positive".to_string(),
            ));
        }
        self.geometry().map(|_| ())
    }
}
