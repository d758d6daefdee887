//! Converter configuration.
//!
//! Loaded from YAML, optionally overridden from the environment once at
//! construction time. The engine receives the resolved values explicitly and
//! never reads the environment itself.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Environment variable enabling the ordered array policy.
pub const ASSERT_SIZE_ENV: &str = "ACCORD_ASSERT_SIZE";

/// Environment variable overriding the traversal depth limit.
pub const MAX_DEPTH_ENV: &str = "ACCORD_MAX_DEPTH";

/// Depth limit used when no configuration is supplied.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Settings for [`JsonPathsConverter`](crate::JsonPathsConverter).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverterConfig {
    /// Verify arrays element by element, with a size check for arrays of
    /// primitives. When false, elements are only checked for membership.
    #[serde(default)]
    pub ordered_arrays: bool,

    /// Deepest body nesting accepted by resolution, traversal and cleanup
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ordered_arrays: false,
            max_depth: default_max_depth(),
        }
    }
}

impl ConverterConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, anyhow::Error> {
        let config: ConverterConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_depth == 0 {
            anyhow::bail!("maxDepth must be greater than zero");
        }
        Ok(())
    }

    /// Apply `ACCORD_ASSERT_SIZE` and `ACCORD_MAX_DEPTH` when set.
    pub fn with_env_overrides(self) -> Result<Self, anyhow::Error> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup, e.g. a map in tests.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ASSERT_SIZE_ENV) {
            self.ordered_arrays = value.trim().parse().map_err(|_| {
                anyhow::anyhow!("{ASSERT_SIZE_ENV} must be 'true' or 'false', got '{value}'")
            })?;
        }
        if let Some(value) = lookup(MAX_DEPTH_ENV) {
            self.max_depth = value.trim().parse().map_err(|_| {
                anyhow::anyhow!("{MAX_DEPTH_ENV} must be a positive integer, got '{value}'")
            })?;
        }
        self.validate()?;
        Ok(self)
    }
}
