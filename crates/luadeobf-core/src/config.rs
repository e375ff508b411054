//! Pipeline configuration
//!
//! Loaded from YAML (every field optional) and overridden by CLI flags.
//!
//! ```yaml
//! fold_arithmetic: true
//! max_fold_iterations: 1000
//! indent_width: 4
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Upper bound on `indent_width`; anything wider is almost certainly a typo
pub const MAX_INDENT_WIDTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeobfConfig {
    /// Run the arithmetic folder between renaming and beautifying
    pub fold_arithmetic: bool,

    /// Iteration bound for the folder's fixed-point loop
    pub max_fold_iterations: usize,

    /// Spaces per indent level in the beautified output
    pub indent_width: usize,
}

impl Default for DeobfConfig {
    fn default() -> Self {
        Self {
            fold_arithmetic: true,
            max_fold_iterations: 1000,
            indent_width: 4,
        }
    }
}

impl DeobfConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: DeobfConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indent_width > MAX_INDENT_WIDTH {
            return Err(ConfigError::IndentTooWide {
                got: self.indent_width,
                max: MAX_INDENT_WIDTH,
            });
        }
        if self.max_fold_iterations == 0 {
            return Err(ConfigError::ZeroFoldIterations);
        }
        Ok(())
    }
}
