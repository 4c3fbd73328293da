//! Engine configuration.
//!
//! Captures grid width, row ceiling, gravity mode and the selected resolution
//! policy as a single [`EngineConfig`]. With the `config-files` feature the
//! config can be loaded from TOML or JSON:
//!
//! ```toml
//! column = 4
//! max_row = 4
//! float = false
//!
//! [policy]
//! kind = "cascade"
//! resize_priority_over_ceiling = true
//! ```
//!
//! ```rust,ignore
//! let config = EngineConfig::from_toml_file("grid.toml")?;
//! ```

use std::fmt;
#[cfg(feature = "config-files")]
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cleanup::SupersedeRule;
use crate::resolve::ResolvePolicy;

/// Default column count.
pub const DEFAULT_COLUMN: u16 = 12;

/// Grid and policy settings for one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of columns (>= 1).
    pub column: u16,
    /// Optional ceiling on the total row extent.
    pub max_row: Option<u16>,
    /// Disable upward gravity.
    pub float: bool,
    /// Move validation and conflict resolution strategy.
    pub policy: ResolvePolicy,
    /// Which overlaps a finished resize removes.
    pub supersede_rule: SupersedeRule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            column: DEFAULT_COLUMN,
            max_row: None,
            float: false,
            policy: ResolvePolicy::default(),
            supersede_rule: SupersedeRule::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new(column: u16) -> Self {
        Self {
            column,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn max_row(mut self, max_row: u16) -> Self {
        self.max_row = Some(max_row);
        self
    }

    #[must_use]
    pub fn float(mut self, float: bool) -> Self {
        self.float = float;
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: ResolvePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn supersede_rule(mut self, rule: SupersedeRule) -> Self {
        self.supersede_rule = rule;
        self
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.column == 0 {
            errors.push("column must be >= 1".into());
        }
        if self.max_row == Some(0) {
            errors.push("max_row must be >= 1 when set".into());
        }
        errors
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config-files")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.checked()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    #[cfg(feature = "config-files")]
    fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

/// Errors from loading an [`EngineConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading config file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-files")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config-files")]
    Json(serde_json::Error),
    /// Parsed but failed validation.
    Invalid(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config-files")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Invalid(errors) => write!(f, "invalid config: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config-files")]
            Self::Json(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}
