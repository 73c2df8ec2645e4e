//! Solve configuration.
//!
//! Loaded from TOML so rule mode and solver limits can change without code
//! changes:
//!
//! ```
//! use lexsat_engine::{RuleMode, SolveConfig};
//!
//! let config = SolveConfig::from_toml_str(r#"
//!     rule_mode = "enforce"
//!     fact_weight = 2
//!     timeout_ms = 5000
//! "#).unwrap();
//!
//! assert_eq!(config.rule_mode, RuleMode::Enforce);
//! assert!(config.minimize_core);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How a rule's assertion constrains the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMode {
    /// `helper == expr`: the rule's truth value is computed, never forced.
    #[default]
    Evaluate,
    /// Bool rules must additionally hold.
    Enforce,
}

fn default_fact_weight() -> u32 {
    1
}

fn default_minimize_core() -> bool {
    true
}

/// Options for compiling and solving one problem.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct SolveConfig {
    /// Rule assertion mode.
    #[serde(default)]
    pub rule_mode: RuleMode,

    /// Base soft weight. The `penalty = false` presumption weighs the base,
    /// observed facts weigh twice the base.
    #[serde(default = "default_fact_weight")]
    pub fact_weight: u32,

    /// Reduce unsat cores to a minimal set by deletion.
    #[serde(default = "default_minimize_core")]
    pub minimize_core: bool,

    /// Worker threads for batch solving; rayon's default when unset.
    #[serde(default)]
    pub threads: Option<usize>,

    /// Z3 timeout per check, in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            rule_mode: RuleMode::default(),
            fact_weight: default_fact_weight(),
            minimize_core: default_minimize_core(),
            threads: None,
            timeout_ms: None,
        }
    }
}

impl SolveConfig {
    /// Creates a default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, contains invalid TOML, or
    /// holds out-of-range values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error for invalid TOML or out-of-range values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for a zero fact weight, zero threads or
    /// a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fact_weight == 0 {
            return Err(ConfigError::Invalid("fact_weight must be at least 1".into()));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be at least 1".into()));
        }
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("timeout_ms must be at least 1".into()));
        }
        Ok(())
    }

    /// Sets the rule mode.
    #[must_use]
    pub fn with_rule_mode(mut self, mode: RuleMode) -> Self {
        self.rule_mode = mode;
        self
    }

    /// Sets the soft fact weight.
    #[must_use]
    pub fn with_fact_weight(mut self, weight: u32) -> Self {
        self.fact_weight = weight;
        self
    }

    /// Enables or disables core minimization.
    #[must_use]
    pub fn with_minimize_core(mut self, minimize: bool) -> Self {
        self.minimize_core = minimize;
        self
    }

    /// Sets the batch worker count.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Sets the per-check timeout.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}
