//! Compiler configuration.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with `QCIRC_` prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::Path;

use qcirc_qasm3::EmitOptions;

/// Complete compiler configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Expansion and lowering limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Output layout
    #[serde(default)]
    pub output: OutputConfig,
}

/// Caps that keep expansion of a hostile program bounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum number of emitted IR operations
    #[serde(default = "default_max_operations")]
    pub max_operations: usize,

    /// Maximum nesting of inlined calls
    #[serde(default = "default_max_inline_depth")]
    pub max_inline_depth: usize,

    /// Maximum iterations of a single loop, unrolled or evaluated
    #[serde(default = "default_max_loop_iterations")]
    pub max_loop_iterations: usize,

    /// Maximum loop iterations across a whole compilation, nested loops and
    /// function calls included
    #[serde(default = "default_max_total_iterations")]
    pub max_total_iterations: usize,
}

/// Output layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Separate runs of measurements with a blank line
    #[serde(default = "default_true")]
    pub measure_spacing: bool,
}

fn default_max_operations() -> usize {
    1_000_000
}

fn default_max_inline_depth() -> usize {
    64
}

fn default_max_loop_iterations() -> usize {
    100_000
}

fn default_max_total_iterations() -> usize {
    10_000_000
}

fn default_true() -> bool {
    true
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_operations: default_max_operations(),
            max_inline_depth: default_max_inline_depth(),
            max_loop_iterations: default_max_loop_iterations(),
            max_total_iterations: default_max_total_iterations(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            measure_spacing: default_true(),
        }
    }
}

impl CompilerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: CompilerConfig = serde_yaml_ng::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file if provided, then apply environment
    /// overrides.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = if let Some(path) = config_file {
            Self::from_file(path)?
        } else {
            CompilerConfig::default()
        };

        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Merge `QCIRC_*` environment variables into this configuration.
    pub fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source. Absent variables leave the
    /// corresponding fields unchanged.
    pub fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let parse = |key: &str, value: String| {
            value.trim().parse::<usize>().map_err(|_| {
                ConfigError::ValidationError(format!("{key} must be a non-negative integer, got '{value}'"))
            })
        };

        if let Some(v) = var("QCIRC_MAX_OPERATIONS") {
            self.limits.max_operations = parse("QCIRC_MAX_OPERATIONS", v)?;
        }
        if let Some(v) = var("QCIRC_MAX_INLINE_DEPTH") {
            self.limits.max_inline_depth = parse("QCIRC_MAX_INLINE_DEPTH", v)?;
        }
        if let Some(v) = var("QCIRC_MAX_LOOP_ITERATIONS") {
            self.limits.max_loop_iterations = parse("QCIRC_MAX_LOOP_ITERATIONS", v)?;
        }
        if let Some(v) = var("QCIRC_MAX_TOTAL_ITERATIONS") {
            self.limits.max_total_iterations = parse("QCIRC_MAX_TOTAL_ITERATIONS", v)?;
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_operations == 0 {
            return Err(ConfigError::ValidationError(
                "max_operations must be greater than 0".to_string(),
            ));
        }
        if self.limits.max_inline_depth == 0 {
            return Err(ConfigError::ValidationError(
                "max_inline_depth must be greater than 0".to_string(),
            ));
        }
        if self.limits.max_loop_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_loop_iterations must be greater than 0".to_string(),
            ));
        }
        if self.limits.max_total_iterations < self.limits.max_loop_iterations {
            return Err(ConfigError::ValidationError(
                "max_total_iterations must be at least max_loop_iterations".to_string(),
            ));
        }

        Ok(())
    }

    /// Emitter options derived from the output settings.
    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            measure_spacing: self.output.measure_spacing,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert_eq!(config.limits.max_operations, 1_000_000);
        assert_eq!(config.limits.max_inline_depth, 64);
        assert_eq!(config.limits.max_loop_iterations, 100_000);
        assert_eq!(config.limits.max_total_iterations, 10_000_000);
        assert!(config.output.measure_spacing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "limits:\n  max_inline_depth: 8\noutput:\n  measure_spacing: false").unwrap();

        let config = CompilerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.limits.max_inline_depth, 8);
        assert_eq!(config.limits.max_operations, 1_000_000);
        assert!(!config.output.measure_spacing);
    }

    #[test]
    fn test_missing_file() {
        let err = CompilerConfig::from_file("/nonexistent/qcirc.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_malformed_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "limits: [1, 2").unwrap();
        let err = CompilerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_var_overrides() {
        let config = CompilerConfig::default()
            .merge_vars(|key| (key == "QCIRC_MAX_LOOP_ITERATIONS").then(|| "12".to_string()))
            .unwrap();
        assert_eq!(config.limits.max_loop_iterations, 12);
        assert_eq!(config.limits.max_inline_depth, 64);

        let err = CompilerConfig::default()
            .merge_vars(|key| (key == "QCIRC_MAX_OPERATIONS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_limit() {
        let mut config = CompilerConfig::default();
        config.limits.max_operations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_total_below_per_loop() {
        let mut config = CompilerConfig::default();
        config.limits.max_total_iterations = 10;
        assert!(config.validate().is_err());

        config.limits.max_loop_iterations = 10;
        assert!(config.validate().is_ok());
    }
}
