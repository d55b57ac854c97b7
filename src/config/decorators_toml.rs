//! Parsing and validation for decorators.toml configuration files

use crate::engine::{InvalidPolicy, RawTextPolicy, TransformOptions};
use crate::error::ConfigError;
use crate::registry::{DEFAULT_INCLUDE, RegistrySource, SourcePatterns};
use crate::validator::ValidationMode;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE: &str = "decorators.toml";

/// Standard version assumed when none is configured
pub const DEFAULT_STANDARD_VERSION: Version = Version::new(1, 0, 0);

/// Main configuration struct for decorators.toml
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Registry metadata and sources
    pub decorators: DecoratorsMeta,

    /// Transformation policies
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load configuration, falling back to defaults when the file is missing
    ///
    /// A file that exists but fails to parse or validate is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse configuration from a TOML string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.decorators.version != "1" {
            return Err(ConfigError::Validation(format!(
                "Unsupported configuration version '{}'. Expected '1'",
                self.decorators.version
            )));
        }

        for pattern in &self.decorators.include {
            globset::Glob::new(pattern).map_err(|e| {
                ConfigError::Validation(format!("Invalid include glob pattern '{}': {}", pattern, e))
            })?;
        }

        for pattern in &self.decorators.exclude {
            globset::Glob::new(pattern).map_err(|e| {
                ConfigError::Validation(format!("Invalid exclude glob pattern '{}': {}", pattern, e))
            })?;
        }

        if let Some(target) = &self.policy.target
            && target.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "policy.target must not be empty; remove it to disable target checks".to_string(),
            ));
        }

        Ok(())
    }

    /// Registry sources with relative directories resolved against `base`
    pub fn registry_source(&self, base: &Path) -> Result<RegistrySource, ConfigError> {
        let patterns = SourcePatterns::new(&self.decorators.include, &self.decorators.exclude)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        let mut source =
            RegistrySource::new(self.decorators.standard_version.clone()).patterns(patterns);
        for dir in &self.decorators.sources {
            source = source.dir(if dir.is_absolute() {
                dir.clone()
            } else {
                base.join(dir)
            });
        }
        Ok(source)
    }

    pub fn transform_options(&self) -> TransformOptions {
        self.policy.to_options()
    }
}

/// `[decorators]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecoratorsMeta {
    /// Configuration version (must be "1")
    pub version: String,

    /// Active standard version used for "latest" selection
    #[serde(default = "default_standard_version")]
    pub standard_version: Version,

    /// Registry directories, walked recursively
    #[serde(default = "default_sources")]
    pub sources: Vec<PathBuf>,

    /// Record file patterns to include
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Record file patterns to exclude
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for DecoratorsMeta {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            standard_version: default_standard_version(),
            sources: default_sources(),
            include: default_include(),
            exclude: Vec::new(),
        }
    }
}

fn default_standard_version() -> Version {
    DEFAULT_STANDARD_VERSION
}

fn default_sources() -> Vec<PathBuf> {
    vec![PathBuf::from("decorators")]
}

fn default_include() -> Vec<String> {
    DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect()
}

/// `[policy]` section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Raw text of invocations naming an unknown decorator
    #[serde(default)]
    pub unknown: RawTextPolicy,

    /// Raw text of malformed invocations
    #[serde(default)]
    pub malformed: RawTextPolicy,

    /// Handling of undeclared parameters
    #[serde(default)]
    pub parameters: ValidationMode,

    /// Behavior when parameter validation fails
    #[serde(default)]
    pub invalid: InvalidPolicy,

    /// Target checked against each decorator's applicable targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl PolicyConfig {
    pub fn to_options(&self) -> TransformOptions {
        TransformOptions {
            unknown: self.unknown,
            malformed: self.malformed,
            parameters: self.parameters,
            invalid: self.invalid,
            target: self.target.clone(),
        }
    }
}

/// Output configuration section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Color output setting
    #[serde(default)]
    pub color: ColorOption,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON Lines format
    Jsonl,
}

/// Color output options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorOption {
    /// Auto-detect based on terminal capabilities
    #[default]
    Auto,
    /// Always use color
    Always,
    /// Never use color
    Never,
}
