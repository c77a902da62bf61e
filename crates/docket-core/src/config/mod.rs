//! Configuration management for Docket.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `docket.toml` file
//! 3. User config `~/.config/docket/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

mod defaults;

pub use defaults::*;

use crate::coverage::Thresholds;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where sources come from.
    pub source: SourceConfig,

    /// How tests are run.
    pub run: RunConfig,

    /// Coverage thresholds and inputs.
    pub coverage: CoverageConfig,

    /// Compiler used to execute examples.
    pub backend: BackendConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./docket.toml` (project local)
    /// 2. `~/.config/docket/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_file(DEFAULT_CONFIG_FILE);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("docket").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("DOCKET_SOURCE_DIR") {
            self.source.dir = dir;
        }
        if let Ok(dir) = std::env::var("DOCKET_BUILD_DIR") {
            self.source.build_dir = Some(dir);
        }
        if let Ok(ms) = std::env::var("DOCKET_TIMEOUT_MS") {
            if let Ok(n) = ms.parse() {
                self.run.timeout_ms = n;
            }
        }
        if let Ok(parallel) = std::env::var("DOCKET_PARALLEL") {
            if let Ok(flag) = parallel.parse() {
                self.run.parallel = flag;
            }
        }
        if let Ok(compiler) = std::env::var("DOCKET_COMPILER") {
            self.backend.compiler = compiler;
        }
    }

    /// Reject values the rest of the crate cannot work with.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.run.timeout_ms == 0 {
            return Err(ConfigError::Invalid("run.timeout_ms must be positive".into()));
        }
        for pattern in &self.source.exclude_patterns {
            if let Err(e) = regex::Regex::new(pattern) {
                return Err(ConfigError::Invalid(format!(
                    "source.exclude_patterns: {}: {}",
                    pattern, e
                )));
            }
        }
        for (name, value) in self.coverage.thresholds.configured() {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "coverage.{} must be between 0 and 100, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Source discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory walked when no files are given.
    pub dir: String,

    /// Build directory, searched for a project description when
    /// `backend.project_file` is unset. Defaults to `<dir>/build`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<String>,

    /// File extensions to scan (without leading dot).
    pub extensions: Vec<String>,

    /// Regex patterns of paths to skip.
    pub exclude_patterns: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dir: DEFAULT_SOURCE_DIR.to_string(),
            build_dir: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SourceConfig {
    /// The build directory, falling back to `<dir>/build`.
    pub fn build_dir_or_default(&self) -> PathBuf {
        self.build_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&self.dir).join(DEFAULT_BUILD_DIR))
    }
}

/// Test run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Per-test timeout in milliseconds.
    pub timeout_ms: u64,

    /// Dispatch every test at once instead of one after another.
    pub parallel: bool,

    /// Log every test outcome.
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            parallel: false,
            verbose: false,
        }
    }
}

impl RunConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Coverage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Minimum percentages; unset metrics use [`DEFAULT_THRESHOLD`].
    #[serde(flatten)]
    pub thresholds: Thresholds,

    /// LCOV report merged into the coverage after every run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lcov: Option<String>,
}

/// Command backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Compiler executable.
    pub compiler: String,

    /// Flags passed on every compile.
    pub flags: Vec<String>,

    /// Headers included in every generated program.
    pub includes: Vec<String>,

    /// Build project description (JSON or YAML) giving per-target flags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_file: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            compiler: DEFAULT_COMPILER.to_string(),
            flags: DEFAULT_COMPILER_FLAGS.iter().map(|s| s.to_string()).collect(),
            includes: Vec::new(),
            project_file: None,
        }
    }
}
