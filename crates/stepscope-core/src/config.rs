//! Engine configuration with environment variable overrides.
//!
//! All settings can be overridden via environment variables prefixed with
//! `STEPSCOPE_`. File globs are interpreted by the host's file provider; the
//! engine only carries them.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::IndexError;
use crate::model::MatchMode;

/// Log level enumeration matching tracing crate levels.
///
/// Defaults to `Info` when not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Most verbose logging, includes all trace spans.
    Trace,
    /// Debug-level information for development.
    Debug,
    /// Standard informational messages.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for failures.
    Error,
}

impl FromStr for LogLevel {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(IndexError::InvalidConfig(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Default debounce quiet period in milliseconds.
const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default ceiling on the size of files admitted to parsing.
const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;

/// Configuration for the indexing engine.
///
/// # Environment Variables
///
/// - `STEPSCOPE_LOG_LEVEL`: log verbosity (trace, debug, info, warn, error)
/// - `STEPSCOPE_DEBOUNCE_MS`: quiet period before processing file changes
/// - `STEPSCOPE_MATCH_MODE`: pattern kinds admitted to matching (both,
///   regex, expression)
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Globs selecting feature files.
    pub feature_globs: Vec<String>,
    /// Globs selecting step-definition source files.
    pub definition_globs: Vec<String>,
    /// Globs excluded from discovery.
    pub exclude_globs: Vec<String>,
    /// Whether consumers should surface diagnostics for match failures.
    pub diagnostics_enabled: bool,
    /// Which pattern kinds participate in matching.
    pub match_mode: MatchMode,
    /// Quiet period applied to change notifications.
    pub debounce: Duration,
    /// Files larger than this many bytes are skipped during indexing.
    pub max_file_bytes: u64,
    /// Log verbosity.
    pub log_level: LogLevel,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            feature_globs: vec!["features/**/*.feature".into(), "**/*.feature".into()],
            definition_globs: vec!["**/*steps*.rs".into(), "**/steps/**/*.rs".into()],
            exclude_globs: vec!["**/target/**".into(), "**/.git/**".into()],
            diagnostics_enabled: true,
            match_mode: MatchMode::default(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            log_level: LogLevel::default(),
        }
    }
}

impl IndexConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for missing values.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidConfig`] if an environment variable
    /// contains an invalid value.
    pub fn from_env() -> Result<Self, IndexError> {
        let mut config = Self::default();

        if let Ok(val) = env::var("STEPSCOPE_LOG_LEVEL") {
            config.log_level = val.parse()?;
        }

        if let Ok(val) = env::var("STEPSCOPE_DEBOUNCE_MS") {
            let ms: u64 = val.parse().map_err(|_| {
                IndexError::InvalidConfig(format!(
                    "invalid debounce value '{val}', expected a positive integer"
                ))
            })?;
            config.debounce = Duration::from_millis(ms);
        }

        if let Ok(val) = env::var("STEPSCOPE_MATCH_MODE") {
            config.match_mode = val.parse()?;
        }

        Ok(config)
    }

    /// Create a new configuration with the specified match mode.
    #[must_use]
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Create a new configuration with the specified debounce quiet period.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Create a new configuration with the specified file-size ceiling.
    #[must_use]
    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }
}
