// Configuration loading and parsing (config/podium.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name of the configuration, inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "podium.toml";

/// Upper bound for `retry.initial_delay_secs`: one hour.
const MAX_INITIAL_DELAY_SECS: f64 = 3600.0;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub retry: RetryConfig,
    pub window: WindowConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Where the leaderboard pages come from.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Endpoint without the `page` query parameter.
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Shared by the page fetcher and the avatar queue.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub max_failed_connection_attempts: u32,
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: f64,
}

impl RetryConfig {
    /// Falls back to the default delay when the value is not a valid
    /// duration; `validate` rejects such configs before they get here.
    pub fn initial_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.initial_delay_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_initial_delay_secs()))
    }
}

/// Virtual list geometry, in host units (terminal rows for the TUI).
#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    pub slot_height: f32,
    pub slot_padding: f32,
    pub viewport_slot_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Ranks at or above this threshold get podium styling.
    #[serde(default = "default_top_rank_threshold")]
    pub top_rank_threshold: u32,
    /// Host tick period.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            top_rank_threshold: default_top_rank_threshold(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

impl DisplayConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_initial_delay_secs() -> f64 {
    1.0
}

fn default_top_rank_threshold() -> u32 {
    3
}

fn default_frame_interval_ms() -> u64 {
    33
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/podium.toml` relative to
/// `base_dir`.
///
/// This does not copy defaults; prefer `load_config()` which does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config = parse_config(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Parse a configuration document without validating it.
pub fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

/// Copy `defaults/podium.toml` to `config/podium.toml` unless the user
/// already has one. Returns the path written, if any.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let config_dir = base_dir.join("config");
    let target = config_dir.join(CONFIG_FILE);

    if target.exists() {
        return Ok(None);
    }
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no config/{CONFIG_FILE} and no defaults/{CONFIG_FILE} in {}; \
                 run from the workspace root",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    })?;

    Ok(Some(target))
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Copies the default config first if none exists.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.source.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "source.base_url".into(),
            message: "must not be empty".into(),
        });
    }

    if config.retry.max_failed_connection_attempts == 0 {
        return Err(ConfigError::ValidationError {
            field: "retry.max_failed_connection_attempts".into(),
            message: "must be at least 1".into(),
        });
    }

    let delay = config.retry.initial_delay_secs;
    if !delay.is_finite() || delay <= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "retry.initial_delay_secs".into(),
            message: format!("must be > 0, got {delay}"),
        });
    }
    if delay > MAX_INITIAL_DELAY_SECS || Duration::try_from_secs_f64(delay).is_err() {
        return Err(ConfigError::ValidationError {
            field: "retry.initial_delay_secs".into(),
            message: format!("must be at most {MAX_INITIAL_DELAY_SECS}, got {delay}"),
        });
    }

    let window = &config.window;
    if !window.slot_height.is_finite() || window.slot_height <= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "window.slot_height".into(),
            message: format!("must be > 0, got {}", window.slot_height),
        });
    }
    if !window.slot_padding.is_finite() || window.slot_padding < 0.0 {
        return Err(ConfigError::ValidationError {
            field: "window.slot_padding".into(),
            message: format!("must be >= 0, got {}", window.slot_padding),
        });
    }
    if window.viewport_slot_count == 0 {
        return Err(ConfigError::ValidationError {
            field: "window.viewport_slot_count".into(),
            message: "must be at least 1".into(),
        });
    }

    if config.display.frame_interval_ms == 0 {
        return Err(ConfigError::ValidationError {
            field: "display.frame_interval_ms".into(),
            message: "must be > 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
