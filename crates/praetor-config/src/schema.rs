//! Configuration schema types.
//!
//! This module defines the structure of each configuration section.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Dispatch configuration section.
///
/// Selects how handler types are resolved. Handler types are memoized unless
/// both `develop` and `hot_reload` are set, in which case every resolution
/// re-reads the handler manifest.
///
/// # Example
///
/// ```
/// use praetor_config::DispatchConfig;
///
/// let config = DispatchConfig {
///     develop: true,
///     hot_reload: true,
///     manifest_path: Some("handlers.toml".into()),
/// };
/// assert!(config.reloading_enabled());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Development mode.
    #[serde(default)]
    pub develop: bool,

    /// Re-resolve handler types on every request. Only honoured in
    /// development mode.
    #[serde(default)]
    pub hot_reload: bool,

    /// TOML handler manifest read by the reloading registry.
    #[serde(default)]
    pub manifest_path: Option<PathBuf>,
}

impl DispatchConfig {
    /// Returns `true` when handler types must be rebuilt on every resolution.
    pub fn reloading_enabled(&self) -> bool {
        self.develop && self.hot_reload
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,

    /// Service name recorded when logging starts.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
            service_name: default_service_name(),
        }
    }
}

impl LoggingConfig {
    /// Converts this section into a subscriber configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use praetor_config::{LogFormat, LoggingConfig};
    ///
    /// let section = LoggingConfig {
    ///     format: LogFormat::Pretty,
    ///     ..Default::default()
    /// };
    /// assert!(!section.to_log_config().json_format);
    /// ```
    #[must_use]
    pub fn to_log_config(&self) -> praetor_telemetry::LogConfig {
        let base = match self.format {
            LogFormat::Json => praetor_telemetry::LogConfig::production(),
            LogFormat::Pretty => praetor_telemetry::LogConfig::development(),
        };
        praetor_telemetry::LogConfig {
            enabled: self.enabled,
            ansi: self.ansi_enabled,
            file_line_info: self.include_location,
            ..base
        }
        .with_level(&self.level)
        .with_service_name(&self.service_name)
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "praetor".to_string()
}
