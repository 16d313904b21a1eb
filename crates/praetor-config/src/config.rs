//! Main configuration types.
//!
//! This module provides the top-level [`PraetorConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, DispatchConfig, LogFormat, LoggingConfig};

/// Complete Praetor configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use praetor_config::PraetorConfig;
///
/// let config = PraetorConfig::default();
/// assert!(!config.dispatch.reloading_enabled());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PraetorConfig {
    /// Handler resolution settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PraetorConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use praetor_config::{DispatchConfig, PraetorConfig};
    ///
    /// let config = PraetorConfig::builder()
    ///     .dispatch(DispatchConfig {
    ///         develop: true,
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert!(config.dispatch.develop);
    /// ```
    #[must_use]
    pub fn builder() -> PraetorConfigBuilder {
        PraetorConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `dispatch.hot_reload` is set outside development mode
    /// - reloading is enabled without `dispatch.manifest_path`
    /// - `logging.level` is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.hot_reload && !self.dispatch.develop {
            return Err(ConfigError::invalid_value(
                "dispatch.hot_reload",
                "only available when dispatch.develop is set",
            ));
        }

        if self.dispatch.reloading_enabled() && self.dispatch.manifest_path.is_none() {
            return Err(ConfigError::validation_error(
                "dispatch.manifest_path must be set when hot reload is enabled",
            ));
        }

        if self.logging.enabled {
            self.logging
                .to_log_config()
                .validate()
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Development mode with pretty, coloured debug logs. Hot reload stays
    /// off until a manifest path is supplied.
    ///
    /// # Example
    ///
    /// ```
    /// use praetor_config::PraetorConfig;
    ///
    /// let config = PraetorConfig::development();
    /// assert!(config.dispatch.develop);
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.dispatch.develop = true;

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// Memoized handler types and JSON logs at info level.
    ///
    /// # Example
    ///
    /// ```
    /// use praetor_config::{LogFormat, PraetorConfig};
    ///
    /// let config = PraetorConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.dispatch.develop = false;
        config.dispatch.hot_reload = false;

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;

        config
    }
}

/// Builder for [`PraetorConfig`].
#[derive(Debug, Default)]
pub struct PraetorConfigBuilder {
    dispatch: Option<DispatchConfig>,
    logging: Option<LoggingConfig>,
}

impl PraetorConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dispatch configuration.
    #[must_use]
    pub fn dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> PraetorConfig {
        PraetorConfig {
            dispatch: self.dispatch.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<PraetorConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
