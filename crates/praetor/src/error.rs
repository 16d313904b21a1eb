//! Application assembly errors.

use praetor_config::ConfigError;
use praetor_telemetry::TelemetryError;
use thiserror::Error;

/// Errors raised while building an [`App`](crate::App).
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration was invalid or a manifest could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// Neither a catalog nor a manifest path was supplied.
    #[error("no handler catalog: register a catalog or set dispatch.manifest_path")]
    MissingCatalog,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::from(ConfigError::validation_error("bad"));
        assert_eq!(err.to_string(), "configuration validation failed: bad");
        assert!(AppError::MissingCatalog.to_string().contains("manifest_path"));
    }
}
