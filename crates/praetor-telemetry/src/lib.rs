//! Logging setup for Praetor.
//!
//! Praetor's crates emit `tracing` events: table builds and handler
//! registration at `debug`, action invocation at `trace`, skipped media
//! types at `warn` and unhandled dispatch failures at `error`. This crate
//! installs the subscriber that renders them.
//!
//! # Example
//!
//! ```rust,ignore
//! use praetor_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production().with_service_name("orders"))?;
//! ```

#![doc(html_root_url = "https://docs.rs/praetor-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
