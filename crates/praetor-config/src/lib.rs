//! Typed configuration and handler manifests for Praetor.
//!
//! - [`PraetorConfig`] - root configuration with `dispatch` and `logging` sections
//! - [`ConfigLoader`] - layered loading (defaults → file → environment)
//! - [`Manifest`] / [`Bindings`] / [`ManifestLoader`] - handler classes
//!   declared in TOML and re-read on every resolution when hot reload is on
//!
//! Unknown fields are rejected everywhere.
//!
//! # Example
//!
//! ```no_run
//! use praetor_config::ConfigLoader;
//!
//! # fn main() -> Result<(), praetor_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("praetor.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("PRAETOR")
//!     .load()?;
//!
//! if config.dispatch.reloading_enabled() {
//!     println!("hot reload from {:?}", config.dispatch.manifest_path);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [dispatch]
//! develop = true
//! hot_reload = true
//! manifest_path = "handlers.toml"
//!
//! [logging]
//! level = "praetor_core=debug,info"
//! format = "pretty"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `PRAETOR__DISPATCH__HOT_RELOAD=true`
//! - `PRAETOR__DISPATCH__MANIFEST_PATH=/etc/praetor/handlers.toml`
//! - `PRAETOR__LOGGING__FORMAT=json`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod manifest;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use manifest::{ActionEntry, Bindings, HandlerEntry, Manifest, ManifestLoader};
pub use schema::*;
