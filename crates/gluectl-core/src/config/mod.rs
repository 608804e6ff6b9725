//! Configuration and profile management for gluectl
//!
//! Profiles name a region and, optionally, an explicit endpoint, a request
//! timeout and extra headers. The file is TOML and may reference
//! environment variables with `${VAR}` or `${VAR:-default}`.

pub mod error;
pub mod settings;

pub use error::{ConfigError, Result};
pub use settings::{Config, Profile, endpoint_for_region};
