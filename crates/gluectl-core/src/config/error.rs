//! Errors raised while reading, writing or querying the profile file

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize profiles: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    /// Regions become part of the endpoint host name
    #[error("Invalid region '{0}': expected something like 'us-east-1'")]
    InvalidRegion(String),

    #[error("Could not determine the user configuration directory")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
