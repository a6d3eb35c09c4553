// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UptodateError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A target provider could not turn a mapped name into an artifact.
    #[error("cannot resolve target '{name}': {source}")]
    Resolution {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("can't write to read-only destination file {0:?}")]
    ReadOnlyTarget(PathBuf),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UptodateError {
    pub fn resolution(name: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        UptodateError::Resolution {
            name: name.into(),
            source: source.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, UptodateError>;
