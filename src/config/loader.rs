// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for
/// the semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = ?path, jobs = config.job.len(), "parsed config");

    Ok(config)
}

/// Load a configuration file and validate it:
///
/// - at least one job,
/// - include/exclude globs and regex mappers compile,
/// - encodings and filter delimiters are usable,
/// - a job does not copy a directory onto itself.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// `Uptodate.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Uptodate.toml")
}
