// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, DefaultSection, JobConfig, RawConfigFile};
use crate::copy::text::{resolve_encoding, resolve_output_encoding};
use crate::errors::{Result, UptodateError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = UptodateError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.settings, raw.default, raw.job))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_patterns("[default].include", &cfg.default.include)?;
    validate_patterns("[default].exclude", &cfg.default.exclude)?;
    for (name, job) in cfg.job.iter() {
        validate_job(name, job, &cfg.default)?;
    }
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(UptodateError::ConfigError(
            "config must contain at least one [job.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_patterns(what: &str, patterns: &[String]) -> Result<()> {
    for pattern in patterns {
        Glob::new(pattern).map_err(|e| {
            UptodateError::ConfigError(format!("{what}: invalid glob '{pattern}': {e}"))
        })?;
    }
    Ok(())
}

fn validate_job(name: &str, job: &JobConfig, default: &DefaultSection) -> Result<()> {
    let context = |msg: String| UptodateError::ConfigError(format!("job '{name}': {msg}"));

    validate_patterns(&format!("job '{name}' include"), &job.effective_include(default))?;
    validate_patterns(&format!("job '{name}' exclude"), &job.effective_exclude(default))?;

    job.mapper.build().map_err(|e| context(e.to_string()))?;

    resolve_encoding(job.input_encoding.as_deref()).map_err(|e| context(e.to_string()))?;
    resolve_output_encoding(job.output_encoding.as_deref()).map_err(|e| context(e.to_string()))?;

    if let Some(filters) = &job.filters {
        filters.build().map_err(|e| context(e.to_string()))?;
    }

    if job.src_dir == job.dest_dir && job.mapper.is_identity() {
        return Err(context(format!(
            "src_dir and dest_dir are both {:?}; an identity mapping would copy every file onto itself",
            job.src_dir
        )));
    }

    Ok(())
}
