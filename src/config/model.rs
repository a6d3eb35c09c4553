// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::copy::{CopyOptions, FilterSet, FilterSetCollection};
use crate::digest::DigestStorage;
use crate::errors::Result;
use crate::mapper::MapperConfig;
use crate::select::staleness::default_granularity;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [settings]
/// granularity_ms = 2000
/// fail_on_error = true
///
/// [default]
/// include = ["**/*.txt"]
/// exclude = ["**/*.tmp"]
///
/// [job.docs]
/// src_dir = "docs"
/// dest_dir = "build/docs"
/// mapper = { type = "glob", from = "*.txt", to = "*.html" }
/// ```
///
/// All sections except `[job.<name>]` are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub settings: SettingsSection,

    #[serde(default)]
    pub default: DefaultSection,

    /// Keys are the job names.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,
}

/// Validated configuration. Built from [`RawConfigFile`] via `TryFrom`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub settings: SettingsSection,
    pub default: DefaultSection,
    pub job: BTreeMap<String, JobConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        settings: SettingsSection,
        default: DefaultSection,
        job: BTreeMap<String, JobConfig>,
    ) -> Self {
        Self {
            settings,
            default,
            job,
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[settings]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsSection {
    /// Timestamp tolerance; the platform default when unset.
    #[serde(default)]
    pub granularity_ms: Option<u64>,

    #[serde(default)]
    pub digest_storage: DigestStorage,

    /// Whether a failed copy aborts the job.
    #[serde(default = "default_true")]
    pub fail_on_error: bool,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            granularity_ms: None,
            digest_storage: DigestStorage::default(),
            fail_on_error: true,
        }
    }
}

/// `[default]` section: patterns shared by jobs that do not override them.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultSection {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `filters` table of a job.
///
/// ```toml
/// filters = { tokens = { VERSION = "1.2" }, begin_token = "${", end_token = "}" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FiltersConfig {
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,

    #[serde(default)]
    pub begin_token: Option<String>,

    #[serde(default)]
    pub end_token: Option<String>,

    #[serde(default = "default_true")]
    pub recurse: bool,
}

impl FiltersConfig {
    pub fn build(&self) -> Result<FilterSet> {
        let mut set = FilterSet::with_delimiters(
            self.begin_token.as_deref().unwrap_or(crate::copy::filter::DEFAULT_TOKEN_START),
            self.end_token.as_deref().unwrap_or(crate::copy::filter::DEFAULT_TOKEN_END),
        )?;
        set.set_recurse(self.recurse);
        for (token, value) in &self.tokens {
            set.add_filter(token, value);
        }
        Ok(set)
    }
}

/// `[job.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Directory scanned for sources, relative to the config file.
    pub src_dir: PathBuf,

    /// Directory target names are resolved against.
    pub dest_dir: PathBuf,

    /// If `None`, the job uses `default.include`.
    #[serde(default)]
    pub include: Option<Vec<String>>,

    /// If `None`, the job uses `default.exclude`.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// If true, `default.include` is appended to `include`.
    #[serde(default)]
    pub append_default_include: bool,

    /// If true, `default.exclude` is appended to `exclude`.
    #[serde(default)]
    pub append_default_exclude: bool,

    #[serde(default)]
    pub mapper: MapperConfig,

    #[serde(default)]
    pub overwrite: bool,

    #[serde(default)]
    pub preserve_last_modified: bool,

    #[serde(default)]
    pub force: bool,

    #[serde(default)]
    pub input_encoding: Option<String>,

    #[serde(default)]
    pub output_encoding: Option<String>,

    #[serde(default)]
    pub filters: Option<FiltersConfig>,

    /// Only consider sources whose content digest changed since the last run.
    #[serde(default)]
    pub use_digest: bool,

    /// Overrides `settings.granularity_ms`.
    #[serde(default)]
    pub granularity_ms: Option<u64>,
}

/// Pattern used when neither the job nor `[default]` lists any.
pub const MATCH_ALL: &str = "**/*";

fn merge(own: &Option<Vec<String>>, defaults: &[String], append: bool) -> Vec<String> {
    match own {
        Some(own) if append => own.iter().chain(defaults).cloned().collect(),
        Some(own) => own.clone(),
        None => defaults.to_vec(),
    }
}

impl JobConfig {
    pub fn effective_include(&self, default: &DefaultSection) -> Vec<String> {
        let include = merge(&self.include, &default.include, self.append_default_include);
        if include.is_empty() {
            vec![MATCH_ALL.to_string()]
        } else {
            include
        }
    }

    pub fn effective_exclude(&self, default: &DefaultSection) -> Vec<String> {
        merge(&self.exclude, &default.exclude, self.append_default_exclude)
    }

    pub fn granularity(&self, settings: &SettingsSection) -> Duration {
        self.granularity_ms
            .or(settings.granularity_ms)
            .map(Duration::from_millis)
            .unwrap_or_else(default_granularity)
    }

    pub fn copy_options(&self, settings: &SettingsSection) -> Result<CopyOptions> {
        let mut filters = FilterSetCollection::new();
        if let Some(cfg) = &self.filters {
            filters.add(cfg.build()?);
        }
        let options = CopyOptions {
            overwrite: self.overwrite,
            preserve_last_modified: self.preserve_last_modified,
            force: self.force,
            filters,
            granularity: Some(self.granularity(settings)),
            ..CopyOptions::default()
        };
        options.with_encodings(self.input_encoding.as_deref(), self.output_encoding.as_deref())
    }
}
