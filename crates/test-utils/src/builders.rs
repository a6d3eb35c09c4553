#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use uptodate::config::{ConfigFile, DefaultSection, FiltersConfig, JobConfig, RawConfigFile, SettingsSection};
use uptodate::digest::DigestStorage;
use uptodate::mapper::MapperConfig;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                settings: SettingsSection::default(),
                default: DefaultSection::default(),
                job: BTreeMap::new(),
            },
        }
    }

    pub fn with_job(mut self, name: &str, job: JobConfig) -> Self {
        self.config.job.insert(name.to_string(), job);
        self
    }

    pub fn with_global_include(mut self, pattern: &str) -> Self {
        self.config.default.include.push(pattern.to_string());
        self
    }

    pub fn with_global_exclude(mut self, pattern: &str) -> Self {
        self.config.default.exclude.push(pattern.to_string());
        self
    }

    pub fn granularity_ms(mut self, ms: u64) -> Self {
        self.config.settings.granularity_ms = Some(ms);
        self
    }

    pub fn fail_on_error(mut self, val: bool) -> Self {
        self.config.settings.fail_on_error = val;
        self
    }

    pub fn digest_storage(mut self, storage: DigestStorage) -> Self {
        self.config.settings.digest_storage = storage;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(src_dir: &str, dest_dir: &str) -> Self {
        Self {
            job: JobConfig {
                src_dir: PathBuf::from(src_dir),
                dest_dir: PathBuf::from(dest_dir),
                include: None,
                exclude: None,
                append_default_include: false,
                append_default_exclude: false,
                mapper: MapperConfig::Identity,
                overwrite: false,
                preserve_last_modified: false,
                force: false,
                input_encoding: None,
                output_encoding: None,
                filters: None,
                use_digest: false,
                granularity_ms: None,
            },
        }
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.job.include.get_or_insert_with(Vec::new).push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.job.exclude.get_or_insert_with(Vec::new).push(pattern.to_string());
        self
    }

    pub fn glob_mapper(mut self, from: &str, to: &str) -> Self {
        self.job.mapper = MapperConfig::Glob {
            from: from.to_string(),
            to: to.to_string(),
            case_sensitive: true,
            handle_dirsep: false,
        };
        self
    }

    pub fn mapper(mut self, mapper: MapperConfig) -> Self {
        self.job.mapper = mapper;
        self
    }

    pub fn overwrite(mut self, val: bool) -> Self {
        self.job.overwrite = val;
        self
    }

    pub fn preserve_last_modified(mut self, val: bool) -> Self {
        self.job.preserve_last_modified = val;
        self
    }

    pub fn force(mut self, val: bool) -> Self {
        self.job.force = val;
        self
    }

    pub fn encodings(mut self, input: Option<&str>, output: Option<&str>) -> Self {
        self.job.input_encoding = input.map(str::to_string);
        self.job.output_encoding = output.map(str::to_string);
        self
    }

    pub fn token(mut self, token: &str, value: &str) -> Self {
        let filters = self.job.filters.get_or_insert_with(|| FiltersConfig {
            tokens: BTreeMap::new(),
            begin_token: None,
            end_token: None,
            recurse: true,
        });
        filters.tokens.insert(token.to_string(), value.to_string());
        self
    }

    pub fn use_digest(mut self, val: bool) -> Self {
        self.job.use_digest = val;
        self
    }

    pub fn granularity_ms(mut self, ms: u64) -> Self {
        self.job.granularity_ms = Some(ms);
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
