// src/job/runner.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::artifact::{Artifact, DirectoryTargets, TargetProvider};
use crate::config::model::ConfigFile;
use crate::copy::{CopyOptions, CopyOutcome, copy_resource};
use crate::digest::{ChangedSelector, open_cache};
use crate::errors::{Result, UptodateError};
use crate::fs::FileSystem;
use crate::job::scan::{PatternSet, collect_sources};
use crate::mapper::{NameMapper, to_forward_slashes, to_native_separators};
use crate::select::select_out_of_date_report;

/// Outcome of one job run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    /// Sources matching the job's patterns.
    pub scanned: usize,
    /// Sources with at least one out-of-date target.
    pub selected: usize,
    /// Target files written.
    pub copied: usize,
    /// Copies that failed while `fail_on_error` was off.
    pub failed: usize,
    /// Names of the selected sources, in scan order.
    pub sources: Vec<String>,
}

/// Runs the jobs of a validated config against a filesystem.
///
/// Job directories are resolved relative to `root`, normally the directory
/// holding the config file.
#[derive(Debug)]
pub struct JobRunner<'a> {
    config: &'a ConfigFile,
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    dry_run: bool,
    granularity: Option<Duration>,
}

impl<'a> JobRunner<'a> {
    pub fn new(config: &'a ConfigFile, root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            config,
            root: root.into(),
            fs,
            dry_run: false,
            granularity: None,
        }
    }

    /// Select without copying.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Override every job's granularity.
    pub fn granularity(mut self, granularity: Option<Duration>) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run every job in name order, or only `only` when given.
    pub fn run_all(&self, only: Option<&str>) -> Result<Vec<(String, JobReport)>> {
        let names: Vec<&str> = match only {
            Some(name) => vec![name],
            None => self.config.job.keys().map(String::as_str).collect(),
        };

        let mut reports = Vec::with_capacity(names.len());
        for name in names {
            let report = self.run(name)?;
            reports.push((name.to_string(), report));
        }
        Ok(reports)
    }

    pub fn run(&self, name: &str) -> Result<JobReport> {
        let job = self
            .config
            .job
            .get(name)
            .ok_or_else(|| UptodateError::ConfigError(format!("unknown job '{name}'")))?;
        info!(job = %name, dry_run = self.dry_run, "running job");

        let src_dir = self.root.join(&job.src_dir);
        let dest_dir = self.root.join(&job.dest_dir);

        let patterns = PatternSet::new(
            &job.effective_include(&self.config.default),
            &job.effective_exclude(&self.config.default),
        )?;
        let names = collect_sources(self.fs.as_ref(), &src_dir, &patterns)?;

        let mut sources = Vec::with_capacity(names.len());
        for source_name in &names {
            sources.push(Artifact::resolve(Arc::clone(&self.fs), &src_dir, source_name)?);
        }
        let mut report = JobReport {
            scanned: sources.len(),
            ..JobReport::default()
        };

        let mut digests = if job.use_digest {
            let cache = open_cache(self.config.settings.digest_storage, &self.root)?;
            let mut selector = ChangedSelector::new(cache, false);
            sources = selector.filter(sources)?;
            debug!(job = %name, changed = sources.len(), "digest filter applied");
            Some(selector)
        } else {
            None
        };

        let mapper = job
            .mapper
            .build()
            .map_err(|e| UptodateError::Mapping(e.to_string()))?;
        let targets = DirectoryTargets::new(Arc::clone(&self.fs), &dest_dir);

        let mut options = job.copy_options(&self.config.settings)?;
        if self.granularity.is_some() {
            options.granularity = self.granularity;
        }
        let granularity = options.granularity.unwrap_or_else(crate::select::default_granularity);

        let selection = select_out_of_date_report(&sources, &mapper, &targets, granularity)?;
        report.selected = selection.selected.len();
        report.sources = selection
            .selected_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        if self.dry_run {
            info!(job = %name, selected = report.selected, "dry run, nothing copied");
            return Ok(report);
        }

        for source in &selection.selected {
            let ok = self.copy_source(name, source, &*mapper, &targets, &options, &mut report)?;
            if ok {
                if let Some(selector) = digests.as_mut() {
                    selector.record(source)?;
                }
            }
        }

        if let Some(selector) = digests.as_mut() {
            selector.flush()?;
        }

        info!(
            job = %name,
            scanned = report.scanned,
            selected = report.selected,
            copied = report.copied,
            failed = report.failed,
            "job finished"
        );
        Ok(report)
    }

    /// Copy `source` to each of its targets. Returns whether every copy
    /// succeeded.
    fn copy_source(
        &self,
        job_name: &str,
        source: &Artifact,
        mapper: &dyn NameMapper,
        targets: &DirectoryTargets,
        options: &CopyOptions,
        report: &mut JobReport,
    ) -> Result<bool> {
        let target_names = mapper
            .map_file_name(&to_native_separators(source.name()))
            .map_err(|e| UptodateError::Mapping(e.to_string()))?
            .unwrap_or_default();

        let mut all_ok = true;
        for target_name in target_names {
            let target = targets.resolve(&to_forward_slashes(&target_name))?;
            match copy_resource(source, &target, options) {
                Ok(CopyOutcome::Copied(strategy)) => {
                    debug!(job = %job_name, source = %source.name(), target = %target.name(), ?strategy, "copied");
                    report.copied += 1;
                }
                Ok(outcome) => {
                    debug!(job = %job_name, source = %source.name(), target = %target.name(), ?outcome, "not copied");
                }
                Err(err) if !self.config.settings.fail_on_error => {
                    warn!(
                        job = %job_name,
                        "Failed to copy {} to {}: {err}",
                        source.name(),
                        target.name()
                    );
                    report.failed += 1;
                    all_ok = false;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(all_ok)
    }
}
