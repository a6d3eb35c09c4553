// src/lib.rs

pub mod artifact;
pub mod cli;
pub mod compare;
pub mod config;
pub mod copy;
pub mod digest;
pub mod errors;
pub mod fs;
pub mod job;
pub mod logging;
pub mod mapper;
pub mod select;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::fs::RealFileSystem;
use crate::job::{JobReport, JobRunner};

pub use crate::artifact::{Artifact, DirectoryTargets, TargetProvider};
pub use crate::compare::{compare_content, content_equals};
pub use crate::copy::{CopyOptions, CopyOutcome, copy_resource};
pub use crate::errors::UptodateError;
pub use crate::mapper::{GlobMapper, NameMapper};
pub use crate::select::{Decision, Selection, is_out_of_date, select_out_of_date, select_sources};

/// High-level entry point used by `main.rs`: load the config, run the
/// requested jobs and print one summary line per job.
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let root = config_root_dir(&config_path);
    debug!(root = ?root, "resolved project root");

    let runner = JobRunner::new(&cfg, root, Arc::new(RealFileSystem))
        .dry_run(args.dry_run)
        .granularity(args.granularity_ms.map(Duration::from_millis));
    let reports = runner.run_all(args.job.as_deref())?;

    for (name, report) in &reports {
        print_report(name, report, args.dry_run);
    }
    Ok(())
}

/// Directory job paths are relative to.
///
/// - If the config path has a non-empty parent (e.g. "ci/Uptodate.toml"),
///   that directory.
/// - For a bare filename, the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_report(name: &str, report: &JobReport, dry_run: bool) {
    if dry_run {
        println!("{name}: {} of {} sources out of date", report.selected, report.scanned);
        for source in &report.sources {
            println!("  {source}");
        }
        return;
    }
    println!(
        "{name}: scanned {}, selected {}, copied {}, failed {}",
        report.scanned, report.selected, report.copied, report.failed
    );
}
