// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `uptodate`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "uptodate",
    version,
    about = "Copy sources whose targets are missing or out of date.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Job directories are resolved relative to the file's directory.
    #[arg(long, value_name = "PATH", default_value = "Uptodate.toml")]
    pub config: String,

    /// Run only this job.
    #[arg(long, value_name = "NAME")]
    pub job: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `UPTODATE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// List out-of-date sources per job, copy nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Timestamp tolerance in milliseconds for every job.
    #[arg(long, value_name = "MS")]
    pub granularity_ms: Option<u64>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    /// Every selection decision.
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
