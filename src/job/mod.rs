// src/job/mod.rs

//! Jobs: scan a source directory, select what is out of date, copy it.

pub mod runner;
pub mod scan;

pub use runner::{JobReport, JobRunner};
pub use scan::{PatternSet, collect_sources};
