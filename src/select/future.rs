// src/select/future.rs

use std::time::{Duration, SystemTime};

use tracing::warn;

use crate::artifact::Artifact;

/// Report sources whose modification time lies beyond `now + granularity`.
///
/// Purely diagnostic: each hit is logged as a warning and returned, nothing
/// else is affected.
pub fn detect_future_modifications(
    sources: &[Artifact],
    granularity: Duration,
    now: SystemTime,
) -> Vec<&Artifact> {
    let threshold = now + granularity;
    sources
        .iter()
        .filter(|source| source.modified().is_some_and(|m| m > threshold))
        .inspect(|source| warn!("Warning: {} modified in the future.", source.name()))
        .collect()
}
