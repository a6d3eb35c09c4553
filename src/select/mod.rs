// src/select/mod.rs

//! Out-of-date source selection.
//!
//! Given sources, a [`NameMapper`] and a [`TargetProvider`], decide which
//! sources have at least one target that needs regenerating. Selection is a
//! filter: the result keeps the input order and lists every source at most
//! once.
//!
//! Mapping failures are soft (the source is skipped); target resolution
//! failures abort the whole pass.

pub mod decision;
pub mod future;
pub mod staleness;

use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::artifact::{Artifact, TargetProvider};
use crate::errors::Result;
use crate::mapper::{NameMapper, to_forward_slashes, to_native_separators};

pub use decision::Decision;
pub use future::detect_future_modifications;
pub use staleness::{FAT_GRANULARITY, UNIX_GRANULARITY, default_granularity, is_out_of_date};

/// Selected sources plus one decision per examined source.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub selected: Vec<Artifact>,
    pub decisions: Vec<Decision>,
}

impl Selection {
    fn record(&mut self, decision: Decision) {
        debug!("{decision}");
        self.decisions.push(decision);
    }

    pub fn selected_names(&self) -> Vec<&str> {
        self.selected.iter().map(|a| a.name()).collect()
    }
}

/// Select sources for which `selector(source, target)` accepts at least one
/// mapped target.
pub fn select_sources_report<M, P, S>(
    sources: &[Artifact],
    mapper: &M,
    targets: &P,
    selector: S,
) -> Result<Selection>
where
    M: NameMapper + ?Sized,
    P: TargetProvider + ?Sized,
    S: Fn(&Artifact, &Artifact) -> bool,
{
    let mut selection = Selection::default();
    if sources.is_empty() {
        selection.record(Decision::NoSources);
        return Ok(selection);
    }

    for source in sources {
        let native_name = to_native_separators(source.name());

        let target_names = match mapper.map_file_name(&native_name) {
            Ok(names) => names.unwrap_or_default(),
            Err(error) => {
                selection.record(Decision::MappingFailed {
                    source: source.name().to_string(),
                    error,
                });
                Vec::new()
            }
        };
        if target_names.is_empty() {
            selection.record(Decision::Skipped {
                source: source.name().to_string(),
            });
            continue;
        }

        let mut resolved = Vec::with_capacity(target_names.len());
        for name in &target_names {
            resolved.push(targets.resolve(&to_forward_slashes(name))?);
        }

        let stale: Vec<&Artifact> = resolved
            .iter()
            .filter(|&target| selector(source, target))
            .collect();
        if let Some(first) = stale.first() {
            selection.record(Decision::Added {
                source: source.name().to_string(),
                target: first.name().to_string(),
                target_exists: first.exists(),
            });
            selection.selected.push(source.clone());
            continue;
        }

        selection.record(Decision::UpToDate {
            source: source.name().to_string(),
            targets: resolved.iter().map(|t| t.name().to_string()).collect(),
        });
    }

    Ok(selection)
}

/// [`select_sources_report`] without the decisions.
pub fn select_sources<M, P, S>(
    sources: &[Artifact],
    mapper: &M,
    targets: &P,
    selector: S,
) -> Result<Vec<Artifact>>
where
    M: NameMapper + ?Sized,
    P: TargetProvider + ?Sized,
    S: Fn(&Artifact, &Artifact) -> bool,
{
    Ok(select_sources_report(sources, mapper, targets, selector)?.selected)
}

/// Select sources with at least one missing or outdated target.
///
/// Sources modified in the future are reported as warnings first.
pub fn select_out_of_date_report<M, P>(
    sources: &[Artifact],
    mapper: &M,
    targets: &P,
    granularity: Duration,
) -> Result<Selection>
where
    M: NameMapper + ?Sized,
    P: TargetProvider + ?Sized,
{
    detect_future_modifications(sources, granularity, SystemTime::now());
    select_sources_report(sources, mapper, targets, |source, target| {
        is_out_of_date(source, target, granularity)
    })
}

/// [`select_out_of_date_report`] without the decisions.
pub fn select_out_of_date<M, P>(
    sources: &[Artifact],
    mapper: &M,
    targets: &P,
    granularity: Duration,
) -> Result<Vec<Artifact>>
where
    M: NameMapper + ?Sized,
    P: TargetProvider + ?Sized,
{
    Ok(select_out_of_date_report(sources, mapper, targets, granularity)?.selected)
}
