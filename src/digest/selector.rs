// src/digest/selector.rs

use anyhow::Result;
use tracing::debug;

use super::{DigestCache, compute_digest};
use crate::artifact::Artifact;
use crate::mapper::to_forward_slashes;

/// Selects artifacts whose content digest differs from the cached one.
pub struct ChangedSelector {
    cache: Box<dyn DigestCache>,
    update: bool,
}

impl ChangedSelector {
    /// With `update` set, the digest of every selected artifact is recorded.
    pub fn new(cache: Box<dyn DigestCache>, update: bool) -> Self {
        Self { cache, update }
    }

    /// Whether `artifact` changed since its digest was last recorded.
    ///
    /// Directories and missing artifacts are never selected.
    pub fn is_selected(&mut self, artifact: &Artifact) -> Result<bool> {
        if !artifact.exists() || artifact.is_dir() {
            return Ok(false);
        }

        let key = cache_key(artifact);
        let digest = compute_digest(artifact)?;
        let changed = self.cache.load(&key)?.as_deref() != Some(digest.as_str());
        debug!(artifact = %artifact.name(), changed, "digest check");

        if changed && self.update {
            self.cache.store(&key, &digest)?;
        }
        Ok(changed)
    }

    /// Keep the changed artifacts, preserving order.
    pub fn filter(&mut self, artifacts: Vec<Artifact>) -> Result<Vec<Artifact>> {
        let mut kept = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            if self.is_selected(&artifact)? {
                kept.push(artifact);
            }
        }
        Ok(kept)
    }

    /// Record the current digest of `artifact` regardless of `update`.
    pub fn record(&mut self, artifact: &Artifact) -> Result<()> {
        if !artifact.exists() || artifact.is_dir() {
            return Ok(());
        }
        let digest = compute_digest(artifact)?;
        self.cache.store(&cache_key(artifact), &digest)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.cache.flush()
    }
}

fn cache_key(artifact: &Artifact) -> String {
    to_forward_slashes(&artifact.location().to_string_lossy())
}
