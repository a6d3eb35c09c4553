// src/artifact.rs

//! Artifacts: stat-able, named units of content, and the providers that
//! resolve target names into them.

use std::fmt;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::anyhow;
use tracing::warn;

use crate::errors::{Result, UptodateError};
use crate::fs::{FileSystem, Stat};

/// Value-like descriptor of a file or directory.
///
/// The metadata is captured when the descriptor is built and is not kept in
/// sync with the underlying store; call [`Artifact::refresh`] to re-read it.
#[derive(Debug, Clone)]
pub struct Artifact {
    name: String,
    location: PathBuf,
    stat: Stat,
    fs: Arc<dyn FileSystem>,
}

impl Artifact {
    /// Stat `base/name` and build a descriptor named `name`.
    pub fn resolve(fs: Arc<dyn FileSystem>, base: &Path, name: &str) -> anyhow::Result<Self> {
        let location = base.join(name);
        Self::at(fs, name, location)
    }

    /// Build a descriptor for an explicit location.
    pub fn at(
        fs: Arc<dyn FileSystem>,
        name: impl Into<String>,
        location: impl Into<PathBuf>,
    ) -> anyhow::Result<Self> {
        let location = location.into();
        let stat = fs.stat(&location)?;
        Ok(Self {
            name: name.into(),
            location,
            stat,
            fs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn exists(&self) -> bool {
        self.stat.exists
    }

    pub fn is_dir(&self) -> bool {
        self.stat.is_dir
    }

    /// Modification time; `None` when unknown or when the artifact does not exist.
    pub fn modified(&self) -> Option<SystemTime> {
        if self.stat.exists {
            self.stat.modified
        } else {
            None
        }
    }

    /// Size in bytes; `None` when unknown or when the artifact does not exist.
    pub fn size(&self) -> Option<u64> {
        if self.stat.exists {
            self.stat.len
        } else {
            None
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.stat.exists && self.stat.read_only
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Whether both descriptors point at the same location.
    pub fn same_identity(&self, other: &Artifact) -> bool {
        self.location == other.location
    }

    /// Re-read the metadata from the underlying store.
    pub fn refresh(&self) -> anyhow::Result<Artifact> {
        Artifact::at(Arc::clone(&self.fs), self.name.clone(), self.location.clone())
    }

    pub fn open_read(&self) -> anyhow::Result<Box<dyn Read + Send>> {
        self.fs.open_read(&self.location)
    }

    pub fn open_write(&self) -> anyhow::Result<Box<dyn Write + Send>> {
        self.fs.open_write(&self.location)
    }

    /// Set the modification time. Failure is logged, not returned.
    pub fn touch(&self, time: SystemTime) {
        if let Err(err) = self.fs.set_modified(&self.location, time) {
            warn!(artifact = %self.name, "Failed to change file modification time: {err:#}");
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location.display())
    }
}

/// Resolves a relative target name into a concrete, possibly missing, artifact.
pub trait TargetProvider {
    fn resolve(&self, name: &str) -> Result<Artifact>;
}

impl<F> TargetProvider for F
where
    F: Fn(&str) -> Result<Artifact>,
{
    fn resolve(&self, name: &str) -> Result<Artifact> {
        self(name)
    }
}

/// Targets living under a destination directory.
#[derive(Debug, Clone)]
pub struct DirectoryTargets {
    fs: Arc<dyn FileSystem>,
    base: PathBuf,
}

impl DirectoryTargets {
    pub fn new(fs: Arc<dyn FileSystem>, base: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            base: base.into(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl TargetProvider for DirectoryTargets {
    fn resolve(&self, name: &str) -> Result<Artifact> {
        let relative = Path::new(name);
        let escapes = relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
        if escapes {
            return Err(UptodateError::resolution(
                name,
                anyhow!("target name is not relative to {:?}", self.base),
            ));
        }

        Artifact::resolve(Arc::clone(&self.fs), &self.base, name)
            .map_err(|err| UptodateError::resolution(name, err))
    }
}
