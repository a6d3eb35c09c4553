// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use filetime::FileTime;

pub mod mock;

/// Metadata snapshot of a single path.
///
/// A missing path is represented by [`Stat::missing`], never by an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub exists: bool,
    pub is_dir: bool,
    pub modified: Option<SystemTime>,
    pub len: Option<u64>,
    pub read_only: bool,
}

impl Stat {
    pub fn missing() -> Self {
        Self {
            exists: false,
            is_dir: false,
            modified: None,
            len: None,
            read_only: false,
        }
    }
}

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn stat(&self, path: &Path) -> Result<Stat>;
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>>;

    /// Open `path` for writing, truncating it and creating missing parent
    /// directories.
    fn open_write(&self, path: &Path) -> Result<Box<dyn Write + Send>>;
    fn set_modified(&self, path: &Path, time: SystemTime) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Whether both paths name the same underlying file.
    fn same_file(&self, a: &Path, b: &Path) -> bool {
        if a == b {
            return true;
        }
        match (self.canonicalize(a), self.canonicalize(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn stat(&self, path: &Path) -> Result<Stat> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Stat {
                exists: true,
                is_dir: meta.is_dir(),
                modified: meta.modified().ok(),
                len: meta.is_file().then(|| meta.len()),
                read_only: meta.permissions().readonly(),
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Stat::missing()),
            Err(err) => Err(err).with_context(|| format!("reading metadata of {:?}", path)),
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let file = fs::File::open(path).with_context(|| format!("opening file {:?}", path))?;
        Ok(Box::new(file))
    }

    fn open_write(&self, path: &Path) -> Result<Box<dyn Write + Send>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating dir {:?}", parent))?;
            }
        }
        let file = fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn set_modified(&self, path: &Path, time: SystemTime) -> Result<()> {
        filetime::set_file_mtime(path, FileTime::from_system_time(time))
            .with_context(|| format!("setting modification time of {:?}", path))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).with_context(|| format!("removing file {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }
}
