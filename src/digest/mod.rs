// src/digest/mod.rs

//! Content digests for change detection independent of timestamps.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use serde::Deserialize;
use tracing::{debug, info};

use crate::artifact::Artifact;

pub mod selector;

pub use selector::ChangedSelector;

/// Relative path (from the project root) to the digest file.
///
/// The effective path on disk is `<root>/.uptodate/digests`.
pub const DIGEST_FILE_PATH: &str = ".uptodate/digests";

/// Where digests survive between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestStorage {
    #[default]
    File,
    Memory,
}

/// Compute the hex digest of an artifact's content.
pub fn compute_digest(artifact: &Artifact) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut reader = artifact
        .open_read()
        .with_context(|| format!("opening {artifact} for hashing"))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Storage of the last seen digest per key.
pub trait DigestCache: Send {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn store(&mut self, key: &str, digest: &str) -> Result<()>;
    /// Persist pending updates.
    fn flush(&mut self) -> Result<()>;
}

/// Build the cache for `storage` rooted at `root`.
pub fn open_cache(storage: DigestStorage, root: &Path) -> Result<Box<dyn DigestCache>> {
    Ok(match storage {
        DigestStorage::File => Box::new(FileDigestCache::open(root.to_path_buf())?),
        DigestStorage::Memory => Box::new(MemoryDigestCache::new()),
    })
}

/// Digests kept in `<root>/.uptodate/digests`, one `key digest` line each.
#[derive(Debug)]
pub struct FileDigestCache {
    root: PathBuf,
    map: BTreeMap<String, String>,
    dirty: bool,
}

impl FileDigestCache {
    pub fn open(root: PathBuf) -> Result<Self> {
        let map = load_all_digests(&root)?;
        debug!(entries = map.len(), root = ?root, "loaded digest cache");
        Ok(Self {
            root,
            map,
            dirty: false,
        })
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(DIGEST_FILE_PATH)
    }
}

impl DigestCache for FileDigestCache {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map.get(key).cloned())
    }

    fn store(&mut self, key: &str, digest: &str) -> Result<()> {
        if self.map.get(key).map(String::as_str) != Some(digest) {
            self.map.insert(key.to_string(), digest.to_string());
            self.dirty = true;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        save_all_digests(&self.path(), &self.map)?;
        self.dirty = false;
        info!(entries = self.map.len(), "stored digests (file)");
        Ok(())
    }
}

/// Digests kept for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryDigestCache {
    map: BTreeMap<String, String>,
}

impl MemoryDigestCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DigestCache for MemoryDigestCache {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map.get(key).cloned())
    }

    fn store(&mut self, key: &str, digest: &str) -> Result<()> {
        self.map.insert(key.to_string(), digest.to_string());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

fn load_all_digests(root: &Path) -> Result<BTreeMap<String, String>> {
    let path = root.join(DIGEST_FILE_PATH);
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let file = File::open(&path).with_context(|| format!("opening digest file at {:?}", path))?;
    let mut map = BTreeMap::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        // keys may contain spaces, digests never do
        if let Some((key, digest)) = trimmed.rsplit_once(char::is_whitespace) {
            map.insert(key.trim_end().to_string(), digest.to_string());
        }
    }
    Ok(map)
}

fn save_all_digests(path: &Path, map: &BTreeMap<String, String>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating digest directory at {:?}", parent))?;
    }

    let file = File::create(path).with_context(|| format!("creating digest file at {:?}", path))?;
    let mut writer = BufWriter::new(file);
    for (key, digest) in map {
        writeln!(writer, "{key} {digest}")?;
    }
    writer.flush()?;
    Ok(())
}
