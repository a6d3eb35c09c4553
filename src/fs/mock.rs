// src/fs/mock.rs

use super::{FileSystem, Stat};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File {
        content: Vec<u8>,
        modified: SystemTime,
        read_only: bool,
    },
    Dir {
        children: Vec<String>,
        modified: SystemTime,
    },
}

type Entries = HashMap<PathBuf, MockEntry>;

/// In-memory filesystem with explicit modification times.
///
/// Paths are normalised by dropping `.` components, so `./src/a.rs` and
/// `src/a.rs` name the same entry.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<Entries>>,
}

fn key(path: &Path) -> PathBuf {
    let key: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if key.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        key
    }
}

fn parent_key(path: &Path) -> Option<PathBuf> {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Some(PathBuf::from(".")),
        Some(parent) => Some(parent.to_path_buf()),
        None => None,
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(
            PathBuf::from("."),
            MockEntry::Dir {
                children: Vec::new(),
                modified: SystemTime::UNIX_EPOCH,
            },
        );

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a file stamped with the current time.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.add_file_at(path, content, SystemTime::now());
    }

    pub fn add_file_at(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
        modified: SystemTime,
    ) {
        let mut files = self.entries();
        insert_file(&mut files, &key(path.as_ref()), content.into(), modified);
    }

    pub fn add_dir_at(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let path = key(path.as_ref());
        let mut files = self.entries();
        ensure_dir_entry(&mut files, &path);
        if let Some(MockEntry::Dir { modified: m, .. }) = files.get_mut(&path) {
            *m = modified;
        }
    }

    pub fn set_read_only(&self, path: impl AsRef<Path>, flag: bool) {
        let mut files = self.entries();
        if let Some(MockEntry::File { read_only, .. }) = files.get_mut(&key(path.as_ref())) {
            *read_only = flag;
        }
    }

    /// Current content of a file, if present.
    pub fn content(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.entries().get(&key(path.as_ref())) {
            Some(MockEntry::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }
}

fn insert_file(files: &mut Entries, path: &Path, content: Vec<u8>, modified: SystemTime) {
    let read_only = matches!(files.get(path), Some(MockEntry::File { read_only: true, .. }));
    files.insert(
        path.to_path_buf(),
        MockEntry::File {
            content,
            modified,
            read_only,
        },
    );

    // Ensure parent directories exist implicitly for simplicity in this mock
    if let Some(parent) = parent_key(path) {
        ensure_dir_entry(files, &parent);
        link_child(files, &parent, path);
    }
}

fn ensure_dir_entry(files: &mut Entries, path: &Path) {
    if files.contains_key(path) {
        return;
    }
    files.insert(
        path.to_path_buf(),
        MockEntry::Dir {
            children: Vec::new(),
            modified: SystemTime::UNIX_EPOCH,
        },
    );
    if let Some(parent) = parent_key(path) {
        if parent != path {
            // Avoid infinite loop at root
            ensure_dir_entry(files, &parent);
            link_child(files, &parent, path);
        }
    }
}

fn link_child(files: &mut Entries, parent: &Path, child: &Path) {
    if let Some(MockEntry::Dir { children, .. }) = files.get_mut(parent) {
        if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }
}

/// Buffers writes and commits them to the mock on flush and on drop.
struct MockWriter {
    files: Arc<Mutex<Entries>>,
    path: PathBuf,
    buf: Vec<u8>,
}

impl MockWriter {
    fn commit(&mut self) {
        let mut files = self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        insert_file(&mut files, &self.path, self.buf.clone(), SystemTime::now());
    }
}

impl Write for MockWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit();
        Ok(())
    }
}

impl Drop for MockWriter {
    fn drop(&mut self) {
        self.commit();
    }
}

impl FileSystem for MockFileSystem {
    fn stat(&self, path: &Path) -> Result<Stat> {
        let files = self.entries();
        Ok(match files.get(&key(path)) {
            Some(MockEntry::File {
                content,
                modified,
                read_only,
            }) => Stat {
                exists: true,
                is_dir: false,
                modified: Some(*modified),
                len: Some(content.len() as u64),
                read_only: *read_only,
            },
            Some(MockEntry::Dir { modified, .. }) => Stat {
                exists: true,
                is_dir: true,
                modified: Some(*modified),
                len: None,
                read_only: false,
            },
            None => Stat::missing(),
        })
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let files = self.entries();
        match files.get(&key(path)) {
            Some(MockEntry::File { content, .. }) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir { .. }) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn open_write(&self, path: &Path) -> Result<Box<dyn Write + Send>> {
        let path = key(path);
        let mut files = self.entries();
        match files.get(&path) {
            Some(MockEntry::Dir { .. }) => return Err(anyhow!("Is a directory: {:?}", path)),
            Some(MockEntry::File { read_only: true, .. }) => {
                return Err(anyhow!("Permission denied: {:?}", path));
            }
            _ => {}
        }
        // Truncate immediately, like `File::create`.
        insert_file(&mut files, &path, Vec::new(), SystemTime::now());
        Ok(Box::new(MockWriter {
            files: Arc::clone(&self.files),
            path,
            buf: Vec::new(),
        }))
    }

    fn set_modified(&self, path: &Path, time: SystemTime) -> Result<()> {
        let mut files = self.entries();
        match files.get_mut(&key(path)) {
            Some(MockEntry::File { modified, .. }) | Some(MockEntry::Dir { modified, .. }) => {
                *modified = time;
                Ok(())
            }
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let path = key(path);
        let mut files = self.entries();
        match files.get(&path) {
            Some(MockEntry::File { .. }) => {
                files.remove(&path);
                if let Some(parent) = parent_key(&path) {
                    if let (Some(MockEntry::Dir { children, .. }), Some(name)) =
                        (files.get_mut(&parent), path.file_name().and_then(|n| n.to_str()))
                    {
                        children.retain(|c| c != name);
                    }
                }
                Ok(())
            }
            Some(MockEntry::Dir { .. }) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.entries();
        match files.get(&key(path)) {
            Some(MockEntry::Dir { children, .. }) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        let path = key(path);
        if self.entries().contains_key(&path) {
            Ok(path)
        } else {
            Err(anyhow!("File not found: {:?}", path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn dot_prefixed_and_plain_paths_are_the_same_entry() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/main.rs", b"fn main() {}".to_vec());
        assert!(fs.stat(Path::new("src/main.rs")).unwrap().exists);
        assert!(fs.stat(Path::new("src")).unwrap().is_dir);
        assert_eq!(fs.read_dir(Path::new(".")).unwrap(), vec![PathBuf::from("./src")]);
    }

    #[test]
    fn writes_are_visible_after_drop_and_keep_explicit_mtime() {
        let fs = MockFileSystem::new();
        {
            let mut out = fs.open_write(Path::new("out/a.txt")).unwrap();
            out.write_all(b"abc").unwrap();
        }
        assert_eq!(fs.content("out/a.txt").unwrap(), b"abc");

        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(42);
        fs.set_modified(Path::new("out/a.txt"), when).unwrap();
        assert_eq!(fs.stat(Path::new("out/a.txt")).unwrap().modified, Some(when));
    }

    #[test]
    fn read_only_files_refuse_writes_until_removed() {
        let fs = MockFileSystem::new();
        fs.add_file("locked.txt", b"old".to_vec());
        fs.set_read_only("locked.txt", true);
        assert!(fs.open_write(Path::new("locked.txt")).is_err());

        fs.remove_file(Path::new("locked.txt")).unwrap();
        assert!(fs.open_write(Path::new("locked.txt")).is_ok());
        assert!(fs.read_dir(Path::new(".")).unwrap().len() == 1);
    }
}
