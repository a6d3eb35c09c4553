// src/job/scan.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

/// Directory holding the digest cache; never scanned.
const STATE_DIR: &str = ".uptodate";

/// Compiled include/exclude globs, matched against forward-slash relative
/// names such as `"docs/index.txt"`.
#[derive(Clone)]
pub struct PatternSet {
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternSet")
            .field("include", &self.include.len())
            .field("exclude", &self.exclude.as_ref().map(GlobSet::len))
            .finish()
    }
}

impl PatternSet {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = build_globset(include).context("building include globset")?;
        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };
        Ok(Self { include, exclude })
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        match &self.exclude {
            Some(exclude) => !exclude.is_match(rel_path),
            None => true,
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Relative names of all files under `root` matching `patterns`, sorted.
///
/// A missing `root` yields no names.
pub fn collect_sources(fs: &dyn FileSystem, root: &Path, patterns: &PatternSet) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let root_stat = fs.stat(root)?;
    if !root_stat.exists || !root_stat.is_dir {
        return Ok(names);
    }

    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            let stat = fs.stat(&path)?;
            if stat.is_dir {
                if path.file_name().is_some_and(|n| n == STATE_DIR) {
                    continue;
                }
                stack.push(path);
            } else if stat.exists {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if patterns.matches(&rel_str) {
                        names.push(rel_str);
                    }
                }
            }
        }
    }

    names.sort();
    Ok(names)
}
