// src/copy/mod.rs

//! Transfer of content from a source artifact to a destination artifact.

use std::io::{self, Read, Write};
use std::time::{Duration, SystemTime};

use anyhow::anyhow;
use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, trace, warn};

use crate::artifact::Artifact;
use crate::errors::{Result, UptodateError};
use crate::select::staleness::{default_granularity, is_out_of_date};

pub mod filter;
pub mod text;

pub use filter::{FilterSet, FilterSetCollection};
use text::{TextReader, TextWriter};

const COPY_BUF_SIZE: usize = 64 * 1024;

/// How the bytes get from source to destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStrategy {
    /// Raw byte copy.
    Bytes,
    /// Decode with the input encoding, encode with the output encoding.
    Transcode,
    /// Like `Transcode`, one line at a time with token substitution.
    FilterLines,
}

#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Copy even when the destination is up to date.
    pub overwrite: bool,
    /// Give the destination the source's modification time.
    pub preserve_last_modified: bool,
    /// Replace read-only destination files.
    pub force: bool,
    pub filters: FilterSetCollection,
    pub input_encoding: &'static Encoding,
    pub output_encoding: &'static Encoding,
    /// Tolerance for the up-to-date check; `None` uses the platform default.
    pub granularity: Option<Duration>,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            preserve_last_modified: false,
            force: false,
            filters: FilterSetCollection::new(),
            input_encoding: text::platform_default(),
            output_encoding: text::platform_default(),
            granularity: None,
        }
    }
}

impl CopyOptions {
    /// Set both encodings from labels; `None` keeps the platform default.
    pub fn with_encodings(mut self, input: Option<&str>, output: Option<&str>) -> Result<Self> {
        self.input_encoding = text::resolve_encoding(input)?;
        self.output_encoding = text::resolve_output_encoding(output)?;
        Ok(self)
    }

    pub fn strategy(&self) -> TransferStrategy {
        if self.filters.has_filters() {
            TransferStrategy::FilterLines
        } else if self.input_encoding != UTF_8
            || self.output_encoding != UTF_8
            || self.input_encoding != self.output_encoding
        {
            TransferStrategy::Transcode
        } else {
            TransferStrategy::Bytes
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied(TransferStrategy),
    /// Skipped because the destination is newer and `overwrite` is off.
    UpToDate,
    /// Skipped because source and destination are the same file.
    SameFile,
}

/// Copy `source` to `dest` according to `options`.
///
/// Streams are closed before this returns, on success and on failure.
pub fn copy_resource(source: &Artifact, dest: &Artifact, options: &CopyOptions) -> Result<CopyOutcome> {
    let granularity = options.granularity.unwrap_or_else(default_granularity);
    if !options.overwrite && !is_out_of_date(source, dest, granularity) {
        debug!("{} omitted as {} is up to date.", source.name(), dest.name());
        return Ok(CopyOutcome::UpToDate);
    }

    if is_same_file(source, dest) {
        debug!("Skipping self-copy of {source}");
        return Ok(CopyOutcome::SameFile);
    }

    if !source.exists() {
        return Err(UptodateError::IoError(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source {source} does not exist"),
        )));
    }
    if source.is_dir() {
        return Err(UptodateError::Other(anyhow!(
            "cannot copy directory {source} as a file"
        )));
    }
    if dest.is_dir() {
        return Err(UptodateError::Other(anyhow!(
            "destination {dest} is a directory"
        )));
    }

    if dest.is_read_only() {
        if !options.force {
            return Err(UptodateError::ReadOnlyTarget(dest.location().to_path_buf()));
        }
        debug!("Removing read-only destination {dest}");
        dest.file_system().remove_file(dest.location())?;
    }

    let strategy = options.strategy();
    trace!(source = %source, dest = %dest, ?strategy, "copying");

    let reader = source.open_read()?;
    let writer = dest.open_write()?;
    let transferred = match strategy {
        TransferStrategy::Bytes => copy_bytes(reader, writer),
        TransferStrategy::Transcode => transcode(reader, writer, options),
        TransferStrategy::FilterLines => filter_lines(reader, writer, options),
    };
    if let Err(err) = transferred {
        // A partial file would be newer than its source and look up to date.
        if let Err(remove_err) = dest.file_system().remove_file(dest.location()) {
            warn!("Failed to delete corrupt destination {dest}: {remove_err:#}");
        }
        return Err(err.into());
    }

    if options.preserve_last_modified {
        dest.touch(source.modified().unwrap_or_else(SystemTime::now));
    }

    Ok(CopyOutcome::Copied(strategy))
}

fn is_same_file(source: &Artifact, dest: &Artifact) -> bool {
    let same_store = std::ptr::addr_eq(
        std::sync::Arc::as_ptr(source.file_system()),
        std::sync::Arc::as_ptr(dest.file_system()),
    );
    same_store
        && source.exists()
        && dest.exists()
        && source
            .file_system()
            .same_file(source.location(), dest.location())
}

fn copy_bytes(mut reader: impl Read, mut writer: impl Write) -> io::Result<()> {
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
    }
    writer.flush()
}

fn transcode(reader: impl Read, writer: impl Write, options: &CopyOptions) -> io::Result<()> {
    let mut reader = TextReader::new(reader, options.input_encoding);
    let mut writer = TextWriter::new(writer, options.output_encoding);
    let mut chunk = String::new();
    while reader.read_chunk(&mut chunk)? {
        writer.write_str(&chunk)?;
        chunk.clear();
    }
    writer.finish()?;
    Ok(())
}

fn filter_lines(reader: impl Read, writer: impl Write, options: &CopyOptions) -> io::Result<()> {
    let mut reader = TextReader::new(reader, options.input_encoding);
    let mut writer = TextWriter::new(writer, options.output_encoding);
    let mut line = String::new();
    while reader.read_line(&mut line)? {
        writer.write_str(&options.filters.replace_tokens(&line))?;
    }
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_follows_options() {
        let mut options = CopyOptions::default();
        assert_eq!(options.strategy(), TransferStrategy::Bytes);

        options = options.with_encodings(Some("iso-8859-1"), None).unwrap();
        assert_eq!(options.strategy(), TransferStrategy::Transcode);

        let mut set = FilterSet::new();
        set.add_filter("A", "b");
        options.filters.add(set);
        assert_eq!(options.strategy(), TransferStrategy::FilterLines);
    }

    #[test]
    fn same_encoding_labels_copy_bytes() {
        let options = CopyOptions::default()
            .with_encodings(Some("utf8"), Some("UTF-8"))
            .unwrap();
        assert_eq!(options.strategy(), TransferStrategy::Bytes);
    }

    #[test]
    fn utf16_output_is_rejected() {
        let err = CopyOptions::default()
            .with_encodings(None, Some("utf-16"))
            .unwrap_err();
        assert!(matches!(err, UptodateError::Encoding(_)));
    }
}
