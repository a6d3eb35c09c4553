// src/compare.rs

//! Content comparison between two artifacts.
//!
//! Used where timestamps cannot be trusted. Binary mode compares bytes; text
//! mode compares line by line and ignores which line terminator (`\n`,
//! `\r\n` or `\r`) ends each line.

use std::cmp::Ordering;
use std::io::{self, BufRead, BufReader};

use tracing::trace;

use crate::artifact::Artifact;
use crate::errors::Result;

const BUF_SIZE: usize = 8192;

/// Whether both artifacts have the same content.
///
/// Two missing artifacts are equal; a directory never equals anything but
/// itself.
pub fn content_equals(a: &Artifact, b: &Artifact, text: bool) -> Result<bool> {
    if a.same_identity(b) {
        return Ok(true);
    }
    if a.exists() != b.exists() {
        return Ok(false);
    }
    if !a.exists() {
        return Ok(true);
    }
    if a.is_dir() || b.is_dir() {
        return Ok(false);
    }
    if !text {
        if let (Some(left), Some(right)) = (a.size(), b.size()) {
            if left != right {
                trace!(a = %a, b = %b, "sizes differ");
                return Ok(false);
            }
        }
    }
    Ok(compare_content(a, b, text)? == Ordering::Equal)
}

/// Total order over artifact content.
///
/// Missing sorts before existing, a directory before a file; two
/// directories compare equal.
pub fn compare_content(a: &Artifact, b: &Artifact, text: bool) -> Result<Ordering> {
    if a.same_identity(b) {
        return Ok(Ordering::Equal);
    }
    match (a.exists(), b.exists()) {
        (false, false) => return Ok(Ordering::Equal),
        (left, right) if left != right => return Ok(left.cmp(&right)),
        _ => {}
    }
    match (a.is_dir(), b.is_dir()) {
        (true, true) => return Ok(Ordering::Equal),
        (true, false) => return Ok(Ordering::Less),
        (false, true) => return Ok(Ordering::Greater),
        (false, false) => {}
    }

    let ordering = if text {
        text_compare(a, b)?
    } else {
        binary_compare(a, b)?
    };
    trace!(a = %a, b = %b, ?ordering, text, "compared content");
    Ok(ordering)
}

fn binary_compare(a: &Artifact, b: &Artifact) -> Result<Ordering> {
    let mut left = BufReader::with_capacity(BUF_SIZE, a.open_read()?);
    let mut right = BufReader::with_capacity(BUF_SIZE, b.open_read()?);

    loop {
        let l = left.fill_buf()?;
        let r = right.fill_buf()?;
        if l.is_empty() || r.is_empty() {
            return Ok(l.len().cmp(&r.len()));
        }
        let n = l.len().min(r.len());
        let ordering = l[..n].cmp(&r[..n]);
        if ordering != Ordering::Equal {
            return Ok(ordering);
        }
        left.consume(n);
        right.consume(n);
    }
}

fn text_compare(a: &Artifact, b: &Artifact) -> Result<Ordering> {
    let mut left = BufReader::with_capacity(BUF_SIZE, a.open_read()?);
    let mut right = BufReader::with_capacity(BUF_SIZE, b.open_read()?);
    let mut expected = Vec::new();
    let mut actual = Vec::new();

    while next_line(&mut left, &mut expected)? {
        if !next_line(&mut right, &mut actual)? {
            return Ok(Ordering::Greater);
        }
        if expected != actual {
            return Ok(expected.cmp(&actual));
        }
    }
    Ok(if next_line(&mut right, &mut actual)? {
        Ordering::Less
    } else {
        Ordering::Equal
    })
}

/// Read one line without its terminator. Returns `false` at end of input.
pub(crate) fn next_line<R: BufRead>(reader: &mut R, line: &mut Vec<u8>) -> io::Result<bool> {
    line.clear();
    let mut read_any = false;
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(read_any);
        }
        read_any = true;
        match buf.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(i) => {
                let terminator = buf[i];
                line.extend_from_slice(&buf[..i]);
                reader.consume(i + 1);
                if terminator == b'\r' && reader.fill_buf()?.first() == Some(&b'\n') {
                    reader.consume(1);
                }
                return Ok(true);
            }
            None => {
                let n = buf.len();
                line.extend_from_slice(buf);
                reader.consume(n);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FileSystem;
    use crate::fs::mock::MockFileSystem;
    use std::path::Path;
    use std::sync::Arc;

    struct Fixture {
        fs: MockFileSystem,
        shared: Arc<dyn FileSystem>,
    }

    impl Fixture {
        fn new() -> Self {
            let fs = MockFileSystem::new();
            let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
            Self { fs, shared }
        }

        fn file(&self, name: &str, content: &[u8]) -> Artifact {
            self.fs.add_file(name, content.to_vec());
            self.get(name)
        }

        fn get(&self, name: &str) -> Artifact {
            Artifact::resolve(Arc::clone(&self.shared), Path::new("."), name).unwrap()
        }
    }

    #[test]
    fn self_comparison_is_equal_even_for_directories() {
        let fx = Fixture::new();
        fx.fs.add_file("dir/inner", b"x".to_vec());
        let dir = fx.get("dir");
        assert!(content_equals(&dir, &dir, true).unwrap());
        let f = fx.file("a", b"abc");
        assert!(content_equals(&f, &f, false).unwrap());
    }

    #[test]
    fn missing_artifacts_are_equal_to_each_other_only() {
        let fx = Fixture::new();
        let m1 = fx.get("nope1");
        let m2 = fx.get("nope2");
        let f = fx.file("a", b"abc");
        assert!(content_equals(&m1, &m2, false).unwrap());
        assert!(!content_equals(&m1, &f, false).unwrap());
        assert_eq!(compare_content(&m1, &f, false).unwrap(), Ordering::Less);
        assert_eq!(compare_content(&f, &m1, false).unwrap(), Ordering::Greater);
    }

    #[test]
    fn directory_and_file_are_never_equal() {
        let fx = Fixture::new();
        fx.fs.add_file("dir/inner", b"x".to_vec());
        let dir = fx.get("dir");
        let f = fx.file("a", b"abc");
        assert!(!content_equals(&dir, &f, true).unwrap());
        assert_eq!(compare_content(&dir, &f, true).unwrap(), Ordering::Less);
    }

    #[test]
    fn binary_comparison_orders_by_first_difference_then_length() {
        let fx = Fixture::new();
        let a = fx.file("a", b"abcd");
        let b = fx.file("b", b"abce");
        let c = fx.file("c", b"abc");
        let d = fx.file("d", b"abcd");
        assert_eq!(compare_content(&a, &b, false).unwrap(), Ordering::Less);
        assert_eq!(compare_content(&a, &c, false).unwrap(), Ordering::Greater);
        assert_eq!(compare_content(&c, &a, false).unwrap(), Ordering::Less);
        assert!(content_equals(&a, &d, false).unwrap());
        assert!(!content_equals(&a, &c, false).unwrap());
    }

    #[test]
    fn text_mode_ignores_line_terminators() {
        let fx = Fixture::new();
        let unix = fx.file("unix", b"one\ntwo\n");
        let dos = fx.file("dos", b"one\r\ntwo\r\n");
        let mac = fx.file("mac", b"one\rtwo\r");
        assert!(!content_equals(&unix, &dos, false).unwrap());
        assert!(content_equals(&unix, &dos, true).unwrap());
        assert!(content_equals(&dos, &mac, true).unwrap());
    }

    #[test]
    fn text_mode_orders_by_lines() {
        let fx = Fixture::new();
        let short = fx.file("short", b"one\n");
        let long = fx.file("long", b"one\ntwo\n");
        let other = fx.file("other", b"onf\n");
        assert_eq!(compare_content(&short, &long, true).unwrap(), Ordering::Less);
        assert_eq!(compare_content(&long, &short, true).unwrap(), Ordering::Greater);
        assert_eq!(compare_content(&short, &other, true).unwrap(), Ordering::Less);
    }

    #[test]
    fn next_line_handles_missing_final_terminator() {
        let mut reader = io::Cursor::new(b"a\r\nb".to_vec());
        let mut line = Vec::new();
        assert!(next_line(&mut reader, &mut line).unwrap());
        assert_eq!(line, b"a");
        assert!(next_line(&mut reader, &mut line).unwrap());
        assert_eq!(line, b"b");
        assert!(!next_line(&mut reader, &mut line).unwrap());
    }
}
