use std::fs;
use std::sync::Arc;
use std::time::Duration;

use uptodate::artifact::{Artifact, DirectoryTargets};
use uptodate::compare::content_equals;
use uptodate::copy::{CopyOptions, CopyOutcome, FilterSet, TransferStrategy, copy_resource};
use uptodate::errors::UptodateError;
use uptodate::fs::mock::MockFileSystem;
use uptodate::fs::{FileSystem, RealFileSystem};
use uptodate::mapper::IdentityMapper;
use uptodate::select::select_out_of_date;
use uptodate_test_utils::{artifact, at, init_tracing};

fn mock() -> (MockFileSystem, Arc<dyn FileSystem>) {
    init_tracing();
    let fs = MockFileSystem::new();
    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    (fs, shared)
}

fn tokens(pairs: &[(&str, &str)]) -> CopyOptions {
    let mut set = FilterSet::new();
    for (token, value) in pairs {
        set.add_filter(*token, *value);
    }
    let mut options = CopyOptions::default();
    options.filters.add(set);
    options
}

#[test]
fn copies_bytes_into_missing_destination() {
    let (fs, shared) = mock();
    fs.add_file_at("src/a.bin", vec![0u8, 159, 146, 150], at(10));

    let outcome = copy_resource(
        &artifact(&shared, "src", "a.bin"),
        &artifact(&shared, "out", "nested/a.bin"),
        &CopyOptions::default(),
    )
    .unwrap();

    assert_eq!(outcome, CopyOutcome::Copied(TransferStrategy::Bytes));
    assert_eq!(fs.content("out/nested/a.bin").unwrap(), vec![0u8, 159, 146, 150]);
}

#[test]
fn newer_destination_is_left_alone_unless_overwriting() {
    let (fs, shared) = mock();
    fs.add_file_at("src/a.txt", "new", at(10));
    fs.add_file_at("out/a.txt", "kept", at(20));
    let source = artifact(&shared, "src", "a.txt");
    let dest = artifact(&shared, "out", "a.txt");

    let outcome = copy_resource(&source, &dest, &CopyOptions::default()).unwrap();
    assert_eq!(outcome, CopyOutcome::UpToDate);
    assert_eq!(fs.content("out/a.txt").unwrap(), b"kept");

    let options = CopyOptions {
        overwrite: true,
        ..CopyOptions::default()
    };
    copy_resource(&source, &dest, &options).unwrap();
    assert_eq!(fs.content("out/a.txt").unwrap(), b"new");
}

#[test]
fn preserving_timestamps_copies_the_source_time() {
    let (fs, shared) = mock();
    fs.add_file_at("src/a.txt", "x", at(1234));

    let options = CopyOptions {
        preserve_last_modified: true,
        ..CopyOptions::default()
    };
    copy_resource(&artifact(&shared, "src", "a.txt"), &artifact(&shared, "out", "a.txt"), &options).unwrap();

    let copied = artifact(&shared, "out", "a.txt");
    assert_eq!(copied.modified(), Some(at(1234)));
}

#[test]
fn read_only_destination_needs_force() {
    let (fs, shared) = mock();
    fs.add_file_at("src/a.txt", "fresh", at(100));
    fs.add_file_at("out/a.txt", "stale", at(1));
    fs.set_read_only("out/a.txt", true);
    let source = artifact(&shared, "src", "a.txt");

    let err = copy_resource(&source, &artifact(&shared, "out", "a.txt"), &CopyOptions::default()).unwrap_err();
    assert!(matches!(err, UptodateError::ReadOnlyTarget(_)));
    assert_eq!(fs.content("out/a.txt").unwrap(), b"stale");

    let options = CopyOptions {
        force: true,
        ..CopyOptions::default()
    };
    copy_resource(&source, &artifact(&shared, "out", "a.txt"), &options).unwrap();
    assert_eq!(fs.content("out/a.txt").unwrap(), b"fresh");
}

#[test]
fn copying_onto_itself_is_skipped() {
    let (fs, shared) = mock();
    fs.add_file_at("src/a.txt", "same", at(10));
    let a = artifact(&shared, "src", "a.txt");

    let options = CopyOptions {
        overwrite: true,
        ..CopyOptions::default()
    };
    assert_eq!(copy_resource(&a, &a, &options).unwrap(), CopyOutcome::SameFile);
    assert_eq!(fs.content("src/a.txt").unwrap(), b"same");
}

#[test]
fn tokens_are_replaced_line_by_line() {
    let (fs, shared) = mock();
    fs.add_file_at("src/app.properties", "name=@NAME@\r\nversion=@VERSION@\nother=@OTHER@", at(10));

    let options = tokens(&[("NAME", "demo"), ("VERSION", "1.2")]);
    let outcome = copy_resource(
        &artifact(&shared, "src", "app.properties"),
        &artifact(&shared, "out", "app.properties"),
        &options,
    )
    .unwrap();

    assert_eq!(outcome, CopyOutcome::Copied(TransferStrategy::FilterLines));
    assert_eq!(
        String::from_utf8(fs.content("out/app.properties").unwrap()).unwrap(),
        "name=demo\r\nversion=1.2\nother=@OTHER@"
    );
}

#[test]
fn transcodes_between_encodings() {
    let (fs, shared) = mock();
    fs.add_file_at("src/latin1.txt", b"caf\xe9 cr\xe8me\n".to_vec(), at(10));

    let options = CopyOptions::default()
        .with_encodings(Some("iso-8859-1"), Some("utf-8"))
        .unwrap();
    let outcome = copy_resource(
        &artifact(&shared, "src", "latin1.txt"),
        &artifact(&shared, "out", "utf8.txt"),
        &options,
    )
    .unwrap();

    assert_eq!(outcome, CopyOutcome::Copied(TransferStrategy::Transcode));
    assert_eq!(fs.content("out/utf8.txt").unwrap(), "café crème\n".as_bytes());
}

#[test]
fn undecodable_input_fails_the_copy() {
    let (fs, shared) = mock();
    fs.add_file_at("src/bad.txt", b"ok \xff\xfe".to_vec(), at(10));

    let err = copy_resource(
        &artifact(&shared, "src", "bad.txt"),
        &artifact(&shared, "out", "bad.txt"),
        &tokens(&[("A", "b")]),
    )
    .unwrap_err();
    match err {
        UptodateError::IoError(e) => assert_eq!(e.kind(), std::io::ErrorKind::InvalidData),
        other => panic!("expected an I/O error, got {other:?}"),
    }
    assert!(fs.content("out/bad.txt").is_none());
}

#[test]
fn failed_transfer_leaves_the_source_out_of_date() {
    let (fs, shared) = mock();
    let mut text = "a".repeat(20_000);
    text.push('☃');
    fs.add_file_at("src/snow.txt", text, at(10));
    let source = artifact(&shared, "src", "snow.txt");

    let options = CopyOptions::default()
        .with_encodings(None, Some("windows-1252"))
        .unwrap();
    let err = copy_resource(&source, &artifact(&shared, "out", "snow.txt"), &options).unwrap_err();
    assert!(matches!(err, UptodateError::IoError(_)));
    assert!(fs.content("out/snow.txt").is_none());

    let targets = DirectoryTargets::new(shared.clone(), "out");
    let selected = select_out_of_date(&[source], &IdentityMapper, &targets, Duration::from_secs(1)).unwrap();
    assert_eq!(selected.len(), 1);
}

#[test]
fn read_only_refusal_keeps_the_destination() {
    let (fs, shared) = mock();
    fs.add_file_at("src/a.txt", "new", at(100));
    fs.add_file_at("out/a.txt", "old", at(1));
    fs.set_read_only("out/a.txt", true);

    let options = CopyOptions::default()
        .with_encodings(None, Some("windows-1252"))
        .unwrap();
    let err = copy_resource(&artifact(&shared, "src", "a.txt"), &artifact(&shared, "out", "a.txt"), &options)
        .unwrap_err();
    assert!(matches!(err, UptodateError::ReadOnlyTarget(_)));
    assert_eq!(fs.content("out/a.txt").unwrap(), b"old");
}

#[test]
fn missing_source_is_an_error_when_overwriting() {
    let (_fs, shared) = mock();
    let options = CopyOptions {
        overwrite: true,
        ..CopyOptions::default()
    };
    let err = copy_resource(
        &artifact(&shared, "src", "gone.txt"),
        &artifact(&shared, "out", "gone.txt"),
        &options,
    )
    .unwrap_err();
    assert!(matches!(err, UptodateError::IoError(_)));
}

#[test]
fn real_filesystem_copy_preserves_content_and_time() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let src_dir = dir.path().join("src");
    fs::create_dir_all(&src_dir).unwrap();
    fs::write(src_dir.join("data.txt"), "line one\nline two\n").unwrap();

    let shared: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let source = Artifact::resolve(shared.clone(), &src_dir, "data.txt").unwrap();
    let dest = Artifact::resolve(shared.clone(), &dir.path().join("out"), "deep/data.txt").unwrap();
    assert!(!dest.exists());

    let options = CopyOptions {
        preserve_last_modified: true,
        ..CopyOptions::default()
    };
    copy_resource(&source, &dest, &options).unwrap();

    let dest = dest.refresh().unwrap();
    assert!(content_equals(&source, &dest, false).unwrap());

    let (Some(src_time), Some(dest_time)) = (source.modified(), dest.modified()) else {
        panic!("timestamps should be known on a real filesystem");
    };
    let delta = src_time
        .duration_since(dest_time)
        .unwrap_or_else(|e| e.duration());
    assert!(delta < Duration::from_secs(1));
}
