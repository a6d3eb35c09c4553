use std::fs;
use std::path::Path;
use std::sync::Arc;

use uptodate::cli::CliArgs;
use uptodate::config::load_and_validate;
use uptodate::digest::DigestStorage;
use uptodate::errors::UptodateError;
use uptodate::fs::mock::MockFileSystem;
use uptodate::fs::{FileSystem, RealFileSystem};
use uptodate::job::{JobReport, JobRunner};
use uptodate_test_utils::builders::{ConfigFileBuilder, JobConfigBuilder};
use uptodate_test_utils::{at, init_tracing};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn real() -> Arc<dyn FileSystem> {
    Arc::new(RealFileSystem)
}

#[test]
fn second_run_finds_nothing_to_do() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/a.txt", "a");
    write(dir.path(), "src/sub/b.txt", "b");

    let cfg = ConfigFileBuilder::new()
        .with_job("copy", JobConfigBuilder::new("src", "out").build())
        .build();
    let runner = JobRunner::new(&cfg, dir.path(), real());

    let first = runner.run("copy").unwrap();
    assert_eq!(first.scanned, 2);
    assert_eq!(first.selected, 2);
    assert_eq!(first.copied, 2);
    assert_eq!(first.sources, vec!["a.txt", "sub/b.txt"]);
    assert_eq!(fs::read_to_string(dir.path().join("out/sub/b.txt")).unwrap(), "b");

    let second = runner.run("copy").unwrap();
    assert_eq!(
        second,
        JobReport {
            scanned: 2,
            ..JobReport::default()
        }
    );
}

#[test]
fn patterns_and_mapper_shape_the_output() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "docs/intro.txt", "Hello @WHO@");
    write(dir.path(), "docs/draft.txt", "skip me");
    write(dir.path(), "docs/logo.png", "png");

    let job = JobConfigBuilder::new("docs", "site")
        .include("**/*.txt")
        .exclude("**/draft.*")
        .glob_mapper("*.txt", "*.html")
        .token("WHO", "world")
        .build();
    let cfg = ConfigFileBuilder::new().with_job("docs", job).build();

    let report = JobRunner::new(&cfg, dir.path(), real()).run("docs").unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.copied, 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("site/intro.html")).unwrap(),
        "Hello world"
    );
    assert!(!dir.path().join("site/draft.html").exists());
    assert!(!dir.path().join("site/logo.png").exists());
}

#[test]
fn dry_run_lists_without_copying() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/a.txt", "a");

    let cfg = ConfigFileBuilder::new()
        .with_job("copy", JobConfigBuilder::new("src", "out").build())
        .build();
    let report = JobRunner::new(&cfg, dir.path(), real())
        .dry_run(true)
        .run("copy")
        .unwrap();

    assert_eq!(report.sources, vec!["a.txt"]);
    assert_eq!(report.copied, 0);
    assert!(!dir.path().join("out").exists());
}

#[test]
fn failures_are_counted_when_not_fatal() {
    init_tracing();
    let mock = MockFileSystem::new();
    mock.add_file_at("src/locked.txt", "new", at(100));
    mock.add_file_at("src/open.txt", "new", at(100));
    mock.add_file_at("out/locked.txt", "old", at(1));
    mock.set_read_only("out/locked.txt", true);
    let shared: Arc<dyn FileSystem> = Arc::new(mock.clone());

    let lenient = ConfigFileBuilder::new()
        .fail_on_error(false)
        .with_job("copy", JobConfigBuilder::new("src", "out").build())
        .build();
    let report = JobRunner::new(&lenient, ".", shared.clone()).run("copy").unwrap();
    assert_eq!(report.selected, 2);
    assert_eq!(report.copied, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(mock.content("out/locked.txt").unwrap(), b"old");

    let strict = ConfigFileBuilder::new()
        .with_job("copy", JobConfigBuilder::new("src", "out").overwrite(true).build())
        .build();
    let err = JobRunner::new(&strict, ".", shared).run("copy").unwrap_err();
    assert!(matches!(err, UptodateError::ReadOnlyTarget(_)));
}

#[test]
fn digest_filter_ignores_timestamp_only_changes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/a.txt", "a");

    let cfg = ConfigFileBuilder::new()
        .digest_storage(DigestStorage::File)
        .with_job("copy", JobConfigBuilder::new("src", "out").use_digest(true).build())
        .build();
    let runner = JobRunner::new(&cfg, dir.path(), real());

    assert_eq!(runner.run("copy").unwrap().copied, 1);
    assert!(dir.path().join(".uptodate/digests").exists());

    fs::remove_file(dir.path().join("out/a.txt")).unwrap();
    let unchanged = runner.run("copy").unwrap();
    assert_eq!(unchanged.selected, 0);
    assert!(!dir.path().join("out/a.txt").exists());

    write(dir.path(), "src/a.txt", "changed");
    assert_eq!(runner.run("copy").unwrap().copied, 1);
}

#[test]
fn unknown_job_is_a_config_error() {
    let cfg = ConfigFileBuilder::new()
        .with_job("copy", JobConfigBuilder::new("src", "out").build())
        .build();
    let err = JobRunner::new(&cfg, ".", real()).run("nope").unwrap_err();
    assert!(matches!(err, UptodateError::ConfigError(_)));
}

#[test]
fn run_resolves_jobs_relative_to_the_config_file() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "project/in/a.txt", "a");
    write(
        dir.path(),
        "project/Uptodate.toml",
        r#"
[settings]
granularity_ms = 0

[job.copy]
src_dir = "in"
dest_dir = "out"
mapper = { type = "glob", from = "*.txt", to = "*.bak" }
"#,
    );
    let config = dir.path().join("project/Uptodate.toml");
    assert_eq!(load_and_validate(&config).unwrap().job.len(), 1);

    let args = CliArgs {
        config: config.to_string_lossy().into_owned(),
        job: Some("copy".to_string()),
        log_level: None,
        dry_run: false,
        granularity_ms: None,
    };
    uptodate::run(args).unwrap();
    assert_eq!(
        fs::read_to_string(dir.path().join("project/out/a.bak")).unwrap(),
        "a"
    );
}
