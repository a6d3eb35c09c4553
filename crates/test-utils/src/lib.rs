pub mod builders;

use std::path::Path;
use std::sync::{Arc, Once};
use std::time::{Duration, SystemTime};

use tracing_subscriber::{EnvFilter, fmt};
use uptodate::artifact::Artifact;
use uptodate::fs::FileSystem;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// A fixed point in time, `secs` seconds after the epoch.
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

/// Resolve `base/name` on `fs`, panicking on failure.
pub fn artifact(fs: &Arc<dyn FileSystem>, base: &str, name: &str) -> Artifact {
    Artifact::resolve(Arc::clone(fs), Path::new(base), name)
        .unwrap_or_else(|e| panic!("resolving {base}/{name}: {e:#}"))
}
