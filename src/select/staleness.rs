// src/select/staleness.rs

use std::time::Duration;

use crate::artifact::Artifact;

/// Timestamp resolution of FAT filesystems.
pub const FAT_GRANULARITY: Duration = Duration::from_millis(2000);

/// Timestamp resolution assumed for Unix filesystems.
pub const UNIX_GRANULARITY: Duration = Duration::from_millis(1000);

/// Granularity used when the caller does not supply one.
///
/// Chosen by OS family rather than by filesystem, which is only an
/// approximation.
pub fn default_granularity() -> Duration {
    if cfg!(windows) {
        FAT_GRANULARITY
    } else {
        UNIX_GRANULARITY
    }
}

/// Whether `target` has to be regenerated from `source`.
///
/// - A missing target is always out of date.
/// - A missing source never makes an existing target out of date.
/// - An unknown timestamp on either side counts as out of date. An existing
///   source whose time cannot be read therefore always triggers a rebuild,
///   rather than being treated as infinitely old.
/// - Otherwise the target is out of date iff it is older than
///   `source.modified - granularity`; the boundary itself is up to date.
///
/// Directories are compared by timestamp exactly like files.
pub fn is_out_of_date(source: &Artifact, target: &Artifact, granularity: Duration) -> bool {
    if !target.exists() {
        return true;
    }
    if !source.exists() {
        return false;
    }
    match (source.modified(), target.modified()) {
        (Some(source_time), Some(target_time)) => match source_time.checked_sub(granularity) {
            Some(threshold) => target_time < threshold,
            None => false,
        },
        _ => true,
    }
}
