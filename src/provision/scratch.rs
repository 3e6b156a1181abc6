//! Download scratch directory lifecycle.
//!
//! Every local session gets its own scratch directory under the configured
//! downloads root, reset to empty at provisioning time. The reset is
//! best-effort all the way down: a file that will not delete is recorded
//! and skipped, never fatal, so one stubborn download from a previous run
//! cannot block a new session.

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::cleanup::CleanupReport;

// ============================================================================
// Reset
// ============================================================================

/// Deletes and recreates a scratch directory, tolerating per-entry
/// failures.
///
/// Every removed file and directory counts into the report; everything
/// that resists is recorded with its path and skipped. The directory
/// itself is (re)created last, so the common outcome is an existing,
/// empty directory.
pub fn reset_dir(dir: &Path) -> CleanupReport {
    let mut report = CleanupReport::new();

    if dir.exists() {
        sweep(dir, &mut report);
        match fs::remove_dir(dir) {
            Ok(()) => report.record_completed(),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Could not remove scratch directory");
                report.record_failure(dir.display().to_string(), e.to_string());
            }
        }
    }

    match fs::create_dir_all(dir) {
        Ok(()) => report.record_completed(),
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Could not create scratch directory");
            report.record_failure(dir.display().to_string(), e.to_string());
        }
    }

    debug!(
        path = %dir.display(),
        completed = report.completed(),
        failed = report.failures().len(),
        "Scratch directory reset"
    );
    report
}

/// Removes the contents of `dir`, one entry at a time.
fn sweep(dir: &Path, report: &mut CleanupReport) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Could not list scratch directory");
            report.record_failure(dir.display().to_string(), e.to_string());
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.record_failure(dir.display().to_string(), e.to_string());
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            sweep(&path, report);
            match fs::remove_dir(&path) {
                Ok(()) => report.record_completed(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not delete directory");
                    report.record_failure(path.display().to_string(), e.to_string());
                }
            }
        } else {
            match fs::remove_file(&path) {
                Ok(()) => report.record_completed(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not delete file");
                    report.record_failure(path.display().to_string(), e.to_string());
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_creates_missing_dir() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("downloads").join("session-1");

        let report = reset_dir(&dir);
        assert!(dir.is_dir());
        assert!(report.is_clean());
        assert_eq!(report.completed(), 1);
    }

    #[test]
    fn test_reset_empties_existing_dir() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("scratch");
        fs::create_dir_all(dir.join("nested")).expect("mkdir");
        fs::write(dir.join("a.bin"), b"x").expect("write");
        fs::write(dir.join("nested/b.bin"), b"y").expect("write");

        let report = reset_dir(&dir);
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).expect("read").count(), 0);
        assert!(report.is_clean());
        // Two files, the nested dir, the dir itself, the recreate.
        assert_eq!(report.completed(), 5);
    }

    #[test]
    fn test_reset_is_repeatable() {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = root.path().join("scratch");

        let first = reset_dir(&dir);
        let second = reset_dir(&dir);
        assert!(first.is_clean());
        assert!(second.is_clean());
        assert!(dir.is_dir());
    }
}
