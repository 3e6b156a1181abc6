//! Explicit teardown outcomes.
//!
//! Teardown in this crate never raises: closing sessions, killing driver
//! processes, and sweeping scratch directories all tolerate failure. What
//! they do instead is record into a [`CleanupReport`], so callers can assert
//! on cleanup behavior directly instead of scraping logs.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tracing::{info, warn};

// ============================================================================
// CleanupFailure - One tolerated failure
// ============================================================================

/// A single tolerated teardown failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    /// What failed: a file path, "webdriver session", "driver process".
    pub target: String,
    /// The underlying error, stringified.
    pub message: String,
}

impl fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.message)
    }
}

// ============================================================================
// CleanupReport - Aggregated teardown outcome
// ============================================================================

/// Aggregated outcome of a best-effort teardown pass.
///
/// `completed` counts the steps that succeeded; `failures` holds everything
/// that was tolerated. An empty report means there was nothing to do, which
/// is how deleting an absent context or double-closing a session comes out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    completed: usize,
    failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// Creates an empty report.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            completed: 0,
            failures: Vec::new(),
        }
    }

    /// Records one successful teardown step.
    #[inline]
    pub fn record_completed(&mut self) {
        self.completed += 1;
    }

    /// Records one tolerated failure.
    pub fn record_failure(&mut self, target: impl Into<String>, message: impl Into<String>) {
        self.failures.push(CleanupFailure {
            target: target.into(),
            message: message.into(),
        });
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: CleanupReport) {
        self.completed += other.completed;
        self.failures.extend(other.failures);
    }

    /// Number of steps that succeeded.
    #[inline]
    #[must_use]
    pub const fn completed(&self) -> usize {
        self.completed
    }

    /// The tolerated failures, in the order they occurred.
    #[inline]
    #[must_use]
    pub fn failures(&self) -> &[CleanupFailure] {
        &self.failures
    }

    /// `true` when nothing failed.
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// `true` when nothing happened at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed == 0 && self.failures.is_empty()
    }

    /// Emits the report through tracing, one line per failure.
    pub fn log(&self, action: &str) {
        for failure in &self.failures {
            warn!(target_name = %failure.target, error = %failure.message, "{action}: step failed");
        }
        info!(
            completed = self.completed,
            failed = self.failures.len(),
            "{action}: done"
        );
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} completed, {} failed",
            self.completed,
            self.failures.len()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
