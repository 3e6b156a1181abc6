//! Error types for the session fleet.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use webdriver_fleet::{ContextId, Result, SessionManager};
//!
//! async fn example(manager: &SessionManager, ctx: &ContextId) -> Result<()> {
//!     let session = manager.create(ctx).await?;
//!     session.navigate("https://example.test/login").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Validation | [`Error::BrowserMissing`], [`Error::BrowserUnrecognized`], [`Error::UnsupportedBrowser`], [`Error::InvalidEndpoint`], [`Error::Precondition`] |
//! | Lifecycle | [`Error::Provisioning`], [`Error::Navigation`], [`Error::Session`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebDriver`] |
//!
//! Teardown is deliberately not represented here: session termination and
//! scratch-directory cleanup never raise, they record into
//! [`CleanupReport`](crate::cleanup::CleanupReport) instead.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thirtyfour::error::WebDriverError;
use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// No browser identifier was provided.
    ///
    /// Returned when session creation is attempted without a configured
    /// browser.
    #[error("No browser specified. Provide one of [chrome, firefox, iexplorer, edge]")]
    BrowserMissing,

    /// Browser identifier outside the supported set.
    ///
    /// Returned when a raw identifier does not parse to a [`Browser`].
    ///
    /// [`Browser`]: crate::identifiers::Browser
    #[error("unsupported browser: {identifier}")]
    BrowserUnrecognized {
        /// The identifier exactly as it was provided.
        identifier: String,
    },

    /// No capability strategy or launcher registered for the browser.
    ///
    /// Returned by registry resolution and by the local launcher table.
    #[error("No builder registered for browser: {identifier}")]
    UnsupportedBrowser {
        /// The identifier that had no registration.
        identifier: String,
    },

    /// Remote endpoint rejected before any network activity.
    ///
    /// Returned when the remote server URL is empty or does not parse.
    #[error("Invalid remote endpoint {url:?}: {reason}")]
    InvalidEndpoint {
        /// The endpoint exactly as it was provided.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Remote session build attempted before staging was complete.
    ///
    /// Returned when `build()` is called without an endpoint or without
    /// capabilities.
    #[error("Precondition failed: {message}")]
    Precondition {
        /// Which staging step is missing and how to perform it.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Session provisioning failed.
    ///
    /// Returned when the driver process, readiness wait, or WebDriver
    /// handshake fails.
    #[error("Provisioning failed: {message}")]
    Provisioning {
        /// Description of the provisioning failure.
        message: String,
    },

    /// Initial navigation failed after the single refresh retry.
    ///
    /// Returned by the factory when both the first load and the recovery
    /// refresh raise.
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// The target URL that could not be reached.
        url: String,
        /// The error raised by the recovery attempt.
        message: String,
    },

    /// Fault on a live (or already closed) session.
    ///
    /// Returned for operations on a closed session, rejected file uploads,
    /// and other session-scoped faults without a dedicated variant.
    #[error("Session error: {message}")]
    Session {
        /// Description of the session fault.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebDriver protocol error.
    #[error("WebDriver error: {0}")]
    WebDriver(#[from] WebDriverError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an unrecognized-browser error naming the raw identifier.
    #[inline]
    pub fn browser_unrecognized(identifier: impl Into<String>) -> Self {
        Self::BrowserUnrecognized {
            identifier: identifier.into(),
        }
    }

    /// Creates an unsupported-browser error naming the identifier.
    #[inline]
    pub fn unsupported_browser(identifier: impl Into<String>) -> Self {
        Self::UnsupportedBrowser {
            identifier: identifier.into(),
        }
    }

    /// Creates an invalid-endpoint error.
    #[inline]
    pub fn invalid_endpoint(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a precondition error.
    #[inline]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Creates a provisioning error.
    #[inline]
    pub fn provisioning(message: impl Into<String>) -> Self {
        Self::Provisioning {
            message: message.into(),
        }
    }

    /// Creates a navigation error.
    #[inline]
    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a session error.
    #[inline]
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` for either invalid-browser outcome: no identifier at
    /// all, or one outside the supported set.
    #[inline]
    #[must_use]
    pub fn is_invalid_browser(&self) -> bool {
        matches!(
            self,
            Self::BrowserMissing | Self::BrowserUnrecognized { .. }
        )
    }

    /// Returns `true` if no builder was registered for the browser.
    #[inline]
    #[must_use]
    pub fn is_unsupported_browser(&self) -> bool {
        matches!(self, Self::UnsupportedBrowser { .. })
    }

    /// Returns `true` if the remote endpoint was rejected.
    #[inline]
    #[must_use]
    pub fn is_invalid_endpoint(&self) -> bool {
        matches!(self, Self::InvalidEndpoint { .. })
    }

    /// Returns `true` if this error was raised before any session existed.
    ///
    /// Validation errors mean no provisioning work was started; the context
    /// stays absent and nothing needs cleanup.
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::BrowserMissing
                | Self::BrowserUnrecognized { .. }
                | Self::UnsupportedBrowser { .. }
                | Self::InvalidEndpoint { .. }
                | Self::Precondition { .. }
        )
    }

    /// Returns `true` if provisioning failed.
    #[inline]
    #[must_use]
    pub fn is_provisioning(&self) -> bool {
        matches!(self, Self::Provisioning { .. })
    }

    /// Returns `true` if the initial navigation failed past recovery.
    #[inline]
    #[must_use]
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::Navigation { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
