//! Typed identifiers used throughout the crate.
//!
//! [`Browser`] is the closed set of browser identifiers the fleet knows how
//! to provision. [`SessionId`] tags one live browser session; [`ContextId`]
//! names one execution context (a test scenario, a tokio task, a worker).
//! Keeping these as distinct types prevents the string soup the lifecycle
//! layer would otherwise degenerate into.
//!
//! # Example
//!
//! ```
//! use webdriver_fleet::{Browser, ContextId};
//!
//! let browser: Browser = "Chrome".parse().unwrap();
//! assert_eq!(browser, Browser::Chrome);
//! assert_eq!(browser.wire_name(), "chrome");
//!
//! let ctx = ContextId::new("checkout-scenario");
//! assert_eq!(ctx.as_str(), "checkout-scenario");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

// ============================================================================
// Browser - Closed set of provisionable browsers
// ============================================================================

/// Browser identifier accepted by the registry, the provisioners, and the
/// factory.
///
/// The string form is the lowercase identifier (`chrome`, `firefox`,
/// `iexplorer`, `edge`); parsing is ASCII case-insensitive. The W3C
/// `browserName` value differs for two of them, see [`Browser::wire_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    /// Google Chrome / Chromium, driven by chromedriver.
    Chrome,
    /// Mozilla Firefox, driven by geckodriver.
    Firefox,
    /// Internet Explorer, driven by IEDriverServer.
    IExplorer,
    /// Microsoft Edge, driven by msedgedriver.
    Edge,
}

impl Browser {
    /// Every identifier, in registration order.
    pub const ALL: [Browser; 4] = [
        Browser::Chrome,
        Browser::Firefox,
        Browser::IExplorer,
        Browser::Edge,
    ];

    /// The lowercase identifier used in configuration and error messages.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
            Browser::IExplorer => "iexplorer",
            Browser::Edge => "edge",
        }
    }

    /// The W3C `browserName` capability value.
    #[inline]
    #[must_use]
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
            Browser::IExplorer => "internet explorer",
            Browser::Edge => "MicrosoftEdge",
        }
    }

    /// Case-insensitive lookup, `None` for anything outside the closed set.
    #[must_use]
    pub fn lookup(raw: &str) -> Option<Browser> {
        let raw = raw.trim();
        Browser::ALL
            .into_iter()
            .find(|b| raw.eq_ignore_ascii_case(b.as_str()))
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Browser {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Browser::lookup(s).ok_or_else(|| Error::browser_unrecognized(s))
    }
}

// ============================================================================
// SessionId - One live browser session
// ============================================================================

/// Unique identifier minted for every provisioned session, local or remote.
///
/// This is the fleet's own identifier, not the wire-level WebDriver session
/// id; it names the session in logs, scratch-directory paths, and cleanup
/// reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Mints a fresh random identifier.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// ContextId - One execution context
// ============================================================================

/// Token naming one execution context in the session map.
///
/// Contexts are explicit: a scenario runner passes the same token for the
/// lifetime of one scenario, and a child context gets its own token rather
/// than inheriting the parent's session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(String);

impl ContextId {
    /// Wraps an explicit token, e.g. a scenario name or worker id.
    #[inline]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Mints a random token for callers without a natural name.
    #[must_use]
    pub fn unique() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The token as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContextId {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for ContextId {
    fn from(token: String) -> Self {
        Self(token)
    }
}

// ============================================================================
// Tests
// ============================================================================
