//! Runtime configuration consumed by the session fleet.
//!
//! The fleet does not own configuration: a test runner assembles a
//! [`FleetConfig`] (directly or via [`FleetConfig::from_env`]) and hands it
//! to the [`SessionManager`](crate::manager::SessionManager). The browser
//! identifier stays a raw string here; the factory validates it at session
//! creation so that absent and unrecognized values produce their distinct
//! errors.
//!
//! # Example
//!
//! ```
//! use webdriver_fleet::{FleetConfig, TimeoutPolicy};
//!
//! let config = FleetConfig::new("https://example.test")
//!     .with_browser("chrome")
//!     .with_timeouts(TimeoutPolicy::from_secs(10, 30, 30))
//!     .with_clean_session(true);
//!
//! assert_eq!(config.browser.as_deref(), Some("chrome"));
//! assert!(!config.remote);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Well-known relative root for download scratch directories.
pub const DEFAULT_DOWNLOADS_DIR: &str = "downloads";

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_IMPLICIT_WAIT_SECS: u64 = 10;
const DEFAULT_PAGE_LOAD_SECS: u64 = 30;
const DEFAULT_SCRIPT_SECS: u64 = 30;

// ============================================================================
// TimeoutPolicy - Uniform session timeouts
// ============================================================================

/// The three WebDriver timeouts applied to every new session.
///
/// Local, remote, tracked, and auxiliary sessions all receive the same
/// policy immediately after the session opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Implicit element-wait timeout.
    pub implicit_wait: Duration,
    /// Page-load timeout.
    pub page_load: Duration,
    /// Script execution timeout.
    pub script: Duration,
}

impl TimeoutPolicy {
    /// Creates a policy from explicit durations.
    #[inline]
    #[must_use]
    pub const fn new(implicit_wait: Duration, page_load: Duration, script: Duration) -> Self {
        Self {
            implicit_wait,
            page_load,
            script,
        }
    }

    /// Creates a policy from whole seconds.
    #[inline]
    #[must_use]
    pub const fn from_secs(implicit_wait: u64, page_load: u64, script: u64) -> Self {
        Self::new(
            Duration::from_secs(implicit_wait),
            Duration::from_secs(page_load),
            Duration::from_secs(script),
        )
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::from_secs(
            DEFAULT_IMPLICIT_WAIT_SECS,
            DEFAULT_PAGE_LOAD_SECS,
            DEFAULT_SCRIPT_SECS,
        )
    }
}

// ============================================================================
// FleetConfig - Runner-facing configuration surface
// ============================================================================

/// Everything the manager needs to create sessions on behalf of contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetConfig {
    /// Base URL: initial navigation target and the reload target of
    /// `refresh`.
    pub base_url: String,
    /// Raw browser identifier. Validated by the factory, not here, so that
    /// "absent" and "unrecognized" stay distinguishable.
    pub browser: Option<String>,
    /// Provision against a remote server instead of a local driver.
    pub remote: bool,
    /// Remote server URL, required when `remote` is set.
    pub remote_url: Option<String>,
    /// Timeouts applied to every new session.
    pub timeouts: TimeoutPolicy,
    /// Root under which per-session download scratch directories live.
    pub downloads_root: PathBuf,
    /// Clear cookies immediately after creation, before first use.
    pub clean_session: bool,
}

impl FleetConfig {
    /// Creates a configuration with the given base URL and defaults for
    /// everything else.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            browser: None,
            remote: false,
            remote_url: None,
            timeouts: TimeoutPolicy::default(),
            downloads_root: PathBuf::from(DEFAULT_DOWNLOADS_DIR),
            clean_session: false,
        }
    }

    /// Sets the browser identifier.
    #[inline]
    #[must_use]
    pub fn with_browser(mut self, browser: impl Into<String>) -> Self {
        self.browser = Some(browser.into());
        self
    }

    /// Switches provisioning to the given remote server.
    #[inline]
    #[must_use]
    pub fn with_remote(mut self, remote_url: impl Into<String>) -> Self {
        self.remote = true;
        self.remote_url = Some(remote_url.into());
        self
    }

    /// Sets the timeout policy.
    #[inline]
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: TimeoutPolicy) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Sets the downloads root directory.
    #[inline]
    #[must_use]
    pub fn with_downloads_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.downloads_root = root.into();
        self
    }

    /// Enables or disables clean-session mode.
    #[inline]
    #[must_use]
    pub fn with_clean_session(mut self, clean_session: bool) -> Self {
        self.clean_session = clean_session;
        self
    }

    /// Loads configuration from `FLEET_*` environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `FLEET_BASE_URL` | `http://localhost:8080` |
    /// | `FLEET_BROWSER` | unset |
    /// | `FLEET_REMOTE` | `false` |
    /// | `FLEET_REMOTE_URL` | unset |
    /// | `FLEET_IMPLICIT_WAIT_SECS` | `10` |
    /// | `FLEET_PAGE_LOAD_SECS` | `30` |
    /// | `FLEET_SCRIPT_SECS` | `30` |
    /// | `FLEET_DOWNLOADS_DIR` | `downloads` |
    /// | `FLEET_CLEAN_SESSION` | `false` |
    ///
    /// Unparsable numeric values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env_or("FLEET_BASE_URL", DEFAULT_BASE_URL),
            browser: env_opt("FLEET_BROWSER"),
            remote: env_flag("FLEET_REMOTE"),
            remote_url: env_opt("FLEET_REMOTE_URL"),
            timeouts: TimeoutPolicy::from_secs(
                env_secs("FLEET_IMPLICIT_WAIT_SECS", DEFAULT_IMPLICIT_WAIT_SECS),
                env_secs("FLEET_PAGE_LOAD_SECS", DEFAULT_PAGE_LOAD_SECS),
                env_secs("FLEET_SCRIPT_SECS", DEFAULT_SCRIPT_SECS),
            ),
            downloads_root: PathBuf::from(env_or("FLEET_DOWNLOADS_DIR", DEFAULT_DOWNLOADS_DIR)),
            clean_session: env_flag("FLEET_CLEAN_SESSION"),
        }
    }
}

// ============================================================================
// Environment Helpers
// ============================================================================

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_secs(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

// ============================================================================
// Tests
// ============================================================================
