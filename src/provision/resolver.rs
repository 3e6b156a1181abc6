//! Driver binary discovery.
//!
//! Local provisioning needs a WebDriver executable for the requested
//! browser before it can spawn anything. [`DriverResolver`] is the seam:
//! the default [`PathResolver`] looks the binary up on `PATH` and probes
//! its version, while tests substitute a scripted resolver.

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::identifiers::Browser;

// ============================================================================
// Driver Spec
// ============================================================================

/// A resolved driver binary, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSpec {
    /// Browser the driver speaks for.
    pub browser: Browser,
    /// Absolute path to the driver executable.
    pub binary: PathBuf,
    /// Version string reported by the binary, when it could be probed.
    pub version: Option<String>,
}

// ============================================================================
// Resolver Trait
// ============================================================================

/// Locates the WebDriver executable for a browser.
#[async_trait]
pub trait DriverResolver: Send + Sync {
    /// Resolves the driver binary for `browser`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provisioning`] when no usable binary can be found.
    async fn resolve(&self, browser: Browser) -> Result<DriverSpec>;
}

// ============================================================================
// Path Resolver
// ============================================================================

/// Resolves driver binaries from the process `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver;

impl PathResolver {
    /// Creates a new `PATH`-based resolver.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DriverResolver for PathResolver {
    async fn resolve(&self, browser: Browser) -> Result<DriverSpec> {
        let name = driver_binary(browser);
        let binary = which::which(name).map_err(|e| {
            Error::provisioning(format!(
                "Driver binary {} for {} not found: {}. Install it or add it to PATH",
                name, browser, e
            ))
        })?;

        let version = probe_version(&binary).await;
        info!(
            browser = %browser,
            binary = %binary.display(),
            version = version.as_deref().unwrap_or("unknown"),
            "Driver binary resolved"
        );

        Ok(DriverSpec {
            browser,
            binary,
            version,
        })
    }
}

/// Conventional executable name of the driver for each browser.
#[must_use]
pub const fn driver_binary(browser: Browser) -> &'static str {
    match browser {
        Browser::Chrome => "chromedriver",
        Browser::Firefox => "geckodriver",
        Browser::IExplorer => "IEDriverServer",
        Browser::Edge => "msedgedriver",
    }
}

/// Runs `<binary> --version` and extracts a dotted version number.
///
/// Probe failures are tolerated; the version is advisory.
async fn probe_version(binary: &Path) -> Option<String> {
    let output = match Command::new(binary).arg("--version").output().await {
        Ok(output) => output,
        Err(e) => {
            debug!(binary = %binary.display(), error = %e, "Version probe failed");
            return None;
        }
    };
    extract_version(&String::from_utf8_lossy(&output.stdout))
}

/// Pulls the first dotted version number out of probe output.
fn extract_version(text: &str) -> Option<String> {
    let pattern = Regex::new(r"\d+\.\d+(?:\.\d+)*").ok()?;
    pattern.find(text).map(|m| m.as_str().to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_binary_names() {
        assert_eq!(driver_binary(Browser::Chrome), "chromedriver");
        assert_eq!(driver_binary(Browser::Firefox), "geckodriver");
        assert_eq!(driver_binary(Browser::IExplorer), "IEDriverServer");
        assert_eq!(driver_binary(Browser::Edge), "msedgedriver");
    }

    #[test]
    fn test_extract_version_from_chromedriver_banner() {
        let text = "ChromeDriver 124.0.6367.91 (abcdef-refs/branch-heads/6367@{#1})";
        assert_eq!(extract_version(text).as_deref(), Some("124.0.6367.91"));
    }

    #[test]
    fn test_extract_version_from_geckodriver_banner() {
        let text = "geckodriver 0.34.0 (c44f0d09630a 2024-01-02)";
        assert_eq!(extract_version(text).as_deref(), Some("0.34.0"));
    }

    #[test]
    fn test_extract_version_without_number() {
        assert_eq!(extract_version("no version here"), None);
        assert_eq!(extract_version(""), None);
    }
}
