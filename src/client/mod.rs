//! The WebDriver transport seam.
//!
//! The lifecycle layer never talks to thirtyfour directly; it goes through
//! [`SessionClient`] (operations on one open session) and [`Connector`]
//! (opening sessions against an endpoint). That keeps provisioning, the
//! factory, and the manager testable against a scripted in-memory client,
//! with the real transport confined to one adapter.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`webdriver`] | Production client and connector on thirtyfour |
//!
//! Test builds additionally compile a scripted client with injectable
//! failures under `client::mock`.

// ============================================================================
// Submodules
// ============================================================================

/// Production client and connector backed by thirtyfour.
pub mod webdriver;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use webdriver::{WebDriverClient, WebDriverConnector};

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use url::Url;

use crate::capabilities::CapabilitySet;
use crate::config::TimeoutPolicy;
use crate::error::Result;
use crate::upload::UploadPayload;

// ============================================================================
// SessionClient - Operations on one open session
// ============================================================================

/// Operations the lifecycle layer performs on one open WebDriver session.
///
/// Every method fails with [`Error::Session`](crate::Error::Session) once
/// the session has been quit.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Loads a URL in the current window.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Re-requests the current page.
    async fn refresh(&self) -> Result<()>;

    /// The URL the current window is on.
    async fn current_url(&self) -> Result<String>;

    /// Every open window handle, oldest first.
    async fn window_handles(&self) -> Result<Vec<String>>;

    /// The handle of the window commands currently target.
    async fn active_window(&self) -> Result<String>;

    /// Targets commands at the given window.
    async fn switch_to_window(&self, handle: &str) -> Result<()>;

    /// Closes the window commands currently target.
    async fn close_window(&self) -> Result<()>;

    /// Maximizes the current window.
    async fn maximize_window(&self) -> Result<()>;

    /// Switches back to top-level page content.
    async fn enter_default_content(&self) -> Result<()>;

    /// Deletes every cookie visible to the session.
    async fn delete_all_cookies(&self) -> Result<()>;

    /// The names of the cookies visible to the session.
    async fn cookie_names(&self) -> Result<Vec<String>>;

    /// Applies the three WebDriver timeouts.
    async fn set_timeouts(&self, policy: &TimeoutPolicy) -> Result<()>;

    /// Captures the current window as PNG bytes.
    async fn screenshot_png(&self) -> Result<Vec<u8>>;

    /// Pushes a staged file to the remote end, returning the remote path.
    async fn upload_file(&self, payload: &UploadPayload) -> Result<String>;

    /// Ends the session. Safe to call twice; the second call is a no-op.
    async fn quit(&self) -> Result<()>;
}

// ============================================================================
// Connector - Opening sessions
// ============================================================================

/// Opens WebDriver sessions against an endpoint.
///
/// The capability set is consumed: one document, one session.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a session at `endpoint` with the given capabilities.
    async fn connect(
        &self,
        endpoint: &Url,
        capabilities: CapabilitySet,
    ) -> Result<Box<dyn SessionClient>>;
}
