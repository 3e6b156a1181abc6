//! Live browser session handle.
//!
//! A [`SessionHandle`] owns one WebDriver session end to end: the protocol
//! client, the spawned driver process for locally provisioned sessions, and
//! the per-session download scratch directory. Handles are not `Clone`;
//! shared access goes through `Arc<SessionHandle>` handed out by the
//! manager, so a session is torn down exactly once.
//!
//! # Example
//!
//! ```ignore
//! let handle = provisioner.provision(Browser::Chrome).await?;
//! handle.navigate("http://localhost:8080/login").await?;
//! let png = handle.screenshot_png().await?;
//! let report = handle.close().await;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::process::Child;
use tracing::{debug, info, warn};

use crate::cleanup::CleanupReport;
use crate::client::SessionClient;
use crate::config::TimeoutPolicy;
use crate::error::Result;
use crate::identifiers::{Browser, SessionId};
use crate::upload::FileUploader;

// ============================================================================
// ProcessGuard
// ============================================================================

/// Guards a spawned driver process and ensures it is killed when dropped.
pub(crate) struct ProcessGuard {
    /// The child process handle.
    child: Option<Child>,
    /// Process ID for logging.
    pid: u32,
}

impl ProcessGuard {
    /// Creates a new process guard.
    pub(crate) fn new(child: Child) -> Self {
        let pid = child.id().unwrap_or(0);
        debug!(pid, "Process guard created");
        Self {
            child: Some(child),
            pid,
        }
    }

    /// Kills the process and waits for it to exit.
    ///
    /// The kill failure is returned so teardown can record it; a failed
    /// wait is only logged since the process is already signalled.
    pub(crate) async fn kill(&mut self) -> std::io::Result<()> {
        if let Some(mut child) = self.child.take() {
            debug!(pid = self.pid, "Killing driver process");
            child.kill().await?;
            if let Err(e) = child.wait().await {
                debug!(pid = self.pid, error = %e, "Failed to wait for process");
            }
            info!(pid = self.pid, "Driver process terminated");
        }
        Ok(())
    }

    /// Returns the process ID.
    #[inline]
    pub(crate) fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take()
            && let Err(e) = child.start_kill()
        {
            debug!(pid = self.pid, error = %e, "Failed to send kill signal in Drop");
        }
    }
}

// ============================================================================
// Session Origin
// ============================================================================

/// How a session was provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOrigin {
    /// Driver process spawned on this machine.
    Local,
    /// Session created against a remote WebDriver server.
    Remote,
}

impl SessionOrigin {
    /// Returns the origin as a string slice.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for SessionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Session Handle
// ============================================================================

/// An exclusively owned live browser session.
pub struct SessionHandle {
    /// Unique identifier for this session.
    id: SessionId,
    /// Browser behind the session.
    browser: Browser,
    /// Local or remote provisioning.
    origin: SessionOrigin,
    /// Protocol client for the live session.
    client: Box<dyn SessionClient>,
    /// Driver process, present for local sessions only.
    process: Mutex<Option<ProcessGuard>>,
    /// Scratch directory for downloads, present for local sessions only.
    scratch_dir: Option<PathBuf>,
    /// Outcome of the scratch directory reset at provisioning time.
    scratch_report: CleanupReport,
    /// File staging for remote sessions.
    uploader: Option<FileUploader>,
    /// Driver version reported at resolution time.
    driver_version: Option<String>,
    /// Set once [`SessionHandle::close`] has run.
    closed: AtomicBool,
}

impl SessionHandle {
    /// Assembles a handle around a connected client.
    pub(crate) fn new(
        id: SessionId,
        browser: Browser,
        origin: SessionOrigin,
        client: Box<dyn SessionClient>,
    ) -> Self {
        Self {
            id,
            browser,
            origin,
            client,
            process: Mutex::new(None),
            scratch_dir: None,
            scratch_report: CleanupReport::new(),
            uploader: None,
            driver_version: None,
            closed: AtomicBool::new(false),
        }
    }

    /// Attaches the spawned driver process.
    pub(crate) fn with_process(self, guard: ProcessGuard) -> Self {
        *self.process.lock() = Some(guard);
        self
    }

    /// Attaches the download scratch directory and its reset outcome.
    pub(crate) fn with_scratch(mut self, dir: PathBuf, report: CleanupReport) -> Self {
        self.scratch_dir = Some(dir);
        self.scratch_report = report;
        self
    }

    /// Attaches a file uploader for staging local files to the server.
    pub(crate) fn with_uploader(mut self, uploader: FileUploader) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Attaches the resolved driver version.
    pub(crate) fn with_driver_version(mut self, version: Option<String>) -> Self {
        self.driver_version = version;
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Returns the session identifier.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the browser behind this session.
    #[inline]
    #[must_use]
    pub const fn browser(&self) -> Browser {
        self.browser
    }

    /// Returns how the session was provisioned.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> SessionOrigin {
        self.origin
    }

    /// Returns the per-session download directory, if one was provisioned.
    #[inline]
    #[must_use]
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch_dir.as_deref()
    }

    /// Returns the outcome of the scratch directory reset.
    #[inline]
    #[must_use]
    pub const fn scratch_report(&self) -> &CleanupReport {
        &self.scratch_report
    }

    /// Returns the driver version, when it could be probed.
    #[inline]
    #[must_use]
    pub fn driver_version(&self) -> Option<&str> {
        self.driver_version.as_deref()
    }

    /// Returns `true` once the session has been closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns the PID of the spawned driver process, if any.
    #[must_use]
    pub fn driver_pid(&self) -> Option<u32> {
        self.process.lock().as_ref().map(ProcessGuard::pid)
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Navigates to `url`.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        debug!(session_id = %self.id, url, "Navigating");
        self.client.navigate(url).await
    }

    /// Reloads the current page.
    pub async fn refresh(&self) -> Result<()> {
        debug!(session_id = %self.id, "Refreshing page");
        self.client.refresh().await
    }

    /// Returns the current page URL.
    pub async fn current_url(&self) -> Result<String> {
        self.client.current_url().await
    }

    // ------------------------------------------------------------------------
    // Windows
    // ------------------------------------------------------------------------

    /// Returns all window handles, oldest first.
    pub async fn window_handles(&self) -> Result<Vec<String>> {
        self.client.window_handles().await
    }

    /// Returns the handle of the focused window.
    pub async fn active_window(&self) -> Result<String> {
        self.client.active_window().await
    }

    /// Switches focus to the given window handle.
    pub async fn switch_to_window(&self, handle: &str) -> Result<()> {
        debug!(session_id = %self.id, window = handle, "Switching window");
        self.client.switch_to_window(handle).await
    }

    /// Closes the focused window.
    pub async fn close_window(&self) -> Result<()> {
        self.client.close_window().await
    }

    /// Maximizes the focused window.
    pub async fn maximize_window(&self) -> Result<()> {
        self.client.maximize_window().await
    }

    // ------------------------------------------------------------------------
    // Page State
    // ------------------------------------------------------------------------

    /// Switches back to the top-level browsing context.
    pub async fn enter_default_content(&self) -> Result<()> {
        self.client.enter_default_content().await
    }

    /// Deletes all cookies for the current domain.
    pub async fn delete_all_cookies(&self) -> Result<()> {
        debug!(session_id = %self.id, "Deleting all cookies");
        self.client.delete_all_cookies().await
    }

    /// Returns the names of all visible cookies.
    pub async fn cookie_names(&self) -> Result<Vec<String>> {
        self.client.cookie_names().await
    }

    /// Applies the given timeout policy to the session.
    pub async fn set_timeouts(&self, policy: &TimeoutPolicy) -> Result<()> {
        debug!(
            session_id = %self.id,
            implicit_wait_secs = policy.implicit_wait.as_secs(),
            page_load_secs = policy.page_load.as_secs(),
            script_secs = policy.script.as_secs(),
            "Applying timeout policy"
        );
        self.client.set_timeouts(policy).await
    }

    // ------------------------------------------------------------------------
    // Capture
    // ------------------------------------------------------------------------

    /// Captures a PNG screenshot of the focused window.
    ///
    /// The bytes are returned as delivered by the driver. A decode pass
    /// validates them; bytes that do not decode are still returned, with
    /// a warning, since a truncated capture beats none in a test report.
    pub async fn screenshot_png(&self) -> Result<Vec<u8>> {
        let bytes = self.client.screenshot_png().await?;
        match image::load_from_memory(&bytes) {
            Ok(img) => debug!(
                session_id = %self.id,
                width = img.width(),
                height = img.height(),
                "Screenshot captured"
            ),
            Err(e) => warn!(
                session_id = %self.id,
                error = %e,
                "Screenshot bytes did not decode as an image"
            ),
        }
        Ok(bytes)
    }

    // ------------------------------------------------------------------------
    // File Inputs
    // ------------------------------------------------------------------------

    /// Resolves a file-input value, staging local files to the server.
    ///
    /// When the session carries an uploader and `value` names an existing
    /// local file, the file is zipped, pushed to the WebDriver server, and
    /// the returned server-side path should be typed into the file input
    /// instead. Any other value passes through untouched.
    pub async fn resolve_file_input(&self, value: &str) -> Result<String> {
        if let Some(uploader) = &self.uploader
            && uploader.detect(value)
        {
            let payload = uploader.stage(Path::new(value.trim()))?;
            let remote = self.client.upload_file(&payload).await?;
            info!(
                session_id = %self.id,
                file = %payload.file_name,
                remote = %remote,
                "File staged on WebDriver server"
            );
            return Ok(remote);
        }
        Ok(value.to_string())
    }

    // ------------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------------

    /// Closes the session, quitting the browser and killing the driver
    /// process.
    ///
    /// Never fails: each teardown step is attempted independently and its
    /// outcome recorded in the returned [`CleanupReport`]. Calling `close`
    /// again returns an empty report.
    pub async fn close(&self) -> CleanupReport {
        if self.closed.swap(true, Ordering::SeqCst) {
            return CleanupReport::new();
        }

        let mut report = CleanupReport::new();

        match self.client.quit().await {
            Ok(()) => report.record_completed(),
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "WebDriver quit failed");
                report.record_failure("webdriver session", e.to_string());
            }
        }

        // Take the guard out before awaiting so the lock is not held
        // across the kill.
        let guard = self.process.lock().take();
        if let Some(mut guard) = guard {
            match guard.kill().await {
                Ok(()) => report.record_completed(),
                Err(e) => {
                    warn!(session_id = %self.id, error = %e, "Driver process kill failed");
                    report.record_failure("driver process", e.to_string());
                }
            }
        }

        info!(
            session_id = %self.id,
            browser = %self.browser,
            completed = report.completed(),
            failed = report.failures().len(),
            "Session closed"
        );
        report
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("browser", &self.browser)
            .field("origin", &self.origin)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{ScriptedClient, TINY_PNG};

    fn remote_handle(client: ScriptedClient) -> SessionHandle {
        SessionHandle::new(
            SessionId::new(),
            Browser::Chrome,
            SessionOrigin::Remote,
            Box::new(client),
        )
    }

    #[tokio::test]
    async fn test_navigate_delegates_to_client() {
        let client = ScriptedClient::new();
        let handle = remote_handle(client.clone());

        handle.navigate("http://localhost:8080/login").await.expect("navigate");
        assert_eq!(client.navigations(), 1);
        assert_eq!(
            client.current_url_snapshot().as_deref(),
            Some("http://localhost:8080/login")
        );
    }

    #[tokio::test]
    async fn test_set_timeouts_passes_policy_through() {
        let client = ScriptedClient::new();
        let handle = remote_handle(client.clone());
        let policy = TimeoutPolicy::from_secs(5, 15, 25);

        handle.set_timeouts(&policy).await.expect("set timeouts");
        assert_eq!(client.applied_timeouts(), Some(policy));
    }

    #[tokio::test]
    async fn test_screenshot_returns_driver_bytes() {
        let handle = remote_handle(ScriptedClient::new());

        let bytes = handle.screenshot_png().await.expect("screenshot");
        assert_eq!(bytes, TINY_PNG.to_vec());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let client = ScriptedClient::new();
        let handle = remote_handle(client.clone());

        let first = handle.close().await;
        assert!(first.is_clean());
        assert_eq!(first.completed(), 1);
        assert!(handle.is_closed());
        assert_eq!(client.quit_calls(), 1);

        let second = handle.close().await;
        assert!(second.is_empty());
        assert_eq!(client.quit_calls(), 1);
    }

    #[tokio::test]
    async fn test_close_records_quit_failure() {
        let client = ScriptedClient::new();
        client.fail_quit();
        let handle = remote_handle(client);

        let report = handle.close().await;
        assert!(!report.is_clean());
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].target, "webdriver session");
        assert!(report.failures()[0].message.contains("scripted quit failure"));
    }

    #[tokio::test]
    async fn test_resolve_file_input_passthrough_without_uploader() {
        let handle = remote_handle(ScriptedClient::new());
        let value = handle
            .resolve_file_input("plain text value")
            .await
            .expect("resolve");
        assert_eq!(value, "plain text value");
    }

    #[tokio::test]
    async fn test_resolve_file_input_passthrough_for_non_files() {
        let client = ScriptedClient::new();
        let handle = remote_handle(client.clone()).with_uploader(FileUploader::new());

        let value = handle
            .resolve_file_input("/no/such/file.bin")
            .await
            .expect("resolve");
        assert_eq!(value, "/no/such/file.bin");
        assert!(client.uploads_snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_file_input_stages_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("evidence.txt");
        std::fs::write(&path, b"attachment body").expect("write");

        let client = ScriptedClient::new();
        let handle = remote_handle(client.clone()).with_uploader(FileUploader::new());

        let value = handle
            .resolve_file_input(path.to_str().expect("utf8 path"))
            .await
            .expect("resolve");
        assert_eq!(value, "/remote/uploads/evidence.txt");

        let uploads = client.uploads_snapshot();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].file_name, "evidence.txt");
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(SessionOrigin::Local.to_string(), "local");
        assert_eq!(SessionOrigin::Remote.to_string(), "remote");
    }

    #[test]
    fn test_debug_omits_client() {
        let handle = remote_handle(ScriptedClient::new());
        let debug = format!("{:?}", handle);
        assert!(debug.contains("SessionHandle"));
        assert!(debug.contains("browser"));
        assert!(!debug.contains("Scripted"));
    }
}
