//! Scripted in-memory transport for lifecycle tests.
//!
//! [`ScriptedClient`] mimics one open session: windows, cookies, the
//! current URL, applied timeouts. Failures are injected per call site
//! (`fail_next_navigations`, `fail_quit`, ...) so tests can drive the
//! recovery paths deterministically. The client is `Clone` over shared
//! state: tests keep one copy for assertions while the lifecycle layer
//! owns the boxed twin.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use url::Url;

use crate::capabilities::CapabilitySet;
use crate::client::{Connector, SessionClient};
use crate::config::TimeoutPolicy;
use crate::error::{Error, Result};
use crate::identifiers::Browser;
use crate::upload::UploadPayload;

// ============================================================================
// Constants
// ============================================================================

/// A valid 1x1 transparent PNG, returned by scripted screenshots.
pub(crate) const TINY_PNG: [u8; 67] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

// ============================================================================
// ScriptedClient - One fake session
// ============================================================================

#[derive(Debug, Default)]
struct ScriptedState {
    windows: Mutex<Vec<String>>,
    active_window: Mutex<String>,
    cookies: Mutex<Vec<String>>,
    current_url: Mutex<Option<String>>,
    requested_url: Mutex<Option<String>>,
    timeouts: Mutex<Option<TimeoutPolicy>>,
    uploads: Mutex<Vec<UploadPayload>>,
    nav_failures: AtomicUsize,
    refresh_failures: AtomicUsize,
    navigations: AtomicUsize,
    refreshes: AtomicUsize,
    frame_resets: AtomicUsize,
    quit_calls: AtomicUsize,
    maximized: AtomicBool,
    fail_quit: AtomicBool,
}

/// Scripted [`SessionClient`] with injectable failures.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedClient {
    state: Arc<ScriptedState>,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedClient {
    /// A fresh session with one window and no cookies.
    pub(crate) fn new() -> Self {
        let state = ScriptedState {
            windows: Mutex::new(vec!["w-0".to_string()]),
            active_window: Mutex::new("w-0".to_string()),
            ..ScriptedState::default()
        };
        Self {
            state: Arc::new(state),
        }
    }

    // ========================================================================
    // Scripting
    // ========================================================================

    /// The next `count` navigations fail.
    pub(crate) fn fail_next_navigations(&self, count: usize) {
        self.state.nav_failures.store(count, Ordering::SeqCst);
    }

    /// The next `count` refreshes fail.
    pub(crate) fn fail_next_refreshes(&self, count: usize) {
        self.state.refresh_failures.store(count, Ordering::SeqCst);
    }

    /// Every quit fails.
    pub(crate) fn fail_quit(&self) {
        self.state.fail_quit.store(true, Ordering::SeqCst);
    }

    /// Replaces the window list; the first label becomes active.
    pub(crate) fn with_windows(&self, labels: &[&str]) {
        let mut windows = self.state.windows.lock();
        *windows = labels.iter().map(|l| (*l).to_string()).collect();
        let mut active = self.state.active_window.lock();
        *active = labels.first().map_or_else(String::new, |l| (*l).to_string());
    }

    /// Seeds cookie names.
    pub(crate) fn with_cookies(&self, names: &[&str]) {
        let mut cookies = self.state.cookies.lock();
        *cookies = names.iter().map(|n| (*n).to_string()).collect();
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub(crate) fn navigations(&self) -> usize {
        self.state.navigations.load(Ordering::SeqCst)
    }

    pub(crate) fn refreshes(&self) -> usize {
        self.state.refreshes.load(Ordering::SeqCst)
    }

    pub(crate) fn frame_resets(&self) -> usize {
        self.state.frame_resets.load(Ordering::SeqCst)
    }

    pub(crate) fn quit_calls(&self) -> usize {
        self.state.quit_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn was_maximized(&self) -> bool {
        self.state.maximized.load(Ordering::SeqCst)
    }

    pub(crate) fn windows_snapshot(&self) -> Vec<String> {
        self.state.windows.lock().clone()
    }

    pub(crate) fn active_window_snapshot(&self) -> String {
        self.state.active_window.lock().clone()
    }

    pub(crate) fn cookies_snapshot(&self) -> Vec<String> {
        self.state.cookies.lock().clone()
    }

    pub(crate) fn current_url_snapshot(&self) -> Option<String> {
        self.state.current_url.lock().clone()
    }

    pub(crate) fn applied_timeouts(&self) -> Option<TimeoutPolicy> {
        *self.state.timeouts.lock()
    }

    pub(crate) fn uploads_snapshot(&self) -> Vec<UploadPayload> {
        self.state.uploads.lock().clone()
    }

    fn take_scripted_failure(&self, counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl SessionClient for ScriptedClient {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.state.navigations.fetch_add(1, Ordering::SeqCst);
        *self.state.requested_url.lock() = Some(url.to_string());
        if self.take_scripted_failure(&self.state.nav_failures) {
            return Err(Error::session("scripted navigation failure"));
        }
        *self.state.current_url.lock() = Some(url.to_string());
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        self.state.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.take_scripted_failure(&self.state.refresh_failures) {
            return Err(Error::session("scripted refresh failure"));
        }
        // A refresh re-requests the last navigation target.
        let requested = self.state.requested_url.lock().clone();
        if let Some(url) = requested {
            *self.state.current_url.lock() = Some(url);
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self
            .state
            .current_url
            .lock()
            .clone()
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn window_handles(&self) -> Result<Vec<String>> {
        Ok(self.state.windows.lock().clone())
    }

    async fn active_window(&self) -> Result<String> {
        Ok(self.state.active_window.lock().clone())
    }

    async fn switch_to_window(&self, handle: &str) -> Result<()> {
        let windows = self.state.windows.lock();
        if !windows.iter().any(|w| w == handle) {
            return Err(Error::session(format!("no such window: {handle}")));
        }
        drop(windows);
        *self.state.active_window.lock() = handle.to_string();
        Ok(())
    }

    async fn close_window(&self) -> Result<()> {
        let active = self.state.active_window.lock().clone();
        let mut windows = self.state.windows.lock();
        windows.retain(|w| w != &active);
        drop(windows);
        *self.state.active_window.lock() = String::new();
        Ok(())
    }

    async fn maximize_window(&self) -> Result<()> {
        self.state.maximized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn enter_default_content(&self) -> Result<()> {
        self.state.frame_resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_all_cookies(&self) -> Result<()> {
        self.state.cookies.lock().clear();
        Ok(())
    }

    async fn cookie_names(&self) -> Result<Vec<String>> {
        Ok(self.state.cookies.lock().clone())
    }

    async fn set_timeouts(&self, policy: &TimeoutPolicy) -> Result<()> {
        *self.state.timeouts.lock() = Some(*policy);
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        Ok(TINY_PNG.to_vec())
    }

    async fn upload_file(&self, payload: &UploadPayload) -> Result<String> {
        self.state.uploads.lock().push(payload.clone());
        Ok(format!("/remote/uploads/{}", payload.file_name))
    }

    async fn quit(&self) -> Result<()> {
        self.state.quit_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_quit.load(Ordering::SeqCst) {
            return Err(Error::session("scripted quit failure"));
        }
        Ok(())
    }
}

// ============================================================================
// ScriptedConnector - Hands out scripted clients
// ============================================================================

/// Scripted [`Connector`]: hands out prepared clients in order, fresh ones
/// when none are prepared, and records everything it saw.
#[derive(Debug, Default)]
pub(crate) struct ScriptedConnector {
    prepared: Mutex<VecDeque<ScriptedClient>>,
    handed_out: Mutex<Vec<ScriptedClient>>,
    endpoints: Mutex<Vec<String>>,
    browsers: Mutex<Vec<Browser>>,
    documents: Mutex<Vec<Map<String, Value>>>,
    connects: AtomicUsize,
    connect_failures: AtomicUsize,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues a client to hand out on the next connect.
    pub(crate) fn prepare(&self, client: ScriptedClient) {
        self.prepared.lock().push_back(client);
    }

    /// The next `count` connects fail.
    pub(crate) fn fail_next_connects(&self, count: usize) {
        self.connect_failures.store(count, Ordering::SeqCst);
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn endpoints_seen(&self) -> Vec<String> {
        self.endpoints.lock().clone()
    }

    pub(crate) fn browsers_seen(&self) -> Vec<Browser> {
        self.browsers.lock().clone()
    }

    pub(crate) fn documents_seen(&self) -> Vec<Map<String, Value>> {
        self.documents.lock().clone()
    }

    pub(crate) fn clients(&self) -> Vec<ScriptedClient> {
        self.handed_out.lock().clone()
    }

    pub(crate) fn last_client(&self) -> Option<ScriptedClient> {
        self.handed_out.lock().last().cloned()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(
        &self,
        endpoint: &Url,
        capabilities: CapabilitySet,
    ) -> Result<Box<dyn SessionClient>> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let failures = &self.connect_failures;
        if failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::provisioning("scripted connect failure"));
        }

        self.endpoints.lock().push(endpoint.to_string());
        self.browsers.lock().push(capabilities.browser());
        self.documents.lock().push(capabilities.into_document());

        let client = self
            .prepared
            .lock()
            .pop_front()
            .unwrap_or_else(ScriptedClient::new);
        self.handed_out.lock().push(client.clone());
        Ok(Box::new(client))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_navigation_failures_decrement() {
        let client = ScriptedClient::new();
        client.fail_next_navigations(1);

        assert!(client.navigate("https://example.test").await.is_err());
        assert!(client.navigate("https://example.test").await.is_ok());
        assert_eq!(client.navigations(), 2);
        assert_eq!(
            client.current_url_snapshot().as_deref(),
            Some("https://example.test")
        );
    }

    #[tokio::test]
    async fn test_refresh_recovers_requested_url() {
        let client = ScriptedClient::new();
        client.fail_next_navigations(1);

        assert!(client.navigate("https://example.test").await.is_err());
        assert_eq!(client.current_url_snapshot(), None);

        client.refresh().await.expect("refresh");
        assert_eq!(
            client.current_url_snapshot().as_deref(),
            Some("https://example.test")
        );
    }

    #[tokio::test]
    async fn test_connector_hands_out_prepared_clients_in_order() {
        let connector = ScriptedConnector::new();
        let first = ScriptedClient::new();
        first.with_cookies(&["marker"]);
        connector.prepare(first);

        let endpoint = Url::parse("http://localhost:9515").expect("url");
        let caps = CapabilitySet::new(Browser::Chrome);
        let handed = connector.connect(&endpoint, caps).await.expect("connect");
        assert_eq!(handed.cookie_names().await.expect("cookies"), vec!["marker"]);

        assert_eq!(connector.connects(), 1);
        assert_eq!(connector.browsers_seen(), vec![Browser::Chrome]);
        assert_eq!(connector.endpoints_seen(), vec!["http://localhost:9515/"]);
    }

    #[tokio::test]
    async fn test_connect_failure_is_provisioning() {
        let connector = ScriptedConnector::new();
        connector.fail_next_connects(1);
        let endpoint = Url::parse("http://localhost:9515").expect("url");

        let err = connector
            .connect(&endpoint, CapabilitySet::new(Browser::Edge))
            .await
            .err()
            .expect("connect should fail");
        assert!(err.is_provisioning());
        assert_eq!(connector.connects(), 1);
    }
}
