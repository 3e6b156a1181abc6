//! Production transport on thirtyfour.
//!
//! [`WebDriverConnector`] opens sessions by deserializing the capability
//! document straight into thirtyfour's `Capabilities` and handing it to
//! `WebDriver::new`. [`WebDriverClient`] wraps the live driver behind a
//! `RwLock<Option<_>>` so that `quit` can consume it exactly once and every
//! later call reports a closed session instead of panicking.
//!
//! File upload does not go through thirtyfour: the Selenium `se/file`
//! endpoint takes a plain HTTP POST against the session URL, so the client
//! keeps a reqwest handle for it.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::{Value, json};
use thirtyfour::{Capabilities, WebDriver, WindowHandle};
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use crate::capabilities::CapabilitySet;
use crate::client::{Connector, SessionClient};
use crate::config::TimeoutPolicy;
use crate::error::{Error, Result};
use crate::upload::UploadPayload;

// ============================================================================
// WebDriverConnector - Session opener
// ============================================================================

/// Opens thirtyfour sessions; the production [`Connector`].
#[derive(Debug, Clone, Default)]
pub struct WebDriverConnector {
    http: reqwest::Client,
}

impl WebDriverConnector {
    /// Creates a connector with its own HTTP client for upload calls.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Connector for WebDriverConnector {
    async fn connect(
        &self,
        endpoint: &Url,
        capabilities: CapabilitySet,
    ) -> Result<Box<dyn SessionClient>> {
        let browser = capabilities.browser();
        let caps: Capabilities =
            serde_json::from_value(Value::Object(capabilities.into_document()))?;

        let driver = WebDriver::new(endpoint.as_str(), caps).await?;
        let wire_id = driver.session_id().to_string();
        info!(
            browser = %browser,
            endpoint = %endpoint,
            wire_session = %wire_id,
            "WebDriver session opened"
        );

        Ok(Box::new(WebDriverClient {
            driver: RwLock::new(Some(driver)),
            endpoint: endpoint.clone(),
            wire_id,
            http: self.http.clone(),
        }))
    }
}

// ============================================================================
// WebDriverClient - One open session
// ============================================================================

/// One open thirtyfour session; the production [`SessionClient`].
pub struct WebDriverClient {
    driver: RwLock<Option<WebDriver>>,
    endpoint: Url,
    wire_id: String,
    http: reqwest::Client,
}

impl fmt::Debug for WebDriverClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDriverClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("wire_id", &self.wire_id)
            .finish_non_exhaustive()
    }
}

fn session_closed() -> Error {
    Error::session("Session already closed")
}

fn upload_url(endpoint: &Url, wire_id: &str) -> String {
    format!(
        "{}/session/{}/se/file",
        endpoint.as_str().trim_end_matches('/'),
        wire_id
    )
}

#[async_trait]
impl SessionClient for WebDriverClient {
    async fn navigate(&self, url: &str) -> Result<()> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or_else(session_closed)?;
        driver.goto(url).await?;
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or_else(session_closed)?;
        driver.refresh().await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or_else(session_closed)?;
        let url = driver.current_url().await?;
        Ok(url.to_string())
    }

    async fn window_handles(&self) -> Result<Vec<String>> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or_else(session_closed)?;
        let handles = driver.windows().await?;
        Ok(handles.into_iter().map(|h| h.to_string()).collect())
    }

    async fn active_window(&self) -> Result<String> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or_else(session_closed)?;
        let handle = driver.window().await?;
        Ok(handle.to_string())
    }

    async fn switch_to_window(&self, handle: &str) -> Result<()> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or_else(session_closed)?;
        driver
            .switch_to_window(WindowHandle::from(handle.to_string()))
            .await?;
        Ok(())
    }

    async fn close_window(&self) -> Result<()> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or_else(session_closed)?;
        driver.close_window().await?;
        Ok(())
    }

    async fn maximize_window(&self) -> Result<()> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or_else(session_closed)?;
        driver.maximize_window().await?;
        Ok(())
    }

    async fn enter_default_content(&self) -> Result<()> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or_else(session_closed)?;
        driver.enter_default_frame().await?;
        Ok(())
    }

    async fn delete_all_cookies(&self) -> Result<()> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or_else(session_closed)?;
        driver.delete_all_cookies().await?;
        Ok(())
    }

    async fn cookie_names(&self) -> Result<Vec<String>> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or_else(session_closed)?;
        let cookies = driver.get_all_cookies().await?;
        Ok(cookies.into_iter().map(|c| c.name).collect())
    }

    async fn set_timeouts(&self, policy: &TimeoutPolicy) -> Result<()> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or_else(session_closed)?;
        driver
            .set_implicit_wait_timeout(policy.implicit_wait)
            .await?;
        driver.set_page_load_timeout(policy.page_load).await?;
        driver.set_script_timeout(policy.script).await?;
        debug!(
            implicit_ms = policy.implicit_wait.as_millis() as u64,
            page_load_ms = policy.page_load.as_millis() as u64,
            script_ms = policy.script.as_millis() as u64,
            "Timeouts applied"
        );
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or_else(session_closed)?;
        let encoded = driver.screenshot_as_png_base64().await?;
        Base64Standard
            .decode(encoded)
            .map_err(|e| Error::session(format!("Screenshot was not valid base64: {}", e)))
    }

    async fn upload_file(&self, payload: &UploadPayload) -> Result<String> {
        {
            let guard = self.driver.read().await;
            guard.as_ref().ok_or_else(session_closed)?;
        }

        let url = upload_url(&self.endpoint, &self.wire_id);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "file": payload.zip_base64 }))
            .send()
            .await
            .map_err(|e| Error::session(format!("File upload POST failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::session(format!(
                "File upload rejected with status {}",
                status
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::session(format!("File upload response unreadable: {}", e)))?;
        let remote_path = body
            .get("value")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::session("File upload response had no remote path"))?;

        debug!(
            file = %payload.file_name,
            remote_path = %remote_path,
            "Local file delivered to remote end"
        );
        Ok(remote_path.to_string())
    }

    async fn quit(&self) -> Result<()> {
        let mut guard = self.driver.write().await;
        if let Some(driver) = guard.take() {
            driver.quit().await?;
            info!(wire_session = %self.wire_id, "WebDriver session quit");
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_url_plain_endpoint() {
        let endpoint = Url::parse("http://grid.local:4444").expect("url");
        assert_eq!(
            upload_url(&endpoint, "abc123"),
            "http://grid.local:4444/session/abc123/se/file"
        );
    }

    #[test]
    fn test_upload_url_trailing_slash_and_path() {
        let endpoint = Url::parse("http://grid.local:4444/wd/hub/").expect("url");
        assert_eq!(
            upload_url(&endpoint, "abc123"),
            "http://grid.local:4444/wd/hub/session/abc123/se/file"
        );
    }

    #[test]
    fn test_connector_is_debuggable() {
        let connector = WebDriverConnector::new();
        let rendered = format!("{connector:?}");
        assert!(rendered.contains("WebDriverConnector"));
    }
}
