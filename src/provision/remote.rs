//! Remote session provisioning.
//!
//! [`RemoteSessionBuilder`] opens sessions against a standing WebDriver
//! server such as a Selenium Grid. Validation is front-loaded: the
//! endpoint is parsed and checked the moment it is supplied, capabilities
//! are resolved through the registry before any network traffic, and
//! [`RemoteSessionBuilder::build`] refuses to run with either piece
//! missing. A bad endpoint therefore fails in microseconds instead of
//! after a connect timeout.
//!
//! # Example
//!
//! ```ignore
//! let handle = RemoteSessionBuilder::new(registry, connector)
//!     .endpoint("http://grid.internal:4444/wd/hub")?
//!     .load_capabilities(Browser::Firefox)?
//!     .build()
//!     .await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::info;
use url::Url;

use crate::capabilities::{CapabilityRegistry, CapabilitySet};
use crate::client::Connector;
use crate::error::{Error, Result};
use crate::identifiers::{Browser, SessionId};
use crate::session::{SessionHandle, SessionOrigin};
use crate::upload::FileUploader;

// ============================================================================
// Remote Session Builder
// ============================================================================

/// Builder for sessions on a remote WebDriver server.
pub struct RemoteSessionBuilder {
    /// Capability strategies keyed by browser.
    registry: Arc<CapabilityRegistry>,
    /// Opens the WebDriver session.
    connector: Arc<dyn Connector>,
    /// Validated server endpoint.
    endpoint: Option<Url>,
    /// Capabilities for the new session.
    capabilities: Option<CapabilitySet>,
}

impl RemoteSessionBuilder {
    /// Creates a builder with nothing configured yet.
    #[must_use]
    pub fn new(registry: Arc<CapabilityRegistry>, connector: Arc<dyn Connector>) -> Self {
        Self {
            registry,
            connector,
            endpoint: None,
            capabilities: None,
        }
    }

    /// Sets and validates the remote server endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] when `raw` is empty, does not
    /// parse as a URL, or has no host.
    pub fn endpoint(mut self, raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(Error::invalid_endpoint(
                raw,
                "endpoint is empty. Provide the remote WebDriver server URL",
            ));
        }
        let url = Url::parse(raw).map_err(|e| Error::invalid_endpoint(raw, e.to_string()))?;
        if url.host().is_none() {
            return Err(Error::invalid_endpoint(raw, "endpoint has no host"));
        }
        self.endpoint = Some(url);
        Ok(self)
    }

    /// Resolves capabilities for `browser` through the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBrowser`] when the registry has no
    /// strategy for `browser`.
    pub fn load_capabilities(mut self, browser: Browser) -> Result<Self> {
        self.capabilities = Some(self.registry.build(browser)?);
        Ok(self)
    }

    /// Sets an explicit capability set, bypassing the registry.
    #[must_use]
    pub fn capabilities(mut self, capabilities: CapabilitySet) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// Opens the session on the remote server.
    ///
    /// The returned handle carries a file uploader, so file inputs naming
    /// paths on this machine are staged onto the server transparently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Precondition`] when the endpoint or capabilities
    /// were never supplied, and [`Error::Provisioning`] when the server
    /// refuses the session.
    pub async fn build(self) -> Result<SessionHandle> {
        let endpoint = self.endpoint.ok_or_else(|| {
            Error::precondition("Remote endpoint is not set. Call .endpoint() before .build()")
        })?;
        let capabilities = self.capabilities.ok_or_else(|| {
            Error::precondition(
                "Capabilities are not loaded. Call .load_capabilities() before .build()",
            )
        })?;

        let browser = capabilities.browser();
        let session_id = SessionId::new();
        let client = self
            .connector
            .connect(&endpoint, capabilities)
            .await
            .map_err(|e| match e {
                Error::Provisioning { .. } => e,
                other => Error::provisioning(format!(
                    "Remote session on {} could not be created: {}",
                    endpoint, other
                )),
            })?;

        info!(
            session_id = %session_id,
            browser = %browser,
            endpoint = %endpoint,
            "Remote session provisioned"
        );
        Ok(
            SessionHandle::new(session_id, browser, SessionOrigin::Remote, client)
                .with_uploader(FileUploader::new()),
        )
    }
}

impl fmt::Debug for RemoteSessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSessionBuilder")
            .field("endpoint", &self.endpoint)
            .field("capabilities", &self.capabilities.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{ScriptedClient, ScriptedConnector};

    fn builder_parts() -> (Arc<CapabilityRegistry>, Arc<ScriptedConnector>) {
        (
            Arc::new(CapabilityRegistry::new()),
            Arc::new(ScriptedConnector::new()),
        )
    }

    #[tokio::test]
    async fn test_empty_endpoint_fails_before_any_network() {
        let (registry, connector) = builder_parts();

        let err = RemoteSessionBuilder::new(registry, connector.clone())
            .endpoint("   ")
            .expect_err("empty endpoint");
        assert!(err.is_invalid_endpoint());
        assert!(err.to_string().contains("endpoint is empty"));
        assert_eq!(connector.connects(), 0);
    }

    #[test]
    fn test_unparsable_endpoint_is_rejected() {
        let (registry, connector) = builder_parts();

        let err = RemoteSessionBuilder::new(registry, connector)
            .endpoint("not a url at all")
            .expect_err("unparsable endpoint");
        assert!(err.is_invalid_endpoint());
    }

    #[test]
    fn test_hostless_endpoint_is_rejected() {
        let (registry, connector) = builder_parts();

        let err = RemoteSessionBuilder::new(registry, connector)
            .endpoint("unix:/var/run/driver.sock")
            .expect_err("no host");
        assert!(err.is_invalid_endpoint());
        assert!(err.to_string().contains("no host"));
    }

    #[tokio::test]
    async fn test_build_requires_endpoint() {
        let (registry, connector) = builder_parts();

        let err = RemoteSessionBuilder::new(registry, connector)
            .load_capabilities(Browser::Chrome)
            .expect("capabilities")
            .build()
            .await
            .expect_err("endpoint missing");
        assert!(matches!(err, Error::Precondition { .. }));
        assert!(err.to_string().contains(".endpoint()"));
    }

    #[tokio::test]
    async fn test_build_requires_capabilities() {
        let (registry, connector) = builder_parts();

        let err = RemoteSessionBuilder::new(registry, connector)
            .endpoint("http://localhost:4444")
            .expect("endpoint")
            .build()
            .await
            .expect_err("capabilities missing");
        assert!(matches!(err, Error::Precondition { .. }));
        assert!(err.to_string().contains(".load_capabilities()"));
    }

    #[test]
    fn test_load_capabilities_respects_registry() {
        let registry = Arc::new(CapabilityRegistry::empty());
        let connector = Arc::new(ScriptedConnector::new());

        let err = RemoteSessionBuilder::new(registry, connector)
            .load_capabilities(Browser::Edge)
            .expect_err("empty registry");
        assert!(err.is_unsupported_browser());
    }

    #[tokio::test]
    async fn test_build_opens_session_with_registry_capabilities() {
        let (registry, connector) = builder_parts();
        connector.prepare(ScriptedClient::new());

        let handle = RemoteSessionBuilder::new(registry, connector.clone())
            .endpoint("http://grid.internal:4444/wd/hub")
            .expect("endpoint")
            .load_capabilities(Browser::Firefox)
            .expect("capabilities")
            .build()
            .await
            .expect("build");

        assert_eq!(handle.browser(), Browser::Firefox);
        assert_eq!(handle.origin(), SessionOrigin::Remote);
        assert_eq!(connector.connects(), 1);
        // Window geometry is the capability document's business on a grid.
        let client = connector.last_client().expect("client handed out");
        assert!(!client.was_maximized());
        assert_eq!(
            connector.endpoints_seen(),
            vec!["http://grid.internal:4444/wd/hub".to_string()]
        );

        let documents = connector.documents_seen();
        assert_eq!(documents.len(), 1);
        assert_eq!(
            documents[0].get("browserName").and_then(|v| v.as_str()),
            Some("firefox")
        );
    }

    #[tokio::test]
    async fn test_built_handle_stages_file_inputs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").expect("write");

        let (registry, connector) = builder_parts();
        connector.prepare(ScriptedClient::new());

        let handle = RemoteSessionBuilder::new(registry, connector.clone())
            .endpoint("http://localhost:4444")
            .expect("endpoint")
            .load_capabilities(Browser::Chrome)
            .expect("capabilities")
            .build()
            .await
            .expect("build");

        let value = handle
            .resolve_file_input(path.to_str().expect("utf8 path"))
            .await
            .expect("resolve");
        assert_eq!(value, "/remote/uploads/report.pdf");

        let client = connector.last_client().expect("client handed out");
        assert_eq!(client.uploads_snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_surfaces_as_provisioning() {
        let (registry, connector) = builder_parts();
        connector.fail_next_connects(1);

        let err = RemoteSessionBuilder::new(registry, connector)
            .endpoint("http://localhost:4444")
            .expect("endpoint")
            .load_capabilities(Browser::Chrome)
            .expect("capabilities")
            .build()
            .await
            .expect_err("scripted connect failure");
        assert!(err.is_provisioning());
    }

    #[test]
    fn test_explicit_capabilities_bypass_registry() {
        let registry = Arc::new(CapabilityRegistry::empty());
        let connector = Arc::new(ScriptedConnector::new());

        let builder = RemoteSessionBuilder::new(registry, connector)
            .capabilities(CapabilitySet::new(Browser::Edge));
        assert!(format!("{:?}", builder).contains("capabilities: true"));
    }
}
