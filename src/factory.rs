//! Session creation pipeline.
//!
//! [`SessionFactory`] is the single door every new session walks through:
//! validate the browser choice, dispatch to local or remote provisioning,
//! apply the timeout policy, then open the start page with a one-shot
//! refresh recovery. Validation runs before anything is spawned or any
//! byte leaves the machine, so a missing or misspelled browser name fails
//! in microseconds with an error naming the offending input.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{debug, warn};

use crate::capabilities::CapabilityRegistry;
use crate::client::Connector;
use crate::config::FleetConfig;
use crate::error::{Error, Result};
use crate::identifiers::Browser;
use crate::provision::{DriverResolver, LocalProvisioner, RemoteSessionBuilder};
use crate::session::SessionHandle;

// ============================================================================
// Session Factory
// ============================================================================

/// Creates fully prepared sessions, local or remote.
pub struct SessionFactory {
    /// Capability strategies for remote sessions.
    registry: Arc<CapabilityRegistry>,
    /// Protocol connector shared by both provisioning paths.
    connector: Arc<dyn Connector>,
    /// Local driver provisioning.
    local: LocalProvisioner,
    /// Timeouts, remote endpoint, downloads root.
    config: FleetConfig,
}

impl SessionFactory {
    /// Creates a factory over the given seams.
    #[must_use]
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        connector: Arc<dyn Connector>,
        resolver: Arc<dyn DriverResolver>,
        config: FleetConfig,
    ) -> Self {
        let local = LocalProvisioner::new(
            resolver,
            connector.clone(),
            config.downloads_root.clone(),
        );
        Self {
            registry,
            connector,
            local,
            config,
        }
    }

    /// Validates a raw browser choice.
    ///
    /// `None`, empty, and whitespace-only inputs count as absent;
    /// anything else must parse as a supported browser name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BrowserMissing`] for absent input and
    /// [`Error::BrowserUnrecognized`] for anything unparsable, with the
    /// offending identifier in the message.
    pub fn validate(browser: Option<&str>) -> Result<Browser> {
        let raw = browser
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or(Error::BrowserMissing)?;
        raw.parse()
    }

    /// Creates a session, applies timeouts, and opens the start page.
    ///
    /// A failed initial navigation is retried once through a page
    /// refresh; if the refresh also fails the half-built session is
    /// closed and a navigation error returned.
    ///
    /// # Errors
    ///
    /// Validation errors surface before any provisioning side effects.
    pub async fn new_instance(
        &self,
        target_url: &str,
        browser: Option<&str>,
        use_remote: bool,
    ) -> Result<SessionHandle> {
        let browser = Self::validate(browser)?;
        debug!(browser = %browser, remote = use_remote, target_url, "Creating session");

        let handle = if use_remote {
            let endpoint = self.config.remote_url.as_deref().unwrap_or_default();
            RemoteSessionBuilder::new(self.registry.clone(), self.connector.clone())
                .endpoint(endpoint)?
                .load_capabilities(browser)?
                .build()
                .await?
        } else {
            self.local.provision(browser).await?
        };

        if let Err(e) = self.prepare(&handle, target_url).await {
            let report = handle.close().await;
            debug!(
                completed = report.completed(),
                failed = report.failures().len(),
                "Closed session after failed startup"
            );
            return Err(e);
        }
        Ok(handle)
    }

    /// Applies the timeout policy and opens the start page.
    async fn prepare(&self, handle: &SessionHandle, target_url: &str) -> Result<()> {
        handle.set_timeouts(&self.config.timeouts).await?;

        if let Err(first) = handle.navigate(target_url).await {
            warn!(
                url = target_url,
                error = %first,
                "Initial navigation failed, refreshing once"
            );
            handle
                .refresh()
                .await
                .map_err(|second| Error::navigation(target_url, second.to_string()))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SessionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFactory")
            .field("registry", &self.registry)
            .field("local", &self.local)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
