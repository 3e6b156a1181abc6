//! Per-context session management.
//!
//! [`SessionManager`] keys live sessions by [`ContextId`], one session per
//! execution context, so concurrent test runs never share a browser. The
//! manager is the lifecycle authority: it creates sessions through the
//! factory, hands out `Arc` references, resets sessions to a known base
//! state between scenarios, and tears everything down without ever
//! letting cleanup failures escape as errors.
//!
//! # Example
//!
//! ```ignore
//! let manager = SessionManager::with_defaults(config);
//! let context = ContextId::from("runner-1");
//!
//! let session = manager.create(&context).await?;
//! session.navigate("http://localhost:8080/login").await?;
//!
//! manager.refresh(&context).await?;
//! let report = manager.delete(&context).await;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::capabilities::CapabilityRegistry;
use crate::cleanup::CleanupReport;
use crate::client::{Connector, WebDriverConnector};
use crate::config::FleetConfig;
use crate::error::Result;
use crate::factory::SessionFactory;
use crate::identifiers::ContextId;
use crate::provision::{DriverResolver, PathResolver};
use crate::session::SessionHandle;

// ============================================================================
// Session Manager
// ============================================================================

/// Tracks one live session per execution context.
pub struct SessionManager {
    /// Shared creation settings.
    config: FleetConfig,
    /// Creates and prepares new sessions.
    factory: SessionFactory,
    /// Live sessions keyed by context.
    ///
    /// The lock is never held across an await; handles are cloned out
    /// and awaited on afterwards.
    sessions: Mutex<FxHashMap<ContextId, Arc<SessionHandle>>>,
}

impl SessionManager {
    /// Creates a manager with every seam supplied explicitly.
    #[must_use]
    pub fn new(
        config: FleetConfig,
        registry: CapabilityRegistry,
        connector: Arc<dyn Connector>,
        resolver: Arc<dyn DriverResolver>,
    ) -> Self {
        let factory = SessionFactory::new(Arc::new(registry), connector, resolver, config.clone());
        Self {
            config,
            factory,
            sessions: Mutex::new(FxHashMap::default()),
        }
    }

    /// Creates a manager wired to the real WebDriver stack.
    ///
    /// Uses the default capability strategies, the HTTP connector, and
    /// `PATH`-based driver resolution.
    #[must_use]
    pub fn with_defaults(config: FleetConfig) -> Self {
        Self::new(
            config,
            CapabilityRegistry::new(),
            Arc::new(WebDriverConnector::new()),
            Arc::new(PathResolver::new()),
        )
    }

    /// Returns the configuration the manager was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Returns the number of live tracked sessions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Returns the contexts that currently hold a session.
    #[must_use]
    pub fn contexts(&self) -> Vec<ContextId> {
        self.sessions.lock().keys().cloned().collect()
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Creates a session for `context` and tracks it.
    ///
    /// The new session is fully prepared before it becomes visible:
    /// timeouts applied, start page open, cookies cleared when clean
    /// session mode is on. If the context already holds a session, the
    /// replacement is provisioned first and the old session closed after
    /// it is displaced, so the context never observes a half-open state.
    ///
    /// # Errors
    ///
    /// Propagates validation, provisioning, and navigation errors; on
    /// any of them the context keeps no session.
    pub async fn create(&self, context: &ContextId) -> Result<Arc<SessionHandle>> {
        let handle = self
            .factory
            .new_instance(
                &self.config.base_url,
                self.config.browser.as_deref(),
                self.config.remote,
            )
            .await?;

        if self.config.clean_session
            && let Err(e) = handle.delete_all_cookies().await
        {
            let report = handle.close().await;
            debug!(
                completed = report.completed(),
                failed = report.failures().len(),
                "Closed session after failed cookie scrub"
            );
            return Err(e);
        }

        let handle = Arc::new(handle);
        let displaced = self
            .sessions
            .lock()
            .insert(context.clone(), handle.clone());
        if let Some(old) = displaced {
            warn!(
                context = %context,
                session_id = %old.id(),
                "Context already held a session, closing it"
            );
            old.close().await.log("displaced session");
        }

        info!(
            context = %context,
            session_id = %handle.id(),
            browser = %handle.browser(),
            "Session created for context"
        );
        Ok(handle)
    }

    /// Returns the live session for `context`, if any.
    #[must_use]
    pub fn get(&self, context: &ContextId) -> Option<Arc<SessionHandle>> {
        self.sessions.lock().get(context).cloned()
    }

    /// Deletes the session for `context`.
    ///
    /// Never fails: teardown problems are recorded in the returned
    /// report, and deleting a context with no session returns an empty
    /// report.
    pub async fn delete(&self, context: &ContextId) -> CleanupReport {
        let removed = self.sessions.lock().remove(context);
        match removed {
            Some(handle) => {
                debug!(context = %context, session_id = %handle.id(), "Deleting session");
                handle.close().await
            }
            None => {
                debug!(context = %context, "No session to delete");
                CleanupReport::new()
            }
        }
    }

    /// Resets the session for `context` to a known base state.
    ///
    /// Closes every window except the first, switches back to it,
    /// returns to the top-level browsing context, clears cookies, and
    /// reloads the base URL. A context with no session is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates WebDriver errors from the live session; the session
    /// stays tracked either way.
    pub async fn refresh(&self, context: &ContextId) -> Result<()> {
        let Some(handle) = self.get(context) else {
            debug!(context = %context, "No session to refresh");
            return Ok(());
        };

        let windows = handle.window_handles().await?;
        if let Some((primary, extras)) = windows.split_first() {
            for extra in extras {
                handle.switch_to_window(extra).await?;
                handle.close_window().await?;
            }
            // Always land on the primary window explicitly, even when
            // nothing was closed.
            handle.switch_to_window(primary).await?;
        }

        handle.enter_default_content().await?;
        handle.delete_all_cookies().await?;
        handle.navigate(&self.config.base_url).await?;

        info!(
            context = %context,
            session_id = %handle.id(),
            closed_windows = windows.len().saturating_sub(1),
            "Session reset to base state"
        );
        Ok(())
    }

    /// Creates an untracked auxiliary session.
    ///
    /// The caller owns the handle and is responsible for closing it;
    /// [`SessionManager::shutdown`] will not find it. Navigates to `url`
    /// when given, otherwise to the base URL.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`SessionManager::create`].
    pub async fn auxiliary(&self, url: Option<&str>) -> Result<SessionHandle> {
        let target = url.unwrap_or(&self.config.base_url);
        let handle = self
            .factory
            .new_instance(target, self.config.browser.as_deref(), self.config.remote)
            .await?;

        if self.config.clean_session
            && let Err(e) = handle.delete_all_cookies().await
        {
            let report = handle.close().await;
            debug!(
                completed = report.completed(),
                failed = report.failures().len(),
                "Closed auxiliary session after failed cookie scrub"
            );
            return Err(e);
        }

        info!(session_id = %handle.id(), url = target, "Auxiliary session created");
        Ok(handle)
    }

    /// Closes every tracked session.
    ///
    /// Sessions are closed concurrently and their reports merged. Never
    /// fails; an empty manager returns an empty report.
    pub async fn shutdown(&self) -> CleanupReport {
        let drained: Vec<(ContextId, Arc<SessionHandle>)> =
            self.sessions.lock().drain().collect();
        if drained.is_empty() {
            return CleanupReport::new();
        }

        info!(sessions = drained.len(), "Shutting down all sessions");
        let reports = join_all(drained.iter().map(|(_, handle)| handle.close())).await;

        let mut merged = CleanupReport::new();
        for report in reports {
            merged.merge(report);
        }
        merged.log("manager shutdown");
        merged
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .field("active", &self.active_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
