//! Local session provisioning.
//!
//! [`LocalProvisioner`] owns the full startup dance for a session on this
//! machine: reset the per-session download scratch directory, resolve the
//! driver binary, spawn it on a free port, wait for it to accept
//! connections, then open the WebDriver session and maximize the window.
//! The spawned process rides along inside the returned [`SessionHandle`]
//! and dies with it.

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::net::{TcpListener, TcpStream};
use tokio::process::Command;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};
use url::Url;

use crate::capabilities::{CapabilityBuilder, CapabilitySet};
use crate::client::Connector;
use crate::error::{Error, Result};
use crate::identifiers::{Browser, SessionId};
use crate::session::{ProcessGuard, SessionHandle, SessionOrigin};

use super::resolver::{DriverResolver, DriverSpec};
use super::scratch;

// ============================================================================
// Constants
// ============================================================================

/// How long to wait for a spawned driver to accept TCP connections.
const DRIVER_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval while waiting for the driver port.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// Local Capability Builders
// ============================================================================

/// Chrome flags for a locally spawned driver.
pub fn local_chrome() -> CapabilitySet {
    CapabilitySet::new(Browser::Chrome).with_browser_arg("--remote-allow-origins=*")
}

/// Firefox capabilities for a locally spawned driver.
pub fn local_firefox() -> CapabilitySet {
    CapabilitySet::new(Browser::Firefox)
}

/// Internet Explorer capabilities for a locally spawned driver.
pub fn local_iexplorer() -> CapabilitySet {
    CapabilitySet::new(Browser::IExplorer)
}

/// Edge capabilities for a locally spawned driver.
pub fn local_edge() -> CapabilitySet {
    CapabilitySet::new(Browser::Edge)
}

// ============================================================================
// Local Provisioner
// ============================================================================

/// Spawns driver processes and opens sessions against them.
pub struct LocalProvisioner {
    /// Finds the driver binary for a browser.
    resolver: Arc<dyn DriverResolver>,
    /// Opens the WebDriver session once the driver is listening.
    connector: Arc<dyn Connector>,
    /// Per-browser capability builders for local sessions.
    launchers: FxHashMap<Browser, CapabilityBuilder>,
    /// Root directory for per-session download scratch directories.
    downloads_root: PathBuf,
}

impl LocalProvisioner {
    /// Creates a provisioner with launchers for every supported browser.
    #[must_use]
    pub fn new(
        resolver: Arc<dyn DriverResolver>,
        connector: Arc<dyn Connector>,
        downloads_root: PathBuf,
    ) -> Self {
        let mut provisioner = Self::empty(resolver, connector, downloads_root);
        provisioner.register_launcher(Browser::Chrome, local_chrome);
        provisioner.register_launcher(Browser::Firefox, local_firefox);
        provisioner.register_launcher(Browser::IExplorer, local_iexplorer);
        provisioner.register_launcher(Browser::Edge, local_edge);
        provisioner
    }

    /// Creates a provisioner with no launchers registered.
    #[must_use]
    pub fn empty(
        resolver: Arc<dyn DriverResolver>,
        connector: Arc<dyn Connector>,
        downloads_root: PathBuf,
    ) -> Self {
        Self {
            resolver,
            connector,
            launchers: FxHashMap::default(),
            downloads_root,
        }
    }

    /// Registers or replaces the capability builder for a browser.
    pub fn register_launcher(&mut self, browser: Browser, builder: CapabilityBuilder) {
        self.launchers.insert(browser, builder);
    }

    /// Returns the root directory for download scratch directories.
    #[inline]
    #[must_use]
    pub fn downloads_root(&self) -> &std::path::Path {
        &self.downloads_root
    }

    /// Provisions a local session for `browser`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBrowser`] when no launcher is
    /// registered, and [`Error::Provisioning`] when the driver cannot be
    /// resolved, spawned, or connected to.
    pub async fn provision(&self, browser: Browser) -> Result<SessionHandle> {
        let builder = self
            .launchers
            .get(&browser)
            .copied()
            .ok_or_else(|| Error::unsupported_browser(browser.as_str()))?;

        let session_id = SessionId::new();
        let scratch_dir = self.downloads_root.join(session_id.to_string());
        let scratch_report = scratch::reset_dir(&scratch_dir);

        let spec = self.resolver.resolve(browser).await?;
        let port = pick_free_port().await?;
        let guard = spawn_driver(&spec, port)?;
        // On failure past this point the guard drops and kills the driver.
        wait_ready(port, DRIVER_READY_TIMEOUT).await?;

        let endpoint = local_endpoint(port)?;
        let client = self
            .connector
            .connect(&endpoint, builder())
            .await
            .map_err(|e| match e {
                Error::Provisioning { .. } => e,
                other => Error::provisioning(format!(
                    "WebDriver handshake with local driver failed: {}",
                    other
                )),
            })?;

        let handle = SessionHandle::new(session_id, browser, SessionOrigin::Local, client)
            .with_process(guard)
            .with_scratch(scratch_dir, scratch_report)
            .with_driver_version(spec.version.clone());
        handle.maximize_window().await?;

        info!(
            session_id = %session_id,
            browser = %browser,
            port,
            driver_version = spec.version.as_deref().unwrap_or("unknown"),
            "Local session provisioned"
        );
        Ok(handle)
    }
}

impl std::fmt::Debug for LocalProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProvisioner")
            .field("downloads_root", &self.downloads_root)
            .field("launchers", &self.launchers.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Driver Startup
// ============================================================================

/// Asks the OS for a free TCP port.
///
/// The listener is dropped before the driver binds, so a collision is
/// possible but unlikely; the handshake surfaces it as a provisioning
/// error either way.
async fn pick_free_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    debug!(port, "Reserved driver port");
    Ok(port)
}

/// The port switch for a driver binary.
///
/// IEDriverServer only understands Windows-style `/switch=value` options;
/// the other drivers follow the chromedriver convention.
fn port_arg(browser: Browser, port: u16) -> String {
    match browser {
        Browser::IExplorer => format!("/port={}", port),
        _ => format!("--port={}", port),
    }
}

/// Spawns the driver binary listening on `port`.
fn spawn_driver(spec: &DriverSpec, port: u16) -> Result<ProcessGuard> {
    debug!(binary = %spec.binary.display(), port, "Spawning driver");
    let child = Command::new(&spec.binary)
        .arg(port_arg(spec.browser, port))
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| {
            Error::provisioning(format!(
                "Failed to launch driver {}: {}",
                spec.binary.display(),
                e
            ))
        })?;
    Ok(ProcessGuard::new(child))
}

/// Polls the driver port until it accepts a connection.
async fn wait_ready(port: u16, limit: Duration) -> Result<()> {
    let probe = async {
        loop {
            match TcpStream::connect(("127.0.0.1", port)).await {
                Ok(_) => return,
                Err(_) => sleep(READY_POLL_INTERVAL).await,
            }
        }
    };
    timeout(limit, probe).await.map_err(|_| {
        Error::provisioning(format!(
            "Driver did not accept connections on port {} within {}s",
            port,
            limit.as_secs()
        ))
    })
}

/// Builds the loopback endpoint URL for a spawned driver.
fn local_endpoint(port: u16) -> Result<Url> {
    let raw = format!("http://127.0.0.1:{}", port);
    Url::parse(&raw).map_err(|e| Error::provisioning(format!("Invalid driver endpoint {}: {}", raw, e)))
}

// ============================================================================
// Tests
// ============================================================================
