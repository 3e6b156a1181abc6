//! WebDriver Fleet - Per-context browser session lifecycle management.
//!
//! This library keeps one live WebDriver session per execution context, so
//! concurrent test runners each get an isolated browser with its own
//! cookies, windows, and downloads.
//!
//! # Architecture
//!
//! Session creation flows through a fixed pipeline:
//!
//! - **Validate**: browser choice checked before anything is spawned
//! - **Provision**: local driver process or remote WebDriver server
//! - **Prepare**: timeout policy applied, start page opened
//! - **Track**: the [`SessionManager`] maps [`ContextId`] to session
//!
//! Key design principles:
//!
//! - One session per context, never shared between contexts
//! - Teardown never raises; outcomes land in a [`CleanupReport`]
//! - Every seam is a trait: capability strategies, the protocol client,
//!   and driver resolution are all replaceable
//! - A failed initial navigation gets exactly one refresh retry
//!
//! # Quick Start
//!
//! ```no_run
//! use webdriver_fleet::{ContextId, FleetConfig, Result, SessionManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // One manager serves every runner in the process.
//!     let config = FleetConfig::new("http://localhost:8080")
//!         .with_browser("chrome")
//!         .with_remote("http://localhost:4444/wd/hub");
//!     let manager = SessionManager::with_defaults(config);
//!
//!     // Each execution context gets its own browser.
//!     let context = ContextId::from("runner-1");
//!     let session = manager.create(&context).await?;
//!
//!     session.navigate("http://localhost:8080/login").await?;
//!     let png = session.screenshot_png().await?;
//!     println!("captured {} bytes", png.len());
//!
//!     // Back to a known state between scenarios, gone at the end.
//!     manager.refresh(&context).await?;
//!     let report = manager.delete(&context).await;
//!     println!("teardown: {}", report);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`capabilities`] | W3C capability documents and per-browser strategies |
//! | [`cleanup`] | Teardown outcomes as values, never as errors |
//! | [`client`] | Protocol seam: [`SessionClient`], [`Connector`] |
//! | [`config`] | Runner configuration and timeout policy |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`factory`] | Validate, provision, prepare pipeline |
//! | [`identifiers`] | Type-safe browser, session, and context IDs |
//! | [`manager`] | Per-context session tracking |
//! | [`provision`] | Local driver spawning and remote session building |
//! | [`session`] | The exclusively owned live session handle |
//! | [`upload`] | File staging for remote sessions |
//!
//! # Features
//!
//! - **Context isolation**: K runners, K browsers, zero sharing
//! - **Validate first**: bad input fails before a process spawns
//! - **Tolerant teardown**: cleanup failures are reported, not raised
//! - **Both topologies**: spawned local drivers and Selenium Grid

// ============================================================================
// Modules
// ============================================================================

/// W3C capability documents and per-browser strategies.
///
/// [`CapabilitySet`] is the mutable capability document;
/// [`CapabilityRegistry`] maps each browser to its strategy function.
pub mod capabilities;

/// Teardown outcomes as values.
///
/// All cleanup paths aggregate into a [`CleanupReport`] instead of
/// returning errors.
pub mod cleanup;

/// Protocol seam between the fleet and the wire.
///
/// [`SessionClient`] is one live session; [`Connector`] opens them.
/// [`WebDriverConnector`] is the real HTTP implementation.
pub mod client;

/// Runner configuration.
///
/// [`FleetConfig`] carries the base URL, browser choice, topologies,
/// and [`TimeoutPolicy`]; it can be read from the environment.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Session creation pipeline.
///
/// [`SessionFactory`] validates, dispatches to a provisioner, and
/// prepares the new session.
pub mod factory;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing browsers, sessions, and contexts at
/// compile time.
pub mod identifiers;

/// Per-context session tracking.
///
/// [`SessionManager`] is the lifecycle authority callers talk to.
pub mod manager;

/// Session provisioning.
///
/// [`LocalProvisioner`] spawns driver processes;
/// [`RemoteSessionBuilder`] opens sessions on a standing server.
pub mod provision;

/// The live session handle.
///
/// [`SessionHandle`] owns the client, the driver process, and the
/// scratch directory for one session.
pub mod session;

/// File staging for remote sessions.
///
/// [`FileUploader`] zips local files and pushes them to the WebDriver
/// server so file inputs work across machines.
pub mod upload;

// ============================================================================
// Re-exports
// ============================================================================

// Identifier types
pub use identifiers::{Browser, ContextId, SessionId};

// Capability types
pub use capabilities::{CapabilityBuilder, CapabilityRegistry, CapabilitySet};

// Configuration types
pub use config::{FleetConfig, TimeoutPolicy};

// Cleanup types
pub use cleanup::{CleanupFailure, CleanupReport};

// Error types
pub use error::{Error, Result};

// Client seam
pub use client::{Connector, SessionClient, WebDriverConnector};

// Session types
pub use session::{SessionHandle, SessionOrigin};

// Pipeline types
pub use factory::SessionFactory;
pub use manager::SessionManager;

// Provisioning types
pub use provision::{
    DriverResolver, DriverSpec, LocalProvisioner, PathResolver, RemoteSessionBuilder,
};

// Upload types
pub use upload::{FileUploader, UploadPayload};
