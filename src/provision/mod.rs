//! Session provisioning.
//!
//! Two paths produce a live [`SessionHandle`](crate::session::SessionHandle):
//!
//! | Path | Entry point | What it owns |
//! |------|-------------|--------------|
//! | Local | [`LocalProvisioner`] | driver process, port, scratch directory |
//! | Remote | [`RemoteSessionBuilder`] | endpoint validation, capability staging |
//!
//! Both end in the same [`Connector`](crate::client::Connector) handshake,
//! so everything above this module treats the two kinds of session
//! identically.

// ============================================================================
// Modules
// ============================================================================

/// Local driver spawning and startup.
pub mod local;
/// Remote endpoint validation and session creation.
pub mod remote;
/// Driver binary discovery.
pub mod resolver;
/// Download scratch directory lifecycle.
pub mod scratch;

// ============================================================================
// Re-exports
// ============================================================================

pub use local::LocalProvisioner;
pub use remote::RemoteSessionBuilder;
pub use resolver::{DriverResolver, DriverSpec, PathResolver};
