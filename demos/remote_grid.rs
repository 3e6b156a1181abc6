//! Remote grid session walkthrough.
//!
//! Demonstrates:
//! - Pointing the fleet at a Selenium Grid
//! - Concurrent sessions for several execution contexts
//! - Per-context isolation under concurrent use
//! - Shutting everything down with one merged report
//!
//! Requires a running grid, e.g.:
//!   docker run -p 4444:4444 --shm-size=2g selenium/standalone-firefox
//!
//! Usage:
//!   cargo run --example remote_grid
//!   FLEET_REMOTE_URL=http://grid:4444/wd/hub cargo run --example remote_grid

// ============================================================================
// Imports
// ============================================================================

use anyhow::{Context, Result};
use futures_util::future::join_all;

use webdriver_fleet::{ContextId, FleetConfig, SessionManager};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webdriver_fleet=info".into()),
        )
        .with_target(false)
        .init();
}

async fn run() -> Result<()> {
    println!("=== Remote Grid Sessions ===\n");

    // ========================================================================
    // Create Manager
    // ========================================================================

    let mut config = FleetConfig::from_env().with_browser("firefox");
    if !config.remote {
        config = config.with_remote("http://localhost:4444/wd/hub");
    }
    println!(
        "[1] Grid endpoint: {}",
        config.remote_url.as_deref().unwrap_or("<unset>")
    );
    let manager = SessionManager::with_defaults(config);

    // ========================================================================
    // Concurrent Sessions
    // ========================================================================

    println!("[2] Creating three concurrent sessions...");
    let contexts: Vec<ContextId> = (1..=3)
        .map(|i| ContextId::from(format!("runner-{i}")))
        .collect();

    let created = join_all(contexts.iter().map(|context| manager.create(context))).await;
    for (context, result) in contexts.iter().zip(&created) {
        match result {
            Ok(session) => println!("    ✓ {context} -> session {}", session.id()),
            Err(e) => println!("    ✗ {context} -> {e}"),
        }
    }
    println!("    {} sessions live", manager.active_count());

    // ========================================================================
    // Independent Navigation
    // ========================================================================

    println!("[3] Navigating each session independently...");
    for context in &contexts {
        if let Some(session) = manager.get(context) {
            let target = format!("{}/health", manager.config().base_url);
            session
                .navigate(&target)
                .await
                .with_context(|| format!("navigating {context}"))?;
            println!("    ✓ {context} at {}", session.current_url().await?);
        }
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    println!("[4] Shutting down...");
    let report = manager.shutdown().await;
    println!("    ✓ {report}");

    Ok(())
}
