//! Local Chrome session lifecycle walkthrough.
//!
//! Demonstrates:
//! - Building a FleetConfig from the environment
//! - Creating a tracked session for one execution context
//! - Resetting the session between scenarios
//! - Deleting the session and reading the cleanup report
//!
//! Requires chromedriver on PATH and Chrome installed.
//!
//! Usage:
//!   cargo run --example local_chrome
//!   FLEET_BASE_URL=http://localhost:3000 cargo run --example local_chrome

// ============================================================================
// Imports
// ============================================================================

use anyhow::{Context, Result};

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
                .unwrap_or_else(|_| "webdriver_fleet=debug".into()),
        )
        .with_target(false)
        .init();
}

async fn run() -> Result<()> {
    println!("=== Local Chrome Lifecycle ===\n");

    // ========================================================================
    // Create Manager
    // ========================================================================

    let config = FleetConfig::from_env().with_browser("chrome");
    println!("[1] Creating manager for {}", config.base_url);
    let manager = SessionManager::with_defaults(config);

    // ========================================================================
    // Create Session
    // ========================================================================

    let context = ContextId::from("demo-runner");
    println!("[2] Creating session for context {context}...");
    let session = manager
        .create(&context)
        .await
        .context("creating the demo session")?;
    println!("    ✓ Session {} on {}", session.id(), session.browser());
    if let Some(dir) = session.scratch_dir() {
        println!("    Downloads land in {}", dir.display());
    }

    // ========================================================================
    // Use Session
    // ========================================================================

    println!("[3] Capturing screenshot...");
    let png = session.screenshot_png().await?;
    println!("    ✓ {} bytes of PNG", png.len());

    println!("[4] Resetting to base state...");
    manager.refresh(&context).await?;
    println!("    ✓ Back at {}", session.current_url().await?);

    // ========================================================================
    // Teardown
    // ========================================================================

    println!("[5] Deleting session...");
    let report = manager.delete(&context).await;
    println!("    ✓ Teardown: {report}");

    Ok(())
}
