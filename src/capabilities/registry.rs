//! Per-browser capability strategies and their registry.
//!
//! A strategy is a pure `fn() -> CapabilitySet`: no I/O, no shared state,
//! a fresh document on every call. The registry maps each [`Browser`] to
//! its strategy; re-registering replaces the previous one.
//!
//! Default strategies:
//!
//! | Browser | Requests |
//! |---------|----------|
//! | chrome | headless, extensions and sandbox off, certificate tolerance, 1920x1200 |
//! | firefox | headless, 1920x1200, unhandled prompts dismissed |
//! | iexplorer | persistent hover, zoom ignored, protected-mode domains ignored, window focus, native events off, 45 s attach, clean session, alerts accepted |
//! | edge | platform defaults |
//!
//! # Example
//!
//! ```
//! use webdriver_fleet::Browser;
//! use webdriver_fleet::capabilities::{CapabilityRegistry, CapabilitySet};
//!
//! fn kiosk_chrome() -> CapabilitySet {
//!     CapabilitySet::new(Browser::Chrome).with_browser_arg("--kiosk")
//! }
//!
//! let mut registry = CapabilityRegistry::new();
//! registry.register(Browser::Chrome, kiosk_chrome);
//! assert!(registry.build(Browser::Chrome).unwrap().has_browser_arg("--kiosk"));
//! ```

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde_json::{Map, json};

use crate::capabilities::CapabilitySet;
use crate::error::{Error, Result};
use crate::identifiers::Browser;

// ============================================================================
// Constants
// ============================================================================

const WINDOW_WIDTH: u32 = 1920;
const WINDOW_HEIGHT: u32 = 1200;
const IE_ATTACH_TIMEOUT_MS: u64 = 45_000;

// ============================================================================
// Types
// ============================================================================

/// A capability strategy: pure function, fresh document per call.
pub type CapabilityBuilder = fn() -> CapabilitySet;

/// Registry mapping browsers to their capability strategies.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    strategies: FxHashMap<Browser, CapabilityBuilder>,
}

// ============================================================================
// CapabilityRegistry - Construction
// ============================================================================

impl CapabilityRegistry {
    /// Creates a registry with the default strategy for every browser.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Browser::Chrome, chrome_strategy);
        registry.register(Browser::Firefox, firefox_strategy);
        registry.register(Browser::IExplorer, iexplorer_strategy);
        registry.register(Browser::Edge, edge_strategy);
        registry
    }

    /// Creates a registry with nothing registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            strategies: FxHashMap::default(),
        }
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// CapabilityRegistry - Operations
// ============================================================================

impl CapabilityRegistry {
    /// Associates a browser with a strategy, replacing any previous one.
    pub fn register(&mut self, browser: Browser, builder: CapabilityBuilder) {
        self.strategies.insert(browser, builder);
    }

    /// Looks up the strategy for a browser.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedBrowser`] naming the identifier when nothing is
    /// registered for it.
    pub fn resolve(&self, browser: Browser) -> Result<CapabilityBuilder> {
        self.strategies
            .get(&browser)
            .copied()
            .ok_or_else(|| Error::unsupported_browser(browser.as_str()))
    }

    /// Resolves and invokes the strategy, yielding a fresh document.
    ///
    /// # Errors
    ///
    /// Same as [`CapabilityRegistry::resolve`].
    pub fn build(&self, browser: Browser) -> Result<CapabilitySet> {
        let builder = self.resolve(browser)?;
        Ok(builder())
    }

    /// Whether a strategy is registered for the browser.
    #[inline]
    #[must_use]
    pub fn contains(&self, browser: Browser) -> bool {
        self.strategies.contains_key(&browser)
    }

    /// Number of registered strategies.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether the registry is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

// ============================================================================
// Default Strategies
// ============================================================================

/// Default chrome document: headless with a fixed 1920x1200 geometry,
/// extensions and the sandbox disabled, certificate errors tolerated.
#[must_use]
pub fn chrome_strategy() -> CapabilitySet {
    CapabilitySet::new(Browser::Chrome)
        .with_browser_arg("--headless=new")
        .with_browser_arg("--disable-extensions")
        .with_browser_arg("--no-sandbox")
        .with_browser_arg("--ignore-certificate-errors")
        .with_browser_arg(format!("--window-size={WINDOW_WIDTH},{WINDOW_HEIGHT}"))
        .with_entry("acceptInsecureCerts", json!(true))
}

/// Default firefox document: headless at 1920x1200, unhandled prompts
/// dismissed.
#[must_use]
pub fn firefox_strategy() -> CapabilitySet {
    CapabilitySet::new(Browser::Firefox)
        .with_browser_arg("-headless")
        .with_browser_arg(format!("-width={WINDOW_WIDTH}"))
        .with_browser_arg(format!("-height={WINDOW_HEIGHT}"))
        .with_entry("unhandledPromptBehavior", json!("dismiss"))
}

/// Default iexplorer document: the flakiness-tolerant flag set merged with
/// a map requesting a clean session and alert auto-acceptance.
#[must_use]
pub fn iexplorer_strategy() -> CapabilitySet {
    let mut overrides = Map::new();
    overrides.insert("unhandledPromptBehavior".to_string(), json!("accept"));
    overrides.insert(
        "se:ieOptions".to_string(),
        json!({ "ie.ensureCleanSession": true }),
    );

    CapabilitySet::new(Browser::IExplorer)
        .with_vendor_option("enablePersistentHover", json!(true))
        .with_vendor_option("ignoreZoomSetting", json!(true))
        .with_vendor_option("ignoreProtectedModeSettings", json!(true))
        .with_vendor_option("requireWindowFocus", json!(true))
        .with_vendor_option("nativeEvents", json!(false))
        .with_vendor_option("browserAttachTimeout", json!(IE_ATTACH_TIMEOUT_MS))
        .merge(overrides)
}

/// Default edge document: platform defaults, nothing requested.
#[must_use]
pub fn edge_strategy() -> CapabilitySet {
    CapabilitySet::new(Browser::Edge)
}

// ============================================================================
// Tests
// ============================================================================
