//! Capability documents and the strategy registry.
//!
//! A [`CapabilitySet`] is an opaque W3C capability document tied to one
//! [`Browser`]: the `browserName` entry, top-level capabilities, and the
//! browser's vendor section (`goog:chromeOptions`, `moz:firefoxOptions`,
//! `ms:edgeOptions`, `se:ieOptions`). Construction is chained; once built
//! the set is carried opaquely and consumed exactly once when a session is
//! opened.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`registry`] | Per-browser strategy functions and their registry |
//!
//! # Example
//!
//! ```
//! use webdriver_fleet::Browser;
//! use webdriver_fleet::capabilities::CapabilityRegistry;
//!
//! let registry = CapabilityRegistry::new();
//! let caps = registry.build(Browser::Chrome).unwrap();
//! assert!(caps.has_browser_arg("--window-size=1920,1200"));
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Strategy functions and the browser-to-strategy registry.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use registry::{CapabilityBuilder, CapabilityRegistry};

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};

use crate::identifiers::Browser;

// ============================================================================
// CapabilitySet - One W3C capability document
// ============================================================================

/// Capability document for one browser session.
///
/// Deliberately not `Clone`: a set is produced fresh by a strategy function
/// and consumed once by the connector, which keeps capability reuse bugs
/// out of the lifecycle layer.
#[derive(Debug, PartialEq)]
pub struct CapabilitySet {
    browser: Browser,
    document: Map<String, Value>,
}

impl CapabilitySet {
    /// Creates a minimal document: just the W3C `browserName`.
    #[must_use]
    pub fn new(browser: Browser) -> Self {
        let mut document = Map::new();
        document.insert(
            "browserName".to_string(),
            Value::String(browser.wire_name().to_string()),
        );
        Self { browser, document }
    }

    /// The vendor-specific options key for this browser.
    #[inline]
    #[must_use]
    pub const fn vendor_key(&self) -> &'static str {
        match self.browser {
            Browser::Chrome => "goog:chromeOptions",
            Browser::Firefox => "moz:firefoxOptions",
            Browser::IExplorer => "se:ieOptions",
            Browser::Edge => "ms:edgeOptions",
        }
    }

    /// Appends a browser command-line argument.
    ///
    /// Chrome, Firefox and Edge carry an `args` array in their vendor
    /// section. Internet Explorer has no such array; its switches
    /// accumulate in the space-separated `ie.browserCommandLineSwitches`
    /// string.
    #[must_use]
    pub fn with_browser_arg(mut self, arg: impl Into<String>) -> Self {
        let arg = arg.into();
        if self.browser == Browser::IExplorer {
            let section = self.vendor_section_mut();
            let switches = match section.get("ie.browserCommandLineSwitches") {
                Some(Value::String(existing)) if !existing.is_empty() => {
                    format!("{existing} {arg}")
                }
                _ => arg,
            };
            section.insert(
                "ie.browserCommandLineSwitches".to_string(),
                Value::String(switches),
            );
        } else {
            let section = self.vendor_section_mut();
            match section.get_mut("args") {
                Some(Value::Array(args)) => args.push(Value::String(arg)),
                _ => {
                    section.insert("args".to_string(), Value::Array(vec![Value::String(arg)]));
                }
            }
        }
        self
    }

    /// Sets a top-level capability, e.g. `acceptInsecureCerts`.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.document.insert(key.into(), value);
        self
    }

    /// Sets an option inside the browser's vendor section.
    #[must_use]
    pub fn with_vendor_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.vendor_section_mut().insert(key.into(), value);
        self
    }

    /// Merges a capability map over this document.
    ///
    /// Top-level entries override; where both sides hold an object under
    /// the same key, the objects are merged one level deep so vendor
    /// sections survive.
    #[must_use]
    pub fn merge(mut self, overrides: Map<String, Value>) -> Self {
        for (key, value) in overrides {
            match (self.document.get_mut(&key), value) {
                (Some(Value::Object(existing)), Value::Object(incoming)) => {
                    existing.extend(incoming);
                }
                (_, value) => {
                    self.document.insert(key, value);
                }
            }
        }
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The browser this document provisions.
    #[inline]
    #[must_use]
    pub const fn browser(&self) -> Browser {
        self.browser
    }

    /// Read access to the raw document.
    #[inline]
    #[must_use]
    pub const fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Consumes the set, yielding the document handed to the connector.
    #[inline]
    #[must_use]
    pub fn into_document(self) -> Map<String, Value> {
        self.document
    }

    /// A top-level capability value.
    #[inline]
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// A value from the vendor section.
    #[must_use]
    pub fn vendor_option(&self, key: &str) -> Option<&Value> {
        self.document
            .get(self.vendor_key())
            .and_then(Value::as_object)
            .and_then(|section| section.get(key))
    }

    /// The browser arguments carried by this document.
    #[must_use]
    pub fn browser_args(&self) -> Vec<String> {
        if self.browser == Browser::IExplorer {
            return self
                .vendor_option("ie.browserCommandLineSwitches")
                .and_then(Value::as_str)
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default();
        }
        self.vendor_option("args")
            .and_then(Value::as_array)
            .map(|args| {
                args.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether a specific browser argument is present.
    #[must_use]
    pub fn has_browser_arg(&self, arg: &str) -> bool {
        self.browser_args().iter().any(|a| a == arg)
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn vendor_section_mut(&mut self) -> &mut Map<String, Value> {
        let key = self.vendor_key();
        let entry = self
            .document
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry {
            Value::Object(section) => section,
            other => {
                *other = Value::Object(Map::new());
                match other {
                    Value::Object(section) => section,
                    _ => unreachable!("vendor section was just set to an object"),
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_new_carries_wire_name() {
        let caps = CapabilitySet::new(Browser::Edge);
        assert_eq!(caps.entry("browserName"), Some(&json!("MicrosoftEdge")));
        assert_eq!(caps.browser(), Browser::Edge);
    }

    #[test]
    fn test_browser_args_accumulate_in_order() {
        let caps = CapabilitySet::new(Browser::Chrome)
            .with_browser_arg("--headless=new")
            .with_browser_arg("--no-sandbox");
        assert_eq!(caps.browser_args(), vec!["--headless=new", "--no-sandbox"]);
        assert!(caps.has_browser_arg("--no-sandbox"));
        assert!(!caps.has_browser_arg("--disable-gpu"));
    }

    #[test]
    fn test_iexplorer_args_become_command_line_switches() {
        let caps = CapabilitySet::new(Browser::IExplorer)
            .with_browser_arg("-private")
            .with_browser_arg("-nohome");
        assert_eq!(
            caps.vendor_option("ie.browserCommandLineSwitches"),
            Some(&json!("-private -nohome"))
        );
        assert_eq!(caps.browser_args(), vec!["-private", "-nohome"]);
    }

    #[test]
    fn test_vendor_sections_per_browser() {
        assert_eq!(
            CapabilitySet::new(Browser::Chrome).vendor_key(),
            "goog:chromeOptions"
        );
        assert_eq!(
            CapabilitySet::new(Browser::Firefox).vendor_key(),
            "moz:firefoxOptions"
        );
        assert_eq!(
            CapabilitySet::new(Browser::IExplorer).vendor_key(),
            "se:ieOptions"
        );
        assert_eq!(
            CapabilitySet::new(Browser::Edge).vendor_key(),
            "ms:edgeOptions"
        );
    }

    #[test]
    fn test_merge_overrides_top_level_and_deep_merges_objects() {
        let mut overrides = Map::new();
        overrides.insert("unhandledPromptBehavior".to_string(), json!("accept"));
        overrides.insert(
            "se:ieOptions".to_string(),
            json!({"ie.ensureCleanSession": true}),
        );

        let caps = CapabilitySet::new(Browser::IExplorer)
            .with_vendor_option("requireWindowFocus", json!(true))
            .merge(overrides);

        assert_eq!(caps.entry("unhandledPromptBehavior"), Some(&json!("accept")));
        // Deep merge kept the pre-existing vendor entry.
        assert_eq!(caps.vendor_option("requireWindowFocus"), Some(&json!(true)));
        assert_eq!(
            caps.vendor_option("ie.ensureCleanSession"),
            Some(&json!(true))
        );
    }

    #[test]
    fn test_into_document_serializes() {
        let caps = CapabilitySet::new(Browser::Chrome).with_browser_arg("--headless=new");
        let value = Value::Object(caps.into_document());
        assert_eq!(value["browserName"], json!("chrome"));
        assert_eq!(value["goog:chromeOptions"]["args"][0], json!("--headless=new"));
    }

    proptest! {
        #[test]
        fn prop_every_added_arg_is_found(
            args in proptest::collection::vec("--[a-z][a-z0-9-]{0,16}", 0..8)
        ) {
            let mut caps = CapabilitySet::new(Browser::Chrome);
            for arg in &args {
                caps = caps.with_browser_arg(arg.clone());
            }
            prop_assert_eq!(caps.browser_args(), args.clone());
            for arg in &args {
                prop_assert!(caps.has_browser_arg(arg));
            }
        }
    }
}
