#![forbid(unsafe_code)]

//! Controller configuration.
//!
//! [`InteractionConfig::default`] reproduces the stock landing-page behavior:
//! a 100 px elevation threshold, a 768 px mobile breakpoint, a 20 px anchor
//! margin, a 50 px scrollspy lookahead and a 100 ms settle delay before hash
//! correction. Hosts may override any field through JSON; missing fields keep
//! their defaults.

use core::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The JSON payload could not be decoded.
    Decode(String),
    /// A numeric field is negative or not finite.
    InvalidDistance { field: &'static str },
    /// A class set that must not be empty is empty.
    EmptyClassSet { field: &'static str },
    /// A selector is empty.
    EmptySelector { field: &'static str },
    /// `nav_toggle` must contain `nav_collapsed`, otherwise the open state
    /// cannot be observed after a toggle.
    CollapsedClassNotToggled,
    /// `icon_closed` and `icon_open` must differ.
    IconClassesCollide,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Decode(msg) => write!(f, "invalid config json: {msg}"),
            Self::InvalidDistance { field } => {
                write!(f, "{field} must be a finite, non-negative number")
            }
            Self::EmptyClassSet { field } => write!(f, "{field} must name at least one class"),
            Self::EmptySelector { field } => write!(f, "{field} selector is empty"),
            Self::CollapsedClassNotToggled => {
                write!(f, "classes.nav_toggle must contain classes.nav_collapsed")
            }
            Self::IconClassesCollide => {
                write!(f, "classes.icon_closed and classes.icon_open must differ")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Distances (CSS pixels) and delays used by the behaviors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Scroll offset above which the header is elevated and scroll-top shown.
    /// Strict: an offset equal to the threshold is not elevated.
    pub scroll_threshold_px: f64,
    /// Viewport widths strictly below this are treated as mobile.
    pub mobile_breakpoint_px: f64,
    /// Gap kept between the header and an anchored section.
    pub anchor_margin_px: f64,
    /// Extra lookahead added to the scrollspy position.
    pub scrollspy_lookahead_px: f64,
    /// Delay before correcting the initial hash scroll.
    pub hash_settle_delay_ms: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            scroll_threshold_px: 100.0,
            mobile_breakpoint_px: 768.0,
            anchor_margin_px: 20.0,
            scrollspy_lookahead_px: 50.0,
            hash_settle_delay_ms: 100,
        }
    }
}

impl Thresholds {
    #[must_use]
    pub const fn hash_settle_delay(&self) -> Duration {
        Duration::from_millis(self.hash_settle_delay_ms)
    }
}

/// CSS selectors used to capture element handles at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub header: String,
    pub nav: String,
    pub mobile_toggle: String,
    pub scroll_top: String,
    pub nav_links: String,
    pub anchors: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            header: "header".to_string(),
            nav: "nav".to_string(),
            mobile_toggle: ".bi-list".to_string(),
            scroll_top: ".scroll-top".to_string(),
            nav_links: "nav a".to_string(),
            anchors: "a[href^=\"#\"]".to_string(),
        }
    }
}

/// Class names written to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    pub header_elevated: Vec<String>,
    pub header_translucent: Vec<String>,
    /// Flipped together on the nav element by the mobile toggle.
    pub nav_toggle: Vec<String>,
    /// Presence of this class means the mobile nav is collapsed.
    pub nav_collapsed: String,
    pub icon_closed: String,
    pub icon_open: String,
    pub scroll_top_active: String,
    pub link_active: Vec<String>,
}

fn classes(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            header_elevated: classes(&["bg-white", "shadow-md"]),
            header_translucent: classes(&["bg-white/90"]),
            nav_toggle: classes(&[
                "hidden",
                "flex",
                "flex-col",
                "absolute",
                "top-full",
                "left-0",
                "w-full",
                "bg-white",
                "shadow-lg",
                "p-6",
            ]),
            nav_collapsed: "hidden".to_string(),
            icon_closed: "bi-list".to_string(),
            icon_open: "bi-x".to_string(),
            scroll_top_active: "active".to_string(),
            link_active: classes(&["text-primary", "font-semibold"]),
        }
    }
}

/// Full controller configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub thresholds: Thresholds,
    pub selectors: Selectors,
    pub classes: ClassNames,
}

impl InteractionConfig {
    /// Parse a JSON object and validate it.
    ///
    /// An empty object yields [`InteractionConfig::default`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the controller relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        for (field, value) in [
            ("thresholds.scroll_threshold_px", t.scroll_threshold_px),
            ("thresholds.mobile_breakpoint_px", t.mobile_breakpoint_px),
            ("thresholds.anchor_margin_px", t.anchor_margin_px),
            ("thresholds.scrollspy_lookahead_px", t.scrollspy_lookahead_px),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDistance { field });
            }
        }

        let s = &self.selectors;
        for (field, selector) in [
            ("selectors.header", &s.header),
            ("selectors.nav", &s.nav),
            ("selectors.mobile_toggle", &s.mobile_toggle),
            ("selectors.scroll_top", &s.scroll_top),
            ("selectors.nav_links", &s.nav_links),
            ("selectors.anchors", &s.anchors),
        ] {
            if selector.trim().is_empty() {
                return Err(ConfigError::EmptySelector { field });
            }
        }

        let c = &self.classes;
        for (field, set) in [
            ("classes.header_elevated", &c.header_elevated),
            ("classes.header_translucent", &c.header_translucent),
            ("classes.nav_toggle", &c.nav_toggle),
            ("classes.link_active", &c.link_active),
        ] {
            if set.is_empty() || set.iter().any(|class| class.trim().is_empty()) {
                return Err(ConfigError::EmptyClassSet { field });
            }
        }
        for (field, class) in [
            ("classes.nav_collapsed", &c.nav_collapsed),
            ("classes.icon_closed", &c.icon_closed),
            ("classes.icon_open", &c.icon_open),
            ("classes.scroll_top_active", &c.scroll_top_active),
        ] {
            if class.trim().is_empty() {
                return Err(ConfigError::EmptyClassSet { field });
            }
        }
        if !c.nav_toggle.contains(&c.nav_collapsed) {
            return Err(ConfigError::CollapsedClassNotToggled);
        }
        if c.icon_closed == c.icon_open {
            return Err(ConfigError::IconClassesCollide);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_stock_landing_page() {
        let config = InteractionConfig::default();
        assert_eq!(config.thresholds.scroll_threshold_px, 100.0);
        assert_eq!(config.thresholds.mobile_breakpoint_px, 768.0);
        assert_eq!(config.thresholds.anchor_margin_px, 20.0);
        assert_eq!(config.thresholds.scrollspy_lookahead_px, 50.0);
        assert_eq!(
            config.thresholds.hash_settle_delay(),
            Duration::from_millis(100)
        );
        assert_eq!(config.selectors.mobile_toggle, ".bi-list");
        assert_eq!(config.classes.nav_toggle.len(), 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_object_is_default() {
        let config = InteractionConfig::from_json_str("{}").unwrap();
        assert_eq!(config, InteractionConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let json = r#"{
            "thresholds": {"scroll_threshold_px": 40},
            "classes": {"scroll_top_active": "visible"}
        }"#;
        let config = InteractionConfig::from_json_str(json).unwrap();
        assert_eq!(config.thresholds.scroll_threshold_px, 40.0);
        assert_eq!(config.thresholds.mobile_breakpoint_px, 768.0);
        assert_eq!(config.classes.scroll_top_active, "visible");
        assert_eq!(config.classes.icon_open, "bi-x");
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = InteractionConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Decode(_)));
    }

    #[test]
    fn negative_distance_is_rejected() {
        let err =
            InteractionConfig::from_json_str(r#"{"thresholds":{"anchor_margin_px":-1}}"#)
                .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidDistance {
                field: "thresholds.anchor_margin_px"
            }
        );
    }

    #[test]
    fn nav_toggle_must_flip_collapsed_marker() {
        let err = InteractionConfig::from_json_str(r#"{"classes":{"nav_toggle":["flex"]}}"#)
            .unwrap_err();
        assert_eq!(err, ConfigError::CollapsedClassNotToggled);
        assert_eq!(
            err.to_string(),
            "classes.nav_toggle must contain classes.nav_collapsed"
        );
    }

    #[test]
    fn identical_icons_are_rejected() {
        let err = InteractionConfig::from_json_str(r#"{"classes":{"icon_open":"bi-list"}}"#)
            .unwrap_err();
        assert_eq!(err, ConfigError::IconClassesCollide);
    }

    #[test]
    fn empty_selector_is_rejected() {
        let err = InteractionConfig::from_json_str(r#"{"selectors":{"nav":"  "}}"#).unwrap_err();
        assert_eq!(
            err,
            ConfigError::EmptySelector {
                field: "selectors.nav"
            }
        );
    }
}
