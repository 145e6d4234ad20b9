#![forbid(unsafe_code)]

//! The page abstraction the controller talks to.
//!
//! A [`Page`] is a thin view over a live document: element lookup, class-list
//! mutation, geometry reads and scroll commands. Implementations must not cache
//! geometry; the controller relies on every read reflecting current layout.

use serde::{Deserialize, Serialize};

/// How a scroll command should move the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollBehavior {
    /// Browser-native animated transition.
    Smooth,
    Instant,
}

/// A single vertical scroll request issued by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollCommand {
    /// Target `scrollY`. May be negative; hosts clamp.
    pub top: f64,
    pub behavior: ScrollBehavior,
}

impl ScrollCommand {
    #[must_use]
    pub const fn smooth(top: f64) -> Self {
        Self {
            top,
            behavior: ScrollBehavior::Smooth,
        }
    }
}

/// Host document seen by the controller.
///
/// Lookups that fail (missing element, rejected selector) return `None` or an
/// empty list; they never error. Geometry of a detached or non-HTML element
/// reads as zero.
pub trait Page {
    /// Element handle. Cheap to clone.
    type Element: Clone + core::fmt::Debug;

    /// Current vertical scroll offset (`window.scrollY`).
    fn scroll_y(&self) -> f64;

    /// Viewport width (`window.innerWidth`).
    fn viewport_width(&self) -> f64;

    /// Fragment of the current URL including the leading `#`, if any.
    fn location_hash(&self) -> Option<String>;

    /// First element matching `selector`.
    fn select_one(&self, selector: &str) -> Option<Self::Element>;

    /// All elements matching `selector`, in document order.
    fn select_all(&self, selector: &str) -> Vec<Self::Element>;

    /// Element whose `id` equals `id`.
    fn element_by_id(&self, id: &str) -> Option<Self::Element>;

    fn offset_top(&self, element: &Self::Element) -> f64;

    fn offset_height(&self, element: &Self::Element) -> f64;

    /// Raw attribute value (e.g. `href` exactly as written in markup).
    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

    /// Fragment of an anchor's resolved URL including the leading `#`.
    /// Empty fragments (`href="#"`) yield `None`.
    fn link_hash(&self, element: &Self::Element) -> Option<String>;

    fn has_class(&self, element: &Self::Element, class: &str) -> bool;

    fn add_class(&mut self, element: &Self::Element, class: &str);

    fn remove_class(&mut self, element: &Self::Element, class: &str);

    fn toggle_class(&mut self, element: &Self::Element, class: &str);

    fn scroll_to(&mut self, command: ScrollCommand);

    /// Percent-decoded form of a fragment id (`decodeURIComponent`).
    ///
    /// `None` when the id has no escapes or does not decode. Hosts that never
    /// see encoded fragments can keep the default.
    fn decode_fragment_id(&self, _id: &str) -> Option<String> {
        None
    }
}

/// Extract the element id named by a fragment (`"#about"` → `"about"`).
///
/// Accepts either a bare fragment or a full href; anything after the first `#`
/// is the id. Returns `None` when there is no `#` or nothing follows it.
#[must_use]
pub fn fragment_id(fragment: &str) -> Option<&str> {
    let (_, id) = fragment.split_once('#')?;
    if id.is_empty() { None } else { Some(id) }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn fragment_id_strips_hash() {
        assert_eq!(fragment_id("#about"), Some("about"));
        assert_eq!(fragment_id("/index.html#contact"), Some("contact"));
    }

    #[test]
    fn bare_hash_and_missing_hash_have_no_id() {
        assert_eq!(fragment_id("#"), None);
        assert_eq!(fragment_id(""), None);
        assert_eq!(fragment_id("about"), None);
    }

    #[test]
    fn scroll_command_json_shape() {
        let json = serde_json::to_string(&ScrollCommand::smooth(0.0)).unwrap();
        assert_eq!(json, r#"{"top":0.0,"behavior":"smooth"}"#);
    }
}
