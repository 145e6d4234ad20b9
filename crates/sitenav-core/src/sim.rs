#![forbid(unsafe_code)]

//! In-memory page and host for deterministic tests.
//!
//! [`SimPage`] is a flat arena of elements with explicit geometry. It
//! understands the selector subset used by the default configuration:
//! type selectors, `.class`, `#id`, attribute tests (`[attr]`, `[attr="v"]`,
//! `[attr^="v"]`) and the descendant combinator.
//!
//! [`SimHost`] plays the browser: it owns a [`Controller<SimPage>`], routes
//! clicks to every listener bound to an element in registration order, and runs
//! deferred tasks against a [`DeterministicClock`].
//!
//! ```
//! use sitenav_core::InteractionConfig;
//! use sitenav_core::sim::{SimElement, SimHost, SimPage};
//!
//! let mut page = SimPage::new(1024.0);
//! let header = page.push(SimElement::new("header").span(0.0, 64.0));
//! let mut host = SimHost::new(page, InteractionConfig::default());
//! let _ = host.load();
//! let _ = host.scroll(250.0);
//! assert!(host.page().has_class_name(header, "shadow-md"));
//! ```

use core::time::Duration;

use crate::config::InteractionConfig;
use crate::controller::{Controller, Deferred, DeferredTask, Disposition, PageEvent};
use crate::page::{Page, ScrollCommand};

/// Handle into a [`SimPage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Element description used to build a [`SimPage`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimElement {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    parent: Option<ElementId>,
    top: f64,
    height: f64,
}

impl SimElement {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        if !self.classes.iter().any(|c| c == class) {
            self.classes.push(class.to_string());
        }
        self
    }

    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.retain(|(n, _)| n != name);
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn child_of(mut self, parent: ElementId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set `offsetTop` and `offsetHeight`.
    #[must_use]
    pub fn span(mut self, top: f64, height: f64) -> Self {
        self.top = top;
        self.height = height;
        self
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        if name == "id" {
            return self.id.as_deref();
        }
        if name == "class" {
            return None;
        }
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory document.
#[derive(Debug, Clone, Default)]
pub struct SimPage {
    elements: Vec<SimElement>,
    scroll_y: f64,
    viewport_width: f64,
    location_hash: Option<String>,
    scroll_log: Vec<ScrollCommand>,
}

impl SimPage {
    #[must_use]
    pub fn new(viewport_width: f64) -> Self {
        Self {
            viewport_width,
            ..Self::default()
        }
    }

    /// Append an element in document order.
    pub fn push(&mut self, element: SimElement) -> ElementId {
        self.elements.push(element);
        ElementId(self.elements.len() - 1)
    }

    pub fn set_scroll_y(&mut self, scroll_y: f64) {
        self.scroll_y = scroll_y.max(0.0);
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width;
    }

    pub fn set_location_hash(&mut self, hash: Option<&str>) {
        self.location_hash = hash.filter(|h| !h.is_empty()).map(str::to_string);
    }

    /// Move an element; subsequent reads see the new geometry.
    pub fn set_span(&mut self, element: ElementId, top: f64, height: f64) {
        if let Some(el) = self.elements.get_mut(element.0) {
            el.top = top;
            el.height = height;
        }
    }

    /// Drop an element's id so fragment lookups stop finding it.
    pub fn clear_id(&mut self, element: ElementId) {
        if let Some(el) = self.elements.get_mut(element.0) {
            el.id = None;
        }
    }

    /// Class list of `element` in insertion order.
    #[must_use]
    pub fn classes(&self, element: ElementId) -> Vec<&str> {
        self.elements
            .get(element.0)
            .map(|el| el.classes.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_class_name(&self, element: ElementId, class: &str) -> bool {
        self.elements
            .get(element.0)
            .is_some_and(|el| el.classes.iter().any(|c| c == class))
    }

    /// Every scroll command received, oldest first.
    #[must_use]
    pub fn scroll_log(&self) -> &[ScrollCommand] {
        &self.scroll_log
    }

    fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        (0..self.elements.len()).map(ElementId)
    }

    fn matches(&self, element: ElementId, selector: &Selector) -> bool {
        let Some((subject, ancestors)) = selector.compounds.split_last() else {
            return false;
        };
        if !subject.matches(&self.elements[element.0]) {
            return false;
        }
        // Walk up the parent chain, consuming ancestor compounds right to left.
        let mut pending = ancestors.iter().rev().peekable();
        let mut cursor = self.elements[element.0].parent;
        while let Some(compound) = pending.peek() {
            let Some(parent) = cursor else {
                return false;
            };
            let el = &self.elements[parent.0];
            if compound.matches(el) {
                pending.next();
            }
            cursor = el.parent;
        }
        true
    }
}

impl Page for SimPage {
    type Element = ElementId;

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    fn location_hash(&self) -> Option<String> {
        self.location_hash.clone()
    }

    fn select_one(&self, selector: &str) -> Option<ElementId> {
        let selector = Selector::parse(selector)?;
        self.ids().find(|id| self.matches(*id, &selector))
    }

    fn select_all(&self, selector: &str) -> Vec<ElementId> {
        let Some(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.ids().filter(|id| self.matches(*id, &selector)).collect()
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.ids()
            .find(|el| self.elements[el.0].id.as_deref() == Some(id))
    }

    fn offset_top(&self, element: &ElementId) -> f64 {
        self.elements.get(element.0).map_or(0.0, |el| el.top)
    }

    fn offset_height(&self, element: &ElementId) -> f64 {
        self.elements.get(element.0).map_or(0.0, |el| el.height)
    }

    fn attribute(&self, element: &ElementId, name: &str) -> Option<String> {
        self.elements
            .get(element.0)?
            .attribute(name)
            .map(str::to_string)
    }

    fn link_hash(&self, element: &ElementId) -> Option<String> {
        let href = self.elements.get(element.0)?.attribute("href")?;
        let (_, fragment) = href.split_once('#')?;
        if fragment.is_empty() {
            None
        } else {
            Some(format!("#{fragment}"))
        }
    }

    fn has_class(&self, element: &ElementId, class: &str) -> bool {
        self.has_class_name(*element, class)
    }

    fn add_class(&mut self, element: &ElementId, class: &str) {
        if let Some(el) = self.elements.get_mut(element.0) {
            if !el.classes.iter().any(|c| c == class) {
                el.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, element: &ElementId, class: &str) {
        if let Some(el) = self.elements.get_mut(element.0) {
            el.classes.retain(|c| c != class);
        }
    }

    fn toggle_class(&mut self, element: &ElementId, class: &str) {
        if self.has_class_name(*element, class) {
            self.remove_class(element, class);
        } else {
            self.add_class(element, class);
        }
    }

    fn scroll_to(&mut self, command: ScrollCommand) {
        self.scroll_log.push(command);
        // Smooth or not, the simulated viewport lands immediately.
        self.set_scroll_y(command.top);
    }

    fn decode_fragment_id(&self, id: &str) -> Option<String> {
        if id.contains('%') { percent_decode(id) } else { None }
    }
}

/// `decodeURIComponent` for the simulated page: `None` on a malformed escape
/// or when the bytes are not UTF-8.
fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let hex = input.get(idx + 1..idx + 3)?;
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            idx += 3;
        } else {
            out.push(bytes[idx]);
            idx += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp)>,
}

impl Compound {
    fn matches(&self, el: &SimElement) -> bool {
        if self.tag.as_deref().is_some_and(|tag| tag != el.tag) {
            return false;
        }
        if self.id.is_some() && self.id != el.id {
            return false;
        }
        if !self.classes.iter().all(|c| el.classes.contains(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, op)| match (op, el.attribute(name)) {
            (_, None) => false,
            (AttrOp::Exists, Some(_)) => true,
            (AttrOp::Equals(v), Some(actual)) => actual == v,
            (AttrOp::Prefix(v), Some(actual)) => actual.starts_with(v.as_str()),
        })
    }

    fn parse(input: &str) -> Option<Self> {
        let mut compound = Self::default();
        let mut rest = input;

        let tag_len = rest
            .find(|c: char| c == '.' || c == '#' || c == '[')
            .unwrap_or(rest.len());
        if tag_len > 0 {
            let tag = &rest[..tag_len];
            if !tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '*')
            {
                return None;
            }
            if tag != "*" {
                compound.tag = Some(tag.to_ascii_lowercase());
            }
            rest = &rest[tag_len..];
        }

        while let Some(first) = rest.chars().next() {
            match first {
                '.' | '#' => {
                    let body = &rest[1..];
                    let end = body
                        .find(|c: char| c == '.' || c == '#' || c == '[')
                        .unwrap_or(body.len());
                    let name = &body[..end];
                    if name.is_empty() {
                        return None;
                    }
                    if first == '.' {
                        compound.classes.push(name.to_string());
                    } else {
                        compound.id = Some(name.to_string());
                    }
                    rest = &body[end..];
                }
                '[' => {
                    let close = rest.find(']')?;
                    compound.attrs.push(parse_attr(&rest[1..close])?);
                    rest = &rest[close + 1..];
                }
                _ => return None,
            }
        }
        Some(compound)
    }
}

fn parse_attr(body: &str) -> Option<(String, AttrOp)> {
    let unquote = |v: &str| {
        let v = v.trim();
        v.strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| v.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(v)
            .to_string()
    };
    if let Some((name, value)) = body.split_once("^=") {
        return Some((name.trim().to_string(), AttrOp::Prefix(unquote(value))));
    }
    if let Some((name, value)) = body.split_once('=') {
        return Some((name.trim().to_string(), AttrOp::Equals(unquote(value))));
    }
    let name = body.trim();
    if name.is_empty() {
        None
    } else {
        Some((name.to_string(), AttrOp::Exists))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Selector {
    compounds: Vec<Compound>,
}

impl Selector {
    /// Returns `None` for selectors outside the supported subset, mirroring a
    /// rejected `querySelector` call.
    fn parse(input: &str) -> Option<Self> {
        let mut compounds = Vec::new();
        let mut depth = 0usize;
        let mut start = None;
        for (idx, c) in input.char_indices() {
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                _ => {}
            }
            if c.is_whitespace() && depth == 0 {
                if let Some(s) = start.take() {
                    compounds.push(Compound::parse(&input[s..idx])?);
                }
            } else if start.is_none() {
                start = Some(idx);
            }
        }
        if let Some(s) = start {
            compounds.push(Compound::parse(&input[s..])?);
        }
        if compounds.is_empty() {
            None
        } else {
            Some(Self { compounds })
        }
    }
}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

#[derive(Debug, Clone)]
struct PendingTimer {
    due: Duration,
    seq: u64,
    task: DeferredTask,
}

/// Browser stand-in driving a [`Controller<SimPage>`].
#[derive(Debug)]
pub struct SimHost {
    controller: Controller<SimPage>,
    clock: DeterministicClock,
    timers: Vec<PendingTimer>,
    next_seq: u64,
}

impl SimHost {
    #[must_use]
    pub fn new(page: SimPage, config: InteractionConfig) -> Self {
        Self {
            controller: Controller::new(page, config),
            clock: DeterministicClock::new(),
            timers: Vec::new(),
            next_seq: 0,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &Controller<SimPage> {
        &self.controller
    }

    #[must_use]
    pub fn page(&self) -> &SimPage {
        self.controller.page()
    }

    pub fn page_mut(&mut self) -> &mut SimPage {
        self.controller.page_mut()
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Dispatch one event and queue whatever it deferred.
    pub fn dispatch(&mut self, event: PageEvent) -> Disposition {
        let disposition = self.controller.dispatch(event);
        for Deferred { delay, task } in self.controller.take_deferred() {
            self.timers.push(PendingTimer {
                due: self.clock.now().saturating_add(delay),
                seq: self.next_seq,
                task,
            });
            self.next_seq += 1;
        }
        disposition
    }

    /// Fire the window `load` event.
    pub fn load(&mut self) -> Disposition {
        self.dispatch(PageEvent::Load)
    }

    /// Jump the viewport and fire a `scroll` event.
    pub fn scroll(&mut self, scroll_y: f64) -> Disposition {
        self.page_mut().set_scroll_y(scroll_y);
        self.dispatch(PageEvent::Scroll)
    }

    /// Click `element`, running every bound listener in registration order:
    /// mobile toggle, nav links, scroll-top control, same-page anchors.
    ///
    /// The default action is prevented if any listener prevented it.
    pub fn click(&mut self, element: ElementId) -> Disposition {
        let mut events = Vec::new();
        if self.controller.mobile_toggle_element() == Some(&element) {
            events.push(PageEvent::MobileToggleClick);
        }
        events.extend(
            positions(self.controller.nav_link_elements(), element).map(PageEvent::NavLinkClick),
        );
        if self.controller.scroll_top_element() == Some(&element) {
            events.push(PageEvent::ScrollTopClick);
        }
        events.extend(
            positions(self.controller.anchor_elements(), element).map(PageEvent::AnchorClick),
        );

        let mut prevented = false;
        for event in events {
            prevented |= self.dispatch(event).is_prevented();
        }
        if prevented {
            Disposition::PreventDefault
        } else {
            Disposition::Default
        }
    }

    /// Advance the clock and run every timer that came due, earliest first.
    pub fn advance(&mut self, dt: Duration) {
        self.clock.advance(dt);
        let now = self.clock.now();
        loop {
            let next = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due <= now)
                .min_by_key(|(_, t)| (t.due, t.seq))
                .map(|(idx, _)| idx);
            let Some(idx) = next else {
                break;
            };
            let timer = self.timers.remove(idx);
            let _ = self.dispatch(PageEvent::Timer(timer.task));
        }
    }
}

fn positions(elements: &[ElementId], target: ElementId) -> impl Iterator<Item = usize> + '_ {
    elements
        .iter()
        .enumerate()
        .filter(move |(_, el)| **el == target)
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn deterministic_clock_saturates() {
        let mut c = DeterministicClock::new();
        c.advance(Duration::from_millis(10));
        assert_eq!(c.now(), Duration::from_millis(10));
        c.advance(Duration::MAX);
        assert_eq!(c.now(), Duration::MAX);
    }

    #[test]
    fn selector_subset() {
        let mut page = SimPage::new(800.0);
        let nav = page.push(SimElement::new("nav").class("menu"));
        let ul = page.push(SimElement::new("ul").child_of(nav));
        let a1 = page.push(SimElement::new("a").attr("href", "#one").child_of(ul));
        let a2 = page.push(SimElement::new("a").attr("href", "/about"));
        let icon = page.push(SimElement::new("i").class("bi").class("bi-list"));

        assert_eq!(page.select_all("nav a"), vec![a1]);
        assert_eq!(page.select_all("a"), vec![a1, a2]);
        assert_eq!(page.select_all("a[href^=\"#\"]"), vec![a1]);
        assert_eq!(page.select_all("a[href='/about']"), vec![a2]);
        assert_eq!(page.select_one(".bi-list"), Some(icon));
        assert_eq!(page.select_one("i.bi.bi-list"), Some(icon));
        assert_eq!(page.select_one("nav.menu ul a"), Some(a1));
        assert_eq!(page.select_one("header"), None);
        assert_eq!(page.select_one(""), None);
        assert_eq!(page.select_one("a > b"), None);
    }

    #[test]
    fn link_hash_ignores_empty_fragment() {
        let mut page = SimPage::new(800.0);
        let bare = page.push(SimElement::new("a").attr("href", "#"));
        let named = page.push(SimElement::new("a").attr("href", "/index.html#faq"));
        assert_eq!(page.link_hash(&bare), None);
        assert_eq!(page.link_hash(&named), Some("#faq".to_string()));
    }

    #[test]
    fn fragment_ids_decode_like_decode_uri_component() {
        let page = SimPage::new(800.0);
        assert_eq!(
            page.decode_fragment_id("%C3%A0-propos"),
            Some("à-propos".to_string())
        );
        assert_eq!(page.decode_fragment_id("a%20b"), Some("a b".to_string()));
        assert_eq!(page.decode_fragment_id("plain"), None);
        assert_eq!(page.decode_fragment_id("bad%zz"), None);
        assert_eq!(page.decode_fragment_id("cut%4"), None);
        assert_eq!(page.decode_fragment_id("sign%+1"), None);
        assert_eq!(page.decode_fragment_id("%FF"), None);
    }

    #[test]
    fn class_mutation_is_set_like() {
        let mut page = SimPage::new(800.0);
        let el = page.push(SimElement::new("div").class("a"));
        page.add_class(&el, "a");
        page.add_class(&el, "b");
        assert_eq!(page.classes(el), vec!["a", "b"]);
        page.toggle_class(&el, "a");
        assert_eq!(page.classes(el), vec!["b"]);
        page.remove_class(&el, "missing");
        assert_eq!(page.classes(el), vec!["b"]);
    }

    #[test]
    fn scroll_commands_move_viewport_and_clamp() {
        let mut page = SimPage::new(800.0);
        page.scroll_to(ScrollCommand::smooth(-40.0));
        assert_eq!(page.scroll_y(), 0.0);
        page.scroll_to(ScrollCommand::smooth(900.0));
        assert_eq!(page.scroll_y(), 900.0);
        assert_eq!(page.scroll_log().len(), 2);
    }

    #[test]
    fn timers_fire_only_when_due() {
        let mut page = SimPage::new(800.0);
        page.push(SimElement::new("section").id("faq").span(500.0, 100.0));
        page.set_location_hash(Some("#faq"));
        let mut host = SimHost::new(page, InteractionConfig::default());

        let _ = host.load();
        assert_eq!(host.pending_timers(), 1);
        host.advance(Duration::from_millis(99));
        assert!(host.page().scroll_log().is_empty());
        host.advance(Duration::from_millis(1));
        assert_eq!(host.pending_timers(), 0);
        assert_eq!(host.page().scroll_log(), &[ScrollCommand::smooth(480.0)]);
        assert_eq!(host.now(), Duration::from_millis(100));
    }
}
