#![forbid(unsafe_code)]

//! Page interaction controller.
//!
//! [`Controller`] owns a [`Page`] and the element handles captured when it was
//! created. The host forwards browser events through [`Controller::dispatch`]:
//!
//! 1. Capture handles once with [`Controller::new`].
//! 2. Register one listener per entry in [`Controller::bindings`].
//! 3. Forward each event; honor the returned [`Disposition`].
//! 4. After every dispatch, schedule [`Controller::take_deferred`] and feed each
//!    task back as [`PageEvent::Timer`] once its delay elapses.
//!
//! Handlers are idempotent and re-measure the page every time they run.

use core::time::Duration;

use tracing::{debug, trace};

use crate::config::InteractionConfig;
use crate::geometry::{SectionSpan, anchor_target, is_narrow, past_threshold, spy_position};
use crate::page::{Page, ScrollCommand, fragment_id};

/// Browser event forwarded by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Window `load`.
    Load,
    /// Document `scroll`.
    Scroll,
    /// Click on the mobile nav toggle icon.
    MobileToggleClick,
    /// Click on the nav link at this index of [`Bindings::nav_links`].
    NavLinkClick(usize),
    /// Click on the scroll-top control.
    ScrollTopClick,
    /// Click on the same-page anchor at this index of [`Bindings::anchors`].
    AnchorClick(usize),
    /// A previously scheduled [`Deferred`] came due.
    Timer(DeferredTask),
}

/// Whether the host should let the browser run the event's default action.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Default,
    PreventDefault,
}

impl Disposition {
    #[must_use]
    pub const fn is_prevented(self) -> bool {
        matches!(self, Self::PreventDefault)
    }
}

/// Work the controller wants run later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredTask {
    /// Re-scroll to the section named by the load-time URL fragment once
    /// layout has settled.
    HashCorrection { fragment: String },
}

/// A task plus the delay after which the host should dispatch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferred {
    pub delay: Duration,
    pub task: DeferredTask,
}

/// Which listeners the host has to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bindings {
    pub mobile_toggle: bool,
    pub scroll_top: bool,
    /// Number of nav links; events carry an index below this.
    pub nav_links: usize,
    /// Number of same-page anchors; events carry an index below this.
    pub anchors: usize,
}

#[derive(Debug, Clone)]
struct Handles<E> {
    header: Option<E>,
    nav: Option<E>,
    toggle: Option<E>,
    scroll_top: Option<E>,
    nav_links: Vec<E>,
    anchors: Vec<E>,
}

/// Host-driven page interaction controller.
#[derive(Debug)]
pub struct Controller<P: Page> {
    page: P,
    config: InteractionConfig,
    handles: Handles<P::Element>,
    deferred: Vec<Deferred>,
}

impl<P: Page> Controller<P> {
    /// Capture element handles from `page` and build a controller.
    ///
    /// Missing elements are fine: the behaviors that need them become no-ops.
    pub fn new(page: P, config: InteractionConfig) -> Self {
        let selectors = &config.selectors;
        let handles = Handles {
            header: page.select_one(&selectors.header),
            nav: page.select_one(&selectors.nav),
            toggle: page.select_one(&selectors.mobile_toggle),
            scroll_top: page.select_one(&selectors.scroll_top),
            nav_links: page.select_all(&selectors.nav_links),
            anchors: page.select_all(&selectors.anchors),
        };
        debug!(
            header = handles.header.is_some(),
            nav = handles.nav.is_some(),
            toggle = handles.toggle.is_some(),
            scroll_top = handles.scroll_top.is_some(),
            nav_links = handles.nav_links.len(),
            anchors = handles.anchors.len(),
            "page handles captured"
        );
        Self {
            page,
            config,
            handles,
            deferred: Vec::new(),
        }
    }

    #[must_use]
    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    #[must_use]
    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Element handles the host should attach listeners to, in the order the
    /// indices of [`PageEvent::NavLinkClick`] and [`PageEvent::AnchorClick`]
    /// refer to.
    #[must_use]
    pub fn bindings(&self) -> Bindings {
        Bindings {
            mobile_toggle: self.handles.toggle.is_some(),
            scroll_top: self.handles.scroll_top.is_some(),
            nav_links: self.handles.nav_links.len(),
            anchors: self.handles.anchors.len(),
        }
    }

    #[must_use]
    pub fn mobile_toggle_element(&self) -> Option<&P::Element> {
        self.handles.toggle.as_ref()
    }

    #[must_use]
    pub fn scroll_top_element(&self) -> Option<&P::Element> {
        self.handles.scroll_top.as_ref()
    }

    #[must_use]
    pub fn nav_link_elements(&self) -> &[P::Element] {
        &self.handles.nav_links
    }

    #[must_use]
    pub fn anchor_elements(&self) -> &[P::Element] {
        &self.handles.anchors
    }

    /// Drain deferred work queued by previous dispatches.
    pub fn take_deferred(&mut self) -> Vec<Deferred> {
        std::mem::take(&mut self.deferred)
    }

    /// Route one browser event to its behaviors.
    pub fn dispatch(&mut self, event: PageEvent) -> Disposition {
        trace!(?event, "dispatch");
        match event {
            PageEvent::Load => {
                self.update_header_shadow();
                self.update_scroll_top();
                self.schedule_hash_correction();
                self.update_scrollspy();
                Disposition::Default
            }
            PageEvent::Scroll => {
                self.update_header_shadow();
                self.update_scroll_top();
                self.update_scrollspy();
                Disposition::Default
            }
            PageEvent::MobileToggleClick => {
                self.toggle_mobile_nav();
                Disposition::Default
            }
            PageEvent::NavLinkClick(index) => {
                if index < self.handles.nav_links.len() {
                    self.close_mobile_nav_after_navigation();
                }
                Disposition::Default
            }
            PageEvent::ScrollTopClick => self.scroll_to_top(),
            PageEvent::AnchorClick(index) => {
                let Some(anchor) = self.handles.anchors.get(index) else {
                    return Disposition::Default;
                };
                let href = self.page.attribute(anchor, "href");
                match href {
                    Some(href) => self.scroll_to_anchor(&href),
                    None => Disposition::Default,
                }
            }
            PageEvent::Timer(DeferredTask::HashCorrection { fragment }) => {
                self.apply_hash_correction(&fragment);
                Disposition::Default
            }
        }
    }

    /// Elevate the header past the scroll threshold, make it translucent
    /// otherwise.
    pub fn update_header_shadow(&mut self) {
        let Some(header) = self.handles.header.clone() else {
            return;
        };
        let classes = &self.config.classes;
        let elevated = past_threshold(
            self.page.scroll_y(),
            self.config.thresholds.scroll_threshold_px,
        );
        let (add, remove) = if elevated {
            (&classes.header_elevated, &classes.header_translucent)
        } else {
            (&classes.header_translucent, &classes.header_elevated)
        };
        for class in remove {
            self.page.remove_class(&header, class);
        }
        for class in add {
            self.page.add_class(&header, class);
        }
        trace!(elevated, "header shadow updated");
    }

    /// Flip the mobile nav between collapsed and expanded.
    ///
    /// Needs both the nav and the toggle icon; applying it twice restores the
    /// original classes.
    pub fn toggle_mobile_nav(&mut self) {
        let (Some(nav), Some(toggle)) = (self.handles.nav.clone(), self.handles.toggle.clone())
        else {
            return;
        };
        let classes = &self.config.classes;
        for class in &classes.nav_toggle {
            self.page.toggle_class(&nav, class);
        }
        self.page.toggle_class(&toggle, &classes.icon_closed);
        self.page.toggle_class(&toggle, &classes.icon_open);
        debug!(open = self.is_mobile_nav_open(), "mobile nav toggled");
    }

    /// Whether the nav is currently expanded (lacks the collapsed class).
    #[must_use]
    pub fn is_mobile_nav_open(&self) -> bool {
        self.handles
            .nav
            .as_ref()
            .is_some_and(|nav| !self.page.has_class(nav, &self.config.classes.nav_collapsed))
    }

    fn close_mobile_nav_after_navigation(&mut self) {
        let narrow = is_narrow(
            self.page.viewport_width(),
            self.config.thresholds.mobile_breakpoint_px,
        );
        if narrow && self.is_mobile_nav_open() {
            self.toggle_mobile_nav();
        }
    }

    /// Show the scroll-top control past the scroll threshold.
    pub fn update_scroll_top(&mut self) {
        let Some(control) = self.handles.scroll_top.clone() else {
            return;
        };
        let active_class = &self.config.classes.scroll_top_active;
        if past_threshold(
            self.page.scroll_y(),
            self.config.thresholds.scroll_threshold_px,
        ) {
            self.page.add_class(&control, active_class);
        } else {
            self.page.remove_class(&control, active_class);
        }
    }

    /// Smooth-scroll to the top of the document.
    pub fn scroll_to_top(&mut self) -> Disposition {
        if self.handles.scroll_top.is_none() {
            return Disposition::Default;
        }
        self.issue_scroll(ScrollCommand::smooth(0.0));
        Disposition::PreventDefault
    }

    /// Queue a hash correction if the URL fragment names an existing element.
    pub fn schedule_hash_correction(&mut self) {
        let Some(hash) = self.page.location_hash() else {
            return;
        };
        if self.section_for_fragment(&hash).is_none() {
            trace!(%hash, "location hash names no element");
            return;
        }
        let delay = self.config.thresholds.hash_settle_delay();
        debug!(%hash, delay_ms = delay.as_millis() as u64, "hash correction scheduled");
        self.deferred.push(Deferred {
            delay,
            task: DeferredTask::HashCorrection { fragment: hash },
        });
    }

    /// Scroll so the section named by `fragment` sits below the header.
    ///
    /// The section is looked up again: it may have disappeared since the
    /// correction was scheduled.
    pub fn apply_hash_correction(&mut self, fragment: &str) {
        if let Some(target) = self.anchor_scroll_target(fragment) {
            self.issue_scroll(ScrollCommand::smooth(target));
        }
    }

    /// Recompute which nav link is highlighted.
    ///
    /// The spy position is tested against each link's target section in
    /// document order and the last match wins. At most one link is highlighted;
    /// every other link, including links whose section is missing, is cleared.
    pub fn update_scrollspy(&mut self) {
        if self.handles.nav_links.is_empty() {
            return;
        }
        let position = spy_position(
            self.page.scroll_y(),
            self.header_height(),
            self.config.thresholds.scrollspy_lookahead_px,
        );

        let links = self.handles.nav_links.clone();
        let winner = links.iter().rposition(|link| {
            self.section_for_link(link)
                .is_some_and(|span| span.contains(position))
        });

        let active = &self.config.classes.link_active;
        for (idx, link) in links.iter().enumerate() {
            for class in active {
                if Some(idx) == winner {
                    self.page.add_class(link, class);
                } else {
                    self.page.remove_class(link, class);
                }
            }
        }
        trace!(position, ?winner, "scrollspy recomputed");
    }

    /// Handle a click on a same-page link.
    ///
    /// `"#"` alone is a placeholder and keeps its default action. Links whose
    /// target does not exist also keep it.
    pub fn scroll_to_anchor(&mut self, href: &str) -> Disposition {
        if href == "#" {
            return Disposition::Default;
        }
        match self.anchor_scroll_target(href) {
            Some(target) => {
                self.issue_scroll(ScrollCommand::smooth(target));
                Disposition::PreventDefault
            }
            None => Disposition::Default,
        }
    }

    fn anchor_scroll_target(&self, fragment: &str) -> Option<f64> {
        let section = self.section_for_fragment(fragment)?;
        Some(anchor_target(
            self.page.offset_top(&section),
            self.header_height(),
            self.config.thresholds.anchor_margin_px,
        ))
    }

    fn section_for_link(&self, link: &P::Element) -> Option<SectionSpan> {
        let hash = self.page.link_hash(link)?;
        let section = self.section_for_fragment(&hash)?;
        Some(SectionSpan::new(
            self.page.offset_top(&section),
            self.page.offset_height(&section),
        ))
    }

    /// Element named by a fragment or href.
    ///
    /// The id is tried as written first, then percent-decoded, so both
    /// `#%C3%A0-propos` and `#à-propos` find `id="à-propos"`.
    fn section_for_fragment(&self, fragment: &str) -> Option<P::Element> {
        let id = fragment_id(fragment)?;
        self.page.element_by_id(id).or_else(|| {
            let decoded = self.page.decode_fragment_id(id)?;
            self.page.element_by_id(&decoded)
        })
    }

    /// Rendered header height; zero without a header.
    fn header_height(&self) -> f64 {
        self.handles
            .header
            .as_ref()
            .map_or(0.0, |header| self.page.offset_height(header))
    }

    fn issue_scroll(&mut self, command: ScrollCommand) {
        debug!(top = command.top, behavior = ?command.behavior, "scroll issued");
        self.page.scroll_to(command);
    }
}
