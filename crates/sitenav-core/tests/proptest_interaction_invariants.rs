//! Property-based invariant tests for the page interaction controller.
//!
//! Verifies:
//! 1. Header state: elevated iff scroll offset > threshold; the elevated and
//!    translucent class sets are never present together.
//! 2. Scroll-top `active` class follows the same strict threshold.
//! 3. Mobile toggle is an involution: any even number of toggles restores the
//!    nav and icon classes.
//! 4. Scrollspy highlights at most one link: the last one in document order
//!    whose section contains the spy position, for any scroll offset over
//!    contiguous sections.
//! 5. Anchor clicks scroll to `top - header_height - margin` for any geometry.
//! 6. Scroll-top clicks issue exactly one smooth scroll to 0 from any offset.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sitenav_core::sim::{ElementId, SimElement, SimHost, SimPage};
use sitenav_core::{Disposition, InteractionConfig, ScrollCommand};

// ── Strategy helpers ─────────────────────────────────────────────

fn arb_scroll() -> impl Strategy<Value = f64> {
    prop_oneof![
        (0u32..=400).prop_map(f64::from),
        Just(100.0),
        (0.0f64..5000.0),
    ]
}

fn arb_section_heights() -> impl Strategy<Value = Vec<u16>> {
    prop::collection::vec(1u16..800, 1..6)
}

fn owned_classes(host: &SimHost, element: ElementId) -> Vec<String> {
    host.page()
        .classes(element)
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn header_page(header_height: f64) -> (SimPage, ElementId) {
    let mut page = SimPage::new(1280.0);
    let header = page.push(SimElement::new("header").span(0.0, header_height));
    (page, header)
}

proptest! {
    #[test]
    fn header_classes_are_exclusive_and_exhaustive(
        offsets in prop::collection::vec(arb_scroll(), 1..20),
    ) {
        let (page, header) = header_page(64.0);
        let mut host = SimHost::new(page, InteractionConfig::default());
        for y in offsets {
            let _ = host.scroll(y);
            let page = host.page();
            let elevated = page.has_class_name(header, "bg-white")
                && page.has_class_name(header, "shadow-md");
            let translucent = page.has_class_name(header, "bg-white/90");
            prop_assert_eq!(elevated, y > 100.0);
            prop_assert_eq!(translucent, y <= 100.0);
            prop_assert!(elevated != translucent);
        }
    }

    #[test]
    fn scroll_top_active_follows_threshold(y in arb_scroll()) {
        let mut page = SimPage::new(1280.0);
        let control = page.push(SimElement::new("button").class("scroll-top"));
        let mut host = SimHost::new(page, InteractionConfig::default());
        let _ = host.scroll(y);
        prop_assert_eq!(host.page().has_class_name(control, "active"), y > 100.0);
    }

    #[test]
    fn mobile_toggle_is_an_involution(pairs in 0usize..8, extra_nav_class in "[a-z]{1,6}") {
        let mut page = SimPage::new(375.0);
        let nav = page.push(SimElement::new("nav").class("hidden").class(&extra_nav_class));
        let icon = page.push(SimElement::new("i").class("bi-list"));
        let mut host = SimHost::new(page, InteractionConfig::default());

        let mut nav_before = owned_classes(&host, nav);
        nav_before.sort();
        for _ in 0..pairs * 2 {
            let _ = host.click(icon);
        }
        let mut nav_after = owned_classes(&host, nav);
        nav_after.sort();
        prop_assert_eq!(nav_after, nav_before);
        prop_assert_eq!(host.page().classes(icon), vec!["bi-list"]);
    }

    #[test]
    fn scrollspy_highlights_last_containing_section(
        heights in arb_section_heights(),
        header_height in 0u16..150,
        y in 0u32..4000,
    ) {
        let (mut page, _) = header_page(f64::from(header_height));
        let nav = page.push(SimElement::new("nav"));
        let mut links = Vec::new();
        let mut spans = Vec::new();
        let mut top = 0.0;
        for (idx, h) in heights.iter().enumerate() {
            let id = format!("s{idx}");
            let link = SimElement::new("a").attr("href", &format!("#{id}")).child_of(nav);
            links.push(page.push(link));
            page.push(SimElement::new("section").id(&id).span(top, f64::from(*h)));
            spans.push((top, top + f64::from(*h)));
            top += f64::from(*h);
        }
        let mut host = SimHost::new(page, InteractionConfig::default());
        let _ = host.scroll(f64::from(y));

        let position = f64::from(y) + f64::from(header_height) + 50.0;
        let winner = spans
            .iter()
            .rposition(|(start, end)| position >= *start && position <= *end);
        for (idx, link) in links.iter().enumerate() {
            let expected = Some(idx) == winner;
            prop_assert_eq!(host.page().has_class_name(*link, "text-primary"), expected);
            prop_assert_eq!(host.page().has_class_name(*link, "font-semibold"), expected);
        }
    }

    #[test]
    fn anchor_scroll_target_formula(
        section_top in 0u32..10_000,
        header_height in 0u16..200,
    ) {
        let (mut page, _) = header_page(f64::from(header_height));
        let section = SimElement::new("section").id("target");
        page.push(section.span(f64::from(section_top), 100.0));
        let anchor = page.push(SimElement::new("a").attr("href", "#target"));
        let mut host = SimHost::new(page, InteractionConfig::default());

        prop_assert_eq!(host.click(anchor), Disposition::PreventDefault);
        let expected = f64::from(section_top) - f64::from(header_height) - 20.0;
        prop_assert_eq!(host.page().scroll_log(), &[ScrollCommand::smooth(expected)][..]);
    }

    #[test]
    fn scroll_top_click_is_single_smooth_scroll(y in arb_scroll()) {
        let mut page = SimPage::new(1280.0);
        let control = page.push(SimElement::new("button").class("scroll-top"));
        let mut host = SimHost::new(page, InteractionConfig::default());
        host.page_mut().set_scroll_y(y);

        prop_assert_eq!(host.click(control), Disposition::PreventDefault);
        prop_assert_eq!(host.page().scroll_log(), &[ScrollCommand::smooth(0.0)][..]);
    }
}

#[test]
fn scrollspy_reference_layout() {
    // Sections at [0,300] and [300,600]; header 260 and lookahead 50 put the
    // spy position at 310 when scrolled to 0.
    let (mut page, _) = header_page(260.0);
    let nav = page.push(SimElement::new("nav"));
    let s1 = page.push(SimElement::new("a").attr("href", "#s1").child_of(nav));
    let s2 = page.push(SimElement::new("a").attr("href", "#s2").child_of(nav));
    page.push(SimElement::new("section").id("s1").span(0.0, 300.0));
    page.push(SimElement::new("section").id("s2").span(300.0, 300.0));
    let mut host = SimHost::new(page, InteractionConfig::default());

    let _ = host.load();
    assert!(!host.page().has_class_name(s1, "text-primary"));
    assert_eq!(
        host.page().classes(s2),
        vec!["text-primary", "font-semibold"]
    );
}
