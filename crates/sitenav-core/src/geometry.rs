#![forbid(unsafe_code)]

//! Scroll geometry shared by the behaviors.
//!
//! All values are CSS pixels in document coordinates.

/// Vertical span of a page section.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SectionSpan {
    /// Top edge (`offsetTop`).
    pub top: f64,
    /// Rendered height (`offsetHeight`).
    pub height: f64,
}

impl SectionSpan {
    #[inline]
    #[must_use]
    pub const fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    /// Bottom edge.
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Both edges are inclusive.
    #[inline]
    #[must_use]
    pub fn contains(&self, position: f64) -> bool {
        position >= self.top && position <= self.bottom()
    }
}

/// Whether a scroll offset is past the elevation threshold (strict).
#[inline]
#[must_use]
pub fn past_threshold(scroll_y: f64, threshold: f64) -> bool {
    scroll_y > threshold
}

/// Whether a viewport width counts as mobile (strict).
#[inline]
#[must_use]
pub fn is_narrow(viewport_width: f64, breakpoint: f64) -> bool {
    viewport_width < breakpoint
}

/// Scroll target that puts `section_top` just below a sticky header.
#[inline]
#[must_use]
pub fn anchor_target(section_top: f64, header_height: f64, margin: f64) -> f64 {
    section_top - header_height - margin
}

/// Spy position used to decide which section is in view.
#[inline]
#[must_use]
pub fn spy_position(scroll_y: f64, header_height: f64, lookahead: f64) -> f64 {
    scroll_y + header_height + lookahead
}
