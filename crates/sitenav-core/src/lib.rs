#![forbid(unsafe_code)]

//! `sitenav-core` drives the interactive behavior of a static landing page.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment pushes [`PageEvent`]s and
//!   reads back a [`Disposition`] plus any [`Deferred`] work to schedule.
//! - **DOM as the source of truth**: every handler re-reads scroll position and
//!   geometry through the [`Page`] trait; nothing is cached between events.
//! - **No blocking / no clocks**: suitable for `wasm32-unknown-unknown`. Timers
//!   are described, never awaited.
//!
//! The browser binding lives in `sitenav-web`. The [`sim`] module provides an
//! in-memory page and host used by the test suite.

pub mod config;
pub mod controller;
pub mod geometry;
pub mod page;
pub mod sim;

pub use config::{ClassNames, ConfigError, InteractionConfig, Selectors, Thresholds};
pub use controller::{Bindings, Controller, Deferred, DeferredTask, Disposition, PageEvent};
pub use geometry::SectionSpan;
pub use page::{Page, ScrollBehavior, ScrollCommand, fragment_id};
