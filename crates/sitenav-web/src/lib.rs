#![forbid(unsafe_code)]

//! WASM host for `sitenav`.
//!
//! Binds the host-agnostic [`sitenav_core::Controller`] to the live document:
//! - a `web-sys` implementation of [`sitenav_core::Page`],
//! - DOM listener registration (scroll, load, clicks) with `preventDefault`
//!   driven by the controller's [`sitenav_core::Disposition`],
//! - `setTimeout` scheduling for deferred work,
//! - `tracing` output forwarded to the browser console.
//!
//! JS usage:
//!
//! ```js
//! import init, { start } from "./sitenav_web.js";
//! await init();
//! const interactions = start({ log_level: "debug" });
//! // later, e.g. on client-side navigation:
//! interactions.destroy();
//! ```

pub mod options;

#[cfg(target_arch = "wasm32")]
mod logging;
#[cfg(target_arch = "wasm32")]
mod wasm;

pub use options::{OptionsError, WebOptions};

#[cfg(target_arch = "wasm32")]
pub use wasm::{DomPage, PageInteractions, start};

/// Whether `document.readyState` means the `load` event has already fired.
///
/// `start` runs the load behaviors itself in that case.
pub fn document_already_loaded(ready_state: &str) -> bool {
    ready_state == "complete"
}

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct PageInteractions;

#[cfg(not(target_arch = "wasm32"))]
impl PageInteractions {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }

    pub fn listener_count(&self) -> usize {
        0
    }

    pub fn destroy(&mut self) {}
}
