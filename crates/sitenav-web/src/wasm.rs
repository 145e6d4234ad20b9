#![forbid(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use sitenav_core::{
    Controller, Deferred, Disposition, Page, PageEvent, ScrollBehavior, ScrollCommand,
};
use tracing::{debug, trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlAnchorElement, HtmlElement, ScrollToOptions, Window,
};

use crate::logging::init_console_logging;
use crate::options::WebOptions;

/// [`Page`] over the live document.
///
/// Browser API failures are logged and read as "not found" / zero so the
/// controller degrades silently, as it does for missing elements.
#[derive(Debug, Clone)]
pub struct DomPage {
    window: Window,
    document: Document,
}

impl DomPage {
    pub fn new(window: Window) -> Result<Self, JsValue> {
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        Ok(Self { window, document })
    }

    fn html(element: &Element) -> Option<&HtmlElement> {
        element.dyn_ref::<HtmlElement>()
    }
}

impl Page for DomPage {
    type Element = Element;

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or_else(|err| {
            warn!(?err, "scrollY unavailable");
            0.0
        })
    }

    fn viewport_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|width| width.as_f64())
            .unwrap_or(0.0)
    }

    fn location_hash(&self) -> Option<String> {
        self.window
            .location()
            .hash()
            .ok()
            .filter(|hash| !hash.is_empty())
    }

    fn select_one(&self, selector: &str) -> Option<Element> {
        self.document
            .query_selector(selector)
            .unwrap_or_else(|err| {
                warn!(selector, ?err, "querySelector rejected selector");
                None
            })
    }

    fn select_all(&self, selector: &str) -> Vec<Element> {
        let list = match self.document.query_selector_all(selector) {
            Ok(list) => list,
            Err(err) => {
                warn!(selector, ?err, "querySelectorAll rejected selector");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|idx| list.item(idx))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn offset_top(&self, element: &Element) -> f64 {
        Self::html(element).map_or(0.0, |el| f64::from(el.offset_top()))
    }

    fn offset_height(&self, element: &Element) -> f64 {
        Self::html(element).map_or(0.0, |el| f64::from(el.offset_height()))
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn link_hash(&self, element: &Element) -> Option<String> {
        element
            .dyn_ref::<HtmlAnchorElement>()
            .map(HtmlAnchorElement::hash)
            .filter(|hash| !hash.is_empty())
    }

    fn has_class(&self, element: &Element, class: &str) -> bool {
        element.class_list().contains(class)
    }

    fn add_class(&mut self, element: &Element, class: &str) {
        if let Err(err) = element.class_list().add_1(class) {
            warn!(class, ?err, "classList.add failed");
        }
    }

    fn remove_class(&mut self, element: &Element, class: &str) {
        if let Err(err) = element.class_list().remove_1(class) {
            warn!(class, ?err, "classList.remove failed");
        }
    }

    fn toggle_class(&mut self, element: &Element, class: &str) {
        if let Err(err) = element.class_list().toggle(class) {
            warn!(class, ?err, "classList.toggle failed");
        }
    }

    fn scroll_to(&mut self, command: ScrollCommand) {
        let options = ScrollToOptions::new();
        options.set_top(command.top);
        options.set_behavior(match command.behavior {
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
        });
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn decode_fragment_id(&self, id: &str) -> Option<String> {
        if !id.contains('%') {
            return None;
        }
        match js_sys::decode_uri_component(id) {
            Ok(decoded) => Some(String::from(decoded)),
            Err(err) => {
                trace!(id, ?err, "fragment id is not percent-decodable");
                None
            }
        }
    }
}

/// State shared between the exported handle and every DOM callback.
///
/// Callbacks hold a [`Weak`] reference so dropping [`PageInteractions`] frees
/// the controller even if a listener somehow outlives it.
struct Shared {
    window: Window,
    controller: RefCell<Controller<DomPage>>,
    timeouts: RefCell<Vec<i32>>,
    destroyed: Cell<bool>,
}

fn dispatch(shared: &Rc<Shared>, event: PageEvent) -> Disposition {
    if shared.destroyed.get() {
        return Disposition::Default;
    }
    let (disposition, deferred) = {
        let Ok(mut controller) = shared.controller.try_borrow_mut() else {
            warn!(?event, "re-entrant dispatch dropped");
            return Disposition::Default;
        };
        let disposition = controller.dispatch(event);
        (disposition, controller.take_deferred())
    };
    for task in deferred {
        schedule(shared, task);
    }
    disposition
}

fn schedule(shared: &Rc<Shared>, deferred: Deferred) {
    let Deferred { delay, task } = deferred;
    let weak: Weak<Shared> = Rc::downgrade(shared);
    let callback = Closure::once_into_js(move || {
        if let Some(shared) = weak.upgrade() {
            let _ = dispatch(&shared, PageEvent::Timer(task));
        }
    });
    let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    match shared
        .window
        .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
    {
        Ok(handle) => {
            trace!(handle, millis, "timeout scheduled");
            shared.timeouts.borrow_mut().push(handle);
        }
        Err(err) => warn!(?err, "setTimeout failed, deferred task dropped"),
    }
}

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

fn listen(
    shared: &Rc<Shared>,
    target: &EventTarget,
    kind: &'static str,
    event: PageEvent,
) -> Result<Listener, JsValue> {
    let weak = Rc::downgrade(shared);
    let callback = Closure::<dyn FnMut(Event)>::new(move |dom_event: Event| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        if dispatch(&shared, event.clone()).is_prevented() {
            dom_event.prevent_default();
        }
    });
    target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
    Ok(Listener {
        target: target.clone(),
        kind,
        callback,
    })
}

/// Live page interactions returned by [`start`].
///
/// Owns every registered listener. Call `destroy()` (or let the handle be
/// freed) to detach them.
#[wasm_bindgen]
pub struct PageInteractions {
    shared: Rc<Shared>,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl PageInteractions {
    /// Number of DOM listeners currently attached.
    #[wasm_bindgen(getter, js_name = listenerCount)]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Detach every listener and cancel pending timeouts. Idempotent.
    pub fn destroy(&mut self) {
        if self.shared.destroyed.replace(true) {
            return;
        }
        for listener in self.listeners.drain(..) {
            if let Err(err) = listener.target.remove_event_listener_with_callback(
                listener.kind,
                listener.callback.as_ref().unchecked_ref(),
            ) {
                warn!(kind = listener.kind, ?err, "removeEventListener failed");
            }
        }
        for handle in self.shared.timeouts.borrow_mut().drain(..) {
            self.shared.window.clear_timeout_with_handle(handle);
        }
        debug!("page interactions destroyed");
    }
}

impl PageInteractions {
    fn attach(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        event: PageEvent,
    ) -> Result<(), JsValue> {
        let listener = listen(&self.shared, target, kind, event)?;
        self.listeners.push(listener);
        Ok(())
    }
}

impl Drop for PageInteractions {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Capture the page, register listeners and return the live handle.
///
/// `options` is an optional plain object; see [`WebOptions`]. When the document
/// has already finished loading, the load behaviors run immediately.
#[wasm_bindgen]
pub fn start(options: Option<JsValue>) -> Result<PageInteractions, JsValue> {
    let options = match options {
        Some(value) if !value.is_undefined() && !value.is_null() => {
            let json = String::from(js_sys::JSON::stringify(&value)?);
            WebOptions::from_json_str(&json)
        }
        _ => Ok(WebOptions::default()),
    }
    .map_err(|err| JsValue::from_str(&err.to_string()))?;
    init_console_logging(options.log_level);

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let page = DomPage::new(window.clone())?;
    let document = page.document.clone();
    let controller = Controller::new(page, options.interaction);

    let bindings = controller.bindings();
    let toggle = controller.mobile_toggle_element().cloned();
    let scroll_top = controller.scroll_top_element().cloned();
    let nav_links = controller.nav_link_elements().to_vec();
    let anchors = controller.anchor_elements().to_vec();

    let mut interactions = PageInteractions {
        shared: Rc::new(Shared {
            window: window.clone(),
            controller: RefCell::new(controller),
            timeouts: RefCell::new(Vec::new()),
            destroyed: Cell::new(false),
        }),
        listeners: Vec::new(),
    };

    // Registration order decides callback order for elements bound twice
    // (a nav link that is also a same-page anchor closes the menu first).
    interactions.attach(document.as_ref(), "scroll", PageEvent::Scroll)?;
    interactions.attach(window.as_ref(), "load", PageEvent::Load)?;
    if let Some(toggle) = &toggle {
        interactions.attach(toggle.as_ref(), "click", PageEvent::MobileToggleClick)?;
    }
    for (idx, link) in nav_links.iter().enumerate() {
        interactions.attach(link.as_ref(), "click", PageEvent::NavLinkClick(idx))?;
    }
    if let Some(control) = &scroll_top {
        interactions.attach(control.as_ref(), "click", PageEvent::ScrollTopClick)?;
    }
    for (idx, anchor) in anchors.iter().enumerate() {
        interactions.attach(anchor.as_ref(), "click", PageEvent::AnchorClick(idx))?;
    }
    debug!(?bindings, listeners = interactions.listeners.len(), "page interactions started");

    if crate::document_already_loaded(&document.ready_state()) {
        let _ = dispatch(&interactions.shared, PageEvent::Load);
    }
    Ok(interactions)
}
