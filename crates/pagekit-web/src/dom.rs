#![forbid(unsafe_code)]

//! [`Dom`] over the live browser document.

use std::cell::RefCell;

use pagekit_core::host::{Dom, DomEvent, DomEventKind, HostError, Listener};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlButtonElement, HtmlDocument, HtmlElement,
    HtmlFormElement, HtmlInputElement, HtmlTextAreaElement,
};

/// Convert a thrown JS value into a host error.
pub(crate) fn js_error(value: JsValue) -> HostError {
    HostError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

/// DOM mutations the components treat as best-effort: a throw is logged
/// and otherwise ignored.
fn logged<T>(result: Result<T, JsValue>, call: &'static str) {
    if let Err(err) = result {
        tracing::debug!(call, error = %js_error(err), "dom call failed");
    }
}

struct WebEvent(Event);

impl DomEvent for WebEvent {
    fn prevent_default(&self) {
        self.0.prevent_default();
    }
}

struct Registration {
    target: EventTarget,
    kind: DomEventKind,
    callback: Closure<dyn FnMut(Event)>,
}

/// The browser document. Keeps every listener closure it registers so they
/// can be detached on teardown.
pub struct WebDom {
    document: Document,
    listeners: RefCell<Vec<Registration>>,
}

impl WebDom {
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            listeners: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Remove every listener registered through [`Dom::listen`].
    pub fn detach_listeners(&self) -> usize {
        let registrations = std::mem::take(&mut *self.listeners.borrow_mut());
        let count = registrations.len();
        for reg in registrations {
            let removed = reg.target.remove_event_listener_with_callback(
                reg.kind.name(),
                reg.callback.as_ref().unchecked_ref(),
            );
            logged(removed, "removeEventListener");
        }
        count
    }
}

impl std::fmt::Debug for WebDom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDom")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl Dom for WebDom {
    type Node = Element;

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_within(&self, scope: &Element, selector: &str) -> Option<Element> {
        scope.query_selector(selector).ok().flatten()
    }

    fn create_element(&self, tag: &str) -> Result<Element, HostError> {
        self.document.create_element(tag).map_err(js_error)
    }

    fn append_child(&self, parent: &Element, child: &Element) -> Result<(), HostError> {
        parent.append_child(child).map(drop).map_err(js_error)
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn add_class(&self, node: &Element, class: &str) {
        logged(node.class_list().add_1(class), "classList.add");
    }

    fn remove_class(&self, node: &Element, class: &str) {
        logged(node.class_list().remove_1(class), "classList.remove");
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn text_content(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text_content(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        logged(node.set_attribute(name, value), "setAttribute");
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        if let Some(el) = node.dyn_ref::<HtmlElement>() {
            logged(el.style().set_property(property, value), "style.setProperty");
        }
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else if let Some(button) = node.dyn_ref::<HtmlButtonElement>() {
            button.value()
        } else {
            node.get_attribute("value").unwrap_or_default()
        }
    }

    fn set_value(&self, node: &Element, value: &str) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else if let Some(button) = node.dyn_ref::<HtmlButtonElement>() {
            button.set_value(value);
        }
    }

    fn set_disabled(&self, node: &Element, disabled: bool) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_disabled(disabled);
        } else if let Some(button) = node.dyn_ref::<HtmlButtonElement>() {
            button.set_disabled(disabled);
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.set_disabled(disabled);
        }
    }

    fn is_disabled(&self, node: &Element) -> bool {
        node.has_attribute("disabled")
    }

    fn reset_form(&self, form: &Element) {
        if let Some(form) = form.dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
    }

    fn force_layout(&self, node: &Element) {
        if let Some(el) = node.dyn_ref::<HtmlElement>() {
            // Reading a layout property flushes pending style changes.
            let _ = el.offset_width();
        }
    }

    fn focus(&self, node: &Element) {
        if let Some(el) = node.dyn_ref::<HtmlElement>() {
            logged(el.focus(), "focus");
        }
    }

    fn select(&self, node: &Element) {
        if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.select();
        } else if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.select();
        }
    }

    fn exec_copy(&self) -> Result<bool, HostError> {
        self.document
            .dyn_ref::<HtmlDocument>()
            .ok_or(HostError::Unavailable("document.execCommand"))?
            .exec_command("copy")
            .map_err(js_error)
    }

    fn listen(
        &self,
        node: &Element,
        kind: DomEventKind,
        mut listener: Listener,
    ) -> Result<(), HostError> {
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            listener(&WebEvent(event));
        });
        node.add_event_listener_with_callback(kind.name(), callback.as_ref().unchecked_ref())
            .map_err(js_error)?;
        self.listeners.borrow_mut().push(Registration {
            target: node.clone().into(),
            kind,
            callback,
        });
        Ok(())
    }
}
