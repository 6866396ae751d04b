#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use pagekit_core::clipboard::copy_to_clipboard;
use pagekit_core::toast::Toaster;
use pagekit_core::{Page, PageConfig, Services};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Document;

use crate::console::init_logging;
use crate::dom::WebDom;
use crate::services::{
    BrowserScheduler, LocalSpawner, LocalStorageStore, NavigatorClipboard, WindowMedia,
};

/// Page interactivity bound to the current document.
///
/// ```js
/// const kit = new PageKitWeb();
/// kit.mount({ messages: { email_copied: "Copied!" } });
/// ```
#[wasm_bindgen]
pub struct PageKitWeb {
    dom: Rc<WebDom>,
    services: Services,
    toaster: Rc<Toaster<WebDom>>,
    page: Rc<RefCell<Option<Page<WebDom>>>>,
    on_ready: Option<Closure<dyn FnMut()>>,
}

#[wasm_bindgen]
impl PageKitWeb {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<PageKitWeb, JsValue> {
        init_logging();
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let dom = Rc::new(WebDom::new(document));
        let services = Services {
            store: Rc::new(LocalStorageStore::new(&window)),
            media: Rc::new(WindowMedia::new(window.clone())),
            clipboard: Rc::new(NavigatorClipboard::new(window.clone())),
            scheduler: Rc::new(BrowserScheduler::new(window)),
            spawner: Rc::new(LocalSpawner),
        };
        let toaster = Rc::new(Toaster::new(
            Rc::clone(&dom),
            Rc::clone(&services.scheduler),
            &PageConfig::default(),
        ));
        Ok(Self {
            dom,
            services,
            toaster,
            page: Rc::new(RefCell::new(None)),
            on_ready: None,
        })
    }

    /// Install the page components.
    ///
    /// `options` is a partial configuration object. While the document is
    /// still loading, mounting waits for `DOMContentLoaded`. Mounting an
    /// already mounted page does nothing.
    pub fn mount(&mut self, options: Option<JsValue>) -> Result<(), JsValue> {
        let config = parse_options(options)?;
        if self.page.borrow().is_some() || self.on_ready.is_some() {
            tracing::warn!("pagekit already mounted");
            return Ok(());
        }

        let dom = Rc::clone(&self.dom);
        let services = self.services.clone();
        let slot = Rc::clone(&self.page);
        let mut mount_now = move || {
            if slot.borrow().is_none() {
                let page = Page::mount(Rc::clone(&dom), &services, &config);
                *slot.borrow_mut() = Some(page);
            }
        };

        let document: &Document = self.dom.document();
        if document.ready_state() == "loading" {
            let callback = Closure::<dyn FnMut()>::new(mount_now);
            document.add_event_listener_with_callback(
                "DOMContentLoaded",
                callback.as_ref().unchecked_ref(),
            )?;
            self.on_ready = Some(callback);
            tracing::debug!("pagekit mount deferred until DOMContentLoaded");
        } else {
            mount_now();
        }
        Ok(())
    }

    /// Show a toast. `duration_ms` defaults to the configured duration.
    pub fn notify(&self, message: &str, duration_ms: Option<u32>) {
        let toaster = self
            .page
            .borrow()
            .as_ref()
            .map_or_else(|| Rc::clone(&self.toaster), |page| Rc::clone(page.toaster()));
        match duration_ms {
            Some(ms) => toaster.notify_for(message, Duration::from_millis(u64::from(ms))),
            None => toaster.notify(message),
        }
    }

    /// Copy `text` to the clipboard. Resolves to whether it worked.
    #[wasm_bindgen(js_name = copyText)]
    pub fn copy_text(&self, text: String) -> js_sys::Promise {
        let dom = Rc::clone(&self.dom);
        let clipboard = Rc::clone(&self.services.clipboard);
        wasm_bindgen_futures::future_to_promise(async move {
            let copied = copy_to_clipboard(&*dom, &*clipboard, &text).await;
            Ok(JsValue::from_bool(copied))
        })
    }

    /// Explicit teardown for JS callers: cancels pending timers and detaches
    /// every listener the page registered.
    pub fn destroy(&mut self) {
        if let Some(callback) = self.on_ready.take() {
            let removed = self.dom.document().remove_event_listener_with_callback(
                "DOMContentLoaded",
                callback.as_ref().unchecked_ref(),
            );
            if let Err(err) = removed {
                tracing::debug!(error = ?err, "ready listener not detached");
            }
        }
        let mut cancelled = self.toaster.teardown();
        if let Some(page) = self.page.borrow_mut().take() {
            cancelled += page.teardown();
        }
        let detached = self.dom.detach_listeners();
        tracing::debug!(cancelled, detached, "pagekit destroyed");
    }
}

fn parse_options(options: Option<JsValue>) -> Result<PageConfig, JsValue> {
    let Some(options) = options.filter(|o| !o.is_undefined() && !o.is_null()) else {
        return Ok(PageConfig::default());
    };
    let raw: String = js_sys::JSON::stringify(&options)?.into();
    PageConfig::from_json(&raw).map_err(|err| JsValue::from_str(&err.to_string()))
}
