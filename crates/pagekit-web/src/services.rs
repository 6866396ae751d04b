#![forbid(unsafe_code)]

//! Browser implementations of the non-DOM ports.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use pagekit_core::host::{
    ClipboardError, ClipboardWriter, HostError, KeyValueStore, LocalFuture, MediaQueries, Spawner,
};
use pagekit_core::timer::{Scheduler, TimerId, TimerTask};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Clipboard, Storage, Window};

use crate::dom::js_error;

// ─────────────────────────────────────────────────────────────────────────────
// localStorage
// ─────────────────────────────────────────────────────────────────────────────

/// `window.localStorage`. Blocked storage (private mode, sandboxed frames)
/// reports every operation as unavailable.
pub struct LocalStorageStore {
    storage: Option<Storage>,
}

impl LocalStorageStore {
    #[must_use]
    pub fn new(window: &Window) -> Self {
        Self {
            storage: window.local_storage().ok().flatten(),
        }
    }

    fn storage(&self) -> Result<&Storage, HostError> {
        self.storage
            .as_ref()
            .ok_or(HostError::Unavailable("localStorage"))
    }
}

fn storage_error(value: JsValue) -> HostError {
    HostError::Storage(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, HostError> {
        self.storage()?.get_item(key).map_err(storage_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), HostError> {
        self.storage()?.set_item(key, value).map_err(storage_error)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// matchMedia
// ─────────────────────────────────────────────────────────────────────────────

pub struct WindowMedia {
    window: Window,
}

impl WindowMedia {
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl MediaQueries for WindowMedia {
    fn matches(&self, query: &str) -> Result<bool, HostError> {
        self.window
            .match_media(query)
            .map_err(js_error)?
            .map(|list| list.matches())
            .ok_or(HostError::Unavailable("matchMedia"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// navigator.clipboard
// ─────────────────────────────────────────────────────────────────────────────

/// `navigator.clipboard.writeText`. Missing outside secure contexts.
pub struct NavigatorClipboard {
    window: Window,
}

impl NavigatorClipboard {
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    fn clipboard(&self) -> Option<Clipboard> {
        let navigator = self.window.navigator();
        js_sys::Reflect::get(&navigator, &JsValue::from_str("clipboard"))
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_null())
            .map(|value| value.unchecked_into::<Clipboard>())
    }
}

impl ClipboardWriter for NavigatorClipboard {
    fn write_text(&self, text: &str) -> Option<LocalFuture<Result<(), ClipboardError>>> {
        let promise = self.clipboard()?.write_text(text);
        Some(Box::pin(async move {
            JsFuture::from(promise).await.map(drop).map_err(|err| {
                ClipboardError::WriteRejected(err.as_string().unwrap_or_else(|| format!("{err:?}")))
            })
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// setTimeout
// ─────────────────────────────────────────────────────────────────────────────

/// `setTimeout`/`clearTimeout`, tracking which handles are still live.
pub struct BrowserScheduler {
    window: Window,
    live: Rc<RefCell<HashSet<i32>>>,
}

impl BrowserScheduler {
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self {
            window,
            live: Rc::new(RefCell::new(HashSet::new())),
        }
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Result<TimerId, HostError> {
        let handle = Rc::new(Cell::new(0));
        let own_handle = Rc::clone(&handle);
        let live = Rc::clone(&self.live);
        // A cancelled callback is never called, so JS keeps it until unload.
        let callback = Closure::once_into_js(move || {
            live.borrow_mut().remove(&own_handle.get());
            task();
        });
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
            .map_err(js_error)?;
        handle.set(id);
        self.live.borrow_mut().insert(id);
        Ok(TimerId::from_raw(u64::from(id.unsigned_abs())))
    }

    fn cancel(&self, id: TimerId) -> bool {
        let Ok(handle) = i32::try_from(id.raw()) else {
            return false;
        };
        if !self.live.borrow_mut().remove(&handle) {
            return false;
        }
        self.window.clear_timeout_with_handle(handle);
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// spawn_local
// ─────────────────────────────────────────────────────────────────────────────

/// Runs futures on the browser microtask queue.
#[derive(Debug, Default)]
pub struct LocalSpawner;

impl Spawner for LocalSpawner {
    fn spawn(&self, task: LocalFuture<()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
