#![forbid(unsafe_code)]

//! Structured log events emitted by the components.
//!
//!   cargo test -p pagekit-core --features tracing --test tracing_events

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use pagekit_core::clipboard::copy_to_clipboard;
use pagekit_core::memory::{
    ClipboardMode, MemoryClipboard, MemoryDom, MemoryMedia, MemoryStore, TaskQueue,
};
use pagekit_core::timer::ManualScheduler;
use pagekit_core::{Page, PageConfig, Services};
use tracing_subscriber::layer::SubscriberExt;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor {
    message: String,
    fields: HashMap<String, String>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor {
            message: String::new(),
            fields: HashMap::new(),
        };
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

fn with_captured_events<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: Arc::clone(&events),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn find<'a>(events: &'a [CapturedEvent], message: &str) -> Option<&'a CapturedEvent> {
    events.iter().find(|e| e.message == message)
}

fn services(store: MemoryStore, media: MemoryMedia) -> Services {
    Services {
        store: Rc::new(store),
        media: Rc::new(media),
        clipboard: Rc::new(MemoryClipboard::new(ClipboardMode::Accept)),
        scheduler: Rc::new(ManualScheduler::new()),
        spawner: Rc::new(TaskQueue::new()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn mount_reports_installed_components() {
    let events = with_captured_events(|| {
        let dom = Rc::new(MemoryDom::new());
        dom.insert(dom.body_id(), "button", &[("id", "boton-tema")]);
        let media = MemoryMedia::new().matching("(prefers-color-scheme: dark)");
        Page::mount(dom, &services(MemoryStore::new(), media), &PageConfig::default());
    });

    let mounted = find(&events, "page mounted").expect("mount event");
    assert_eq!(mounted.level, tracing::Level::INFO);
    assert_eq!(mounted.fields.get("theme").map(String::as_str), Some("true"));
    assert_eq!(mounted.fields.get("form").map(String::as_str), Some("false"));

    let resolved = find(&events, "theme resolved").expect("theme event");
    assert_eq!(resolved.fields.get("theme").map(String::as_str), Some("dark"));
    assert!(find(&events, "contact form skipped").is_some());
}

#[test]
fn clipboard_fallback_is_a_warning() {
    let events = with_captured_events(|| {
        let dom = MemoryDom::new();
        let clipboard = MemoryClipboard::new(ClipboardMode::Reject("denied".into()));
        assert!(pollster::block_on(copy_to_clipboard(&dom, &clipboard, "a@b.c")));
    });

    let fallback = find(&events, "clipboard fallback triggered").expect("fallback event");
    assert_eq!(fallback.level, tracing::Level::WARN);
    assert_eq!(fallback.fields.get("fallback").map(String::as_str), Some("legacy"));
    let write = find(&events, "clipboard write").expect("write event");
    assert_eq!(write.fields.get("path").map(String::as_str), Some("legacy"));
}

#[test]
fn unwritable_store_warns_without_undoing_the_toggle() {
    let store = MemoryStore::new();
    store.fail_writes(true);
    let svc = services(store, MemoryMedia::new());
    let dom = Rc::new(MemoryDom::new());
    dom.insert(dom.body_id(), "button", &[("id", "boton-tema")]);
    let page = Page::mount(Rc::clone(&dom), &svc, &PageConfig::default());

    let events = with_captured_events(|| {
        if let Some(theme) = page.theme() {
            theme.on_click();
        }
    });

    let warned = find(&events, "theme preference not persisted").expect("storage warning");
    assert_eq!(warned.level, tracing::Level::WARN);
    assert!(warned.fields.contains_key("error"));
    assert!(pagekit_core::Dom::has_class(&*dom, &dom.body_id(), "dark"));
}
