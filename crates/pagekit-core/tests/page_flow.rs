#![forbid(unsafe_code)]

//! End-to-end page behaviour against the in-memory host.
//!
//! Each test builds the contact page markup in a [`MemoryDom`], mounts a
//! [`Page`], then drives it purely through dispatched DOM events, spawned
//! futures and a [`ManualScheduler`].

use std::rc::Rc;
use std::time::Duration;

use pagekit_core::memory::{
    ClipboardMode, CopyAttempt, MemoryClipboard, MemoryDom, MemoryMedia, MemoryStore, NodeId,
    TaskQueue,
};
use pagekit_core::timer::ManualScheduler;
use pagekit_core::{Dom, DomEventKind, Page, PageConfig, Services, Theme};
use pretty_assertions::assert_eq;

// ============================================================================
// Fixture
// ============================================================================

struct Markup {
    copy_button: NodeId,
    form: NodeId,
    name: NodeId,
    email: NodeId,
    name_error: NodeId,
    email_error: NodeId,
    submit: NodeId,
    theme_button: NodeId,
}

struct Fixture {
    dom: Rc<MemoryDom>,
    store: Rc<MemoryStore>,
    clipboard: Rc<MemoryClipboard>,
    scheduler: Rc<ManualScheduler>,
    tasks: Rc<TaskQueue>,
    markup: Markup,
    page: Page<MemoryDom>,
}

struct Host {
    store: MemoryStore,
    media: MemoryMedia,
    clipboard: ClipboardMode,
    copy_attribute: &'static str,
}

impl Default for Host {
    fn default() -> Self {
        Self {
            store: MemoryStore::new(),
            media: MemoryMedia::new(),
            clipboard: ClipboardMode::Accept,
            copy_attribute: "hola@example.com",
        }
    }
}

fn build_markup(dom: &MemoryDom, copy_attribute: &str) -> Markup {
    let body = dom.body_id();
    let header = dom.insert(body, "header", &[]);
    let theme_button = dom.insert(header, "button", &[("id", "boton-tema")]);

    let contact = dom.insert(body, "section", &[("id", "contacto")]);
    dom.insert_text(contact, "span", &[("class", "texto-correo")], " hola@example.com ");
    let copy_button = dom.insert(
        contact,
        "button",
        &[("class", "boton-copiar"), ("data-correo", copy_attribute)],
    );

    let form = dom.insert(contact, "form", &[("class", "formulario-contacto")]);
    let name = dom.insert(form, "input", &[("id", "nombre"), ("type", "text")]);
    let name_error = dom.insert(form, "span", &[("id", "error-nombre")]);
    let email = dom.insert(form, "input", &[("id", "correo"), ("type", "email")]);
    let email_error = dom.insert(form, "span", &[("id", "error-correo")]);
    let submit = dom.insert(
        form,
        "input",
        &[("id", "boton-enviar"), ("type", "submit"), ("value", "Send")],
    );

    Markup {
        copy_button,
        form,
        name,
        email,
        name_error,
        email_error,
        submit,
        theme_button,
    }
}

fn mount(host: Host) -> Fixture {
    let dom = Rc::new(MemoryDom::new());
    let markup = build_markup(&dom, host.copy_attribute);
    let store = Rc::new(host.store);
    let clipboard = Rc::new(MemoryClipboard::new(host.clipboard));
    let scheduler = Rc::new(ManualScheduler::new());
    let tasks = Rc::new(TaskQueue::new());
    let services = Services {
        store: Rc::clone(&store) as _,
        media: Rc::new(host.media),
        clipboard: Rc::clone(&clipboard) as _,
        scheduler: Rc::clone(&scheduler) as _,
        spawner: Rc::clone(&tasks) as _,
    };
    let page = Page::mount(Rc::clone(&dom), &services, &PageConfig::default());
    Fixture {
        dom,
        store,
        clipboard,
        scheduler,
        tasks,
        markup,
        page,
    }
}

impl Fixture {
    /// Text of every toast currently attached to the body.
    fn toasts(&self) -> Vec<String> {
        self.dom
            .children(self.dom.body_id())
            .into_iter()
            .filter(|node| self.dom.has_class(node, "toast"))
            .map(|node| self.dom.text_content(&node))
            .collect()
    }

    fn fill(&self, name: &str, email: &str) {
        self.dom.set_value(&self.markup.name, name);
        self.dom.set_value(&self.markup.email, email);
    }

    fn submit(&self) -> bool {
        self.dom
            .dispatch(self.markup.form, DomEventKind::Submit)
            .default_prevented()
    }

    fn click_theme(&self) {
        self.dom.dispatch(self.markup.theme_button, DomEventKind::Click);
    }

    fn body_is_dark(&self) -> bool {
        self.dom.has_class(&self.dom.body_id(), "dark")
    }
}

// ============================================================================
// Bootstrap
// ============================================================================

#[test]
fn mount_installs_every_component_present_in_the_markup() {
    let fx = mount(Host::default());
    assert!(fx.page.email_copy().is_some());
    assert!(fx.page.form().is_some());
    assert!(fx.page.theme().is_some());
    assert_eq!(fx.dom.listener_count(fx.markup.copy_button, DomEventKind::Click), 1);
    assert_eq!(fx.dom.listener_count(fx.markup.form, DomEventKind::Submit), 1);
    assert_eq!(fx.dom.listener_count(fx.markup.name, DomEventKind::Blur), 1);
    assert_eq!(fx.dom.listener_count(fx.markup.email, DomEventKind::Blur), 1);
    assert_eq!(fx.dom.listener_count(fx.markup.theme_button, DomEventKind::Click), 1);
}

#[test]
fn reduced_motion_preference_marks_the_body() {
    let fx = mount(Host {
        media: MemoryMedia::new().matching("(prefers-reduced-motion: reduce)"),
        ..Host::default()
    });
    assert!(fx.page.reduced_motion());
    assert!(fx.dom.has_class(&fx.dom.body_id(), "movimiento-reducido"));
}

// ============================================================================
// Email copy
// ============================================================================

#[test]
fn copy_click_writes_the_attribute_address_and_toasts_once() {
    let fx = mount(Host::default());
    fx.dom.dispatch(fx.markup.copy_button, DomEventKind::Click);
    assert!(fx.toasts().is_empty());
    assert_eq!(fx.tasks.run_until_stalled(), 1);

    assert_eq!(fx.clipboard.contents().as_deref(), Some("hola@example.com"));
    assert_eq!(fx.toasts(), vec!["Email copied to clipboard"]);
}

#[test]
fn copy_click_falls_back_to_legacy_when_the_api_is_missing() {
    let fx = mount(Host {
        clipboard: ClipboardMode::Missing,
        copy_attribute: "",
        ..Host::default()
    });
    assert_eq!(
        fx.page.email_copy().and_then(|c| c.address().map(str::to_owned)),
        Some("hola@example.com".to_owned())
    );
    fx.dom.dispatch(fx.markup.copy_button, DomEventKind::Click);
    fx.tasks.run_until_stalled();

    assert_eq!(
        fx.dom.copy_attempts(),
        vec![CopyAttempt {
            selection: Some("hola@example.com".into()),
            attached: true,
        }]
    );
    assert_eq!(fx.toasts(), vec!["Email copied to clipboard"]);
    assert!(fx.dom.query("textarea").is_none());
}

#[test]
fn copy_failure_on_both_paths_reports_manual_copy() {
    let fx = mount(Host {
        clipboard: ClipboardMode::Reject("NotAllowedError".into()),
        ..Host::default()
    });
    fx.dom.set_copy_result(Ok(false));
    fx.dom.dispatch(fx.markup.copy_button, DomEventKind::Click);
    fx.tasks.run_until_stalled();
    assert_eq!(fx.toasts(), vec!["Could not copy. Copy it manually."]);
}

#[test]
fn copy_without_any_address_says_so() {
    let dom = Rc::new(MemoryDom::new());
    let button = dom.insert(dom.body_id(), "button", &[("class", "boton-copiar")]);
    let tasks = Rc::new(TaskQueue::new());
    let clipboard = Rc::new(MemoryClipboard::new(ClipboardMode::Accept));
    let services = Services {
        store: Rc::new(MemoryStore::new()),
        media: Rc::new(MemoryMedia::new()),
        clipboard: Rc::clone(&clipboard) as _,
        scheduler: Rc::new(ManualScheduler::new()),
        spawner: Rc::clone(&tasks) as _,
    };
    let _page = Page::mount(Rc::clone(&dom), &services, &PageConfig::default());

    dom.dispatch(button, DomEventKind::Click);
    assert_eq!(tasks.pending(), 0);
    assert_eq!(clipboard.requests(), 0);
    let toast = dom.query(".toast").expect("toast shown");
    assert_eq!(dom.text_content(&toast), "No email available");
}

// ============================================================================
// Contact form
// ============================================================================

#[test]
fn empty_submit_shows_both_errors_and_schedules_nothing() {
    let fx = mount(Host::default());
    assert!(fx.submit());
    assert_eq!(fx.dom.text_content(&fx.markup.name_error), "Name is required");
    assert_eq!(fx.dom.text_content(&fx.markup.email_error), "Email is required");
    assert!(fx.dom.has_class(&fx.markup.name, "entrada--error"));
    assert!(fx.dom.has_class(&fx.markup.email, "entrada--error"));
    assert_eq!(fx.scheduler.pending(), 0);
    assert!(!fx.dom.is_disabled(&fx.markup.submit));
}

#[test]
fn malformed_email_shows_only_the_format_error() {
    let fx = mount(Host::default());
    fx.fill("Ana", "ana@example");
    fx.submit();
    assert_eq!(fx.dom.text_content(&fx.markup.name_error), "");
    assert_eq!(fx.dom.text_content(&fx.markup.email_error), "Enter a valid email");
}

#[test]
fn valid_submit_simulates_sending_then_resets() {
    let fx = mount(Host::default());
    fx.fill("Ana", "ana@example.com");
    assert!(fx.submit());

    assert!(fx.dom.is_disabled(&fx.markup.submit));
    assert_eq!(fx.dom.value(&fx.markup.submit), "Sending...");
    assert!(fx.toasts().is_empty());

    fx.scheduler.advance(Duration::from_millis(999));
    assert!(fx.dom.is_disabled(&fx.markup.submit));

    fx.scheduler.advance(Duration::from_millis(1));
    assert!(!fx.dom.is_disabled(&fx.markup.submit));
    assert_eq!(fx.dom.value(&fx.markup.submit), "Send");
    assert_eq!(fx.dom.value(&fx.markup.name), "");
    assert_eq!(fx.dom.value(&fx.markup.email), "");
    assert_eq!(fx.toasts(), vec!["Form sent (simulated)"]);
}

#[test]
fn blur_validates_a_single_field() {
    let fx = mount(Host::default());
    fx.dom.set_value(&fx.markup.email, "nope");
    fx.dom.dispatch(fx.markup.email, DomEventKind::Blur);
    assert_eq!(fx.dom.text_content(&fx.markup.email_error), "Enter a valid email");
    assert_eq!(fx.dom.text_content(&fx.markup.name_error), "");

    fx.dom.set_value(&fx.markup.email, "  ana@example.com ");
    fx.dom.dispatch(fx.markup.email, DomEventKind::Blur);
    assert_eq!(fx.dom.text_content(&fx.markup.email_error), "");
    assert!(!fx.dom.has_class(&fx.markup.email, "entrada--error"));
}

// ============================================================================
// Theme
// ============================================================================

#[test]
fn theme_toggles_and_persists() {
    let fx = mount(Host::default());
    assert!(!fx.body_is_dark());
    assert_eq!(
        fx.dom.attribute(&fx.markup.theme_button, "aria-pressed").as_deref(),
        Some("false")
    );

    fx.click_theme();
    assert!(fx.body_is_dark());
    assert_eq!(
        fx.dom.attribute(&fx.markup.theme_button, "aria-pressed").as_deref(),
        Some("true")
    );
    assert_eq!(fx.dom.text_content(&fx.markup.theme_button), "☀️ Light mode");
    assert_eq!(fx.store.entry("tema").as_deref(), Some("dark"));

    fx.click_theme();
    assert!(!fx.body_is_dark());
    assert_eq!(fx.dom.text_content(&fx.markup.theme_button), "🌙 Dark mode");
    assert_eq!(fx.store.entry("tema").as_deref(), Some("light"));
}

#[test]
fn legacy_stored_value_resolves_to_dark_on_load() {
    let fx = mount(Host {
        store: MemoryStore::with_entries(&[("tema", "oscuro")]),
        ..Host::default()
    });
    assert!(fx.body_is_dark());
    assert_eq!(fx.page.theme().map(|t| t.current()), Some(Theme::Dark));
}

#[test]
fn system_dark_preference_applies_without_a_stored_value() {
    let fx = mount(Host {
        media: MemoryMedia::new().matching("(prefers-color-scheme: dark)"),
        ..Host::default()
    });
    assert!(fx.body_is_dark());
    assert_eq!(fx.store.entry("tema"), None);
}

#[test]
fn toggle_reads_the_dom_not_the_initial_theme() {
    let fx = mount(Host::default());
    fx.dom.add_class(&fx.dom.body_id(), "dark");
    fx.click_theme();
    assert!(!fx.body_is_dark());
    assert_eq!(fx.store.entry("tema").as_deref(), Some("light"));
}

#[test]
fn failed_write_keeps_the_applied_theme() {
    let fx = mount(Host::default());
    fx.store.fail_writes(true);
    fx.click_theme();
    assert!(fx.body_is_dark());
    assert_eq!(fx.store.entry("tema"), None);
}

// ============================================================================
// Toasts and teardown
// ============================================================================

#[test]
fn toasts_leave_250ms_after_their_duration() {
    let fx = mount(Host::default());
    fx.page.toaster().notify_for("hello", Duration::from_millis(1200));
    let toast = fx.dom.query(".toast").expect("toast shown");
    assert!(fx.dom.has_class(&toast, "mostrar"));

    fx.scheduler.advance(Duration::from_millis(1200));
    assert!(!fx.dom.has_class(&toast, "mostrar"));
    assert!(fx.dom.is_connected(&toast));
    fx.scheduler.advance(Duration::from_millis(250));
    assert!(!fx.dom.is_connected(&toast));
}

#[test]
fn teardown_cancels_toast_and_submit_timers() {
    let fx = mount(Host::default());
    fx.fill("Ana", "ana@example.com");
    fx.submit();
    fx.page.toaster().notify("pending");

    assert_eq!(fx.page.teardown(), 2);
    assert_eq!(fx.scheduler.pending(), 0);
    assert_eq!(fx.scheduler.run_until_idle(), 0);
    assert!(fx.dom.is_disabled(&fx.markup.submit));
}
