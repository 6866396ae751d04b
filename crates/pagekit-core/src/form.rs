#![forbid(unsafe_code)]

//! Contact form validation and simulated submission.
//!
//! # State machine
//!
//! ```text
//! Idle ──submit──▶ Validating ──▶ Invalid
//!                      │
//!                      ├──▶ Valid (no submit control)
//!                      │
//!                      └──▶ Submitting ──delay──▶ Idle
//! ```
//!
//! Errors are recomputed from the live field values on every submit and
//! blur; nothing about a field is retained between events.

use core::time::Duration;
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::{Messages, PageConfig};
use crate::host::{Dom, DomEvent, DomEventKind};
use crate::timer::{Scheduler, TimerSet};
use crate::toast::Toaster;
use crate::validation::{
    Email, Required, ValidationError, ValidationResult, Validator, trim_js,
};

/// One field's value and verdict for a single event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldState {
    pub raw_value: String,
    pub trimmed_value: String,
    pub error: Option<ValidationError>,
}

impl FieldState {
    fn evaluate(raw: String, result: ValidationResult) -> Self {
        let trimmed_value = trim_js(&raw).to_owned();
        Self {
            raw_value: raw,
            trimmed_value,
            error: result.into_error(),
        }
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

/// Verdict for both fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContactValidation {
    pub name: FieldState,
    pub email: FieldState,
}

impl ContactValidation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.name.has_error() && !self.email.has_error()
    }
}

/// Name rule: required.
#[must_use]
pub fn validate_name(value: &str, messages: &Messages) -> ValidationResult {
    Required::new()
        .with_message(&messages.name_required)
        .validate(value)
}

/// Email rule: required, then address-shaped.
#[must_use]
pub fn validate_email(value: &str, messages: &Messages) -> ValidationResult {
    Required::new()
        .with_message(&messages.email_required)
        .validate(value)
        .and(
            Email::new()
                .with_message(&messages.email_invalid)
                .validate(value),
        )
}

/// Evaluate both fields. Every applicable error is reported.
#[must_use]
pub fn validate_contact(name: &str, email: &str, messages: &Messages) -> ContactValidation {
    ContactValidation {
        name: FieldState::evaluate(name.to_owned(), validate_name(name, messages)),
        email: FieldState::evaluate(email.to_owned(), validate_email(email, messages)),
    }
}

/// Where the form is in its submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Idle,
    Validating,
    Valid,
    Invalid,
    Submitting,
}

/// What a submit event led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Errors are shown inline.
    Invalid(ContactValidation),
    /// The simulated submission is running.
    Submitting,
    /// Valid, and there is no submit control to animate.
    ValidWithoutButton,
}

struct Controls<N> {
    name: Option<N>,
    email: Option<N>,
    name_error: Option<N>,
    email_error: Option<N>,
    submit: Option<N>,
}

/// The wired contact form.
pub struct ContactForm<D: Dom> {
    dom: Rc<D>,
    form: D::Node,
    controls: Controls<D::Node>,
    toaster: Rc<Toaster<D>>,
    scheduler: Rc<dyn Scheduler>,
    timers: TimerSet,
    phase: Rc<Cell<FormPhase>>,
    error_class: String,
    messages: Messages,
    submit_delay: Duration,
}

impl<D: Dom> ContactForm<D> {
    /// Look up the form's controls and listen for submit and blur.
    ///
    /// Returns `None` when the page has no contact form. Missing controls
    /// inside the form are tolerated.
    pub fn install(
        dom: &Rc<D>,
        scheduler: &Rc<dyn Scheduler>,
        toaster: &Rc<Toaster<D>>,
        config: &PageConfig,
    ) -> Option<Rc<Self>> {
        let Some(form) = dom.query(&config.selectors.form) else {
            crate::debug!(selector = %config.selectors.form, "contact form skipped");
            return None;
        };
        let within = |selector: &str| dom.query_within(&form, selector);
        let controls = Controls {
            name: within(&config.selectors.name_input),
            email: within(&config.selectors.email_input),
            name_error: within(&config.selectors.name_error),
            email_error: within(&config.selectors.email_error),
            submit: within(&config.selectors.submit_button),
        };
        crate::debug!(
            name = controls.name.is_some(),
            email = controls.email.is_some(),
            submit = controls.submit.is_some(),
            "contact form installed"
        );

        let contact = Rc::new(Self {
            dom: Rc::clone(dom),
            form,
            controls,
            toaster: Rc::clone(toaster),
            scheduler: Rc::clone(scheduler),
            timers: TimerSet::new(),
            phase: Rc::new(Cell::new(FormPhase::Idle)),
            error_class: config.classes.input_error.clone(),
            messages: config.messages.clone(),
            submit_delay: config.timing.submit(),
        });

        contact.listen(&contact.form, DomEventKind::Submit, |c, event| {
            c.on_submit(event);
        });
        if let Some(name) = &contact.controls.name {
            contact.listen(name, DomEventKind::Blur, |c, _| {
                c.on_name_blur();
            });
        }
        if let Some(email) = &contact.controls.email {
            contact.listen(email, DomEventKind::Blur, |c, _| {
                c.on_email_blur();
            });
        }
        Some(contact)
    }

    fn listen(
        self: &Rc<Self>,
        node: &D::Node,
        kind: DomEventKind,
        handler: impl Fn(&Self, &dyn DomEvent) + 'static,
    ) {
        let weak: Weak<Self> = Rc::downgrade(self);
        let listened = self.dom.listen(
            node,
            kind,
            Box::new(move |event| {
                if let Some(contact) = weak.upgrade() {
                    handler(&*contact, event);
                }
            }),
        );
        if let Err(_err) = listened {
            crate::warn!(event = kind.name(), error = %_err, "contact form listener not attached");
        }
    }

    #[must_use]
    pub fn phase(&self) -> FormPhase {
        self.phase.get()
    }

    /// Timers still pending (the simulated submission).
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Cancel a pending simulated submission. The submit control stays as
    /// it is.
    pub fn teardown(&self) -> usize {
        self.timers.cancel_all(&*self.scheduler)
    }

    /// Current field values, validated.
    #[must_use]
    pub fn validate(&self) -> ContactValidation {
        validate_contact(
            &self.field_value(self.controls.name.as_ref()),
            &self.field_value(self.controls.email.as_ref()),
            &self.messages,
        )
    }

    /// Handle a submit event. The host's own submission never happens.
    pub fn on_submit(&self, event: &dyn DomEvent) -> SubmitOutcome {
        event.prevent_default();
        if self.phase.get() == FormPhase::Submitting {
            crate::debug!("submit ignored while sending");
            return SubmitOutcome::Submitting;
        }

        self.phase.set(FormPhase::Validating);
        self.clear_errors();
        let verdict = self.validate();
        if !verdict.is_valid() {
            if let Some(message) = verdict.name.message() {
                self.show_error(
                    self.controls.name.as_ref(),
                    self.controls.name_error.as_ref(),
                    message,
                );
            }
            if let Some(message) = verdict.email.message() {
                self.show_error(
                    self.controls.email.as_ref(),
                    self.controls.email_error.as_ref(),
                    message,
                );
            }
            self.phase.set(FormPhase::Invalid);
            crate::debug!(
                name = verdict.name.has_error(),
                email = verdict.email.has_error(),
                "contact form rejected"
            );
            return SubmitOutcome::Invalid(verdict);
        }

        match &self.controls.submit {
            Some(button) => {
                self.begin_submission(button);
                SubmitOutcome::Submitting
            }
            None => {
                self.phase.set(FormPhase::Valid);
                self.toaster.notify(&self.messages.form_valid_no_button);
                SubmitOutcome::ValidWithoutButton
            }
        }
    }

    fn begin_submission(&self, button: &D::Node) {
        self.phase.set(FormPhase::Submitting);
        self.dom.set_disabled(button, true);
        let original = self.dom.value(button);
        self.dom.set_value(button, &self.messages.sending);
        crate::debug!(delay = ?self.submit_delay, "contact form submitting");

        let finish = {
            let dom = Rc::clone(&self.dom);
            let form = self.form.clone();
            let button = button.clone();
            let toaster = Rc::clone(&self.toaster);
            let phase = Rc::clone(&self.phase);
            let sent = self.messages.form_sent.clone();
            move || {
                dom.set_disabled(&button, false);
                dom.set_value(&button, &original);
                toaster.notify(&sent);
                dom.reset_form(&form);
                phase.set(FormPhase::Idle);
            }
        };
        // Runs exactly once: from the timer, or right away if no timer could
        // be set.
        let finish = Rc::new(Cell::new(Some(finish)));
        let deferred = Rc::clone(&finish);
        let scheduled = self
            .timers
            .schedule(&*self.scheduler, self.submit_delay, move || {
                if let Some(done) = deferred.take() {
                    done();
                }
            });
        if let Err(_err) = scheduled {
            crate::warn!(error = %_err, "submit delay not scheduled");
            if let Some(done) = finish.take() {
                done();
            }
        }
    }

    /// Show or clear the name's required error.
    pub fn on_name_blur(&self) -> ValidationResult {
        let value = self.field_value(self.controls.name.as_ref());
        let result = validate_name(&value, &self.messages);
        self.render(
            self.controls.name.as_ref(),
            self.controls.name_error.as_ref(),
            &result,
        );
        result
    }

    /// Show the email's required or format error, or clear it.
    pub fn on_email_blur(&self) -> ValidationResult {
        let value = self.field_value(self.controls.email.as_ref());
        let result = validate_email(&value, &self.messages);
        self.render(
            self.controls.email.as_ref(),
            self.controls.email_error.as_ref(),
            &result,
        );
        result
    }

    fn render(&self, input: Option<&D::Node>, slot: Option<&D::Node>, result: &ValidationResult) {
        match result.error() {
            Some(err) => self.show_error(input, slot, &err.message),
            None => self.clear_error(input, slot),
        }
    }

    fn field_value(&self, input: Option<&D::Node>) -> String {
        input
            .map(|node| self.dom.value(node))
            .unwrap_or_default()
    }

    fn show_error(&self, input: Option<&D::Node>, slot: Option<&D::Node>, message: &str) {
        if let Some(slot) = slot {
            self.dom.set_text_content(slot, message);
        }
        if let Some(input) = input {
            self.dom.add_class(input, &self.error_class);
        }
    }

    fn clear_error(&self, input: Option<&D::Node>, slot: Option<&D::Node>) {
        if let Some(slot) = slot {
            self.dom.set_text_content(slot, "");
        }
        if let Some(input) = input {
            self.dom.remove_class(input, &self.error_class);
        }
    }

    fn clear_errors(&self) {
        self.clear_error(self.controls.name.as_ref(), self.controls.name_error.as_ref());
        self.clear_error(self.controls.email.as_ref(), self.controls.email_error.as_ref());
    }
}

impl<D: Dom> fmt::Debug for ContactForm<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactForm")
            .field("form", &self.form)
            .field("phase", &self.phase.get())
            .field("pending", &self.timers.len())
            .finish_non_exhaustive()
    }
}
