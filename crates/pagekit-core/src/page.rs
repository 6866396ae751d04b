#![forbid(unsafe_code)]

//! Page-ready bootstrap.
//!
//! [`Page::mount`] initialises each component once, in a fixed order:
//! reduced motion, email copy, contact form, theme toggle. Components whose
//! markup is missing are skipped; after mounting they only react to events.

use std::fmt;
use std::rc::Rc;

use crate::config::PageConfig;
use crate::email_copy::EmailCopy;
use crate::form::ContactForm;
use crate::host::{Dom, Services};
use crate::motion::apply_reduced_motion;
use crate::theme::ThemeToggle;
use crate::toast::Toaster;

/// A mounted page and its installed components.
pub struct Page<D: Dom> {
    toaster: Rc<Toaster<D>>,
    reduced_motion: bool,
    email_copy: Option<Rc<EmailCopy<D>>>,
    form: Option<Rc<ContactForm<D>>>,
    theme: Option<Rc<ThemeToggle<D>>>,
}

impl<D: Dom> Page<D> {
    pub fn mount(dom: Rc<D>, services: &Services, config: &PageConfig) -> Self {
        let toaster = Rc::new(Toaster::new(
            Rc::clone(&dom),
            Rc::clone(&services.scheduler),
            config,
        ));
        let reduced_motion = apply_reduced_motion(&*dom, &*services.media, config);
        let email_copy = EmailCopy::install(&dom, services, &toaster, config);
        let form = ContactForm::install(&dom, &services.scheduler, &toaster, config);
        let theme = ThemeToggle::install(&dom, services, config);
        crate::info!(
            reduced_motion,
            email_copy = email_copy.is_some(),
            form = form.is_some(),
            theme = theme.is_some(),
            "page mounted"
        );
        Self {
            toaster,
            reduced_motion,
            email_copy,
            form,
            theme,
        }
    }

    /// The page's toast notifier.
    #[must_use]
    pub fn toaster(&self) -> &Rc<Toaster<D>> {
        &self.toaster
    }

    #[must_use]
    pub const fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    #[must_use]
    pub fn email_copy(&self) -> Option<&Rc<EmailCopy<D>>> {
        self.email_copy.as_ref()
    }

    #[must_use]
    pub fn form(&self) -> Option<&Rc<ContactForm<D>>> {
        self.form.as_ref()
    }

    #[must_use]
    pub fn theme(&self) -> Option<&Rc<ThemeToggle<D>>> {
        self.theme.as_ref()
    }

    /// Cancel every pending toast and submission timer.
    ///
    /// Returns the number of timers cancelled. Listeners stay attached but
    /// become inert once the page is dropped.
    pub fn teardown(&self) -> usize {
        let toasts = self.toaster.teardown();
        let submits = self.form.as_ref().map_or(0, |form| form.teardown());
        crate::debug!(toasts, submits, "page torn down");
        toasts + submits
    }
}

impl<D: Dom> fmt::Debug for Page<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("reduced_motion", &self.reduced_motion)
            .field("email_copy", &self.email_copy.is_some())
            .field("form", &self.form.is_some())
            .field("theme", &self.theme.is_some())
            .finish()
    }
}
