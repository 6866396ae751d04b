#![forbid(unsafe_code)]

//! Transient on-screen notifications.
//!
//! A toast is a `div` appended to the body. After a forced layout it gains
//! the visible class so the stylesheet can animate it in; when its duration
//! ends the class is removed, and after a fixed fade delay the element is
//! removed. Toasts are independent: no queue, no deduplication, no cap.

use core::time::Duration;
use std::fmt;
use std::rc::Rc;

use crate::config::{ClassNames, PageConfig};
use crate::host::{Dom, HostError};
use crate::timer::{Scheduler, TimerSet};

/// Creates and dismisses toasts.
pub struct Toaster<D: Dom> {
    dom: Rc<D>,
    scheduler: Rc<dyn Scheduler>,
    timers: TimerSet,
    classes: Rc<ClassNames>,
    duration: Duration,
    fade: Duration,
}

impl<D: Dom> Toaster<D> {
    #[must_use]
    pub fn new(dom: Rc<D>, scheduler: Rc<dyn Scheduler>, config: &PageConfig) -> Self {
        Self {
            dom,
            scheduler,
            timers: TimerSet::new(),
            classes: Rc::new(config.classes.clone()),
            duration: config.timing.toast(),
            fade: config.timing.toast_fade(),
        }
    }

    /// Show `message` for the default duration.
    pub fn notify(&self, message: &str) {
        self.notify_for(message, self.duration);
    }

    /// Show `message` for `duration`.
    pub fn notify_for(&self, message: &str, duration: Duration) {
        if let Err(_err) = self.show(message, duration) {
            crate::warn!(error = %_err, "toast not shown");
        }
    }

    fn show(&self, message: &str, duration: Duration) -> Result<(), HostError> {
        let body = self
            .dom
            .body()
            .ok_or(HostError::Unavailable("document body"))?;
        let toast = self.dom.create_element("div")?;
        self.dom.add_class(&toast, &self.classes.toast);
        self.dom.set_text_content(&toast, message);
        self.dom.append_child(&body, &toast)?;
        self.dom.force_layout(&toast);
        self.dom.add_class(&toast, &self.classes.toast_visible);
        crate::trace!(text = message, ?duration, "toast shown");

        let dom = Rc::clone(&self.dom);
        let scheduler = Rc::clone(&self.scheduler);
        let timers = self.timers.clone();
        let classes = Rc::clone(&self.classes);
        let fade = self.fade;
        let node = toast.clone();
        let hide = self.timers.schedule(&*self.scheduler, duration, move || {
            dom.remove_class(&node, &classes.toast_visible);
            let detach = Rc::clone(&dom);
            let target = node.clone();
            let scheduled = timers.schedule(&*scheduler, fade, move || detach.remove(&target));
            if let Err(_err) = scheduled {
                crate::warn!(error = %_err, "toast removal not scheduled");
                dom.remove(&node);
            }
        });
        // A toast that can never be hidden is not left on screen.
        if let Err(err) = hide {
            self.dom.remove(&toast);
            return Err(err);
        }
        Ok(())
    }

    /// Timers still pending for shown toasts.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Cancel every pending hide/remove timer. Toasts already on screen stay.
    pub fn teardown(&self) -> usize {
        self.timers.cancel_all(&*self.scheduler)
    }
}

impl<D: Dom> fmt::Debug for Toaster<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toaster")
            .field("duration", &self.duration)
            .field("fade", &self.fade)
            .field("pending", &self.timers.len())
            .finish()
    }
}
