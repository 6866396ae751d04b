#![forbid(unsafe_code)]

//! Copy-the-contact-email button.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::clipboard::{ClipboardWriter, copy_to_clipboard};
use crate::config::{Messages, PageConfig, Selectors};
use crate::host::{Dom, DomEventKind, Services, Spawner};
use crate::toast::Toaster;
use crate::validation::trim_js;

/// Address to copy: the button's data attribute when non-empty, else the
/// trimmed text of the displayed address, else nothing.
#[must_use]
pub fn resolve_address<D: Dom>(dom: &D, button: &D::Node, selectors: &Selectors) -> Option<String> {
    if let Some(attr) = dom.attribute(button, &selectors.copy_attribute) {
        if !attr.is_empty() {
            return Some(attr);
        }
    }
    dom.query(&selectors.email_text)
        .map(|node| trim_js(&dom.text_content(&node)).to_owned())
        .filter(|text| !text.is_empty())
}

/// The wired copy button.
pub struct EmailCopy<D: Dom> {
    dom: Rc<D>,
    button: D::Node,
    address: Option<String>,
    clipboard: Rc<dyn ClipboardWriter>,
    spawner: Rc<dyn Spawner>,
    toaster: Rc<Toaster<D>>,
    messages: Messages,
}

impl<D: Dom> EmailCopy<D> {
    /// Resolve the address and listen for clicks. `None` without a button.
    pub fn install(
        dom: &Rc<D>,
        services: &Services,
        toaster: &Rc<Toaster<D>>,
        config: &PageConfig,
    ) -> Option<Rc<Self>> {
        let Some(button) = dom.query(&config.selectors.copy_button) else {
            crate::debug!(selector = %config.selectors.copy_button, "email copy skipped");
            return None;
        };
        let address = resolve_address(&**dom, &button, &config.selectors);
        crate::debug!(has_address = address.is_some(), "email copy installed");

        let control = Rc::new(Self {
            dom: Rc::clone(dom),
            button,
            address,
            clipboard: Rc::clone(&services.clipboard),
            spawner: Rc::clone(&services.spawner),
            toaster: Rc::clone(toaster),
            messages: config.messages.clone(),
        });

        let weak: Weak<Self> = Rc::downgrade(&control);
        let listened = dom.listen(
            &control.button,
            DomEventKind::Click,
            Box::new(move |_| {
                if let Some(control) = weak.upgrade() {
                    control.on_click();
                }
            }),
        );
        if let Err(_err) = listened {
            crate::warn!(error = %_err, "email copy listener not attached");
        }
        Some(control)
    }

    /// The address resolved at install time.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Copy the address and report the outcome with one toast.
    pub fn on_click(&self) {
        let Some(address) = self.address.clone() else {
            self.toaster.notify(&self.messages.no_email);
            return;
        };
        let dom = Rc::clone(&self.dom);
        let clipboard = Rc::clone(&self.clipboard);
        let toaster = Rc::clone(&self.toaster);
        let copied = self.messages.email_copied.clone();
        let failed = self.messages.copy_failed.clone();
        self.spawner.spawn(Box::pin(async move {
            if copy_to_clipboard(&*dom, &*clipboard, &address).await {
                toaster.notify(&copied);
            } else {
                toaster.notify(&failed);
            }
        }));
    }
}

impl<D: Dom> fmt::Debug for EmailCopy<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailCopy")
            .field("button", &self.button)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDom;

    use pretty_assertions::assert_eq;

    #[test]
    fn data_attribute_wins() {
        let dom = MemoryDom::new();
        let body = dom.body_id();
        let button = dom.insert(
            body,
            "button",
            &[("class", "boton-copiar"), ("data-correo", "hola@example.com")],
        );
        dom.insert_text(body, "span", &[("class", "texto-correo")], "otro@example.com");
        assert_eq!(
            resolve_address(&dom, &button, &Selectors::default()).as_deref(),
            Some("hola@example.com")
        );
    }

    #[test]
    fn empty_attribute_falls_back_to_trimmed_text() {
        let dom = MemoryDom::new();
        let body = dom.body_id();
        let button = dom.insert(body, "button", &[("class", "boton-copiar"), ("data-correo", "")]);
        dom.insert_text(body, "span", &[("class", "texto-correo")], "  ana@example.com \n");
        assert_eq!(
            resolve_address(&dom, &button, &Selectors::default()).as_deref(),
            Some("ana@example.com")
        );
    }

    #[test]
    fn blank_sources_resolve_to_none() {
        let dom = MemoryDom::new();
        let body = dom.body_id();
        let button = dom.insert(body, "button", &[("class", "boton-copiar")]);
        assert_eq!(resolve_address(&dom, &button, &Selectors::default()), None);
        dom.insert_text(body, "span", &[("class", "texto-correo")], "   ");
        assert_eq!(resolve_address(&dom, &button, &Selectors::default()), None);
    }
}
