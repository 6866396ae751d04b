#![forbid(unsafe_code)]

//! Ports between the page components and their host environment.
//!
//! The browser frontend implements these traits over `web-sys`; tests use
//! the doubles in [`crate::memory`]. All ports take `&self`: hosts are
//! single-threaded and keep whatever mutable state they need behind interior
//! mutability.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

pub use crate::clipboard::{ClipboardError, ClipboardWriter};
use crate::timer::Scheduler;

/// A boxed, non-`Send` future driven on the host's event loop.
pub type LocalFuture<T> = Pin<Box<dyn Future<Output = T>>>;

/// Host failures surfaced through the ports.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The capability does not exist in this environment.
    #[error("unavailable: {0}")]
    Unavailable(&'static str),
    /// A host call threw.
    #[error("host call failed: {0}")]
    Js(String),
    /// The key-value store rejected the operation.
    #[error("storage error: {0}")]
    Storage(String),
}

/// DOM events the components listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomEventKind {
    Click,
    Submit,
    Blur,
}

impl DomEventKind {
    /// DOM event type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Submit => "submit",
            Self::Blur => "blur",
        }
    }
}

/// The event object handed to a listener.
pub trait DomEvent {
    /// Cancel the host's default action for this event.
    fn prevent_default(&self);
}

/// Event listener registered through [`Dom::listen`].
pub type Listener = Box<dyn FnMut(&dyn DomEvent)>;

/// Document access.
///
/// Mutators are infallible: a host that cannot perform one (detached node,
/// element of the wrong kind) treats it as a no-op. Only element creation,
/// insertion, listener registration and the copy command report errors.
pub trait Dom: 'static {
    /// Opaque element handle.
    type Node: Clone + fmt::Debug + 'static;

    /// The document body, if there is one.
    fn body(&self) -> Option<Self::Node>;
    /// First element in document order matching `selector`.
    fn query(&self, selector: &str) -> Option<Self::Node>;
    /// First descendant of `scope` matching `selector`.
    fn query_within(&self, scope: &Self::Node, selector: &str) -> Option<Self::Node>;

    fn create_element(&self, tag: &str) -> Result<Self::Node, HostError>;
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;
    /// Detach `node` from its parent. Detached nodes are left alone.
    fn remove(&self, node: &Self::Node);
    fn is_connected(&self, node: &Self::Node) -> bool;

    fn add_class(&self, node: &Self::Node, class: &str);
    fn remove_class(&self, node: &Self::Node, class: &str);
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn text_content(&self, node: &Self::Node) -> String;
    fn set_text_content(&self, node: &Self::Node, text: &str);
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    /// Current value of a form control.
    fn value(&self, node: &Self::Node) -> String;
    fn set_value(&self, node: &Self::Node, value: &str);
    fn set_disabled(&self, node: &Self::Node, disabled: bool);
    fn is_disabled(&self, node: &Self::Node) -> bool;
    /// Restore every control in `form` to its default value.
    fn reset_form(&self, form: &Self::Node);

    /// Force a synchronous layout of `node` so a following class change
    /// animates.
    fn force_layout(&self, node: &Self::Node);
    fn focus(&self, node: &Self::Node);
    /// Select the whole contents of a text control.
    fn select(&self, node: &Self::Node);
    /// Run the synchronous, selection-based copy command.
    fn exec_copy(&self) -> Result<bool, HostError>;

    fn listen(
        &self,
        node: &Self::Node,
        kind: DomEventKind,
        listener: Listener,
    ) -> Result<(), HostError>;
}

/// Persistent string key-value store (browser local storage).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, HostError>;
    fn set(&self, key: &str, value: &str) -> Result<(), HostError>;
}

/// Media query evaluation.
pub trait MediaQueries {
    /// Whether `query` currently matches.
    fn matches(&self, query: &str) -> Result<bool, HostError>;
}

/// Runs local futures to completion on the host's event loop.
pub trait Spawner {
    fn spawn(&self, task: LocalFuture<()>);
}

/// The non-DOM handles every component installer receives.
#[derive(Clone)]
pub struct Services {
    pub store: Rc<dyn KeyValueStore>,
    pub media: Rc<dyn MediaQueries>,
    pub clipboard: Rc<dyn ClipboardWriter>,
    pub scheduler: Rc<dyn Scheduler>,
    pub spawner: Rc<dyn Spawner>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
