#![forbid(unsafe_code)]

//! In-memory implementations of the host ports.
//!
//! These back the unit and integration tests and any host that wants to run
//! the components headless:
//!
//! - [`MemoryDom`]: an arena of element nodes with `#id`, `.class` and tag
//!   selectors, event dispatch, and a scriptable copy command.
//! - [`MemoryStore`]: a string map with injectable failures.
//! - [`MemoryMedia`]: a fixed table of media query answers.
//! - [`MemoryClipboard`]: an async clipboard that accepts, rejects, or is
//!   missing entirely.
//! - [`TaskQueue`]: a spawner whose futures are polled when the host asks.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::ready;
use std::task::{Context, Poll, Waker};

use crate::clipboard::{ClipboardError, ClipboardWriter};
use crate::host::{
    Dom, DomEvent, DomEventKind, HostError, KeyValueStore, Listener, LocalFuture, MediaQueries,
    Spawner,
};

// ─────────────────────────────────────────────────────────────────────────────
// MemoryDom
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to a node in a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Handle of the `index`-th node created, counting the document root as
    /// `0`.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }
}

#[derive(Debug, Default)]
struct Node {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    text: String,
    value: String,
    disabled: bool,
    layouts: usize,
}

struct Registered {
    node: NodeId,
    kind: DomEventKind,
    listener: Option<Listener>,
}

/// Event object passed to [`MemoryDom`] listeners.
#[derive(Debug, Default)]
pub struct MemoryEvent {
    prevented: Cell<bool>,
}

impl MemoryEvent {
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.prevented.get()
    }
}

impl DomEvent for MemoryEvent {
    fn prevent_default(&self) {
        self.prevented.set(true);
    }
}

/// What the copy command saw when it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyAttempt {
    /// Value of the focused, selected text control.
    pub selection: Option<String>,
    /// Whether that control was attached to the document at the time.
    pub attached: bool,
}

/// Simulated document.
///
/// Node `0` is the document root; [`MemoryDom::new`] creates `html > body`
/// under it. Nodes are never freed, so a removed node keeps its state and can
/// still be inspected.
pub struct MemoryDom {
    nodes: RefCell<Vec<Node>>,
    body: NodeId,
    listeners: RefCell<Vec<Registered>>,
    focused: Cell<Option<NodeId>>,
    selected: Cell<Option<NodeId>>,
    copy_result: RefCell<Result<bool, HostError>>,
    copies: RefCell<Vec<CopyAttempt>>,
}

impl MemoryDom {
    /// Create an empty document with a body.
    #[must_use]
    pub fn new() -> Self {
        let root = Node {
            tag: "#document".into(),
            ..Node::default()
        };
        let dom = Self {
            nodes: RefCell::new(vec![root]),
            body: NodeId(0),
            listeners: RefCell::new(Vec::new()),
            focused: Cell::new(None),
            selected: Cell::new(None),
            copy_result: RefCell::new(Ok(true)),
            copies: RefCell::new(Vec::new()),
        };
        let html = dom.insert(NodeId(0), "html", &[]);
        let body = dom.insert(html, "body", &[]);
        Self { body, ..dom }
    }

    /// The body node.
    #[must_use]
    pub const fn body_id(&self) -> NodeId {
        self.body
    }

    /// Append a new `tag` element under `parent`.
    ///
    /// `class` is split on whitespace into the class list and `value` seeds
    /// both the `value` attribute and the control's current value; every
    /// other pair becomes a plain attribute.
    pub fn insert(&self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut node = Node {
            tag: tag.to_ascii_lowercase(),
            parent: Some(parent),
            ..Node::default()
        };
        for (name, value) in attrs {
            match *name {
                "class" => node.classes = value.split_whitespace().map(str::to_owned).collect(),
                "value" => {
                    node.value = (*value).to_owned();
                    node.attrs.insert("value".into(), (*value).to_owned());
                }
                _ => {
                    node.attrs.insert((*name).to_owned(), (*value).to_owned());
                }
            }
        }
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(node);
        nodes[parent.0].children.push(id);
        id
    }

    /// Append an element with text content under `parent`.
    pub fn insert_text(
        &self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> NodeId {
        let id = self.insert(parent, tag, attrs);
        self.nodes.borrow_mut()[id.0].text = text.to_owned();
        id
    }

    /// Fire `kind` at `node`, running its listeners in registration order.
    ///
    /// Returns the event so callers can check `default_prevented`.
    pub fn dispatch(&self, node: NodeId, kind: DomEventKind) -> MemoryEvent {
        let event = MemoryEvent::default();
        let count = self.listeners.borrow().len();
        for index in 0..count {
            let taken = {
                let mut listeners = self.listeners.borrow_mut();
                let entry = &mut listeners[index];
                if entry.node == node && entry.kind == kind {
                    entry.listener.take()
                } else {
                    None
                }
            };
            // No borrow is held while the listener runs.
            if let Some(mut listener) = taken {
                listener(&event);
                self.listeners.borrow_mut()[index].listener = Some(listener);
            }
        }
        event
    }

    /// Number of listeners attached to `node` for `kind`.
    #[must_use]
    pub fn listener_count(&self, node: NodeId, kind: DomEventKind) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|r| r.node == node && r.kind == kind)
            .count()
    }

    /// Elements attached under `parent`, in order.
    #[must_use]
    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        self.nodes.borrow()[parent.0].children.clone()
    }

    #[must_use]
    pub fn tag(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.0].tag.clone()
    }

    #[must_use]
    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.nodes.borrow()[node.0].classes.clone()
    }

    #[must_use]
    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.nodes.borrow()[node.0].styles.get(property).cloned()
    }

    /// How many times layout was forced on `node`.
    #[must_use]
    pub fn layout_count(&self, node: NodeId) -> usize {
        self.nodes.borrow()[node.0].layouts
    }

    /// What the next copy command returns.
    pub fn set_copy_result(&self, result: Result<bool, HostError>) {
        *self.copy_result.borrow_mut() = result;
    }

    /// Every copy command run so far.
    #[must_use]
    pub fn copy_attempts(&self) -> Vec<CopyAttempt> {
        self.copies.borrow().clone()
    }

    fn matches(node: &Node, selector: &str) -> bool {
        if let Some(id) = selector.strip_prefix('#') {
            node.attrs.get("id").is_some_and(|v| v == id)
        } else if let Some(class) = selector.strip_prefix('.') {
            node.classes.iter().any(|c| c == class)
        } else {
            node.tag.eq_ignore_ascii_case(selector)
        }
    }

    fn find_descendant(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        let mut stack: Vec<NodeId> = nodes[scope.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &nodes[id.0];
            if Self::matches(node, selector) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = nodes[scope.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    fn with_node<R>(&self, node: NodeId, f: impl FnOnce(&mut Node) -> R) -> R {
        f(&mut self.nodes.borrow_mut()[node.0])
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDom")
            .field("nodes", &self.nodes.borrow().len())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.find_descendant(NodeId(0), selector)
    }

    fn query_within(&self, scope: &NodeId, selector: &str) -> Option<NodeId> {
        self.find_descendant(*scope, selector)
    }

    fn create_element(&self, tag: &str) -> Result<NodeId, HostError> {
        if tag.is_empty() || tag.contains(char::is_whitespace) {
            return Err(HostError::Js(format!("invalid tag name {tag:?}")));
        }
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(Node {
            tag: tag.to_ascii_lowercase(),
            ..Node::default()
        });
        Ok(id)
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(old) = nodes[child.0].parent.take() {
            nodes[old.0].children.retain(|c| c != child);
        }
        nodes[child.0].parent = Some(*parent);
        nodes[parent.0].children.push(*child);
        Ok(())
    }

    fn remove(&self, node: &NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(parent) = nodes[node.0].parent.take() {
            nodes[parent.0].children.retain(|c| c != node);
        }
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = *node;
        loop {
            if current == NodeId(0) {
                return true;
            }
            match nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        self.with_node(*node, |n| {
            if !n.classes.iter().any(|c| c == class) {
                n.classes.push(class.to_owned());
            }
        });
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        self.with_node(*node, |n| n.classes.retain(|c| c != class));
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.with_node(*node, |n| n.classes.iter().any(|c| c == class))
    }

    fn text_content(&self, node: &NodeId) -> String {
        self.with_node(*node, |n| n.text.clone())
    }

    fn set_text_content(&self, node: &NodeId, text: &str) {
        self.with_node(*node, |n| n.text = text.to_owned());
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.with_node(*node, |n| match name {
            "class" => Some(n.classes.join(" ")),
            _ => n.attrs.get(name).cloned(),
        })
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.with_node(*node, |n| match name {
            "class" => n.classes = value.split_whitespace().map(str::to_owned).collect(),
            _ => {
                n.attrs.insert(name.to_owned(), value.to_owned());
            }
        });
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) {
        self.with_node(*node, |n| {
            n.styles.insert(property.to_owned(), value.to_owned());
        });
    }

    fn value(&self, node: &NodeId) -> String {
        self.with_node(*node, |n| n.value.clone())
    }

    fn set_value(&self, node: &NodeId, value: &str) {
        self.with_node(*node, |n| n.value = value.to_owned());
    }

    fn set_disabled(&self, node: &NodeId, disabled: bool) {
        self.with_node(*node, |n| n.disabled = disabled);
    }

    fn is_disabled(&self, node: &NodeId) -> bool {
        self.with_node(*node, |n| n.disabled)
    }

    fn reset_form(&self, form: &NodeId) {
        for id in self.descendants(*form) {
            self.with_node(id, |n| {
                if matches!(n.tag.as_str(), "input" | "textarea") {
                    n.value = n.attrs.get("value").cloned().unwrap_or_default();
                }
            });
        }
    }

    fn force_layout(&self, node: &NodeId) {
        self.with_node(*node, |n| n.layouts += 1);
    }

    fn focus(&self, node: &NodeId) {
        self.focused.set(Some(*node));
    }

    fn select(&self, node: &NodeId) {
        self.selected.set(Some(*node));
    }

    fn exec_copy(&self) -> Result<bool, HostError> {
        let target = self.focused.get().filter(|f| Some(*f) == self.selected.get());
        let attempt = CopyAttempt {
            selection: target.map(|id| self.value(&id)),
            attached: target.is_some_and(|id| self.is_connected(&id)),
        };
        self.copies.borrow_mut().push(attempt);
        self.copy_result.borrow().clone()
    }

    fn listen(
        &self,
        node: &NodeId,
        kind: DomEventKind,
        listener: Listener,
    ) -> Result<(), HostError> {
        self.listeners.borrow_mut().push(Registered {
            node: *node,
            kind,
            listener: Some(listener),
        });
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RefCell<HashMap<String, String>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries.
    #[must_use]
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let store = Self::new();
        store.data.borrow_mut().extend(
            entries
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned())),
        );
        store
    }

    /// Make every read fail, as a blocked `localStorage` does.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    /// Make every write fail, as a full `localStorage` does.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Peek at a value without going through the port.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<String> {
        self.data.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, HostError> {
        if self.fail_reads.get() {
            return Err(HostError::Storage("reads disabled".into()));
        }
        Ok(self.data.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), HostError> {
        if self.fail_writes.get() {
            return Err(HostError::Storage("writes disabled".into()));
        }
        self.data.borrow_mut().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryMedia
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed media query answers. Unknown queries do not match.
#[derive(Debug, Default)]
pub struct MemoryMedia {
    answers: RefCell<HashMap<String, bool>>,
    unavailable: Cell<bool>,
}

impl MemoryMedia {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `query` match.
    #[must_use]
    pub fn matching(self, query: &str) -> Self {
        self.set(query, true);
        self
    }

    pub fn set(&self, query: &str, matches: bool) {
        self.answers.borrow_mut().insert(query.to_owned(), matches);
    }

    /// Behave like an environment without `matchMedia`.
    #[must_use]
    pub fn unavailable() -> Self {
        let media = Self::new();
        media.unavailable.set(true);
        media
    }
}

impl MediaQueries for MemoryMedia {
    fn matches(&self, query: &str) -> Result<bool, HostError> {
        if self.unavailable.get() {
            return Err(HostError::Unavailable("matchMedia"));
        }
        Ok(self.answers.borrow().get(query).copied().unwrap_or(false))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryClipboard
// ─────────────────────────────────────────────────────────────────────────────

/// How a [`MemoryClipboard`] answers write requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardMode {
    /// The async clipboard API does not exist.
    Missing,
    /// Writes succeed.
    Accept,
    /// Writes are rejected with this reason.
    Reject(String),
}

/// Async clipboard double. Futures it returns are already complete.
#[derive(Debug)]
pub struct MemoryClipboard {
    mode: RefCell<ClipboardMode>,
    contents: RefCell<Option<String>>,
    requests: Cell<usize>,
}

impl MemoryClipboard {
    #[must_use]
    pub fn new(mode: ClipboardMode) -> Self {
        Self {
            mode: RefCell::new(mode),
            contents: RefCell::new(None),
            requests: Cell::new(0),
        }
    }

    pub fn set_mode(&self, mode: ClipboardMode) {
        *self.mode.borrow_mut() = mode;
    }

    /// Last text accepted by the async API.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }

    /// Number of async write requests received.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl ClipboardWriter for MemoryClipboard {
    fn write_text(&self, text: &str) -> Option<LocalFuture<Result<(), ClipboardError>>> {
        let outcome = match &*self.mode.borrow() {
            ClipboardMode::Missing => return None,
            ClipboardMode::Accept => {
                *self.contents.borrow_mut() = Some(text.to_owned());
                Ok(())
            }
            ClipboardMode::Reject(reason) => Err(ClipboardError::WriteRejected(reason.clone())),
        };
        self.requests.set(self.requests.get() + 1);
        Some(Box::pin(ready(outcome)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TaskQueue
// ─────────────────────────────────────────────────────────────────────────────

/// Spawner that holds futures until [`TaskQueue::run_until_stalled`].
#[derive(Default)]
pub struct TaskQueue {
    tasks: RefCell<Vec<LocalFuture<()>>>,
}

impl TaskQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Futures spawned but not yet complete.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Poll every queued future until none makes progress.
    ///
    /// Returns the number of futures that completed.
    pub fn run_until_stalled(&self) -> usize {
        let mut cx = Context::from_waker(Waker::noop());
        let mut completed = 0;
        loop {
            let batch = std::mem::take(&mut *self.tasks.borrow_mut());
            if batch.is_empty() {
                return completed;
            }
            let before = completed;
            let mut still_pending = Vec::new();
            for mut task in batch {
                match task.as_mut().poll(&mut cx) {
                    Poll::Ready(()) => completed += 1,
                    Poll::Pending => still_pending.push(task),
                }
            }
            let mut tasks = self.tasks.borrow_mut();
            let spawned_meanwhile = std::mem::replace(&mut *tasks, still_pending);
            let progressed = completed > before || !spawned_meanwhile.is_empty();
            tasks.extend(spawned_meanwhile);
            drop(tasks);
            if !progressed {
                return completed;
            }
        }
    }
}

impl Spawner for TaskQueue {
    fn spawn(&self, task: LocalFuture<()>) {
        self.tasks.borrow_mut().push(task);
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.pending())
            .finish()
    }
}
