#![forbid(unsafe_code)]

//! Clipboard copy with a legacy fallback.
//!
//! The preferred path is the host's asynchronous clipboard API. When that is
//! missing or rejects the write, the text is copied through a temporary,
//! focused and selected `<textarea>` and the host's synchronous copy
//! command. Neither path panics or returns an error: the outcome is a
//! boolean.

use crate::host::{Dom, HostError, LocalFuture};

/// Async clipboard write failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard not available")]
    NotAvailable,
    #[error("clipboard write rejected: {0}")]
    WriteRejected(String),
}

/// Modern, asynchronous clipboard access.
pub trait ClipboardWriter {
    /// Start writing `text`.
    ///
    /// Returns `None` when the environment has no async clipboard API, so the
    /// caller goes straight to the legacy path.
    fn write_text(&self, text: &str) -> Option<LocalFuture<Result<(), ClipboardError>>>;
}

/// Copy `text`, preferring the async clipboard and falling back to
/// [`legacy_copy`]. Resolves to whether the text reached the clipboard.
pub async fn copy_to_clipboard<D: Dom>(
    dom: &D,
    clipboard: &dyn ClipboardWriter,
    text: &str,
) -> bool {
    let Some(write) = clipboard.write_text(text) else {
        log_fallback(&ClipboardError::NotAvailable);
        return legacy_copy(dom, text);
    };
    match write.await {
        Ok(()) => {
            log_write("async", text.len());
            true
        }
        Err(err) => {
            log_fallback(&err);
            legacy_copy(dom, text)
        }
    }
}

/// Copy `text` through a temporary off-screen `<textarea>`.
///
/// The textarea is removed before returning whatever the copy command did.
pub fn legacy_copy<D: Dom>(dom: &D, text: &str) -> bool {
    let Some(body) = dom.body() else {
        log_legacy_error(&HostError::Unavailable("document body"));
        return false;
    };
    let surface = match dom.create_element("textarea") {
        Ok(node) => node,
        Err(err) => {
            log_legacy_error(&err);
            return false;
        }
    };
    dom.set_value(&surface, text);
    dom.set_style(&surface, "top", "0");
    dom.set_style(&surface, "left", "0");
    dom.set_style(&surface, "position", "fixed");
    if let Err(err) = dom.append_child(&body, &surface) {
        log_legacy_error(&err);
        return false;
    }
    dom.focus(&surface);
    dom.select(&surface);

    let result = dom.exec_copy();
    dom.remove(&surface);

    match result {
        Ok(copied) => {
            if copied {
                log_write("legacy", text.len());
            }
            copied
        }
        Err(err) => {
            log_legacy_error(&err);
            false
        }
    }
}

#[cfg(feature = "tracing")]
fn log_write(path: &'static str, bytes: usize) {
    tracing::debug!(path, bytes, "clipboard write");
}

#[cfg(not(feature = "tracing"))]
fn log_write(_path: &'static str, _bytes: usize) {}

#[cfg(feature = "tracing")]
fn log_fallback(reason: &ClipboardError) {
    tracing::warn!(reason = %reason, fallback = "legacy", "clipboard fallback triggered");
}

#[cfg(not(feature = "tracing"))]
fn log_fallback(_reason: &ClipboardError) {}

#[cfg(feature = "tracing")]
fn log_legacy_error(err: &HostError) {
    tracing::warn!(error = %err, "legacy clipboard copy failed");
}

#[cfg(not(feature = "tracing"))]
fn log_legacy_error(_err: &HostError) {}
