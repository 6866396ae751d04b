#![forbid(unsafe_code)]

//! Core: host-agnostic page interactivity.
//!
//! Every component talks to the page through the ports in [`host`] and
//! [`timer`], so the same logic runs against the browser (`pagekit-web`) and
//! against the in-memory doubles in [`memory`].

pub mod clipboard;
pub mod config;
pub mod email_copy;
pub mod form;
pub mod host;
pub mod logging;
pub mod memory;
pub mod motion;
pub mod page;
pub mod theme;
pub mod timer;
pub mod toast;
pub mod validation;

pub use config::{ConfigError, PageConfig};
pub use host::{Dom, DomEvent, DomEventKind, HostError, KeyValueStore, MediaQueries, Services};
pub use page::Page;
pub use theme::Theme;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, info, trace, warn};
