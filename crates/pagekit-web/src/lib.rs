#![forbid(unsafe_code)]

//! WASM frontend for pagekit.
//!
//! Binds the `pagekit-core` components to the live document: a [`Dom`]
//! implementation over `web-sys` elements, `localStorage`, `matchMedia`,
//! `navigator.clipboard`, `setTimeout` and `spawn_local` behind the core
//! ports, and a `PageKitWeb` class exported through `wasm-bindgen`.
//!
//! [`Dom`]: pagekit_core::Dom

pub mod console;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod services;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use dom::WebDom;
#[cfg(target_arch = "wasm32")]
pub use services::{
    BrowserScheduler, LocalSpawner, LocalStorageStore, NavigatorClipboard, WindowMedia,
};
#[cfg(target_arch = "wasm32")]
pub use wasm::PageKitWeb;

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct PageKitWeb;

#[cfg(not(target_arch = "wasm32"))]
impl PageKitWeb {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}
