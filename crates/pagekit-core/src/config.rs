#![forbid(unsafe_code)]

//! Page configuration: selectors, class names, messages, storage keys and
//! delays.
//!
//! Every section implements `Default` with the values the page markup and
//! stylesheet expect, and deserializes with `#[serde(default)]` so a host
//! can override a single message without restating the rest:
//!
//! ```rust
//! use pagekit_core::PageConfig;
//!
//! let config = PageConfig::from_json(r#"{ "timing": { "toast_ms": 5000 } }"#).unwrap();
//! assert_eq!(config.timing.toast_ms, 5000);
//! assert_eq!(config.selectors.theme_button, "#boton-tema");
//! ```

use core::time::Duration;

use serde::Deserialize;

/// Errors raised while loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid page options: {0}")]
    Json(#[from] serde_json::Error),
}

/// Complete page configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub selectors: Selectors,
    pub classes: ClassNames,
    pub messages: Messages,
    pub storage: StorageKeys,
    pub queries: MediaQueryStrings,
    pub timing: Timing,
}

impl PageConfig {
    /// Parse a (possibly partial) JSON options object.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Where each component finds its elements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub copy_button: String,
    /// Attribute on the copy button that carries the address.
    pub copy_attribute: String,
    pub email_text: String,
    pub form: String,
    pub name_input: String,
    pub email_input: String,
    pub name_error: String,
    pub email_error: String,
    pub submit_button: String,
    pub theme_button: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            copy_button: ".boton-copiar".into(),
            copy_attribute: "data-correo".into(),
            email_text: ".texto-correo".into(),
            form: ".formulario-contacto".into(),
            name_input: "#nombre".into(),
            email_input: "#correo".into(),
            name_error: "#error-nombre".into(),
            email_error: "#error-correo".into(),
            submit_button: "#boton-enviar".into(),
            theme_button: "#boton-tema".into(),
        }
    }
}

/// CSS class hooks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    pub toast: String,
    pub toast_visible: String,
    pub input_error: String,
    pub reduced_motion: String,
    pub dark: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            toast: "toast".into(),
            toast_visible: "mostrar".into(),
            input_error: "entrada--error".into(),
            reduced_motion: "movimiento-reducido".into(),
            dark: "dark".into(),
        }
    }
}

/// User-facing text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub name_required: String,
    pub email_required: String,
    pub email_invalid: String,
    pub no_email: String,
    pub email_copied: String,
    pub copy_failed: String,
    pub sending: String,
    pub form_sent: String,
    pub form_valid_no_button: String,
    /// Theme button label while dark mode is active.
    pub light_mode_label: String,
    /// Theme button label while light mode is active.
    pub dark_mode_label: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            name_required: "Name is required".into(),
            email_required: "Email is required".into(),
            email_invalid: "Enter a valid email".into(),
            no_email: "No email available".into(),
            email_copied: "Email copied to clipboard".into(),
            copy_failed: "Could not copy. Copy it manually.".into(),
            sending: "Sending...".into(),
            form_sent: "Form sent (simulated)".into(),
            form_valid_no_button: "Form valid (no button detected)".into(),
            light_mode_label: "☀️ Light mode".into(),
            dark_mode_label: "🌙 Dark mode".into(),
        }
    }
}

/// Local storage keys for the theme preference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    /// Read and written.
    pub theme: String,
    /// Read only, after `theme`.
    pub legacy_theme: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            theme: "tema".into(),
            legacy_theme: "theme".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MediaQueryStrings {
    pub reduced_motion: String,
    pub dark_scheme: String,
}

impl Default for MediaQueryStrings {
    fn default() -> Self {
        Self {
            reduced_motion: "(prefers-reduced-motion: reduce)".into(),
            dark_scheme: "(prefers-color-scheme: dark)".into(),
        }
    }
}

/// Delays, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// How long a toast stays visible.
    pub toast_ms: u64,
    /// Fade-out time between hiding a toast and removing it.
    pub toast_fade_ms: u64,
    /// Simulated form submission time.
    pub submit_ms: u64,
}

impl Timing {
    #[must_use]
    pub const fn toast(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }

    #[must_use]
    pub const fn toast_fade(&self) -> Duration {
        Duration::from_millis(self.toast_fade_ms)
    }

    #[must_use]
    pub const fn submit(&self) -> Duration {
        Duration::from_millis(self.submit_ms)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            toast_ms: 3000,
            toast_fade_ms: 250,
            submit_ms: 1000,
        }
    }
}
