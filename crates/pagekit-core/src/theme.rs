#![forbid(unsafe_code)]

//! Light/dark theme toggle with a persisted preference.
//!
//! Initial theme: stored preference, then the system color scheme, then
//! light. At toggle time the DOM is the source of truth: the new theme is the
//! opposite of whatever the body currently shows.

use std::fmt;
use std::rc::Rc;

use crate::config::{Messages, PageConfig, StorageKeys};
use crate::host::{Dom, DomEventKind, KeyValueStore, MediaQueries, Services};

/// The two page themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Canonical stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    #[must_use]
    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    /// Interpret a stored preference.
    ///
    /// Legacy localized values are normalized (`oscuro` is dark, `claro` is
    /// light). Empty means "no preference". Any other non-empty value renders
    /// as light, since only `dark` ever turns the dark class on.
    #[must_use]
    pub fn from_stored(raw: &str) -> Option<Self> {
        match raw {
            "" => None,
            "dark" | "oscuro" => Some(Self::Dark),
            _ => Some(Self::Light),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored preference: the first non-empty value under the canonical key,
/// then the legacy key. Read failures count as no preference.
#[must_use]
pub fn stored_theme(store: &dyn KeyValueStore, keys: &StorageKeys) -> Option<Theme> {
    [keys.theme.as_str(), keys.legacy_theme.as_str()]
        .into_iter()
        .find_map(|key| match store.get(key) {
            Ok(Some(raw)) if !raw.is_empty() => Some(raw),
            Ok(_) => None,
            Err(_err) => {
                crate::warn!(key, error = %_err, "theme preference unreadable");
                None
            }
        })
        .and_then(|raw| Theme::from_stored(&raw))
}

/// System color scheme, or `None` when it cannot be queried.
#[must_use]
pub fn system_theme(media: &dyn MediaQueries, query: &str) -> Option<Theme> {
    match media.matches(query) {
        Ok(true) => Some(Theme::Dark),
        Ok(false) => Some(Theme::Light),
        Err(_err) => {
            crate::debug!(error = %_err, "color scheme query failed");
            None
        }
    }
}

/// Stored preference, then system preference, then light.
#[must_use]
pub fn resolve_initial_theme(
    store: &dyn KeyValueStore,
    media: &dyn MediaQueries,
    config: &PageConfig,
) -> Theme {
    stored_theme(store, &config.storage)
        .or_else(|| system_theme(media, &config.queries.dark_scheme))
        .unwrap_or_default()
}

/// Render `theme`: the body's dark class plus the button's pressed state and
/// label. Applying the same theme twice leaves the DOM unchanged.
pub fn apply_theme<D: Dom>(
    dom: &D,
    body: &D::Node,
    button: &D::Node,
    theme: Theme,
    dark_class: &str,
    messages: &Messages,
) {
    if theme.is_dark() {
        dom.add_class(body, dark_class);
    } else {
        dom.remove_class(body, dark_class);
    }
    dom.set_attribute(button, "aria-pressed", if theme.is_dark() { "true" } else { "false" });
    let label = if theme.is_dark() {
        &messages.light_mode_label
    } else {
        &messages.dark_mode_label
    };
    dom.set_text_content(button, label);
}

/// The wired theme button.
pub struct ThemeToggle<D: Dom> {
    dom: Rc<D>,
    body: D::Node,
    button: D::Node,
    store: Rc<dyn KeyValueStore>,
    key: String,
    dark_class: String,
    messages: Messages,
}

impl<D: Dom> ThemeToggle<D> {
    /// Resolve and apply the initial theme, then listen for clicks.
    ///
    /// Returns `None` when the page has no theme button; nothing is applied
    /// in that case.
    pub fn install(dom: &Rc<D>, services: &Services, config: &PageConfig) -> Option<Rc<Self>> {
        let Some(button) = dom.query(&config.selectors.theme_button) else {
            crate::debug!(selector = %config.selectors.theme_button, "theme toggle skipped");
            return None;
        };
        let body = dom.body()?;
        let toggle = Rc::new(Self {
            dom: Rc::clone(dom),
            body,
            button,
            store: Rc::clone(&services.store),
            key: config.storage.theme.clone(),
            dark_class: config.classes.dark.clone(),
            messages: config.messages.clone(),
        });

        let initial = resolve_initial_theme(&*services.store, &*services.media, config);
        toggle.apply(initial);
        crate::debug!(theme = %initial, "theme resolved");

        let weak = Rc::downgrade(&toggle);
        let listened = dom.listen(
            &toggle.button,
            DomEventKind::Click,
            Box::new(move |_| {
                if let Some(toggle) = weak.upgrade() {
                    toggle.on_click();
                }
            }),
        );
        if let Err(_err) = listened {
            crate::warn!(error = %_err, "theme toggle listener not attached");
        }
        Some(toggle)
    }

    /// Theme the DOM currently shows.
    #[must_use]
    pub fn current(&self) -> Theme {
        if self.dom.has_class(&self.body, &self.dark_class) {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn apply(&self, theme: Theme) {
        apply_theme(
            &*self.dom,
            &self.body,
            &self.button,
            theme,
            &self.dark_class,
            &self.messages,
        );
    }

    /// Flip the theme shown in the DOM and persist the result.
    pub fn on_click(&self) -> Theme {
        let next = self.current().opposite();
        self.apply(next);
        match self.store.set(&self.key, next.as_str()) {
            Ok(()) => {
                crate::debug!(theme = %next, "theme persisted");
            }
            Err(_err) => {
                crate::warn!(error = %_err, "theme preference not persisted");
            }
        }
        next
    }

    #[must_use]
    pub fn button(&self) -> &D::Node {
        &self.button
    }
}

impl<D: Dom> fmt::Debug for ThemeToggle<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeToggle")
            .field("button", &self.button)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
