#![forbid(unsafe_code)]

//! Tracing layer that writes formatted events to the browser console.
//!
//! Each event becomes a single line, `LEVEL target: message k=v ...`,
//! routed to the console method matching its level (`console.error`,
//! `console.warn`, ...). Native builds write the same line to stderr.
//!
//! ```no_run
//! use pagekit_web::console::BrowserConsoleLayer;
//! use tracing_subscriber::prelude::*;
//!
//! let subscriber = tracing_subscriber::registry().with(BrowserConsoleLayer::new());
//! tracing::subscriber::set_global_default(subscriber).ok();
//! ```

use std::fmt::{self, Write as FmtWrite};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;

// ============================================================================
// Configuration
// ============================================================================

/// What each console line includes.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Show log level. Default: true.
    pub show_level: bool,
    /// Show the tracing target (module path). Default: true.
    pub show_target: bool,
    /// Show structured fields beyond `message`. Default: true.
    pub show_fields: bool,
    /// Most verbose level written. Default: `DEBUG`.
    pub max_level: Level,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            show_level: true,
            show_target: true,
            show_fields: true,
            max_level: Level::DEBUG,
        }
    }
}

/// Format level as a fixed-width string.
fn level_str(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN ",
        Level::INFO => "INFO ",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

// ============================================================================
// Event Visitor
// ============================================================================

/// Extracts message and structured fields from a tracing event.
#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        let rendered = strip_debug_quotes(&rendered);
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.fields.push((field.name().to_string(), rendered));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }
}

/// Remove surrounding quotes from Debug-formatted strings.
fn strip_debug_quotes(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

// ============================================================================
// BrowserConsoleLayer
// ============================================================================

/// Destination for formatted lines.
pub type ConsoleSink = Box<dyn Fn(Level, &str) + Send + Sync>;

/// A `tracing_subscriber::Layer` that formats events into one line each and
/// hands them to a [`ConsoleSink`].
pub struct BrowserConsoleLayer {
    sink: ConsoleSink,
    config: ConsoleConfig,
}

impl BrowserConsoleLayer {
    /// Write to the platform console with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sink(Box::new(write_platform))
    }

    /// Write to a custom sink.
    #[must_use]
    pub fn with_sink(sink: ConsoleSink) -> Self {
        Self {
            sink,
            config: ConsoleConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ConsoleConfig) -> Self {
        self.config = config;
        self
    }

    /// Builder: set whether to show log level.
    #[must_use]
    pub fn show_level(mut self, show: bool) -> Self {
        self.config.show_level = show;
        self
    }

    /// Builder: set whether to show the target module.
    #[must_use]
    pub fn show_target(mut self, show: bool) -> Self {
        self.config.show_target = show;
        self
    }

    /// Builder: set whether to show structured fields.
    #[must_use]
    pub fn show_fields(mut self, show: bool) -> Self {
        self.config.show_fields = show;
        self
    }

    /// Builder: drop events more verbose than `level`.
    #[must_use]
    pub fn max_level(mut self, level: Level) -> Self {
        self.config.max_level = level;
        self
    }

    fn format_event(&self, event: &Event<'_>) -> String {
        let metadata = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let mut line = String::new();
        if self.config.show_level {
            line.push_str(level_str(*metadata.level()));
            line.push(' ');
        }
        if self.config.show_target {
            let _ = write!(line, "{}: ", metadata.target());
        }
        line.push_str(&visitor.message.unwrap_or_default());
        if self.config.show_fields {
            for (k, v) in &visitor.fields {
                let _ = write!(line, " {k}={v}");
            }
        }
        line
    }
}

impl Default for BrowserConsoleLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BrowserConsoleLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserConsoleLayer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S> Layer<S> for BrowserConsoleLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        // Level ordering: TRACE > DEBUG > ... > ERROR.
        if level > self.config.max_level {
            return;
        }
        (self.sink)(level, &self.format_event(event));
    }
}

#[cfg(target_arch = "wasm32")]
fn write_platform(level: Level, line: &str) {
    let line = wasm_bindgen::JsValue::from_str(line);
    match level {
        Level::ERROR => web_sys::console::error_1(&line),
        Level::WARN => web_sys::console::warn_1(&line),
        Level::INFO => web_sys::console::info_1(&line),
        Level::DEBUG | Level::TRACE => web_sys::console::debug_1(&line),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn write_platform(_level: Level, line: &str) {
    eprintln!("{line}");
}

/// Install [`BrowserConsoleLayer`] as the global subscriber.
///
/// Returns `false` if a global subscriber was already set.
pub fn init_logging() -> bool {
    let subscriber = tracing_subscriber::registry().with(BrowserConsoleLayer::new());
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    type Lines = Arc<Mutex<Vec<(Level, String)>>>;

    fn capture(
        layer: impl FnOnce(ConsoleSink) -> BrowserConsoleLayer,
    ) -> (BrowserConsoleLayer, Lines) {
        let lines: Lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = Arc::clone(&lines);
        let layer = layer(Box::new(move |level, line| {
            sink_lines.lock().unwrap().push((level, line.to_string()));
        }));
        (layer, lines)
    }

    fn emit(layer: BrowserConsoleLayer, f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn level_str_fixed_width() {
        for level in [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE] {
            assert_eq!(level_str(level).len(), 5);
        }
    }

    #[test]
    fn strip_debug_quotes_basic() {
        assert_eq!(strip_debug_quotes("\"hello\""), "hello");
        assert_eq!(strip_debug_quotes("plain"), "plain");
        assert_eq!(strip_debug_quotes("\"\""), "");
        assert_eq!(strip_debug_quotes("\""), "\"");
    }

    #[test]
    fn formats_level_target_message_and_fields() {
        let (layer, lines) = capture(BrowserConsoleLayer::with_sink);
        emit(layer, || {
            tracing::warn!(
                target: "pagekit",
                reason = "denied",
                bytes = 12u64,
                "clipboard fallback"
            );
        });
        assert_eq!(
            *lines.lock().unwrap(),
            vec![(
                Level::WARN,
                "WARN  pagekit: clipboard fallback reason=denied bytes=12".to_string()
            )]
        );
    }

    #[test]
    fn display_fields_lose_debug_quotes() {
        let (layer, lines) = capture(|sink| {
            BrowserConsoleLayer::with_sink(sink)
                .show_level(false)
                .show_target(false)
        });
        let theme = "dark";
        emit(layer, || tracing::info!(theme = %theme, ok = true, "theme persisted"));
        assert_eq!(lines.lock().unwrap()[0].1, "theme persisted theme=dark ok=true");
    }

    #[test]
    fn fields_can_be_hidden() {
        let (layer, lines) = capture(|sink| {
            BrowserConsoleLayer::with_sink(sink)
                .show_target(false)
                .show_fields(false)
        });
        emit(layer, || tracing::error!(code = 7u64, "boom"));
        assert_eq!(lines.lock().unwrap()[0], (Level::ERROR, "ERROR boom".to_string()));
    }

    #[test]
    fn events_above_max_level_are_dropped() {
        let (layer, lines) =
            capture(|sink| BrowserConsoleLayer::with_sink(sink).max_level(Level::INFO));
        emit(layer, || {
            tracing::debug!("hidden");
            tracing::trace!("hidden too");
            tracing::info!("shown");
        });
        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::INFO);
    }
}
