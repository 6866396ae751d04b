#![forbid(unsafe_code)]

//! Field validators for the contact form.
//!
//! ```rust
//! use pagekit_core::validation::{Email, Required, Validator};
//!
//! let rule = |v: &str| Required::new().validate(v).and(Email::new().validate(v));
//! assert!(rule("ana@example.com").is_valid());
//! assert_eq!(rule("").error().map(|e| e.code), Some("required"));
//! assert_eq!(rule("ana@example").error().map(|e| e.code), Some("email"));
//! ```

use std::fmt;

/// Error code for required field validation.
pub const ERROR_CODE_REQUIRED: &str = "required";
/// Error code for email validation.
pub const ERROR_CODE_EMAIL: &str = "email";

/// A validation error with a stable code and a display message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Stable error code for programmatic handling.
    pub code: &'static str,
    /// Human-readable message shown next to the field.
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The result of a validation operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationResult {
    #[default]
    Valid,
    Invalid(ValidationError),
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    #[must_use]
    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Self::Valid => None,
            Self::Invalid(e) => Some(e),
        }
    }

    #[must_use]
    pub fn into_error(self) -> Option<ValidationError> {
        match self {
            Self::Valid => None,
            Self::Invalid(e) => Some(e),
        }
    }

    /// Combine two results, returning the first error if any.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::Valid => other,
            Self::Invalid(_) => self,
        }
    }
}

/// A rule over values of type `T`.
pub trait Validator<T: ?Sized> {
    fn validate(&self, value: &T) -> ValidationResult;

    /// The message reported on failure.
    fn error_message(&self) -> &str;
}

/// Rejects strings that are empty after trimming.
#[derive(Debug, Clone)]
pub struct Required {
    message: String,
}

impl Required {
    #[must_use]
    pub fn new() -> Self {
        Self {
            message: "This field is required".into(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for Required {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator<str> for Required {
    fn validate(&self, value: &str) -> ValidationResult {
        if trim_js(value).is_empty() {
            ValidationResult::Invalid(ValidationError::new(ERROR_CODE_REQUIRED, &self.message))
        } else {
            ValidationResult::Valid
        }
    }

    fn error_message(&self) -> &str {
        &self.message
    }
}

/// Accepts `local@domain.tld`-shaped addresses.
///
/// The local part and the domain are runs of characters that are neither
/// whitespace nor `@`, and the domain holds a dot with at least one character
/// on each side. Empty input is valid; combine with [`Required`] to demand a
/// value.
#[derive(Debug, Clone)]
pub struct Email {
    message: String,
}

impl Email {
    #[must_use]
    pub fn new() -> Self {
        Self {
            message: "Invalid email address".into(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for Email {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator<str> for Email {
    fn validate(&self, value: &str) -> ValidationResult {
        let trimmed = trim_js(value);
        if trimmed.is_empty() || is_email_shaped(trimmed) {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(ValidationError::new(ERROR_CODE_EMAIL, &self.message))
        }
    }

    fn error_message(&self) -> &str {
        &self.message
    }
}

/// Whitespace as browsers define it for `\s` and `String.prototype.trim`:
/// the `WhiteSpace` and `LineTerminator` sets. Unlike [`char::is_whitespace`]
/// this includes U+FEFF and excludes U+0085.
#[must_use]
pub fn is_js_space(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'
            | '\u{000A}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Strip leading and trailing [`is_js_space`] characters.
#[must_use]
pub fn trim_js(value: &str) -> &str {
    value.trim_matches(is_js_space)
}

/// `^[^\s@]+@[^\s@]+\.[^\s@]+$`, without a regex engine.
#[must_use]
pub fn is_email_shaped(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    let plain =
        |part: &str| !part.is_empty() && !part.chars().any(|c| c == '@' || is_js_space(c));
    if !plain(local) || !plain(domain) {
        return false;
    }
    // Some dot must have a character before it and one after it.
    let chars: Vec<char> = domain.chars().collect();
    chars
        .iter()
        .enumerate()
        .any(|(i, &c)| c == '.' && i > 0 && i + 1 < chars.len())
}
