//! Data models for the Study Simple backend.
//!
//! Field names serialize as camelCase to match the site's frontend.

mod blog;
mod contact;
mod event_proposal;
mod listing;
mod playlist;
mod subscriber;
mod support;

pub use blog::*;
pub use contact::*;
pub use event_proposal::*;
pub use listing::*;
pub use playlist::*;
pub use subscriber::*;
pub use support::*;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::AppError;

/// Author recorded when a post or comment names none.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Basic shape check: something@something.tld, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Reject blank required text.
pub(crate) fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Reject a supplied-but-blank patch value.
pub(crate) fn require_if_present(value: Option<&String>, field: &str) -> Result<(), AppError> {
    match value {
        Some(v) if v.trim().is_empty() => {
            Err(AppError::Validation(format!("{} cannot be empty", field)))
        }
        _ => Ok(()),
    }
}

pub(crate) fn require_email(value: &str, field: &str) -> Result<(), AppError> {
    require(value, field)?;
    if !is_valid_email(value.trim()) {
        return Err(AppError::Validation(format!(
            "{} must be a valid email address",
            field
        )));
    }
    Ok(())
}

/// Trimmed value, or `default` when absent or blank.
pub(crate) fn text_or_default(value: Option<&String>, default: &str) -> String {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Deserializers that accept both JSON scalars and their string form, so the
/// same request types work for JSON bodies and multipart text fields.
pub(crate) mod lenient {
    use serde::{de::Error, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn f64_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| D::Error::custom("invalid number")),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid number: {}", s))),
            Some(other) => Err(D::Error::custom(format!("expected a number, got {}", other))),
        }
    }

    pub fn bool_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(Value::String(s)) => match s.trim() {
                "true" | "on" | "1" => Ok(Some(true)),
                "false" | "off" | "0" | "" => Ok(Some(false)),
                other => Err(D::Error::custom(format!("invalid boolean: {}", other))),
            },
            Some(other) => Err(D::Error::custom(format!("expected a boolean, got {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last+tag@uni.ac.uk"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_require_messages() {
        let err = require("   ", "Title").unwrap_err();
        assert_eq!(err.message(), "Title is required");
        assert!(require("x", "Title").is_ok());

        let blank = " ".to_string();
        assert!(require_if_present(Some(&blank), "Title").is_err());
        assert!(require_if_present(None, "Title").is_ok());
    }

    #[test]
    fn test_text_or_default() {
        let blank = "  ".to_string();
        let named = " Ada ".to_string();
        assert_eq!(text_or_default(None, ANONYMOUS_AUTHOR), "Anonymous");
        assert_eq!(text_or_default(Some(&blank), ANONYMOUS_AUTHOR), "Anonymous");
        assert_eq!(text_or_default(Some(&named), ANONYMOUS_AUTHOR), "Ada");
    }
}
