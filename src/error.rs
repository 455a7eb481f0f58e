//! Centralized error handling for the markdown range pipeline
//!
//! This module provides a unified error type covering every failure mode of
//! the annotated-markup parse: lexical problems, tree-shape problems, and
//! upstream engine contract violations.

use log::warn;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Custom Result Type Alias
// ─────────────────────────────────────────────────────────────────────────────

/// A specialized `Result` type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The centralized error type for the crate.
#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Structural Parse Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// An opening `<` with no matching `>` before end of input.
    UnterminatedTag { position: usize },

    /// A closing tag appeared with no matching open element on the stack.
    UnmatchedClosingTag,

    /// One or more elements were still open at end of input.
    UnclosedTags,

    /// An opening tag that is not part of the annotated-markup vocabulary.
    UnknownTag(String),

    // ─────────────────────────────────────────────────────────────────────────
    // Engine Contract Violations
    // ─────────────────────────────────────────────────────────────────────────
    /// A tag is missing an attribute the contract guarantees (`href`,
    /// `link-variant`, `data-code-raw`). Indicates a bug in the upstream
    /// markup engine, not in user input.
    MissingAttribute {
        tag: String,
        attribute: &'static str,
    },
}

impl Error {
    /// Whether this error is a structural parse problem (malformed markup),
    /// as opposed to an engine contract violation.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Error::MissingAttribute { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display trait implementation for user-friendly error messages
// ─────────────────────────────────────────────────────────────────────────────
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnterminatedTag { position } => {
                write!(f, "Invalid markup: no matching '>' for '<' at {}", position)
            }
            Error::UnmatchedClosingTag => {
                write!(f, "Invalid markup: closing tag without an open element")
            }
            Error::UnclosedTags => {
                write!(f, "Invalid markup: unclosed tags at end of input")
            }
            Error::UnknownTag(tag) => {
                write!(f, "Unknown tag: {}", tag)
            }
            Error::MissingAttribute { tag, attribute } => {
                write!(f, "Missing attribute '{}' on tag {}", attribute, tag)
            }
        }
    }
}

impl std::error::Error for Error {}

// ─────────────────────────────────────────────────────────────────────────────
// Graceful Degradation Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for Result to support graceful degradation.
pub trait ResultExt<T> {
    /// If the result is an error, log it at warning level and return the
    /// provided default.
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                warn!("{}: {}. Using default.", context, err);
                default
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unterminated_tag() {
        let err = Error::UnterminatedTag { position: 7 };
        let msg = format!("{}", err);
        assert!(msg.contains("no matching '>'"));
        assert!(msg.contains('7'));
    }

    #[test]
    fn test_display_unknown_tag() {
        let err = Error::UnknownTag("<marquee>".to_string());
        assert_eq!(format!("{}", err), "Unknown tag: <marquee>");
    }

    #[test]
    fn test_display_missing_attribute() {
        let err = Error::MissingAttribute {
            tag: "<a href=\"x\">".to_string(),
            attribute: "link-variant",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("link-variant"));
    }

    #[test]
    fn test_is_structural() {
        assert!(Error::UnclosedTags.is_structural());
        assert!(Error::UnmatchedClosingTag.is_structural());
        assert!(Error::UnknownTag("<x>".into()).is_structural());
        assert!(Error::UnterminatedTag { position: 0 }.is_structural());
        assert!(!Error::MissingAttribute {
            tag: "<pre>".into(),
            attribute: "data-code-raw",
        }
        .is_structural());
    }

    #[test]
    fn test_unwrap_or_warn_default_ok() {
        let result: Result<i32> = Ok(42);
        assert_eq!(result.unwrap_or_warn_default(0, "test context"), 42);
    }

    #[test]
    fn test_unwrap_or_warn_default_err() {
        let result: Result<i32> = Err(Error::UnclosedTags);
        assert_eq!(result.unwrap_or_warn_default(0, "test context"), 0);
    }
}
