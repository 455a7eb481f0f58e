//! UTF-16 Code-Unit Indexing Utilities
//!
//! Styling ranges, cursor positions, and history cursors all index the text
//! in UTF-16 code units, matching the host text model (web `String.length`,
//! native `NSString`). Rust strings are UTF-8, so every slice taken by the
//! renderer or cursor mapper goes through the converters in this module.
//!
//! # Problem
//! Characters like `ø`, `中`, `🎉` occupy one or two UTF-16 units but one to
//! four UTF-8 bytes. `🎉` is two UTF-16 units; an offset landing between the
//! surrogate halves has no byte equivalent and is floored to the character
//! start.
//!
//! # Example
//! ```ignore
//! use crate::string_utils::{utf16_len, slice_utf16};
//!
//! let text = "Hi🎉!";
//! assert_eq!(utf16_len(text), 5);
//! assert_eq!(slice_utf16(text, 2, 4), "🎉");
//! ```

// ─────────────────────────────────────────────────────────────────────────────
// Length and Index Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Length of a string in UTF-16 code units.
#[inline]
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Convert a UTF-16 code-unit index to a UTF-8 byte index.
///
/// An index inside a surrogate pair is floored to the start of the character.
/// An index beyond the end returns the byte length.
pub fn utf16_to_byte_index(s: &str, utf16_index: usize) -> usize {
    let mut units = 0;
    for (byte_index, ch) in s.char_indices() {
        if units >= utf16_index {
            return byte_index;
        }
        units += ch.len_utf16();
    }
    s.len()
}

/// Convert a UTF-8 byte index to a UTF-16 code-unit index.
///
/// A byte index in the middle of a character counts up to (but not including)
/// that character. An index beyond the end returns the UTF-16 length.
pub fn byte_to_utf16_index(s: &str, byte_index: usize) -> usize {
    let mut units = 0;
    for (i, ch) in s.char_indices() {
        if i >= byte_index {
            return units;
        }
        units += ch.len_utf16();
    }
    units
}

// ─────────────────────────────────────────────────────────────────────────────
// Slicing
// ─────────────────────────────────────────────────────────────────────────────

/// Slice a string by UTF-16 code-unit offsets.
///
/// Offsets are clamped to the string and floored to character starts, so the
/// call never panics. Returns an empty string when `start >= end` after
/// clamping.
pub fn slice_utf16(s: &str, start: usize, end: usize) -> &str {
    let start = utf16_to_byte_index(s, start);
    let end = utf16_to_byte_index(s, end);

    if start >= end {
        return "";
    }

    &s[start..end]
}

/// Clamp a UTF-16 offset to `0..=utf16_len(s)`.
#[inline]
pub fn clamp_utf16(s: &str, offset: usize) -> usize {
    offset.min(utf16_len(s))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
