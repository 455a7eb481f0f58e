//! Markup Tokenizer
//!
//! First stage of the annotated-markup parse: a purely lexical left-to-right
//! scan that splits the engine output into TEXT and TAG tokens. A TAG token
//! is the verbatim text between `<` and the next `>`, inclusive — no nesting
//! awareness at this stage.

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Token Type
// ─────────────────────────────────────────────────────────────────────────────

/// A lexical token of the annotated-markup string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Plain text between tags, still HTML-entity escaped.
    Text(String),
    /// A complete tag, `<`..`>` inclusive, attributes and all.
    Tag(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokenizer
// ─────────────────────────────────────────────────────────────────────────────

/// Split an annotated-markup string into TEXT and TAG tokens.
///
/// Fails with [`Error::UnterminatedTag`] if an opening `<` has no matching
/// `>` before end of input.
pub fn tokenize(markup: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut left = 0;

    loop {
        let Some(open) = markup[left..].find('<').map(|i| left + i) else {
            if left < markup.len() {
                tokens.push(Token::Text(markup[left..].to_string()));
            }
            break;
        };
        if open != left {
            tokens.push(Token::Text(markup[left..open].to_string()));
        }
        let close = markup[open..]
            .find('>')
            .map(|i| open + i)
            .ok_or(Error::UnterminatedTag { position: open })?;
        tokens.push(Token::Tag(markup[open..=close].to_string()));
        left = close + 1;
    }

    Ok(tokens)
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Entity Escaping
// ─────────────────────────────────────────────────────────────────────────────

/// Escape text for embedding in annotated markup (body text or attribute
/// values). Covers the same set the original engine escapes.
pub fn escape_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Reverse [`escape_entities`]. `&amp;` is decoded last so escaped sequences
/// inside the text survive a round trip.
pub fn unescape_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&#x60;", "`")
        .replace("&amp;", "&")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
