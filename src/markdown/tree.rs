//! Markup Tree Builder
//!
//! Second stage of the annotated-markup parse: consumes the token stream and
//! builds a rooted ordered tree using a stack keyed on open/close tags.
//! Opening tags are classified into the closed [`ElementKind`] vocabulary at
//! build time, so every later stage dispatches by exhaustive `match` and an
//! out-of-vocabulary tag fails here, once.
//!
//! The tree is transient: built, walked by the range extractor, dropped.

use crate::error::{Error, Result};
use crate::markdown::tokenizer::{unescape_entities, Token};

// ─────────────────────────────────────────────────────────────────────────────
// Element Vocabulary
// ─────────────────────────────────────────────────────────────────────────────

/// The closed set of elements the annotated-markup contract may produce.
///
/// Attribute-carrying elements hold their extracted, entity-decoded values so
/// the extractor never re-parses raw tag text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// Synthetic document root.
    Root,
    /// `<strong>` — bold.
    Strong,
    /// `<em>` — italic.
    Em,
    /// `<del>` — strikethrough.
    Del,
    /// `<code>` — inline code.
    Code,
    /// `<mention-here>`.
    MentionHere,
    /// `<mention-user>`.
    MentionUser,
    /// `<blockquote>`.
    Blockquote,
    /// `<h1>`..`<h6>`; level is 1..=6.
    Heading(u8),
    /// `<pre data-code-raw="...">` — fenced code block. The raw code comes
    /// from the attribute, never from children.
    Pre { raw_code: String },
    /// `<a href="..." link-variant="...">`, optionally with `data-raw-href`.
    Anchor {
        href: String,
        raw_href: Option<String>,
        labeled: bool,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Markup Tree Node
// ─────────────────────────────────────────────────────────────────────────────

/// A node of the transient markup tree: a decoded text leaf or an element
/// with an ordered child sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Text(String),
    Element {
        kind: ElementKind,
        children: Vec<MarkupNode>,
    },
}

impl MarkupNode {
    fn element(kind: ElementKind) -> Self {
        MarkupNode::Element {
            kind,
            children: Vec::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tag Classification
// ─────────────────────────────────────────────────────────────────────────────

/// Extract an attribute value from raw tag text.
///
/// Locates `name="value"` and entity-decodes the captured value. The match
/// must not be a suffix of a longer attribute name (`href` must not match
/// inside `data-raw-href`).
fn attribute(tag: &str, name: &str) -> Option<String> {
    let needle = format!("{}=\"", name);
    let mut search_from = 0;
    while let Some(found) = tag[search_from..].find(&needle).map(|i| search_from + i) {
        let preceded_by_name_char = tag[..found]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !preceded_by_name_char {
            let value_start = found + needle.len();
            let value_end = tag[value_start..].find('"').map(|i| value_start + i)?;
            return Some(unescape_entities(&tag[value_start..value_end]));
        }
        search_from = found + needle.len();
    }
    None
}

/// Extract a required attribute, failing with the engine-contract error.
fn required_attribute(tag: &str, name: &'static str) -> Result<String> {
    attribute(tag, name).ok_or_else(|| Error::MissingAttribute {
        tag: tag.to_string(),
        attribute: name,
    })
}

/// Classify raw opening-tag text into the element vocabulary.
fn classify(tag: &str) -> Result<ElementKind> {
    match tag {
        "<strong>" => return Ok(ElementKind::Strong),
        "<em>" => return Ok(ElementKind::Em),
        "<del>" => return Ok(ElementKind::Del),
        "<code>" => return Ok(ElementKind::Code),
        "<mention-here>" => return Ok(ElementKind::MentionHere),
        "<mention-user>" => return Ok(ElementKind::MentionUser),
        "<blockquote>" => return Ok(ElementKind::Blockquote),
        "<h1>" => return Ok(ElementKind::Heading(1)),
        "<h2>" => return Ok(ElementKind::Heading(2)),
        "<h3>" => return Ok(ElementKind::Heading(3)),
        "<h4>" => return Ok(ElementKind::Heading(4)),
        "<h5>" => return Ok(ElementKind::Heading(5)),
        "<h6>" => return Ok(ElementKind::Heading(6)),
        _ => {}
    }

    if tag.starts_with("<pre") {
        let raw_code = required_attribute(tag, "data-code-raw")?;
        return Ok(ElementKind::Pre { raw_code });
    }

    if tag.starts_with("<a ") {
        let href = required_attribute(tag, "href")?;
        let labeled = required_attribute(tag, "link-variant")? == "labeled";
        let raw_href = attribute(tag, "data-raw-href");
        return Ok(ElementKind::Anchor {
            href,
            raw_href,
            labeled,
        });
    }

    Err(Error::UnknownTag(tag.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tree Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Build the markup tree from a token stream.
///
/// TEXT tokens are entity-decoded and appended as leaves of the top-of-stack
/// element. Closing tags pop unconditionally (tag names are not matched, as
/// the engine contract guarantees well-nested output); popping past the root
/// or leaving elements open at the end is a structural error.
pub fn build_tree(tokens: Vec<Token>) -> Result<MarkupNode> {
    let mut stack = vec![MarkupNode::element(ElementKind::Root)];

    for token in tokens {
        match token {
            Token::Text(payload) => {
                let text = unescape_entities(&payload);
                if let Some(MarkupNode::Element { children, .. }) = stack.last_mut() {
                    children.push(MarkupNode::Text(text));
                }
            }
            Token::Tag(payload) => {
                if payload.starts_with("</") {
                    let child = stack.pop().ok_or(Error::UnmatchedClosingTag)?;
                    let Some(MarkupNode::Element { children, .. }) = stack.last_mut() else {
                        return Err(Error::UnmatchedClosingTag);
                    };
                    children.push(child);
                } else {
                    stack.push(MarkupNode::element(classify(&payload)?));
                }
            }
        }
    }

    if stack.len() != 1 {
        return Err(Error::UnclosedTags);
    }
    Ok(stack.remove(0))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
