//! Markup Engine
//!
//! The markdown→annotated-markup boundary. The rest of the pipeline depends
//! only on the [`MarkupEngine`] trait, so a host can plug in its own
//! compiler; [`RegexMarkupEngine`] is the built-in implementation covering
//! exactly the constructs the range extractor models.
//!
//! The engine contract (consumed by the tokenizer/tree/extractor stages):
//! - tags: `strong em del code mention-here mention-user blockquote h1..h6
//!   pre a`;
//! - text content and attribute values are HTML-entity escaped;
//! - `<pre>` carries the raw fenced code in `data-code-raw`;
//! - `<a>` always carries `href` and `link-variant` (`"labeled"` or
//!   `"auto"`), plus `data-raw-href` when the displayed target differs from
//!   the resolved href;
//! - character content of unstyled text is preserved exactly.
//!
//! Compilation works on placeholders: each produced element is swapped for a
//! private-use-area sentinel so later rules can never match inside earlier
//! output (an `href` full of underscores must not become italic). The engine
//! does not have to be perfect — the round-trip guard downstream discards
//! styling whenever reconstruction disagrees with the input.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::markdown::tokenizer::escape_entities;

// ─────────────────────────────────────────────────────────────────────────────
// Engine Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A markdown compiler producing annotated markup.
pub trait MarkupEngine {
    fn compile(&self, markdown: &str) -> String;
}

// ─────────────────────────────────────────────────────────────────────────────
// Placeholder Stash
// ─────────────────────────────────────────────────────────────────────────────

const STASH_OPEN: char = '\u{E000}';
const STASH_CLOSE: char = '\u{E001}';

/// Holds compiled HTML fragments while rules run over the remaining text.
#[derive(Default)]
struct Stash {
    items: Vec<String>,
}

impl Stash {
    /// Store a fragment, returning its sentinel placeholder.
    fn put(&mut self, html: String) -> String {
        self.items.push(html);
        format!("{}{}{}", STASH_OPEN, self.items.len() - 1, STASH_CLOSE)
    }

    /// Expand all placeholders. Fragments may themselves contain
    /// placeholders (nested constructs), so expansion repeats; the iteration
    /// count is bounded by the stash size to survive stray sentinel
    /// characters in user input.
    fn restore(&self, mut text: String) -> String {
        for _ in 0..=self.items.len() {
            if !text.contains(STASH_OPEN) {
                break;
            }
            let mut out = String::with_capacity(text.len());
            let mut rest = text.as_str();
            while let Some(i) = rest.find(STASH_OPEN) {
                out.push_str(&rest[..i]);
                let after = &rest[i + STASH_OPEN.len_utf8()..];
                match after.find(STASH_CLOSE) {
                    Some(j) => {
                        match after[..j].parse::<usize>() {
                            Ok(index) if index < self.items.len() => {
                                out.push_str(&self.items[index]);
                            }
                            _ => {
                                out.push(STASH_OPEN);
                                out.push_str(&after[..j]);
                                out.push(STASH_CLOSE);
                            }
                        }
                        rest = &after[j + STASH_CLOSE.len_utf8()..];
                    }
                    None => {
                        out.push(STASH_OPEN);
                        rest = after;
                    }
                }
            }
            out.push_str(rest);
            text = out;
        }
        text
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Regex Engine
// ─────────────────────────────────────────────────────────────────────────────

/// The built-in regex-driven markdown compiler.
///
/// All patterns are compiled once at construction; the engine should be
/// cached and reused (see [`shared_engine`]).
pub struct RegexMarkupEngine {
    fence: Regex,
    code_span: Regex,
    heading: Regex,
    quote: Regex,
    labeled_link: Regex,
    here_mention: Regex,
    user_mention: Regex,
    email: Regex,
    url: Regex,
    scheme: Regex,
    strike: Regex,
    bold: Regex,
    italic: Regex,
}

impl Default for RegexMarkupEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexMarkupEngine {
    pub fn new() -> Self {
        // Static patterns; compilation cannot fail.
        let build = |pattern: &str| Regex::new(pattern).expect("static pattern must compile");
        Self {
            fence: build(r"```((?s:.*?))```"),
            code_span: build(r"`([^`\n]+)`"),
            heading: build(r"^(#{1,6}) (.+)$"),
            quote: build(r"^&gt;( .*)$"),
            labeled_link: build(r"\[([^\[\]]*)\]\(([^\s()]+)\)"),
            here_mention: build(r"\B@here\b"),
            user_mention: build(r"\B@[A-Za-z0-9][A-Za-z0-9.+_-]*"),
            email: build(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+\b"),
            url: build(r"https?://[^\s\x{E000}\x{E001}]+"),
            scheme: build(r"^[A-Za-z][A-Za-z0-9+.-]*:"),
            strike: build(r"~([^\s~](?:[^~\n]*[^\s~])?)~"),
            bold: build(r"\*([^\s*](?:[^*\n]*[^\s*])?)\*"),
            italic: build(r"(^|\W)_([^\s_](?:[^_\n]*[^\s_])?)_"),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Code Extraction (pre-escape)
    // ─────────────────────────────────────────────────────────────────────────

    fn extract_fences(&self, text: &str, stash: &mut Stash) -> String {
        replace_with(&self.fence, text, |caps| {
            let raw = capture(caps, 1);
            stash.put(format!(
                "<pre data-code-raw=\"{}\"></pre>",
                escape_entities(raw)
            ))
        })
    }

    fn extract_code_spans(&self, text: &str, stash: &mut Stash) -> String {
        replace_with(&self.code_span, text, |caps| {
            let content = capture(caps, 1);
            stash.put(format!("<code>{}</code>", escape_entities(content)))
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Block Rules (per line, post-escape)
    // ─────────────────────────────────────────────────────────────────────────

    fn compile_line(&self, line: &str, stash: &mut Stash) -> String {
        if let Some(caps) = self.heading.captures(line) {
            let level = capture(&caps, 1).len();
            let content = self.apply_inline(capture(&caps, 2), stash);
            return format!("<h{0}>{1}</h{0}>", level, content);
        }
        if let Some(caps) = self.quote.captures(line) {
            let content = self.apply_inline(capture(&caps, 1), stash);
            return format!("<blockquote>{}</blockquote>", content);
        }
        self.apply_inline(line, stash)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inline Rules
    // ─────────────────────────────────────────────────────────────────────────

    fn apply_inline(&self, text: &str, stash: &mut Stash) -> String {
        let text = self.apply_labeled_links(text, stash);
        let text = self.apply_mentions(&text, stash);
        let text = self.apply_autolinks(&text, stash);
        self.apply_strike(&text, stash)
    }

    fn apply_labeled_links(&self, text: &str, stash: &mut Stash) -> String {
        replace_with(&self.labeled_link, text, |caps| {
            let label = self.apply_strike(capture(caps, 1), stash);
            let target = capture(caps, 2);
            let resolved = if self.scheme.is_match(target) {
                target.to_string()
            } else {
                format!("https://{}", target)
            };
            let mut tag = format!("<a href=\"{}\" link-variant=\"labeled\"", resolved);
            if resolved != target {
                tag.push_str(&format!(" data-raw-href=\"{}\"", target));
            }
            stash.put(format!("{}>{}</a>", tag, label))
        })
    }

    fn apply_mentions(&self, text: &str, stash: &mut Stash) -> String {
        let text = replace_with(&self.here_mention, text, |_| {
            stash.put("<mention-here>@here</mention-here>".to_string())
        });
        replace_with(&self.user_mention, &text, |caps| {
            let mention = capture(caps, 0);
            stash.put(format!("<mention-user>{}</mention-user>", mention))
        })
    }

    fn apply_autolinks(&self, text: &str, stash: &mut Stash) -> String {
        let text = replace_with(&self.email, text, |caps| {
            let email = capture(caps, 0);
            stash.put(format!(
                "<a href=\"mailto:{0}\" link-variant=\"auto\">{0}</a>",
                email
            ))
        });
        replace_with(&self.url, &text, |caps| {
            let url = capture(caps, 0);
            stash.put(format!(
                "<a href=\"{0}\" link-variant=\"auto\">{0}</a>",
                url
            ))
        })
    }

    fn apply_strike(&self, text: &str, stash: &mut Stash) -> String {
        let replaced = replace_with(&self.strike, text, |caps| {
            let inner = self.apply_bold(capture(caps, 1), stash);
            stash.put(format!("<del>{}</del>", inner))
        });
        self.apply_bold(&replaced, stash)
    }

    fn apply_bold(&self, text: &str, stash: &mut Stash) -> String {
        let replaced = replace_with(&self.bold, text, |caps| {
            let inner = self.apply_italic(capture(caps, 1), stash);
            stash.put(format!("<strong>{}</strong>", inner))
        });
        self.apply_italic(&replaced, stash)
    }

    fn apply_italic(&self, text: &str, stash: &mut Stash) -> String {
        replace_with(&self.italic, text, |caps| {
            let boundary = capture(caps, 1).to_string();
            let placeholder = stash.put(format!("<em>{}</em>", capture(caps, 2)));
            format!("{}{}", boundary, placeholder)
        })
    }
}

impl MarkupEngine for RegexMarkupEngine {
    fn compile(&self, markdown: &str) -> String {
        let mut stash = Stash::default();

        let text = self.extract_fences(markdown, &mut stash);
        let text = self.extract_code_spans(&text, &mut stash);
        let text = escape_entities(&text);

        let compiled = text
            .split('\n')
            .map(|line| self.compile_line(line, &mut stash))
            .collect::<Vec<_>>()
            .join("\n");

        stash.restore(compiled)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Replace every match of `regex`, building replacements from the captures.
fn replace_with(
    regex: &Regex,
    text: &str,
    mut replacement: impl FnMut(&Captures) -> String,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in regex.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        out.push_str(&text[last..m.start()]);
        out.push_str(&replacement(&caps));
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Capture group text; empty for an unmatched group.
fn capture<'t>(caps: &Captures<'t>, group: usize) -> &'t str {
    caps.get(group).map_or("", |m| m.as_str())
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared Engine Instance
// ─────────────────────────────────────────────────────────────────────────────

static ENGINE: OnceLock<RegexMarkupEngine> = OnceLock::new();

/// Get the process-wide shared engine, built on first use.
pub fn shared_engine() -> &'static RegexMarkupEngine {
    ENGINE.get_or_init(RegexMarkupEngine::new)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
