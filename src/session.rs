//! Editor Session
//!
//! Ties the pipeline to a live surface: one session per editable surface,
//! owning the edit history, the merged style sheet, and the markup engine.
//! The host forwards input events and repaints from the returned
//! [`ParsedText`]; time is passed in with each event so the debounced
//! history needs no timer of its own.

use std::time::Instant;

use crate::cursor::{anchor_at_offset, CursorAnchor};
use crate::error::ResultExt;
use crate::history::InputHistory;
use crate::markdown::{parse_to_ranges, MarkupEngine, RegexMarkupEngine};
use crate::render::{render_ranges_opts, MarkdownStyle, VisualTree};
use crate::string_utils::{clamp_utf16, utf16_len};

// ─────────────────────────────────────────────────────────────────────────────
// Session Options
// ─────────────────────────────────────────────────────────────────────────────

/// Per-surface behavior switches.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Strip newlines from incoming text (single-line surfaces).
    pub single_line: bool,
    /// Render spans without resolved styles; the host styles by kind.
    pub flatten_styles: bool,
    /// Undo/redo capacity.
    pub max_history: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            single_line: false,
            flatten_styles: false,
            max_history: crate::history::DEFAULT_DEPTH,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Events
// ─────────────────────────────────────────────────────────────────────────────

/// One discrete input event from the host surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// The user edited the text; `cursor` is the caret after the edit.
    Edit { text: String, cursor: Option<usize> },
    /// Platform undo intent.
    HistoryUndo,
    /// Platform redo intent.
    HistoryRedo,
    /// Programmatic value set (controlled input).
    ReplaceText { text: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Parse Result
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the host needs to repaint after one event.
#[derive(Debug)]
pub struct ParsedText {
    pub tree: VisualTree,
    pub text: String,
    /// Caret offset, clamped to the text.
    pub cursor_position: usize,
    /// The caret located inside the fresh tree.
    pub anchor: CursorAnchor,
}

/// Run the pipeline once, without session state.
///
/// A lone `"\n"` (or empty text) produces a root-only tree: the surface
/// represents a single newline with no visible content. A parse failure on
/// the engine contract logs and degrades to an unstyled tree. In single-line
/// mode the cursor anchor skips line breaks, matching hosts whose
/// single-line measurement omits them.
pub fn parse_text(
    engine: &dyn MarkupEngine,
    text: &str,
    cursor_position: Option<usize>,
    style: &MarkdownStyle,
    flatten_styles: bool,
    single_line: bool,
) -> ParsedText {
    let tree = if text.is_empty() || text == "\n" {
        VisualTree::new()
    } else {
        let ranges =
            parse_to_ranges(engine, text).unwrap_or_warn_default(Vec::new(), "markdown parse");
        render_ranges_opts(text, &ranges, style, flatten_styles)
    };

    let cursor_position = clamp_utf16(text, cursor_position.unwrap_or_else(|| utf16_len(text)));
    let anchor = anchor_at_offset(&tree, cursor_position, single_line);

    ParsedText {
        tree,
        text: text.to_string(),
        cursor_position,
        anchor,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Editor Session
// ─────────────────────────────────────────────────────────────────────────────

/// State for one live surface.
pub struct EditorSession {
    engine: Box<dyn MarkupEngine>,
    style: MarkdownStyle,
    options: SessionOptions,
    history: InputHistory,
    text: String,
}

impl EditorSession {
    /// Session with the built-in engine and default styles.
    pub fn new(options: SessionOptions) -> Self {
        Self::with_engine(
            Box::new(RegexMarkupEngine::new()),
            MarkdownStyle::default(),
            options,
        )
    }

    pub fn with_engine(
        engine: Box<dyn MarkupEngine>,
        style: MarkdownStyle,
        options: SessionOptions,
    ) -> Self {
        let history = InputHistory::new(options.max_history);
        EditorSession {
            engine,
            style,
            options,
            history,
            text: String::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Handle one input event and produce the repaint payload.
    ///
    /// `now` drives the history debounce: a due pending commit is flushed
    /// before an edit is recorded, so bursts separated by a quiet period
    /// become separate undo steps.
    pub fn apply(&mut self, event: InputEvent, now: Instant) -> ParsedText {
        match event {
            InputEvent::Edit { text, cursor } => {
                let text = self.normalized(&text);
                self.history.flush(now);
                let parsed = self.parse(&text, cursor);
                self.history
                    .debounced_add(&text, Some(parsed.cursor_position), now);
                self.text = text;
                parsed
            }
            InputEvent::HistoryUndo => {
                let entry = self.history.undo().cloned();
                self.restore(entry)
            }
            InputEvent::HistoryRedo => {
                let entry = self.history.redo().cloned();
                self.restore(entry)
            }
            InputEvent::ReplaceText { text } => {
                let text = self.normalized(&text);
                let parsed = self.parse(&text, None);
                self.history.add(&text, Some(parsed.cursor_position));
                self.text = text;
                parsed
            }
        }
    }

    /// Flush a due pending history commit outside of any event.
    pub fn tick(&mut self, now: Instant) {
        self.history.flush(now);
    }

    fn parse(&self, text: &str, cursor: Option<usize>) -> ParsedText {
        parse_text(
            self.engine.as_ref(),
            text,
            cursor,
            &self.style,
            self.options.flatten_styles,
            self.options.single_line,
        )
    }

    /// Re-render from a history entry, or from the current text when the
    /// history had nowhere to move. Restored states are not re-recorded.
    fn restore(&mut self, entry: Option<crate::history::HistoryEntry>) -> ParsedText {
        match entry {
            Some(entry) => {
                let parsed = self.parse(&entry.text, entry.cursor_position);
                self.text = entry.text;
                parsed
            }
            None => self.parse(&self.text.clone(), None),
        }
    }

    fn normalized(&self, text: &str) -> String {
        if self.options.single_line {
            text.replace('\n', "")
        } else {
            text.to_string()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
