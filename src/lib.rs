//! Live incremental markdown syntax highlighting for editable surfaces.
//!
//! As the user types plain text with markdown markers (`*bold*`, `` `code` ``,
//! `# heading`, `@mentions`, links, blockquotes), the surface styles the
//! markers and their content while the underlying text stays exactly what was
//! typed — no markers are consumed or hidden.
//!
//! The crate is organized as a pipeline:
//! - [`markdown`] — markdown → annotated markup → styling ranges
//!   (engine, tokenizer, tree builder, range extractor, post-processor).
//! - [`render`] — styling ranges → visual tree of styled spans, plus the
//!   per-construct style configuration.
//! - [`cursor`] — flat text offsets ⇄ anchors in the visual tree, for caret
//!   restoration across re-renders.
//! - [`history`] — bounded undo/redo with debounced coalescing of bursts.
//! - [`session`] — one-per-surface glue driving all of the above from host
//!   input events.
//!
//! # Example
//! ```
//! use live_markdown::session::{EditorSession, InputEvent, SessionOptions};
//! use std::time::Instant;
//!
//! let mut session = EditorSession::new(SessionOptions::default());
//! let parsed = session.apply(
//!     InputEvent::Edit { text: "Hello, *world*!".into(), cursor: Some(15) },
//!     Instant::now(),
//! );
//! assert_eq!(parsed.tree.visible_text(), "Hello, *world*!");
//! ```

pub mod cursor;
pub mod error;
pub mod history;
pub mod markdown;
pub mod render;
pub mod session;
pub mod string_utils;

pub use cursor::{
    anchor_at_offset, offset_of_anchor, selection_offsets, CursorAnchor, Selection, TreeSelection,
};
pub use error::{Error, Result};
pub use history::{HistoryEntry, InputHistory};
pub use markdown::{parse_to_ranges, shared_engine, MarkupEngine, Range, RegexMarkupEngine, StyleKind};
pub use render::{render_ranges, MarkdownStyle, NodeId, NodeKind, TextStyle, VisualTree};
pub use session::{parse_text, EditorSession, InputEvent, ParsedText, SessionOptions};
