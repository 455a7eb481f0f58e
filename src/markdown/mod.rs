//! Markdown styling-range pipeline
//!
//! This module turns a markdown string into a flat list of styling ranges
//! over the authored text, suitable for driving decoration of an editable
//! surface without replacing its contents.
//!
//! The pipeline runs in stages:
//! 1. A [`MarkupEngine`] compiles markdown to annotated markup (HTML-like
//!    tags over the authored text).
//! 2. The tokenizer splits the markup into TEXT and TAG tokens.
//! 3. The tree builder assembles tokens into a rooted element tree.
//! 4. The range extractor walks the tree, reconstructs the authored text,
//!    and emits `{kind, start, length, depth}` ranges in UTF-16 code units.
//! 5. Post-processing sorts ranges and folds nested same-kind ranges into
//!    depth counters.
//!
//! A round-trip guard compares the reconstructed text against the input;
//! on any mismatch the whole parse degrades to "no styling" rather than
//! misplacing ranges.
//!
//! # Example
//! ```ignore
//! use crate::markdown::{parse_to_ranges, shared_engine};
//!
//! let ranges = parse_to_ranges(shared_engine(), "Hello, *world*!")?;
//! // syntax@7, bold@8 len 5, syntax@13
//! ```

pub mod engine;
pub mod ranges;
pub mod tokenizer;
pub mod tree;

pub use engine::{shared_engine, MarkupEngine, RegexMarkupEngine};
pub use ranges::{parse_to_ranges, Range, StyleKind};
