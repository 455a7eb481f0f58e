//! Range Extraction and Post-Processing
//!
//! Third and fourth stages of the pipeline. The extractor walks the markup
//! tree depth-first, reconstructing the plain text exactly as the user typed
//! it (the engine strips syntax markers; this walk re-inserts them) while
//! emitting a flat list of styling ranges over the reconstruction. The
//! post-processor sorts the ranges deterministically and collapses
//! exactly-nested same-kind ranges into depth-annotated entries.
//!
//! `parse_to_ranges` ties the stages together behind the round-trip guard:
//! if the reconstructed text is not identical to the input, every range is
//! discarded and the surface degrades to unstyled text. The text value is
//! never sacrificed for styling.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::markdown::engine::MarkupEngine;
use crate::markdown::tokenizer::tokenize;
use crate::markdown::tree::{build_tree, ElementKind, MarkupNode};
use crate::string_utils::utf16_len;

// ─────────────────────────────────────────────────────────────────────────────
// Style Vocabulary
// ─────────────────────────────────────────────────────────────────────────────

/// The closed set of styles a range can carry. Serialized with the original
/// wire names (`"bold"`, `"mention-here"`, `"h1"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleKind {
    Bold,
    Italic,
    Strikethrough,
    Link,
    Code,
    Pre,
    Blockquote,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Syntax,
    MentionHere,
    MentionUser,
}

impl StyleKind {
    /// Wire/class name of the style.
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleKind::Bold => "bold",
            StyleKind::Italic => "italic",
            StyleKind::Strikethrough => "strikethrough",
            StyleKind::Link => "link",
            StyleKind::Code => "code",
            StyleKind::Pre => "pre",
            StyleKind::Blockquote => "blockquote",
            StyleKind::H1 => "h1",
            StyleKind::H2 => "h2",
            StyleKind::H3 => "h3",
            StyleKind::H4 => "h4",
            StyleKind::H5 => "h5",
            StyleKind::H6 => "h6",
            StyleKind::Syntax => "syntax",
            StyleKind::MentionHere => "mention-here",
            StyleKind::MentionUser => "mention-user",
        }
    }

    fn heading(level: u8) -> StyleKind {
        match level {
            1 => StyleKind::H1,
            2 => StyleKind::H2,
            3 => StyleKind::H3,
            4 => StyleKind::H4,
            5 => StyleKind::H5,
            _ => StyleKind::H6,
        }
    }

    /// Ordering weight for the sort tie-break: blockquotes before headings
    /// before everything else.
    fn priority(&self) -> u8 {
        match self {
            StyleKind::Blockquote => 2,
            StyleKind::H1
            | StyleKind::H2
            | StyleKind::H3
            | StyleKind::H4
            | StyleKind::H5
            | StyleKind::H6 => 1,
            _ => 0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Range
// ─────────────────────────────────────────────────────────────────────────────

fn default_depth() -> usize {
    1
}

fn is_default_depth(depth: &usize) -> bool {
    *depth == 1
}

/// A styling range over the plain text, in UTF-16 code units.
///
/// `depth > 1` stands for `depth` logically stacked ranges occupying the
/// identical span (see `group_ranges`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    #[serde(rename = "type")]
    pub kind: StyleKind,
    pub start: usize,
    pub length: usize,
    #[serde(default = "default_depth", skip_serializing_if = "is_default_depth")]
    pub depth: usize,
}

impl Range {
    pub fn new(kind: StyleKind, start: usize, length: usize) -> Self {
        Self {
            kind,
            start,
            length,
            depth: 1,
        }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Range Extractor
// ─────────────────────────────────────────────────────────────────────────────

/// Accumulates the reconstructed text and its UTF-16 length in lockstep, so
/// range offsets never require a rescan.
#[derive(Default)]
struct Extractor {
    text: String,
    units: usize,
    ranges: Vec<Range>,
}

impl Extractor {
    fn push_text(&mut self, s: &str) {
        self.units += utf16_len(s);
        self.text.push_str(s);
    }

    /// Append a node's content without styling the node itself: a text leaf
    /// verbatim, an element via its children.
    fn process_children(&mut self, node: &MarkupNode) -> Result<()> {
        match node {
            MarkupNode::Text(t) => self.push_text(t),
            MarkupNode::Element { children, .. } => {
                for child in children {
                    self.visit(child)?;
                }
            }
        }
        Ok(())
    }

    fn styled_children(&mut self, node: &MarkupNode, kind: StyleKind) -> Result<()> {
        let start = self.units;
        self.process_children(node)?;
        self.ranges.push(Range::new(kind, start, self.units - start));
        Ok(())
    }

    fn styled_text(&mut self, s: &str, kind: StyleKind) {
        let start = self.units;
        self.push_text(s);
        self.ranges.push(Range::new(kind, start, self.units - start));
    }

    fn syntax(&mut self, marker: &str) {
        self.styled_text(marker, StyleKind::Syntax);
    }

    fn visit(&mut self, node: &MarkupNode) -> Result<()> {
        let (kind, children) = match node {
            MarkupNode::Text(t) => {
                self.push_text(t);
                return Ok(());
            }
            MarkupNode::Element { kind, children } => (kind, children),
        };

        match kind {
            ElementKind::Root => self.process_children(node)?,
            ElementKind::Strong => {
                self.syntax("*");
                self.styled_children(node, StyleKind::Bold)?;
                self.syntax("*");
            }
            ElementKind::Em => {
                self.syntax("_");
                self.styled_children(node, StyleKind::Italic)?;
                self.syntax("_");
            }
            ElementKind::Del => {
                self.syntax("~");
                self.styled_children(node, StyleKind::Strikethrough)?;
                self.syntax("~");
            }
            ElementKind::Code => {
                self.syntax("`");
                self.styled_children(node, StyleKind::Code)?;
                self.syntax("`");
            }
            ElementKind::MentionHere => self.styled_children(node, StyleKind::MentionHere)?,
            ElementKind::MentionUser => self.styled_children(node, StyleKind::MentionUser)?,
            ElementKind::Blockquote => {
                self.syntax(">");
                self.styled_children(node, StyleKind::Blockquote)?;
                // The "> " separator space lives inside the children; widen
                // the blockquote range to cover the ">" marker as well.
                if let Some(range) = self.ranges.last_mut() {
                    range.start -= 1;
                    range.length += 1;
                }
            }
            ElementKind::Heading(level) => {
                let marker = format!("{} ", "#".repeat(usize::from(*level)));
                self.syntax(&marker);
                self.styled_children(node, StyleKind::heading(*level))?;
            }
            ElementKind::Pre { raw_code } => {
                self.syntax("```");
                self.styled_text(raw_code, StyleKind::Pre);
                self.syntax("```");
            }
            ElementKind::Anchor {
                href,
                raw_href,
                labeled,
            } => {
                let target = raw_href.as_deref().unwrap_or(href);
                let bare_child = match children.as_slice() {
                    [MarkupNode::Text(t)] => Some(t.as_str()),
                    _ => None,
                };
                let is_plain_autolink = !labeled
                    && bare_child.is_some_and(|t| {
                        t == target || format!("mailto:{}", t) == *href
                    });

                if is_plain_autolink {
                    // `bare_child` is guaranteed by `is_plain_autolink`
                    self.styled_text(bare_child.unwrap_or_default(), StyleKind::Link);
                } else {
                    self.syntax("[");
                    self.process_children(node)?;
                    self.syntax("](");
                    self.styled_text(target, StyleKind::Link);
                    self.syntax(")");
                }
            }
        }
        Ok(())
    }
}

/// Walk the markup tree, reconstructing the authored plain text and the flat
/// range list over it.
pub fn extract_ranges(tree: &MarkupNode) -> Result<(String, Vec<Range>)> {
    let mut extractor = Extractor::default();
    extractor.visit(tree)?;
    Ok((extractor.text, extractor.ranges))
}

// ─────────────────────────────────────────────────────────────────────────────
// Range Post-Processor
// ─────────────────────────────────────────────────────────────────────────────

/// Sort ranges by start ascending; ties by length descending (outer ranges
/// first), then by tag priority. The sort is stable, so equal keys keep
/// extraction order.
pub fn sort_ranges(ranges: &mut [Range]) {
    ranges.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.length.cmp(&a.length))
            .then(b.kind.priority().cmp(&a.kind.priority()))
    });
}

/// Collapse exactly-nested same-kind ranges into depth-annotated entries.
///
/// Scanning the sorted list, a range fully contained in the last emitted
/// range of the same kind (and longer than one unit) increments that range's
/// `depth` instead of being emitted. Single-unit ranges are never collapsed.
pub fn group_ranges(ranges: Vec<Range>) -> Vec<Range> {
    let mut last_index: HashMap<StyleKind, usize> = HashMap::new();
    let mut grouped: Vec<Range> = Vec::with_capacity(ranges.len());

    for range in ranges {
        let contained_in_last = last_index
            .get(&range.kind)
            .and_then(|&i| grouped.get(i))
            .is_some_and(|last| last.start <= range.start && last.end() >= range.end());

        if contained_in_last && range.length > 1 {
            if let Some(&i) = last_index.get(&range.kind) {
                grouped[i].depth += 1;
            }
        } else {
            last_index.insert(range.kind, grouped.len());
            grouped.push(range);
        }
    }

    grouped
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline Entry Point
// ─────────────────────────────────────────────────────────────────────────────

/// Run the full markdown→ranges pipeline.
///
/// Structural problems in the engine output (malformed or unknown tags) and
/// round-trip mismatches degrade to an empty range list: the user still sees
/// their literal text, just unstyled. Only engine contract violations
/// ([`Error::MissingAttribute`]) surface as errors.
pub fn parse_to_ranges(engine: &dyn MarkupEngine, markdown: &str) -> Result<Vec<Range>> {
    let markup = engine.compile(markdown);

    let stages = tokenize(&markup).and_then(build_tree);
    let tree = match stages {
        Ok(tree) => tree,
        Err(err) if err.is_structural() => {
            debug!("Structural markup error, rendering unstyled: {}", err);
            return Ok(Vec::new());
        }
        Err(err) => return Err(err),
    };

    let (text, mut ranges) = extract_ranges(&tree)?;
    if text != markdown {
        debug!(
            "Round-trip mismatch ({} vs {} chars), rendering unstyled",
            text.len(),
            markdown.len()
        );
        return Ok(Vec::new());
    }

    sort_ranges(&mut ranges);
    Ok(group_ranges(ranges))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::engine::RegexMarkupEngine;

    fn ranges_for(markdown: &str) -> Vec<Range> {
        let engine = RegexMarkupEngine::new();
        parse_to_ranges(&engine, markdown).unwrap()
    }

    fn range(kind: StyleKind, start: usize, length: usize) -> Range {
        Range::new(kind, start, length)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Concrete Scenario Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_bold_scenario() {
        let ranges = ranges_for("Hello, *world*!");
        assert_eq!(
            ranges,
            vec![
                range(StyleKind::Syntax, 7, 1),
                range(StyleKind::Bold, 8, 5),
                range(StyleKind::Syntax, 13, 1),
            ]
        );
    }

    #[test]
    fn test_inline_code_scenario() {
        let ranges = ranges_for("`code`");
        assert_eq!(
            ranges,
            vec![
                range(StyleKind::Syntax, 0, 1),
                range(StyleKind::Code, 1, 4),
                range(StyleKind::Syntax, 5, 1),
            ]
        );
    }

    #[test]
    fn test_heading_scenario() {
        let ranges = ranges_for("# Lorem ipsum");
        assert_eq!(
            ranges,
            vec![
                range(StyleKind::Syntax, 0, 2),
                range(StyleKind::H1, 2, 11),
            ]
        );
    }

    #[test]
    fn test_blockquote_scenario() {
        let text = "> Hello world";
        let ranges = ranges_for(text);
        // Blockquote covers the whole line including the "> " prefix; the
        // syntax range covers only ">".
        assert_eq!(
            ranges,
            vec![
                range(StyleKind::Blockquote, 0, text.len()),
                range(StyleKind::Syntax, 0, 1),
            ]
        );
    }

    #[test]
    fn test_italic_and_strikethrough() {
        assert_eq!(
            ranges_for("_hi_"),
            vec![
                range(StyleKind::Syntax, 0, 1),
                range(StyleKind::Italic, 1, 2),
                range(StyleKind::Syntax, 3, 1),
            ]
        );
        assert_eq!(
            ranges_for("~no~"),
            vec![
                range(StyleKind::Syntax, 0, 1),
                range(StyleKind::Strikethrough, 1, 2),
                range(StyleKind::Syntax, 3, 1),
            ]
        );
    }

    #[test]
    fn test_nested_emphasis() {
        let ranges = ranges_for("*_x_*");
        assert_eq!(
            ranges,
            vec![
                range(StyleKind::Syntax, 0, 1),
                range(StyleKind::Bold, 1, 3),
                range(StyleKind::Syntax, 1, 1),
                range(StyleKind::Italic, 2, 1),
                range(StyleKind::Syntax, 3, 1),
                range(StyleKind::Syntax, 4, 1),
            ]
        );
    }

    #[test]
    fn test_fenced_code_block() {
        let ranges = ranges_for("```let x = 1;```");
        assert_eq!(
            ranges,
            vec![
                range(StyleKind::Syntax, 0, 3),
                range(StyleKind::Pre, 3, 10),
                range(StyleKind::Syntax, 13, 3),
            ]
        );
    }

    #[test]
    fn test_autolink() {
        let text = "see https://example.com now";
        let ranges = ranges_for(text);
        assert_eq!(ranges, vec![range(StyleKind::Link, 4, 19)]);
    }

    #[test]
    fn test_labeled_link() {
        let ranges = ranges_for("[docs](https://example.com)");
        assert_eq!(
            ranges,
            vec![
                range(StyleKind::Syntax, 0, 1),
                range(StyleKind::Syntax, 5, 2),
                range(StyleKind::Link, 7, 19),
                range(StyleKind::Syntax, 26, 1),
            ]
        );
    }

    #[test]
    fn test_mention_here() {
        let ranges = ranges_for("ping @here now");
        assert_eq!(ranges, vec![range(StyleKind::MentionHere, 5, 5)]);
    }

    #[test]
    fn test_malformed_markup_yields_no_ranges() {
        struct BrokenEngine;
        impl MarkupEngine for BrokenEngine {
            fn compile(&self, markdown: &str) -> String {
                format!("<strong>{}", markdown)
            }
        }
        let ranges = parse_to_ranges(&BrokenEngine, "hello").unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_unknown_tag_yields_no_ranges() {
        struct UnknownTagEngine;
        impl MarkupEngine for UnknownTagEngine {
            fn compile(&self, markdown: &str) -> String {
                format!("<widget>{}</widget>", markdown)
            }
        }
        let ranges = parse_to_ranges(&UnknownTagEngine, "hello").unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_missing_attribute_is_an_error() {
        struct NoAttrEngine;
        impl MarkupEngine for NoAttrEngine {
            fn compile(&self, _markdown: &str) -> String {
                "<pre>x</pre>".to_string()
            }
        }
        let err = parse_to_ranges(&NoAttrEngine, "x").unwrap_err();
        assert!(!err.is_structural());
    }

    #[test]
    fn test_round_trip_mismatch_yields_no_ranges() {
        struct LossyEngine;
        impl MarkupEngine for LossyEngine {
            fn compile(&self, _markdown: &str) -> String {
                // Drops the asterisks the extractor would re-insert
                "<strong>abc</strong>".to_string()
            }
        }
        let ranges = parse_to_ranges(&LossyEngine, "abc").unwrap();
        assert!(ranges.is_empty());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Property Tests
    // ─────────────────────────────────────────────────────────────────────────

    const CORPUS: &[&str] = &[
        "plain text, nothing special",
        "Hello, *world*!",
        "_italic_ and *bold* and ~gone~",
        "`code` and ```pre``` blocks",
        "# Heading one",
        "###### Heading six",
        "> Hello world",
        "> quoted *bold* text",
        "see https://example.com now",
        "[docs](https://example.com)",
        "mail me@example.com please",
        "ping @here and @alice now",
        "multi\nline\ntext with *styles*\nhere",
        "unicode: på 🎉 中文 *bold🎉*",
    ];

    #[test]
    fn test_round_trip_reconstruction() {
        let engine = RegexMarkupEngine::new();
        for input in CORPUS {
            let markup = engine.compile(input);
            let tree = build_tree(tokenize(&markup).unwrap()).unwrap();
            let (text, _) = extract_ranges(&tree).unwrap();
            assert_eq!(&text, input, "round-trip failed for {:?}", input);
        }
    }

    #[test]
    fn test_range_validity() {
        for input in CORPUS {
            let total = utf16_len(input);
            for range in ranges_for(input) {
                assert!(range.end() <= total, "range {:?} exceeds {:?}", range, input);
                assert!(range.depth >= 1);
            }
        }
    }

    #[test]
    fn test_styling_idempotence() {
        for input in CORPUS {
            assert_eq!(ranges_for(input), ranges_for(input), "for {:?}", input);
        }
    }

    #[test]
    fn test_offsets_are_utf16_units() {
        // "🎉 *x*": emoji is two UTF-16 units
        let ranges = ranges_for("🎉 *x*");
        assert_eq!(
            ranges,
            vec![
                range(StyleKind::Syntax, 3, 1),
                range(StyleKind::Bold, 4, 1),
                range(StyleKind::Syntax, 5, 1),
            ]
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sort and Group Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_sort_start_then_length_then_priority() {
        let mut ranges = vec![
            range(StyleKind::Syntax, 5, 1),
            range(StyleKind::H1, 0, 13),
            range(StyleKind::Syntax, 0, 1),
            range(StyleKind::Blockquote, 0, 13),
        ];
        sort_ranges(&mut ranges);
        assert_eq!(
            ranges,
            vec![
                range(StyleKind::Blockquote, 0, 13),
                range(StyleKind::H1, 0, 13),
                range(StyleKind::Syntax, 0, 1),
                range(StyleKind::Syntax, 5, 1),
            ]
        );
    }

    #[test]
    fn test_group_nested_same_kind_collapses() {
        let grouped = group_ranges(vec![
            range(StyleKind::Bold, 0, 10),
            range(StyleKind::Bold, 2, 5),
        ]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].depth, 2);
        assert_eq!(grouped[0].start, 0);
        assert_eq!(grouped[0].length, 10);
    }

    #[test]
    fn test_group_triple_nesting() {
        let grouped = group_ranges(vec![
            range(StyleKind::Italic, 0, 10),
            range(StyleKind::Italic, 1, 8),
            range(StyleKind::Italic, 2, 6),
        ]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].depth, 3);
    }

    #[test]
    fn test_group_different_kinds_unaffected() {
        let input = vec![
            range(StyleKind::Blockquote, 0, 13),
            range(StyleKind::H1, 2, 11),
        ];
        assert_eq!(group_ranges(input.clone()), input);
    }

    #[test]
    fn test_group_single_char_ranges_not_collapsed() {
        // The length > 1 guard: single-unit nested ranges stay separate
        let input = vec![
            range(StyleKind::Bold, 0, 5),
            range(StyleKind::Bold, 2, 1),
        ];
        assert_eq!(group_ranges(input.clone()), input);
    }

    #[test]
    fn test_group_disjoint_same_kind_not_collapsed() {
        let input = vec![
            range(StyleKind::Bold, 0, 3),
            range(StyleKind::Bold, 5, 3),
        ];
        assert_eq!(group_ranges(input.clone()), input);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Serialization Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_range_json_wire_format() {
        let json = serde_json::to_string(&range(StyleKind::MentionHere, 3, 5)).unwrap();
        assert_eq!(json, r#"{"type":"mention-here","start":3,"length":5}"#);
    }

    #[test]
    fn test_range_json_depth() {
        let mut r = range(StyleKind::Bold, 0, 4);
        r.depth = 2;
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains(r#""depth":2"#));

        let parsed: Range = serde_json::from_str(r#"{"type":"h1","start":2,"length":11}"#).unwrap();
        assert_eq!(parsed.depth, 1);
        assert_eq!(parsed.kind, StyleKind::H1);
    }
}
