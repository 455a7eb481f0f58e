//! Cursor Mapping
//!
//! Translates between flat text offsets (UTF-16 code units over the visible
//! text) and anchors inside the visual tree. Re-rendering rebuilds the tree
//! on every edit, so the host restores the caret by converting its flat
//! offset to an anchor in the fresh tree; reading a selection back goes the
//! other way.

use crate::render::{NodeId, NodeKind, VisualTree};
use crate::string_utils::utf16_len;

// ─────────────────────────────────────────────────────────────────────────────
// Cursor Anchor
// ─────────────────────────────────────────────────────────────────────────────

/// A caret position expressed against visual-tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorAnchor {
    /// Inside a text leaf, `offset` UTF-16 units into it.
    InText { node: NodeId, offset: usize },
    /// Immediately after a line break.
    AfterNode(NodeId),
    /// After the last child of the root (end of surface).
    End,
}

// ─────────────────────────────────────────────────────────────────────────────
// Offset → Anchor
// ─────────────────────────────────────────────────────────────────────────────

/// Find the anchor for a flat text offset.
///
/// Walks the tree in document order counting text leaves (UTF-16 units) and
/// line breaks (one unit each). An offset at the exact end of a text leaf
/// anchors in that leaf, not the next one. With `ignore_line_breaks` the walk
/// skips line breaks entirely, matching hosts whose text measurement omits
/// them. Offsets past the end map to [`CursorAnchor::End`].
pub fn anchor_at_offset(tree: &VisualTree, offset: usize, ignore_line_breaks: bool) -> CursorAnchor {
    let mut pos = 0;
    let mut stack = vec![tree.root()];

    while let Some(id) = stack.pop() {
        match &tree.node(id).kind {
            NodeKind::Text(text) => {
                let len = utf16_len(text);
                if pos + len >= offset {
                    return CursorAnchor::InText {
                        node: id,
                        offset: offset - pos,
                    };
                }
                pos += len;
            }
            NodeKind::LineBreak => {
                if pos + 1 >= offset {
                    return CursorAnchor::AfterNode(id);
                }
                pos += 1;
            }
            NodeKind::Root | NodeKind::Span { .. } => {
                for &child in tree.children(id).iter().rev() {
                    if ignore_line_breaks
                        && matches!(tree.node(child).kind, NodeKind::LineBreak)
                    {
                        continue;
                    }
                    stack.push(child);
                }
            }
        }
    }

    CursorAnchor::End
}

/// The anchor for "move caret to end of surface".
pub fn end_anchor() -> CursorAnchor {
    CursorAnchor::End
}

// ─────────────────────────────────────────────────────────────────────────────
// Anchor → Offset
// ─────────────────────────────────────────────────────────────────────────────

/// Flat text offset of an anchor: the visible-text length strictly before it.
pub fn offset_of_anchor(tree: &VisualTree, anchor: &CursorAnchor) -> usize {
    let mut pos = 0;
    let mut stack = vec![tree.root()];

    while let Some(id) = stack.pop() {
        match (&tree.node(id).kind, anchor) {
            (NodeKind::Text(_), CursorAnchor::InText { node, offset }) if id == *node => {
                return pos + offset;
            }
            (NodeKind::Text(text), _) => pos += utf16_len(text),
            (NodeKind::LineBreak, CursorAnchor::AfterNode(node)) if id == *node => {
                return pos + 1;
            }
            (NodeKind::LineBreak, _) => pos += 1,
            _ => stack.extend(tree.children(id).iter().rev().copied()),
        }
    }

    // End anchor, or an anchor from a stale tree
    pos
}

/// A selection between two anchors in the visual tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSelection {
    pub start: CursorAnchor,
    pub end: CursorAnchor,
}

/// A selection as flat text offsets. `start > end` is a backward selection
/// (the user dragged right-to-left); callers that do not care about
/// direction order the pair themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

/// Flat offsets of a tree selection, each edge mapped independently.
/// Without a selection both edges sit at the end of the text.
pub fn selection_offsets(tree: &VisualTree, selection: Option<&TreeSelection>) -> Selection {
    match selection {
        Some(selection) => Selection {
            start: offset_of_anchor(tree, &selection.start),
            end: offset_of_anchor(tree, &selection.end),
        },
        None => {
            let end = offset_of_anchor(tree, &CursorAnchor::End);
            Selection { start: end, end }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{parse_to_ranges, RegexMarkupEngine};
    use crate::render::{render_ranges, MarkdownStyle};

    fn tree_for(markdown: &str) -> VisualTree {
        let engine = RegexMarkupEngine::new();
        let ranges = parse_to_ranges(&engine, markdown).unwrap();
        render_ranges(markdown, &ranges, &MarkdownStyle::default())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Anchor Resolution Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_round_trip_every_offset() {
        let cases = ["hello", "Hello, *world*!", "# Title\nbody", "> *b*\nplain"];
        for case in cases {
            let tree = tree_for(case);
            for offset in 0..=utf16_len(case) {
                let anchor = anchor_at_offset(&tree, offset, false);
                assert_eq!(
                    offset_of_anchor(&tree, &anchor),
                    offset,
                    "case {:?} offset {}",
                    case,
                    offset
                );
            }
        }
    }

    #[test]
    fn test_offset_in_styled_span() {
        // "Hello, *world*!": offset 10 is two units into "world"
        let tree = tree_for("Hello, *world*!");
        let anchor = anchor_at_offset(&tree, 10, false);
        let CursorAnchor::InText { node, offset } = anchor else {
            panic!("expected text anchor");
        };
        assert_eq!(offset, 2);
        assert_eq!(
            tree.node(node).kind,
            NodeKind::Text("world".to_string())
        );
    }

    #[test]
    fn test_offset_at_text_end_stays_in_leaf() {
        // Offset 5 is the boundary "hello"|"\n"; it anchors in "hello"
        let tree = tree_for("hello\nworld");
        let anchor = anchor_at_offset(&tree, 5, false);
        assert!(matches!(
            anchor,
            CursorAnchor::InText { offset: 5, .. }
        ));
    }

    #[test]
    fn test_offset_after_line_break() {
        // Offset 6 in "hello\nworld" falls on the line break
        let tree = tree_for("hello\nworld");
        let anchor = anchor_at_offset(&tree, 6, false);
        let CursorAnchor::AfterNode(node) = anchor else {
            panic!("expected after-node anchor");
        };
        assert_eq!(tree.node(node).kind, NodeKind::LineBreak);
    }

    #[test]
    fn test_ignore_line_breaks_skips_them() {
        let tree = tree_for("ab\ncd");
        // With line breaks ignored, offset 3 is one unit into "cd"
        let anchor = anchor_at_offset(&tree, 3, true);
        let CursorAnchor::InText { node, offset } = anchor else {
            panic!("expected text anchor");
        };
        assert_eq!(offset, 1);
        assert_eq!(tree.node(node).kind, NodeKind::Text("cd".to_string()));
    }

    #[test]
    fn test_offset_past_end() {
        let tree = tree_for("ab");
        assert_eq!(anchor_at_offset(&tree, 99, false), CursorAnchor::End);
        assert_eq!(offset_of_anchor(&tree, &CursorAnchor::End), 2);
    }

    #[test]
    fn test_empty_tree() {
        let tree = tree_for("");
        assert_eq!(anchor_at_offset(&tree, 0, false), CursorAnchor::End);
        assert_eq!(offset_of_anchor(&tree, &end_anchor()), 0);
    }

    #[test]
    fn test_astral_text_counts_utf16_units() {
        let tree = tree_for("🎉 *x*");
        // The emoji is two units; offset 2 is its end, inside the first leaf
        let anchor = anchor_at_offset(&tree, 2, false);
        let CursorAnchor::InText { offset, .. } = anchor else {
            panic!("expected text anchor");
        };
        assert_eq!(offset, 2);
        // Full round trip across the emoji boundary
        for offset in 0..=utf16_len("🎉 *x*") {
            let anchor = anchor_at_offset(&tree, offset, false);
            assert_eq!(offset_of_anchor(&tree, &anchor), offset);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_selection_maps_edges_independently() {
        let tree = tree_for("hello world");
        let selection = TreeSelection {
            start: anchor_at_offset(&tree, 3, false),
            end: anchor_at_offset(&tree, 8, false),
        };
        assert_eq!(
            selection_offsets(&tree, Some(&selection)),
            Selection { start: 3, end: 8 }
        );
    }

    #[test]
    fn test_backward_selection_preserved() {
        let tree = tree_for("hello world");
        let selection = TreeSelection {
            start: anchor_at_offset(&tree, 8, false),
            end: anchor_at_offset(&tree, 3, false),
        };
        assert_eq!(
            selection_offsets(&tree, Some(&selection)),
            Selection { start: 8, end: 3 }
        );
    }

    #[test]
    fn test_no_selection_sits_at_end() {
        let tree = tree_for("hello");
        assert_eq!(
            selection_offsets(&tree, None),
            Selection { start: 5, end: 5 }
        );
    }

    #[test]
    fn test_collapsed_selection() {
        let tree = tree_for("hello");
        let anchor = anchor_at_offset(&tree, 2, false);
        let selection = TreeSelection {
            start: anchor,
            end: anchor,
        };
        assert_eq!(
            selection_offsets(&tree, Some(&selection)),
            Selection { start: 2, end: 2 }
        );
    }
}
