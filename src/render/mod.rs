//! Range Renderer
//!
//! Turns the plain text plus its styling ranges into a visual tree: styled
//! spans, text leaves, and explicit line breaks. The tree is the handoff
//! format to the host surface (and to the cursor mapper, which addresses
//! positions inside it), so it is an index-based arena rather than a
//! pointer graph.
//!
//! The renderer is a single left-to-right scan over the sorted ranges with a
//! stack of open containers. A range nests inside the previous one only when
//! the next range starts before the current one ends and the current range
//! is not a syntax marker; syntax spans always close immediately so markers
//! never swallow their neighbors. Offsets are UTF-16 code units throughout.

pub mod styles;

pub use styles::{MarkdownStyle, TextStyle};

use crate::markdown::{Range, StyleKind};
use crate::string_utils::{slice_utf16, utf16_len};

// ─────────────────────────────────────────────────────────────────────────────
// Visual Tree
// ─────────────────────────────────────────────────────────────────────────────

/// Index of a node in a [`VisualTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// What a visual node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The synthetic tree root.
    Root,
    /// A styled container for one range. `style` is `None` when rendering
    /// with flattened styles (the host styles spans by kind instead).
    Span {
        kind: StyleKind,
        style: Option<TextStyle>,
    },
    /// A run of text without newlines.
    Text(String),
    /// One `'\n'` of the source text.
    LineBreak,
}

/// One node of the visual tree.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualNode {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
}

/// Arena-allocated tree of styled spans over the text.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualTree {
    nodes: Vec<VisualNode>,
}

impl Default for VisualTree {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualTree {
    pub fn new() -> Self {
        VisualTree {
            nodes: vec![VisualNode {
                kind: NodeKind::Root,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &VisualNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    fn add(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(VisualNode {
            kind,
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append a text slice under `parent`, splitting newlines into
    /// [`NodeKind::LineBreak`] nodes. Empty slices add nothing.
    fn add_text(&mut self, parent: NodeId, text: &str) {
        let mut first = true;
        for segment in text.split('\n') {
            if !first {
                self.add(parent, NodeKind::LineBreak);
            }
            if !segment.is_empty() {
                self.add(parent, NodeKind::Text(segment.to_string()));
            }
            first = false;
        }
    }

    /// The text the tree displays: text leaves in order, one `'\n'` per line
    /// break. Inverse of rendering — equals the source text.
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            match &self.node(id).kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::LineBreak => out.push('\n'),
                NodeKind::Root | NodeKind::Span { .. } => {
                    stack.extend(self.children(id).iter().rev().copied());
                }
            }
        }
        out
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Range Ungrouping
// ─────────────────────────────────────────────────────────────────────────────

/// Expand depth-annotated ranges back into repeated ranges, one per level.
fn ungroup_ranges(ranges: &[Range]) -> Vec<Range> {
    let mut out = Vec::with_capacity(ranges.len());
    for range in ranges {
        for _ in 0..range.depth.max(1) {
            let mut copy = range.clone();
            copy.depth = 1;
            out.push(copy);
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer
// ─────────────────────────────────────────────────────────────────────────────

/// Render `text` with its sorted styling `ranges` into a [`VisualTree`].
///
/// Ranges must be the output of range extraction: sorted by start, with
/// container ranges preceding their contents. When the scan ends with
/// containers still open (a range claimed more text than exists), they are
/// closed outward with their remaining text flushed in place.
pub fn render_ranges(text: &str, ranges: &[Range], style: &MarkdownStyle) -> VisualTree {
    render_ranges_opts(text, ranges, style, false)
}

/// As [`render_ranges`]; with `flatten_styles` the spans carry no resolved
/// style and the host maps [`StyleKind`] to its own presentation.
pub fn render_ranges_opts(
    text: &str,
    ranges: &[Range],
    style: &MarkdownStyle,
    flatten_styles: bool,
) -> VisualTree {
    let mut tree = VisualTree::new();
    let total = utf16_len(text);
    let root = tree.root();

    if ranges.is_empty() {
        tree.add_text(root, text);
        return tree;
    }

    let ranges = ungroup_ranges(ranges);
    // (container, exclusive end) for every open span
    let mut open: Vec<(NodeId, usize)> = vec![(root, total)];
    let mut cursor = 0;

    for (i, range) in ranges.iter().enumerate() {
        let (current, _) = *open.last().unwrap_or(&(root, total));
        let range_end = range.end();
        let next_start = ranges.get(i + 1).map_or(total, |r| r.start);

        tree.add_text(current, slice_utf16(text, cursor, range.start));

        let span = tree.add(
            current,
            NodeKind::Span {
                kind: range.kind,
                style: (!flatten_styles).then(|| style.style_for(range.kind)),
            },
        );

        let has_more = i + 1 < ranges.len();
        if has_more && next_start < range_end && range.kind != StyleKind::Syntax {
            open.push((span, range_end));
            cursor = range.start;
        } else {
            tree.add_text(span, slice_utf16(text, range.start, range_end));
            cursor = range_end;

            while open.len() > 1 {
                let &(node, end) = open.last().unwrap_or(&(root, total));
                if next_start < end {
                    break;
                }
                tree.add_text(node, slice_utf16(text, cursor, end));
                cursor = cursor.max(end.min(total));
                open.pop();
            }
        }
    }

    // Containers still open past the last range close outward
    while let Some((node, end)) = open.pop() {
        if node == root {
            break;
        }
        tree.add_text(node, slice_utf16(text, cursor, end));
        cursor = cursor.max(end.min(total));
    }
    tree.add_text(root, slice_utf16(text, cursor, total));

    tree
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
