//! Markdown Style Configuration
//!
//! Visual styling for each markdown construct, with serde support so hosts
//! can ship a JSON style sheet. Every section falls back to the built-in
//! default when absent, so a partial configuration is always valid.

use serde::{Deserialize, Serialize};

use crate::markdown::StyleKind;

// ─────────────────────────────────────────────────────────────────────────────
// Text Style
// ─────────────────────────────────────────────────────────────────────────────

/// Resolved visual attributes for one styled span.
///
/// Colors are CSS color strings, sizes are points. Fields used only by block
/// constructs (border, margin, padding) stay `None` for inline spans.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_left: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_left: Option<f32>,
}

impl TextStyle {
    fn color(color: &str) -> Self {
        TextStyle {
            color: Some(color.to_string()),
            ..TextStyle::default()
        }
    }

    /// Overlay `other` on `self`: set fields of `other` win.
    pub fn merged_with(&self, other: &TextStyle) -> TextStyle {
        TextStyle {
            color: other.color.clone().or_else(|| self.color.clone()),
            background_color: other
                .background_color
                .clone()
                .or_else(|| self.background_color.clone()),
            font_size: other.font_size.or(self.font_size),
            font_family: other
                .font_family
                .clone()
                .or_else(|| self.font_family.clone()),
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            strikethrough: self.strikethrough || other.strikethrough,
            underline: self.underline || other.underline,
            border_color: other
                .border_color
                .clone()
                .or_else(|| self.border_color.clone()),
            border_width: other.border_width.or(self.border_width),
            margin_left: other.margin_left.or(self.margin_left),
            padding_left: other.padding_left.or(self.padding_left),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Markdown Style Sheet
// ─────────────────────────────────────────────────────────────────────────────

const FONT_FAMILY_MONOSPACE: &str = "monospace";

/// Per-construct style sheet. Sections missing from a deserialized
/// configuration take the built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkdownStyle {
    pub syntax: TextStyle,
    pub link: TextStyle,
    pub h1: TextStyle,
    pub h2: TextStyle,
    pub h3: TextStyle,
    pub h4: TextStyle,
    pub h5: TextStyle,
    pub h6: TextStyle,
    pub blockquote: TextStyle,
    pub code: TextStyle,
    pub pre: TextStyle,
    pub mention_here: TextStyle,
    pub mention_user: TextStyle,
}

impl Default for MarkdownStyle {
    fn default() -> Self {
        let heading = |size: f32| TextStyle {
            font_size: Some(size),
            color: Some("black".to_string()),
            ..TextStyle::default()
        };
        let code_like = TextStyle {
            font_family: Some(FONT_FAMILY_MONOSPACE.to_string()),
            color: Some("black".to_string()),
            background_color: Some("lightgray".to_string()),
            ..TextStyle::default()
        };
        MarkdownStyle {
            syntax: TextStyle::color("gray"),
            link: TextStyle::color("blue"),
            h1: heading(25.0),
            h2: heading(22.0),
            h3: heading(20.0),
            h4: heading(18.0),
            h5: heading(16.0),
            h6: heading(14.0),
            blockquote: TextStyle {
                border_color: Some("gray".to_string()),
                border_width: Some(6.0),
                margin_left: Some(6.0),
                padding_left: Some(6.0),
                ..TextStyle::default()
            },
            code: code_like.clone(),
            pre: code_like,
            mention_here: TextStyle {
                color: Some("green".to_string()),
                background_color: Some("lime".to_string()),
                ..TextStyle::default()
            },
            mention_user: TextStyle {
                color: Some("blue".to_string()),
                background_color: Some("cyan".to_string()),
                ..TextStyle::default()
            },
        }
    }
}

impl MarkdownStyle {
    /// Overlay a partial style sheet on the built-in defaults, field by
    /// field: a section providing only `color` keeps the default sizes of
    /// that section.
    pub fn merge_with_default(partial: &MarkdownStyle) -> MarkdownStyle {
        let default = MarkdownStyle::default();
        MarkdownStyle {
            syntax: default.syntax.merged_with(&partial.syntax),
            link: default.link.merged_with(&partial.link),
            h1: default.h1.merged_with(&partial.h1),
            h2: default.h2.merged_with(&partial.h2),
            h3: default.h3.merged_with(&partial.h3),
            h4: default.h4.merged_with(&partial.h4),
            h5: default.h5.merged_with(&partial.h5),
            h6: default.h6.merged_with(&partial.h6),
            blockquote: default.blockquote.merged_with(&partial.blockquote),
            code: default.code.merged_with(&partial.code),
            pre: default.pre.merged_with(&partial.pre),
            mention_here: default.mention_here.merged_with(&partial.mention_here),
            mention_user: default.mention_user.merged_with(&partial.mention_user),
        }
    }

    /// Resolve the visual style for one range kind.
    ///
    /// Plain-formatting kinds (bold, italic, strikethrough) carry only their
    /// flag; configured sections additionally pick up construct-specific
    /// extras (links underline, headings render bold).
    pub fn style_for(&self, kind: StyleKind) -> TextStyle {
        match kind {
            StyleKind::Bold => TextStyle {
                bold: true,
                ..TextStyle::default()
            },
            StyleKind::Italic => TextStyle {
                italic: true,
                ..TextStyle::default()
            },
            StyleKind::Strikethrough => TextStyle {
                strikethrough: true,
                ..TextStyle::default()
            },
            StyleKind::Syntax => self.syntax.clone(),
            StyleKind::Link => TextStyle {
                underline: true,
                ..TextStyle::default()
            }
            .merged_with(&self.link),
            StyleKind::Code => self.code.clone(),
            StyleKind::Pre => self.pre.clone(),
            StyleKind::Blockquote => self.blockquote.clone(),
            StyleKind::H1 => self.heading_style(&self.h1),
            StyleKind::H2 => self.heading_style(&self.h2),
            StyleKind::H3 => self.heading_style(&self.h3),
            StyleKind::H4 => self.heading_style(&self.h4),
            StyleKind::H5 => self.heading_style(&self.h5),
            StyleKind::H6 => self.heading_style(&self.h6),
            StyleKind::MentionHere => self.mention_here.clone(),
            StyleKind::MentionUser => self.mention_user.clone(),
        }
    }

    fn heading_style(&self, section: &TextStyle) -> TextStyle {
        TextStyle {
            bold: true,
            ..TextStyle::default()
        }
        .merged_with(section)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
