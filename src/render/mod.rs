//! Renderer for the line-oriented markup dialect used by chapter bodies.
//!
//! Each input line becomes exactly one [`Node`]. Lines are classified by
//! prefix, first match wins:
//!
//! | prefix                 | node            |
//! |------------------------|-----------------|
//! | `# `                   | `Heading1`      |
//! | `## `                  | `Heading2`      |
//! | `* `                   | `ListItem`      |
//! | `> `                   | `Quote`         |
//! | digits followed by `.` | `NumberedItem`  |
//! | whitespace only        | `Blank`         |
//! | anything else          | `Paragraph`     |
//!
//! Node text is then split on `**bold**` runs; see [`parse_inline`].

pub mod terminal;

use serde::Serialize;

const BOLD: &str = "**";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    pub emphasized: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), emphasized: false }
    }

    pub fn emphasized(text: impl Into<String>) -> Self {
        Self { text: text.into(), emphasized: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Heading1 {
        spans: Vec<Span>,
    },
    Heading2 {
        spans: Vec<Span>,
    },
    ListItem {
        spans: Vec<Span>,
    },
    /// Displayed wrapped in literal quotation marks.
    Quote {
        spans: Vec<Span>,
    },
    NumberedItem {
        numeral: String,
        spans: Vec<Span>,
    },
    Paragraph {
        spans: Vec<Span>,
    },
    Blank,
}

impl Node {
    pub fn spans(&self) -> &[Span] {
        match self {
            Node::Heading1 { spans }
            | Node::Heading2 { spans }
            | Node::ListItem { spans }
            | Node::Quote { spans }
            | Node::NumberedItem { spans, .. }
            | Node::Paragraph { spans } => spans,
            Node::Blank => &[],
        }
    }

    /// Node text with emphasis markers removed.
    pub fn text(&self) -> String {
        self.spans()
            .iter()
            .map(|s| s.text.as_str())
            .collect()
    }
}

pub fn render(text: &str) -> Vec<Node> {
    text.split('\n').map(render_line).collect()
}

pub fn render_line(line: &str) -> Node {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if let Some(rest) = line.strip_prefix("# ") {
        return Node::Heading1 { spans: parse_inline(rest.trim_start()) };
    }
    if let Some(rest) = line.strip_prefix("## ") {
        return Node::Heading2 { spans: parse_inline(rest.trim_start()) };
    }
    if let Some(rest) = line.strip_prefix("* ") {
        return Node::ListItem { spans: parse_inline(rest.trim_start()) };
    }
    if let Some(rest) = line.strip_prefix("> ") {
        return Node::Quote { spans: parse_inline(rest.trim_start()) };
    }
    if let Some((numeral, rest)) = split_numbered(line.trim()) {
        return Node::NumberedItem {
            numeral: numeral.to_string(),
            spans: parse_inline(rest.trim_start()),
        };
    }
    if line.trim().is_empty() {
        return Node::Blank;
    }
    Node::Paragraph { spans: parse_inline(line) }
}

/// Splits `"12. rest"` into `("12", " rest")`.
fn split_numbered(trimmed: &str) -> Option<(&str, &str)> {
    let digits = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if digits == 0 {
        return None;
    }
    trimmed[digits..].strip_prefix('.').map(|rest| (&trimmed[..digits], rest))
}

/// Splits text on `**...**` runs, shortest match first. Unpaired markers stay
/// literal and no nesting is recognised.
pub fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(BOLD) {
        let after_open = &rest[open + BOLD.len()..];
        let Some(close) = after_open.find(BOLD) else {
            break;
        };
        if open > 0 {
            spans.push(Span::plain(&rest[..open]));
        }
        if close > 0 {
            spans.push(Span::emphasized(&after_open[..close]));
        }
        rest = &after_open[close + BOLD.len()..];
    }

    if !rest.is_empty() {
        spans.push(Span::plain(rest));
    }
    spans
}
