use super::{ Node, Span };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Ansi,
}

impl Style {
    /// Bold emphasis when stdout supports colours, plain text otherwise.
    pub fn detect() -> Self {
        if console::colors_enabled() { Style::Ansi } else { Style::Plain }
    }
}

fn spans_to_string(spans: &[Span], style: Style) -> String {
    let mut out = String::new();
    for span in spans {
        match (span.emphasized, style) {
            (true, Style::Ansi) => {
                out.push_str(&console::style(&span.text).bold().force_styling(true).to_string());
            }
            _ => out.push_str(&span.text),
        }
    }
    out
}

fn underline(text: &str, ch: char) -> String {
    ch.to_string().repeat(text.chars().count().max(1))
}

pub fn format_node(node: &Node, style: Style) -> String {
    match node {
        Node::Heading1 { spans } => {
            let text = spans_to_string(spans, style);
            let rule = underline(&node.text(), '=');
            format!("{}\n{}", text, rule)
        }
        Node::Heading2 { spans } => {
            let text = spans_to_string(spans, style);
            let rule = underline(&node.text(), '-');
            format!("{}\n{}", text, rule)
        }
        Node::ListItem { spans } => format!("  • {}", spans_to_string(spans, style)),
        Node::Quote { spans } => format!("    \"{}\"", spans_to_string(spans, style)),
        Node::NumberedItem { numeral, spans } =>
            format!("  {}. {}", numeral, spans_to_string(spans, style)),
        Node::Paragraph { spans } => spans_to_string(spans, style).trim().to_string(),
        Node::Blank => String::new(),
    }
}

pub fn format_nodes(nodes: &[Node], style: Style) -> String {
    nodes
        .iter()
        .map(|node| format_node(node, style))
        .collect::<Vec<_>>()
        .join("\n")
}
