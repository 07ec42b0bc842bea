//! HTML to text normalization for forum post content.
//!
//! Discourse serves post bodies as rendered HTML (`cooked`). Prompts want
//! plain text, so this module flattens the markup: block boundaries become
//! newlines, `<pre>` blocks are kept verbatim behind a `CODE:` marker, and
//! links keep their target as `text (href)`.

use scraper::{ElementRef, Html, Node};

/// Tags that end a line of prose when they open or close.
const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "li",
    "ul",
    "ol",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "table",
    "thead",
    "tbody",
    "tr",
    "section",
    "article",
    "header",
    "footer",
    "aside",
    "figure",
    "figcaption",
    "details",
    "summary",
];

/// Flattens rendered forum HTML into plain text.
///
/// Malformed markup is recovered by the HTML5 parser rather than rejected,
/// and plain text without markup passes through unchanged. Empty or
/// whitespace-only input yields an empty string.
pub fn normalize(markup: &str) -> String {
    if markup.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(markup);
    let mut out = String::new();
    walk(fragment.root_element(), &mut out);
    out.trim().to_string()
}

fn walk(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_collapsed(out, text),
            Node::Element(_) => {
                let Some(el) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = el.value().name();
                match name {
                    "script" | "style" => {}
                    "br" | "hr" => ensure_newline(out),
                    "pre" => push_code_block(el, out),
                    "a" => push_link(el, out),
                    _ if BLOCK_TAGS.contains(&name) => {
                        ensure_newline(out);
                        walk(el, out);
                        ensure_newline(out);
                    }
                    _ => walk(el, out),
                }
            }
            _ => {}
        }
    }
}

/// Code blocks keep their inner whitespace; everything else in the document
/// is collapsed, so the marker is what tells the two apart downstream.
fn push_code_block(el: ElementRef<'_>, out: &mut String) {
    let code: String = el.text().collect();
    let code = code.trim_matches('\n');
    if code.is_empty() {
        return;
    }
    ensure_newline(out);
    out.push_str("CODE: ");
    out.push_str(code);
    ensure_newline(out);
}

fn push_link(el: ElementRef<'_>, out: &mut String) {
    let text = el.text().collect::<String>();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let href = el.value().attr("href").unwrap_or("").trim();

    if text.is_empty() {
        if !href.is_empty() {
            push_collapsed(out, href);
        }
    } else if href.is_empty() || text == href {
        push_collapsed(out, &text);
    } else {
        push_collapsed(out, &format!("{} ({})", text, href));
    }
}

/// Appends text with whitespace runs collapsed to a single space. Never
/// emits a space at the start of the buffer or right after a newline.
fn push_collapsed(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
}

/// Terminates the current line, dropping trailing spaces first. Idempotent,
/// so adjacent block boundaries produce a single newline.
fn ensure_newline(out: &mut String) {
    while out.ends_with(' ') || out.ends_with('\t') {
        out.pop();
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Truncates comment text for prompt previews, cutting at a word boundary
/// where one exists and appending an ellipsis.
pub fn truncate_preview(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }

    let cut: String = content.chars().take(max_chars).collect();
    match cut.rfind(' ') {
        Some(pos) if pos > 0 => format!("{}...", cut[..pos].trim_end()),
        _ => format!("{}...", cut),
    }
}

// ============================================================================
// Tests
// ============================================================================
