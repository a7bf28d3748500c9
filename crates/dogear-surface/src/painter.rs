//! Highlight painter: materializes highlights as styled, clickable spans.
//!
//! Anchoring is purely by verbatim text search. That is deliberately simple
//! and rendering-engine agnostic; when the text cannot be found (reflow,
//! pagination, or a selection spanning multiple nodes) every operation is a
//! silent no-op - painting is cosmetic state, never source of truth.

use std::fmt::Write;

use dogear_core::models::HighlightColor;
use dogear_core::protocol::HighlightRef;

use crate::document::{Document, Element, Node};

/// Attribute carrying the verbatim highlighted text on painted spans.
pub const DATA_TEXT_ATTR: &str = "data-highlight-text";
/// Attribute carrying the palette color name on painted spans.
pub const DATA_COLOR_ATTR: &str = "data-highlight-color";

/// Where a locate request resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateOutcome {
    /// A painted span carries the text; scroll to it and flash.
    Span,
    /// No span, but the document still contains the text; fall back to the
    /// surface-native text search.
    TextSearch,
    /// The text is gone from the rendered content; do nothing.
    NotFound,
}

/// Paint the first text node containing `text` verbatim.
///
/// The node splits into before/highlight/after fragments and the middle one
/// is wrapped in a tagged span. Returns whether anything was painted.
pub fn add_highlight(document: &mut Document, text: &str, color: HighlightColor) -> bool {
    if text.is_empty() {
        return false;
    }
    paint_first(document.root_mut(), text, color)
}

/// Unpaint every span carrying exactly `text`, merging the surrounding text
/// nodes back together. Returns the number of spans removed.
pub fn remove_highlight(document: &mut Document, text: &str) -> usize {
    unwrap_spans(document.root_mut(), text)
}

/// Batched restoration after a document (re)load.
pub fn load_highlights(document: &mut Document, highlights: &[HighlightRef]) {
    for entry in highlights {
        if !add_highlight(document, &entry.text, entry.color) {
            tracing::debug!("Could not restore highlight; text not found in document");
        }
    }
}

/// Resolve a locate request against the painted spans, falling back to a
/// whole-document text search.
#[must_use]
pub fn locate_highlight(document: &Document, text: &str) -> LocateOutcome {
    if find_span(document.root(), text).is_some() {
        LocateOutcome::Span
    } else if document.full_text().contains(text) {
        LocateOutcome::TextSearch
    } else {
        LocateOutcome::NotFound
    }
}

/// The color of the painted span carrying `text`, if one exists.
#[must_use]
pub fn span_color(document: &Document, text: &str) -> Option<HighlightColor> {
    find_span(document.root(), text)
        .and_then(|span| span.attr(DATA_COLOR_ATTR))
        .map(HighlightColor::parse)
}

/// Stylesheet for the palette, injected once alongside the surface script.
#[must_use]
pub fn highlight_stylesheet() -> String {
    let mut css = String::new();
    for color in HighlightColor::ALL {
        let _ = writeln!(
            css,
            ".highlight-{} {{ background-color: {} !important; border: 1px solid {}; }}",
            color.name(),
            color.fill(),
            color.border()
        );
    }
    css.push_str(".highlight { padding: 2px; border-radius: 3px; cursor: pointer; }\n");
    css
}

fn span_element(text: &str, color: HighlightColor) -> Element {
    let mut span = Element::new("span");
    span.set_attr("class", format!("highlight highlight-{}", color.name()));
    span.set_attr(DATA_TEXT_ATTR, text);
    span.set_attr(DATA_COLOR_ATTR, color.name());
    span.push_text(text);
    span
}

fn paint_first(element: &mut Element, text: &str, color: HighlightColor) -> bool {
    let mut index = 0;
    while index < element.children.len() {
        let mut replacement: Option<Vec<Node>> = None;
        match &mut element.children[index] {
            Node::Text(content) => {
                if let Some(at) = content.find(text) {
                    let before = content[..at].to_string();
                    let after = content[at + text.len()..].to_string();
                    let mut nodes = Vec::with_capacity(3);
                    if !before.is_empty() {
                        nodes.push(Node::Text(before));
                    }
                    nodes.push(Node::Element(span_element(text, color)));
                    if !after.is_empty() {
                        nodes.push(Node::Text(after));
                    }
                    replacement = Some(nodes);
                }
            }
            Node::Element(child) => {
                if paint_first(child, text, color) {
                    return true;
                }
            }
        }
        if let Some(nodes) = replacement {
            element.children.splice(index..=index, nodes);
            return true;
        }
        index += 1;
    }
    false
}

fn unwrap_spans(element: &mut Element, text: &str) -> usize {
    let mut removed = 0;
    for child in &mut element.children {
        let replacement = match child {
            Node::Element(el) if el.attr(DATA_TEXT_ATTR) == Some(text) => {
                Some(Node::Text(el.text_content()))
            }
            Node::Element(el) => {
                removed += unwrap_spans(el, text);
                None
            }
            Node::Text(_) => None,
        };
        if let Some(text_node) = replacement {
            *child = text_node;
            removed += 1;
        }
    }
    if removed > 0 {
        element.merge_adjacent_text();
    }
    removed
}

fn find_span<'a>(element: &'a Element, text: &str) -> Option<&'a Element> {
    for child in &element.children {
        if let Node::Element(el) = child {
            if el.attr(DATA_TEXT_ATTR) == Some(text) {
                return Some(el);
            }
            if let Some(found) = find_span(el, text) {
                return Some(found);
            }
        }
    }
    None
}
