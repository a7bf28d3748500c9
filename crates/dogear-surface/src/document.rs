//! In-memory model of the rendered document content.
//!
//! The painter and normalizer operate on this node tree rather than on any
//! particular rendering engine, which is the seam that keeps text-based
//! anchoring swappable for offset-based addressing later. Text nodes are
//! addressed by their position in depth-first walk order; selection offsets
//! are character offsets within a text node.

use std::collections::BTreeMap;

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
}

/// An element with a tag, attributes, and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Concatenated text of this element and its descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Merge adjacent text children, dropping empties - the DOM
    /// `normalize()` step after unwrapping a span.
    pub fn merge_adjacent_text(&mut self) {
        let children = std::mem::take(&mut self.children);
        for child in children {
            match child {
                Node::Text(text) if text.is_empty() => {}
                Node::Text(text) => {
                    if let Some(Node::Text(last)) = self.children.last_mut() {
                        last.push_str(&text);
                    } else {
                        self.children.push(Node::Text(text));
                    }
                }
                element => self.children.push(element),
            }
        }
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(el, out),
        }
    }
}

/// One end of a raw selection: a text node (walk order) and a character offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPoint {
    pub node: usize,
    pub offset: usize,
}

/// A raw, possibly mid-word selection range as reported by pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSelection {
    pub start: SelectionPoint,
    pub end: SelectionPoint,
}

/// The rendered document surface: a node tree plus the active selection.
#[derive(Debug, Default)]
pub struct Document {
    root: Element,
    selection: Option<RawSelection>,
}

impl Document {
    #[must_use]
    pub fn new(root: Element) -> Self {
        Self {
            root,
            selection: None,
        }
    }

    /// Convenience constructor: one `<p>` per entry under a `<body>` root.
    #[must_use]
    pub fn from_paragraphs(paragraphs: &[&str]) -> Self {
        let mut body = Element::new("body");
        for paragraph in paragraphs {
            let mut p = Element::new("p");
            p.push_text(*paragraph);
            body.push_child(p);
        }
        Self::new(body)
    }

    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Text node contents in depth-first walk order.
    #[must_use]
    pub fn text_nodes(&self) -> Vec<String> {
        let mut nodes = Vec::new();
        walk_text(&self.root, &mut nodes);
        nodes
    }

    /// Full visible text of the document.
    #[must_use]
    pub fn full_text(&self) -> String {
        self.root.text_content()
    }

    #[must_use]
    pub fn selection(&self) -> Option<RawSelection> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: RawSelection) {
        self.selection = Some(selection);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// The string a selection currently covers, or `None` when either end no
    /// longer resolves to a text node.
    #[must_use]
    pub fn selection_text(&self, selection: RawSelection) -> Option<String> {
        let nodes = self.text_nodes();
        let start_text = nodes.get(selection.start.node)?;
        let end_text = nodes.get(selection.end.node)?;

        if selection.start.node == selection.end.node {
            return Some(char_slice(start_text, selection.start.offset, selection.end.offset));
        }

        let mut out = char_slice(start_text, selection.start.offset, start_text.chars().count());
        for node in nodes
            .iter()
            .take(selection.end.node)
            .skip(selection.start.node + 1)
        {
            out.push_str(node);
        }
        out.push_str(&char_slice(end_text, 0, selection.end.offset));
        Some(out)
    }

    /// Extend a selection outward to whole-word boundaries.
    ///
    /// The start moves backward and the end forward while the adjacent
    /// character is a word character, producing the range the painter will
    /// later search for verbatim.
    #[must_use]
    pub fn extend_to_word_boundaries(&self, selection: RawSelection) -> Option<RawSelection> {
        let nodes = self.text_nodes();
        let start_chars: Vec<char> = nodes.get(selection.start.node)?.chars().collect();
        let end_chars: Vec<char> = nodes.get(selection.end.node)?.chars().collect();

        let mut start = selection.start.offset.min(start_chars.len());
        while start > 0 && is_word_char(start_chars[start - 1]) {
            start -= 1;
        }

        let mut end = selection.end.offset.min(end_chars.len());
        while end < end_chars.len() && is_word_char(end_chars[end]) {
            end += 1;
        }

        Some(RawSelection {
            start: SelectionPoint {
                node: selection.start.node,
                offset: start,
            },
            end: SelectionPoint {
                node: selection.end.node,
                offset: end,
            },
        })
    }
}

/// Word characters for boundary extension: alphanumerics and underscore.
#[must_use]
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn walk_text(element: &Element, out: &mut Vec<String>) {
    for child in &element.children {
        match child {
            Node::Text(text) => out.push(text.clone()),
            Node::Element(el) => walk_text(el, out),
        }
    }
}

fn char_slice(text: &str, from: usize, to: usize) -> String {
    text.chars().take(to).skip(from).collect()
}
