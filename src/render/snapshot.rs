//! Owned DOM snapshots
//!
//! A snapshot is a plain element tree (tag, attributes, children) detached from
//! any live document, so it can be moved across tasks and cleaned with pure
//! functions.

use scraper::{ElementRef, Html, Node, Selector};

/// A node in a DOM snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element in a DOM snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementNode {
    /// Lowercase tag name
    pub tag: String,

    /// Attributes in document order
    pub attributes: Vec<(String, String)>,

    /// Child elements and text nodes in document order
    pub children: Vec<DomNode>,
}

impl ElementNode {
    /// Creates an element with no attributes and no children
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds an attribute
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Adds a child element
    pub fn child(mut self, child: ElementNode) -> Self {
        self.children.push(DomNode::Element(child));
        self
    }

    /// Adds a text node
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(DomNode::Text(text.into()));
        self
    }

    /// Returns the value of the named attribute
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the child elements, skipping text
    pub fn child_elements(&self) -> impl Iterator<Item = &ElementNode> {
        self.children.iter().filter_map(|c| match c {
            DomNode::Element(e) => Some(e),
            DomNode::Text(_) => None,
        })
    }

    /// Counts this element and all descendant elements
    pub fn element_count(&self) -> usize {
        1 + self
            .child_elements()
            .map(ElementNode::element_count)
            .sum::<usize>()
    }
}

/// Parses an HTML document and snapshots its `<body>`
///
/// The HTML5 parser always synthesizes a body, so this never fails; a document
/// without content yields an empty `body` element.
pub fn body_snapshot(html: &str) -> ElementNode {
    let document = Html::parse_document(html);

    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());

    match body {
        Some(body) => convert(body),
        None => ElementNode::new("body"),
    }
}

fn convert(element: ElementRef<'_>) -> ElementNode {
    let value = element.value();

    let children = element
        .children()
        .filter_map(|child| match child.value() {
            Node::Element(_) => ElementRef::wrap(child).map(|e| DomNode::Element(convert(e))),
            Node::Text(text) => Some(DomNode::Text((**text).to_string())),
            _ => None,
        })
        .collect();

    ElementNode {
        tag: value.name().to_ascii_lowercase(),
        attributes: value
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children,
    }
}
