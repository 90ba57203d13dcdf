//! Structural page fingerprints
//!
//! A fingerprint is a SHA-256 digest over the element skeleton of a page body.
//! Before hashing, the snapshot is cleaned:
//! - all text nodes are removed
//! - `img`, `script`, `style`, `meta` and `link` elements are removed
//! - `style` attributes are removed
//!
//! Two pages that only differ in text, images or inline styles therefore share
//! a fingerprint, while any change in tags, nesting or other attributes yields
//! a different one. Attribute order is not significant.

use crate::render::{DomNode, ElementNode, RenderError, RenderedPage};
use html_escape::{encode_double_quoted_attribute, encode_text};
use sha2::{Digest, Sha256};

/// Elements whose presence or content is treated as volatile
const VOLATILE_TAGS: &[&str] = &["img", "script", "style", "meta", "link"];

/// Attributes that never contribute to the fingerprint
const VOLATILE_ATTRIBUTES: &[&str] = &["style"];

/// Returns a copy of the tree with text and volatile content removed
///
/// The root element itself is always kept. Remaining attributes are sorted by
/// name so that the cleaned tree is canonical.
pub fn strip_volatile(node: &ElementNode) -> ElementNode {
    let mut attributes: Vec<(String, String)> = node
        .attributes
        .iter()
        .filter(|(name, _)| {
            !VOLATILE_ATTRIBUTES
                .iter()
                .any(|v| name.eq_ignore_ascii_case(v))
        })
        .cloned()
        .collect();
    attributes.sort();

    let children = node
        .child_elements()
        .filter(|child| !VOLATILE_TAGS.contains(&child.tag.as_str()))
        .map(|child| DomNode::Element(strip_volatile(child)))
        .collect();

    ElementNode {
        tag: node.tag.clone(),
        attributes,
        children,
    }
}

/// Serializes a tree as markup
///
/// Attribute values are escaped so that distinct trees never serialize to the
/// same string.
pub fn canonical_markup(node: &ElementNode) -> String {
    let mut out = String::new();
    write_markup(node, &mut out);
    out
}

fn write_markup(node: &ElementNode, out: &mut String) {
    out.push('<');
    out.push_str(&node.tag);
    for (name, value) in &node.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push('>');

    for child in &node.children {
        match child {
            DomNode::Element(element) => write_markup(element, out),
            DomNode::Text(text) => out.push_str(&encode_text(text)),
        }
    }

    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
}

/// Computes the structural fingerprint of a body snapshot
///
/// # Returns
///
/// Hex-encoded SHA-256 of the canonical markup of the cleaned tree (64 characters).
///
/// # Example
///
/// ```
/// use sumi_audit::crawler::fingerprint;
/// use sumi_audit::render::ElementNode;
///
/// let a = ElementNode::new("body").child(ElementNode::new("h1").text("Salmon"));
/// let b = ElementNode::new("body").child(ElementNode::new("h1").text("Tacos"));
/// assert_eq!(fingerprint(&a), fingerprint(&b));
/// ```
pub fn fingerprint(snapshot: &ElementNode) -> String {
    let markup = canonical_markup(&strip_volatile(snapshot));

    let mut hasher = Sha256::new();
    hasher.update(markup.as_bytes());
    hex::encode(hasher.finalize())
}

/// Snapshots a rendered page and computes its fingerprint
pub async fn fingerprint_page(page: &dyn RenderedPage) -> Result<String, RenderError> {
    let snapshot = page.body_snapshot().await?;
    Ok(fingerprint(&snapshot))
}
