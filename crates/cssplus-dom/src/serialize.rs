//! HTML serialization of the document tree.
//!
//! [§ 13.3 Serializing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments)
//!
//! Only the parts the engine's output needs: void elements have no end tag,
//! raw-text elements are written verbatim, and text and attribute values are
//! escaped.

use crate::{DomTree, NodeId, NodeType};

/// "If current node is an area, base, basefont, bgsound, br, col, embed,
/// frame, hr, img, input, keygen, link, meta, param, source, track or wbr
/// element, then continue on to the next child node at this point."
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children are serialized without escaping.
pub const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Whether `tag` is a void element.
#[must_use]
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Serialize the whole document.
#[must_use]
pub fn serialize_document(tree: &DomTree) -> String {
    serialize_children(tree, NodeId::ROOT)
}

/// Serialize the children of `id` (the "inner HTML").
#[must_use]
pub fn serialize_children(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    let raw = tree.tag_name(id).is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t));
    for &child in tree.children(id) {
        write_node(tree, child, raw, &mut out);
    }
    out
}

/// Serialize `id` itself (the "outer HTML").
#[must_use]
pub fn serialize_node(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, false, &mut out);
    out
}

fn write_node(tree: &DomTree, id: NodeId, raw_parent: bool, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    match &node.node_type {
        NodeType::Document => {
            for &child in &node.children {
                write_node(tree, child, false, out);
            }
        }
        NodeType::Doctype(name) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeType::Comment(data) => {
            out.push_str("<!--");
            out.push_str(data);
            out.push_str("-->");
        }
        NodeType::Text(data) => {
            if raw_parent {
                out.push_str(data);
            } else {
                escape_into(data, false, out);
            }
        }
        NodeType::Element(element) => {
            out.push('<');
            out.push_str(&element.tag_name);
            for (name, value) in element.attrs.iter() {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');
            if is_void(&element.tag_name) {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&element.tag_name.as_str());
            for &child in &node.children {
                write_node(tree, child, raw, out);
            }
            out.push_str("</");
            out.push_str(&element.tag_name);
            out.push('>');
        }
    }
}

/// [§ 13.3 Escaping a string](https://html.spec.whatwg.org/multipage/parsing.html#escapingString)
fn escape_into(text: &str, attribute_mode: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{A0}' => out.push_str("&nbsp;"),
            '"' if attribute_mode => out.push_str("&quot;"),
            '<' if !attribute_mode => out.push_str("&lt;"),
            '>' if !attribute_mode => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_and_escaping() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        tree.set_attribute(p, "title", "a \"b\" & c");
        tree.append_child(NodeId::ROOT, p);
        let text = tree.create_text("1 < 2");
        tree.append_child(p, text);
        let br = tree.create_element("br");
        tree.append_child(p, br);
        assert_eq!(
            serialize_document(&tree),
            "<p title=\"a &quot;b&quot; &amp; c\">1 &lt; 2<br></p>"
        );
    }

    #[test]
    fn test_raw_text_not_escaped() {
        let mut tree = DomTree::new();
        let style = tree.create_element("style");
        tree.append_child(NodeId::ROOT, style);
        tree.set_text_content(style, "a > b { }");
        assert_eq!(serialize_document(&tree), "<style>a > b { }</style>");
    }
}
