//! Tests for tokenization and tree construction.

use cssplus_common::SourceLocation;
use cssplus_dom::{DomTree, NodeId, serialize_document};
use cssplus_html::{HTMLTokenizer, Token, parse_document};

fn parse(html: &str) -> DomTree {
    let (tree, _) = parse_document(html);
    tree
}

#[test]
fn test_round_trip_simple_document() {
    let html = "<!DOCTYPE html><html><body><p class=\"a b\">Hi <b>there</b></p><!-- c --></body></html>";
    assert_eq!(serialize_document(&parse(html)), html);
}

#[test]
fn test_void_and_self_closing_elements() {
    let tree = parse("<div><br><img src=x /><span/>tail</div>");
    assert_eq!(
        serialize_document(&tree),
        "<div><br><img src=\"x\"><span></span>tail</div>"
    );
}

#[test]
fn test_implied_end_tags() {
    let tree = parse("<ul><li>one<li>two</ul><p>a<p>b");
    assert_eq!(
        serialize_document(&tree),
        "<ul><li>one</li><li>two</li></ul><p>a</p><p>b</p>"
    );
}

#[test]
fn test_raw_text_keeps_markup() {
    let tree = parse("<style>p > a { color: red }</style><script>if (a < b) {}</script>");
    let style = tree.first_element_child(NodeId::ROOT);
    assert_eq!(
        style.map(|s| tree.text_content(s)),
        Some("p > a { color: red }".to_string())
    );
    assert_eq!(
        serialize_document(&tree),
        "<style>p > a { color: red }</style><script>if (a < b) {}</script>"
    );
}

#[test]
fn test_character_references_decoded() {
    let tree = parse("<p title=\"a&amp;b\">x &lt; y &#65;</p>");
    let p = tree.first_element_child(NodeId::ROOT);
    assert_eq!(p.and_then(|p| tree.attribute(p, "title")), Some("a&b"));
    assert_eq!(p.map(|p| tree.text_content(p)), Some("x < y A".to_string()));
}

#[test]
fn test_attribute_forms_and_duplicates() {
    let (tree, issues) = parse_document("<input disabled value=plain id='q' id=\"dup\">");
    let input = tree.first_element_child(NodeId::ROOT);
    let attrs: Vec<(String, String)> = input
        .and_then(|i| tree.as_element(i))
        .map(|e| {
            e.attrs
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(
        attrs,
        vec![
            ("disabled".to_string(), String::new()),
            ("value".to_string(), "plain".to_string()),
            ("id".to_string(), "q".to_string()),
        ]
    );
    assert!(issues.iter().any(|i| i.message == "duplicate-attribute"));
}

#[test]
fn test_node_locations() {
    let tree = parse("<div>\n  <p>x</p>\n</div>");
    let div = tree.first_element_child(NodeId::ROOT);
    let p = div.and_then(|d| tree.first_element_child(d));
    assert_eq!(
        div.and_then(|d| tree.get(d)).and_then(|n| n.location),
        Some(SourceLocation::new(1, 1))
    );
    assert_eq!(
        p.and_then(|p| tree.get(p)).and_then(|n| n.location),
        Some(SourceLocation::new(2, 3))
    );
}

#[test]
fn test_stray_end_tag_reported() {
    let (tree, issues) = parse_document("<div>a</span></div>");
    assert_eq!(serialize_document(&tree), "<div>a</div>");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].message, "stray end tag </span>");
}

#[test]
fn test_tokenizer_merges_text_and_lowercases_tags() {
    let (tokens, issues) = HTMLTokenizer::new("<DIV Class=x>ab&amp;c</DIV>").run();
    assert!(issues.is_empty());
    let kinds: Vec<Token> = tokens.into_iter().map(|t| t.token).collect();
    assert_eq!(kinds.len(), 4);
    assert!(matches!(&kinds[0], Token::StartTag { name, .. } if name == "div"));
    assert_eq!(
        kinds[1],
        Token::Text {
            data: "ab&c".to_string()
        }
    );
    assert_eq!(
        kinds[2],
        Token::EndTag {
            name: "div".to_string()
        }
    );
    assert_eq!(kinds[3], Token::EndOfFile);
}

#[test]
fn test_lone_less_than_is_text() {
    let tree = parse("<p>1 < 2</p>");
    let p = tree.first_element_child(NodeId::ROOT);
    assert_eq!(p.map(|p| tree.text_content(p)), Some("1 < 2".to_string()));
}
