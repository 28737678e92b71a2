//! Selector matching against parsed documents.

use cssplus_css::{SelectorList, query_all, query_all_within};
use cssplus_dom::{DomTree, NodeId};
use cssplus_html::parse_document;

const DOC: &str = "<article id=\"main\" lang=\"en-US\">\
<h1 class=\"title big\">T</h1>\
<p>one</p>\
<p class=\"note\">two <a href=\"#x\">link</a></p>\
<ul><li>a</li><li>b</li><li>c</li><li>d</li></ul>\
<input disabled><input checked>\
<div></div>\
</article>";

fn doc() -> DomTree {
    parse_document(DOC).0
}

/// Run a query and return the tag names (with a 1-based index for `li`) of the matches.
fn select(tree: &DomTree, selector: &str) -> Vec<String> {
    let list = match SelectorList::parse_str(selector) {
        Ok(list) => list,
        Err(e) => panic!("{e}"),
    };
    query_all(tree, &list)
        .into_iter()
        .map(|id| describe(tree, id))
        .collect()
}

fn describe(tree: &DomTree, id: NodeId) -> String {
    let tag = tree.tag_name(id).unwrap_or_default().to_string();
    if tag == "li" {
        format!("li{}", tree.text_content(id))
    } else {
        tag
    }
}

#[test]
fn test_simple_selectors() {
    let tree = doc();
    assert_eq!(select(&tree, "#main"), vec!["article"]);
    assert_eq!(select(&tree, ".title.big"), vec!["h1"]);
    assert_eq!(select(&tree, "P"), vec!["p", "p"]);
    assert_eq!(select(&tree, "*").len(), 13);
}

#[test]
fn test_attribute_selectors() {
    let tree = doc();
    assert_eq!(select(&tree, "[lang|=en]"), vec!["article"]);
    assert_eq!(select(&tree, "[href^='#']"), vec!["a"]);
    assert_eq!(select(&tree, "[class~=big]"), vec!["h1"]);
    assert_eq!(select(&tree, "[lang='EN-us' i]"), vec!["article"]);
    assert!(select(&tree, "[lang='EN-us']").is_empty());
    assert!(select(&tree, "[class*='']").is_empty());
}

#[test]
fn test_combinators() {
    let tree = doc();
    assert_eq!(select(&tree, "article > p a"), vec!["a"]);
    assert_eq!(select(&tree, "h1 + p"), vec!["p"]);
    assert_eq!(select(&tree, "h1 ~ p"), vec!["p", "p"]);
    assert_eq!(select(&tree, "h1 ~ p.note > a"), vec!["a"]);
    assert!(select(&tree, "article > a").is_empty());
}

#[test]
fn test_structural_pseudo_classes() {
    let tree = doc();
    assert_eq!(select(&tree, "li:first-child"), vec!["lia"]);
    assert_eq!(select(&tree, "li:last-of-type"), vec!["lid"]);
    assert_eq!(select(&tree, "li:nth-child(2n)"), vec!["lib", "lid"]);
    assert_eq!(select(&tree, "li:nth-last-child(-n+2)"), vec!["lic", "lid"]);
    assert_eq!(select(&tree, "p:nth-of-type(2)"), vec!["p"]);
    assert_eq!(select(&tree, "div:empty"), vec!["div"]);
    assert_eq!(select(&tree, ":root"), vec!["article"]);
    assert_eq!(select(&tree, "a:link"), vec!["a"]);
    assert_eq!(select(&tree, "input:disabled, input:checked").len(), 2);
    assert_eq!(select(&tree, "input:enabled").len(), 1);
}

#[test]
fn test_logical_pseudo_classes() {
    let tree = doc();
    assert_eq!(select(&tree, "p:not(.note)"), vec!["p"]);
    assert_eq!(select(&tree, ":is(h1, a)"), vec!["h1", "a"]);
    assert_eq!(select(&tree, "p:has(a)"), vec!["p"]);
    assert_eq!(select(&tree, "p:has(+ ul)"), vec!["p"]);
    assert_eq!(select(&tree, "article:has(> ul li)"), vec!["article"]);
    assert!(select(&tree, "article:has(> li)").is_empty());
}

#[test]
fn test_unknown_pseudos_never_match() {
    let tree = doc();
    assert!(select(&tree, "p:hover").is_empty());
    assert!(select(&tree, "p::after(1)").is_empty());
    assert!(select(&tree, "li:for-each(1, child, 'x')").is_empty());
}

#[test]
fn test_query_within_scope() {
    let tree = doc();
    let uls = SelectorList::parse_str("ul").unwrap_or_default();
    let Some(&ul) = query_all(&tree, &uls).first() else {
        panic!("no ul");
    };
    let children = SelectorList::parse_str("> li:nth-child(odd)").unwrap_or_default();
    let found: Vec<String> = query_all_within(&tree, ul, &children)
        .into_iter()
        .map(|id| describe(&tree, id))
        .collect();
    assert_eq!(found, vec!["lia", "lic"]);
}

#[test]
fn test_selector_serialization_names_operators_and_combinators() {
    let list = match SelectorList::parse_str("a[href^='#'] > b ~ i, [lang|=en] + p") {
        Ok(list) => list,
        Err(e) => panic!("{e}"),
    };
    assert_eq!(list.to_css(), "a[href^=\"#\"] > b ~ i, [lang|=\"en\"] + p");
}
