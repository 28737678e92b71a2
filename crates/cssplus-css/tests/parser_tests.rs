//! Integration tests for stylesheet parsing and serialization.

use cssplus_common::SourceLocation;
use cssplus_css::{ComponentValue, CSSToken, Rule, SelectorComponent, Stylesheet};

fn parse(css: &str) -> Stylesheet {
    let (sheet, issues) = Stylesheet::parse(css);
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    sheet
}

#[test]
fn test_style_rule_with_declarations() {
    let sheet = parse("div.note, p { content: 'X'; COLOR: red !important }");
    let rules: Vec<_> = sheet.style_rules().collect();
    assert_eq!(rules.len(), 1);
    let rule = rules[0];
    assert_eq!(rule.selectors.len(), 2);
    assert_eq!(rule.selectors[1].to_css(), "p");
    assert_eq!(rule.declarations.len(), 2);

    let content = &rule.declarations[0];
    assert_eq!(content.name, "content");
    assert_eq!(
        content.value,
        vec![ComponentValue::Token(CSSToken::String("X".to_string()))]
    );
    assert!(!content.important);

    let color = &rule.declarations[1];
    assert_eq!(color.name, "color");
    assert!(color.important);
    assert_eq!(color.to_css(), "color: red !important");
}

#[test]
fn test_declaration_and_selector_locations() {
    let sheet = parse("a,\n  b::after(1) {\n  content: 'x';\n}");
    let rule = sheet.style_rules().next();
    assert_eq!(
        rule.map(|r| r.selectors[1].location),
        Some(SourceLocation::new(2, 3))
    );
    assert_eq!(
        rule.map(|r| r.declarations[0].location),
        Some(SourceLocation::new(3, 3))
    );
}

#[test]
fn test_function_values_keep_structure() {
    let sheet = parse("p { content: parent-context(attr(href)), 'b'; }");
    let Some(decl) = sheet.style_rules().next().map(|r| &r.declarations[0]) else {
        panic!("rule was not parsed");
    };
    match &decl.value[0] {
        ComponentValue::Function { name, value } => {
            assert_eq!(name, "parent-context");
            assert!(matches!(&value[0], ComponentValue::Function { name, .. } if name == "attr"));
        }
        other => panic!("expected a function, got {other:?}"),
    }
    assert_eq!(decl.value_text(), "parent-context(attr(href)), \"b\"");
}

#[test]
fn test_at_rules_are_kept_verbatim() {
    let sheet = parse("@import url(base.css);\n@media print { p { color: black } }\np { x: y }");
    assert_eq!(sheet.rules.len(), 3);
    let at: Vec<String> = sheet.at_rules().map(cssplus_css::AtRule::to_css).collect();
    assert_eq!(at[0], "@import url(base.css);");
    assert_eq!(at[1], "@media print { p { color: black } }");
    assert!(matches!(sheet.rules[2], Rule::Style(_)));
}

#[test]
fn test_invalid_selector_drops_only_that_rule() {
    let (sheet, issues) = Stylesheet::parse("p > { a: b }\nem { c: d }");
    assert_eq!(sheet.rules.len(), 1);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].location, SourceLocation::new(1, 1));
    assert_eq!(
        sheet.style_rules().next().map(|r| r.selectors[0].components.clone()),
        Some(vec![SelectorComponent::Type("em".to_string())])
    );
}

#[test]
fn test_invalid_declaration_is_skipped() {
    let (sheet, issues) = Stylesheet::parse("p { color red; content: 'ok' }");
    assert_eq!(issues.len(), 1);
    let names: Vec<String> = sheet
        .style_rules()
        .flat_map(|r| r.declarations.iter().map(|d| d.name.clone()))
        .collect();
    assert_eq!(names, vec!["content".to_string()]);
}

#[test]
fn test_stylesheet_serialization() {
    let sheet = parse("@charset \"utf-8\";\nh1 , h2>em{margin:0 auto;}");
    assert_eq!(
        sheet.to_css(),
        "@charset \"utf-8\";\nh1, h2 > em {\n  margin: 0 auto;\n}\n"
    );
}
