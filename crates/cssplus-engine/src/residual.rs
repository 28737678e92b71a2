//! The residual stylesheet: declarations the engine does not apply itself,
//! handed back to vanilla CSS under generated class names.

use std::collections::HashMap;

use cssplus_css::{AtRule, Declaration, Rule, Selector, SelectorComponent, StyleRule, Stylesheet};
use sha2::{Digest, Sha256};

use crate::config::HashMode;

/// One generated class and the declaration it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualEntry {
    /// Generated class name.
    pub class: String,
    /// The original declaration, source location included.
    pub declaration: Declaration,
    /// Text of the selector that first produced the entry.
    pub selector: String,
}

/// Keyed residual declarations, in first-seen order.
#[derive(Debug, Clone)]
pub struct ResidualStylesheet {
    mode: HashMode,
    class_prefix: String,
    entries: Vec<ResidualEntry>,
    by_key: HashMap<String, usize>,
    counter: u64,
}

impl ResidualStylesheet {
    /// An empty residual stylesheet.
    #[must_use]
    pub fn new(mode: HashMode, class_prefix: String) -> Self {
        Self {
            mode,
            class_prefix,
            entries: Vec::new(),
            by_key: HashMap::new(),
            counter: 0,
        }
    }

    /// Record `declaration`, reached through `selector`, and return the
    /// class the node should get.
    pub fn add(&mut self, selector: &str, declaration: &Declaration) -> String {
        let text = declaration.to_css();
        let key = match self.mode {
            HashMode::Content => hex_digest(&text),
            HashMode::Provenance => {
                self.counter += 1;
                hex_digest(&format!("{selector}\n{text}\n{}", self.counter))
            }
        };
        if let Some(&index) = self.by_key.get(&key) {
            return self.entries[index].class.clone();
        }

        let class = format!("{}{}", self.class_prefix, &key[..8]);
        log::debug!("residual {class}: {text}");
        let _ = self.by_key.insert(key, self.entries.len());
        self.entries.push(ResidualEntry {
            class: class.clone(),
            declaration: declaration.clone(),
            selector: selector.to_string(),
        });
        class
    }

    /// Entries in first-seen order.
    #[must_use]
    pub fn entries(&self) -> &[ResidualEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was deferred.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The at-rules of the input followed by one `.class { decl }` rule per
    /// entry.
    #[must_use]
    pub fn to_stylesheet(&self, at_rules: &[AtRule]) -> Stylesheet {
        let mut rules: Vec<Rule> = at_rules.iter().cloned().map(Rule::At).collect();
        rules.extend(self.entries.iter().map(|entry| {
            let location = entry.declaration.location;
            Rule::Style(StyleRule {
                selectors: vec![Selector::new(
                    vec![SelectorComponent::Class(entry.class.clone())],
                    location,
                )],
                declarations: vec![entry.declaration.clone()],
                location,
            })
        }));
        Stylesheet { rules }
    }
}

fn hex_digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use cssplus_common::SourceLocation;

    use super::*;

    fn declaration(text: &str, line: u32) -> Declaration {
        let (sheet, _) = Stylesheet::parse(&format!("p {{ {text} }}"));
        let mut declaration = sheet
            .style_rules()
            .next()
            .and_then(|rule| rule.declarations.first().cloned())
            .unwrap_or_else(|| panic!("no declaration in {text}"));
        declaration.location = SourceLocation::new(line, 1);
        declaration
    }

    #[test]
    fn test_content_mode_dedups() {
        let mut residual = ResidualStylesheet::new(HashMode::Content, "decl-".to_string());
        let a = residual.add("p", &declaration("color: red", 1));
        let b = residual.add("div", &declaration("color: red", 2));
        let c = residual.add("p", &declaration("color: blue", 3));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(residual.len(), 2);
        assert!(a.starts_with("decl-"));
        assert_eq!(a.len(), "decl-".len() + 8);
    }

    #[test]
    fn test_provenance_mode_keeps_every_site() {
        let mut residual = ResidualStylesheet::new(HashMode::Provenance, "decl-".to_string());
        let a = residual.add("p", &declaration("color: red", 1));
        let b = residual.add("p", &declaration("color: red", 1));
        assert_ne!(a, b);
        assert_eq!(residual.len(), 2);
    }

    #[test]
    fn test_to_stylesheet_keeps_at_rules_first() {
        let (input, _) = Stylesheet::parse("@import \"base.css\";\np { color: red }");
        let at_rules: Vec<AtRule> = input.at_rules().cloned().collect();
        let mut residual = ResidualStylesheet::new(HashMode::Content, "decl-".to_string());
        let class = residual.add("p", &declaration("color: red", 2));
        let css = residual.to_stylesheet(&at_rules).to_css();
        assert!(css.starts_with("@import \"base.css\";"));
        assert!(css.contains(&format!(".{class} {{\n  color: red;\n}}")));
    }
}
