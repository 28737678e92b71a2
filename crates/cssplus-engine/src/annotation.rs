//! Selector annotation: the matching phase.
//!
//! Every selector is split into its host part and pseudo-element chain, the
//! host part is matched natively, and each match is filtered by the custom
//! pseudo-classes on the subject. Matches are recorded in a side table
//! keyed by node; the tree itself is never annotated. All matching happens
//! here, before the first mutation.

use std::collections::HashMap;
use std::rc::Rc;

use cssplus_css::{SelectorComponent, SelectorList, StyleRule};
use cssplus_dom::NodeId;

use crate::error::EngineError;
use crate::plugin::PluginRegistry;
use crate::pseudo_chain::{MatchedRule, PseudoChain, RuleWithPseudos};
use crate::session::Session;
use crate::specificity::Specificity;

/// The result of the matching phase.
#[derive(Debug, Default)]
pub struct Annotation {
    /// Matched rules per node, in stylesheet order.
    pub table: HashMap<NodeId, Vec<RuleWithPseudos>>,
    /// Matched nodes in pre-mutation document order.
    pub order: Vec<NodeId>,
}

impl Annotation {
    /// Take the rules matched on `node`, clearing its entry.
    pub fn take(&mut self, node: NodeId) -> Vec<RuleWithPseudos> {
        self.table.remove(&node).unwrap_or_default()
    }
}

/// Rewrite `:name` to `::name` wherever `name` is a registered
/// pseudo-element, for stylesheets written against parsers that only
/// accept single-colon custom pseudo-elements.
pub fn rewrite_legacy_pseudo_elements(rules: &mut [StyleRule], registry: &PluginRegistry) {
    for selector in rules.iter_mut().flat_map(|rule| rule.selectors.iter_mut()) {
        for component in &mut selector.components {
            let SelectorComponent::PseudoClass { name, args } = component else {
                continue;
            };
            if registry.pseudo_elements.contains(name) {
                *component = SelectorComponent::PseudoElement {
                    name: core::mem::take(name),
                    args: args.take(),
                };
            }
        }
    }
}

/// Match every selector of every rule and record the results.
///
/// # Errors
///
/// Returns a user error for a selector whose chain is malformed, and
/// propagates custom pseudo-class errors.
pub fn annotate(session: &Session) -> Result<Annotation, EngineError> {
    let mut annotation = Annotation::default();
    for (r, rule) in session.rules.iter().enumerate() {
        for (s, selector) in rule.selectors.iter().enumerate() {
            let chain = Rc::new(PseudoChain::parse(selector, &session.registry)?);
            let specificity = Specificity::of(selector);
            let host_selector = SelectorList {
                selectors: vec![chain.host_selector().clone()],
            };
            let mut hits = 0;
            for node in session.host.query_all(&host_selector) {
                if !session.guards_pass(node, chain.guards_at(0))? {
                    continue;
                }
                annotation.table.entry(node).or_default().push(RuleWithPseudos {
                    matched: MatchedRule { rule: r, selector: s },
                    chain: Rc::clone(&chain),
                    specificity,
                });
                session.coverage.borrow_mut().hit_selector(r, s);
                hits += 1;
            }
            log::debug!("'{selector}' matched {hits} element(s)");
        }
    }
    annotation.order = session
        .host
        .elements_in_order()
        .into_iter()
        .filter(|node| annotation.table.contains_key(node))
        .collect();
    Ok(annotation)
}

#[cfg(test)]
mod tests {
    use cssplus_css::Stylesheet;
    use cssplus_html::parse_document;

    use super::*;
    use crate::config::EngineConfig;
    use crate::host::Host;

    fn session(css: &str, html: &str, legacy: bool) -> Session {
        let registry = PluginRegistry::with_builtins().unwrap_or_default();
        let mut rules: Vec<StyleRule> = Stylesheet::parse(css).0.style_rules().cloned().collect();
        if legacy {
            rewrite_legacy_pseudo_elements(&mut rules, &registry);
        }
        Session::new(
            Host::new(parse_document(html).0),
            rules,
            registry,
            EngineConfig::default(),
        )
    }

    #[test]
    fn test_side_table_in_document_order() {
        let session = session(
            "p { x: 1 } div::after { x: 2 } .late, div { x: 3 }",
            "<div><p class=late>a</p></div><p>b</p>",
            false,
        );
        let Ok(mut annotation) = annotate(&session) else {
            panic!("annotation failed");
        };
        assert_eq!(annotation.order.len(), 3);
        let div = annotation.order[0];
        let rules: Vec<MatchedRule> = annotation.take(div).iter().map(|r| r.matched).collect();
        assert_eq!(
            rules,
            [
                MatchedRule { rule: 1, selector: 0 },
                MatchedRule { rule: 2, selector: 1 },
            ]
        );
        assert!(annotation.take(div).is_empty());
        let late = annotation.take(annotation.order[1]);
        assert_eq!(late.len(), 2);
    }

    #[test]
    fn test_custom_pseudo_class_filters_matches() {
        let session = session(
            "a:target(href, 'h2') { x: 1 }",
            "<a href=\"#one\">1</a><a href=\"#two\">2</a><h1 id=one>x</h1><h2 id=two>y</h2>",
            false,
        );
        let Ok(annotation) = annotate(&session) else {
            panic!("annotation failed");
        };
        assert_eq!(annotation.order.len(), 1);
        assert_eq!(
            session.host.attribute(annotation.order[0], "href").as_deref(),
            Some("#two")
        );
    }

    #[test]
    fn test_legacy_rewrite() {
        let plain = session("div:after { x: 1 }", "<div></div>", false);
        assert!(annotate(&plain).is_ok_and(|a| a.order.is_empty()));

        let legacy = session("div:after { x: 1 }", "<div></div>", true);
        assert_eq!(legacy.rules[0].selectors[0].to_css(), "div::after");
        let Ok(annotation) = annotate(&legacy) else {
            panic!("annotation failed");
        };
        assert_eq!(annotation.order.len(), 1);
        assert_eq!(annotation.table[&annotation.order[0]][0].depth(), 1);
    }

    #[test]
    fn test_malformed_chain_is_user_error() {
        let session = session("div::after(1 2) { x: 1 }", "<div></div>", false);
        assert!(matches!(annotate(&session), Err(EngineError::User { .. })));
    }
}
