//! Per-run state shared by the traversal and every plugin.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use cssplus_common::{Diagnostics, SourceLocation};
use cssplus_css::{Selector, SelectorComponent, SelectorList, StyleRule, query_all};
use cssplus_dom::{DomTree, NodeId};

use crate::config::EngineConfig;
use crate::coverage::Coverage;
use crate::error::EngineError;
use crate::host::Host;
use crate::plugin::PluginRegistry;
use crate::residual::ResidualStylesheet;

/// Shared handles for one run. Cloning is cheap; every clone sees the same
/// document, diagnostics, residual stylesheet and coverage.
#[derive(Clone)]
pub struct Session {
    /// The document.
    pub host: Host,
    /// Style rules, indexed by [`MatchedRule::rule`](crate::MatchedRule).
    pub rules: Rc<[StyleRule]>,
    /// Registered plugins.
    pub registry: Rc<PluginRegistry>,
    /// Collected diagnostics.
    pub diagnostics: Rc<Diagnostics>,
    /// Declarations handed back to vanilla CSS.
    pub residual: Rc<RefCell<ResidualStylesheet>>,
    /// Selector and declaration use counts.
    pub coverage: Rc<RefCell<Coverage>>,
    /// Run settings.
    pub config: Rc<EngineConfig>,
    snapshot: Rc<DomTree>,
    positions: Rc<HashMap<NodeId, usize>>,
    query_cache: Rc<RefCell<HashMap<String, Rc<[NodeId]>>>>,
}

impl Session {
    /// Start a run over `host`. The document is snapshotted now; cached
    /// queries always see this pre-mutation state.
    #[must_use]
    pub fn new(
        host: Host,
        rules: Vec<StyleRule>,
        registry: PluginRegistry,
        config: EngineConfig,
    ) -> Self {
        let snapshot = Rc::new(host.snapshot());
        let positions = snapshot
            .descendants(snapshot.root())
            .enumerate()
            .map(|(position, node)| (node, position))
            .collect();
        let residual = ResidualStylesheet::new(config.hash_mode, config.class_prefix.clone());
        let coverage = Coverage::new(&rules);
        Self {
            host,
            rules: rules.into(),
            registry: Rc::new(registry),
            diagnostics: Rc::new(Diagnostics::new()),
            residual: Rc::new(RefCell::new(residual)),
            coverage: Rc::new(RefCell::new(coverage)),
            config: Rc::new(config),
            snapshot,
            positions: Rc::new(positions),
            query_cache: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// The style rule at `index`.
    ///
    /// # Errors
    ///
    /// Returns a bug error for an index no annotation produced.
    pub fn rule(&self, index: usize) -> Result<&StyleRule, EngineError> {
        self.rules
            .get(index)
            .ok_or_else(|| EngineError::bug(format!("no style rule at index {index}")))
    }

    /// Matches of `selector` in the pre-mutation document, in document
    /// order. Memoized per selector text.
    ///
    /// # Errors
    ///
    /// Returns a user error if the selector does not parse.
    pub fn cached_query(&self, selector: &str) -> Result<Rc<[NodeId]>, EngineError> {
        if let Some(hit) = self.query_cache.borrow().get(selector) {
            return Ok(Rc::clone(hit));
        }
        let list = parse_selector_list(selector)?;
        let matches: Rc<[NodeId]> = query_all(&self.snapshot, &list).into();
        let _ = self
            .query_cache
            .borrow_mut()
            .insert(selector.to_string(), Rc::clone(&matches));
        Ok(matches)
    }

    /// Position of `node` in the pre-mutation document order. `None` for
    /// nodes created since.
    #[must_use]
    pub fn document_position(&self, node: NodeId) -> Option<usize> {
        self.positions.get(&node).copied()
    }

    /// Whether every guard pseudo-class holds on `node`. Registered
    /// pseudo-classes go to their plugin, the rest to the native matcher.
    ///
    /// # Errors
    ///
    /// Propagates pseudo-class plugin errors.
    pub fn guards_pass(
        &self,
        node: NodeId,
        guards: &[SelectorComponent],
    ) -> Result<bool, EngineError> {
        for guard in guards {
            let passed = match guard
                .pseudo_name()
                .and_then(|name| self.registry.pseudo_classes.get(name))
            {
                Some(plugin) => {
                    plugin.matches(self, node, guard.pseudo_args().unwrap_or_default())?
                }
                None => {
                    let selector = Selector::new(
                        vec![SelectorComponent::Universal, guard.clone()],
                        SourceLocation::default(),
                    );
                    self.host.matches(
                        node,
                        &SelectorList {
                            selectors: vec![selector],
                        },
                    )
                }
            };
            if !passed {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Parse selector text given as a value, as a user error on failure.
///
/// # Errors
///
/// Returns the syntax error as a user error.
pub fn parse_selector_list(text: &str) -> Result<SelectorList, EngineError> {
    SelectorList::parse_str(text).map_err(|issue| EngineError::user(issue.message, None))
}

#[cfg(test)]
mod tests {
    use cssplus_html::parse_document;

    use super::*;

    fn session(html: &str) -> Session {
        Session::new(
            Host::new(parse_document(html).0),
            Vec::new(),
            PluginRegistry::with_builtins().unwrap_or_default(),
            EngineConfig::default(),
        )
    }

    #[test]
    fn test_cached_query_sees_snapshot() {
        let session = session("<h1>a</h1><h1>b</h1>");
        let before = session.cached_query("h1").map(|m| m.len());
        let extra = session.host.create_element("h1");
        let root = session.host.with_tree(DomTree::root);
        session.host.append(root, extra);
        assert_eq!(before.ok(), Some(2));
        assert_eq!(session.cached_query("h1").map(|m| m.len()).ok(), Some(2));
        assert_eq!(session.host.query_all(&parse_selector_list("h1").unwrap_or_default()).len(), 3);
    }

    #[test]
    fn test_guards_native_and_custom() {
        let session = session("<a href=\"#t\">x</a><p><em>y</em></p><h1 id=t>z</h1>");
        let a = session.host.query_all(&parse_selector_list("a").unwrap_or_default())[0];
        let p = session.host.query_all(&parse_selector_list("p").unwrap_or_default())[0];
        let guards = |text: &str| {
            Selector::parse_str(&format!("*{text}"))
                .map(|s| s.components[1..].to_vec())
                .unwrap_or_default()
        };
        assert_eq!(session.guards_pass(p, &guards(":has(em)")).ok(), Some(true));
        assert_eq!(session.guards_pass(a, &guards(":has(em)")).ok(), Some(false));
        assert_eq!(session.guards_pass(a, &guards(":target(href, 'h1')")).ok(), Some(true));
        assert_eq!(session.guards_pass(a, &guards(":target(href, 'p')")).ok(), Some(false));
        assert_eq!(session.guards_pass(a, &[]).ok(), Some(true));
    }
}
