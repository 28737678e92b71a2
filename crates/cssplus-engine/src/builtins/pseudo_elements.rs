//! Built-in pseudo-elements.

use cssplus_css::{
    CSSToken, Combinator, ComponentValue, SelectorComponent, SelectorList,
    serialize_component_values,
};
use cssplus_dom::NodeId;

use crate::error::EngineError;
use crate::evaluator::Evaluator;
use crate::host::Host;
use crate::plugin::{CreatedNode, Plugin, PseudoElementPlugin, reduce_by_index};
use crate::pseudo_chain::{PseudoInvocation, RuleWithPseudos};
use crate::session::{Session, parse_selector_list};
use crate::task::{self, NodeTask};

/// Where a synthesized node goes relative to its context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Last child of the context node.
    Append,
    /// First child of the context node.
    Prepend,
    /// Around the context node.
    Wrap,
    /// Around the context node's children.
    WrapInner,
}

/// Allocate a node once `context` resolves and attach it there.
fn synthesize(session: &Session, context: &NodeTask, placement: Placement) -> NodeTask {
    let host: Host = session.host.clone();
    let tag = session.config.synthesized_tag.clone();
    task::then(context.clone(), move |context| {
        let node = host.create_element(&tag);
        match placement {
            Placement::Append => host.append(context, node),
            Placement::Prepend => host.prepend(context, node),
            Placement::Wrap => host.wrap_around(context, node),
            Placement::WrapInner => host.wrap_inner(context, node),
        }
        log::trace!("synthesized {node:?} ({placement:?} {context:?})");
        Ok(node)
    })
}

/// `::after(n)`, `::before(n)`, `::outside(n)`, `::inside(n)` and
/// `::marker(n)`: one node per index, read against the same lookup node.
#[derive(Debug, Clone, Copy)]
pub struct Synthesize {
    name: &'static str,
    placement: Placement,
}

impl Synthesize {
    /// `::after`: appended to the context node.
    #[must_use]
    pub const fn after() -> Self {
        Self {
            name: "after",
            placement: Placement::Append,
        }
    }

    /// `::before`: prepended to the context node.
    #[must_use]
    pub const fn before() -> Self {
        Self {
            name: "before",
            placement: Placement::Prepend,
        }
    }

    /// `::outside`: wraps the context node.
    #[must_use]
    pub const fn outside() -> Self {
        Self {
            name: "outside",
            placement: Placement::Wrap,
        }
    }

    /// `::inside`: wraps the context node's children.
    #[must_use]
    pub const fn inside() -> Self {
        Self {
            name: "inside",
            placement: Placement::WrapInner,
        }
    }

    /// `::marker`: prepended like `::before`, typically after an iteration.
    #[must_use]
    pub const fn marker() -> Self {
        Self {
            name: "marker",
            placement: Placement::Prepend,
        }
    }
}

impl Plugin for Synthesize {
    fn name(&self) -> &str {
        self.name
    }
}

impl PseudoElementPlugin for Synthesize {
    fn reduce(&self, rules: Vec<RuleWithPseudos>, depth: usize) -> Vec<Vec<RuleWithPseudos>> {
        let mut groups = reduce_by_index(rules, depth);
        // Prepending in reverse leaves the nodes in index order.
        if self.placement == Placement::Prepend {
            groups.reverse();
        }
        groups
    }

    fn create(
        &self,
        session: &Session,
        _group: &[RuleWithPseudos],
        lookup: NodeId,
        context: &NodeTask,
        _depth: usize,
    ) -> Result<Vec<CreatedNode>, EngineError> {
        Ok(vec![CreatedNode {
            node_task: synthesize(session, context, self.placement),
            lookup_node: lookup,
        }])
    }
}

/// `::for-each(n, axis, 'selector')`: one appended node per element on
/// `axis` (`descendant` or `child`) of the lookup node matching
/// `selector`. Each match becomes the lookup node of its iteration.
#[derive(Debug, Clone, Copy)]
pub struct ForEach;

impl Plugin for ForEach {
    fn name(&self) -> &str {
        "for-each"
    }
}

impl PseudoElementPlugin for ForEach {
    fn accepts_list_argument(&self) -> bool {
        true
    }

    /// Rules sharing an index but iterating different axes or selectors
    /// produce separate iterations, ordered by first appearance.
    fn reduce(&self, rules: Vec<RuleWithPseudos>, depth: usize) -> Vec<Vec<RuleWithPseudos>> {
        let mut groups = Vec::new();
        for same_index in reduce_by_index(rules, depth) {
            let mut iterations: Vec<(String, Vec<RuleWithPseudos>)> = Vec::new();
            for rule in same_index {
                let key = rule
                    .pseudo_at(depth)
                    .map(iteration_key)
                    .unwrap_or_default();
                match iterations.iter_mut().find(|(existing, _)| *existing == key) {
                    Some((_, members)) => members.push(rule),
                    None => iterations.push((key, vec![rule])),
                }
            }
            groups.extend(iterations.into_iter().map(|(_, members)| members));
        }
        groups
    }

    fn create(
        &self,
        session: &Session,
        group: &[RuleWithPseudos],
        lookup: NodeId,
        context: &NodeTask,
        depth: usize,
    ) -> Result<Vec<CreatedNode>, EngineError> {
        let Some(first) = group.first() else {
            return Ok(Vec::new());
        };
        let invocation = first.pseudo_at(depth)?;
        let evaluator = Evaluator::new(session, lookup, lookup, invocation.location);
        let groups = iteration_arguments(invocation);
        let [axis, selector] = groups.as_slice() else {
            return Err(evaluator.user_error(
                "::for-each expects an index, an axis and a selector",
            ));
        };
        let axis = evaluator.evaluate_text(axis)?;
        let selector = evaluator.evaluate_text(selector)?;

        let list = parse_selector_list(&selector).map_err(|e| e.or_at(invocation.location))?;
        let Some(list) = on_axis(list, &axis) else {
            return Err(evaluator.user_error(format!(
                "::for-each axis must be 'descendant' or 'child', not '{axis}'"
            )));
        };

        let matches = session.host.find(lookup, &list);
        if matches.is_empty() {
            evaluator.warn(format!("::for-each({axis}, '{selector}') matched nothing"));
        }
        Ok(matches
            .into_iter()
            .map(|found| CreatedNode {
                node_task: synthesize(session, context, Placement::Append),
                lookup_node: found,
            })
            .collect())
    }
}

fn is_number(value: &ComponentValue) -> bool {
    matches!(value, ComponentValue::Token(CSSToken::Number { .. }))
}

/// The axis and selector groups, without the index.
fn iteration_arguments(invocation: &PseudoInvocation) -> Vec<Vec<ComponentValue>> {
    let mut groups = invocation.argument_groups();
    if invocation.first_arg.as_ref().is_some_and(is_number) {
        let _ = groups.remove(0);
    }
    groups
}

fn iteration_key(invocation: &PseudoInvocation) -> String {
    iteration_arguments(invocation)
        .iter()
        .map(|group| serialize_component_values(group.as_slice()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Restrict a selector list to an axis of the scope it is run in.
fn on_axis(mut list: SelectorList, axis: &str) -> Option<SelectorList> {
    match axis {
        "descendant" => Some(list),
        "child" => {
            for selector in &mut list.selectors {
                selector
                    .components
                    .insert(0, SelectorComponent::Combinator(Combinator::Child));
            }
            Some(list)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use cssplus_html::parse_document;
    use futures::executor::block_on;

    use super::*;
    use crate::config::EngineConfig;
    use crate::plugin::PluginRegistry;

    fn session(html: &str) -> Session {
        Session::new(
            Host::new(parse_document(html).0),
            Vec::new(),
            PluginRegistry::with_builtins().unwrap_or_default(),
            EngineConfig::default(),
        )
    }

    #[test]
    fn test_placements() {
        let session = session("<p>x</p>");
        let p = session.host.query_all(&parse_selector_list("p").unwrap_or_default())[0];
        let context = task::resolved(p);
        for placement in [
            Placement::Append,
            Placement::Prepend,
            Placement::WrapInner,
            Placement::Wrap,
        ] {
            assert!(block_on(synthesize(&session, &context, placement)).is_ok());
        }
        assert_eq!(
            session.host.serialize(),
            "<div><p><div><div></div>x<div></div></div></p></div>"
        );
    }

    #[test]
    fn test_unawaited_task_creates_nothing() {
        let session = session("<p>x</p>");
        let p = session.host.query_all(&parse_selector_list("p").unwrap_or_default())[0];
        let _pending = synthesize(&session, &task::resolved(p), Placement::Append);
        assert_eq!(session.host.serialize(), "<p>x</p>");
    }

    #[test]
    fn test_axes() {
        let session = session("<section><p>1</p><div><p>2</p></div></section>");
        let list = |text: &str| parse_selector_list(text).unwrap_or_default();
        let section = session.host.query_all(&list("section"))[0];
        let count = |axis: &str| on_axis(list("p"), axis).map(|l| session.host.find(section, &l).len());
        assert_eq!(count("child"), Some(1));
        assert_eq!(count("descendant"), Some(2));
        assert_eq!(count("sibling"), None);
    }
}
