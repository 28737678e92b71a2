//! Pseudo-element expansion.
//!
//! Starting from a matched node, each level of the rules' chains is handed
//! to the pseudo-element plugin it names. The plugin synthesizes nodes
//! whose attachment is deferred behind the context node's task; each new
//! node then gets the declarations of the rules that end there, and the
//! rules that go further recurse one level deeper. Guards are checked again
//! on every new lookup node, so an iteration whose guard fails stops there
//! and its node is never attached.

use cssplus_dom::NodeId;
use futures::FutureExt;

use crate::cascade::evaluate_rules;
use crate::plugin::CreatedNode;
use crate::pseudo_chain::RuleWithPseudos;
use crate::session::Session;
use crate::task::{self, NodeTask, Step};

/// Expand the invocations at `depth` of `rules`. `lookup` is the node
/// guards and values are read from, `context` resolves to the node new
/// nodes attach to. Resolves once every branch below has.
#[must_use]
pub fn expand(
    session: &Session,
    depth: usize,
    rules: Vec<RuleWithPseudos>,
    lookup: NodeId,
    matched: NodeId,
    context: NodeTask,
) -> Step {
    let session = session.clone();
    async move {
        let mut remaining = Vec::new();
        for rule in rules {
            if rule.has_depth(depth) && session.guards_pass(lookup, rule.chain.guards_at(depth))? {
                remaining.push(rule);
            }
        }
        if remaining.is_empty() {
            return Ok(());
        }

        let mut branches = Vec::new();
        for plugin in session.registry.pseudo_elements.iter() {
            let mut invoking = Vec::new();
            let mut rest = Vec::new();
            for rule in remaining {
                if rule.pseudo_at(depth)?.name == plugin.name() {
                    invoking.push(rule);
                } else {
                    rest.push(rule);
                }
            }
            remaining = rest;
            if invoking.is_empty() {
                continue;
            }

            for group in plugin.reduce(invoking, depth) {
                let created = plugin.create(&session, &group, lookup, &context, depth)?;
                log::debug!(
                    "::{} at depth {depth} on {lookup:?}: {} node(s)",
                    plugin.name(),
                    created.len()
                );
                for node in created {
                    branches.push(branch(&session, depth + 1, group.clone(), node, matched));
                }
            }
        }

        task::join_steps(branches).await
    }
    .boxed_local()
}

/// One synthesized node: re-check guards, attach, then apply the rules
/// ending at `level` while expanding the rest.
fn branch(
    session: &Session,
    level: usize,
    group: Vec<RuleWithPseudos>,
    created: CreatedNode,
    matched: NodeId,
) -> Step {
    let session = session.clone();
    async move {
        let lookup = created.lookup_node;
        let mut passing = Vec::new();
        for rule in group {
            if session.guards_pass(lookup, rule.chain.guards_at(level))? {
                passing.push(rule);
            }
        }
        if passing.is_empty() {
            log::debug!("guards failed on {lookup:?}, skipping level {level}");
            return Ok(());
        }

        let _ = created.node_task.clone().await?;
        let (cascade, deeper) = futures::future::join(
            evaluate_rules(&session, level, &passing, lookup, matched, created.node_task.clone()),
            expand(&session, level, passing, lookup, matched, created.node_task),
        )
        .await;
        cascade.and(deeper)
    }
    .boxed_local()
}
