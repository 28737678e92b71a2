//! [CSS Cascade 4 § 6 Cascading](https://www.w3.org/TR/css-cascade-4/#cascading)
//!
//! "The cascade takes an unordered list of declared values for a given
//! property on a given element, sorts them by their declaration's
//! precedence, and outputs a single cascaded value."
//!
//! For CSS-plus the cascaded value is not stored on the node. It is either
//! handed to the declaration plugin registered for the property, or, for
//! properties no plugin owns, written to the residual stylesheet under a
//! generated class that the node receives.

use std::rc::Rc;

use cssplus_css::Declaration;
use cssplus_dom::NodeId;
use futures::FutureExt;

use crate::error::EngineError;
use crate::evaluator::Evaluator;
use crate::plugin::DeclarationPlugin;
use crate::pseudo_chain::RuleWithPseudos;
use crate::session::Session;
use crate::specificity::{Precedence, sort_by_precedence};
use crate::task::{self, NodeTask, Step};

/// A declared value competing for a property.
#[derive(Debug, Clone)]
struct Candidate {
    rule: usize,
    index: usize,
    declaration: Declaration,
    precedence: Precedence,
    selector: String,
}

/// Apply the declarations of the rules whose chain ends at `level` to the
/// node `node_task` resolves to. `lookup` is the node values are evaluated
/// against, `matched` the node the rules' selectors matched.
///
/// Properties are applied concurrently; only identity-mutating plugins wait
/// for every other property of the node.
#[must_use]
pub fn evaluate_rules(
    session: &Session,
    level: usize,
    rules: &[RuleWithPseudos],
    lookup: NodeId,
    matched: NodeId,
    node_task: NodeTask,
) -> Step {
    let session = session.clone();
    let rules: Vec<RuleWithPseudos> = rules
        .iter()
        .filter(|rule| rule.depth() == level)
        .cloned()
        .collect();
    async move {
        let mut buckets = bucket(&session, &rules)?;
        if buckets.is_empty() {
            return Ok(());
        }
        log::debug!("cascade at level {level} on {lookup:?}: {} properties", buckets.len());

        let mut tasks = Vec::new();
        let mut deferred = Vec::new();
        let mut identity = Vec::new();
        for plugin in session.registry.declarations.iter() {
            let Some(position) = buckets.iter().position(|(name, _)| name == plugin.name()) else {
                continue;
            };
            let (_, candidates) = buckets.remove(position);
            let Some(winner) = pick_winner(&session, candidates, lookup) else {
                continue;
            };
            if plugin.mutates_identity() {
                identity.push((Rc::clone(plugin), winner));
                continue;
            }
            match apply(&session, plugin.as_ref(), &winner, lookup, matched, node_task.clone()) {
                Ok(task) => tasks.push(task),
                Err(err) if err.is_unsupported_function() => {
                    log::debug!("deferring {}: {err}", winner.declaration.to_css());
                    deferred.push(winner);
                }
                Err(err) => return Err(err),
            }
        }

        let unowned = buckets.into_iter().filter_map(|(_, candidates)| {
            let mut candidates = candidates;
            sort_by_precedence(&mut candidates, |c| c.precedence);
            candidates.pop()
        });
        for candidate in unowned.chain(deferred) {
            tasks.push(add_residual(&session, &candidate, node_task.clone()));
        }

        for (plugin, winner) in identity {
            let others = tasks.clone();
            let target = node_task.clone();
            let gate = task::from_future(async move {
                task::join_tasks(others).await?;
                target.await
            });
            match apply(&session, plugin.as_ref(), &winner, lookup, matched, gate) {
                Ok(task) => tasks.push(task),
                Err(err) if err.is_unsupported_function() => {
                    tasks.push(add_residual(&session, &winner, node_task.clone()));
                }
                Err(err) => return Err(err),
            }
        }

        task::join_tasks(tasks).await
    }
    .boxed_local()
}

/// Group the declarations of `rules` by property, keeping stylesheet order
/// within each group.
fn bucket(
    session: &Session,
    rules: &[RuleWithPseudos],
) -> Result<Vec<(String, Vec<Candidate>)>, EngineError> {
    let mut buckets: Vec<(String, Vec<Candidate>)> = Vec::new();
    for entry in rules {
        let rule = session.rule(entry.matched.rule)?;
        let selector = rule
            .selectors
            .get(entry.matched.selector)
            .map(ToString::to_string)
            .unwrap_or_default();
        for (index, declaration) in rule.declarations.iter().enumerate() {
            let candidate = Candidate {
                rule: entry.matched.rule,
                index,
                declaration: declaration.clone(),
                precedence: Precedence {
                    important: declaration.important,
                    specificity: entry.specificity,
                },
                selector: selector.clone(),
            };
            let name = declaration.name.to_ascii_lowercase();
            match buckets.iter_mut().find(|(n, _)| *n == name) {
                Some((_, candidates)) => candidates.push(candidate),
                None => buckets.push((name, vec![candidate])),
            }
        }
    }
    Ok(buckets)
}

/// Sort a bucket, warn about every declaration that lost, return the winner.
fn pick_winner(
    session: &Session,
    mut candidates: Vec<Candidate>,
    lookup: NodeId,
) -> Option<Candidate> {
    sort_by_precedence(&mut candidates, |c| c.precedence);
    let winner = candidates.pop()?;
    let html = session.host.location(lookup);
    for loser in &candidates {
        if loser.declaration == winner.declaration {
            continue;
        }
        session.diagnostics.warn_at(
            format!(
                "'{}' is overridden by '{}'",
                loser.declaration.to_css(),
                winner.declaration.to_css()
            ),
            Some(loser.declaration.location),
            html,
        );
    }
    Some(winner)
}

fn apply(
    session: &Session,
    plugin: &dyn DeclarationPlugin,
    candidate: &Candidate,
    lookup: NodeId,
    matched: NodeId,
    node_task: NodeTask,
) -> Result<NodeTask, EngineError> {
    let location = candidate.declaration.location;
    let values = Evaluator::new(session, lookup, matched, location)
        .evaluate_declaration(&candidate.declaration.value)?;
    log::debug!("{} on {lookup:?}", candidate.declaration.to_css());
    let task = plugin
        .evaluate_rule(session, lookup, node_task, values, &candidate.declaration)
        .map_err(|err| err.or_at(location))?;
    session
        .coverage
        .borrow_mut()
        .hit_declaration(candidate.rule, candidate.index);
    Ok(task)
}

fn add_residual(session: &Session, candidate: &Candidate, node_task: NodeTask) -> NodeTask {
    let class = session
        .residual
        .borrow_mut()
        .add(&candidate.selector, &candidate.declaration);
    session
        .coverage
        .borrow_mut()
        .hit_declaration(candidate.rule, candidate.index);
    let host = session.host.clone();
    task::then(node_task, move |node| {
        host.add_class(node, &class);
        Ok(node)
    })
}
