//! Pseudo-element chains.
//!
//! A CSS-plus selector is an ordinary selector followed by a chain of
//! custom pseudo-element invocations, each optionally guarded by
//! pseudo-classes:
//!
//! ```text
//! section:target(href, 'h1')::for-each(1, descendant, 'p'):has(.note)::marker
//! ```
//!
//! Here `section:target(href, 'h1')` is the host part, `::for-each(..)` is
//! invocation 0, `:has(.note)` guards invocation 1 and `::marker` is
//! invocation 1.
//!
//! The host part goes to the document's native matcher, minus the custom
//! pseudo-classes, which the engine evaluates itself. Guard level `k` holds
//! the pseudo-classes that must hold on the lookup node before invocation
//! `k` is expanded; level 0 is the custom pseudo-classes of the host part.

use std::rc::Rc;

use cssplus_common::SourceLocation;
use cssplus_css::{CSSToken, ComponentValue, Selector, SelectorComponent};

use crate::error::EngineError;
use crate::evaluator::trim_whitespace;
use crate::plugin::PluginRegistry;
use crate::specificity::Specificity;

/// One `::name(first, second)` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PseudoInvocation {
    /// Pseudo-element name.
    pub name: String,
    /// The single component before the first top-level comma.
    pub first_arg: Option<ComponentValue>,
    /// Everything after the first top-level comma, whitespace trimmed.
    pub second_arg: Vec<ComponentValue>,
    /// Location of the selector the invocation belongs to.
    pub location: SourceLocation,
}

impl PseudoInvocation {
    /// The grouping index: the integer first argument, or 1.
    #[must_use]
    pub fn index(&self) -> i64 {
        match &self.first_arg {
            Some(ComponentValue::Token(CSSToken::Number {
                int_value: Some(index),
                ..
            })) => *index,
            _ => 1,
        }
    }

    /// Every argument as comma-separated groups: the first argument, then
    /// each group of the second.
    #[must_use]
    pub fn argument_groups(&self) -> Vec<Vec<ComponentValue>> {
        let mut groups: Vec<Vec<ComponentValue>> =
            self.first_arg.iter().map(|v| vec![v.clone()]).collect();
        if !self.second_arg.is_empty() {
            groups.extend(
                self.second_arg
                    .split(ComponentValue::is_comma)
                    .map(|group| trim_whitespace(group).to_vec()),
            );
        }
        groups
    }
}

/// A parsed selector: the part for the native matcher plus the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct PseudoChain {
    host_selector: Selector,
    invocations: Vec<PseudoInvocation>,
    guards: Vec<Vec<SelectorComponent>>,
}

impl PseudoChain {
    /// Split `selector` against the registered plugin names.
    ///
    /// # Errors
    ///
    /// Returns a user error for malformed invocation arguments, a custom
    /// pseudo-class outside the subject compound, or anything other than
    /// pseudo-classes and custom pseudo-elements after the first invocation.
    pub fn parse(selector: &Selector, registry: &PluginRegistry) -> Result<Self, EngineError> {
        let location = selector.location;
        let mut host = Vec::new();
        let mut invocations = Vec::new();
        let mut guards = vec![Vec::new()];
        let mut compound_len = 0;
        let mut compound_has_custom = false;

        for component in &selector.components {
            match component {
                SelectorComponent::PseudoElement { name, args } => {
                    let Some(plugin) = registry.pseudo_elements.get(name) else {
                        if invocations.is_empty() {
                            host.push(component.clone());
                            compound_len += 1;
                            continue;
                        }
                        return Err(EngineError::user(
                            format!(
                                "unknown pseudo-element ::{name} after ::{}",
                                last_name(&invocations)
                            ),
                            Some(location),
                        ));
                    };
                    let (first_arg, second_arg) = split_arguments(
                        args.as_deref().unwrap_or_default(),
                        plugin.accepts_list_argument(),
                        location,
                    )?;
                    invocations.push(PseudoInvocation {
                        name: name.clone(),
                        first_arg,
                        second_arg,
                        location,
                    });
                    guards.push(Vec::new());
                }
                SelectorComponent::PseudoClass { name, .. } => {
                    if !invocations.is_empty() || registry.pseudo_classes.contains(name) {
                        guards
                            .last_mut()
                            .ok_or_else(|| EngineError::bug("guard levels out of sync"))?
                            .push(component.clone());
                        if invocations.is_empty() {
                            compound_has_custom = true;
                        }
                    } else {
                        host.push(component.clone());
                        compound_len += 1;
                    }
                }
                SelectorComponent::Combinator(_) if invocations.is_empty() => {
                    if compound_has_custom {
                        return Err(EngineError::user(
                            "custom pseudo-classes may only qualify the subject of a selector",
                            Some(location),
                        ));
                    }
                    if compound_len == 0 {
                        host.push(SelectorComponent::Universal);
                    }
                    host.push(component.clone());
                    compound_len = 0;
                }
                _ if invocations.is_empty() => {
                    host.push(component.clone());
                    compound_len += 1;
                }
                _ => {
                    return Err(EngineError::user(
                        format!(
                            "only pseudo-classes and pseudo-elements may follow ::{}",
                            last_name(&invocations)
                        ),
                        Some(location),
                    ));
                }
            }
        }
        if compound_len == 0 {
            host.push(SelectorComponent::Universal);
        }

        Ok(Self {
            host_selector: Selector::new(host, location),
            invocations,
            guards,
        })
    }

    /// The selector handed to the native matcher.
    #[must_use]
    pub const fn host_selector(&self) -> &Selector {
        &self.host_selector
    }

    /// Number of invocations.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.invocations.len()
    }

    /// Whether an invocation exists at `depth`.
    #[must_use]
    pub fn has_depth(&self, depth: usize) -> bool {
        depth < self.invocations.len()
    }

    /// The invocation at `depth`.
    ///
    /// # Errors
    ///
    /// Returns a bug error when `depth` is past the end of the chain.
    pub fn pseudo_at(&self, depth: usize) -> Result<&PseudoInvocation, EngineError> {
        self.invocations.get(depth).ok_or_else(|| {
            EngineError::bug(format!(
                "pseudo-element depth {depth} requested from a chain of {}",
                self.invocations.len()
            ))
        })
    }

    /// Pseudo-classes guarding invocation `level`, or the node synthesized by
    /// the last invocation when `level == depth()`.
    #[must_use]
    pub fn guards_at(&self, level: usize) -> &[SelectorComponent] {
        self.guards.get(level).map_or(&[], Vec::as_slice)
    }

    /// Iterate over the invocations.
    pub fn invocations(&self) -> impl Iterator<Item = &PseudoInvocation> {
        self.invocations.iter()
    }
}

fn last_name(invocations: &[PseudoInvocation]) -> &str {
    invocations.last().map_or("", |i| i.name.as_str())
}

fn split_arguments(
    args: &[ComponentValue],
    accepts_list: bool,
    location: SourceLocation,
) -> Result<(Option<ComponentValue>, Vec<ComponentValue>), EngineError> {
    let args = trim_whitespace(args);
    let (first, rest) = match args.iter().position(ComponentValue::is_comma) {
        Some(comma) => (trim_whitespace(&args[..comma]), Some(trim_whitespace(&args[comma + 1..]))),
        None => (args, None),
    };

    if first.len() > 1 {
        return Err(EngineError::user(
            "second argument must be separated by a comma",
            Some(location),
        ));
    }
    if rest.is_some() && first.is_empty() {
        return Err(EngineError::user("missing first argument", Some(location)));
    }
    if let Some(ComponentValue::Token(CSSToken::Number { int_value: None, .. })) = first.first() {
        return Err(EngineError::user(
            "pseudo-element index must be an integer",
            Some(location),
        ));
    }
    let rest = rest.unwrap_or_default();
    if !accepts_list && rest.iter().any(ComponentValue::is_comma) {
        return Err(EngineError::user("more than two arguments", Some(location)));
    }
    Ok((first.first().cloned(), rest.to_vec()))
}

/// A style rule's selector, by index into the style rules and the rule's
/// selector list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchedRule {
    /// Index among the stylesheet's style rules.
    pub rule: usize,
    /// Index into the rule's selector list.
    pub selector: usize,
}

/// A matched rule together with its parsed chain.
#[derive(Debug, Clone)]
pub struct RuleWithPseudos {
    /// Which rule and selector.
    pub matched: MatchedRule,
    /// The selector's chain.
    pub chain: Rc<PseudoChain>,
    /// Specificity of the full selector as written.
    pub specificity: Specificity,
}

impl RuleWithPseudos {
    /// Number of invocations in the chain.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.chain.depth()
    }

    /// Whether the chain reaches `depth`.
    #[must_use]
    pub fn has_depth(&self, depth: usize) -> bool {
        self.chain.has_depth(depth)
    }

    /// The invocation at `depth`.
    ///
    /// # Errors
    ///
    /// Returns a bug error when the chain is shorter.
    pub fn pseudo_at(&self, depth: usize) -> Result<&PseudoInvocation, EngineError> {
        self.chain.pseudo_at(depth)
    }

    /// Grouping index of the invocation at `depth`, 1 when absent.
    #[must_use]
    pub fn index_at(&self, depth: usize) -> i64 {
        self.chain
            .invocations
            .get(depth)
            .map_or(1, PseudoInvocation::index)
    }
}
