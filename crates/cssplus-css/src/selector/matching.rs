//! [Selectors 4 § 3 Selector Syntax and Structure](https://www.w3.org/TR/selectors-4/#structure)
//!
//! Matching runs right to left: the subject compound is tested against the
//! node, then each combinator walks to candidate elements for the compound
//! on its left. Every candidate is tried, so `div > p span` finds a `div`
//! parent of any `p` ancestor, not only the nearest one.

use cssplus_common::SourceLocation;
use cssplus_dom::{DomTree, ElementData, NodeId, NodeType};

use super::nth::Nth;
use super::{
    AttributeOperator, AttributeSelector, Combinator, Selector, SelectorComponent, SelectorList,
};
use crate::parser::ComponentValue;

impl Selector {
    /// Whether `node` matches this selector. A relative selector is matched
    /// as if its leading combinator were absent.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.matches_anchored(tree, node, None)
    }

    /// Match with the leftmost compound required to stand in `relation`
    /// to `anchor` (`anchor` on the left of the combinator).
    #[must_use]
    pub fn matches_anchored(
        &self,
        tree: &DomTree,
        node: NodeId,
        anchor: Option<(Combinator, NodeId)>,
    ) -> bool {
        let (compounds, combinators) = self.compounds();
        match compounds.len().checked_sub(1) {
            Some(last) => match_from(&compounds, &combinators, last, tree, node, anchor),
            None => false,
        }
    }

    /// The combinator a relative selector starts with, `Descendant` if none.
    #[must_use]
    pub fn leading_combinator(&self) -> Combinator {
        match self.components.first() {
            Some(SelectorComponent::Combinator(combinator)) => *combinator,
            _ => Combinator::Descendant,
        }
    }
}

impl SelectorList {
    /// Whether `node` matches any selector in the list.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(tree, node))
    }
}

/// [DOM § 4.2.6 querySelectorAll](https://dom.spec.whatwg.org/#dom-parentnode-queryselectorall)
///
/// All elements in the document matching `list`, in document order.
#[must_use]
pub fn query_all(tree: &DomTree, list: &SelectorList) -> Vec<NodeId> {
    tree.descendants(tree.root())
        .filter(|&node| tree.as_element(node).is_some() && list.matches(tree, node))
        .collect()
}

/// Elements inside `scope` matching `list`, in document order. Relative
/// selectors are anchored at `scope` (`> p` finds child paragraphs).
#[must_use]
pub fn query_all_within(tree: &DomTree, scope: NodeId, list: &SelectorList) -> Vec<NodeId> {
    tree.descendants(scope)
        .filter(|&node| tree.as_element(node).is_some())
        .filter(|&node| {
            list.selectors.iter().any(|selector| {
                if selector.is_relative() {
                    selector.matches_anchored(
                        tree,
                        node,
                        Some((selector.leading_combinator(), scope)),
                    )
                } else {
                    selector.matches(tree, node)
                }
            })
        })
        .collect()
}

fn match_from(
    compounds: &[&[SelectorComponent]],
    combinators: &[Combinator],
    index: usize,
    tree: &DomTree,
    node: NodeId,
    anchor: Option<(Combinator, NodeId)>,
) -> bool {
    if !compound_matches(compounds[index], tree, node) {
        return false;
    }
    let Some(left) = index.checked_sub(1) else {
        return anchor.is_none_or(|(combinator, anchor)| related(tree, combinator, anchor, node));
    };
    candidates(tree, combinators[left], node)
        .into_iter()
        .any(|candidate| match_from(compounds, combinators, left, tree, candidate, anchor))
}

/// Elements that could satisfy the compound on the left of `combinator`
/// when `node` satisfies the one on its right.
fn candidates(tree: &DomTree, combinator: Combinator, node: NodeId) -> Vec<NodeId> {
    let is_element = |id: &NodeId| tree.as_element(*id).is_some();
    match combinator {
        Combinator::Descendant => tree.ancestors(node).filter(is_element).collect(),
        Combinator::Child => tree.parent(node).filter(is_element).into_iter().collect(),
        Combinator::NextSibling => tree
            .preceding_siblings(node)
            .find(is_element)
            .into_iter()
            .collect(),
        Combinator::SubsequentSibling => tree.preceding_siblings(node).filter(is_element).collect(),
    }
}

/// Whether `node` stands in `combinator` relation to `anchor`.
fn related(tree: &DomTree, combinator: Combinator, anchor: NodeId, node: NodeId) -> bool {
    candidates(tree, combinator, node).contains(&anchor)
}

fn compound_matches(compound: &[SelectorComponent], tree: &DomTree, node: NodeId) -> bool {
    let Some(element) = tree.as_element(node) else {
        return false;
    };
    compound.iter().all(|component| match component {
        // [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
        SelectorComponent::Type(name) => element.tag_name.eq_ignore_ascii_case(name),
        SelectorComponent::Universal => true,
        SelectorComponent::Id(id) => element.id() == Some(id.as_str()),
        SelectorComponent::Class(class) => element.has_class(class),
        SelectorComponent::Attribute(attr) => attribute_matches(attr, element),
        SelectorComponent::PseudoClass { name, args } => {
            pseudo_class_matches(name, args.as_deref(), tree, node, element)
        }
        // Pseudo-elements never match a real element.
        SelectorComponent::PseudoElement { .. } | SelectorComponent::Combinator(_) => false,
    })
}

/// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
fn attribute_matches(selector: &AttributeSelector, element: &ElementData) -> bool {
    let Some(actual) = element.attrs.get(&selector.name) else {
        return false;
    };
    let Some((operator, expected)) = &selector.matcher else {
        return true;
    };
    let (actual, expected) = if selector.case_insensitive {
        (actual.to_ascii_lowercase(), expected.to_ascii_lowercase())
    } else {
        (actual.to_string(), expected.clone())
    };
    match operator {
        AttributeOperator::Equals => actual == expected,
        AttributeOperator::Includes => {
            !expected.is_empty() && actual.split_ascii_whitespace().any(|w| w == expected)
        }
        AttributeOperator::DashMatch => {
            actual == expected || actual.starts_with(&format!("{expected}-"))
        }
        // "If 'val' is the empty string then the selector does not represent anything."
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

/// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
///
/// Pseudo-classes this matcher does not know never match.
fn pseudo_class_matches(
    name: &str,
    args: Option<&[ComponentValue]>,
    tree: &DomTree,
    node: NodeId,
    element: &ElementData,
) -> bool {
    let same_type = |id: NodeId| {
        tree.as_element(id)
            .is_some_and(|e| e.tag_name.eq_ignore_ascii_case(&element.tag_name))
    };
    let is_element = |id: NodeId| tree.as_element(id).is_some();

    match (name, args) {
        // "The :root pseudo-class represents an element that is the root of the document."
        ("root", None) => tree.document_element() == Some(node),
        ("first-child", None) => !tree.preceding_siblings(node).any(is_element),
        ("last-child", None) => !tree.following_siblings(node).any(is_element),
        ("only-child", None) => {
            !tree.preceding_siblings(node).any(is_element)
                && !tree.following_siblings(node).any(is_element)
        }
        ("first-of-type", None) => !tree.preceding_siblings(node).any(same_type),
        ("last-of-type", None) => !tree.following_siblings(node).any(same_type),
        ("only-of-type", None) => {
            !tree.preceding_siblings(node).any(same_type)
                && !tree.following_siblings(node).any(same_type)
        }
        // "The :empty pseudo-class represents an element that has no children
        // except, optionally, document white space characters."
        ("empty", None) => tree.children(node).iter().all(|&c| {
            match tree.get(c).map(|n| &n.node_type) {
                Some(NodeType::Text(t)) => t.trim().is_empty(),
                Some(NodeType::Comment(_)) => true,
                _ => false,
            }
        }),
        ("link" | "any-link", None) => {
            matches!(element.tag_name.as_str(), "a" | "area") && element.attrs.contains("href")
        }
        ("disabled", None) => element.attrs.contains("disabled"),
        ("enabled", None) => !element.attrs.contains("disabled"),
        ("checked", None) => {
            element.attrs.contains("checked") || element.attrs.contains("selected")
        }
        // [§ 4.2 :is()](https://www.w3.org/TR/selectors-4/#matches)
        ("is" | "where" | "matches", Some(args)) => {
            parse_argument_list(args).is_some_and(|list| list.matches(tree, node))
        }
        // [§ 4.3 :not()](https://www.w3.org/TR/selectors-4/#negation)
        ("not", Some(args)) => parse_argument_list(args).is_some_and(|list| !list.matches(tree, node)),
        // [§ 4.5 :has()](https://www.w3.org/TR/selectors-4/#relational)
        ("has", Some(args)) => parse_argument_list(args).is_some_and(|list| {
            list.selectors.iter().any(|selector| {
                let anchor = Some((selector.leading_combinator(), node));
                relative_scope(tree, node, selector.leading_combinator())
                    .into_iter()
                    .any(|candidate| selector.matches_anchored(tree, candidate, anchor))
            })
        }),
        // [§ 14.4 Child-indexed pseudo-classes](https://www.w3.org/TR/selectors-4/#child-index)
        ("nth-child", Some(args)) => Nth::parse(args).is_some_and(|nth| {
            nth.matches(position(tree.preceding_siblings(node).filter(|&s| is_element(s))))
        }),
        ("nth-last-child", Some(args)) => Nth::parse(args).is_some_and(|nth| {
            nth.matches(position(tree.following_siblings(node).filter(|&s| is_element(s))))
        }),
        ("nth-of-type", Some(args)) => Nth::parse(args).is_some_and(|nth| {
            nth.matches(position(tree.preceding_siblings(node).filter(|&s| same_type(s))))
        }),
        ("nth-last-of-type", Some(args)) => Nth::parse(args).is_some_and(|nth| {
            nth.matches(position(tree.following_siblings(node).filter(|&s| same_type(s))))
        }),
        _ => false,
    }
}

/// 1-based position given the siblings counted before it.
fn position(before: impl Iterator<Item = NodeId>) -> i64 {
    i64::try_from(before.count()).map_or(i64::MAX, |n| n + 1)
}

/// Elements a relative selector anchored at `anchor` may reach.
fn relative_scope(tree: &DomTree, anchor: NodeId, combinator: Combinator) -> Vec<NodeId> {
    match combinator {
        Combinator::Descendant | Combinator::Child => tree.descendants(anchor).collect(),
        Combinator::NextSibling | Combinator::SubsequentSibling => {
            tree.following_siblings(anchor).collect()
        }
    }
}

fn parse_argument_list(args: &[ComponentValue]) -> Option<SelectorList> {
    SelectorList::parse(args, SourceLocation::default()).ok()
}
