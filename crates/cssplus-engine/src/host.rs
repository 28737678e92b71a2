//! The document host: tree storage, native selector matching and the
//! mutation primitives the engine and its plugins use.
//!
//! The tree is shared between cooperative tasks, so every method borrows it
//! for the duration of the call only. Nothing here ever holds a borrow
//! across an await point.

use std::cell::RefCell;
use std::rc::Rc;

use cssplus_common::SourceLocation;
use cssplus_css::{SelectorList, query_all, query_all_within};
use cssplus_dom::{DomTree, NodeId, serialize_document};

/// Cheaply clonable handle over the shared document tree.
#[derive(Debug, Clone)]
pub struct Host {
    tree: Rc<RefCell<DomTree>>,
}

impl Host {
    /// Take ownership of a parsed document.
    #[must_use]
    pub fn new(tree: DomTree) -> Self {
        Self {
            tree: Rc::new(RefCell::new(tree)),
        }
    }

    /// Run `f` with shared access to the tree.
    pub fn with_tree<R>(&self, f: impl FnOnce(&DomTree) -> R) -> R {
        f(&self.tree.borrow())
    }

    fn with_tree_mut<R>(&self, f: impl FnOnce(&mut DomTree) -> R) -> R {
        f(&mut self.tree.borrow_mut())
    }

    /// A copy of the current tree.
    #[must_use]
    pub fn snapshot(&self) -> DomTree {
        self.tree.borrow().clone()
    }

    /// Serialize the document as HTML.
    #[must_use]
    pub fn serialize(&self) -> String {
        self.with_tree(serialize_document)
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// All matching elements, in document order.
    #[must_use]
    pub fn query_all(&self, selectors: &SelectorList) -> Vec<NodeId> {
        self.with_tree(|tree| query_all(tree, selectors))
    }

    /// Whether `node` matches.
    #[must_use]
    pub fn matches(&self, node: NodeId, selectors: &SelectorList) -> bool {
        self.with_tree(|tree| selectors.matches(tree, node))
    }

    /// Matching elements inside `node`. Relative selectors (`> p`) are
    /// anchored at `node`.
    #[must_use]
    pub fn find(&self, node: NodeId, selectors: &SelectorList) -> Vec<NodeId> {
        self.with_tree(|tree| query_all_within(tree, node, selectors))
    }

    /// The nearest inclusive ancestor that matches.
    #[must_use]
    pub fn closest(&self, node: NodeId, selectors: &SelectorList) -> Option<NodeId> {
        self.with_tree(|tree| {
            core::iter::once(node)
                .chain(tree.ancestors(node))
                .find(|&n| tree.as_element(n).is_some() && selectors.matches(tree, n))
        })
    }

    /// The nearest element sibling after `node` that matches.
    #[must_use]
    pub fn next_matching_sibling(&self, node: NodeId, selectors: &SelectorList) -> Option<NodeId> {
        self.with_tree(|tree| {
            tree.following_siblings(node)
                .find(|&n| tree.as_element(n).is_some() && selectors.matches(tree, n))
        })
    }

    /// Every element in document order.
    #[must_use]
    pub fn elements_in_order(&self) -> Vec<NodeId> {
        self.with_tree(|tree| {
            tree.descendants(tree.root())
                .filter(|&n| tree.as_element(n).is_some())
                .collect()
        })
    }

    // ========================================================================
    // Navigation and reads
    // ========================================================================

    /// The parent element, if the parent is an element.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.with_tree(|tree| tree.parent(node).filter(|&p| tree.as_element(p).is_some()))
    }

    /// First element child.
    #[must_use]
    pub fn first_element_child(&self, node: NodeId) -> Option<NodeId> {
        self.with_tree(|tree| tree.first_element_child(node))
    }

    /// Next element sibling.
    #[must_use]
    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.with_tree(|tree| tree.next_element_sibling(node))
    }

    /// Whether `node` is `ancestor` or inside it.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.with_tree(|tree| tree.is_descendant_of(node, ancestor))
    }

    /// Document-wide id lookup.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.with_tree(|tree| tree.get_element_by_id(id))
    }

    /// An attribute value.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_tree(|tree| tree.attribute(node, name).map(str::to_string))
    }

    /// The tag name of an element.
    #[must_use]
    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.with_tree(|tree| tree.tag_name(node).map(str::to_string))
    }

    /// Concatenated descendant text.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        self.with_tree(|tree| tree.text_content(node))
    }

    /// Where the node was written in the HTML source.
    #[must_use]
    pub fn location(&self, node: NodeId) -> Option<SourceLocation> {
        self.with_tree(|tree| tree.get(node).and_then(|n| n.location))
    }

    /// Whether the node is reachable from the document root.
    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.with_tree(|tree| tree.is_attached(node))
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Allocate a detached element.
    #[must_use]
    pub fn create_element(&self, tag_name: &str) -> NodeId {
        self.with_tree_mut(|tree| tree.create_element(tag_name))
    }

    /// Allocate a detached text node.
    #[must_use]
    pub fn create_text(&self, text: &str) -> NodeId {
        self.with_tree_mut(|tree| tree.create_text(text))
    }

    /// Move `child` to the end of `parent`.
    pub fn append(&self, parent: NodeId, child: NodeId) {
        self.with_tree_mut(|tree| tree.append_child(parent, child));
    }

    /// Move `child` to the start of `parent`.
    pub fn prepend(&self, parent: NodeId, child: NodeId) {
        self.with_tree_mut(|tree| tree.prepend_child(parent, child));
    }

    /// Put `wrapper` where `target` is and move `target` into it.
    pub fn wrap_around(&self, target: NodeId, wrapper: NodeId) {
        self.with_tree_mut(|tree| tree.wrap(target, wrapper));
    }

    /// Move all of `target`'s children into `wrapper`, then append `wrapper`.
    pub fn wrap_inner(&self, target: NodeId, wrapper: NodeId) {
        self.with_tree_mut(|tree| tree.wrap_inner(target, wrapper));
    }

    /// Remove a node from its parent. The node stays allocated.
    pub fn detach(&self, node: NodeId) {
        self.with_tree_mut(|tree| tree.detach(node));
    }

    /// Remove every child.
    pub fn clear_children(&self, node: NodeId) {
        self.with_tree_mut(|tree| tree.clear_children(node));
    }

    /// Set an attribute.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.with_tree_mut(|tree| tree.set_attribute(node, name, value));
    }

    /// Remove an attribute.
    pub fn remove_attribute(&self, node: NodeId, name: &str) {
        self.with_tree_mut(|tree| tree.remove_attribute(node, name));
    }

    /// Add a class if not present.
    pub fn add_class(&self, node: NodeId, class: &str) {
        self.with_tree_mut(|tree| tree.add_class(node, class));
    }

    /// Remove a class.
    pub fn remove_class(&self, node: NodeId, class: &str) {
        self.with_tree_mut(|tree| tree.remove_class(node, class));
    }

    /// Change an element's tag, keeping its attributes and children. The
    /// node keeps its id, so tasks resolved to it stay valid.
    pub fn replace_tag(&self, node: NodeId, tag_name: &str) {
        self.with_tree_mut(|tree| tree.set_tag_name(node, tag_name));
    }

    /// Replace the children of `node` with a single text node.
    pub fn set_text_content(&self, node: NodeId, text: &str) {
        self.with_tree_mut(|tree| tree.set_text_content(node, text));
    }
}
