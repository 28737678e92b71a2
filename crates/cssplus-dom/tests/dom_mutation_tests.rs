//! Tests for DOM tree mutation methods used by the engine: removal, insertion,
//! wrapping, moving children and attribute/class edits.

use cssplus_dom::{DomTree, NodeId, serialize_document};

/// Build `<div><a></a><b></b><c></c></div>` under the root.
fn three_children(tree: &mut DomTree) -> (NodeId, NodeId, NodeId, NodeId) {
    let parent = tree.create_element("div");
    tree.append_child(NodeId::ROOT, parent);
    let a = tree.create_element("a");
    let b = tree.create_element("b");
    let c = tree.create_element("c");
    tree.append_child(parent, a);
    tree.append_child(parent, b);
    tree.append_child(parent, c);
    (parent, a, b, c)
}

// ========== remove_child ==========

#[test]
fn test_remove_child_single_child() {
    let mut tree = DomTree::new();
    let parent = tree.create_element("div");
    tree.append_child(NodeId::ROOT, parent);
    let child = tree.create_element("p");
    tree.append_child(parent, child);

    tree.remove_child(parent, child);

    assert!(tree.children(parent).is_empty());
    assert_eq!(tree.parent(child), None);
    assert_eq!(tree.next_sibling(child), None);
}

#[test]
fn test_remove_child_middle_of_three() {
    let mut tree = DomTree::new();
    let (parent, a, b, c) = three_children(&mut tree);

    tree.remove_child(parent, b);

    assert_eq!(tree.children(parent), &[a, c]);
    assert_eq!(tree.next_sibling(a), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(a));
}

#[test]
fn test_remove_child_wrong_parent_is_noop() {
    let mut tree = DomTree::new();
    let (parent, a, _, _) = three_children(&mut tree);
    let other = tree.create_element("section");

    tree.remove_child(other, a);

    assert_eq!(tree.parent(a), Some(parent));
    assert_eq!(tree.children(parent).len(), 3);
}

// ========== insert_before / prepend ==========

#[test]
fn test_insert_before_middle() {
    let mut tree = DomTree::new();
    let (parent, a, b, c) = three_children(&mut tree);
    let x = tree.create_element("x");

    tree.insert_before(parent, x, b);

    assert_eq!(tree.children(parent), &[a, x, b, c]);
    assert_eq!(tree.parent(x), Some(parent));
}

#[test]
fn test_insert_before_moves_attached_node() {
    let mut tree = DomTree::new();
    let (parent, a, b, c) = three_children(&mut tree);

    tree.insert_before(parent, c, a);

    assert_eq!(tree.children(parent), &[c, a, b]);
}

#[test]
fn test_prepend_child() {
    let mut tree = DomTree::new();
    let (parent, a, b, c) = three_children(&mut tree);
    let x = tree.create_element("x");

    tree.prepend_child(parent, x);

    assert_eq!(tree.children(parent), &[x, a, b, c]);
    assert_eq!(tree.first_element_child(parent), Some(x));
}

// ========== move_children / wrap ==========

#[test]
fn test_move_children_appends_to_existing() {
    let mut tree = DomTree::new();
    let (source, a, b, c) = three_children(&mut tree);
    let target = tree.create_element("section");
    tree.append_child(NodeId::ROOT, target);
    let existing = tree.create_element("p");
    tree.append_child(target, existing);

    tree.move_children(source, target);

    assert!(tree.children(source).is_empty());
    assert_eq!(tree.children(target), &[existing, a, b, c]);
    assert_eq!(tree.parent(b), Some(target));
}

#[test]
fn test_wrap_replaces_target_position() {
    let mut tree = DomTree::new();
    let (parent, a, b, c) = three_children(&mut tree);
    let wrapper = tree.create_element("div");

    tree.wrap(b, wrapper);

    assert_eq!(tree.children(parent), &[a, wrapper, c]);
    assert_eq!(tree.children(wrapper), &[b]);
}

#[test]
fn test_wrap_inner() {
    let mut tree = DomTree::new();
    let (parent, a, b, c) = three_children(&mut tree);
    let wrapper = tree.create_element("div");

    tree.wrap_inner(parent, wrapper);

    assert_eq!(tree.children(parent), &[wrapper]);
    assert_eq!(tree.children(wrapper), &[a, b, c]);
}

#[test]
fn test_detached_node_can_be_reattached() {
    let mut tree = DomTree::new();
    let (parent, a, b, _) = three_children(&mut tree);

    tree.detach(a);
    assert!(!tree.is_attached(a));
    tree.append_child(b, a);

    assert!(tree.is_attached(a));
    assert!(tree.is_descendant_of(a, parent));
}

// ========== content edits ==========

#[test]
fn test_set_text_content_replaces_children() {
    let mut tree = DomTree::new();
    let (parent, _, _, _) = three_children(&mut tree);

    tree.set_text_content(parent, "hello");

    assert_eq!(tree.children(parent).len(), 1);
    assert_eq!(tree.text_content(parent), "hello");
}

#[test]
fn test_class_add_remove() {
    let mut tree = DomTree::new();
    let p = tree.create_element("p");
    tree.append_child(NodeId::ROOT, p);

    tree.add_class(p, "one");
    tree.add_class(p, "two");
    tree.add_class(p, "one");
    assert_eq!(tree.attribute(p, "class"), Some("one two"));

    tree.remove_class(p, "one");
    assert_eq!(tree.attribute(p, "class"), Some("two"));
    tree.remove_class(p, "two");
    assert_eq!(tree.attribute(p, "class"), None);
}

#[test]
fn test_set_tag_name_keeps_attributes_and_children() {
    let mut tree = DomTree::new();
    let (parent, _, _, _) = three_children(&mut tree);
    tree.set_attribute(parent, "id", "main");

    tree.set_tag_name(parent, "section");

    assert_eq!(
        serialize_document(&tree),
        "<section id=\"main\"><a></a><b></b><c></c></section>"
    );
    assert_eq!(tree.get_element_by_id("main"), Some(parent));
}

#[test]
fn test_descendants_document_order() {
    let mut tree = DomTree::new();
    let (parent, a, b, c) = three_children(&mut tree);
    let inner = tree.create_element("i");
    tree.append_child(a, inner);

    let order: Vec<NodeId> = tree.descendants(NodeId::ROOT).collect();

    assert_eq!(order, vec![parent, a, inner, b, c]);
    assert_eq!(tree.ancestors(inner).collect::<Vec<_>>(), vec![a, parent, NodeId::ROOT]);
    assert_eq!(tree.preceding_siblings(c).collect::<Vec<_>>(), vec![b, a]);
    assert_eq!(tree.following_siblings(a).collect::<Vec<_>>(), vec![b, c]);
}
