//! Tree primitives: `detach`, `insert_before`, `append_child`, and the
//! `unwrap` operation built on top of them (spec §4.3).
//!
//! `markup5ever_rcdom` keeps its own equivalents (`append`,
//! `remove_from_parent`, `get_parent_and_index` in its `lib.rs`) private to
//! the crate, so this module re-derives them against the public
//! `Node::parent`/`Node::children` fields, following the same algorithm.

use std::rc::Rc;

use markup5ever::{namespace_url, ns, Attribute, LocalName, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, WeakHandle};

/// Returns `true` if `handle` is an element node.
pub fn is_element(handle: &Handle) -> bool {
    matches!(handle.data, NodeData::Element { .. })
}

/// Returns `true` if `handle` is a comment node.
pub fn is_comment(handle: &Handle) -> bool {
    matches!(handle.data, NodeData::Comment { .. })
}

/// Returns `true` if `handle` is a text node.
pub fn is_text(handle: &Handle) -> bool {
    matches!(handle.data, NodeData::Text { .. })
}

/// The element's local tag name, or `None` if this isn't an element.
pub fn tag_name(handle: &Handle) -> Option<&str> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// Find `target`'s parent and its index within the parent's children, if it
/// has a parent. Mirrors `markup5ever_rcdom`'s private
/// `get_parent_and_index`: `Cell<Option<WeakHandle>>` has no `Copy` payload,
/// so reading it requires a take/set round trip rather than a plain `get`.
fn parent_and_index(target: &Handle) -> Option<(Handle, usize)> {
    let weak: WeakHandle = target.parent.take()?;
    let parent = weak.upgrade().expect("dangling weak parent pointer");
    target.parent.set(Some(weak));
    let index = parent
        .children
        .borrow()
        .iter()
        .position(|child| Rc::ptr_eq(child, target))
        .expect("node has a parent pointer but isn't in the parent's children");
    Some((parent, index))
}

/// Detach `target` from its parent's child list. No-op if it has no parent.
/// Structural failures (a dangling weak pointer) are assumed not to happen
/// for a tree this crate owns exclusively during a single traversal (spec
/// §7); if `target` genuinely has no parent this degrades to doing nothing,
/// matching the "structural failures ... assumed infallible" contract.
pub fn detach(target: &Handle) {
    if let Some((parent, index)) = parent_and_index(target) {
        parent.children.borrow_mut().remove(index);
        target.parent.set(None);
    }
}

/// Insert `node` (which must currently be parentless) as a child of
/// `parent`, immediately before `sibling` if given, or appended if not.
pub fn insert_before(parent: &Handle, node: Handle, sibling: Option<&Handle>) {
    debug_assert!(node.parent.take().is_none(), "node already has a parent");
    node.parent.set(Some(Rc::downgrade(parent)));

    let mut children = parent.children.borrow_mut();
    match sibling {
        Some(sibling) => {
            let index = children
                .iter()
                .position(|child| Rc::ptr_eq(child, sibling))
                .expect("sibling is not a child of parent");
            children.insert(index, node);
        }
        None => children.push(node),
    }
}

/// Append `node` (which must currently be parentless) as `parent`'s last
/// child.
pub fn append_child(parent: &Handle, node: Handle) {
    insert_before(parent, node, None)
}

/// The sibling immediately after `target` in its parent's children, if any.
fn next_sibling(target: &Handle) -> Option<Handle> {
    let (parent, index) = parent_and_index(target)?;
    parent.children.borrow().get(index + 1).cloned()
}

/// Replace `element` with its own children, in order, at `element`'s former
/// position among its siblings (spec §4.3).
///
/// - No parent: just detach (no-op on siblings).
/// - No children: just detach.
/// - Otherwise: splice each child into the parent's child list, in order,
///   before `element`'s next sibling (or appended, if it had none), then
///   detach `element`. Children keep their own descendants untouched.
pub fn unwrap(element: &Handle) {
    let Some((parent, _)) = parent_and_index(element) else {
        detach(element);
        return;
    };

    let children: Vec<Handle> = element.children.borrow().clone();
    if children.is_empty() {
        detach(element);
        return;
    }

    let next = next_sibling(element);
    for child in children {
        detach(&child);
        insert_before(&parent, child, next.as_ref());
    }
    detach(element);
}

/// The attribute's current value, or `None` if absent (or this isn't an
/// element).
pub fn get_attribute(element: &Handle, name: &str) -> Option<String> {
    match &element.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// Returns `true` if `element` carries an attribute named `name`.
pub fn has_attribute(element: &Handle, name: &str) -> bool {
    match &element.data {
        NodeData::Element { attrs, .. } => {
            attrs.borrow().iter().any(|a| a.name.local.as_ref() == name)
        }
        _ => false,
    }
}

/// The element's attribute names, in insertion order (spec §3 invariant:
/// "attribute insertion order in the output mirrors the surviving input
/// order" — this is the order the underlying `Vec<Attribute>` preserves).
pub fn attribute_names(element: &Handle) -> Vec<String> {
    match &element.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .map(|a| a.name.local.as_ref().to_owned())
            .collect(),
        _ => Vec::new(),
    }
}

/// Set (or insert, if absent) `name`'s value on `element`. A newly
/// inserted attribute is appended, keeping prior attributes' relative
/// order intact.
pub fn set_attribute(element: &Handle, name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &element.data {
        let mut attrs = attrs.borrow_mut();
        if let Some(attr) = attrs.iter_mut().find(|a| a.name.local.as_ref() == name) {
            attr.value = value.into();
        } else {
            attrs.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(name)),
                value: value.into(),
            });
        }
    }
}

/// Remove `name` from `element`'s attributes, if present.
pub fn remove_attribute(element: &Handle, name: &str) {
    if let NodeData::Element { attrs, .. } = &element.data {
        attrs.borrow_mut().retain(|a| a.name.local.as_ref() != name);
    }
}

/// A snapshot of `element`'s current children. Each `Handle` is a cheap
/// `Rc` clone; cloning the `Vec` itself is what lets callers recurse into
/// children while a sibling detaches itself mid-iteration (spec §4.9
/// Design Notes: "snapshot `nextSibling` pointers before recursing").
pub fn children_snapshot(element: &Handle) -> Vec<Handle> {
    element.children.borrow().clone()
}

/// Current child count.
pub fn children_len(element: &Handle) -> usize {
    element.children.borrow().len()
}

/// Detach `n` children from `element`, from the front if `from_front`,
/// otherwise from the back. Used by the `discardFirsts`/`discardLasts`
/// `tagChildren` strategies.
pub fn discard_children(element: &Handle, n: usize, from_front: bool) {
    let detached: Vec<Handle> = {
        let mut children = element.children.borrow_mut();
        let len = children.len();
        let n = n.min(len);
        if from_front {
            children.drain(0..n).collect()
        } else {
            children.drain((len - n)..len).collect()
        }
    };
    for child in detached {
        child.parent.set(None);
    }
}
