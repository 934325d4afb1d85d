//! Navigation and mutation helpers over `markup5ever_rcdom` handles.
//!
//! The parser guarantees stable node identity for the duration of one
//! execution; identity comparisons are `Rc::ptr_eq` throughout.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use html5ever::tendril::StrTendril;
use markup5ever_rcdom::{Handle, Node, NodeData};

/// Upgrade a node's weak parent link.
pub(crate) fn parent_of(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    node.parent.set(weak);
    parent
}

/// Ancestor chain of `node`, nearest first, excluding the node itself.
pub(crate) fn ancestors(node: &Handle) -> Vec<Handle> {
    let mut chain = Vec::new();
    let mut current = parent_of(node);
    while let Some(parent) = current {
        current = parent_of(&parent);
        chain.push(parent);
    }
    chain
}

/// Owned value of the attribute `name` on an element node, or `None` when
/// the node is not an element or lacks the attribute.
pub(crate) fn attr_value(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            attrs::find(&attrs.borrow(), name).map(|a| a.value.to_string())
        }
        _ => None,
    }
}

pub(crate) fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// Insert `nodes` into `parent`'s child list starting at `index`, preserving
/// their order.
pub(crate) fn insert_children_at(parent: &Handle, index: usize, nodes: Vec<Handle>) {
    let mut children = parent.children.borrow_mut();
    for (offset, node) in nodes.into_iter().enumerate() {
        node.parent.set(Some(Rc::downgrade(parent)));
        children.insert(index + offset, node);
    }
}

/// Position of `child` within `parent`'s child list.
pub(crate) fn child_position(parent: &Handle, child: &Handle) -> Option<usize> {
    parent
        .children
        .borrow()
        .iter()
        .position(|c| Rc::ptr_eq(c, child))
}

/// Detach all existing children of `node` and replace them with a single
/// text node.
pub(crate) fn replace_children_with_text(node: &Handle, text: &str) {
    let mut children = node.children.borrow_mut();
    for child in children.drain(..) {
        child.parent.set(None);
    }
    let text_node = Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    });
    text_node.parent.set(Some(Rc::downgrade(node)));
    children.push(text_node);
}

/// Lists of nodes keyed by another node's identity. Keys are raw node
/// addresses, valid only while the document keeps every keyed node alive,
/// which holds for the duration of one execution.
#[derive(Default)]
pub(crate) struct NodeListMap {
    entries: HashMap<usize, Vec<Handle>>,
}

impl NodeListMap {
    pub(crate) fn push(&mut self, key: &Handle, value: Handle) {
        self.entries.entry(node_key(key)).or_default().push(value);
    }

    pub(crate) fn get(&self, key: &Handle) -> &[Handle] {
        self.entries
            .get(&node_key(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn node_key(node: &Handle) -> usize {
    Rc::as_ptr(node) as usize
}

/// Find the element with the given `id` attribute, depth-first.
#[cfg(test)]
pub(crate) fn find_by_id(node: &Handle, id: &str) -> Option<Handle> {
    if attr_value(node, "id").as_deref() == Some(id) {
        return Some(node.clone());
    }
    for child in node.children.borrow().iter() {
        if let Some(found) = find_by_id(child, id) {
            return Some(found);
        }
    }
    None
}
