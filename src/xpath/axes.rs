//! XPath Axes Implementation
//!
//! Axis functions return nodes in axis order: document order for forward
//! axes, reverse document order for ancestor, preceding and
//! preceding-sibling. Node ids follow document order, which the following
//! and preceding axes use directly.
//!
//! The namespace axis selects nothing; namespace nodes are reachable
//! through the navigator API instead.

use super::parser::{Axis, NodeTest};
use crate::dom::{DocumentAccess, NodeId, NodeKind};
use std::collections::HashSet;

/// Navigate along an axis from a context node
pub fn navigate<D: DocumentAccess>(doc: &D, context: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.children(context).collect(),
        Axis::Descendant => doc.descendants(context).collect(),
        Axis::DescendantOrSelf => std::iter::once(context).chain(doc.descendants(context)).collect(),
        Axis::Parent => doc.parent(context).into_iter().collect(),
        Axis::Ancestor => ancestor_axis(doc, context),
        Axis::AncestorOrSelf => {
            let mut result = vec![context];
            result.extend(ancestor_axis(doc, context));
            result
        }
        Axis::FollowingSibling => sibling_axis(doc, context, |n| n.next_sibling),
        Axis::PrecedingSibling => sibling_axis(doc, context, |n| n.prev_sibling),
        Axis::Following => following_axis(doc, context),
        Axis::Preceding => preceding_axis(doc, context),
        Axis::Self_ => vec![context],
        Axis::Attribute => doc.attributes(context).collect(),
        Axis::Namespace => Vec::new(),
    }
}

fn ancestor_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = context;
    while let Some(parent) = doc.parent(current) {
        result.push(parent);
        current = parent;
    }
    result
}

fn sibling_axis<D, F>(doc: &D, context: NodeId, next: F) -> Vec<NodeId>
where
    D: DocumentAccess,
    F: Fn(&crate::dom::XmlNode) -> Option<NodeId>,
{
    let mut result = Vec::new();
    if doc.kind(context) == Some(NodeKind::Attribute) {
        return result;
    }
    let mut sibling = doc.get_node(context).and_then(&next);
    while let Some(id) = sibling {
        result.push(id);
        sibling = doc.get_node(id).and_then(&next);
    }
    result
}

/// First node id after the subtree rooted at `id`
fn subtree_end<D: DocumentAccess>(doc: &D, id: NodeId) -> NodeId {
    let mut current = id;
    loop {
        if let Some(next) = doc.get_node(current).and_then(|n| n.next_sibling) {
            return next;
        }
        match doc.parent(current) {
            Some(parent) => current = parent,
            None => return doc.node_count() as NodeId,
        }
    }
}

fn is_tree_node<D: DocumentAccess>(doc: &D, id: NodeId) -> bool {
    !matches!(doc.kind(id), Some(NodeKind::Attribute) | None)
}

/// following:: axis - nodes after the context in document order,
/// excluding descendants and attributes
fn following_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    // An attribute's following nodes start with its owner's children
    let start = if doc.kind(context) == Some(NodeKind::Attribute) {
        context + 1
    } else {
        subtree_end(doc, context)
    };
    (start..doc.node_count() as NodeId)
        .filter(|&id| is_tree_node(doc, id))
        .collect()
}

/// preceding:: axis - nodes before the context in document order,
/// excluding ancestors and attributes; nearest first
fn preceding_axis<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let ancestors: HashSet<NodeId> = ancestor_axis(doc, context).into_iter().collect();
    (0..context)
        .rev()
        .filter(|id| !ancestors.contains(id) && is_tree_node(doc, *id))
        .collect()
}

/// Check a node against a node test. `uri` is the namespace the test's
/// prefix resolved to; empty for unprefixed tests.
pub fn matches_node_test<D: DocumentAccess>(
    doc: &D,
    node_id: NodeId,
    axis: Axis,
    test: &NodeTest,
    uri: &str,
) -> bool {
    let Some(kind) = doc.kind(node_id) else {
        return false;
    };
    let principal = if axis == Axis::Attribute {
        NodeKind::Attribute
    } else {
        NodeKind::Element
    };

    match test {
        NodeTest::Any => kind == principal,
        NodeTest::Name(local) | NodeTest::QName(_, local) => {
            kind == principal && doc.node_local_name(node_id) == local && doc.node_namespace(node_id) == uri
        }
        NodeTest::NamespaceWildcard(_) => kind == principal && doc.node_namespace(node_id) == uri,
        NodeTest::Node => true,
        NodeTest::Text => matches!(kind, NodeKind::Text | NodeKind::CData),
        NodeTest::Comment => kind == NodeKind::Comment,
        NodeTest::ProcessingInstruction(target) => {
            kind == NodeKind::ProcessingInstruction
                && target.as_deref().map_or(true, |t| doc.node_name(node_id) == t)
        }
    }
}
