//! Navigator over an [`XmlDocument`]

use super::{XPathNavigator, XPathNodeType};
use crate::dom::{ns, DocumentAccess, NodeId, NodeKind, XmlDocument, XmlNode};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Node(NodeId),
    /// Index into the element's in-scope namespace list
    Namespace { element: NodeId, index: usize },
}

/// Cursor over a shared, immutable document
#[derive(Debug, Clone)]
pub struct DocumentNavigator {
    doc: Arc<XmlDocument>,
    position: Position,
}

impl DocumentNavigator {
    /// Navigator positioned on the document root
    pub fn new(doc: Arc<XmlDocument>) -> Self {
        DocumentNavigator {
            doc,
            position: Position::Node(0),
        }
    }

    /// Navigator positioned on a given node
    pub fn at(doc: Arc<XmlDocument>, id: NodeId) -> Self {
        DocumentNavigator {
            doc,
            position: Position::Node(id),
        }
    }

    pub fn document(&self) -> &Arc<XmlDocument> {
        &self.doc
    }

    /// Current node id; `None` while on a namespace node
    pub fn node_id(&self) -> Option<NodeId> {
        match self.position {
            Position::Node(id) => Some(id),
            Position::Namespace { .. } => None,
        }
    }

    /// Node used as XPath context: the current node, or the owning element
    /// while on a namespace node
    pub fn context_node(&self) -> NodeId {
        match self.position {
            Position::Node(id) | Position::Namespace { element: id, .. } => id,
        }
    }

    fn node(&self) -> Option<&XmlNode> {
        self.node_id().and_then(|id| self.doc.get_node(id))
    }

    fn namespaces(&self, element: NodeId) -> Vec<(&str, &str)> {
        let mut list = self.doc.in_scope_namespaces(element);
        list.push(("xml", ns::XML));
        list
    }

    fn namespace_binding(&self) -> Option<(&str, &str)> {
        match self.position {
            Position::Namespace { element, index } => self.namespaces(element).get(index).copied(),
            Position::Node(_) => None,
        }
    }

    fn set_node(&mut self, id: Option<NodeId>) -> bool {
        match id {
            Some(id) => {
                self.position = Position::Node(id);
                true
            }
            None => false,
        }
    }

    /// Sibling links apply to child nodes only, never to attributes
    fn sibling_node(&self) -> Option<&XmlNode> {
        self.node().filter(|n| n.kind != NodeKind::Attribute)
    }
}

impl XPathNavigator for DocumentNavigator {
    fn node_type(&self) -> XPathNodeType {
        match self.position {
            Position::Namespace { .. } => XPathNodeType::Namespace,
            Position::Node(id) => match self.doc.kind(id) {
                Some(NodeKind::Element) => XPathNodeType::Element,
                Some(NodeKind::Attribute) => XPathNodeType::Attribute,
                Some(NodeKind::Text | NodeKind::CData) => XPathNodeType::Text,
                Some(NodeKind::Comment) => XPathNodeType::Comment,
                Some(NodeKind::ProcessingInstruction) => XPathNodeType::ProcessingInstruction,
                Some(NodeKind::Document) | None => XPathNodeType::Root,
            },
        }
    }

    fn name(&self) -> &str {
        match self.position {
            Position::Node(id) => self.doc.node_name(id),
            Position::Namespace { .. } => self.namespace_binding().map_or("", |(p, _)| p),
        }
    }

    fn local_name(&self) -> &str {
        match self.position {
            Position::Node(id) => self.doc.node_local_name(id),
            Position::Namespace { .. } => self.name(),
        }
    }

    fn prefix(&self) -> &str {
        match self.position {
            Position::Node(id) => self.doc.node_prefix(id),
            Position::Namespace { .. } => "",
        }
    }

    fn namespace_uri(&self) -> &str {
        match self.position {
            Position::Node(id) => self.doc.node_namespace(id),
            Position::Namespace { .. } => "",
        }
    }

    fn value(&self) -> String {
        match self.position {
            Position::Node(id) => self.doc.string_value(id),
            Position::Namespace { .. } => self
                .namespace_binding()
                .map_or_else(String::new, |(_, uri)| uri.to_string()),
        }
    }

    fn base_uri(&self) -> Option<String> {
        match self.position {
            Position::Node(id) | Position::Namespace { element: id, .. } => self.doc.node_base_uri(id),
        }
    }

    fn is_empty_element(&self) -> bool {
        self.node().map_or(false, |n| n.is_element() && n.empty)
    }

    fn has_attributes(&self) -> bool {
        self.node().map_or(false, |n| n.is_element() && n.has_attributes())
    }

    fn has_children(&self) -> bool {
        self.node().map_or(false, |n| n.has_children())
    }

    fn move_to_root(&mut self) {
        self.position = Position::Node(0);
    }

    fn move_to_parent(&mut self) -> bool {
        match self.position {
            Position::Node(id) => {
                let parent = self.doc.parent(id);
                self.set_node(parent)
            }
            Position::Namespace { element, .. } => self.set_node(Some(element)),
        }
    }

    fn move_to_first_child(&mut self) -> bool {
        let child = self.node().and_then(|n| n.first_child);
        self.set_node(child)
    }

    fn move_to_next(&mut self) -> bool {
        let next = self.sibling_node().and_then(|n| n.next_sibling);
        self.set_node(next)
    }

    fn move_to_previous(&mut self) -> bool {
        let prev = self.sibling_node().and_then(|n| n.prev_sibling);
        self.set_node(prev)
    }

    fn move_to_first(&mut self) -> bool {
        let first = self
            .sibling_node()
            .and_then(|n| n.parent)
            .and_then(|p| self.doc.get_node(p))
            .and_then(|p| p.first_child);
        self.set_node(first)
    }

    fn move_to_first_attribute(&mut self) -> bool {
        let attr = self
            .node()
            .filter(|n| n.is_element() && n.has_attributes())
            .map(|n| n.attr_start);
        self.set_node(attr)
    }

    fn move_to_next_attribute(&mut self) -> bool {
        let Some(id) = self.node_id() else {
            return false;
        };
        let next = self
            .node()
            .filter(|n| n.kind == NodeKind::Attribute)
            .and_then(|n| n.parent)
            .filter(|&owner| self.doc.attributes(owner).contains(&(id + 1)))
            .map(|_| id + 1);
        self.set_node(next)
    }

    fn move_to_first_namespace(&mut self) -> bool {
        match self.position {
            Position::Node(id) if self.doc.kind(id) == Some(NodeKind::Element) => {
                self.position = Position::Namespace { element: id, index: 0 };
                true
            }
            _ => false,
        }
    }

    fn move_to_next_namespace(&mut self) -> bool {
        match self.position {
            Position::Namespace { element, index } if index + 1 < self.namespaces(element).len() => {
                self.position = Position::Namespace {
                    element,
                    index: index + 1,
                };
                true
            }
            _ => false,
        }
    }

    fn move_to(&mut self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.doc, &other.doc) {
            self.position = other.position;
            true
        } else {
            false
        }
    }

    fn is_same_position(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.doc, &other.doc) && self.position == other.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigator(xml: &str) -> DocumentNavigator {
        DocumentNavigator::new(Arc::new(XmlDocument::parse(xml.as_bytes())))
    }

    #[test]
    fn test_child_and_sibling_moves() {
        let mut nav = navigator("<r><a/><b>text</b></r>");
        assert_eq!(nav.node_type(), XPathNodeType::Root);
        assert!(nav.move_to_first_child());
        assert_eq!(nav.name(), "r");
        assert!(nav.move_to_first_child());
        assert_eq!(nav.name(), "a");
        assert!(nav.is_empty_element());
        assert!(!nav.move_to_previous());
        assert!(nav.move_to_next());
        assert_eq!(nav.value(), "text");
        assert!(nav.move_to_first());
        assert_eq!(nav.name(), "a");
        assert!(nav.move_to_parent());
        assert!(nav.move_to_parent());
        assert!(!nav.move_to_parent());
    }

    #[test]
    fn test_attribute_moves() {
        let mut nav = navigator("<r x=\"1\" y=\"2\"/>");
        assert!(nav.move_to_first_child());
        assert!(nav.move_to_first_attribute());
        assert_eq!(nav.node_type(), XPathNodeType::Attribute);
        assert_eq!((nav.name(), nav.value().as_str()), ("x", "1"));
        assert!(!nav.move_to_next());
        assert!(nav.move_to_next_attribute());
        assert_eq!(nav.name(), "y");
        assert!(!nav.move_to_next_attribute());
        assert!(nav.move_to_parent());
        assert_eq!(nav.name(), "r");
    }

    #[test]
    fn test_namespace_moves() {
        let mut nav = navigator("<r xmlns:ex=\"urn:ex\"/>");
        assert!(nav.move_to_first_child());
        assert!(nav.move_to_first_namespace());
        assert_eq!(nav.node_type(), XPathNodeType::Namespace);
        assert_eq!((nav.name(), nav.value().as_str()), ("ex", "urn:ex"));
        assert!(nav.move_to_next_namespace());
        assert_eq!(nav.name(), "xml");
        assert!(!nav.move_to_next_namespace());
        assert!(nav.move_to_parent());
        assert_eq!(nav.node_type(), XPathNodeType::Element);
    }

    #[test]
    fn test_move_to_and_same_position() {
        let mut a = navigator("<r><c/></r>");
        let mut b = a.clone();
        assert!(b.move_to_first_child());
        assert!(!a.is_same_position(&b));
        assert!(a.move_to(&b));
        assert!(a.is_same_position(&b));

        let other = navigator("<r><c/></r>");
        assert!(!a.move_to(&other));
    }
}
