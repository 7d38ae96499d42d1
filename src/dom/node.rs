//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references. Ids are
//! assigned in document order: an element, then its attributes, then its
//! children.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Attribute (namespace declarations are kept separately)
    Attribute,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    pub kind: NodeKind,
    /// Parent node (None for the document node). An attribute's parent is
    /// its owner element.
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// Qualified name (elements, attributes) or PI target
    pub name_id: u32,
    pub prefix_id: u32,
    pub local_id: u32,
    /// Resolved namespace URI, or 0
    pub namespace_id: u32,
    /// Attribute value, character data, comment text or PI data
    pub value_id: u32,
    /// First attribute node (elements only)
    pub attr_start: NodeId,
    pub attr_count: u16,
    /// Namespace declarations made on this element
    pub ns_start: u32,
    pub ns_count: u16,
    /// Depth in document tree (document node is 0)
    pub depth: u16,
    /// Element was written as `<name/>`
    pub empty: bool,
}

impl XmlNode {
    pub fn new(kind: NodeKind, parent: Option<NodeId>, depth: u16) -> Self {
        XmlNode {
            kind,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            prefix_id: 0,
            local_id: 0,
            namespace_id: 0,
            value_id: 0,
            attr_start: 0,
            attr_count: 0,
            ns_start: 0,
            ns_count: 0,
            depth,
            empty: false,
        }
    }

    /// Create a new document root node
    pub fn document() -> Self {
        Self::new(NodeKind::Document, None, 0)
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Text or CDATA
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData)
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    #[inline]
    pub fn has_attributes(&self) -> bool {
        self.attr_count > 0
    }
}

/// A namespace declaration (`xmlns` or `xmlns:prefix`) on an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Declared prefix, 0 for the default namespace
    pub prefix_id: u32,
    /// Namespace URI, 0 when the declaration undeclares the default
    pub uri_id: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let doc = XmlNode::document();
        assert_eq!(doc.kind, NodeKind::Document);
        assert!(doc.parent.is_none());
        assert_eq!(doc.depth, 0);
    }

    #[test]
    fn test_element_node() {
        let elem = XmlNode::new(NodeKind::Element, Some(0), 1);
        assert!(elem.is_element());
        assert_eq!(elem.parent, Some(0));
        assert!(!elem.has_children());
        assert!(!elem.has_attributes());
    }
}
