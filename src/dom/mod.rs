//! DOM Module - Arena-based XML Document
//!
//! Implements an efficient DOM representation using:
//! - Arena allocation for nodes
//! - NodeId (u32) indices in document order
//! - String interning for names, values and namespace URIs
//! - Namespace resolution stack during construction
//! - An id map for `id()` lookups

pub mod document;
pub mod namespace;
pub mod node;
pub mod strings;

pub use document::XmlDocument;
pub use namespace::ns;
pub use node::{NamespaceDecl, NodeId, NodeKind, XmlNode};
pub use strings::StringPool;

use crate::core::uri::resolve_uri;

/// Read access to an arena document
///
/// The XPath engine and the navigators only go through this trait. The
/// required methods expose raw storage; everything else is derived.
pub trait DocumentAccess {
    fn get_node(&self, id: NodeId) -> Option<&XmlNode>;

    fn strings(&self) -> &StringPool;

    /// Root element (not the document node)
    fn root_element_id(&self) -> Option<NodeId>;

    /// Namespace declarations made on an element
    fn namespace_decls(&self, id: NodeId) -> &[NamespaceDecl];

    /// Element carrying the given ID value
    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Base URI of the document entity
    fn document_base_uri(&self) -> Option<&str>;

    fn node_count(&self) -> usize;

    fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    /// Qualified name of an element, attribute or PI target
    fn node_name(&self, id: NodeId) -> &str {
        self.get_node(id).map_or("", |n| self.strings().get_str(n.name_id))
    }

    fn node_local_name(&self, id: NodeId) -> &str {
        self.get_node(id).map_or("", |n| self.strings().get_str(n.local_id))
    }

    fn node_prefix(&self, id: NodeId) -> &str {
        self.get_node(id).map_or("", |n| self.strings().get_str(n.prefix_id))
    }

    fn node_namespace(&self, id: NodeId) -> &str {
        self.get_node(id).map_or("", |n| self.strings().get_str(n.namespace_id))
    }

    /// Own value of an attribute, text, comment or PI node
    fn node_value(&self, id: NodeId) -> &str {
        self.get_node(id).map_or("", |n| self.strings().get_str(n.value_id))
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.parent
    }

    fn children(&self, id: NodeId) -> Children<'_, Self>
    where
        Self: Sized,
    {
        Children {
            doc: self,
            next: self.get_node(id).and_then(|n| n.first_child),
        }
    }

    /// Descendants in document order (attributes excluded)
    fn descendants(&self, id: NodeId) -> Descendants<'_, Self>
    where
        Self: Sized,
    {
        let mut stack = Vec::new();
        push_children_reversed(self, id, &mut stack);
        Descendants { doc: self, stack }
    }

    /// Attribute node ids of an element
    fn attributes(&self, id: NodeId) -> std::ops::Range<NodeId> {
        match self.get_node(id) {
            Some(n) if n.is_element() => n.attr_start..n.attr_start + n.attr_count as NodeId,
            _ => 0..0,
        }
    }

    /// Attribute value by qualified name
    fn attribute_value(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .find(|&a| self.node_name(a) == name)
            .map(|a| self.node_value(a))
    }

    /// XPath string-value
    fn string_value(&self, id: NodeId) -> String
    where
        Self: Sized,
    {
        match self.kind(id) {
            Some(NodeKind::Document | NodeKind::Element) => {
                let mut out = String::new();
                for d in self.descendants(id) {
                    if self.get_node(d).map_or(false, |n| n.is_text()) {
                        out.push_str(self.node_value(d));
                    }
                }
                out
            }
            Some(_) => self.node_value(id).to_string(),
            None => String::new(),
        }
    }

    /// Namespace URI bound to `prefix` at an element ("" = default)
    fn lookup_namespace(&self, element: NodeId, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(ns::XML);
        }
        let mut current = Some(element);
        while let Some(id) = current {
            for decl in self.namespace_decls(id) {
                if self.strings().get_str(decl.prefix_id) == prefix {
                    let uri = self.strings().get_str(decl.uri_id);
                    return (!uri.is_empty()).then_some(uri);
                }
            }
            current = self.parent(id);
        }
        None
    }

    /// Bindings in scope at an element, nearest declaration first, without
    /// the implicit `xml` binding. Undeclared defaults are omitted.
    fn in_scope_namespaces(&self, element: NodeId) -> Vec<(&str, &str)> {
        let mut seen: Vec<&str> = Vec::new();
        let mut out = Vec::new();
        let mut current = Some(element);
        while let Some(id) = current {
            for decl in self.namespace_decls(id) {
                let prefix = self.strings().get_str(decl.prefix_id);
                if seen.contains(&prefix) {
                    continue;
                }
                seen.push(prefix);
                let uri = self.strings().get_str(decl.uri_id);
                if !uri.is_empty() {
                    out.push((prefix, uri));
                }
            }
            current = self.parent(id);
        }
        out
    }

    /// Effective base URI of a node, applying `xml:base` on the node (when
    /// an element) and its ancestors over the document base URI
    fn node_base_uri(&self, id: NodeId) -> Option<String> {
        let mut bases = Vec::new();
        let mut current = match self.kind(id) {
            Some(NodeKind::Element) => Some(id),
            _ => self.parent(id),
        };
        while let Some(node) = current {
            if let Some(base) = self.attribute_value(node, "xml:base") {
                bases.push(base);
            }
            current = self.parent(node);
        }

        let mut effective = self.document_base_uri().map(str::to_string);
        for base in bases.into_iter().rev() {
            effective = Some(resolve_uri(effective.as_deref(), base));
        }
        effective
    }
}

fn push_children_reversed<D: DocumentAccess + ?Sized>(doc: &D, id: NodeId, stack: &mut Vec<NodeId>) {
    let mut child = doc.get_node(id).and_then(|n| n.last_child);
    while let Some(c) = child {
        stack.push(c);
        child = doc.get_node(c).and_then(|n| n.prev_sibling);
    }
}

/// Iterator over child nodes
pub struct Children<'a, D> {
    doc: &'a D,
    next: Option<NodeId>,
}

impl<'a, D: DocumentAccess> Iterator for Children<'a, D> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over descendant nodes in document order
pub struct Descendants<'a, D> {
    doc: &'a D,
    stack: Vec<NodeId>,
}

impl<'a, D: DocumentAccess> Iterator for Descendants<'a, D> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        push_children_reversed(self.doc, current, &mut self.stack);
        Some(current)
    }
}
