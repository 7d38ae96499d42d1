//! XML Document - Arena-based DOM representation
//!
//! The document owns its nodes, namespace declarations and interned
//! strings, so it can be shared behind an `Arc` and navigated from any
//! thread once built.

use super::namespace::{ns, NamespaceResolver};
use super::node::{NamespaceDecl, NodeId, NodeKind, XmlNode};
use super::strings::StringPool;
use super::DocumentAccess;
use crate::config::ParseOptions;
use crate::core::attributes::Attribute;
use crate::core::dtd::DtdDeclarations;
use crate::error::XmlError;
use crate::reader::events::{StartElement, XmlEvent};
use crate::reader::slice::SliceReader;
use std::borrow::Cow;
use std::collections::HashMap;

/// Deepest element nesting; node depths are stored as `u16`
const MAX_DEPTH: usize = u16::MAX as usize - 1;

/// An XML document stored in arena format
#[derive(Debug)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
    namespaces: Vec<NamespaceDecl>,
    strings: StringPool,
    root_element: Option<NodeId>,
    /// ID value -> element; first occurrence wins
    ids: HashMap<String, NodeId>,
    base_uri: Option<String>,
}

impl XmlDocument {
    /// Parse an XML document from a byte slice (lenient mode)
    pub fn parse(input: &[u8]) -> Self {
        Self::parse_with(input, &ParseOptions::default())
            .unwrap_or_else(|_| Self::empty(None))
    }

    /// Parse an XML document in strict mode
    /// Returns Err if the document is not well-formed
    pub fn parse_strict(input: &[u8]) -> Result<Self, XmlError> {
        Self::parse_with(input, &ParseOptions::strict())
    }

    /// Parse with explicit options
    pub fn parse_with(input: &[u8], options: &ParseOptions) -> Result<Self, XmlError> {
        let mut builder = Builder::new(options);
        builder.build(input)?;
        Ok(builder.doc)
    }

    fn empty(base_uri: Option<String>) -> Self {
        XmlDocument {
            nodes: vec![XmlNode::document()],
            namespaces: Vec::new(),
            strings: StringPool::new(),
            root_element: None,
            ids: HashMap::new(),
            base_uri,
        }
    }

    /// Base URI of the document entity
    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    /// Get root element name
    pub fn root_name(&self) -> Option<&str> {
        self.root_element.map(|id| self.node_name(id))
    }

    fn link_child(&mut self, parent: NodeId, child: NodeId) {
        let prev = self.nodes[parent as usize].last_child;
        if let Some(prev) = prev {
            self.nodes[prev as usize].next_sibling = Some(child);
            self.nodes[child as usize].prev_sibling = Some(prev);
        } else {
            self.nodes[parent as usize].first_child = Some(child);
        }
        self.nodes[parent as usize].last_child = Some(child);
    }

    fn push_node(&mut self, node: XmlNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }
}

impl DocumentAccess for XmlDocument {
    #[inline]
    fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    fn strings(&self) -> &StringPool {
        &self.strings
    }

    fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    fn namespace_decls(&self, id: NodeId) -> &[NamespaceDecl] {
        match self.get_node(id) {
            Some(n) if n.ns_count > 0 => {
                let start = n.ns_start as usize;
                self.namespaces
                    .get(start..start + n.ns_count as usize)
                    .unwrap_or(&[])
            }
            _ => &[],
        }
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    fn document_base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Builds an [`XmlDocument`] from slice reader events
struct Builder<'o> {
    doc: XmlDocument,
    options: &'o ParseOptions,
    /// Open nodes, document node at the bottom
    stack: Vec<NodeId>,
    resolver: NamespaceResolver,
    dtd: DtdDeclarations,
}

impl<'o> Builder<'o> {
    fn new(options: &'o ParseOptions) -> Self {
        let mut doc = XmlDocument::empty(options.base_uri.clone());
        let resolver = NamespaceResolver::new(&mut doc.strings);
        Builder {
            doc,
            options,
            stack: vec![0],
            resolver,
            dtd: DtdDeclarations::new(),
        }
    }

    fn strict(&self) -> bool {
        self.options.strict
    }

    fn build(&mut self, input: &[u8]) -> Result<(), XmlError> {
        let mut reader = if self.strict() {
            SliceReader::new_strict(input)
        } else {
            SliceReader::new(input)
        };

        while let Some(event) = reader.next_event() {
            let position = reader.position();
            match event {
                XmlEvent::StartElement(elem) => self.open_element(elem, false, position)?,
                XmlEvent::EmptyElement(elem) => self.open_element(elem, true, position)?,
                XmlEvent::EndElement(end) => self.close_element(end.name.as_ref(), position)?,
                XmlEvent::Text(content) => {
                    self.add_character_data(NodeKind::Text, content.as_ref(), position)?
                }
                XmlEvent::CData(content) => {
                    self.add_character_data(NodeKind::CData, content.as_ref(), position)?
                }
                XmlEvent::Comment(content) => {
                    let value_id = self.doc.strings.intern_bytes(content.as_ref());
                    let node = self.new_child(NodeKind::Comment);
                    self.append(XmlNode { value_id, ..node });
                }
                XmlEvent::ProcessingInstruction { target, data } => {
                    let name_id = self.doc.strings.intern_bytes(target.as_ref());
                    let value_id = data.map_or(0, |d| self.doc.strings.intern_bytes(d.as_ref()));
                    let node = self.new_child(NodeKind::ProcessingInstruction);
                    self.append(XmlNode {
                        name_id,
                        local_id: name_id,
                        value_id,
                        ..node
                    });
                }
                XmlEvent::DocType(content) => {
                    if self.strict() && self.doc.root_element.is_some() {
                        return Err(XmlError::new("DOCTYPE must come before root element", position));
                    }
                    self.dtd = DtdDeclarations::parse(content.as_ref());
                }
                XmlEvent::XmlDeclaration { .. } => {}
                XmlEvent::EndDocument => break,
            }
        }

        if self.strict() {
            if let Some(err) = reader.error() {
                return Err(err.clone());
            }
            if self.stack.len() > 1 {
                let unclosed = self.doc.node_name(self.stack[1]).to_string();
                return Err(XmlError::new(format!("Unclosed tag: <{}>", unclosed), input.len()));
            }
            if self.doc.root_element.is_none() {
                return Err(XmlError::new("Document has no root element", input.len()));
            }
        }
        Ok(())
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(0)
    }

    fn new_child(&self, kind: NodeKind) -> XmlNode {
        XmlNode::new(kind, Some(self.current()), self.stack.len() as u16)
    }

    fn append(&mut self, node: XmlNode) -> NodeId {
        let parent = self.current();
        let id = self.doc.push_node(node);
        self.doc.link_child(parent, id);
        id
    }

    fn open_element(&mut self, elem: StartElement<'_>, empty: bool, position: usize) -> Result<(), XmlError> {
        if self.stack.len() > MAX_DEPTH {
            return Err(XmlError::new("Element nesting exceeds maximum depth", position));
        }
        let at_top = self.stack.len() == 1;
        if at_top && self.strict() && self.doc.root_element.is_some() {
            return Err(XmlError::new("Document has multiple root elements", position));
        }

        let mut attributes = elem.attributes;
        for (name, value) in self.dtd.defaults(elem.name.as_ref()) {
            if !attributes.iter().any(|a| a.name.as_ref() == name) {
                attributes.push(Attribute::new(
                    Cow::Owned(name.to_vec()),
                    Cow::Owned(value.to_vec()),
                ));
            }
        }

        self.resolver.push_scope();
        let ns_start = self.doc.namespaces.len() as u32;
        for attr in attributes.iter().filter(|a| a.is_namespace_declaration()) {
            self.declare_namespace(attr, position)?;
        }
        let ns_count = u16::try_from(self.doc.namespaces.len() - ns_start as usize)
            .map_err(|_| XmlError::new("Too many namespace declarations on one element", position))?;

        let depth = self.stack.len() as u16;
        let (name_id, prefix_id, local_id) = self.intern_qname(elem.name.as_ref());
        let namespace_id = self.resolve_prefix(prefix_id, true, position)?;
        let element = XmlNode {
            name_id,
            prefix_id,
            local_id,
            namespace_id,
            ns_start,
            ns_count,
            empty,
            ..self.new_child(NodeKind::Element)
        };
        let element_id = self.append(element);

        let attr_start = element_id + 1;
        let mut attr_count = 0u16;
        for attr in attributes.iter().filter(|a| !a.is_namespace_declaration()) {
            let (name_id, prefix_id, local_id) = self.intern_qname(attr.name.as_ref());
            let namespace_id = self.resolve_prefix(prefix_id, false, position)?;
            let value_id = self.doc.strings.intern_bytes(attr.value.as_ref());
            self.doc.push_node(XmlNode {
                name_id,
                prefix_id,
                local_id,
                namespace_id,
                value_id,
                ..XmlNode::new(NodeKind::Attribute, Some(element_id), depth + 1)
            });
            attr_count = attr_count
                .checked_add(1)
                .ok_or_else(|| XmlError::new("Too many attributes on one element", position))?;
        }
        let node = &mut self.doc.nodes[element_id as usize];
        node.attr_start = attr_start;
        node.attr_count = attr_count;

        self.register_ids(element_id);

        if at_top && self.doc.root_element.is_none() {
            self.doc.root_element = Some(element_id);
        }
        if empty {
            self.resolver.pop_scope();
        } else {
            self.stack.push(element_id);
        }
        Ok(())
    }

    fn declare_namespace(&mut self, attr: &Attribute<'_>, position: usize) -> Result<(), XmlError> {
        let prefix: &[u8] = if attr.name.as_ref() == b"xmlns" { b"" } else { attr.local_name() };
        let uri = String::from_utf8_lossy(attr.value.as_ref());

        if prefix == b"xml" || prefix == b"xmlns" {
            if self.strict() && (prefix == b"xmlns" || uri != ns::XML) {
                return Err(XmlError::new("Reserved namespace prefix cannot be rebound", position));
            }
            return Ok(());
        }
        if self.strict() && !prefix.is_empty() && uri.is_empty() {
            return Err(XmlError::new("Namespace prefix cannot be undeclared", position));
        }

        let prefix_id = self.doc.strings.intern_bytes(prefix);
        let uri_id = self.doc.strings.intern(&uri);
        if self.resolver.declare(prefix_id, uri_id) {
            self.doc.namespaces.push(NamespaceDecl { prefix_id, uri_id });
        }
        Ok(())
    }

    fn intern_qname(&mut self, name: &[u8]) -> (u32, u32, u32) {
        let name_id = self.doc.strings.intern_bytes(name);
        match memchr::memchr(b':', name) {
            Some(pos) => (
                name_id,
                self.doc.strings.intern_bytes(&name[..pos]),
                self.doc.strings.intern_bytes(&name[pos + 1..]),
            ),
            None => (name_id, 0, name_id),
        }
    }

    /// Unprefixed attributes have no namespace; unprefixed elements take
    /// the default namespace
    fn resolve_prefix(&self, prefix_id: u32, element: bool, position: usize) -> Result<u32, XmlError> {
        if prefix_id == 0 && !element {
            return Ok(0);
        }
        match self.resolver.resolve(prefix_id) {
            Some(uri) => Ok(uri),
            None if self.strict() => Err(XmlError::new(
                format!("Unbound namespace prefix: {}", self.doc.strings.get_str(prefix_id)),
                position,
            )),
            None => Ok(0),
        }
    }

    /// `xml:id`, then a DTD-declared ID attribute, then (when enabled and
    /// neither applies) a plain `id` attribute
    fn register_ids(&mut self, element: NodeId) {
        let mut values: Vec<String> = Vec::new();
        if let Some(v) = self.doc.attribute_value(element, "xml:id") {
            values.push(v.trim().to_string());
        }
        let declared = self
            .dtd
            .id_attribute(self.doc.node_name(element).as_bytes())
            .map(|a| String::from_utf8_lossy(a).into_owned());
        if let Some(attr) = &declared {
            if let Some(v) = self.doc.attribute_value(element, attr) {
                values.push(v.trim().to_string());
            }
        }
        if values.is_empty() && declared.is_none() && self.options.id_attribute_fallback {
            if let Some(v) = self.doc.attribute_value(element, "id") {
                values.push(v.trim().to_string());
            }
        }
        for value in values.into_iter().filter(|v| !v.is_empty()) {
            self.doc.ids.entry(value).or_insert(element);
        }
    }

    fn close_element(&mut self, name: &[u8], position: usize) -> Result<(), XmlError> {
        let name = String::from_utf8_lossy(name);
        if self.stack.len() == 1 {
            if self.strict() {
                return Err(XmlError::new(
                    format!("Unexpected end tag: </{}> without matching start tag", name),
                    position,
                ));
            }
            return Ok(());
        }

        let top = self.current();
        if self.doc.node_name(top) == name {
            self.pop();
            return Ok(());
        }
        if self.strict() {
            return Err(XmlError::new(
                format!("Tag mismatch: <{}> closed with </{}>", self.doc.node_name(top), name),
                position,
            ));
        }

        // Lenient: close up to the nearest matching open element, if any
        if let Some(depth) = self.stack[1..]
            .iter()
            .rposition(|&id| self.doc.node_name(id) == name)
        {
            while self.stack.len() > depth + 1 {
                self.pop();
            }
        }
        Ok(())
    }

    fn pop(&mut self) {
        self.stack.pop();
        self.resolver.pop_scope();
    }

    fn add_character_data(&mut self, kind: NodeKind, content: &[u8], position: usize) -> Result<(), XmlError> {
        if self.stack.len() == 1 {
            let blank = content.iter().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
            if self.strict() && (!blank || kind == NodeKind::CData) {
                return Err(XmlError::new("Character data not allowed at document level", position));
            }
            return Ok(());
        }

        let parent = self.current();
        if kind == NodeKind::Text {
            if let Some(last) = self.doc.nodes[parent as usize].last_child {
                if self.doc.nodes[last as usize].kind == NodeKind::Text {
                    let merged = format!(
                        "{}{}",
                        self.doc.node_value(last),
                        String::from_utf8_lossy(content)
                    );
                    self.doc.nodes[last as usize].value_id = self.doc.strings.intern(&merged);
                    return Ok(());
                }
            }
        }

        let value_id = self.doc.strings.intern_bytes(content);
        let node = self.new_child(kind);
        self.append(XmlNode { value_id, ..node });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn children_named(doc: &XmlDocument, id: NodeId) -> Vec<String> {
        doc.children(id)
            .filter(|&c| doc.kind(c) == Some(NodeKind::Element))
            .map(|c| doc.node_name(c).to_string())
            .collect()
    }

    #[test]
    fn test_parse_simple() {
        let doc = XmlDocument::parse(b"<root><a>1</a><b/></root>");
        assert_eq!(doc.root_name(), Some("root"));
        let root = doc.root_element_id().unwrap();
        assert_eq!(children_named(&doc, root), vec!["a", "b"]);
        assert_eq!(doc.string_value(root), "1");
    }

    #[test]
    fn test_attributes_follow_element() {
        let doc = XmlDocument::parse(b"<r x=\"1\" y=\"2\"><c/></r>");
        let root = doc.root_element_id().unwrap();
        let attrs: Vec<_> = doc.attributes(root).collect();
        assert_eq!(attrs, vec![root + 1, root + 2]);
        assert_eq!(doc.node_value(root + 2), "2");
        let child = doc.children(root).next().unwrap();
        assert!(child > root + 2);
    }

    #[test]
    fn test_ids() {
        let input = b"<!DOCTYPE doc [<!ATTLIST sec key ID #IMPLIED>]>\
            <doc><p xml:id=\"x1\"/><sec key=\"s1\" id=\"ignored\"/><q id=\"q1\"/><q id=\"q1\"/></doc>";
        let doc = XmlDocument::parse(input);
        assert_eq!(doc.element_by_id("x1").map(|id| doc.node_name(id)), Some("p"));
        assert_eq!(doc.element_by_id("s1").map(|id| doc.node_name(id)), Some("sec"));
        assert_eq!(doc.element_by_id("ignored"), None);
        let root = doc.root_element_id().unwrap();
        let qs: Vec<_> = doc.children(root).filter(|&c| doc.node_name(c) == "q").collect();
        assert_eq!(doc.element_by_id("q1"), Some(qs[0]));
    }

    #[test]
    fn test_id_fallback_disabled() {
        let options = ParseOptions {
            id_attribute_fallback: false,
            ..ParseOptions::default()
        };
        let doc = XmlDocument::parse_with(b"<r><a id=\"one\"/></r>", &options).unwrap();
        assert_eq!(doc.element_by_id("one"), None);
    }

    #[test]
    fn test_namespaces() {
        let doc = XmlDocument::parse(b"<r xmlns=\"urn:d\" xmlns:ex=\"urn:ex\"><ex:a ex:k=\"v\" k=\"w\"/></r>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.node_namespace(root), "urn:d");
        let a = doc.children(root).next().unwrap();
        assert_eq!(doc.node_namespace(a), "urn:ex");
        assert_eq!(doc.node_local_name(a), "a");
        let attrs: Vec<_> = doc.attributes(a).collect();
        assert_eq!(doc.node_namespace(attrs[0]), "urn:ex");
        assert_eq!(doc.node_namespace(attrs[1]), "");
        assert_eq!(doc.in_scope_namespaces(a).len(), 2);
        assert_eq!(doc.lookup_namespace(a, "ex"), Some("urn:ex"));
    }

    #[test]
    fn test_dtd_default_attribute() {
        let doc = XmlDocument::parse(b"<!DOCTYPE r [<!ATTLIST r lang CDATA 'en'>]><r/>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.attribute_value(root, "lang"), Some("en"));
    }

    #[test]
    fn test_strict_errors() {
        let err = XmlDocument::parse_strict(b"<a><b></a>").unwrap_err();
        assert!(err.message.starts_with("Tag mismatch"));
        assert!(XmlDocument::parse_strict(b"<a/><b/>").is_err());
        assert!(XmlDocument::parse_strict(b"<a>").is_err());
        assert!(XmlDocument::parse_strict(b"<p:a/>").is_err());
        assert!(XmlDocument::parse_strict(b"<a xmlns:p=\"urn:p\"><p:b/></a>").is_ok());
    }

    #[test]
    fn test_nesting_limit_is_an_error() {
        let nested = |levels: usize| format!("{}{}", "<a>".repeat(levels), "</a>".repeat(levels));
        let err = XmlDocument::parse_strict(nested(MAX_DEPTH + 1).as_bytes()).unwrap_err();
        assert_eq!(err.message, "Element nesting exceeds maximum depth");
        assert!(XmlDocument::parse(nested(MAX_DEPTH + 1).as_bytes()).root_element_id().is_none());

        let doc = XmlDocument::parse_strict(nested(MAX_DEPTH).as_bytes()).unwrap();
        assert!(doc.root_element_id().is_some());
    }

    #[test]
    fn test_lenient_recovers_mismatch() {
        let doc = XmlDocument::parse(b"<a><b><c></b><d/></a>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(children_named(&doc, root), vec!["b", "d"]);
    }

    #[test]
    fn test_node_base_uri() {
        let options = ParseOptions::default().with_base_uri("http://example.com/root/doc.xml");
        let doc = XmlDocument::parse_with(
            b"<r xml:base=\"sub/\"><c xml:base=\"inner/\"><leaf/></c></r>",
            &options,
        )
        .unwrap();
        let root = doc.root_element_id().unwrap();
        let c = doc.children(root).next().unwrap();
        let leaf = doc.children(c).next().unwrap();
        assert_eq!(
            doc.node_base_uri(leaf).as_deref(),
            Some("http://example.com/root/sub/inner/")
        );
        assert_eq!(doc.node_base_uri(root).as_deref(), Some("http://example.com/root/sub/"));
    }

    #[test]
    fn test_adjacent_text_merged() {
        let doc = XmlDocument::parse(b"<r>a < b</r>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.children(root).count(), 1);
        assert_eq!(doc.string_value(root), "a < b");
    }
}
