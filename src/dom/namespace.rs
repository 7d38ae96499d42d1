//! Namespace Resolution
//!
//! Stack-based resolver used while building a document. Bindings are
//! interned ids; prefix id 0 is the default namespace and uri id 0 means
//! "no namespace" (an undeclared default).

use super::strings::StringPool;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

#[derive(Debug, Clone)]
struct NsBinding {
    prefix_id: u32,
    uri_id: u32,
    depth: u16,
}

/// Stack-based namespace resolver
#[derive(Debug)]
pub struct NamespaceResolver {
    bindings: Vec<NsBinding>,
    depth: u16,
    xml_prefix_id: u32,
    xmlns_prefix_id: u32,
}

impl NamespaceResolver {
    /// Create a resolver with `xml` pre-bound
    pub fn new(strings: &mut StringPool) -> Self {
        let xml_prefix_id = strings.intern("xml");
        let xmlns_prefix_id = strings.intern("xmlns");
        let xml_uri_id = strings.intern(ns::XML);

        NamespaceResolver {
            bindings: vec![NsBinding {
                prefix_id: xml_prefix_id,
                uri_id: xml_uri_id,
                depth: 0,
            }],
            depth: 0,
            xml_prefix_id,
            xmlns_prefix_id,
        }
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a binding for the current scope; returns false for the
    /// reserved `xml` and `xmlns` prefixes, which cannot be rebound
    pub fn declare(&mut self, prefix_id: u32, uri_id: u32) -> bool {
        if prefix_id == self.xml_prefix_id || prefix_id == self.xmlns_prefix_id {
            return false;
        }
        self.bindings.push(NsBinding {
            prefix_id,
            uri_id,
            depth: self.depth,
        });
        true
    }

    /// Resolve a prefix to a namespace URI id
    ///
    /// `None` means the prefix is unbound. The default namespace resolves
    /// to `Some(0)` when undeclared or never declared.
    pub fn resolve(&self, prefix_id: u32) -> Option<u32> {
        let found = self
            .bindings
            .iter()
            .rev()
            .find(|b| b.prefix_id == prefix_id)
            .map(|b| b.uri_id);
        match (found, prefix_id) {
            (None, 0) => Some(0),
            (Some(0), p) if p != 0 => None,
            (found, _) => found,
        }
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_prebound() {
        let mut strings = StringPool::new();
        let resolver = NamespaceResolver::new(&mut strings);

        let xml_id = strings.intern("xml");
        assert_eq!(resolver.resolve(xml_id).map(|id| strings.get_str(id)), Some(ns::XML));
    }

    #[test]
    fn test_shadow_and_pop() {
        let mut strings = StringPool::new();
        let mut resolver = NamespaceResolver::new(&mut strings);

        let prefix = strings.intern("ns");
        let uri1 = strings.intern("http://example.com/ns1");
        let uri2 = strings.intern("http://example.com/ns2");

        resolver.push_scope();
        resolver.declare(prefix, uri1);
        resolver.push_scope();
        resolver.declare(prefix, uri2);
        assert_eq!(resolver.resolve(prefix), Some(uri2));

        resolver.pop_scope();
        assert_eq!(resolver.resolve(prefix), Some(uri1));
        resolver.pop_scope();
        assert_eq!(resolver.resolve(prefix), None);
    }

    #[test]
    fn test_default_namespace() {
        let mut strings = StringPool::new();
        let mut resolver = NamespaceResolver::new(&mut strings);
        assert_eq!(resolver.resolve(0), Some(0));

        let uri = strings.intern("urn:d");
        resolver.push_scope();
        resolver.declare(0, uri);
        assert_eq!(resolver.resolve(0), Some(uri));
        resolver.push_scope();
        resolver.declare(0, 0);
        assert_eq!(resolver.resolve(0), Some(0));
    }

    #[test]
    fn test_reserved_prefix_rejected() {
        let mut strings = StringPool::new();
        let mut resolver = NamespaceResolver::new(&mut strings);
        let xml = strings.intern("xml");
        let other = strings.intern("urn:other");
        assert!(!resolver.declare(xml, other));
    }
}
