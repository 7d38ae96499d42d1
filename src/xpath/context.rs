//! Dynamic evaluation context
//!
//! Carries what a compiled expression leaves symbolic: namespace prefix
//! bindings and variable values. `xml` is always bound. Bindings added later
//! shadow earlier ones for the same prefix, matching how successive
//! `xmlns()` parts of a pointer accumulate.

use crate::dom::{ns, NodeId};
use crate::navigator::{DocumentNavigator, NodeIterator};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Static type of a bound variable or function result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XPathResultType {
    String,
    Boolean,
    Number,
    Navigator,
    NodeSet,
    Any,
}

/// Value bound to an XPath variable
#[derive(Debug, Clone)]
pub enum VariableValue {
    String(String),
    Boolean(bool),
    Number(f64),
    /// A single node; must belong to the evaluated document
    Navigator(DocumentNavigator),
    /// Node ids in the evaluated document
    NodeSet(Vec<NodeId>),
    /// Value of no XPath type, exposed through its text
    Any(String),
}

impl VariableValue {
    /// Bind an arbitrary displayable value: numeric text becomes a number,
    /// anything else stays untyped
    pub fn from_display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        let text = value.to_string();
        match text.trim().parse::<f64>() {
            Ok(n) => VariableValue::Number(n),
            Err(_) => VariableValue::Any(text),
        }
    }

    pub fn result_type(&self) -> XPathResultType {
        match self {
            VariableValue::String(_) => XPathResultType::String,
            VariableValue::Boolean(_) => XPathResultType::Boolean,
            VariableValue::Number(_) => XPathResultType::Number,
            VariableValue::Navigator(_) => XPathResultType::Navigator,
            VariableValue::NodeSet(_) => XPathResultType::NodeSet,
            VariableValue::Any(_) => XPathResultType::Any,
        }
    }
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        VariableValue::String(s.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(s: String) -> Self {
        VariableValue::String(s)
    }
}

impl From<bool> for VariableValue {
    fn from(b: bool) -> Self {
        VariableValue::Boolean(b)
    }
}

macro_rules! numeric_variable {
    ($($t:ty),*) => {
        $(impl From<$t> for VariableValue {
            fn from(n: $t) -> Self {
                VariableValue::Number(n as f64)
            }
        })*
    };
}

numeric_variable!(f64, f32, i32, i64, u32, u64, usize);

impl From<DocumentNavigator> for VariableValue {
    fn from(nav: DocumentNavigator) -> Self {
        VariableValue::Navigator(nav)
    }
}

impl From<&NodeIterator> for VariableValue {
    fn from(iter: &NodeIterator) -> Self {
        VariableValue::NodeSet(iter.node_ids().to_vec())
    }
}

impl From<Vec<NodeId>> for VariableValue {
    fn from(nodes: Vec<NodeId>) -> Self {
        VariableValue::NodeSet(nodes)
    }
}

/// Namespace and variable bindings for one evaluation
#[derive(Debug, Clone, Default)]
pub struct DynamicContext {
    /// Explicit bindings in declaration order
    namespaces: Vec<(String, String)>,
    variables: HashMap<String, VariableValue>,
}

impl DynamicContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context seeded with an ambient namespace scope
    pub fn with_namespaces<I, P, U>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        let mut ctx = Self::new();
        for (prefix, uri) in bindings {
            ctx.add_namespace(prefix, uri);
        }
        ctx
    }

    /// Bind a prefix; the reserved `xml` and `xmlns` prefixes cannot be
    /// rebound and are ignored
    pub fn add_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        let uri = uri.into();
        if prefix == "xml" || prefix == "xmlns" {
            warn!(prefix = %prefix, uri = %uri, "ignoring binding of reserved namespace prefix");
            return;
        }
        self.namespaces.push((prefix, uri));
    }

    /// URI bound to `prefix`, most recent binding first
    pub fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(ns::XML);
        }
        self.namespaces
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Explicit bindings in declaration order
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &str)> {
        self.namespaces.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<VariableValue>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn variable(&self, name: &str) -> Option<&VariableValue> {
        self.variables.get(name)
    }

    /// Result type of an extension function. None are registered, so this
    /// always reports "not found".
    pub fn resolve_function(&self, _name: &str, _arity: usize) -> Option<XPathResultType> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_binding_wins() {
        let mut ctx = DynamicContext::with_namespaces([("ex", "urn:one")]);
        assert_eq!(ctx.lookup_namespace("ex"), Some("urn:one"));
        ctx.add_namespace("ex", "urn:two");
        assert_eq!(ctx.lookup_namespace("ex"), Some("urn:two"));
        assert_eq!(ctx.lookup_namespace("other"), None);
    }

    #[test]
    fn test_xml_prefix_is_fixed() {
        let mut ctx = DynamicContext::new();
        assert_eq!(ctx.lookup_namespace("xml"), Some(ns::XML));
        ctx.add_namespace("xml", "urn:evil");
        ctx.add_namespace("xmlns", "urn:evil");
        assert_eq!(ctx.lookup_namespace("xml"), Some(ns::XML));
        assert_eq!(ctx.namespaces().count(), 0);
    }

    #[test]
    fn test_variable_type_inference() {
        assert_eq!(VariableValue::from("s").result_type(), XPathResultType::String);
        assert_eq!(VariableValue::from(true).result_type(), XPathResultType::Boolean);
        assert_eq!(VariableValue::from(3u32).result_type(), XPathResultType::Number);
        assert_eq!(VariableValue::from(vec![1, 2]).result_type(), XPathResultType::NodeSet);
        assert_eq!(VariableValue::from_display(&" 12 ").result_type(), XPathResultType::Number);
        assert_eq!(VariableValue::from_display(&'x').result_type(), XPathResultType::Any);
    }

    #[test]
    fn test_no_extension_functions() {
        assert_eq!(DynamicContext::new().resolve_function("ex:f", 0), None);
    }
}
