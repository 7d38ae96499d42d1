//! XPointer Framework
//!
//! Pointer text is lexed, parsed into a [`PointerKind`] and evaluated part by
//! part against a [`DocumentNavigator`]:
//!
//! - a shorthand pointer (`chapter1`) selects the element with that ID
//! - a scheme-based pointer (`xmlns(ex=urn:ex)xpointer(//ex:a)`) yields the
//!   result of its first part that selects anything
//!
//! Recognised schemes are `element()`, `xmlns()`, `xpath1()` and
//! `xpointer()`. Any other scheme, including every prefixed one, is skipped.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod schemes;

pub use ast::{PointerKind, PointerPart};
pub use schemes::PartOutcome;

use crate::error::PointerError;
use crate::navigator::{DocumentNavigator, NodeIterator};
use crate::xpath::{self, DynamicContext};
use schemes::evaluate_part;
use tracing::{debug, trace};

/// A compiled XPointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
    text: String,
    kind: PointerKind,
}

impl Pointer {
    /// Parse pointer text. Parsing is deterministic and has no side effects.
    pub fn compile(text: &str) -> Result<Pointer, PointerError> {
        let kind = parser::Parser::new(text).parse()?;
        trace!(pointer = text, kind = ?kind, "compiled XPointer");
        Ok(Pointer {
            text: text.to_string(),
            kind,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> &PointerKind {
        &self.kind
    }

    pub fn is_shorthand(&self) -> bool {
        matches!(self.kind, PointerKind::Shorthand { .. })
    }

    /// Scheme parts in evaluation order; empty for a shorthand pointer
    pub fn parts(&self) -> &[PointerPart] {
        match &self.kind {
            PointerKind::SchemeBased { parts } => parts,
            PointerKind::Shorthand { .. } => &[],
        }
    }

    /// Nodes identified in `nav`'s document, positioned on the first one
    pub fn evaluate(&self, nav: &DocumentNavigator) -> Result<NodeIterator, PointerError> {
        self.evaluate_with(nav, DynamicContext::new())
    }

    /// Evaluate with `env` as the starting namespace and variable context.
    /// `xmlns()` parts add to it in order.
    pub fn evaluate_with(&self, nav: &DocumentNavigator, mut env: DynamicContext) -> Result<NodeIterator, PointerError> {
        let base_uri = || nav.document().base_uri().map(str::to_string);

        match &self.kind {
            PointerKind::Shorthand { name } => {
                let mut nodes = xpath::select(nav, &format!("id('{}')", name), Some(&env))
                    .map_err(|_| PointerError::no_subresources(name, base_uri()))?;
                if nodes.move_next() {
                    Ok(nodes)
                } else {
                    debug!(pointer = %self.text, "shorthand pointer matched no element");
                    Err(PointerError::no_subresources(name, base_uri()))
                }
            }
            PointerKind::SchemeBased { parts } => {
                for part in parts {
                    if let PartOutcome::Match(nodes) = evaluate_part(part, nav, &mut env) {
                        return Ok(nodes);
                    }
                }
                debug!(pointer = %self.text, "no pointer part matched");
                Err(PointerError::no_subresources(&self.text, base_uri()))
            }
        }
    }
}

impl std::str::FromStr for Pointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pointer::compile(s)
    }
}

impl std::fmt::Display for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Compile `pointer` and evaluate it against `nav`
pub fn resolve(nav: &DocumentNavigator, pointer: &str) -> Result<NodeIterator, PointerError> {
    Pointer::compile(pointer)?.evaluate(nav)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlDocument;
    use crate::navigator::XPathNavigator;
    use std::sync::Arc;

    const BOOK: &str = r#"<book xmlns:ex="http://example.com">
        <chapter xml:id="chap1"><title>One</title><para>First</para></chapter>
        <chapter xml:id="chap2"><title>Two</title><ex:foo>Namespaced</ex:foo></chapter>
    </book>"#;

    fn navigator(xml: &str) -> DocumentNavigator {
        DocumentNavigator::new(Arc::new(XmlDocument::parse(xml.as_bytes())))
    }

    fn first_value(nodes: &NodeIterator) -> String {
        nodes.current().map(|n| n.value()).unwrap_or_default()
    }

    #[test]
    fn test_compile_is_deterministic() {
        let text = "xmlns(ex=urn:x)xpointer(//ex:a)element(/1)";
        assert_eq!(Pointer::compile(text).unwrap(), Pointer::compile(text).unwrap());
        assert!(Pointer::compile("foo").unwrap().is_shorthand());
        assert!(!Pointer::compile("foo(bar)").unwrap().is_shorthand());
    }

    #[test]
    fn test_shorthand_selects_by_id() {
        let nav = navigator(BOOK);
        let nodes = resolve(&nav, "chap2").unwrap();
        assert_eq!(nodes.current().unwrap().name(), "chapter");
        assert_eq!(first_value(&nodes), "TwoNamespaced");
    }

    #[test]
    fn test_element_scheme() {
        let nav = navigator(BOOK);
        assert_eq!(first_value(&resolve(&nav, "element(/1/1/2)").unwrap()), "First");
        assert_eq!(first_value(&resolve(&nav, "element(chap2/1)").unwrap()), "Two");
    }

    #[test]
    fn test_xmlns_then_xpointer() {
        let nav = navigator(BOOK);
        let nodes = resolve(&nav, "xmlns(ex=http://example.com)xpointer(//ex:foo)").unwrap();
        assert_eq!(first_value(&nodes), "Namespaced");

        let err = resolve(&nav, "xpointer(//ex:foo)").unwrap_err();
        assert!(matches!(err, PointerError::NoSubresources { .. }));
    }

    #[test]
    fn test_first_non_empty_part_wins() {
        let nav = navigator(BOOK);
        let nodes = resolve(&nav, "element(missing) xpath1(//para) element(/1)").unwrap();
        assert_eq!(first_value(&nodes), "First");
    }

    #[test]
    fn test_no_subresources_names_pointer() {
        let nav = navigator(BOOK);
        match resolve(&nav, "missing").unwrap_err() {
            PointerError::NoSubresources { pointer, .. } => assert_eq!(pointer, "missing"),
            other => panic!("unexpected error {:?}", other),
        }
        match resolve(&nav, "element(missing)").unwrap_err() {
            PointerError::NoSubresources { pointer, .. } => assert!(pointer.contains("missing")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_syntax_errors_propagate() {
        let nav = navigator(BOOK);
        assert!(matches!(resolve(&nav, "element()"), Err(PointerError::Syntax { .. })));
    }
}
