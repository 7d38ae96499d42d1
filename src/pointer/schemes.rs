//! Per-scheme evaluation
//!
//! Expression failures inside a part never surface: XPointer treats a part
//! that cannot be evaluated the same as one that selects nothing, and moves
//! on to the next part.

use super::ast::PointerPart;
use crate::navigator::{DocumentNavigator, NodeIterator};
use crate::xpath::{self, DynamicContext};
use tracing::debug;

/// Result of evaluating a single pointer part
#[derive(Debug)]
pub enum PartOutcome {
    /// Non-empty selection, already advanced to its first node
    Match(NodeIterator),
    NoMatch,
}

/// Evaluate `part` against `nav`. `xmlns()` parts bind into `env` for the
/// parts after them.
pub fn evaluate_part(part: &PointerPart, nav: &DocumentNavigator, env: &mut DynamicContext) -> PartOutcome {
    match part {
        PointerPart::Xmlns { prefix, uri } => {
            env.add_namespace(prefix.as_str(), uri.as_str());
            PartOutcome::NoMatch
        }
        PointerPart::Element { xpath } => select(part, xpath, nav, env),
        PointerPart::XPath1 { expr } | PointerPart::XPointer { expr } => select(part, expr, nav, env),
    }
}

/// Select through the expression cache so repeated pointers reuse compiled
/// forms
fn select(part: &PointerPart, expr: &str, nav: &DocumentNavigator, env: &DynamicContext) -> PartOutcome {
    let result = xpath::compile(expr).and_then(|handle| handle.select(nav, env));
    match result {
        Ok(mut nodes) => {
            if nodes.move_next() {
                debug!(scheme = part.scheme_name(), expr, count = nodes.count(), "pointer part matched");
                PartOutcome::Match(nodes)
            } else {
                debug!(scheme = part.scheme_name(), expr, "pointer part selected nothing");
                PartOutcome::NoMatch
            }
        }
        Err(error) => {
            debug!(scheme = part.scheme_name(), expr, %error, "pointer part failed");
            PartOutcome::NoMatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlDocument;
    use crate::navigator::XPathNavigator;
    use std::sync::Arc;

    fn navigator(xml: &str) -> DocumentNavigator {
        DocumentNavigator::new(Arc::new(XmlDocument::parse(xml.as_bytes())))
    }

    #[test]
    fn test_match_is_positioned_on_first_node() {
        let nav = navigator("<r><a>1</a><a>2</a></r>");
        let part = PointerPart::XPath1 { expr: "//a".to_string() };
        match evaluate_part(&part, &nav, &mut DynamicContext::new()) {
            PartOutcome::Match(nodes) => {
                assert_eq!(nodes.count(), 2);
                assert_eq!(nodes.current().map(|n| n.value()), Some("1".to_string()));
            }
            PartOutcome::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn test_xmlns_binds_for_later_parts() {
        let nav = navigator("<r xmlns:q=\"urn:q\"><q:foo/></r>");
        let mut env = DynamicContext::new();
        let bind = PointerPart::Xmlns {
            prefix: "ex".to_string(),
            uri: "urn:q".to_string(),
        };
        assert!(matches!(evaluate_part(&bind, &nav, &mut env), PartOutcome::NoMatch));
        assert_eq!(env.lookup_namespace("ex"), Some("urn:q"));

        let part = PointerPart::XPointer {
            expr: "//ex:foo".to_string(),
        };
        assert!(matches!(evaluate_part(&part, &nav, &mut env), PartOutcome::Match(_)));
    }

    #[test]
    fn test_failures_are_no_match() {
        let nav = navigator("<r/>");
        let mut env = DynamicContext::new();
        for expr in ["//ex:foo", "/r[", "count(/r)", "//missing"] {
            let part = PointerPart::XPath1 { expr: expr.to_string() };
            assert!(
                matches!(evaluate_part(&part, &nav, &mut env), PartOutcome::NoMatch),
                "{} should not match",
                expr
            );
        }
    }

    #[test]
    fn test_empty_selection_is_no_match_and_later_part_matches() {
        let nav = navigator("<r><b>hit</b></r>");
        let mut env = DynamicContext::new();
        let miss = PointerPart::XPath1 { expr: "/r/a".to_string() };
        assert!(matches!(evaluate_part(&miss, &nav, &mut env), PartOutcome::NoMatch));

        let hit = PointerPart::Element { xpath: "/*[1]/*[1]".to_string() };
        match evaluate_part(&hit, &nav, &mut env) {
            PartOutcome::Match(nodes) => assert_eq!(nodes.current().map(|n| n.value()), Some("hit".to_string())),
            PartOutcome::NoMatch => panic!("expected a match"),
        }
    }
}
