//! Subtree-scoped navigation
//!
//! [`SubtreeNavigator`] wraps a navigator positioned on some node R and
//! presents R's subtree as if it were a whole document: a synthetic root sits
//! above R, and no move ever reaches R's ancestors. In fragment mode the top
//! level additionally spans R's siblings, so a run of sibling nodes can be
//! walked as one forest.

use super::{XPathNavigator, XPathNodeType};

/// Navigator restricted to the subtree of its starting node
#[derive(Debug, Clone)]
pub struct SubtreeNavigator<N: XPathNavigator> {
    /// Top-level position; follows sibling moves in fragment mode
    root: N,
    current: N,
    at_synthetic_root: bool,
    fragment: bool,
}

impl<N: XPathNavigator> SubtreeNavigator<N> {
    /// Scope to the subtree of `inner`'s current node, starting on the
    /// synthetic root
    pub fn new(inner: N) -> Self {
        Self::with_mode(inner, false)
    }

    /// Scope to `inner`'s node and its siblings.
    ///
    /// The top-level position moves with sibling moves: after `move_to_next`
    /// and `move_to_parent`, `move_to_first_child` enters at that sibling,
    /// not at the node the navigator was created on.
    pub fn fragment(inner: N) -> Self {
        Self::with_mode(inner, true)
    }

    fn with_mode(inner: N, fragment: bool) -> Self {
        SubtreeNavigator {
            root: inner.clone(),
            current: inner,
            at_synthetic_root: true,
            fragment,
        }
    }

    pub fn is_fragment(&self) -> bool {
        self.fragment
    }

    pub fn at_synthetic_root(&self) -> bool {
        self.at_synthetic_root
    }

    /// Wrapped navigator at the current real position
    pub fn inner(&self) -> &N {
        &self.current
    }

    fn at_top(&self) -> bool {
        self.current.is_same_position(&self.root)
    }

    fn move_top_sibling(&mut self, step: impl FnOnce(&mut N) -> bool) -> bool {
        if !self.fragment || !step(&mut self.root) {
            return false;
        }
        self.current.move_to(&self.root)
    }
}

impl<N: XPathNavigator> XPathNavigator for SubtreeNavigator<N> {
    fn node_type(&self) -> XPathNodeType {
        if self.at_synthetic_root {
            XPathNodeType::Root
        } else {
            self.current.node_type()
        }
    }

    fn name(&self) -> &str {
        if self.at_synthetic_root {
            ""
        } else {
            self.current.name()
        }
    }

    fn local_name(&self) -> &str {
        if self.at_synthetic_root {
            ""
        } else {
            self.current.local_name()
        }
    }

    fn prefix(&self) -> &str {
        if self.at_synthetic_root {
            ""
        } else {
            self.current.prefix()
        }
    }

    fn namespace_uri(&self) -> &str {
        if self.at_synthetic_root {
            ""
        } else {
            self.current.namespace_uri()
        }
    }

    fn value(&self) -> String {
        if self.at_synthetic_root {
            self.root.value()
        } else {
            self.current.value()
        }
    }

    fn base_uri(&self) -> Option<String> {
        if self.at_synthetic_root {
            self.root.base_uri()
        } else {
            self.current.base_uri()
        }
    }

    fn is_empty_element(&self) -> bool {
        !self.at_synthetic_root && self.current.is_empty_element()
    }

    fn has_attributes(&self) -> bool {
        !self.at_synthetic_root && self.current.has_attributes()
    }

    fn has_children(&self) -> bool {
        self.at_synthetic_root || self.current.has_children()
    }

    fn move_to_root(&mut self) {
        self.current = self.root.clone();
        self.at_synthetic_root = true;
    }

    fn move_to_parent(&mut self) -> bool {
        if self.at_synthetic_root {
            return false;
        }
        if self.at_top() {
            self.at_synthetic_root = true;
            return true;
        }
        self.current.move_to_parent()
    }

    fn move_to_first_child(&mut self) -> bool {
        if self.at_synthetic_root {
            self.current = self.root.clone();
            self.at_synthetic_root = false;
            return true;
        }
        self.current.move_to_first_child()
    }

    fn move_to_next(&mut self) -> bool {
        if self.at_synthetic_root {
            false
        } else if self.at_top() {
            self.move_top_sibling(N::move_to_next)
        } else {
            self.current.move_to_next()
        }
    }

    fn move_to_previous(&mut self) -> bool {
        if self.at_synthetic_root {
            false
        } else if self.at_top() {
            self.move_top_sibling(N::move_to_previous)
        } else {
            self.current.move_to_previous()
        }
    }

    fn move_to_first(&mut self) -> bool {
        if self.at_synthetic_root {
            false
        } else if self.at_top() {
            self.move_top_sibling(N::move_to_first)
        } else {
            self.current.move_to_first()
        }
    }

    fn move_to_first_attribute(&mut self) -> bool {
        !self.at_synthetic_root && self.current.move_to_first_attribute()
    }

    fn move_to_next_attribute(&mut self) -> bool {
        !self.at_synthetic_root && self.current.move_to_next_attribute()
    }

    fn move_to_first_namespace(&mut self) -> bool {
        !self.at_synthetic_root && self.current.move_to_first_namespace()
    }

    fn move_to_next_namespace(&mut self) -> bool {
        !self.at_synthetic_root && self.current.move_to_next_namespace()
    }

    fn move_to(&mut self, other: &Self) -> bool {
        if self.fragment != other.fragment || !self.root.is_same_position(&other.root) {
            return false;
        }
        if !self.current.move_to(&other.current) {
            return false;
        }
        self.at_synthetic_root = other.at_synthetic_root;
        true
    }

    fn is_same_position(&self, other: &Self) -> bool {
        if self.at_synthetic_root || other.at_synthetic_root {
            self.at_synthetic_root == other.at_synthetic_root && self.root.is_same_position(&other.root)
        } else {
            self.current.is_same_position(&other.current)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlDocument;
    use crate::navigator::DocumentNavigator;
    use std::sync::Arc;

    // ids: 0 document, 1 r, 2 a, 3 x, 4 b, 5 c
    const XML: &[u8] = b"<r><a><x/></a><b/><c/></r>";

    fn scoped_at(id: u32, fragment: bool) -> SubtreeNavigator<DocumentNavigator> {
        let inner = DocumentNavigator::at(Arc::new(XmlDocument::parse(XML)), id);
        if fragment {
            SubtreeNavigator::fragment(inner)
        } else {
            SubtreeNavigator::new(inner)
        }
    }

    #[test]
    fn test_synthetic_root() {
        let mut nav = scoped_at(2, false);
        assert_eq!(nav.node_type(), XPathNodeType::Root);
        assert_eq!(nav.name(), "");
        assert!(!nav.move_to_parent());
        assert!(!nav.move_to_next());
        assert!(!nav.move_to_first_attribute());
        assert!(!nav.move_to_first_namespace());
        assert!(nav.has_children());
    }

    #[test]
    fn test_parent_returns_to_synthetic_root() {
        let mut nav = scoped_at(2, false);
        assert!(nav.move_to_first_child());
        assert_eq!(nav.name(), "a");
        assert!(nav.move_to_first_child());
        assert_eq!(nav.name(), "x");
        assert!(nav.move_to_parent());
        assert_eq!(nav.name(), "a");
        assert!(nav.move_to_parent());
        assert!(nav.at_synthetic_root());
        assert!(!nav.move_to_parent());
    }

    #[test]
    fn test_siblings_blocked_outside_fragment_mode() {
        let mut nav = scoped_at(4, false);
        assert!(nav.move_to_first_child());
        assert!(!nav.move_to_next());
        assert!(!nav.move_to_previous());
        assert!(!nav.move_to_first());
        assert_eq!(nav.name(), "b");
    }

    #[test]
    fn test_siblings_reachable_in_fragment_mode() {
        let mut nav = scoped_at(4, true);
        assert!(nav.move_to_first_child());
        assert!(nav.move_to_next());
        assert_eq!(nav.name(), "c");
        assert!(!nav.move_to_next());
        assert!(nav.move_to_previous());
        assert!(nav.move_to_previous());
        assert_eq!(nav.name(), "a");
        assert!(nav.move_to_first_child());
        assert!(nav.move_to_parent());
        assert!(nav.move_to_parent());
        assert!(nav.at_synthetic_root());
    }

    #[test]
    fn test_move_to_root_resets() {
        let mut nav = scoped_at(2, false);
        assert!(nav.move_to_first_child());
        assert!(nav.move_to_first_child());
        nav.move_to_root();
        assert!(nav.at_synthetic_root());
        assert!(nav.move_to_first_child());
        assert_eq!(nav.name(), "a");
    }

    #[test]
    fn test_fragment_reentry_follows_sibling_moves() {
        let mut nav = scoped_at(4, true);
        assert!(nav.move_to_first_child());
        assert!(nav.move_to_next());
        assert!(nav.move_to_parent());
        assert!(nav.move_to_first_child());
        assert_eq!(nav.name(), "c");
    }
}
