//! Node-set cursor

use super::DocumentNavigator;
use crate::dom::{NodeId, XmlDocument};
use std::sync::Arc;

/// Forward cursor over a node-set in a fixed order
///
/// Starts before the first node; `move_next` advances and `current`
/// yields a navigator positioned on the node under the cursor.
#[derive(Debug, Clone)]
pub struct NodeIterator {
    doc: Arc<XmlDocument>,
    nodes: Vec<NodeId>,
    position: usize,
}

impl NodeIterator {
    pub fn new(doc: Arc<XmlDocument>, nodes: Vec<NodeId>) -> Self {
        NodeIterator {
            doc,
            nodes,
            position: 0,
        }
    }

    pub fn empty(doc: Arc<XmlDocument>) -> Self {
        Self::new(doc, Vec::new())
    }

    /// Advance to the next node; false once the set is exhausted
    pub fn move_next(&mut self) -> bool {
        if self.position < self.nodes.len() {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Navigator on the current node, `None` before the first `move_next`
    /// or past the end
    pub fn current(&self) -> Option<DocumentNavigator> {
        let id = *self.nodes.get(self.position.checked_sub(1)?)?;
        Some(DocumentNavigator::at(Arc::clone(&self.doc), id))
    }

    /// 1-based position of the current node, 0 before the first
    pub fn current_position(&self) -> usize {
        self.position
    }

    pub fn count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn document(&self) -> &Arc<XmlDocument> {
        &self.doc
    }

    /// Fresh cursor over the same nodes
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::XPathNavigator;

    #[test]
    fn test_cursor_walk() {
        let doc = Arc::new(XmlDocument::parse(b"<r><a/><b/></r>"));
        let mut iter = NodeIterator::new(Arc::clone(&doc), vec![2, 3]);
        assert_eq!(iter.count(), 2);
        assert!(iter.current().is_none());

        assert!(iter.move_next());
        assert_eq!(iter.current_position(), 1);
        assert_eq!(iter.current().map(|n| n.name().to_string()).as_deref(), Some("a"));

        assert!(iter.move_next());
        assert_eq!(iter.current().map(|n| n.name().to_string()).as_deref(), Some("b"));

        assert!(!iter.move_next());
        iter.reset();
        assert_eq!(iter.current_position(), 0);
    }

    #[test]
    fn test_empty() {
        let doc = Arc::new(XmlDocument::parse(b"<r/>"));
        let mut iter = NodeIterator::empty(doc);
        assert!(iter.is_empty());
        assert!(!iter.move_next());
        assert!(iter.current().is_none());
    }
}
