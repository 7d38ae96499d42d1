//! Tree navigation
//!
//! [`XPathNavigator`] is a cursor over an XML tree: it sits on one node
//! and moves along parent, child, sibling, attribute and namespace links.
//! Behaviour is layered by wrapping one navigator in another
//! ([`SubtreeNavigator`] decorates any navigator) rather than through a
//! class hierarchy.

pub mod document;
pub mod iter;
pub mod subtree;

pub use document::DocumentNavigator;
pub use iter::NodeIterator;
pub use subtree::SubtreeNavigator;

/// Node types visible through a navigator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XPathNodeType {
    Root,
    Element,
    Attribute,
    Namespace,
    Text,
    Comment,
    ProcessingInstruction,
}

/// Cursor-style navigation capability
///
/// `move_*` methods return false and leave the cursor where it was when the
/// move is not possible.
pub trait XPathNavigator: Clone {
    fn node_type(&self) -> XPathNodeType;

    /// Qualified name; empty for nodes without one
    fn name(&self) -> &str;

    fn local_name(&self) -> &str;

    fn prefix(&self) -> &str;

    fn namespace_uri(&self) -> &str;

    /// XPath string-value of the current node
    fn value(&self) -> String;

    /// Effective base URI of the current node
    fn base_uri(&self) -> Option<String>;

    /// Element written as `<name/>`
    fn is_empty_element(&self) -> bool;

    fn has_attributes(&self) -> bool;

    fn has_children(&self) -> bool;

    fn move_to_root(&mut self);

    fn move_to_parent(&mut self) -> bool;

    fn move_to_first_child(&mut self) -> bool;

    /// Next sibling
    fn move_to_next(&mut self) -> bool;

    /// Previous sibling
    fn move_to_previous(&mut self) -> bool;

    /// First sibling
    fn move_to_first(&mut self) -> bool;

    fn move_to_first_attribute(&mut self) -> bool;

    fn move_to_next_attribute(&mut self) -> bool;

    /// First in-scope namespace node of an element
    fn move_to_first_namespace(&mut self) -> bool;

    fn move_to_next_namespace(&mut self) -> bool;

    /// Jump to the position of another navigator over the same tree
    fn move_to(&mut self, other: &Self) -> bool;

    fn is_same_position(&self, other: &Self) -> bool;
}
