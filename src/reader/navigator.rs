//! Events from a navigator walk
//!
//! [`NavigatorReader`] turns the children of the navigator's starting node
//! into a pull stream of owned events. Namespace declarations are derived
//! from the in-scope namespace nodes, so the first element emitted declares
//! every binding it needs and the output can stand alone.

use super::events::{EndElement, StartElement, XmlEvent};
use super::EventSource;
use crate::core::attributes::Attribute;
use crate::navigator::{XPathNavigator, XPathNodeType};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    /// Just emitted the start of an element with children
    Descend,
    /// Current node is complete; continue with its sibling or parent
    Advance,
    Finished,
}

type Bindings = Vec<(String, String)>;

/// Pull reader over the content below a navigator's position
pub struct NavigatorReader<N: XPathNavigator> {
    start: N,
    nav: N,
    state: State,
    /// In-scope namespaces of each open element
    scopes: Vec<Bindings>,
    base_uri: Option<String>,
}

impl<N: XPathNavigator> NavigatorReader<N> {
    /// Read the children of `nav`'s current node (the whole tree when it is
    /// on a root)
    pub fn new(nav: N) -> Self {
        let base_uri = nav.base_uri();
        NavigatorReader {
            start: nav.clone(),
            nav,
            state: State::Initial,
            scopes: Vec::new(),
            base_uri,
        }
    }

    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    pub fn navigator(&self) -> &N {
        &self.nav
    }

    pub fn next_event(&mut self) -> Option<XmlEvent<'static>> {
        match self.state {
            State::Finished => None,
            State::Initial => {
                if self.nav.move_to_first_child() {
                    Some(self.open())
                } else {
                    Some(self.finish())
                }
            }
            State::Descend => {
                if self.nav.move_to_first_child() {
                    Some(self.open())
                } else {
                    self.state = State::Advance;
                    Some(self.close())
                }
            }
            State::Advance => {
                if self.nav.move_to_next() {
                    return Some(self.open());
                }
                if !self.nav.move_to_parent()
                    || self.nav.node_type() == XPathNodeType::Root
                    || self.nav.is_same_position(&self.start)
                {
                    return Some(self.finish());
                }
                Some(self.close())
            }
        }
    }

    fn finish(&mut self) -> XmlEvent<'static> {
        self.state = State::Finished;
        self.scopes.clear();
        XmlEvent::EndDocument
    }

    fn close(&mut self) -> XmlEvent<'static> {
        self.scopes.pop();
        self.base_uri = self.nav.base_uri();
        XmlEvent::EndElement(EndElement::new(owned_str(self.nav.name())))
    }

    /// Event for the node just moved onto. Attribute and namespace nodes
    /// read as their value.
    fn open(&mut self) -> XmlEvent<'static> {
        // A document node contributes only its children
        if self.nav.node_type() == XPathNodeType::Root {
            return if self.nav.move_to_first_child() {
                self.open()
            } else {
                self.finish()
            };
        }
        self.base_uri = self.nav.base_uri();
        self.state = State::Advance;
        match self.nav.node_type() {
            XPathNodeType::Element => {
                let bindings = namespace_bindings(&self.nav);
                let mut attributes = self.namespace_declarations(&bindings);
                attributes.extend(attributes_of(&self.nav));

                let mut elem = StartElement::new(owned_str(self.nav.name()), attributes);
                let namespace = self.nav.namespace_uri();
                if !namespace.is_empty() {
                    elem.namespace = Some(owned_str(namespace));
                }

                if self.nav.has_children() {
                    self.scopes.push(bindings);
                    self.state = State::Descend;
                    XmlEvent::StartElement(elem)
                } else {
                    XmlEvent::EmptyElement(elem)
                }
            }
            XPathNodeType::Comment => XmlEvent::Comment(owned_string(self.nav.value())),
            XPathNodeType::ProcessingInstruction => {
                let data = self.nav.value();
                XmlEvent::ProcessingInstruction {
                    target: owned_str(self.nav.name()),
                    data: (!data.is_empty()).then(|| owned_string(data)),
                }
            }
            _ => XmlEvent::Text(owned_string(self.nav.value())),
        }
    }

    /// `xmlns` attributes for bindings not already in scope at the parent
    fn namespace_declarations(&self, bindings: &Bindings) -> Vec<Attribute<'static>> {
        let empty = Vec::new();
        let parent = self.scopes.last().unwrap_or(&empty);
        let mut out = Vec::new();

        for (prefix, uri) in bindings {
            if !parent.iter().any(|(p, u)| p == prefix && u == uri) {
                out.push(Attribute::owned(&declaration_name(prefix), uri));
            }
        }
        let default_dropped = parent.iter().any(|(p, _)| p.is_empty())
            && !bindings.iter().any(|(p, _)| p.is_empty());
        if default_dropped {
            out.push(Attribute::owned("xmlns", ""));
        }
        out
    }
}

fn declaration_name(prefix: &str) -> String {
    if prefix.is_empty() {
        "xmlns".to_string()
    } else {
        format!("xmlns:{}", prefix)
    }
}

fn namespace_bindings<N: XPathNavigator>(nav: &N) -> Bindings {
    let mut out = Vec::new();
    let mut ns = nav.clone();
    if ns.move_to_first_namespace() {
        loop {
            if ns.name() != "xml" {
                out.push((ns.name().to_string(), ns.value()));
            }
            if !ns.move_to_next_namespace() {
                break;
            }
        }
    }
    out
}

fn attributes_of<N: XPathNavigator>(nav: &N) -> Vec<Attribute<'static>> {
    let mut out = Vec::new();
    let mut attr = nav.clone();
    if attr.move_to_first_attribute() {
        loop {
            out.push(Attribute::owned(attr.name(), &attr.value()));
            if !attr.move_to_next_attribute() {
                break;
            }
        }
    }
    out
}

fn owned_str(s: &str) -> Cow<'static, [u8]> {
    Cow::Owned(s.as_bytes().to_vec())
}

fn owned_string(s: String) -> Cow<'static, [u8]> {
    Cow::Owned(s.into_bytes())
}

impl<N: XPathNavigator> EventSource<'static> for NavigatorReader<N> {
    fn next_event(&mut self) -> Option<XmlEvent<'static>> {
        NavigatorReader::next_event(self)
    }

    fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }
}

impl<N: XPathNavigator> Iterator for NavigatorReader<N> {
    type Item = XmlEvent<'static>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_event()? {
            XmlEvent::EndDocument => None,
            event => Some(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::XmlDocument;
    use crate::navigator::{DocumentNavigator, SubtreeNavigator};
    use std::sync::Arc;

    fn navigator(xml: &str) -> DocumentNavigator {
        DocumentNavigator::new(Arc::new(XmlDocument::parse(xml.as_bytes())))
    }

    fn serialize<N: XPathNavigator>(reader: NavigatorReader<N>) -> String {
        let mut out = String::new();
        for event in reader {
            event.write_to(&mut out);
        }
        out
    }

    #[test]
    fn test_whole_document() {
        let xml = "<r a=\"1\"><x>t &amp; u</x><!--c--><?pi data?><e/></r>";
        assert_eq!(serialize(NavigatorReader::new(navigator(xml))), xml);
    }

    #[test]
    fn test_subtree_carries_namespaces() {
        let mut nav = navigator("<r xmlns=\"urn:d\" xmlns:p=\"urn:p\"><p:a><b/></p:a><c/></r>");
        assert!(nav.move_to_first_child());
        assert!(nav.move_to_first_child());
        let reader = NavigatorReader::new(SubtreeNavigator::new(nav));
        assert_eq!(
            serialize(reader),
            "<p:a xmlns=\"urn:d\" xmlns:p=\"urn:p\"><b/></p:a>"
        );
    }

    #[test]
    fn test_stops_at_starting_element() {
        let mut nav = navigator("<r><a><b>1</b><c/></a><z/></r>");
        assert!(nav.move_to_first_child());
        assert!(nav.move_to_first_child());
        let mut reader = NavigatorReader::new(nav);
        let events: Vec<_> = reader.by_ref().collect();
        assert_eq!(events.len(), 4);
        assert!(reader.is_finished());
        assert_eq!(reader.depth(), 0);
    }

    #[test]
    fn test_fragment_mode_reads_following_siblings() {
        let mut nav = navigator("<r><a/><b/><c/></r>");
        assert!(nav.move_to_first_child());
        assert!(nav.move_to_first_child());
        assert!(nav.move_to_next());
        let reader = NavigatorReader::new(SubtreeNavigator::fragment(nav));
        assert_eq!(serialize(reader), "<b/><c/>");
    }

    #[test]
    fn test_subtree_of_document_node_reads_whole_tree() {
        let xml = "<r><a>x</a><b/></r>";
        let mut reader = NavigatorReader::new(SubtreeNavigator::new(navigator(xml)));
        let events: Vec<_> = reader.by_ref().collect();
        assert!(events[0].is_start_element());
        let mut out = String::new();
        for event in events {
            event.write_to(&mut out);
        }
        assert_eq!(out, xml);
        assert!(reader.is_finished());
    }
}
