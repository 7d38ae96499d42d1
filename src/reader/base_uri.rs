//! `xml:base` tracking over an event stream
//!
//! Each `xml:base` attribute is resolved against the base in effect at its
//! element and pushed with that element's depth. The entry is popped when
//! the element closes, so `base_uri()` after any event is the base of the
//! element that event belongs to.

use super::events::{StartElement, XmlEvent};
use super::EventSource;
use crate::core::entities::decode_text;
use crate::core::uri::resolve_uri;
use std::marker::PhantomData;
use tracing::trace;

#[derive(Debug, Clone)]
struct BaseFrame {
    uri: String,
    depth: usize,
}

/// Adapter that reports the effective base URI of the current event.
/// `'a` is the lifetime of the events the inner source yields.
pub struct XmlBaseReader<'a, R> {
    inner: R,
    initial: Option<String>,
    stack: Vec<BaseFrame>,
    depth: usize,
    // Set after an empty element that declared xml:base
    pending_pop: bool,
    _events: PhantomData<&'a ()>,
}

impl<'a, R> XmlBaseReader<'a, R> {
    pub fn new(inner: R) -> Self {
        XmlBaseReader {
            inner,
            initial: None,
            stack: Vec::new(),
            depth: 0,
            pending_pop: false,
            _events: PhantomData,
        }
    }

    /// Base used outside any `xml:base` scope, overriding the inner reader's
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.initial = Some(base_uri.into());
        self
    }

    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<'a, R: EventSource<'a>> XmlBaseReader<'a, R> {
    /// Effective base URI for the most recent event
    pub fn base_uri(&self) -> Option<&str> {
        match self.stack.last() {
            Some(frame) => Some(frame.uri.as_str()),
            None => self.initial.as_deref().or_else(|| self.inner.base_uri()),
        }
    }

    pub fn next_event(&mut self) -> Option<XmlEvent<'a>> {
        if self.pending_pop {
            self.stack.pop();
            self.pending_pop = false;
        }

        let event = self.inner.next_event()?;
        match &event {
            XmlEvent::StartElement(elem) => {
                self.push_declared_base(elem);
                self.depth += 1;
            }
            XmlEvent::EmptyElement(elem) => {
                self.pending_pop = self.push_declared_base(elem);
            }
            XmlEvent::EndElement(_) => {
                self.depth = self.depth.saturating_sub(1);
                if self.stack.last().map_or(false, |frame| frame.depth == self.depth) {
                    self.stack.pop();
                }
            }
            _ => {}
        }
        Some(event)
    }

    /// Push the element's `xml:base`, if any, at the current depth
    fn push_declared_base(&mut self, elem: &StartElement<'_>) -> bool {
        let Some(attr) = elem.get_attribute(b"xml:base") else {
            return false;
        };
        let value = String::from_utf8_lossy(&decode_text(&attr.value)).into_owned();
        let uri = resolve_uri(self.base_uri(), &value);
        trace!(depth = self.depth, base = %uri, "entering xml:base scope");
        self.stack.push(BaseFrame { uri, depth: self.depth });
        true
    }
}

impl<'a, R: EventSource<'a>> EventSource<'a> for XmlBaseReader<'a, R> {
    fn next_event(&mut self) -> Option<XmlEvent<'a>> {
        XmlBaseReader::next_event(self)
    }

    fn base_uri(&self) -> Option<&str> {
        XmlBaseReader::base_uri(self)
    }
}

impl<'a, R: EventSource<'a>> Iterator for XmlBaseReader<'a, R> {
    type Item = XmlEvent<'a>;

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
    use crate::reader::SliceReader;

    const NESTED: &[u8] = br#"<doc xml:base="http://example.com/a/">
        <l1 xml:base="b/"><l2><l3 xml:base="c/"><l4>deep</l4></l3><after/></l2></l1>
        <tail/>
    </doc>"#;

    /// Base URI reported right after each element start, keyed by name
    fn bases<'a>(reader: &mut XmlBaseReader<'a, SliceReader<'a>>) -> Vec<(String, String)> {
        let mut out = Vec::new();
        while let Some(event) = reader.next_event() {
            if let Some(elem) = event.as_start_element() {
                let name = elem.name_str().unwrap_or_default().to_string();
                out.push((name, reader.base_uri().unwrap_or_default().to_string()));
            }
            if event == XmlEvent::EndDocument {
                break;
            }
        }
        out
    }

    #[test]
    fn test_nested_bases_resolve_and_revert() {
        let mut reader = XmlBaseReader::new(SliceReader::new(NESTED));
        let found = bases(&mut reader);
        let base_of = |name: &str| found.iter().find(|(n, _)| n == name).map(|(_, b)| b.as_str());

        assert_eq!(base_of("l1"), Some("http://example.com/a/b/"));
        assert_eq!(base_of("l2"), Some("http://example.com/a/b/"));
        assert_eq!(base_of("l4"), Some("http://example.com/a/b/c/"));
        assert_eq!(base_of("after"), Some("http://example.com/a/b/"));
        assert_eq!(base_of("tail"), Some("http://example.com/a/"));
        assert_eq!(reader.depth(), 0);
    }

    #[test]
    fn test_empty_element_scope_is_balanced() {
        let xml = br#"<r><e xml:base="x/"/><n/></r>"#;
        let mut reader = XmlBaseReader::new(SliceReader::new(xml)).with_base_uri("http://h/");
        let found = bases(&mut reader);
        assert_eq!(found[1], ("e".to_string(), "http://h/x/".to_string()));
        assert_eq!(found[2], ("n".to_string(), "http://h/".to_string()));
    }

    #[test]
    fn test_falls_back_to_inner_base() {
        let reader = XmlBaseReader::new(SliceReader::new(b"<r/>").with_base_uri("file:///d/doc.xml"));
        assert_eq!(reader.base_uri(), Some("file:///d/doc.xml"));
    }

    #[test]
    fn test_iterates_borrowed_events() {
        let xml = br#"<r xml:base="http://h/"><a xml:base="x/">t</a></r>"#;
        let reader = XmlBaseReader::new(SliceReader::new(xml));
        let names: Vec<String> = reader
            .filter_map(|event| event.as_start_element().and_then(|e| e.name_str()).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["r", "a"]);

        let mut reader = XmlBaseReader::new(SliceReader::new(xml));
        let _ = reader.by_ref().take(2).count();
        assert_eq!(reader.base_uri(), Some("http://h/x/"));
        assert_eq!(reader.depth(), 2);
    }
}
