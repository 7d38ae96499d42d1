//! Zero-Copy Slice Parser
//!
//! Parses XML from a byte slice with zero-copy semantics.
//! Input references are maintained directly in the output.

use super::events::{EndElement, StartElement, XmlEvent};
use super::EventSource;
use crate::core::attributes::{parse_attributes, Attribute};
use crate::core::tokenizer::{Token, TokenKind, Tokenizer};
use crate::error::XmlError;
use std::borrow::Cow;

/// Zero-copy XML reader from a byte slice
pub struct SliceReader<'a> {
    input: &'a [u8],
    tokenizer: Tokenizer<'a>,
    strict: bool,
    attr_error: Option<XmlError>,
    base_uri: Option<String>,
}

impl<'a> SliceReader<'a> {
    /// Create a new slice reader (lenient mode)
    pub fn new(input: &'a [u8]) -> Self {
        SliceReader {
            input,
            tokenizer: Tokenizer::new(input),
            strict: false,
            attr_error: None,
            base_uri: None,
        }
    }

    /// Create a new slice reader in strict mode
    pub fn new_strict(input: &'a [u8]) -> Self {
        SliceReader {
            input,
            tokenizer: Tokenizer::new_strict(input),
            strict: true,
            attr_error: None,
            base_uri: None,
        }
    }

    /// Base URI of the document entity being read
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Byte offset of the next unread token
    pub fn position(&self) -> usize {
        self.tokenizer.position()
    }

    /// Get parse error (strict mode only)
    pub fn error(&self) -> Option<&XmlError> {
        self.attr_error.as_ref().or_else(|| self.tokenizer.error())
    }

    /// Get the next XML event
    pub fn next_event(&mut self) -> Option<XmlEvent<'a>> {
        if self.attr_error.is_some() {
            return None;
        }
        loop {
            let token = self.tokenizer.next_token()?;

            match token.kind {
                TokenKind::Eof => return Some(XmlEvent::EndDocument),

                TokenKind::StartTag | TokenKind::EmptyTag => {
                    let name = token.name?;
                    let attrs = self.parse_tag_attributes(&token, name.len())?;
                    let elem = StartElement::new(Cow::Borrowed(name), attrs);
                    return Some(if token.kind == TokenKind::EmptyTag {
                        XmlEvent::EmptyElement(elem)
                    } else {
                        XmlEvent::StartElement(elem)
                    });
                }

                TokenKind::EndTag => {
                    let name = token.name?;
                    return Some(XmlEvent::EndElement(EndElement::new(Cow::Borrowed(name))));
                }

                TokenKind::Text => {
                    if let Some(content) = token.content {
                        if !content.is_empty() {
                            return Some(XmlEvent::Text(content));
                        }
                    }
                }

                TokenKind::CData => {
                    if let Some(content) = token.content {
                        return Some(XmlEvent::CData(content));
                    }
                }

                TokenKind::Comment => {
                    if let Some(content) = token.content {
                        return Some(XmlEvent::Comment(content));
                    }
                }

                TokenKind::ProcessingInstruction => {
                    if let Some(name) = token.name {
                        return Some(XmlEvent::ProcessingInstruction {
                            target: Cow::Borrowed(name),
                            data: token.content,
                        });
                    }
                }

                TokenKind::XmlDeclaration => {
                    let content = match &token.content {
                        Some(Cow::Borrowed(c)) => *c,
                        _ => &[],
                    };
                    let attrs = parse_attributes(content, false).unwrap_or_default();
                    let find = |name: &[u8]| {
                        attrs.iter().find(|a| a.name.as_ref() == name).map(|a| a.value.clone())
                    };
                    let version = find(b"version").unwrap_or(Cow::Borrowed(b"1.0" as &[u8]));
                    let encoding = find(b"encoding");
                    let standalone = find(b"standalone").map(|v| v.as_ref() == b"yes");
                    return Some(XmlEvent::XmlDeclaration {
                        version,
                        encoding,
                        standalone,
                    });
                }

                TokenKind::DocType => {
                    return Some(XmlEvent::DocType(token.content.unwrap_or(Cow::Borrowed(b"" as &[u8]))));
                }
            }
        }
    }

    /// Parse attributes from a tag token
    fn parse_tag_attributes(&mut self, token: &Token<'a>, name_len: usize) -> Option<Vec<Attribute<'a>>> {
        let (start, end) = token.span;
        let tag = &self.input[start..end];

        let mut attr_end = tag.len().saturating_sub(1);
        if token.kind == TokenKind::EmptyTag {
            attr_end = attr_end.saturating_sub(1);
        }
        let attr_start = (1 + name_len).min(attr_end);

        match parse_attributes(&tag[attr_start..attr_end], self.strict) {
            Ok(attrs) => Some(attrs),
            Err(msg) => {
                self.attr_error = Some(XmlError::new(msg, start));
                None
            }
        }
    }
}

impl<'a> EventSource<'a> for SliceReader<'a> {
    fn next_event(&mut self) -> Option<XmlEvent<'a>> {
        SliceReader::next_event(self)
    }

    fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }
}

impl<'a> Iterator for SliceReader<'a> {
    type Item = XmlEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.next_event()?;
        if matches!(event, XmlEvent::EndDocument) {
            None
        } else {
            Some(event)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_element() {
        let events: Vec<_> = SliceReader::new(b"<root>hello</root>").collect();
        assert_eq!(events.len(), 3);

        assert!(matches!(&events[0], XmlEvent::StartElement(e) if e.name_str() == Some("root")));
        assert!(matches!(&events[1], XmlEvent::Text(t) if t.as_ref() == b"hello"));
        assert!(matches!(&events[2], XmlEvent::EndElement(e) if e.name_str() == Some("root")));
    }

    #[test]
    fn test_attributes() {
        let events: Vec<_> = SliceReader::new(b"<div id=\"main\" class=\"container\"/>").collect();
        assert_eq!(events.len(), 1);

        match &events[0] {
            XmlEvent::EmptyElement(e) => {
                assert_eq!(e.get_attribute_value("id"), Some("main"));
                assert_eq!(e.get_attribute_value("class"), Some("container"));
            }
            other => panic!("Expected EmptyElement, got {:?}", other),
        }
    }

    #[test]
    fn test_xml_declaration() {
        let mut reader = SliceReader::new(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><r/>");
        match reader.next_event() {
            Some(XmlEvent::XmlDeclaration { version, encoding, .. }) => {
                assert_eq!(version.as_ref(), b"1.0");
                assert_eq!(encoding.as_deref(), Some(b"UTF-8" as &[u8]));
            }
            other => panic!("Expected XmlDeclaration, got {:?}", other),
        }
    }

    #[test]
    fn test_strict_duplicate_attribute() {
        let mut reader = SliceReader::new_strict(b"<r a=\"1\" a=\"2\"/>");
        while reader.next_event().is_some() {}
        assert_eq!(reader.error().map(|e| e.message.as_str()), Some("Duplicate attribute"));
    }
}
