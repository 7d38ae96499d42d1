//! XML Event Types
//!
//! Event types for pull-parser style XML processing. Events read from a
//! byte slice borrow from it; events produced by walking a tree are owned.

use crate::core::attributes::Attribute;
use crate::core::entities::{escape_attribute, escape_text};
use std::borrow::Cow;

/// XML parsing event
#[derive(Debug, Clone, PartialEq)]
pub enum XmlEvent<'a> {
    /// Start of an element: <name attrs...>
    StartElement(StartElement<'a>),
    /// End of an element: </name>
    EndElement(EndElement<'a>),
    /// Empty element: <name attrs.../>
    EmptyElement(StartElement<'a>),
    /// Text content between tags
    Text(Cow<'a, [u8]>),
    /// CDATA section content
    CData(Cow<'a, [u8]>),
    /// Comment content
    Comment(Cow<'a, [u8]>),
    /// Processing instruction: <?target data?>
    ProcessingInstruction {
        target: Cow<'a, [u8]>,
        data: Option<Cow<'a, [u8]>>,
    },
    /// XML declaration: <?xml version="1.0"?>
    XmlDeclaration {
        version: Cow<'a, [u8]>,
        encoding: Option<Cow<'a, [u8]>>,
        standalone: Option<bool>,
    },
    /// DOCTYPE declaration body (after the `DOCTYPE` keyword)
    DocType(Cow<'a, [u8]>),
    /// End of document
    EndDocument,
}

/// Start element event data
#[derive(Debug, Clone, PartialEq)]
pub struct StartElement<'a> {
    /// Full element name (may include prefix)
    pub name: Cow<'a, [u8]>,
    /// Namespace URI, when the producer resolved it
    pub namespace: Option<Cow<'a, [u8]>>,
    /// Element attributes, namespace declarations included
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    pub fn new(name: Cow<'a, [u8]>, attributes: Vec<Attribute<'a>>) -> Self {
        StartElement {
            name,
            namespace: None,
            attributes,
        }
    }

    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name.as_ref()).ok()
    }

    /// Namespace prefix (before colon), if any
    pub fn prefix(&self) -> Option<&[u8]> {
        split_name(self.name.as_ref()).0
    }

    /// Local name (after colon)
    pub fn local_name(&self) -> &[u8] {
        split_name(self.name.as_ref()).1
    }

    pub fn get_attribute(&self, name: &[u8]) -> Option<&Attribute<'a>> {
        self.attributes.iter().find(|a| a.name.as_ref() == name)
    }

    /// Get an attribute value by name as string
    pub fn get_attribute_value(&self, name: &str) -> Option<&str> {
        self.get_attribute(name.as_bytes()).and_then(|a| a.value_str())
    }

    pub fn into_owned(self) -> StartElement<'static> {
        StartElement {
            name: Cow::Owned(self.name.into_owned()),
            namespace: self.namespace.map(|ns| Cow::Owned(ns.into_owned())),
            attributes: self.attributes.into_iter().map(Attribute::into_owned).collect(),
        }
    }
}

/// End element event data
#[derive(Debug, Clone, PartialEq)]
pub struct EndElement<'a> {
    pub name: Cow<'a, [u8]>,
}

impl<'a> EndElement<'a> {
    pub fn new(name: Cow<'a, [u8]>) -> Self {
        EndElement { name }
    }

    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name.as_ref()).ok()
    }

    pub fn local_name(&self) -> &[u8] {
        split_name(self.name.as_ref()).1
    }
}

/// Split a name into prefix and local name at the colon
fn split_name(name: &[u8]) -> (Option<&[u8]>, &[u8]) {
    if let Some(pos) = memchr::memchr(b':', name) {
        (Some(&name[..pos]), &name[pos + 1..])
    } else {
        (None, name)
    }
}

fn owned(bytes: Cow<'_, [u8]>) -> Cow<'static, [u8]> {
    Cow::Owned(bytes.into_owned())
}

impl<'a> XmlEvent<'a> {
    /// Check if this is a start element event
    pub fn is_start_element(&self) -> bool {
        matches!(self, XmlEvent::StartElement(_) | XmlEvent::EmptyElement(_))
    }

    pub fn is_end_element(&self) -> bool {
        matches!(self, XmlEvent::EndElement(_))
    }

    /// Get as start element if applicable
    pub fn as_start_element(&self) -> Option<&StartElement<'a>> {
        match self {
            XmlEvent::StartElement(e) | XmlEvent::EmptyElement(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_end_element(&self) -> Option<&EndElement<'a>> {
        match self {
            XmlEvent::EndElement(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if applicable
    pub fn as_text(&self) -> Option<&[u8]> {
        match self {
            XmlEvent::Text(t) | XmlEvent::CData(t) => Some(t.as_ref()),
            _ => None,
        }
    }

    pub fn into_owned(self) -> XmlEvent<'static> {
        match self {
            XmlEvent::StartElement(e) => XmlEvent::StartElement(e.into_owned()),
            XmlEvent::EmptyElement(e) => XmlEvent::EmptyElement(e.into_owned()),
            XmlEvent::EndElement(e) => XmlEvent::EndElement(EndElement::new(owned(e.name))),
            XmlEvent::Text(t) => XmlEvent::Text(owned(t)),
            XmlEvent::CData(t) => XmlEvent::CData(owned(t)),
            XmlEvent::Comment(t) => XmlEvent::Comment(owned(t)),
            XmlEvent::ProcessingInstruction { target, data } => XmlEvent::ProcessingInstruction {
                target: owned(target),
                data: data.map(owned),
            },
            XmlEvent::XmlDeclaration {
                version,
                encoding,
                standalone,
            } => XmlEvent::XmlDeclaration {
                version: owned(version),
                encoding: encoding.map(owned),
                standalone,
            },
            XmlEvent::DocType(t) => XmlEvent::DocType(owned(t)),
            XmlEvent::EndDocument => XmlEvent::EndDocument,
        }
    }

    /// Append the markup for this event to `out`
    pub fn write_to(&self, out: &mut String) {
        match self {
            XmlEvent::StartElement(e) | XmlEvent::EmptyElement(e) => {
                out.push('<');
                out.push_str(&String::from_utf8_lossy(&e.name));
                for attr in &e.attributes {
                    out.push(' ');
                    out.push_str(&String::from_utf8_lossy(&attr.name));
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(&String::from_utf8_lossy(&attr.value)));
                    out.push('"');
                }
                out.push_str(if matches!(self, XmlEvent::EmptyElement(_)) { "/>" } else { ">" });
            }
            XmlEvent::EndElement(e) => {
                out.push_str("</");
                out.push_str(&String::from_utf8_lossy(&e.name));
                out.push('>');
            }
            XmlEvent::Text(t) => out.push_str(&escape_text(&String::from_utf8_lossy(t))),
            XmlEvent::CData(t) => {
                out.push_str("<![CDATA[");
                out.push_str(&String::from_utf8_lossy(t));
                out.push_str("]]>");
            }
            XmlEvent::Comment(t) => {
                out.push_str("<!--");
                out.push_str(&String::from_utf8_lossy(t));
                out.push_str("-->");
            }
            XmlEvent::ProcessingInstruction { target, data } => {
                out.push_str("<?");
                out.push_str(&String::from_utf8_lossy(target));
                if let Some(data) = data {
                    out.push(' ');
                    out.push_str(&String::from_utf8_lossy(data));
                }
                out.push_str("?>");
            }
            XmlEvent::XmlDeclaration { version, encoding, standalone } => {
                out.push_str("<?xml version=\"");
                out.push_str(&String::from_utf8_lossy(version));
                out.push('"');
                if let Some(encoding) = encoding {
                    out.push_str(" encoding=\"");
                    out.push_str(&String::from_utf8_lossy(encoding));
                    out.push('"');
                }
                if let Some(standalone) = standalone {
                    out.push_str(if *standalone { " standalone=\"yes\"" } else { " standalone=\"no\"" });
                }
                out.push_str("?>");
            }
            XmlEvent::DocType(t) => {
                out.push_str("<!DOCTYPE");
                out.push_str(&String::from_utf8_lossy(t));
                out.push('>');
            }
            XmlEvent::EndDocument => {}
        }
    }
}
