//! RustyXPointer - XPointer Framework resolution for XML inclusion
//!
//! Layers:
//! - core / dom: memchr tokenizer and arena document with ids, namespaces
//!   and `xml:base`
//! - xpath: XPath 1.0 engine with a shared compiled-expression cache
//! - navigator: cursor navigation, including subtree-scoped views
//! - pointer: XPointer lexer, parser and scheme evaluation
//! - reader: pull event readers, `xml:base` tracking and the XPointer
//!   streaming facade
//! - strategy: parallel batch resolution (feature `parallel`)
//!
//! ```ignore
//! use rustyxpointer::{DocumentSource, XPointerReader};
//!
//! let source = DocumentSource::content("http://example.com/book.xml", xml);
//! let mut reader = XPointerReader::new(source, "xmlns(b=urn:book)xpointer(//b:chapter[2])")?;
//! let fragment = reader.read_to_string();
//! ```

pub mod config;
pub mod core;
pub mod dom;
pub mod error;
pub mod navigator;
pub mod pointer;
pub mod reader;
pub mod strategy;
pub mod xpath;

pub use config::{ParseOptions, ReaderSettings};
pub use dom::{DocumentAccess, NodeId, XmlDocument};
pub use error::{PointerError, XPathError, XmlError};
pub use navigator::{DocumentNavigator, NodeIterator, SubtreeNavigator, XPathNavigator, XPathNodeType};
pub use pointer::{resolve, Pointer, PointerKind, PointerPart};
pub use reader::{
    DocumentCache, DocumentSource, EventSource, FileResolver, NavigatorReader, ResourceResolver, SliceReader,
    XPointerReader, XmlBaseReader, XmlEvent,
};
pub use xpath::{DynamicContext, ExpressionCache, VariableValue, XPathExpr, XPathValue};

#[cfg(feature = "parallel")]
pub use strategy::resolve_parallel;
