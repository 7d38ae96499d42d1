//! XML Reader Module
//!
//! Pull readers that yield [`XmlEvent`]s:
//! - SliceReader: zero-copy events from a byte slice
//! - NavigatorReader: events from a walk over a navigator
//! - XmlBaseReader: adapter that tracks the effective `xml:base`
//! - XPointerReader: the subtrees an XPointer selects, as one stream

pub mod base_uri;
pub mod doc_cache;
pub mod events;
pub mod navigator;
pub mod slice;
pub mod xpointer;

pub use base_uri::XmlBaseReader;
pub use doc_cache::DocumentCache;
pub use events::{EndElement, StartElement, XmlEvent};
pub use navigator::NavigatorReader;
pub use slice::SliceReader;
pub use xpointer::{DocumentSource, FileResolver, ResourceResolver, XPointerReader};

/// Pull source of XML events
///
/// `next_event` yields `EndDocument` once the source is exhausted and
/// `None` after that (or on a parse error).
pub trait EventSource<'a> {
    fn next_event(&mut self) -> Option<XmlEvent<'a>>;

    /// Base URI of the content being read, if known
    fn base_uri(&self) -> Option<&str> {
        None
    }
}
