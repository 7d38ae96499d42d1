//! Streaming reader over the subtrees an XPointer selects
//!
//! [`XPointerReader`] is what an inclusion processor consumes: it resolves a
//! pointer against a document and then reads each selected node, with its
//! subtree, as one forward-only event stream. Nothing above a selected node
//! is ever emitted.

use super::doc_cache::DocumentCache;
use super::events::XmlEvent;
use super::navigator::NavigatorReader;
use super::EventSource;
use crate::config::{ParseOptions, ReaderSettings};
use crate::dom::XmlDocument;
use crate::error::PointerError;
use crate::navigator::{DocumentNavigator, NodeIterator, SubtreeNavigator};
use crate::pointer::Pointer;
use crate::xpath::DynamicContext;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Where the document a pointer is evaluated against comes from
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A tree that is already built
    Navigable(DocumentNavigator),
    /// Fetched through a [`ResourceResolver`]. `namespaces` seed the prefix
    /// bindings visible to `xpointer()` parts.
    Uri {
        uri: String,
        namespaces: Vec<(String, String)>,
    },
    /// Document bytes supplied by the caller; `uri` is their base URI
    Content { uri: String, content: Vec<u8> },
}

impl DocumentSource {
    pub fn uri(uri: impl Into<String>) -> Self {
        DocumentSource::Uri {
            uri: uri.into(),
            namespaces: Vec::new(),
        }
    }

    pub fn content(uri: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        DocumentSource::Content {
            uri: uri.into(),
            content: content.into(),
        }
    }
}

impl From<DocumentNavigator> for DocumentSource {
    fn from(nav: DocumentNavigator) -> Self {
        DocumentSource::Navigable(nav)
    }
}

impl From<Arc<XmlDocument>> for DocumentSource {
    fn from(doc: Arc<XmlDocument>) -> Self {
        DocumentSource::Navigable(DocumentNavigator::new(doc))
    }
}

/// Turns a URI into document bytes
pub trait ResourceResolver: Send + Sync {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, PointerError>;
}

/// Resolver for `file:` URLs and plain filesystem paths
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResolver;

impl FileResolver {
    fn path(uri: &str) -> Result<PathBuf, PointerError> {
        let resolve_error = |message: &str| PointerError::Resolve {
            uri: uri.to_string(),
            message: message.to_string(),
        };
        match Url::parse(uri) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|_| resolve_error("not a valid file path")),
            Ok(url) => Err(resolve_error(&format!("unsupported URI scheme '{}'", url.scheme()))),
            Err(_) => Ok(PathBuf::from(uri)),
        }
    }
}

impl ResourceResolver for FileResolver {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, PointerError> {
        let path = Self::path(uri)?;
        std::fs::read(&path).map_err(|e| PointerError::Resolve {
            uri: uri.to_string(),
            message: e.to_string(),
        })
    }
}

fn parse_document(content: &[u8], uri: &str, options: &ParseOptions) -> Result<Arc<XmlDocument>, PointerError> {
    let options = options.clone().with_base_uri(uri);
    Ok(Arc::new(XmlDocument::parse_with(content, &options)?))
}

type SubtreeReader = NavigatorReader<SubtreeNavigator<DocumentNavigator>>;

/// Forward-only event stream over every node a pointer selects
pub struct XPointerReader {
    pointer: Pointer,
    matches: NodeIterator,
    current: Option<SubtreeReader>,
    done: bool,
}

impl XPointerReader {
    /// Resolve `pointer` against `source` with default settings, reading
    /// URIs from the filesystem
    pub fn new(source: impl Into<DocumentSource>, pointer: &str) -> Result<Self, PointerError> {
        Self::with_settings(source, pointer, &ReaderSettings::default(), &FileResolver)
    }

    pub fn with_settings(
        source: impl Into<DocumentSource>,
        pointer: &str,
        settings: &ReaderSettings,
        resolver: &dyn ResourceResolver,
    ) -> Result<Self, PointerError> {
        let pointer = Pointer::compile(pointer)?;
        let (nav, env) = Self::load(source.into(), settings, resolver)?;
        let matches = pointer.evaluate_with(&nav, env)?;
        debug!(pointer = %pointer, matches = matches.count(), "XPointer resolved");

        let current = matches.current().map(|n| NavigatorReader::new(SubtreeNavigator::new(n)));
        Ok(XPointerReader {
            pointer,
            matches,
            current,
            done: false,
        })
    }

    fn load(
        source: DocumentSource,
        settings: &ReaderSettings,
        resolver: &dyn ResourceResolver,
    ) -> Result<(DocumentNavigator, DynamicContext), PointerError> {
        match source {
            DocumentSource::Navigable(nav) => Ok((nav, DynamicContext::new())),
            DocumentSource::Uri { uri, namespaces } => {
                let load = || parse_document(&resolver.fetch(&uri)?, &uri, &settings.parse);
                let doc = if settings.use_document_cache {
                    DocumentCache::global().get_or_load(&uri, load)?
                } else {
                    load()?
                };
                Ok((DocumentNavigator::new(doc), DynamicContext::with_namespaces(namespaces)))
            }
            DocumentSource::Content { uri, content } => {
                let doc = parse_document(&content, &uri, &settings.parse)?;
                Ok((DocumentNavigator::new(doc), DynamicContext::new()))
            }
        }
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    /// Number of nodes the pointer selected
    pub fn match_count(&self) -> usize {
        self.matches.count()
    }

    /// Document the pointer was resolved against
    pub fn document(&self) -> &Arc<XmlDocument> {
        self.matches.document()
    }

    pub fn next_event(&mut self) -> Option<XmlEvent<'static>> {
        loop {
            let reader = match self.current.as_mut() {
                Some(reader) => reader,
                None if self.done => return None,
                None => {
                    self.done = true;
                    return Some(XmlEvent::EndDocument);
                }
            };
            match reader.next_event() {
                Some(XmlEvent::EndDocument) | None => {
                    // Segment exhausted: re-enter at the next selected node
                    self.current = if self.matches.move_next() {
                        self.matches
                            .current()
                            .map(|n| NavigatorReader::new(SubtreeNavigator::new(n)))
                    } else {
                        None
                    };
                }
                Some(event) => return Some(event),
            }
        }
    }

    /// Serialize the rest of the stream as XML text
    pub fn read_to_string(&mut self) -> String {
        let mut out = String::new();
        for event in self.by_ref() {
            event.write_to(&mut out);
        }
        out
    }
}

impl EventSource<'static> for XPointerReader {
    fn next_event(&mut self) -> Option<XmlEvent<'static>> {
        XPointerReader::next_event(self)
    }

    /// Base URI of the node being read, else of the document
    fn base_uri(&self) -> Option<&str> {
        self.current
            .as_ref()
            .and_then(|reader| reader.base_uri())
            .or_else(|| self.matches.document().base_uri())
    }
}

impl Iterator for XPointerReader {
    type Item = XmlEvent<'static>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_event()? {
            XmlEvent::EndDocument => None,
            event => Some(event),
        }
    }
}
