//! Parser and reader settings

/// How an XML document is turned into a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject documents that are not well-formed instead of recovering
    pub strict: bool,
    /// Base URI of the document entity, used for `xml:base` resolution
    pub base_uri: Option<String>,
    /// Treat an unprefixed `id` attribute as an ID when neither `xml:id`
    /// nor a DTD `ID` declaration applies to the element
    pub id_attribute_fallback: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            strict: false,
            base_uri: None,
            id_attribute_fallback: true,
        }
    }
}

impl ParseOptions {
    pub fn strict() -> Self {
        ParseOptions {
            strict: true,
            ..Self::default()
        }
    }

    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }
}

/// Settings for [`crate::reader::XPointerReader`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderSettings {
    /// Reuse documents parsed for earlier readers of the same URI
    pub use_document_cache: bool,
    /// Options for documents the reader parses itself
    pub parse: ParseOptions,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        ReaderSettings {
            use_document_cache: true,
            parse: ParseOptions::default(),
        }
    }
}
