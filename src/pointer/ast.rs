//! Parsed pointer forms

/// A parsed XPointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerKind {
    /// A bare NCName, resolved through `id()`
    Shorthand { name: String },
    /// One or more scheme parts, tried left to right
    SchemeBased { parts: Vec<PointerPart> },
}

/// One recognised scheme part. Unknown schemes never reach the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerPart {
    /// `element()`, already translated to an XPath location path
    Element { xpath: String },
    /// `xmlns()` binding, visible to the parts after it
    Xmlns { prefix: String, uri: String },
    XPath1 { expr: String },
    XPointer { expr: String },
}

impl PointerPart {
    pub fn scheme_name(&self) -> &'static str {
        match self {
            PointerPart::Element { .. } => "element",
            PointerPart::Xmlns { .. } => "xmlns",
            PointerPart::XPath1 { .. } => "xpath1",
            PointerPart::XPointer { .. } => "xpointer",
        }
    }
}
