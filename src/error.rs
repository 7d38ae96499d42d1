//! Error types
//!
//! Two families of errors surface from this crate:
//! - pointer errors, raised while compiling or resolving an XPointer
//! - XPath errors, raised by the expression engine; pointer evaluation
//!   swallows these per scheme part and falls through to the next part

use thiserror::Error;

/// Well-formedness error from strict XML parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at byte {position})")]
pub struct XmlError {
    pub message: String,
    pub position: usize,
}

impl XmlError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        XmlError {
            message: message.into(),
            position,
        }
    }
}

/// Errors raised by the XPath engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    #[error("invalid XPath expression '{expr}': {message}")]
    Syntax { expr: String, message: String },

    #[error("unknown function: {0}()")]
    UnknownFunction(String),

    #[error("namespace prefix '{0}' is not bound")]
    UnboundPrefix(String),

    #[error("variable ${0} is not bound")]
    UnboundVariable(String),

    #[error("{function}(): {message}")]
    Argument { function: String, message: String },

    #[error("type error: {0}")]
    Type(String),
}

impl XPathError {
    pub(crate) fn argument(function: &str, message: impl Into<String>) -> Self {
        XPathError::Argument {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

/// Errors raised while compiling or resolving an XPointer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    /// The pointer text does not match the XPointer Framework grammar
    #[error("syntax error in XPointer '{pointer}': {message}")]
    Syntax { pointer: String, message: String },

    /// The pointer parsed but every part evaluated to an empty result
    #[error("XPointer '{pointer}' identifies no subresources{}", in_document(.base_uri))]
    NoSubresources {
        pointer: String,
        base_uri: Option<String>,
    },

    /// The source document could not be parsed
    #[error("cannot parse document: {0}")]
    Document(#[from] XmlError),

    /// The source document could not be obtained from its URI
    #[error("cannot resolve '{uri}': {message}")]
    Resolve { uri: String, message: String },
}

impl PointerError {
    pub(crate) fn syntax(pointer: &str, message: impl Into<String>) -> Self {
        PointerError::Syntax {
            pointer: pointer.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn no_subresources(pointer: &str, base_uri: Option<String>) -> Self {
        PointerError::NoSubresources {
            pointer: pointer.to_string(),
            base_uri,
        }
    }
}

fn in_document(base_uri: &Option<String>) -> String {
    match base_uri {
        Some(uri) => format!(" in '{}'", uri),
        None => String::new(),
    }
}
