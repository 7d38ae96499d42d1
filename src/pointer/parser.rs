//! Recursive-descent XPointer parser
//!
//! ```text
//! Pointer            ::= Shorthand | SchemeBased
//! SchemeBased        ::= (SchemeName '(' SchemeData ')' S?)+
//! ElementSchemeData  ::= (NCName ChildSequence?) | ChildSequence
//! ChildSequence      ::= ('/' [1-9][0-9]*)+
//! XmlnsSchemeData    ::= NCName S? '=' S? EscapedNamespaceName
//! ```
//!
//! Scheme names are identified by (namespace URI, local name). A prefixed
//! name resolves through the `xmlns()` parts already parsed; one that does
//! not resolve, or that names a scheme this parser does not know, is skipped
//! together with its data.

use super::ast::{PointerKind, PointerPart};
use super::lexer::{Lexeme, Lexer};
use crate::error::PointerError;
use std::fmt::Write;
use tracing::trace;

/// Schemes understood by the parser, all in the empty namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    Element,
    Xmlns,
    XPath1,
    XPointer,
}

impl Scheme {
    fn lookup(namespace: &str, local: &str) -> Option<Scheme> {
        if !namespace.is_empty() {
            return None;
        }
        match local {
            "element" => Some(Scheme::Element),
            "xmlns" => Some(Scheme::Xmlns),
            "xpath1" => Some(Scheme::XPath1),
            "xpointer" => Some(Scheme::XPointer),
            _ => None,
        }
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    parts: Vec<PointerPart>,
}

impl<'a> Parser<'a> {
    pub fn new(pointer: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(pointer),
            parts: Vec::new(),
        }
    }

    fn error(&self, message: impl Into<String>) -> PointerError {
        PointerError::syntax(self.lexer.pointer(), message)
    }

    pub fn parse(mut self) -> Result<PointerKind, PointerError> {
        let first = self.lexer.next_lexeme()?;
        match first {
            Lexeme::Eof => Err(self.error("empty pointer")),
            Lexeme::NCName { name, scheme: false } => match self.lexer.next_lexeme()? {
                Lexeme::Eof => Ok(PointerKind::Shorthand { name }),
                _ => Err(self.error("a shorthand pointer must be a single NCName")),
            },
            mut lexeme => {
                loop {
                    self.parse_part(lexeme)?;
                    self.lexer.skip_whitespace();
                    lexeme = self.lexer.next_lexeme()?;
                    if lexeme == Lexeme::Eof {
                        break;
                    }
                }
                Ok(PointerKind::SchemeBased { parts: self.parts })
            }
        }
    }

    fn parse_part(&mut self, lexeme: Lexeme) -> Result<(), PointerError> {
        if !lexeme.can_be_scheme_name() {
            return Err(self.error("expected a scheme name"));
        }
        let scheme = match &lexeme {
            Lexeme::NCName { name, .. } => Scheme::lookup("", name),
            Lexeme::QName { prefix, local, .. } => match self.bound_namespace(prefix) {
                Some(namespace) => Scheme::lookup(namespace, local),
                None => None,
            },
            _ => None,
        };

        // The scheme flag guarantees the opening parenthesis
        self.expect(Lexeme::LeftParen)?;

        match scheme {
            Some(Scheme::Element) => {
                let xpath = self.element_data()?;
                self.parts.push(PointerPart::Element { xpath });
                return Ok(());
            }
            Some(Scheme::Xmlns) => {
                let (prefix, uri) = self.xmlns_data()?;
                self.parts.push(PointerPart::Xmlns { prefix, uri });
            }
            Some(Scheme::XPath1) => {
                let expr = self.lexer.parse_escaped_data()?;
                self.parts.push(PointerPart::XPath1 { expr });
            }
            Some(Scheme::XPointer) => {
                let expr = self.lexer.parse_escaped_data()?;
                self.parts.push(PointerPart::XPointer { expr });
            }
            None => {
                let skipped = self.lexer.parse_escaped_data()?;
                trace!(scheme = ?lexeme, data = %skipped, "skipping unknown XPointer scheme");
            }
        }
        self.expect(Lexeme::RightParen)
    }

    /// Latest `xmlns()` binding of `prefix` parsed so far
    fn bound_namespace(&self, prefix: &str) -> Option<&str> {
        self.parts.iter().rev().find_map(|part| match part {
            PointerPart::Xmlns { prefix: p, uri } if p == prefix => Some(uri.as_str()),
            _ => None,
        })
    }

    fn expect(&mut self, expected: Lexeme) -> Result<(), PointerError> {
        let found = self.lexer.next_lexeme()?;
        if found == expected {
            Ok(())
        } else {
            Err(self.error(format!("expected {:?}, found {:?}", expected, found)))
        }
    }

    /// element() data translated to `id('name')/*[n]/...`, closing
    /// parenthesis included
    fn element_data(&mut self) -> Result<String, PointerError> {
        let mut xpath = String::new();
        let mut lexeme = self.lexer.next_lexeme()?;

        if let Lexeme::NCName { name, scheme: false } = &lexeme {
            let _ = write!(xpath, "id('{}')", name);
            lexeme = self.lexer.next_lexeme()?;
        }

        loop {
            match lexeme {
                Lexeme::Text('/') => match self.lexer.next_lexeme()? {
                    Lexeme::Number(0) => return Err(self.error("element() child indexes start at 1")),
                    Lexeme::Number(n) => {
                        let _ = write!(xpath, "/*[{}]", n);
                    }
                    _ => return Err(self.error("expected a child index after '/'")),
                },
                Lexeme::RightParen if !xpath.is_empty() => return Ok(xpath),
                Lexeme::RightParen => return Err(self.error("element() requires scheme data")),
                _ => return Err(self.error("malformed element() scheme data")),
            }
            lexeme = self.lexer.next_lexeme()?;
        }
    }

    fn xmlns_data(&mut self) -> Result<(String, String), PointerError> {
        let prefix = match self.lexer.next_lexeme()? {
            Lexeme::NCName { name, scheme: false } => name,
            _ => return Err(self.error("xmlns() requires a namespace prefix")),
        };
        self.lexer.skip_whitespace();
        self.expect(Lexeme::Text('='))?;
        self.lexer.skip_whitespace();
        let uri = self.lexer.parse_escaped_data()?;
        Ok((prefix, uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pointer: &str) -> Result<PointerKind, PointerError> {
        Parser::new(pointer).parse()
    }

    fn parts(pointer: &str) -> Vec<PointerPart> {
        match parse(pointer).unwrap() {
            PointerKind::SchemeBased { parts } => parts,
            other => panic!("expected scheme-based pointer, got {:?}", other),
        }
    }

    fn element_xpath(pointer: &str) -> String {
        match parts(pointer).as_slice() {
            [PointerPart::Element { xpath }] => xpath.clone(),
            other => panic!("unexpected parts {:?}", other),
        }
    }

    #[test]
    fn test_shorthand() {
        assert_eq!(
            parse("chapter1").unwrap(),
            PointerKind::Shorthand {
                name: "chapter1".to_string()
            }
        );
        assert!(parse("chapter1 x").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_element_child_sequences() {
        assert_eq!(element_xpath("element(/1/2)"), "/*[1]/*[2]");
        assert_eq!(element_xpath("element(chap1/2)"), "id('chap1')/*[2]");
        assert_eq!(element_xpath("element(chap1)"), "id('chap1')");
    }

    #[test]
    fn test_element_errors() {
        for bad in ["element()", "element(/0)", "element(/)", "element(a/b)", "element(/1 )"] {
            assert!(
                matches!(parse(bad), Err(PointerError::Syntax { .. })),
                "{} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_xmlns_and_xpointer() {
        assert_eq!(
            parts("xmlns(ex = http://example.com) xpointer(//ex:foo[@a='^(x^)'])"),
            vec![
                PointerPart::Xmlns {
                    prefix: "ex".to_string(),
                    uri: "http://example.com".to_string()
                },
                PointerPart::XPointer {
                    expr: "//ex:foo[@a='(x)']".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_unknown_schemes_are_skipped() {
        assert_eq!(
            parts("foo(bar(baz))xpath1(/r)"),
            vec![PointerPart::XPath1 { expr: "/r".to_string() }]
        );
        // Bound but namespaced: still not a scheme this parser knows
        assert_eq!(parts("xmlns(x=urn:x)x:element(/1)").len(), 1);
        assert!(parts("ex:element(/1)").is_empty());
    }

    #[test]
    fn test_malformed_scheme_sequences() {
        assert!(parse("element(/1)junk").is_err());
        assert!(parse("(/1)").is_err());
        assert!(parse("xpointer(/r").is_err());
        assert!(parse("xmlns(ex)").is_err());
    }
}
