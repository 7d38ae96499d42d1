//! XML Tokenizer - State machine for XML token extraction
//!
//! Implements a pull-parser style tokenizer that extracts XML tokens:
//! - Element start/end tags
//! - Text content
//! - CDATA sections
//! - Comments
//! - Processing instructions and the XML declaration
//! - DOCTYPE declarations (internal subset kept verbatim)
//!
//! Lenient mode recovers from malformed markup by passing it through as
//! text. Strict mode stops at the first problem and records it.

use super::entities::decode_text;
use super::scanner::Scanner;
use crate::error::XmlError;
use std::borrow::Cow;

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
    /// End of file
    Eof,
}

/// A parsed XML token
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input (start, end)
    pub span: (usize, usize),
    /// For tags and PIs: the name or target
    pub name: Option<&'a [u8]>,
    /// For text, CDATA, comments, PI data and DOCTYPE bodies
    pub content: Option<Cow<'a, [u8]>>,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
        }
    }

    fn with_name(mut self, name: &'a [u8]) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: Cow<'a, [u8]>) -> Self {
        self.content = Some(content);
        self
    }
}

/// XML tokenizer implementing a pull-parser pattern
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    started: bool,
    done: bool,
    strict: bool,
    error: Option<XmlError>,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given input (lenient mode)
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
            started: false,
            done: false,
            strict: false,
            error: None,
        }
    }

    /// Create a new tokenizer in strict mode
    pub fn new_strict(input: &'a [u8]) -> Self {
        Tokenizer {
            strict: true,
            ..Self::new(input)
        }
    }

    /// Get any parse error (strict mode only)
    pub fn error(&self) -> Option<&XmlError> {
        self.error.as_ref()
    }

    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Get the next token, or None once input is exhausted or a strict
    /// error has been recorded
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            if !self.strict {
                self.scanner.skip_whitespace();
            }
        }

        if self.scanner.is_eof() {
            self.done = true;
            let pos = self.scanner.position();
            return Some(Token::new(TokenKind::Eof, (pos, pos)));
        }

        match self.scanner.peek() {
            Some(b'<') => self.parse_markup(),
            _ => self.parse_text(),
        }
    }

    /// Strict: record the error and stop. Lenient: emit the offending
    /// markup as literal text up to the next '<'.
    fn fail(&mut self, message: &str, start: usize) -> Option<Token<'a>> {
        if self.strict {
            if self.error.is_none() {
                self.error = Some(XmlError::new(message, start));
            }
            self.done = true;
            return None;
        }
        self.scanner.set_position(start + 1);
        let end = self
            .scanner
            .find_tag_start()
            .unwrap_or(start + 1 + self.scanner.remaining().len());
        self.scanner.set_position(end);
        let raw = self.scanner.slice(start, end);
        Some(Token::new(TokenKind::Text, (start, end)).with_content(decode_text(raw)))
    }

    fn parse_markup(&mut self) -> Option<Token<'a>> {
        let start = self.scanner.position();
        self.scanner.advance(1);

        match self.scanner.peek() {
            Some(b'/') => self.parse_end_tag(start),
            Some(b'!') => self.parse_bang_markup(start),
            Some(b'?') => self.parse_pi(start),
            Some(_) => self.parse_start_tag(start),
            None => self.fail("Unexpected end of input after '<'", start),
        }
    }

    fn parse_start_tag(&mut self, start: usize) -> Option<Token<'a>> {
        let Some(name) = self.scanner.read_name() else {
            return self.fail(
                "Invalid element name: must start with letter, underscore, or colon",
                start,
            );
        };
        let Some(end) = self.scanner.find_tag_end_quoted() else {
            return self.fail("Unclosed start tag", start);
        };

        let is_empty = self.scanner.slice(end - 1, end) == b"/";
        self.scanner.set_position(end + 1);

        let kind = if is_empty { TokenKind::EmptyTag } else { TokenKind::StartTag };
        Some(Token::new(kind, (start, end + 1)).with_name(name))
    }

    fn parse_end_tag(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1);

        let Some(name) = self.scanner.read_name() else {
            return self.fail("Invalid element name in end tag", start);
        };
        let Some(end) = self.scanner.find_byte(b'>') else {
            return self.fail("Unclosed end tag", start);
        };
        if self.strict {
            let trailing = self.scanner.slice(self.scanner.position(), end);
            if !trailing.iter().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r')) {
                return self.fail("End tag cannot have attributes or other content", start);
            }
        }

        self.scanner.set_position(end + 1);
        Some(Token::new(TokenKind::EndTag, (start, end + 1)).with_name(name))
    }

    /// Comment, CDATA or DOCTYPE
    fn parse_bang_markup(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1);

        if self.scanner.starts_with(b"--") {
            self.parse_comment(start)
        } else if self.scanner.starts_with(b"[CDATA[") {
            self.parse_cdata(start)
        } else if self.scanner.starts_with(b"DOCTYPE") {
            self.parse_doctype(start)
        } else {
            self.fail("Invalid declaration - expected comment, CDATA, or DOCTYPE", start)
        }
    }

    fn parse_comment(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(2);
        let content_start = self.scanner.position();

        let Some(pos) = self.scanner.find(b"-->") else {
            return self.fail("Unterminated comment", start);
        };
        let content = self.scanner.slice(content_start, pos);
        if self.strict && memchr::memmem::find(content, b"--").is_some() {
            return self.fail("'--' not allowed inside comment", start);
        }

        self.scanner.set_position(pos + 3);
        Some(
            Token::new(TokenKind::Comment, (start, pos + 3))
                .with_content(Cow::Borrowed(content)),
        )
    }

    fn parse_cdata(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(7);
        let content_start = self.scanner.position();

        let Some(pos) = self.scanner.find(b"]]>") else {
            return self.fail("Unterminated CDATA section", start);
        };
        let content = self.scanner.slice(content_start, pos);

        self.scanner.set_position(pos + 3);
        Some(
            Token::new(TokenKind::CData, (start, pos + 3))
                .with_content(Cow::Borrowed(content)),
        )
    }

    /// DOCTYPE up to the '>' outside any quoted literal or internal subset
    fn parse_doctype(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(7);
        let content_start = self.scanner.position();

        let mut quote: Option<u8> = None;
        let mut depth = 0usize;
        let mut end = None;
        for (i, &b) in self.scanner.remaining().iter().enumerate() {
            match (quote, b) {
                (Some(q), _) if q == b => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => depth += 1,
                (None, b']') => depth = depth.saturating_sub(1),
                (None, b'>') if depth == 0 => {
                    end = Some(content_start + i);
                    break;
                }
                _ => {}
            }
        }
        let Some(end) = end else {
            return self.fail("Unterminated DOCTYPE declaration", start);
        };

        let content = self.scanner.slice(content_start, end);
        self.scanner.set_position(end + 1);
        Some(
            Token::new(TokenKind::DocType, (start, end + 1))
                .with_content(Cow::Borrowed(content)),
        )
    }

    fn parse_pi(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1);

        let Some(name) = self.scanner.read_name() else {
            return self.fail("Invalid processing instruction target", start);
        };
        if self.strict && name != b"xml" && name.eq_ignore_ascii_case(b"xml") {
            return self.fail("Processing instruction target 'xml' is reserved", start);
        }
        let Some(pos) = self.scanner.find(b"?>") else {
            return self.fail("Unterminated processing instruction", start);
        };

        self.scanner.skip_whitespace();
        let content_start = self.scanner.position().min(pos);
        let content = self.scanner.slice(content_start, pos);
        self.scanner.set_position(pos + 2);

        let kind = if name == b"xml" {
            TokenKind::XmlDeclaration
        } else {
            TokenKind::ProcessingInstruction
        };
        let token = Token::new(kind, (start, pos + 2)).with_name(name);
        if content.is_empty() {
            Some(token)
        } else {
            Some(token.with_content(Cow::Borrowed(content)))
        }
    }

    fn parse_text(&mut self) -> Option<Token<'a>> {
        let start = self.scanner.position();
        let end = self
            .scanner
            .find_tag_start()
            .unwrap_or(start + self.scanner.remaining().len());

        let content = self.scanner.slice(start, end);
        if self.strict && memchr::memmem::find(content, b"]]>").is_some() {
            return self.fail("']]>' not allowed in text content", start);
        }

        self.scanner.set_position(end);
        Some(Token::new(TokenKind::Text, (start, end)).with_content(decode_text(content)))
    }
}

/// Iterator adapter for tokenizer
impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token()?;
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &[u8]) -> Vec<TokenKind> {
        Tokenizer::new(input).map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_element() {
        assert_eq!(
            kinds(b"<root>hello</root>"),
            vec![TokenKind::StartTag, TokenKind::Text, TokenKind::EndTag]
        );
    }

    #[test]
    fn test_empty_element_with_quoted_gt() {
        let tokens: Vec<_> = Tokenizer::new(b"<a title=\"x > y\"/>").collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::EmptyTag);
        assert_eq!(tokens[0].name, Some(b"a" as &[u8]));
    }

    #[test]
    fn test_doctype_internal_subset() {
        let input = b"<!DOCTYPE doc [<!ATTLIST p id ID #IMPLIED>]><doc/>";
        let tokens: Vec<_> = Tokenizer::new(input).collect();
        assert_eq!(tokens[0].kind, TokenKind::DocType);
        let body = tokens[0].content.as_deref().unwrap_or_default();
        assert!(body.ends_with(b"#IMPLIED>]"));
        assert_eq!(tokens[1].kind, TokenKind::EmptyTag);
    }

    #[test]
    fn test_pi_and_declaration() {
        let tokens: Vec<_> = Tokenizer::new(b"<?xml version=\"1.0\"?><?app run now?><r/>").collect();
        assert_eq!(tokens[0].kind, TokenKind::XmlDeclaration);
        assert_eq!(tokens[1].kind, TokenKind::ProcessingInstruction);
        assert_eq!(tokens[1].content.as_deref(), Some(b"run now" as &[u8]));
    }

    #[test]
    fn test_comment_and_cdata() {
        assert_eq!(
            kinds(b"<r><!-- note --><![CDATA[<raw>]]></r>"),
            vec![TokenKind::StartTag, TokenKind::Comment, TokenKind::CData, TokenKind::EndTag]
        );
    }

    #[test]
    fn test_lenient_recovers_stray_lt() {
        let tokens: Vec<_> = Tokenizer::new(b"<r>a < b</r>").collect();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EndTag));
    }

    #[test]
    fn test_strict_reports_error() {
        let mut tokenizer = Tokenizer::new_strict(b"<r><!-- a -- b --></r>");
        while tokenizer.next_token().is_some() {}
        assert!(tokenizer.error().is_some());
    }
}
