//! XPointer Lexer
//!
//! Splits pointer text into lexemes one character at a time. `^` escapes
//! the next `^`, `(` or `)` and is never a lexeme of its own.

use crate::core::names::{is_ncname_char, is_ncname_start_char};
use crate::error::PointerError;

/// Pointer lexeme
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lexeme {
    /// `scheme` is set when the name is immediately followed by `(`
    NCName { name: String, scheme: bool },
    QName { prefix: String, local: String, scheme: bool },
    LeftParen,
    RightParen,
    Number(u64),
    /// A run of whitespace
    Space,
    /// Any other single character, escapes already applied
    Text(char),
    Eof,
}

impl Lexeme {
    /// Whether this name can start a scheme invocation
    pub fn can_be_scheme_name(&self) -> bool {
        matches!(
            self,
            Lexeme::NCName { scheme: true, .. } | Lexeme::QName { scheme: true, .. }
        )
    }
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

pub struct Lexer<'a> {
    pointer: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(pointer: &'a str) -> Self {
        Lexer { pointer, pos: 0 }
    }

    pub fn pointer(&self) -> &'a str {
        self.pointer
    }

    fn peek(&self) -> Option<char> {
        self.pointer[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.pointer[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> PointerError {
        PointerError::syntax(self.pointer, message)
    }

    /// Character following a `^`
    fn escaped(&mut self) -> Result<char, PointerError> {
        match self.bump() {
            Some(c @ ('^' | '(' | ')')) => Ok(c),
            Some(c) => Err(self.error(format!("invalid escape '^{}'", c))),
            None => Err(self.error("'^' at end of pointer")),
        }
    }

    fn read_ncname(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().map_or(false, is_ncname_char) {
            self.bump();
        }
        &self.pointer[start..self.pos]
    }

    pub fn next_lexeme(&mut self) -> Result<Lexeme, PointerError> {
        let Some(c) = self.peek() else {
            return Ok(Lexeme::Eof);
        };

        let lexeme = match c {
            '(' => {
                self.bump();
                Lexeme::LeftParen
            }
            ')' => {
                self.bump();
                Lexeme::RightParen
            }
            '^' => {
                self.bump();
                Lexeme::Text(self.escaped()?)
            }
            '0'..='9' => {
                let start = self.pos;
                while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                    self.bump();
                }
                let digits = &self.pointer[start..self.pos];
                let n = digits
                    .parse()
                    .map_err(|_| self.error(format!("number '{}' is too large", digits)))?;
                Lexeme::Number(n)
            }
            _ if is_space(c) => {
                self.skip_whitespace();
                Lexeme::Space
            }
            _ if is_ncname_start_char(c) => {
                let first = self.read_ncname();
                let qualified = self.peek() == Some(':') && self.peek_second().map_or(false, is_ncname_start_char);
                if qualified {
                    self.bump();
                    let local = self.read_ncname();
                    Lexeme::QName {
                        prefix: first.to_string(),
                        local: local.to_string(),
                        scheme: self.peek() == Some('('),
                    }
                } else {
                    Lexeme::NCName {
                        name: first.to_string(),
                        scheme: self.peek() == Some('('),
                    }
                }
            }
            _ => {
                self.bump();
                Lexeme::Text(c)
            }
        };
        Ok(lexeme)
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, is_space) {
            self.bump();
        }
    }

    /// Scheme data after an opening `(`, up to (not including) the matching
    /// unescaped `)`, with escapes translated
    pub fn parse_escaped_data(&mut self) -> Result<String, PointerError> {
        let mut data = String::new();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return Err(self.error("unbalanced parentheses in scheme data")),
                Some(')') if depth == 0 => return Ok(data),
                Some(c) => {
                    self.bump();
                    match c {
                        '^' => data.push(self.escaped()?),
                        '(' => {
                            depth += 1;
                            data.push(c);
                        }
                        ')' => {
                            depth -= 1;
                            data.push(c);
                        }
                        _ => data.push(c),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(pointer: &str) -> Vec<Lexeme> {
        let mut lexer = Lexer::new(pointer);
        let mut out = Vec::new();
        loop {
            let lexeme = lexer.next_lexeme().unwrap();
            if lexeme == Lexeme::Eof {
                return out;
            }
            out.push(lexeme);
        }
    }

    #[test]
    fn test_scheme_name_flag() {
        let lexemes = lex("foo(bar)");
        assert!(lexemes[0].can_be_scheme_name());
        assert_eq!(lexemes[1], Lexeme::LeftParen);
        assert!(!lexemes[2].can_be_scheme_name());

        let lexemes = lex("foo (");
        assert!(!lexemes[0].can_be_scheme_name());
        assert_eq!(lexemes[1], Lexeme::Space);
    }

    #[test]
    fn test_qname_and_numbers() {
        assert_eq!(
            lex("ex:s(")[0],
            Lexeme::QName {
                prefix: "ex".to_string(),
                local: "s".to_string(),
                scheme: true
            }
        );
        assert_eq!(lex("/007"), vec![Lexeme::Text('/'), Lexeme::Number(7)]);
    }

    #[test]
    fn test_space_coalesces() {
        assert_eq!(lex(" \t\n "), vec![Lexeme::Space]);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(lex("^^^("), vec![Lexeme::Text('^'), Lexeme::Text('(')]);
        assert!(Lexer::new("^a").next_lexeme().is_err());
        assert!(Lexer::new("^").next_lexeme().is_err());
    }

    #[test]
    fn test_escaped_data() {
        let mut lexer = Lexer::new("a(b)^)c^^)rest");
        assert_eq!(lexer.parse_escaped_data().unwrap(), "a(b))c^");
        assert_eq!(lexer.next_lexeme().unwrap(), Lexeme::RightParen);

        assert!(Lexer::new("(unclosed").parse_escaped_data().is_err());
        assert!(Lexer::new("x^").parse_escaped_data().is_err());
    }
}
