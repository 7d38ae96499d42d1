//! XPath Lexer
//!
//! Tokenizes XPath expressions into tokens.
//!
//! `and`, `or`, `div` and `mod` are only operators when an operand precedes
//! them; after `@`, `::`, `(`, `[`, `,` or another operator they are plain
//! names (`/div/mod` selects elements). The parser resolves `*` the same
//! way from its position in the grammar.

use crate::core::names::{is_ncname_char, is_ncname_start_char};

/// XPath token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Operators
    Slash,       // /
    DoubleSlash, // //
    Dot,         // .
    DoubleDot,   // ..
    At,          // @
    Pipe,        // |
    Plus,        // +
    Minus,       // -
    Star,        // *
    Eq,          // =
    NotEq,       // !=
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=
    And,         // and
    Or,          // or
    Mod,         // mod
    Div,         // div

    // Brackets
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]

    // Literals
    Number(f64),
    String(String),

    /// NCName or prefix:local
    Name(String),
    /// prefix:*
    PrefixWildcard(String),
    /// Name followed by `(` that is not a node type
    FunctionName(String),
    /// node, text, comment, processing-instruction followed by `(`
    NodeType(String),
    /// Name followed by `::`
    Axis(String),

    DoubleColon, // ::
    Comma,       // ,
    Dollar,      // $

    Eof,
}

impl Token {
    /// Whether an operator may follow this token
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Name(_)
                | Token::PrefixWildcard(_)
                | Token::Number(_)
                | Token::String(_)
                | Token::RightParen
                | Token::RightBracket
                | Token::Dot
                | Token::DoubleDot
                | Token::Star
        )
    }
}

/// XPath lexer
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    /// Previous token allows a following operator
    after_operand: bool,
    /// `$` was just read: the next name is a variable, never an operator
    after_dollar: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            after_operand: false,
            after_dollar: false,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if matches!(c, ' ' | '\t' | '\r' | '\n') {
                self.advance(1);
            } else {
                break;
            }
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token, String> {
        let token = self.scan()?;
        // `*` after an operand is multiplication, which does not end an operand
        self.after_operand = if token == Token::Star {
            !self.after_operand
        } else {
            token.ends_operand()
        };
        self.after_dollar = token == Token::Dollar;
        Ok(token)
    }

    fn scan(&mut self) -> Result<Token, String> {
        self.skip_whitespace();

        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        let token = match c {
            '/' => {
                self.advance(1);
                if self.peek() == Some('/') {
                    self.advance(1);
                    Token::DoubleSlash
                } else {
                    Token::Slash
                }
            }
            '.' => {
                if self.peek_at(1) == Some('.') {
                    self.advance(2);
                    Token::DoubleDot
                } else if self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
                    self.read_number()
                } else {
                    self.advance(1);
                    Token::Dot
                }
            }
            '!' => {
                if self.peek_at(1) != Some('=') {
                    return Err("expected '=' after '!'".to_string());
                }
                self.advance(2);
                Token::NotEq
            }
            '<' | '>' => {
                self.advance(1);
                let eq = self.peek() == Some('=');
                if eq {
                    self.advance(1);
                }
                match (c, eq) {
                    ('<', false) => Token::Lt,
                    ('<', true) => Token::LtEq,
                    (_, false) => Token::Gt,
                    (_, true) => Token::GtEq,
                }
            }
            ':' => {
                if self.peek_at(1) != Some(':') {
                    return Err("unexpected ':'".to_string());
                }
                self.advance(2);
                Token::DoubleColon
            }
            '"' | '\'' => self.read_string(c)?,
            '0'..='9' => self.read_number(),
            _ if is_ncname_start_char(c) => self.read_name(),
            _ => {
                let token = match c {
                    '@' => Token::At,
                    '|' => Token::Pipe,
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '=' => Token::Eq,
                    '(' => Token::LeftParen,
                    ')' => Token::RightParen,
                    '[' => Token::LeftBracket,
                    ']' => Token::RightBracket,
                    ',' => Token::Comma,
                    '$' => Token::Dollar,
                    _ => return Err(format!("unexpected character '{}'", c)),
                };
                self.advance(1);
                token
            }
        };
        Ok(token)
    }

    /// Read a number literal: digits with an optional fraction
    fn read_number(&mut self) -> Token {
        let start = self.pos;
        self.skip_digits();
        if self.peek() == Some('.') {
            self.advance(1);
            self.skip_digits();
        }
        let value = self.input[start..self.pos].parse().unwrap_or(f64::NAN);
        Token::Number(value)
    }

    fn skip_digits(&mut self) {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.advance(1);
        }
    }

    /// Read a string literal
    fn read_string(&mut self, quote: char) -> Result<Token, String> {
        self.advance(1);
        let rest = self.remaining();
        let end = rest
            .find(quote)
            .ok_or_else(|| "unterminated string literal".to_string())?;
        let value = rest[..end].to_string();
        self.advance(end + 1);
        Ok(Token::String(value))
    }

    fn read_ncname(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_ncname_char(c) {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    /// Read a name, operator name, axis, node type or function name
    fn read_name(&mut self) -> Token {
        let start = self.pos;
        let first = self.read_ncname();

        if self.after_operand && !self.after_dollar {
            match first {
                "and" => return Token::And,
                "or" => return Token::Or,
                "mod" => return Token::Mod,
                "div" => return Token::Div,
                _ => {}
            }
        }

        // prefix:local or prefix:*
        if self.peek() == Some(':') && self.peek_at(1) != Some(':') {
            match self.peek_at(1) {
                Some('*') => {
                    self.advance(2);
                    return Token::PrefixWildcard(first.to_string());
                }
                Some(c) if is_ncname_start_char(c) => {
                    self.advance(1);
                    self.read_ncname();
                }
                _ => {}
            }
        }
        let name = &self.input[start..self.pos];

        let after = self.pos;
        self.skip_whitespace();
        let token = if self.remaining().starts_with("::") {
            Token::Axis(name.to_string())
        } else if self.peek() == Some('(') && !self.after_dollar {
            match name {
                "node" | "text" | "comment" | "processing-instruction" => Token::NodeType(name.to_string()),
                _ => Token::FunctionName(name.to_string()),
            }
        } else {
            Token::Name(name.to_string())
        };
        self.pos = after;
        token
    }

    /// Tokenize entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if matches!(token, Token::Eof) {
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize().unwrap()
    }

    fn name(s: &str) -> Token {
        Token::Name(s.to_string())
    }

    #[test]
    fn test_simple_path() {
        assert_eq!(tokens("/root/child"), vec![Token::Slash, name("root"), Token::Slash, name("child")]);
    }

    #[test]
    fn test_predicate() {
        assert_eq!(
            tokens("item[@id='test']"),
            vec![
                name("item"),
                Token::LeftBracket,
                Token::At,
                name("id"),
                Token::Eq,
                Token::String("test".to_string()),
                Token::RightBracket,
            ]
        );
    }

    #[test]
    fn test_axis_and_node_type() {
        assert_eq!(
            tokens("child :: text()"),
            vec![
                Token::Axis("child".to_string()),
                Token::DoubleColon,
                Token::NodeType("text".to_string()),
                Token::LeftParen,
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_qualified_names() {
        assert_eq!(tokens("ex:foo"), vec![name("ex:foo")]);
        assert_eq!(tokens("ex:*"), vec![Token::PrefixWildcard("ex".to_string())]);
        assert_eq!(
            tokens("ex:f()"),
            vec![Token::FunctionName("ex:f".to_string()), Token::LeftParen, Token::RightParen]
        );
    }

    #[test]
    fn test_operator_names_depend_on_position() {
        assert_eq!(tokens("/div"), vec![Token::Slash, name("div")]);
        assert_eq!(tokens("a and b"), vec![name("a"), Token::And, name("b")]);
        assert_eq!(tokens("a or or"), vec![name("a"), Token::Or, name("or")]);
        assert_eq!(tokens("6 div 2"), vec![Token::Number(6.0), Token::Div, Token::Number(2.0)]);
        assert_eq!(tokens("$mod"), vec![Token::Dollar, name("mod")]);
    }

    #[test]
    fn test_star_after_star() {
        // wildcard, multiply, wildcard
        assert_eq!(tokens("* * *"), vec![Token::Star, Token::Star, Token::Star]);
        let mut lexer = Lexer::new("* and");
        assert_eq!(lexer.next_token().unwrap(), Token::Star);
        assert_eq!(lexer.next_token().unwrap(), Token::And);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokens(".5"), vec![Token::Number(0.5)]);
        assert_eq!(tokens("12.25"), vec![Token::Number(12.25)]);
        assert_eq!(tokens("3."), vec![Token::Number(3.0)]);
    }

    #[test]
    fn test_errors() {
        assert!(Lexer::new("'open").tokenize().is_err());
        assert!(Lexer::new("a ! b").tokenize().is_err());
        assert!(Lexer::new("#").tokenize().is_err());
    }
}
