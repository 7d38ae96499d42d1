//! XPath Parser
//!
//! Recursive descent parser for the XPath 1.0 expression grammar.

use super::lexer::{Lexer, Token};
use crate::core::names::split_qname;
use crate::error::XPathError;

/// XPath expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Root path (/)
    Root,
    /// Location step relative to the context node
    Step(Box<Step>),
    /// Path expression (expr/step)
    Path(Box<Expr>, Box<Step>),
    /// Predicate applied to a whole node-set: `(expr)[pred]`
    Filter(Box<Expr>, Box<Expr>),
    /// Union of two expressions (|)
    Union(Box<Expr>, Box<Expr>),
    Function(String, Vec<Expr>),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// Unary negation
    Negate(Box<Expr>),
    Number(f64),
    String(String),
    /// Variable reference, name as written
    Variable(String),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Location step in a path
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn abbreviated(axis: Axis) -> Self {
        Step {
            axis,
            node_test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

/// XPath axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Self_,
    Attribute,
    Namespace,
}

impl Axis {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            "following" => Some(Axis::Following),
            "preceding" => Some(Axis::Preceding),
            "self" => Some(Axis::Self_),
            "attribute" => Some(Axis::Attribute),
            "namespace" => Some(Axis::Namespace),
            _ => None,
        }
    }

    /// Reverse axes number their proximity positions backwards
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Parent | Axis::Ancestor | Axis::AncestorOrSelf | Axis::PrecedingSibling | Axis::Preceding
        )
    }
}

/// Node test in a location step
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// Matches any node of the principal type (*)
    Any,
    /// Unprefixed name; matches names in no namespace
    Name(String),
    /// prefix:local
    QName(String, String),
    /// prefix:*
    NamespaceWildcard(String),
    /// node() - matches any node
    Node,
    /// text() - matches text nodes
    Text,
    /// comment() - matches comments
    Comment,
    /// processing-instruction() - matches PIs
    ProcessingInstruction(Option<String>),
}

/// XPath parser
pub struct Parser<'a> {
    input: &'a str,
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, XPathError> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token().map_err(|m| syntax(input, m))?;
        Ok(Parser { input, lexer, current })
    }

    /// Parse a complete expression; trailing tokens are an error
    pub fn parse(&mut self) -> Result<Expr, XPathError> {
        if self.current == Token::Eof {
            return Err(self.error("empty expression"));
        }
        let expr = self.parse_expr()?;
        if self.current != Token::Eof {
            return Err(self.error(format!("unexpected token {:?}", self.current)));
        }
        Ok(expr)
    }

    fn error(&self, message: impl Into<String>) -> XPathError {
        syntax(self.input, message)
    }

    fn advance(&mut self) -> Result<(), XPathError> {
        self.current = self.lexer.next_token().map_err(|m| syntax(self.input, m))?;
        Ok(())
    }

    fn expect(&mut self, token: Token) -> Result<(), XPathError> {
        if self.current != token {
            return Err(self.error(format!("expected {:?}, found {:?}", token, self.current)));
        }
        self.advance()
    }

    fn parse_expr(&mut self) -> Result<Expr, XPathError> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_and_expr()?;
        while self.current == Token::Or {
            self.advance()?;
            let right = self.parse_and_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::Or, Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_equality_expr()?;
        while self.current == Token::And {
            self.advance()?;
            let right = self.parse_equality_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::And, Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_relational_expr()?;
        loop {
            let op = match self.current {
                Token::Eq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_relational_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_additive_expr()?;
        loop {
            let op = match self.current {
                Token::Lt => BinaryOp::Lt,
                Token::LtEq => BinaryOp::LtEq,
                Token::Gt => BinaryOp::Gt,
                Token::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_unary_expr()?;
        loop {
            // After an operand `*` can only be multiplication
            let op = match self.current {
                Token::Star => BinaryOp::Mul,
                Token::Div => BinaryOp::Div,
                Token::Mod => BinaryOp::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, XPathError> {
        if self.current == Token::Minus {
            self.advance()?;
            let expr = self.parse_unary_expr()?;
            Ok(Expr::Negate(Box::new(expr)))
        } else {
            self.parse_union_expr()
        }
    }

    fn parse_union_expr(&mut self) -> Result<Expr, XPathError> {
        let mut left = self.parse_path_expr()?;
        while self.current == Token::Pipe {
            self.advance()?;
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.current,
            Token::Name(_)
                | Token::PrefixWildcard(_)
                | Token::Star
                | Token::At
                | Token::Axis(_)
                | Token::NodeType(_)
                | Token::Dot
                | Token::DoubleDot
        )
    }

    fn parse_path_expr(&mut self) -> Result<Expr, XPathError> {
        match self.current {
            Token::Slash => {
                self.advance()?;
                if self.starts_step() {
                    self.parse_relative_path(Some(Expr::Root))
                } else {
                    Ok(Expr::Root)
                }
            }
            Token::DoubleSlash => {
                self.advance()?;
                let base = Expr::Path(Box::new(Expr::Root), Box::new(Step::abbreviated(Axis::DescendantOrSelf)));
                self.parse_relative_path(Some(base))
            }
            _ if self.starts_step() => self.parse_relative_path(None),
            _ => {
                let expr = self.parse_filter_expr()?;
                self.parse_path_continuation(expr)
            }
        }
    }

    /// RelativeLocationPath, optionally continuing `base`
    fn parse_relative_path(&mut self, base: Option<Expr>) -> Result<Expr, XPathError> {
        let step = Box::new(self.parse_step()?);
        let expr = match base {
            Some(base) => Expr::Path(Box::new(base), step),
            None => Expr::Step(step),
        };
        self.parse_path_continuation(expr)
    }

    fn parse_path_continuation(&mut self, mut expr: Expr) -> Result<Expr, XPathError> {
        loop {
            match self.current {
                Token::Slash => {
                    self.advance()?;
                }
                Token::DoubleSlash => {
                    self.advance()?;
                    expr = Expr::Path(Box::new(expr), Box::new(Step::abbreviated(Axis::DescendantOrSelf)));
                }
                _ => return Ok(expr),
            }
            let step = self.parse_step()?;
            expr = Expr::Path(Box::new(expr), Box::new(step));
        }
    }

    fn parse_filter_expr(&mut self) -> Result<Expr, XPathError> {
        let mut expr = self.parse_primary_expr()?;
        while self.current == Token::LeftBracket {
            let pred = self.parse_predicate()?;
            expr = Expr::Filter(Box::new(expr), Box::new(pred));
        }
        Ok(expr)
    }

    fn parse_predicate(&mut self) -> Result<Expr, XPathError> {
        self.expect(Token::LeftBracket)?;
        let pred = self.parse_expr()?;
        self.expect(Token::RightBracket)?;
        Ok(pred)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, XPathError> {
        match &self.current {
            Token::Number(n) => {
                let n = *n;
                self.advance()?;
                Ok(Expr::Number(n))
            }
            Token::String(s) => {
                let s = s.clone();
                self.advance()?;
                Ok(Expr::String(s))
            }
            Token::Dollar => {
                self.advance()?;
                match &self.current {
                    Token::Name(name) => {
                        let name = name.clone();
                        self.advance()?;
                        Ok(Expr::Variable(name))
                    }
                    _ => Err(self.error("expected variable name after '$'")),
                }
            }
            Token::LeftParen => {
                self.advance()?;
                let expr = self.parse_expr()?;
                self.expect(Token::RightParen)?;
                Ok(expr)
            }
            Token::FunctionName(name) => {
                let name = name.clone();
                self.advance()?;
                let args = self.parse_function_args()?;
                Ok(Expr::Function(name, args))
            }
            Token::Eof => Err(self.error("unexpected end of expression")),
            other => Err(self.error(format!("unexpected token {:?}", other))),
        }
    }

    fn parse_step(&mut self) -> Result<Step, XPathError> {
        match self.current {
            Token::Dot => {
                self.advance()?;
                return Ok(Step::abbreviated(Axis::Self_));
            }
            Token::DoubleDot => {
                self.advance()?;
                return Ok(Step::abbreviated(Axis::Parent));
            }
            _ => {}
        }

        let axis = match &self.current {
            Token::At => {
                self.advance()?;
                Axis::Attribute
            }
            Token::Axis(name) => {
                let axis = Axis::from_name(name).ok_or_else(|| self.error(format!("unknown axis '{}'", name)))?;
                self.advance()?;
                self.expect(Token::DoubleColon)?;
                axis
            }
            _ => Axis::Child,
        };

        let node_test = self.parse_node_test()?;

        let mut predicates = Vec::new();
        while self.current == Token::LeftBracket {
            predicates.push(self.parse_predicate()?);
        }

        Ok(Step {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, XPathError> {
        let test = match &self.current {
            Token::Star => NodeTest::Any,
            Token::Name(name) => match split_qname(name) {
                ("", local) => NodeTest::Name(local.to_string()),
                (prefix, local) => NodeTest::QName(prefix.to_string(), local.to_string()),
            },
            Token::PrefixWildcard(prefix) => NodeTest::NamespaceWildcard(prefix.clone()),
            Token::NodeType(kind) => {
                let kind = kind.clone();
                self.advance()?;
                self.expect(Token::LeftParen)?;
                let target = match (&self.current, kind.as_str()) {
                    (Token::String(s), "processing-instruction") => {
                        let s = s.clone();
                        self.advance()?;
                        Some(s)
                    }
                    _ => None,
                };
                self.expect(Token::RightParen)?;
                return Ok(match kind.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    _ => NodeTest::ProcessingInstruction(target),
                });
            }
            other => return Err(self.error(format!("expected node test, found {:?}", other))),
        };
        self.advance()?;
        Ok(test)
    }

    fn parse_function_args(&mut self) -> Result<Vec<Expr>, XPathError> {
        self.expect(Token::LeftParen)?;
        let mut args = Vec::new();
        if self.current != Token::RightParen {
            args.push(self.parse_expr()?);
            while self.current == Token::Comma {
                self.advance()?;
                args.push(self.parse_expr()?);
            }
        }
        self.expect(Token::RightParen)?;
        Ok(args)
    }
}

fn syntax(input: &str, message: impl Into<String>) -> XPathError {
    XPathError::Syntax {
        expr: input.to_string(),
        message: message.into(),
    }
}

/// Parse an XPath expression string
pub fn parse(input: &str) -> Result<Expr, XPathError> {
    Parser::new(input)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(test: NodeTest, predicates: Vec<Expr>) -> Box<Step> {
        Box::new(Step {
            axis: Axis::Child,
            node_test: test,
            predicates,
        })
    }

    #[test]
    fn test_absolute_path_with_positions() {
        let expr = parse("/*[1]/*[2]").unwrap();
        let expected = Expr::Path(
            Box::new(Expr::Path(Box::new(Expr::Root), child(NodeTest::Any, vec![Expr::Number(1.0)]))),
            child(NodeTest::Any, vec![Expr::Number(2.0)]),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_function_then_path() {
        let expr = parse("id('chap1')/*[2]").unwrap();
        let expected = Expr::Path(
            Box::new(Expr::Function("id".to_string(), vec![Expr::String("chap1".to_string())])),
            child(NodeTest::Any, vec![Expr::Number(2.0)]),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_qname_step() {
        let expr = parse("ex:foo").unwrap();
        assert_eq!(
            expr,
            Expr::Step(child(NodeTest::QName("ex".to_string(), "foo".to_string()), vec![]))
        );
    }

    #[test]
    fn test_descendant_and_filter() {
        assert!(matches!(parse("//item").unwrap(), Expr::Path(..)));
        assert!(matches!(parse("(//item)[1]").unwrap(), Expr::Filter(..)));
        assert!(matches!(parse("count(//item) * 2").unwrap(), Expr::Binary(_, BinaryOp::Mul, _)));
    }

    #[test]
    fn test_abbreviated_steps() {
        let expr = parse("../@id").unwrap();
        match expr {
            Expr::Path(base, step) => {
                assert_eq!(*base, Expr::Step(Box::new(Step::abbreviated(Axis::Parent))));
                assert_eq!(step.axis, Axis::Attribute);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(parse("/").unwrap(), Expr::Root);
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["", "/a[", "foo(", "a b", "$", "child::", "bogus::a", "1 +"] {
            assert!(
                matches!(parse(bad), Err(XPathError::Syntax { .. })),
                "{:?} should not parse",
                bad
            );
        }
    }
}
