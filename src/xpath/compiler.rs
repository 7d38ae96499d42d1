//! XPath Expression Compiler
//!
//! Flattens the AST into a stack-machine op list. Compiled expressions are
//! immutable and context-free: namespace prefixes and variables stay
//! symbolic and are resolved against a `DynamicContext` at evaluation time,
//! so one compiled form can be shared across evaluations.

use super::parser::{Axis, BinaryOp, Expr, NodeTest, Step};
use crate::error::XPathError;

/// Compiled XPath expression
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    source: String,
    pub ops: Vec<Op>,
}

/// Compiled operation
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Push the document node
    Root,
    /// Push the context node
    Context,
    /// Replace the node-set on top of the stack with the union of each
    /// node's axis selection, predicates applied per context node
    Step {
        axis: Axis,
        test: NodeTest,
        predicates: Vec<Predicate>,
    },
    /// Apply a predicate to the whole node-set on top of the stack
    Filter(Predicate),
    /// Union two node sets
    Union,
    Number(f64),
    String(String),
    /// Call function
    Call(String, usize), // name, arg count
    Binary(BinaryOp),
    /// Short-circuit `and`/`or`: the right operand only runs when needed
    Logical(BinaryOp, Box<CompiledExpr>),
    Negate,
    Variable(String),
}

/// Compiled predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Fast path for a literal `[n]`
    Position(f64),
    Expr(CompiledExpr),
}

impl CompiledExpr {
    /// Compile a parsed expression
    pub fn compile(expr: &Expr, source: &str) -> Self {
        let mut ops = Vec::new();
        Self::compile_expr(expr, source, &mut ops);
        CompiledExpr {
            source: source.to_string(),
            ops,
        }
    }

    /// Expression text this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    fn compile_expr(expr: &Expr, source: &str, ops: &mut Vec<Op>) {
        match expr {
            Expr::Root => ops.push(Op::Root),
            Expr::Number(n) => ops.push(Op::Number(*n)),
            Expr::String(s) => ops.push(Op::String(s.clone())),
            Expr::Variable(name) => ops.push(Op::Variable(name.clone())),
            Expr::Negate(inner) => {
                Self::compile_expr(inner, source, ops);
                ops.push(Op::Negate);
            }
            Expr::Binary(left, op @ (BinaryOp::And | BinaryOp::Or), right) => {
                Self::compile_expr(left, source, ops);
                ops.push(Op::Logical(*op, Box::new(CompiledExpr::compile(right, source))));
            }
            Expr::Binary(left, op, right) => {
                Self::compile_expr(left, source, ops);
                Self::compile_expr(right, source, ops);
                ops.push(Op::Binary(*op));
            }
            Expr::Union(left, right) => {
                Self::compile_expr(left, source, ops);
                Self::compile_expr(right, source, ops);
                ops.push(Op::Union);
            }
            Expr::Path(base, step) => {
                Self::compile_expr(base, source, ops);
                ops.push(Self::compile_step(step, source));
            }
            Expr::Step(step) => {
                ops.push(Op::Context);
                ops.push(Self::compile_step(step, source));
            }
            Expr::Filter(base, pred) => {
                Self::compile_expr(base, source, ops);
                ops.push(Op::Filter(Self::compile_predicate(pred, source)));
            }
            Expr::Function(name, args) => {
                for arg in args {
                    Self::compile_expr(arg, source, ops);
                }
                ops.push(Op::Call(name.clone(), args.len()));
            }
        }
    }

    fn compile_step(step: &Step, source: &str) -> Op {
        Op::Step {
            axis: step.axis,
            test: step.node_test.clone(),
            predicates: step
                .predicates
                .iter()
                .map(|p| Self::compile_predicate(p, source))
                .collect(),
        }
    }

    fn compile_predicate(pred: &Expr, source: &str) -> Predicate {
        match pred {
            Expr::Number(n) => Predicate::Position(*n),
            other => Predicate::Expr(CompiledExpr::compile(other, source)),
        }
    }
}

/// Compile an XPath expression string
pub fn compile(xpath: &str) -> Result<CompiledExpr, XPathError> {
    let expr = super::parser::parse(xpath)?;
    Ok(CompiledExpr::compile(&expr, xpath))
}
