//! XPath Evaluation Engine
//!
//! Runs compiled op lists against any `DocumentAccess` implementation.

use super::axes::{matches_node_test, navigate};
use super::compiler::{CompiledExpr, Op, Predicate};
use super::context::{DynamicContext, VariableValue};
use super::functions;
use super::parser::{BinaryOp, NodeTest};
use super::value::XPathValue;
use crate::dom::{DocumentAccess, NodeId};
use crate::error::XPathError;
use std::collections::HashSet;

/// Evaluation context - generic over document type
pub struct EvalContext<'a, D: DocumentAccess> {
    pub doc: &'a D,
    pub env: &'a DynamicContext,
    pub node: NodeId,
    pub position: usize,
    pub size: usize,
}

impl<'a, D: DocumentAccess> EvalContext<'a, D> {
    pub fn new(doc: &'a D, env: &'a DynamicContext, node: NodeId) -> Self {
        EvalContext {
            doc,
            env,
            node,
            position: 1,
            size: 1,
        }
    }

    fn at(&self, node: NodeId, position: usize, size: usize) -> Self {
        EvalContext {
            doc: self.doc,
            env: self.env,
            node,
            position,
            size,
        }
    }
}

/// Compile and evaluate an expression from a context node, bypassing the
/// expression cache
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate_from_node<D: DocumentAccess>(
    doc: &D,
    context_node: NodeId,
    xpath: &str,
    env: &DynamicContext,
) -> Result<XPathValue, XPathError> {
    let compiled = super::compiler::compile(xpath)?;
    evaluate_compiled(&compiled, &EvalContext::new(doc, env, context_node))
}

fn pop(stack: &mut Vec<XPathValue>) -> Result<XPathValue, XPathError> {
    stack
        .pop()
        .ok_or_else(|| XPathError::Type("malformed expression".to_string()))
}

fn pop_nodeset(stack: &mut Vec<XPathValue>, what: &str) -> Result<Vec<NodeId>, XPathError> {
    match pop(stack)? {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        other => Err(XPathError::Type(format!("{} requires a node-set, found {}", what, other.type_name()))),
    }
}

/// Evaluate a compiled expression
pub fn evaluate_compiled<D: DocumentAccess>(
    expr: &CompiledExpr,
    ctx: &EvalContext<'_, D>,
) -> Result<XPathValue, XPathError> {
    let mut stack: Vec<XPathValue> = Vec::new();

    for op in &expr.ops {
        match op {
            // The document node, for absolute paths
            Op::Root => stack.push(XPathValue::single_node(0)),

            Op::Context => stack.push(XPathValue::single_node(ctx.node)),

            Op::Step {
                axis,
                test,
                predicates,
            } => {
                let nodes = pop_nodeset(&mut stack, "a location step")?;
                let uri = match test {
                    NodeTest::QName(prefix, _) | NodeTest::NamespaceWildcard(prefix) => ctx
                        .env
                        .lookup_namespace(prefix)
                        .ok_or_else(|| XPathError::UnboundPrefix(prefix.clone()))?,
                    _ => "",
                };

                let mut seen = HashSet::with_capacity(nodes.len());
                let mut result = Vec::with_capacity(nodes.len());
                for node in nodes {
                    // Axis order, so positions count from the context node
                    let mut selected: Vec<NodeId> = navigate(ctx.doc, node, *axis)
                        .into_iter()
                        .filter(|&c| matches_node_test(ctx.doc, c, *axis, test, uri))
                        .collect();
                    for pred in predicates {
                        selected = apply_predicate(selected, pred, ctx)?;
                    }
                    result.extend(selected.into_iter().filter(|&c| seen.insert(c)));
                }
                // Node ids are assigned in document order
                result.sort_unstable();
                stack.push(XPathValue::NodeSet(result));
            }

            Op::Filter(pred) => {
                let nodes = pop_nodeset(&mut stack, "a predicate")?;
                stack.push(XPathValue::NodeSet(apply_predicate(nodes, pred, ctx)?));
            }

            Op::Union => {
                let right = pop_nodeset(&mut stack, "'|'")?;
                let mut left = pop_nodeset(&mut stack, "'|'")?;
                left.extend(right);
                left.sort_unstable();
                left.dedup();
                stack.push(XPathValue::NodeSet(left));
            }

            Op::Number(n) => stack.push(XPathValue::Number(*n)),

            Op::String(s) => stack.push(XPathValue::String(s.clone())),

            Op::Variable(name) => {
                let value = ctx
                    .env
                    .variable(name)
                    .ok_or_else(|| XPathError::UnboundVariable(name.clone()))?;
                stack.push(variable_value(value));
            }

            Op::Negate => {
                let value = pop(&mut stack)?;
                stack.push(XPathValue::Number(-value.to_number(ctx.doc)));
            }

            Op::Logical(op, rhs) => {
                let left = pop(&mut stack)?.to_boolean();
                let result = match op {
                    BinaryOp::And if !left => false,
                    BinaryOp::Or if left => true,
                    _ => evaluate_compiled(rhs, ctx)?.to_boolean(),
                };
                stack.push(XPathValue::Boolean(result));
            }

            Op::Binary(op) => {
                let right = pop(&mut stack)?;
                let left = pop(&mut stack)?;
                let doc = ctx.doc;
                let result = match op {
                    BinaryOp::Add => XPathValue::Number(left.to_number(doc) + right.to_number(doc)),
                    BinaryOp::Sub => XPathValue::Number(left.to_number(doc) - right.to_number(doc)),
                    BinaryOp::Mul => XPathValue::Number(left.to_number(doc) * right.to_number(doc)),
                    BinaryOp::Div => XPathValue::Number(left.to_number(doc) / right.to_number(doc)),
                    BinaryOp::Mod => XPathValue::Number(left.to_number(doc) % right.to_number(doc)),
                    BinaryOp::And => XPathValue::Boolean(left.to_boolean() && right.to_boolean()),
                    BinaryOp::Or => XPathValue::Boolean(left.to_boolean() || right.to_boolean()),
                    comparison => XPathValue::Boolean(compare(doc, *comparison, &left, &right)),
                };
                stack.push(result);
            }

            Op::Call(name, arg_count) => {
                let split = stack
                    .len()
                    .checked_sub(*arg_count)
                    .ok_or_else(|| XPathError::Type("malformed expression".to_string()))?;
                let args = stack.split_off(split);
                stack.push(functions::call(name, args, ctx)?);
            }
        }
    }

    pop(&mut stack)
}

/// Filter `nodes` (in their current order) by one predicate
fn apply_predicate<D: DocumentAccess>(
    nodes: Vec<NodeId>,
    pred: &Predicate,
    ctx: &EvalContext<'_, D>,
) -> Result<Vec<NodeId>, XPathError> {
    match pred {
        Predicate::Position(n) => {
            let hit = (n.fract() == 0.0 && *n >= 1.0)
                .then(|| nodes.get(*n as usize - 1).copied())
                .flatten();
            Ok(hit.into_iter().collect())
        }
        Predicate::Expr(expr) => {
            let size = nodes.len();
            let mut filtered = Vec::new();
            for (i, &node) in nodes.iter().enumerate() {
                let result = evaluate_compiled(expr, &ctx.at(node, i + 1, size))?;
                let include = match result {
                    XPathValue::Number(n) => n == (i + 1) as f64,
                    other => other.to_boolean(),
                };
                if include {
                    filtered.push(node);
                }
            }
            Ok(filtered)
        }
    }
}

fn variable_value(value: &VariableValue) -> XPathValue {
    match value {
        VariableValue::String(s) | VariableValue::Any(s) => XPathValue::String(s.clone()),
        VariableValue::Boolean(b) => XPathValue::Boolean(*b),
        VariableValue::Number(n) => XPathValue::Number(*n),
        VariableValue::Navigator(nav) => XPathValue::single_node(nav.context_node()),
        VariableValue::NodeSet(ids) => {
            let mut ids = ids.clone();
            ids.sort_unstable();
            ids.dedup();
            XPathValue::NodeSet(ids)
        }
    }
}

/// `=`, `!=`, `<`, `<=`, `>`, `>=` with node-set existential semantics
fn compare<D: DocumentAccess>(doc: &D, op: BinaryOp, left: &XPathValue, right: &XPathValue) -> bool {
    let node_string = |id: NodeId| XPathValue::String(doc.string_value(id));
    match (left, right) {
        (XPathValue::NodeSet(_), XPathValue::Boolean(_)) | (XPathValue::Boolean(_), XPathValue::NodeSet(_)) => {
            compare_atomic(
                doc,
                op,
                &XPathValue::Boolean(left.to_boolean()),
                &XPathValue::Boolean(right.to_boolean()),
            )
        }
        (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) => {
            let rights: Vec<XPathValue> = r.iter().map(|&id| node_string(id)).collect();
            l.iter().any(|&id| {
                let lv = node_string(id);
                rights.iter().any(|rv| compare_atomic(doc, op, &lv, rv))
            })
        }
        (XPathValue::NodeSet(l), other) => l.iter().any(|&id| compare_atomic(doc, op, &node_string(id), other)),
        (other, XPathValue::NodeSet(r)) => r.iter().any(|&id| compare_atomic(doc, op, other, &node_string(id))),
        _ => compare_atomic(doc, op, left, right),
    }
}

fn compare_atomic<D: DocumentAccess>(doc: &D, op: BinaryOp, left: &XPathValue, right: &XPathValue) -> bool {
    let either = |f: fn(&XPathValue) -> bool| f(left) || f(right);
    match op {
        BinaryOp::Eq | BinaryOp::NotEq => {
            let equal = if either(|v| matches!(v, XPathValue::Boolean(_))) {
                left.to_boolean() == right.to_boolean()
            } else if either(|v| matches!(v, XPathValue::Number(_))) {
                left.to_number(doc) == right.to_number(doc)
            } else {
                left.to_string_value(doc) == right.to_string_value(doc)
            };
            (op == BinaryOp::Eq) == equal
        }
        _ => {
            let (l, r) = (left.to_number(doc), right.to_number(doc));
            match op {
                BinaryOp::Lt => l < r,
                BinaryOp::LtEq => l <= r,
                BinaryOp::Gt => l > r,
                _ => l >= r,
            }
        }
    }
}
