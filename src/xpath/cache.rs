//! Compiled expression cache
//!
//! Expression text maps to one immutable compiled form shared through an
//! `Arc`. Every lookup returns a fresh [`XPathExpr`] handle around that
//! shared form; per-handle state (sort keys) lives in the handle, so
//! callers can customise their copy without affecting anyone else.
//! Entries are never evicted and failed compilations are not cached.

use super::compiler::{self, CompiledExpr};
use super::context::DynamicContext;
use super::eval::{evaluate_compiled, EvalContext};
use super::value::XPathValue;
use crate::dom::{NodeId, XmlDocument};
use crate::error::XPathError;
use crate::navigator::{DocumentNavigator, NodeIterator};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

static GLOBAL: Lazy<ExpressionCache> = Lazy::new(ExpressionCache::new);

/// Process-wide map from expression text to compiled form
#[derive(Debug, Default)]
pub struct ExpressionCache {
    entries: RwLock<HashMap<String, Arc<CompiledExpr>>>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> &'static ExpressionCache {
        &GLOBAL
    }

    /// Handle for `text`, compiling it on first use
    pub fn compile(&self, text: &str) -> Result<XPathExpr, XPathError> {
        if let Some(compiled) = self.entries.read().get(text) {
            trace!(expr = text, "expression cache hit");
            return Ok(XPathExpr::new(Arc::clone(compiled)));
        }

        let mut entries = self.entries.write();
        // Another thread may have compiled it between the two locks
        if let Some(compiled) = entries.get(text) {
            return Ok(XPathExpr::new(Arc::clone(compiled)));
        }
        trace!(expr = text, "expression cache miss");
        let compiled = Arc::new(compiler::compile(text)?);
        entries.insert(text.to_string(), Arc::clone(&compiled));
        Ok(XPathExpr::new(compiled))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// How sort key values compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDataType {
    #[default]
    Text,
    Number,
}

/// Sort key attached to an expression handle
#[derive(Debug, Clone)]
pub struct SortKey {
    expr: Arc<CompiledExpr>,
    order: SortOrder,
    data_type: SortDataType,
}

impl SortKey {
    pub fn expression(&self) -> &str {
        self.expr.source()
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn data_type(&self) -> SortDataType {
        self.data_type
    }
}

enum SortValue {
    Text(String),
    Number(f64),
}

impl SortValue {
    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            // NaN sorts first
            (SortValue::Number(a), SortValue::Number(b)) => a
                .partial_cmp(b)
                .unwrap_or_else(|| b.is_nan().cmp(&a.is_nan())),
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Less,
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Greater,
        }
    }
}

/// Independent handle on a cached compiled expression
#[derive(Debug, Clone)]
pub struct XPathExpr {
    compiled: Arc<CompiledExpr>,
    sort_keys: Vec<SortKey>,
}

impl XPathExpr {
    fn new(compiled: Arc<CompiledExpr>) -> Self {
        XPathExpr {
            compiled,
            sort_keys: Vec::new(),
        }
    }

    pub fn expression(&self) -> &str {
        self.compiled.source()
    }

    pub fn compiled(&self) -> &CompiledExpr {
        &self.compiled
    }

    /// Whether both handles wrap the same cached compiled form
    pub fn shares_compiled_form(&self, other: &XPathExpr) -> bool {
        Arc::ptr_eq(&self.compiled, &other.compiled)
    }

    /// Order `select` results by `key`, evaluated per node. Later keys
    /// break ties left by earlier ones.
    pub fn add_sort(&mut self, key: &str, order: SortOrder, data_type: SortDataType) -> Result<(), XPathError> {
        let expr = ExpressionCache::global().compile(key)?.compiled;
        self.sort_keys.push(SortKey { expr, order, data_type });
        Ok(())
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.sort_keys
    }

    /// Evaluate with the navigator's node as context
    pub fn evaluate(&self, nav: &DocumentNavigator, env: &DynamicContext) -> Result<XPathValue, XPathError> {
        let doc: &XmlDocument = nav.document();
        evaluate_compiled(&self.compiled, &EvalContext::new(doc, env, nav.context_node()))
    }

    /// Evaluate to a node-set, in document order unless sort keys are set
    pub fn select(&self, nav: &DocumentNavigator, env: &DynamicContext) -> Result<NodeIterator, XPathError> {
        let mut nodes = self.evaluate(nav, env)?.into_nodeset().ok_or_else(|| {
            XPathError::Type(format!("'{}' does not evaluate to a node-set", self.expression()))
        })?;
        self.sort(nav.document(), env, &mut nodes)?;
        Ok(NodeIterator::new(Arc::clone(nav.document()), nodes))
    }

    fn sort(&self, doc: &XmlDocument, env: &DynamicContext, nodes: &mut Vec<NodeId>) -> Result<(), XPathError> {
        if self.sort_keys.is_empty() {
            return Ok(());
        }
        let mut keyed = Vec::with_capacity(nodes.len());
        for &id in nodes.iter() {
            let ctx = EvalContext::new(doc, env, id);
            let mut values = Vec::with_capacity(self.sort_keys.len());
            for key in &self.sort_keys {
                let value = evaluate_compiled(&key.expr, &ctx)?;
                values.push(match key.data_type {
                    SortDataType::Text => SortValue::Text(value.to_string_value(doc)),
                    SortDataType::Number => SortValue::Number(value.to_number(doc)),
                });
            }
            keyed.push((values, id));
        }

        keyed.sort_by(|(a, _), (b, _)| {
            self.sort_keys
                .iter()
                .zip(a.iter().zip(b))
                .map(|(key, (x, y))| match key.order {
                    SortOrder::Ascending => x.compare(y),
                    SortOrder::Descending => y.compare(x),
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        *nodes = keyed.into_iter().map(|(_, id)| id).collect();
        Ok(())
    }
}

/// Compile through the process-wide cache
pub fn compile(text: &str) -> Result<XPathExpr, XPathError> {
    ExpressionCache::global().compile(text)
}

/// Evaluate `expr` with `nav` as context node
pub fn evaluate(nav: &DocumentNavigator, expr: &str, env: Option<&DynamicContext>) -> Result<XPathValue, XPathError> {
    let default = DynamicContext::new();
    compile(expr)?.evaluate(nav, env.unwrap_or(&default))
}

/// Select the nodes `expr` identifies from `nav`, in document order
pub fn select(nav: &DocumentNavigator, expr: &str, env: Option<&DynamicContext>) -> Result<NodeIterator, XPathError> {
    let default = DynamicContext::new();
    compile(expr)?.select(nav, env.unwrap_or(&default))
}

/// Select and order the result by `sort_key`
pub fn select_sorted(
    nav: &DocumentNavigator,
    expr: &str,
    sort_key: &str,
    order: SortOrder,
    data_type: SortDataType,
    env: Option<&DynamicContext>,
) -> Result<NodeIterator, XPathError> {
    let default = DynamicContext::new();
    let mut handle = compile(expr)?;
    handle.add_sort(sort_key, order, data_type)?;
    handle.select(nav, env.unwrap_or(&default))
}
