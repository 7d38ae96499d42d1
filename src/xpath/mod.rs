//! XPath 1.0 Engine
//!
//! Expression text goes through lexer → parser → compiler into an op list
//! that the evaluator runs against a `DocumentAccess` document. Compiled
//! forms are shared through [`ExpressionCache`]; prefixes and variables are
//! bound per evaluation by a [`DynamicContext`].
//!
//! - All 13 axes (the namespace axis selects nothing)
//! - The XPath 1.0 core function library, `id()` included
//! - Per-step predicates with reverse-axis proximity positions

pub mod axes;
pub mod cache;
pub mod compiler;
pub mod context;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use cache::{compile, evaluate, select, select_sorted, ExpressionCache, SortDataType, SortOrder, XPathExpr};
pub use compiler::CompiledExpr;
pub use context::{DynamicContext, VariableValue, XPathResultType};
pub use eval::evaluate_from_node;
pub use value::XPathValue;
