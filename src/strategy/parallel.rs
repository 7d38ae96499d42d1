//! Parallel Pointer Resolution
//!
//! Uses Rayon to resolve a batch of pointers against one shared document.
//! Pointer compilation and evaluation share the process-wide expression
//! cache, so identical expressions compile once across threads.

use crate::error::{PointerError, XPathError};
use crate::navigator::{DocumentNavigator, NodeIterator};
use crate::pointer::resolve;
use crate::xpath::{select, DynamicContext};
use rayon::prelude::*;

/// Resolve each pointer against `nav`, results in input order
pub fn resolve_parallel(nav: &DocumentNavigator, pointers: &[&str]) -> Vec<Result<NodeIterator, PointerError>> {
    pointers.par_iter().map(|pointer| resolve(nav, pointer)).collect()
}

/// Select `xpath` and map each resulting node in parallel
pub fn xpath_map<F, T>(
    nav: &DocumentNavigator,
    xpath: &str,
    env: Option<&DynamicContext>,
    mapper: F,
) -> Result<Vec<T>, XPathError>
where
    F: Fn(DocumentNavigator) -> T + Sync + Send,
    T: Send,
{
    let nodes = select(nav, xpath, env)?;
    let doc = nodes.document();
    Ok(nodes
        .node_ids()
        .par_iter()
        .map(|&id| mapper(DocumentNavigator::at(doc.clone(), id)))
        .collect())
}
