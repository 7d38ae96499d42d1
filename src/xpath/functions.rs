//! XPath 1.0 Functions
//!
//! Node Set Functions:
//! - position(), last(), count(), id(), local-name(), namespace-uri(), name()
//!
//! String Functions:
//! - string(), concat(), starts-with(), contains(), substring(),
//!   substring-before(), substring-after(), string-length(),
//!   normalize-space(), translate()
//!
//! Boolean Functions:
//! - boolean(), not(), true(), false(), lang()
//!
//! Number Functions:
//! - number(), sum(), floor(), ceiling(), round()

use super::eval::EvalContext;
use super::value::{parse_number, XPathValue};
use crate::dom::{DocumentAccess, NodeId, NodeKind};
use crate::error::XPathError;

/// Evaluate a function call
pub fn call<D: DocumentAccess>(
    name: &str,
    args: Vec<XPathValue>,
    ctx: &EvalContext<'_, D>,
) -> Result<XPathValue, XPathError> {
    let doc = ctx.doc;
    match name {
        // Node Set Functions
        "position" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Number(ctx.position as f64))
        }
        "last" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Number(ctx.size as f64))
        }
        "count" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Number(nodeset_arg(name, &args[0])?.len() as f64))
        }
        "id" => fn_id(args, ctx),
        "local-name" => name_of(name, &args, ctx, |id| doc.node_local_name(id)),
        "namespace-uri" => name_of(name, &args, ctx, |id| doc.node_namespace(id)),
        "name" => name_of(name, &args, ctx, |id| doc.node_name(id)),

        // String Functions
        "string" => {
            arity(name, &args, 0, 1)?;
            Ok(XPathValue::String(string_arg(&args, 0, ctx)))
        }
        "concat" => {
            arity(name, &args, 2, usize::MAX)?;
            Ok(XPathValue::String(args.iter().map(|a| a.to_string_value(doc)).collect()))
        }
        "starts-with" => string_pair(name, &args, ctx, |s, p| XPathValue::Boolean(s.starts_with(p))),
        "contains" => string_pair(name, &args, ctx, |s, p| XPathValue::Boolean(s.contains(p))),
        "substring-before" => string_pair(name, &args, ctx, |s, p| {
            XPathValue::String(s.find(p).map_or_else(String::new, |i| s[..i].to_string()))
        }),
        "substring-after" => string_pair(name, &args, ctx, |s, p| {
            XPathValue::String(s.find(p).map_or_else(String::new, |i| s[i + p.len()..].to_string()))
        }),
        "substring" => fn_substring(args, ctx),
        "string-length" => {
            arity(name, &args, 0, 1)?;
            Ok(XPathValue::Number(string_arg(&args, 0, ctx).chars().count() as f64))
        }
        "normalize-space" => {
            arity(name, &args, 0, 1)?;
            let s = string_arg(&args, 0, ctx);
            Ok(XPathValue::String(s.split_ascii_whitespace().collect::<Vec<_>>().join(" ")))
        }
        "translate" => fn_translate(args, ctx),

        // Boolean Functions
        "boolean" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Boolean(args[0].to_boolean()))
        }
        "not" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Boolean(!args[0].to_boolean()))
        }
        "true" | "false" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Boolean(name == "true"))
        }
        "lang" => fn_lang(args, ctx),

        // Number Functions
        "number" => {
            arity(name, &args, 0, 1)?;
            let n = match args.first() {
                Some(arg) => arg.to_number(doc),
                None => parse_number(&doc.string_value(ctx.node)),
            };
            Ok(XPathValue::Number(n))
        }
        "sum" => {
            arity(name, &args, 1, 1)?;
            let nodes = nodeset_arg(name, &args[0])?;
            Ok(XPathValue::Number(
                nodes.iter().map(|&id| parse_number(&doc.string_value(id))).sum(),
            ))
        }
        "floor" | "ceiling" | "round" => {
            arity(name, &args, 1, 1)?;
            let n = args[0].to_number(doc);
            Ok(XPathValue::Number(match name {
                "floor" => n.floor(),
                "ceiling" => n.ceil(),
                _ => xpath_round(n),
            }))
        }

        _ => Err(match ctx.env.resolve_function(name, args.len()) {
            Some(_) => XPathError::argument(name, "extension functions cannot be invoked"),
            None => XPathError::UnknownFunction(name.to_string()),
        }),
    }
}

fn arity(name: &str, args: &[XPathValue], min: usize, max: usize) -> Result<(), XPathError> {
    if args.len() < min || args.len() > max {
        let expected = match (min, max) {
            (min, max) if min == max => format!("exactly {}", min),
            (min, usize::MAX) => format!("at least {}", min),
            (min, max) => format!("{} to {}", min, max),
        };
        return Err(XPathError::argument(
            name,
            format!("expected {} argument(s), got {}", expected, args.len()),
        ));
    }
    Ok(())
}

fn nodeset_arg<'v>(name: &str, value: &'v XPathValue) -> Result<&'v [NodeId], XPathError> {
    value
        .as_nodeset()
        .ok_or_else(|| XPathError::argument(name, format!("expected a node-set, got a {}", value.type_name())))
}

/// String value of argument `index`, or of the context node when absent
fn string_arg<D: DocumentAccess>(args: &[XPathValue], index: usize, ctx: &EvalContext<'_, D>) -> String {
    match args.get(index) {
        Some(arg) => arg.to_string_value(ctx.doc),
        None => ctx.doc.string_value(ctx.node),
    }
}

fn string_pair<D: DocumentAccess>(
    name: &str,
    args: &[XPathValue],
    ctx: &EvalContext<'_, D>,
    f: impl FnOnce(&str, &str) -> XPathValue,
) -> Result<XPathValue, XPathError> {
    arity(name, args, 2, 2)?;
    Ok(f(&args[0].to_string_value(ctx.doc), &args[1].to_string_value(ctx.doc)))
}

/// local-name(), namespace-uri() and name() of the first node in the
/// argument, or of the context node
fn name_of<'d, D: DocumentAccess>(
    name: &str,
    args: &[XPathValue],
    ctx: &EvalContext<'d, D>,
    get: impl Fn(NodeId) -> &'d str,
) -> Result<XPathValue, XPathError> {
    arity(name, args, 0, 1)?;
    let node = match args.first() {
        Some(arg) => nodeset_arg(name, arg)?.first().copied(),
        None => Some(ctx.node),
    };
    Ok(XPathValue::String(node.map_or("", get).to_string()))
}

/// id(): whitespace-separated ID tokens from a string, or from the string
/// value of every node in a node-set
fn fn_id<D: DocumentAccess>(args: Vec<XPathValue>, ctx: &EvalContext<'_, D>) -> Result<XPathValue, XPathError> {
    arity("id", &args, 1, 1)?;
    let text = match &args[0] {
        XPathValue::NodeSet(nodes) => nodes
            .iter()
            .map(|&id| ctx.doc.string_value(id))
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string_value(ctx.doc),
    };
    let mut found: Vec<NodeId> = text
        .split_ascii_whitespace()
        .filter_map(|token| ctx.doc.element_by_id(token))
        .collect();
    found.sort_unstable();
    found.dedup();
    Ok(XPathValue::NodeSet(found))
}

fn fn_substring<D: DocumentAccess>(
    args: Vec<XPathValue>,
    ctx: &EvalContext<'_, D>,
) -> Result<XPathValue, XPathError> {
    arity("substring", &args, 2, 3)?;
    let s = args[0].to_string_value(ctx.doc);
    let start = xpath_round(args[1].to_number(ctx.doc));
    let end = match args.get(2) {
        Some(len) => start + xpath_round(len.to_number(ctx.doc)),
        None => f64::INFINITY,
    };
    // Character positions are 1-based; NaN bounds select nothing
    let result = s
        .chars()
        .enumerate()
        .filter(|(i, _)| {
            let p = (*i + 1) as f64;
            p >= start && p < end
        })
        .map(|(_, c)| c)
        .collect();
    Ok(XPathValue::String(result))
}

fn fn_translate<D: DocumentAccess>(
    args: Vec<XPathValue>,
    ctx: &EvalContext<'_, D>,
) -> Result<XPathValue, XPathError> {
    arity("translate", &args, 3, 3)?;
    let s = args[0].to_string_value(ctx.doc);
    let from: Vec<char> = args[1].to_string_value(ctx.doc).chars().collect();
    let to: Vec<char> = args[2].to_string_value(ctx.doc).chars().collect();

    let result = s
        .chars()
        .filter_map(|c| match from.iter().position(|&fc| fc == c) {
            Some(pos) => to.get(pos).copied(),
            None => Some(c),
        })
        .collect();
    Ok(XPathValue::String(result))
}

fn fn_lang<D: DocumentAccess>(args: Vec<XPathValue>, ctx: &EvalContext<'_, D>) -> Result<XPathValue, XPathError> {
    arity("lang", &args, 1, 1)?;
    let target = args[0].to_string_value(ctx.doc).to_lowercase();

    let mut node = match ctx.doc.kind(ctx.node) {
        Some(NodeKind::Element) => Some(ctx.node),
        _ => ctx.doc.parent(ctx.node),
    };
    while let Some(id) = node {
        if let Some(lang) = ctx.doc.attribute_value(id, "xml:lang") {
            let lang = lang.to_lowercase();
            // Exact match or subtag prefix match (e.g., "en" matches "en-US")
            let matched = lang == target
                || (lang.starts_with(&target) && lang.as_bytes().get(target.len()) == Some(&b'-'));
            return Ok(XPathValue::Boolean(matched));
        }
        node = ctx.doc.parent(id);
    }
    Ok(XPathValue::Boolean(false))
}

/// round(): halves go towards positive infinity
fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else {
        (n + 0.5).floor()
    }
}
