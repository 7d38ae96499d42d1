//! Base-URI resolution
//!
//! Absolute bases are joined through `url::Url`. Bases that are not
//! absolute URIs (plain relative paths) fall back to path-style merging so
//! that `xml:base` chains still compose when no document URI is known.

use url::Url;

/// Resolve `reference` against an optional base URI
pub fn resolve_uri(base: Option<&str>, reference: &str) -> String {
    if Url::parse(reference).is_ok() {
        return reference.to_string();
    }
    let Some(base) = base.filter(|b| !b.is_empty()) else {
        return reference.to_string();
    };

    match Url::parse(base) {
        Ok(base_url) => match base_url.join(reference) {
            Ok(joined) => joined.to_string(),
            Err(_) => merge_paths(base, reference),
        },
        Err(_) => merge_paths(base, reference),
    }
}

/// True when the text parses as an absolute URI
pub fn is_absolute(uri: &str) -> bool {
    Url::parse(uri).is_ok()
}

fn merge_paths(base: &str, reference: &str) -> String {
    if reference.is_empty() {
        return base.to_string();
    }
    if reference.starts_with('/') {
        return reference.to_string();
    }
    match base.rfind('/') {
        Some(slash) => format!("{}{}", &base[..=slash], reference),
        None => reference.to_string(),
    }
}
