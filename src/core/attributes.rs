//! XML Attribute Parsing
//!
//! Parses XML attributes from tag content.

use super::entities::decode_text;
use super::scanner::{is_name_byte, is_name_start_byte};
use memchr::memchr;
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: Cow<'a, [u8]>,
    /// Attribute value (entities decoded)
    pub value: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    pub fn new(name: Cow<'a, [u8]>, value: Cow<'a, [u8]>) -> Self {
        Attribute { name, value }
    }

    /// Build an owned attribute from strings
    pub fn owned(name: &str, value: &str) -> Attribute<'static> {
        Attribute {
            name: Cow::Owned(name.as_bytes().to_vec()),
            value: Cow::Owned(value.as_bytes().to_vec()),
        }
    }

    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(self.name.as_ref()).ok()
    }

    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(self.value.as_ref()).ok()
    }

    /// Namespace prefix (before colon), if any
    pub fn prefix(&self) -> Option<&[u8]> {
        let name = self.name.as_ref();
        memchr(b':', name).map(|pos| &name[..pos])
    }

    /// Local name (after colon)
    pub fn local_name(&self) -> &[u8] {
        let name = self.name.as_ref();
        match memchr(b':', name) {
            Some(pos) => &name[pos + 1..],
            None => name,
        }
    }

    /// True for `xmlns` and `xmlns:*` declarations
    pub fn is_namespace_declaration(&self) -> bool {
        let name = self.name.as_ref();
        name == b"xmlns" || name.starts_with(b"xmlns:")
    }

    pub fn into_owned(self) -> Attribute<'static> {
        Attribute {
            name: Cow::Owned(self.name.into_owned()),
            value: Cow::Owned(self.value.into_owned()),
        }
    }
}

/// Parse attributes from raw tag content (after the element name)
///
/// In lenient mode malformed fragments are skipped; in strict mode the
/// first problem is reported.
pub fn parse_attributes(input: &[u8], strict: bool) -> Result<Vec<Attribute<'_>>, &'static str> {
    let mut attrs = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() || input[pos] == b'/' || input[pos] == b'>' {
            break;
        }

        if !is_name_start_byte(input[pos]) {
            if strict {
                return Err("Attribute name must start with letter, underscore, or colon");
            }
            pos += 1;
            continue;
        }
        let name_start = pos;
        while pos < input.len() && is_name_byte(input[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() || input[pos] != b'=' {
            if strict {
                return Err("Attribute must have a value");
            }
            continue;
        }
        pos += 1;
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        let quote = match input.get(pos) {
            Some(&q) if q == b'"' || q == b'\'' => q,
            _ => {
                if strict {
                    return Err("Attribute value must be quoted");
                }
                // Unquoted value: read to the next whitespace
                let value_start = pos;
                while pos < input.len() && !is_whitespace(input[pos]) {
                    pos += 1;
                }
                let value = &input[value_start..pos];
                attrs.push(Attribute::new(Cow::Borrowed(name), decode_text(value)));
                continue;
            }
        };
        pos += 1;
        let value_start = pos;
        let Some(len) = memchr(quote, &input[value_start..]) else {
            if strict {
                return Err("Unterminated attribute value");
            }
            break;
        };
        let value = &input[value_start..value_start + len];
        pos = value_start + len + 1;

        if strict && memchr(b'<', value).is_some() {
            return Err("'<' not allowed in attribute value");
        }
        if strict && attrs.iter().any(|a: &Attribute<'_>| a.name.as_ref() == name) {
            return Err("Duplicate attribute");
        }

        attrs.push(Attribute::new(Cow::Borrowed(name), normalize_value(decode_text(value))));
    }

    Ok(attrs)
}

/// Attribute-value normalization of literal whitespace characters
fn normalize_value(value: Cow<'_, [u8]>) -> Cow<'_, [u8]> {
    if !value.iter().any(|&b| matches!(b, b'\t' | b'\n' | b'\r')) {
        return value;
    }
    Cow::Owned(
        value
            .iter()
            .map(|&b| if matches!(b, b'\t' | b'\n' | b'\r') { b' ' } else { b })
            .collect(),
    )
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}
