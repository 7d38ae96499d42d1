//! DTD attribute-list declarations
//!
//! Only `<!ATTLIST>` entries from the internal subset are collected. They
//! tell the document builder which attributes are of type `ID` so that
//! `id()` lookups and shorthand pointers can find elements, and they carry
//! the declared defaults.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttType {
    CData,
    Id,
    IdRef,
    IdRefs,
    Entity,
    Entities,
    NmToken,
    NmTokens,
    Notation(Vec<Vec<u8>>),
    Enumeration(Vec<Vec<u8>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttDefault {
    Required,
    Implied,
    Fixed(Vec<u8>),
    Default(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttDef {
    pub name: Vec<u8>,
    pub att_type: AttType,
    pub default: AttDefault,
}

/// Attribute lists keyed by element name
#[derive(Debug, Default)]
pub struct DtdDeclarations {
    pub attlists: HashMap<Vec<u8>, Vec<AttDef>>,
}

impl DtdDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect ATTLIST declarations from a DOCTYPE body
    ///
    /// Malformed declarations are skipped. The first definition of an
    /// attribute for an element wins.
    pub fn parse(doctype: &[u8]) -> Self {
        let mut decls = DtdDeclarations::new();
        let Some(open) = memchr::memchr(b'[', doctype) else {
            return decls;
        };
        let subset = &doctype[open + 1..];

        let mut pos = 0;
        while let Some(found) = memchr::memmem::find(&subset[pos..], b"<!ATTLIST") {
            let start = pos + found + b"<!ATTLIST".len();
            let Some(len) = find_decl_end(&subset[start..]) else {
                break;
            };
            decls.add_attlist(&subset[start..start + len]);
            pos = start + len + 1;
        }
        decls
    }

    fn add_attlist(&mut self, body: &[u8]) {
        let mut words = Words::new(body);
        let Some(element) = words.next_word() else {
            return;
        };
        let element = element.to_vec();

        while let Some(name) = words.next_word() {
            let Some(att_type) = words.next_type() else {
                return;
            };
            let Some(default) = words.next_default() else {
                return;
            };
            let defs = self.attlists.entry(element.clone()).or_default();
            if !defs.iter().any(|d| d.name == name) {
                defs.push(AttDef {
                    name: name.to_vec(),
                    att_type,
                    default,
                });
            }
        }
    }

    /// Name of the attribute declared as `ID` for an element
    pub fn id_attribute(&self, element: &[u8]) -> Option<&[u8]> {
        self.attlists
            .get(element)?
            .iter()
            .find(|d| d.att_type == AttType::Id)
            .map(|d| d.name.as_slice())
    }

    /// Declared default values for an element's attributes
    pub fn defaults(&self, element: &[u8]) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.attlists
            .get(element)
            .into_iter()
            .flatten()
            .filter_map(|d| match &d.default {
                AttDefault::Fixed(v) | AttDefault::Default(v) => Some((d.name.as_slice(), v.as_slice())),
                _ => None,
            })
    }

    pub fn is_empty(&self) -> bool {
        self.attlists.is_empty()
    }
}

/// Offset of the '>' ending a declaration, skipping quoted literals
fn find_decl_end(input: &[u8]) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &b) in input.iter().enumerate() {
        match (quote, b) {
            (Some(q), _) if q == b => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn trim(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if !first.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }
    while let [rest @ .., last] = bytes {
        if !last.is_ascii_whitespace() {
            break;
        }
        bytes = rest;
    }
    bytes
}

/// Whitespace-separated cursor over an ATTLIST body
struct Words<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Words<'a> {
    fn new(input: &'a [u8]) -> Self {
        Words { input, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn next_word(&mut self) -> Option<&'a [u8]> {
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.input.len()
            && !self.input[self.pos].is_ascii_whitespace()
            && !matches!(self.input[self.pos], b'(' | b'"' | b'\'')
        {
            self.pos += 1;
        }
        let input = self.input;
        if self.pos > start {
            Some(&input[start..self.pos])
        } else {
            None
        }
    }

    fn next_group(&mut self) -> Option<Vec<Vec<u8>>> {
        self.skip_whitespace();
        if self.input.get(self.pos) != Some(&b'(') {
            return None;
        }
        let close = memchr::memchr(b')', &self.input[self.pos..])? + self.pos;
        let group = self.input[self.pos + 1..close]
            .split(|&b| b == b'|')
            .map(|t| trim(t).to_vec())
            .filter(|t| !t.is_empty())
            .collect();
        self.pos = close + 1;
        Some(group)
    }

    fn next_literal(&mut self) -> Option<Vec<u8>> {
        self.skip_whitespace();
        let quote = *self.input.get(self.pos)?;
        if quote != b'"' && quote != b'\'' {
            return None;
        }
        let len = memchr::memchr(quote, &self.input[self.pos + 1..])?;
        let value = self.input[self.pos + 1..self.pos + 1 + len].to_vec();
        self.pos += len + 2;
        Some(value)
    }

    fn next_type(&mut self) -> Option<AttType> {
        self.skip_whitespace();
        if self.input.get(self.pos) == Some(&b'(') {
            return self.next_group().map(AttType::Enumeration);
        }
        Some(match self.next_word()? {
            b"CDATA" => AttType::CData,
            b"ID" => AttType::Id,
            b"IDREF" => AttType::IdRef,
            b"IDREFS" => AttType::IdRefs,
            b"ENTITY" => AttType::Entity,
            b"ENTITIES" => AttType::Entities,
            b"NMTOKEN" => AttType::NmToken,
            b"NMTOKENS" => AttType::NmTokens,
            b"NOTATION" => AttType::Notation(self.next_group()?),
            _ => return None,
        })
    }

    fn next_default(&mut self) -> Option<AttDefault> {
        self.skip_whitespace();
        match self.input.get(self.pos)? {
            b'"' | b'\'' => self.next_literal().map(AttDefault::Default),
            _ => match self.next_word()? {
                b"#REQUIRED" => Some(AttDefault::Required),
                b"#IMPLIED" => Some(AttDefault::Implied),
                b"#FIXED" => self.next_literal().map(AttDefault::Fixed),
                _ => None,
            },
        }
    }
}
