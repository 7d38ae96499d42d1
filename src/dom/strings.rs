//! String Interning Pool
//!
//! Deduplicated storage for element and attribute names, namespace URIs
//! and text content. Id 0 is always the empty string.

use std::collections::HashMap;

#[derive(Debug)]
pub struct StringPool {
    strings: Vec<Box<str>>,
    index: HashMap<Box<str>, u32>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    pub fn new() -> Self {
        StringPool {
            strings: vec![Box::from("")],
            index: HashMap::new(),
        }
    }

    /// Intern a string, returning its id
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        if let Some(&id) = self.index.get(s) {
            return id;
        }
        let id = self.strings.len() as u32;
        self.strings.push(Box::from(s));
        self.index.insert(Box::from(s), id);
        id
    }

    /// Intern raw bytes; invalid UTF-8 is replaced
    pub fn intern_bytes(&mut self, bytes: &[u8]) -> u32 {
        self.intern(&String::from_utf8_lossy(bytes))
    }

    /// Resolve an id; unknown ids read as the empty string
    #[inline]
    pub fn get_str(&self, id: u32) -> &str {
        self.strings.get(id as usize).map(|s| &**s).unwrap_or("")
    }

    /// Look up an id without interning
    pub fn find(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            Some(0)
        } else {
            self.index.get(s).copied()
        }
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }
}
