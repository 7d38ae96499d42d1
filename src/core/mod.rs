//! Core XML parsing primitives
//!
//! This module contains the fundamental building blocks for XML parsing:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: State machine for XML token extraction
//! - Entities: XML entity decoding with Cow (zero-copy when possible)
//! - Attributes: Attribute parsing and extraction
//! - DTD: ATTLIST declarations (ID attributes, defaults)
//! - Names: XML name character classes
//! - URI: base-URI resolution

pub mod attributes;
pub mod dtd;
pub mod entities;
pub mod names;
pub mod scanner;
pub mod tokenizer;
pub mod uri;
