//! XML name character classes (XML 1.0 fifth edition productions)

#[inline]
pub fn is_name_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z' | 'a'..='z' | '_' | ':'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

#[inline]
pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

/// Name start character excluding ':'
#[inline]
pub fn is_ncname_start_char(c: char) -> bool {
    c != ':' && is_name_start_char(c)
}

/// Name character excluding ':'
#[inline]
pub fn is_ncname_char(c: char) -> bool {
    c != ':' && is_name_char(c)
}

/// Non-colonized name
pub fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_ncname_start_char(c) => chars.all(is_ncname_char),
        _ => false,
    }
}

/// Split `prefix:local`; unprefixed names give `("", name)`
pub fn split_qname(name: &str) -> (&str, &str) {
    match name.find(':') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("", name),
    }
}
