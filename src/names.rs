//! XML name validation and field identifier derivation
//!
//! This module validates XML names, NCNames, and QNames, and derives
//! reserved-word-safe field identifiers from schema element names. The
//! identifier is what callers address a field by; the wire tag name stays
//! the original schema name in all cases.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\-\.0-9]*$")
        .unwrap()
});

/// Rust keywords a schema field name must not collide with
static RESERVED_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "as", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern", "false",
        "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
        "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "type",
        "unsafe", "use", "where", "while", "async", "await", "abstract", "become", "box", "do",
        "final", "macro", "override", "priv", "try", "typeof", "union", "unsized", "virtual",
        "yield",
    ]
    .into_iter()
    .collect()
});

/// Check if a string is a valid XML Name
pub fn is_valid_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    name.chars()
        .next()
        .map(|c| c.is_alphabetic() || c == '_')
        .unwrap_or(false)
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
}

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    !name.contains(':') && NCNAME.is_match(name)
}

/// Check if a string is a valid QName (qualified name)
pub fn is_valid_qname(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    // QName can be "prefix:localName" or just "localName"
    if let Some((prefix, local)) = name.split_once(':') {
        is_valid_ncname(prefix) && is_valid_ncname(local)
    } else {
        is_valid_ncname(name)
    }
}

/// Validate an NCName and return an error if invalid
pub fn validate_ncname(name: &str) -> Result<()> {
    if is_valid_ncname(name) {
        Ok(())
    } else {
        Err(Error::Name(format!("Invalid NCName: '{}'", name)))
    }
}

/// Validate a QName and return an error if invalid
pub fn validate_qname(name: &str) -> Result<()> {
    if is_valid_qname(name) {
        Ok(())
    } else {
        Err(Error::Name(format!("Invalid QName: '{}'", name)))
    }
}

/// Split a QName into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}

/// Derive a reserved-word-safe field identifier from a schema name
///
/// Hyphens and dots (valid in NCNames, invalid in identifiers) become
/// underscores; a name colliding with a reserved word gets a trailing
/// underscore. The wire tag name is never rewritten.
pub fn safe_ident(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == '-' || c == '.' { '_' } else { c })
        .collect();

    if RESERVED_WORDS.contains(cleaned.as_str()) {
        format!("{}_", cleaned)
    } else {
        cleaned
    }
}

/// Check whether a schema name needed rewriting to become an identifier
pub fn is_rewritten(name: &str) -> bool {
    safe_ident(name) != name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("element"));
        assert!(is_valid_name("my-element"));
        assert!(is_valid_name("my_element"));
        assert!(is_valid_name("element123"));
        assert!(is_valid_name("_element"));

        assert!(!is_valid_name(""));
        assert!(!is_valid_name("123element"));
        assert!(!is_valid_name("-element"));
    }

    #[test]
    fn test_is_valid_ncname() {
        assert!(is_valid_ncname("element"));
        assert!(is_valid_ncname("my-element"));

        assert!(!is_valid_ncname(""));
        assert!(!is_valid_ncname("prefix:element"));
        assert!(!is_valid_ncname("123element"));
    }

    #[test]
    fn test_is_valid_qname() {
        assert!(is_valid_qname("element"));
        assert!(is_valid_qname("prefix:element"));
        assert!(is_valid_qname("xs:schema"));

        assert!(!is_valid_qname(""));
        assert!(!is_valid_qname(":element"));
        assert!(!is_valid_qname("element:"));
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("element"), (None, "element"));
        assert_eq!(split_qname("xs:element"), (Some("xs"), "element"));
    }

    #[test]
    fn test_safe_ident_keywords() {
        assert_eq!(safe_ident("type"), "type_");
        assert_eq!(safe_ident("match"), "match_");
        assert_eq!(safe_ident("ref"), "ref_");
        assert_eq!(safe_ident("Fahrenheit"), "Fahrenheit");
    }

    #[test]
    fn test_safe_ident_separators() {
        assert_eq!(safe_ident("order-id"), "order_id");
        assert_eq!(safe_ident("a.b"), "a_b");
    }

    #[test]
    fn test_is_rewritten() {
        assert!(is_rewritten("type"));
        assert!(is_rewritten("order-id"));
        assert!(!is_rewritten("Fahrenheit"));
    }
}
