//! Textual conventions embedded in Structured values

use std::sync::LazyLock;

use regex::Regex;

/// Token sequence that marks a callback literal
pub const CALLBACK_TOKEN: &str = "return function";

/// `[[identifier]]`, whole string
static GLOBAL_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\[([A-Za-z_$][A-Za-z0-9_$]*)\]\]$").expect("Invalid global reference regex")
});

static CALLBACK_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*return\s+function\b").expect("Invalid callback prefix regex")
});

/// The identifier of a `[[identifier]]` reference
///
/// The marker must be the entire value; surrounding whitespace makes it
/// ordinary structured input.
pub fn global_reference(raw: &str) -> Option<&str> {
    GLOBAL_REFERENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Function source of a callback literal, with the leading `return` removed
///
/// Surrounding whitespace and a trailing `;` are dropped so that the same
/// callback always yields the same source text.
pub fn callback_source(raw: &str) -> Option<&str> {
    if !CALLBACK_PREFIX.is_match(raw) {
        return None;
    }
    let source = raw.trim_start().strip_prefix("return")?.trim();
    Some(source.strip_suffix(';').unwrap_or(source).trim_end())
}
