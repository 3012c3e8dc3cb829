//! YAML routes: `from:`, `to:`, `toD:`, `wireTap:` and nested `uri:` keys.

use std::sync::OnceLock;

use regex::Regex;

use super::Literal;
use crate::document::Document;

/// Keys whose scalar value is an endpoint URI.
pub const ENDPOINT_KEYS: &[&str] = &["from", "to", "toD", "wireTap", "uri"];

const PRODUCER_KEYS: &[&str] = &["to", "toD", "wireTap"];

fn key_regex() -> Option<&'static Regex> {
    static KEY: OnceLock<Option<Regex>> = OnceLock::new();
    KEY.get_or_init(|| Regex::new(r"^(\s*(?:-\s+)?)([A-Za-z][\w-]*)\s*:(\s*)(.*)$").ok())
        .as_ref()
}

/// A `key: value` line: key column, key and the byte offset of the value.
struct KeyLine<'a> {
    column: usize,
    key: &'a str,
    value_start: usize,
    value: &'a str,
}

fn parse_key_line(line: &str) -> Option<KeyLine<'_>> {
    let caps = key_regex()?.captures(line)?;
    let key = caps.get(2)?;
    let value = caps.get(4)?;
    Some(KeyLine {
        column: key.start(),
        key: key.as_str(),
        value_start: value.start(),
        value: value.as_str(),
    })
}

pub(super) fn literals_on_line(doc: &Document, line_no: usize, line: &str) -> Vec<Literal> {
    let Some(key_line) = parse_key_line(line) else {
        return Vec::new();
    };
    if !ENDPOINT_KEYS.contains(&key_line.key) {
        return Vec::new();
    }
    let Some((start, end, closed)) = scalar_span(key_line.value_start, key_line.value) else {
        return Vec::new();
    };

    let producer = match key_line.key {
        "uri" => enclosing_key(doc, line_no, key_line.column)
            .is_some_and(|key| PRODUCER_KEYS.contains(&key.as_str())),
        key => PRODUCER_KEYS.contains(&key),
    };
    vec![Literal {
        start,
        end,
        closed,
        producer,
    }]
}

/// Span of a scalar value, quotes excluded. Block values have no span.
fn scalar_span(offset: usize, value: &str) -> Option<(usize, usize, bool)> {
    let trimmed = value.trim_end();
    let quote = trimmed.chars().next();
    match quote {
        Some(q @ ('"' | '\'')) => {
            let inner = &trimmed[1..];
            match inner.find(q) {
                Some(close) => Some((offset + 1, offset + 1 + close, true)),
                None => Some((offset + 1, offset + trimmed.len(), false)),
            }
        }
        Some('|' | '>' | '{' | '[' | '&' | '*') => None,
        Some(_) => {
            let content = trimmed
                .find(" #")
                .map_or(trimmed, |comment| trimmed[..comment].trim_end());
            Some((offset, offset + content.len(), true))
        }
        // `from:` with the URI typed on this line later
        None => Some((offset, offset, false)),
    }
}

/// The nearest key above `line_no` indented less than `column`.
fn enclosing_key(doc: &Document, line_no: usize, column: usize) -> Option<String> {
    (0..line_no).rev().find_map(|previous| {
        let line = doc.line(previous)?;
        let key_line = parse_key_line(&line)?;
        (key_line.column < column).then(|| key_line.key.to_string())
    })
}

/// Whether a line starts a route definition (`- from:` or `from:`).
pub fn starts_route(line: &str) -> bool {
    parse_key_line(line).is_some_and(|k| k.key == "from" || k.key == "route")
}
