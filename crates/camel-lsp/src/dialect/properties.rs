//! Properties files: connector URLs and `camel.component.*` configuration.

use super::Literal;

/// Connector URL keys and whether the endpoint is a producer.
pub const URL_KEYS: &[(&str, bool)] = &[("camel.sink.url", true), ("camel.source.url", false)];

/// Split a property line into key and value spans.
///
/// Returns `(key, value_start)` where `value_start` is the byte offset of the
/// first value character. Comments and blank lines have no key.
pub fn split_property(line: &str) -> Option<(&str, usize)> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
        return None;
    }
    let key_start = line.len() - trimmed.len();
    let separator = line[key_start..]
        .find(['=', ':'])
        .map(|index| key_start + index);
    match separator {
        Some(separator) => {
            let key = line[key_start..separator].trim_end();
            let after = &line[separator + 1..];
            let value_start = separator + 1 + (after.len() - after.trim_start().len());
            Some((key, value_start))
        }
        None => Some((line[key_start..].trim_end(), line.len())),
    }
}

pub(super) fn literals_on_line(line: &str) -> Vec<Literal> {
    let Some((key, value_start)) = split_property(line) else {
        return Vec::new();
    };
    let Some(&(_, producer)) = URL_KEYS.iter().find(|(url_key, _)| *url_key == key) else {
        return Vec::new();
    };
    if value_start > line.len() || !line[..value_start].contains(['=', ':']) {
        return Vec::new();
    }
    vec![Literal {
        start: value_start,
        end: line.trim_end().len().max(value_start),
        closed: true,
        producer,
    }]
}
