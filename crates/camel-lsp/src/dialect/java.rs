//! Java route builders: string literals passed to `from(...)`, `.to(...)` etc.

use std::sync::OnceLock;

use regex::Regex;

use super::Literal;

/// Route builder methods taking an endpoint URI.
pub const ENDPOINT_METHODS: &[&str] = &[
    "from",
    "to",
    "toD",
    "wireTap",
    "enrich",
    "pollEnrich",
    "interceptSendToEndpoint",
];

/// Methods whose endpoint is consumed from rather than sent to.
pub const CONSUMER_METHODS: &[&str] = &["from", "pollEnrich"];

fn call_regex() -> Option<&'static Regex> {
    static CALL: OnceLock<Option<Regex>> = OnceLock::new();
    CALL.get_or_init(|| {
        Regex::new(
            r#"\b(from|toD|to|wireTap|enrich|pollEnrich|interceptSendToEndpoint)\s*\(\s*"((?:[^"\\]|\\.)*)("?)"#,
        )
        .ok()
    })
    .as_ref()
}

pub(super) fn literals_on_line(line: &str) -> Vec<Literal> {
    let Some(re) = call_regex() else {
        return Vec::new();
    };
    re.captures_iter(line)
        .filter_map(|caps| {
            let method = caps.get(1)?.as_str();
            let content = caps.get(2)?;
            let closed = caps.get(3).is_some_and(|quote| !quote.as_str().is_empty());
            Some(Literal {
                start: content.start(),
                end: content.end(),
                closed,
                producer: !CONSUMER_METHODS.contains(&method),
            })
        })
        .collect()
}

/// Whether a line starts a route, i.e. calls `from(...)` at statement level.
pub fn starts_route(line: &str) -> bool {
    literals_on_line(line).iter().any(|literal| !literal.producer)
        && line.trim_start().starts_with("from")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_follow_method() {
        let line = r#"        from("timer:tick").to("direct:a").pollEnrich("file:in");"#;
        let literals = literals_on_line(line);
        let found: Vec<_> = literals
            .iter()
            .map(|l| (&line[l.start..l.end], l.producer, l.closed))
            .collect();
        assert_eq!(
            found,
            vec![
                ("timer:tick", false, true),
                ("direct:a", true, true),
                ("file:in", false, true),
            ]
        );
    }

    #[test]
    fn test_escaped_quotes_stay_inside_literal() {
        let line = r#"to("log:x?marker=\"a\"")"#;
        let literals = literals_on_line(line);
        assert_eq!(&line[literals[0].start..literals[0].end], r#"log:x?marker=\"a\""#);
    }

    #[test]
    fn test_non_endpoint_calls_ignored() {
        assert!(literals_on_line(r#"log("hello"); setHeader("to", constant("x"));"#).is_empty());
        assert!(literals_on_line(r#"String uri = "timer:x";"#).is_empty());
    }

    #[test]
    fn test_unclosed_literal() {
        let literals = literals_on_line(r#"    .to("kafka:"#);
        assert_eq!(literals.len(), 1);
        assert!(!literals[0].closed);
    }

    #[test]
    fn test_starts_route() {
        assert!(starts_route(r#"    from("timer:a")"#));
        assert!(!starts_route(r#"    .to("log:a")"#));
    }
}
