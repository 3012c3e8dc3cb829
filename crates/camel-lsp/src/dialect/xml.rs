//! XML routes: `<from uri="..."/>`, `<to uri="..."/>` and friends.

use std::sync::OnceLock;

use log::warn;
use regex::Regex;
use roxmltree::ParsingOptions;

use super::{Dialect, Endpoint, Literal};
use crate::document::Document;
use crate::uri::UriInstance;

/// Elements whose `uri` attribute is an endpoint.
pub const ENDPOINT_TAGS: &[&str] = &[
    "from",
    "to",
    "toD",
    "endpoint",
    "wireTap",
    "enrich",
    "pollEnrich",
    "interceptSendToEndpoint",
    "deadLetterChannel",
];

/// Elements that send to their endpoint.
pub const PRODUCER_TAGS: &[&str] = &[
    "to",
    "toD",
    "wireTap",
    "enrich",
    "interceptSendToEndpoint",
    "deadLetterChannel",
];

fn attribute_regex() -> Option<&'static Regex> {
    static ATTRIBUTE: OnceLock<Option<Regex>> = OnceLock::new();
    ATTRIBUTE
        .get_or_init(|| Regex::new(r#"\b(uri|deadLetterUri)\s*=\s*(["'])"#).ok())
        .as_ref()
}

fn attribute_for(tag: &str) -> &'static str {
    if tag == "deadLetterChannel" {
        "deadLetterUri"
    } else {
        "uri"
    }
}

pub(super) fn literals_on_line(doc: &Document, line_no: usize, line: &str) -> Vec<Literal> {
    let Some(re) = attribute_regex() else {
        return Vec::new();
    };
    if !re.is_match(line) {
        return Vec::new();
    }
    let text = doc.text();
    let line_start = doc.content.line_to_byte(line_no);

    re.captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let quote = caps.get(2)?.as_str();
            let start = whole.end();
            let (end, closed) = match line[start..].find(quote) {
                Some(index) => (start + index, true),
                None => (line.len(), false),
            };
            let producer = enclosing_tag(&text, line_start + whole.start())
                .is_some_and(|tag| PRODUCER_TAGS.contains(&tag));
            Some(Literal {
                start,
                end,
                closed,
                producer,
            })
        })
        .collect()
}

/// Local name of the element whose start tag contains `offset`.
fn enclosing_tag(text: &str, offset: usize) -> Option<&str> {
    let open = text.get(..offset)?.rfind('<')?;
    let name_len = text[open + 1..]
        .find(|c: char| !(c.is_alphanumeric() || matches!(c, ':' | '_' | '-' | '.')))
        .unwrap_or(text.len() - open - 1);
    let name = &text[open + 1..open + 1 + name_len];
    Some(name.rsplit(':').next().unwrap_or(name))
}

/// All endpoints of an XML document. Malformed documents have none.
pub fn endpoints(doc: &Document) -> Vec<Endpoint> {
    let text = doc.text();
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let parsed = match roxmltree::Document::parse_with_options(&text, options) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Cannot parse XML document: {}", e);
            return Vec::new();
        }
    };

    parsed
        .descendants()
        .filter(|node| node.is_element())
        .filter_map(|node| {
            let tag = node.tag_name().name();
            if !ENDPOINT_TAGS.contains(&tag) {
                return None;
            }
            let attribute = attribute_for(tag);
            node.attribute(attribute)?;
            let (start, end) = raw_attribute_span(&text, node.range(), attribute)?;
            let uri = UriInstance::parse(
                &text[start..end],
                Dialect::Xml.separator(),
                PRODUCER_TAGS.contains(&tag),
                doc.byte_to_position(start),
            );
            Some(Endpoint::new(uri))
        })
        .collect()
}

/// Byte span of an attribute's raw value, entities left as written.
fn raw_attribute_span(
    text: &str,
    element: std::ops::Range<usize>,
    attribute: &str,
) -> Option<(usize, usize)> {
    let re = attribute_regex()?;
    let source = text.get(element.clone())?;
    let caps = re
        .captures_iter(source)
        .find(|caps| caps.get(1).is_some_and(|name| name.as_str() == attribute))?;
    let quote = caps.get(2)?.as_str();
    let start = element.start + caps.get(0)?.end();
    let end = start + text[start..].find(quote)?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Position;

    const ROUTES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<routes xmlns="http://camel.apache.org/schema/spring">
    <route>
        <from uri="timer:tick?period=1000&amp;delay=5"/>
        <to uri='direct:a'/>
        <wireTap uri="seda:audit"/>
    </route>
    <route errorHandlerRef="dlc">
        <from uri="direct:a"/>
        <pollEnrich><constant>file:in</constant></pollEnrich>
        <log message="hello uri=&quot;x&quot;"/>
    </route>
    <deadLetterChannel id="dlc" deadLetterUri="log:dead"/>
</routes>
"#;

    #[test]
    fn test_enumerates_endpoint_attributes() {
        let doc = Document::new(ROUTES, 0);
        let endpoints = endpoints(&doc);
        let found: Vec<_> = endpoints
            .iter()
            .map(|e| (e.uri.raw().to_string(), e.is_producer()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("timer:tick?period=1000&amp;delay=5".to_string(), false),
                ("direct:a".to_string(), true),
                ("seda:audit".to_string(), true),
                ("direct:a".to_string(), false),
                ("log:dead".to_string(), true),
            ]
        );
        assert_eq!(endpoints[0].uri.anchor(), Position::new(3, 19));
        assert_eq!(endpoints[0].uri.options().len(), 2);
    }

    #[test]
    fn test_malformed_document_has_no_endpoints() {
        let doc = Document::new("<routes><from uri=\"timer:a\"></routes>", 0);
        assert!(endpoints(&doc).is_empty());
    }

    #[test]
    fn test_namespace_prefixed_tags() {
        let text = r#"<camel:routes xmlns:camel="http://camel.apache.org/schema/spring"><camel:to uri="log:x"/></camel:routes>"#;
        let doc = Document::new(text, 0);
        let endpoints = endpoints(&doc);
        assert_eq!(endpoints.len(), 1);
        assert!(endpoints[0].is_producer());

        let literals = literals_on_line(&doc, 0, text);
        assert_eq!(literals.len(), 1);
        assert!(literals[0].producer);
    }

    #[test]
    fn test_line_literals_find_role_on_previous_line() {
        let text = "<to id=\"x\"\n    uri=\"log:a\"/>";
        let doc = Document::new(text, 0);
        let literals = literals_on_line(&doc, 1, "    uri=\"log:a\"/>");
        assert_eq!(
            literals,
            vec![Literal {
                start: 9,
                end: 14,
                closed: true,
                producer: true
            }]
        );
    }

    #[test]
    fn test_unclosed_attribute_runs_to_end_of_line() {
        let line = "<from uri=\"timer:";
        let doc = Document::new(line, 0);
        let literals = literals_on_line(&doc, 0, line);
        assert_eq!(literals[0].end, line.len());
        assert!(!literals[0].closed);
        assert!(!literals[0].producer);
    }
}
