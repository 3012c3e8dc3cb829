//! Instance model of an endpoint URI.
//!
//! A URI such as `timer:timerName?delay=1000&period=5` is parsed into a small
//! tree whose nodes remember where they live in the raw string:
//!
//! ```text
//! UriInstance
//! ├── ComponentAndPath       timer:timerName
//! │   ├── Component          timer
//! │   └── PathParam[0]       timerName
//! └── OptionParam            delay=1000
//!     ├── key                delay
//!     └── value              1000
//! ```
//!
//! Offsets are byte offsets into the raw string and ranges are inclusive on
//! both ends, so the position right after the last character of an element
//! still resolves to that element.

use tower_lsp::lsp_types::{Position, Range};

use crate::position;

/// Scheme names of in-process channel components whose endpoints reference each other.
pub const REFERENCE_COMPONENTS: &[&str] = &["direct", "direct-vm", "seda", "vm"];

/// A parsed endpoint URI together with its anchor in the owning document.
#[derive(Debug, Clone, PartialEq)]
pub struct UriInstance {
    raw: String,
    separator: String,
    producer: bool,
    anchor: Position,
    component_and_path: Option<ComponentAndPath>,
    options: Vec<OptionParam>,
}

/// `scheme:path1:path2` part of the URI, up to the first `?`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentAndPath {
    pub start: usize,
    pub end: usize,
    pub component: Component,
    pub path_params: Vec<PathParam>,
}

/// The scheme of the URI.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

/// One positional path segment.
#[derive(Debug, Clone, PartialEq)]
pub struct PathParam {
    pub value: String,
    pub start: usize,
    pub end: usize,
    /// Position among the path segments; maps the segment to its schema name.
    pub index: usize,
}

/// One `key=value` entry of the query part.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionParam {
    pub start: usize,
    pub end: usize,
    pub key: OptionKey,
    /// `None` when the entry has no `=` at all.
    pub value: Option<OptionValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionKey {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

/// Value of an option; `value` is empty for `key=` with nothing typed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionValue {
    pub value: String,
    pub start: usize,
    pub end: usize,
}

/// The node of the tree found at an offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UriElement<'a> {
    Uri(&'a UriInstance),
    ComponentAndPath(&'a ComponentAndPath),
    Component(&'a Component),
    PathParam(&'a PathParam),
    OptionParam(&'a OptionParam),
    OptionKey(&'a OptionParam),
    OptionValue(&'a OptionParam),
}

impl<'a> UriElement<'a> {
    /// Relative `(start, end)` offsets of the element.
    pub fn span(&self) -> (usize, usize) {
        match self {
            UriElement::Uri(uri) => (0, uri.raw.len()),
            UriElement::ComponentAndPath(cap) => (cap.start, cap.end),
            UriElement::Component(component) => (component.start, component.end),
            UriElement::PathParam(param) => (param.start, param.end),
            UriElement::OptionParam(option) => (option.start, option.end),
            UriElement::OptionKey(option) => (option.key.start, option.key.end),
            UriElement::OptionValue(option) => option
                .value
                .as_ref()
                .map(|value| (value.start, value.end))
                .unwrap_or((option.key.end, option.key.end)),
        }
    }

    pub fn in_range(&self, offset: usize) -> bool {
        let (start, end) = self.span();
        start <= offset && offset <= end
    }

    /// Short label of the element kind, used in logs.
    pub fn describe(&self) -> &'static str {
        match self {
            UriElement::Uri(_) => "uri",
            UriElement::ComponentAndPath(_) => "component and path",
            UriElement::Component(_) => "component",
            UriElement::PathParam(_) => "path parameter",
            UriElement::OptionParam(_) => "option",
            UriElement::OptionKey(_) => "option key",
            UriElement::OptionValue(_) => "option value",
        }
    }
}

impl UriInstance {
    /// Parse `raw` with the given option separator (`&`, or `&amp;` inside XML).
    pub fn parse(raw: &str, separator: &str, producer: bool, anchor: Position) -> Self {
        let component_and_path = if raw.is_empty() {
            None
        } else {
            Some(ComponentAndPath::parse(raw))
        };

        let options = match raw.find(':').and_then(|colon| find_from(raw, '?', colon)) {
            Some(question_mark) => parse_options(raw, question_mark, separator),
            None => Vec::new(),
        };

        Self {
            raw: raw.to_string(),
            separator: separator.to_string(),
            producer,
            anchor,
            component_and_path,
            options,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Whether the owning construct sends to this endpoint.
    pub fn is_producer(&self) -> bool {
        self.producer
    }

    pub fn anchor(&self) -> Position {
        self.anchor
    }

    pub fn component_and_path(&self) -> Option<&ComponentAndPath> {
        self.component_and_path.as_ref()
    }

    pub fn options(&self) -> &[OptionParam] {
        &self.options
    }

    /// Scheme name, or `None` for an empty URI.
    pub fn component_name(&self) -> Option<&str> {
        self.component_and_path
            .as_ref()
            .map(|cap| cap.component.name.as_str())
    }

    /// Path parameter with the given index.
    pub fn path_param(&self, index: usize) -> Option<&PathParam> {
        self.component_and_path
            .as_ref()
            .and_then(|cap| cap.path_params.iter().find(|param| param.index == index))
    }

    /// The deepest element containing `offset`, or the URI itself.
    pub fn element_at(&self, offset: usize) -> UriElement<'_> {
        if let Some(cap) = &self.component_and_path {
            if cap.start <= offset && offset <= cap.end {
                return cap.element_at(offset);
            }
        }

        for option in &self.options {
            if option.start <= offset && offset <= option.end {
                if option.key.start <= offset && offset <= option.key.end {
                    return UriElement::OptionKey(option);
                }
                if option.value.is_some() {
                    return UriElement::OptionValue(option);
                }
                return UriElement::OptionParam(option);
            }
        }

        UriElement::Uri(self)
    }

    /// Absolute range of a relative span.
    pub fn absolute_range(&self, start: usize, end: usize) -> Range {
        position::to_range(self.anchor, &self.raw, start, end)
    }

    /// Absolute range of the whole URI.
    pub fn full_range(&self) -> Range {
        self.absolute_range(0, self.raw.len())
    }

    /// Relative offset of an absolute position, if it falls inside the URI.
    pub fn relative_offset(&self, position: Position) -> Option<usize> {
        position::to_relative(self.anchor, &self.raw, position)
    }

    /// Whether the scheme denotes an in-process channel.
    pub fn is_reference_component(&self) -> bool {
        self.component_name()
            .is_some_and(|name| REFERENCE_COMPONENTS.contains(&name))
    }

    /// Channel id of a reference-style endpoint: its first path parameter.
    pub fn reference_key(&self) -> Option<&str> {
        self.path_param(0)
            .map(|param| param.value.as_str())
            .filter(|value| !value.is_empty())
    }
}

impl ComponentAndPath {
    fn parse(raw: &str) -> Self {
        let Some(colon) = raw.find(':') else {
            return Self {
                start: 0,
                end: raw.len(),
                component: Component {
                    name: raw.to_string(),
                    start: 0,
                    end: raw.len(),
                },
                path_params: Vec::new(),
            };
        };

        let end = find_from(raw, '?', colon).unwrap_or(raw.len());
        Self {
            start: 0,
            end,
            component: Component {
                name: raw[..colon].to_string(),
                start: 0,
                end: colon,
            },
            path_params: parse_path_params(&raw[colon + 1..end], colon + 1),
        }
    }

    fn element_at(&self, offset: usize) -> UriElement<'_> {
        if self.component.start <= offset && offset <= self.component.end {
            return UriElement::Component(&self.component);
        }
        self.path_params
            .iter()
            .find(|param| param.start <= offset && offset <= param.end)
            .map(UriElement::PathParam)
            .unwrap_or(UriElement::ComponentAndPath(self))
    }

    /// Path parameter holding the API name of API-style components.
    pub fn api_name(&self) -> Option<&PathParam> {
        self.path_params.iter().find(|param| param.index == 0)
    }

    /// Path parameter holding the API method of API-style components.
    pub fn method_name(&self) -> Option<&PathParam> {
        self.path_params.iter().find(|param| param.index == 1)
    }
}

/// Split the path section on `:` and then on `/`, except for segments that
/// start with `/` which stay whole (`aws2-s3://bucket`).
fn parse_path_params(path: &str, offset: usize) -> Vec<PathParam> {
    let mut params = Vec::new();
    let mut current = offset;
    let mut index = 0;

    for segment in split_dropping_trailing_empty(path, ":") {
        if segment.starts_with('/') {
            params.push(PathParam {
                value: segment.to_string(),
                start: current,
                end: current + segment.len(),
                index,
            });
            current += segment.len() + 1;
            index += 1;
            continue;
        }

        for part in split_dropping_trailing_empty(segment, "/") {
            params.push(PathParam {
                value: part.to_string(),
                start: current,
                end: current + part.len(),
                index,
            });
            current += part.len() + 1;
            index += 1;
        }
        if segment.ends_with('/') {
            // room for the segment about to be typed after the slash
            params.push(PathParam {
                value: String::new(),
                start: current,
                end: current,
                index,
            });
            index += 1;
        }
    }

    params
}

fn parse_options(raw: &str, question_mark: usize, separator: &str) -> Vec<OptionParam> {
    let query = &raw[question_mark + 1..];
    let mut options = Vec::new();
    let mut current = question_mark + 1;

    for token in split_dropping_trailing_empty(query, separator) {
        options.push(OptionParam::parse(token, current));
        current += token.len() + separator.len();
    }
    if !separator.is_empty() && query.ends_with(separator) {
        options.push(OptionParam::parse("", current));
    }

    options
}

impl OptionParam {
    fn parse(token: &str, start: usize) -> Self {
        let end = start + token.len();
        match token.split_once('=') {
            Some((key, value)) => {
                let key_end = start + key.len();
                Self {
                    start,
                    end,
                    key: OptionKey {
                        name: key.to_string(),
                        start,
                        end: key_end,
                    },
                    value: Some(OptionValue {
                        value: value.to_string(),
                        start: key_end + 1,
                        end,
                    }),
                }
            }
            None => Self {
                start,
                end,
                key: OptionKey {
                    name: token.to_string(),
                    start,
                    end,
                },
                value: None,
            },
        }
    }

    pub fn value_str(&self) -> Option<&str> {
        self.value.as_ref().map(|value| value.value.as_str())
    }
}

/// Split like `str::split`, then drop trailing empty pieces. A string without
/// the separator (including the empty string) yields itself.
fn split_dropping_trailing_empty<'s>(s: &'s str, separator: &str) -> Vec<&'s str> {
    if separator.is_empty() {
        return vec![s];
    }
    let mut parts: Vec<&str> = s.split(separator).collect();
    if parts.len() > 1 {
        while parts.last().is_some_and(|part| part.is_empty()) {
            parts.pop();
        }
    }
    parts
}

fn find_from(s: &str, needle: char, from: usize) -> Option<usize> {
    s.get(from..)
        .and_then(|rest| rest.find(needle))
        .map(|index| index + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> UriInstance {
        UriInstance::parse(raw, "&", false, Position::default())
    }

    #[test]
    fn test_uri_without_query_has_no_options() {
        for raw in ["timer:foo", "direct:a:b", "aws2-s3://bucket", "log"] {
            let uri = parse(raw);
            assert!(uri.options().is_empty(), "{}", raw);
            let cap = uri.component_and_path().unwrap();
            assert_eq!((cap.start, cap.end), (0, raw.len()), "{}", raw);
        }
    }

    #[test]
    fn test_path_params_are_indexed_in_order() {
        let uri = parse("scheme:p1:p2");
        assert_eq!(uri.component_name(), Some("scheme"));
        let params = &uri.component_and_path().unwrap().path_params;
        assert_eq!(params.len(), 2);
        assert_eq!((params[0].value.as_str(), params[0].index), ("p1", 0));
        assert_eq!((params[1].value.as_str(), params[1].index), ("p2", 1));
        assert_eq!((params[1].start, params[1].end), (10, 12));
    }

    #[test]
    fn test_option_offsets() {
        let uri = parse("timer:timerName?delay=1000");
        assert_eq!(uri.options().len(), 1);
        let option = &uri.options()[0];
        assert_eq!(option.key.name, "delay");
        assert_eq!((option.key.start, option.key.end), (16, 21));
        let value = option.value.as_ref().unwrap();
        assert_eq!(value.value, "1000");
        assert_eq!((value.start, value.end), (22, 26));
    }

    #[test]
    fn test_trailing_separator_adds_empty_option() {
        let uri = parse("timer:timerName?delay&");
        assert_eq!(uri.options().len(), 2);
        let first = &uri.options()[0];
        assert_eq!(first.key.name, "delay");
        assert!(first.value.is_none());
        let second = &uri.options()[1];
        assert_eq!(second.key.name, "");
        assert_eq!((second.start, second.end), (22, 22));
    }

    #[test]
    fn test_key_only_differs_from_empty_value() {
        let uri = parse("timer:t?delay&period=");
        assert!(uri.options()[0].value.is_none());
        let period = uri.options()[1].value.as_ref().unwrap();
        assert_eq!(period.value, "");
        assert_eq!((period.start, period.end), (21, 21));
    }

    #[test]
    fn test_xml_separator() {
        let uri = UriInstance::parse(
            "timer:t?delay=1&amp;period=2",
            "&amp;",
            false,
            Position::default(),
        );
        let keys: Vec<_> = uri.options().iter().map(|o| o.key.name.as_str()).collect();
        assert_eq!(keys, vec!["delay", "period"]);
        assert_eq!(uri.options()[1].start, 20);
    }

    #[test]
    fn test_value_split_on_first_equals() {
        let uri = parse("log:a?groupDelay=a=b");
        let option = &uri.options()[0];
        assert_eq!(option.key.name, "groupDelay");
        assert_eq!(option.value_str(), Some("a=b"));
    }

    #[test]
    fn test_slash_prefixed_segment_stays_whole() {
        let uri = parse("aws2-s3://bucket?region=x");
        let params = &uri.component_and_path().unwrap().path_params;
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].value, "//bucket");
        assert_eq!((params[0].start, params[0].end), (8, 16));
    }

    #[test]
    fn test_slash_split_and_trailing_slash() {
        let uri = parse("twilio:account/");
        let params = &uri.component_and_path().unwrap().path_params;
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].value, "account");
        assert_eq!((params[1].value.as_str(), params[1].start, params[1].index), ("", 15, 1));

        let uri = parse("twilio:account/fetch");
        let cap = uri.component_and_path().unwrap();
        assert_eq!(cap.api_name().unwrap().value, "account");
        assert_eq!(cap.method_name().unwrap().value, "fetch");
    }

    #[test]
    fn test_empty_path_after_colon() {
        let uri = parse("timer:");
        let params = &uri.component_and_path().unwrap().path_params;
        assert_eq!(params.len(), 1);
        assert_eq!((params[0].start, params[0].end), (6, 6));
    }

    #[test]
    fn test_degenerate_inputs() {
        let empty = parse("");
        assert!(empty.component_and_path().is_none());
        assert!(empty.options().is_empty());
        assert!(matches!(empty.element_at(0), UriElement::Uri(_)));

        let scheme_only = parse("tim");
        assert_eq!(scheme_only.component_name(), Some("tim"));
        assert!(matches!(scheme_only.element_at(3), UriElement::Component(_)));
    }

    #[test]
    fn test_element_at_resolution() {
        let uri = parse("timer:timerName?delay=1000");
        assert!(matches!(uri.element_at(2), UriElement::Component(_)));
        assert!(matches!(uri.element_at(8), UriElement::PathParam(p) if p.value == "timerName"));
        assert!(matches!(uri.element_at(18), UriElement::OptionKey(o) if o.key.name == "delay"));
        assert!(matches!(uri.element_at(23), UriElement::OptionValue(o) if o.value_str() == Some("1000")));
        assert!(matches!(uri.element_at(99), UriElement::Uri(_)));
    }

    #[test]
    fn test_cursor_right_after_question_mark() {
        let uri = parse("timer:timerName?");
        assert_eq!(uri.options().len(), 1);
        assert!(matches!(uri.element_at(16), UriElement::OptionKey(o) if o.key.name.is_empty()));
    }

    #[test]
    fn test_element_range_contains_cursor() {
        let anchor = Position {
            line: 4,
            character: 17,
        };
        let raw = "timer:timerName?delay=1000&period=5";
        let uri = UriInstance::parse(raw, "&", false, anchor);
        for offset in 0..=raw.len() {
            let cursor = position::to_absolute(anchor, raw, offset);
            let (start, end) = uri.element_at(offset).span();
            let range = uri.absolute_range(start, end);
            assert!(position::range_contains(&range, cursor), "offset {}", offset);
        }
    }

    #[test]
    fn test_reference_key() {
        let uri = parse("direct:start?timeout=5");
        assert!(uri.is_reference_component());
        assert_eq!(uri.reference_key(), Some("start"));
        assert!(!parse("timer:start").is_reference_component());
        assert_eq!(parse("direct:").reference_key(), None);
    }
}
