//! Document symbols and folding ranges for routes.
//!
//! A route is an XML `<route>` element (inside an optional `<camelContext>`),
//! a Java statement starting with `from(...)`, or a YAML `from:`/`route:`
//! entry. Route symbols hold their endpoints as children.

use log::warn;
use roxmltree::ParsingOptions;
use tower_lsp::lsp_types::{DocumentSymbol, FoldingRange, FoldingRangeKind, Position, Range, SymbolKind};

use crate::dialect::{extract_all_endpoints, java, yaml, Dialect, Endpoint};
use crate::document::Document;
use crate::position::utf16_len;

const ROUTE_TAG: &str = "route";
const CONTEXT_TAG: &str = "camelContext";
const CHOICE: &str = "choice";
const NO_ID: &str = "<no id>";

/// A route found in a document, with the lines it spans.
#[derive(Debug, Clone)]
struct RouteBlock {
    name: String,
    range: Range,
    kind: BlockKind,
    children: Vec<RouteBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Context,
    Route,
    Choice,
}

/// Routes of the document with their endpoints.
pub fn document_symbols(doc: &Document, dialect: Dialect) -> Vec<DocumentSymbol> {
    let endpoints = extract_all_endpoints(doc, dialect);
    let blocks = route_blocks(doc, dialect);
    if blocks.is_empty() {
        return endpoints.iter().map(endpoint_symbol).collect();
    }
    blocks
        .iter()
        .filter(|block| block.kind != BlockKind::Choice)
        .map(|block| block_symbol(block, &endpoints))
        .collect()
}

/// Multi-line routes and `choice` blocks.
pub fn folding_ranges(doc: &Document, dialect: Dialect) -> Vec<FoldingRange> {
    let mut ranges = Vec::new();
    collect_folding(&route_blocks(doc, dialect), &mut ranges);
    ranges
}

fn collect_folding(blocks: &[RouteBlock], ranges: &mut Vec<FoldingRange>) {
    for block in blocks {
        if block.range.end.line > block.range.start.line {
            ranges.push(FoldingRange {
                start_line: block.range.start.line,
                end_line: block.range.end.line,
                kind: Some(FoldingRangeKind::Region),
                ..Default::default()
            });
        }
        collect_folding(&block.children, ranges);
    }
}

fn route_blocks(doc: &Document, dialect: Dialect) -> Vec<RouteBlock> {
    match dialect {
        Dialect::Xml => xml_blocks(doc),
        Dialect::Java => java_blocks(doc),
        Dialect::Yaml => yaml_blocks(doc),
        Dialect::Properties => Vec::new(),
    }
}

#[allow(deprecated)]
fn symbol(name: String, detail: Option<String>, range: Range, children: Option<Vec<DocumentSymbol>>) -> DocumentSymbol {
    DocumentSymbol {
        name,
        detail,
        kind: SymbolKind::FIELD,
        tags: None,
        deprecated: None,
        range,
        selection_range: range,
        children,
    }
}

fn block_symbol(block: &RouteBlock, endpoints: &[Endpoint]) -> DocumentSymbol {
    let mut children: Vec<DocumentSymbol> = block
        .children
        .iter()
        .filter(|child| child.kind != BlockKind::Choice)
        .map(|child| block_symbol(child, endpoints))
        .collect();
    if block.kind == BlockKind::Route {
        children.extend(
            endpoints
                .iter()
                .filter(|endpoint| contains(&block.range, endpoint.range().start))
                .map(endpoint_symbol),
        );
    }
    let detail = match block.kind {
        BlockKind::Context => Some(CONTEXT_TAG.to_string()),
        _ => Some(ROUTE_TAG.to_string()),
    };
    symbol(block.name.clone(), detail, block.range, Some(children))
}

fn endpoint_symbol(endpoint: &Endpoint) -> DocumentSymbol {
    let role = if endpoint.is_producer() { "to" } else { "from" };
    symbol(
        format!("{role} {}", short_uri(endpoint.uri.raw())),
        None,
        endpoint.range(),
        None,
    )
}

/// The URI without its options.
fn short_uri(raw: &str) -> &str {
    raw.split_once('?').map_or(raw, |(path, _)| path)
}

fn contains(range: &Range, position: Position) -> bool {
    (range.start.line, range.start.character) <= (position.line, position.character)
        && (position.line, position.character) <= (range.end.line, range.end.character)
}

// ---------------------------------------------------------------------------
// XML
// ---------------------------------------------------------------------------

fn xml_blocks(doc: &Document) -> Vec<RouteBlock> {
    let text = doc.text();
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    match roxmltree::Document::parse_with_options(&text, options) {
        Ok(parsed) => xml_children(doc, parsed.root()),
        Err(e) => {
            warn!("Cannot determine routes of XML document: {}", e);
            Vec::new()
        }
    }
}

fn xml_children(doc: &Document, node: roxmltree::Node<'_, '_>) -> Vec<RouteBlock> {
    let mut blocks = Vec::new();
    for child in node.children().filter(|child| child.is_element()) {
        let kind = match child.tag_name().name() {
            CONTEXT_TAG => BlockKind::Context,
            ROUTE_TAG => BlockKind::Route,
            CHOICE => BlockKind::Choice,
            _ => {
                blocks.extend(xml_children(doc, child));
                continue;
            }
        };
        let span = child.range();
        let name = child.attribute("id").unwrap_or(NO_ID).to_string();
        blocks.push(RouteBlock {
            name,
            range: Range::new(doc.byte_to_position(span.start), doc.byte_to_position(span.end)),
            kind,
            children: xml_children(doc, child),
        });
    }
    blocks
}

// ---------------------------------------------------------------------------
// Java
// ---------------------------------------------------------------------------

fn java_blocks(doc: &Document) -> Vec<RouteBlock> {
    let lines: Vec<String> = doc.lines().collect();
    let starts: Vec<usize> = (0..lines.len()).filter(|&i| java::starts_route(&lines[i])).collect();

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let limit = starts.get(n + 1).map_or(lines.len(), |&next| next) - 1;
            let end = (start..=limit)
                .find(|&i| lines[i].trim_end().ends_with(';'))
                .unwrap_or(limit);
            let name = route_name(doc, Dialect::Java, start);
            RouteBlock {
                name,
                range: line_span(&lines, start, end),
                kind: BlockKind::Route,
                children: java_choices(&lines, start, end),
            }
        })
        .collect()
}

/// `.choice()` up to its matching `.end()` or `.endChoice()`.
fn java_choices(lines: &[String], start: usize, end: usize) -> Vec<RouteBlock> {
    let mut choices = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    for i in start..=end {
        let line = &lines[i];
        if line.contains(".choice()") {
            open.push(i);
        }
        if line.contains(".end()") || line.contains(".endChoice()") {
            if let Some(choice_start) = open.pop() {
                choices.push(RouteBlock {
                    name: CHOICE.to_string(),
                    range: line_span(lines, choice_start, i),
                    kind: BlockKind::Choice,
                    children: Vec::new(),
                });
            }
        }
    }
    choices.sort_by_key(|choice| choice.range.start.line);
    choices
}

// ---------------------------------------------------------------------------
// YAML
// ---------------------------------------------------------------------------

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Last line of the block opened at `start`: following lines indented deeper,
/// trailing blank lines excluded.
fn yaml_block_end(lines: &[String], start: usize) -> usize {
    let column = indentation(&lines[start]);
    let mut end = start;
    for (i, line) in lines.iter().enumerate().skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if indentation(line) <= column {
            break;
        }
        end = i;
    }
    end
}

fn yaml_blocks(doc: &Document) -> Vec<RouteBlock> {
    let lines: Vec<String> = doc.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if !yaml::starts_route(&lines[i]) {
            i += 1;
            continue;
        }
        let end = yaml_block_end(&lines, i);
        blocks.push(RouteBlock {
            name: route_name(doc, Dialect::Yaml, i),
            range: line_span(&lines, i, end),
            kind: BlockKind::Route,
            children: yaml_choices(&lines, i + 1, end),
        });
        i = end + 1;
    }
    blocks
}

fn yaml_choices(lines: &[String], start: usize, end: usize) -> Vec<RouteBlock> {
    (start..=end.min(lines.len().saturating_sub(1)))
        .filter(|&i| {
            let key = lines[i].trim_start().trim_start_matches("- ");
            key.starts_with("choice:")
        })
        .map(|i| RouteBlock {
            name: CHOICE.to_string(),
            range: line_span(lines, i, yaml_block_end(lines, i)),
            kind: BlockKind::Choice,
            children: Vec::new(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Name of a line-based route: `from <uri>` of its first consumer, else `<no id>`.
fn route_name(doc: &Document, dialect: Dialect, start: usize) -> String {
    let consumer = extract_all_endpoints(doc, dialect)
        .into_iter()
        .filter(|endpoint| !endpoint.is_producer() && endpoint.start_line as usize >= start)
        .min_by_key(|endpoint| endpoint.start_line);
    match consumer {
        Some(endpoint) if endpoint.start_line as usize <= start + 1 => {
            format!("from {}", short_uri(endpoint.uri.raw()))
        }
        _ => NO_ID.to_string(),
    }
}

fn line_span(lines: &[String], start: usize, end: usize) -> Range {
    let end_character = lines.get(end).map_or(0, |line| utf16_len(line));
    let start_character = lines.get(start).map_or(0, |line| indentation(line) as u32);
    Range::new(
        Position::new(start as u32, start_character),
        Position::new(end as u32, end_character),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(symbols: &[DocumentSymbol]) -> Vec<&str> {
        symbols.iter().map(|symbol| symbol.name.as_str()).collect()
    }

    fn children(symbol: &DocumentSymbol) -> Vec<&str> {
        symbol.children.as_deref().map(names).unwrap_or_default()
    }

    fn folds(ranges: &[FoldingRange]) -> Vec<(u32, u32)> {
        ranges.iter().map(|range| (range.start_line, range.end_line)).collect()
    }

    const XML: &str = r#"<camelContext xmlns="http://camel.apache.org/schema/spring">
  <route id="ticker">
    <from uri="timer:tick?period=5"/>
    <choice>
      <when><simple>${body}</simple><to uri="direct:a"/></when>
    </choice>
  </route>
  <route>
    <from uri="direct:a"/>
  </route>
</camelContext>"#;

    #[test]
    fn test_xml_symbols() {
        let doc = Document::new(XML, 0);
        let symbols = document_symbols(&doc, Dialect::Xml);
        assert_eq!(names(&symbols), vec![NO_ID]);
        let routes = symbols[0].children.as_deref().unwrap();
        assert_eq!(names(routes), vec!["ticker", NO_ID]);
        assert_eq!(children(&routes[0]), vec!["from timer:tick", "to direct:a"]);
        assert_eq!(routes[0].range.start, Position::new(1, 2));
    }

    #[test]
    fn test_xml_folding() {
        let doc = Document::new(XML, 0);
        assert_eq!(
            folds(&folding_ranges(&doc, Dialect::Xml)),
            vec![(0, 10), (1, 6), (3, 5), (7, 9)]
        );
    }

    #[test]
    fn test_malformed_xml_has_no_routes() {
        let doc = Document::new("<route><from uri=\"timer:a\">", 0);
        assert!(folding_ranges(&doc, Dialect::Xml).is_empty());
    }

    const JAVA: &str = r#"public class Routes extends RouteBuilder {
    public void configure() {
        from("timer:tick?period=1000")
            .choice()
                .when(simple("${body}"))
                    .to("log:a")
            .end()
            .to("direct:b");

        from("direct:b").to("log:b");
    }
}"#;

    #[test]
    fn test_java_symbols() {
        let doc = Document::new(JAVA, 0);
        let symbols = document_symbols(&doc, Dialect::Java);
        assert_eq!(names(&symbols), vec!["from timer:tick", "from direct:b"]);
        assert_eq!(
            children(&symbols[0]),
            vec!["from timer:tick", "to log:a", "to direct:b"]
        );
        assert_eq!(symbols[0].range.start, Position::new(2, 8));
        assert_eq!(symbols[0].range.end.line, 7);
    }

    #[test]
    fn test_java_folding() {
        let doc = Document::new(JAVA, 0);
        assert_eq!(folds(&folding_ranges(&doc, Dialect::Java)), vec![(2, 7), (3, 6)]);
    }

    const YAML: &str = "- from:\n    uri: \"timer:tick\"\n    steps:\n      - choice:\n          when:\n            - simple: \"${body}\"\n      - to: \"log:x\"\n\n- from:\n    uri: \"direct:b\"";

    #[test]
    fn test_yaml_symbols_and_folding() {
        let doc = Document::new(YAML, 0);
        let symbols = document_symbols(&doc, Dialect::Yaml);
        assert_eq!(names(&symbols), vec!["from timer:tick", "from direct:b"]);
        assert_eq!(children(&symbols[0]), vec!["from timer:tick", "to log:x"]);
        assert_eq!(
            folds(&folding_ranges(&doc, Dialect::Yaml)),
            vec![(0, 6), (3, 5), (8, 9)]
        );
    }

    #[test]
    fn test_properties_list_endpoints() {
        let doc = Document::new("camel.sink.url=kafka:topic?brokers=x\nname=a", 0);
        let symbols = document_symbols(&doc, Dialect::Properties);
        assert_eq!(names(&symbols), vec!["to kafka:topic"]);
        assert!(folding_ranges(&doc, Dialect::Properties).is_empty());
    }
}
