//! Host document dialects: where endpoint URIs live in XML, Java, YAML and
//! properties files.
//!
//! Adapters locate the raw URI text and its anchor position; everything
//! else works on the resulting [`UriInstance`]. A document that cannot be
//! parsed yields no endpoints.

pub mod java;
pub mod properties;
pub mod xml;
pub mod yaml;

use tower_lsp::lsp_types::{Position, Range, Url};

use crate::document::Document;
use crate::position::{byte_to_column, column_to_byte};
use crate::uri::UriInstance;

/// Supported host document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Xml,
    Java,
    Yaml,
    Properties,
}

impl Dialect {
    /// Dialect of a document, from its file extension.
    pub fn from_uri(uri: &Url) -> Option<Self> {
        Self::from_path(uri.path())
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let extension = path.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "xml" => Some(Dialect::Xml),
            "java" => Some(Dialect::Java),
            "yaml" | "yml" => Some(Dialect::Yaml),
            "properties" => Some(Dialect::Properties),
            _ => None,
        }
    }

    /// Option separator as written in this dialect.
    pub fn separator(&self) -> &'static str {
        match self {
            Dialect::Xml => "&amp;",
            Dialect::Java | Dialect::Yaml | Dialect::Properties => "&",
        }
    }

    /// Text starting a Camel K modeline in this dialect.
    pub fn modeline_prefix(&self) -> &'static str {
        match self {
            Dialect::Xml => "<!-- camel-k: ",
            Dialect::Java => "// camel-k: ",
            Dialect::Yaml | Dialect::Properties => "# camel-k: ",
        }
    }

    /// Whether a line can appear above a modeline: blank or a comment.
    pub fn is_comment_or_blank(&self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.is_empty()
            || match self {
                Dialect::Xml => trimmed.starts_with("<!--") || trimmed.starts_with("<?xml"),
                Dialect::Java => trimmed.starts_with("//"),
                Dialect::Yaml | Dialect::Properties => trimmed.starts_with('#'),
            }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Dialect::Xml => "xml",
            Dialect::Java => "java",
            Dialect::Yaml => "yaml",
            Dialect::Properties => "properties",
        };
        f.write_str(name)
    }
}

/// An endpoint URI found in a document.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub uri: UriInstance,
    pub start_line: u32,
    pub end_line: u32,
}

impl Endpoint {
    pub fn new(uri: UriInstance) -> Self {
        let range = uri.full_range();
        Self {
            start_line: range.start.line,
            end_line: range.end.line,
            uri,
        }
    }

    pub fn range(&self) -> Range {
        self.uri.full_range()
    }

    pub fn is_producer(&self) -> bool {
        self.uri.is_producer()
    }
}

/// A URI literal on a single line: byte offsets of its content, quotes excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Literal {
    pub start: usize,
    pub end: usize,
    /// Whether the closing delimiter was found.
    pub closed: bool,
    pub producer: bool,
}

impl Literal {
    fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// The URI under the cursor, if the cursor is inside a URI literal.
pub fn extract_uri_at(doc: &Document, dialect: Dialect, position: Position) -> Option<UriInstance> {
    let line_no = position.line as usize;
    let line = doc.line(line_no)?;
    let cursor = column_to_byte(&line, position.character);

    let found = literals_on_line(doc, dialect, line_no, &line)
        .into_iter()
        .find(|literal| literal.contains(cursor))
        .map(|literal| uri_from_literal(dialect, line_no, &line, literal));
    if found.is_some() {
        return found;
    }

    // attribute values wrapped over several lines
    if dialect == Dialect::Xml {
        return xml::endpoints(doc)
            .into_iter()
            .map(|endpoint| endpoint.uri)
            .find(|uri| uri.relative_offset(position).is_some());
    }
    None
}

/// Every endpoint URI of a document.
pub fn extract_all_endpoints(doc: &Document, dialect: Dialect) -> Vec<Endpoint> {
    if dialect == Dialect::Xml {
        return xml::endpoints(doc);
    }

    let mut endpoints = Vec::new();
    for (line_no, line) in doc.lines().enumerate() {
        for literal in literals_on_line(doc, dialect, line_no, &line) {
            if literal.closed {
                endpoints.push(Endpoint::new(uri_from_literal(dialect, line_no, &line, literal)));
            }
        }
    }
    endpoints
}

fn literals_on_line(doc: &Document, dialect: Dialect, line_no: usize, line: &str) -> Vec<Literal> {
    match dialect {
        Dialect::Xml => xml::literals_on_line(doc, line_no, line),
        Dialect::Java => java::literals_on_line(line),
        Dialect::Yaml => yaml::literals_on_line(doc, line_no, line),
        Dialect::Properties => properties::literals_on_line(line),
    }
}

fn uri_from_literal(dialect: Dialect, line_no: usize, line: &str, literal: Literal) -> UriInstance {
    let anchor = Position {
        line: line_no as u32,
        character: byte_to_column(line, literal.start),
    };
    UriInstance::parse(
        &line[literal.start..literal.end],
        dialect.separator(),
        literal.producer,
        anchor,
    )
}
