//! Diagnostic generation for Camel documents.
//!
//! Generates LSP diagnostics for:
//! - Unknown options and invalid enum values of endpoint URIs
//! - Other endpoint validation failures (one aggregate diagnostic per endpoint)
//! - `camel.component.*` properties
//! - Modelines setting the same trait property twice

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Range};

use crate::catalog::{Catalog, ValidationResult};
use crate::dialect::{extract_all_endpoints, Dialect, Endpoint};
use crate::document::Document;
use crate::modeline::Modeline;
use crate::position::line_range;

/// Source of every diagnostic published by the server.
pub const DIAGNOSTIC_SOURCE: &str = "Apache Camel validation";
pub const ERROR_CODE_UNKNOWN_PROPERTIES: &str = "unknown-properties";
pub const ERROR_CODE_INVALID_ENUM: &str = "invalid-enum";

/// All diagnostics of a document. Deterministic for a given text and catalog.
pub fn compute_diagnostics(doc: &Document, dialect: Dialect, catalog: &Catalog) -> Vec<Diagnostic> {
    let mut diagnostics = generate_endpoint_diagnostics(doc, dialect, catalog);
    if dialect == Dialect::Properties {
        diagnostics.extend(generate_property_diagnostics(doc, catalog));
    }
    diagnostics.extend(generate_modeline_diagnostics(doc));
    diagnostics
}

/// Validate every endpoint URI of the document.
pub fn generate_endpoint_diagnostics(doc: &Document, dialect: Dialect, catalog: &Catalog) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for endpoint in extract_all_endpoints(doc, dialect) {
        let result = catalog.validate_endpoint(&endpoint.uri);
        if let Some(reason) = &result.incapable {
            diagnostics.push(diagnostic(
                endpoint.range(),
                DiagnosticSeverity::HINT,
                None,
                format!("Cannot validate endpoint: {reason}"),
            ));
            continue;
        }
        if !result.has_errors() {
            continue;
        }

        let mut itemized = 0;
        for name in &result.unknown {
            let mut d = diagnostic(
                locate_in_endpoint(&endpoint, name, None),
                DiagnosticSeverity::ERROR,
                Some(ERROR_CODE_UNKNOWN_PROPERTIES),
                "Unknown option".to_string(),
            );
            d.data = Some(serde_json::json!({ "option": name }));
            diagnostics.push(d);
            itemized += 1;
        }
        for (name, value) in &result.invalid_enum {
            let message = result.enum_message(name).unwrap_or_default();
            let mut d = diagnostic(
                locate_in_endpoint(&endpoint, name, Some(value)),
                DiagnosticSeverity::ERROR,
                Some(ERROR_CODE_INVALID_ENUM),
                message,
            );
            d.data = Some(serde_json::json!({ "option": name, "value": value }));
            diagnostics.push(d);
            itemized += 1;
        }
        if itemized < result.number_of_errors() {
            diagnostics.push(aggregate(&result, endpoint.range()));
        }
    }
    diagnostics
}

/// Range of an option name, or of its value when `value` is given.
///
/// Only whole option keys match, so `lay` never lands inside `delay`.
/// Multi-line endpoints fall back to the whole span.
fn locate_in_endpoint(endpoint: &Endpoint, name: &str, value: Option<&str>) -> Range {
    if endpoint.start_line != endpoint.end_line {
        return endpoint.range();
    }
    let uri = &endpoint.uri;
    let options = uri.options();
    let mut named = options.iter().filter(|option| option.key.name == name);
    let found = match value {
        None => named.next().map(|option| (option.key.start, option.key.end)),
        Some(value) => named
            .filter_map(|option| option.value.as_ref())
            .find(|option_value| option_value.value == value)
            .map(|option_value| (option_value.start, option_value.end)),
    };
    match found {
        Some((start, end)) => uri.absolute_range(start, end),
        None => endpoint.range(),
    }
}

/// Validate the `camel.component.*` lines of a properties file.
pub fn generate_property_diagnostics(doc: &Document, catalog: &Catalog) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (line_no, line) in doc.lines().enumerate() {
        let Some(result) = catalog.validate_property(&line) else {
            continue;
        };
        let line_no = line_no as u32;
        let whole_line = {
            let start = line.len() - line.trim_start().len();
            line_range(line_no, &line, start, line.trim_end().len())
        };
        if let Some(reason) = &result.incapable {
            diagnostics.push(diagnostic(
                whole_line,
                DiagnosticSeverity::HINT,
                None,
                format!("Cannot validate property: {reason}"),
            ));
            continue;
        }
        if !result.has_errors() {
            continue;
        }

        let mut itemized = 0;
        for key in &result.unknown {
            // only the option segment is wrong, the component part resolved
            let option = key.rsplit('.').next().unwrap_or(key);
            let option_start = line
                .find(key.as_str())
                .map(|index| index + key.len() - option.len());
            let range = option_start
                .map(|start| line_range(line_no, &line, start, start + option.len()))
                .unwrap_or(whole_line);
            let mut d = diagnostic(
                range,
                DiagnosticSeverity::ERROR,
                Some(ERROR_CODE_UNKNOWN_PROPERTIES),
                "Unknown option".to_string(),
            );
            d.data = Some(serde_json::json!({ "option": option }));
            diagnostics.push(d);
            itemized += 1;
        }
        for (key, value) in &result.invalid_enum {
            let value_start = line
                .find(key.as_str())
                .and_then(|key_start| {
                    let after = key_start + key.len();
                    line[after..].find(value.as_str()).map(|index| after + index)
                });
            let range = value_start
                .map(|start| line_range(line_no, &line, start, start + value.len()))
                .unwrap_or(whole_line);
            let mut d = diagnostic(
                range,
                DiagnosticSeverity::ERROR,
                Some(ERROR_CODE_INVALID_ENUM),
                result.enum_message(key).unwrap_or_default(),
            );
            d.data = Some(serde_json::json!({ "option": key, "value": value }));
            diagnostics.push(d);
            itemized += 1;
        }
        if itemized < result.number_of_errors() {
            diagnostics.push(aggregate(&result, whole_line));
        }
    }
    diagnostics
}

/// Trait properties set more than once across a modeline.
pub fn generate_modeline_diagnostics(doc: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (line_no, line) in doc.lines().enumerate() {
        let Some(modeline) = Modeline::parse(&line) else {
            continue;
        };
        for (option, key) in modeline.duplicated_trait_properties() {
            diagnostics.push(diagnostic(
                line_range(line_no as u32, &line, option.start, option.end()),
                DiagnosticSeverity::ERROR,
                None,
                format!("More than one trait defines the same property: {key}"),
            ));
        }
    }
    diagnostics
}

fn aggregate(result: &ValidationResult, range: Range) -> Diagnostic {
    diagnostic(
        range,
        DiagnosticSeverity::ERROR,
        None,
        result.summary_lines().join("\n"),
    )
}

fn diagnostic(range: Range, severity: DiagnosticSeverity, code: Option<&str>, message: String) -> Diagnostic {
    Diagnostic {
        range,
        severity: Some(severity),
        code: code.map(|code| NumberOrString::String(code.to_string())),
        code_description: None,
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message,
        related_information: None,
        tags: None,
        data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Position;

    fn diagnose(text: &str, dialect: Dialect) -> Vec<Diagnostic> {
        let catalog = Catalog::bundled().unwrap();
        compute_diagnostics(&Document::new(text, 0), dialect, &catalog)
    }

    fn range(line: u32, start: u32, end: u32) -> Range {
        Range::new(Position::new(line, start), Position::new(line, end))
    }

    fn code(d: &Diagnostic) -> Option<&str> {
        match &d.code {
            Some(NumberOrString::String(code)) => Some(code),
            _ => None,
        }
    }

    #[test]
    fn test_valid_endpoints_have_no_diagnostics() {
        let text = r#"from("timer:tick?period=1000").to("log:out?level=INFO");"#;
        assert!(diagnose(text, Dialect::Java).is_empty());
    }

    #[test]
    fn test_unknown_option_is_located() {
        let diagnostics = diagnose(r#"from("timer:foo?delai=5")"#, Dialect::Java);
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(code(d), Some(ERROR_CODE_UNKNOWN_PROPERTIES));
        assert_eq!(d.message, "Unknown option");
        assert_eq!(d.range, range(0, 16, 21));
        assert_eq!(d.source.as_deref(), Some(DIAGNOSTIC_SOURCE));
    }

    #[test]
    fn test_unknown_option_inside_longer_name_is_located() {
        let diagnostics = diagnose(r#"from("timer:foo?delay=5&lay=1")"#, Dialect::Java);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range, range(0, 24, 27));
    }

    #[test]
    fn test_invalid_enum_highlights_value_after_name() {
        let text = r#"<to uri="log:INFO?level=INFOO"/>"#;
        let diagnostics = diagnose(text, Dialect::Xml);
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(code(d), Some(ERROR_CODE_INVALID_ENUM));
        assert_eq!(d.range, range(0, 24, 29));
        assert!(d.message.starts_with("Invalid enum value: INFOO. Possible values: [TRACE"));
        assert!(d.message.ends_with("Default value: INFO"));
    }

    #[test]
    fn test_other_errors_are_aggregated() {
        let diagnostics = diagnose(r#"from("timer:foo?delay=abc&fixedRate=maybe")"#, Dialect::Java);
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(code(d), None);
        assert_eq!(d.range, range(0, 6, 41));
        assert_eq!(d.message.lines().count(), 2);
    }

    #[test]
    fn test_mixed_errors_add_aggregate() {
        let diagnostics = diagnose(r#"from("timer:foo?delai=5&fixedRate=maybe")"#, Dialect::Java);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(code(&diagnostics[0]), Some(ERROR_CODE_UNKNOWN_PROPERTIES));
        assert!(diagnostics[1].message.contains("Invalid boolean value: maybe"));
    }

    #[test]
    fn test_unknown_component_is_a_hint() {
        let diagnostics = diagnose(r#"to("acme:foo?bar=1")"#, Dialect::Java);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::HINT));
        assert!(diagnose(r#"to("{{target}}:foo")"#, Dialect::Java).is_empty());
    }

    #[test]
    fn test_diagnostics_are_idempotent() {
        let text = "- from:\n    uri: \"timer:foo?delai=5\"\n    steps:\n      - to: \"log:x?level=NOPE\"";
        assert_eq!(diagnose(text, Dialect::Yaml), diagnose(text, Dialect::Yaml));
        assert_eq!(diagnose(text, Dialect::Yaml).len(), 2);
    }

    #[test]
    fn test_multi_line_endpoint_falls_back_to_whole_span() {
        let text = "<routes>\n<to uri=\"log:a?\n  levl=INFO\"/>\n</routes>";
        let diagnostics = diagnose(text, Dialect::Xml);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range.start, Position::new(1, 9));
        assert_eq!(diagnostics[0].range.end.line, 2);
    }

    #[test]
    fn test_properties() {
        let text = "# comment\ncamel.component.timer.includeMetadta=true\ncamel.component.log.level=x\ncamel.main.name=a";
        let diagnostics = diagnose(text, Dialect::Properties);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].range, range(1, 22, 36));
        assert_eq!(code(&diagnostics[0]), Some(ERROR_CODE_UNKNOWN_PROPERTIES));
        // `level` is an endpoint option, not a component option
        assert_eq!(diagnostics[1].range, range(2, 20, 25));
    }

    #[test]
    fn test_property_invalid_value_is_aggregated() {
        let diagnostics = diagnose("camel.component.timer.includeMetadata=maybe", Dialect::Properties);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("Invalid boolean value: maybe"));
    }

    #[test]
    fn test_connector_url_is_validated() {
        let diagnostics = diagnose("camel.sink.url=log:x?levl=INFO", Dialect::Properties);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range, range(0, 21, 25));
    }

    #[test]
    fn test_duplicated_trait_properties() {
        let text = "// camel-k: trait=container.port=80 name=a trait=container.port=81\nclass R {}";
        let diagnostics = diagnose(text, Dialect::Java);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics[0].message,
            "More than one trait defines the same property: container.port"
        );
        assert_eq!(diagnostics[0].range, range(0, 12, 35));
    }
}
