//! Code actions: "Did you mean" quick-fixes for validation diagnostics and
//! refactorings of connector URLs and deprecated modeline options.

use std::collections::HashMap;
use std::path::Path;

use log::debug;
use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, Diagnostic, NumberOrString, Range, TextEdit,
    Url, WorkspaceEdit,
};

use crate::catalog::Catalog;
use crate::completion::{get_completions, CompletionRequest};
use crate::diagnostics::{DIAGNOSTIC_SOURCE, ERROR_CODE_INVALID_ENUM, ERROR_CODE_UNKNOWN_PROPERTIES};
use crate::dialect::properties::{split_property, URL_KEYS};
use crate::dialect::{extract_uri_at, Dialect};
use crate::document::Document;
use crate::modeline::{Modeline, OPTION_PROPERTY_FILE};
use crate::position::{column_to_byte, line_range};

pub const CONVERT_TO_PROPERTIES_TITLE: &str = "Convert to list of properties notation.";
pub const CONVERT_PROPERTY_FILE_TITLE: &str =
    "Convert deprecated modeline options property-file to property=file: notation";

/// Share of the invalid text length allowed as edit distance.
const DISTANCE_RATIO: f64 = 0.4;

/// A `textDocument/codeAction` request on an open document.
#[derive(Debug, Clone, Copy)]
pub struct CodeActionRequest<'a> {
    pub uri: &'a Url,
    pub document: &'a Document,
    pub dialect: Dialect,
    pub path: Option<&'a Path>,
    pub range: Range,
    pub diagnostics: &'a [Diagnostic],
    pub only: Option<&'a [CodeActionKind]>,
}

/// Quick-fixes and refactorings, filtered by the requested kinds.
pub fn get_code_actions(request: &CodeActionRequest<'_>, catalog: &Catalog) -> Vec<CodeActionOrCommand> {
    let wants = |kind: &CodeActionKind| {
        request.only.map_or(true, |only| {
            only.iter()
                .any(|requested| kind.as_str().starts_with(requested.as_str()))
        })
    };

    let mut actions = Vec::new();
    if wants(&CodeActionKind::QUICKFIX) {
        actions.extend(get_quickfixes(request, catalog));
    }
    if wants(&CodeActionKind::REFACTOR_REWRITE) {
        actions.extend(convert_connector_url(request, catalog));
        actions.extend(convert_property_file_options(request));
    }
    actions.into_iter().map(CodeActionOrCommand::CodeAction).collect()
}

/// One "Did you mean X?" action per legal value close to the invalid text.
pub fn get_quickfixes(request: &CodeActionRequest<'_>, catalog: &Catalog) -> Vec<CodeAction> {
    let mut actions = Vec::new();
    for diagnostic in request.diagnostics {
        if !is_fixable(diagnostic) || diagnostic.range.start.line != diagnostic.range.end.line {
            continue;
        }
        let Some(current) = text_in_range(request.document, diagnostic.range) else {
            continue;
        };
        let completion = CompletionRequest {
            document: request.document,
            dialect: request.dialect,
            position: diagnostic.range.start,
            path: request.path,
        };
        let bound = (current.chars().count() as f64 * DISTANCE_RATIO).floor() as usize;
        debug!("Quick-fix candidates for '{}' within distance {}", current, bound);

        for item in get_completions(&completion, catalog) {
            if bounded_levenshtein(&current, &item.label, bound).is_none() {
                continue;
            }
            actions.push(CodeAction {
                title: format!("Did you mean {}?", item.label),
                kind: Some(CodeActionKind::QUICKFIX),
                diagnostics: Some(vec![diagnostic.clone()]),
                edit: Some(single_file_edit(request.uri, vec![TextEdit {
                    range: diagnostic.range,
                    new_text: item.label,
                }])),
                ..Default::default()
            });
        }
    }
    actions
}

fn is_fixable(diagnostic: &Diagnostic) -> bool {
    let code_matches = matches!(
        &diagnostic.code,
        Some(NumberOrString::String(code))
            if code == ERROR_CODE_UNKNOWN_PROPERTIES || code == ERROR_CODE_INVALID_ENUM
    );
    code_matches && diagnostic.source.as_deref() == Some(DIAGNOSTIC_SOURCE)
}

fn text_in_range(doc: &Document, range: Range) -> Option<String> {
    let line = doc.line(range.start.line as usize)?;
    let start = column_to_byte(&line, range.start.character);
    let end = column_to_byte(&line, range.end.character).max(start);
    Some(line[start..end].to_string())
}

/// Edit distance between `a` and `b` if it is at most `bound`.
///
/// Gives up as soon as every entry of a row exceeds the bound.
pub fn bounded_levenshtein(a: &str, b: &str, bound: usize) -> Option<usize> {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.len().abs_diff(b_chars.len()) > bound {
        return None;
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];
    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        if current.iter().all(|&distance| distance > bound) {
            return None;
        }
        std::mem::swap(&mut previous, &mut current);
    }

    let distance = previous[b_chars.len()];
    (distance <= bound).then_some(distance)
}

/// `camel.sink.url=scheme:path?opt=v` into one property per path parameter
/// and option.
fn convert_connector_url(request: &CodeActionRequest<'_>, catalog: &Catalog) -> Option<CodeAction> {
    if request.dialect != Dialect::Properties || request.range.start.line != request.range.end.line {
        return None;
    }
    let line_no = request.range.start.line;
    let line = request.document.line(line_no as usize)?;
    let (key, value_start) = split_property(&line)?;
    URL_KEYS.iter().find(|(url_key, _)| *url_key == key)?;
    let direction = key.strip_prefix("camel.")?.strip_suffix(".url")?;

    let anchor = line_range(line_no, &line, value_start, value_start).start;
    let uri = extract_uri_at(request.document, request.dialect, anchor)?;
    let model = uri.component_name().and_then(|name| catalog.component(name));

    let mut properties = Vec::new();
    if let Some(cap) = uri.component_and_path() {
        for param in &cap.path_params {
            let name = model
                .and_then(|model| model.path_option(param.index))
                .map(|option| option.name.clone())
                .unwrap_or_else(|| param.index.to_string());
            properties.push(format!("camel.{direction}.path.{name}={}", param.value));
        }
    }
    for option in uri.options() {
        properties.push(format!(
            "camel.{direction}.endpoint.{}={}",
            option.key.name,
            option.value_str().unwrap_or_default()
        ));
    }
    if properties.is_empty() {
        return None;
    }

    let edit = TextEdit {
        range: line_range(line_no, &line, 0, line.len()),
        new_text: properties.join("\n"),
    };
    Some(CodeAction {
        title: CONVERT_TO_PROPERTIES_TITLE.to_string(),
        kind: Some(CodeActionKind::REFACTOR_REWRITE),
        edit: Some(single_file_edit(request.uri, vec![edit])),
        ..Default::default()
    })
}

/// Rewrite every `property-file=x` option of a modeline as `property=file:x`.
fn convert_property_file_options(request: &CodeActionRequest<'_>) -> Option<CodeAction> {
    if request.range.start.line != request.range.end.line {
        return None;
    }
    let line_no = request.range.start.line;
    let line = request.document.line(line_no as usize)?;
    let modeline = Modeline::parse(&line)?;

    let edits: Vec<TextEdit> = modeline
        .options()
        .iter()
        .filter(|option| option.name == OPTION_PROPERTY_FILE)
        .map(|option| TextEdit {
            range: line_range(line_no, &line, option.start, option.end()),
            new_text: format!(
                "property=file:{}",
                option.value.as_ref().map(|v| v.text.as_str()).unwrap_or_default()
            ),
        })
        .collect();
    if edits.is_empty() {
        return None;
    }
    Some(CodeAction {
        title: CONVERT_PROPERTY_FILE_TITLE.to_string(),
        kind: Some(CodeActionKind::REFACTOR_REWRITE),
        edit: Some(single_file_edit(request.uri, edits)),
        ..Default::default()
    })
}

fn single_file_edit(uri: &Url, edits: Vec<TextEdit>) -> WorkspaceEdit {
    WorkspaceEdit {
        changes: Some(HashMap::from([(uri.clone(), edits)])),
        ..Default::default()
    }
}
