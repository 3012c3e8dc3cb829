//! Completion provider.
//!
//! Provides completion for:
//! - Component schemes, path parameters, option names and option values of
//!   endpoint URIs
//! - Camel K modeline options, trait definitions and trait properties
//! - `camel.component.*`, `camel.main.*` and `camel.rest.*` keys and values
//!   in properties files
//! - Inserting a modeline at the top of Camel K sources

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::debug;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionItemTag, CompletionTextEdit, Documentation,
    InsertTextFormat, MarkupContent, MarkupKind, Position, Range, TextEdit,
};

use crate::catalog::model::dash_to_camel;
use crate::catalog::kamelets::kamelets_for;
use crate::catalog::main_model::{camel_to_dash, find_main_option, group_options, MAIN_GROUPS};
use crate::catalog::traits::{find_trait, traits};
use crate::catalog::validation::COMPONENT_PROPERTY_PREFIX;
use crate::catalog::{Catalog, ComponentModel, EndpointOptionModel};
use crate::dialect::properties::{split_property, URL_KEYS};
use crate::dialect::{extract_all_endpoints, extract_uri_at, Dialect};
use crate::document::Document;
use crate::modeline::{
    Modeline, ModelineElement, ModelineOption, ModelineValue, OPTION_CONFIG, OPTION_DEPENDENCY,
    OPTION_NAMES, OPTION_OPEN_API, OPTION_PROPERTY, OPTION_PROPERTY_FILE, OPTION_RESOURCE,
};
use crate::position::{column_to_byte, floor_char_boundary, line_range};
use crate::uri::{PathParam, UriElement, UriInstance, REFERENCE_COMPONENTS};

const FILE_PREFIX: &str = "file:";
const KAMELET: &str = "kamelet";
const CAMEL_PREFIX: &str = "camel.";
const PROPERTY_GROUPS: &[&str] = &["component", "main", "rest"];
/// Folders holding editor settings, never offered as resources.
const IDE_CONFIG_FOLDERS: &[&str] = &[".vscode", ".settings", ".theia", ".git"];
const MAX_FILE_DEPTH: usize = 8;

/// Where completion was requested.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub document: &'a Document,
    pub dialect: Dialect,
    pub position: Position,
    /// Path of the document on disk, for file name completion.
    pub path: Option<&'a Path>,
}

/// What the cursor is on.
#[derive(Debug)]
pub enum CompletionContext {
    Modeline { modeline: Modeline, offset: usize },
    ModelineInsertion,
    PropertyLine { line: String, offset: usize },
    Endpoint { uri: UriInstance, offset: usize },
    Unknown,
}

/// Work out the completion context of a request.
pub fn completion_context(request: &CompletionRequest<'_>) -> CompletionContext {
    let line_no = request.position.line as usize;
    let Some(line) = request.document.line(line_no) else {
        return CompletionContext::Unknown;
    };
    let offset = column_to_byte(&line, request.position.character);

    if let Some(modeline) = Modeline::parse(&line) {
        if offset >= modeline.prefix_end() {
            return CompletionContext::Modeline { modeline, offset };
        }
        return CompletionContext::Unknown;
    }

    if can_insert_modeline(request, line_no, &line) {
        return CompletionContext::ModelineInsertion;
    }

    if let Some(uri) = extract_uri_at(request.document, request.dialect, request.position) {
        if let Some(offset) = uri.relative_offset(request.position) {
            return CompletionContext::Endpoint { uri, offset };
        }
    }

    if request.dialect == Dialect::Properties {
        return CompletionContext::PropertyLine { line, offset };
    }
    CompletionContext::Unknown
}

/// Get completions for a position. Never fails; no match gives no items.
pub fn get_completions(request: &CompletionRequest<'_>, catalog: &Catalog) -> Vec<CompletionItem> {
    let context = completion_context(request);
    debug!("Completion context: {:?}", context);
    let line_no = request.position.line;

    match context {
        CompletionContext::Modeline { modeline, offset } => {
            get_modeline_completions(&modeline, offset, line_no, request.path, catalog)
        }
        CompletionContext::ModelineInsertion => get_modeline_insertion(request.dialect, request.position),
        CompletionContext::PropertyLine { line, offset } => {
            get_property_line_completions(&line, offset, line_no, catalog)
        }
        CompletionContext::Endpoint { uri, offset } => {
            let channel_ids = channel_ids(request.document, request.dialect, &uri);
            get_endpoint_completions(&uri, offset, catalog, &channel_ids)
        }
        CompletionContext::Unknown => vec![],
    }
}

// ---------------------------------------------------------------------------
// Endpoint URIs
// ---------------------------------------------------------------------------

/// Completions for an offset inside an endpoint URI.
pub fn get_endpoint_completions(
    uri: &UriInstance,
    offset: usize,
    catalog: &Catalog,
    channel_ids: &[String],
) -> Vec<CompletionItem> {
    let element = uri.element_at(offset);
    debug!("Completing {} at offset {}", element.describe(), offset);

    match element {
        UriElement::Uri(_) | UriElement::ComponentAndPath(_) | UriElement::Component(_) => {
            get_component_completions(uri, offset, catalog)
        }
        UriElement::PathParam(param) => get_path_param_completions(uri, param, offset, catalog, channel_ids),
        UriElement::OptionKey(option) => {
            let Some(model) = uri.component_name().and_then(|name| catalog.component(name)) else {
                return vec![];
            };
            let range = uri.absolute_range(option.key.start, option.key.end);
            let typed = typed_prefix(&option.key.name, option.key.start, offset);
            let present: BTreeSet<&str> = uri
                .options()
                .iter()
                .filter(|other| other.start != option.start)
                .map(|other| other.key.name.as_str())
                .collect();
            available_options(model, uri)
                .into_iter()
                .filter(|definition| {
                    definition.name.starts_with(typed) && !present.contains(definition.name.as_str())
                })
                .map(|definition| {
                    let new_text = match option.value {
                        Some(_) => definition.name.clone(),
                        None => format!(
                            "{}={}",
                            definition.name,
                            definition.default_value.as_deref().unwrap_or_default()
                        ),
                    };
                    option_item(definition, range, new_text)
                })
                .collect()
        }
        UriElement::OptionValue(option) => {
            let Some(model) = uri.component_name().and_then(|name| catalog.component(name)) else {
                return vec![];
            };
            let Some(value) = &option.value else {
                return vec![];
            };
            let range = uri.absolute_range(value.start, value.end);
            let typed = typed_prefix(&value.value, value.start, offset);
            available_options(model, uri)
                .into_iter()
                .find(|definition| definition.name == option.key.name)
                .map(|definition| value_items(definition, range, typed))
                .unwrap_or_default()
        }
        UriElement::OptionParam(_) => vec![],
    }
}

/// Component schemes, filtered by the text typed before the cursor.
fn get_component_completions(uri: &UriInstance, offset: usize, catalog: &Catalog) -> Vec<CompletionItem> {
    let raw = uri.raw();
    let (start, end, scheme_end) = match uri.component_and_path() {
        Some(cap) => (cap.start, cap.end, cap.component.end),
        None => (0, raw.len(), raw.len()),
    };
    let typed_end = floor_char_boundary(raw, offset);
    let filter = if typed_end > scheme_end {
        // past the scheme: `ahc:` must not match `ahc-ws:`
        format!("{}:", &raw[start..scheme_end])
    } else {
        raw[start..typed_end].to_string()
    };
    let range = uri.absolute_range(start, end);

    catalog
        .components()
        .filter_map(|model| {
            let label = component_label(model);
            label.starts_with(&filter).then(|| {
                let mut item = edit_item(&label, CompletionItemKind::CLASS, range, label.clone());
                item.detail = Some(model.title.clone());
                item.documentation = Some(markdown(model.documentation()));
                deprecate(&mut item, model.deprecated);
                item
            })
        })
        .collect()
}

fn component_label(model: &ComponentModel) -> String {
    if model.syntax.is_empty() {
        format!("{}:", model.scheme)
    } else {
        model.syntax.clone()
    }
}

/// Path parameter completions: kamelet templates, API names and methods,
/// enum values, else the component schemes the parameter belongs to.
fn get_path_param_completions(
    uri: &UriInstance,
    param: &PathParam,
    offset: usize,
    catalog: &Catalog,
    channel_ids: &[String],
) -> Vec<CompletionItem> {
    let range = uri.absolute_range(param.start, param.end);
    let typed = typed_prefix(&param.value, param.start, offset);

    if param.index == 0 && uri.component_name() == Some(KAMELET) {
        return kamelets_for(uri.is_producer())
            .filter(|kamelet| kamelet.name.starts_with(typed))
            .map(|kamelet| {
                let mut item = edit_item(&kamelet.name, CompletionItemKind::MODULE, range, kamelet.name.clone());
                item.detail = Some(kamelet.title.clone());
                item.documentation = Some(markdown(kamelet.documentation()));
                item
            })
            .collect();
    }

    let Some(model) = uri.component_name().and_then(|name| catalog.component(name)) else {
        return vec![];
    };

    if model.is_api_based() {
        return match param.index {
            0 => model
                .apis
                .iter()
                .filter(|api| api.name.starts_with(typed))
                .map(|api| {
                    let mut item = edit_item(&api.name, CompletionItemKind::MODULE, range, api.name.clone());
                    item.documentation = Some(Documentation::String(api.description.clone()));
                    item
                })
                .collect(),
            1 => uri
                .path_param(0)
                .and_then(|api| model.api(&api.value))
                .map(|api| {
                    api.methods
                        .iter()
                        .filter(|method| method.alias.starts_with(typed))
                        .map(|method| {
                            let mut item =
                                edit_item(&method.alias, CompletionItemKind::METHOD, range, method.alias.clone());
                            item.documentation = Some(Documentation::String(method.description.clone()));
                            item
                        })
                        .collect()
                })
                .unwrap_or_default(),
            _ => vec![],
        };
    }

    if let Some(definition) = model
        .path_option(param.index)
        .filter(|definition| !definition.enums.is_empty() || definition.is_boolean())
    {
        return value_items(definition, range, typed);
    }
    if param.index > 1 {
        return vec![];
    }

    let mut items = get_component_completions(uri, offset, catalog);
    if param.index == 0 && REFERENCE_COMPONENTS.contains(&model.scheme.as_str()) {
        items.extend(channel_ids.iter().filter(|id| id.starts_with(typed)).map(|id| {
            let mut item = edit_item(id, CompletionItemKind::REFERENCE, range, id.clone());
            item.detail = Some(format!("{} endpoint", model.scheme));
            item
        }));
    }
    items
}

/// Parameters usable by the endpoint's role, plus API method properties.
fn available_options<'a>(model: &'a ComponentModel, uri: &UriInstance) -> Vec<&'a EndpointOptionModel> {
    let mut options: Vec<&EndpointOptionModel> = model.parameter_options(uri.is_producer()).collect();
    if let Some(method) = uri
        .component_and_path()
        .and_then(|cap| cap.api_name().zip(cap.method_name()))
        .and_then(|(api, method)| model.api(&api.value)?.method(&method.value))
    {
        options.extend(method.properties.iter());
    }
    options
}

/// Ids of reference-style endpoints with the same scheme in the document.
fn channel_ids(doc: &Document, dialect: Dialect, uri: &UriInstance) -> Vec<String> {
    let Some(scheme) = uri.component_name().filter(|_| uri.is_reference_component()) else {
        return Vec::new();
    };
    let ids: BTreeSet<String> = extract_all_endpoints(doc, dialect)
        .iter()
        .filter(|endpoint| endpoint.uri.component_name() == Some(scheme))
        .filter_map(|endpoint| endpoint.uri.reference_key().map(str::to_string))
        .collect();
    ids.into_iter().collect()
}

fn option_item(definition: &EndpointOptionModel, range: Range, new_text: String) -> CompletionItem {
    let mut item = edit_item(&definition.name, CompletionItemKind::PROPERTY, range, new_text);
    item.detail = Some(format!("{} ({})", definition.option_type, definition.group));
    item.documentation = Some(markdown(definition.documentation()));
    deprecate(&mut item, definition.deprecated);
    item
}

/// Enum values, or `true`/`false` for boolean options, starting with `typed`.
fn value_items(definition: &EndpointOptionModel, range: Range, typed: &str) -> Vec<CompletionItem> {
    let values: Vec<String> = if !definition.enums.is_empty() {
        definition.enums.clone()
    } else if definition.is_boolean() {
        vec!["true".to_string(), "false".to_string()]
    } else {
        return vec![];
    };
    values
        .into_iter()
        .filter(|value| value.starts_with(typed))
        .map(|value| {
            let mut item = edit_item(&value, CompletionItemKind::VALUE, range, value.clone());
            if definition.default_value.as_deref() == Some(value.as_str()) {
                item.detail = Some("default".to_string());
            }
            item
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Modelines
// ---------------------------------------------------------------------------

fn get_modeline_completions(
    modeline: &Modeline,
    offset: usize,
    line_no: u32,
    document_path: Option<&Path>,
    catalog: &Catalog,
) -> Vec<CompletionItem> {
    let line = modeline.line();
    let range = |start: usize, end: usize| line_range(line_no, line, start, end);

    match modeline.element_at(offset) {
        None => option_name_items("", range(offset, offset), true),
        Some(ModelineElement::OptionName(option)) => {
            let typed = typed_prefix(&option.name, option.start, offset);
            option_name_items(typed, range(option.start, option.name_end()), option.value.is_none())
        }
        Some(ModelineElement::TraitDefinition(_, trait_value)) => {
            let typed = typed_prefix(&trait_value.definition, trait_value.definition_start, offset);
            let add_dot = trait_value.property.is_none();
            let replace = range(trait_value.definition_start, trait_value.definition_end());
            traits()
                .iter()
                .filter(|definition| definition.name.starts_with(typed))
                .map(|definition| {
                    let new_text = if add_dot {
                        format!("{}.", definition.name)
                    } else {
                        definition.name.clone()
                    };
                    let mut item = edit_item(&definition.name, CompletionItemKind::MODULE, replace, new_text);
                    item.documentation = Some(Documentation::String(definition.description.clone()));
                    item
                })
                .collect()
        }
        Some(ModelineElement::TraitProperty(option, trait_value, property)) => {
            let Some(definition) = find_trait(&trait_value.definition) else {
                return vec![];
            };
            if offset <= property.name_end() {
                let typed = typed_prefix(&property.name, property.start, offset);
                let replace = range(property.start, property.name_end());
                definition
                    .properties
                    .iter()
                    .filter(|p| p.name.starts_with(typed))
                    .map(|p| {
                        let new_text = match property.value {
                            Some(_) => p.name.clone(),
                            None => format!("{}={}", p.name, p.default_value().unwrap_or_default()),
                        };
                        let mut item = edit_item(&p.name, CompletionItemKind::PROPERTY, replace, new_text);
                        item.detail = Some(p.property_type.clone());
                        item.documentation = Some(markdown(p.documentation()));
                        item
                    })
                    .collect()
            } else {
                let replace = range(property.name_end() + 1, option.end());
                let Some(p) = definition.property(&property.name) else {
                    return vec![];
                };
                let values = if p.property_type == "bool" {
                    vec!["true".to_string(), "false".to_string()]
                } else {
                    p.default_value().into_iter().collect()
                };
                values
                    .into_iter()
                    .map(|value| edit_item(&value, CompletionItemKind::VALUE, replace, value.clone()))
                    .collect()
            }
        }
        Some(ModelineElement::OptionValue(option, value)) => {
            get_modeline_value_completions(option, value, offset, line_no, line, document_path, catalog)
        }
    }
}

fn option_name_items(typed: &str, range: Range, add_equals: bool) -> Vec<CompletionItem> {
    OPTION_NAMES
        .iter()
        .filter(|(name, _)| name.starts_with(typed))
        .map(|(name, description)| {
            let new_text = if add_equals {
                format!("{name}=")
            } else {
                name.to_string()
            };
            let mut item = edit_item(name, CompletionItemKind::PROPERTY, range, new_text);
            item.documentation = Some(Documentation::String(description.to_string()));
            item
        })
        .collect()
}

fn get_modeline_value_completions(
    option: &ModelineOption,
    value: &ModelineValue,
    offset: usize,
    line_no: u32,
    line: &str,
    document_path: Option<&Path>,
    catalog: &Catalog,
) -> Vec<CompletionItem> {
    let typed = typed_prefix(&value.text, value.start, offset);
    let value_range = line_range(line_no, line, value.start, value.end());
    let after_file_prefix = line_range(line_no, line, value.start + FILE_PREFIX.len(), value.end());

    match option.name.as_str() {
        OPTION_DEPENDENCY => {
            let artifacts: BTreeMap<&str, &ComponentModel> = catalog
                .components()
                .filter(|model| !model.artifact_id.is_empty() && model.artifact_id.starts_with(typed))
                .map(|model| (model.artifact_id.as_str(), model))
                .collect();
            let mut items: Vec<CompletionItem> = artifacts
                .into_iter()
                .map(|(artifact, model)| {
                    let mut item = edit_item(artifact, CompletionItemKind::MODULE, value_range, artifact.to_string());
                    item.documentation = Some(Documentation::String(model.description.clone()));
                    deprecate(&mut item, model.deprecated);
                    item
                })
                .collect();
            let mut mvn = edit_item(
                "mvn:<groupId>/<artifactId>:<version>",
                CompletionItemKind::SNIPPET,
                value_range,
                "mvn:${1:groupId}/${2:artifactId}:${3:version}".to_string(),
            );
            mvn.sort_text = Some("1".to_string());
            mvn.insert_text_format = Some(InsertTextFormat::SNIPPET);
            items.push(mvn);
            items
        }
        OPTION_CONFIG if typed.starts_with(FILE_PREFIX) => {
            file_items(document_path, after_file_prefix, |_| true)
        }
        OPTION_CONFIG => [
            ("configmap:", "Add a runtime configuration from a Configmap (syntax: configmap:name[/key])"),
            ("secret:", "Add a runtime configuration from a Secret (syntax: secret:name[/key])"),
            ("file:", "Add a runtime configuration from a file (syntax: file:path)"),
        ]
        .iter()
        .filter(|(prefix, _)| prefix.starts_with(typed))
        .map(|(prefix, doc)| {
            let mut item = edit_item(prefix, CompletionItemKind::KEYWORD, value_range, prefix.to_string());
            item.documentation = Some(Documentation::String(doc.to_string()));
            item
        })
        .collect(),
        OPTION_PROPERTY if typed.starts_with(FILE_PREFIX) => {
            file_items(document_path, after_file_prefix, is_properties_file)
        }
        OPTION_PROPERTY => {
            let mut items = Vec::new();
            if FILE_PREFIX.starts_with(typed) {
                items.push(edit_item(FILE_PREFIX, CompletionItemKind::KEYWORD, value_range, FILE_PREFIX.to_string()));
            }
            let cursor = offset - value.start;
            items.extend(property_completions(&value.text, cursor, value.start, line_no, line, catalog));
            items
        }
        OPTION_PROPERTY_FILE => file_items(document_path, value_range, is_properties_file),
        OPTION_RESOURCE => file_items(document_path, value_range, |_| true),
        OPTION_OPEN_API => file_items(document_path, value_range, |path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext, "json" | "yaml" | "yml"))
        }),
        _ => vec![],
    }
}

fn is_properties_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "properties")
}

/// Files next to the document, relative to its folder.
fn file_items(document_path: Option<&Path>, range: Range, filter: impl Fn(&Path) -> bool) -> Vec<CompletionItem> {
    let Some(document_path) = document_path else {
        return vec![];
    };
    let Some(folder) = document_path.parent() else {
        return vec![];
    };
    let mut files = Vec::new();
    collect_files(folder, 0, &mut files);
    files.sort();

    files
        .into_iter()
        .filter(|path| path != document_path && filter(path))
        .filter_map(|path| {
            let relative = path.strip_prefix(folder).ok()?.to_string_lossy().replace('\\', "/");
            Some(edit_item(&relative, CompletionItemKind::FILE, range, relative.clone()))
        })
        .collect()
}

fn collect_files(folder: &Path, depth: usize, files: &mut Vec<PathBuf>) {
    if depth > MAX_FILE_DEPTH {
        return;
    }
    let Ok(entries) = std::fs::read_dir(folder) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| IDE_CONFIG_FOLDERS.contains(&name));
        if hidden {
            continue;
        }
        if path.is_dir() {
            collect_files(&path, depth + 1, files);
        } else if path.is_file() {
            files.push(path);
        }
    }
}

fn can_insert_modeline(request: &CompletionRequest<'_>, line_no: usize, line: &str) -> bool {
    let is_camel_k_source = request.path.is_some_and(|path| {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        match request.dialect {
            Dialect::Java => true,
            Dialect::Xml => name.ends_with(".camelk.xml"),
            Dialect::Yaml => name.ends_with(".camelk.yaml") || name.ends_with(".camelk.yml"),
            Dialect::Properties => false,
        }
    });
    if !is_camel_k_source || !line.trim().is_empty() {
        return false;
    }
    let doc = request.document;
    let has_modeline = doc.lines().any(|l| Modeline::parse(&l).is_some());
    !has_modeline
        && (0..line_no).all(|previous| {
            doc.line(previous)
                .is_some_and(|l| request.dialect.is_comment_or_blank(&l))
        })
}

fn get_modeline_insertion(dialect: Dialect, position: Position) -> Vec<CompletionItem> {
    let prefix = dialect.modeline_prefix();
    let new_text = match dialect {
        Dialect::Xml => format!("{prefix}$0 -->"),
        _ => format!("{prefix}$0"),
    };
    let label = prefix.trim_end();
    let mut item = edit_item(label, CompletionItemKind::SNIPPET, Range::new(position, position), new_text);
    item.insert_text_format = Some(InsertTextFormat::SNIPPET);
    item.documentation = Some(Documentation::String(
        "Insert a Camel K modeline to configure the integration".to_string(),
    ));
    vec![item]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn get_property_line_completions(line: &str, offset: usize, line_no: u32, catalog: &Catalog) -> Vec<CompletionItem> {
    if line.trim().is_empty() {
        return property_completions("", 0, offset, line_no, line, catalog);
    }
    let Some((key, _)) = split_property(line) else {
        return vec![];
    };
    if URL_KEYS.iter().any(|(url_key, _)| *url_key == key) && line.contains(['=', ':']) {
        return vec![];
    }
    let key_start = line.len() - line.trim_start().len();
    property_completions(&line[key_start..], offset.saturating_sub(key_start), key_start, line_no, line, catalog)
}

/// Completions for `camel.component.<scheme>.<option>=value` text.
///
/// `text` starts at byte `text_start` of `line`; `cursor` is relative to `text`.
fn property_completions(
    text: &str,
    cursor: usize,
    text_start: usize,
    line_no: u32,
    line: &str,
    catalog: &Catalog,
) -> Vec<CompletionItem> {
    let cursor = floor_char_boundary(text, cursor);
    let range = |start: usize, end: usize| line_range(line_no, line, text_start + start, text_start + end);
    let separator = text.find(['=', ':']);
    let key_end = separator.unwrap_or(text.trim_end().len());

    if let Some(separator) = separator.filter(|separator| cursor > *separator) {
        let key = text[..separator].trim_end();
        let value_start = separator + 1 + (text[separator + 1..].len() - text[separator + 1..].trim_start().len());
        let value_end = text.trim_end().len().max(value_start);
        let typed = text.get(value_start..cursor).unwrap_or_default();
        return property_option(catalog, key)
            .map(|definition| value_items(definition, range(value_start, value_end), typed))
            .unwrap_or_default();
    }

    let typed = &text[..cursor.min(key_end)];
    if let Some(rest) = typed.strip_prefix(COMPONENT_PROPERTY_PREFIX) {
        let rest_start = COMPONENT_PROPERTY_PREFIX.len();
        return match rest.split_once('.') {
            Some((scheme, option)) => {
                let Some(model) = catalog.component(scheme) else {
                    return vec![];
                };
                let option_start = rest_start + scheme.len() + 1;
                let camel_typed = dash_to_camel(option);
                model
                    .component_options
                    .iter()
                    .filter(|definition| definition.name.starts_with(&camel_typed))
                    .map(|definition| {
                        option_item(definition, range(option_start, key_end), definition.name.clone())
                    })
                    .collect()
            }
            None => catalog
                .components()
                .filter(|model| model.scheme.starts_with(rest))
                .map(|model| {
                    let mut item = edit_item(
                        &model.scheme,
                        CompletionItemKind::CLASS,
                        range(rest_start, key_end),
                        format!("{}.", model.scheme),
                    );
                    item.documentation = Some(markdown(model.documentation()));
                    deprecate(&mut item, model.deprecated);
                    item
                })
                .collect(),
        };
    }

    if let Some((group, option)) = typed
        .strip_prefix(CAMEL_PREFIX)
        .and_then(|rest| rest.split_once('.'))
        .filter(|(group, _)| MAIN_GROUPS.contains(group))
    {
        let option_start = CAMEL_PREFIX.len() + group.len() + 1;
        let dashed = option.contains('-');
        let camel_typed = dash_to_camel(option);
        return group_options(group)
            .filter(|(short, _)| short.starts_with(&camel_typed))
            .map(|(short, definition)| {
                let label = if dashed { camel_to_dash(short) } else { short.to_string() };
                let new_text = match separator {
                    Some(_) => label.clone(),
                    None => format!("{label}="),
                };
                let mut item = option_item(definition, range(option_start, key_end), new_text);
                item.label = label;
                item
            })
            .collect();
    }

    if let Some(rest) = typed.strip_prefix(CAMEL_PREFIX) {
        return PROPERTY_GROUPS
            .iter()
            .filter(|group| group.starts_with(rest))
            .map(|group| {
                edit_item(
                    group,
                    CompletionItemKind::MODULE,
                    range(CAMEL_PREFIX.len(), key_end),
                    format!("{group}."),
                )
            })
            .collect();
    }

    if CAMEL_PREFIX.starts_with(typed) {
        return vec![edit_item(
            CAMEL_PREFIX,
            CompletionItemKind::MODULE,
            range(0, key_end),
            CAMEL_PREFIX.to_string(),
        )];
    }
    vec![]
}

/// Option definition of a `camel.component.<scheme>.<option>` key.
pub(crate) fn component_option<'a>(catalog: &'a Catalog, key: &str) -> Option<&'a EndpointOptionModel> {
    let rest = key.strip_prefix(COMPONENT_PROPERTY_PREFIX)?;
    let (scheme, option) = rest.split_once('.')?;
    catalog.component(scheme)?.component_option(option)
}

/// Component option or `camel.main.*`/`camel.rest.*` option of a key.
fn property_option<'a>(catalog: &'a Catalog, key: &str) -> Option<&'a EndpointOptionModel> {
    component_option(catalog, key).or_else(|| find_main_option(key))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Text typed between `start` and the cursor.
fn typed_prefix(text: &str, start: usize, offset: usize) -> &str {
    &text[..floor_char_boundary(text, offset.saturating_sub(start))]
}

fn edit_item(label: &str, kind: CompletionItemKind, range: Range, new_text: String) -> CompletionItem {
    CompletionItem {
        label: label.to_string(),
        kind: Some(kind),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit { range, new_text })),
        ..Default::default()
    }
}

fn markdown(value: String) -> Documentation {
    Documentation::MarkupContent(MarkupContent {
        kind: MarkupKind::Markdown,
        value,
    })
}

fn deprecate(item: &mut CompletionItem, deprecated: bool) {
    if deprecated {
        item.tags = Some(vec![CompletionItemTag::DEPRECATED]);
    }
}
