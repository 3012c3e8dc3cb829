//! Hover provider.
//!
//! Provides documentation on hover for:
//! - Components, path parameters and options of endpoint URIs
//! - Modeline options, traits and dependencies
//! - `camel.component.*`, `camel.main.*` and `camel.rest.*` keys in
//!   properties files

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Range};

use crate::catalog::kamelets::find_kamelet;
use crate::catalog::main_model::{find_main_option, MAIN_GROUPS};
use crate::catalog::traits::find_trait;
use crate::catalog::validation::COMPONENT_PROPERTY_PREFIX;
use crate::catalog::{Catalog, ComponentModel};
use crate::completion::{completion_context, CompletionContext, CompletionRequest};
use crate::modeline::{option_description, Modeline, ModelineElement, OPTION_DEPENDENCY};
use crate::position::line_range;
use crate::uri::{UriElement, UriInstance};

const CAMEL_PREFIX: &str = "camel.";

/// Hover documentation for a position.
pub fn get_hover(request: &CompletionRequest<'_>, catalog: &Catalog) -> Option<Hover> {
    let line_no = request.position.line;
    match completion_context(request) {
        CompletionContext::Endpoint { uri, offset } => get_endpoint_hover(&uri, offset, catalog),
        CompletionContext::Modeline { modeline, offset } => {
            get_modeline_hover(&modeline, offset, line_no, catalog)
        }
        CompletionContext::PropertyLine { line, offset } => {
            get_property_hover(&line, offset, line_no, catalog)
        }
        CompletionContext::ModelineInsertion | CompletionContext::Unknown => None,
    }
}

fn get_endpoint_hover(uri: &UriInstance, offset: usize, catalog: &Catalog) -> Option<Hover> {
    let model = catalog.component(uri.component_name()?)?;
    let element = uri.element_at(offset);
    let (start, end) = element.span();
    let range = uri.absolute_range(start, end);

    let content = match element {
        UriElement::Uri(_) | UriElement::ComponentAndPath(_) | UriElement::Component(_) => {
            model.documentation()
        }
        UriElement::PathParam(param) if param.index == 0 && model.scheme == "kamelet" => {
            find_kamelet(&param.value)?.documentation()
        }
        UriElement::PathParam(param) if model.is_api_based() => match param.index {
            0 => {
                let api = model.api(&param.value)?;
                format!("**{}**\n\n{}", api.name, api.description)
            }
            1 => {
                let api = model.api(&uri.path_param(0)?.value)?;
                let method = api.method(&param.value)?;
                format!("**{}**\n\n{}", method.alias, method.description)
            }
            _ => return None,
        },
        UriElement::PathParam(param) => model.path_option(param.index)?.documentation(),
        UriElement::OptionParam(option) | UriElement::OptionKey(option) | UriElement::OptionValue(option) => {
            option_documentation(model, uri, &option.key.name)?
        }
    };
    Some(markdown_hover(content, range))
}

fn option_documentation(model: &ComponentModel, uri: &UriInstance, name: &str) -> Option<String> {
    if let Some(option) = model.endpoint_option(name).or_else(|| model.prefixed_option(name)) {
        return Some(option.documentation());
    }
    let cap = uri.component_and_path()?;
    let method = model.api(&cap.api_name()?.value)?.method(&cap.method_name()?.value)?;
    method
        .properties
        .iter()
        .find(|property| property.name == name)
        .map(|property| property.documentation())
}

fn get_modeline_hover(modeline: &Modeline, offset: usize, line_no: u32, catalog: &Catalog) -> Option<Hover> {
    let line = modeline.line();
    let range = |start: usize, end: usize| line_range(line_no, line, start, end);

    match modeline.element_at(offset)? {
        ModelineElement::OptionName(option) => Some(markdown_hover(
            format!("**{}**\n\n{}", option.name, option_description(&option.name)?),
            range(option.start, option.name_end()),
        )),
        ModelineElement::TraitDefinition(_, trait_value) => {
            let definition = find_trait(&trait_value.definition)?;
            Some(markdown_hover(
                format!("**{}** trait\n\n{}", definition.name, definition.description),
                range(trait_value.definition_start, trait_value.definition_end()),
            ))
        }
        ModelineElement::TraitProperty(_, trait_value, property) => {
            let definition = find_trait(&trait_value.definition)?.property(&property.name)?;
            Some(markdown_hover(
                definition.documentation(),
                range(property.start, property.name_end()),
            ))
        }
        ModelineElement::OptionValue(option, value) if option.name == OPTION_DEPENDENCY => {
            let model = catalog
                .components()
                .find(|model| model.artifact_id == value.text)?;
            Some(markdown_hover(model.documentation(), range(value.start, value.end())))
        }
        ModelineElement::OptionValue(option, _) => Some(markdown_hover(
            format!("**{}**\n\n{}", option.name, option_description(&option.name)?),
            range(option.start, option.end()),
        )),
    }
}

/// Component or component option documentation of a
/// `camel.component.<scheme>.<option>` key, or main option documentation.
fn get_property_hover(line: &str, offset: usize, line_no: u32, catalog: &Catalog) -> Option<Hover> {
    let Some(key_start) = line.find(COMPONENT_PROPERTY_PREFIX) else {
        return get_main_property_hover(line, offset, line_no);
    };
    if !line[..key_start].trim().is_empty() {
        return None;
    }
    let key_end = line.find(['=', ':']).unwrap_or(line.trim_end().len());
    let scheme_start = key_start + COMPONENT_PROPERTY_PREFIX.len();
    if offset < key_start || offset > key_end || scheme_start > key_end {
        return None;
    }
    let rest = &line[scheme_start..key_end];
    let (scheme, option) = rest.split_once('.').unwrap_or((rest, ""));
    let model = catalog.component(scheme.trim())?;
    let scheme_end = scheme_start + scheme.len();

    if offset <= scheme_end {
        return Some(markdown_hover(
            model.documentation(),
            line_range(line_no, line, scheme_start, scheme_end),
        ));
    }
    let option_model = model.component_option(option.trim())?;
    Some(markdown_hover(
        option_model.documentation(),
        line_range(line_no, line, scheme_end + 1, key_end),
    ))
}

/// Documentation of a `camel.main.<option>` or `camel.rest.<option>` key.
fn get_main_property_hover(line: &str, offset: usize, line_no: u32) -> Option<Hover> {
    let key_start = line.len() - line.trim_start().len();
    let key_end = line.find(['=', ':']).unwrap_or(line.trim_end().len());
    let key = line.get(key_start..key_end)?.trim_end();
    let group = key.strip_prefix(CAMEL_PREFIX)?.split('.').next()?;
    if !MAIN_GROUPS.contains(&group) {
        return None;
    }
    let option_start = key_start + CAMEL_PREFIX.len() + group.len() + 1;
    if offset < option_start || offset > key_end {
        return None;
    }
    let option = find_main_option(key)?;
    Some(markdown_hover(
        option.documentation(),
        line_range(line_no, line, option_start, key_start + key.len()),
    ))
}

fn markdown_hover(value: String, range: Range) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: Some(range),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::document::Document;
    use tower_lsp::lsp_types::Position;

    /// Hover at the `|` marker of a single-line `text`.
    fn hover(text: &str, dialect: Dialect) -> Option<(String, Range)> {
        let character = text[..text.find('|').unwrap()].encode_utf16().count() as u32;
        let document = Document::new(&text.replacen('|', "", 1), 0);
        let request = CompletionRequest {
            document: &document,
            dialect,
            position: Position::new(0, character),
            path: None,
        };
        let catalog = Catalog::bundled().unwrap();
        get_hover(&request, &catalog).map(|hover| match hover.contents {
            HoverContents::Markup(content) => (content.value, hover.range.unwrap()),
            other => panic!("unexpected hover contents: {other:?}"),
        })
    }

    fn range(start: u32, end: u32) -> Range {
        Range::new(Position::new(0, start), Position::new(0, end))
    }

    #[test]
    fn test_component_hover() {
        let (value, hover_range) = hover(r#"from("ti|mer:tick")"#, Dialect::Java).unwrap();
        assert!(value.starts_with("**Timer**"));
        assert_eq!(hover_range, range(6, 11));
    }

    #[test]
    fn test_option_hover() {
        let (value, hover_range) = hover(r#"from("timer:tick?per|iod=5")"#, Dialect::Java).unwrap();
        assert!(value.starts_with("**period** `duration`"));
        assert!(value.contains("Default: `1000`"));
        assert_eq!(hover_range, range(17, 23));
    }

    #[test]
    fn test_path_param_hover() {
        let (value, _) = hover(r#"to("jms:qu|eue:orders")"#, Dialect::Java).unwrap();
        assert!(value.starts_with("**destinationType**"));
    }

    #[test]
    fn test_api_hover() {
        let (value, _) = hover(r#"to("twilio:message/cre|ate")"#, Dialect::Java).unwrap();
        assert!(value.contains("MessageCreator"));
    }

    #[test]
    fn test_unknown_component_has_no_hover() {
        assert!(hover(r#"from("ac|me:tick")"#, Dialect::Java).is_none());
        assert!(hover(r#"fr|om("timer:tick")"#, Dialect::Java).is_none());
    }

    #[test]
    fn test_modeline_hover() {
        let (value, hover_range) = hover("// camel-k: dep|endency=camel-timer", Dialect::Java).unwrap();
        assert!(value.starts_with("**dependency**"));
        assert_eq!(hover_range, range(12, 22));

        let (value, _) = hover("// camel-k: dependency=camel-ti|mer", Dialect::Java).unwrap();
        assert!(value.starts_with("**Timer**"));

        let (value, _) = hover("# camel-k: trait=cont|ainer.port=80", Dialect::Yaml).unwrap();
        assert!(value.starts_with("**container** trait"));

        let (value, _) = hover("# camel-k: trait=container.po|rt=80", Dialect::Yaml).unwrap();
        assert!(value.starts_with("**port** `int`"));
    }

    #[test]
    fn test_property_hover() {
        let (value, hover_range) = hover("camel.component.ka|fka.brokers=x", Dialect::Properties).unwrap();
        assert!(value.starts_with("**Kafka**"));
        assert_eq!(hover_range, range(16, 21));

        let (value, _) = hover("camel.component.kafka.bro|kers=x", Dialect::Properties).unwrap();
        assert!(value.starts_with("**brokers**"));

        assert!(hover("camel.main.nope|=x", Dialect::Properties).is_none());
    }

    #[test]
    fn test_main_property_hover() {
        let (value, hover_range) = hover("camel.main.na|me=x", Dialect::Properties).unwrap();
        assert!(value.starts_with("**camel.main.name**"));
        assert_eq!(hover_range, range(11, 15));

        let (value, _) = hover("camel.rest.binding-|mode=json", Dialect::Properties).unwrap();
        assert!(value.starts_with("**camel.rest.bindingMode**"));

        assert!(hover("cam|el.main.name=x", Dialect::Properties).is_none());
        assert!(hover("camel.other.na|me=x", Dialect::Properties).is_none());
    }

    #[test]
    fn test_kamelet_hover() {
        let (value, hover_range) = hover(r#"to("kamelet:log-s|ink")"#, Dialect::Java).unwrap();
        assert!(value.starts_with("**Log Sink**"));
        assert_eq!(hover_range, range(12, 20));
    }
}
