//! Typed component models built from Camel JSON component schemas.
//!
//! A schema is the JSON document shipped by each Camel component
//! (`component`, `componentProperties`, `properties`, and for API based
//! components `apis`/`apiProperties`). Normalization never fails: missing
//! fields fall back to empty values so that partial or third-party schemas
//! still produce a usable model.

use serde_json::{Map, Value};

use crate::error::Result;

/// Option kind for positional path parameters.
pub const KIND_PATH: &str = "path";
/// Option kind for `?key=value` endpoint parameters.
pub const KIND_PARAMETER: &str = "parameter";

/// A normalized component schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentModel {
    pub scheme: String,
    pub syntax: String,
    pub alternative_syntax: String,
    pub title: String,
    pub description: String,
    pub label: String,
    pub deprecated: bool,
    pub consumer_only: bool,
    pub producer_only: bool,
    pub lenient_properties: bool,
    pub api: bool,
    pub java_type: String,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub component_options: Vec<ComponentOptionModel>,
    pub endpoint_options: Vec<EndpointOptionModel>,
    pub apis: Vec<ApiModel>,
}

/// Descriptor of one endpoint option, path or parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointOptionModel {
    pub name: String,
    pub display_name: String,
    pub kind: String,
    pub group: String,
    pub required: bool,
    pub option_type: String,
    pub java_type: String,
    pub enums: Vec<String>,
    pub prefix: String,
    pub multi_value: bool,
    pub deprecated: bool,
    pub secret: bool,
    pub default_value: Option<String>,
    pub description: String,
}

/// Component level options share the endpoint option shape.
pub type ComponentOptionModel = EndpointOptionModel;

/// An API group of an API based component, e.g. `twilio:message/create`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiModel {
    pub name: String,
    pub description: String,
    pub consumer_only: bool,
    pub producer_only: bool,
    pub methods: Vec<ApiMethodModel>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiMethodModel {
    /// Method name as declared in the schema (`fetcher`).
    pub name: String,
    /// Name used in endpoint URIs (`fetch`), the declared name when no alias applies.
    pub alias: String,
    pub description: String,
    pub properties: Vec<EndpointOptionModel>,
}

impl ComponentModel {
    /// Parse a schema from its JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_json(&value))
    }

    /// Build a model from a parsed schema document.
    pub fn from_json(schema: &Value) -> Self {
        let empty = Map::new();
        let component = schema
            .get("component")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let api_properties = schema.get("apiProperties").and_then(Value::as_object);
        let apis = schema
            .get("apis")
            .and_then(Value::as_object)
            .map(|apis| {
                apis.iter()
                    .map(|(name, api)| {
                        let props = api_properties.and_then(|all| all.get(name));
                        ApiModel::from_json(name, api, props)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            scheme: string_field(component, "scheme"),
            syntax: string_field(component, "syntax"),
            alternative_syntax: string_field(component, "alternativeSyntax"),
            title: string_field(component, "title"),
            description: string_field(component, "description"),
            label: string_field(component, "label"),
            deprecated: bool_field(component, "deprecated"),
            consumer_only: bool_field(component, "consumerOnly"),
            producer_only: bool_field(component, "producerOnly"),
            lenient_properties: bool_field(component, "lenientProperties"),
            api: bool_field(component, "api"),
            java_type: string_field(component, "javaType"),
            group_id: string_field(component, "groupId"),
            artifact_id: string_field(component, "artifactId"),
            version: string_field(component, "version"),
            component_options: options_from(schema.get("componentProperties")),
            endpoint_options: options_from(schema.get("properties")),
            apis,
        }
    }

    /// Path options in declaration order; the position is the path parameter index.
    pub fn path_options(&self) -> impl Iterator<Item = &EndpointOptionModel> {
        self.endpoint_options.iter().filter(|o| o.kind == KIND_PATH)
    }

    /// The path option at a path parameter index.
    pub fn path_option(&self, index: usize) -> Option<&EndpointOptionModel> {
        self.path_options().nth(index)
    }

    /// Query parameters usable by an endpoint in the given role.
    pub fn parameter_options(&self, producer: bool) -> impl Iterator<Item = &EndpointOptionModel> {
        self.endpoint_options
            .iter()
            .filter(move |o| o.kind == KIND_PARAMETER && o.applies_to(producer))
    }

    /// Look up an endpoint parameter by name.
    pub fn endpoint_option(&self, name: &str) -> Option<&EndpointOptionModel> {
        self.endpoint_options
            .iter()
            .find(|o| o.kind == KIND_PARAMETER && o.name == name)
    }

    /// Find the multi-value option whose prefix the key starts with.
    pub fn prefixed_option(&self, key: &str) -> Option<&EndpointOptionModel> {
        self.endpoint_options
            .iter()
            .find(|o| !o.prefix.is_empty() && key.starts_with(&o.prefix) && key.len() > o.prefix.len())
    }

    /// Look up a component level option, dash-case names included.
    pub fn component_option(&self, name: &str) -> Option<&ComponentOptionModel> {
        let camel = dash_to_camel(name);
        self.component_options
            .iter()
            .find(|o| o.name == name || o.name == camel)
    }

    pub fn api(&self, name: &str) -> Option<&ApiModel> {
        self.apis.iter().find(|a| a.name == name)
    }

    /// Whether this component uses the `apiName/methodName` path grammar.
    pub fn is_api_based(&self) -> bool {
        self.api || !self.apis.is_empty()
    }

    /// Markdown documentation shown on hover.
    pub fn documentation(&self) -> String {
        let mut doc = format!("**{}**", self.title);
        if self.deprecated {
            doc.push_str(" *(deprecated)*");
        }
        doc.push_str("\n\n");
        doc.push_str(&self.description);
        if !self.syntax.is_empty() {
            doc.push_str(&format!("\n\nSyntax: `{}`", self.syntax));
        }
        doc
    }
}

impl EndpointOptionModel {
    pub(crate) fn from_json(name: &str, option: &Value) -> Self {
        let empty = Map::new();
        let option = option.as_object().unwrap_or(&empty);
        Self {
            name: name.to_string(),
            display_name: string_field(option, "displayName"),
            kind: string_field(option, "kind"),
            group: string_field(option, "group"),
            required: bool_field(option, "required"),
            option_type: string_field(option, "type"),
            java_type: string_field(option, "javaType"),
            enums: option
                .get("enum")
                .and_then(Value::as_array)
                .map(|values| values.iter().filter_map(render_scalar).collect())
                .unwrap_or_default(),
            prefix: string_field(option, "prefix"),
            multi_value: bool_field(option, "multiValue"),
            deprecated: bool_field(option, "deprecated"),
            secret: bool_field(option, "secret"),
            default_value: option.get("defaultValue").and_then(render_scalar),
            description: string_field(option, "description"),
        }
    }

    /// Consumer groups only apply to consumers and producer groups to producers.
    pub fn applies_to(&self, producer: bool) -> bool {
        if self.group.starts_with("consumer") {
            !producer
        } else if self.group.starts_with("producer") {
            producer
        } else {
            true
        }
    }

    pub fn is_boolean(&self) -> bool {
        self.option_type == "boolean"
    }

    /// Markdown documentation shown on hover.
    pub fn documentation(&self) -> String {
        let mut doc = format!("**{}** `{}`", self.name, self.option_type);
        if self.required {
            doc.push_str(" *(required)*");
        }
        if self.deprecated {
            doc.push_str(" *(deprecated)*");
        }
        doc.push_str("\n\n");
        doc.push_str(&self.description);
        if let Some(default) = &self.default_value {
            doc.push_str(&format!("\n\nDefault: `{default}`"));
        }
        if !self.enums.is_empty() {
            doc.push_str(&format!("\n\nPossible values: {}", self.enums.join(", ")));
        }
        doc
    }
}

impl ApiModel {
    fn from_json(name: &str, api: &Value, properties: Option<&Value>) -> Self {
        let empty = Map::new();
        let api_object = api.as_object().unwrap_or(&empty);

        let aliases: Vec<(String, String)> = api_object
            .get("aliases")
            .and_then(Value::as_array)
            .map(|aliases| aliases.iter().filter_map(Value::as_str).filter_map(parse_alias).collect())
            .unwrap_or_default();

        let method_properties = properties
            .and_then(|p| p.get("methods"))
            .and_then(Value::as_object);

        let methods = api_object
            .get("methods")
            .and_then(Value::as_object)
            .map(|methods| {
                methods
                    .iter()
                    .map(|(method, definition)| {
                        let alias = aliases
                            .iter()
                            .find(|(from, _)| from == method)
                            .map(|(_, to)| to.clone())
                            .unwrap_or_else(|| method.clone());
                        let properties = method_properties
                            .and_then(|m| m.get(method))
                            .and_then(|m| m.get("properties"));
                        ApiMethodModel {
                            name: method.clone(),
                            alias,
                            description: definition
                                .get("description")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                            properties: options_from(properties),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.to_string(),
            description: string_field(api_object, "description"),
            consumer_only: bool_field(api_object, "consumerOnly"),
            producer_only: bool_field(api_object, "producerOnly"),
            methods,
        }
    }

    /// Find a method by the name used in the URI, alias or declared name.
    pub fn method(&self, name: &str) -> Option<&ApiMethodModel> {
        self.methods
            .iter()
            .find(|m| m.alias == name || m.name == name)
    }
}

/// `^fetcher$=fetch` declares that method `fetcher` is written `fetch`.
fn parse_alias(alias: &str) -> Option<(String, String)> {
    let (pattern, replacement) = alias.split_once('=')?;
    let method = pattern.trim_start_matches('^').trim_end_matches('$');
    if method.is_empty() || replacement.is_empty() {
        return None;
    }
    Some((method.to_string(), replacement.to_string()))
}

fn options_from(value: Option<&Value>) -> Vec<EndpointOptionModel> {
    value
        .and_then(Value::as_object)
        .map(|options| {
            options
                .iter()
                .map(|(name, option)| EndpointOptionModel::from_json(name, option))
                .collect()
        })
        .unwrap_or_default()
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
    object.get(key).and_then(render_scalar).unwrap_or_default()
}

fn bool_field(object: &Map<String, Value>, key: &str) -> bool {
    match object.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Render a JSON scalar as schema text; whole floats lose their fraction.
pub(crate) fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(format!("{}", f as i64))
            }
            _ => Some(n.to_string()),
        },
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// `max-poll-records` → `maxPollRecords`.
pub fn dash_to_camel(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            result.extend(c.to_uppercase());
            upper = false;
        } else {
            result.push(c);
        }
    }
    result
}
