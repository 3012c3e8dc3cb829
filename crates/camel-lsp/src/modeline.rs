//! Instance model of a Camel-K modeline.
//!
//! A modeline is a comment line carrying deployment directives:
//!
//! ```text
//! // camel-k: dependency=mvn:org.my/app:1.0 trait=service.enabled=false
//! ```
//!
//! Options are separated by whitespace and split on their first `=`. The
//! value of a `trait` option has its own grammar,
//! `definition[.property[=value]]`. Offsets are byte offsets in the line and
//! ranges are inclusive on both ends.

use regex::Regex;
use std::sync::OnceLock;

pub const OPTION_TRAIT: &str = "trait";
pub const OPTION_DEPENDENCY: &str = "dependency";
pub const OPTION_PROPERTY: &str = "property";
pub const OPTION_PROPERTY_FILE: &str = "property-file";
pub const OPTION_RESOURCE: &str = "resource";
pub const OPTION_OPEN_API: &str = "open-api";
pub const OPTION_CONFIG: &str = "config";

const XML_COMMENT_END: &str = "-->";

/// Modeline option names with their documentation.
pub const OPTION_NAMES: &[(&str, &str)] = &[
    (
        "dependency",
        "An external library that should be included. E.g. for Maven dependencies \"dependency=mvn:org.my/app:1.0\"",
    ),
    (
        "env",
        "Set an environment variable in the integration container. E.g \"env=MY_VAR=my-value\"",
    ),
    (
        "label",
        "Add a label to the integration. E.g. \"label=my.company=hello\"",
    ),
    ("name", "The integration name"),
    ("open-api", "Add an OpenAPI v2 spec (file path)"),
    ("profile", "Trait profile used for deployment"),
    ("property", "Add a camel property"),
    (
        "property-file",
        "Bind a property file to the integration. E.g. \"property-file=integration.properties\"",
    ),
    ("resource", "Add a resource"),
    (
        "trait",
        "Configure a trait. E.g. \"trait=service.enabled=false\"",
    ),
    (
        "config",
        "Add runtime configuration from a Configmap, a Secret or a file (syntax: [configmap|secret|file]:name[/key])",
    ),
];

/// Documentation of a modeline option name.
pub fn option_description(name: &str) -> Option<&'static str> {
    OPTION_NAMES
        .iter()
        .find(|(option, _)| *option == name)
        .map(|(_, description)| *description)
}

fn marker_regex() -> Option<&'static Regex> {
    static MARKER: OnceLock<Option<Regex>> = OnceLock::new();
    MARKER
        .get_or_init(|| Regex::new(r"^\s*(//|#|<!--)\s*camel-k:").ok())
        .as_ref()
}

/// Byte offset right after the `camel-k:` marker, if the line is a modeline.
pub fn modeline_start(line: &str) -> Option<usize> {
    marker_regex()?.find(line).map(|m| m.end())
}

/// A parsed modeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Modeline {
    line: String,
    prefix_end: usize,
    options: Vec<ModelineOption>,
}

/// One `name[=value]` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelineOption {
    pub name: String,
    pub start: usize,
    pub value: Option<ModelineValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelineValue {
    pub text: String,
    pub start: usize,
    /// Parsed form of the value of a `trait` option.
    pub trait_value: Option<TraitValue>,
}

/// `definition[.property[=value]]`
#[derive(Debug, Clone, PartialEq)]
pub struct TraitValue {
    pub definition: String,
    pub definition_start: usize,
    /// Present once a `.` follows the definition name.
    pub property: Option<TraitProperty>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitProperty {
    pub name: String,
    pub start: usize,
    /// Present once a `=` follows the property name.
    pub value: Option<String>,
}

/// The part of a modeline found at an offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelineElement<'a> {
    OptionName(&'a ModelineOption),
    OptionValue(&'a ModelineOption, &'a ModelineValue),
    TraitDefinition(&'a ModelineOption, &'a TraitValue),
    TraitProperty(&'a ModelineOption, &'a TraitValue, &'a TraitProperty),
}

impl Modeline {
    /// Parse a line; returns `None` when it carries no modeline marker.
    pub fn parse(line: &str) -> Option<Self> {
        let prefix_end = modeline_start(line)?;
        let mut options = Vec::new();

        for (start, token) in tokens(line, prefix_end) {
            if token == XML_COMMENT_END {
                continue;
            }
            let token = if start + token.len() == line.len() {
                token.strip_suffix(XML_COMMENT_END).unwrap_or(token)
            } else {
                token
            };
            options.push(ModelineOption::parse(token, start));
        }

        Some(Self {
            line: line.to_string(),
            prefix_end,
            options,
        })
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    /// Offset right after the `camel-k:` marker.
    pub fn prefix_end(&self) -> usize {
        self.prefix_end
    }

    pub fn options(&self) -> &[ModelineOption] {
        &self.options
    }

    /// The option whose span contains `offset`.
    pub fn option_at(&self, offset: usize) -> Option<&ModelineOption> {
        self.options.iter().find(|option| option.in_range(offset))
    }

    /// The most specific element containing `offset`.
    pub fn element_at(&self, offset: usize) -> Option<ModelineElement<'_>> {
        self.option_at(offset).map(|option| option.element_at(offset))
    }

    /// Trait options repeating a `definition.property` pair already set by
    /// another trait option. Every member of a duplicated pair is returned.
    pub fn duplicated_trait_properties(&self) -> Vec<(&ModelineOption, String)> {
        let keys: Vec<Option<String>> = self.options.iter().map(|o| o.trait_key()).collect();
        self.options
            .iter()
            .zip(keys.iter())
            .enumerate()
            .filter_map(|(index, (option, key))| {
                let key = key.as_ref()?;
                let repeated = keys
                    .iter()
                    .enumerate()
                    .any(|(other, other_key)| other != index && other_key.as_ref() == Some(key));
                repeated.then(|| (option, key.clone()))
            })
            .collect()
    }
}

impl ModelineOption {
    fn parse(token: &str, start: usize) -> Self {
        match token.split_once('=') {
            Some((name, value)) => {
                let value_start = start + name.len() + 1;
                let trait_value =
                    (name == OPTION_TRAIT).then(|| TraitValue::parse(value, value_start));
                Self {
                    name: name.to_string(),
                    start,
                    value: Some(ModelineValue {
                        text: value.to_string(),
                        start: value_start,
                        trait_value,
                    }),
                }
            }
            None => Self {
                name: token.to_string(),
                start,
                value: None,
            },
        }
    }

    /// End offset: end of the value if any, else end of the name.
    pub fn end(&self) -> usize {
        match &self.value {
            Some(value) => value.end(),
            None => self.name_end(),
        }
    }

    pub fn name_end(&self) -> usize {
        self.start + self.name.len()
    }

    pub fn in_range(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end()
    }

    fn element_at(&self, offset: usize) -> ModelineElement<'_> {
        let Some(value) = self.value.as_ref().filter(|value| value.in_range(offset)) else {
            return ModelineElement::OptionName(self);
        };
        match &value.trait_value {
            Some(trait_value) => match &trait_value.property {
                Some(property) if offset >= property.start => {
                    ModelineElement::TraitProperty(self, trait_value, property)
                }
                _ => ModelineElement::TraitDefinition(self, trait_value),
            },
            None => ModelineElement::OptionValue(self, value),
        }
    }

    /// `definition.property` for a trait option that sets a property.
    pub fn trait_key(&self) -> Option<String> {
        let trait_value = self.value.as_ref()?.trait_value.as_ref()?;
        let property = trait_value.property.as_ref()?;
        property
            .value
            .as_ref()
            .map(|_| format!("{}.{}", trait_value.definition, property.name))
    }
}

impl ModelineValue {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    pub fn in_range(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end()
    }
}

impl TraitValue {
    fn parse(value: &str, start: usize) -> Self {
        match value.split_once('.') {
            Some((definition, rest)) => {
                let property_start = start + definition.len() + 1;
                let property = match rest.split_once('=') {
                    Some((name, property_value)) => TraitProperty {
                        name: name.to_string(),
                        start: property_start,
                        value: Some(property_value.to_string()),
                    },
                    None => TraitProperty {
                        name: rest.to_string(),
                        start: property_start,
                        value: None,
                    },
                };
                Self {
                    definition: definition.to_string(),
                    definition_start: start,
                    property: Some(property),
                }
            }
            None => Self {
                definition: value.to_string(),
                definition_start: start,
                property: None,
            },
        }
    }

    pub fn definition_end(&self) -> usize {
        self.definition_start + self.definition.len()
    }
}

impl TraitProperty {
    pub fn name_end(&self) -> usize {
        self.start + self.name.len()
    }
}

/// Whitespace separated tokens after `from`, with their start offsets.
fn tokens(line: &str, from: usize) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut token_start = None;

    for (offset, c) in line[from..].char_indices() {
        let offset = offset + from;
        if c == ' ' || c == '\t' {
            if let Some(start) = token_start.take() {
                tokens.push((start, &line[start..offset]));
            }
        } else if token_start.is_none() {
            token_start = Some(offset);
        }
    }
    if let Some(start) = token_start {
        tokens.push((start, &line[start..]));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        assert_eq!(modeline_start("// camel-k: name=a"), Some(11));
        assert_eq!(modeline_start("  #camel-k: name=a"), Some(11));
        assert_eq!(modeline_start("<!-- camel-k: name=a -->"), Some(13));
        assert_eq!(modeline_start("// not a modeline"), None);
        assert_eq!(modeline_start("from(\"timer:a\") // camel-k:"), None);
    }

    #[test]
    fn test_options_and_offsets() {
        let modeline = Modeline::parse("// camel-k: dependency=mvn:a/b:1 name=demo").unwrap();
        let options = modeline.options();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].name, "dependency");
        assert_eq!(options[0].start, 12);
        let value = options[0].value.as_ref().unwrap();
        assert_eq!((value.text.as_str(), value.start), ("mvn:a/b:1", 23));
        assert_eq!(options[0].end(), 32);
        assert_eq!(options[1].name, "name");
        assert_eq!(options[1].start, 33);
    }

    #[test]
    fn test_whitespace_runs_and_tabs() {
        let modeline = Modeline::parse("# camel-k:   name=a\t\tprofile=b").unwrap();
        let names: Vec<_> = modeline.options().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["name", "profile"]);
        assert_eq!(modeline.options()[1].start, 21);
    }

    #[test]
    fn test_name_only_option() {
        let modeline = Modeline::parse("// camel-k: dependen").unwrap();
        let option = &modeline.options()[0];
        assert!(option.value.is_none());
        assert_eq!(option.end(), 20);
        assert!(matches!(modeline.element_at(15), Some(ModelineElement::OptionName(_))));
        assert!(modeline.element_at(25).is_none());
    }

    #[test]
    fn test_xml_comment_end_is_ignored() {
        let modeline = Modeline::parse("<!-- camel-k: name=a -->").unwrap();
        assert_eq!(modeline.options().len(), 1);

        let stuck = Modeline::parse("<!-- camel-k: name=a-->").unwrap();
        assert_eq!(stuck.options()[0].value.as_ref().unwrap().text, "a");
    }

    #[test]
    fn test_trait_is_one_token() {
        let modeline = Modeline::parse("// camel-k: trait=service.enabled=false").unwrap();
        assert_eq!(modeline.options().len(), 1);
        let trait_value = modeline.options()[0]
            .value
            .as_ref()
            .and_then(|v| v.trait_value.as_ref())
            .unwrap();
        assert_eq!(trait_value.definition, "service");
        assert_eq!(trait_value.definition_start, 18);
        let property = trait_value.property.as_ref().unwrap();
        assert_eq!(property.name, "enabled");
        assert_eq!(property.start, 26);
        assert_eq!(property.value.as_deref(), Some("false"));
    }

    #[test]
    fn test_trait_in_progress_states() {
        let definition_only = Modeline::parse("// camel-k: trait=serv").unwrap();
        let value = definition_only.options()[0].value.as_ref().unwrap();
        let trait_value = value.trait_value.as_ref().unwrap();
        assert_eq!(trait_value.definition, "serv");
        assert!(trait_value.property.is_none());
        assert!(matches!(
            definition_only.element_at(20),
            Some(ModelineElement::TraitDefinition(_, _))
        ));

        let property_typing = Modeline::parse("// camel-k: trait=service.ena").unwrap();
        let trait_value = property_typing.options()[0]
            .value
            .as_ref()
            .and_then(|v| v.trait_value.as_ref())
            .unwrap();
        let property = trait_value.property.as_ref().unwrap();
        assert_eq!(property.name, "ena");
        assert!(property.value.is_none());
        assert!(matches!(
            property_typing.element_at(28),
            Some(ModelineElement::TraitProperty(_, _, _))
        ));
        assert!(matches!(
            property_typing.element_at(21),
            Some(ModelineElement::TraitDefinition(_, _))
        ));
    }

    #[test]
    fn test_duplicated_trait_properties() {
        let modeline = Modeline::parse(
            "// camel-k: trait=service.enabled=false trait=service.enabled=true trait=route.enabled=true",
        )
        .unwrap();
        let duplicates = modeline.duplicated_trait_properties();
        assert_eq!(duplicates.len(), 2);
        assert!(duplicates.iter().all(|(_, key)| key == "service.enabled"));
    }

    #[test]
    fn test_option_descriptions() {
        assert_eq!(option_description("name"), Some("The integration name"));
        assert!(option_description("unknown").is_none());
    }
}
