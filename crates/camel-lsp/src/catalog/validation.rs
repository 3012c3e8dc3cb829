//! Endpoint and configuration property validation against the catalog.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;

use super::model::{ComponentModel, EndpointOptionModel};
use super::Catalog;
use crate::uri::UriInstance;

/// Property prefix configuring component level options.
pub const COMPONENT_PROPERTY_PREFIX: &str = "camel.component.";

/// Outcome of validating one endpoint URI or property line.
///
/// Maps are keyed by option name so output is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// Set when the schema needed to validate is not available.
    pub incapable: Option<String>,
    pub syntax_error: Option<String>,
    pub unknown: BTreeSet<String>,
    pub invalid_enum: BTreeMap<String, String>,
    pub invalid_enum_choices: BTreeMap<String, Vec<String>>,
    pub default_values: BTreeMap<String, String>,
    pub invalid_boolean: BTreeMap<String, String>,
    pub invalid_integer: BTreeMap<String, String>,
    pub invalid_number: BTreeMap<String, String>,
    pub invalid_duration: BTreeMap<String, String>,
    pub invalid_reference: BTreeMap<String, String>,
    pub required: BTreeSet<String>,
}

impl ValidationResult {
    fn incapable(reason: impl Into<String>) -> Self {
        Self {
            incapable: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn is_incapable(&self) -> bool {
        self.incapable.is_some()
    }

    pub fn number_of_errors(&self) -> usize {
        self.syntax_error.iter().count()
            + self.unknown.len()
            + self.invalid_enum.len()
            + self.invalid_boolean.len()
            + self.invalid_integer.len()
            + self.invalid_number.len()
            + self.invalid_duration.len()
            + self.invalid_reference.len()
            + self.required.len()
    }

    pub fn has_errors(&self) -> bool {
        self.number_of_errors() > 0
    }

    /// Message for an invalid enum value, listing the legal choices.
    pub fn enum_message(&self, name: &str) -> Option<String> {
        let value = self.invalid_enum.get(name)?;
        let choices = self
            .invalid_enum_choices
            .get(name)
            .map(|c| c.join(", "))
            .unwrap_or_default();
        let mut message = format!("Invalid enum value: {value}. Possible values: [{choices}]");
        if let Some(default) = self.default_values.get(name) {
            message.push_str(&format!(". Default value: {default}"));
        }
        Some(message)
    }

    /// One line per error outside the unknown and enum categories.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(syntax) = &self.syntax_error {
            lines.push(format!("Syntax error: {syntax}"));
        }
        for name in &self.required {
            lines.push(format!("Missing required option: {name}"));
        }
        let typed = [
            ("boolean", &self.invalid_boolean),
            ("integer", &self.invalid_integer),
            ("number", &self.invalid_number),
            ("duration", &self.invalid_duration),
            ("reference", &self.invalid_reference),
        ];
        for (kind, entries) in typed {
            for (name, value) in entries {
                lines.push(format!("Invalid {kind} value: {value} for option {name}"));
            }
        }
        lines
    }
}

impl Catalog {
    /// Validate an endpoint URI against its component schema.
    pub fn validate_endpoint(&self, uri: &UriInstance) -> ValidationResult {
        let Some(scheme) = uri.component_name().filter(|s| !s.is_empty()) else {
            return ValidationResult {
                syntax_error: Some("Empty endpoint URI".to_string()),
                ..Default::default()
            };
        };
        if has_placeholder(scheme) {
            return ValidationResult::default();
        }
        let Some(model) = self.component(scheme) else {
            return ValidationResult::incapable(format!("Unknown component: {scheme}"));
        };

        let mut result = ValidationResult::default();
        check_path(model, uri, &mut result);

        let method_properties = method_properties(model, uri);
        let mut present = BTreeSet::new();
        for option in uri.options() {
            let key = option.key.name.as_str();
            if key.is_empty() {
                if option.value.is_some() {
                    result.syntax_error = Some(format!(
                        "Option without a name at position {}",
                        option.start
                    ));
                }
                continue;
            }
            present.insert(key.to_string());

            let definition = model
                .endpoint_option(key)
                .or_else(|| method_properties.iter().copied().find(|o| o.name == key))
                .or_else(|| model.prefixed_option(key));
            match (definition, option.value_str()) {
                (Some(definition), Some(value)) if definition.prefix.is_empty() => {
                    check_value(definition, key, value, &mut result);
                }
                (Some(_), _) => {}
                (None, _) if model.lenient_properties => {}
                (None, _) => {
                    result.unknown.insert(key.to_string());
                }
            }
        }

        for required in model
            .parameter_options(uri.is_producer())
            .chain(method_properties.iter().copied())
            .filter(|o| o.required && o.default_value.is_none())
        {
            if !present.contains(&required.name) {
                result.required.insert(required.name.clone());
            }
        }

        result
    }

    /// Validate a configuration property line such as
    /// `camel.component.kafka.brokers=localhost:9092`.
    ///
    /// Returns `None` for lines with nothing to validate.
    pub fn validate_property(&self, line: &str) -> Option<ValidationResult> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            return None;
        }
        let (key, value) = match trimmed.find(['=', ':']) {
            Some(index) => (trimmed[..index].trim(), Some(trimmed[index + 1..].trim())),
            None => (trimmed, None),
        };
        let rest = key.strip_prefix(COMPONENT_PROPERTY_PREFIX)?;
        let (scheme, option) = rest.split_once('.').unwrap_or((rest, ""));
        if scheme.is_empty() || has_placeholder(scheme) {
            return None;
        }
        let Some(model) = self.component(scheme) else {
            return Some(ValidationResult::incapable(format!("Unknown component: {scheme}")));
        };

        let mut result = ValidationResult::default();
        if option.is_empty() {
            return Some(result);
        }
        match model.component_option(option) {
            Some(definition) => {
                if let Some(value) = value {
                    check_value(definition, key, value, &mut result);
                }
            }
            None if model.lenient_properties => {}
            None => {
                result.unknown.insert(key.to_string());
            }
        }
        Some(result)
    }
}

/// Required path options are reported only when no path was given at all,
/// since optional leading segments shift the positions of later ones.
fn check_path(model: &ComponentModel, uri: &UriInstance, result: &mut ValidationResult) {
    let given = uri
        .component_and_path()
        .map(|cp| cp.path_params.iter().filter(|p| !p.value.is_empty()).count())
        .unwrap_or(0);
    if given > 0 {
        return;
    }
    for option in model.path_options().filter(|o| o.required) {
        result.required.insert(option.name.clone());
    }
}

/// Properties of the API method selected by the path, if any.
fn method_properties<'a>(model: &'a ComponentModel, uri: &UriInstance) -> Vec<&'a EndpointOptionModel> {
    let Some(cp) = uri.component_and_path() else {
        return Vec::new();
    };
    let method = cp
        .api_name()
        .and_then(|api| model.api(&api.value))
        .zip(cp.method_name())
        .and_then(|(api, method)| api.method(&method.value));
    method.map(|m| m.properties.iter().collect()).unwrap_or_default()
}

fn check_value(definition: &EndpointOptionModel, name: &str, value: &str, result: &mut ValidationResult) {
    if value.is_empty() || has_placeholder(value) || value.starts_with("RAW(") {
        return;
    }
    if value.starts_with('#') {
        if !is_valid_reference(value) {
            result.invalid_reference.insert(name.to_string(), value.to_string());
        }
        return;
    }

    if !definition.enums.is_empty() {
        if !definition.enums.iter().any(|e| e == value) {
            result.invalid_enum.insert(name.to_string(), value.to_string());
            result
                .invalid_enum_choices
                .insert(name.to_string(), definition.enums.clone());
            if let Some(default) = &definition.default_value {
                result.default_values.insert(name.to_string(), default.clone());
            }
        }
        return;
    }

    let target = match definition.option_type.as_str() {
        "boolean" if !value.eq_ignore_ascii_case("true") && !value.eq_ignore_ascii_case("false") => {
            &mut result.invalid_boolean
        }
        "integer" if value.parse::<i64>().is_err() => &mut result.invalid_integer,
        "number" if value.parse::<f64>().is_err() => &mut result.invalid_number,
        "duration" if !is_valid_duration(value) => &mut result.invalid_duration,
        _ => return,
    };
    target.insert(name.to_string(), value.to_string());
}

fn has_placeholder(value: &str) -> bool {
    value.contains("{{") || value.contains("${")
}

/// `#name`, `#bean:name`, `#class:fqn` and `#type:fqn` must name something.
fn is_valid_reference(value: &str) -> bool {
    let name = ["#bean:", "#class:", "#type:", "#"]
        .iter()
        .find_map(|prefix| value.strip_prefix(prefix))
        .unwrap_or(value);
    !name.trim().is_empty()
}

fn duration_regex() -> Option<&'static Regex> {
    static DURATION: OnceLock<Option<Regex>> = OnceLock::new();
    DURATION
        .get_or_init(|| {
            Regex::new(
                r"(?i)^(\d+(\.\d+)?\s*(ms|millis|milliseconds|s|sec|secs|seconds?|m|min|mins|minutes?|h|hours?|d|days?)\s*)+$",
            )
            .ok()
        })
        .as_ref()
}

/// Plain milliseconds or a unit string like `1h30m`, `500ms`, `2s`.
pub fn is_valid_duration(value: &str) -> bool {
    let value = value.trim();
    if value.parse::<i64>().is_ok() {
        return true;
    }
    duration_regex().is_some_and(|re| re.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Position;

    fn catalog() -> Catalog {
        Catalog::bundled().unwrap()
    }

    fn validate(raw: &str) -> ValidationResult {
        catalog().validate_endpoint(&UriInstance::parse(raw, "&", false, Position::default()))
    }

    fn validate_producer(raw: &str) -> ValidationResult {
        catalog().validate_endpoint(&UriInstance::parse(raw, "&", true, Position::default()))
    }

    #[test]
    fn test_valid_endpoint_has_no_errors() {
        let result = validate("timer:foo?delay=1000&period=5s&fixedRate=true");
        assert!(!result.has_errors(), "{result:?}");
        assert!(!result.is_incapable());
    }

    #[test]
    fn test_unknown_option() {
        let result = validate("timer:foo?dela=1000");
        assert_eq!(result.unknown, BTreeSet::from(["dela".to_string()]));
        assert_eq!(result.number_of_errors(), 1);
    }

    #[test]
    fn test_unknown_component_is_incapable() {
        let result = validate("nope:foo?x=1");
        assert!(result.is_incapable());
        assert!(!result.has_errors());
    }

    #[test]
    fn test_placeholders_are_not_checked() {
        assert!(!validate("{{scheme}}:foo?x=1").has_errors());
        assert!(!validate("timer:foo?delay={{delay}}").has_errors());
        assert!(!validate("timer:foo?delay=${env:DELAY}").has_errors());
    }

    #[test]
    fn test_invalid_enum_with_choices_and_default() {
        let result = validate_producer("log:foo?level=LOUD");
        assert_eq!(result.invalid_enum.get("level").map(String::as_str), Some("LOUD"));
        let message = result.enum_message("level").unwrap();
        assert!(message.starts_with("Invalid enum value: LOUD. Possible values: [TRACE, DEBUG"));
        assert!(message.ends_with("Default value: INFO"));
    }

    #[test]
    fn test_typed_values() {
        let result = validate("timer:foo?fixedRate=maybe&repeatCount=ten&delay=soon");
        assert!(result.invalid_boolean.contains_key("fixedRate"));
        assert!(result.invalid_integer.contains_key("repeatCount"));
        assert!(result.invalid_duration.contains_key("delay"));
        assert_eq!(result.summary_lines().len(), 3);
    }

    #[test]
    fn test_references() {
        assert!(!validate("timer:foo?timer=#myTimer").has_errors());
        let result = validate("timer:foo?timer=#bean:");
        assert!(result.invalid_reference.contains_key("timer"));
    }

    #[test]
    fn test_missing_required_path() {
        let result = validate("timer:");
        assert!(result.required.contains("timerName"));
        assert!(validate("timer:tick").required.is_empty());
    }

    #[test]
    fn test_lenient_component_accepts_unknown_options() {
        assert!(validate_producer("http://example.com?anything=1").unknown.is_empty());
    }

    #[test]
    fn test_prefixed_options() {
        assert!(!validate("kafka:topic?additionalProperties.foo=bar").has_errors());
        assert!(!validate("file:in?scheduler.cron=0+0/5").has_errors());
    }

    #[test]
    fn test_api_method_properties() {
        let result = validate_producer("twilio:message/create?body=hi&to=123");
        assert!(result.unknown.is_empty(), "{result:?}");
        let result = validate_producer("twilio:message/read?body=hi");
        assert!(result.unknown.contains("body"));
    }

    #[test]
    fn test_empty_key_with_value_is_syntax_error() {
        let result = validate("timer:foo?=1");
        assert!(result.syntax_error.is_some());
        assert!(!validate("timer:foo?delay=1&").has_errors());
    }

    #[test]
    fn test_empty_uri() {
        assert!(validate("").syntax_error.is_some());
    }

    #[test]
    fn test_validate_property() {
        let catalog = catalog();
        assert_eq!(catalog.validate_property("# camel.component.timer.foo=1"), None);
        assert_eq!(catalog.validate_property("other.key=1"), None);
        assert_eq!(catalog.validate_property(""), None);

        let unknown = catalog.validate_property("camel.component.timer.foo=1").unwrap();
        assert!(unknown.unknown.contains("camel.component.timer.foo"));

        let dashed = catalog
            .validate_property("camel.component.timer.include-metadata = true")
            .unwrap();
        assert!(!dashed.has_errors());

        let invalid = catalog
            .validate_property("camel.component.seda.queueSize=big")
            .unwrap();
        assert!(invalid.invalid_integer.contains_key("camel.component.seda.queueSize"));

        assert!(catalog
            .validate_property("camel.component.nope.x=1")
            .unwrap()
            .is_incapable());
    }

    #[test]
    fn test_durations() {
        for ok in ["1000", "5s", "1h30m", "500ms", "2 minutes", "1.5s"] {
            assert!(is_valid_duration(ok), "{ok}");
        }
        for bad in ["soon", "5x", ""] {
            assert!(!is_valid_duration(bad), "{bad}");
        }
    }
}
