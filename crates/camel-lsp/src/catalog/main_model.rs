//! `camel.main.*` and `camel.rest.*` configuration options of properties
//! files.

use std::sync::OnceLock;

use log::error;
use serde::Deserialize;
use serde_json::Value;

use super::model::{dash_to_camel, EndpointOptionModel};

const BUNDLED_MAIN: &str = include_str!("../../catalog/main.json");

/// Groups below `camel.` holding main options.
pub const MAIN_GROUPS: &[&str] = &["main", "rest"];

static MAIN_OPTIONS: OnceLock<Vec<EndpointOptionModel>> = OnceLock::new();

#[derive(Debug, Deserialize)]
struct MainMetadata {
    #[serde(default)]
    properties: Vec<Value>,
}

fn parse(text: &str) -> serde_json::Result<Vec<EndpointOptionModel>> {
    let metadata: MainMetadata = serde_json::from_str(text)?;
    Ok(metadata
        .properties
        .iter()
        .filter_map(|property| {
            let name = property.get("name")?.as_str()?;
            let mut option = EndpointOptionModel::from_json(name, property);
            option.group = name.rsplit_once('.').map(|(group, _)| group.to_string())?;
            Some(option)
        })
        .collect())
}

/// Every main option, named with its full key (`camel.main.name`).
pub fn main_options() -> &'static [EndpointOptionModel] {
    MAIN_OPTIONS.get_or_init(|| {
        parse(BUNDLED_MAIN).unwrap_or_else(|e| {
            error!("Bundled main options are malformed: {}", e);
            Vec::new()
        })
    })
}

/// Options of a group (`main`) as `(short name, option)` pairs.
pub fn group_options(group: &str) -> impl Iterator<Item = (&'static str, &'static EndpointOptionModel)> {
    let prefix = format!("camel.{group}.");
    main_options()
        .iter()
        .filter_map(move |option| option.name.strip_prefix(&prefix).map(|short| (short, option)))
}

/// Look up a full key, dash-case names included.
pub fn find_main_option(key: &str) -> Option<&'static EndpointOptionModel> {
    let camel = dash_to_camel(key);
    main_options()
        .iter()
        .find(|option| option.name == key || option.name == camel)
}

/// `autoStartup` → `auto-startup`.
pub fn camel_to_dash(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            result.push('-');
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_options_load() {
        let startup = find_main_option("camel.main.autoStartup").unwrap();
        assert!(startup.is_boolean());
        assert_eq!(startup.default_value.as_deref(), Some("true"));
        assert_eq!(startup.group, "camel.main");
        assert!(find_main_option("camel.main.auto-startup").is_some());
        assert!(find_main_option("camel.main.nope").is_none());
    }

    #[test]
    fn test_group_options() {
        let rest: Vec<_> = group_options("rest").map(|(short, _)| short).collect();
        assert!(rest.contains(&"bindingMode"));
        assert!(!rest.contains(&"autoStartup"));
        assert_eq!(group_options("component").count(), 0);
    }

    #[test]
    fn test_camel_to_dash() {
        assert_eq!(camel_to_dash("autoStartup"), "auto-startup");
        assert_eq!(camel_to_dash("name"), "name");
    }
}
