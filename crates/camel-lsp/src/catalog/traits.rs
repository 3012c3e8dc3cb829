//! Camel K trait definitions used by modeline completion and hover.

use std::sync::OnceLock;

use log::error;
use serde::Deserialize;
use serde_json::Value;

use super::model::render_scalar;

const BUNDLED_TRAITS: &str = include_str!("../../catalog/traits.json");

static TRAITS: OnceLock<Vec<TraitDefinition>> = OnceLock::new();

#[derive(Debug, Clone, Deserialize)]
pub struct TraitDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: Vec<TraitPropertyDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraitPropertyDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub property_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: Option<Value>,
}

impl TraitDefinition {
    pub fn property(&self, name: &str) -> Option<&TraitPropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }
}

impl TraitPropertyDefinition {
    /// Default value as modeline text; whole numbers print without fraction.
    pub fn default_value(&self) -> Option<String> {
        self.default.as_ref().and_then(render_scalar)
    }

    pub fn documentation(&self) -> String {
        let mut doc = format!("**{}** `{}`\n\n{}", self.name, self.property_type, self.description);
        if let Some(default) = self.default_value() {
            doc.push_str(&format!("\n\nDefault: `{default}`"));
        }
        doc
    }
}

/// All known trait definitions.
pub fn traits() -> &'static [TraitDefinition] {
    TRAITS.get_or_init(|| {
        serde_json::from_str(BUNDLED_TRAITS).unwrap_or_else(|e| {
            error!("Bundled trait catalog is malformed: {}", e);
            Vec::new()
        })
    })
}

pub fn find_trait(name: &str) -> Option<&'static TraitDefinition> {
    traits().iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_traits_load() {
        assert!(traits().len() > 10);
        let container = find_trait("container").unwrap();
        assert!(container.property("enabled").is_some());
        assert!(find_trait("nope").is_none());
    }

    #[test]
    fn test_default_values() {
        let container = find_trait("container").unwrap();
        assert_eq!(container.property("port").unwrap().default_value().as_deref(), Some("8080"));
        assert_eq!(container.property("name").unwrap().default_value().as_deref(), Some("integration"));
        assert_eq!(container.property("image").unwrap().default_value(), None);
        let logging = find_trait("logging").unwrap();
        assert_eq!(logging.property("color").unwrap().default_value().as_deref(), Some("true"));
    }
}
