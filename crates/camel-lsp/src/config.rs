//! Configuration file support for camel-lsp
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/camel-lsp/config.toml`
//! - macOS: `~/Library/Application Support/camel-lsp/config.toml`
//! - Windows: `%APPDATA%\camel-lsp\config.toml`
//!
//! Editors can override the catalog section at runtime through
//! `initializationOptions` or `workspace/didChangeConfiguration`, see
//! [`LspSettings`].

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{CatalogSettings, RuntimeProvider};
use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Component catalog selection
    pub catalog: CatalogSettings,
    /// Server behaviour
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Log level used when neither `RUST_LOG` nor `--log-level` is given.
    pub log_level: String,
    /// Publish diagnostics while typing, not only on open and save.
    pub validate_on_change: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            validate_on_change: true,
        }
    }
}

impl Config {
    /// Load configuration from the default config file location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Err(Error::Config(format!("Config file not found at {:?}", path)))
        }
    }

    /// Load configuration or return default if not found
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Save configuration to the default config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "camel-lsp") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Err(Error::Config("Could not determine config directory".to_string()))
        }
    }

    /// Create a default config file with comments
    pub fn create_default_config_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        Self::write_default_config(&path)?;
        Ok(path)
    }

    fn write_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = r#"# camel-lsp configuration file

[catalog]
# Camel catalog version; the bundled catalog is used when no catalog
# directory provides this version
version = "3.20.1"

# Runtime provider: "default", "quarkus", "springboot" or "karaf"
runtime_provider = "default"

# Directory laid out as <runtime>/<version>/*.json (optional)
# catalog_dir = "/opt/camel/catalogs"

# Directory of additional component schemas, one *.json per component (optional)
# extra_components_dir = "/opt/camel/extra-components"

[server]
# Log level when RUST_LOG is not set: error, warn, info, debug or trace
log_level = "info"

# Validate while typing; when false, only on open and save
validate_on_change = true
"#;

        fs::write(path, content)?;
        Ok(())
    }
}

/// Settings sent by the editor, either as a `camel` section or bare.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LspSettings {
    #[serde(alias = "Camel catalog version")]
    pub catalog_version: Option<String>,
    #[serde(alias = "Camel catalog runtime provider")]
    pub runtime_provider: Option<String>,
    pub extra_components: Option<Vec<Value>>,
}

impl LspSettings {
    /// Read settings from `initializationOptions` or a configuration change.
    ///
    /// Malformed settings are logged and ignored.
    pub fn from_json(value: &Value) -> Self {
        let section = value.get("camel").unwrap_or(value);
        if section.is_null() {
            return Self::default();
        }
        serde_json::from_value(section.clone()).unwrap_or_else(|e| {
            warn!("Ignoring malformed settings: {}", e);
            Self::default()
        })
    }

    /// `base` with these settings applied. Empty values keep the base value.
    pub fn apply(&self, base: &CatalogSettings) -> CatalogSettings {
        let mut settings = base.clone();
        if let Some(version) = self.catalog_version.as_deref().filter(|v| !v.trim().is_empty()) {
            settings.version = version.trim().to_string();
        }
        if let Some(name) = self.runtime_provider.as_deref().filter(|v| !v.trim().is_empty()) {
            match RuntimeProvider::parse(name.trim()) {
                Some(provider) => settings.runtime_provider = provider,
                None => warn!("Unknown runtime provider '{}', keeping {}", name, settings.runtime_provider),
            }
        }
        if let Some(extra) = &self.extra_components {
            settings.extra_components = extra.clone();
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BUNDLED_CATALOG_VERSION;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.catalog.version, BUNDLED_CATALOG_VERSION);
        assert_eq!(config.catalog.runtime_provider, RuntimeProvider::Default);
        assert_eq!(config.server.log_level, "info");
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.catalog.runtime_provider = RuntimeProvider::Quarkus;
        config.catalog.catalog_dir = Some(PathBuf::from("/opt/catalogs"));
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str("[catalog]\nruntime_provider = \"karaf\"\n").unwrap();
        assert_eq!(parsed.catalog.runtime_provider, RuntimeProvider::Karaf);
        assert_eq!(parsed.catalog.version, BUNDLED_CATALOG_VERSION);
        assert!(parsed.server.validate_on_change);
    }

    #[test]
    fn test_default_file_parses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::write_default_config(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.server.validate_on_change = false;
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
        assert!(matches!(
            Config::load_from(&dir.path().join("missing.toml")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_lsp_settings() {
        let settings = LspSettings::from_json(&json!({
            "camel": {
                "catalog-version": "3.18.0",
                "runtime-provider": "springboot",
                "extra-components": [{ "component": { "scheme": "acme" } }]
            }
        }));
        let applied = settings.apply(&CatalogSettings::default());
        assert_eq!(applied.version, "3.18.0");
        assert_eq!(applied.runtime_provider, RuntimeProvider::Springboot);
        assert_eq!(applied.extra_components.len(), 1);
    }

    #[test]
    fn test_lsp_settings_long_names_and_blanks() {
        let settings = LspSettings::from_json(&json!({
            "Camel catalog version": "",
            "Camel catalog runtime provider": "nope"
        }));
        let applied = settings.apply(&CatalogSettings::default());
        assert_eq!(applied, CatalogSettings::default());

        assert_eq!(LspSettings::from_json(&Value::Null), LspSettings::default());
        assert_eq!(LspSettings::from_json(&json!({ "camel": 5 })), LspSettings::default());
    }
}
