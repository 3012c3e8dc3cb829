//! Component catalog: the schema gateway used by every engine.
//!
//! The catalog answers "which components exist", "what does this component's
//! schema look like" and "is this endpoint or property valid". A catalog is
//! built once per [`CatalogKey`] and never mutated afterwards; see
//! [`cache::CatalogCache`] for how requests share the loading work.

pub mod cache;
pub mod kamelets;
pub mod main_model;
pub mod model;
pub mod traits;
pub mod validation;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub use cache::CatalogCache;
pub use model::{ApiMethodModel, ApiModel, ComponentModel, EndpointOptionModel};
pub use validation::ValidationResult;

/// Version of the component schemas compiled into the binary.
pub const BUNDLED_CATALOG_VERSION: &str = "3.20.1";

const BUNDLED_COMPONENTS: &str = include_str!("../../catalog/components.json");

/// Runtime flavour a catalog is resolved for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeProvider {
    #[default]
    Default,
    Quarkus,
    Springboot,
    Karaf,
}

impl RuntimeProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeProvider::Default => "default",
            RuntimeProvider::Quarkus => "quarkus",
            RuntimeProvider::Springboot => "springboot",
            RuntimeProvider::Karaf => "karaf",
        }
    }

    /// Parse a provider name as sent by editors (case insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "" | "default" | "main" => Some(RuntimeProvider::Default),
            "quarkus" => Some(RuntimeProvider::Quarkus),
            "springboot" | "spring-boot" => Some(RuntimeProvider::Springboot),
            "karaf" => Some(RuntimeProvider::Karaf),
            _ => None,
        }
    }
}

impl fmt::Display for RuntimeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a loaded catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogKey {
    pub version: String,
    pub runtime_provider: RuntimeProvider,
}

/// Where the catalog comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Catalog version, the bundled one unless a catalog directory provides another.
    pub version: String,
    pub runtime_provider: RuntimeProvider,
    /// Directory laid out as `<runtime>/<version>/*.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_dir: Option<PathBuf>,
    /// Directory of additional component schemas (`*.json`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_components_dir: Option<PathBuf>,
    /// Inline component schemas, usually sent by the editor.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_components: Vec<Value>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            version: BUNDLED_CATALOG_VERSION.to_string(),
            runtime_provider: RuntimeProvider::Default,
            catalog_dir: None,
            extra_components_dir: None,
            extra_components: Vec::new(),
        }
    }
}

impl CatalogSettings {
    pub fn key(&self) -> CatalogKey {
        CatalogKey {
            version: self.version.clone(),
            runtime_provider: self.runtime_provider,
        }
    }
}

/// An immutable set of component models.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    version: String,
    runtime_provider: RuntimeProvider,
    components: BTreeMap<String, ComponentModel>,
}

impl Catalog {
    /// Build a catalog from already normalized models; later duplicates win.
    pub fn from_components(
        version: impl Into<String>,
        runtime_provider: RuntimeProvider,
        components: impl IntoIterator<Item = ComponentModel>,
    ) -> Self {
        let components = components
            .into_iter()
            .filter(|c| !c.scheme.is_empty())
            .map(|c| (c.scheme.clone(), c))
            .collect();
        Self {
            version: version.into(),
            runtime_provider,
            components,
        }
    }

    /// The catalog compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Ok(Self::from_components(
            BUNDLED_CATALOG_VERSION,
            RuntimeProvider::Default,
            bundled_components()?,
        ))
    }

    /// Load the catalog described by `settings`.
    ///
    /// Blocking: reads schema files from disk.
    pub fn load(settings: &CatalogSettings) -> Result<Self> {
        let versioned_dir = settings.catalog_dir.as_ref().map(|dir| {
            dir.join(settings.runtime_provider.as_str())
                .join(&settings.version)
        });

        let mut components = match versioned_dir {
            Some(dir) if dir.is_dir() => {
                info!("Loading component catalog from {}", dir.display());
                match read_schema_dir(&dir) {
                    Ok(components) => components,
                    Err(e) => {
                        warn!("Cannot read catalog {}, using bundled catalog: {}", dir.display(), e);
                        bundled_components()?
                    }
                }
            }
            _ => {
                if settings.version != BUNDLED_CATALOG_VERSION {
                    warn!(
                        "No catalog available for {} ({}), using bundled catalog {}",
                        settings.version, settings.runtime_provider, BUNDLED_CATALOG_VERSION
                    );
                }
                bundled_components()?
            }
        };

        if let Some(dir) = &settings.extra_components_dir {
            match read_schema_dir(dir) {
                Ok(extra) => {
                    info!("Loaded {} extra components from {}", extra.len(), dir.display());
                    components.extend(extra);
                }
                Err(e) => warn!("Ignoring extra components directory {}: {}", dir.display(), e),
            }
        }
        components.extend(settings.extra_components.iter().map(ComponentModel::from_json));

        let catalog = Self::from_components(&settings.version, settings.runtime_provider, components);
        debug!(
            "Catalog {} ({}) has {} components",
            catalog.version,
            catalog.runtime_provider,
            catalog.components.len()
        );
        Ok(catalog)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn runtime_provider(&self) -> RuntimeProvider {
        self.runtime_provider
    }

    /// Schema of a component by scheme name.
    pub fn component(&self, scheme: &str) -> Option<&ComponentModel> {
        self.components.get(scheme)
    }

    /// All scheme names, sorted.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentModel> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

fn bundled_components() -> Result<Vec<ComponentModel>> {
    let schemas: Vec<Value> = serde_json::from_str(BUNDLED_COMPONENTS)
        .map_err(|e| Error::Catalog(format!("bundled catalog is malformed: {e}")))?;
    Ok(schemas.iter().map(ComponentModel::from_json).collect())
}

/// Read every `*.json` schema of a directory. Unreadable files are skipped.
fn read_schema_dir(dir: &Path) -> Result<Vec<ComponentModel>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut components = Vec::with_capacity(paths.len());
    for path in paths {
        let parsed = std::fs::read_to_string(&path)
            .map_err(Error::from)
            .and_then(|text| ComponentModel::from_json_str(&text));
        match parsed {
            Ok(model) if !model.scheme.is_empty() => components.push(model),
            Ok(_) => warn!("Schema {} has no component scheme, skipping", path.display()),
            Err(e) => warn!("Failed to read schema {}: {}", path.display(), e),
        }
    }
    Ok(components)
}
