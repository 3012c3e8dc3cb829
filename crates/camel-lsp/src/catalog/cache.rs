//! Shared catalog loading.
//!
//! Every request needing schema data awaits the single load task of the
//! active catalog configuration. Reconfiguring swaps the active settings;
//! requests already holding the previous task finish against it.

use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, info};
use tokio::sync::{OnceCell, RwLock};

use super::{Catalog, CatalogKey, CatalogSettings};
use crate::error::{Error, Result};

/// One load per settings value, shared by all waiters.
#[derive(Debug)]
struct LoadTask {
    settings: CatalogSettings,
    cell: Arc<OnceCell<Arc<Catalog>>>,
}

impl LoadTask {
    fn new(settings: CatalogSettings) -> Self {
        Self {
            settings,
            cell: Arc::new(OnceCell::new()),
        }
    }
}

/// Catalogs keyed by `(version, runtime provider)`.
#[derive(Debug)]
pub struct CatalogCache {
    active: RwLock<CatalogSettings>,
    tasks: DashMap<CatalogKey, LoadTask>,
}

impl CatalogCache {
    pub fn new(settings: CatalogSettings) -> Self {
        Self {
            active: RwLock::new(settings),
            tasks: DashMap::new(),
        }
    }

    /// Make `settings` the active configuration. Returns whether anything changed.
    pub async fn configure(&self, settings: CatalogSettings) -> bool {
        let mut active = self.active.write().await;
        if *active == settings {
            return false;
        }
        info!(
            "Switching component catalog to {} ({})",
            settings.version, settings.runtime_provider
        );
        *active = settings;
        true
    }

    pub async fn settings(&self) -> CatalogSettings {
        self.active.read().await.clone()
    }

    /// The catalog of the active configuration, loading it on first use.
    pub async fn current(&self) -> Result<Arc<Catalog>> {
        let settings = self.active.read().await.clone();
        let cell = {
            let mut task = self
                .tasks
                .entry(settings.key())
                .or_insert_with(|| LoadTask::new(settings.clone()));
            if task.settings != settings {
                // same key, different extra components
                *task = LoadTask::new(settings.clone());
            }
            Arc::clone(&task.cell)
        };

        let catalog = cell
            .get_or_try_init(move || async move {
                debug!("Loading catalog {}", settings.version);
                tokio::task::spawn_blocking(move || Catalog::load(&settings))
                    .await
                    .map_err(|e| Error::Catalog(format!("catalog load task failed: {e}")))?
                    .map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(catalog))
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(CatalogSettings::default())
    }
}
