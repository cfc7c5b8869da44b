//! JSON catalog file: a static stand-in for a remote catalog and its
//! interactive surface.
//!
//! ```json
//! { "items": [
//!     { "id": "c-1", "title": "Intro course",
//!       "resources": [ { "url": "https://cdn.example/1.mp3", "stem": "Welcome" },
//!                      { "label": "locked lesson" } ] } ] }
//! ```
//!
//! Each resource becomes one affordance. A resource without `url` never emits
//! anything, like a play button that produces no media.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{CatalogItem, DiscoveryService, ResourceLocation};
use crate::extractor::{Affordance, AutomationSurface};

#[derive(Debug, Clone, Deserialize)]
struct CatalogDoc {
    items: Vec<EntryDoc>,
}

#[derive(Debug, Clone, Deserialize)]
struct EntryDoc {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    resources: Vec<ResourceDoc>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResourceDoc {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    stem: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

/// A parsed catalog file.
#[derive(Debug, Clone)]
pub struct CatalogFile {
    items: Vec<CatalogItem>,
    resources: Arc<HashMap<String, Vec<ResourceDoc>>>,
}

impl CatalogFile {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("read catalog: {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("parse catalog: {}", path.display()))
    }

    /// Ids must be non-empty and unique; they key the progress ledger.
    pub fn from_json(data: &str) -> Result<Self> {
        let doc: CatalogDoc = serde_json::from_str(data)?;
        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(doc.items.len());
        let mut resources = HashMap::with_capacity(doc.items.len());
        for (i, entry) in doc.items.into_iter().enumerate() {
            let id = entry.id.trim().to_string();
            anyhow::ensure!(!id.is_empty(), "item {} has an empty id", i + 1);
            anyhow::ensure!(seen.insert(id.clone()), "duplicate item id {:?}", id);
            items.push(CatalogItem::new(id.clone(), entry.title, i + 1));
            resources.insert(id, entry.resources);
        }
        Ok(Self {
            items,
            resources: Arc::new(resources),
        })
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// A fresh automation surface over this catalog.
    pub fn surface(&self) -> CatalogFileSurface {
        CatalogFileSurface {
            resources: Arc::clone(&self.resources),
            current: Vec::new(),
            pending: None,
        }
    }
}

#[async_trait]
impl DiscoveryService for CatalogFile {
    /// The file is already loaded; `source_ref` is informational.
    async fn list_items(&self, source_ref: &str) -> Result<Vec<CatalogItem>> {
        tracing::debug!(source = source_ref, items = self.items.len(), "listing catalog file");
        Ok(self.items.clone())
    }
}

/// [`AutomationSurface`] backed by a [`CatalogFile`].
pub struct CatalogFileSurface {
    resources: Arc<HashMap<String, Vec<ResourceDoc>>>,
    current: Vec<ResourceDoc>,
    pending: Option<usize>,
}

#[async_trait]
impl AutomationSurface for CatalogFileSurface {
    async fn navigate(&mut self, item: &CatalogItem) -> Result<()> {
        self.current = self
            .resources
            .get(&item.id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("item {} is not in the catalog", item.id))?;
        self.pending = None;
        Ok(())
    }

    async fn list_affordances(&mut self) -> Result<Vec<Affordance>> {
        Ok(self
            .current
            .iter()
            .enumerate()
            .map(|(index, r)| Affordance {
                index,
                label: r
                    .label
                    .clone()
                    .or_else(|| r.stem.clone())
                    .unwrap_or_else(|| format!("resource {}", index + 1)),
            })
            .collect())
    }

    async fn trigger(&mut self, affordance: &Affordance) -> Result<()> {
        anyhow::ensure!(
            affordance.index < self.current.len(),
            "no affordance {} on this page",
            affordance.index
        );
        self.pending = Some(affordance.index);
        Ok(())
    }

    async fn observe_with_timeout(&mut self, timeout: Duration) -> Result<Vec<ResourceLocation>> {
        let Some(index) = self.pending.take() else {
            return Ok(Vec::new());
        };
        let resource = &self.current[index];
        match &resource.url {
            Some(url) => Ok(vec![ResourceLocation {
                url: url.clone(),
                suggested_stem: resource.stem.clone(),
            }]),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(Vec::new())
            }
        }
    }
}
