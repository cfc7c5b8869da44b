//! Catalog data model and the discovery seam.
//!
//! A catalog is an ordered list of items (courses, videos, albums). Each item
//! yields zero or more resource locations once its detail view is driven by
//! the extractor.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One discrete unit of remote content to back up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Identifier that is stable across runs; the ledger key.
    pub id: String,
    pub title: String,
    /// Position in discovery order (1-based).
    pub ordinal: usize,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, ordinal: usize) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ordinal,
        }
    }
}

/// One downloadable address discovered for a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLocation {
    pub url: String,
    /// Filename hint; when absent the stem is taken from the URL path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_stem: Option<String>,
}

impl ResourceLocation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            suggested_stem: None,
        }
    }

    pub fn with_stem(url: impl Into<String>, stem: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            suggested_stem: Some(stem.into()),
        }
    }
}

/// Lists the items of a remote catalog.
///
/// Implementations page through the remote API internally and must return the
/// same order for the same remote state, since resume relies on it.
#[async_trait]
pub trait DiscoveryService: Send + Sync {
    async fn list_items(&self, source_ref: &str) -> Result<Vec<CatalogItem>>;
}

/// Restrict `items` to the slice starting at the 1-based ordinal `start_at`,
/// keeping at most `limit` items. Ordinals are preserved.
pub fn select_slice(
    items: Vec<CatalogItem>,
    start_at: Option<usize>,
    limit: Option<usize>,
) -> Vec<CatalogItem> {
    let start = start_at.unwrap_or(1).max(1);
    let iter = items.into_iter().filter(|item| item.ordinal >= start);
    match limit {
        Some(n) => iter.take(n).collect(),
        None => iter.collect(),
    }
}
