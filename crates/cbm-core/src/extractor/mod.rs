//! Per-item resource extraction.
//!
//! Drives an automation surface (usually a browser) through an item's detail
//! view: trigger every play/reveal affordance in order and collect the
//! resource addresses the surface observes as a side effect.

mod surface;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::time::Duration;

use crate::catalog::{CatalogItem, ResourceLocation};
use crate::config::ExtractionConfig;

pub use surface::{Affordance, AutomationSurface};

pub struct ResourceExtractor {
    surface: Box<dyn AutomationSurface>,
    observe_timeout: Duration,
    settle: Duration,
}

impl ResourceExtractor {
    pub fn new(surface: Box<dyn AutomationSurface>, cfg: &ExtractionConfig) -> Self {
        Self {
            surface,
            observe_timeout: cfg.observe_timeout(),
            settle: cfg.settle(),
        }
    }

    /// Resource locations for `item`, in affordance trigger order, first
    /// occurrence of each address only. An affordance that yields nothing
    /// within the observe timeout is skipped.
    pub async fn extract(&mut self, item: &CatalogItem) -> Result<Vec<ResourceLocation>> {
        self.surface
            .navigate(item)
            .await
            .with_context(|| format!("navigate to item {}", item.id))?;
        let affordances = self
            .surface
            .list_affordances()
            .await
            .with_context(|| format!("list affordances for item {}", item.id))?;
        if affordances.is_empty() {
            tracing::debug!(item = %item.id, "no affordances on detail view");
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for affordance in &affordances {
            self.surface
                .trigger(affordance)
                .await
                .with_context(|| format!("trigger affordance {} ({})", affordance.index, affordance.label))?;

            // The surface enforces the timeout itself; this ceiling covers
            // surfaces that ignore it.
            let ceiling = self.observe_timeout + self.settle + Duration::from_millis(100);
            let captured = match tokio::time::timeout(
                ceiling,
                self.surface.observe_with_timeout(self.observe_timeout),
            )
            .await
            {
                Ok(res) => res.with_context(|| format!("observe affordance {}", affordance.index))?,
                Err(_) => Vec::new(),
            };

            if captured.is_empty() {
                tracing::debug!(item = %item.id, affordance = affordance.index, "no media captured, skipping");
            } else {
                for loc in captured {
                    if seen.insert(loc.url.clone()) {
                        found.push(loc);
                    }
                }
                if !self.settle.is_zero() {
                    tokio::time::sleep(self.settle).await;
                }
            }

            if let Err(e) = self.surface.release(affordance).await {
                tracing::debug!(affordance = affordance.index, "release failed: {:#}", e);
            }
        }

        tracing::info!(item = %item.id, affordances = affordances.len(), resources = found.len(), "extraction finished");
        Ok(found)
    }
}
