//! Capability interface for the interactive remote surface.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::catalog::{CatalogItem, ResourceLocation};

/// A clickable "play" or "reveal" control on an item's detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Affordance {
    /// Position on the page; trigger order follows it.
    pub index: usize,
    pub label: String,
}

/// Navigate / list / trigger / observe. Any browser driver or headless client
/// can implement this; the core never talks to one directly.
#[async_trait]
pub trait AutomationSurface: Send {
    /// Open the detail view of `item`.
    async fn navigate(&mut self, item: &CatalogItem) -> Result<()>;

    /// Every triggerable affordance on the current view, in page order.
    async fn list_affordances(&mut self) -> Result<Vec<Affordance>>;

    async fn trigger(&mut self, affordance: &Affordance) -> Result<()>;

    /// Resource addresses emitted since the last trigger, waiting at most
    /// `timeout` for the first one. Empty when nothing showed up.
    async fn observe_with_timeout(&mut self, timeout: Duration) -> Result<Vec<ResourceLocation>>;

    /// Undo a trigger (e.g. pause playback). Best effort.
    async fn release(&mut self, _affordance: &Affordance) -> Result<()> {
        Ok(())
    }
}
