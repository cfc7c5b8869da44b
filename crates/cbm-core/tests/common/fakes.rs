//! In-memory automation surface and transport.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cbm_core::catalog::{CatalogItem, ResourceLocation};
use cbm_core::extractor::{Affordance, AutomationSurface};
use cbm_core::retry::TransferError;
use cbm_core::transport::Transport;

#[derive(Default)]
struct SurfaceState {
    /// item id → one entry per affordance; None never emits.
    pages: HashMap<String, Vec<Option<String>>>,
    navigate_failures: HashMap<String, VecDeque<String>>,
    navigations: Vec<String>,
    current: Vec<Option<String>>,
    pending: Option<usize>,
}

/// Scripted surface. Clones share state, so a test keeps one handle while the
/// pipeline owns another.
#[derive(Clone, Default)]
pub struct FakeSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `item_id` one affordance per URL.
    pub fn page(&self, item_id: &str, urls: &[&str]) -> &Self {
        let affordances = urls.iter().map(|u| Some(u.to_string())).collect();
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(item_id.to_string(), affordances);
        self
    }

    /// Add an affordance that never emits a resource.
    pub fn silent_affordance(&self, item_id: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .entry(item_id.to_string())
            .or_default()
            .push(None);
        self
    }

    /// Make the next navigation to `item_id` fail with `message`.
    pub fn fail_navigation(&self, item_id: &str, message: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .navigate_failures
            .entry(item_id.to_string())
            .or_default()
            .push_back(message.to_string());
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn boxed(&self) -> Box<dyn AutomationSurface> {
        Box::new(self.clone())
    }
}

#[async_trait]
impl AutomationSurface for FakeSurface {
    async fn navigate(&mut self, item: &CatalogItem) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        st.navigations.push(item.id.clone());
        if let Some(msg) = st
            .navigate_failures
            .get_mut(&item.id)
            .and_then(|q| q.pop_front())
        {
            anyhow::bail!(msg);
        }
        st.current = st.pages.get(&item.id).cloned().unwrap_or_default();
        st.pending = None;
        Ok(())
    }

    async fn list_affordances(&mut self) -> Result<Vec<Affordance>> {
        let st = self.state.lock().unwrap();
        Ok((0..st.current.len())
            .map(|index| Affordance {
                index,
                label: format!("play {}", index + 1),
            })
            .collect())
    }

    async fn trigger(&mut self, affordance: &Affordance) -> Result<()> {
        self.state.lock().unwrap().pending = Some(affordance.index);
        Ok(())
    }

    async fn observe_with_timeout(&mut self, timeout: Duration) -> Result<Vec<ResourceLocation>> {
        let emitted = {
            let mut st = self.state.lock().unwrap();
            let idx = st.pending.take();
            idx.and_then(|i| st.current.get(i).cloned().flatten())
        };
        match emitted {
            Some(url) => Ok(vec![ResourceLocation::new(url)]),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(Vec::new())
            }
        }
    }
}

/// Writes `payload:<url>` to the destination. URLs in `failing` answer 500 and
/// URLs in `throttled` answer 503 on every attempt.
#[derive(Default)]
pub struct FakeTransport {
    failing: Mutex<HashSet<String>>,
    throttled: Mutex<HashSet<String>>,
    fetched: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn throttle(&self, url: &str) {
        self.throttled.lock().unwrap().insert(url.to_string());
    }

    /// URLs written successfully, in completion order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn payload(url: &str) -> Vec<u8> {
        format!("payload:{url}").into_bytes()
    }
}

impl Transport for FakeTransport {
    fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, TransferError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.throttled.lock().unwrap().contains(url) {
            return Err(TransferError::Http(503));
        }
        if self.failing.lock().unwrap().contains(url) {
            return Err(TransferError::Http(500));
        }
        let body = Self::payload(url);
        std::fs::write(dest, &body).map_err(TransferError::Storage)?;
        self.fetched.lock().unwrap().push(url.to_string());
        Ok(body.len() as u64)
    }
}
