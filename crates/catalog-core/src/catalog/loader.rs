//! ============================================================================
//! Catalog Loader - Incremental page accumulation
//! ============================================================================
//! Pages are requested in increasing offset order, one at a time. The
//! `loading` flag is the only guard: a trigger that arrives while a fetch is
//! in flight (scroll sentinel, manual "load more") is a no-op. Products are
//! appended in server order, never reordered or deduplicated.
//! ============================================================================

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::source::CatalogSource;
use crate::types::{CatalogError, Product};

/// Products requested per page
pub const PAGE_SIZE: usize = 12;

/// What a load call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page arrived with this many products
    Loaded(usize),
    /// Guard tripped: already loading, nothing more to load, or closed
    Skipped,
    /// The fetch failed; the error is in the snapshot
    Failed,
    /// The loader was closed while the fetch was in flight
    Discarded,
}

/// Point-in-time view of the loader for the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    pub loading: bool,
    pub error: Option<CatalogError>,
    pub has_more: bool,
    pub total: usize,
}

#[derive(Debug, Default)]
struct LoaderState {
    products: Vec<Product>,
    error: Option<CatalogError>,
    has_more: bool,
    total: usize,
    closed: bool,
}

/// Holds the in-flight flag for one fetch. Dropping it clears the flag, so
/// a load future cancelled mid-fetch does not leave the loader stuck.
struct FetchGuard<'a> {
    loading: &'a AtomicBool,
}

impl<'a> FetchGuard<'a> {
    fn acquire(loading: &'a AtomicBool) -> Option<Self> {
        loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { loading })
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.loading.store(false, Ordering::SeqCst);
    }
}

/// Accumulates catalog pages fetched from a `CatalogSource`
pub struct CatalogLoader {
    source: Arc<dyn CatalogSource>,
    page_size: usize,
    loading: AtomicBool,
    state: RwLock<LoaderState>,
}

impl CatalogLoader {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self::with_page_size(source, PAGE_SIZE)
    }

    pub fn with_page_size(source: Arc<dyn CatalogSource>, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            loading: AtomicBool::new(false),
            state: RwLock::new(LoaderState::default()),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetch the first page, replacing anything already held
    pub async fn load_initial(&self) -> LoadOutcome {
        let guard = {
            let mut state = self.state.write().await;
            let guard = match FetchGuard::acquire(&self.loading) {
                Some(guard) if !state.closed => guard,
                _ => {
                    debug!(
                        "Initial load skipped (loading={}, closed={})",
                        self.loading.load(Ordering::SeqCst),
                        state.closed
                    );
                    return LoadOutcome::Skipped;
                }
            };
            state.error = None;
            guard
        };

        self.fetch_page(0, true, guard).await
    }

    /// Fetch the next page if one exists and nothing is in flight
    pub async fn load_more(&self) -> LoadOutcome {
        let (offset, guard) = {
            let mut state = self.state.write().await;
            let guard = match FetchGuard::acquire(&self.loading) {
                Some(guard) if !state.closed && state.has_more => guard,
                _ => {
                    debug!(
                        "Load more skipped (loading={}, has_more={}, closed={})",
                        self.loading.load(Ordering::SeqCst),
                        state.has_more,
                        state.closed
                    );
                    return LoadOutcome::Skipped;
                }
            };
            state.error = None;
            (state.products.len(), guard)
        };

        self.fetch_page(offset, false, guard).await
    }

    /// Keep loading pages until the catalog is exhausted or a fetch fails
    pub async fn load_all(&self) -> LoadOutcome {
        let mut last = LoadOutcome::Skipped;
        loop {
            match self.load_more().await {
                LoadOutcome::Loaded(count) => last = LoadOutcome::Loaded(count),
                LoadOutcome::Skipped => return last,
                other => return other,
            }
        }
    }

    async fn fetch_page(&self, offset: usize, replace: bool, guard: FetchGuard<'_>) -> LoadOutcome {
        let result = self.source.list_products(self.page_size, offset).await;

        let mut state = self.state.write().await;
        // Clear the flag while the state lock is held so snapshots stay consistent
        drop(guard);
        if state.closed {
            debug!("Discarding page at offset {} for closed loader", offset);
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(page) => {
                let received = page.products.len();
                let held = if replace { 0 } else { state.products.len() };
                // Never hold more than one page per fetch or more than the total
                let room = page.total.saturating_sub(held).min(self.page_size);
                if received > room {
                    warn!(
                        "Page at offset {} has {} products, keeping {} (total {})",
                        offset, received, room, page.total
                    );
                }

                let accepted: Vec<Product> = page.products.into_iter().take(room).collect();
                let appended = accepted.len();
                if replace {
                    state.products = accepted;
                } else {
                    state.products.extend(accepted);
                }
                // A shrinking total never drops below what is already held
                state.total = page.total.max(state.products.len());
                // An empty page ends paging even if the total says otherwise
                state.has_more = received > 0 && state.products.len() < state.total;

                info!(
                    "Loaded {} products at offset {} ({}/{})",
                    appended,
                    offset,
                    state.products.len(),
                    state.total
                );
                LoadOutcome::Loaded(appended)
            }
            Err(e) => {
                warn!("Failed to load products at offset {}: {}", offset, e);
                state.error = Some(e);
                LoadOutcome::Failed
            }
        }
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        let state = self.state.read().await;
        CatalogSnapshot {
            products: state.products.clone(),
            loading: self.loading.load(Ordering::SeqCst),
            error: state.error.clone(),
            has_more: state.has_more,
            total: state.total,
        }
    }

    pub async fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn has_more(&self) -> bool {
        self.state.read().await.has_more
    }

    /// Detach the loader from its consumer. Fetches that complete afterwards
    /// leave the state untouched and new loads are skipped.
    pub async fn close(&self) {
        self.state.write().await.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CatalogPage;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// In-process catalog that records every listing request
    struct ScriptedSource {
        catalog: Vec<Product>,
        calls: AtomicUsize,
        offsets: Mutex<Vec<usize>>,
        failures_left: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedSource {
        fn new(count: u64) -> Self {
            Self {
                catalog: (1..=count)
                    .map(|id| Product::new(id, format!("Product {id}"), "misc", id as f64))
                    .collect(),
                calls: AtomicUsize::new(0),
                offsets: Mutex::new(Vec::new()),
                failures_left: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn gated(count: u64, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(count)
            }
        }
    }

    #[async_trait]
    impl CatalogSource for ScriptedSource {
        async fn list_products(
            &self,
            limit: usize,
            offset: usize,
        ) -> Result<CatalogPage, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.offsets.lock().unwrap().push(offset);

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(CatalogError::Network("connection reset".into()));
            }

            let products = self.catalog.iter().skip(offset).take(limit).cloned().collect();
            Ok(CatalogPage::new(products, self.catalog.len()))
        }

        async fn get_product(&self, id: u64) -> Result<Product, CatalogError> {
            self.catalog
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or(CatalogError::NotFound(id))
        }
    }

    #[tokio::test]
    async fn test_initial_load() {
        let loader = CatalogLoader::new(Arc::new(ScriptedSource::new(30)));
        assert_eq!(loader.load_initial().await, LoadOutcome::Loaded(PAGE_SIZE));

        let snapshot = loader.snapshot().await;
        assert_eq!(snapshot.products.len(), 12);
        assert_eq!(snapshot.total, 30);
        assert!(snapshot.has_more);
        assert!(!snapshot.loading);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_load_more_before_initial_is_noop() {
        let source = Arc::new(ScriptedSource::new(30));
        let loader = CatalogLoader::new(source.clone());
        assert_eq!(loader.load_more().await, LoadOutcome::Skipped);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_monotonic_accumulation() {
        let source = Arc::new(ScriptedSource::new(30));
        let loader = CatalogLoader::new(source.clone());
        loader.load_initial().await;

        let mut last_len = loader.snapshot().await.products.len();
        while loader.has_more().await {
            loader.load_more().await;
            let snapshot = loader.snapshot().await;
            assert!(snapshot.products.len() >= last_len);
            assert!(snapshot.products.len() <= snapshot.total);
            last_len = snapshot.products.len();
        }

        let snapshot = loader.snapshot().await;
        assert_eq!(snapshot.products.len(), 30);
        assert!(!snapshot.has_more);
        assert_eq!(*source.offsets.lock().unwrap(), vec![0, 12, 24]);

        // Server order is preserved
        let ids: Vec<u64> = snapshot.products.iter().map(|p| p.id).collect();
        assert_eq!(ids, (1..=30).collect::<Vec<_>>());

        assert_eq!(loader.load_more().await, LoadOutcome::Skipped);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrent_load_more_issues_one_fetch() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(ScriptedSource::gated(30, gate.clone()));
        let loader = CatalogLoader::new(source.clone());

        gate.notify_one();
        loader.load_initial().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let (first, second, _) = tokio::join!(loader.load_more(), loader.load_more(), async {
            tokio::task::yield_now().await;
            gate.notify_one();
        });

        assert_eq!(first, LoadOutcome::Loaded(12));
        assert_eq!(second, LoadOutcome::Skipped);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(loader.snapshot().await.products.len(), 24);
    }

    #[tokio::test]
    async fn test_failure_is_surfaced_and_retryable() {
        let source = Arc::new(ScriptedSource::new(30));
        let loader = CatalogLoader::new(source.clone());
        loader.load_initial().await;

        source.failures_left.store(1, Ordering::SeqCst);
        assert_eq!(loader.load_more().await, LoadOutcome::Failed);

        let snapshot = loader.snapshot().await;
        assert!(!snapshot.loading);
        assert!(snapshot.has_more);
        assert_eq!(snapshot.products.len(), 12);
        assert!(matches!(snapshot.error, Some(CatalogError::Network(_))));

        assert_eq!(loader.load_more().await, LoadOutcome::Loaded(12));
        let snapshot = loader.snapshot().await;
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.products.len(), 24);
    }

    #[tokio::test]
    async fn test_initial_failure() {
        let source = Arc::new(ScriptedSource::new(30));
        source.failures_left.store(1, Ordering::SeqCst);
        let loader = CatalogLoader::new(source);

        assert_eq!(loader.load_initial().await, LoadOutcome::Failed);
        let snapshot = loader.snapshot().await;
        assert!(snapshot.products.is_empty());
        assert!(!snapshot.has_more);
        assert!(!snapshot.loading);
        assert!(snapshot.error.is_some());
    }

    #[tokio::test]
    async fn test_load_all() {
        let loader = CatalogLoader::with_page_size(Arc::new(ScriptedSource::new(25)), 10);
        loader.load_initial().await;
        assert_eq!(loader.load_all().await, LoadOutcome::Loaded(5));
        assert_eq!(loader.snapshot().await.products.len(), 25);
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let loader = CatalogLoader::new(Arc::new(ScriptedSource::new(0)));
        assert_eq!(loader.load_initial().await, LoadOutcome::Loaded(0));
        assert!(!loader.has_more().await);
    }

    #[tokio::test]
    async fn test_close_discards_in_flight_page() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(ScriptedSource::gated(30, gate.clone()));
        let loader = CatalogLoader::new(source);

        gate.notify_one();
        loader.load_initial().await;

        let (outcome, _) = tokio::join!(loader.load_more(), async {
            tokio::task::yield_now().await;
            loader.close().await;
            gate.notify_one();
        });

        assert_eq!(outcome, LoadOutcome::Discarded);
        assert_eq!(loader.snapshot().await.products.len(), 12);
        assert_eq!(loader.load_initial().await, LoadOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_cancelled_load_releases_the_guard() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(ScriptedSource::gated(30, gate.clone()));
        let loader = CatalogLoader::new(source.clone());

        gate.notify_one();
        loader.load_initial().await;

        // The page never arrives before the caller gives up
        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), loader.load_more()).await;
        assert!(timed_out.is_err());

        let snapshot = loader.snapshot().await;
        assert!(!snapshot.loading);
        assert!(snapshot.has_more);
        assert_eq!(snapshot.products.len(), 12);

        gate.notify_one();
        assert_eq!(loader.load_more().await, LoadOutcome::Loaded(12));
        assert_eq!(*source.offsets.lock().unwrap(), vec![0, 12, 12]);
        assert_eq!(loader.snapshot().await.products.len(), 24);
    }

    /// Serves `page_len` products per request and reports the next total
    /// from a script, repeating the last one
    struct ShiftingSource {
        totals: Mutex<VecDeque<usize>>,
        page_len: usize,
    }

    impl ShiftingSource {
        fn new(totals: &[usize], page_len: usize) -> Self {
            Self {
                totals: Mutex::new(totals.iter().copied().collect()),
                page_len,
            }
        }
    }

    #[async_trait]
    impl CatalogSource for ShiftingSource {
        async fn list_products(
            &self,
            _limit: usize,
            offset: usize,
        ) -> Result<CatalogPage, CatalogError> {
            let total = {
                let mut totals = self.totals.lock().unwrap();
                if totals.len() > 1 {
                    totals.pop_front().unwrap()
                } else {
                    totals[0]
                }
            };
            let products = (offset..offset + self.page_len)
                .map(|i| Product::new(i as u64 + 1, format!("Product {}", i + 1), "misc", 1.0))
                .collect();
            Ok(CatalogPage::new(products, total))
        }

        async fn get_product(&self, id: u64) -> Result<Product, CatalogError> {
            Err(CatalogError::NotFound(id))
        }
    }

    #[tokio::test]
    async fn test_shrinking_total_caps_held_products() {
        let loader = CatalogLoader::new(Arc::new(ShiftingSource::new(&[30, 20], 12)));
        loader.load_initial().await;
        assert_eq!(loader.snapshot().await.total, 30);

        let mut last_len = 12;
        while loader.has_more().await {
            loader.load_more().await;
            let snapshot = loader.snapshot().await;
            assert!(snapshot.products.len() >= last_len);
            assert!(snapshot.products.len() <= snapshot.total);
            last_len = snapshot.products.len();
        }

        let snapshot = loader.snapshot().await;
        assert_eq!(snapshot.products.len(), 20);
        assert_eq!(snapshot.total, 20);
        let ids: Vec<u64> = snapshot.products.iter().map(|p| p.id).collect();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_total_below_held_count_stops_paging() {
        let loader = CatalogLoader::new(Arc::new(ShiftingSource::new(&[30, 5], 12)));
        loader.load_initial().await;

        assert_eq!(loader.load_more().await, LoadOutcome::Loaded(0));
        let snapshot = loader.snapshot().await;
        assert_eq!(snapshot.products.len(), 12);
        assert_eq!(snapshot.total, 12);
        assert!(!snapshot.has_more);
    }

    #[tokio::test]
    async fn test_oversized_page_is_trimmed_to_page_size() {
        let loader = CatalogLoader::new(Arc::new(ShiftingSource::new(&[40], 15)));
        assert_eq!(loader.load_initial().await, LoadOutcome::Loaded(12));
        assert_eq!(loader.load_more().await, LoadOutcome::Loaded(12));

        let ids: Vec<u64> = loader.snapshot().await.products.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), 24);
        assert_eq!(ids[..12], (1..=12).collect::<Vec<_>>()[..]);
        assert_eq!(ids[12..], (13..=24).collect::<Vec<_>>()[..]);
    }
}
