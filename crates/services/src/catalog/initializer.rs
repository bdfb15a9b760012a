use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use guessr_core::model::{
    CatalogSnapshot, CategoryEntry, CategoryId, MAX_CATEGORY, MIN_CATEGORY,
};
use storage::repository::{CatalogSnapshotRepository, SnapshotState};

use super::ItemCatalog;
use crate::error::CatalogError;

/// Where the catalog initializer stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InitState {
    #[default]
    Pending,
    /// A snapshot is persisted, valid or not.
    Ready,
    /// The last run gave up; no snapshot will appear until the next one.
    Failed(String),
}

/// Shared state of the catalog initializer, observed by readiness waiters.
///
/// Cloning shares the same signal.
#[derive(Clone, Debug)]
pub struct CatalogSignal {
    tx: Arc<watch::Sender<InitState>>,
}

impl CatalogSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(InitState::Pending);
        Self { tx: Arc::new(tx) }
    }

    pub fn mark_ready(&self) {
        self.tx.send_replace(InitState::Ready);
    }

    pub fn mark_failed(&self, reason: impl Into<String>) {
        self.tx.send_replace(InitState::Failed(reason.into()));
    }

    /// Back to pending, for a new run.
    pub fn reset(&self) {
        self.tx.send_replace(InitState::Pending);
    }

    #[must_use]
    pub fn state(&self) -> InitState {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.tx.borrow() == InitState::Ready
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<InitState> {
        self.tx.subscribe()
    }
}

impl Default for CatalogSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// What `CatalogInitializer::ensure_snapshot` found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A snapshot was already persisted; nothing was fetched.
    AlreadyPresent,
    /// A persisted value exists but does not decode. Left untouched.
    Invalid,
    Fetched { categories: usize, items: usize },
}

/// Materializes the category → ids mapping into storage once.
#[derive(Clone)]
pub struct CatalogInitializer {
    catalog: Arc<dyn ItemCatalog>,
    snapshots: Arc<dyn CatalogSnapshotRepository>,
    signal: CatalogSignal,
}

impl CatalogInitializer {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn ItemCatalog>,
        snapshots: Arc<dyn CatalogSnapshotRepository>,
        signal: CatalogSignal,
    ) -> Self {
        Self {
            catalog,
            snapshots,
            signal,
        }
    }

    #[must_use]
    pub fn signal(&self) -> &CatalogSignal {
        &self.signal
    }

    /// Fetch and persist every category unless a snapshot already exists.
    ///
    /// The signal turns ready whenever a snapshot exists afterwards, valid or not, so
    /// waiters can evaluate it. Any error marks it failed. A category that comes back
    /// empty aborts the run without persisting anything.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::EmptyCategory` if a category yields no ids, or
    /// `CatalogError::Storage` if the snapshot cannot be read or written.
    pub async fn ensure_snapshot(&self) -> Result<InitOutcome, CatalogError> {
        let outcome = self.materialize().await;
        self.settle(outcome)
    }

    /// Drop the persisted snapshot and fetch a fresh one.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogInitializer::ensure_snapshot`].
    pub async fn refresh(&self) -> Result<InitOutcome, CatalogError> {
        self.signal.reset();
        let outcome = match self.snapshots.clear_snapshot().await {
            Ok(()) => self.materialize().await,
            Err(err) => Err(err.into()),
        };
        self.settle(outcome)
    }

    fn settle(
        &self,
        outcome: Result<InitOutcome, CatalogError>,
    ) -> Result<InitOutcome, CatalogError> {
        if let Err(err) = &outcome {
            warn!(error = %err, "catalog initialization failed");
            self.signal.mark_failed(err.to_string());
        }
        outcome
    }

    async fn materialize(&self) -> Result<InitOutcome, CatalogError> {
        match self.snapshots.load_snapshot().await? {
            SnapshotState::Valid(_) => {
                self.signal.mark_ready();
                return Ok(InitOutcome::AlreadyPresent);
            }
            SnapshotState::Invalid(reason) => {
                warn!(%reason, "persisted catalog snapshot is malformed");
                self.signal.mark_ready();
                return Ok(InitOutcome::Invalid);
            }
            SnapshotState::Absent => {}
        }

        let snapshot = self.fetch_all().await?;
        self.snapshots.save_snapshot(&snapshot).await?;
        self.signal.mark_ready();

        let items: usize = snapshot.entries().iter().map(|entry| entry.ids.len()).sum();
        info!(categories = snapshot.entries().len(), items, "catalog snapshot persisted");
        Ok(InitOutcome::Fetched {
            categories: snapshot.entries().len(),
            items,
        })
    }

    async fn fetch_all(&self) -> Result<CatalogSnapshot, CatalogError> {
        let mut entries = Vec::new();
        for raw in MIN_CATEGORY..=MAX_CATEGORY {
            let category = CategoryId::new(raw);
            let ids = self.catalog.ids_for_category(category).await;
            if ids.is_empty() {
                return Err(CatalogError::EmptyCategory(raw));
            }
            entries.push(CategoryEntry { category, ids });
        }
        Ok(CatalogSnapshot::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use storage::repository::InMemoryRepository;

    fn full_catalog() -> InMemoryCatalog {
        (MIN_CATEGORY..=MAX_CATEGORY).fold(InMemoryCatalog::new(), |catalog, category| {
            catalog.with_category(category, [category * 100, category * 100 + 1])
        })
    }

    #[tokio::test]
    async fn fetches_once_then_reuses_snapshot() {
        let repo = Arc::new(InMemoryRepository::new());
        let signal = CatalogSignal::new();
        let init = CatalogInitializer::new(Arc::new(full_catalog()), repo.clone(), signal.clone());

        assert!(!signal.is_ready());
        let first = init.ensure_snapshot().await.unwrap();
        assert_eq!(
            first,
            InitOutcome::Fetched {
                categories: 9,
                items: 18
            }
        );
        assert!(signal.is_ready());

        let second = init.ensure_snapshot().await.unwrap();
        assert_eq!(second, InitOutcome::AlreadyPresent);
        assert!(matches!(
            repo.load_snapshot().await.unwrap(),
            SnapshotState::Valid(_)
        ));
    }

    #[tokio::test]
    async fn empty_category_persists_nothing() {
        let repo = Arc::new(InMemoryRepository::new());
        let catalog = InMemoryCatalog::new().with_category(1, [1, 2]);
        let signal = CatalogSignal::new();
        let init = CatalogInitializer::new(Arc::new(catalog), repo.clone(), signal.clone());

        let err = init.ensure_snapshot().await.unwrap_err();
        assert!(matches!(err, CatalogError::EmptyCategory(2)));
        assert!(!signal.is_ready());
        assert!(matches!(signal.state(), InitState::Failed(_)));
        assert_eq!(repo.load_snapshot().await.unwrap(), SnapshotState::Absent);
    }

    #[tokio::test]
    async fn refresh_after_failure_recovers() {
        let repo = Arc::new(InMemoryRepository::new());
        let signal = CatalogSignal::new();
        let broken = CatalogInitializer::new(
            Arc::new(InMemoryCatalog::new()),
            repo.clone(),
            signal.clone(),
        );
        broken.ensure_snapshot().await.unwrap_err();
        assert!(matches!(signal.state(), InitState::Failed(_)));

        let init = CatalogInitializer::new(Arc::new(full_catalog()), repo, signal.clone());
        init.refresh().await.unwrap();
        assert_eq!(signal.state(), InitState::Ready);
    }

    #[tokio::test]
    async fn subscribers_observe_resolution() {
        let repo = Arc::new(InMemoryRepository::new());
        let signal = CatalogSignal::new();
        let mut rx = signal.subscribe();
        let init = CatalogInitializer::new(Arc::new(full_catalog()), repo, signal);

        init.ensure_snapshot().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), InitState::Ready);
    }
}
