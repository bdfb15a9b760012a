use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use guessr_core::model::{
    AttemptOutcome, CatalogSnapshot, CategoryId, CategoryProgress, ItemId, ItemStat,
    StatsSnapshot, progress,
};
use storage::repository::StatsRepository;

use crate::error::StatsError;

/// Durable per-item performance records.
///
/// Writes are read-modify-write over the whole collection; the internal lock keeps
/// two `record_attempt` calls from this service from interleaving.
#[derive(Clone)]
pub struct StatsService {
    repo: Arc<dyn StatsRepository>,
    write_lock: Arc<Mutex<()>>,
}

impl StatsService {
    #[must_use]
    pub fn new(repo: Arc<dyn StatsRepository>) -> Self {
        Self {
            repo,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Full collection. Unreadable persisted data reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if the backend fails.
    pub async fn snapshot(&self) -> Result<StatsSnapshot, StatsError> {
        Ok(self.repo.load_stats().await?)
    }

    /// # Errors
    ///
    /// Returns `StatsError::Storage` if the backend fails.
    pub async fn get(&self, id: ItemId) -> Result<Option<ItemStat>, StatsError> {
        Ok(self.snapshot().await?.get(id).cloned())
    }

    /// Count one attempt against `id` and persist the full collection.
    ///
    /// Not idempotent: each call is one real attempt.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if loading or saving fails.
    pub async fn record_attempt(
        &self,
        id: ItemId,
        category: Option<CategoryId>,
        outcome: AttemptOutcome,
    ) -> Result<ItemStat, StatsError> {
        let _guard = self.write_lock.lock().await;
        let mut stats = self.repo.load_stats().await?;
        let updated = stats.record(id, category, outcome).clone();
        self.repo.save_stats(&stats).await?;
        debug!(
            item = id.value(),
            ?outcome,
            attempts = updated.attempts(),
            "recorded attempt"
        );
        Ok(updated)
    }

    /// Per-category progress for `categories`, in the given order.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if the backend fails.
    pub async fn overview(
        &self,
        categories: impl IntoIterator<Item = CategoryId>,
        catalog: &CatalogSnapshot,
    ) -> Result<Vec<CategoryProgress>, StatsError> {
        let stats = self.snapshot().await?;
        Ok(progress::overview(categories, catalog, &stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guessr_core::model::CategoryEntry;
    use storage::repository::InMemoryRepository;

    fn service() -> StatsService {
        StatsService::new(Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn record_attempt_creates_then_updates() {
        let stats = service();
        let id = ItemId::new(25);
        assert_eq!(stats.get(id).await.unwrap(), None);

        let first = stats
            .record_attempt(id, Some(CategoryId::new(1)), AttemptOutcome::Failure)
            .await
            .unwrap();
        assert_eq!((first.attempts(), first.failures()), (1, 1));

        let second = stats
            .record_attempt(id, None, AttemptOutcome::Success)
            .await
            .unwrap();
        assert_eq!(second.attempts(), 2);
        assert_eq!(second.successes(), 1);
        assert_eq!(second.category(), Some(CategoryId::new(1)));
        assert_eq!(stats.get(id).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn concurrent_writes_compose() {
        let stats = service();
        let id = ItemId::new(4);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let stats = stats.clone();
            handles.push(tokio::spawn(async move {
                stats
                    .record_attempt(id, None, AttemptOutcome::Pass)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let stat = stats.get(id).await.unwrap().unwrap();
        assert_eq!(stat.attempts(), 8);
        assert_eq!(stat.passes(), 8);
    }

    #[tokio::test]
    async fn overview_uses_current_stats() {
        let stats = service();
        stats
            .record_attempt(ItemId::new(1), Some(CategoryId::new(1)), AttemptOutcome::Success)
            .await
            .unwrap();
        let catalog = CatalogSnapshot::new(vec![CategoryEntry {
            category: CategoryId::new(1),
            ids: vec![ItemId::new(1), ItemId::new(2)],
        }]);

        let rows = stats.overview([CategoryId::new(1)], &catalog).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].found, 1);
        assert_eq!(rows[0].percent, 50);
    }
}
