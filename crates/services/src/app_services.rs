use std::sync::Arc;

use guessr_core::model::{CatalogSettings, CatalogSnapshot};
use storage::repository::{SnapshotState, Storage};

use crate::Clock;
use crate::catalog::{CatalogInitializer, CatalogSignal, ItemCatalog, PokeApiCatalog};
use crate::error::AppServicesError;
use crate::sessions::{Generation, ReadinessConfig, ReadinessGate, SessionLoopService};
use crate::settings_service::SessionSettingsService;
use crate::stats_service::StatsService;

/// Assembles app-facing services over one storage backend and one catalog.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    initializer: Arc<CatalogInitializer>,
    stats: Arc<StatsService>,
    settings: Arc<SessionSettingsService>,
    session_loop: Arc<SessionLoopService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the PokeAPI catalog.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        catalog: CatalogSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::assemble(
            storage,
            Arc::new(PokeApiCatalog::new(catalog)),
            clock,
            ReadinessConfig::default(),
        ))
    }

    /// Wire every service around `storage` and `catalog`.
    #[must_use]
    pub fn assemble(
        storage: Storage,
        catalog: Arc<dyn ItemCatalog>,
        clock: Clock,
        readiness: ReadinessConfig,
    ) -> Self {
        let signal = CatalogSignal::new();
        let generation = Generation::new();

        let initializer = Arc::new(CatalogInitializer::new(
            Arc::clone(&catalog),
            Arc::clone(&storage.catalog),
            signal.clone(),
        ));
        let stats = StatsService::new(Arc::clone(&storage.stats));
        let settings = Arc::new(SessionSettingsService::new(
            Arc::clone(&storage.settings),
            generation.clone(),
        ));
        let gate = ReadinessGate::new(Arc::clone(&storage.catalog), signal, generation)
            .with_config(readiness);
        let session_loop = Arc::new(SessionLoopService::new(clock, catalog, stats.clone(), gate));

        Self {
            storage,
            initializer,
            stats: Arc::new(stats),
            settings,
            session_loop,
        }
    }

    /// Plan every session from `seed`, for reproducible runs.
    #[must_use]
    pub fn with_session_seed(mut self, seed: u64) -> Self {
        self.session_loop = Arc::new((*self.session_loop).clone().with_seed(seed));
        self
    }

    /// Start the catalog initializer in the background.
    ///
    /// Failures are logged by the initializer and fail pending readiness waits.
    pub fn spawn_catalog_init(&self) -> tokio::task::JoinHandle<()> {
        let initializer = Arc::clone(&self.initializer);
        tokio::spawn(async move {
            // The outcome is already recorded on the catalog signal.
            let _ = initializer.ensure_snapshot().await;
        })
    }

    /// Persisted catalog snapshot, if one is present and valid.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the snapshot cannot be read.
    pub async fn catalog_snapshot(&self) -> Result<Option<CatalogSnapshot>, AppServicesError> {
        Ok(match self.storage.catalog.load_snapshot().await? {
            SnapshotState::Valid(snapshot) => Some(snapshot),
            SnapshotState::Absent | SnapshotState::Invalid(_) => None,
        })
    }

    #[must_use]
    pub fn initializer(&self) -> Arc<CatalogInitializer> {
        Arc::clone(&self.initializer)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SessionSettingsService> {
        Arc::clone(&self.settings)
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }
}
