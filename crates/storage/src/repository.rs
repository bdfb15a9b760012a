use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::warn;

use guessr_core::model::{CatalogSnapshot, SessionConfig, StatsSnapshot};

use crate::records::{
    self, CATALOG_SNAPSHOT_KEY, RawSettings, SETTINGS_CATEGORIES_KEY, SETTINGS_MAX_ATTEMPTS_KEY,
    SETTINGS_MODE_KEY, SETTINGS_TARGET_COUNT_KEY, USER_STATS_KEY,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

//
// ─── KEY/VALUE BACKEND ─────────────────────────────────────────────────────────
//

/// Opaque string store every record is persisted through.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

//
// ─── TYPED REPOSITORIES ────────────────────────────────────────────────────────
//

/// Outcome of reading the catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotState {
    /// Nothing persisted yet; the initializer has not finished.
    Absent,
    /// Persisted, but not in the expected shape.
    Invalid(String),
    Valid(CatalogSnapshot),
}

#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Load every stat record. Unparseable data reads as an empty collection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails.
    async fn load_stats(&self) -> Result<StatsSnapshot, StorageError>;

    /// Replace the whole persisted collection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be stored.
    async fn save_stats(&self, stats: &StatsSnapshot) -> Result<(), StorageError>;
}

#[async_trait]
pub trait CatalogSnapshotRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails.
    async fn load_snapshot(&self) -> Result<SnapshotState, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_snapshot(&self, snapshot: &CatalogSnapshot) -> Result<(), StorageError>;

    /// Forget the snapshot so the next start re-fetches the catalog.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear_snapshot(&self) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Load session settings; missing or invalid scalars take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails.
    async fn load_settings(&self) -> Result<SessionConfig, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if any scalar cannot be stored.
    async fn save_settings(&self, config: &SessionConfig) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> StatsRepository for T {
    async fn load_stats(&self) -> Result<StatsSnapshot, StorageError> {
        let Some(raw) = self.get(USER_STATS_KEY).await? else {
            return Ok(StatsSnapshot::new());
        };
        Ok(records::decode_stats(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "user stats unreadable, starting from empty");
            StatsSnapshot::new()
        }))
    }

    async fn save_stats(&self, stats: &StatsSnapshot) -> Result<(), StorageError> {
        let raw = records::encode_stats(stats)?;
        self.put(USER_STATS_KEY, &raw).await
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> CatalogSnapshotRepository for T {
    async fn load_snapshot(&self) -> Result<SnapshotState, StorageError> {
        let Some(raw) = self.get(CATALOG_SNAPSHOT_KEY).await? else {
            return Ok(SnapshotState::Absent);
        };
        Ok(match records::decode_catalog(&raw) {
            Ok(snapshot) => SnapshotState::Valid(snapshot),
            Err(err) => SnapshotState::Invalid(err.to_string()),
        })
    }

    async fn save_snapshot(&self, snapshot: &CatalogSnapshot) -> Result<(), StorageError> {
        let raw = records::encode_catalog(snapshot)?;
        self.put(CATALOG_SNAPSHOT_KEY, &raw).await
    }

    async fn clear_snapshot(&self) -> Result<(), StorageError> {
        self.remove(CATALOG_SNAPSHOT_KEY).await
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> SettingsRepository for T {
    async fn load_settings(&self) -> Result<SessionConfig, StorageError> {
        let raw = RawSettings {
            categories: self.get(SETTINGS_CATEGORIES_KEY).await?,
            target_count: self.get(SETTINGS_TARGET_COUNT_KEY).await?,
            max_attempts: self.get(SETTINGS_MAX_ATTEMPTS_KEY).await?,
            mode: self.get(SETTINGS_MODE_KEY).await?,
        };
        Ok(records::decode_settings(&raw))
    }

    async fn save_settings(&self, config: &SessionConfig) -> Result<(), StorageError> {
        let raw = records::encode_settings(config)?;
        let scalars = [
            (SETTINGS_CATEGORIES_KEY, raw.categories),
            (SETTINGS_TARGET_COUNT_KEY, raw.target_count),
            (SETTINGS_MAX_ATTEMPTS_KEY, raw.max_attempts),
            (SETTINGS_MODE_KEY, raw.mode),
        ];
        for (key, value) in scalars {
            if let Some(value) = value {
                self.put(key, &value).await?;
            }
        }
        Ok(())
    }
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

/// Simple in-memory store for testing and offline prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates the typed repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub stats: Arc<dyn StatsRepository>,
    pub catalog: Arc<dyn CatalogSnapshotRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Storage {
    /// Build a `Storage` whose repositories all share one key/value backend.
    #[must_use]
    pub fn from_store<S: KeyValueStore + 'static>(store: S) -> Self {
        let store = Arc::new(store);
        let stats: Arc<dyn StatsRepository> = store.clone();
        let catalog: Arc<dyn CatalogSnapshotRepository> = store.clone();
        let settings: Arc<dyn SettingsRepository> = store;
        Self {
            stats,
            catalog,
            settings,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(InMemoryRepository::new())
    }
}
