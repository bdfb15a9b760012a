use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use guessr_core::model::{ItemId, SessionConfig};
use storage::repository::{CatalogSnapshotRepository, SnapshotState};

use super::pool::ItemPool;
use crate::catalog::{CatalogSignal, InitState};
use crate::error::ReadinessError;

/// Settings generation counter. Bumped on every settings change; work started
/// for an older value is discarded.
#[derive(Clone, Debug, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Start a new generation and return it.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Poll cadence while the catalog snapshot is missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadinessConfig {
    pub poll_interval: Duration,
    pub max_interval: Duration,
    pub backoff_factor: u32,
    pub max_polls: u32,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(300),
            max_interval: Duration::from_secs(5),
            backoff_factor: 2,
            max_polls: 200,
        }
    }
}

/// Result of a single readiness evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// No snapshot persisted yet.
    Loading,
    /// Non-empty item pool for the requested categories.
    Ready(Vec<ItemId>),
}

/// Gates session start on the catalog snapshot being persisted.
#[derive(Clone)]
pub struct ReadinessGate {
    snapshots: Arc<dyn CatalogSnapshotRepository>,
    signal: CatalogSignal,
    generation: Generation,
    config: ReadinessConfig,
}

impl ReadinessGate {
    #[must_use]
    pub fn new(
        snapshots: Arc<dyn CatalogSnapshotRepository>,
        signal: CatalogSignal,
        generation: Generation,
    ) -> Self {
        Self {
            snapshots,
            signal,
            generation,
            config: ReadinessConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ReadinessConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// Evaluate readiness once for `generation`.
    ///
    /// # Errors
    ///
    /// - `Stale` if `generation` is no longer current.
    /// - `InvalidSnapshot` if the persisted snapshot does not decode.
    /// - `EmptyPool` if the selected categories have no items.
    /// - `Storage` if the snapshot cannot be read.
    pub async fn check(
        &self,
        config: &SessionConfig,
        generation: u64,
    ) -> Result<Readiness, ReadinessError> {
        if !self.generation.is_current(generation) {
            return Err(ReadinessError::Stale);
        }
        let snapshot = match self.snapshots.load_snapshot().await? {
            SnapshotState::Absent => return Ok(Readiness::Loading),
            SnapshotState::Invalid(reason) => return Err(ReadinessError::InvalidSnapshot(reason)),
            SnapshotState::Valid(snapshot) => snapshot,
        };
        let pool = ItemPool::build(config.categories(), &snapshot);
        if pool.is_empty() {
            return Err(ReadinessError::EmptyPool);
        }
        Ok(Readiness::Ready(pool))
    }

    /// Wait until the pool for `config` is available.
    ///
    /// Re-checks whenever the catalog signal fires or the poll tick elapses. The tick
    /// backs off from `poll_interval` up to `max_interval`.
    ///
    /// # Errors
    ///
    /// Everything [`ReadinessGate::check`] returns, `CatalogUnavailable` as soon as
    /// the initializer reports failure while no snapshot exists, and `TimedOut`
    /// after `max_polls` evaluations that found no snapshot.
    pub async fn wait(
        &self,
        config: &SessionConfig,
        generation: u64,
    ) -> Result<Vec<ItemId>, ReadinessError> {
        let mut signal = self.signal.subscribe();
        let mut interval = self.config.poll_interval;
        let mut polls = 0_u32;

        loop {
            polls += 1;
            if let Readiness::Ready(pool) = self.check(config, generation).await? {
                info!(generation, items = pool.len(), polls, "catalog ready");
                return Ok(pool);
            }
            if let InitState::Failed(reason) = &*signal.borrow_and_update() {
                return Err(ReadinessError::CatalogUnavailable(reason.clone()));
            }
            if polls >= self.config.max_polls {
                return Err(ReadinessError::TimedOut { polls });
            }

            debug!(generation, polls, wait_ms = interval.as_millis(), "catalog not ready");
            tokio::select! {
                _ = signal.changed() => {}
                () = tokio::time::sleep(interval) => {
                    interval = interval
                        .saturating_mul(self.config.backoff_factor)
                        .min(self.config.max_interval);
                }
            }
        }
    }
}
