use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::ids::{CategoryId, ItemId};

/// Success ratio strictly below which an attempted item counts as weak.
pub const WEAK_SUCCESS_RATIO: f64 = 0.5;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemStatError {
    #[error("attempts ({attempts}) does not match outcome counts ({sum})")]
    CountMismatch { attempts: u32, sum: u32 },
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Terminal result of one attempt against an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptOutcome {
    Success,
    Failure,
    Pass,
}

//
// ─── ITEM STAT ─────────────────────────────────────────────────────────────────
//

/// Lifetime performance record for a single item.
///
/// `attempts == successes + failures + passes` holds for every value of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStat {
    id: ItemId,
    category: Option<CategoryId>,
    attempts: u32,
    successes: u32,
    failures: u32,
    passes: u32,
}

impl ItemStat {
    /// A record with every counter at zero.
    #[must_use]
    pub fn new(id: ItemId, category: Option<CategoryId>) -> Self {
        Self {
            id,
            category,
            attempts: 0,
            successes: 0,
            failures: 0,
            passes: 0,
        }
    }

    /// Rehydrate a record from persisted counters.
    ///
    /// # Errors
    ///
    /// Returns `ItemStatError::CountMismatch` when the counters do not add up.
    pub fn from_persisted(
        id: ItemId,
        category: Option<CategoryId>,
        attempts: u32,
        successes: u32,
        failures: u32,
        passes: u32,
    ) -> Result<Self, ItemStatError> {
        let sum = successes
            .saturating_add(failures)
            .saturating_add(passes);
        if sum != attempts {
            return Err(ItemStatError::CountMismatch { attempts, sum });
        }
        Ok(Self {
            id,
            category,
            attempts,
            successes,
            failures,
            passes,
        })
    }

    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[must_use]
    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn successes(&self) -> u32 {
        self.successes
    }

    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    #[must_use]
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Share of attempts that were successes, `None` before the first attempt.
    #[must_use]
    pub fn success_ratio(&self) -> Option<f64> {
        if self.attempts == 0 {
            None
        } else {
            Some(f64::from(self.successes) / f64::from(self.attempts))
        }
    }

    /// Attempted at least once and answered correctly less than half the time.
    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.success_ratio()
            .is_some_and(|ratio| ratio < WEAK_SUCCESS_RATIO)
    }

    /// Apply one attempt. A known category is never replaced by `None`.
    pub fn record(&mut self, category: Option<CategoryId>, outcome: AttemptOutcome) {
        if category.is_some() {
            self.category = category;
        }
        self.attempts = self.attempts.saturating_add(1);
        match outcome {
            AttemptOutcome::Success => self.successes = self.successes.saturating_add(1),
            AttemptOutcome::Failure => self.failures = self.failures.saturating_add(1),
            AttemptOutcome::Pass => self.passes = self.passes.saturating_add(1),
        }
    }
}

//
// ─── STATS SNAPSHOT ────────────────────────────────────────────────────────────
//

/// Full collection of item records, keyed by item id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    items: BTreeMap<ItemId, ItemStat>,
}

impl StatsSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from records, keeping the first record seen for each id.
    ///
    /// Returns the snapshot and the number of duplicates that were skipped.
    pub fn from_records(records: impl IntoIterator<Item = ItemStat>) -> (Self, usize) {
        let mut items = BTreeMap::new();
        let mut duplicates = 0;
        for record in records {
            if items.contains_key(&record.id) {
                duplicates += 1;
                continue;
            }
            items.insert(record.id, record);
        }
        (Self { items }, duplicates)
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&ItemStat> {
        self.items.get(&id)
    }

    /// Create-or-update the record for `id` and return it.
    pub fn record(
        &mut self,
        id: ItemId,
        category: Option<CategoryId>,
        outcome: AttemptOutcome,
    ) -> &ItemStat {
        let entry = self
            .items
            .entry(id)
            .or_insert_with(|| ItemStat::new(id, category));
        entry.record(category, outcome);
        entry
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemStat> {
        self.items.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
