use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use guessr_core::model::{ItemId, Mode, SessionConfig, StatsSnapshot};

/// Queue selection result for a session build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub items: Vec<ItemId>,
    /// How many of `items` were picked because they are weak (revision only).
    pub weak_selected: usize,
}

impl SessionPlan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Picks the items of one session according to the configured mode.
pub struct SessionPlanner<'a> {
    config: &'a SessionConfig,
    stats: &'a StatsSnapshot,
}

impl<'a> SessionPlanner<'a> {
    #[must_use]
    pub fn new(config: &'a SessionConfig, stats: &'a StatsSnapshot) -> Self {
        Self { config, stats }
    }

    /// Build the plan from `pool`.
    ///
    /// - normal and progressive: uniform shuffle, first `target_count`.
    /// - revision: shuffled weak items first, topped up from the shuffled remainder.
    ///
    /// The result always has `min(target_count, pool.len())` distinct items when the
    /// pool holds no duplicates.
    pub fn build<R: Rng + ?Sized>(&self, pool: &[ItemId], rng: &mut R) -> SessionPlan {
        let target = usize::try_from(self.config.target_count()).unwrap_or(usize::MAX);
        match self.config.mode() {
            Mode::Normal | Mode::Progressive => SessionPlan {
                items: sample(pool.to_vec(), target, rng),
                weak_selected: 0,
            },
            Mode::Revision => self.build_revision(pool, target, rng),
        }
    }

    fn build_revision<R: Rng + ?Sized>(
        &self,
        pool: &[ItemId],
        target: usize,
        rng: &mut R,
    ) -> SessionPlan {
        let (weak, rest): (Vec<ItemId>, Vec<ItemId>) = pool
            .iter()
            .copied()
            .partition(|id| self.stats.get(*id).is_some_and(|stat| stat.is_weak()));

        let mut items = sample(weak, target, rng);
        let weak_selected = items.len();

        let remaining = target.saturating_sub(items.len());
        if remaining > 0 {
            let selected: HashSet<ItemId> = items.iter().copied().collect();
            let complement: Vec<ItemId> = rest
                .into_iter()
                .filter(|id| !selected.contains(id))
                .collect();
            items.extend(sample(complement, remaining, rng));
        }

        SessionPlan {
            items,
            weak_selected,
        }
    }
}

fn sample<R: Rng + ?Sized>(mut ids: Vec<ItemId>, take: usize, rng: &mut R) -> Vec<ItemId> {
    ids.shuffle(rng);
    ids.truncate(take);
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use guessr_core::model::{AttemptOutcome, CategoryId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pool(range: std::ops::RangeInclusive<u32>) -> Vec<ItemId> {
        range.map(ItemId::new).collect()
    }

    fn config(target: u32, mode: Mode) -> SessionConfig {
        SessionConfig::new([1], target, 1, mode).unwrap()
    }

    fn weak_stats(ids: impl IntoIterator<Item = u32>) -> StatsSnapshot {
        let mut stats = StatsSnapshot::new();
        for id in ids {
            stats.record(ItemId::new(id), Some(CategoryId::new(1)), AttemptOutcome::Failure);
        }
        stats
    }

    fn assert_distinct_subset(items: &[ItemId], pool: &[ItemId]) {
        let unique: HashSet<_> = items.iter().collect();
        assert_eq!(unique.len(), items.len());
        assert!(items.iter().all(|id| pool.contains(id)));
    }

    #[test]
    fn normal_takes_target_count() {
        let pool = pool(1..=50);
        let stats = StatsSnapshot::new();
        let config = config(20, Mode::Normal);
        let mut rng = StdRng::seed_from_u64(7);

        let plan = SessionPlanner::new(&config, &stats).build(&pool, &mut rng);
        assert_eq!(plan.len(), 20);
        assert_distinct_subset(&plan.items, &pool);
    }

    #[test]
    fn normal_with_small_pool_takes_everything() {
        let pool = pool(1..=10);
        let stats = StatsSnapshot::new();
        let config = config(20, Mode::Normal);
        let mut rng = StdRng::seed_from_u64(1);

        let plan = SessionPlanner::new(&config, &stats).build(&pool, &mut rng);
        assert_eq!(plan.len(), 10);
        assert_distinct_subset(&plan.items, &pool);
    }

    #[test]
    fn empty_pool_yields_empty_plan() {
        let stats = StatsSnapshot::new();
        for mode in Mode::ALL {
            let config = config(10, mode);
            let mut rng = StdRng::seed_from_u64(3);
            assert!(SessionPlanner::new(&config, &stats).build(&[], &mut rng).is_empty());
        }
    }

    #[test]
    fn revision_with_enough_weak_items_only_picks_weak_ones() {
        let pool = pool(1..=40);
        let stats = weak_stats(1..=15);
        let config = config(10, Mode::Revision);
        let mut rng = StdRng::seed_from_u64(11);

        let plan = SessionPlanner::new(&config, &stats).build(&pool, &mut rng);
        assert_eq!(plan.len(), 10);
        assert_eq!(plan.weak_selected, 10);
        assert!(plan.items.iter().all(|id| stats.get(*id).is_some_and(|s| s.is_weak())));
    }

    #[test]
    fn revision_tops_up_with_remaining_pool() {
        let pool = pool(1..=40);
        let mut stats = weak_stats([3, 9]);
        // Strong item: never weak even though attempted.
        stats.record(ItemId::new(5), Some(CategoryId::new(1)), AttemptOutcome::Success);
        let config = config(10, Mode::Revision);
        let mut rng = StdRng::seed_from_u64(5);

        let plan = SessionPlanner::new(&config, &stats).build(&pool, &mut rng);
        assert_eq!(plan.len(), 10);
        assert_eq!(plan.weak_selected, 2);
        assert!(plan.items.contains(&ItemId::new(3)));
        assert!(plan.items.contains(&ItemId::new(9)));
        assert_distinct_subset(&plan.items, &pool);
    }

    #[test]
    fn revision_is_capped_by_pool_size() {
        let pool = pool(1..=4);
        let stats = weak_stats([2]);
        let config = config(10, Mode::Revision);
        let mut rng = StdRng::seed_from_u64(9);

        let plan = SessionPlanner::new(&config, &stats).build(&pool, &mut rng);
        assert_eq!(plan.len(), 4);
        assert_distinct_subset(&plan.items, &pool);
    }

    #[test]
    fn progressive_samples_like_normal() {
        let pool = pool(1..=30);
        let stats = StatsSnapshot::new();
        let normal = config(10, Mode::Normal);
        let progressive = config(10, Mode::Progressive);

        let a = SessionPlanner::new(&normal, &stats).build(&pool, &mut StdRng::seed_from_u64(42));
        let b = SessionPlanner::new(&progressive, &stats)
            .build(&pool, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
