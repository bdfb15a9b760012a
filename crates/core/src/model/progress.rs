use crate::model::catalog::CatalogSnapshot;
use crate::model::ids::{CategoryId, ItemId};
use crate::model::item_stat::StatsSnapshot;

/// Lifetime record of one catalog item, zeroed when it was never attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemProgress {
    pub id: ItemId,
    pub attempts: u32,
    pub successes: u32,
    /// `round(successes / attempts * 100)`, 0 before the first attempt.
    pub success_percent: u32,
}

/// How much of one category the user has tried and found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryProgress {
    pub category: CategoryId,
    pub total: usize,
    pub tested: usize,
    pub found: usize,
    pub percent: u32,
    /// Every catalog item of the category, ascending by id.
    pub items: Vec<ItemProgress>,
}

impl CategoryProgress {
    /// Aggregate stats for `category`. Stats are matched on their recorded category.
    #[must_use]
    pub fn compute(
        category: CategoryId,
        catalog: &CatalogSnapshot,
        stats: &StatsSnapshot,
    ) -> Self {
        let mut ids = catalog.ids_for(category).to_vec();
        ids.sort_unstable();

        let in_category = stats
            .iter()
            .filter(|stat| stat.category() == Some(category));
        let (tested, found) = in_category.fold((0, 0), |(tested, found), stat| {
            (
                tested + usize::from(stat.attempts() > 0),
                found + usize::from(stat.successes() > 0),
            )
        });

        let items = ids
            .into_iter()
            .map(|id| {
                let (attempts, successes) = stats
                    .get(id)
                    .map_or((0, 0), |stat| (stat.attempts(), stat.successes()));
                ItemProgress {
                    id,
                    attempts,
                    successes,
                    success_percent: rounded_percent(
                        u64::from(successes),
                        u64::from(attempts),
                    ),
                }
            })
            .collect::<Vec<_>>();

        let total = items.len();
        Self {
            category,
            total,
            tested,
            found,
            percent: rounded_percent(found as u64, total as u64),
            items,
        }
    }
}

/// Progress for each category in order.
#[must_use]
pub fn overview(
    categories: impl IntoIterator<Item = CategoryId>,
    catalog: &CatalogSnapshot,
    stats: &StatsSnapshot,
) -> Vec<CategoryProgress> {
    categories
        .into_iter()
        .map(|category| CategoryProgress::compute(category, catalog, stats))
        .collect()
}

fn rounded_percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    let scaled = (part * 200 + whole) / (whole * 2);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::CategoryEntry;
    use crate::model::item_stat::AttemptOutcome;

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::new(vec![
            CategoryEntry {
                category: CategoryId::new(1),
                ids: vec![ItemId::new(3), ItemId::new(1), ItemId::new(2)],
            },
            CategoryEntry {
                category: CategoryId::new(2),
                ids: Vec::new(),
            },
        ])
    }

    #[test]
    fn counts_tested_and_found_per_category() {
        let gen1 = Some(CategoryId::new(1));
        let mut stats = StatsSnapshot::new();
        stats.record(ItemId::new(1), gen1, AttemptOutcome::Success);
        stats.record(ItemId::new(2), gen1, AttemptOutcome::Failure);
        stats.record(ItemId::new(2), gen1, AttemptOutcome::Failure);
        stats.record(ItemId::new(2), gen1, AttemptOutcome::Success);

        let progress = CategoryProgress::compute(CategoryId::new(1), &catalog(), &stats);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.tested, 2);
        assert_eq!(progress.found, 2);
        assert_eq!(progress.percent, 67);

        let ids: Vec<u32> = progress.items.iter().map(|item| item.id.value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(progress.items[1].success_percent, 33);
        assert_eq!(progress.items[2].attempts, 0);
        assert_eq!(progress.items[2].success_percent, 0);
    }

    #[test]
    fn empty_category_reports_zero_percent() {
        let progress =
            CategoryProgress::compute(CategoryId::new(2), &catalog(), &StatsSnapshot::new());
        assert_eq!(progress.total, 0);
        assert_eq!(progress.percent, 0);
    }

    #[test]
    fn rounding_matches_half_up() {
        assert_eq!(rounded_percent(1, 2), 50);
        assert_eq!(rounded_percent(1, 8), 13);
        assert_eq!(rounded_percent(2, 3), 67);
        assert_eq!(rounded_percent(0, 0), 0);
    }
}
