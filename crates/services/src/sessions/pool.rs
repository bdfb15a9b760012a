use std::collections::BTreeSet;

use guessr_core::model::{CatalogSnapshot, CategoryId, ItemId};

/// Candidate ids for a session, derived from the selected categories.
pub struct ItemPool;

impl ItemPool {
    /// Concatenate, in category order, the ids the snapshot lists for each category.
    ///
    /// Empty when the snapshot has nothing for any selected category.
    #[must_use]
    pub fn build(categories: &BTreeSet<CategoryId>, snapshot: &CatalogSnapshot) -> Vec<ItemId> {
        categories
            .iter()
            .flat_map(|category| snapshot.ids_for(*category).iter().copied())
            .collect()
    }
}
