use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use guessr_core::model::{CatalogSnapshot, CategoryEntry, CategoryId, ItemId};

use super::ItemCatalog;

/// Fixed catalog for tests and offline play.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    categories: BTreeMap<CategoryId, Vec<ItemId>>,
    names: HashMap<ItemId, String>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_category(mut self, category: u32, ids: impl IntoIterator<Item = u32>) -> Self {
        let mut ids: Vec<ItemId> = ids.into_iter().map(ItemId::new).collect();
        ids.sort();
        self.categories.insert(CategoryId::new(category), ids);
        self
    }

    #[must_use]
    pub fn with_name(mut self, id: u32, name: impl Into<String>) -> Self {
        self.names.insert(ItemId::new(id), name.into());
        self
    }

    /// Snapshot of every category this catalog knows, in category order.
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot::new(
            self.categories
                .iter()
                .map(|(category, ids)| CategoryEntry {
                    category: *category,
                    ids: ids.clone(),
                })
                .collect(),
        )
    }
}

#[async_trait]
impl ItemCatalog for InMemoryCatalog {
    async fn ids_for_category(&self, category: CategoryId) -> Vec<ItemId> {
        self.categories.get(&category).cloned().unwrap_or_default()
    }

    async fn canonical_name(&self, id: ItemId) -> Option<String> {
        self.names.get(&id).cloned()
    }

    async fn category_of(&self, id: ItemId) -> Option<CategoryId> {
        self.categories
            .iter()
            .find(|(_, ids)| ids.contains(&id))
            .map(|(category, _)| *category)
    }
}
