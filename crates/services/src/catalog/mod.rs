//! Item catalog collaborator: where ids, names and categories come from.

mod initializer;
mod memory;
mod pokeapi;

use async_trait::async_trait;

use guessr_core::model::{CategoryId, ItemId};

pub use initializer::{CatalogInitializer, CatalogSignal, InitOutcome, InitState};
pub use memory::InMemoryCatalog;
pub use pokeapi::PokeApiCatalog;

/// Source of item ids per category and per-item metadata.
///
/// Lookups never fail loudly: an unavailable answer is an empty list or `None`.
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    /// Ids belonging to `category`, ascending.
    async fn ids_for_category(&self, category: CategoryId) -> Vec<ItemId>;

    /// Display name used as the expected answer.
    async fn canonical_name(&self, id: ItemId) -> Option<String>;

    async fn category_of(&self, id: ItemId) -> Option<CategoryId>;
}
