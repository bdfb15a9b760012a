use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use guessr_core::model::{CatalogSettings, CategoryId, ItemId};

use super::ItemCatalog;
use crate::error::CatalogError;

/// Name and category of one species, as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SpeciesInfo {
    name: Option<String>,
    category: Option<CategoryId>,
}

/// `ItemCatalog` over the public PokeAPI.
///
/// Species lookups are cached for the lifetime of the value so that the name and
/// category of the current question cost a single request.
pub struct PokeApiCatalog {
    client: Client,
    settings: CatalogSettings,
    species: Mutex<HashMap<ItemId, SpeciesInfo>>,
}

impl PokeApiCatalog {
    #[must_use]
    pub fn new(settings: CatalogSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
            species: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Fetch the species ids of one generation, ascending.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` when the request fails or answers with a non-success status.
    pub async fn fetch_category_ids(
        &self,
        category: CategoryId,
    ) -> Result<Vec<ItemId>, CatalogError> {
        let url = self
            .settings
            .endpoint(&format!("generation/{}/", category.value()));
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus(response.status()));
        }

        let body: GenerationResponse = response.json().await?;
        let mut ids: Vec<ItemId> = body
            .pokemon_species
            .iter()
            .filter_map(|species| id_after(&species.url, "pokemon-species").map(ItemId::new))
            .collect();
        ids.sort();
        ids.dedup();
        debug!(category = category.value(), count = ids.len(), "fetched category ids");
        Ok(ids)
    }

    async fn species(&self, id: ItemId) -> Result<SpeciesInfo, CatalogError> {
        if let Some(info) = self.species.lock().await.get(&id) {
            return Ok(info.clone());
        }

        let url = self
            .settings
            .endpoint(&format!("pokemon-species/{}/", id.value()));
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus(response.status()));
        }

        let body: SpeciesResponse = response.json().await?;
        let language = self.settings.language();
        let info = SpeciesInfo {
            name: body
                .names
                .into_iter()
                .find(|entry| entry.language.name == language)
                .map(|entry| entry.name),
            category: body
                .generation
                .and_then(|generation| id_after(&generation.url, "generation"))
                .map(CategoryId::new),
        };
        self.species.lock().await.insert(id, info.clone());
        Ok(info)
    }
}

#[async_trait]
impl ItemCatalog for PokeApiCatalog {
    async fn ids_for_category(&self, category: CategoryId) -> Vec<ItemId> {
        self.fetch_category_ids(category)
            .await
            .unwrap_or_else(|err| {
                warn!(category = category.value(), error = %err, "category lookup failed");
                Vec::new()
            })
    }

    async fn canonical_name(&self, id: ItemId) -> Option<String> {
        match self.species(id).await {
            Ok(info) => info.name,
            Err(err) => {
                warn!(item = id.value(), error = %err, "name lookup failed");
                None
            }
        }
    }

    async fn category_of(&self, id: ItemId) -> Option<CategoryId> {
        match self.species(id).await {
            Ok(info) => info.category,
            Err(err) => {
                warn!(item = id.value(), error = %err, "category lookup failed");
                None
            }
        }
    }
}

/// Numeric path segment following `segment` in a resource URL such as
/// `https://pokeapi.co/api/v2/pokemon-species/495/`.
fn id_after(url: &str, segment: &str) -> Option<u32> {
    let mut parts = url.trim_end_matches('/').rsplit('/');
    let id = parts.next()?.parse().ok()?;
    (parts.next()? == segment).then_some(id)
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    url: String,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    pokemon_species: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct SpeciesResponse {
    #[serde(default)]
    names: Vec<LocalizedName>,
    generation: Option<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct LocalizedName {
    name: String,
    language: LanguageRef,
}

#[derive(Debug, Deserialize)]
struct LanguageRef {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_after_reads_trailing_segment() {
        assert_eq!(
            id_after("https://pokeapi.co/api/v2/pokemon-species/495/", "pokemon-species"),
            Some(495)
        );
        assert_eq!(
            id_after("https://pokeapi.co/api/v2/generation/5", "generation"),
            Some(5)
        );
        assert_eq!(
            id_after("https://pokeapi.co/api/v2/pokemon/495/", "pokemon-species"),
            None
        );
        assert_eq!(id_after("https://pokeapi.co/api/v2/generation/v/", "generation"), None);
    }

    #[test]
    fn species_payload_decodes_localized_name() {
        let raw = r#"{
            "names": [
                {"name": "Pikachu", "language": {"name": "en", "url": "x"}},
                {"name": "Pikachu-fr", "language": {"name": "fr", "url": "x"}}
            ],
            "generation": {"name": "generation-i", "url": "https://pokeapi.co/api/v2/generation/1/"}
        }"#;
        let body: SpeciesResponse = serde_json::from_str(raw).unwrap();
        let fr = body
            .names
            .iter()
            .find(|entry| entry.language.name == "fr")
            .map(|entry| entry.name.as_str());
        assert_eq!(fr, Some("Pikachu-fr"));
        let generation = body.generation.unwrap();
        assert_eq!(id_after(&generation.url, "generation"), Some(1));
    }

    #[tokio::test]
    async fn unreachable_catalog_degrades_to_empty_answers() {
        let settings = guessr_core::model::CatalogSettingsDraft {
            base_url: Some("http://127.0.0.1:9".into()),
            language: None,
        }
        .validate()
        .unwrap();
        let catalog = PokeApiCatalog::new(settings);
        assert!(catalog.ids_for_category(CategoryId::new(1)).await.is_empty());
        assert_eq!(catalog.canonical_name(ItemId::new(25)).await, None);
        assert_eq!(catalog.category_of(ItemId::new(25)).await, None);
    }
}
