use thiserror::Error;
use url::Url;

use crate::model::ids::{CategoryId, ItemId};

pub const DEFAULT_CATALOG_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_CATALOG_LANGUAGE: &str = "fr";

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Ordered item ids of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    pub category: CategoryId,
    pub ids: Vec<ItemId>,
}

/// Materialized category → ids mapping, written once by the catalog initializer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    entries: Vec<CategoryEntry>,
}

impl CatalogSnapshot {
    #[must_use]
    pub fn new(entries: Vec<CategoryEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    /// Ids of the first entry for `category`, empty when the category is unknown.
    #[must_use]
    pub fn ids_for(&self, category: CategoryId) -> &[ItemId] {
        self.entries
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.ids.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//
// ─── CATALOG SETTINGS ──────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogSettingsError {
    #[error("invalid catalog base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("catalog language cannot be empty")]
    EmptyLanguage,
}

/// Where the remote catalog lives and which localized names it should return.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogSettings {
    base_url: Url,
    language: String,
}

#[derive(Clone, Debug, Default)]
pub struct CatalogSettingsDraft {
    pub base_url: Option<String>,
    pub language: Option<String>,
}

impl CatalogSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft, filling blanks with defaults.
    ///
    /// # Errors
    ///
    /// Returns `CatalogSettingsError` if the base URL does not parse.
    pub fn validate(self) -> Result<CatalogSettings, CatalogSettingsError> {
        let raw_url = normalize_optional(self.base_url)
            .unwrap_or_else(|| DEFAULT_CATALOG_BASE_URL.to_owned());
        let base_url =
            Url::parse(&raw_url).map_err(|_| CatalogSettingsError::InvalidBaseUrl(raw_url))?;
        let language = match self.language {
            None => DEFAULT_CATALOG_LANGUAGE.to_owned(),
            Some(lang) => {
                let lang = lang.trim().to_ascii_lowercase();
                if lang.is_empty() {
                    return Err(CatalogSettingsError::EmptyLanguage);
                }
                lang
            }
        };

        Ok(CatalogSettings { base_url, language })
    }
}

impl CatalogSettings {
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// `base_url` joined with `path`, without doubled slashes.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
