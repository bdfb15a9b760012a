//! Wire shapes of the persisted records and the strict decode step for each.
//!
//! Every shape check lives here; repositories only move strings around.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use guessr_core::model::{
    CatalogSnapshot, CategoryEntry, CategoryId, ItemId, ItemStat, Mode, SessionConfig,
    SessionConfigDraft, StatsSnapshot,
};

pub const CATALOG_SNAPSHOT_KEY: &str = "catalog-snapshot";
pub const USER_STATS_KEY: &str = "user_stats";
pub const SETTINGS_CATEGORIES_KEY: &str = "session.categories";
pub const SETTINGS_TARGET_COUNT_KEY: &str = "session.target_count";
pub const SETTINGS_MAX_ATTEMPTS_KEY: &str = "session.max_attempts";
pub const SETTINGS_MODE_KEY: &str = "session.mode";

/// Shape or parse failure of one persisted record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("malformed {record}: {reason}")]
    Malformed { record: &'static str, reason: String },
}

impl DecodeError {
    fn malformed(record: &'static str, reason: impl ToString) -> Self {
        Self::Malformed {
            record,
            reason: reason.to_string(),
        }
    }
}

//
// ─── USER STATS ────────────────────────────────────────────────────────────────
//

/// `user_stats` document. The `pokemons` field name is kept for compatibility
/// with data written by earlier versions.
#[derive(Debug, Serialize, Deserialize)]
struct StatsDocument {
    pokemons: Vec<ItemStatRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ItemStatRecord {
    id: ItemId,
    #[serde(default, alias = "category")]
    generation: Option<CategoryId>,
    attempts: u32,
    #[serde(alias = "successes")]
    success: u32,
    #[serde(alias = "failures")]
    error: u32,
    #[serde(alias = "passes")]
    pass: u32,
}

impl ItemStatRecord {
    fn from_stat(stat: &ItemStat) -> Self {
        Self {
            id: stat.id(),
            generation: stat.category(),
            attempts: stat.attempts(),
            success: stat.successes(),
            error: stat.failures(),
            pass: stat.passes(),
        }
    }
}

/// Decode `user_stats`. Records with inconsistent counters are dropped; for
/// duplicate ids the first record wins.
///
/// # Errors
///
/// Returns `DecodeError` when the document itself does not have the expected shape.
pub fn decode_stats(raw: &str) -> Result<StatsSnapshot, DecodeError> {
    let document: StatsDocument =
        serde_json::from_str(raw).map_err(|err| DecodeError::malformed(USER_STATS_KEY, err))?;

    let mut stats = Vec::with_capacity(document.pokemons.len());
    for record in document.pokemons {
        match ItemStat::from_persisted(
            record.id,
            record.generation,
            record.attempts,
            record.success,
            record.error,
            record.pass,
        ) {
            Ok(stat) => stats.push(stat),
            Err(err) => warn!(item_id = %record.id, error = %err, "dropping inconsistent stat record"),
        }
    }

    let (snapshot, duplicates) = StatsSnapshot::from_records(stats);
    if duplicates > 0 {
        warn!(duplicates, "skipped duplicate stat records");
    }
    Ok(snapshot)
}

/// # Errors
///
/// Returns `serde_json::Error` if serialization fails.
pub fn encode_stats(stats: &StatsSnapshot) -> Result<String, serde_json::Error> {
    let document = StatsDocument {
        pokemons: stats.iter().map(ItemStatRecord::from_stat).collect(),
    };
    serde_json::to_string(&document)
}

//
// ─── CATALOG SNAPSHOT ──────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(alias = "pokemon")]
    entries: Vec<CatalogEntryRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogEntryRecord {
    #[serde(alias = "generation")]
    category: CategoryId,
    ids: Vec<ItemId>,
}

/// Decode `catalog-snapshot`, also accepting the legacy `{ pokemon: [{ generation, ids }] }` shape.
///
/// # Errors
///
/// Returns `DecodeError` when the document does not have the expected shape.
pub fn decode_catalog(raw: &str) -> Result<CatalogSnapshot, DecodeError> {
    let document: CatalogDocument = serde_json::from_str(raw)
        .map_err(|err| DecodeError::malformed(CATALOG_SNAPSHOT_KEY, err))?;
    let entries = document
        .entries
        .into_iter()
        .map(|entry| CategoryEntry {
            category: entry.category,
            ids: entry.ids,
        })
        .collect();
    Ok(CatalogSnapshot::new(entries))
}

/// # Errors
///
/// Returns `serde_json::Error` if serialization fails.
pub fn encode_catalog(snapshot: &CatalogSnapshot) -> Result<String, serde_json::Error> {
    let document = CatalogDocument {
        entries: snapshot
            .entries()
            .iter()
            .map(|entry| CatalogEntryRecord {
                category: entry.category,
                ids: entry.ids.clone(),
            })
            .collect(),
    };
    serde_json::to_string(&document)
}

//
// ─── SESSION SETTINGS ──────────────────────────────────────────────────────────
//

/// The independently keyed settings scalars, as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSettings {
    pub categories: Option<String>,
    pub target_count: Option<String>,
    pub max_attempts: Option<String>,
    pub mode: Option<String>,
}

/// Decode settings scalar by scalar; each missing or invalid one takes its default.
#[must_use]
pub fn decode_settings(raw: &RawSettings) -> SessionConfig {
    let defaults = SessionConfig::default();

    let categories = raw
        .categories
        .as_deref()
        .and_then(|value| decoded_or_warn(SETTINGS_CATEGORIES_KEY, decode_categories(value)))
        .unwrap_or_else(|| defaults.to_draft().categories);
    let target_count = raw
        .target_count
        .as_deref()
        .and_then(|value| {
            decoded_or_warn(
                SETTINGS_TARGET_COUNT_KEY,
                decode_positive(SETTINGS_TARGET_COUNT_KEY, value),
            )
        })
        .unwrap_or(defaults.target_count());
    let max_attempts_per_item = raw
        .max_attempts
        .as_deref()
        .and_then(|value| {
            decoded_or_warn(
                SETTINGS_MAX_ATTEMPTS_KEY,
                decode_positive(SETTINGS_MAX_ATTEMPTS_KEY, value),
            )
        })
        .unwrap_or(defaults.max_attempts_per_item());
    let mode = raw
        .mode
        .as_deref()
        .and_then(|value| {
            decoded_or_warn(
                SETTINGS_MODE_KEY,
                value
                    .parse::<Mode>()
                    .map_err(|err| DecodeError::malformed(SETTINGS_MODE_KEY, err)),
            )
        })
        .unwrap_or(defaults.mode());

    SessionConfigDraft {
        categories,
        target_count,
        max_attempts_per_item,
        mode,
    }
    .validate()
    .unwrap_or(defaults)
}

/// Encode a config into its scalars.
///
/// # Errors
///
/// Returns `serde_json::Error` if the category list cannot be serialized.
pub fn encode_settings(config: &SessionConfig) -> Result<RawSettings, serde_json::Error> {
    let categories: Vec<u32> = config.categories().iter().map(CategoryId::value).collect();
    Ok(RawSettings {
        categories: Some(serde_json::to_string(&categories)?),
        target_count: Some(config.target_count().to_string()),
        max_attempts: Some(config.max_attempts_per_item().to_string()),
        mode: Some(config.mode().as_str().to_owned()),
    })
}

fn decode_categories(raw: &str) -> Result<Vec<u32>, DecodeError> {
    let categories: Vec<u32> = serde_json::from_str(raw)
        .map_err(|err| DecodeError::malformed(SETTINGS_CATEGORIES_KEY, err))?;
    // Same range rules as a validated config.
    SessionConfig::new(categories.iter().copied(), 1, 1, Mode::Normal)
        .map_err(|err| DecodeError::malformed(SETTINGS_CATEGORIES_KEY, err))?;
    Ok(categories)
}

fn decode_positive(record: &'static str, raw: &str) -> Result<u32, DecodeError> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(DecodeError::malformed(record, "must be > 0")),
        Ok(value) => Ok(value),
        Err(err) => Err(DecodeError::malformed(record, err)),
    }
}

fn decoded_or_warn<T>(key: &'static str, decoded: Result<T, DecodeError>) -> Option<T> {
    match decoded {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "falling back to default setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guessr_core::model::AttemptOutcome;

    #[test]
    fn decodes_legacy_stats_shape() {
        let raw = r#"{"pokemons":[
            {"id":25,"generation":1,"attempts":3,"success":1,"error":1,"pass":1},
            {"id":152,"generation":null,"attempts":1,"success":0,"error":1,"pass":0}
        ]}"#;
        let stats = decode_stats(raw).unwrap();
        let pikachu = stats.get(ItemId::new(25)).unwrap();
        assert_eq!(pikachu.category(), Some(CategoryId::new(1)));
        assert_eq!(pikachu.passes(), 1);
        assert_eq!(stats.get(ItemId::new(152)).unwrap().category(), None);
    }

    #[test]
    fn drops_records_with_mismatched_counters() {
        let raw = r#"{"pokemons":[
            {"id":1,"generation":1,"attempts":9,"success":1,"error":0,"pass":0},
            {"id":2,"generation":1,"attempts":1,"success":1,"error":0,"pass":0}
        ]}"#;
        let stats = decode_stats(raw).unwrap();
        assert_eq!(stats.len(), 1);
        assert!(stats.get(ItemId::new(1)).is_none());
    }

    #[test]
    fn rejects_stats_without_expected_shape() {
        assert!(decode_stats("not json").is_err());
        assert!(decode_stats(r#"{"items":[]}"#).is_err());
        assert!(decode_stats(r#"{"pokemons":{}}"#).is_err());
    }

    #[test]
    fn encoded_stats_use_compatible_field_names() {
        let mut stats = StatsSnapshot::new();
        stats.record(ItemId::new(4), Some(CategoryId::new(1)), AttemptOutcome::Success);
        let raw = encode_stats(&stats).unwrap();
        assert_eq!(
            raw,
            r#"{"pokemons":[{"id":4,"generation":1,"attempts":1,"success":1,"error":0,"pass":0}]}"#
        );
        assert_eq!(decode_stats(&raw).unwrap(), stats);
    }

    #[test]
    fn decodes_current_and_legacy_catalog_shapes() {
        let current = decode_catalog(r#"{"entries":[{"category":1,"ids":[1,2]}]}"#).unwrap();
        let legacy = decode_catalog(r#"{"pokemon":[{"generation":1,"ids":[1,2]}]}"#).unwrap();
        assert_eq!(current, legacy);
        assert_eq!(
            current.ids_for(CategoryId::new(1)),
            &[ItemId::new(1), ItemId::new(2)]
        );
    }

    #[test]
    fn rejects_catalog_missing_entries() {
        assert!(decode_catalog(r#"{"foo":1}"#).is_err());
        assert!(decode_catalog(r#"{"entries":[{"category":1}]}"#).is_err());
    }

    #[test]
    fn settings_fall_back_field_by_field() {
        let raw = RawSettings {
            categories: Some("[2,3]".into()),
            target_count: Some("zero".into()),
            max_attempts: Some("3".into()),
            mode: Some("chaos".into()),
        };
        let config = decode_settings(&raw);
        let cats: Vec<u32> = config.categories().iter().map(CategoryId::value).collect();
        assert_eq!(cats, vec![2, 3]);
        assert_eq!(config.target_count(), 20);
        assert_eq!(config.max_attempts_per_item(), 3);
        assert_eq!(config.mode(), Mode::Normal);
    }

    #[test]
    fn out_of_range_categories_fall_back_to_all() {
        let raw = RawSettings {
            categories: Some("[0, 12]".into()),
            ..RawSettings::default()
        };
        assert_eq!(decode_settings(&raw), SessionConfig::default());
    }

    #[test]
    fn settings_scalars_round_trip() {
        let config = SessionConfig::new([1, 4], 30, 2, Mode::Progressive).unwrap();
        let raw = encode_settings(&config).unwrap();
        assert_eq!(raw.categories.as_deref(), Some("[1,4]"));
        assert_eq!(decode_settings(&raw), config);
    }
}
