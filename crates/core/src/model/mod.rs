mod catalog;
mod ids;
mod item_stat;
pub mod progress;
pub mod session;
mod settings;
mod streak;

pub use catalog::{
    CatalogSettings, CatalogSettingsDraft, CatalogSettingsError, CatalogSnapshot, CategoryEntry,
    DEFAULT_CATALOG_BASE_URL, DEFAULT_CATALOG_LANGUAGE,
};
pub use ids::{CategoryId, ItemId, ParseIdError, SessionId};
pub use item_stat::{AttemptOutcome, ItemStat, ItemStatError, StatsSnapshot, WEAK_SUCCESS_RATIO};
pub use progress::{CategoryProgress, ItemProgress};
pub use session::{AnswerResult, RecapRow, SessionScore, SessionSummary, SessionSummaryError};
pub use settings::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_TARGET_COUNT, MAX_CATEGORY, MIN_CATEGORY, Mode, SessionConfig,
    SessionConfigDraft, SessionConfigError, TARGET_COUNT_OPTIONS,
};
pub use streak::{StreakChange, StreakTracker};
