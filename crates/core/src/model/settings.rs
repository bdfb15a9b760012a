use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::ids::CategoryId;

/// Lowest selectable category.
pub const MIN_CATEGORY: u32 = 1;
/// Highest selectable category.
pub const MAX_CATEGORY: u32 = 9;
/// Target counts offered by the settings picker.
pub const TARGET_COUNT_OPTIONS: [u32; 6] = [10, 20, 30, 40, 50, 100];
pub const DEFAULT_TARGET_COUNT: u32 = 20;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionConfigError {
    #[error("at least one category must be selected")]
    NoCategories,

    #[error("category {0} is out of range ({MIN_CATEGORY}..={MAX_CATEGORY})")]
    CategoryOutOfRange(u32),

    #[error("target count must be > 0")]
    InvalidTargetCount,

    #[error("max attempts per item must be >= 1")]
    InvalidMaxAttempts,

    #[error("unknown mode: {0}")]
    UnknownMode(String),
}

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// Item selection and requeue policy of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Uniform sample of the pool, one pass.
    #[default]
    Normal,
    /// Weak items first, topped up from the rest of the pool.
    Revision,
    /// Uniform sample; missed items are pushed a few slots forward instead of dropped.
    Progressive,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Normal, Mode::Revision, Mode::Progressive];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Revision => "revision",
            Mode::Progressive => "progressive",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = SessionConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Mode::Normal),
            "revision" => Ok(Mode::Revision),
            "progressive" => Ok(Mode::Progressive),
            other => Err(SessionConfigError::UnknownMode(other.to_owned())),
        }
    }
}

//
// ─── SESSION CONFIG ────────────────────────────────────────────────────────────
//

/// Settings that shape one session. Immutable while the session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    categories: BTreeSet<CategoryId>,
    target_count: u32,
    max_attempts_per_item: u32,
    mode: Mode,
}

/// Unvalidated settings as typed by the user or read from storage.
#[derive(Debug, Clone, Default)]
pub struct SessionConfigDraft {
    pub categories: Vec<u32>,
    pub target_count: u32,
    pub max_attempts_per_item: u32,
    pub mode: Mode,
}

impl SessionConfigDraft {
    /// Validate and normalize the draft. Duplicate categories collapse.
    ///
    /// # Errors
    ///
    /// Returns `SessionConfigError` if any field is out of range.
    pub fn validate(self) -> Result<SessionConfig, SessionConfigError> {
        if self.categories.is_empty() {
            return Err(SessionConfigError::NoCategories);
        }
        let mut categories = BTreeSet::new();
        for raw in self.categories {
            if !(MIN_CATEGORY..=MAX_CATEGORY).contains(&raw) {
                return Err(SessionConfigError::CategoryOutOfRange(raw));
            }
            categories.insert(CategoryId::new(raw));
        }
        if self.target_count == 0 {
            return Err(SessionConfigError::InvalidTargetCount);
        }
        if self.max_attempts_per_item == 0 {
            return Err(SessionConfigError::InvalidMaxAttempts);
        }

        Ok(SessionConfig {
            categories,
            target_count: self.target_count,
            max_attempts_per_item: self.max_attempts_per_item,
            mode: self.mode,
        })
    }
}

impl SessionConfig {
    /// Every selectable category.
    #[must_use]
    pub fn default_categories() -> BTreeSet<CategoryId> {
        (MIN_CATEGORY..=MAX_CATEGORY).map(CategoryId::new).collect()
    }

    /// Build a config directly.
    ///
    /// # Errors
    ///
    /// Returns `SessionConfigError` if validation fails.
    pub fn new(
        categories: impl IntoIterator<Item = u32>,
        target_count: u32,
        max_attempts_per_item: u32,
        mode: Mode,
    ) -> Result<Self, SessionConfigError> {
        SessionConfigDraft {
            categories: categories.into_iter().collect(),
            target_count,
            max_attempts_per_item,
            mode,
        }
        .validate()
    }

    /// Ascending category order.
    #[must_use]
    pub fn categories(&self) -> &BTreeSet<CategoryId> {
        &self.categories
    }

    #[must_use]
    pub fn target_count(&self) -> u32 {
        self.target_count
    }

    #[must_use]
    pub fn max_attempts_per_item(&self) -> u32 {
        self.max_attempts_per_item
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Draft pre-filled with this config, for editing.
    #[must_use]
    pub fn to_draft(&self) -> SessionConfigDraft {
        SessionConfigDraft {
            categories: self.categories.iter().map(CategoryId::value).collect(),
            target_count: self.target_count,
            max_attempts_per_item: self.max_attempts_per_item,
            mode: self.mode,
        }
    }
}

/// Every category, 20 items, a single try per item, normal mode.
impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            categories: Self::default_categories(),
            target_count: DEFAULT_TARGET_COUNT,
            max_attempts_per_item: DEFAULT_MAX_ATTEMPTS,
            mode: Mode::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selects_every_category() {
        let config = SessionConfig::default();
        assert_eq!(config.categories().len(), 9);
        assert_eq!(config.target_count(), DEFAULT_TARGET_COUNT);
        assert_eq!(config.max_attempts_per_item(), 1);
        assert_eq!(config.mode(), Mode::Normal);
        assert!(TARGET_COUNT_OPTIONS.contains(&config.target_count()));
    }

    #[test]
    fn validate_sorts_and_dedups_categories() {
        let config = SessionConfig::new([3, 1, 3], 10, 2, Mode::Revision).unwrap();
        let cats: Vec<u32> = config.categories().iter().map(CategoryId::value).collect();
        assert_eq!(cats, vec![1, 3]);
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert_eq!(
            SessionConfig::new([], 10, 1, Mode::Normal).unwrap_err(),
            SessionConfigError::NoCategories
        );
        assert_eq!(
            SessionConfig::new([10], 10, 1, Mode::Normal).unwrap_err(),
            SessionConfigError::CategoryOutOfRange(10)
        );
        assert_eq!(
            SessionConfig::new([1], 0, 1, Mode::Normal).unwrap_err(),
            SessionConfigError::InvalidTargetCount
        );
        assert_eq!(
            SessionConfig::new([1], 5, 0, Mode::Normal).unwrap_err(),
            SessionConfigError::InvalidMaxAttempts
        );
    }

    #[test]
    fn mode_round_trips_through_text() {
        for mode in Mode::ALL {
            assert_eq!(mode.as_str().parse::<Mode>().unwrap(), mode);
        }
        assert_eq!(" Progressive ".parse::<Mode>().unwrap(), Mode::Progressive);
        assert!(matches!(
            "hard".parse::<Mode>(),
            Err(SessionConfigError::UnknownMode(_))
        ));
    }
}
