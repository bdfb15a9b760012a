use thiserror::Error;

use crate::model::{
    CatalogSettingsError, ItemStatError, ParseIdError, SessionConfigError, SessionSummaryError,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    ItemStat(#[from] ItemStatError),
    #[error(transparent)]
    SessionConfig(#[from] SessionConfigError),
    #[error(transparent)]
    SessionSummary(#[from] SessionSummaryError),
    #[error(transparent)]
    CatalogSettings(#[from] CatalogSettingsError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
}
