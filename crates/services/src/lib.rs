#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod error;
pub mod sessions;
pub mod settings_service;
pub mod stats_service;

pub use guessr_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use error::{
    AppServicesError, CatalogError, ReadinessError, SessionError, SettingsServiceError,
    StatsError,
};
pub use settings_service::SessionSettingsService;
pub use stats_service::StatsService;

pub use sessions::{
    ActiveSession, Generation, ItemPool, Question, ReadinessConfig, ReadinessGate,
    SessionAnswerResult, SessionLoopService, SessionPlanner, SessionQueue, SessionRunner, Step,
};
