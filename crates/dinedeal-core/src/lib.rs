pub mod app_config;
pub mod config;
pub mod offers;
pub mod places;
pub mod providers;
pub mod records;
pub mod runs;
pub mod store;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use offers::{hash_offers, Offer, OfferMode, OfferSource, OfferType, OFFER_CURRENCY};
pub use places::{Place, PlatformEntry};
pub use providers::{ProviderConfig, ProviderKey, DEFAULT_PROVIDERS};
pub use records::{
    parse_timestamp_utc, ParseResult, ProviderRecord, ProviderRecordUpdate, ScrapeStatus,
};
pub use runs::{RunStatus, RunSummary, RunTally, StatusCounts};
pub use store::{HostBlock, OfferStore, StoreError};

#[cfg(any(test, feature = "test-util"))]
pub use store::memory::MemoryStore;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown provider key: {0}")]
    UnknownProvider(String),

    #[error("unknown scrape status: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("could not load credentials file {path}: {reason}")]
    CredentialsFile { path: String, reason: String },
}
