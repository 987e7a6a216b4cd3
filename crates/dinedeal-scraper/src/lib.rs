pub mod client;
pub mod error;
pub mod normalize;
pub mod providers;
pub mod throttle;

pub use client::{host_of, PageClient};
pub use error::ScraperError;
pub use normalize::{extract_offer_texts, looks_like_offer, normalize_offer_text};
pub use providers::{parser_for, ProviderParser};
pub use throttle::{DomainThrottle, HostPermit};
