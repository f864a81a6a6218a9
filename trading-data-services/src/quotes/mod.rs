pub mod error;
pub mod symbol;
pub mod twelvedata;

use async_trait::async_trait;
use trading_core::ReferencePrice;

// Re-export commonly used items
pub use error::PriceError;
pub use symbol::normalize_symbol;
pub use twelvedata::{parse_price_payload, QuoteConfig, TwelveDataClient, TWELVEDATA_SOURCE};

/// Source of the reference price used to validate model entries.
///
/// An unavailable price is an expected outcome, not an error: implementations
/// log the failure and return `None`.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Option<ReferencePrice>;
}
