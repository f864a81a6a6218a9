pub mod quotes;

// Re-export commonly used items
pub use quotes::{
    normalize_symbol, PriceError, PriceProvider, QuoteConfig, TwelveDataClient,
};
