pub mod reference_price;
pub mod signal_record;

// Re-export common types
pub use reference_price::ReferencePrice;
pub use signal_record::{Signal, SignalRecord, ValidationOutcome, ValidationResult};

/// Timestamp in seconds since Unix epoch
pub type TimestampSecs = i64;
