use crate::types::TimestampSecs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current market price fetched once per symbol per run.
///
/// Never persisted on its own; the price is folded into
/// `SignalRecord::current_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePrice {
    pub price: f64,
    pub source: String,
    pub observed_at: Option<TimestampSecs>,
}

impl ReferencePrice {
    pub fn new(price: f64, source: impl Into<String>, observed_at: Option<TimestampSecs>) -> Self {
        Self {
            price,
            source: source.into(),
            observed_at,
        }
    }

    /// Observation time as "YYYY-MM-DD HH:MM:SS UTC", if known
    pub fn observed_at_display(&self) -> Option<String> {
        self.observed_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observed_at_display() {
        let price = ReferencePrice::new(1.1, "TwelveData", Some(1_700_000_000));
        assert_eq!(
            price.observed_at_display().as_deref(),
            Some("2023-11-14 22:13:20 UTC")
        );
    }

    #[test]
    fn test_observed_at_missing() {
        let price = ReferencePrice::new(1.1, "TwelveData", None);
        assert!(price.observed_at_display().is_none());
    }
}
