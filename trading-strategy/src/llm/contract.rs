use serde_json::Value;
use trading_core::SignalRecord;

use super::schema::{signal_schema, MAX_TARGETS, SIGNAL_SCHEMA_NAME};
use crate::error::SignalError;

/// Shape a generated response must satisfy before it is accepted.
///
/// The schema is sent to the backend as a hint; `check` is the local
/// enforcement and turns raw text into a typed value.
pub trait ResponseContract: Send + Sync {
    type Output;

    fn schema_name(&self) -> &str;

    fn schema(&self) -> Value;

    fn check(&self, raw: &str) -> Result<Self::Output, SignalError>;
}

/// Contract for `SignalRecord` answers
#[derive(Debug, Clone, Default)]
pub struct SignalContract;

impl ResponseContract for SignalContract {
    type Output = SignalRecord;

    fn schema_name(&self) -> &str {
        SIGNAL_SCHEMA_NAME
    }

    fn schema(&self) -> Value {
        signal_schema()
    }

    fn check(&self, raw: &str) -> Result<SignalRecord, SignalError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SignalError::EmptyResponse);
        }

        let mut record: SignalRecord = serde_json::from_str(raw)?;

        if !record.confidence.is_finite() || !(0.0..=1.0).contains(&record.confidence) {
            return Err(SignalError::ContractViolation(format!(
                "confidence {} outside [0, 1]",
                record.confidence
            )));
        }
        if record.targets.len() > MAX_TARGETS {
            return Err(SignalError::ContractViolation(format!(
                "{} targets, at most {} allowed",
                record.targets.len(),
                MAX_TARGETS
            )));
        }
        let non_finite = record
            .entry
            .iter()
            .chain(record.stop.iter())
            .chain(record.targets.iter())
            .find(|p| !p.is_finite())
            .copied();
        if let Some(bad) = non_finite {
            return Err(SignalError::ContractViolation(format!("non-finite price {}", bad)));
        }

        // Set only by entry validation
        record.validation = None;
        record.original_signal = None;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trading_core::Signal;

    fn payload() -> Value {
        json!({
            "symbol": "EURUSD",
            "timeframe": "5m",
            "timestamp_utc": "2025-01-01T10:00:00+00:00",
            "signal": "BUY",
            "confidence": 0.65,
            "entry": 1.1010,
            "stop": 1.0990,
            "targets": [1.1040, 1.1060],
            "rationale": "Higher lows on 5m",
            "invalidation": "Break below 1.0990",
            "prompt_name": "whatever",
            "raw_notes": "",
            "current_price": 1.5,
            "entry_distance_pips": 3.0
        })
    }

    #[test]
    fn test_accepts_valid_payload() {
        let record = SignalContract.check(&payload().to_string()).unwrap();
        assert_eq!(record.signal, Signal::Buy);
        assert_eq!(record.entry, Some(1.1010));
        assert_eq!(record.targets, vec![1.1040, 1.1060]);
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(SignalContract.check("  \n"), Err(SignalError::EmptyResponse)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = SignalContract.check("{\"signal\": \"BUY\"").unwrap_err();
        assert!(matches!(err, SignalError::MalformedResponse(_)));
    }

    #[test]
    fn test_rejects_unknown_signal() {
        let mut value = payload();
        value["signal"] = json!("LONG");
        let err = SignalContract.check(&value.to_string()).unwrap_err();
        assert!(matches!(err, SignalError::MalformedResponse(_)));
    }

    #[test]
    fn test_rejects_confidence_out_of_range() {
        let mut value = payload();
        value["confidence"] = json!(1.2);
        let err = SignalContract.check(&value.to_string()).unwrap_err();
        assert!(matches!(err, SignalError::ContractViolation(_)));
    }

    #[test]
    fn test_rejects_too_many_targets() {
        let mut value = payload();
        value["targets"] = json!([1.0, 1.1, 1.2, 1.3, 1.4, 1.5]);
        let err = SignalContract.check(&value.to_string()).unwrap_err();
        assert!(matches!(err, SignalError::ContractViolation(_)));
    }

    #[test]
    fn test_strips_model_supplied_validation() {
        let mut value = payload();
        value["original_signal"] = json!("SELL");
        let record = SignalContract.check(&value.to_string()).unwrap();
        assert!(record.original_signal.is_none());
    }
}
