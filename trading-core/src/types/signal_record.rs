use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional recommendation produced by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub const ALL: [Signal; 3] = [Signal::Buy, Signal::Sell, Signal::Hold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }

    pub fn is_directional(&self) -> bool {
        !matches!(self, Signal::Hold)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which validation rule decided the outcome of an entry check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// Entry checked (or nothing to check) and accepted
    Valid,
    /// No reference price, distance check skipped
    Unchecked,
    OverriddenNullEntry,
    OverriddenTooFar,
    OverriddenNonPositive,
}

impl ValidationOutcome {
    pub fn is_override(&self) -> bool {
        matches!(
            self,
            ValidationOutcome::OverriddenNullEntry
                | ValidationOutcome::OverriddenTooFar
                | ValidationOutcome::OverriddenNonPositive
        )
    }
}

/// Result of checking a record's entry price against the reference price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub outcome: ValidationOutcome,
    pub original_signal: Signal,
    pub final_signal: Signal,
    pub violation_reason: Option<String>,
    pub entry_distance_pips: Option<f64>,
    pub current_price: Option<f64>,
    pub warnings: Vec<String>,
}

/// One structured signal per (symbol, prompt).
///
/// Field names and enum spellings are the persisted contract consumed by the
/// reporting layer. The model produces every field except `validation` and
/// `original_signal`; `current_price` and `entry_distance_pips` are always
/// recomputed after the model answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    // ═══════════════════════════════════════════════════
    // IDENTIFICATION
    // ═══════════════════════════════════════════════════
    pub symbol: String,
    pub timeframe: String,
    pub timestamp_utc: String,

    // ═══════════════════════════════════════════════════
    // TRADE PLAN
    // ═══════════════════════════════════════════════════
    pub signal: Signal,
    pub confidence: f64,
    pub entry: Option<f64>,
    pub stop: Option<f64>,
    pub targets: Vec<f64>, // at most 5, in order
    pub rationale: String,
    pub invalidation: String,

    // ═══════════════════════════════════════════════════
    // CONTEXT
    // ═══════════════════════════════════════════════════
    pub prompt_name: String,
    pub raw_notes: String,
    pub current_price: Option<f64>,
    pub entry_distance_pips: Option<f64>,

    // ═══════════════════════════════════════════════════
    // VALIDATION (attached after the model call)
    // ═══════════════════════════════════════════════════
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_signal: Option<Signal>,
}

impl SignalRecord {
    /// Create a HOLD record with empty trade plan
    pub fn hold(symbol: impl Into<String>, timeframe: impl Into<String>, timestamp_utc: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
            timestamp_utc: timestamp_utc.into(),
            signal: Signal::Hold,
            confidence: 0.0,
            entry: None,
            stop: None,
            targets: Vec::new(),
            rationale: String::new(),
            invalidation: String::new(),
            prompt_name: String::new(),
            raw_notes: String::new(),
            current_price: None,
            entry_distance_pips: None,
            validation: None,
            original_signal: None,
        }
    }

    /// Attach a validation result, consuming the record.
    ///
    /// An invalid result forces `signal` to the validator's final signal and
    /// keeps the model's answer in `original_signal`.
    pub fn with_validation(mut self, validation: ValidationResult) -> Self {
        self.entry_distance_pips = validation.entry_distance_pips;
        if !validation.valid {
            self.original_signal = Some(validation.original_signal);
            self.signal = validation.final_signal;
        }
        self.validation = Some(validation);
        self
    }

    pub fn was_overridden(&self) -> bool {
        self.validation
            .as_ref()
            .map(|v| v.original_signal != v.final_signal)
            .unwrap_or(false)
    }
}
