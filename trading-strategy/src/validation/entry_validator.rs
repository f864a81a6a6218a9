use trading_core::{
    pip_distance, Signal, SignalRecord, ValidationOutcome, ValidationResult,
    MAX_ENTRY_DISTANCE_PIPS,
};

/// Facts an entry rule is evaluated against
#[derive(Debug, Clone, Copy)]
struct EntryCheck {
    entry: f64,
    reference: f64,
    distance_pips: f64,
    max_distance_pips: f64,
}

/// A rule that fired: forces HOLD and explains why
#[derive(Debug, Clone)]
struct Violation {
    outcome: ValidationOutcome,
    reason: String,
    warning: String,
}

type EntryRule = fn(&EntryCheck) -> Option<Violation>;

/// Rules applied once entry and reference price are both known, in order.
/// Every rule runs; the first violation decides outcome and reason.
const ENTRY_RULES: [EntryRule; 2] = [entry_too_far, entry_non_positive];

fn entry_too_far(check: &EntryCheck) -> Option<Violation> {
    if check.distance_pips <= check.max_distance_pips {
        return None;
    }
    Some(Violation {
        outcome: ValidationOutcome::OverriddenTooFar,
        reason: format!(
            "Entry price ({}) is {:.2} pips away from current price ({}), exceeding {} pip limit",
            check.entry, check.distance_pips, check.reference, check.max_distance_pips
        ),
        warning: format!(
            "Entry too far from current price: {:.2} pips (max {})",
            check.distance_pips, check.max_distance_pips
        ),
    })
}

fn entry_non_positive(check: &EntryCheck) -> Option<Violation> {
    if check.entry > 0.0 {
        return None;
    }
    Some(Violation {
        outcome: ValidationOutcome::OverriddenNonPositive,
        reason: format!("Entry price ({}) is unrealistic (non-positive)", check.entry),
        warning: "Entry price is non-positive - forcing HOLD".to_string(),
    })
}

/// Checks a model's entry price against the reference price.
///
/// Pure and total: every input yields a `ValidationResult`. Invalid results
/// always carry `final_signal == Hold`; the caller writes that back onto the
/// record.
#[derive(Debug, Clone)]
pub struct EntryValidator {
    max_distance_pips: f64,
}

impl Default for EntryValidator {
    fn default() -> Self {
        Self {
            max_distance_pips: MAX_ENTRY_DISTANCE_PIPS,
        }
    }
}

impl EntryValidator {
    pub fn new(max_distance_pips: f64) -> Self {
        Self { max_distance_pips }
    }

    pub fn validate(
        &self,
        record: &SignalRecord,
        reference_price: Option<f64>,
        symbol: &str,
    ) -> ValidationResult {
        let original = record.signal;
        let mut result = ValidationResult {
            valid: true,
            outcome: ValidationOutcome::Valid,
            original_signal: original,
            final_signal: original,
            violation_reason: None,
            entry_distance_pips: None,
            current_price: reference_price,
            warnings: Vec::new(),
        };

        if original == Signal::Hold {
            return result;
        }

        let Some(reference) = reference_price else {
            result.outcome = ValidationOutcome::Unchecked;
            result
                .warnings
                .push("No current price available for validation".to_string());
            return result;
        };

        let Some(entry) = record.entry else {
            result.valid = false;
            result.outcome = ValidationOutcome::OverriddenNullEntry;
            result.final_signal = Signal::Hold;
            result.violation_reason =
                Some("Entry price is null but signal is not HOLD".to_string());
            result
                .warnings
                .push("Entry price is null - forcing HOLD".to_string());
            return result;
        };

        let distance_pips = pip_distance(entry, reference, symbol);
        result.entry_distance_pips = Some(distance_pips);

        let check = EntryCheck {
            entry,
            reference,
            distance_pips,
            max_distance_pips: self.max_distance_pips,
        };

        for violation in ENTRY_RULES.iter().filter_map(|rule| rule(&check)) {
            if result.valid {
                result.valid = false;
                result.outcome = violation.outcome;
                result.final_signal = Signal::Hold;
                result.violation_reason = Some(violation.reason);
            }
            result.warnings.push(violation.warning);
        }

        result
    }
}
