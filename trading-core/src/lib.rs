pub mod pips;
pub mod types;

pub use pips::{pip_distance, pip_size, pip_value, MAX_ENTRY_DISTANCE_PIPS};
pub use types::{
    ReferencePrice, Signal, SignalRecord, ValidationOutcome, ValidationResult,
};
