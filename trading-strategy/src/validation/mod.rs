/// Deterministic checks applied to model output before it is persisted
pub mod entry_validator;

pub use entry_validator::EntryValidator;
