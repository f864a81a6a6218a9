/// Run orchestration: symbols × prompts through request and validation
pub mod signal_run;

pub use signal_run::{
    select_symbols, utc_timestamp, PromptSpec, RecordSink, RunReport, RunSummary, SignalRun,
    SignalRunConfig, DEFAULT_PROMPT_NAMES, FALLBACK_SYMBOL,
};
