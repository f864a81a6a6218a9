pub mod error;
pub mod llm;
pub mod strategy;
pub mod validation;

pub use error::SignalError;

// Re-export commonly used items from llm module
pub use llm::{
    render_prompt, GenerationRequest, LlmClient, LlmConfig, LlmPromptFormatter, LlmProvider,
    LlmResponse, PromptVariables, RequestContext, RetryPolicy, SignalContract, SignalGenerator,
    SignalRequester,
};

// Re-export commonly used items from strategy module
pub use strategy::{PromptSpec, RecordSink, RunReport, RunSummary, SignalRun, SignalRunConfig};
pub use validation::EntryValidator;
