pub mod contract;
pub mod llm_client;
pub mod metrics;
pub mod prompt_formatter;
pub mod retry;
pub mod schema;
pub mod signal_requester;

// Re-export commonly used items
pub use contract::{ResponseContract, SignalContract};
pub use llm_client::{
    GenerationRequest, LlmClient, LlmConfig, LlmProvider, LlmResponse, SignalGenerator,
};
pub use metrics::{MetricsTimer, RequestMetrics};
pub use prompt_formatter::{render_prompt, LlmPromptFormatter, PromptVariables, PRICE_NOT_AVAILABLE};
pub use retry::{retry_with_backoff, ErrorCategory, RetryExhausted, RetryPolicy, Retried};
pub use schema::{signal_schema, MAX_TARGETS, SIGNAL_SCHEMA_NAME};
pub use signal_requester::{fill_context, RequestContext, SignalRequester};
