use thiserror::Error;

use crate::llm::retry::ErrorCategory;

/// Failures while requesting a structured signal from the model
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response violates contract: {0}")]
    ContractViolation(String),

    #[error("Model request timed out after {0}s")]
    Timeout(u64),

    #[error("Model API error: {0}")]
    Api(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Model call failed after {attempts} attempts. Last error: {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: String },
}

impl ErrorCategory for SignalError {
    fn category(&self) -> &'static str {
        match self {
            SignalError::EmptyResponse => "empty_response",
            SignalError::MalformedResponse(_) => "malformed_response",
            SignalError::ContractViolation(_) => "contract_violation",
            SignalError::Timeout(_) => "timeout",
            SignalError::Api(_) => "api_error",
            SignalError::Config(_) => "config",
            SignalError::ExhaustedRetries { .. } => "exhausted_retries",
        }
    }
}

impl From<serde_json::Error> for SignalError {
    fn from(err: serde_json::Error) -> Self {
        SignalError::MalformedResponse(err.to_string())
    }
}

impl From<async_openai::error::OpenAIError> for SignalError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        SignalError::Api(err.to_string())
    }
}
