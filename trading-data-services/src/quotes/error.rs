use thiserror::Error;

/// Reasons a quote request did not yield a usable price
#[derive(Error, Debug)]
pub enum PriceError {
    #[error("quote API key not configured")]
    MissingApiKey,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("quote API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no price field in response")]
    MissingPrice,

    #[error("price is not a finite number: {0}")]
    InvalidPrice(String),
}

impl PriceError {
    /// Short label used when logging the failure
    pub fn category(&self) -> &'static str {
        match self {
            PriceError::MissingApiKey => "missing_api_key",
            PriceError::Transport(_) => "transport",
            PriceError::HttpStatus(_) => "http_status",
            PriceError::Api { .. } => "api_error",
            PriceError::Decode(_) => "decode",
            PriceError::MissingPrice => "missing_price",
            PriceError::InvalidPrice(_) => "invalid_price",
        }
    }
}
