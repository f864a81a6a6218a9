use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use trading_core::ReferencePrice;

use super::{normalize_symbol, PriceError, PriceProvider};

/// Label stored in `ReferencePrice::source`
pub const TWELVEDATA_SOURCE: &str = "TwelveData";

/// Configuration for the TwelveData quote client
#[derive(Debug, Clone)]
pub struct QuoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twelvedata.com".to_string(),
            api_key: None,
            timeout_seconds: 10,
        }
    }
}

/// Single-shot price lookups against the TwelveData `/price` endpoint
pub struct TwelveDataClient {
    client: Client,
    config: QuoteConfig,
}

impl TwelveDataClient {
    pub fn new(config: QuoteConfig) -> Result<Self, PriceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        tracing::info!(
            "Initializing quote client: base_url={}, timeout={}s, api_key_set={}",
            config.base_url,
            config.timeout_seconds,
            config.api_key.is_some()
        );

        Ok(Self { client, config })
    }

    /// Fetch the current price, surfacing the failure reason
    pub async fn fetch_price(&self, symbol: &str) -> Result<ReferencePrice, PriceError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(PriceError::MissingApiKey)?;

        let quote_symbol = normalize_symbol(symbol);
        let url = format!("{}/price", self.config.base_url.trim_end_matches('/'));

        tracing::debug!("Requesting price for {} ({})", symbol, quote_symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", quote_symbol.as_str()), ("apikey", api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PriceError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let payload: Value = serde_json::from_str(&body)?;

        parse_price_payload(&payload, Utc::now().timestamp())
    }
}

#[async_trait]
impl PriceProvider for TwelveDataClient {
    async fn fetch(&self, symbol: &str) -> Option<ReferencePrice> {
        match self.fetch_price(symbol).await {
            Ok(price) => {
                tracing::info!(
                    "Reference price for {}: {} (source: {})",
                    symbol,
                    price.price,
                    price.source
                );
                Some(price)
            }
            Err(e) => {
                tracing::warn!(
                    "Price unavailable for {} [{}]: {}",
                    symbol,
                    e.category(),
                    e
                );
                None
            }
        }
    }
}

/// Interpret a `/price` response body.
///
/// The service reports failures in-band with a `code` field. The price
/// arrives as a string; an absent `timestamp` falls back to `now`.
pub fn parse_price_payload(payload: &Value, now: i64) -> Result<ReferencePrice, PriceError> {
    if let Some(code) = payload.get("code") {
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        return Err(PriceError::Api {
            code: code.as_i64().unwrap_or_default(),
            message,
        });
    }

    let raw_price = payload.get("price").ok_or(PriceError::MissingPrice)?;
    let price = match raw_price {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|p| p.is_finite())
    .ok_or_else(|| PriceError::InvalidPrice(raw_price.to_string()))?;

    let observed_at = payload
        .get("timestamp")
        .and_then(|ts| match ts {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse::<i64>().ok(),
            _ => None,
        })
        .unwrap_or(now);

    Ok(ReferencePrice::new(price, TWELVEDATA_SOURCE, Some(observed_at)))
}
