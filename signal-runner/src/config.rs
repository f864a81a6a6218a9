use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use trading_data_services::QuoteConfig;
use trading_strategy::{LlmConfig, SignalRunConfig};

/// Resolved runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub openai_api_key: String,
    pub llm: LlmConfig,
    pub quotes: QuoteConfig,
    pub symbols: Vec<String>,
    pub allowed_symbols: Vec<String>,
    pub timeframe: String,
    pub notes: String,
    pub prompt_names: Vec<String>,
    pub prompts_dir: PathBuf,
    pub runs_dir: PathBuf,
    pub market_data_path: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let run = SignalRunConfig::default();
        Self {
            openai_api_key: String::new(),
            llm: LlmConfig::default(),
            quotes: QuoteConfig::default(),
            allowed_symbols: run.symbols.clone(),
            symbols: run.symbols,
            timeframe: run.timeframe,
            notes: run.notes,
            prompt_names: trading_strategy::strategy::DEFAULT_PROMPT_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            prompts_dir: PathBuf::from("prompts"),
            runs_dir: PathBuf::from("runs"),
            market_data_path: None,
        }
    }
}

/// Load the optional market-data blob.
///
/// The blob is optional prompt context: a missing, unreadable or invalid file
/// is logged and treated as absent.
pub fn load_market_data(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    if !path.exists() {
        tracing::warn!(
            "Could not load market data: {} not found. Continuing without it.",
            path.display()
        );
        return None;
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Could not read market data {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(value) => {
            tracing::info!("Loaded market data from {}", path.display());
            Some(value)
        }
        Err(e) => {
            tracing::warn!("Ignoring invalid market data {}: {}", path.display(), e);
            None
        }
    }
}

/// Fail early on settings no run can succeed without
pub fn check_required(config: &RunnerConfig) -> Result<()> {
    if config.openai_api_key.trim().is_empty() {
        bail!("OPENAI_API_KEY is not set");
    }
    if config.prompt_names.is_empty() {
        bail!("No prompt names configured");
    }
    if !config.prompts_dir.is_dir() {
        bail!("Prompts directory not found: {}", config.prompts_dir.display());
    }
    std::fs::create_dir_all(&config.runs_dir)
        .with_context(|| format!("Failed to create runs directory {}", config.runs_dir.display()))?;
    Ok(())
}
