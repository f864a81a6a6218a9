mod config;
mod persistence;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trading_data_services::{QuoteConfig, TwelveDataClient};
use trading_strategy::{
    strategy::select_symbols, LlmClient, LlmConfig, PromptSpec, SignalRequester, SignalRun,
    SignalRunConfig,
};

use config::{check_required, load_market_data, RunnerConfig};
use persistence::JsonRunWriter;

#[derive(Parser)]
#[command(name = "signal-runner")]
#[command(about = "Generate validated FX trading signals from prompt templates")]
struct Cli {
    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
    openai_api_key: String,

    /// Chat model used for structured signals
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// TwelveData API key; prices are skipped when unset
    #[arg(long, env = "TWELVEDATA_API_KEY", hide_env_values = true)]
    twelvedata_api_key: Option<String>,

    /// Symbols to study, comma separated
    #[arg(long, env = "STUDY_SYMBOLS", value_delimiter = ',', default_value = "EURUSD,AUDJPY")]
    symbols: Vec<String>,

    /// Symbols a run may use, comma separated
    #[arg(
        long,
        env = "STUDY_ALLOWED_SYMBOLS",
        value_delimiter = ',',
        default_value = "EURUSD,AUDJPY"
    )]
    allowed_symbols: Vec<String>,

    /// Chart timeframe passed to the prompts
    #[arg(long, env = "STUDY_TIMEFRAME", default_value = "5m")]
    timeframe: String,

    /// Free-form notes passed to the prompts
    #[arg(long, env = "STUDY_NOTES", default_value = "")]
    notes: String,

    /// Optional JSON file exposed to prompts as {MARKET_DATA_JSON}
    #[arg(long, env = "MARKET_DATA_JSON_PATH")]
    market_data_json_path: Option<PathBuf>,

    /// Directory holding <name>.txt prompt templates
    #[arg(long, env = "PROMPTS_DIR", default_value = "prompts")]
    prompts_dir: PathBuf,

    /// Prompt names to run, comma separated
    #[arg(long, value_delimiter = ',', default_value = "prompt1,prompt2,prompt3,prompt4")]
    prompts: Vec<String>,

    /// Output directory for run records
    #[arg(long, env = "RUNS_DIR", default_value = "runs")]
    runs_dir: PathBuf,

    /// Per-call model timeout in seconds
    #[arg(long, env = "LLM_TIMEOUT_SECONDS", default_value = "60")]
    llm_timeout_seconds: u64,

    /// Attempts per (symbol, prompt) request
    #[arg(long, env = "LLM_MAX_RETRIES", default_value = "5")]
    llm_max_retries: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> RunnerConfig {
        RunnerConfig {
            openai_api_key: self.openai_api_key,
            llm: LlmConfig {
                model: self.model,
                timeout_seconds: self.llm_timeout_seconds,
                max_retries: self.llm_max_retries,
                ..Default::default()
            },
            quotes: QuoteConfig {
                api_key: self.twelvedata_api_key.filter(|key| !key.trim().is_empty()),
                ..Default::default()
            },
            symbols: self.symbols,
            allowed_symbols: self.allowed_symbols,
            timeframe: self.timeframe,
            notes: self.notes,
            prompt_names: self.prompts,
            prompts_dir: self.prompts_dir,
            runs_dir: self.runs_dir,
            market_data_path: self.market_data_json_path,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "signal_runner={},trading_strategy={},trading_data_services={}",
                cli.log_level, cli.log_level, cli.log_level
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cli.into_config();
    check_required(&config)?;

    let symbols = select_symbols(&config.symbols, &config.allowed_symbols);

    tracing::info!("Signal runner starting");
    tracing::info!("Configuration:");
    tracing::info!("  Model: {}", config.llm.model);
    tracing::info!("  Symbols: {}", symbols.join(", "));
    tracing::info!("  Timeframe: {}", config.timeframe);
    tracing::info!("  Prompts: {}", config.prompt_names.join(", "));
    tracing::info!("  Runs dir: {}", config.runs_dir.display());

    let prompts = PromptSpec::load_all(&config.prompts_dir, &config.prompt_names)?;
    let market_data = load_market_data(config.market_data_path.as_deref());

    if config.quotes.api_key.is_none() {
        tracing::warn!("TWELVEDATA_API_KEY not set. Entry prices will not be validated.");
    }
    let quotes = TwelveDataClient::new(config.quotes.clone())
        .context("Failed to build quote client")?;
    let llm = LlmClient::new(config.llm.clone(), config.openai_api_key.clone())
        .context("Failed to build LLM client")?;
    let policy = llm.retry_policy();
    let requester = SignalRequester::new(llm, policy);

    let run = SignalRun::new(
        SignalRunConfig {
            symbols,
            timeframe: config.timeframe.clone(),
            notes: config.notes.clone(),
            market_data,
        },
        prompts,
        quotes,
        requester,
    );

    let now = Utc::now();
    let mut writer = JsonRunWriter::new(&config.runs_dir, now)?;
    let report = run.run(now, &mut writer).await?;
    let all_path = writer.write_all(&report.records)?;

    tracing::info!(
        "Run complete: {} records, {} files in {} (combined: {})",
        report.records.len(),
        writer.written().len(),
        writer.dir().display(),
        all_path.display()
    );

    Ok(())
}
