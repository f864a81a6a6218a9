use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;
use trading_core::{Signal, SignalRecord};
use trading_data_services::PriceProvider;

use crate::llm::{
    render_prompt, PromptVariables, RequestContext, SignalGenerator, SignalRequester,
};
use crate::validation::EntryValidator;

/// Prompt names loaded when none are configured
pub const DEFAULT_PROMPT_NAMES: [&str; 4] = ["prompt1", "prompt2", "prompt3", "prompt4"];

/// Symbol used when no requested symbol is allowed
pub const FALLBACK_SYMBOL: &str = "EURUSD";

/// A named prompt template
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub name: String,
    pub template: String,
}

impl PromptSpec {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }

    /// Load `<dir>/<name>.txt`. Missing or blank files are errors.
    pub fn load(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(format!("{}.txt", name));
        if !path.exists() {
            bail!("Prompt file not found: {}", path.display());
        }
        let template = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read prompt file {}", path.display()))?;
        let template = template.trim();
        if template.is_empty() {
            bail!("Prompt file is empty: {}", path.display());
        }
        Ok(Self::new(name, template))
    }

    pub fn load_all(dir: &Path, names: &[String]) -> Result<Vec<Self>> {
        names.iter().map(|name| Self::load(dir, name)).collect()
    }
}

/// Configuration for one signal run
#[derive(Debug, Clone)]
pub struct SignalRunConfig {
    pub symbols: Vec<String>,
    pub timeframe: String,
    pub notes: String,
    /// Optional blob exposed to templates as `{MARKET_DATA_JSON}`
    pub market_data: Option<Value>,
}

impl Default for SignalRunConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["EURUSD".to_string(), "AUDJPY".to_string()],
            timeframe: "5m".to_string(),
            notes: String::new(),
            market_data: None,
        }
    }
}

/// Keep requested symbols that are on the allow-list, in request order
pub fn select_symbols(requested: &[String], allowed: &[String]) -> Vec<String> {
    let (selected, ignored): (Vec<String>, Vec<String>) = requested
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .partition(|s| allowed.contains(s));

    if !ignored.is_empty() {
        tracing::warn!("Ignoring unsupported symbols: {}", ignored.join(", "));
    }

    if selected.is_empty() {
        tracing::warn!("No supported symbols requested, falling back to {}", FALLBACK_SYMBOL);
        return vec![FALLBACK_SYMBOL.to_string()];
    }
    selected
}

/// Run timestamp in the persisted format, e.g. "2025-03-14T09:30:05+00:00"
pub fn utc_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
}

/// Receives each finished record as soon as it is validated.
///
/// `symbol` and `prompt_name` identify the pair being run. They come from the
/// run itself, never from the model's answer.
pub trait RecordSink {
    fn persist(&mut self, symbol: &str, prompt_name: &str, record: &SignalRecord) -> Result<()>;
}

impl RecordSink for Vec<SignalRecord> {
    fn persist(&mut self, _symbol: &str, _prompt_name: &str, record: &SignalRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Aggregate counts over a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
    pub overridden: usize,
    pub symbols_without_price: Vec<String>,
}

impl RunSummary {
    pub fn record(&mut self, record: &SignalRecord) {
        match record.signal {
            Signal::Buy => self.buy += 1,
            Signal::Sell => self.sell += 1,
            Signal::Hold => self.hold += 1,
        }
        if record.was_overridden() {
            self.overridden += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.buy + self.sell + self.hold
    }

    pub fn report(&self) {
        tracing::info!(
            "Run summary: total={}, BUY={}, SELL={}, HOLD={}, overridden={}, without_price={:?}",
            self.total(),
            self.buy,
            self.sell,
            self.hold,
            self.overridden,
            self.symbols_without_price
        );
    }
}

/// Everything a completed run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub timestamp_utc: String,
    pub records: Vec<SignalRecord>,
    pub summary: RunSummary,
}

/// Sequences price lookup, prompt rendering, the model request and entry
/// validation for every (symbol, prompt) pair, one at a time.
///
/// A pair whose model request exhausts its retries aborts the whole run.
pub struct SignalRun<P, G> {
    config: SignalRunConfig,
    prompts: Vec<PromptSpec>,
    price_provider: P,
    requester: SignalRequester<G>,
    validator: EntryValidator,
}

impl<P, G> SignalRun<P, G>
where
    P: PriceProvider,
    G: SignalGenerator,
{
    pub fn new(
        config: SignalRunConfig,
        prompts: Vec<PromptSpec>,
        price_provider: P,
        requester: SignalRequester<G>,
    ) -> Self {
        tracing::info!(
            "Initializing signal run: symbols={:?}, timeframe={}, prompts={}",
            config.symbols,
            config.timeframe,
            prompts.len()
        );

        Self {
            config,
            prompts,
            price_provider,
            requester,
            validator: EntryValidator::default(),
        }
    }

    pub fn with_validator(mut self, validator: EntryValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &SignalRunConfig {
        &self.config
    }

    pub async fn run<S: RecordSink>(&self, now: DateTime<Utc>, sink: &mut S) -> Result<RunReport> {
        let timestamp_utc = utc_timestamp(now);
        let mut records = Vec::with_capacity(self.config.symbols.len() * self.prompts.len());
        let mut summary = RunSummary::default();

        for symbol in &self.config.symbols {
            tracing::info!("Processing symbol: {}", symbol);

            let reference = self.price_provider.fetch(symbol).await;
            if reference.is_none() {
                tracing::warn!(
                    "Could not fetch real-time price for {}. Continuing without validation.",
                    symbol
                );
                summary.symbols_without_price.push(symbol.clone());
            }

            let variables = PromptVariables::for_symbol(
                symbol,
                &self.config.timeframe,
                &timestamp_utc,
                now,
                reference.as_ref(),
                &self.config.notes,
                self.config.market_data.as_ref(),
            );

            for prompt in &self.prompts {
                tracing::info!("Processing {} - {}", symbol, prompt.name);

                let rendered = render_prompt(&prompt.template, &variables);
                let ctx = RequestContext {
                    prompt_name: prompt.name.clone(),
                    symbol: symbol.clone(),
                    timeframe: self.config.timeframe.clone(),
                    timestamp_utc: timestamp_utc.clone(),
                    notes: self.config.notes.clone(),
                    reference: reference.clone(),
                    now,
                };

                let record = self
                    .requester
                    .request(&rendered, &ctx)
                    .await
                    .with_context(|| format!("{} - {} failed", symbol, prompt.name))?;

                let validation =
                    self.validator
                        .validate(&record, reference.as_ref().map(|p| p.price), symbol);

                if !validation.valid {
                    tracing::warn!(
                        "Entry price validation failed for {} - {}: {}",
                        symbol,
                        prompt.name,
                        validation.violation_reason.as_deref().unwrap_or("unknown")
                    );
                    for warning in &validation.warnings {
                        tracing::warn!("  - {}", warning);
                    }
                } else if let Some(pips) = validation.entry_distance_pips {
                    tracing::info!("Entry distance: {:.2} pips", pips);
                }

                let record = record.with_validation(validation);
                sink.persist(symbol, &prompt.name, &record)
                    .with_context(|| format!("Failed to persist {} - {}", symbol, prompt.name))?;

                tracing::info!(
                    "{} - {} completed: signal={}, confidence={:.2}",
                    symbol,
                    prompt.name,
                    record.signal,
                    record.confidence
                );

                summary.record(&record);
                records.push(record);
            }
        }

        summary.report();

        Ok(RunReport {
            timestamp_utc,
            records,
            summary,
        })
    }
}
