/// Integration tests for a full signal run
///
/// A fixed price table stands in for the quote service and a scripted backend
/// answers every (symbol, prompt) pair in order.
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use trading_core::{ReferencePrice, Signal, SignalRecord};
use trading_data_services::PriceProvider;
use trading_strategy::{
    GenerationRequest, LlmProvider, LlmResponse, PromptSpec, RecordSink, RetryPolicy,
    SignalError, SignalGenerator, SignalRequester, SignalRun, SignalRunConfig,
};

struct FixedPrices(HashMap<String, f64>);

#[async_trait]
impl PriceProvider for FixedPrices {
    async fn fetch(&self, symbol: &str) -> Option<ReferencePrice> {
        self.0
            .get(symbol)
            .map(|price| ReferencePrice::new(*price, "Fixed", Some(1_741_944_600)))
    }
}

struct ScriptedGenerator {
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl SignalGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse, SignalError> {
        self.prompts.lock().unwrap().push(request.user.clone());
        let raw_response = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(SignalError::EmptyResponse)?;

        Ok(LlmResponse {
            raw_response,
            model: "scripted".to_string(),
            tokens_used: None,
            provider: LlmProvider::OpenAI,
        })
    }
}

fn answer(signal: &str, entry: Option<f64>) -> String {
    answer_as("", signal, entry)
}

fn answer_as(symbol: &str, signal: &str, entry: Option<f64>) -> String {
    json!({
        "symbol": symbol,
        "timeframe": "",
        "timestamp_utc": "",
        "signal": signal,
        "confidence": 0.6,
        "entry": entry,
        "stop": null,
        "targets": [],
        "rationale": "scripted",
        "invalidation": "scripted",
        "prompt_name": "",
        "raw_notes": "",
        "current_price": null,
        "entry_distance_pips": null
    })
    .to_string()
}

fn build_run(
    answers: Vec<String>,
    prices: &[(&str, f64)],
) -> (SignalRun<FixedPrices, Arc<ScriptedGenerator>>, Arc<ScriptedGenerator>) {
    let generator = Arc::new(ScriptedGenerator {
        answers: Mutex::new(answers.into()),
        prompts: Mutex::new(Vec::new()),
    });
    let prices = FixedPrices(prices.iter().map(|(s, p)| (s.to_string(), *p)).collect());

    let config = SignalRunConfig {
        symbols: vec!["EURUSD".to_string(), "AUDJPY".to_string()],
        timeframe: "5m".to_string(),
        notes: "integration".to_string(),
        market_data: Some(json!({"session": "london"})),
    };
    let prompts = vec![
        PromptSpec::new("prompt1", "Signal for {SYMBOL} at {CURRENT_PRICE}"),
        PromptSpec::new("prompt2", "Context {MARKET_DATA_JSON} {UNSET}"),
    ];

    let run = SignalRun::new(
        config,
        prompts,
        prices,
        SignalRequester::new(generator.clone(), RetryPolicy::default().with_max_attempts(2)),
    );
    (run, generator)
}

#[tokio::test(start_paused = true)]
async fn test_run_produces_validated_record_per_pair() {
    let (run, generator) = build_run(
        vec![
            answer("BUY", Some(1.1050)),
            answer("SELL", Some(1.1200)),
            answer("HOLD", None),
            answer("SELL", Some(97.00)),
        ],
        &[("EURUSD", 1.1000)],
    );
    let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 5).unwrap();
    let mut sink: Vec<SignalRecord> = Vec::new();

    let report = run.run(now, &mut sink).await.unwrap();

    assert_eq!(report.timestamp_utc, "2025-03-14T09:30:05+00:00");
    assert_eq!(report.records.len(), 4);
    assert_eq!(sink, report.records);

    let order: Vec<(&str, &str)> = report
        .records
        .iter()
        .map(|r| (r.symbol.as_str(), r.prompt_name.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("EURUSD", "prompt1"),
            ("EURUSD", "prompt2"),
            ("AUDJPY", "prompt1"),
            ("AUDJPY", "prompt2"),
        ]
    );

    // EURUSD with price: one valid BUY, one SELL overridden for distance
    assert_eq!(report.records[0].signal, Signal::Buy);
    assert_eq!(report.records[0].entry_distance_pips, Some(50.0));
    assert_eq!(report.records[1].signal, Signal::Hold);
    assert_eq!(report.records[1].original_signal, Some(Signal::Sell));

    // AUDJPY without price: nothing overridden, distance unknown
    assert_eq!(report.records[2].signal, Signal::Hold);
    assert_eq!(report.records[3].signal, Signal::Sell);
    assert_eq!(report.records[3].current_price, None);
    assert_eq!(report.records[3].entry_distance_pips, None);
    assert_eq!(report.records[3].validation.as_ref().unwrap().warnings.len(), 1);

    assert_eq!(report.summary.buy, 1);
    assert_eq!(report.summary.sell, 1);
    assert_eq!(report.summary.hold, 2);
    assert_eq!(report.summary.overridden, 1);
    assert_eq!(report.summary.symbols_without_price, vec!["AUDJPY".to_string()]);

    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("TASK:\nSignal for EURUSD at 1.1\n"));
    assert!(prompts[1].contains("Context {\"session\":\"london\"} {UNSET}"));
    assert!(prompts[2].contains("TASK:\nSignal for AUDJPY at NOT AVAILABLE\n"));
}

/// Records the pair identity each record was persisted under
#[derive(Default)]
struct KeyedSink {
    keys: Vec<(String, String, String)>,
}

impl RecordSink for KeyedSink {
    fn persist(
        &mut self,
        symbol: &str,
        prompt_name: &str,
        record: &SignalRecord,
    ) -> anyhow::Result<()> {
        self.keys
            .push((symbol.to_string(), prompt_name.to_string(), record.symbol.clone()));
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_sink_keyed_by_run_pair_not_model_symbol() {
    let (run, _generator) = build_run(
        vec![
            answer_as("EUR/USD", "BUY", Some(1.1050)),
            answer_as("EUR/USD", "HOLD", None),
            answer_as("EURUSD", "HOLD", None),
            answer_as("", "HOLD", None),
        ],
        &[("EURUSD", 1.1000)],
    );
    let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 5).unwrap();
    let mut sink = KeyedSink::default();

    let report = run.run(now, &mut sink).await.unwrap();

    assert_eq!(report.records.len(), 4);
    let keys: Vec<(&str, &str, &str)> = sink
        .keys
        .iter()
        .map(|(s, p, m)| (s.as_str(), p.as_str(), m.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("EURUSD", "prompt1", "EUR/USD"),
            ("EURUSD", "prompt2", "EUR/USD"),
            ("AUDJPY", "prompt1", "EURUSD"),
            ("AUDJPY", "prompt2", "AUDJPY"),
        ]
    );
    assert_eq!(report.records[0].entry_distance_pips, Some(50.0));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_abort_run() {
    let (run, generator) = build_run(
        vec![answer("BUY", Some(1.1010)), "{".to_string(), "{".to_string()],
        &[("EURUSD", 1.1000), ("AUDJPY", 97.3)],
    );
    let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 5).unwrap();
    let mut sink: Vec<SignalRecord> = Vec::new();

    let err = run.run(now, &mut sink).await.unwrap_err();

    assert!(err.to_string().contains("EURUSD - prompt2 failed"));
    assert!(matches!(
        err.downcast_ref::<SignalError>(),
        Some(SignalError::ExhaustedRetries { attempts: 2, .. })
    ));
    assert_eq!(sink.len(), 1);
    assert_eq!(generator.prompts.lock().unwrap().len(), 3);
}

#[test]
fn test_prompt_loading() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("prompt1.txt"), "  Analyze {SYMBOL}\n").unwrap();
    std::fs::write(dir.path().join("blank.txt"), "   \n").unwrap();

    let prompt = PromptSpec::load(dir.path(), "prompt1").unwrap();
    assert_eq!(prompt.name, "prompt1");
    assert_eq!(prompt.template, "Analyze {SYMBOL}");

    let missing = PromptSpec::load(dir.path(), "prompt9").unwrap_err();
    assert!(missing.to_string().contains("not found"));

    let blank = PromptSpec::load(dir.path(), "blank").unwrap_err();
    assert!(blank.to_string().contains("empty"));

    let all = PromptSpec::load_all(dir.path(), &["prompt1".to_string(), "prompt9".to_string()]);
    assert!(all.is_err());
}
