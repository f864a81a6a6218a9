use chrono::{DateTime, Utc};
use trading_core::{pip_distance, ReferencePrice, SignalRecord};

use super::contract::{ResponseContract, SignalContract};
use super::llm_client::{GenerationRequest, SignalGenerator};
use super::metrics::{MetricsTimer, RequestMetrics};
use super::prompt_formatter::LlmPromptFormatter;
use super::retry::{retry_with_backoff, RetryPolicy};
use crate::error::SignalError;

/// Caller-side facts about one (symbol, prompt) request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub prompt_name: String,
    pub symbol: String,
    pub timeframe: String,
    pub timestamp_utc: String,
    pub notes: String,
    pub reference: Option<ReferencePrice>,
    pub now: DateTime<Utc>,
}

/// Requests a `SignalRecord` from a generation backend.
///
/// Each attempt sends the system instruction and the framed prompt, then runs
/// the answer through the response contract. Any failure is retried under the
/// retry policy; once the budget is spent the last error is surfaced as
/// `SignalError::ExhaustedRetries`.
pub struct SignalRequester<G, C = SignalContract> {
    generator: G,
    contract: C,
    policy: RetryPolicy,
}

impl<G: SignalGenerator> SignalRequester<G, SignalContract> {
    pub fn new(generator: G, policy: RetryPolicy) -> Self {
        Self::with_contract(generator, SignalContract, policy)
    }
}

impl<G, C> SignalRequester<G, C>
where
    G: SignalGenerator,
    C: ResponseContract<Output = SignalRecord>,
{
    pub fn with_contract(generator: G, contract: C, policy: RetryPolicy) -> Self {
        Self {
            generator,
            contract,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn request(
        &self,
        rendered_prompt: &str,
        ctx: &RequestContext,
    ) -> Result<SignalRecord, SignalError> {
        let (record, _) = self.request_with_metrics(rendered_prompt, ctx).await?;
        Ok(record)
    }

    /// Same as `request`, also returning attempt and latency metrics
    pub async fn request_with_metrics(
        &self,
        rendered_prompt: &str,
        ctx: &RequestContext,
    ) -> Result<(SignalRecord, RequestMetrics), SignalError> {
        let request = GenerationRequest {
            system: LlmPromptFormatter::system_instruction(),
            user: LlmPromptFormatter::user_message(rendered_prompt, ctx),
            schema_name: self.contract.schema_name().to_string(),
            schema: self.contract.schema(),
        };
        let label = format!("{} - {}", ctx.symbol, ctx.prompt_name);
        let request_timer = MetricsTimer::start();

        let generator = &self.generator;
        let contract = &self.contract;
        let request = &request;

        let outcome = retry_with_backoff(&self.policy, &label, |_attempt| async move {
            let timer = MetricsTimer::start();
            let response = generator.generate(request).await?;
            let latency = timer.stop();
            let record = contract.check(&response.raw_response)?;
            Ok::<_, SignalError>((record, response, latency))
        })
        .await
        .map_err(|exhausted| {
            tracing::error!(
                "{}: giving up after {} attempts: {}",
                label,
                exhausted.attempts,
                exhausted.last_error
            );
            SignalError::ExhaustedRetries {
                attempts: exhausted.attempts,
                last_error: exhausted.last_error.to_string(),
            }
        })?;

        let (record, response, latency) = outcome.value;

        let mut metrics = RequestMetrics::new();
        metrics.attempts = outcome.attempts;
        metrics.set_llm_latency(latency);
        metrics.set_total_latency(request_timer.stop());
        metrics.model = Some(response.model);
        metrics.tokens_used = response.tokens_used;
        metrics.report(&label);

        Ok((fill_context(record, ctx), metrics))
    }
}

/// Overwrite or fill the fields the model cannot be trusted to set.
///
/// Identity fields and notes count as missing when blank after trimming, so a
/// whitespace-only value from the model is replaced by the caller's value.
pub fn fill_context(mut record: SignalRecord, ctx: &RequestContext) -> SignalRecord {
    record.prompt_name = ctx.prompt_name.clone();

    if record.symbol.trim().is_empty() {
        record.symbol = ctx.symbol.clone();
    }
    if record.timeframe.trim().is_empty() {
        record.timeframe = ctx.timeframe.clone();
    }
    if record.timestamp_utc.trim().is_empty() {
        record.timestamp_utc = ctx.timestamp_utc.clone();
    }
    if record.raw_notes.trim().is_empty() {
        record.raw_notes = ctx.notes.clone();
    }

    let reference = ctx.reference.as_ref().map(|p| p.price);
    record.current_price = reference;
    record.entry_distance_pips = match (record.entry, reference) {
        (Some(entry), Some(price)) => Some(pip_distance(entry, price, &ctx.symbol)),
        _ => None,
    };

    record
}
