use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use trading_core::{pip_value, ReferencePrice, MAX_ENTRY_DISTANCE_PIPS};

use super::signal_requester::RequestContext;

/// Placeholder value for a missing reference price
pub const PRICE_NOT_AVAILABLE: &str = "NOT AVAILABLE";

/// Named values substituted into `{KEY}` placeholders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptVariables {
    values: BTreeMap<String, String>,
}

impl PromptVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.values.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Standard variable set for one symbol in one run
    pub fn for_symbol(
        symbol: &str,
        timeframe: &str,
        timestamp_utc: &str,
        now: DateTime<Utc>,
        reference: Option<&ReferencePrice>,
        notes: &str,
        market_data: Option<&Value>,
    ) -> Self {
        let mut vars = Self::new();
        vars.insert("SYMBOL", symbol)
            .insert("TIMEFRAME", timeframe)
            .insert("TIMESTAMP_UTC", timestamp_utc)
            .insert("CURRENT_DATE", now.format("%Y-%m-%d"))
            .insert("CURRENT_TIME", now.format("%H:%M:%S UTC"))
            .insert("CURRENT_DAY", now.format("%A"))
            .insert("NOTES", notes);

        match reference {
            Some(price) => {
                vars.insert("CURRENT_PRICE", price.price)
                    .insert("PRICE_SOURCE", &price.source)
                    .insert(
                        "PRICE_TIMESTAMP",
                        price
                            .observed_at
                            .map(|ts| ts.to_string())
                            .unwrap_or_else(|| "Unknown".to_string()),
                    );
            }
            None => {
                vars.insert("CURRENT_PRICE", PRICE_NOT_AVAILABLE)
                    .insert("PRICE_SOURCE", "Not Available")
                    .insert("PRICE_TIMESTAMP", "Unknown");
            }
        }

        let market_data_json = market_data.map(Value::to_string).unwrap_or_default();
        vars.insert("MARKET_DATA_JSON", market_data_json);

        vars
    }
}

/// Replace every `{KEY}` in `template` whose key is defined in `variables`.
///
/// Single pass: substituted values are never rescanned, and unknown or
/// unterminated placeholders are left verbatim.
pub fn render_prompt(template: &str, variables: &PromptVariables) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        match after_open.find(|c: char| c == '}' || c == '{') {
            Some(close) if after_open.as_bytes()[close] == b'}' => {
                let key = &after_open[..close];
                match variables.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after_open[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Builds the instruction and user messages sent with every signal request
pub struct LlmPromptFormatter;

impl LlmPromptFormatter {
    /// Fixed system instruction: use the given price, stay within the pip
    /// limit, prefer a direction, keep the trade short-lived
    pub fn system_instruction() -> String {
        let mut system = String::new();

        system.push_str("You are a trading signal analysis assistant for a study. ");
        system.push_str("Do NOT provide investment advice. Your role is to analyze market conditions and provide actionable trading signals. ");
        system.push_str("CRITICAL: You MUST use the REAL-TIME market price provided in the prompt. ");
        system.push_str("NEVER invent or estimate prices - use ONLY the current_price provided. ");

        system.push_str("SIGNAL GUIDELINES: ");
        system.push_str("- Prefer BUY or SELL signals when there is any reasonable basis for a directional view. ");
        system.push_str("- HOLD is acceptable ONLY when there is genuinely NO trade opportunity. ");
        system.push_str("- Be decisive: if you can identify any trend, pattern, or market condition, provide a BUY or SELL signal. ");

        system.push_str("ENTRY PRICE REQUIREMENTS (CRITICAL): ");
        system.push_str(&format!(
            "- Entry price MUST be within {} PIPS of the CURRENT market price provided. ",
            MAX_ENTRY_DISTANCE_PIPS
        ));
        system.push_str(&format!(
            "- For JPY pairs (AUDJPY): 100 pips = {:.2}. ",
            pip_value("AUDJPY")
        ));
        system.push_str(&format!(
            "- For major pairs (EURUSD): 100 pips = {:.4}. ",
            pip_value("EURUSD")
        ));
        system.push_str(&format!(
            "- For XAUUSD (Gold): 100 pips = {:.2}. ",
            pip_value("XAUUSD")
        ));
        system.push_str(&format!(
            "- If you cannot set an entry within {} pips of current price, return HOLD. ",
            MAX_ENTRY_DISTANCE_PIPS
        ));
        system.push_str("- Use the EXACT current_price provided as reference. ");

        system.push_str("TIMING REQUIREMENTS: ");
        system.push_str("- Trades must be executable within the NEXT HOUR from the current timestamp. ");
        system.push_str("- Entry prices must be realistic and achievable within 1 hour. ");
        system.push_str("- Trades should be designed for short-term execution on the given timeframe. ");
        system.push_str("- Maximum trade duration: 5 hours.");

        system
    }

    /// Wrap a rendered prompt with date, price and trading context
    pub fn user_message(rendered_prompt: &str, ctx: &RequestContext) -> String {
        let price_display = ctx
            .reference
            .as_ref()
            .map(|p| p.price.to_string())
            .unwrap_or_else(|| PRICE_NOT_AVAILABLE.to_string());
        let price_source = ctx
            .reference
            .as_ref()
            .map(|p| p.source.clone())
            .unwrap_or_else(|| "Not Available".to_string());
        let price_time = ctx
            .reference
            .as_ref()
            .and_then(ReferencePrice::observed_at_display)
            .unwrap_or_else(|| "Unknown".to_string());

        let mut prompt = String::new();

        prompt.push_str("CURRENT DATE AND TIME:\n");
        prompt.push_str(&format!(
            "- Date: {} ({})\n",
            ctx.now.format("%Y-%m-%d"),
            ctx.now.format("%A")
        ));
        prompt.push_str(&format!("- Time: {}\n", ctx.now.format("%H:%M:%S UTC")));
        prompt.push_str(&format!("- Timestamp UTC: {}\n\n", ctx.timestamp_utc));

        prompt.push_str("REAL-TIME MARKET PRICE:\n");
        prompt.push_str(&format!("- Current market price = {}\n", price_display));
        prompt.push_str(&format!("- Price source: {}\n", price_source));
        prompt.push_str(&format!("- Price timestamp: {}\n\n", price_time));

        prompt.push_str("TRADING PARAMETERS:\n");
        prompt.push_str(&format!("- Symbol: {}\n", ctx.symbol));
        prompt.push_str(&format!("- Timeframe: {}\n", ctx.timeframe));
        prompt.push_str(&format!("- Prompt: {}\n", ctx.prompt_name));
        prompt.push_str(&format!("- Notes: {}\n\n", ctx.notes));

        prompt.push_str(&format!(
            "CRITICAL: Entry price MUST be within {} pips of the current market price ({}). ",
            MAX_ENTRY_DISTANCE_PIPS, price_display
        ));
        prompt.push_str("Use this EXACT price as your reference. Do NOT estimate or invent prices.\n\n");

        prompt.push_str("TASK:\n");
        prompt.push_str(rendered_prompt);
        prompt.push('\n');

        prompt
    }
}
