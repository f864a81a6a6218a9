use serde_json::{json, Value};

/// Name sent with the structured-output response format
pub const SIGNAL_SCHEMA_NAME: &str = "trading_signal_output";

/// Maximum number of take-profit targets a record may carry
pub const MAX_TARGETS: usize = 5;

/// JSON schema the model's answer must satisfy.
///
/// Every field is required (strict mode). `entry`/`stop` are nullable here;
/// their presence for directional signals is enforced by entry validation.
pub fn signal_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "symbol": {"type": "string"},
            "timeframe": {"type": "string"},
            "timestamp_utc": {"type": "string"},
            "signal": {"type": "string", "enum": ["BUY", "SELL", "HOLD"]},
            "confidence": {"type": "number", "minimum": 0, "maximum": 1},
            "entry": {"type": ["number", "null"]},
            "stop": {"type": ["number", "null"]},
            "targets": {
                "type": "array",
                "items": {"type": "number"},
                "maxItems": MAX_TARGETS
            },
            "rationale": {"type": "string"},
            "invalidation": {"type": "string"},
            "prompt_name": {"type": "string"},
            "raw_notes": {"type": "string"},
            "current_price": {"type": ["number", "null"]},
            "entry_distance_pips": {"type": ["number", "null"]}
        },
        "required": [
            "symbol", "timeframe", "timestamp_utc", "signal", "confidence",
            "entry", "stop", "targets", "rationale", "invalidation",
            "prompt_name", "raw_notes", "current_price", "entry_distance_pips"
        ]
    })
}
