//! Pip arithmetic for FX pairs and gold.
//!
//! Values follow the quoting convention used in the model instructions:
//! `pip_value` is the price span of 100 pips ("EURUSD: 100 pips = 0.0100").

/// Largest allowed distance between a proposed entry and the reference price
pub const MAX_ENTRY_DISTANCE_PIPS: f64 = 100.0;

/// Number of pips covered by `pip_value`
const PIPS_PER_QUOTED_SPAN: f64 = 100.0;

/// Price span of 100 pips for `symbol`.
///
/// JPY-quoted pairs use 1.00, gold (XAU/GOLD) uses 10.00, every other pair
/// falls back to 0.01. Matching is case-insensitive.
pub fn pip_value(symbol: &str) -> f64 {
    let symbol = symbol.to_uppercase();
    if symbol.contains("JPY") {
        1.00
    } else if symbol.contains("XAU") || symbol.contains("GOLD") {
        10.00
    } else {
        0.01
    }
}

/// Price move of a single pip for `symbol`
pub fn pip_size(symbol: &str) -> f64 {
    pip_value(symbol) / PIPS_PER_QUOTED_SPAN
}

/// Distance in pips between `entry` and `reference`, rounded to 2 decimals
pub fn pip_distance(entry: f64, reference: f64, symbol: &str) -> f64 {
    let pips = (entry - reference).abs() / pip_size(symbol);
    (pips * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pip_value_by_symbol() {
        assert_eq!(pip_value("AUDJPY"), 1.0);
        assert_eq!(pip_value("USDJPY"), 1.0);
        assert_eq!(pip_value("XAUUSD"), 10.0);
        assert_eq!(pip_value("gold"), 10.0);
        assert_eq!(pip_value("EURUSD"), 0.01);
        assert_eq!(pip_value("GBPUSD"), 0.01);
    }

    #[test]
    fn test_pip_value_is_positive_and_deterministic() {
        for symbol in ["EURUSD", "AUDJPY", "XAUUSD", "EUR/USD", "", "???"] {
            let first = pip_value(symbol);
            assert!(first > 0.0);
            assert_eq!(first, pip_value(symbol));
        }
    }

    #[test]
    fn test_pip_distance() {
        assert_eq!(pip_distance(1.1050, 1.1000, "EURUSD"), 50.0);
        assert_eq!(pip_distance(1.1200, 1.1000, "EURUSD"), 200.0);
        assert_eq!(pip_distance(1.0950, 1.1000, "EURUSD"), 50.0);
        assert_eq!(pip_distance(98.50, 97.25, "AUDJPY"), 125.0);
        assert_eq!(pip_distance(2010.0, 2000.0, "XAUUSD"), 100.0);
    }

    #[test]
    fn test_pip_distance_rounds_to_two_decimals() {
        assert_eq!(pip_distance(1.100123, 1.1000, "EURUSD"), 1.23);
    }
}
