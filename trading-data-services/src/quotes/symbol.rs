/// Convert a compact symbol into the slashed form the quote service expects.
///
/// "EURUSD" becomes "EUR/USD", "XAUUSD" becomes "XAU/USD". Input that already
/// contains a slash, or that is not six characters long, is returned as is.
pub fn normalize_symbol(symbol: &str) -> String {
    if symbol == "XAUUSD" {
        return "XAU/USD".to_string();
    }
    if symbol.contains('/') {
        return symbol.to_string();
    }
    if symbol.len() == 6 && symbol.is_ascii() {
        return format!("{}/{}", &symbol[..3], &symbol[3..]);
    }
    symbol.to_string()
}
