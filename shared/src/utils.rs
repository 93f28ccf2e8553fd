// Formatting helpers shared by the engine's plan text and any presentation layer.

/// Two-decimal price text, e.g. `10.28`.
pub fn format_price(value: f64) -> String {
    format!("{:.2}", value)
}

/// Integer with comma thousands separators, e.g. `1,234,567`.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
