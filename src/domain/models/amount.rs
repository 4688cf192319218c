//! Fixed-point token amounts
//!
//! Divisible properties carry 8 implied decimal digits; all arithmetic stays
//! on the raw 64-bit integer.

/// Raw units per whole divisible token
pub const COIN: i64 = 100_000_000;

/// Supply ceiling of any property
pub const MAX_TOKENS: i64 = i64::MAX;

/// Formats a raw amount for display
pub fn format_amount(raw: i64, divisible: bool) -> String {
    if !divisible {
        return raw.to_string();
    }
    let sign = if raw < 0 { "-" } else { "" };
    let abs = raw.unsigned_abs();
    let coin = COIN as u64;
    format!("{}{}.{:08}", sign, abs / coin, abs % coin)
}

/// Parses a display amount into raw units.
///
/// Divisible amounts accept up to 8 fractional digits; indivisible amounts
/// must be whole numbers. Negative values and overflow yield `None`.
pub fn parse_amount(text: &str, divisible: bool) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('-') || text.starts_with('+') {
        return None;
    }
    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let whole_value: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };

    if !divisible {
        if fraction.chars().any(|c| c != '0') {
            return None;
        }
        return Some(whole_value);
    }

    if fraction.len() > 8 {
        return None;
    }
    let padded = format!("{:0<8}", fraction);
    let fraction_value: i64 = padded.parse().ok()?;
    whole_value.checked_mul(COIN)?.checked_add(fraction_value)
}
