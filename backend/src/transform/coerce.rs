//! Lenient value parsing.
//!
//! Every function here returns a default instead of an error: a cell that is
//! not a number contributes `0.0`, a size string without a thickness token
//! yields `None`. Classification never aborts on bad cell contents.

use once_cell::sync::Lazy;
use regex::Regex;

/// Optional `T`/`PL` prefix, digits, optional `MM` suffix. First match wins.
static THICKNESS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:T|PL)?(\d+)(?:MM)?").expect("Invalid thickness pattern"));

/// Parse a numeric cell, degrading to `0.0`.
///
/// Empty, non-numeric and non-finite values (`NaN`, `inf`) all become `0.0`.
pub fn number_or_zero(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Extract a plate thickness (mm) from a size string such as `PL80`, `t100`
/// or `80MM`.
///
/// Returns `None` when no digits are present or the digits do not fit.
pub fn parse_thickness(size_text: &str) -> Option<u64> {
    let upper = size_text.to_uppercase();
    let caps = THICKNESS_PATTERN.captures(&upper)?;
    caps.get(1)?.as_str().parse::<u64>().ok()
}

/// Normalize an identifier cell.
///
/// Trims whitespace and renders integral numbers without a fraction so that
/// `"3"` and `"3.0"` (as produced by spreadsheet float cells) are the same key.
pub fn normalize_key(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 && trimmed.contains('.') => {
            format!("{}", v as i64)
        }
        _ => trimmed.to_string(),
    }
}

/// Round to two decimals for output.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Keep at most `max` characters (not bytes).
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
