//! Display formatting for product fields
//!
//! Pure functions, no error conditions: anything that can't be formatted is
//! shown as-is.

use crate::domain::constants::display::TITLE_DELIMITER;

/// Strip the trailing price fragment some upstream titles carry.
///
/// Returns the text before the first `$`, trimmed. Titles without the
/// delimiter come back trimmed and otherwise unchanged.
pub fn clean_title(raw: &str) -> &str {
    raw.split(TITLE_DELIMITER).next().unwrap_or("").trim()
}

/// Format a count for display with en-US digit grouping.
///
/// Existing `,` separators are stripped before parsing, so `"12,345"` and
/// `"12345"` both become `"12,345"`. Fractions keep at most three digits.
/// Input that is not a finite number is returned unchanged.
pub fn format_count(raw: &str) -> String {
    let stripped: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if stripped.is_empty() {
        return raw.to_string();
    }

    match stripped.parse::<f64>() {
        Ok(value) if value.is_finite() => group_number(value),
        _ => raw.to_string(),
    }
}

fn group_number(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + integer.len() / 3 + 1);
    let is_zero = integer.chars().all(|c| c == '0') && fraction.is_empty();
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    out.push_str(&group_digits(integer));
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
