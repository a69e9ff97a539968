//! Display formatting and the inverse parse used when an edit is committed.
//!
//! Money is shown with pt-BR punctuation (`1.234,50`). Users may type either
//! `,` or `.` as the decimal point; see [`parse_decimal_input`] for the exact
//! separator rule.

use crate::column::{ColumnSpec, NumericFormat};
use crate::record::FieldValue;

/// An edit that cannot be saved into a numeric column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("\"{0}\" is not a number")]
    NotANumber(String),
}

/// Render a value for display in `column`.
pub fn format_value(value: &FieldValue, column: &ColumnSpec) -> String {
    if let FieldValue::Text(s) = value {
        if s.trim().is_empty() {
            return String::new();
        }
    }

    match column.numeric_format {
        None => value.to_string(),
        Some(NumericFormat::Integer) => match value {
            FieldValue::Integer(n) => n.to_string(),
            other => format!("{}", other.as_f64().floor() as i64),
        },
        Some(NumericFormat::Decimal2) => format_decimal_br(value.as_f64()),
    }
}

/// Two decimals, `.` thousands separator, `,` decimal point.
pub fn format_decimal_br(n: f64) -> String {
    let fixed = format!("{:.2}", n.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if n < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{},{}", sign, group_thousands(int_part, '.'), frac_part)
}

fn group_thousands(digits: &str, sep: char) -> String {
    let len = digits.chars().count();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// The raw string an edit session starts from: the true value, not the
/// display-rounded one.
pub fn edit_seed(value: &FieldValue) -> String {
    value.to_string()
}

/// Parse user input for a numeric column.
///
/// Separator rule: when both `,` and `.` appear, the last one is the decimal
/// point and the other is grouping. A single `,` or a single `.` is the
/// decimal point. A separator that repeats is grouping. Empty input is `0`.
/// Letters (other than a leading `R$`) are rejected.
pub fn parse_decimal_input(input: &str) -> Result<f64, InputError> {
    let trimmed = input.trim();
    let body = trimmed.strip_prefix("R$").unwrap_or(trimmed);
    if body.chars().any(|c| c.is_alphabetic()) {
        return Err(InputError::NotANumber(input.to_string()));
    }

    let cleaned: String = body
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Ok(0.0);
    }

    let negative = cleaned.starts_with('-');
    let unsigned: String = cleaned.chars().filter(|c| *c != '-').collect();
    let decimal_at = decimal_position(&unsigned);

    let mut normalized = String::with_capacity(unsigned.len() + 2);
    if negative {
        normalized.push('-');
    }
    for (i, c) in unsigned.char_indices() {
        if c.is_ascii_digit() {
            normalized.push(c);
        } else if Some(i) == decimal_at {
            normalized.push('.');
        }
    }
    if normalized.ends_with('.') {
        normalized.push('0');
    }
    if normalized.starts_with('.') || normalized.starts_with("-.") {
        normalized = normalized.replacen('.', "0.", 1);
    }

    match normalized.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(if n == 0.0 { 0.0 } else { n }),
        _ => Err(InputError::NotANumber(input.to_string())),
    }
}

fn decimal_position(s: &str) -> Option<usize> {
    let commas = s.matches(',').count();
    let dots = s.matches('.').count();
    match (commas, dots) {
        (0, 0) => None,
        (c, d) if c > 0 && d > 0 => s.rfind(',').max(s.rfind('.')),
        (1, 0) => s.rfind(','),
        (0, 1) => s.rfind('.'),
        _ => None,
    }
}

/// Parse committed editor text into a value for `column`.
pub fn parse_for_column(input: &str, column: &ColumnSpec) -> Result<FieldValue, InputError> {
    match column.numeric_format {
        None => Ok(FieldValue::Text(input.to_string())),
        Some(NumericFormat::Integer) => {
            parse_decimal_input(input).map(|n| FieldValue::Integer(n.trunc() as i64))
        }
        Some(NumericFormat::Decimal2) => parse_decimal_input(input).map(FieldValue::Decimal),
    }
}
