use pricing_core::calculations::common::round_half_up;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid decimal '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Separators used to read or write a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl NumberFormat {
    /// `1,234.56`
    pub const PLAIN: Self = Self {
        thousands_separator: ',',
        decimal_separator: '.',
    };

    /// `1.234,56`, as written in Argentina.
    pub const ES_AR: Self = Self {
        thousands_separator: '.',
        decimal_separator: ',',
    };
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::PLAIN
    }
}

/// Normalizes input for decimal parsing: trims whitespace and a trailing `%`,
/// drops thousands separators and turns the decimal separator into `.`.
fn normalize_decimal_input(
    s: &str,
    format: &NumberFormat,
) -> String {
    s.trim()
        .trim_end_matches('%')
        .trim()
        .chars()
        .filter(|c| *c != format.thousands_separator)
        .map(|c| if c == format.decimal_separator { '.' } else { c })
        .collect()
}

/// Parses a string into a [`Decimal`].
///
/// Empty or whitespace-only input is treated as 0.
///
/// ```
/// use rust_decimal_macros::dec;
/// use pricing_cli::utils::{NumberFormat, parse_decimal};
///
/// assert_eq!(parse_decimal("1.234,56", &NumberFormat::ES_AR).unwrap(), dec!(1234.56));
/// assert_eq!(parse_decimal("30%", &NumberFormat::PLAIN).unwrap(), dec!(30));
/// ```
pub fn parse_decimal(
    s: &str,
    format: &NumberFormat,
) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s, format);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| {
        tracing::warn!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Parses a string into an optional [`Decimal`]; `None` for empty input.
pub fn parse_optional_decimal(
    s: &str,
    format: &NumberFormat,
) -> Result<Option<Decimal>, ParseDecimalError> {
    if normalize_decimal_input(s, format).is_empty() {
        Ok(None)
    } else {
        parse_decimal(s, format).map(Some)
    }
}

/// Formats `value` rounded to cents with grouped thousands.
pub fn format_amount(
    value: Decimal,
    format: &NumberFormat,
) -> String {
    let rounded = round_half_up(value);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(format.thousands_separator);
        }
        grouped.push(ch);
    }

    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    format!("{sign}{grouped}{}{frac_part}", format.decimal_separator)
}

/// ```
/// use rust_decimal_macros::dec;
/// use pricing_cli::utils::{NumberFormat, format_currency};
///
/// assert_eq!(format_currency(dec!(1300), "$", &NumberFormat::ES_AR), "$ 1.300,00");
/// assert_eq!(format_currency(dec!(-120), "$", &NumberFormat::ES_AR), "-$ 120,00");
/// ```
pub fn format_currency(
    value: Decimal,
    symbol: &str,
    format: &NumberFormat,
) -> String {
    let amount = format_amount(value.abs(), format);
    if round_half_up(value) < Decimal::ZERO {
        format!("-{symbol} {amount}")
    } else {
        format!("{symbol} {amount}")
    }
}

pub fn format_percent(
    value: Decimal,
    format: &NumberFormat,
) -> String {
    format!("{}%", format_amount(value, format))
}
