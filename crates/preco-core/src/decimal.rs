//! # Decimal Parsing
//!
//! The single text → [`Decimal`] boundary. Every numeric form field goes
//! through [`parse_decimal`] before any arithmetic.
//!
//! ## Accepted Formats
//! ```text
//! "12,50"       → 12.50   comma as decimal separator (pt-BR)
//! "12.50"       → 12.50   dot as decimal separator
//! "1.234,56"    → 1234.56 last separator is decimal, other is grouping
//! "1,234.56"    → 1234.56
//! "1.234.567"   → 1234567 repeated single separator is grouping
//! "R$ 99,90"    → 99.90   currency prefix and spaces ignored
//! "-3"          → -3      sign is parsed; validation rejects negatives
//! ""            → ParseError::Empty
//! "abc", "1e3" → ParseError::Invalid
//! ```

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::ParseError;

const CURRENCY_PREFIXES: [&str; 2] = ["R$", "$"];

/// Parses a locale-formatted decimal string.
///
/// ## Example
/// ```rust
/// use preco_core::decimal::parse_decimal;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_decimal("1.234,56").unwrap(), Decimal::new(123456, 2));
/// assert!(parse_decimal("").is_err());
/// ```
pub fn parse_decimal(input: &str) -> Result<Decimal, ParseError> {
    let invalid = || ParseError::Invalid {
        input: input.to_string(),
    };

    let mut text = input.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let negative = if let Some(rest) = text.strip_prefix('-') {
        text = rest.trim_start();
        true
    } else {
        false
    };

    for prefix in CURRENCY_PREFIXES {
        if let Some(rest) = text.strip_prefix(prefix) {
            text = rest;
            break;
        }
    }

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(invalid());
    }
    if !compact
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return Err(invalid());
    }

    let mut normalized = normalize_separators(&compact).ok_or_else(invalid)?;
    if !normalized.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if normalized.starts_with('.') {
        normalized.insert(0, '0');
    }
    if normalized.ends_with('.') {
        normalized.pop();
    }

    let value = Decimal::from_str(&normalized).map_err(|_| invalid())?;
    Ok(if negative { -value } else { value })
}

/// Lenient variant used for live previews: empty or unparsable text is `0`.
pub fn parse_decimal_or_zero(input: &str) -> Decimal {
    parse_decimal(input).unwrap_or(Decimal::ZERO)
}

/// Rewrites digits-and-separators text into `Decimal::from_str` form
/// (only `.` as decimal point, no grouping).
///
/// Returns `None` when a grouping separator follows the decimal separator.
fn normalize_separators(text: &str) -> Option<String> {
    let decimal_sep = match (text.rfind('.'), text.rfind(',')) {
        (None, None) => return Some(text.to_string()),
        (Some(d), Some(c)) => {
            if d > c {
                '.'
            } else {
                ','
            }
        }
        (Some(_), None) => lone_separator_decimal(text, '.'),
        (None, Some(_)) => lone_separator_decimal(text, ','),
    };
    let grouping_sep = if decimal_sep == '.' { ',' } else { '.' };
    let decimal_at = text.rfind(decimal_sep);

    if let (Some(at), Some(g)) = (decimal_at, text.rfind(grouping_sep)) {
        if g > at {
            return None;
        }
    }

    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        if c == grouping_sep {
            continue;
        }
        if c == decimal_sep {
            if Some(i) != decimal_at {
                return None;
            }
            out.push('.');
            continue;
        }
        out.push(c);
    }
    Some(out)
}

/// When only one separator kind is present: a single occurrence is the
/// decimal point, several are grouping. Returns the decimal separator.
fn lone_separator_decimal(text: &str, sep: char) -> char {
    if text.matches(sep).count() == 1 {
        sep
    } else if sep == '.' {
        ','
    } else {
        '.'
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_decimal("800").unwrap(), dec!(800));
        assert_eq!(parse_decimal("  25 ").unwrap(), dec!(25));
        assert_eq!(parse_decimal("0").unwrap(), dec!(0));
    }

    #[test]
    fn test_either_decimal_separator() {
        assert_eq!(parse_decimal("12,50").unwrap(), dec!(12.50));
        assert_eq!(parse_decimal("12.50").unwrap(), dec!(12.50));
        assert_eq!(parse_decimal(",5").unwrap(), dec!(0.5));
        assert_eq!(parse_decimal("7.").unwrap(), dec!(7));
    }

    #[test]
    fn test_grouping_separators() {
        assert_eq!(parse_decimal("1.234,56").unwrap(), dec!(1234.56));
        assert_eq!(parse_decimal("1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_decimal("1.234.567").unwrap(), dec!(1234567));
        assert_eq!(parse_decimal("1,234,567").unwrap(), dec!(1234567));
        assert_eq!(parse_decimal("1 234,5").unwrap(), dec!(1234.5));
    }

    #[test]
    fn test_currency_prefix_and_sign() {
        assert_eq!(parse_decimal("R$ 99,90").unwrap(), dec!(99.90));
        assert_eq!(parse_decimal("$5").unwrap(), dec!(5));
        assert_eq!(parse_decimal("-3").unwrap(), dec!(-3));
        assert_eq!(parse_decimal("- R$ 3,5").unwrap(), dec!(-3.5));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_decimal(""), Err(ParseError::Empty));
        assert_eq!(parse_decimal("   "), Err(ParseError::Empty));
    }

    #[test]
    fn test_invalid_input() {
        for bad in ["abc", "12a", "1e3", "R$", "-", ".", "1,2.3,4", "1.23,4.5", "+-1", "--2"] {
            assert!(
                matches!(parse_decimal(bad), Err(ParseError::Invalid { .. })),
                "expected {:?} to be invalid",
                bad
            );
        }
    }

    #[test]
    fn test_lenient_parsing_defaults_to_zero() {
        assert_eq!(parse_decimal_or_zero(""), Decimal::ZERO);
        assert_eq!(parse_decimal_or_zero("abc"), Decimal::ZERO);
        assert_eq!(parse_decimal_or_zero("18"), dec!(18));
    }
}
