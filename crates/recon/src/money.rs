//! Amount parsing and formatting in the Brazilian convention
//! (`.` thousands separator, `,` decimal separator).

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::ReconError;

/// Largest accepted magnitude (10^15). Any realistic number of rows summed
/// stays far below `Decimal::MAX`, so aggregation never overflows.
pub const MAX_AMOUNT_UNITS: i64 = 1_000_000_000_000_000;

fn within_range(value: Decimal, raw: &str) -> Result<Decimal, ReconError> {
    if value.abs() > Decimal::from(MAX_AMOUNT_UNITS) {
        log::debug!("amount out of range: {raw}");
        return Err(ReconError::AmountParse { value: raw.to_string() });
    }
    Ok(value)
}

/// Parse `1.234,56` → 1234.56. Thousands dots are dropped, the comma becomes
/// the decimal point. A leading sign is kept.
pub fn parse_brl_decimal(s: &str) -> Result<Decimal, ReconError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ReconError::AmountParse { value: s.to_string() });
    }
    let cleaned = trimmed.replace('.', "").replace(',', ".");
    let value = Decimal::from_str(&cleaned).map_err(|_| ReconError::AmountParse { value: s.to_string() })?;
    within_range(value, s)
}

/// Parse an amount field from a ledger export.
///
/// Accepts the regional convention, a `:` used as decimal point by some
/// exporting systems (`1234:56`), and plain `1,234.56` when the dot comes
/// after the last comma. Quotes and blanks inside the field are ignored.
pub fn parse_ledger_amount(raw: &str) -> Result<Decimal, ReconError> {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | ' ' | '\u{a0}'))
        .collect();

    if cleaned.contains(':') && !cleaned.contains(',') {
        cleaned = cleaned.replace(':', ",");
    }

    let dot_last = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) => dot > comma,
        _ => false,
    };

    if !dot_last {
        if let Ok(value) = parse_brl_decimal(&cleaned) {
            return Ok(value);
        }
    }

    let value = Decimal::from_str(&cleaned.replace(',', ""))
        .map_err(|_| ReconError::AmountParse { value: raw.to_string() })?;
    within_range(value, raw)
}

/// Last whitespace-separated token that carries a decimal comma.
pub fn last_comma_token(text: &str) -> Option<&str> {
    text.split_whitespace().filter(|t| t.contains(',')).last()
}

/// Clears the sign of a zero so it never renders as `-0.00`. Scale is kept.
pub fn unsigned_zero(value: Decimal) -> Decimal {
    if value.is_zero() {
        value.abs()
    } else {
        value
    }
}

/// Format as `R$ 1.234,56` (two decimal places, sign after the symbol).
pub fn format_brl(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = rounded.abs().to_string();
    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i.to_string(), format!("{f:0<2}")),
        None => (plain.clone(), "00".to_string()),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("R$ -{grouped},{frac_part}")
    } else {
        format!("R$ {grouped},{frac_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn thousands_separator_is_stripped() {
        assert_eq!(parse_brl_decimal("1.234,56").unwrap(), dec!(1234.56));
        assert_eq!(parse_brl_decimal("197.791,51").unwrap(), dec!(197791.51));
        assert_eq!(parse_brl_decimal("358,35").unwrap(), dec!(358.35));
        assert_eq!(parse_brl_decimal("-12,00").unwrap(), dec!(-12.00));
    }

    #[test]
    fn empty_and_garbage_rejected() {
        assert!(parse_brl_decimal("").is_err());
        assert!(parse_brl_decimal("  ").is_err());
        assert!(parse_brl_decimal("abc").is_err());
    }

    #[test]
    fn ledger_amount_variants() {
        assert_eq!(parse_ledger_amount("\"1.234,56\"").unwrap(), dec!(1234.56));
        assert_eq!(parse_ledger_amount("1234:56").unwrap(), dec!(1234.56));
        assert_eq!(parse_ledger_amount("1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_ledger_amount(" 358,35 ").unwrap(), dec!(358.35));
        assert_eq!(parse_ledger_amount("300").unwrap(), dec!(300));
        assert!(parse_ledger_amount("n/a").is_err());
        assert!(parse_ledger_amount("").is_err());
    }

    #[test]
    fn zero_loses_its_sign() {
        let negated = -dec!(0.00);
        assert_eq!(unsigned_zero(negated).to_string(), "0.00");
        assert_eq!(unsigned_zero(dec!(-1.50)), dec!(-1.50));
        assert_eq!(unsigned_zero(dec!(2)), dec!(2));
    }

    #[test]
    fn amounts_beyond_range_rejected() {
        assert!(parse_ledger_amount("79228162514264337593543950335").is_err());
        assert!(parse_brl_decimal("1.000.000.000.000.000,01").is_err());
        assert_eq!(parse_brl_decimal("1.000.000.000.000.000,00").unwrap(), dec!(1000000000000000));
        assert!(parse_ledger_amount("-2000000000000000").is_err());
    }

    #[test]
    fn last_comma_token_picks_total_column() {
        assert_eq!(last_comma_token("197.791,51 0,00 0,00 197.791,51"), Some("197.791,51"));
        assert_eq!(last_comma_token("12 358,35"), Some("358,35"));
        assert_eq!(last_comma_token("12"), None);
    }

    #[test]
    fn brl_formatting() {
        assert_eq!(format_brl(dec!(1234.5)), "R$ 1.234,50");
        assert_eq!(format_brl(dec!(0)), "R$ 0,00");
        assert_eq!(format_brl(dec!(-58.35)), "R$ -58,35");
        assert_eq!(format_brl(dec!(1234567.891)), "R$ 1.234.567,89");
        assert_eq!(format_brl(dec!(999)), "R$ 999,00");
    }
}
