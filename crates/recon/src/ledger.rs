//! Ledger export ("lote contábil") parsing.
//!
//! The export is a headerless delimited file with fixed field positions. Rows
//! that cannot be read are skipped and logged; the rest become
//! [`LedgerPostingRow`]s with absolute amounts.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::LedgerConfig;
use crate::mapping::normalize_ledger_code;
use crate::money::parse_ledger_amount;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerPostingRow {
    pub ledger_code: String,
    /// Always non-negative; direction comes from the mapping.
    pub amount: Decimal,
    pub description: String,
    pub debit_account: String,
    pub credit_account: String,
}

/// Pick the delimiter from the first line: `;` when it outnumbers `,`, else a
/// tab when present, else `,`.
pub fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    if semicolons > commas {
        b';'
    } else if first_line.contains('\t') {
        b'\t'
    } else {
        b','
    }
}

/// Parse the decoded export text.
pub fn parse_ledger(text: &str, layout: &LedgerConfig) -> Vec<LedgerPostingRow> {
    let delimiter = match layout.delimiter {
        Some(c) => c as u8,
        None => detect_delimiter(text.lines().next().unwrap_or("")),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (line_no, record) in reader.records().enumerate() {
        let line_no = line_no + 1;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                log::debug!("ledger line {line_no}: unreadable record: {e}");
                skipped += 1;
                continue;
            }
        };

        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if record.len() < layout.min_fields {
            log::debug!(
                "ledger line {line_no}: {} fields, need {}",
                record.len(),
                layout.min_fields
            );
            skipped += 1;
            continue;
        }

        let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or("").to_string();

        let raw_code = field(layout.code_field);
        let code = raw_code.trim_matches(|c| c == '"' || c == '\'').trim();
        let code = code.strip_suffix(".0").unwrap_or(code);
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
            log::debug!("ledger line {line_no}: non-numeric ledger code '{raw_code}'");
            skipped += 1;
            continue;
        }
        if code.len() < layout.min_code_digits {
            log::debug!("ledger line {line_no}: ledger code '{code}' too short");
            skipped += 1;
            continue;
        }

        let raw_amount = field(layout.amount_field);
        let amount = match parse_ledger_amount(&raw_amount) {
            Ok(v) => v.abs(),
            Err(e) => {
                log::debug!("ledger line {line_no}: {e}");
                skipped += 1;
                continue;
            }
        };

        rows.push(LedgerPostingRow {
            ledger_code: normalize_ledger_code(code),
            amount,
            description: field(layout.description_field),
            debit_account: field(layout.debit_field),
            credit_account: field(layout.credit_field),
        });
    }

    log::info!("ledger: parsed {} postings, skipped {skipped} lines", rows.len());
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parse(text: &str) -> Vec<LedgerPostingRow> {
        parse_ledger(text, &LedgerConfig::default())
    }

    #[test]
    fn delimiter_detection() {
        assert_eq!(detect_delimiter("1;30057;x;358,35"), b';');
        assert_eq!(detect_delimiter("1\t30057\tx\t358,35"), b'\t');
        assert_eq!(detect_delimiter("1,30057,x,\"358,35\""), b',');
        assert_eq!(detect_delimiter(""), b',');
    }

    #[test]
    fn semicolon_export_with_all_fields() {
        let text = "\
1;30057;01/05/2024;358,35;4101;2101;H;FÉRIAS A PAGAR
2;30058;01/05/2024;1.234,56;2101;2105;H;IRRF S/ FÉRIAS
";
        let rows = parse(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ledger_code, "30057");
        assert_eq!(rows[0].amount, dec!(358.35));
        assert_eq!(rows[0].debit_account, "4101");
        assert_eq!(rows[0].credit_account, "2101");
        assert_eq!(rows[0].description, "FÉRIAS A PAGAR");
        assert_eq!(rows[1].amount, dec!(1234.56));
    }

    #[test]
    fn quoted_comma_amount_in_comma_export() {
        let text = "1,30057,x,\"1.234,56\",4101,2101,H,FERIAS\n";
        let rows = parse(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, dec!(1234.56));
    }

    #[test]
    fn short_rows_keep_empty_optional_fields() {
        let rows = parse("1;30057;x;10,00\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "");
        assert_eq!(rows[0].credit_account, "");
    }

    #[test]
    fn invalid_rows_are_dropped() {
        let text = "\
1;30057
1;ABC;x;10,00
1;123;x;10,00
1;30057;x;n/a
1;30057;x;-10,00
";
        let rows = parse(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, dec!(10.00));
    }

    #[test]
    fn unmapped_codes_are_kept_and_leading_zeros_dropped() {
        let rows = parse("1;99999;x;5,00\n1;00897;x;1,00\n");
        assert_eq!(rows[0].ledger_code, "99999");
        assert_eq!(rows[1].ledger_code, "897");
    }

    #[test]
    fn forced_delimiter_and_custom_positions() {
        let layout = LedgerConfig {
            code_field: 0,
            amount_field: 1,
            description_field: 2,
            min_fields: 2,
            delimiter: Some('|'),
            ..LedgerConfig::default()
        };
        let rows = parse_ledger("30057|358:35|FERIAS\n", &layout);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, dec!(358.35));
        assert_eq!(rows[0].description, "FERIAS");
    }

    #[test]
    fn empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n").is_empty());
    }
}
