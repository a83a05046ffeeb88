// Result export: JSON document and one CSV per view

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use confronto_recon::ledger::LedgerPostingRow;
use confronto_recon::model::{Comparison, ReconResult};
use confronto_recon::summary::SummaryEventRow;

use crate::error::IoError;

const COMPARISON_HEADERS: [&str; 4] = ["summary_value", "ledger_value", "difference", "status"];

fn comparison_fields(c: &Comparison) -> [String; 4] {
    [
        c.summary_value.to_string(),
        c.ledger_value.to_string(),
        c.difference.to_string(),
        c.status.to_string(),
    ]
}

fn with_comparison(mut fields: Vec<String>, c: &Comparison) -> Vec<String> {
    fields.extend(comparison_fields(c));
    fields
}

fn headers_with_comparison(leading: &[&'static str]) -> Vec<&'static str> {
    leading.iter().copied().chain(COMPARISON_HEADERS).collect()
}

/// Write a header row and records as comma-separated values.
pub fn write_table<W: Write>(
    out: W,
    headers: &[&str],
    rows: impl IntoIterator<Item = Vec<String>>,
) -> Result<(), IoError> {
    let mut writer = csv::WriterBuilder::new().from_writer(out);
    writer.write_record(headers).map_err(|e| IoError::Csv(e.to_string()))?;
    for row in rows {
        writer.write_record(&row).map_err(|e| IoError::Csv(e.to_string()))?;
    }
    writer.flush().map_err(|e| IoError::Csv(e.to_string()))?;
    Ok(())
}

pub fn write_summary_rows<W: Write>(out: W, rows: &[SummaryEventRow]) -> Result<(), IoError> {
    write_table(
        out,
        &["category", "event_code", "event_name", "sign", "amount"],
        rows.iter().map(|r| {
            vec![
                r.category.clone(),
                r.event_code.clone(),
                r.event_name.clone(),
                r.sign.to_string(),
                r.amount.to_string(),
            ]
        }),
    )
}

pub fn write_ledger_rows<W: Write>(out: W, rows: &[LedgerPostingRow]) -> Result<(), IoError> {
    write_table(
        out,
        &["ledger_code", "amount", "description", "debit_account", "credit_account"],
        rows.iter().map(|r| {
            vec![
                r.ledger_code.clone(),
                r.amount.to_string(),
                r.description.clone(),
                r.debit_account.clone(),
                r.credit_account.clone(),
            ]
        }),
    )
}

fn emit(
    dir: &Path,
    written: &mut Vec<PathBuf>,
    name: &str,
    headers: &[&str],
    rows: Vec<Vec<String>>,
) -> Result<(), IoError> {
    let path = dir.join(name);
    let file = File::create(&path).map_err(|e| IoError::file(&path, e))?;
    write_table(file, headers, rows)?;
    log::debug!("export: wrote {}", path.display());
    written.push(path);
    Ok(())
}

/// Pretty-printed JSON result document.
pub fn write_json(result: &ReconResult, path: &Path) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(result).map_err(|e| IoError::Json(e.to_string()))?;
    std::fs::write(path, json + "\n").map_err(|e| IoError::file(path, e))
}

/// One CSV per view in `dir` (created when absent). Returns the written paths.
pub fn write_view_csvs(result: &ReconResult, dir: &Path) -> Result<Vec<PathBuf>, IoError> {
    std::fs::create_dir_all(dir).map_err(|e| IoError::file(dir, e))?;
    let mut written = Vec::new();

    emit(
        dir,
        &mut written,
        "by_category.csv",
        &headers_with_comparison(&["category"]),
        result
            .by_category
            .iter()
            .map(|r| with_comparison(vec![r.category.clone()], &r.comparison))
            .collect(),
    )?;

    emit(
        dir,
        &mut written,
        "by_event.csv",
        &headers_with_comparison(&["category", "event_code", "event_name", "ledger_code"]),
        result
            .by_event
            .iter()
            .map(|r| {
                with_comparison(
                    vec![
                        r.category.clone(),
                        r.event_code.clone(),
                        r.event_name.clone(),
                        r.ledger_code.clone().unwrap_or_default(),
                    ],
                    &r.comparison,
                )
            })
            .collect(),
    )?;

    emit(
        dir,
        &mut written,
        "unlinked_events.csv",
        &["category", "event_code", "event_name"],
        result
            .unlinked_events
            .iter()
            .map(|r| vec![r.category.clone(), r.event_code.clone(), r.event_name.clone()])
            .collect(),
    )?;

    emit(
        dir,
        &mut written,
        "unreached_ledger_codes.csv",
        &["category", "ledger_code", "ledger_value"],
        result
            .unreached_ledger_codes
            .iter()
            .map(|r| vec![r.category.clone(), r.ledger_code.clone(), r.ledger_value.to_string()])
            .collect(),
    )?;

    emit(
        dir,
        &mut written,
        "by_ledger_code.csv",
        &headers_with_comparison(&["category", "ledger_code"]),
        result
            .by_ledger_code
            .iter()
            .map(|r| with_comparison(vec![r.category.clone(), r.ledger_code.clone()], &r.comparison))
            .collect(),
    )?;

    emit(
        dir,
        &mut written,
        "taxes.csv",
        &headers_with_comparison(&["tax_type", "ledger_code", "events", "description"]),
        result
            .taxes
            .iter()
            .map(|r| {
                with_comparison(
                    vec![
                        r.tax_type.to_string(),
                        r.ledger_code.clone(),
                        r.events.clone(),
                        r.description.clone().unwrap_or_default(),
                    ],
                    &r.comparison,
                )
            })
            .collect(),
    )?;

    emit(
        dir,
        &mut written,
        "tax_totals.csv",
        &["tax_type", "summary_value", "ledger_value", "difference", "divergent_codes"],
        result
            .tax_totals
            .iter()
            .map(|t| {
                vec![
                    t.tax_type.to_string(),
                    t.summary_value.to_string(),
                    t.ledger_value.to_string(),
                    t.difference.to_string(),
                    t.divergent_codes.to_string(),
                ]
            })
            .collect(),
    )?;

    emit(
        dir,
        &mut written,
        "composition.csv",
        &headers_with_comparison(&["ledger_code", "events", "description"]),
        result
            .composition
            .iter()
            .map(|r| {
                with_comparison(
                    vec![
                        r.ledger_code.clone(),
                        r.events.clone(),
                        r.description.clone().unwrap_or_default(),
                    ],
                    &r.comparison,
                )
            })
            .collect(),
    )?;

    emit(
        dir,
        &mut written,
        "unmapped.csv",
        &["ledger_code", "amount", "description", "reason"],
        result
            .unmapped
            .iter()
            .map(|u| {
                vec![
                    u.ledger_code.clone(),
                    u.amount.to_string(),
                    u.description.clone(),
                    u.reason.to_string(),
                ]
            })
            .collect(),
    )?;

    if let Some(declared) = &result.declared_taxes {
        emit(
            dir,
            &mut written,
            "declared_taxes.csv",
            &headers_with_comparison(&["figure", "ledger_additions", "ledger_deductions"]),
            declared
                .rows
                .iter()
                .map(|r| {
                    with_comparison(
                        vec![
                            r.figure.to_string(),
                            r.ledger_additions.to_string(),
                            r.ledger_deductions.to_string(),
                        ],
                        &r.comparison,
                    )
                })
                .collect(),
        )?;
    }

    Ok(written)
}
