use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;

use crate::aggregate::{
    ledger_by_category, ledger_by_code, links_by_event, summary_by_category, summary_by_event,
    summary_by_ledger_code,
};
use crate::classify::compare;
use crate::config::ReconConfig;
use crate::derived::{build_composition, build_declared_taxes, build_taxes};
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::ledger::LedgerPostingRow;
use crate::mapping::{Mapping, MappingLoad};
use crate::matcher::{outer_join, SortCode};
use crate::model::{
    CategoryRow, CategoryTotal, EventRow, LedgerCodeRow, ReconInput, ReconMeta, ReconResult,
    ReconSummary, UnlinkedEvent, UnreachedLedgerCode,
};
use crate::normalize::category;
use crate::summary::SummaryEventRow;

/// Run every reconciliation view over one summary/ledger pair.
pub fn run(config: &ReconConfig, input: &ReconInput, mapping: &MappingLoad) -> Result<ReconResult, ReconError> {
    config.validate()?;
    let tolerance = config.tolerance;
    let map = &mapping.mapping;

    let summary_totals = summary_by_category(&input.summary);
    let ledger_split = ledger_by_category(&input.ledger, map);

    let by_category = reconcile_by_category(&summary_totals, &ledger_split.totals, tolerance);
    let events = reconcile_by_event(&input.summary, &input.ledger, map, tolerance);
    let by_ledger_code = reconcile_by_ledger_code(&input.summary, &input.ledger, map, tolerance);
    let (taxes, tax_totals) = build_taxes(&input.summary, &input.ledger, map, config);
    let composition = build_composition(&input.summary, &input.ledger, map, config);
    let declared_taxes = input
        .declared
        .as_ref()
        .map(|d| build_declared_taxes(d, &input.ledger, map, config));

    let mut result = ReconResult {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            tolerance,
            sign_mode: config.summary.sign_mode,
            mapping: mapping.status.clone(),
        },
        summary: ReconSummary::default(),
        summary_totals,
        ledger_totals: ledger_split.totals,
        by_category,
        by_event: events.rows,
        unlinked_events: events.unlinked,
        unreached_ledger_codes: events.unreached,
        by_ledger_code,
        taxes,
        tax_totals,
        composition,
        unmapped: ledger_split.unmapped,
        declared_taxes,
    };
    result.summary = compute_summary(&result, input.summary.len(), input.ledger.len());

    let s = &result.summary;
    log::info!(
        "recon: {} categories, {} events, {} ledger codes, {} unmapped postings, all matched: {}",
        s.by_category.rows,
        s.by_event.rows,
        s.by_ledger_code.rows,
        s.unmapped_postings,
        s.all_matched
    );

    Ok(result)
}

/// Summary category nets against ledger category nets.
pub fn reconcile_by_category(
    summary: &[CategoryTotal],
    ledger: &[CategoryTotal],
    tolerance: Decimal,
) -> Vec<CategoryRow> {
    let nets = |totals: &[CategoryTotal]| -> BTreeMap<String, Decimal> {
        totals.iter().map(|t| (t.category.clone(), t.net)).collect()
    };

    outer_join(&nets(summary), &nets(ledger))
        .into_iter()
        .map(|(category, s, l)| CategoryRow { category, comparison: compare(s, l, tolerance) })
        .collect()
}

/// By-event view plus its two side lists.
#[derive(Debug, Clone, Default)]
pub struct EventView {
    pub rows: Vec<EventRow>,
    pub unlinked: Vec<UnlinkedEvent>,
    pub unreached: Vec<UnreachedLedgerCode>,
}

/// Each summary event against the ledger total of every ledger code it maps
/// to within its category. Events without a mapping keep a row with a zero
/// ledger side.
pub fn reconcile_by_event(
    events: &[SummaryEventRow],
    postings: &[LedgerPostingRow],
    mapping: &Mapping,
    tolerance: Decimal,
) -> EventView {
    let links = links_by_event(mapping);
    let ledger = ledger_by_code(postings, mapping);
    let mut reached: HashSet<(String, String)> = HashSet::new();
    let mut view = EventView::default();

    for ((cat, code), agg) in summary_by_event(events) {
        let key = (cat.clone(), code.as_str().to_string());
        match links.get(&key) {
            Some(ledger_codes) => {
                for ledger_code in ledger_codes {
                    let ledger_value = ledger
                        .get(&(cat.clone(), SortCode::new(ledger_code.as_str())))
                        .copied()
                        .unwrap_or_default();
                    reached.insert((cat.clone(), ledger_code.clone()));
                    view.rows.push(EventRow {
                        category: cat.clone(),
                        event_code: code.as_str().to_string(),
                        event_name: agg.event_name.clone(),
                        ledger_code: Some(ledger_code.clone()),
                        comparison: compare(agg.amount, ledger_value, tolerance),
                    });
                }
            }
            None => {
                view.unlinked.push(UnlinkedEvent {
                    category: cat.clone(),
                    event_code: code.as_str().to_string(),
                    event_name: agg.event_name.clone(),
                });
                view.rows.push(EventRow {
                    category: cat,
                    event_code: code.as_str().to_string(),
                    event_name: agg.event_name,
                    ledger_code: None,
                    comparison: compare(agg.amount, Decimal::ZERO, tolerance),
                });
            }
        }
    }

    view.unreached = ledger
        .into_iter()
        .filter(|((cat, code), _)| {
            cat != category::UNMAPPED && !reached.contains(&(cat.clone(), code.as_str().to_string()))
        })
        .map(|((cat, code), ledger_value)| UnreachedLedgerCode {
            category: cat,
            ledger_code: code.0,
            ledger_value,
        })
        .collect();

    if !view.unlinked.is_empty() {
        log::info!("recon: {} summary events without mapping", view.unlinked.len());
    }
    view
}

/// Summary events rolled up to ledger codes against ledger postings per code.
pub fn reconcile_by_ledger_code(
    events: &[SummaryEventRow],
    postings: &[LedgerPostingRow],
    mapping: &Mapping,
    tolerance: Decimal,
) -> Vec<LedgerCodeRow> {
    let summary = summary_by_ledger_code(events, mapping);
    let ledger = ledger_by_code(postings, mapping);

    outer_join(&summary, &ledger)
        .into_iter()
        .map(|((category, code), s, l)| LedgerCodeRow {
            category,
            ledger_code: code.0,
            comparison: compare(s, l, tolerance),
        })
        .collect()
}
