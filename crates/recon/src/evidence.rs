use crate::model::{Comparison, MatchStatus, ReconResult, ReconSummary, ViewCounts};

/// Count rows per status for one view.
pub fn count_view<'a>(comparisons: impl IntoIterator<Item = &'a Comparison>) -> ViewCounts {
    let mut counts = ViewCounts::default();
    for c in comparisons {
        counts.rows += 1;
        match c.status {
            MatchStatus::Match => counts.matched += 1,
            MatchStatus::Divergent => counts.divergent += 1,
        }
    }
    counts
}

/// Compute summary statistics over every view of a result.
pub fn compute_summary(result: &ReconResult, summary_events: usize, ledger_postings: usize) -> ReconSummary {
    let by_category = count_view(result.by_category.iter().map(|r| &r.comparison));
    let by_event = count_view(result.by_event.iter().map(|r| &r.comparison));
    let by_ledger_code = count_view(result.by_ledger_code.iter().map(|r| &r.comparison));
    let taxes = count_view(result.taxes.iter().map(|r| &r.comparison));
    let composition = count_view(result.composition.iter().map(|r| &r.comparison));
    let declared_taxes = result
        .declared_taxes
        .as_ref()
        .map(|d| count_view(d.rows.iter().map(|r| &r.comparison)));

    let divergent = by_category.divergent
        + by_event.divergent
        + by_ledger_code.divergent
        + taxes.divergent
        + composition.divergent
        + declared_taxes.as_ref().map_or(0, |d| d.divergent);

    ReconSummary {
        summary_events,
        ledger_postings,
        by_category,
        by_event,
        by_ledger_code,
        taxes,
        composition,
        declared_taxes,
        unmapped_postings: result.unmapped.len(),
        unlinked_events: result.unlinked_events.len(),
        unreached_ledger_codes: result.unreached_ledger_codes.len(),
        all_matched: divergent == 0 && result.unmapped.is_empty(),
    }
}
