use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;

use crate::ledger::LedgerPostingRow;
use crate::mapping::{FlowType, Mapping};
use crate::matcher::SortCode;
use crate::model::{CategoryTotal, UnmappedPosting, UnmappedReason};
use crate::money::unsigned_zero;
use crate::normalize::{category, normalize};
use crate::summary::SummaryEventRow;

/// `(category, code)` grouping key, ordered by category then numeric code.
pub type CodeKey = (String, SortCode);

/// Split signed amounts into additions and deductions per category.
pub fn fold_totals<'a>(signed: impl IntoIterator<Item = (&'a str, Decimal)>) -> Vec<CategoryTotal> {
    let mut groups: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
    for (cat, amount) in signed {
        let entry = groups.entry(cat).or_default();
        if amount.is_sign_negative() {
            entry.1 += amount;
        } else {
            entry.0 += amount;
        }
    }

    groups
        .into_iter()
        .map(|(cat, (additions, deductions))| CategoryTotal {
            category: cat.to_string(),
            additions: unsigned_zero(additions),
            deductions: unsigned_zero(deductions),
            net: unsigned_zero(additions + deductions),
        })
        .collect()
}

/// Summary additions (`+`) and deductions (`-`) per category.
pub fn summary_by_category(rows: &[SummaryEventRow]) -> Vec<CategoryTotal> {
    fold_totals(rows.iter().map(|r| (r.category.as_str(), r.signed_amount())))
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventAggregate {
    pub amount: Decimal,
    /// First non-empty name among the grouped lines.
    pub event_name: String,
}

/// Signed summary amounts per `(category, event_code)`. Repeated lines of the
/// same event are summed.
pub fn summary_by_event(rows: &[SummaryEventRow]) -> BTreeMap<CodeKey, EventAggregate> {
    let mut out: BTreeMap<CodeKey, EventAggregate> = BTreeMap::new();
    for row in rows {
        let entry = out
            .entry((row.category.clone(), SortCode::new(&row.event_code)))
            .or_insert_with(|| EventAggregate { amount: Decimal::ZERO, event_name: String::new() });
        entry.amount += row.signed_amount();
        if entry.event_name.is_empty() {
            entry.event_name = row.event_name.clone();
        }
    }
    out
}

/// Category from a ledger description. Tax keywords win over everything else.
pub fn classify_description(description: &str) -> Option<&'static str> {
    let d = normalize(description);
    if ["inss", "fgts", "irrf"].iter().any(|k| d.contains(k)) {
        Some(category::TAXES)
    } else if d.contains("rescisao") {
        Some(category::SEVERANCE)
    } else if d.contains("ferias") {
        Some(category::VACATION)
    } else if d.contains("adiantamento") {
        Some(category::ADVANCE)
    } else if d.contains("folha") {
        Some(category::PAYROLL)
    } else {
        None
    }
}

/// Posting amount with the mapping's flow direction applied.
pub fn signed_ledger_amount(posting: &LedgerPostingRow, flows: &HashMap<String, FlowType>) -> Decimal {
    flows.get(&posting.ledger_code).copied().unwrap_or_default().apply(posting.amount)
}

#[derive(Debug, Clone, Default)]
pub struct LedgerCategorySplit {
    pub totals: Vec<CategoryTotal>,
    pub unmapped: Vec<UnmappedPosting>,
}

/// Ledger nets per category.
///
/// A posting is categorized by its description keywords, falling back to the
/// mapping's reverse lookup. A ledger code unknown to the mapping lands in the
/// unmapped bucket and stays out of the totals.
pub fn ledger_by_category(postings: &[LedgerPostingRow], mapping: &Mapping) -> LedgerCategorySplit {
    let flows = mapping.ledger_flows();
    let la2cat = mapping.ledger_to_category();
    let mut signed: Vec<(String, Decimal)> = Vec::with_capacity(postings.len());
    let mut unmapped = Vec::new();

    for posting in postings {
        let Some(mapped) = la2cat.get(&posting.ledger_code) else {
            unmapped.push(UnmappedPosting {
                ledger_code: posting.ledger_code.clone(),
                amount: posting.amount,
                description: posting.description.clone(),
                reason: UnmappedReason::UnknownLedgerCode,
            });
            continue;
        };
        let cat = match classify_description(&posting.description) {
            Some(keyword) => keyword.to_string(),
            None => {
                log::debug!("ledger: {} has no category keyword, using {mapped}", posting.ledger_code);
                mapped.clone()
            }
        };
        signed.push((cat, signed_ledger_amount(posting, &flows)));
    }

    if !unmapped.is_empty() {
        log::info!("ledger: {} postings without category", unmapped.len());
    }

    LedgerCategorySplit {
        totals: fold_totals(signed.iter().map(|(cat, amount)| (cat.as_str(), *amount))),
        unmapped,
    }
}

/// Signed ledger sums per `(category, ledger_code)`, category from the
/// mapping's reverse lookup (`Sem Mapeamento` when unknown).
pub fn ledger_by_code(postings: &[LedgerPostingRow], mapping: &Mapping) -> BTreeMap<CodeKey, Decimal> {
    let la2cat = mapping.ledger_to_category();
    let flows = mapping.ledger_flows();
    let mut out: BTreeMap<CodeKey, Decimal> = BTreeMap::new();
    for posting in postings {
        let cat = la2cat
            .get(&posting.ledger_code)
            .cloned()
            .unwrap_or_else(|| category::UNMAPPED.to_string());
        *out.entry((cat, SortCode::new(&posting.ledger_code))).or_default() +=
            signed_ledger_amount(posting, &flows);
    }
    out
}

/// Summary events rolled up to the ledger codes they map to, per category.
/// Events without a mapping are left out.
pub fn summary_by_ledger_code(rows: &[SummaryEventRow], mapping: &Mapping) -> BTreeMap<CodeKey, Decimal> {
    let links = links_by_event(mapping);
    let mut out: BTreeMap<CodeKey, Decimal> = BTreeMap::new();
    for row in rows {
        let key = (row.category.clone(), row.event_code.clone());
        for ledger_code in links.get(&key).into_iter().flatten() {
            *out.entry((row.category.clone(), SortCode::new(ledger_code))).or_default() +=
                row.signed_amount();
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryCodeDetail {
    /// Signed sum across categories.
    pub amount: Decimal,
    pub events: BTreeSet<String>,
}

impl SummaryCodeDetail {
    pub fn events_joined(&self) -> String {
        self.events.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Summary amounts and contributing event codes per ledger code.
pub fn summary_detail_by_code(
    rows: &[SummaryEventRow],
    mapping: &Mapping,
) -> BTreeMap<SortCode, SummaryCodeDetail> {
    let links = links_by_event(mapping);
    let mut out: BTreeMap<SortCode, SummaryCodeDetail> = BTreeMap::new();
    for row in rows {
        let key = (row.category.clone(), row.event_code.clone());
        for ledger_code in links.get(&key).into_iter().flatten() {
            let entry = out.entry(SortCode::new(ledger_code)).or_default();
            entry.amount += row.signed_amount();
            entry.events.insert(row.event_code.clone());
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerCodeDetail {
    /// Sum of the absolute posting amounts.
    pub amount: Decimal,
    /// First description seen for the code.
    pub description: Option<String>,
}

pub fn ledger_detail_by_code(postings: &[LedgerPostingRow]) -> BTreeMap<SortCode, LedgerCodeDetail> {
    let mut out: BTreeMap<SortCode, LedgerCodeDetail> = BTreeMap::new();
    for posting in postings {
        let entry = out.entry(SortCode::new(&posting.ledger_code)).or_default();
        entry.amount += posting.amount;
        if entry.description.is_none() {
            entry.description = Some(posting.description.clone());
        }
    }
    out
}

/// `(category, event_code)` → ledger codes, in mapping order.
pub fn links_by_event(mapping: &Mapping) -> HashMap<(String, String), Vec<String>> {
    let mut out: HashMap<(String, String), Vec<String>> = HashMap::new();
    for link in mapping.event_to_ledger() {
        out.entry((link.category, link.event_code)).or_default().push(link.ledger_code);
    }
    out
}
