//! Derived views layered on the core reconciliation: tax codes, ledger-code
//! composition and declared tax totals.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use rust_decimal::Decimal;

use crate::aggregate::{ledger_detail_by_code, summary_detail_by_code};
use crate::classify::compare;
use crate::config::{ReconConfig, TaxType};
use crate::general::TaxDeclaration;
use crate::ledger::LedgerPostingRow;
use crate::mapping::{normalize_ledger_code, FlowType, Mapping};
use crate::matcher::SortCode;
use crate::money::unsigned_zero;
use crate::model::{
    CompositionRow, DeclaredFigure, DeclaredTaxRow, DeclaredTaxes, LoanTotals, MatchStatus, TaxRow, TaxTypeTotal,
};
use crate::normalize::canonicalize_category;
use crate::summary::SummaryEventRow;

/// Per-code tax reconciliation plus per-tax-type totals.
///
/// Both sides are absolute-valued. Loan codes are left out even when a tax
/// set lists them.
pub fn build_taxes(
    events: &[SummaryEventRow],
    postings: &[LedgerPostingRow],
    mapping: &Mapping,
    config: &ReconConfig,
) -> (Vec<TaxRow>, Vec<TaxTypeTotal>) {
    let lookup = config.taxes.lookup();
    let loans = config.loans.all_codes();
    let summary = summary_detail_by_code(events, mapping);
    let ledger = ledger_detail_by_code(postings);

    let codes: BTreeSet<&SortCode> = summary.keys().chain(ledger.keys()).collect();
    let mut keyed: BTreeMap<(String, SortCode), TaxRow> = BTreeMap::new();

    for code in codes {
        let Some(&tax_type) = lookup.get(code.as_str()) else {
            continue;
        };
        if loans.contains(code.as_str()) {
            continue;
        }
        let s = summary.get(code);
        let l = ledger.get(code);
        let summary_value = s.map(|d| d.amount).unwrap_or_default().abs();
        let ledger_value = l.map(|d| d.amount).unwrap_or_default().abs();

        keyed.insert(
            (tax_type.to_string(), code.clone()),
            TaxRow {
                tax_type,
                ledger_code: code.as_str().to_string(),
                events: s.map(|d| d.events_joined()).unwrap_or_default(),
                description: l.and_then(|d| d.description.clone()),
                comparison: compare(summary_value, ledger_value, config.tolerance),
            },
        );
    }

    let rows: Vec<TaxRow> = keyed.into_values().collect();

    let totals = TaxType::ALL
        .into_iter()
        .map(|tax_type| {
            let of_type = rows.iter().filter(|r| r.tax_type == tax_type);
            let mut total = TaxTypeTotal {
                tax_type,
                summary_value: Decimal::ZERO,
                ledger_value: Decimal::ZERO,
                difference: Decimal::ZERO,
                divergent_codes: 0,
            };
            for r in of_type {
                total.summary_value += r.comparison.summary_value;
                total.ledger_value += r.comparison.ledger_value;
                total.difference += r.comparison.difference;
                if r.comparison.status == MatchStatus::Divergent {
                    total.divergent_codes += 1;
                }
            }
            total.difference = unsigned_zero(total.difference);
            total
        })
        .collect();

    (rows, totals)
}

/// Audit drill-down: every ledger code with the summary events feeding it.
///
/// Codes on the configured denylist, and every code mapped to one of the
/// excluded categories, are left out.
pub fn build_composition(
    events: &[SummaryEventRow],
    postings: &[LedgerPostingRow],
    mapping: &Mapping,
    config: &ReconConfig,
) -> Vec<CompositionRow> {
    let mut excluded: HashSet<String> = config
        .composition
        .excluded_codes
        .iter()
        .map(|c| normalize_ledger_code(c))
        .collect();
    let excluded_categories: HashSet<String> = config
        .composition
        .excluded_categories
        .iter()
        .map(|c| canonicalize_category(c))
        .collect();
    for entry in mapping.entries() {
        if !entry.ledger_code.is_empty() && excluded_categories.contains(&entry.category) {
            excluded.insert(entry.ledger_code.clone());
        }
    }

    let summary = summary_detail_by_code(events, mapping);
    let ledger = ledger_detail_by_code(postings);
    let codes: BTreeSet<&SortCode> = summary.keys().chain(ledger.keys()).collect();

    codes
        .into_iter()
        .filter(|code| !excluded.contains(code.as_str()))
        .map(|code| {
            let s = summary.get(code);
            let l = ledger.get(code);
            let summary_value = s.map(|d| d.amount).unwrap_or_default().abs();
            let ledger_value = l.map(|d| d.amount).unwrap_or_default().abs();
            CompositionRow {
                ledger_code: code.as_str().to_string(),
                events: s.map(|d| d.events_joined()).unwrap_or_default(),
                description: l.and_then(|d| d.description.clone()),
                comparison: compare(summary_value, ledger_value, config.tolerance),
            }
        })
        .collect()
}

/// Declared tax totals against ledger nets.
///
/// A tax type's codes and flow types come from the mapping entries filed
/// under a category of the same name (`INSS`, `IRRF`, `FGTS`). Without such
/// entries the configured code set is used, every code counting as an
/// addition. Loan codes are always left out. The ledger net is additions
/// minus deductions.
///
/// When the declaration carries net pró-labore, partners and self-employed
/// are checked against the `[declared.pro_labore]` code sets the same way.
pub fn build_declared_taxes(
    declaration: &TaxDeclaration,
    postings: &[LedgerPostingRow],
    mapping: &Mapping,
    config: &ReconConfig,
) -> DeclaredTaxes {
    let loans = config.loans.all_codes();

    let mut rows: Vec<DeclaredTaxRow> = TaxType::ALL
        .into_iter()
        .map(|tax_type| {
            let tax_name = tax_type.to_string();
            let mut flows: HashMap<String, FlowType> = mapping
                .entries()
                .iter()
                .filter(|e| e.category == tax_name && !e.ledger_code.is_empty())
                .map(|e| (e.ledger_code.clone(), e.flow_type))
                .collect();
            if flows.is_empty() {
                flows = config
                    .taxes
                    .codes_for(tax_type)
                    .iter()
                    .map(|c| (normalize_ledger_code(c), FlowType::Addition))
                    .collect();
            }
            flows.retain(|code, _| !loans.contains(code));

            let declared = match tax_type {
                TaxType::Inss => declaration.inss_net,
                TaxType::Irrf => Some(declaration.irrf.total()),
                TaxType::Fgts => declaration.fgts_assessed,
            }
            .unwrap_or_default();

            declared_row(tax_type.into(), declared, sum_flows(postings, |code| flows.get(code).copied()), config)
        })
        .collect();

    if let Some(net) = &declaration.pro_labore {
        let groups = [
            (DeclaredFigure::ProLaborePartners, net.partners, &config.declared.pro_labore.partners),
            (DeclaredFigure::ProLaboreSelfEmployed, net.self_employed, &config.declared.pro_labore.self_employed),
        ];
        for (figure, declared, codes) in groups {
            let (adds, deds) = codes.normalized();
            let sums = sum_flows(postings, by_code_sets(&adds, &deds));
            rows.push(declared_row(figure, declared, sums, config));
        }
    }

    DeclaredTaxes {
        declaration: declaration.clone(),
        rows,
        loans: loan_totals(postings, config),
    }
}

fn declared_row(
    figure: DeclaredFigure,
    declared: Decimal,
    (additions, deductions): (Decimal, Decimal),
    config: &ReconConfig,
) -> DeclaredTaxRow {
    DeclaredTaxRow {
        figure,
        ledger_additions: additions,
        ledger_deductions: deductions,
        comparison: compare(declared, additions - deductions, config.tolerance),
    }
}

/// `(additions, deductions)` over the postings whose code `flow_of` places.
fn sum_flows<F>(postings: &[LedgerPostingRow], flow_of: F) -> (Decimal, Decimal)
where
    F: Fn(&str) -> Option<FlowType>,
{
    let mut additions = Decimal::ZERO;
    let mut deductions = Decimal::ZERO;
    for p in postings {
        match flow_of(&p.ledger_code) {
            Some(FlowType::Addition) => additions += p.amount,
            Some(FlowType::Deduction) => deductions += p.amount,
            None => {}
        }
    }
    (additions, deductions)
}

fn by_code_sets<'a>(
    adds: &'a HashSet<String>,
    deds: &'a HashSet<String>,
) -> impl Fn(&str) -> Option<FlowType> + 'a {
    move |code: &str| {
        if adds.contains(code) {
            Some(FlowType::Addition)
        } else if deds.contains(code) {
            Some(FlowType::Deduction)
        } else {
            None
        }
    }
}

/// Net of the internal-transfer (loan) codes: additions minus deductions.
pub fn loan_totals(postings: &[LedgerPostingRow], config: &ReconConfig) -> LoanTotals {
    let adds: HashSet<String> = config.loans.additions.iter().map(|c| normalize_ledger_code(c)).collect();
    let deds: HashSet<String> = config.loans.deductions.iter().map(|c| normalize_ledger_code(c)).collect();

    let (additions, deductions) = sum_flows(postings, by_code_sets(&adds, &deds));
    LoanTotals { additions, deductions, net: unsigned_zero(additions - deductions) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::general::IrrfBreakdown;
    use crate::mapping::MappingEntry;
    use crate::summary::Sign;
    use rust_decimal_macros::dec;

    fn event(cat: &str, code: &str, sign: Sign, amount: Decimal) -> SummaryEventRow {
        SummaryEventRow {
            category: cat.into(),
            event_code: code.into(),
            event_name: String::new(),
            sign,
            amount,
        }
    }

    fn posting(code: &str, amount: Decimal, description: &str) -> LedgerPostingRow {
        LedgerPostingRow {
            ledger_code: code.into(),
            amount,
            description: description.into(),
            debit_account: String::new(),
            credit_account: String::new(),
        }
    }

    fn entry(cat: &str, ev: &str, la: &str, flow: FlowType) -> MappingEntry {
        MappingEntry {
            category: cat.into(),
            event_code: ev.into(),
            ledger_code: la.into(),
            flow_type: flow,
        }
    }

    fn mapping() -> Mapping {
        Mapping::from_entries(vec![
            entry("Folha", "013", "30039", FlowType::Deduction),
            entry("Férias", "014", "30039", FlowType::Deduction),
            entry("Folha", "310", "30058", FlowType::Deduction),
            entry("Folha", "001", "30001", FlowType::Addition),
            entry("Folha", "700", "30051", FlowType::Addition),
            entry("Pró-Labore", "003", "30100", FlowType::Addition),
            entry("INSS", "", "30050", FlowType::Addition),
            entry("INSS", "", "30073", FlowType::Deduction),
            entry("FGTS", "", "30074", FlowType::Deduction),
        ])
    }

    #[test]
    fn tax_rows_are_absolute_and_grouped_by_type() {
        let events = vec![
            event("Folha", "013", Sign::Minus, dec!(80)),
            event("Férias", "014", Sign::Minus, dec!(20)),
            event("Folha", "310", Sign::Minus, dec!(15)),
            event("Folha", "001", Sign::Plus, dec!(1000)),
        ];
        let postings = vec![
            posting("30039", dec!(100), "INSS"),
            posting("30058", dec!(14), "IRRF"),
            posting("30051", dec!(77), "FGTS"),
        ];
        let (rows, totals) = build_taxes(&events, &postings, &mapping(), &ReconConfig::default());

        let codes: Vec<&str> = rows.iter().map(|r| r.ledger_code.as_str()).collect();
        assert_eq!(codes, vec!["30051", "30039", "30058"]);

        let inss = &rows[1];
        assert_eq!(inss.tax_type, TaxType::Inss);
        assert_eq!(inss.events, "013, 014");
        assert_eq!(inss.comparison.summary_value, dec!(100));
        assert_eq!(inss.comparison.status, MatchStatus::Match);

        let irrf = &rows[2];
        assert_eq!(irrf.comparison.difference, dec!(1));
        assert_eq!(irrf.description.as_deref(), Some("IRRF"));

        let fgts = &rows[0];
        assert_eq!(fgts.events, "");
        assert_eq!(fgts.comparison.summary_value, dec!(0));

        let irrf_total = totals.iter().find(|t| t.tax_type == TaxType::Irrf).unwrap();
        assert_eq!(irrf_total.divergent_codes, 1);
        assert_eq!(totals.len(), 3);
    }

    #[test]
    fn loan_codes_never_enter_tax_rows() {
        let mut config = ReconConfig::default();
        config.taxes.fgts.push("30074".into());
        let postings = vec![posting("30074", dec!(50), "EMPRESTIMO FGTS")];
        let (rows, _) = build_taxes(&[], &postings, &Mapping::default(), &config);
        assert!(rows.is_empty());
    }

    #[test]
    fn composition_excludes_denylist_and_categories() {
        let mut config = ReconConfig::default();
        config.composition.excluded_categories = vec!["pro labore".into()];
        let events = vec![
            event("Folha", "001", Sign::Plus, dec!(1000)),
            event("Folha", "700", Sign::Plus, dec!(77)),
            event("Pró-Labore", "003", Sign::Plus, dec!(5000)),
        ];
        let postings = vec![
            posting("30001", dec!(999), "SALARIOS"),
            posting("30100", dec!(5000), "PRO LABORE"),
            posting("99999", dec!(3), "OUTROS"),
        ];
        let rows = build_composition(&events, &postings, &mapping(), &config);
        let codes: Vec<&str> = rows.iter().map(|r| r.ledger_code.as_str()).collect();
        assert_eq!(codes, vec!["30001", "99999"]);
        assert_eq!(rows[0].events, "001");
        assert_eq!(rows[0].comparison.difference, dec!(1));
        assert_eq!(rows[1].comparison.summary_value, dec!(0));
        assert_eq!(rows[1].description.as_deref(), Some("OUTROS"));
    }

    #[test]
    fn declared_taxes_net_by_flow_type() {
        let declaration = TaxDeclaration {
            inss_net: Some(dec!(30)),
            fgts_assessed: Some(dec!(77)),
            irrf: IrrfBreakdown { payroll: Some(dec!(14)), ..Default::default() },
            pro_labore: None,
        };
        let postings = vec![
            posting("30039", dec!(100), "INSS"),
            posting("30050", dec!(50), "INSS EMPRESA"),
            posting("30073", dec!(20), "INSS DEVOLVIDO"),
            posting("30058", dec!(14), "IRRF"),
            posting("30051", dec!(77), "FGTS"),
            posting("30074", dec!(40), "EMPRESTIMO"),
            posting("30075", dec!(100), "EMPRESTIMO"),
        ];
        let d = build_declared_taxes(&declaration, &postings, &mapping(), &ReconConfig::default());

        // INSS codes come from the INSS mapping category only.
        let inss = &d.rows[0];
        assert_eq!(inss.figure, DeclaredFigure::Inss);
        assert_eq!(inss.ledger_additions, dec!(50));
        assert_eq!(inss.ledger_deductions, dec!(20));
        assert_eq!(inss.comparison.ledger_value, dec!(30));
        assert_eq!(inss.comparison.status, MatchStatus::Match);

        // No IRRF category in the mapping: configured set, all additions.
        assert_eq!(d.rows[1].ledger_additions, dec!(14));
        assert_eq!(d.rows[1].comparison.status, MatchStatus::Match);

        // The FGTS category only holds a loan code, which never counts.
        assert_eq!(d.rows[2].comparison.ledger_value, dec!(0));
        assert_eq!(d.rows[2].comparison.status, MatchStatus::Divergent);

        assert_eq!(d.loans.additions, dec!(100));
        assert_eq!(d.loans.deductions, dec!(40));
        assert_eq!(d.loans.net, dec!(60));
    }
}
