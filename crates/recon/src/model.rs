use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::{SignMode, TaxType};
use crate::general::TaxDeclaration;
use crate::ledger::LedgerPostingRow;
use crate::mapping::MappingStatus;
use crate::summary::SummaryEventRow;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Extracted records of one payroll run.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub summary: Vec<SummaryEventRow>,
    pub ledger: Vec<LedgerPostingRow>,
    /// Tax totals stated by the general summary, when one was supplied.
    pub declared: Option<TaxDeclaration>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Per-category sums. `deductions` is zero or negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub additions: Decimal,
    pub deductions: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedReason {
    /// Ledger code has no entry in the mapping table.
    UnknownLedgerCode,
}

impl std::fmt::Display for UnmappedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLedgerCode => write!(f, "unknown_ledger_code"),
        }
    }
}

/// Ledger posting left out of every category net.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmappedPosting {
    pub ledger_code: String,
    pub amount: Decimal,
    pub description: String,
    pub reason: UnmappedReason,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Match,
    Divergent,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Match => write!(f, "match"),
            Self::Divergent => write!(f, "divergent"),
        }
    }
}

/// Summary value against ledger value. `difference` is exactly
/// `summary_value - ledger_value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub summary_value: Decimal,
    pub ledger_value: Decimal,
    pub difference: Decimal,
    pub status: MatchStatus,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub category: String,
    #[serde(flatten)]
    pub comparison: Comparison,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRow {
    pub category: String,
    pub event_code: String,
    pub event_name: String,
    /// `None` when the event has no mapping entry.
    pub ledger_code: Option<String>,
    #[serde(flatten)]
    pub comparison: Comparison,
}

/// Summary event with no mapping entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnlinkedEvent {
    pub category: String,
    pub event_code: String,
    pub event_name: String,
}

/// Mapped ledger code with postings that no summary event reaches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnreachedLedgerCode {
    pub category: String,
    pub ledger_code: String,
    pub ledger_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerCodeRow {
    pub category: String,
    pub ledger_code: String,
    #[serde(flatten)]
    pub comparison: Comparison,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxRow {
    pub tax_type: TaxType,
    pub ledger_code: String,
    /// Contributing event codes, sorted and comma-joined.
    pub events: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub comparison: Comparison,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxTypeTotal {
    pub tax_type: TaxType,
    pub summary_value: Decimal,
    pub ledger_value: Decimal,
    pub difference: Decimal,
    pub divergent_codes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionRow {
    pub ledger_code: String,
    pub events: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub comparison: Comparison,
}

/// A figure read from the general summary that is checked against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredFigure {
    #[serde(rename = "INSS")]
    Inss,
    #[serde(rename = "IRRF")]
    Irrf,
    #[serde(rename = "FGTS")]
    Fgts,
    ProLaborePartners,
    ProLaboreSelfEmployed,
}

impl From<TaxType> for DeclaredFigure {
    fn from(tax: TaxType) -> Self {
        match tax {
            TaxType::Inss => Self::Inss,
            TaxType::Irrf => Self::Irrf,
            TaxType::Fgts => Self::Fgts,
        }
    }
}

impl fmt::Display for DeclaredFigure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inss => write!(f, "INSS"),
            Self::Irrf => write!(f, "IRRF"),
            Self::Fgts => write!(f, "FGTS"),
            Self::ProLaborePartners => write!(f, "pro_labore_partners"),
            Self::ProLaboreSelfEmployed => write!(f, "pro_labore_self_employed"),
        }
    }
}

/// Declared figure (general summary) against the ledger net.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclaredTaxRow {
    pub figure: DeclaredFigure,
    pub ledger_additions: Decimal,
    pub ledger_deductions: Decimal,
    #[serde(flatten)]
    pub comparison: Comparison,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoanTotals {
    pub additions: Decimal,
    pub deductions: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclaredTaxes {
    pub declaration: TaxDeclaration,
    pub rows: Vec<DeclaredTaxRow>,
    pub loans: LoanTotals,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewCounts {
    pub rows: usize,
    pub matched: usize,
    pub divergent: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconSummary {
    pub summary_events: usize,
    pub ledger_postings: usize,
    pub by_category: ViewCounts,
    pub by_event: ViewCounts,
    pub by_ledger_code: ViewCounts,
    pub taxes: ViewCounts,
    pub composition: ViewCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_taxes: Option<ViewCounts>,
    pub unmapped_postings: usize,
    pub unlinked_events: usize,
    pub unreached_ledger_codes: usize,
    /// No divergent row in any view and nothing left unmapped.
    pub all_matched: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
    pub tolerance: Decimal,
    pub sign_mode: SignMode,
    pub mapping: MappingStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub summary_totals: Vec<CategoryTotal>,
    pub ledger_totals: Vec<CategoryTotal>,
    pub by_category: Vec<CategoryRow>,
    pub by_event: Vec<EventRow>,
    pub unlinked_events: Vec<UnlinkedEvent>,
    pub unreached_ledger_codes: Vec<UnreachedLedgerCode>,
    pub by_ledger_code: Vec<LedgerCodeRow>,
    pub taxes: Vec<TaxRow>,
    pub tax_totals: Vec<TaxTypeTotal>,
    pub composition: Vec<CompositionRow>,
    pub unmapped: Vec<UnmappedPosting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_taxes: Option<DeclaredTaxes>,
}
