use std::collections::{HashMap, HashSet};
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::mapping::normalize_ledger_code;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration (`recon.toml`). Every section is optional; an empty
/// document reproduces the production defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default = "default_tolerance")]
    pub tolerance: Decimal,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub taxes: TaxConfig,
    #[serde(default)]
    pub loans: LoanConfig,
    #[serde(default)]
    pub composition: CompositionConfig,
    #[serde(default)]
    pub declared: DeclaredConfig,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            summary: SummaryConfig::default(),
            ledger: LedgerConfig::default(),
            taxes: TaxConfig::default(),
            loans: LoanConfig::default(),
            composition: CompositionConfig::default(),
            declared: DeclaredConfig::default(),
        }
    }
}

fn default_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

// ---------------------------------------------------------------------------
// Summary document
// ---------------------------------------------------------------------------

/// Where the sign of a summary event comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignMode {
    /// A `+`/`-` prefix in the code column; no prefix means `+`.
    #[default]
    Explicit,
    /// Layouts without a sign column: the mapping's flow type for
    /// `(category, event_code)` decides, `+` when unmapped.
    FromMapping,
}

impl fmt::Display for SignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::FromMapping => write!(f, "from_mapping"),
        }
    }
}

impl std::str::FromStr for SignMode {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explicit" => Ok(Self::Explicit),
            "from_mapping" | "from-mapping" => Ok(Self::FromMapping),
            other => Err(ReconError::ConfigValidation(format!(
                "unknown sign mode '{other}' (expected explicit or from_mapping)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryConfig {
    pub sign_mode: SignMode,
    /// Maximum vertical distance between token centers on one line.
    pub line_tolerance: f64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self { sign_mode: SignMode::Explicit, line_tolerance: 3.0 }
    }
}

// ---------------------------------------------------------------------------
// Ledger export
// ---------------------------------------------------------------------------

/// Zero-based field positions of the ledger export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    pub code_field: usize,
    pub amount_field: usize,
    pub debit_field: usize,
    pub credit_field: usize,
    pub description_field: usize,
    pub min_fields: usize,
    pub min_code_digits: usize,
    /// Force a delimiter instead of sniffing the first line.
    pub delimiter: Option<char>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            code_field: 1,
            amount_field: 3,
            debit_field: 4,
            credit_field: 5,
            description_field: 7,
            min_fields: 4,
            min_code_digits: 4,
            delimiter: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tax code sets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TaxType {
    #[serde(rename = "INSS")]
    Inss,
    #[serde(rename = "IRRF")]
    Irrf,
    #[serde(rename = "FGTS")]
    Fgts,
}

impl TaxType {
    pub const ALL: [TaxType; 3] = [TaxType::Inss, TaxType::Irrf, TaxType::Fgts];
}

impl fmt::Display for TaxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inss => write!(f, "INSS"),
            Self::Irrf => write!(f, "IRRF"),
            Self::Fgts => write!(f, "FGTS"),
        }
    }
}

/// Ledger codes per tax type. The three sets must be disjoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxConfig {
    pub inss: Vec<String>,
    pub irrf: Vec<String>,
    pub fgts: Vec<String>,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            inss: codes(&[
                "897", "30039", "30055", "30056", "30057", "30072", "30073", "40023", "60001",
                "70019", "80030",
            ]),
            irrf: codes(&["30058", "40024", "40025", "50003", "60002", "80031"]),
            fgts: codes(&["30051", "30059", "50026", "70015"]),
        }
    }
}

impl TaxConfig {
    pub fn codes_for(&self, tax: TaxType) -> &[String] {
        match tax {
            TaxType::Inss => &self.inss,
            TaxType::Irrf => &self.irrf,
            TaxType::Fgts => &self.fgts,
        }
    }

    /// Normalized ledger code → tax type.
    pub fn lookup(&self) -> HashMap<String, TaxType> {
        let mut out = HashMap::new();
        for tax in TaxType::ALL {
            for code in self.codes_for(tax) {
                out.insert(normalize_ledger_code(code), tax);
            }
        }
        out
    }
}

/// Internal-transfer (FGTS loan) ledger codes. Kept out of tax aggregates and
/// reported as their own net figure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoanConfig {
    pub additions: Vec<String>,
    pub deductions: Vec<String>,
}

impl Default for LoanConfig {
    fn default() -> Self {
        Self {
            additions: codes(&["30075", "40045", "50035", "70045"]),
            deductions: codes(&["30074", "70044"]),
        }
    }
}

impl LoanConfig {
    pub fn all_codes(&self) -> HashSet<String> {
        self.additions
            .iter()
            .chain(&self.deductions)
            .map(|c| normalize_ledger_code(c))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositionConfig {
    /// Ledger codes never listed in the composition view.
    pub excluded_codes: Vec<String>,
    /// Categories whose ledger codes are reported by a dedicated view.
    pub excluded_categories: Vec<String>,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            excluded_codes: codes(&["30051", "30059", "50026", "70015", "30072", "30073"]),
            excluded_categories: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Declared figures (general summary)
// ---------------------------------------------------------------------------

/// Ledger codes whose net (additions minus deductions) backs one declared
/// figure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlowCodes {
    pub additions: Vec<String>,
    pub deductions: Vec<String>,
}

impl FlowCodes {
    fn new(additions: &[&str], deductions: &[&str]) -> Self {
        Self { additions: codes(additions), deductions: codes(deductions) }
    }

    /// Normalized `(additions, deductions)` sets.
    pub fn normalized(&self) -> (HashSet<String>, HashSet<String>) {
        let set = |list: &[String]| list.iter().map(|c| normalize_ledger_code(c)).collect();
        (set(&self.additions), set(&self.deductions))
    }
}

/// Net pró-labore paid to partners and to self-employed contributors.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProLaboreConfig {
    pub partners: FlowCodes,
    pub self_employed: FlowCodes,
}

impl Default for ProLaboreConfig {
    fn default() -> Self {
        Self {
            partners: FlowCodes::new(&["30003", "30064"], &["30067", "30066"]),
            self_employed: FlowCodes::new(&["30060", "30069"], &["30070", "30071"]),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeclaredConfig {
    pub pro_labore: ProLaboreConfig,
}

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.tolerance <= Decimal::ZERO {
            return Err(ReconError::ConfigValidation(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }

        if !(self.summary.line_tolerance > 0.0) {
            return Err(ReconError::ConfigValidation(format!(
                "summary.line_tolerance must be positive, got {}",
                self.summary.line_tolerance
            )));
        }

        let l = &self.ledger;
        if l.min_fields == 0 {
            return Err(ReconError::ConfigValidation(
                "ledger.min_fields must be at least 1".into(),
            ));
        }
        for (name, idx) in [("code_field", l.code_field), ("amount_field", l.amount_field)] {
            if idx >= l.min_fields {
                return Err(ReconError::ConfigValidation(format!(
                    "ledger.{name} = {idx} lies beyond min_fields = {}",
                    l.min_fields
                )));
            }
        }
        if l.code_field == l.amount_field {
            return Err(ReconError::ConfigValidation(
                "ledger.code_field and ledger.amount_field must differ".into(),
            ));
        }
        if let Some(d) = l.delimiter {
            if d == '"' || d == '\n' || d == '\r' || !d.is_ascii() {
                return Err(ReconError::ConfigValidation(format!(
                    "ledger.delimiter {d:?} is not a usable single-byte delimiter"
                )));
            }
        }

        let all_code_lists = TaxType::ALL
            .into_iter()
            .map(|t| (format!("taxes.{}", t.to_string().to_lowercase()), self.taxes.codes_for(t)))
            .chain([
                ("loans.additions".to_string(), self.loans.additions.as_slice()),
                ("loans.deductions".to_string(), self.loans.deductions.as_slice()),
                ("composition.excluded_codes".to_string(), self.composition.excluded_codes.as_slice()),
            ])
            .chain(self.pro_labore_groups().flat_map(|(group, flows)| {
                [
                    (format!("declared.pro_labore.{group}.additions"), flows.additions.as_slice()),
                    (format!("declared.pro_labore.{group}.deductions"), flows.deductions.as_slice()),
                ]
            }));
        for (name, list) in all_code_lists {
            if let Some(bad) = list
                .iter()
                .find(|c| c.trim().is_empty() || !c.trim().chars().all(|ch| ch.is_ascii_digit()))
            {
                return Err(ReconError::ConfigValidation(format!(
                    "{name}: '{bad}' is not a numeric ledger code"
                )));
            }
        }

        let mut owner: HashMap<String, TaxType> = HashMap::new();
        for tax in TaxType::ALL {
            for code in self.taxes.codes_for(tax) {
                let code = normalize_ledger_code(code);
                if let Some(prev) = owner.insert(code.clone(), tax) {
                    if prev != tax {
                        return Err(ReconError::ConfigValidation(format!(
                            "ledger code {code} is listed under both {prev} and {tax}"
                        )));
                    }
                }
            }
        }

        let additions: HashSet<String> =
            self.loans.additions.iter().map(|c| normalize_ledger_code(c)).collect();
        if let Some(code) = self
            .loans
            .deductions
            .iter()
            .map(|c| normalize_ledger_code(c))
            .find(|c| additions.contains(c))
        {
            return Err(ReconError::ConfigValidation(format!(
                "loan code {code} is listed as both addition and deduction"
            )));
        }

        for (group, flows) in self.pro_labore_groups() {
            let (adds, deds) = flows.normalized();
            if let Some(code) = adds.intersection(&deds).next() {
                return Err(ReconError::ConfigValidation(format!(
                    "declared.pro_labore.{group}: code {code} is listed as both addition and deduction"
                )));
            }
        }

        Ok(())
    }

    fn pro_labore_groups(&self) -> impl Iterator<Item = (&'static str, &FlowCodes)> {
        let p = &self.declared.pro_labore;
        [("partners", &p.partners), ("self_employed", &p.self_employed)].into_iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const CUSTOM: &str = r#"
tolerance = "0.05"

[summary]
sign_mode = "from_mapping"
line_tolerance = 2.5

[ledger]
code_field = 0
amount_field = 2
description_field = 4
min_fields = 3
delimiter = ";"

[taxes]
inss = ["897", "30039", "30050"]
irrf = ["30058"]
fgts = ["30051"]

[composition]
excluded_categories = ["Pró-Labore"]
"#;

    #[test]
    fn empty_document_gives_defaults() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config.tolerance, dec!(0.01));
        assert_eq!(config.summary.sign_mode, SignMode::Explicit);
        assert_eq!(config.summary.line_tolerance, 3.0);
        assert_eq!(config.ledger, LedgerConfig::default());
        assert_eq!(config.taxes.inss.len(), 11);
        assert_eq!(config.taxes.irrf.len(), 6);
        assert_eq!(config.taxes.fgts.len(), 4);
        assert_eq!(config.loans.all_codes().len(), 6);
        assert_eq!(config.composition.excluded_codes.len(), 6);
    }

    #[test]
    fn parse_custom_sections() {
        let config = ReconConfig::from_toml(CUSTOM).unwrap();
        assert_eq!(config.tolerance, dec!(0.05));
        assert_eq!(config.summary.sign_mode, SignMode::FromMapping);
        assert_eq!(config.ledger.code_field, 0);
        assert_eq!(config.ledger.debit_field, 4);
        assert_eq!(config.ledger.delimiter, Some(';'));
        assert_eq!(config.taxes.lookup().get("30050"), Some(&TaxType::Inss));
        assert_eq!(config.composition.excluded_categories, vec!["Pró-Labore"]);
        // Untouched section keeps its defaults.
        assert_eq!(config.loans.additions.len(), 4);
    }

    #[test]
    fn overlapping_tax_sets_rejected() {
        let input = r#"
[taxes]
inss = ["30058"]
irrf = ["30058"]
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("30058"), "{err}");
    }

    #[test]
    fn pro_labore_codes_default_and_override() {
        let config = ReconConfig::from_toml("").unwrap();
        let (adds, deds) = config.declared.pro_labore.partners.normalized();
        assert!(adds.contains("30003") && adds.contains("30064"));
        assert!(deds.contains("30067") && deds.contains("30066"));

        let input = r#"
[declared.pro_labore.self_employed]
additions = ["30060"]
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.declared.pro_labore.self_employed.additions, vec!["30060"]);
        assert!(config.declared.pro_labore.self_employed.deductions.is_empty());
        assert_eq!(config.declared.pro_labore.partners.additions.len(), 2);
    }

    #[test]
    fn pro_labore_code_on_both_sides_rejected() {
        let input = r#"
[declared.pro_labore.partners]
additions = ["30003"]
deductions = ["030003"]
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("declared.pro_labore.partners"), "{err}");

        let input = r#"
[declared.pro_labore.partners]
additions = ["3x003"]
"#;
        assert!(ReconConfig::from_toml(input).is_err());
    }

    #[test]
    fn leading_zeros_count_as_same_code() {
        let input = r#"
[taxes]
inss = ["0897"]
fgts = ["897"]
"#;
        assert!(ReconConfig::from_toml(input).is_err());
    }

    #[test]
    fn non_numeric_code_rejected() {
        let input = r#"
[loans]
additions = ["30075", "abc"]
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }

    #[test]
    fn field_beyond_minimum_rejected() {
        let input = r#"
[ledger]
amount_field = 6
"#;
        assert!(ReconConfig::from_toml(input).is_err());
    }

    #[test]
    fn non_positive_tolerance_rejected() {
        assert!(ReconConfig::from_toml("tolerance = \"0\"").is_err());
    }

    #[test]
    fn unknown_keys_fail_deserialization() {
        let err = ReconConfig::from_toml("[summary]\nsign = \"explicit\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn sign_mode_from_str() {
        assert_eq!("from-mapping".parse::<SignMode>().unwrap(), SignMode::FromMapping);
        assert!("signed".parse::<SignMode>().is_err());
    }
}
