//! Event-code ↔ ledger-code mapping table.
//!
//! The resource is a JSON object keyed by category, each holding a list of
//! `{event_code, ledger_code, flow_type}` records. The Portuguese keys used by
//! the payroll department export (`evento`, `codigo_lancamento`, `tipo`) are
//! accepted as well. The table is parsed once by the caller and passed by
//! reference into the extractors and views.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ReconError;
use crate::money::unsigned_zero;
use crate::normalize::{canonicalize_category, normalize};

/// Whether a ledger code adds to or subtracts from the net payroll total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    #[default]
    Addition,
    Deduction,
}

impl FlowType {
    /// Anything that is not spelled as a deduction counts as an addition.
    pub fn parse(raw: &str) -> Self {
        match normalize(raw).as_str() {
            "desconto" | "descontos" | "deduction" | "deductions" | "-" => Self::Deduction,
            _ => Self::Addition,
        }
    }

    /// Apply the flow direction to a non-negative amount.
    pub fn apply(self, amount: Decimal) -> Decimal {
        match self {
            Self::Addition => amount.abs(),
            Self::Deduction => unsigned_zero(-amount.abs()),
        }
    }
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Addition => write!(f, "addition"),
            Self::Deduction => write!(f, "deduction"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingEntry {
    pub category: String,
    /// Digits only, zero-padded to three places. May be empty.
    pub event_code: String,
    /// Digits only, no leading zeros. May be empty.
    pub ledger_code: String,
    pub flow_type: FlowType,
}

/// One `(category, event_code, ledger_code)` association.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EventLink {
    pub category: String,
    pub event_code: String,
    pub ledger_code: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Mapping {
    entries: Vec<MappingEntry>,
}

impl Mapping {
    /// Parse the JSON resource. Categories are canonicalized; raw categories
    /// that land on the same canonical name are merged in file order.
    pub fn from_json(text: &str) -> Result<Self, ReconError> {
        let root: Value =
            serde_json::from_str(text).map_err(|e| ReconError::MappingParse(e.to_string()))?;
        let Value::Object(categories) = root else {
            return Err(ReconError::MappingParse(
                "top level must be an object keyed by category".into(),
            ));
        };

        let mut entries = Vec::new();
        for (raw_category, items) in &categories {
            let category = canonicalize_category(raw_category);
            let items = match items {
                Value::Array(items) => items.as_slice(),
                Value::Null => &[],
                other => {
                    return Err(ReconError::MappingParse(format!(
                        "category '{raw_category}': expected a list, found {}",
                        json_kind(other)
                    )))
                }
            };

            for item in items {
                let Value::Object(fields) = item else {
                    log::debug!("mapping: skipping non-object item in '{raw_category}'");
                    continue;
                };
                let field = |names: &[&str]| {
                    names
                        .iter()
                        .find_map(|n| fields.get(*n))
                        .map(scalar_to_string)
                        .unwrap_or_default()
                };

                let event_code = normalize_event_code(&field(&["event_code", "evento"]));
                let ledger_code =
                    normalize_ledger_code(&field(&["ledger_code", "codigo_lancamento"]));
                if event_code.is_empty() && ledger_code.is_empty() {
                    continue;
                }
                let flow_type = FlowType::parse(&field(&["flow_type", "tipo"]));

                entries.push(MappingEntry {
                    category: category.clone(),
                    event_code,
                    ledger_code,
                    flow_type,
                });
            }
        }

        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| e.category.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// Reverse lookup ledger code → category. Last entry wins on collision.
    pub fn ledger_to_category(&self) -> HashMap<String, String> {
        let mut out = HashMap::new();
        for e in &self.entries {
            if !e.ledger_code.is_empty() {
                out.insert(e.ledger_code.clone(), e.category.clone());
            }
        }
        out
    }

    /// Every distinct `(category, event_code, ledger_code)` with both codes set.
    pub fn event_to_ledger(&self) -> Vec<EventLink> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for e in &self.entries {
            if e.event_code.is_empty() || e.ledger_code.is_empty() {
                continue;
            }
            let link = EventLink {
                category: e.category.clone(),
                event_code: e.event_code.clone(),
                ledger_code: e.ledger_code.clone(),
            };
            if seen.insert(link.clone()) {
                out.push(link);
            }
        }
        out
    }

    /// Ledger code → flow type. Last entry wins on collision.
    pub fn ledger_flows(&self) -> HashMap<String, FlowType> {
        let mut out = HashMap::new();
        for e in &self.entries {
            if !e.ledger_code.is_empty() {
                out.insert(e.ledger_code.clone(), e.flow_type);
            }
        }
        out
    }

    /// Flow type declared for an event inside a category (first match).
    pub fn flow_for_event(&self, category: &str, event_code: &str) -> Option<FlowType> {
        let code = normalize_event_code(event_code);
        self.entries
            .iter()
            .find(|e| e.category == category && e.event_code == code)
            .map(|e| e.flow_type)
    }
}

/// Outcome of resolving and parsing the mapping resource.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MappingStatus {
    Loaded { source: String, entries: usize },
    Missing { searched: Vec<String> },
    Malformed { source: String, reason: String },
}

/// A mapping plus the signal describing where it came from. A missing or
/// malformed resource yields an empty mapping; callers decide how loudly to
/// complain.
#[derive(Debug, Clone)]
pub struct MappingLoad {
    pub mapping: Mapping,
    pub status: MappingStatus,
}

impl MappingLoad {
    pub fn parse(source: impl Into<String>, text: &str) -> Self {
        let source = source.into();
        match Mapping::from_json(text) {
            Ok(mapping) => {
                let entries = mapping.len();
                Self { mapping, status: MappingStatus::Loaded { source, entries } }
            }
            Err(e) => Self::malformed(source, e.to_string()),
        }
    }

    pub fn malformed(source: impl Into<String>, reason: impl Into<String>) -> Self {
        let (source, reason) = (source.into(), reason.into());
        log::warn!("mapping {source} is malformed: {reason}");
        Self { mapping: Mapping::default(), status: MappingStatus::Malformed { source, reason } }
    }

    pub fn missing(searched: Vec<String>) -> Self {
        log::warn!("mapping resource not found (searched {} locations)", searched.len());
        Self { mapping: Mapping::default(), status: MappingStatus::Missing { searched } }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.status, MappingStatus::Loaded { .. })
    }
}

/// Digits only, zero-padded to three places (`"9"` → `"009"`).
pub fn normalize_event_code(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return digits;
    }
    format!("{digits:0>3}")
}

/// Drop a spreadsheet `.0` artifact and leading zeros from a ledger code.
/// Non-numeric codes are returned trimmed but otherwise untouched.
pub fn normalize_ledger_code(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    let trimmed = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        trimmed.to_string()
    }
}

fn scalar_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
