//! Event extraction from the payroll summary document.
//!
//! The document is a sequence of tables, each introduced by a category title
//! and a `Código / Evento / Quantidade / Valor / Funcionários` header. The
//! extractor walks lines top to bottom across every page, carrying its block
//! state from one page to the next.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::{SignMode, SummaryConfig};
use crate::layout::{
    assign_to_nearest_column, find_header_centers, group_lines, line_text, Column,
    HeaderCenters, Token,
};
use crate::mapping::{FlowType, Mapping};
use crate::money::{last_comma_token, parse_brl_decimal, unsigned_zero};
use crate::normalize::{canonicalize_category, category, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sign {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl Sign {
    pub fn apply(self, amount: Decimal) -> Decimal {
        match self {
            Sign::Plus => amount.abs(),
            Sign::Minus => unsigned_zero(-amount.abs()),
        }
    }
}

impl std::fmt::Display for Sign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sign::Plus => write!(f, "+"),
            Sign::Minus => write!(f, "-"),
        }
    }
}

impl From<FlowType> for Sign {
    fn from(flow: FlowType) -> Self {
        match flow {
            FlowType::Addition => Sign::Plus,
            FlowType::Deduction => Sign::Minus,
        }
    }
}

/// One event line of the summary. `amount` is never negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEventRow {
    pub category: String,
    pub event_code: String,
    pub event_name: String,
    pub sign: Sign,
    pub amount: Decimal,
}

impl SummaryEventRow {
    pub fn signed_amount(&self) -> Decimal {
        self.sign.apply(self.amount)
    }
}

const TITLE_KEYWORDS: &[&str] =
    &["folha", "rescisao", "ferias", "adiantamento", "pro labore", "pro-labore", "decimo"];

const TERMINATORS: &[&str] = &["totais", "base inss", "base irrf", "base fgts", "liquidos"];

const IGNORED_SECTION_MARKERS: &[&str] = &["nao influenciam", "nao aparecem em folha"];

const MAX_TITLE_LEN: usize = 80;

fn event_name_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+\-\s]*\d{1,6}\s+(.*)$").expect("static regex"))
}

/// Line-by-line state machine over the summary document.
pub struct SummaryExtractor<'a> {
    options: &'a SummaryConfig,
    mapping: Option<&'a Mapping>,
    current_category: String,
    pending_category: Option<String>,
    centers: Option<HeaderCenters>,
    in_block: bool,
    ignoring: bool,
    rows: Vec<SummaryEventRow>,
}

impl<'a> SummaryExtractor<'a> {
    pub fn new(options: &'a SummaryConfig, mapping: Option<&'a Mapping>) -> Self {
        Self {
            options,
            mapping,
            current_category: category::UNCATEGORIZED.to_string(),
            pending_category: None,
            centers: None,
            in_block: false,
            ignoring: false,
            rows: Vec::new(),
        }
    }

    /// Category used for tables that appear before any title line.
    pub fn with_default_category(mut self, raw: &str) -> Self {
        self.current_category = canonicalize_category(raw);
        self
    }

    pub fn feed_page(&mut self, tokens: &[Token]) {
        for line in group_lines(tokens, self.options.line_tolerance) {
            self.feed_line(&line);
        }
    }

    /// Still inside an informational section that never closed.
    pub fn in_ignored_section(&self) -> bool {
        self.ignoring
    }

    pub fn finish(self) -> Vec<SummaryEventRow> {
        if self.ignoring {
            log::warn!("summary: informational section never closed; lines after it were skipped");
        }
        log::info!("summary: extracted {} event lines", self.rows.len());
        self.rows
    }

    fn leave_block(&mut self) {
        self.centers = None;
        self.in_block = false;
    }

    fn feed_line(&mut self, line: &[Token]) {
        let text = line_text(line);
        let norm = normalize(&text);

        if self.ignoring {
            let closes_section = (norm.contains("total")
                && IGNORED_SECTION_MARKERS.iter().any(|m| norm.contains(m)))
                || text.starts_with("_____")
                || text.starts_with("-----");
            if closes_section {
                self.ignoring = false;
            }
            return;
        }
        if IGNORED_SECTION_MARKERS.iter().any(|m| norm.contains(m)) {
            log::debug!("summary: entering informational section: {text}");
            self.ignoring = true;
            self.leave_block();
            return;
        }

        if is_category_title(&text, &norm) {
            self.pending_category = Some(canonicalize_category(&text));
            self.leave_block();
            return;
        }

        if let Some(centers) = find_header_centers(line) {
            self.centers = Some(centers);
            if let Some(pending) = self.pending_category.take() {
                self.current_category = pending;
            }
            self.in_block = true;
            return;
        }

        let Some(centers) = self.centers.filter(|_| self.in_block) else {
            return;
        };

        if TERMINATORS.iter().any(|k| norm.contains(k)) {
            self.leave_block();
            return;
        }

        let cols = assign_to_nearest_column(line, &centers);
        let amount_text = cols.get(Column::Amount);
        if amount_text.is_empty() {
            return;
        }

        let code_text = cols.get(Column::Code);
        let (explicit_sign, code_rest) = match code_text.chars().next() {
            Some('+') => (Some(Sign::Plus), code_text[1..].trim()),
            Some('-') => (Some(Sign::Minus), code_text[1..].trim()),
            _ => (None, code_text),
        };

        let digits: String = code_rest.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            self.leave_block();
            return;
        }
        let event_code = format!("{digits:0>3}");

        let amount_token = last_comma_token(amount_text).unwrap_or(amount_text);
        let amount = match parse_brl_decimal(amount_token) {
            Ok(v) => v.abs(),
            Err(e) => {
                log::debug!("summary: skipping event {event_code}: {e}");
                return;
            }
        };

        let sign = match (explicit_sign, self.options.sign_mode) {
            (Some(sign), _) => sign,
            (None, SignMode::Explicit) => Sign::Plus,
            (None, SignMode::FromMapping) => self
                .mapping
                .and_then(|m| m.flow_for_event(&self.current_category, &event_code))
                .map(Sign::from)
                .unwrap_or(Sign::Plus),
        };

        let name_text = cols.get(Column::Event);
        let event_name = event_name_prefix()
            .captures(name_text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .unwrap_or(name_text)
            .to_string();

        self.rows.push(SummaryEventRow {
            category: self.current_category.clone(),
            event_code,
            event_name,
            sign,
            amount,
        });
    }
}

fn is_category_title(text: &str, norm: &str) -> bool {
    if norm.is_empty() || norm.chars().count() > MAX_TITLE_LEN {
        return false;
    }
    if norm.chars().filter(|c| *c != '/').any(|c| c.is_ascii_digit()) {
        return false;
    }
    text.contains('/') || TITLE_KEYWORDS.iter().any(|k| norm.contains(k))
}

/// Extract every event row from a document given as pages of tokens.
pub fn extract_summary(
    pages: &[Vec<Token>],
    options: &SummaryConfig,
    mapping: Option<&Mapping>,
) -> Vec<SummaryEventRow> {
    let mut extractor = SummaryExtractor::new(options, mapping);
    for page in pages {
        extractor.feed_page(page);
    }
    extractor.finish()
}

/// Category implied by a per-category summary's file name
/// (`resumo_ferias_2024-05.pdf` → `Férias`). `None` for the general summary
/// and unrecognized names.
pub fn category_from_file_name(name: &str) -> Option<String> {
    let n = normalize(name);
    let raw = if n.contains("13") || n.contains("decimo") {
        "13ª parcela"
    } else if n.contains("adiantamento") {
        "adiantamento"
    } else if n.contains("ferias") {
        "ferias"
    } else if n.contains("folha") && !n.contains("geral") {
        "folha"
    } else if n.contains("rescisao") {
        "rescisao"
    } else {
        return None;
    };
    Some(canonicalize_category(raw))
}
