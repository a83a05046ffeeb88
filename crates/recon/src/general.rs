//! Tax totals stated in prose by the general payroll summary
//! ("Resumo Geral").

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::layout::{group_lines, line_text, Token};
use crate::money::parse_brl_decimal;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IrrfBreakdown {
    pub payroll: Option<Decimal>,
    pub vacation: Option<Decimal>,
    pub severance: Option<Decimal>,
    pub partner: Option<Decimal>,
    pub self_employed: Option<Decimal>,
}

impl IrrfBreakdown {
    pub fn total(&self) -> Decimal {
        [self.payroll, self.vacation, self.severance, self.partner, self.self_employed]
            .into_iter()
            .flatten()
            .sum()
    }

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Net pró-labore paid to partners and to self-employed contributors
/// (gross minus INSS), as stated in the partners section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProLaboreNet {
    pub partners: Decimal,
    pub self_employed: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaxDeclaration {
    /// INSS "Total Líquido".
    pub inss_net: Option<Decimal>,
    /// "Total FGTS apurado recibos".
    pub fgts_assessed: Option<Decimal>,
    pub irrf: IrrfBreakdown,
    pub pro_labore: Option<ProLaboreNet>,
}

impl TaxDeclaration {
    pub fn is_empty(&self) -> bool {
        self.inss_net.is_none()
            && self.fgts_assessed.is_none()
            && self.irrf.is_empty()
            && self.pro_labore.is_none()
    }
}

struct Patterns {
    inss_net: Regex,
    fgts_cs: Regex,
    fgts: Regex,
    darf_section: Regex,
    irrf_payroll: Regex,
    irrf_vacation: Regex,
    irrf_severance: Regex,
    irrf_partner: Regex,
    irrf_self_employed: Regex,
    partners_section: Regex,
    pro_labore: Regex,
    partners_inss: Regex,
}

fn patterns() -> &'static Patterns {
    static P: OnceLock<Patterns> = OnceLock::new();
    P.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("static regex");
        Patterns {
            inss_net: re(r"(?i)Total L[íi]quido\s*:?\s*([\d.,]+)"),
            fgts_cs: re(r"(?i)Total FGTS apurado recibos s/CS\s*:?\s*([\d.,]+)"),
            fgts: re(r"(?i)Total FGTS apurado recibos\s*:?\s*([\d.,]+)"),
            darf_section: re(r"(?is)DARF IR.*?OUTRAS INFORMA[ÇC][ÕO]ES"),
            irrf_payroll: re(r"IRRF Folha\s*:?\s*([\d.,]+)"),
            irrf_vacation: re(r"IRRF F[ée]rias\s*:?\s*([\d.,]+)"),
            irrf_severance: re(r"IRRF Rescis[ãa]o\s*:?\s*([\d.,]+)"),
            irrf_partner: re(r"IRRF S[óo]cio\s*:?\s*([\d.,]+)"),
            irrf_self_employed: re(r"IRRF Aut[ôo]nomo\s*:?\s*([\d.,]+)"),
            partners_section: re(r"(?is)Valores pagos aos S[óo]cios.*?TOTAL DE S[ÓO]CIOS"),
            pro_labore: re(r"003\s+PRO LABORE\s+([\d.,]+)\s+([\d.,]+)"),
            partners_inss: re(r"013\s+INSS\s+([\d.,]+)\s+([\d.,]+)"),
        }
    })
}

fn capture_amount(re: &Regex, haystack: &str, group: usize) -> Option<Decimal> {
    let raw = re.captures(haystack)?.get(group)?.as_str();
    match parse_brl_decimal(raw) {
        Ok(v) => Some(v),
        Err(e) => {
            log::debug!("general summary: {e}");
            None
        }
    }
}

/// Plain text of a tokenized document, one line per visual line.
pub fn document_text(pages: &[Vec<Token>], line_tolerance: f64) -> String {
    let mut out = String::new();
    for page in pages {
        for line in group_lines(page, line_tolerance) {
            out.push_str(&line_text(&line));
            out.push('\n');
        }
    }
    out
}

/// Extract the declared tax totals from the general summary text. Figures
/// that are not found stay `None`.
pub fn extract_declared_taxes(text: &str) -> TaxDeclaration {
    let p = patterns();

    let inss_net = capture_amount(&p.inss_net, text, 1);
    let fgts_assessed =
        capture_amount(&p.fgts_cs, text, 1).or_else(|| capture_amount(&p.fgts, text, 1));

    let irrf = match p.darf_section.find(text) {
        Some(section) => {
            let s = section.as_str();
            IrrfBreakdown {
                payroll: capture_amount(&p.irrf_payroll, s, 1),
                vacation: capture_amount(&p.irrf_vacation, s, 1),
                severance: capture_amount(&p.irrf_severance, s, 1),
                partner: capture_amount(&p.irrf_partner, s, 1),
                self_employed: capture_amount(&p.irrf_self_employed, s, 1),
            }
        }
        None => IrrfBreakdown::default(),
    };

    let pro_labore = p.partners_section.find(text).map(|section| {
        let s = section.as_str();
        let zero = Decimal::ZERO;
        let gross_partners = capture_amount(&p.pro_labore, s, 1).unwrap_or(zero);
        let gross_self = capture_amount(&p.pro_labore, s, 2).unwrap_or(zero);
        let inss_partners = capture_amount(&p.partners_inss, s, 1).unwrap_or(zero);
        let inss_self = capture_amount(&p.partners_inss, s, 2).unwrap_or(zero);
        ProLaboreNet {
            partners: gross_partners - inss_partners,
            self_employed: gross_self - inss_self,
        }
    });

    let declaration = TaxDeclaration { inss_net, fgts_assessed, irrf, pro_labore };
    if declaration.is_empty() {
        log::warn!("general summary: no declared tax figure found");
    }
    declaration
}
