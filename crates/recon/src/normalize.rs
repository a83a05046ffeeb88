//! Text folding for fuzzy comparisons and the category vocabulary.
//!
//! Every component compares labels through [`normalize`]; category labels
//! coming from the summary document, the mapping file and the ledger
//! descriptions all converge on the names in [`category`] through
//! [`canonicalize_category`].

/// Canonical category names.
pub mod category {
    pub const PAYROLL: &str = "Folha";
    pub const SEVERANCE: &str = "Rescisão";
    pub const VACATION: &str = "Férias";
    pub const ADVANCE: &str = "Adiantamento";
    pub const PRO_LABORE: &str = "Pró-Labore";
    pub const THIRTEENTH: &str = "13º";
    pub const TAXES: &str = "Impostos";
    /// Label could not be read at all.
    pub const UNCATEGORIZED: &str = "Sem Categoria";
    /// Ledger posting without a category (unknown code or no keyword).
    pub const UNMAPPED: &str = "Sem Mapeamento";
}

const ACCENTS: &[(char, char)] = &[
    ('ç', 'c'),
    ('á', 'a'),
    ('à', 'a'),
    ('ä', 'a'),
    ('â', 'a'),
    ('ã', 'a'),
    ('é', 'e'),
    ('ê', 'e'),
    ('í', 'i'),
    ('î', 'i'),
    ('ó', 'o'),
    ('ô', 'o'),
    ('ö', 'o'),
    ('õ', 'o'),
    ('ú', 'u'),
    ('ü', 'u'),
];

const PAYROLL_SYNONYMS: &[&str] = &["folha", "folha complementar", "folha comp", "folhacomplementar"];

const SEVERANCE_SYNONYMS: &[&str] = &[
    "rescisao",
    "rescisao comp",
    "rescisao complementar",
    "rescisao compl",
    "rescisao comp.",
];

const ALIASES: &[(&str, &str)] = &[
    ("folha socios", "Folha Sócios"),
    ("folha autonomos", "Folha Autonomos"),
    ("13 primeira parcela", "13º Primeira Parcela"),
    ("13 segunda parcela", "13º Segunda Parcela"),
    ("13 adiantamento", "13º Adiantamento"),
    ("13ª parcela", "13ª Parcela"),
    ("ferias", category::VACATION),
    ("adiantamento", category::ADVANCE),
    ("pro labore", category::PRO_LABORE),
    ("pro-labore", category::PRO_LABORE),
    ("decimo terceiro", category::THIRTEENTH),
    ("13", category::THIRTEENTH),
    ("impostos", category::TAXES),
    ("inss", "INSS"),
    ("irrf", "IRRF"),
    ("fgts", "FGTS"),
];

/// Lowercase, trim and strip the accents found in payroll documents.
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            ACCENTS
                .iter()
                .find(|(accented, _)| *accented == c)
                .map(|(_, plain)| *plain)
                .unwrap_or(c)
        })
        .collect()
}

/// Map a free-form category label onto the canonical vocabulary.
///
/// Rules are tried in order and the first hit wins: exact synonyms,
/// "complementar" substring heuristics, the alias table, `/`-separated
/// segments, then the title-cased label itself.
pub fn canonicalize_category(raw: &str) -> String {
    let base = normalize(raw);

    if PAYROLL_SYNONYMS.contains(&base.as_str()) {
        return category::PAYROLL.to_string();
    }
    if SEVERANCE_SYNONYMS.contains(&base.as_str()) {
        return category::SEVERANCE.to_string();
    }

    if base.contains("folha") && base.contains("complementar") {
        return category::PAYROLL.to_string();
    }
    if base.contains("rescisao") && base.contains("complementar") {
        return category::SEVERANCE.to_string();
    }

    if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == base) {
        return canonical.to_string();
    }

    if raw.contains('/') {
        let parts: Vec<String> = raw
            .split('/')
            .map(normalize)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.iter().any(|p| p.contains("folha")) {
            return category::PAYROLL.to_string();
        }
        if parts.iter().any(|p| p.contains("rescisao")) {
            return category::SEVERANCE.to_string();
        }
    }

    let titled = title_case(raw.trim());
    if titled.is_empty() {
        category::UNCATEGORIZED.to_string()
    } else {
        titled
    }
}

/// Uppercase the first letter of every word, lowercase the rest.
/// A word starts after any non-alphabetic character.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if prev_alpha {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_and_accents() {
        assert_eq!(normalize("  FÉRIAS  "), "ferias");
        assert_eq!(normalize("Rescisão"), "rescisao");
        assert_eq!(normalize("Código"), "codigo");
        assert_eq!(normalize("Funcionários"), "funcionarios");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn exact_synonyms() {
        assert_eq!(canonicalize_category("Folha"), "Folha");
        assert_eq!(canonicalize_category("FOLHA COMP"), "Folha");
        assert_eq!(canonicalize_category("Rescisão Compl"), "Rescisão");
    }

    #[test]
    fn complementar_heuristic() {
        assert_eq!(canonicalize_category("Folha de Pagamento Complementar"), "Folha");
        assert_eq!(canonicalize_category("Rescisão - Complementar"), "Rescisão");
    }

    #[test]
    fn slash_composite_label() {
        assert_eq!(canonicalize_category("Folha / Complementar"), "Folha");
        assert_eq!(canonicalize_category("Mensal / Folha"), "Folha");
        assert_eq!(canonicalize_category("Demitidos/Rescisão"), "Rescisão");
    }

    #[test]
    fn alias_table() {
        assert_eq!(canonicalize_category("Férias"), "Férias");
        assert_eq!(canonicalize_category("pró-labore"), "Pró-Labore");
        assert_eq!(canonicalize_category("Pro Labore"), "Pró-Labore");
        assert_eq!(canonicalize_category("Décimo Terceiro"), "13º");
        assert_eq!(canonicalize_category("INSS"), "INSS");
    }

    #[test]
    fn earlier_rules_shadow_later_ones() {
        // Would title-case to "Folha Complementar" if the synonym set missed.
        assert_eq!(canonicalize_category("folha complementar"), "Folha");
        // Alias hit never reaches the slash split.
        assert_eq!(canonicalize_category("Adiantamento"), "Adiantamento");
    }

    #[test]
    fn fallbacks() {
        assert_eq!(canonicalize_category("participação nos lucros"), "Participação Nos Lucros");
        assert_eq!(canonicalize_category("   "), "Sem Categoria");
        assert_eq!(canonicalize_category(""), "Sem Categoria");
    }
}
