//! Positional token utilities: line grouping, header detection and column
//! assignment. Stateless; the summary extractor drives them line by line.

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// A positioned word on a page. Coordinates grow rightwards and downwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Token {
    pub fn new(text: impl Into<String>, x0: f64, x1: f64, top: f64, bottom: f64) -> Self {
        Self { text: text.into(), x0, x1, top, bottom }
    }

    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }
}

/// Table columns of an event block, in header order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Code,
    Event,
    Quantity,
    Amount,
    Employees,
}

impl Column {
    pub const ALL: [Column; 5] =
        [Column::Code, Column::Event, Column::Quantity, Column::Amount, Column::Employees];

    fn index(self) -> usize {
        self as usize
    }

    fn matches_header(self, normalized: &str) -> bool {
        match self {
            Column::Code => normalized == "codigo",
            Column::Event => normalized == "evento",
            Column::Quantity => normalized == "quantidade",
            Column::Amount => normalized == "valor",
            Column::Employees => normalized == "funcionarios",
        }
    }
}

/// Horizontal center of every header column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderCenters([f64; 5]);

impl HeaderCenters {
    pub fn center(&self, column: Column) -> f64 {
        self.0[column.index()]
    }
}

/// Column text of one data line, tokens joined by a single space in x order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTexts([String; 5]);

impl ColumnTexts {
    pub fn get(&self, column: Column) -> &str {
        &self.0[column.index()]
    }
}

/// Group tokens into lines.
///
/// Tokens are visited by `(top, x0)`; a token joins the current line when its
/// vertical center is within `y_tol` of the previous token's center. Each line
/// comes back sorted left to right.
pub fn group_lines(tokens: &[Token], y_tol: f64) -> Vec<Vec<Token>> {
    let mut sorted: Vec<&Token> = tokens.iter().collect();
    sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

    let mut lines = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut last_y: Option<f64> = None;

    for token in sorted {
        let y = token.center_y();
        if let Some(prev) = last_y {
            if (y - prev).abs() > y_tol {
                lines.push(std::mem::take(&mut current));
            }
        }
        current.push(token.clone());
        last_y = Some(y);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    }
    lines
}

/// Token texts joined by single spaces in x order, trimmed.
pub fn line_text(line: &[Token]) -> String {
    let mut sorted: Vec<&Token> = line.iter().collect();
    sorted.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    sorted
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Detect a table header line. All five column names must be present; when a
/// name repeats, the rightmost occurrence wins.
pub fn find_header_centers(line: &[Token]) -> Option<HeaderCenters> {
    let mut centers: [Option<f64>; 5] = [None; 5];
    for token in line {
        let text = normalize(&token.text);
        for column in Column::ALL {
            if column.matches_header(&text) {
                centers[column.index()] = Some(token.center_x());
            }
        }
    }

    let mut out = [0.0; 5];
    for (slot, center) in out.iter_mut().zip(centers) {
        *slot = center?;
    }
    Some(HeaderCenters(out))
}

/// Assign each token to the column whose center is nearest its own. Ties go
/// to the column that comes first in header order.
pub fn assign_to_nearest_column(line: &[Token], centers: &HeaderCenters) -> ColumnTexts {
    let mut buckets: [Vec<&Token>; 5] = Default::default();
    for token in line {
        let cx = token.center_x();
        let mut best = Column::Code;
        let mut best_dist = f64::INFINITY;
        for column in Column::ALL {
            let dist = (cx - centers.center(column)).abs();
            if dist < best_dist {
                best = column;
                best_dist = dist;
            }
        }
        buckets[best.index()].push(token);
    }

    let mut out = ColumnTexts::default();
    for (slot, mut tokens) in out.0.iter_mut().zip(buckets) {
        tokens.sort_by(|a, b| a.x0.total_cmp(&b.x0));
        *slot = tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str, x0: f64, top: f64) -> Token {
        Token::new(text, x0, x0 + 20.0, top, top + 8.0)
    }

    fn header(top: f64) -> Vec<Token> {
        vec![
            tok("Código", 10.0, top),
            tok("Evento", 60.0, top),
            tok("Quantidade", 200.0, top),
            tok("Valor", 300.0, top),
            tok("Funcionários", 400.0, top),
        ]
    }

    #[test]
    fn tokens_within_tolerance_share_a_line() {
        let tokens = vec![
            tok("b", 50.0, 101.5),
            tok("a", 10.0, 100.0),
            tok("c", 10.0, 120.0),
        ];
        let lines = group_lines(&tokens, 3.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[0]), "a b");
        assert_eq!(line_text(&lines[1]), "c");
    }

    #[test]
    fn grouping_chains_through_intermediate_tokens() {
        // 100 → 102.5 → 105: each step within tolerance, ends beyond it.
        let tokens = vec![tok("a", 10.0, 100.0), tok("b", 30.0, 102.5), tok("c", 50.0, 105.0)];
        assert_eq!(group_lines(&tokens, 3.0).len(), 1);
    }

    #[test]
    fn empty_input_yields_no_lines() {
        assert!(group_lines(&[], 3.0).is_empty());
    }

    #[test]
    fn header_requires_all_columns() {
        let line = header(50.0);
        let centers = find_header_centers(&line).unwrap();
        assert_eq!(centers.center(Column::Code), 20.0);
        assert_eq!(centers.center(Column::Amount), 310.0);

        let partial: Vec<Token> = line.into_iter().take(4).collect();
        assert!(find_header_centers(&partial).is_none());
    }

    #[test]
    fn tokens_go_to_nearest_column() {
        let centers = find_header_centers(&header(50.0)).unwrap();
        let line = vec![
            tok("+", 2.0, 70.0),
            tok("009", 12.0, 70.0),
            tok("Férias", 60.0, 70.0),
            tok("Normais", 82.0, 70.0),
            tok("30,00", 200.0, 70.0),
            tok("358,35", 300.0, 70.0),
            tok("1", 400.0, 70.0),
        ];
        let cols = assign_to_nearest_column(&line, &centers);
        assert_eq!(cols.get(Column::Code), "+ 009");
        assert_eq!(cols.get(Column::Event), "Férias Normais");
        assert_eq!(cols.get(Column::Quantity), "30,00");
        assert_eq!(cols.get(Column::Amount), "358,35");
        assert_eq!(cols.get(Column::Employees), "1");
    }

    #[test]
    fn equidistant_token_goes_to_first_column() {
        let centers = find_header_centers(&header(50.0)).unwrap();
        // Center exactly halfway between Código (20) and Evento (70).
        let line = vec![Token::new("x", 40.0, 50.0, 70.0, 78.0)];
        let cols = assign_to_nearest_column(&line, &centers);
        assert_eq!(cols.get(Column::Code), "x");
        assert_eq!(cols.get(Column::Event), "");
    }
}
