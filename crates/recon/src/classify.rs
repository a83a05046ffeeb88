use rust_decimal::Decimal;

use crate::model::{Comparison, MatchStatus};
use crate::money::unsigned_zero;

/// `Match` iff `|difference| < tolerance`. The difference is kept exact.
pub fn classify(difference: Decimal, tolerance: Decimal) -> MatchStatus {
    if difference.abs() < tolerance {
        MatchStatus::Match
    } else {
        MatchStatus::Divergent
    }
}

/// Compare a summary value with a ledger value.
pub fn compare(summary_value: Decimal, ledger_value: Decimal, tolerance: Decimal) -> Comparison {
    let difference = unsigned_zero(summary_value - ledger_value);
    Comparison {
        summary_value: unsigned_zero(summary_value),
        ledger_value: unsigned_zero(ledger_value),
        difference,
        status: classify(difference, tolerance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn tolerance_boundary_is_exclusive() {
        assert_eq!(classify(dec!(0.01), dec!(0.01)), MatchStatus::Divergent);
        assert_eq!(classify(dec!(-0.01), dec!(0.01)), MatchStatus::Divergent);
        assert_eq!(classify(dec!(0.009999), dec!(0.01)), MatchStatus::Match);
        assert_eq!(classify(dec!(0), dec!(0.01)), MatchStatus::Match);
    }

    #[test]
    fn difference_is_exact() {
        let c = compare(dec!(358.35), dec!(300.00), dec!(0.01));
        assert_eq!(c.difference, dec!(58.35));
        assert_eq!(c.status, MatchStatus::Divergent);

        let c = compare(dec!(0.1) + dec!(0.2), dec!(0.3), dec!(0.01));
        assert_eq!(c.difference, dec!(0));
        assert_eq!(c.status, MatchStatus::Match);
    }
}
