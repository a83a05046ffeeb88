use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

/// A code that sorts numerically when it is all digits. Numeric codes come
/// before anything else; non-numeric codes fall back to lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortCode(pub String);

impl SortCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn digits(&self) -> Option<&str> {
        if !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit()) {
            Some(self.0.trim_start_matches('0'))
        } else {
            None
        }
    }
}

impl Ord for SortCode {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.digits(), other.digits()) {
            (Some(a), Some(b)) => a
                .len()
                .cmp(&b.len())
                .then_with(|| a.cmp(b))
                .then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for SortCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Full outer join of two keyed sums. A key missing on one side gets zero.
/// Output follows key order.
pub fn outer_join<K: Ord + Clone>(
    left: &BTreeMap<K, Decimal>,
    right: &BTreeMap<K, Decimal>,
) -> Vec<(K, Decimal, Decimal)> {
    let keys: BTreeSet<&K> = left.keys().chain(right.keys()).collect();
    keys.into_iter()
        .map(|k| {
            (
                k.clone(),
                left.get(k).copied().unwrap_or(Decimal::ZERO),
                right.get(k).copied().unwrap_or(Decimal::ZERO),
            )
        })
        .collect()
}
