//! Import statistics shared by every batched mutation
//!
//! `Stats` forms a commutative monoid: `Stats::empty()` is the identity and
//! `combine` sums counters field-wise and concatenates error messages.

use std::collections::HashSet;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// A single error reported by a batched write
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub id: String,
    pub message: String,
}

impl ErrorMessage {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }
}

/// Result of a batched write against the data value store
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub imported: u64,
    pub updated: u64,
    pub ignored: u64,
    pub deleted: u64,
    #[serde(default)]
    pub error_messages: Vec<ErrorMessage>,
}

/// Statistics returned by the approve use case
pub type DataValueStats = Stats;

impl Stats {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(imported: u64, updated: u64, ignored: u64, deleted: u64) -> Self {
        Self {
            imported,
            updated,
            ignored,
            deleted,
            error_messages: Vec::new(),
        }
    }

    /// Zero-effect stats carrying a single error
    pub fn with_error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_messages: vec![ErrorMessage::new(id, message)],
            ..Self::default()
        }
    }

    pub fn combine(mut self, other: Stats) -> Stats {
        self += other;
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.error_messages.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.imported + self.updated + self.ignored + self.deleted
    }

    /// Drops repeated error messages, keeping the first occurrence of each text
    pub fn dedup_error_messages(mut self) -> Self {
        let mut seen = HashSet::new();
        self.error_messages
            .retain(|error| seen.insert(error.message.clone()));
        self
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, other: Stats) {
        self.imported += other.imported;
        self.updated += other.updated;
        self.ignored += other.ignored;
        self.deleted += other.deleted;
        self.error_messages.extend(other.error_messages);
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(self, other: Stats) -> Stats {
        self.combine(other)
    }
}

impl Sum for Stats {
    fn sum<I: Iterator<Item = Stats>>(iter: I) -> Self {
        iter.fold(Stats::empty(), Stats::combine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_stats() -> impl Strategy<Value = Stats> {
        (
            0u64..1000,
            0u64..1000,
            0u64..1000,
            0u64..1000,
            proptest::collection::vec(("[a-z]{1,4}", "[a-z ]{0,8}"), 0..3),
        )
            .prop_map(|(imported, updated, ignored, deleted, errors)| Stats {
                imported,
                updated,
                ignored,
                deleted,
                error_messages: errors
                    .into_iter()
                    .map(|(id, message)| ErrorMessage::new(id, message))
                    .collect(),
            })
    }

    fn counters(stats: &Stats) -> (u64, u64, u64, u64) {
        (stats.imported, stats.updated, stats.ignored, stats.deleted)
    }

    #[test]
    fn test_serialization_shape() {
        let stats = Stats::with_error("ou1", "not assigned");
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["imported"], 0);
        assert_eq!(json["errorMessages"][0]["id"], "ou1");
        assert_eq!(json["errorMessages"][0]["message"], "not assigned");
    }

    #[test]
    fn test_sum_concatenates_errors() {
        let total: Stats = vec![
            Stats::new(1, 2, 0, 0),
            Stats::with_error("a", "boom"),
            Stats::new(0, 0, 3, 4),
        ]
        .into_iter()
        .sum();

        assert_eq!(counters(&total), (1, 2, 3, 4));
        assert_eq!(total.error_messages.len(), 1);
        assert_eq!(total.total(), 10);
    }

    #[test]
    fn test_dedup_error_messages() {
        let stats = Stats::with_error("a", "same")
            + Stats::with_error("b", "same")
            + Stats::with_error("c", "other");
        let deduped = stats.dedup_error_messages();
        assert_eq!(deduped.error_messages.len(), 2);
        assert_eq!(deduped.error_messages[0].id, "a");
    }

    proptest! {
        #[test]
        fn prop_empty_is_identity(stats in arb_stats()) {
            prop_assert_eq!(stats.clone().combine(Stats::empty()), stats.clone());
            prop_assert_eq!(Stats::empty().combine(stats.clone()), stats);
        }

        #[test]
        fn prop_combine_is_associative(a in arb_stats(), b in arb_stats(), c in arb_stats()) {
            let left = a.clone().combine(b.clone()).combine(c.clone());
            let right = a.combine(b.combine(c));
            prop_assert_eq!(left, right);
        }

        #[test]
        fn prop_counters_commute(a in arb_stats(), b in arb_stats()) {
            let ab = a.clone().combine(b.clone());
            let ba = b.combine(a);
            prop_assert_eq!(counters(&ab), counters(&ba));
            prop_assert_eq!(ab.error_messages.len(), ba.error_messages.len());
        }
    }
}
