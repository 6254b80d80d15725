//! Merge/delete policy for single-unit stock moves.
//!
//! `decide` is the pure half of every ledger mutation: given the quantity
//! currently stored for a key (if any), it says what must be written. It must
//! not perform IO; the caller reads, decides, then applies the decision.

use serde::{Deserialize, Serialize};

use pantry_core::DomainResult;

use crate::key::ItemKey;
use crate::record::{InventoryRecord, Quantity};

/// A one-unit change requested for an item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockMove {
    Add,
    Remove,
}

/// What to do with the store for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Overwrite (or create) the record.
    Write(InventoryRecord),
    /// Delete the record; its last unit was removed.
    Delete(ItemKey),
    /// Leave the store untouched (removing an absent item).
    Noop,
}

/// Decide the store change for `mv` given the currently stored quantity.
///
/// State machine per key:
/// - `Absent --add--> Present(1)`
/// - `Present(n) --add--> Present(n + 1)`
/// - `Present(1) --remove--> Absent`
/// - `Present(n > 1) --remove--> Present(n - 1)`
/// - `Absent --remove--> Absent`
pub fn decide(mv: StockMove, key: &ItemKey, current: Option<Quantity>) -> DomainResult<Decision> {
    let decision = match (mv, current) {
        (StockMove::Add, None) => Decision::Write(InventoryRecord::new(key.clone(), Quantity::ONE)),
        (StockMove::Add, Some(q)) => {
            Decision::Write(InventoryRecord::new(key.clone(), q.incremented()?))
        }
        (StockMove::Remove, None) => Decision::Noop,
        (StockMove::Remove, Some(q)) => match q.decremented() {
            Some(next) => Decision::Write(InventoryRecord::new(key.clone(), next)),
            None => Decision::Delete(key.clone()),
        },
    };
    Ok(decision)
}

/// Result of one ledger mutation: the quantity before and after.
///
/// `None` means "no record".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockOutcome {
    pub key: ItemKey,
    pub before: Option<Quantity>,
    pub after: Option<Quantity>,
}

impl StockOutcome {
    pub fn new(key: ItemKey, before: Option<Quantity>, after: Option<Quantity>) -> Self {
        Self { key, before, after }
    }

    /// Outcome implied by applying `decision` on top of `before`.
    pub fn from_decision(key: ItemKey, before: Option<Quantity>, decision: &Decision) -> Self {
        let after = match decision {
            Decision::Write(record) => Some(record.quantity()),
            Decision::Delete(_) => None,
            Decision::Noop => before,
        };
        Self { key, before, after }
    }

    pub fn changed(&self) -> bool {
        self.before != self.after
    }

    pub fn deleted(&self) -> bool {
        self.before.is_some() && self.after.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(s: &str) -> ItemKey {
        ItemKey::parse(s).unwrap()
    }

    fn qty(n: u64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn add_to_absent_creates_one() {
        let d = decide(StockMove::Add, &key("apple"), None).unwrap();
        assert_eq!(d, Decision::Write(InventoryRecord::new(key("apple"), Quantity::ONE)));
    }

    #[test]
    fn add_to_present_increments() {
        let d = decide(StockMove::Add, &key("apple"), Some(qty(4))).unwrap();
        assert_eq!(d, Decision::Write(InventoryRecord::new(key("apple"), qty(5))));
    }

    #[test]
    fn remove_last_unit_deletes() {
        let d = decide(StockMove::Remove, &key("banana"), Some(Quantity::ONE)).unwrap();
        assert_eq!(d, Decision::Delete(key("banana")));
    }

    #[test]
    fn remove_from_many_decrements() {
        let d = decide(StockMove::Remove, &key("pear"), Some(qty(3))).unwrap();
        assert_eq!(d, Decision::Write(InventoryRecord::new(key("pear"), qty(2))));
    }

    #[test]
    fn remove_absent_is_noop() {
        let d = decide(StockMove::Remove, &key("kiwi"), None).unwrap();
        assert_eq!(d, Decision::Noop);
        let outcome = StockOutcome::from_decision(key("kiwi"), None, &d);
        assert!(!outcome.changed());
    }

    #[test]
    fn outcome_reports_deletion() {
        let d = Decision::Delete(key("banana"));
        let outcome = StockOutcome::from_decision(key("banana"), Some(Quantity::ONE), &d);
        assert!(outcome.deleted());
        assert_eq!(outcome.after, None);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: replaying n adds from absent ends at quantity n, and
        /// replaying n removes from there ends absent.
        #[test]
        fn adds_then_removes_return_to_absent(n in 1u64..64) {
            let k = key("widget");
            let mut current: Option<Quantity> = None;

            for _ in 0..n {
                current = match decide(StockMove::Add, &k, current).unwrap() {
                    Decision::Write(r) => Some(r.quantity()),
                    other => panic!("unexpected decision for add: {other:?}"),
                };
            }
            prop_assert_eq!(current, Some(qty(n)));

            for _ in 0..n {
                current = match decide(StockMove::Remove, &k, current).unwrap() {
                    Decision::Write(r) => Some(r.quantity()),
                    Decision::Delete(_) => None,
                    Decision::Noop => panic!("remove on present record must not be a no-op"),
                };
            }
            prop_assert_eq!(current, None);
        }
    }
}
