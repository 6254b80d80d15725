//! Integration tests for the full ledger pipeline.
//!
//! Tests: raw name → KeyNormalizer → InventoryLedger → DocumentStore → re-list
//!
//! Verifies:
//! - The per-key state machine holds under both write strategies
//! - Every mutation is visible to the next full re-list (pull-based refresh)
//! - Mutations on one key never disturb other keys

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use proptest::prelude::*;

    use crate::document_store::InMemoryDocumentStore;
    use crate::ledger::{InventoryLedger, WriteStrategy};

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("failed to build test runtime")
    }

    fn ledger(strategy: WriteStrategy) -> InventoryLedger<Arc<InMemoryDocumentStore>> {
        InventoryLedger::new(Arc::new(InMemoryDocumentStore::new())).with_strategy(strategy)
    }

    /// Re-list and flatten into `key -> quantity` for comparisons.
    async fn listing(l: &InventoryLedger<Arc<InMemoryDocumentStore>>) -> BTreeMap<String, u64> {
        l.list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.key().to_string(), r.quantity().get()))
            .collect()
    }

    #[tokio::test]
    async fn every_mutation_is_visible_to_the_next_listing() {
        for strategy in [WriteStrategy::PreferAtomic, WriteStrategy::ReadModifyWrite] {
            let l = ledger(strategy);

            l.add("Milk").await.unwrap();
            assert_eq!(listing(&l).await, BTreeMap::from([("milk".to_string(), 1)]));

            l.add(" MILK ").await.unwrap();
            l.add("Bread").await.unwrap();
            assert_eq!(
                listing(&l).await,
                BTreeMap::from([("bread".to_string(), 1), ("milk".to_string(), 2)])
            );

            l.remove("bread").await.unwrap();
            l.remove("milk").await.unwrap();
            assert_eq!(listing(&l).await, BTreeMap::from([("milk".to_string(), 1)]));

            l.remove("Milk").await.unwrap();
            assert!(listing(&l).await.is_empty());
        }
    }

    #[tokio::test]
    async fn both_strategies_agree_on_shared_store() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let atomic = InventoryLedger::new(store.clone());
        let plain = InventoryLedger::new(store).with_strategy(WriteStrategy::ReadModifyWrite);

        atomic.add("jam").await.unwrap();
        plain.add("Jam").await.unwrap();
        atomic.add("JAM").await.unwrap();
        plain.remove("jam").await.unwrap();

        assert_eq!(atomic.get("jam").await.unwrap().unwrap().quantity().get(), 2);
        assert_eq!(plain.get("jam").await.unwrap().unwrap().quantity().get(), 2);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(usize),
        Remove(usize),
    }

    const NAMES: [&str; 4] = ["Apple", "  apple", "Kiwi", "Green Tea"];

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..NAMES.len()).prop_map(Op::Add),
            (0..NAMES.len()).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: after any sequence of single-unit moves, the listing equals
        /// a plain counter model in which zero means "no entry".
        #[test]
        fn listing_matches_counter_model(
            ops in prop::collection::vec(op(), 0..40),
            atomic in any::<bool>(),
        ) {
            let strategy = if atomic {
                WriteStrategy::PreferAtomic
            } else {
                WriteStrategy::ReadModifyWrite
            };

            let rt = runtime();
            let (actual, expected) = rt.block_on(async {
                let l = ledger(strategy);
                let mut model: BTreeMap<String, u64> = BTreeMap::new();

                for op in &ops {
                    match op {
                        Op::Add(i) => {
                            l.add(NAMES[*i]).await.unwrap();
                            *model.entry(pantry_inventory::normalize(NAMES[*i])).or_default() += 1;
                        }
                        Op::Remove(i) => {
                            l.remove(NAMES[*i]).await.unwrap();
                            let key = pantry_inventory::normalize(NAMES[*i]);
                            if let Some(n) = model.get_mut(&key) {
                                *n -= 1;
                                if *n == 0 {
                                    model.remove(&key);
                                }
                            }
                        }
                    }
                }

                (listing(&l).await, model)
            });

            prop_assert_eq!(actual, expected);
        }

        /// Property: n adds on a fresh key read back as n; n removes restore absence.
        #[test]
        fn adds_are_monotonic_and_removes_invert_them(n in 1u64..20) {
            let rt = runtime();
            rt.block_on(async {
                let l = ledger(WriteStrategy::ReadModifyWrite);
                for _ in 0..n {
                    l.add("Widget").await.unwrap();
                }
                assert_eq!(l.get("widget").await.unwrap().unwrap().quantity().get(), n);

                for _ in 0..n {
                    l.remove("WIDGET").await.unwrap();
                }
                assert_eq!(l.get("widget").await.unwrap(), None);
            });
        }
    }
}
