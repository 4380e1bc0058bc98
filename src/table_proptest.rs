#![cfg(test)]

// Property tests for Table kept inside the crate so they can inspect the
// bucket array and arena directly.

use crate::hashing::{FnHasher, IntHash, KeyHasher};
use crate::levels::{self, MAX_LEVEL};
use crate::ownership::{owned_str, Inline, OwnedStr};
use crate::table::Table;
use crate::traversal::{Traversal, Visit};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};

#[derive(Clone, Debug)]
enum Op {
    Set(u16, Option<String>),
    Emplace(u16, Option<String>),
    Fill(u16, u16),
    Get(u16),
    Has(u16),
    Take(u16),
    Delete(u16),
    DeleteRange(u16, u16),
    Purge,
    Foreach,
    ForeachDelete(u16),
}

fn arb_value() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-z]{0,4}")
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let key = 0u16..600;
    let op = prop_oneof![
        4 => (key.clone(), arb_value()).prop_map(|(k, v)| Op::Set(k, v)),
        1 => (key.clone(), arb_value()).prop_map(|(k, v)| Op::Emplace(k, v)),
        1 => (key.clone(), 1u16..400).prop_map(|(k, n)| Op::Fill(k, n)),
        2 => key.clone().prop_map(Op::Get),
        1 => key.clone().prop_map(Op::Has),
        2 => key.clone().prop_map(Op::Take),
        2 => key.clone().prop_map(Op::Delete),
        1 => (key.clone(), 1u16..400).prop_map(|(k, n)| Op::DeleteRange(k, n)),
        1 => Just(Op::Purge),
        1 => Just(Op::Foreach),
        1 => (1u16..5).prop_map(Op::ForeachDelete),
    ];
    proptest::collection::vec(op, 1..80)
}

type Model = HashMap<u16, Option<String>>;

/// Checks size parity, chain placement, and the density band. `purged` turns
/// off the lower bound: purge leaves the bucket array oversized on purpose.
fn check<H: KeyHasher<u16>>(
    sut: &Table<Inline<u16>, OwnedStr, H>,
    model: &Model,
    purged: bool,
) -> Result<(), TestCaseError> {
    prop_assert_eq!(sut.size(), model.len());
    prop_assert_eq!(sut.is_empty(), model.is_empty());
    prop_assert_eq!(sut.bucket_count(), levels::bucket_count(sut.level()));

    let mut chained = 0;
    for b in 0..sut.heads.len() {
        let mut cur = sut.heads[b];
        while let Some(id) = cur {
            let e = &sut.entries[id];
            prop_assert_eq!(sut.bucket_of(e.hash), b);
            chained += 1;
            cur = e.next;
        }
    }
    prop_assert_eq!(chained, model.len());

    let lf = sut.load_factor();
    if sut.level() < MAX_LEVEL {
        prop_assert!(lf < 2.0, "load factor {} at level {}", lf, sut.level());
    }
    if !purged && sut.level() > 0 {
        prop_assert!(lf >= 0.25, "load factor {} at level {}", lf, sut.level());
    }
    Ok(())
}

fn run<H: KeyHasher<u16>>(
    mut sut: Table<Inline<u16>, OwnedStr, H>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: Model = HashMap::new();
    let mut purged = false;

    for op in ops {
        match op {
            Op::Set(k, v) => {
                let fresh = sut.set(&k, v.as_deref()).expect("set");
                prop_assert_eq!(fresh, !model.contains_key(&k));
                model.insert(k, v);
            }
            Op::Emplace(k, v) => {
                let mut slot = sut.emplace(&k).expect("emplace");
                prop_assert!(slot.is_empty());
                if let Some(s) = v.as_deref() {
                    slot.set(s).expect("fill");
                }
                model.insert(k, v);
            }
            Op::Fill(start, n) => {
                for k in start..start.saturating_add(n) {
                    let fresh = sut.set(&k, Some("f")).expect("set");
                    prop_assert_eq!(fresh, !model.contains_key(&k));
                    model.insert(k, Some("f".to_string()));
                }
            }
            Op::Get(k) => {
                let expected = model.get(&k).and_then(|v| v.as_deref());
                prop_assert_eq!(sut.get(&k), expected);
            }
            Op::Has(k) => {
                prop_assert_eq!(sut.has(&k), model.contains_key(&k));
            }
            Op::Take(k) => {
                let expected = model.remove(&k).flatten();
                prop_assert_eq!(sut.take(&k), expected);
                prop_assert!(!sut.has(&k));
            }
            Op::Delete(k) => {
                sut.delete(&k);
                model.remove(&k);
                prop_assert!(!sut.has(&k));
            }
            Op::DeleteRange(start, n) => {
                for k in start..start.saturating_add(n) {
                    sut.delete(&k);
                    model.remove(&k);
                }
            }
            Op::Purge => {
                let buckets = sut.bucket_count();
                sut.purge();
                model.clear();
                prop_assert_eq!(sut.bucket_count(), buckets);
                purged = true;
            }
            Op::Foreach => {
                let mut seen = BTreeSet::new();
                let mut visits = 0;
                let r: Result<_, ()> = sut.foreach(|c| {
                    visits += 1;
                    seen.insert(*c.key());
                    Ok(Visit::Continue)
                });
                prop_assert_eq!(r, Ok(Traversal::Completed));
                prop_assert_eq!(visits, model.len());
                let expected: BTreeSet<u16> = model.keys().copied().collect();
                prop_assert_eq!(seen, expected);
            }
            Op::ForeachDelete(m) => {
                let mut visits = 0;
                let r: Result<_, ()> = sut.foreach(|c| {
                    visits += 1;
                    if *c.key() % m == 0 {
                        c.delete();
                    }
                    Ok(Visit::Continue)
                });
                prop_assert_eq!(r, Ok(Traversal::Completed));
                prop_assert_eq!(visits, model.len());
                let before = model.len();
                model.retain(|k, _| k % m != 0);
                // Removals during the walk are followed by maintenance that
                // runs until the table is back inside its band.
                if model.len() != before {
                    purged = false;
                }
            }
        }

        check(&sut, &model, purged)?;
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        let sut = Table::alloc(IntHash, Inline::<u16>::new(), owned_str()).unwrap();
        run(sut, ops)?;
    }

    // Few distinct hashes force long chains so unlinking from the middle and
    // the tail, and self-deletion during traversal, get exercised.
    #[test]
    fn prop_state_machine_with_collisions(ops in arb_ops()) {
        let hasher = FnHasher::new(|k: &u16| u64::from(*k % 3), |a: &u16, b: &u16| a.cmp(b));
        let sut = Table::alloc(hasher, Inline::<u16>::new(), owned_str()).unwrap();
        run(sut, ops)?;
    }
}
