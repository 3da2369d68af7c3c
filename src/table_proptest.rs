#![cfg(test)]

// Property tests for OrderedHashTable kept inside the crate so they can
// read internal sizing alongside the public behavior.

use crate::resize;
use crate::table::OrderedHashTable;
use crate::value::Value;
use proptest::prelude::*;

// Pool-indexed operations so failing cases shrink toward earlier keys and
// shorter sequences.
#[derive(Clone, Debug)]
enum Op {
    Set(usize, i64),
    Del(usize),
    Shrink,
    Get(usize),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=24).prop_flat_map(|pool| {
        let n = pool.len();
        let op = prop_oneof![
            4 => (0..n, any::<i64>()).prop_map(|(i, v)| Op::Set(i, v)),
            2 => (0..n).prop_map(Op::Del),
            1 => Just(Op::Shrink),
            2 => (0..n).prop_map(Op::Get),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against an insertion-ordered Vec.
// Invariants exercised across random operation sequences:
// - `set` on a present key replaces in place; on a new key appends.
// - `del` removes exactly the named key and reports missing keys.
// - `get` parity with the model for every pool key.
// - iteration order equals the model's insertion order.
// - `2^order >= len` after every step; after `shrink` the order is minimal.
// - `del` never lowers the order.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_table_matches_ordered_model((pool, ops) in arb_scenario()) {
        let mut sut = OrderedHashTable::new();
        let mut model: Vec<(String, i64)> = Vec::new();

        for op in ops {
            match op {
                Op::Set(i, v) => {
                    let k = &pool[i];
                    sut.set(k, Value::integer(v)).unwrap();
                    match model.iter_mut().find(|(mk, _)| mk == k) {
                        Some(slot) => slot.1 = v,
                        None => model.push((k.clone(), v)),
                    }
                }
                Op::Del(i) => {
                    let k = &pool[i];
                    let before = sut.order();
                    let res = sut.del(k);
                    match model.iter().position(|(mk, _)| mk == k) {
                        Some(pos) => {
                            prop_assert!(res.is_ok());
                            model.remove(pos);
                        }
                        None => prop_assert!(res.is_err()),
                    }
                    prop_assert_eq!(sut.order(), before, "del must not change order");
                }
                Op::Shrink => {
                    sut.shrink().unwrap();
                    prop_assert_eq!(Some(sut.order()), resize::min_order(model.len()));
                }
                Op::Get(i) => {
                    let k = &pool[i];
                    let got = sut.get(k).and_then(|v| v.as_i64());
                    let want = model.iter().find(|(mk, _)| mk == k).map(|(_, v)| *v);
                    prop_assert_eq!(got, want);
                }
                Op::Iterate => {
                    let got: Vec<(String, i64)> = sut
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.as_i64().unwrap()))
                        .collect();
                    prop_assert_eq!(&got, &model);
                }
            }

            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.bucket_count() >= sut.len());
        }

        let keys: Vec<&str> = sut.keys().collect();
        let want: Vec<&str> = model.iter().map(|(k, _)| k.as_str()).collect();
        prop_assert_eq!(keys, want);
    }
}

// Property: growing from empty with only inserts keeps the order minimal
// without any explicit shrink.
proptest! {
    #[test]
    fn prop_inserts_from_empty_keep_minimal_order(n in 0usize..200) {
        let mut t = OrderedHashTable::new();
        for i in 0..n {
            t.set(&format!("k{i}"), Value::null()).unwrap();
            prop_assert_eq!(Some(t.order()), resize::min_order(t.len()));
        }
    }
}
