// Allocation failure injection (requires the `failpoints` feature).
//
// Invariants exercised:
// - A failed grow/rehash/shrink leaves its container exactly as it was.
// - Take form: the handed-off reference is released even on failure.
// - Borrow form: the caller's count is unchanged on failure.
// - Recursive shrink: stops at the first failure without rolling back.
// - No leaks: across random operation sequences with injected failures,
//   every value's count equals the handles the test can still account for.
use proptest::prelude::*;
use rc_jsontree::failpoint;
use rc_jsontree::{Error, Value};

fn alloc_failure(e: &Error) -> bool {
    matches!(e, Error::AllocationFailure { .. })
}

// Test: array growth failure, take and borrow forms.
#[test]
fn array_append_failure_releases_taken_value() {
    let arr = Value::array();
    for i in 0..8 {
        arr.array_append(Value::integer(i)).unwrap();
    }
    let v = Value::integer(8);
    let probe = v.clone();
    {
        let _armed = failpoint::fail_nth_allocation(0);
        let err = arr.array_append(v).unwrap_err();
        assert!(alloc_failure(&err));
    }
    assert_eq!(probe.refcount(), 1);
    assert_eq!(arr.len(), Some(8));
    assert_eq!(arr.as_array().unwrap().capacity(), 8);

    {
        let _armed = failpoint::fail_nth_allocation(0);
        assert!(arr.array_append(&probe).is_err());
    }
    assert_eq!(probe.refcount(), 1);
}

// Test: object growth failure leaves size, order and insertion order intact.
#[test]
fn object_set_failure_leaves_table_unchanged() {
    let obj = Value::object();
    for i in 0..8 {
        obj.object_set(&format!("k{i}"), Value::integer(i)).unwrap();
    }
    let v = Value::string("ninth");
    let probe = v.clone();
    {
        let _armed = failpoint::fail_nth_allocation(0);
        assert!(alloc_failure(&obj.object_set("k8", v).unwrap_err()));
    }
    assert_eq!(probe.refcount(), 1);
    let table = obj.as_object().unwrap();
    assert_eq!(table.len(), 8);
    assert_eq!(table.order(), 3);
    assert!(table.get("k8").is_none());
    let keys: Vec<&str> = table.keys().collect();
    assert_eq!(keys, vec!["k0", "k1", "k2", "k3", "k4", "k5", "k6", "k7"]);
}

// Test: replacing an existing key needs no allocation and cannot fail.
#[test]
fn replacing_existing_key_ignores_armed_failure() {
    let obj = Value::object();
    obj.object_set("k", Value::integer(1)).unwrap();
    let _armed = failpoint::fail_nth_allocation(0);
    obj.object_set("k", Value::integer(2)).unwrap();
    assert!(failpoint::is_armed());
    assert_eq!(obj.object_get("k").and_then(|v| v.as_i64()), Some(2));
}

// Test: recursive shrink stops at the first failure; no rollback.
#[test]
fn shrink_recursive_partial_progress() {
    let a = Value::array();
    a.array_append(Value::integer(1)).unwrap();
    let b = Value::object();
    b.object_set("x", Value::integer(1)).unwrap();
    b.object_set("y", Value::integer(2)).unwrap();
    b.object_set("z", Value::integer(3)).unwrap();
    b.object_del("z").unwrap();
    b.object_del("y").unwrap();
    let root = Value::object();
    root.object_set("a", &a).unwrap();
    root.object_set("b", &b).unwrap();
    root.object_del("b").unwrap();
    root.object_set("b", &b).unwrap();
    assert_eq!(root.as_object().unwrap().order(), 1);

    {
        // root is already minimal and does not allocate; `a` fails.
        let _armed = failpoint::fail_nth_allocation(0);
        assert!(root.shrink_recursive().is_err());
    }
    assert_eq!(a.as_array().unwrap().capacity(), 8);
    assert_eq!(b.as_object().unwrap().order(), 2);

    {
        // `a` succeeds this time; `b` fails.
        let _armed = failpoint::fail_nth_allocation(1);
        assert!(root.shrink_recursive().is_err());
    }
    assert_eq!(a.as_array().unwrap().capacity(), 1);
    assert_eq!(b.as_object().unwrap().order(), 2);

    root.shrink_recursive().unwrap();
    assert_eq!(b.as_object().unwrap().order(), 0);
    assert_eq!(b.object_get("x").and_then(|v| v.as_i64()), Some(1));
}

#[derive(Clone, Debug)]
enum Op {
    Append { item: usize, borrow: bool },
    Set { key: u8, item: usize, borrow: bool },
    Del { key: u8 },
    Remove,
    Shrink,
    ShrinkRecursive,
}

fn arb_op(items: usize) -> impl Strategy<Value = (Op, Option<usize>)> {
    let op = prop_oneof![
        (0..items, any::<bool>()).prop_map(|(item, borrow)| Op::Append { item, borrow }),
        (0u8..12, 0..items, any::<bool>())
            .prop_map(|(key, item, borrow)| Op::Set { key, item, borrow }),
        (0u8..12).prop_map(|key| Op::Del { key }),
        Just(Op::Remove),
        Just(Op::Shrink),
        Just(Op::ShrinkRecursive),
    ];
    (op, proptest::option::of(0usize..3))
}

// Property: no leaks or double releases under injected failures.
// Model: for every item, the number of array slots and object entries that
// hold it. After each step every item's count must equal one (the test's
// own handle) plus those slots.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_no_leak_under_injected_failures(ops in proptest::collection::vec(arb_op(4), 1..80)) {
        let items: Vec<Value> = (0..4).map(|i| Value::integer(i as i64)).collect();
        let arr = Value::array();
        let obj = Value::object();
        let mut arr_model: Vec<usize> = Vec::new();
        let mut obj_model: Vec<(String, usize)> = Vec::new();

        for (op, fail_at) in ops {
            let _armed = fail_at.map(failpoint::fail_nth_allocation);
            match op {
                Op::Append { item, borrow } => {
                    let res = if borrow {
                        arr.array_append(&items[item])
                    } else {
                        arr.array_append(items[item].clone())
                    };
                    if res.is_ok() {
                        arr_model.push(item);
                    } else {
                        prop_assert!(alloc_failure(&res.unwrap_err()));
                    }
                }
                Op::Set { key, item, borrow } => {
                    let key = format!("k{key}");
                    let res = if borrow {
                        obj.object_set(&key, &items[item])
                    } else {
                        obj.object_set(&key, items[item].clone())
                    };
                    if res.is_ok() {
                        match obj_model.iter_mut().find(|(k, _)| *k == key) {
                            Some(slot) => slot.1 = item,
                            None => obj_model.push((key, item)),
                        }
                    }
                }
                Op::Del { key } => {
                    let key = format!("k{key}");
                    let present = obj_model.iter().position(|(k, _)| *k == key);
                    let res = obj.object_del(&key);
                    prop_assert_eq!(res.is_ok(), present.is_some());
                    if let Some(pos) = present {
                        obj_model.remove(pos);
                    }
                }
                Op::Remove => {
                    let res = arr.array_remove(0);
                    prop_assert_eq!(res.is_ok(), !arr_model.is_empty());
                    if !arr_model.is_empty() {
                        arr_model.remove(0);
                    }
                }
                Op::Shrink => {
                    let _ = arr.shrink();
                    let _ = obj.shrink();
                }
                Op::ShrinkRecursive => {
                    let _ = arr.shrink_recursive();
                    let _ = obj.shrink_recursive();
                }
            }

            for (i, item) in items.iter().enumerate() {
                let in_arr = arr_model.iter().filter(|&&x| x == i).count();
                let in_obj = obj_model.iter().filter(|(_, x)| *x == i).count();
                prop_assert_eq!(item.refcount(), 1 + in_arr + in_obj, "item {}", i);
            }
            let arr_vals: Vec<i64> = arr.as_array().unwrap().iter().map(|v| v.as_i64().unwrap()).collect();
            let want: Vec<i64> = arr_model.iter().map(|&i| i as i64).collect();
            prop_assert_eq!(arr_vals, want);
            prop_assert!(arr.as_array().unwrap().capacity() >= arr_model.len());
            prop_assert!(obj.as_object().unwrap().bucket_count() >= obj_model.len());
        }

        drop(arr);
        drop(obj);
        for item in &items {
            prop_assert_eq!(item.refcount(), 1);
        }
    }
}
