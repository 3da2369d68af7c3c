use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rc_jsontree::{OrderedHashTable, Value};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_array_append(c: &mut Criterion) {
    c.bench_function("array_append_10k", |b| {
        b.iter_batched(
            Value::array,
            |arr| {
                for i in 0..10_000 {
                    arr.array_append(Value::integer(i)).unwrap();
                }
                black_box(arr)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_object_set(c: &mut Criterion) {
    c.bench_function("object_set_10k", |b| {
        let keys: Vec<_> = lcg(1).take(10_000).map(key).collect();
        b.iter_batched(
            OrderedHashTable::new,
            |mut t| {
                for (i, k) in keys.iter().enumerate() {
                    t.set(k, Value::integer(i as i64)).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_object_get_hit(c: &mut Criterion) {
    c.bench_function("object_get_hit", |b| {
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        let mut t = OrderedHashTable::new();
        for (i, k) in keys.iter().enumerate() {
            t.set(k, Value::integer(i as i64)).unwrap();
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(t.get(k).unwrap());
        })
    });
}

fn bench_del_then_shrink(c: &mut Criterion) {
    c.bench_function("object_del_9k_then_shrink", |b| {
        let keys: Vec<_> = lcg(11).take(10_000).map(key).collect();
        b.iter_batched(
            || {
                let mut t = OrderedHashTable::new();
                for k in &keys {
                    t.set(k, Value::null()).unwrap();
                }
                t
            },
            |mut t| {
                for k in &keys[1_000..] {
                    t.del(k).unwrap();
                }
                t.shrink().unwrap();
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

// 64 objects, each holding 32 arrays of 5 integers.
fn wide_tree() -> Value {
    let root = Value::array();
    for i in 0..64 {
        let obj = Value::object();
        for j in 0..32 {
            let arr = Value::array();
            for n in 0..5 {
                arr.array_append(Value::integer(n)).unwrap();
            }
            obj.object_set(&format!("a{j}"), arr).unwrap();
        }
        obj.object_set("id", Value::integer(i)).unwrap();
        root.array_append(obj).unwrap();
    }
    root
}

fn bench_shrink_recursive(c: &mut Criterion) {
    c.bench_function("shrink_recursive_wide_tree", |b| {
        b.iter_batched(
            wide_tree,
            |root| {
                black_box(root.shrink_recursive().unwrap());
                root
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_clone_drop_handle(c: &mut Criterion) {
    c.bench_function("value_clone_drop_handle", |b| {
        let v = Value::string("shared");
        b.iter(|| {
            let x = v.clone();
            black_box(&x);
            drop(x);
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_array_append, bench_object_set, bench_object_get_hit,
        bench_del_then_shrink, bench_shrink_recursive, bench_clone_drop_handle
}
criterion_main!(benches);
