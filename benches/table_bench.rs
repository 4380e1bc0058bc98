use chainmap::hashing::{IntHash, StrHash};
use chainmap::ownership::{owned_str, Inline, OwnedStr};
use chainmap::{Table, Visit};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::convert::Infallible;
use std::time::Duration;

type StrTable = Table<OwnedStr, Inline<u64>, StrHash>;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn str_table() -> StrTable {
    Table::alloc(StrHash, owned_str(), Inline::new()).unwrap()
}

fn filled(seed: u64, n: usize) -> (StrTable, Vec<String>) {
    let mut t = str_table();
    let keys: Vec<String> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        t.set(k, Some(&(i as u64))).unwrap();
    }
    (t, keys)
}

/// 10k indices into `0..n`, drawn with a second LCG.
fn picks(n: usize) -> Vec<usize> {
    let mut s = 0x9e3779b97f4a7c15u64;
    (0..10_000)
        .map(|_| {
            s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
            (s as usize) % n
        })
        .collect()
}

fn bench_set_fresh_100k(c: &mut Criterion) {
    c.bench_function("table::set_fresh_100k", |b| {
        let keys: Vec<String> = lcg(1).take(100_000).map(key).collect();
        b.iter_batched(
            str_table,
            |mut t| {
                for (i, k) in keys.iter().enumerate() {
                    let _ = t.set(k, Some(&(i as u64))).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("table::set_fresh_int_100k", |b| {
        b.iter_batched(
            || Table::alloc(IntHash, Inline::<u64>::new(), Inline::<u64>::new()).unwrap(),
            |mut t| {
                for (i, x) in lcg(2).take(100_000).enumerate() {
                    let _ = t.set(&x, Some(&(i as u64))).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_set_update_10k(c: &mut Criterion) {
    c.bench_function("table::set_update_10k_on_100k", |b| {
        let (mut t, keys) = filled(3, 100_000);
        let targets = picks(keys.len());
        b.iter(|| {
            for &i in &targets {
                black_box(t.set(&keys[i], Some(&(i as u64))).unwrap());
            }
        })
    });
}

fn bench_get_hit_10k(c: &mut Criterion) {
    c.bench_function("table::get_hit_10k_on_100k", |b| {
        let (t, keys) = filled(7, 100_000);
        let queries: Vec<&str> = picks(keys.len()).into_iter().map(|i| keys[i].as_str()).collect();
        b.iter(|| {
            for k in &queries {
                black_box(t.get(k));
            }
        })
    });
}

fn bench_get_miss_10k(c: &mut Criterion) {
    c.bench_function("table::get_miss_10k_on_100k", |b| {
        let (t, _) = filled(11, 100_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for _ in 0..10_000 {
                let k = key(miss.next().unwrap());
                black_box(t.has(&k));
            }
        })
    });
}

fn bench_delete_random_10k(c: &mut Criterion) {
    c.bench_function("table::delete_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let (t, keys) = filled(5, 110_000);
                let doomed: Vec<String> = picks(keys.len()).into_iter().map(|i| keys[i].clone()).collect();
                (t, doomed)
            },
            |(mut t, doomed)| {
                for k in &doomed {
                    t.delete(k);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_foreach(c: &mut Criterion) {
    c.bench_function("table::foreach_sum_100k", |b| {
        let (mut t, _) = filled(999, 100_000);
        b.iter(|| {
            let mut sum = 0u64;
            let _ = t.foreach(|c| {
                sum = sum.wrapping_add(c.value().copied().unwrap_or(0));
                Ok::<_, Infallible>(Visit::Continue)
            });
            black_box(sum)
        })
    });

    c.bench_function("table::foreach_delete_half_100k", |b| {
        b.iter_batched(
            || filled(1001, 100_000).0,
            |mut t| {
                let _ = t.foreach(|c| {
                    if c.value().is_some_and(|v| v % 2 == 0) {
                        c.delete();
                    }
                    Ok::<_, Infallible>(Visit::Continue)
                });
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_set_fresh_100k, bench_set_update_10k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_get_hit_10k,
              bench_get_miss_10k,
              bench_delete_random_10k,
              bench_foreach
}
criterion_main!(benches_insert, benches_ops);
