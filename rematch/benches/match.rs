use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rematch::matcher::Regex;

pub fn criterion_benchmark(c: &mut Criterion) {
    {
        c.bench_function("compile_alt_star", |b| {
            b.iter(|| Regex::new(black_box("h(e|a)*llo*")).unwrap())
        });
    }

    {
        let re = Regex::new("h(e|a)*llo*").unwrap();
        let mut cache = re.create_cache();
        assert!(re.is_match(&mut cache, "haeeeallooo"));
        c.bench_function("match_short", |b| {
            b.iter(|| re.is_match(&mut cache, black_box("haeeeallooo")))
        });
    }

    {
        let re = Regex::new("(a|b)*c").unwrap();
        let mut cache = re.create_cache();
        let hay = format!("{}c", "ab".repeat(500));
        assert!(re.is_match(&mut cache, &hay));
        c.bench_function("match_long_1k", |b| {
            b.iter(|| re.is_match(&mut cache, black_box(&hay)))
        });
    }

    {
        // The classic case that takes a backtracker exponential time.
        let pattern = format!("{}{}", "a?".repeat(25), "a".repeat(25));
        let hay = "a".repeat(25);
        let re = Regex::new(&pattern).unwrap();
        let mut cache = re.create_cache();
        assert!(re.is_match(&mut cache, &hay));
        c.bench_function("match_pathological_25", |b| {
            b.iter(|| re.is_match(&mut cache, black_box(&hay)))
        });
    }

    {
        // regex as a baseline on the same anchored search.
        let re = regex::Regex::new("^(?:h(e|a)*llo*)$").unwrap();
        assert!(re.is_match("haeeeallooo"));
        c.bench_function("match_short_regex", |b| {
            b.iter(|| re.is_match(black_box("haeeeallooo")))
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
