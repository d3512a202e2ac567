// Benchmarks using criterion instead of unstable test feature.
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use polycache::{Cache, EvictionPolicy};

const CACHE_SIZE: usize = 1_000;
const NUM_OPERATIONS: usize = 10_000;

fn make_cache(policy: EvictionPolicy) -> Cache<usize, usize> {
    Cache::builder(CACHE_SIZE).policy(policy).build().unwrap()
}

// Simple linear congruential generator for reproducible benchmarks.
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345) & 0x7fffffff;
        self.state
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() as f64) / (0x7fffffff as f64)
    }
}

// Generates a Zipf-like access distribution so hot keys are reused.
fn zipf_sample(n: usize, skew: f64) -> Vec<usize> {
    let mut rng = SimpleRng::new(42);

    let mut norm: f64 = 0.0;
    for i in 1..=n {
        norm += 1.0 / (i as f64).powf(skew);
    }

    let mut samples = Vec::with_capacity(NUM_OPERATIONS);
    for _ in 0..NUM_OPERATIONS {
        let u: f64 = rng.next_f64();
        let mut sum: f64 = 0.0;
        let mut sample: usize = 1;

        while sample <= n {
            sum += 1.0 / (sample as f64).powf(skew) / norm;
            if sum >= u {
                break;
            }
            sample += 1;
        }

        samples.push(sample.saturating_sub(1) % n);
    }

    samples
}

fn benchmark_policies(c: &mut Criterion) {
    let samples = zipf_sample(CACHE_SIZE * 2, 0.8);

    let mut group = c.benchmark_group("Cache Mixed Access");

    for (name, policy) in [
        ("Simple", EvictionPolicy::Simple),
        ("Lru", EvictionPolicy::Lru),
        ("Lfu", EvictionPolicy::Lfu),
        ("Arc", EvictionPolicy::Arc),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let cache = make_cache(policy);
                for &idx in &samples {
                    if idx % 4 == 0 {
                        // 25% sets
                        black_box(cache.set(idx, idx).unwrap());
                    } else {
                        // 75% gets
                        black_box(cache.get(&idx).ok());
                    }
                }
            });
        });
    }

    group.finish();
}

fn benchmark_single_flight_loader(c: &mut Criterion) {
    let cache: Cache<usize, usize, std::convert::Infallible> = Cache::builder(CACHE_SIZE)
        .loader(|key| Ok(*key))
        .build()
        .unwrap();

    c.bench_function("loader read-through", |b| {
        b.iter(|| {
            for i in 0..256usize {
                black_box(cache.get(&i).unwrap());
            }
        });
    });
}

criterion_group!(benches, benchmark_policies, benchmark_single_flight_loader);
criterion_main!(benches);
