//! Condvar hot-path microbenchmarks with percentile summaries. Covers:
//! - wake_one with no waiters (no-op fast path)
//! - wake_all with no waiters (no-op fast path)
//! - timed wait with a past deadline (immediate-timeout fast path)
//! - wait + wake roundtrip (single waiter, classic lock)
//! - wait + wake roundtrip with ownership handoff (morphing path)
//! - wake_all with 4 waiters
//!
//! The thread-heavy benchmarks run outside criterion's timing loop
//! (criterion warmup does not suit them) and emit structured stats lines.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use surewake_core::{ClassicLock, Condvar, HandoffMutex, HostCondvar, HostPlatform, WaitStatus};

type ClassicCondvar = HostCondvar<ClassicLock>;
type MorphCondvar = Condvar<HostPlatform, HandoffMutex<HostPlatform>>;

#[derive(Default)]
struct BenchStats {
    samples_ns_per_op: Vec<f64>,
    total_iters: u64,
    total_ns: u128,
}

impl BenchStats {
    fn record(&mut self, iters: u64, dur: Duration) {
        let ns = dur.as_nanos();
        self.total_iters = self.total_iters.saturating_add(iters);
        self.total_ns = self.total_ns.saturating_add(ns);
        self.samples_ns_per_op.push(ns as f64 / iters as f64);
    }

    fn report(&self, bench_label: &str) {
        let mut samples = self.samples_ns_per_op.clone();
        if samples.is_empty() {
            return;
        }
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let p50 = percentile_sorted(&samples, 0.50);
        let p95 = percentile_sorted(&samples, 0.95);
        let p99 = percentile_sorted(&samples, 0.99);
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let throughput_ops_s = if self.total_ns == 0 {
            0.0
        } else {
            (self.total_iters as f64) / (self.total_ns as f64 / 1e9)
        };

        println!(
            "CONDVAR_BENCH bench={} samples={} p50_ns_op={:.3} p95_ns_op={:.3} p99_ns_op={:.3} mean_ns_op={:.3} throughput_ops_s={:.3}",
            bench_label,
            samples.len(),
            p50,
            p95,
            p99,
            mean,
            throughput_ops_s
        );
    }
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    debug_assert!((0.0..=1.0).contains(&p));
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// wake_one with nobody queued: one spinlock roundtrip and out.
fn bench_wake_one_no_waiters(c: &mut Criterion) {
    let cv = ClassicCondvar::new();

    let stats = RefCell::new(BenchStats::default());
    let mut group = c.benchmark_group("condvar_hotpath");
    group.throughput(Throughput::Elements(1));
    group.bench_function("wake_one_no_waiters", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                cv.wake_one();
                black_box(());
            }
            let dur = start.elapsed().max(Duration::from_nanos(1));
            stats.borrow_mut().record(iters, dur);
            dur
        });
    });
    group.finish();
    stats.borrow().report("wake_one_no_waiters");
}

/// wake_all with nobody queued.
fn bench_wake_all_no_waiters(c: &mut Criterion) {
    let cv = ClassicCondvar::new();

    let stats = RefCell::new(BenchStats::default());
    let mut group = c.benchmark_group("condvar_hotpath");
    group.throughput(Throughput::Elements(1));
    group.bench_function("wake_all_no_waiters", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                cv.wake_all();
                black_box(());
            }
            let dur = start.elapsed().max(Duration::from_nanos(1));
            stats.borrow_mut().record(iters, dur);
            dur
        });
    });
    group.finish();
    stats.borrow().report("wake_all_no_waiters");
}

/// Timed wait whose deadline already passed: enqueue, immediate expiry,
/// dequeue, re-acquire. Measures the timeout detection path without real
/// blocking.
fn bench_timed_wait_past_deadline(c: &mut Criterion) {
    let cv = ClassicCondvar::new();
    let lock = ClassicLock::new();
    let past = Instant::now() - Duration::from_secs(1);

    let stats = RefCell::new(BenchStats::default());
    let mut group = c.benchmark_group("condvar_hotpath");
    group.throughput(Throughput::Elements(1));
    group.bench_function("timed_wait_past_deadline", |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                lock.lock();
                let status = cv.wait_deadline(&lock, past);
                lock.unlock();
                debug_assert_eq!(status, WaitStatus::TimedOut);
                black_box(status);
            }
            let dur = start.elapsed().max(Duration::from_nanos(1));
            stats.borrow_mut().record(iters, dur);
            dur
        });
    });
    group.finish();
    stats.borrow().report("timed_wait_past_deadline");
}

/// Manual threaded benchmark: wait + wake_one roundtrip over a classic
/// lock (1 waiter, 1 waker). Runs fixed rounds and emits stats.
fn bench_wait_wake_roundtrip(_c: &mut Criterion) {
    let rounds = 20;
    let iters_per_round: u64 = 500;
    let mut stats = BenchStats::default();

    for _ in 0..rounds {
        let cv = Arc::new(ClassicCondvar::new());
        let lock = Arc::new(ClassicLock::new());
        let done = Arc::new(AtomicU64::new(0));

        let waiter = {
            let (cv, lock, done) = (cv.clone(), lock.clone(), done.clone());
            std::thread::spawn(move || {
                for _ in 0..iters_per_round {
                    lock.lock();
                    cv.wait(&lock);
                    lock.unlock();
                    done.fetch_add(1, Ordering::Release);
                }
            })
        };

        let start = Instant::now();
        for i in 1..=iters_per_round {
            while !cv.has_waiters() {
                std::hint::spin_loop();
            }
            cv.wake_one();
            while done.load(Ordering::Acquire) < i {
                std::hint::spin_loop();
            }
        }
        let dur = start.elapsed().max(Duration::from_nanos(1));
        waiter.join().expect("waiter thread panicked");
        stats.record(iters_per_round, dur);
    }
    stats.report("wait_wake_roundtrip");
}

/// Same roundtrip over a handoff lock: wake_one conveys ownership instead
/// of waking the thread into contention.
fn bench_morphing_roundtrip(_c: &mut Criterion) {
    let rounds = 20;
    let iters_per_round: u64 = 500;
    let mut stats = BenchStats::default();

    for _ in 0..rounds {
        let cv = Arc::new(MorphCondvar::new());
        let lock = Arc::new(HandoffMutex::<HostPlatform>::new());
        let done = Arc::new(AtomicU64::new(0));

        let waiter = {
            let (cv, lock, done) = (cv.clone(), lock.clone(), done.clone());
            std::thread::spawn(move || {
                for _ in 0..iters_per_round {
                    lock.lock();
                    cv.wait(&lock);
                    lock.unlock();
                    done.fetch_add(1, Ordering::Release);
                }
            })
        };

        let start = Instant::now();
        for i in 1..=iters_per_round {
            while !cv.has_waiters() {
                std::hint::spin_loop();
            }
            cv.wake_one();
            while done.load(Ordering::Acquire) < i {
                std::hint::spin_loop();
            }
        }
        let dur = start.elapsed().max(Duration::from_nanos(1));
        waiter.join().expect("waiter thread panicked");
        stats.record(iters_per_round, dur);
    }
    stats.report("morphing_roundtrip");
}

/// Manual threaded benchmark: wake_all with 4 queued waiters per round.
fn bench_wake_all_4_waiters(_c: &mut Criterion) {
    let rounds: u64 = 200;
    let waiters = 4u64;
    let mut stats = BenchStats::default();

    let cv = Arc::new(ClassicCondvar::new());
    let lock = Arc::new(ClassicLock::new());
    let done = Arc::new(AtomicU64::new(0));

    let mut handles = Vec::new();
    for _ in 0..waiters {
        let (cv, lock, done) = (cv.clone(), lock.clone(), done.clone());
        handles.push(std::thread::spawn(move || {
            for _ in 0..rounds {
                lock.lock();
                cv.wait(&lock);
                lock.unlock();
                done.fetch_add(1, Ordering::Release);
            }
        }));
    }

    for round in 1..=rounds {
        while cv.waiter_count() as u64 != waiters {
            std::hint::spin_loop();
        }
        let start = Instant::now();
        cv.wake_all();
        while done.load(Ordering::Acquire) < round * waiters {
            std::hint::spin_loop();
        }
        stats.record(waiters, start.elapsed().max(Duration::from_nanos(1)));
    }
    for h in handles {
        h.join().expect("waiter thread panicked");
    }
    stats.report("wake_all_4_waiters");
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(3));
    targets =
        bench_wake_one_no_waiters,
        bench_wake_all_no_waiters,
        bench_timed_wait_past_deadline,
        bench_wait_wake_roundtrip,
        bench_morphing_roundtrip,
        bench_wake_all_4_waiters
);
criterion_main!(benches);
