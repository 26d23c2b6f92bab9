//! Benchmark-only crate; see `benches/condvar_bench.rs`.

#![forbid(unsafe_code)]
