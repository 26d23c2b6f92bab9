//! Scenario harness for the surewake condvar.
//!
//! This crate provides:
//! - Scenarios: executable renditions of the primitive's guarantees
//!   (no spurious wakeups, FIFO order, wait morphing, timeout races)
//! - Report generation: human-readable + machine-readable run reports
//!
//! Each scenario is an ordinary function that exercises real threads
//! against the core crate and fails by panicking; the runner converts
//! panics into structured outcomes.

#![forbid(unsafe_code)]

pub mod report;
pub mod scenarios;

pub use report::{HarnessError, HarnessReport, ScenarioOutcome};
pub use scenarios::{all_scenarios, Scenario};
