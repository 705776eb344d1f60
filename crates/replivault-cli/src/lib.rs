//! # Replivault CLI
//!
//! Scenario driver for the replivault coordination ledger. It plays the
//! role of the execution environment: supplying caller identities and a
//! monotonically increasing block counter while executing a JSON-described
//! sequence of operations against an in-memory coordinator.

pub mod runner;
pub mod scenario;

pub use runner::{run_scenario, RunReport, RunnerOptions, StepOutcome};
pub use scenario::{Expectation, Operation, Scenario, Step};
