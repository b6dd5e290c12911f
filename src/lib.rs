#![forbid(unsafe_code)]
//! rigor: a fixture-based test harness
//!
//! A test binary registers fixture types with `#[rigor::fixture]`, groups them into modules, and hands a
//! [`loader::Registry`] to [`cli::run`]. rigor discovers the `test_class` types of each requested module, binds their
//! lifecycle methods, runs every test case on a fresh instance, classifies each outcome and prints a summary per
//! module.
//!
//! ```rust,ignore
//! use rigor::{TestResult, check, kinds};
//!
//! #[derive(Default)]
//! struct Calc;
//!
//! #[rigor::fixture]
//! impl Calc {
//!     #[test_case]
//!     fn add_ok(&mut self) -> TestResult {
//!         check::equal(4, 2 + 2)
//!     }
//!
//!     #[test_case]
//!     #[expected_error(kinds::ZERO_DIVISION_ERROR)]
//!     fn div_zero(&mut self) -> TestResult {
//!         check::raise(&kinds::ZERO_DIVISION_ERROR, "division by zero")
//!     }
//! }
//!
//! fn main() {
//!     let registry = rigor::loader::Registry::new()
//!         .module("calc", || rigor::describe::Module::builder("calc").register::<Calc>().build());
//!     rigor::cli::run(&registry);
//! }
//! ```
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test bodies**: panics are expected. They are caught by [`failure::capture`] and classified like returned
//!   failures.
//!
//! - **True invariants**: If a panic represents a rigor bug, use `.expect("reason")` with a clear explanation.

// The registration macro emits `::rigor::` paths; this lets them resolve inside the crate too.
extern crate self as rigor;

pub mod check;
pub mod cli;
pub mod collector;
pub mod config;
pub mod describe;
pub mod driver;
pub mod failure;
pub mod fixture;
pub mod loader;
pub mod outcome;
pub mod report;
pub mod unit;

pub use rigor_core::lang::kinds;
pub use rigor_derive::fixture;

pub use collector::{Collector, Summary};
pub use config::RunConfig;
pub use describe::{Describe, Module, TestResult};
pub use driver::{Filter, RunReport, RunState, Target};
pub use failure::Failure;
pub use outcome::{OutcomeEvent, OutcomeKind};
