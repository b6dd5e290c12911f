//! Provide the shared, pure vocabulary of the rigor test harness.
//!
//! Both the registration macro (`rigor_derive`) and the engine (`rigor`) need to agree on two things: how metadata
//! tags are spelled, and how failure kinds relate to each other. This crate owns both so the two sides cannot drift.
//!
//! ## Notes
//!
//! - This is a "vocabulary" crate: **no IO**, no global mutable state, no engine types.
//! - Current scope: metadata tag registry ([`lang::tags`]) and the builtin failure-kind hierarchy ([`lang::kinds`]).

pub mod lang;

pub use lang::kinds::{FailureKind, KindInfo};
pub use lang::tags::TagId;
