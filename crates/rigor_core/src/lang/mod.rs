//! rigor vocabulary registries.
//!
//! This module is the "front door" for harness vocabulary: metadata tag spellings and failure kinds.
//!
//! The design goal is to avoid stringly-typed checks scattered across the macro and the engine. Callers work with
//! **stable IDs** (e.g. [`tags::TagId`]) or `&'static` kind descriptors and look up spellings/metadata via registry
//! tables.
//!
//! ## Notes
//! - Registries are **pure**: no engine types, no IO, no side effects.
//!
//! ## Examples
//! ```rust
//! use rigor_core::lang::tags::{self, TagId};
//!
//! assert_eq!(tags::from_str("test_case"), Some(TagId::TestCase));
//! assert_eq!(tags::as_str(TagId::SetUp), "setup");
//! ```
//!
//! ## See also
//! - `cargo run -p rigor_core --bin generate_vocab_reference` to generate Markdown reference tables.

pub mod kinds;
pub mod registry;
pub mod tags;
