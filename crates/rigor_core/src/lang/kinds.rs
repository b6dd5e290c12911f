//! Failure-kind vocabulary and hierarchy.
//!
//! A failure kind is a `&'static KindInfo`. Kinds form a single-inheritance tree rooted at [`ERROR`]; an
//! expected-error tag accepts the kind it names *and every subkind*. Users declare their own kinds as statics that
//! hang off a builtin parent:
//!
//! ```rust
//! use rigor_core::lang::kinds::{self, KindInfo};
//!
//! pub static PARSE_ERROR: KindInfo = KindInfo::new("ParseError", Some(&kinds::VALUE_ERROR));
//!
//! assert!(PARSE_ERROR.is_subkind_of(&kinds::VALUE_ERROR));
//! assert!(PARSE_ERROR.is_subkind_of(&kinds::ERROR));
//! assert!(!kinds::VALUE_ERROR.is_subkind_of(&PARSE_ERROR));
//! ```
//!
//! ## Notes
//! - Identity is the kind **name**: two statics with the same name are the same kind.
//! - Panic messages of the canonical form `Kind: message` are mapped back to a builtin kind by
//!   [`split_canonical`], so code that raises by panicking keeps its kind.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A failure kind. Compare with `==` (by name) or [`KindInfo::is_subkind_of`].
pub type FailureKind = &'static KindInfo;

/// Descriptor of one failure kind.
#[derive(Debug)]
pub struct KindInfo {
    name: &'static str,
    parent: Option<&'static KindInfo>,
    description: &'static str,
}

impl KindInfo {
    /// Declare a kind with an optional parent.
    pub const fn new(name: &'static str, parent: Option<&'static KindInfo>) -> Self {
        Self {
            name,
            parent,
            description: "",
        }
    }

    /// Attach a one-line description (used by the reference generator).
    pub const fn with_description(self, description: &'static str) -> Self {
        Self {
            name: self.name,
            parent: self.parent,
            description,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<FailureKind> {
        self.parent
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Return `true` if `self` equals `other` or `other` is one of its ancestors.
    pub fn is_subkind_of(&self, other: &KindInfo) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind.name == other.name {
                return true;
            }
            current = kind.parent;
        }
        false
    }

    /// Iterate `self` followed by its ancestors up to the root.
    pub fn lineage(&'static self) -> impl Iterator<Item = FailureKind> {
        std::iter::successors(Some(self), |k| k.parent)
    }
}

impl PartialEq for KindInfo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for KindInfo {}

impl Hash for KindInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for KindInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub static ERROR: KindInfo = KindInfo::new("Error", None).with_description("Root of every failure kind.");

pub static ASSERTION_ERROR: KindInfo = KindInfo::new("AssertionError", Some(&ERROR))
    .with_description("A checked condition did not hold. Classified as a test failure, not an error.");

pub static RUNTIME_ERROR: KindInfo =
    KindInfo::new("RuntimeError", Some(&ERROR)).with_description("Generic failure while executing test code.");

pub static PANIC: KindInfo = KindInfo::new("Panic", Some(&RUNTIME_ERROR))
    .with_description("A panic whose payload did not name a known kind.");

pub static ARITHMETIC_ERROR: KindInfo =
    KindInfo::new("ArithmeticError", Some(&ERROR)).with_description("Base kind for numeric failures.");

pub static ZERO_DIVISION_ERROR: KindInfo = KindInfo::new("ZeroDivisionError", Some(&ARITHMETIC_ERROR))
    .with_description("Division or modulo by zero.");

pub static OVERFLOW_ERROR: KindInfo = KindInfo::new("OverflowError", Some(&ARITHMETIC_ERROR))
    .with_description("Arithmetic result out of range.");

pub static VALUE_ERROR: KindInfo = KindInfo::new("ValueError", Some(&ERROR))
    .with_description("An argument had the right type but an invalid value.");

pub static TYPE_ERROR: KindInfo =
    KindInfo::new("TypeError", Some(&ERROR)).with_description("A value had an inappropriate type.");

pub static LOOKUP_ERROR: KindInfo =
    KindInfo::new("LookupError", Some(&ERROR)).with_description("Base kind for failed lookups.");

pub static INDEX_ERROR: KindInfo =
    KindInfo::new("IndexError", Some(&LOOKUP_ERROR)).with_description("An index was out of bounds.");

pub static KEY_ERROR: KindInfo =
    KindInfo::new("KeyError", Some(&LOOKUP_ERROR)).with_description("A map key was missing.");

pub static NOT_SUPPORTED_ERROR: KindInfo = KindInfo::new("NotSupportedError", Some(&ERROR))
    .with_description("The operation is not supported.");

pub static IO_ERROR: KindInfo =
    KindInfo::new("IoError", Some(&ERROR)).with_description("An I/O operation failed.");

/// Registry of builtin kinds, parents before children.
pub static BUILTIN_KINDS: &[&KindInfo] = &[
    &ERROR,
    &ASSERTION_ERROR,
    &RUNTIME_ERROR,
    &PANIC,
    &ARITHMETIC_ERROR,
    &ZERO_DIVISION_ERROR,
    &OVERFLOW_ERROR,
    &VALUE_ERROR,
    &TYPE_ERROR,
    &LOOKUP_ERROR,
    &INDEX_ERROR,
    &KEY_ERROR,
    &NOT_SUPPORTED_ERROR,
    &IO_ERROR,
];

/// Resolve a builtin kind by name. Matching is case-sensitive.
pub fn from_str(name: &str) -> Option<FailureKind> {
    BUILTIN_KINDS.iter().copied().find(|k| k.name == name)
}

/// Split a canonical `Kind: message` string into its builtin kind and message.
///
/// A bare kind name (no `": "`) yields an empty message. Returns `None` when the prefix is not a builtin kind.
///
/// ## Examples
/// ```rust
/// use rigor_core::lang::kinds::{self, split_canonical};
///
/// let (kind, msg) = split_canonical("ValueError: bad digit").unwrap();
/// assert_eq!(kind, &kinds::VALUE_ERROR);
/// assert_eq!(msg, "bad digit");
/// assert!(split_canonical("index out of bounds").is_none());
/// ```
pub fn split_canonical(text: &str) -> Option<(FailureKind, &str)> {
    match text.split_once(": ") {
        Some((head, rest)) => from_str(head).map(|k| (k, rest)),
        None => from_str(text.trim_end()).map(|k| (k, "")),
    }
}
