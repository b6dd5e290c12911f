//! Assertion helpers for test bodies.
//!
//! Every helper returns a [`TestResult`] whose error is an `AssertionError` [`Failure`] located at the caller, so
//! bodies chain them with `?`:
//!
//! ```rust
//! use rigor::check;
//!
//! fn body() -> rigor::TestResult {
//!     check::equal(4, 2 + 2)?;
//!     check::is_some(&"42".parse::<u8>().ok())?;
//!     check::approx_eq(0.3, 0.1 + 0.2, 1e-9)
//! }
//! assert!(body().is_ok());
//! ```
//!
//! [`raise`] is the exception to the pattern: it unwinds with a typed `Failure` payload, for code paths that cannot
//! return a `Result`.

use std::fmt::{Debug, Display};

use rigor_core::lang::kinds::{self, FailureKind};

use crate::describe::TestResult;
use crate::failure::Failure;

/// Check that a condition holds.
#[track_caller]
pub fn is_true(condition: bool) -> TestResult {
    if condition {
        Ok(())
    } else {
        Err(Failure::assertion("expected true but was false"))
    }
}

/// Check that a condition does not hold.
#[track_caller]
pub fn is_false(condition: bool) -> TestResult {
    if condition {
        Err(Failure::assertion("expected false but was true"))
    } else {
        Ok(())
    }
}

/// Check `actual == expected`.
#[track_caller]
pub fn equal<T: PartialEq + Debug>(expected: T, actual: T) -> TestResult {
    if expected == actual {
        Ok(())
    } else {
        Err(Failure::assertion(format!(
            "expected {expected:?} but was {actual:?}"
        )))
    }
}

/// Check `actual != unexpected`.
#[track_caller]
pub fn not_equal<T: PartialEq + Debug>(unexpected: T, actual: T) -> TestResult {
    if unexpected != actual {
        Ok(())
    } else {
        Err(Failure::assertion(format!("expected a value other than {actual:?}")))
    }
}

/// Check that two references point at the same value.
#[track_caller]
pub fn same<T: ?Sized>(expected: &T, actual: &T) -> TestResult {
    if std::ptr::eq(expected, actual) {
        Ok(())
    } else {
        Err(Failure::assertion("expected the same instance but got two distinct ones"))
    }
}

#[track_caller]
pub fn is_none<T: Debug>(value: &Option<T>) -> TestResult {
    match value {
        None => Ok(()),
        Some(v) => Err(Failure::assertion(format!("expected None but was Some({v:?})"))),
    }
}

#[track_caller]
pub fn is_some<T>(value: &Option<T>) -> TestResult {
    match value {
        Some(_) => Ok(()),
        None => Err(Failure::assertion("expected a value but was None")),
    }
}

/// Check `|expected - actual| <= tolerance`.
#[track_caller]
pub fn approx_eq(expected: f64, actual: f64, tolerance: f64) -> TestResult {
    if (expected - actual).abs() <= tolerance {
        Ok(())
    } else {
        Err(Failure::assertion(format!(
            "expected {expected} but was {actual} (tolerance {tolerance})"
        )))
    }
}

/// Fail unconditionally.
#[track_caller]
pub fn fail(message: impl Display) -> TestResult {
    Err(Failure::assertion(message.to_string()))
}

/// Unwind with a `Failure` of `kind`.
#[cold]
#[track_caller]
pub fn raise(kind: FailureKind, message: impl Display) -> ! {
    std::panic::panic_any(Failure::new(kind, message.to_string()))
}

/// Unwind with a `NotSupportedError`; a placeholder for unfinished test bodies.
#[cold]
#[track_caller]
pub fn not_supported(what: &str) -> ! {
    raise(&kinds::NOT_SUPPORTED_ERROR, format_args!("{what} is not supported"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::capture;

    #[test]
    fn failures_are_assertions_at_the_call_site() {
        let failure = equal(1, 2).unwrap_err();
        assert!(failure.is_assertion());
        assert_eq!(failure.message(), "expected 1 but was 2");
        assert_eq!(failure.trail()[0].file, file!());
    }

    #[test]
    fn boolean_and_option_checks() {
        assert!(is_true(true).is_ok());
        assert!(is_false(true).is_err());
        assert!(is_none(&Some(3)).is_err());
        assert!(is_some(&Some(3)).is_ok());
        assert!(not_equal("a", "a").is_err());
    }

    #[test]
    fn same_compares_identity() {
        let a = String::from("x");
        let b = String::from("x");
        assert!(same(&a, &a).is_ok());
        assert!(same(&a, &b).is_err());
    }

    #[test]
    fn approx_eq_respects_tolerance() {
        assert!(approx_eq(0.3, 0.1 + 0.2, 1e-12).is_ok());
        assert!(approx_eq(1.0, 1.1, 0.01).is_err());
    }

    #[test]
    fn raise_unwinds_with_its_kind() {
        let failure = capture(|| raise(&kinds::KEY_ERROR, "gone")).unwrap_err();
        assert_eq!(failure.kind(), &kinds::KEY_ERROR);
        assert_eq!(failure.message(), "gone");
        assert_eq!(failure.trail()[0].file, file!());
    }
}
