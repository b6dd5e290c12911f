//! Failure causes and panic capture.
//!
//! A [`Failure`] is what a test body "raises": a kind from the [`rigor_core::lang::kinds`] hierarchy, a message, and a
//! trail of source-location breadcrumbs. Test bodies raise either by returning `Err(Failure)` or by panicking;
//! [`capture`] turns the latter into the former so the engine only ever classifies `Failure` values.
//!
//! ## Panic classification
//!
//! | Payload | Kind |
//! |---|---|
//! | `Failure` (via `std::panic::panic_any`) | its own kind |
//! | `"Kind: message"` with a builtin `Kind` | that kind |
//! | `assertion ...` (the `assert!` family) | `AssertionError` |
//! | Rust runtime arithmetic / indexing panics | `ZeroDivisionError`, `OverflowError`, `IndexError` |
//! | anything else | `Panic` |

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::Once;

use rigor_core::lang::kinds::{self, FailureKind};
use thiserror::Error;

/// One source-location breadcrumb on a failure's trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub file: String,
    pub line: u32,
    pub column: u32,
    /// Free-form context added with [`Failure::context`].
    pub note: Option<String>,
}

impl Breadcrumb {
    pub fn at(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
            column: location.column(),
            note: None,
        }
    }

    #[track_caller]
    pub fn here() -> Self {
        Self::at(Location::caller())
    }
}

impl fmt::Display for Breadcrumb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}:{}:{}", self.file, self.line, self.column)?;
        if let Some(note) = &self.note {
            write!(f, " ({note})")?;
        }
        Ok(())
    }
}

/// The cause attached to a failed execution.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct Failure {
    kind: FailureKind,
    message: String,
    trail: Vec<Breadcrumb>,
}

impl Failure {
    /// Raise `kind` with `message`, recording the caller as the first breadcrumb.
    #[track_caller]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::bare(kind, message).with_breadcrumb(Breadcrumb::here())
    }

    /// A failure with no location information.
    pub fn bare(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            trail: Vec::new(),
        }
    }

    /// Shorthand for an `AssertionError` raised at the caller.
    #[track_caller]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(&kinds::ASSERTION_ERROR, message)
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Breadcrumbs, innermost first.
    pub fn trail(&self) -> &[Breadcrumb] {
        &self.trail
    }

    /// Whether this failure counts as a failed check rather than an execution error.
    pub fn is_assertion(&self) -> bool {
        self.kind.is_subkind_of(&kinds::ASSERTION_ERROR)
    }

    /// Append a breadcrumb for the caller, annotated with `note`.
    ///
    /// Use it while propagating a failure out of a helper:
    /// `helper().map_err(|f| f.context("loading fixture data"))?`.
    #[track_caller]
    pub fn context(self, note: impl Into<String>) -> Self {
        let mut crumb = Breadcrumb::here();
        crumb.note = Some(note.into());
        self.with_breadcrumb(crumb)
    }

    pub fn with_breadcrumb(mut self, crumb: Breadcrumb) -> Self {
        self.trail.push(crumb);
        self
    }

    pub(crate) fn with_trail(mut self, trail: &[Breadcrumb]) -> Self {
        self.trail.extend_from_slice(trail);
        self
    }

    /// Build a failure from a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>, location: Option<Breadcrumb>) -> Self {
        let payload = match payload.downcast::<Failure>() {
            Ok(failure) => {
                let mut failure = *failure;
                if let Some(crumb) = location.filter(|_| failure.trail.is_empty()) {
                    failure.trail.push(crumb);
                }
                return failure;
            }
            Err(other) => other,
        };

        let text = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with a non-string payload".to_string()
        };

        let (kind, message) = classify_panic_message(&text);
        let failure = Self::bare(kind, message);
        match location {
            Some(crumb) => failure.with_breadcrumb(crumb),
            None => failure,
        }
    }
}

/// Messages of panics raised by the Rust runtime itself, mapped to the closest kind.
const RUNTIME_PANICS: &[(&str, &kinds::KindInfo)] = &[
    ("attempt to divide by zero", &kinds::ZERO_DIVISION_ERROR),
    ("attempt to calculate the remainder with a divisor of zero", &kinds::ZERO_DIVISION_ERROR),
    ("attempt to add with overflow", &kinds::OVERFLOW_ERROR),
    ("attempt to subtract with overflow", &kinds::OVERFLOW_ERROR),
    ("attempt to multiply with overflow", &kinds::OVERFLOW_ERROR),
    ("attempt to negate with overflow", &kinds::OVERFLOW_ERROR),
    ("index out of bounds", &kinds::INDEX_ERROR),
];

fn classify_panic_message(text: &str) -> (FailureKind, String) {
    if let Some((kind, rest)) = kinds::split_canonical(text) {
        return (kind, rest.to_string());
    }
    if text.starts_with("assertion") {
        return (&kinds::ASSERTION_ERROR, text.to_string());
    }
    if let Some((_, kind)) = RUNTIME_PANICS.iter().find(|(prefix, _)| text.starts_with(prefix)) {
        return (kind, text.to_string());
    }
    (&kinds::PANIC, text.to_string())
}

impl From<std::io::Error> for Failure {
    #[track_caller]
    fn from(e: std::io::Error) -> Self {
        Self::new(&kinds::IO_ERROR, e.to_string())
    }
}

impl From<std::num::ParseIntError> for Failure {
    #[track_caller]
    fn from(e: std::num::ParseIntError) -> Self {
        Self::new(&kinds::VALUE_ERROR, e.to_string())
    }
}

impl From<std::num::ParseFloatError> for Failure {
    #[track_caller]
    fn from(e: std::num::ParseFloatError) -> Self {
        Self::new(&kinds::VALUE_ERROR, e.to_string())
    }
}

thread_local! {
    static CAPTURING: Cell<usize> = const { Cell::new(0) };
    static LAST_PANIC: RefCell<Option<Breadcrumb>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Chain a hook in front of the current one, once per process. Threads inside [`capture`] only record the panic
/// location; every other panic reaches the previous hook untouched.
fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) > 0 {
                let crumb = info.location().map(Breadcrumb::at);
                LAST_PANIC.with(|slot| *slot.borrow_mut() = crumb);
            } else {
                previous(info);
            }
        }));
    });
}

/// Marks the current thread as capturing for as long as it lives.
struct CaptureScope;

impl CaptureScope {
    fn enter() -> Self {
        install_hook();
        CAPTURING.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for CaptureScope {
    fn drop(&mut self) {
        CAPTURING.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Run `f`, converting a panic into a [`Failure`].
///
/// The default panic message is suppressed while `f` runs; the panic location becomes the failure's first
/// breadcrumb.
pub fn capture<R>(f: impl FnOnce() -> R) -> Result<R, Failure> {
    let scope = CaptureScope::enter();
    LAST_PANIC.with(|slot| slot.borrow_mut().take());
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    drop(scope);

    result.map_err(|payload| {
        let location = LAST_PANIC.with(|slot| slot.borrow_mut().take());
        Failure::from_panic(payload, location)
    })
}
