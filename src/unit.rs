//! A single executable method and the rules that classify its outcome.

use std::any::Any;

use rigor_core::lang::kinds;

use crate::describe::{ExpectedError, MethodDescriptor, Upcast};
use crate::failure::{Failure, capture};
use crate::outcome::{OutcomeEvent, OutcomeKind, OutcomeSink, Role, Subject};

/// One method bound as a test case or a lifecycle role.
///
/// `path` holds the upcasts from the scanned fixture's instance to the declaring type's part of it; it is empty for
/// methods declared on the fixture type itself.
pub struct TestUnit<'m> {
    method: &'m MethodDescriptor,
    role: Role,
    name: String,
    path: Vec<Upcast>,
}

impl<'m> TestUnit<'m> {
    pub fn new(method: &'m MethodDescriptor, role: Role, path: Vec<Upcast>) -> Self {
        Self {
            method,
            role,
            name: method.qualified_name(),
            path,
        }
    }

    /// `Type.method` of the declaring type.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn method(&self) -> &'m MethodDescriptor {
        self.method
    }

    pub fn expected_error(&self) -> Option<&'m ExpectedError> {
        self.method.expected_error()
    }

    fn subject(&self) -> Subject {
        Subject::Unit {
            name: self.name.clone(),
            role: self.role,
        }
    }

    /// Emit an event for this unit without executing it.
    pub fn report(&self, kind: OutcomeKind, cause: Option<Failure>, sink: &mut dyn OutcomeSink) {
        sink.record(OutcomeEvent::new(kind, self.subject(), cause));
    }

    /// Run the method once and emit `Started` plus exactly one terminal event.
    ///
    /// Returns `true` iff the method returned without raising. A raise that an `expected_error` tag turns into
    /// `Success` still returns `false`.
    pub fn execute(&self, instance: Option<&mut dyn Any>, sink: &mut dyn OutcomeSink) -> bool {
        self.report(OutcomeKind::Started, None, sink);

        let raised = match instance.map(|this| self.reach(this)).transpose() {
            Err(failure) => Some(failure),
            Ok(target) => match capture(|| self.method.invoke(target)) {
                Ok(Ok(())) => None,
                Ok(Err(failure)) | Err(failure) => Some(failure),
            },
        };
        let completed = raised.is_none();

        let (kind, cause) = classify(self.expected_error(), raised);
        tracing::trace!(unit = %self.name, role = ?self.role, outcome = ?kind, "executed");
        self.report(kind, cause, sink);
        completed
    }

    fn reach<'a>(&self, instance: &'a mut dyn Any) -> Result<&'a mut dyn Any, Failure> {
        let mut current = instance;
        for step in &self.path {
            current = step(current).ok_or_else(|| {
                Failure::bare(
                    &kinds::RUNTIME_ERROR,
                    format!("instance cannot be viewed as {}", self.method.declaring_type()),
                )
            })?;
        }
        Ok(current)
    }
}

/// Classify one execution given its expected error, if any, and what it raised.
///
/// The returned cause is the raised failure, or a synthesized `AssertionError` describing an expectation mismatch.
pub fn classify(expected: Option<&ExpectedError>, raised: Option<Failure>) -> (OutcomeKind, Option<Failure>) {
    match (expected, raised) {
        (None, None) => (OutcomeKind::Success, None),
        (None, Some(failure)) if failure.is_assertion() => (OutcomeKind::FailedAssertion, Some(failure)),
        (None, Some(failure)) => (OutcomeKind::FailedExecution, Some(failure)),
        (Some(spec), None) => (
            OutcomeKind::FailedAssertion,
            Some(Failure::bare(
                &kinds::ASSERTION_ERROR,
                format!("expected {} but no error was raised", spec.kind),
            )),
        ),
        (Some(spec), Some(failure)) => {
            if !failure.kind().is_subkind_of(spec.kind) {
                let mismatch = Failure::bare(
                    &kinds::ASSERTION_ERROR,
                    format!("expected {} but was {}: {}", spec.kind, failure.kind(), failure.message()),
                )
                .with_trail(failure.trail());
                return (OutcomeKind::FailedAssertion, Some(mismatch));
            }
            match &spec.message {
                Some(m) if !failure.message().contains(m.as_str()) => {
                    let mismatch = Failure::bare(
                        &kinds::ASSERTION_ERROR,
                        format!("expected message containing [{m}] but was [{}]", failure.message()),
                    )
                    .with_trail(failure.trail());
                    (OutcomeKind::FailedAssertion, Some(mismatch))
                }
                _ => (OutcomeKind::Success, Some(failure)),
            }
        }
    }
}
