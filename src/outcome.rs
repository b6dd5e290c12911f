//! Outcome events: the only thing executions produce.

use std::fmt;

use serde::Serialize;

use crate::failure::Failure;

/// Classification of one execution or of a whole fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Success,
    Started,
    FailedAssertion,
    FailedExecution,
    SkippedFixtureSetupFailed,
    FailedNoConstructor,
    FailedNoTestCase,
}

impl OutcomeKind {
    /// Every kind except `Started` ends an execution.
    pub fn is_terminal(self) -> bool {
        self != OutcomeKind::Started
    }

    /// Kinds reported when a case never got to run.
    pub fn is_not_run(self) -> bool {
        matches!(
            self,
            OutcomeKind::SkippedFixtureSetupFailed | OutcomeKind::FailedNoConstructor | OutcomeKind::FailedNoTestCase
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            OutcomeKind::Success => "SUCCESS",
            OutcomeKind::Started => "STARTED",
            OutcomeKind::FailedAssertion => "FAILED",
            OutcomeKind::FailedExecution => "ERROR",
            OutcomeKind::SkippedFixtureSetupFailed => "SKIPPED (fixture setup failed)",
            OutcomeKind::FailedNoConstructor => "NOT RUN (no constructor)",
            OutcomeKind::FailedNoTestCase => "NOT RUN (no test case)",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The lifecycle role a unit was bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    TestCase,
    OneTimeSetUp,
    OneTimeTearDown,
    SetUp,
    TearDown,
}

impl Role {
    pub fn is_lifecycle(self) -> bool {
        self != Role::TestCase
    }
}

/// What an event is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// One method execution.
    Unit { name: String, role: Role },
    /// A whole fixture type, for type-level outcomes.
    Type { name: String },
}

impl Subject {
    pub fn name(&self) -> &str {
        match self {
            Subject::Unit { name, .. } | Subject::Type { name } => name,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Subject::Unit { role, .. } => Some(*role),
            Subject::Type { .. } => None,
        }
    }
}

/// One immutable outcome notification.
#[derive(Debug, Clone)]
pub struct OutcomeEvent {
    kind: OutcomeKind,
    subject: Subject,
    cause: Option<Failure>,
}

impl OutcomeEvent {
    pub fn new(kind: OutcomeKind, subject: Subject, cause: Option<Failure>) -> Self {
        Self { kind, subject, cause }
    }

    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn cause(&self) -> Option<&Failure> {
        self.cause.as_ref()
    }

    /// Whether the event concerns a test case or a whole type, as opposed to a lifecycle method.
    pub fn is_case_level(&self) -> bool {
        !matches!(self.subject.role(), Some(role) if role.is_lifecycle())
    }
}

/// Receiver of outcome events.
pub trait OutcomeSink {
    fn record(&mut self, event: OutcomeEvent);
}

impl OutcomeSink for Vec<OutcomeEvent> {
    fn record(&mut self, event: OutcomeEvent) {
        self.push(event);
    }
}
