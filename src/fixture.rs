//! Fixture scanning and the per-case isolation protocol.
//!
//! A [`Fixture`] wraps one `test_class` type of a [`Module`]. [`Fixture::scan`] binds at most one method to each
//! lifecycle role and collects the test cases; [`Fixture::run`] drives them:
//!
//! 1. one-time setup (static); if it fails every case is reported as skipped and nothing else runs
//! 2. per case: fresh instance, setup, the case itself, teardown, then the instance is dropped
//! 3. one-time teardown (static), whatever the cases did
//!
//! Dropping an instance is captured like any other execution. A panicking `Drop` is reported as a teardown-role
//! `FailedExecution` named `Type.drop`.
//!
//! ## Role binding
//! A role is looked up on the type's own methods first, then on its base, then the base's base. Inside one type the
//! last qualifying method wins. One-time roles need a static zero-parameter method; per-case roles an instance
//! zero-parameter method.
//!
//! Test cases are collected over the same chain: the type's own cases first, then each base's, in declaration order.
//! A base case is shadowed by a case of the same name closer to the scanned type.

use regex::Regex;
use rigor_core::lang::tags::TagId;
use thiserror::Error;

use crate::describe::{MethodDescriptor, Module, TypeDescriptor, TypeIdx, Upcast};
use crate::failure::{Failure, capture};
use crate::outcome::{OutcomeEvent, OutcomeKind, OutcomeSink, Role, Subject};
use crate::unit::TestUnit;

/// Why a type could not become a runnable fixture.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{type_name} is not tagged as a test class")]
    NotTestClass { type_name: String },

    #[error("{type_name} cannot be constructed: {cause}")]
    NoConstructor { type_name: String, cause: Failure },

    #[error("{type_name} has no runnable test cases")]
    NoTestCases {
        type_name: String,
        /// Whether a case filter removed every case.
        filtered: bool,
    },
}

impl Role {
    fn tag(self) -> TagId {
        match self {
            Role::TestCase => TagId::TestCase,
            Role::OneTimeSetUp => TagId::OneTimeSetUp,
            Role::OneTimeTearDown => TagId::OneTimeTearDown,
            Role::SetUp => TagId::SetUp,
            Role::TearDown => TagId::TearDown,
        }
    }

    /// Whether `method` may be bound to this role.
    pub fn accepts(self, method: &MethodDescriptor) -> bool {
        if !method.has_tag(self.tag()) || method.param_count() != 0 {
            return false;
        }
        match self {
            Role::TestCase => true,
            Role::OneTimeSetUp | Role::OneTimeTearDown => method.is_static(),
            Role::SetUp | Role::TearDown => !method.is_static(),
        }
    }
}

/// A scanned, runnable fixture.
pub struct Fixture<'m> {
    descriptor: &'m TypeDescriptor,
    cases: Vec<TestUnit<'m>>,
    one_time_setup: Option<TestUnit<'m>>,
    one_time_teardown: Option<TestUnit<'m>>,
    setup: Option<TestUnit<'m>>,
    teardown: Option<TestUnit<'m>>,
}

impl<'m> Fixture<'m> {
    /// Validate the type at `idx` and bind its roles and cases.
    pub fn scan(module: &'m Module, idx: TypeIdx, case_filter: Option<&Regex>) -> Result<Self, ScanError> {
        let descriptor = module.get(idx);
        let type_name = descriptor.name().to_string();
        if !descriptor.is_test_class() {
            return Err(ScanError::NotTestClass { type_name });
        }

        match descriptor.construct() {
            Err(cause) => return Err(ScanError::NoConstructor { type_name, cause }),
            Ok(instance) => {
                // A failed drop here is only logged; case instances report their own.
                if let Err(cause) = capture(move || drop(instance)) {
                    tracing::warn!(fixture = %type_name, %cause, "dropping the scan instance failed");
                }
            }
        }

        let mut cases: Vec<TestUnit<'m>> = Vec::new();
        for (ty, path) in lineage(module, idx) {
            for method in module.get(ty).methods() {
                if !Role::TestCase.accepts(method) || !case_filter.is_none_or(|re| re.is_match(method.name())) {
                    continue;
                }
                if cases.iter().any(|case| case.method().name() == method.name()) {
                    continue;
                }
                cases.push(TestUnit::new(method, Role::TestCase, path.clone()));
            }
        }
        if cases.is_empty() {
            return Err(ScanError::NoTestCases {
                type_name,
                filtered: case_filter.is_some(),
            });
        }

        let fixture = Self {
            descriptor,
            cases,
            one_time_setup: resolve_role(module, idx, Role::OneTimeSetUp),
            one_time_teardown: resolve_role(module, idx, Role::OneTimeTearDown),
            setup: resolve_role(module, idx, Role::SetUp),
            teardown: resolve_role(module, idx, Role::TearDown),
        };
        tracing::debug!(
            fixture = %type_name,
            cases = fixture.cases.len(),
            filtered = case_filter.is_some(),
            "scanned fixture"
        );
        Ok(fixture)
    }

    pub fn type_name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn cases(&self) -> &[TestUnit<'m>] {
        &self.cases
    }

    pub fn test_count(&self) -> usize {
        self.cases.len()
    }

    /// The unit bound to a lifecycle role, if any.
    pub fn role(&self, role: Role) -> Option<&TestUnit<'m>> {
        match role {
            Role::TestCase => None,
            Role::OneTimeSetUp => self.one_time_setup.as_ref(),
            Role::OneTimeTearDown => self.one_time_teardown.as_ref(),
            Role::SetUp => self.setup.as_ref(),
            Role::TearDown => self.teardown.as_ref(),
        }
    }

    /// Execute the fixture once, emitting every outcome into `sink`.
    pub fn run(&self, sink: &mut dyn OutcomeSink) {
        if let Some(unit) = &self.one_time_setup {
            if !unit.execute(None, sink) {
                tracing::debug!(fixture = %self.type_name(), "one-time setup failed; skipping cases");
                for case in &self.cases {
                    case.report(OutcomeKind::SkippedFixtureSetupFailed, None, sink);
                }
                return;
            }
        }

        for case in &self.cases {
            let mut instance = match self.descriptor.construct() {
                Ok(instance) => instance,
                Err(cause) => {
                    case.report(OutcomeKind::FailedNoConstructor, Some(cause), sink);
                    continue;
                }
            };
            if let Some(setup) = &self.setup {
                // A failed setup is reported but does not stop the case.
                setup.execute(Some(instance.as_mut()), sink);
            }
            case.execute(Some(instance.as_mut()), sink);
            if let Some(teardown) = &self.teardown {
                teardown.execute(Some(instance.as_mut()), sink);
            }
            if let Err(cause) = capture(move || drop(instance)) {
                tracing::debug!(fixture = %self.type_name(), case = %case.name(), "instance drop failed");
                let subject = Subject::Unit {
                    name: format!("{}.drop", self.type_name()),
                    role: Role::TearDown,
                };
                sink.record(OutcomeEvent::new(OutcomeKind::FailedExecution, subject, Some(cause)));
            }
        }

        if let Some(unit) = &self.one_time_teardown {
            unit.execute(None, sink);
        }
    }
}

/// The type at `idx` followed by its bases, each with the upcast path that reaches it from `idx`.
fn lineage(module: &Module, idx: TypeIdx) -> Vec<(TypeIdx, Vec<Upcast>)> {
    let mut links = Vec::new();
    let mut current = idx;
    let mut path = Vec::new();
    // A malformed base chain could loop; no chain is longer than the module.
    for _ in 0..module.len() {
        links.push((current, path.clone()));
        match (module.base_of(current), module.get(current).upcast()) {
            (Some(base), Some(upcast)) => {
                path.push(upcast);
                current = base;
            }
            _ => break,
        }
    }
    links
}

/// Bind `role` for the type at `idx`, walking up the base chain.
fn resolve_role<'m>(module: &'m Module, idx: TypeIdx, role: Role) -> Option<TestUnit<'m>> {
    lineage(module, idx).into_iter().find_map(|(ty, path)| {
        let method = module.get(ty).methods().iter().rev().find(|m| role.accepts(m))?;
        tracing::debug!(
            fixture = %module.get(idx).name(),
            role = ?role,
            method = %method.qualified_name(),
            depth = path.len(),
            "bound lifecycle role"
        );
        Some(TestUnit::new(method, role, path))
    })
}
