//! Result buckets and per-module summaries.

use serde::Serialize;

use crate::failure::Failure;
use crate::outcome::{OutcomeEvent, OutcomeKind, OutcomeSink};

/// The four result buckets of a module run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Passed,
    Failed,
    Errored,
    NotRun,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Bucket::Passed, Bucket::Failed, Bucket::Errored, Bucket::NotRun];

    /// The bucket a case-level event of `kind` lands in. `Started` has none.
    pub fn of(kind: OutcomeKind) -> Option<Bucket> {
        match kind {
            OutcomeKind::Success => Some(Bucket::Passed),
            OutcomeKind::FailedAssertion => Some(Bucket::Failed),
            OutcomeKind::FailedExecution => Some(Bucket::Errored),
            OutcomeKind::Started => None,
            k if k.is_not_run() => Some(Bucket::NotRun),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Bucket::Passed => "Passed",
            Bucket::Failed => "Failed",
            Bucket::Errored => "Error",
            Bucket::NotRun => "Not Run",
        }
    }
}

/// Buckets case-level outcomes for one module.
#[derive(Debug, Default)]
pub struct Collector {
    passed: Vec<OutcomeEvent>,
    failed: Vec<OutcomeEvent>,
    errored: Vec<OutcomeEvent>,
    not_run: Vec<OutcomeEvent>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// File `event` into its bucket. `Started` events and lifecycle-method events are ignored.
    pub fn record(&mut self, event: OutcomeEvent) -> Option<Bucket> {
        if !event.is_case_level() {
            return None;
        }
        let bucket = Bucket::of(event.kind())?;
        self.bucket_mut(bucket).push(event);
        Some(bucket)
    }

    pub fn bucket(&self, bucket: Bucket) -> &[OutcomeEvent] {
        match bucket {
            Bucket::Passed => &self.passed,
            Bucket::Failed => &self.failed,
            Bucket::Errored => &self.errored,
            Bucket::NotRun => &self.not_run,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<OutcomeEvent> {
        match bucket {
            Bucket::Passed => &mut self.passed,
            Bucket::Failed => &mut self.failed,
            Bucket::Errored => &mut self.errored,
            Bucket::NotRun => &mut self.not_run,
        }
    }

    pub fn total(&self) -> usize {
        Bucket::ALL.iter().map(|b| self.bucket(*b).len()).sum()
    }

    pub fn reset(&mut self) {
        for bucket in Bucket::ALL {
            self.bucket_mut(bucket).clear();
        }
    }

    /// Snapshot the buckets.
    ///
    /// Errored entries keep their breadcrumbs only while the errored bucket holds at most `detail_threshold` entries;
    /// a long list of errors is reported by kind and message alone.
    pub fn summarize(&self, detail_threshold: usize) -> Summary {
        let with_trail = self.errored.len() <= detail_threshold;
        let entries = |bucket: Bucket, trail: bool| -> Vec<SummaryEntry> {
            self.bucket(bucket)
                .iter()
                .map(|event| SummaryEntry::from_event(event, trail))
                .collect()
        };
        Summary {
            total: self.total(),
            passed: entries(Bucket::Passed, false),
            failed: entries(Bucket::Failed, false),
            errored: entries(Bucket::Errored, with_trail),
            not_run: entries(Bucket::NotRun, false),
        }
    }
}

impl OutcomeSink for Collector {
    fn record(&mut self, event: OutcomeEvent) {
        Collector::record(self, event);
    }
}

/// Cause information kept in a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CauseSummary {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trail: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub name: String,
    pub outcome: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<CauseSummary>,
}

impl CauseSummary {
    pub fn from_failure(failure: &Failure, with_trail: bool) -> Self {
        Self {
            kind: failure.kind().name().to_string(),
            message: failure.message().to_string(),
            trail: if with_trail {
                failure.trail().iter().map(ToString::to_string).collect()
            } else {
                Vec::new()
            },
        }
    }
}

impl SummaryEntry {
    fn from_event(event: &OutcomeEvent, with_trail: bool) -> Self {
        let cause = event
            .cause()
            .filter(|_| event.kind() != OutcomeKind::Success)
            .map(|failure| CauseSummary::from_failure(failure, with_trail));
        Self {
            name: event.subject().name().to_string(),
            outcome: event.kind(),
            cause,
        }
    }
}

/// Per-module counts and listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: Vec<SummaryEntry>,
    pub failed: Vec<SummaryEntry>,
    pub errored: Vec<SummaryEntry>,
    pub not_run: Vec<SummaryEntry>,
}

impl Summary {
    pub fn entries(&self, bucket: Bucket) -> &[SummaryEntry] {
        match bucket {
            Bucket::Passed => &self.passed,
            Bucket::Failed => &self.failed,
            Bucket::Errored => &self.errored,
            Bucket::NotRun => &self.not_run,
        }
    }

    /// Whether anything failed, errored or did not run.
    pub fn has_problems(&self) -> bool {
        !(self.failed.is_empty() && self.errored.is_empty() && self.not_run.is_empty())
    }
}
