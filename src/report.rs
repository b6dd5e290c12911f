//! Reporting sinks for progress and summaries.
//!
//! The driver feeds a [`Reporter`] every outcome event as it happens, then one summary per module. Two
//! implementations ship: [`ConsoleReporter`] (human-readable, optionally coloured) and [`JsonReporter`]
//! (one JSON object per line, for CI tooling).

use std::io::Write;

use serde::Serialize;

use crate::collector::{Bucket, CauseSummary, Summary};
use crate::driver::{ModuleOutcome, RunReport};
use crate::loader::LoadError;
use crate::outcome::{OutcomeEvent, OutcomeKind, Role};

// ============================================================================
// Reporter Trait
// ============================================================================

/// Receives progress and results from the driver.
pub trait Reporter {
    /// Called before a module is loaded
    fn on_module_start(&mut self, _module: &str) {}

    /// Called when a fixture is about to run
    fn on_fixture_start(&mut self, _fixture: &str, _test_count: usize) {}

    /// Called for every outcome event, including lifecycle methods and `Started`
    fn on_event(&mut self, event: &OutcomeEvent);

    /// Called when a module cannot be loaded
    fn on_load_error(&mut self, module: &str, error: &LoadError);

    /// Called after a module has run
    fn on_summary(&mut self, module: &str, summary: &Summary);

    /// Called once after every module
    fn on_run_complete(&mut self, _report: &RunReport) {}
}

/// Whether a non-verbose stream shows `kind`.
fn is_noteworthy(kind: OutcomeKind) -> bool {
    !matches!(kind, OutcomeKind::Started | OutcomeKind::Success)
}

fn role_suffix(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::SetUp) => " (setup)",
        Some(Role::TearDown) => " (teardown)",
        Some(Role::OneTimeSetUp) => " (one-time setup)",
        Some(Role::OneTimeTearDown) => " (one-time teardown)",
        Some(Role::TestCase) | None => "",
    }
}

// ============================================================================
// Console
// ============================================================================

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn paint(text: &str, color: &str, enabled: bool) -> String {
    if enabled {
        format!("{color}{text}{RESET}")
    } else {
        text.to_string()
    }
}

fn bucket_color(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Passed => GREEN,
        Bucket::Failed | Bucket::Errored => RED,
        Bucket::NotRun => YELLOW,
    }
}

fn kind_color(kind: OutcomeKind) -> &'static str {
    Bucket::of(kind).map(bucket_color).unwrap_or(BOLD)
}

/// Render a module summary: the count line, then each non-empty bucket.
///
/// Failed entries show their message; errored entries show kind and message, plus breadcrumbs when the summary
/// kept them.
pub fn render_summary(summary: &Summary, color: bool) -> String {
    let mut counts = vec![
        format!("Total:{}", summary.total),
        paint(&format!("Passed:{}", summary.passed.len()), GREEN, color),
    ];
    for bucket in [Bucket::Failed, Bucket::Errored, Bucket::NotRun] {
        let n = summary.entries(bucket).len();
        if n > 0 {
            counts.push(paint(&format!("{}:{n}", bucket.label()), bucket_color(bucket), color));
        }
    }

    let mut lines = vec![counts.join(" ")];
    for bucket in Bucket::ALL {
        let entries = summary.entries(bucket);
        if entries.is_empty() {
            continue;
        }
        let header = format!("{} ({}/{})", bucket.label(), entries.len(), summary.total);
        lines.push(paint(&header, bucket_color(bucket), color));
        for entry in entries {
            lines.push(format!("  {}", entry.name));
            let Some(cause) = &entry.cause else { continue };
            match bucket {
                Bucket::Failed => lines.push(format!("    *** {}", cause.message)),
                Bucket::Errored => {
                    lines.push(format!("    *** {} [{}]", cause.kind, cause.message));
                    lines.extend(cause.trail.iter().map(|crumb| format!("      {crumb}")));
                }
                Bucket::NotRun => lines.push(format!("    *** {}: {}", cause.kind, cause.message)),
                Bucket::Passed => {}
            }
        }
    }
    lines.join("\n")
}

/// Human-readable output.
pub struct ConsoleReporter<W: Write> {
    out: W,
    color: bool,
    verbose: bool,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, color: bool, verbose: bool) -> Self {
        Self { out, color, verbose }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // Console output is best effort; a closed pipe must not abort the run.
        let _ = writeln!(self.out, "{text}");
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn on_module_start(&mut self, module: &str) {
        let header = paint(&format!("== {module} =="), BOLD, self.color);
        self.line(&header);
    }

    fn on_fixture_start(&mut self, fixture: &str, test_count: usize) {
        self.line(&format!("Running {fixture} ({test_count} test cases)"));
    }

    fn on_event(&mut self, event: &OutcomeEvent) {
        let kind = event.kind();
        if !self.verbose && !is_noteworthy(kind) {
            return;
        }
        let label = paint(kind.label(), kind_color(kind), self.color);
        self.line(&format!(
            "{label} {}{}",
            event.subject().name(),
            role_suffix(event.subject().role())
        ));

        let Some(cause) = event.cause() else { return };
        match kind {
            OutcomeKind::FailedAssertion => self.line(&format!("    {}", cause.message())),
            OutcomeKind::FailedExecution => {
                self.line(&format!("    {cause}"));
                for crumb in cause.trail() {
                    self.line(&format!("      {crumb}"));
                }
            }
            k if k.is_not_run() => self.line(&format!("    {cause}")),
            _ => {}
        }
    }

    fn on_load_error(&mut self, module: &str, error: &LoadError) {
        let label = paint("error:", RED, self.color);
        self.line(&format!("{label} cannot load module {module}: {error}"));
    }

    fn on_summary(&mut self, _module: &str, summary: &Summary) {
        let rendered = render_summary(summary, self.color);
        self.line(&rendered);
        self.line("");
    }

    fn on_run_complete(&mut self, report: &RunReport) {
        let failed_loads = report
            .modules
            .iter()
            .filter(|m| matches!(m.outcome, ModuleOutcome::LoadFailed(_)))
            .count();
        if failed_loads > 0 {
            let text = paint(&format!("{failed_loads} module(s) failed to load"), RED, self.color);
            self.line(&text);
        }
    }
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Record<'a> {
    Event {
        module: &'a str,
        outcome: OutcomeKind,
        name: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
        #[serde(skip_serializing_if = "Option::is_none")]
        cause: Option<CauseSummary>,
    },
    LoadError {
        module: &'a str,
        error: String,
    },
    Summary {
        module: &'a str,
        #[serde(flatten)]
        summary: &'a Summary,
    },
}

/// Line-delimited JSON output.
pub struct JsonReporter<W: Write> {
    out: W,
    verbose: bool,
    module: String,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            module: String::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(out: &mut W, record: &Record<'_>) {
        match serde_json::to_string(record) {
            Ok(json) => {
                let _ = writeln!(out, "{json}");
            }
            Err(error) => tracing::warn!(%error, "failed to serialize report record"),
        }
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn on_module_start(&mut self, module: &str) {
        self.module = module.to_string();
    }

    fn on_event(&mut self, event: &OutcomeEvent) {
        if !self.verbose && !is_noteworthy(event.kind()) {
            return;
        }
        let record = Record::Event {
            module: &self.module,
            outcome: event.kind(),
            name: event.subject().name(),
            role: event.subject().role(),
            cause: event.cause().map(|f| CauseSummary::from_failure(f, true)),
        };
        Self::emit(&mut self.out, &record);
    }

    fn on_load_error(&mut self, module: &str, error: &LoadError) {
        let record = Record::LoadError {
            module,
            error: error.to_string(),
        };
        Self::emit(&mut self.out, &record);
    }

    fn on_summary(&mut self, module: &str, summary: &Summary) {
        Self::emit(&mut self.out, &Record::Summary { module, summary });
    }
}

#[cfg(test)]
mod tests {
    use rigor_core::lang::kinds;

    use super::*;
    use crate::collector::Collector;
    use crate::failure::{Breadcrumb, Failure};
    use crate::outcome::Subject;

    fn case(name: &str, kind: OutcomeKind, cause: Option<Failure>) -> OutcomeEvent {
        OutcomeEvent::new(
            kind,
            Subject::Unit {
                name: name.to_string(),
                role: Role::TestCase,
            },
            cause,
        )
    }

    fn sample() -> Summary {
        let crumb = Breadcrumb {
            file: "src/parse.rs".into(),
            line: 12,
            column: 5,
            note: Some("reading input".into()),
        };
        let mut collector = Collector::new();
        collector.record(case("Calc.add_ok", OutcomeKind::Success, None));
        collector.record(case(
            "Calc.always_false",
            OutcomeKind::FailedAssertion,
            Some(Failure::bare(&kinds::ASSERTION_ERROR, "expected true but was false")),
        ));
        collector.record(case(
            "Calc.parse",
            OutcomeKind::FailedExecution,
            Some(Failure::bare(&kinds::VALUE_ERROR, "bad digit").with_breadcrumb(crumb)),
        ));
        collector.summarize(2)
    }

    #[test]
    fn summary_lists_buckets_without_color() {
        insta::assert_snapshot!(render_summary(&sample(), false), @r"
        Total:3 Passed:1 Failed:1 Error:1
        Passed (1/3)
          Calc.add_ok
        Failed (1/3)
          Calc.always_false
            *** expected true but was false
        Error (1/3)
          Calc.parse
            *** ValueError [bad digit]
              at src/parse.rs:12:5 (reading input)
        ");
    }

    #[test]
    fn colored_summary_wraps_counts() {
        let rendered = render_summary(&sample(), true);
        assert!(rendered.starts_with("Total:3 \x1b[32mPassed:1\x1b[0m \x1b[31mFailed:1\x1b[0m"));
    }

    #[test]
    fn empty_buckets_are_omitted_from_the_count_line() {
        let summary = Collector::new().summarize(2);
        assert_eq!(render_summary(&summary, false), "Total:0 Passed:0");
    }

    #[test]
    fn console_streams_only_noteworthy_events() {
        let mut reporter = ConsoleReporter::new(Vec::new(), false, false);
        reporter.on_event(&case("Calc.add_ok", OutcomeKind::Started, None));
        reporter.on_event(&case("Calc.add_ok", OutcomeKind::Success, None));
        reporter.on_event(&case(
            "Calc.always_false",
            OutcomeKind::FailedAssertion,
            Some(Failure::bare(&kinds::ASSERTION_ERROR, "nope")),
        ));
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(out, "FAILED Calc.always_false\n    nope\n");
    }

    #[test]
    fn json_lines_are_tagged_records() {
        let mut reporter = JsonReporter::new(Vec::new(), false);
        reporter.on_module_start("demo");
        reporter.on_event(&case("Calc.boom", OutcomeKind::FailedExecution, Some(Failure::bare(&kinds::KEY_ERROR, "k"))));
        reporter.on_summary("demo", &Collector::new().summarize(2));
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = out.lines().map(|l| serde_json::from_str(l).unwrap()).collect();

        assert_eq!(lines[0]["type"], "event");
        assert_eq!(lines[0]["module"], "demo");
        assert_eq!(lines[0]["outcome"], "FAILED_EXECUTION");
        assert_eq!(lines[0]["role"], "test_case");
        assert_eq!(lines[0]["cause"]["kind"], "KeyError");
        assert_eq!(lines[1]["type"], "summary");
        assert_eq!(lines[1]["total"], 0);
    }
}
