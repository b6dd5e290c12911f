//! End-to-end runs over fixtures registered with `#[rigor::fixture]`.
//!
//! Each test builds a small registry, runs it through the driver, and checks the emitted events and the per-module
//! summaries.

use std::sync::atomic::{AtomicUsize, Ordering};

use rigor::collector::Bucket;
use rigor::config::RunConfig;
use rigor::describe::Module;
use rigor::driver::{ModuleOutcome, RunReport, parse_targets, run_targets};
use rigor::loader::{LoadError, Registry};
use rigor::outcome::{OutcomeEvent, OutcomeKind, Role};
use rigor::report::{ConsoleReporter, Reporter};
use rigor::{Summary, TestResult, check, kinds};

// ============================================================================
// Helpers
// ============================================================================

#[derive(Default)]
struct Recorder {
    events: Vec<OutcomeEvent>,
    load_errors: Vec<String>,
}

impl Recorder {
    fn kinds_of(&self, name: &str) -> Vec<OutcomeKind> {
        self.events
            .iter()
            .filter(|e| e.subject().name() == name)
            .map(|e| e.kind())
            .collect()
    }
}

impl Reporter for Recorder {
    fn on_event(&mut self, event: &OutcomeEvent) {
        self.events.push(event.clone());
    }

    fn on_load_error(&mut self, module: &str, _error: &LoadError) {
        self.load_errors.push(module.to_string());
    }

    fn on_summary(&mut self, _module: &str, _summary: &Summary) {}
}

fn run_with(registry: &Registry, args: &[&str], config: RunConfig) -> (RunReport, Recorder) {
    let targets = parse_targets(args).unwrap();
    let mut recorder = Recorder::default();
    let report = run_targets(registry, &targets, config, &mut recorder);
    (report, recorder)
}

fn run(registry: &Registry, args: &[&str]) -> (RunReport, Recorder) {
    run_with(registry, args, RunConfig::new())
}

fn names(summary: &Summary, bucket: Bucket) -> Vec<&str> {
    summary.entries(bucket).iter().map(|e| e.name.as_str()).collect()
}

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Default)]
struct Calc;

#[rigor::fixture]
impl Calc {
    #[test_case]
    fn add_ok(&mut self) -> TestResult {
        check::equal(4, 2 + 2)
    }

    #[test_case]
    #[expected_error(kinds::ZERO_DIVISION_ERROR)]
    fn div_zero(&mut self) -> TestResult {
        let zero = std::hint::black_box(0);
        check::equal(0, 1 / zero)
    }
}

#[derive(Default)]
struct Flawed;

#[rigor::fixture]
impl Flawed {
    #[test_case]
    fn always_false(&mut self) -> TestResult {
        check::is_true(false)
    }

    #[test_case]
    fn lookup(&mut self) -> TestResult {
        check::raise(&kinds::KEY_ERROR, "'missing' not in table")
    }
}

static SKIPPED_BODIES: AtomicUsize = AtomicUsize::new(0);
static SKIPPED_TEARDOWNS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct NoDatabase;

#[rigor::fixture]
impl NoDatabase {
    #[one_time_setup]
    fn connect() -> TestResult {
        Err(rigor::Failure::new(&kinds::IO_ERROR, "connection refused"))
    }

    #[test_case]
    fn first(&mut self) {
        SKIPPED_BODIES.fetch_add(1, Ordering::SeqCst);
    }

    #[test_case]
    fn second(&mut self) {
        SKIPPED_BODIES.fetch_add(1, Ordering::SeqCst);
    }

    #[test_case]
    fn third(&mut self) {
        SKIPPED_BODIES.fetch_add(1, Ordering::SeqCst);
    }

    #[one_time_teardown]
    fn disconnect() {
        SKIPPED_TEARDOWNS.fetch_add(1, Ordering::SeqCst);
    }
}

static FILTERED_CALC_RUNS: AtomicUsize = AtomicUsize::new(0);
static FILTERED_OTHER_BUILDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct FilteredCalc;

#[rigor::fixture]
impl FilteredCalc {
    #[test_case]
    fn add_ok(&mut self) {
        FILTERED_CALC_RUNS.fetch_add(1, Ordering::SeqCst);
    }

    #[test_case]
    #[expected_error(kinds::ZERO_DIVISION_ERROR)]
    fn div_zero(&mut self) {
        FILTERED_CALC_RUNS.fetch_add(1, Ordering::SeqCst);
        check::raise(&kinds::ZERO_DIVISION_ERROR, "division by zero");
    }
}

struct FilteredOther;

fn build_other() -> FilteredOther {
    FILTERED_OTHER_BUILDS.fetch_add(1, Ordering::SeqCst);
    FilteredOther
}

#[rigor::fixture(constructor = build_other)]
impl FilteredOther {
    #[test_case]
    fn div_zero(&mut self) {}
}

static ORPHAN_RUNS: AtomicUsize = AtomicUsize::new(0);

struct Orphan;

#[rigor::fixture(no_constructor)]
impl Orphan {
    #[test_case]
    fn unreachable(&mut self) {
        ORPHAN_RUNS.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct Empty;

#[rigor::fixture]
impl Empty {
    fn helper(&self) -> u32 {
        7
    }
}

#[derive(Default)]
struct Helper;

#[rigor::fixture(support)]
impl Helper {
    #[test_case]
    fn not_collected(&mut self) -> TestResult {
        check::fail("support types are never run")
    }
}

#[derive(Default)]
struct BaseSuite {
    visits: u32,
}

#[rigor::fixture(support)]
impl BaseSuite {
    #[test_case]
    fn inherited_case(&mut self) -> TestResult {
        self.visits += 1;
        check::equal(1, self.visits)
    }
}

#[derive(Default)]
struct Derived {
    base: BaseSuite,
}

impl AsMut<BaseSuite> for Derived {
    fn as_mut(&mut self) -> &mut BaseSuite {
        &mut self.base
    }
}

#[rigor::fixture(base = BaseSuite)]
impl Derived {
    #[test_case]
    fn own_case(&mut self) -> TestResult {
        check::equal(0, self.base.visits)
    }
}

static BOMBS_DROPPED: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct DropBomb;

impl Drop for DropBomb {
    fn drop(&mut self) {
        // The scan instance goes quietly; case instances explode.
        if BOMBS_DROPPED.fetch_add(1, Ordering::SeqCst) > 0 {
            panic!("drop exploded");
        }
    }
}

#[rigor::fixture]
impl DropBomb {
    #[test_case]
    fn survives(&mut self) {}
}

#[derive(Default)]
struct After;

#[rigor::fixture]
impl After {
    #[test_case]
    fn still_runs(&mut self) {}
}

fn registry() -> Registry {
    Registry::new()
        .module("calc", || Module::builder("calc").register::<Calc>().build())
        .module("flawed", || Module::builder("flawed").register::<Flawed>().build())
        .module("mixed", || {
            Module::builder("mixed").register::<Calc>().register::<Flawed>().build()
        })
        .module("skipped", || Module::builder("skipped").register::<NoDatabase>().build())
        .module("filtered", || {
            Module::builder("filtered")
                .register::<FilteredCalc>()
                .register::<FilteredOther>()
                .build()
        })
        .module("orphan", || Module::builder("orphan").register::<Orphan>().build())
        .module("empty", || {
            Module::builder("empty").register::<Empty>().register::<Helper>().build()
        })
        .module("layered", || Module::builder("layered").register::<Derived>().build())
        .module("volatile", || {
            Module::builder("volatile").register::<DropBomb>().register::<After>().build()
        })
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn passing_and_expected_error_cases_both_succeed() {
    let (report, recorder) = run(&registry(), &["calc"]);
    let summary = report.summary("calc").unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(names(summary, Bucket::Passed), vec!["Calc.add_ok", "Calc.div_zero"]);
    assert!(!summary.has_problems());
    assert_eq!(
        recorder.kinds_of("Calc.div_zero"),
        vec![OutcomeKind::Started, OutcomeKind::Success]
    );
    assert!(!report.has_problems());
}

#[test]
fn assertion_failures_keep_their_message_verbatim() {
    let (report, recorder) = run(&registry(), &["flawed"]);
    let summary = report.summary("flawed").unwrap();

    assert_eq!(names(summary, Bucket::Failed), vec!["Flawed.always_false"]);
    let cause = summary.failed[0].cause.as_ref().unwrap();
    assert_eq!(cause.kind, "AssertionError");
    assert_eq!(cause.message, "expected true but was false");

    assert_eq!(names(summary, Bucket::Errored), vec!["Flawed.lookup"]);
    let cause = summary.errored[0].cause.as_ref().unwrap();
    assert_eq!(cause.kind, "KeyError");
    assert_eq!(cause.message, "'missing' not in table");
    assert_eq!(cause.trail.len(), 1);

    assert_eq!(
        recorder.kinds_of("Flawed.always_false"),
        vec![OutcomeKind::Started, OutcomeKind::FailedAssertion]
    );
    assert!(report.has_problems());
}

#[test]
fn failed_one_time_setup_skips_every_case() {
    let (report, recorder) = run(&registry(), &["skipped"]);
    let summary = report.summary("skipped").unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(
        names(summary, Bucket::NotRun),
        vec!["NoDatabase.first", "NoDatabase.second", "NoDatabase.third"]
    );
    assert!(
        summary
            .not_run
            .iter()
            .all(|e| e.outcome == OutcomeKind::SkippedFixtureSetupFailed)
    );
    assert_eq!(SKIPPED_BODIES.load(Ordering::SeqCst), 0);
    assert_eq!(SKIPPED_TEARDOWNS.load(Ordering::SeqCst), 0);

    let setup = recorder
        .events
        .iter()
        .find(|e| e.subject().role() == Some(Role::OneTimeSetUp) && e.kind().is_terminal())
        .unwrap();
    assert_eq!(setup.kind(), OutcomeKind::FailedExecution);
    assert_eq!(setup.cause().unwrap().message(), "connection refused");
}

#[test]
fn type_and_case_filter_narrow_the_run() {
    let (report, recorder) = run(&registry(), &["filtered", "+FilteredCalc.div_zero"]);
    let summary = report.summary("filtered").unwrap();

    assert_eq!(names(summary, Bucket::Passed), vec!["FilteredCalc.div_zero"]);
    assert_eq!(summary.total, 1);
    assert_eq!(FILTERED_CALC_RUNS.load(Ordering::SeqCst), 1);
    assert_eq!(FILTERED_OTHER_BUILDS.load(Ordering::SeqCst), 0);
    assert!(recorder.kinds_of("FilteredCalc.add_ok").is_empty());
}

#[test]
fn missing_constructor_is_reported_once_for_the_type() {
    let (report, recorder) = run(&registry(), &["orphan"]);
    let summary = report.summary("orphan").unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(names(summary, Bucket::NotRun), vec!["Orphan"]);
    assert_eq!(summary.not_run[0].outcome, OutcomeKind::FailedNoConstructor);
    assert_eq!(recorder.kinds_of("Orphan"), vec![OutcomeKind::FailedNoConstructor]);
    assert_eq!(ORPHAN_RUNS.load(Ordering::SeqCst), 0);
}

#[test]
fn cases_declared_on_a_base_run_on_the_derived_instance() {
    let (report, recorder) = run(&registry(), &["layered"]);
    let summary = report.summary("layered").unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(
        names(summary, Bucket::Passed),
        vec!["Derived.own_case", "BaseSuite.inherited_case"]
    );
    assert_eq!(
        recorder.kinds_of("BaseSuite.inherited_case"),
        vec![OutcomeKind::Started, OutcomeKind::Success]
    );
}

#[test]
fn empty_type_pattern_matches_every_type() {
    let (report, _) = run(&registry(), &["layered", "+.inherited"]);
    let summary = report.summary("layered").unwrap();

    assert_eq!(names(summary, Bucket::Passed), vec!["BaseSuite.inherited_case"]);
}

#[test]
fn panicking_drop_does_not_abort_the_module() {
    let (report, recorder) = run(&registry(), &["volatile"]);
    let summary = report.summary("volatile").unwrap();

    assert_eq!(names(summary, Bucket::Passed), vec!["DropBomb.survives", "After.still_runs"]);
    let dropped: Vec<_> = recorder
        .events
        .iter()
        .filter(|e| e.subject().name() == "DropBomb.drop")
        .collect();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].kind(), OutcomeKind::FailedExecution);
    assert_eq!(dropped[0].subject().role(), Some(Role::TearDown));
    assert_eq!(dropped[0].cause().unwrap().message(), "drop exploded");
}

// ============================================================================
// Module processing
// ============================================================================

#[test]
fn summaries_are_per_module() {
    let (report, _) = run(&registry(), &["calc", "flawed"]);

    assert_eq!(report.modules.len(), 2);
    assert_eq!(report.summary("calc").unwrap().total, 2);
    let flawed = report.summary("flawed").unwrap();
    assert_eq!(flawed.total, 2);
    assert!(flawed.passed.is_empty());
}

#[test]
fn unknown_module_does_not_stop_the_run() {
    let (report, recorder) = run(&registry(), &["nope", "calc"]);

    assert_eq!(recorder.load_errors, vec!["nope"]);
    assert!(matches!(report.modules[0].outcome, ModuleOutcome::LoadFailed(_)));
    assert_eq!(report.summary("calc").unwrap().total, 2);
    assert!(report.has_problems());
}

#[test]
fn types_without_cases_are_dropped_unless_strict() {
    let (report, recorder) = run(&registry(), &["empty"]);
    assert_eq!(report.summary("empty").unwrap().total, 0);
    assert!(recorder.events.is_empty());

    let (report, _) = run_with(
        &registry(),
        &["empty"],
        RunConfig::new().with_strict_definitions(true),
    );
    let summary = report.summary("empty").unwrap();
    assert_eq!(names(summary, Bucket::NotRun), vec!["Empty"]);
    assert_eq!(summary.not_run[0].outcome, OutcomeKind::FailedNoTestCase);
    assert_eq!(Empty.helper(), 7);
}

#[test]
fn strict_mode_ignores_types_emptied_by_a_case_filter() {
    let (report, _) = run_with(
        &registry(),
        &["calc", "+Calc.nothing_matches"],
        RunConfig::new().with_strict_definitions(true),
    );
    assert_eq!(report.summary("calc").unwrap().total, 0);
}

#[test]
fn breadcrumbs_are_dropped_from_long_error_lists() {
    let (report, _) = run_with(&registry(), &["flawed"], RunConfig::new().with_detail_threshold(0));
    let cause = report.summary("flawed").unwrap().errored[0].cause.as_ref().unwrap();
    assert!(cause.trail.is_empty());
}

#[test]
fn console_report_for_a_mixed_module() {
    let targets = parse_targets(&["mixed", "+Calc|Flawed.add_ok|always_false"]).unwrap();
    let mut reporter = ConsoleReporter::new(Vec::new(), false, false);
    run_targets(&registry(), &targets, RunConfig::new(), &mut reporter);
    let out = String::from_utf8(reporter.into_inner()).unwrap();

    assert_eq!(
        out,
        "== mixed ==\n\
         Running Calc (1 test cases)\n\
         Running Flawed (1 test cases)\n\
         FAILED Flawed.always_false\n    expected true but was false\n\
         Total:2 Passed:1 Failed:1\n\
         Passed (1/2)\n  Calc.add_ok\n\
         Failed (1/2)\n  Flawed.always_false\n    *** expected true but was false\n\
         \n"
    );
}
