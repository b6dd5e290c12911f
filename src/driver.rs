//! Run orchestration: targets, filters and per-module processing.
//!
//! A run is a list of [`Target`]s, each a module name with an optional `+Type[.Case]` filter. [`RunState`] carries
//! everything that lives for the whole run (reporter, config, collected module reports); the collector is reset
//! before every module, so summaries are per module and never merged.

use miette::Diagnostic;
use regex::Regex;
use thiserror::Error;

use crate::collector::{Collector, Summary};
use crate::config::RunConfig;
use crate::fixture::{Fixture, ScanError};
use crate::loader::ModuleLoader;
use crate::outcome::{OutcomeEvent, OutcomeKind, OutcomeSink, Subject};
use crate::report::Reporter;

// ============================================================================
// Filters and targets
// ============================================================================

#[derive(Debug, Error, Diagnostic)]
pub enum FilterError {
    #[error("empty pattern in filter `+{filter}`")]
    #[diagnostic(code(rigor::filter::empty), help("write `+Type` or `+Type.Case`"))]
    Empty { filter: String },

    #[error("invalid pattern `{pattern}` in filter `+{filter}`")]
    #[diagnostic(
        code(rigor::filter::regex),
        help("patterns are regular expressions matched anywhere in the name")
    )]
    Regex {
        filter: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("filter `+{filter}` does not follow a module name")]
    #[diagnostic(code(rigor::filter::orphan), help("filters go right after the module they apply to"))]
    Orphan { filter: String },

    #[error("module `{module}` already has a filter; `+{filter}` is one too many")]
    #[diagnostic(code(rigor::filter::repeated))]
    Repeated { module: String, filter: String },
}

/// A `Type[.Case]` filter. Both parts are unanchored regular expressions.
#[derive(Debug, Clone)]
pub struct Filter {
    type_pattern: Regex,
    case_pattern: Option<Regex>,
}

impl Filter {
    /// Parse `Type` or `Type.Case`, splitting at the first `.`.
    ///
    /// An empty type part in front of a case (`.Case`) matches every type. An empty filter or an empty case part
    /// is rejected.
    pub fn parse(text: &str) -> Result<Self, FilterError> {
        let compile = |pattern: &str, allow_empty: bool| {
            if pattern.is_empty() && !allow_empty {
                return Err(FilterError::Empty {
                    filter: text.to_string(),
                });
            }
            Regex::new(pattern).map_err(|source| FilterError::Regex {
                filter: text.to_string(),
                pattern: pattern.to_string(),
                source,
            })
        };
        match text.split_once('.') {
            Some((ty, case)) => Ok(Self {
                type_pattern: compile(ty, true)?,
                case_pattern: Some(compile(case, false)?),
            }),
            None => Ok(Self {
                type_pattern: compile(text, false)?,
                case_pattern: None,
            }),
        }
    }

    pub fn matches_type(&self, name: &str) -> bool {
        self.type_pattern.is_match(name)
    }

    pub fn type_pattern(&self) -> &str {
        self.type_pattern.as_str()
    }

    pub fn case_pattern(&self) -> Option<&Regex> {
        self.case_pattern.as_ref()
    }
}

/// One module to run, with its optional filter.
#[derive(Debug, Clone)]
pub struct Target {
    pub module: String,
    pub filter: Option<Filter>,
}

impl Target {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Parse `MODULE [+FILTER] ...` arguments.
pub fn parse_targets<S: AsRef<str>>(args: &[S]) -> Result<Vec<Target>, FilterError> {
    let mut targets: Vec<Target> = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        let Some(filter) = arg.strip_prefix('+') else {
            targets.push(Target::new(arg));
            continue;
        };
        let Some(target) = targets.last_mut() else {
            return Err(FilterError::Orphan {
                filter: filter.to_string(),
            });
        };
        if target.filter.is_some() {
            return Err(FilterError::Repeated {
                module: target.module.clone(),
                filter: filter.to_string(),
            });
        }
        target.filter = Some(Filter::parse(filter)?);
    }
    Ok(targets)
}

// ============================================================================
// Run state
// ============================================================================

#[derive(Debug, Clone)]
pub enum ModuleOutcome {
    Completed(Summary),
    LoadFailed(String),
}

#[derive(Debug, Clone)]
pub struct ModuleReport {
    pub name: String,
    pub outcome: ModuleOutcome,
}

/// Everything a run produced, one entry per target in order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub modules: Vec<ModuleReport>,
}

impl RunReport {
    /// Whether any module failed to load or reported a failed, errored or not-run case.
    pub fn has_problems(&self) -> bool {
        self.modules.iter().any(|m| match &m.outcome {
            ModuleOutcome::Completed(summary) => summary.has_problems(),
            ModuleOutcome::LoadFailed(_) => true,
        })
    }

    pub fn summary(&self, module: &str) -> Option<&Summary> {
        self.modules.iter().find(|m| m.name == module).and_then(|m| match &m.outcome {
            ModuleOutcome::Completed(summary) => Some(summary),
            ModuleOutcome::LoadFailed(_) => None,
        })
    }
}

/// Forwards every event to the reporter and the collector.
struct Relay<'a> {
    reporter: &'a mut dyn Reporter,
    collector: &'a mut Collector,
}

impl OutcomeSink for Relay<'_> {
    fn record(&mut self, event: OutcomeEvent) {
        self.reporter.on_event(&event);
        self.collector.record(event);
    }
}

/// Per-run state threaded through module processing.
pub struct RunState<'r> {
    collector: Collector,
    reporter: &'r mut dyn Reporter,
    config: RunConfig,
    report: RunReport,
}

impl<'r> RunState<'r> {
    pub fn new(config: RunConfig, reporter: &'r mut dyn Reporter) -> Self {
        Self {
            collector: Collector::new(),
            reporter,
            config,
            report: RunReport::default(),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Load one module, run its fixtures and record its summary.
    ///
    /// A load failure is reported and recorded; it does not stop later modules.
    #[tracing::instrument(skip_all, fields(module = %target.module))]
    pub fn process_module(&mut self, loader: &dyn ModuleLoader, target: &Target) -> &ModuleOutcome {
        self.collector.reset();
        self.reporter.on_module_start(&target.module);

        let outcome = match loader.load(&target.module) {
            Ok(module) => {
                let filter = target.filter.as_ref();
                for idx in module.exported() {
                    let descriptor = module.get(idx);
                    if !descriptor.is_test_class() {
                        tracing::trace!(ty = %descriptor.name(), "not a test class");
                        continue;
                    }
                    if filter.is_some_and(|f| !f.matches_type(descriptor.name())) {
                        tracing::trace!(ty = %descriptor.name(), "filtered out");
                        continue;
                    }

                    let mut relay = Relay {
                        reporter: &mut *self.reporter,
                        collector: &mut self.collector,
                    };
                    match Fixture::scan(&module, idx, filter.and_then(Filter::case_pattern)) {
                        Ok(fixture) => {
                            relay.reporter.on_fixture_start(fixture.type_name(), fixture.test_count());
                            fixture.run(&mut relay);
                        }
                        Err(ScanError::NoConstructor { type_name, cause }) => relay.record(OutcomeEvent::new(
                            OutcomeKind::FailedNoConstructor,
                            Subject::Type { name: type_name },
                            Some(cause),
                        )),
                        Err(ScanError::NoTestCases { type_name, filtered }) => {
                            if self.config.strict_definitions && !filtered {
                                relay.record(OutcomeEvent::new(
                                    OutcomeKind::FailedNoTestCase,
                                    Subject::Type { name: type_name },
                                    None,
                                ));
                            } else {
                                tracing::debug!(ty = %type_name, filtered, "no test cases; fixture dropped");
                            }
                        }
                        Err(ScanError::NotTestClass { .. }) => {}
                    }
                }
                let summary = self.collector.summarize(self.config.detail_threshold);
                self.reporter.on_summary(&target.module, &summary);
                ModuleOutcome::Completed(summary)
            }
            Err(error) => {
                tracing::warn!(%error, "module failed to load");
                self.reporter.on_load_error(&target.module, &error);
                ModuleOutcome::LoadFailed(error.to_string())
            }
        };

        self.report.modules.push(ModuleReport {
            name: target.module.clone(),
            outcome,
        });
        &self.report.modules[self.report.modules.len() - 1].outcome
    }

    /// End the run and hand back the per-module reports.
    pub fn finish(self) -> RunReport {
        self.reporter.on_run_complete(&self.report);
        self.report
    }
}

/// Process every target in order.
pub fn run_targets(
    loader: &dyn ModuleLoader,
    targets: &[Target],
    config: RunConfig,
    reporter: &mut dyn Reporter,
) -> RunReport {
    let mut state = RunState::new(config, reporter);
    for target in targets {
        state.process_module(loader, target);
    }
    state.finish()
}
