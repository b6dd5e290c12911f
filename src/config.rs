//! Run configuration for rigor
//!
//! Populated from CLI flags; library callers build it with the `with_*` methods.

use std::io::IsTerminal;

use clap::ValueEnum;

/// When to colour console output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Colour when stdout is a terminal and `NO_COLOR` is unset
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Decide for stdout.
    pub fn enabled(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal(),
        }
    }
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Progress lines and a summary per module
    #[default]
    Human,
    /// One JSON object per line
    Json,
}

/// Run configuration
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// ANSI styling of console output
    pub color: ColorChoice,
    /// Also stream `Started` and `Success` lines
    pub verbose: bool,
    /// Largest errored bucket that still shows breadcrumbs
    pub detail_threshold: usize,
    /// Report test classes that declare no test case at all
    pub strict_definitions: bool,
    pub format: OutputFormat,
    /// Exit non-zero when anything failed, errored or did not run
    pub fail_on_problems: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            color: ColorChoice::Auto,
            verbose: false,
            detail_threshold: 2,
            strict_definitions: false,
            format: OutputFormat::Human,
            fail_on_problems: true,
        }
    }
}

impl RunConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_detail_threshold(mut self, threshold: usize) -> Self {
        self.detail_threshold = threshold;
        self
    }

    pub fn with_strict_definitions(mut self, strict: bool) -> Self {
        self.strict_definitions = strict;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_fail_on_problems(mut self, fail: bool) -> Self {
        self.fail_on_problems = fail;
        self
    }
}
