//! CLI module for rigor
//!
//! A test binary calls [`run`] with its module registry; everything else (argument parsing, logging, reporting,
//! exit codes) happens here.
//!
//! ## Usage
//!
//! ```text
//! rigor [OPTIONS] <MODULE [+FILTER]>...
//! rigor calc                      # every fixture of `calc`
//! rigor calc +Calc                # fixtures whose name matches `Calc`
//! rigor calc +Calc.div_zero       # ... and only cases matching `div_zero`
//! ```
//!
//! ## Exit codes
//!
//! - `0`: every module loaded and nothing failed, errored or was left unrun (or `--no-fail-exit`)
//! - `1`: some module failed to load, or some case did not pass
//! - `2`: usage error, such as an invalid filter
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::io::{self, Write};
use std::process;

use clap::Parser;

use crate::config::{ColorChoice, OutputFormat, RunConfig};
use crate::driver::{self, FilterError};
use crate::loader::ModuleLoader;
use crate::report::{ConsoleReporter, JsonReporter, Reporter};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    pub const USAGE: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a usage error (exit code 2).
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::USAGE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<FilterError> for CliError {
    fn from(error: FilterError) -> Self {
        // Render through miette so the diagnostic code and help text reach the user.
        Self::usage(format!("{:?}", miette::Report::new(error)))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Run fixture-based test modules
#[derive(Parser, Debug)]
#[command(name = "rigor")]
#[command(version = VERSION)]
#[command(about = "Run fixture-based test modules", long_about = None)]
pub struct Cli {
    /// Modules to run, each optionally followed by `+Type` or `+Type.Case`
    #[arg(value_name = "MODULE [+FILTER]")]
    pub targets: Vec<String>,

    /// Stream every event and raise the default log level to debug
    #[arg(short, long)]
    pub verbose: bool,

    /// When to colour console output
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Largest error list that still shows breadcrumbs
    #[arg(long, value_name = "N", default_value_t = 2)]
    pub detail_threshold: usize,

    /// Report test classes that declare no test case
    #[arg(long)]
    pub strict: bool,

    /// Exit 0 after a completed run even if tests failed
    #[arg(long)]
    pub no_fail_exit: bool,

    /// List the registered modules and exit
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    pub fn config(&self) -> RunConfig {
        RunConfig::new()
            .with_color(self.color)
            .with_verbose(self.verbose)
            .with_detail_threshold(self.detail_threshold)
            .with_strict_definitions(self.strict)
            .with_format(self.format)
            .with_fail_on_problems(!self.no_fail_exit)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Install the `tracing` subscriber: `RUST_LOG` wins, otherwise `warn` (`debug` with `-v`).
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .try_init();
}

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run(loader: &dyn ModuleLoader) {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match execute(cli, loader, &mut out) {
        Ok(exit_code) => {
            let _ = out.flush();
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            let _ = out.flush();
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute a parsed command line against `loader`, writing the report to `out`.
pub fn execute(cli: Cli, loader: &dyn ModuleLoader, out: &mut dyn Write) -> CliResult<ExitCode> {
    if cli.list {
        for name in loader.names() {
            writeln!(out, "{name}").map_err(|e| CliError::new(format!("Error writing output: {e}"), ExitCode::FAILURE))?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    if cli.targets.is_empty() {
        let mut message = String::from("Error: no module given\n\nUsage: rigor [OPTIONS] <MODULE [+FILTER]>...");
        let names = loader.names();
        if !names.is_empty() {
            message.push_str(&format!("\n\nRegistered modules: {}", names.join(", ")));
        }
        return Err(CliError::usage(message));
    }

    let targets = driver::parse_targets(&cli.targets)?;
    let config = cli.config();
    tracing::debug!(targets = targets.len(), ?config, "starting run");

    let report = match config.format {
        OutputFormat::Human => {
            let mut reporter = ConsoleReporter::new(out, config.color.enabled(), config.verbose);
            driver::run_targets(loader, &targets, config.clone(), &mut reporter as &mut dyn Reporter)
        }
        OutputFormat::Json => {
            let mut reporter = JsonReporter::new(out, config.verbose);
            driver::run_targets(loader, &targets, config.clone(), &mut reporter as &mut dyn Reporter)
        }
    };

    if config.fail_on_problems && report.has_problems() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

// ============================================================================
// Tests
// ============================================================================
