// gradecheck - declared vs transcribed grade reconciliation, from the shell

mod check;
mod config;
mod exit_codes;

use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use check::CheckArgs;
use config::ConfigCommands;
use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "gradecheck")]
#[command(about = "Reconcile a candidate's declared grades against their transcripts")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Debug logging on stderr (overrides RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile one candidature and print the verdict
    #[command(after_help = "\
Input is either a submission JSON document, or two grade CSVs plus the
identity read from the form and documents.

CSV columns: subject, score, term, academic_year (required);
weight, confidence, source_document (optional).

Exit codes:
  0   clean: identity confirmed or unverifiable, no anomaly
  20  grade discrepancies found
  21  identity fraud detected
  22  invalid config
  23  invalid grade records

Examples:
  gradecheck check --submission cand-0117.json
  gradecheck check --submission cand-0117.json --config strict.recon.toml --json
  gradecheck check --manual form.csv --extracted ocr.csv \\
      --form-name 'Dupont,Marie' --document-name 'Dupont,Marie'
  gradecheck check --submission cand-0117.json --export --output cand-0117.export.json")]
    Check(CheckArgs),

    /// Inspect and validate reconciliation configs
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  gradecheck-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check(args) => check::cmd_check(args),
        Commands::Config { command } => config::cmd_config(command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Read a whole input file; an unreadable input is a usage error.
pub fn read_input(path: &Path, what: &str) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| {
        CliError::args(format!("cannot read {what} {}: {e}", path.display()))
            .with_hint("check the path; inputs are read from files, not stdin")
    })
}
