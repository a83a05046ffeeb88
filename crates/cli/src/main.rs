// confronto - payroll summary vs. accounting ledger reconciliation

mod config;
mod exit_codes;
mod inputs;
mod logging;
mod mapping;
mod parse;
mod run;

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use confronto_io::IoError;
use confronto_recon::config::SignMode;

use exit_codes::{
    EXIT_EMPTY_INPUT, EXIT_INVALID_CONFIG, EXIT_IO, EXIT_MAPPING, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "confronto")]
#[command(about = "Reconcile a payroll summary PDF against an accounting ledger export")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only errors on stderr; no human summary
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a payroll summary against a ledger export
    #[command(after_help = "\
Examples:
  confronto run --summary resumo.pdf --ledger lote.txt
  confronto run --summary resumo.pdf --ledger lote.txt --general geral.pdf --json
  confronto run --tokens resumo.html --ledger lote.txt --mapping mapeamento_dp.json --csv-dir out/

Exit codes:
  0 every view matched, 1 divergences or unmapped postings, 3 IO error,
  4 parse error, 5 invalid recon.toml, 6 mapping missing/malformed,
  7 nothing extracted")]
    Run(run::RunArgs),

    /// Extract one input and print its rows
    Parse {
        #[command(subcommand)]
        command: parse::ParseCommands,
    },

    /// Inspect the code-mapping resource
    Mapping {
        #[command(subcommand)]
        command: mapping::MappingCommands,
    },

    /// Inspect a recon.toml run configuration
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

/// `--sign-mode` values.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SignModeArg {
    /// `+`/`-` prefix in the code column, `+` when absent
    Explicit,
    /// Flow type of the event's mapping entry
    FromMapping,
}

impl From<SignModeArg> for SignMode {
    fn from(arg: SignModeArg) -> Self {
        match arg {
            SignModeArg::Explicit => SignMode::Explicit,
            SignModeArg::FromMapping => SignMode::FromMapping,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\ncommit: ",
        env!("GIT_COMMIT_HASH"),
        "\ntarget: ",
        env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _logger = logging::init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run(args) => run::cmd_run(args, cli.quiet),
        Commands::Parse { command } => parse::cmd_parse(command, cli.quiet),
        Commands::Mapping { command } => mapping::cmd_mapping(command),
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
        Self::new(EXIT_IO, msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(EXIT_PARSE, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_INVALID_CONFIG, msg)
    }

    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::new(EXIT_MAPPING, msg)
    }

    pub fn empty(msg: impl Into<String>) -> Self {
        Self::new(EXIT_EMPTY_INPUT, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::ToolMissing { .. } => CliError::io(err.to_string())
                .with_hint("install poppler-utils, set tools.pdftotext in settings.json, or pass --tokens"),
            IoError::Xml(_) => CliError::parse(err.to_string()),
            _ => CliError::io(err.to_string()),
        }
    }
}
