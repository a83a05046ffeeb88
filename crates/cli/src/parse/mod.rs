// confronto parse: run one extractor and print its rows

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

use confronto_io::export::{write_ledger_rows, write_summary_rows};
use confronto_io::IoError;

use crate::inputs::{extract_events, read_ledger, Context};
use crate::{CliError, SignModeArg};

#[derive(Subcommand)]
pub enum ParseCommands {
    /// Event rows of a payroll summary (PDF or `pdftotext -bbox` dump)
    Summary {
        /// Summary PDF, or an .html/.xml bbox dump
        #[arg(long)]
        file: PathBuf,

        /// Code-mapping resource, needed for --sign-mode from-mapping
        #[arg(long, value_name = "JSON")]
        mapping: Option<PathBuf>,

        /// Run configuration (recon.toml)
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,

        /// Category for lines before the first category title
        #[arg(long)]
        category: Option<String>,

        #[arg(long, value_enum)]
        sign_mode: Option<SignModeArg>,

        /// Write rows here instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// JSON array instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Posting rows of a ledger export
    Ledger {
        #[arg(long)]
        file: PathBuf,

        /// Run configuration (recon.toml)
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,

        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
}

pub fn cmd_parse(command: ParseCommands, quiet: bool) -> Result<(), CliError> {
    let ctx = Context::load();
    match command {
        ParseCommands::Summary { file, mapping, config, category, sign_mode, out, json } => {
            let config = ctx.recon_config(config.as_deref())?;
            let mapping = ctx.mapping(mapping.as_deref());
            let pages = ctx.pages(&file)?;
            let rows = extract_events(
                &pages,
                &file,
                &config,
                sign_mode.map(Into::into),
                &mapping.mapping,
                category.as_deref(),
            );
            if rows.is_empty() {
                return Err(CliError::empty(format!("no payroll events found in {}", file.display())));
            }
            emit(out.as_deref(), json, &rows, write_summary_rows::<Box<dyn Write>>)?;
            if !quiet {
                eprintln!("{} events from {} pages", rows.len(), pages.len());
            }
        }
        ParseCommands::Ledger { file, config, out, json } => {
            let config = ctx.recon_config(config.as_deref())?;
            let rows = read_ledger(&file, &config)?;
            if rows.is_empty() {
                return Err(CliError::empty(format!("no postings found in {}", file.display())));
            }
            emit(out.as_deref(), json, &rows, write_ledger_rows::<Box<dyn Write>>)?;
            if !quiet {
                eprintln!("{} postings", rows.len());
            }
        }
    }
    Ok(())
}

fn emit<T, F>(out: Option<&Path>, json: bool, rows: &[T], write_csv: F) -> Result<(), CliError>
where
    T: Serialize,
    F: Fn(Box<dyn Write>, &[T]) -> Result<(), IoError>,
{
    let sink: Box<dyn Write> = match out {
        Some(path) => Box::new(
            File::create(path).map_err(|e| CliError::io(format!("cannot create {}: {e}", path.display())))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };

    if json {
        let mut sink = sink;
        serde_json::to_writer_pretty(&mut sink, rows)
            .map_err(|e| CliError::io(format!("cannot write JSON: {e}")))?;
        writeln!(sink).map_err(|e| CliError::io(e.to_string()))?;
        Ok(())
    } else {
        Ok(write_csv(sink, rows)?)
    }
}
