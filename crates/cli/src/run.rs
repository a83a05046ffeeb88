// confronto run: extraction, reconciliation and reporting in one pass

use std::path::PathBuf;

use clap::Args;
use rust_decimal::Decimal;

use confronto_io::export::{write_json, write_view_csvs};
use confronto_recon::general::{document_text, extract_declared_taxes};
use confronto_recon::model::ViewCounts;
use confronto_recon::money::format_brl;
use confronto_recon::{MappingStatus, MatchStatus, ReconError, ReconInput, ReconResult};

use crate::exit_codes::EXIT_DIVERGENT;
use crate::inputs::{extract_events, read_ledger, Context};
use crate::{CliError, SignModeArg};

#[derive(Args)]
pub struct RunArgs {
    /// Payroll summary PDF
    #[arg(long, value_name = "PDF", required_unless_present = "tokens", conflicts_with = "tokens")]
    pub summary: Option<PathBuf>,

    /// Summary already converted with `pdftotext -bbox`
    #[arg(long, value_name = "HTML")]
    pub tokens: Option<PathBuf>,

    /// Ledger export (delimited text)
    #[arg(long, value_name = "FILE")]
    pub ledger: PathBuf,

    /// Code-mapping resource (skips the search path)
    #[arg(long, value_name = "JSON")]
    pub mapping: Option<PathBuf>,

    /// Run configuration (recon.toml)
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// General summary with declared tax totals
    #[arg(long, value_name = "PDF")]
    pub general: Option<PathBuf>,

    /// Category for lines before the first category title
    #[arg(long)]
    pub category: Option<String>,

    /// Override summary.sign_mode from the configuration
    #[arg(long, value_enum)]
    pub sign_mode: Option<SignModeArg>,

    /// Print the full result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Write the full result as JSON to a file
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write one CSV per view into this directory
    #[arg(long, value_name = "DIR")]
    pub csv_dir: Option<PathBuf>,
}

pub fn cmd_run(args: RunArgs, quiet: bool) -> Result<(), CliError> {
    let ctx = Context::load();
    let config = ctx.recon_config(args.config.as_deref())?;
    let mapping = ctx.mapping(args.mapping.as_deref());

    let source = match (&args.summary, &args.tokens) {
        (Some(p), _) | (None, Some(p)) => p.clone(),
        (None, None) => return Err(CliError::args("one of --summary or --tokens is required")),
    };

    let pages = ctx.pages(&source)?;
    let summary = extract_events(
        &pages,
        &source,
        &config,
        args.sign_mode.map(Into::into),
        &mapping.mapping,
        args.category.as_deref(),
    );
    if summary.is_empty() {
        return Err(CliError::empty(format!("no payroll events found in {}", source.display()))
            .with_hint("check that the document is a payroll summary with the code/event/amount header"));
    }

    let ledger = read_ledger(&args.ledger, &config)?;
    if ledger.is_empty() {
        return Err(CliError::empty(format!("no postings found in {}", args.ledger.display()))
            .with_hint("check ledger.delimiter and the field positions in recon.toml"));
    }

    let declared = match &args.general {
        Some(path) => {
            let pages = ctx.pages(path)?;
            let declaration = extract_declared_taxes(&document_text(&pages, config.summary.line_tolerance));
            if declaration.is_empty() {
                log::warn!("no declared tax totals found in {}", path.display());
            }
            Some(declaration)
        }
        None => None,
    };

    let input = ReconInput { summary, ledger, declared };
    let result = confronto_recon::run(&config, &input, &mapping).map_err(|e| match e {
        ReconError::ConfigValidation(_) | ReconError::ConfigParse(_) => CliError::config(e.to_string()),
        _ => CliError::parse(e.to_string()),
    })?;

    if args.json {
        let text = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::io(format!("cannot serialize result: {e}")))?;
        println!("{text}");
    }
    if let Some(path) = &args.output {
        write_json(&result, path)?;
        log::info!("wrote {}", path.display());
    }
    if let Some(dir) = &args.csv_dir {
        let written = write_view_csvs(&result, dir)?;
        log::info!("wrote {} files to {}", written.len(), dir.display());
    }

    if !quiet {
        print_human_summary(&result);
    }

    match &result.meta.mapping {
        MappingStatus::Loaded { .. } => {}
        MappingStatus::Missing { searched } => {
            return Err(CliError::mapping("code mapping not found").with_hint(format!(
                "searched: {}; pass --mapping or set CONFRONTO_MAPPING",
                searched.join(", ")
            )));
        }
        MappingStatus::Malformed { source, reason } => {
            return Err(CliError::mapping(format!("code mapping {source} is malformed: {reason}")));
        }
    }

    if !result.summary.all_matched {
        return Err(CliError::new(EXIT_DIVERGENT, "divergences found"));
    }
    Ok(())
}

fn counts_line(label: &str, counts: &ViewCounts) -> String {
    format!(
        "  {:<16} {:>4} rows  {:>4} match  {:>4} divergent",
        label, counts.rows, counts.matched, counts.divergent
    )
}

/// Human-readable digest on stderr so stdout stays machine-readable.
fn print_human_summary(result: &ReconResult) {
    let s = &result.summary;
    eprintln!(
        "{} summary events, {} ledger postings (tolerance {})",
        s.summary_events,
        s.ledger_postings,
        format_brl(result.meta.tolerance)
    );
    eprintln!("{}", counts_line("by category", &s.by_category));
    eprintln!("{}", counts_line("by event", &s.by_event));
    eprintln!("{}", counts_line("by ledger code", &s.by_ledger_code));
    eprintln!("{}", counts_line("taxes", &s.taxes));
    eprintln!("{}", counts_line("composition", &s.composition));
    if let Some(declared) = &s.declared_taxes {
        eprintln!("{}", counts_line("declared taxes", declared));
    }

    for row in result.by_category.iter().filter(|r| r.comparison.status != MatchStatus::Match) {
        eprintln!(
            "  ! {}: summary {} ledger {} difference {}",
            row.category,
            format_brl(row.comparison.summary_value),
            format_brl(row.comparison.ledger_value),
            format_brl(row.comparison.difference)
        );
    }
    if s.unmapped_postings > 0 {
        let total: Decimal = result.unmapped.iter().map(|u| u.amount).sum();
        eprintln!("  ! {} unmapped postings totalling {}", s.unmapped_postings, format_brl(total));
    }
    if s.unlinked_events > 0 {
        eprintln!("  {} summary events without a ledger code", s.unlinked_events);
    }
    eprintln!("{}", if s.all_matched { "all views match" } else { "divergences found" });
}
