// confronto mapping: show / validate the code-mapping resource

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use clap::Subcommand;

use confronto_io::export::write_table;
use confronto_recon::{Mapping, MappingLoad, MappingStatus};

use crate::inputs::Context;
use crate::CliError;

#[derive(Subcommand)]
pub enum MappingCommands {
    /// Print where the mapping was found and its entries
    Show {
        /// Mapping file (skips the search path)
        #[arg(long, value_name = "JSON")]
        mapping: Option<PathBuf>,

        /// Entries as JSON instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Check that the mapping loads and report ambiguous ledger codes
    #[command(after_help = "Exit codes: 0 loaded, 6 missing, malformed or empty")]
    Validate {
        #[arg(long, value_name = "JSON")]
        mapping: Option<PathBuf>,
    },
}

pub fn cmd_mapping(command: MappingCommands) -> Result<(), CliError> {
    let ctx = Context::load();
    match command {
        MappingCommands::Show { mapping, json } => {
            let load = ctx.mapping(mapping.as_deref());
            eprintln!("{}", describe_status(&load.status));
            if json {
                let text = serde_json::to_string_pretty(load.mapping.entries())
                    .map_err(|e| CliError::io(format!("cannot serialize mapping: {e}")))?;
                println!("{text}");
            } else {
                write_table(
                    std::io::stdout().lock(),
                    &["category", "event_code", "ledger_code", "flow_type"],
                    load.mapping.entries().iter().map(|e| {
                        vec![
                            e.category.clone(),
                            e.event_code.clone(),
                            e.ledger_code.clone(),
                            e.flow_type.to_string(),
                        ]
                    }),
                )?;
            }
            ensure_usable(&load)
        }
        MappingCommands::Validate { mapping } => {
            let load = ctx.mapping(mapping.as_deref());
            ensure_usable(&load)?;

            let m = &load.mapping;
            println!("{}", describe_status(&load.status));
            println!("categories: {}", m.categories().join(", "));
            println!("event links: {}", m.event_to_ledger().len());
            for (code, cats) in shared_ledger_codes(m) {
                let cats: Vec<String> = cats.into_iter().collect();
                println!("warning: ledger code {code} mapped in {}; last one wins", cats.join(", "));
            }
            Ok(())
        }
    }
}

fn describe_status(status: &MappingStatus) -> String {
    match status {
        MappingStatus::Loaded { source, entries } => format!("mapping: {source} ({entries} entries)"),
        MappingStatus::Missing { searched } => format!("mapping: not found (searched {})", searched.join(", ")),
        MappingStatus::Malformed { source, reason } => format!("mapping: {source} is malformed: {reason}"),
    }
}

fn ensure_usable(load: &MappingLoad) -> Result<(), CliError> {
    match &load.status {
        MappingStatus::Loaded { source, .. } if load.mapping.is_empty() => {
            Err(CliError::mapping(format!("mapping {source} has no entries")))
        }
        MappingStatus::Loaded { .. } => Ok(()),
        MappingStatus::Missing { .. } => Err(CliError::mapping("code mapping not found")
            .with_hint("pass --mapping, set CONFRONTO_MAPPING, or set mapping.path in settings.json")),
        MappingStatus::Malformed { source, reason } => {
            Err(CliError::mapping(format!("mapping {source} is malformed: {reason}")))
        }
    }
}

/// Ledger codes listed under more than one category.
pub fn shared_ledger_codes(mapping: &Mapping) -> BTreeMap<String, BTreeSet<String>> {
    let mut by_code: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for e in mapping.entries() {
        if !e.ledger_code.is_empty() {
            by_code.entry(e.ledger_code.clone()).or_default().insert(e.category.clone());
        }
    }
    by_code.retain(|_, cats| cats.len() > 1);
    by_code
}
