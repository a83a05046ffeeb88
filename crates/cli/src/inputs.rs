//! Input resolution shared by the commands: settings, run configuration,
//! mapping resource, summary documents and ledger exports.

use std::path::Path;

use confronto_config::resources::{self, SearchRoots};
use confronto_config::settings::Settings;
use confronto_io::csv::import_ledger;
use confronto_io::mapping::load_mapping;
use confronto_io::pdftotext::load_pages;
use confronto_recon::config::SignMode;
use confronto_recon::summary::{category_from_file_name, SummaryExtractor};
use confronto_recon::{LedgerPostingRow, Mapping, MappingLoad, ReconConfig, SummaryEventRow, Token};

use crate::CliError;

pub struct Context {
    pub settings: Settings,
    pub roots: SearchRoots,
}

impl Context {
    pub fn load() -> Self {
        Self { settings: Settings::load(), roots: SearchRoots::from_environment() }
    }

    /// `recon.toml` from the flag, settings or config directory; defaults
    /// when none is configured.
    pub fn recon_config(&self, explicit: Option<&Path>) -> Result<ReconConfig, CliError> {
        let Some(path) = resources::recon_config_path(explicit, &self.settings, &self.roots) else {
            log::debug!("no recon.toml configured, using defaults");
            return Ok(ReconConfig::default());
        };
        load_recon_config(&path)
    }

    pub fn mapping(&self, explicit: Option<&Path>) -> MappingLoad {
        load_mapping(&resources::mapping_candidates(explicit, &self.settings, &self.roots))
    }

    /// Summary or general document as pages of positioned words.
    pub fn pages(&self, path: &Path) -> Result<Vec<Vec<Token>>, CliError> {
        if !path.exists() {
            return Err(CliError::io(format!("file not found: {}", path.display())));
        }
        Ok(load_pages(path, self.settings.pdftotext_path.as_deref())?)
    }
}

pub fn load_recon_config(path: &Path) -> Result<ReconConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    ReconConfig::from_toml(&text).map_err(|e| CliError::config(format!("{}: {e}", path.display())))
}

/// Event rows of a summary document. Lines before the first category title
/// fall under `category`, else the category implied by the file name.
pub fn extract_events(
    pages: &[Vec<Token>],
    source: &Path,
    config: &ReconConfig,
    sign_mode: Option<SignMode>,
    mapping: &Mapping,
    category: Option<&str>,
) -> Vec<SummaryEventRow> {
    let mut options = config.summary.clone();
    if let Some(mode) = sign_mode {
        options.sign_mode = mode;
    }

    let default_category = category.map(str::to_string).or_else(|| {
        source
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(category_from_file_name)
    });

    let mut extractor = SummaryExtractor::new(&options, Some(mapping));
    if let Some(cat) = default_category {
        extractor = extractor.with_default_category(&cat);
    }
    for page in pages {
        extractor.feed_page(page);
    }
    extractor.finish()
}

pub fn read_ledger(path: &Path, config: &ReconConfig) -> Result<Vec<LedgerPostingRow>, CliError> {
    Ok(import_ledger(path, &config.ledger)?)
}
