//! Mapping resource loading.

use std::path::PathBuf;

use confronto_recon::MappingLoad;

use crate::csv::read_file_as_utf8;

/// Load the first candidate that exists. An unreadable or malformed file
/// yields an empty mapping with a `Malformed` status; no candidate at all
/// yields `Missing`.
pub fn load_mapping(candidates: &[PathBuf]) -> MappingLoad {
    let Some(path) = candidates.iter().find(|p| p.is_file()) else {
        return MappingLoad::missing(candidates.iter().map(|p| p.display().to_string()).collect());
    };

    let source = path.display().to_string();
    match read_file_as_utf8(path) {
        Ok(text) => {
            let load = MappingLoad::parse(source, &text);
            if load.is_loaded() {
                log::info!("mapping: {} entries from {}", load.mapping.len(), path.display());
            }
            load
        }
        Err(e) => MappingLoad::malformed(source, e.to_string()),
    }
}
