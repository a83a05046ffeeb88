//! Where the mapping resource and the run configuration are looked up.

use std::path::{Path, PathBuf};

use crate::settings::Settings;

pub const MAPPING_FILE_NAME: &str = "mapeamento_dp.json";
pub const MAPPING_ENV: &str = "CONFRONTO_MAPPING";
pub const RECON_CONFIG_FILE_NAME: &str = "recon.toml";

/// Locations consulted besides explicit flags and settings.
#[derive(Debug, Clone, Default)]
pub struct SearchRoots {
    pub env_mapping: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
    pub exe_dir: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
}

impl SearchRoots {
    pub fn from_environment() -> Self {
        Self {
            env_mapping: std::env::var_os(MAPPING_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            cwd: std::env::current_dir().ok(),
            exe_dir: std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(Path::to_path_buf)),
            config_dir: crate::app_config_dir(),
        }
    }
}

/// Mapping candidates in priority order. An explicit path is the only
/// candidate; otherwise: `$CONFRONTO_MAPPING`, the settings entry, the
/// working directory, the executable's directory, the config directory.
pub fn mapping_candidates(explicit: Option<&Path>, settings: &Settings, roots: &SearchRoots) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.to_path_buf()];
    }

    let mut out: Vec<PathBuf> = Vec::new();
    let mut push = |p: PathBuf| {
        if !out.contains(&p) {
            out.push(p);
        }
    };

    if let Some(p) = &roots.env_mapping {
        push(p.clone());
    }
    if let Some(p) = &settings.mapping_path {
        push(p.clone());
    }
    for dir in [&roots.cwd, &roots.exe_dir, &roots.config_dir].into_iter().flatten() {
        push(dir.join(MAPPING_FILE_NAME));
    }
    out
}

/// Run configuration to load, if any: the explicit path, the settings entry,
/// or `recon.toml` in the config directory when it exists. `None` means
/// built-in defaults.
pub fn recon_config_path(explicit: Option<&Path>, settings: &Settings, roots: &SearchRoots) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = &settings.recon_config_path {
        return Some(path.clone());
    }
    roots
        .config_dir
        .as_ref()
        .map(|d| d.join(RECON_CONFIG_FILE_NAME))
        .filter(|p| p.is_file())
}
