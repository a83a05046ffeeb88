// User settings (settings.json)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Per-user defaults. Every field is optional; command-line flags win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mapping resource used when `--mapping` is not given.
    #[serde(rename = "mapping.path", skip_serializing_if = "Option::is_none")]
    pub mapping_path: Option<PathBuf>,

    /// `recon.toml` used when `--config` is not given.
    #[serde(rename = "recon.configPath", skip_serializing_if = "Option::is_none")]
    pub recon_config_path: Option<PathBuf>,

    /// `pdftotext` executable, when it is not on PATH.
    #[serde(rename = "tools.pdftotext", skip_serializing_if = "Option::is_none")]
    pub pdftotext_path: Option<PathBuf>,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        crate::app_config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                log::warn!("error parsing {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(e) => {
                log::warn!("error reading {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    #[cfg(test)]
    fn save_to(&self, path: &Path) -> Result<(), String> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_commented_json() {
        let settings = Settings::parse(
            r#"{
    // Mapping table
    "mapping.path": "/srv/dp/mapeamento_dp.json",
    "tools.pdftotext": "/opt/poppler/bin/pdftotext"
}"#,
        )
        .unwrap();
        assert_eq!(settings.mapping_path, Some(PathBuf::from("/srv/dp/mapeamento_dp.json")));
        assert_eq!(settings.recon_config_path, None);
        assert_eq!(settings.pdftotext_path, Some(PathBuf::from("/opt/poppler/bin/pdftotext")));
    }

    #[test]
    fn missing_or_broken_file_gives_defaults() {
        let dir = tempdir().unwrap();
        assert_eq!(Settings::load_from(&dir.path().join("none.json")), Settings::default());

        let broken = dir.path().join("settings.json");
        fs::write(&broken, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&broken), Settings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            recon_config_path: Some(PathBuf::from("recon.toml")),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }
}
