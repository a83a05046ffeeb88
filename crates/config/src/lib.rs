// Configuration loading

pub mod resources;
pub mod settings;

/// Directory name under the platform config directory.
pub const APP_DIR: &str = "confronto";

/// Platform config directory for this tool (`~/.config/confronto` on Linux).
pub fn app_config_dir() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR))
}
