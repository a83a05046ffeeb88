// confronto config: validate / show recon.toml

use std::path::PathBuf;

use clap::Subcommand;

use confronto_config::settings::Settings;

use crate::inputs::{load_recon_config, Context};
use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Parse and validate a recon.toml
    #[command(after_help = "Exit codes: 0 valid, 3 unreadable, 5 invalid")]
    Validate {
        file: PathBuf,
    },

    /// Print the effective configuration with every default filled in
    Show {
        /// recon.toml to load (default: settings, then the config directory)
        file: Option<PathBuf>,
    },
}

pub fn cmd_config(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Validate { file } => {
            let config = load_recon_config(&file)?;
            println!(
                "{}: ok (tolerance {}, sign_mode {})",
                file.display(),
                config.tolerance,
                config.summary.sign_mode
            );
            Ok(())
        }
        ConfigCommands::Show { file } => {
            let ctx = Context::load();
            let config = ctx.recon_config(file.as_deref())?;
            let text = toml::to_string_pretty(&config)
                .map_err(|e| CliError::io(format!("cannot render configuration: {e}")))?;
            eprintln!("# settings: {}", Settings::config_path_display());
            print!("{text}");
            Ok(())
        }
    }
}
