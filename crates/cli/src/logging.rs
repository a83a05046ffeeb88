//! stderr logging for the library crates' `log` records.

use flexi_logger::{Logger, LoggerHandle};

/// Overrides the level chosen from `-v`/`-q`; any flexi_logger spec works
/// (`debug`, `warn, confronto_recon::summary=debug`).
pub const LOG_ENV: &str = "CONFRONTO_LOG";

pub fn level_spec(verbose: u8, quiet: bool, env: Option<String>) -> String {
    if let Some(spec) = env.filter(|s| !s.trim().is_empty()) {
        return spec;
    }
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    level.to_string()
}

/// Start the logger. The handle must stay alive for the whole run. A bad
/// spec falls back to running without logs.
pub fn init_logging(verbose: u8, quiet: bool) -> Option<LoggerHandle> {
    let spec = level_spec(verbose, quiet, std::env::var(LOG_ENV).ok());
    let started = Logger::try_with_str(&spec).and_then(|logger| {
        logger
            .log_to_stderr()
            .format(flexi_logger::default_format)
            .start()
    });
    match started {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("warning: logging disabled ({LOG_ENV}={spec}): {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_spec(0, false, None), "warn");
        assert_eq!(level_spec(1, false, None), "info");
        assert_eq!(level_spec(3, false, None), "debug");
        assert_eq!(level_spec(2, true, None), "error");
    }

    #[test]
    fn env_spec_wins() {
        assert_eq!(level_spec(0, true, Some("trace".into())), "trace");
        assert_eq!(level_spec(1, false, Some("  ".into())), "info");
    }
}
