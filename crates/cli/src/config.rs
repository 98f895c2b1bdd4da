//! `gradecheck config`: validate and display reconciliation configs.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use gradecheck_recon::ReconConfig;

use crate::exit_codes::{EXIT_CHECK_INVALID_CONFIG, EXIT_ERROR};
use crate::{read_input, CliError};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Parse and validate a config file without running anything
    #[command(after_help = "\
Examples:
  gradecheck config validate strict.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// Print the effective config (defaults filled in) and its fingerprint
    #[command(after_help = "\
Examples:
  gradecheck config show
  gradecheck config show strict.recon.toml")]
    Show {
        /// Path to the .recon.toml config file (defaults when omitted)
        config: Option<PathBuf>,
    },
}

pub fn cmd_config(cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Validate { config } => cmd_config_validate(&config),
        ConfigCommands::Show { config } => cmd_config_show(config.as_deref()),
    }
}

/// Load a config file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    let text = read_input(path, "config")?;
    ReconConfig::from_toml(&text).map_err(|e| {
        CliError::new(EXIT_CHECK_INVALID_CONFIG, format!("{}: {e}", path.display()))
            .with_hint("run `gradecheck config show` to see every key and its default")
    })
}

fn cmd_config_validate(path: &Path) -> Result<(), CliError> {
    let config = load_config(Some(path))?;
    eprintln!("ok: {} (fingerprint {})", path.display(), config.fingerprint().short());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(path)?;
    let body = toml::to_string_pretty(&config)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("TOML serialization error: {e}")))?;
    println!("# fingerprint: {}", config.fingerprint());
    print!("{body}");
    Ok(())
}
