//! Configuration display command.

use crate::cli::icons::arrow;
use crate::config::Config;

/// Print the effective configuration as JSON.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => eprintln!("{} Loaded from {}", arrow(), path.display()),
        None => eprintln!("{} No config file found, using defaults", arrow()),
    }
    println!("{}", config.to_json_pretty());
    Ok(())
}
