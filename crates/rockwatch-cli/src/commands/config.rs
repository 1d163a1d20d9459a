//! Config command implementation.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::cli::ConfigAction;
use crate::config::Config;
use crate::style;
use crate::util::OutputSink;

pub fn cmd_config(
    action: &ConfigAction,
    path: &Path,
    no_color: bool,
    sink: &mut OutputSink,
) -> Result<()> {
    match action {
        ConfigAction::Path => sink.write(&format!("{}\n", path.display())),
        ConfigAction::Show => {
            let config = if path.exists() {
                Config::load(path)?
            } else {
                Config::default()
            };
            let content =
                toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
            sink.write(&content)
        }
        ConfigAction::Init { force } => {
            if path.exists() && !*force {
                bail!(
                    "Configuration file already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(path)?;
            sink.write(&format!(
                "{}\n",
                style::format_success(&format!("Wrote {}", path.display()), no_color)
            ))
        }
    }
}
