mod cli;
mod commands;
mod config;
mod format;
mod style;
mod util;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rockwatch_core::{ReadingValidator, RiskClassifier};
use rockwatch_types::Reading;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, OutputArgs};
use commands::{
    AssessArgs, ReplayArgs, SimulateArgs, cmd_assess, cmd_config, cmd_replay, cmd_simulate,
};
use config::{Config, default_config_path};
use format::FormatOptions;
use util::OutputSink;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut sink = OutputSink::open(cli.output.as_deref())?;

    match &cli.command {
        Commands::Assess {
            co2,
            temperature,
            humidity,
            output,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let opts = format_options(&cli, output, &config);
            let classifier = RiskClassifier::new(config.classifier.clone())?;
            let validator = ReadingValidator::new(config.validation.clone());
            let reading = Reading::builder()
                .co2(*co2)
                .temperature(*temperature)
                .humidity(*humidity)
                .timestamp(OffsetDateTime::now_utc())
                .build();
            cmd_assess(
                AssessArgs {
                    reading,
                    classifier: &classifier,
                    validator: &validator,
                    format: output.format,
                    opts: &opts,
                },
                &mut sink,
            )?;
        }
        Commands::Replay {
            input,
            no_summary,
            output,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let opts = format_options(&cli, output, &config);
            cmd_replay(
                ReplayArgs {
                    input,
                    format: output.format,
                    summary: !*no_summary,
                    options: config.session_options(),
                    opts: &opts,
                },
                &mut sink,
            )?;
        }
        Commands::Simulate {
            scenario,
            count,
            interval_ms,
            seed,
            output,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let opts = format_options(&cli, output, &config);
            let defaults = &config.simulate;
            let interval = interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| defaults.interval());
            cmd_simulate(
                SimulateArgs {
                    scenario: scenario.map_or(defaults.scenario, Into::into),
                    count: count.unwrap_or(defaults.count),
                    interval,
                    seed: seed.or(defaults.seed),
                    format: output.format,
                    options: config.session_options(),
                    opts: &opts,
                },
                &mut sink,
            )
            .await?;
        }
        // Config commands must work even when the file is broken
        Commands::Config { action } => {
            let path = cli.config.clone().unwrap_or_else(default_config_path);
            cmd_config(action, &path, cli.no_color, &mut sink)?;
        }
    }

    Ok(())
}

/// Load and validate the configuration file.
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(path).context("Failed to load configuration")?;
    config.validate()?;
    Ok(config)
}

/// Combine global flags, per-command output flags and the `[display]` section.
fn format_options(cli: &Cli, output: &OutputArgs, config: &Config) -> FormatOptions {
    let display = &config.display;
    FormatOptions::new(
        cli.no_color || display.no_color,
        output.resolve_fahrenheit(display.fahrenheit),
    )
    .with_no_header(output.no_header)
    .with_compact(cli.compact || display.compact)
}
