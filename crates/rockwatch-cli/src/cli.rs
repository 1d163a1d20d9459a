//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rockwatch_core::Scenario;

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Simulated feed scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioArg {
    /// Normal conditions, always LOW
    Stable,
    /// Drift towards CRITICAL over about thirty readings
    Escalating,
    /// Erratic readings with occasional missing fields
    Volatile,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::Stable => Scenario::Stable,
            ScenarioArg::Escalating => Scenario::Escalating,
            ScenarioArg::Volatile => Scenario::Volatile,
        }
    }
}

/// Reusable output format arguments
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Use Fahrenheit for temperature display (overrides --celsius and config)
    #[arg(long, conflicts_with = "celsius")]
    pub fahrenheit: bool,

    /// Use Celsius for temperature display (default, overrides config)
    #[arg(long, conflicts_with = "fahrenheit")]
    pub celsius: bool,

    /// Omit header row in CSV output (useful for appending)
    #[arg(long)]
    pub no_header: bool,
}

impl OutputArgs {
    /// Resolve fahrenheit setting: explicit flags override config
    pub fn resolve_fahrenheit(&self, config_fahrenheit: bool) -> bool {
        if self.fahrenheit {
            true
        } else if self.celsius {
            false
        } else {
            config_fahrenheit
        }
    }
}

#[derive(Parser)]
#[command(name = "rockwatch")]
#[command(author, version, about = "Rockfall risk monitoring from rock-face sensor readings", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, env = "ROCKWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assess a single reading
    Assess {
        /// CO2 concentration in ppm
        #[arg(long, allow_negative_numbers = true)]
        co2: f64,

        /// Temperature in °C
        #[arg(short, long, allow_negative_numbers = true)]
        temperature: f64,

        /// Relative humidity in %
        #[arg(short = 'H', long, allow_negative_numbers = true)]
        humidity: f64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Replay a recorded feed of JSON lines through a monitoring session
    Replay {
        /// Input file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Skip the summary after the last reading
        #[arg(long)]
        no_summary: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run a monitoring session on a simulated sensor feed
    Simulate {
        /// Feed scenario (defaults to the configured scenario)
        #[arg(short, long, value_enum)]
        scenario: Option<ScenarioArg>,

        /// Stop after this many readings (0 runs until Ctrl-C)
        #[arg(short = 'n', long)]
        count: Option<u64>,

        /// Milliseconds between readings
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Seed for reproducible readings
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show configuration file path
    Path,

    /// Show current configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
