//! Command-line interface for rockfall risk monitoring.
//!
//! The `rockwatch` binary scores rock-face sensor readings (CO₂, temperature,
//! humidity) into LOW / MEDIUM / HIGH / CRITICAL rockfall risk, either one
//! reading at a time or across a live or recorded feed.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `assess` | Assess a single reading |
//! | `replay` | Replay a recorded JSON-lines feed through a monitoring session |
//! | `simulate` | Run a monitoring session on a simulated sensor feed |
//! | `config` | Manage CLI configuration |
//!
//! # Output Formats
//!
//! - **Text** (default): Human-readable colored output
//! - **JSON**: Machine-readable JSON; feeds are written as JSON lines
//! - **CSV**: Comma-separated values for spreadsheets and data analysis
//!
//! # Configuration
//!
//! The CLI stores configuration in `~/.config/rockwatch/config.toml` (or
//! platform equivalent), with these sections:
//!
//! - `[classifier]`: risk thresholds and score cut-offs
//! - `[history]`: history and prediction window sizes
//! - `[validation]`: plausibility check bounds
//! - `[simulate]`: default scenario, interval, count and seed
//! - `[display]`: `fahrenheit`, `no_color`, `compact`
//!
//! # Environment Variables
//!
//! - `ROCKWATCH_CONFIG`: Configuration file path (overridden by `--config`)
//! - `NO_COLOR`: Disable colored output when set
//! - `RUST_LOG`: Log filter when neither `--verbose` nor `--quiet` is given
//!
//! # Examples
//!
//! Assess one reading:
//! ```bash
//! rockwatch assess --co2 1050 --temperature 42 --humidity 96
//! ```
//!
//! Replay a recorded feed as CSV:
//! ```bash
//! rockwatch replay feed.jsonl --format csv --output risk.csv
//! ```
//!
//! Watch an escalating simulated feed:
//! ```bash
//! rockwatch simulate --scenario escalating --interval-ms 500 --count 40
//! ```

// This crate is primarily a binary CLI application.
// The entry point and command implementations are in main.rs.

// Re-export core dependencies for convenience
pub use rockwatch_core;
pub use rockwatch_types;
