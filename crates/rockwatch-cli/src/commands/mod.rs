//! Command implementations for the CLI.

mod assess;
mod config;
mod replay;
mod simulate;

pub use assess::{AssessArgs, cmd_assess};
pub use config::cmd_config;
pub use replay::{ReplayArgs, cmd_replay};
pub use simulate::{SimulateArgs, cmd_simulate};
