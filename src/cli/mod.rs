//! CLI subcommand implementations for the lochound binary.

pub mod doctor;
pub mod harvest_cmd;
pub mod install_cmd;
pub mod output;
pub mod progress;
