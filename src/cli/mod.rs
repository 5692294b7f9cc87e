pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "cmdsentry",
    version,
    about = "Pre-execution command guard for LLM coding agent tool-use requests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register the hook with the host agent's settings file
    Install,
    /// Remove the hook from the host agent's settings file
    Uninstall,
    /// Interactively set or update the config file
    Config,
    /// Read a Request as JSON from stdin, write a Decision envelope to stdout
    Check,
}
