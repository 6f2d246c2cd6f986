use clap::{Parser, Subcommand};

/// Telemetry client for embedded weather-station bridges.
#[derive(Debug, Parser)]
#[command(name = "wxbridge", version, about)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll all configured bridges until interrupted.
    Run,

    /// Poll each configured bridge once and print the readings.
    PollOnce {
        /// Only poll the named bridge.
        #[arg(long)]
        bridge: Option<String>,
    },

    /// Configuration helpers.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path.
    Path,

    /// Write a starter config file (refuses to overwrite).
    Init,
}
