//! Command-line interface for ttt_pilot.

use clap::{Parser, Subcommand};

/// ttt_pilot - win the remote tic-tac-toe and read out the code
#[derive(Parser, Debug)]
#[command(name = "ttt_pilot")]
#[command(about = "Automated play of the remote tic-tac-toe page", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play one game to a win and print the revealed code
    Play {
        /// Path to a TOML config file
        #[arg(long)]
        config: Option<std::path::PathBuf>,

        /// Game page URL (overrides config)
        #[arg(long)]
        game_url: Option<String>,

        /// WebDriver server endpoint (overrides config)
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Ceiling on confirmed turns (overrides config)
        #[arg(long)]
        max_turns: Option<u32>,

        /// Run with a visible browser window
        #[arg(long)]
        headed: bool,
    },
}
