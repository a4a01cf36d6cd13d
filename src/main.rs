//! ttt_pilot - automated play of the remote tic-tac-toe page.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use ttt_pilot::{GameSession, Outcome, PageUi, PilotConfig, WebDriver};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            game_url,
            webdriver_url,
            max_turns,
            headed,
        } => run_play(config, game_url, webdriver_url, max_turns, headed).await,
    }
}

/// Play one game to a terminal outcome and print the result.
async fn run_play(
    config_path: Option<std::path::PathBuf>,
    game_url: Option<String>,
    webdriver_url: Option<String>,
    max_turns: Option<u32>,
    headed: bool,
) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config = match config_path {
        Some(path) => PilotConfig::from_file(path)?,
        None => PilotConfig::default(),
    };
    if let Some(url) = game_url {
        config.set_game_url(url);
    }
    if let Some(url) = webdriver_url {
        config.set_webdriver_url(url);
    }
    if let Some(turns) = max_turns {
        config.set_max_turns(turns);
    }
    if headed {
        config.set_headless(false);
    }

    info!(game_url = %config.game_url(), webdriver_url = %config.webdriver_url(), "Starting run");
    let driver = WebDriver::connect(config.webdriver_url().clone(), *config.headless()).await?;
    let page = PageUi::open(driver.clone(), config.game_url(), config.page_load_timeout()).await?;

    let report = GameSession::new(Arc::new(page), config).play_to_win().await;

    if let Err(e) = driver.quit().await {
        warn!(error = %e, "Failed to close browser session");
    }

    println!("outcome: {}", report.outcome());
    println!("turns: {}", report.turns());
    match report.code() {
        Some(code) => println!("code: {}", code),
        None => println!("code: (none)"),
    }

    if *report.outcome() == Outcome::Aborted {
        anyhow::bail!("session aborted before reaching a terminal state");
    }
    Ok(())
}
