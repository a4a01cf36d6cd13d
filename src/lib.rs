//! ttt_pilot library - automated play of a remote web tic-tac-toe
//!
//! Drives the game page to a win with a fixed heuristic strategy and reads
//! out the code the page reveals on victory.
//!
//! # Architecture
//!
//! - **Game**: pure board snapshots and priority-ordered move selection
//! - **Browser**: WebDriver-backed access to the live page behind the
//!   narrow [`GameUi`] capability
//! - **Session**: the turn-loop state machine (sync, decide, execute,
//!   confirm) with bounded retries and budgets
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ttt_pilot::{GameSession, PageUi, PilotConfig, WebDriver};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = PilotConfig::default();
//! let driver = WebDriver::connect(
//!     config.webdriver_url().clone(),
//!     *config.headless(),
//! ).await?;
//! let page = PageUi::open(driver, config.game_url(), config.page_load_timeout()).await?;
//! let report = GameSession::new(Arc::new(page), config).play_to_win().await;
//! println!("{}: {:?}", report.outcome(), report.code());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod browser;
mod config;
mod game;
mod session;

// Crate-level exports - Configuration
pub use config::{ConfigError, PilotConfig};

// Crate-level exports - Live-page access
pub use browser::{GameUi, PageUi, UiError, WebDriver};

// Crate-level exports - Game domain
pub use game::{choose_move, Board, Cell, CellClass, Mark, NoLegalMoveError, LINES};

// Crate-level exports - Session orchestration
pub use session::{
    extract_code, parse_terminal_signal, validate_code, BoardSynchronizer, CodeNotFoundError,
    GameSession, MoveExecutor, MoveRejectedError, Outcome, PlayReport, SessionExhaustedError,
    StaleBoardError, TerminalSignal,
};
