//! Live-page access for the remote game.
//!
//! The session layer consumes the narrow [`GameUi`] capability; everything
//! WebDriver-specific stays behind it.

mod page;
mod webdriver;

pub use page::PageUi;
pub use webdriver::WebDriver;

use crate::game::Cell;
use async_trait::async_trait;
use derive_more::{Display, Error};
use tracing::error;

/// Narrow view of the live game page.
///
/// Four operations are all the session layer needs: the rendered mark in
/// each of the 9 positions, the status text, the revealed code, and a cell
/// click as the only mutating action.
#[async_trait]
pub trait GameUi: Send + Sync {
    /// Reads the rendered mark at `index` (0-8).
    async fn rendered_cell_mark(&self, index: usize) -> Result<Cell, UiError>;

    /// Reads the game status announcement, if the page shows one.
    async fn game_status_text(&self) -> Result<Option<String>, UiError>;

    /// Reads the revealed code, if the page shows one.
    async fn revealed_code(&self) -> Result<Option<String>, UiError>;

    /// Clicks the cell at `index` (0-8).
    async fn click_cell(&self, index: usize) -> Result<(), UiError>;
}

/// Failure talking to the live page.
#[derive(Debug, Clone, Display, Error)]
#[display("UI error: {} at {}:{}", message, file, line)]
pub struct UiError {
    /// Error message.
    pub message: String,
    /// Line number where the error was created.
    pub line: u32,
    /// Source file where the error was created.
    pub file: &'static str,
}

impl UiError {
    /// Creates a new UI error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        error!(error_message = %message, "UI error created");
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
