//! Reads live page state into board snapshots.
//!
//! Reading races with the opponent's in-flight move and with client-side
//! rendering, so every snapshot is captured twice with a settle delay in
//! between; disagreeing or implausible captures are retried up to a budget
//! before escalating.

use crate::browser::{GameUi, UiError};
use crate::game::Board;
use derive_more::{Display, Error};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// End-of-game indicator reported by the page, independent of grid parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalSignal {
    /// Game still running (or no signal shown).
    None,
    /// The page announced our win.
    Win,
    /// The page announced our loss.
    Loss,
    /// The page announced a draw.
    Draw,
}

/// Board reads kept disagreeing past the retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("stale board: {} read attempts disagreed", attempts)]
pub struct StaleBoardError {
    /// Number of double-read attempts made.
    pub attempts: u32,
}

/// Captures consistent board snapshots from the live page.
pub struct BoardSynchronizer<U> {
    ui: Arc<U>,
    settle_delay: Duration,
    read_retries: u32,
}

impl<U: GameUi> BoardSynchronizer<U> {
    /// Creates a synchronizer over a page handle.
    pub fn new(ui: Arc<U>, settle_delay: Duration, read_retries: u32) -> Self {
        Self {
            ui,
            settle_delay,
            read_retries,
        }
    }

    /// Reads a consistent board snapshot.
    ///
    /// Each attempt reads the grid twice with a settle delay in between and
    /// accepts only when both reads agree and respect turn alternation.
    ///
    /// # Errors
    ///
    /// Returns [`StaleBoardError`] when every attempt within the budget
    /// disagreed; the caller treats this as retryable, not fatal.
    #[instrument(skip(self))]
    pub async fn read_board(&self) -> Result<Board, StaleBoardError> {
        for attempt in 1..=self.read_retries {
            let first = match self.capture().await {
                Ok(board) => board,
                Err(e) => {
                    warn!(attempt, error = %e, "Board capture failed");
                    tokio::time::sleep(self.settle_delay).await;
                    continue;
                }
            };
            tokio::time::sleep(self.settle_delay).await;
            let second = match self.capture().await {
                Ok(board) => board,
                Err(e) => {
                    warn!(attempt, error = %e, "Board capture failed");
                    continue;
                }
            };

            if first == second && first.is_plausible() {
                debug!(attempt, board = %first.display(), "Board snapshot stable");
                return Ok(first);
            }
            warn!(attempt, "Board reads disagree, retrying");
        }
        Err(StaleBoardError {
            attempts: self.read_retries,
        })
    }

    /// Reads all 9 rendered cell marks into one snapshot.
    async fn capture(&self) -> Result<Board, UiError> {
        let mut board = Board::new();
        for pos in 0..9 {
            let cell = self.ui.rendered_cell_mark(pos).await?;
            if let crate::game::Cell::Occupied(mark) = cell {
                board = board.with(pos, mark);
            }
        }
        Ok(board)
    }

    /// Reads the page's end-of-game indicator.
    ///
    /// UI failures read as [`TerminalSignal::None`]; the authoritative
    /// announcement may appear before the grid reflects the final mark, so
    /// this never consults the board.
    #[instrument(skip(self))]
    pub async fn read_terminal_signal(&self) -> TerminalSignal {
        match self.ui.game_status_text().await {
            Ok(Some(text)) => parse_terminal_signal(&text),
            Ok(None) => TerminalSignal::None,
            Err(e) => {
                warn!(error = %e, "Failed to read status text");
                TerminalSignal::None
            }
        }
    }
}

/// Maps announcement text to a terminal signal.
///
/// Keyword set follows the target page: winning shows "you won"/"you win",
/// losing "you lost"/"you lose"/"computer wins", a stalemate "draw"/"tie".
pub fn parse_terminal_signal(text: &str) -> TerminalSignal {
    let text = text.to_lowercase();
    if text.contains("you won") || text.contains("you win") {
        TerminalSignal::Win
    } else if text.contains("you lost") || text.contains("you lose") || text.contains("computer wins")
    {
        TerminalSignal::Loss
    } else if text.contains("draw") || text.contains("tie") {
        TerminalSignal::Draw
    } else {
        TerminalSignal::None
    }
}
