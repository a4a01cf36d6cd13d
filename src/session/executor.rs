//! Applies chosen moves against the live page.

use crate::browser::GameUi;
use crate::game::{Cell, Mark};
use derive_more::{Display, Error};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// The page refused the move or never rendered it.
#[derive(Debug, Clone, Display, Error)]
#[display("move rejected at cell {}: {}", cell, reason)]
pub struct MoveRejectedError {
    /// Target cell index.
    pub cell: usize,
    /// Why the move did not register.
    pub reason: String,
}

/// Clicks cells and confirms the mark registered.
pub struct MoveExecutor<U> {
    ui: Arc<U>,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl<U: GameUi> MoveExecutor<U> {
    /// Creates an executor over a page handle.
    pub fn new(ui: Arc<U>, confirm_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            ui,
            confirm_timeout,
            poll_interval,
        }
    }

    /// Clicks `cell` and waits for `seat`'s mark to render there.
    ///
    /// # Errors
    ///
    /// Returns [`MoveRejectedError`] when the click fails, the cell renders
    /// the opponent's mark (the opponent raced us to it), or the mark does
    /// not register within the bounded wait. The caller must re-synchronize
    /// and re-decide; the cell is never retried blindly.
    #[instrument(skip(self), fields(seat = %seat))]
    pub async fn apply_move(&self, cell: usize, seat: Mark) -> Result<(), MoveRejectedError> {
        self.ui.click_cell(cell).await.map_err(|e| {
            warn!(cell, error = %e, "Click failed");
            MoveRejectedError {
                cell,
                reason: format!("click failed: {}", e),
            }
        })?;

        let deadline = tokio::time::Instant::now() + self.confirm_timeout;
        loop {
            match self.ui.rendered_cell_mark(cell).await {
                Ok(Cell::Occupied(mark)) if mark == seat => {
                    debug!(cell, "Mark registered");
                    return Ok(());
                }
                Ok(Cell::Occupied(other)) => {
                    warn!(cell, other = %other, "Cell taken by opponent");
                    return Err(MoveRejectedError {
                        cell,
                        reason: format!("cell already holds {}", other),
                    });
                }
                Ok(Cell::Empty) => {
                    debug!(cell, "Mark not yet rendered");
                }
                Err(e) => {
                    warn!(cell, error = %e, "Confirmation read failed");
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(MoveRejectedError {
                    cell,
                    reason: format!("mark did not register within {:?}", self.confirm_timeout),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
