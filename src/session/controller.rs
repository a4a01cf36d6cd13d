//! Turn-loop state machine driving the game to a win.
//!
//! One pass through the loop is wait-for-turn, sync, decide, execute,
//! confirm. Transient conditions (stale reads, rejected moves) are absorbed
//! here inside bounded retries; only budget exhaustion or a definitive
//! terminal state reaches the caller.

use super::code::validate_code;
use super::executor::MoveExecutor;
use super::sync::{BoardSynchronizer, TerminalSignal};
use crate::browser::GameUi;
use crate::config::PilotConfig;
use crate::game::{choose_move, Board, Cell, Mark};
use chrono::{TimeDelta, Utc};
use derive_getters::Getters;
use derive_more::{Display, Error};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Final result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Outcome {
    /// We completed a line, or the page announced our win.
    #[display("win")]
    Win,
    /// The page announced our loss.
    #[display("loss")]
    Loss,
    /// The board filled with no winner, or the page announced a draw.
    #[display("draw")]
    Draw,
    /// A budget ran out before the game resolved.
    #[display("aborted")]
    Aborted,
}

/// What a finished session hands back to the caller.
#[derive(Debug, Clone, Getters)]
pub struct PlayReport {
    /// How the game ended.
    outcome: Outcome,
    /// The revealed code, when the win produced one.
    code: Option<String>,
    /// Confirmed turns we played.
    turns: u32,
}

/// The session ran out of its turn or attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("session exhausted after {} turns", turns)]
pub struct SessionExhaustedError {
    /// Confirmed turns played when the budget ran out.
    pub turns: u32,
}

/// The win banner never produced a code within the bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("no code revealed within the wait budget")]
pub struct CodeNotFoundError;

/// Result of the wait-for-turn gate.
enum TurnGate {
    /// It is our move.
    OurTurn,
    /// The page reported the game over.
    Terminal(TerminalSignal),
}

/// Result of one attempted turn.
enum TurnResult {
    /// A move was confirmed on the board.
    Moved,
    /// No empty cell was left to play.
    BoardFull,
    /// The per-turn attempt budget ran out.
    Exhausted,
}

/// Plays one game on the live page until a terminal outcome.
///
/// Owns all mutable session state; the board model and strategy engine stay
/// pure underneath it.
pub struct GameSession<U> {
    ui: Arc<U>,
    sync: BoardSynchronizer<U>,
    executor: MoveExecutor<U>,
    config: PilotConfig,
    seat: Mark,
    board: Board,
    turn_count: u32,
}

impl<U: GameUi> GameSession<U> {
    /// Creates a session over a page handle.
    #[instrument(skip(ui, config), fields(seat = %config.seat()))]
    pub fn new(ui: Arc<U>, config: PilotConfig) -> Self {
        info!("Creating game session");
        let sync = BoardSynchronizer::new(
            ui.clone(),
            config.settle_delay(),
            *config.board_read_retries(),
        );
        let executor = MoveExecutor::new(
            ui.clone(),
            config.move_confirm_timeout(),
            config.move_poll_interval(),
        );
        let seat = *config.seat();
        Self {
            ui,
            sync,
            executor,
            config,
            seat,
            board: Board::new(),
            turn_count: 0,
        }
    }

    /// Returns the most recent confirmed board snapshot.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the number of confirmed turns played so far.
    pub fn turns(&self) -> u32 {
        self.turn_count
    }

    /// Drives the game to a terminal outcome and reports it.
    ///
    /// This is the only operation the caller sees. Component errors never
    /// escape: stale reads and rejected moves are retried here, a full board
    /// maps to a draw, and budget exhaustion maps to an aborted outcome.
    #[instrument(skip(self), fields(seat = %self.seat))]
    pub async fn play_to_win(mut self) -> PlayReport {
        info!("Starting session");
        loop {
            match self.wait_for_turn().await {
                Some(TurnGate::Terminal(signal)) => return self.finish(signal).await,
                Some(TurnGate::OurTurn) => {}
                None => {
                    warn!(turns = self.turn_count, "Timed out waiting for our turn");
                    return self.report(Outcome::Aborted, None);
                }
            }

            if self.turn_count >= *self.config.max_turns() {
                let err = SessionExhaustedError {
                    turns: self.turn_count,
                };
                warn!(error = %err, "Turn ceiling reached");
                return self.report(Outcome::Aborted, None);
            }

            match self.take_turn().await {
                TurnResult::Moved => {}
                TurnResult::BoardFull => {
                    // The page may know an outcome the grid can't show.
                    let signal = self.sync.read_terminal_signal().await;
                    if signal != TerminalSignal::None {
                        return self.finish(signal).await;
                    }
                    info!("No legal move left, treating as draw");
                    return self.report(Outcome::Draw, None);
                }
                TurnResult::Exhausted => {
                    warn!(turns = self.turn_count, "Per-turn attempt budget exhausted");
                    return self.report(Outcome::Aborted, None);
                }
            }
        }
    }

    /// Polls until it is our move or the page reports the game over.
    ///
    /// Returns `None` when the wait budget runs out.
    async fn wait_for_turn(&self) -> Option<TurnGate> {
        let deadline = tokio::time::Instant::now() + self.config.turn_wait_timeout();
        loop {
            let signal = self.sync.read_terminal_signal().await;
            if signal != TerminalSignal::None {
                debug!(?signal, "Terminal signal while waiting");
                return Some(TurnGate::Terminal(signal));
            }

            match self.sync.read_board().await {
                Ok(board) if self.is_our_turn(&board) => {
                    debug!("Our turn");
                    return Some(TurnGate::OurTurn);
                }
                Ok(_) => debug!("Opponent still to move"),
                Err(e) => warn!(error = %e, "Stale board while waiting for turn"),
            }

            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(self.config.turn_poll_interval()).await;
        }
    }

    /// Whether the mark counts say we move next.
    fn is_our_turn(&self, board: &Board) -> bool {
        let x = board.count(Mark::X);
        let o = board.count(Mark::O);
        match self.seat {
            Mark::X => x == o,
            Mark::O => x == o + 1,
        }
    }

    /// Runs sync → decide → execute → confirm with a bounded attempt budget.
    ///
    /// Rejected moves and stale reads consume an attempt and loop back to
    /// sync without advancing the turn count.
    async fn take_turn(&mut self) -> TurnResult {
        for attempt in 1..=*self.config.max_move_attempts() {
            let board = match self.sync.read_board().await {
                Ok(board) => board,
                Err(e) => {
                    warn!(attempt, error = %e, "Sync failed");
                    continue;
                }
            };
            self.board = board;

            let cell = match choose_move(&board, self.seat) {
                Ok(cell) => cell,
                Err(_) => return TurnResult::BoardFull,
            };
            info!(attempt, cell, board = %board.display(), "Chose move");

            if let Err(e) = self.executor.apply_move(cell, self.seat).await {
                warn!(attempt, error = %e, "Move rejected, re-syncing");
                continue;
            }

            match self.sync.read_board().await {
                Ok(confirmed) if confirmed.get(cell) == Some(Cell::Occupied(self.seat)) => {
                    self.board = confirmed;
                    self.turn_count += 1;
                    info!(cell, turns = self.turn_count, "Move confirmed");
                    return TurnResult::Moved;
                }
                Ok(_) => warn!(attempt, cell, "Mark missing after move, re-syncing"),
                Err(e) => warn!(attempt, error = %e, "Confirmation sync failed"),
            }
        }
        TurnResult::Exhausted
    }

    /// Maps a terminal signal to the final report, extracting the code on a
    /// win.
    async fn finish(self, signal: TerminalSignal) -> PlayReport {
        match signal {
            TerminalSignal::Win => {
                info!(turns = self.turn_count, "Game won, extracting code");
                match self.extract_revealed_code().await {
                    Ok(code) => self.report(Outcome::Win, Some(code)),
                    Err(e) => {
                        // Partial success: the win stands even without a code.
                        warn!(error = %e, "Win reported without a code");
                        self.report(Outcome::Win, None)
                    }
                }
            }
            TerminalSignal::Loss => self.report(Outcome::Loss, None),
            TerminalSignal::Draw => self.report(Outcome::Draw, None),
            TerminalSignal::None => self.report(Outcome::Aborted, None),
        }
    }

    /// Polls for the revealed code within the bounded wait.
    async fn extract_revealed_code(&self) -> Result<String, CodeNotFoundError> {
        let deadline = tokio::time::Instant::now() + self.config.code_wait_timeout();
        loop {
            match self.ui.revealed_code().await {
                Ok(Some(code)) => {
                    let fresh = validate_code(
                        &code,
                        Utc::now(),
                        self.config.host_offset(),
                        TimeDelta::seconds(*self.config.code_freshness_secs()),
                    );
                    // Validation is advisory; the host is authoritative.
                    info!(code = %code, fresh, "Code revealed");
                    return Ok(code);
                }
                Ok(None) => debug!("Code not yet revealed"),
                Err(e) => warn!(error = %e, "Failed to read revealed code"),
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(CodeNotFoundError);
            }
            tokio::time::sleep(self.config.move_poll_interval()).await;
        }
    }

    /// Builds the final report.
    fn report(&self, outcome: Outcome, code: Option<String>) -> PlayReport {
        info!(%outcome, turns = self.turn_count, has_code = code.is_some(), "Session finished");
        PlayReport {
            outcome,
            code,
            turns: self.turn_count,
        }
    }
}
