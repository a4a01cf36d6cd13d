//! Priority-ordered move selection.
//!
//! The engine walks a fixed heuristic ladder instead of searching the game
//! tree: win, block, fork, block-fork, center, opposite corner, corner,
//! side. Each rung is consulted only when every rung above it found no
//! candidate, and ties always break to the lowest cell index.

use super::board::{Board, Cell, CellClass, Mark};
use derive_more::{Display, Error};
use tracing::{debug, instrument};

/// The board has no empty cell left to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("no legal move: board has no empty cells")]
pub struct NoLegalMoveError;

/// Chooses the next cell for `seat` on `board`.
///
/// # Errors
///
/// Returns [`NoLegalMoveError`] when the board is full.
#[instrument(skip(board), fields(seat = %seat))]
pub fn choose_move(board: &Board, seat: Mark) -> Result<usize, NoLegalMoveError> {
    if board.empty_cells().next().is_none() {
        return Err(NoLegalMoveError);
    }
    let rival = seat.opponent();

    if let Some(pos) = winning_cell(board, seat) {
        debug!(pos, "taking winning cell");
        return Ok(pos);
    }
    if let Some(pos) = winning_cell(board, rival) {
        debug!(pos, "blocking rival win");
        return Ok(pos);
    }
    if let Some(pos) = fork_cell(board, seat) {
        debug!(pos, "creating fork");
        return Ok(pos);
    }
    if let Some(pos) = block_fork_cell(board, seat) {
        debug!(pos, "blocking rival fork");
        return Ok(pos);
    }
    if board.is_empty(4) {
        debug!("taking center");
        return Ok(4);
    }
    if let Some(pos) = opposite_corner(board, rival) {
        debug!(pos, "taking opposite corner");
        return Ok(pos);
    }
    if let Some(pos) = first_of_class(board, CellClass::Corner) {
        debug!(pos, "taking empty corner");
        return Ok(pos);
    }
    first_of_class(board, CellClass::Side)
        .inspect(|pos| debug!(pos, "taking empty side"))
        .ok_or(NoLegalMoveError)
}

/// Lowest empty cell that completes a line for `mark`, if any.
fn winning_cell(board: &Board, mark: Mark) -> Option<usize> {
    board.empty_cells().find(|&pos| board.would_win(pos, mark))
}

/// Number of distinct cells where `mark` could win immediately.
fn immediate_wins(board: &Board, mark: Mark) -> usize {
    board
        .empty_cells()
        .filter(|&pos| board.would_win(pos, mark))
        .count()
}

/// Cells where placing `mark` creates two or more simultaneous win threats.
fn fork_cells(board: &Board, mark: Mark) -> Vec<usize> {
    board
        .empty_cells()
        .filter(|&pos| immediate_wins(&board.with(pos, mark), mark) >= 2)
        .collect()
}

/// Lowest fork-creating cell for `mark`, if any.
fn fork_cell(board: &Board, mark: Mark) -> Option<usize> {
    board
        .empty_cells()
        .find(|&pos| immediate_wins(&board.with(pos, mark), mark) >= 2)
}

/// Counters the rival's fork opportunities.
///
/// A single fork cell is occupied directly. With several, prefer making a
/// win threat of our own whose forced block does not hand the rival a fork;
/// otherwise occupy the lowest cell that leaves the rival with no fork, or
/// failing that, one that removes at least one.
fn block_fork_cell(board: &Board, seat: Mark) -> Option<usize> {
    let rival = seat.opponent();
    let rival_forks = fork_cells(board, rival);
    match rival_forks.as_slice() {
        [] => None,
        [only] => Some(*only),
        _ => {
            let safe_threat = board.empty_cells().find(|&pos| {
                let after = board.with(pos, seat);
                let threats: Vec<usize> = after
                    .empty_cells()
                    .filter(|&w| after.would_win(w, seat))
                    .collect();
                !threats.is_empty()
                    && threats
                        .iter()
                        .all(|&w| fork_cells(&after.with(w, rival), rival).is_empty())
            });
            if safe_threat.is_some() {
                return safe_threat;
            }
            let neutralize = board
                .empty_cells()
                .find(|&pos| fork_cells(&board.with(pos, seat), rival).is_empty());
            if neutralize.is_some() {
                return neutralize;
            }
            board
                .empty_cells()
                .find(|&pos| fork_cells(&board.with(pos, seat), rival).len() < rival_forks.len())
        }
    }
}

/// Empty corner diagonally opposite a rival-held corner, lowest index first.
fn opposite_corner(board: &Board, rival: Mark) -> Option<usize> {
    [0usize, 2, 6, 8].into_iter().find(|&pos| {
        board.is_empty(pos) && board.get(8 - pos) == Some(Cell::Occupied(rival))
    })
}

/// Lowest empty cell of the given class.
fn first_of_class(board: &Board, class: CellClass) -> Option<usize> {
    board
        .empty_cells()
        .find(|&pos| Board::classify(pos) == class)
}
