//! Tests for board snapshots and derived queries.

use ttt_pilot::{Board, Cell, CellClass, Mark, LINES};

/// Builds a board from a 9-char pattern of `X`, `O`, and `.`.
fn board_of(pattern: &str) -> Board {
    let mut cells = [Cell::Empty; 9];
    for (pos, c) in pattern.chars().filter(|c| !c.is_whitespace()).enumerate() {
        cells[pos] = match c {
            'X' => Cell::Occupied(Mark::X),
            'O' => Cell::Occupied(Mark::O),
            _ => Cell::Empty,
        };
    }
    Board::from_cells(cells)
}

#[test]
fn test_empty_board() {
    let board = Board::new();
    assert_eq!(board.empty_cells().count(), 9);
    assert!(board.winner().is_none());
    assert!(!board.is_full());
}

#[test]
fn test_empty_cells_ascending_and_restartable() {
    let board = board_of("X.O .X. ..O");
    let first: Vec<usize> = board.empty_cells().collect();
    let second: Vec<usize> = board.empty_cells().collect();
    assert_eq!(first, vec![1, 3, 5, 6, 7]);
    assert_eq!(first, second);
}

#[test]
fn test_lines_through_cell() {
    // Corner cells sit on 3 lines, the center on 4, sides on 2.
    assert_eq!(Board::lines_through(0).count(), 3);
    assert_eq!(Board::lines_through(4).count(), 4);
    assert_eq!(Board::lines_through(1).count(), 2);
    assert!(Board::lines_through(4).all(|line| line.contains(&4)));
}

#[test]
fn test_classify() {
    assert_eq!(Board::classify(4), CellClass::Center);
    for pos in [0, 2, 6, 8] {
        assert_eq!(Board::classify(pos), CellClass::Corner);
    }
    for pos in [1, 3, 5, 7] {
        assert_eq!(Board::classify(pos), CellClass::Side);
    }
}

#[test]
fn test_classify_idempotent() {
    for pos in 0..9 {
        assert_eq!(Board::classify(pos), Board::classify(pos));
    }
}

#[test]
fn test_would_win_completes_row() {
    let board = board_of("XX. O.O ...");
    assert!(board.would_win(2, Mark::X));
    assert!(board.would_win(4, Mark::O));
    assert!(!board.would_win(4, Mark::X));
    // An occupied cell never wins.
    assert!(!board.would_win(0, Mark::X));
}

#[test]
fn test_would_win_symmetric_under_relabeling() {
    let board = board_of("XX. OO. ...");
    let swapped = board_of("OO. XX. ...");
    for pos in 0..9 {
        assert_eq!(
            board.would_win(pos, Mark::X),
            swapped.would_win(pos, Mark::O),
            "relabeling changed would_win at {}",
            pos
        );
        assert_eq!(
            board.would_win(pos, Mark::O),
            swapped.would_win(pos, Mark::X),
            "relabeling changed would_win at {}",
            pos
        );
    }
}

#[test]
fn test_with_produces_new_snapshot() {
    let board = Board::new();
    let next = board.with(4, Mark::X);
    assert!(board.is_empty(4));
    assert_eq!(next.get(4), Some(Cell::Occupied(Mark::X)));
}

#[test]
fn test_winner_on_each_line() {
    for line in LINES {
        let mut board = Board::new();
        for pos in line {
            board = board.with(pos, Mark::O);
        }
        assert_eq!(board.winner(), Some(Mark::O), "line {:?} not detected", line);
    }
}

#[test]
fn test_full_drawn_board() {
    let board = board_of("XOX XOO OXX");
    assert!(board.is_full());
    assert!(board.winner().is_none());
}

#[test]
fn test_plausibility_of_mark_counts() {
    assert!(Board::new().is_plausible());
    assert!(board_of("X.. .O. ..X").is_plausible());
    // Two marks ahead means the capture raced a render.
    assert!(!board_of("X.X .X. .O.").is_plausible());
}
