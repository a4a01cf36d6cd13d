//! Session state-machine tests against a scripted in-memory page.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ttt_pilot::{
    Board, BoardSynchronizer, Cell, GameSession, GameUi, Mark, Outcome, PilotConfig, UiError,
};

const SECRET: &str = "20250902093507";

/// In-memory stand-in for the live page.
///
/// Plays the opponent itself: once our X click registers, O takes the
/// lowest empty cell, so the session loop always has a turn to wait for.
struct FakePage {
    state: Mutex<FakeState>,
}

struct FakeState {
    cells: [Cell; 9],
    /// Clicks to refuse before accepting one (simulates a race).
    reject_clicks: u32,
    /// Whether O answers our moves.
    opponent_plays: bool,
    /// Whether the page announces draws and losses.
    announces: bool,
}

impl FakePage {
    fn new() -> Self {
        Self::with_rejections(0)
    }

    fn with_rejections(reject_clicks: u32) -> Self {
        Self {
            state: Mutex::new(FakeState {
                cells: [Cell::Empty; 9],
                reject_clicks,
                opponent_plays: true,
                announces: true,
            }),
        }
    }

    fn scripted(cells: [Cell; 9], announces: bool) -> Self {
        Self {
            state: Mutex::new(FakeState {
                cells,
                reject_clicks: 0,
                opponent_plays: false,
                announces,
            }),
        }
    }

    fn status_of(state: &FakeState) -> Option<String> {
        let board = Board::from_cells(state.cells);
        match board.winner() {
            Some(Mark::X) => Some(format!("You won! Here's your secret: {}", SECRET)),
            Some(Mark::O) if state.announces => Some("You lost!".to_string()),
            Some(Mark::O) => None,
            None if board.is_full() && state.announces => Some("It's a draw!".to_string()),
            None => None,
        }
    }
}

#[async_trait]
impl GameUi for FakePage {
    async fn rendered_cell_mark(&self, index: usize) -> Result<Cell, UiError> {
        let state = self.state.lock().unwrap();
        Ok(state.cells[index])
    }

    async fn game_status_text(&self) -> Result<Option<String>, UiError> {
        let state = self.state.lock().unwrap();
        Ok(Self::status_of(&state))
    }

    async fn revealed_code(&self) -> Result<Option<String>, UiError> {
        let state = self.state.lock().unwrap();
        let board = Board::from_cells(state.cells);
        Ok((board.winner() == Some(Mark::X)).then(|| SECRET.to_string()))
    }

    async fn click_cell(&self, index: usize) -> Result<(), UiError> {
        let mut state = self.state.lock().unwrap();
        if state.reject_clicks > 0 {
            state.reject_clicks -= 1;
            return Err(UiError::new("element not interactable".to_string()));
        }
        if state.cells[index] != Cell::Empty {
            return Err(UiError::new("cell already occupied".to_string()));
        }
        let board = Board::from_cells(state.cells);
        if board.winner().is_some() {
            return Err(UiError::new("game is over".to_string()));
        }
        state.cells[index] = Cell::Occupied(Mark::X);

        // Opponent answers with the lowest empty cell.
        let board = Board::from_cells(state.cells);
        if state.opponent_plays && board.winner().is_none() {
            if let Some(reply) = board.empty_cells().next() {
                state.cells[reply] = Cell::Occupied(Mark::O);
            }
        }
        Ok(())
    }
}

/// Config with timings tight enough for tests.
fn fast_config() -> PilotConfig {
    toml::from_str(
        r#"
        settle_delay_ms = 1
        turn_poll_interval_ms = 1
        move_poll_interval_ms = 1
        turn_wait_timeout_ms = 500
        move_confirm_timeout_ms = 50
        code_wait_timeout_ms = 50
        "#,
    )
    .expect("test config parses")
}

fn board_of(pattern: &str) -> [Cell; 9] {
    let mut cells = [Cell::Empty; 9];
    for (pos, c) in pattern.chars().filter(|c| !c.is_whitespace()).enumerate() {
        cells[pos] = match c {
            'X' => Cell::Occupied(Mark::X),
            'O' => Cell::Occupied(Mark::O),
            _ => Cell::Empty,
        };
    }
    cells
}

#[tokio::test]
async fn test_plays_to_win_and_reads_code() {
    let mut config = fast_config();
    // Ceiling equal to the turns actually needed: it must not fire early.
    config.set_max_turns(4);
    let page = Arc::new(FakePage::new());

    let report = GameSession::new(page, config).play_to_win().await;

    assert_eq!(*report.outcome(), Outcome::Win);
    assert_eq!(report.code().as_deref(), Some(SECRET));
    assert_eq!(*report.turns(), 4);
}

#[tokio::test]
async fn test_rejected_move_does_not_double_count_turns() {
    let page = Arc::new(FakePage::with_rejections(1));

    let report = GameSession::new(page, fast_config()).play_to_win().await;

    // The refused click is retried after a re-sync; the turn count only
    // moves on confirmed marks.
    assert_eq!(*report.outcome(), Outcome::Win);
    assert_eq!(*report.turns(), 4);
}

#[tokio::test]
async fn test_turn_ceiling_aborts_session() {
    let mut config = fast_config();
    config.set_max_turns(2);
    let page = Arc::new(FakePage::new());

    let report = GameSession::new(page, config).play_to_win().await;

    assert_eq!(*report.outcome(), Outcome::Aborted);
    assert_eq!(*report.turns(), 2);
    assert!(report.code().is_none());
}

#[tokio::test]
async fn test_full_board_without_signal_is_draw() {
    // Silent page, no move left for us (seat O): the engine's no-legal-move
    // answer maps to a draw.
    let mut config = fast_config();
    config.set_seat(Mark::O);
    let cells = board_of("XOX XOO OXX");
    let page = Arc::new(FakePage::scripted(cells, false));

    let report = GameSession::new(page, config).play_to_win().await;

    assert_eq!(*report.outcome(), Outcome::Draw);
    assert_eq!(*report.turns(), 0);
}

#[tokio::test]
async fn test_loss_signal_reported() {
    let cells = board_of("OOO XX. ...");
    let page = Arc::new(FakePage::scripted(cells, true));

    let report = GameSession::new(page, fast_config()).play_to_win().await;

    assert_eq!(*report.outcome(), Outcome::Loss);
    assert!(report.code().is_none());
}

#[tokio::test]
async fn test_win_without_code_still_reported() {
    /// Winning page that never reveals a code.
    struct CodelessPage(FakePage);

    #[async_trait]
    impl GameUi for CodelessPage {
        async fn rendered_cell_mark(&self, index: usize) -> Result<Cell, UiError> {
            self.0.rendered_cell_mark(index).await
        }
        async fn game_status_text(&self) -> Result<Option<String>, UiError> {
            self.0.game_status_text().await
        }
        async fn revealed_code(&self) -> Result<Option<String>, UiError> {
            Ok(None)
        }
        async fn click_cell(&self, index: usize) -> Result<(), UiError> {
            self.0.click_cell(index).await
        }
    }

    let page = Arc::new(CodelessPage(FakePage::new()));

    let report = GameSession::new(page, fast_config()).play_to_win().await;

    assert_eq!(*report.outcome(), Outcome::Win);
    assert!(report.code().is_none());
}

#[tokio::test]
async fn test_synchronizer_rejects_flickering_board() {
    /// Page whose corner cell changes on every read.
    struct FlickerPage {
        reads: Mutex<u32>,
    }

    #[async_trait]
    impl GameUi for FlickerPage {
        async fn rendered_cell_mark(&self, index: usize) -> Result<Cell, UiError> {
            let mut reads = self.reads.lock().unwrap();
            *reads += 1;
            if index == 0 && *reads % 2 == 0 {
                Ok(Cell::Occupied(Mark::O))
            } else {
                Ok(Cell::Empty)
            }
        }
        async fn game_status_text(&self) -> Result<Option<String>, UiError> {
            Ok(None)
        }
        async fn revealed_code(&self) -> Result<Option<String>, UiError> {
            Ok(None)
        }
        async fn click_cell(&self, _index: usize) -> Result<(), UiError> {
            Ok(())
        }
    }

    let page = Arc::new(FlickerPage {
        reads: Mutex::new(0),
    });
    let sync = BoardSynchronizer::new(page, Duration::from_millis(1), 3);

    let err = sync.read_board().await.expect_err("flicker must be stale");
    assert_eq!(err.attempts, 3);
}

#[tokio::test]
async fn test_synchronizer_accepts_stable_board() {
    let cells = board_of("X.. .O. ...");
    let page = Arc::new(FakePage::scripted(cells, true));
    let sync = BoardSynchronizer::new(page, Duration::from_millis(1), 3);

    let board = sync.read_board().await.expect("stable board reads");
    assert_eq!(board.get(0), Some(Cell::Occupied(Mark::X)));
    assert_eq!(board.get(4), Some(Cell::Occupied(Mark::O)));
    assert_eq!(board.empty_cells().count(), 7);
}
