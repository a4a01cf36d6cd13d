//! Session orchestration: synchronize, decide, execute, repeat.

mod code;
mod controller;
mod executor;
mod sync;

pub use code::{extract_code, validate_code};
pub use controller::{CodeNotFoundError, GameSession, Outcome, PlayReport, SessionExhaustedError};
pub use executor::{MoveExecutor, MoveRejectedError};
pub use sync::{parse_terminal_signal, BoardSynchronizer, StaleBoardError, TerminalSignal};
