//! Run configuration for the autoplay session.

use crate::game::Mark;
use chrono::FixedOffset;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Configuration for one autoplay run.
///
/// Every field has a serde default, so a config file only needs to name the
/// values it changes. Budgets are deliberate: each wait in the session loop
/// is a poll with a deadline, never an unbounded block.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct PilotConfig {
    /// URL of the game page.
    #[serde(default = "default_game_url")]
    game_url: String,

    /// WebDriver server endpoint.
    #[serde(default = "default_webdriver_url")]
    webdriver_url: String,

    /// Run the browser headless.
    #[serde(default = "default_headless")]
    headless: bool,

    /// Which mark we play. The target page gives the visitor X.
    #[serde(default = "default_seat")]
    seat: Mark,

    /// How long to wait for the grid to render after navigation (ms).
    #[serde(default = "default_page_load_timeout_ms")]
    page_load_timeout_ms: u64,

    /// Settle delay between the two reads of a board capture (ms).
    #[serde(default = "default_settle_delay_ms")]
    settle_delay_ms: u64,

    /// Double-read attempts before a capture counts as stale.
    #[serde(default = "default_board_read_retries")]
    board_read_retries: u32,

    /// How long to wait for our turn before aborting (ms).
    #[serde(default = "default_turn_wait_timeout_ms")]
    turn_wait_timeout_ms: u64,

    /// Poll interval while waiting for our turn (ms).
    #[serde(default = "default_turn_poll_interval_ms")]
    turn_poll_interval_ms: u64,

    /// How long to wait for a clicked mark to render (ms).
    #[serde(default = "default_move_confirm_timeout_ms")]
    move_confirm_timeout_ms: u64,

    /// Poll interval while confirming a move (ms).
    #[serde(default = "default_move_poll_interval_ms")]
    move_poll_interval_ms: u64,

    /// Ceiling on confirmed turns before the session aborts.
    #[serde(default = "default_max_turns")]
    max_turns: u32,

    /// Sync/execute/confirm attempts per turn before the session aborts.
    #[serde(default = "default_max_move_attempts")]
    max_move_attempts: u32,

    /// How long to wait for the revealed code after a win (ms).
    #[serde(default = "default_code_wait_timeout_ms")]
    code_wait_timeout_ms: u64,

    /// Freshness window for the revealed code timestamp (seconds).
    #[serde(default = "default_code_freshness_secs")]
    code_freshness_secs: i64,

    /// UTC offset of the game host's timezone (minutes).
    #[serde(default = "default_host_utc_offset_mins")]
    host_utc_offset_mins: i32,
}

fn default_game_url() -> String {
    "https://ttt.puppy9.com/".to_string()
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_seat() -> Mark {
    Mark::X
}

fn default_page_load_timeout_ms() -> u64 {
    15_000
}

fn default_settle_delay_ms() -> u64 {
    150
}

fn default_board_read_retries() -> u32 {
    4
}

fn default_turn_wait_timeout_ms() -> u64 {
    20_000
}

fn default_turn_poll_interval_ms() -> u64 {
    400
}

fn default_move_confirm_timeout_ms() -> u64 {
    5_000
}

fn default_move_poll_interval_ms() -> u64 {
    200
}

fn default_max_turns() -> u32 {
    9
}

fn default_max_move_attempts() -> u32 {
    5
}

fn default_code_wait_timeout_ms() -> u64 {
    10_000
}

fn default_code_freshness_secs() -> i64 {
    600
}

fn default_host_utc_offset_mins() -> i32 {
    0
}

impl PilotConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(game_url = %config.game_url, "Config loaded successfully");
        Ok(config)
    }

    /// Page-load wait as a [`Duration`].
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    /// Capture settle delay as a [`Duration`].
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Turn wait budget as a [`Duration`].
    pub fn turn_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_wait_timeout_ms)
    }

    /// Turn poll interval as a [`Duration`].
    pub fn turn_poll_interval(&self) -> Duration {
        Duration::from_millis(self.turn_poll_interval_ms)
    }

    /// Move confirmation budget as a [`Duration`].
    pub fn move_confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.move_confirm_timeout_ms)
    }

    /// Move confirmation poll interval as a [`Duration`].
    pub fn move_poll_interval(&self) -> Duration {
        Duration::from_millis(self.move_poll_interval_ms)
    }

    /// Code wait budget as a [`Duration`].
    pub fn code_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.code_wait_timeout_ms)
    }

    /// Overrides the game page URL.
    pub fn set_game_url(&mut self, url: String) {
        self.game_url = url;
    }

    /// Overrides the WebDriver endpoint.
    pub fn set_webdriver_url(&mut self, url: String) {
        self.webdriver_url = url;
    }

    /// Overrides the turn ceiling.
    pub fn set_max_turns(&mut self, turns: u32) {
        self.max_turns = turns;
    }

    /// Overrides headless mode.
    pub fn set_headless(&mut self, headless: bool) {
        self.headless = headless;
    }

    /// Overrides the mark we play.
    pub fn set_seat(&mut self, seat: Mark) {
        self.seat = seat;
    }

    /// Host timezone as a [`FixedOffset`].
    ///
    /// An out-of-range offset falls back to UTC.
    pub fn host_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.host_utc_offset_mins * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            game_url: default_game_url(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            seat: default_seat(),
            page_load_timeout_ms: default_page_load_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            board_read_retries: default_board_read_retries(),
            turn_wait_timeout_ms: default_turn_wait_timeout_ms(),
            turn_poll_interval_ms: default_turn_poll_interval_ms(),
            move_confirm_timeout_ms: default_move_confirm_timeout_ms(),
            move_poll_interval_ms: default_move_poll_interval_ms(),
            max_turns: default_max_turns(),
            max_move_attempts: default_max_move_attempts(),
            code_wait_timeout_ms: default_code_wait_timeout_ms(),
            code_freshness_secs: default_code_freshness_secs(),
            host_utc_offset_mins: default_host_utc_offset_mins(),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
