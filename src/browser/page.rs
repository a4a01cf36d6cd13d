//! Bindings for the remote tic-tac-toe page.
//!
//! Selector contract of the target page: the grid is `#gameBoard` with one
//! `button[data-index="0"-"8"]` per cell, running status text lives in
//! `#gameStatus`, and the win announcement (with the code) in
//! `#congratulations`.

use super::webdriver::WebDriver;
use super::{GameUi, UiError};
use crate::game::{Cell, Mark};
use crate::session::extract_code;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How often to re-check for the grid while the page loads.
const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// [`GameUi`] implementation over a live WebDriver session.
#[derive(Debug, Clone)]
pub struct PageUi {
    driver: WebDriver,
}

impl PageUi {
    /// Navigates to the game and waits for the grid to render.
    ///
    /// # Errors
    ///
    /// Returns [`UiError`] when navigation fails or the grid does not appear
    /// within `load_timeout`.
    #[instrument(skip(driver), fields(game_url = %game_url))]
    pub async fn open(
        driver: WebDriver,
        game_url: &str,
        load_timeout: Duration,
    ) -> Result<Self, UiError> {
        info!("Opening game page");
        driver.goto(game_url).await?;

        let deadline = tokio::time::Instant::now() + load_timeout;
        loop {
            if driver.find_optional("#gameBoard").await?.is_some() {
                info!("Game board rendered");
                return Ok(Self { driver });
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(UiError::new(format!(
                    "Game board did not render within {:?}",
                    load_timeout
                )));
            }
            debug!("Game board not yet rendered");
            tokio::time::sleep(LOAD_POLL_INTERVAL).await;
        }
    }

    /// CSS selector for the cell button at `index`.
    fn cell_selector(index: usize) -> String {
        format!("button[data-index=\"{}\"]", index)
    }

    /// Reads the announcement text, preferring the win banner when shown.
    async fn announcement(&self) -> Result<Option<String>, UiError> {
        if let Some(banner) = self.driver.find_optional("#congratulations").await? {
            if self.driver.displayed(&banner).await? {
                let text = self.driver.text(&banner).await?;
                if !text.trim().is_empty() {
                    return Ok(Some(text));
                }
            }
        }
        if let Some(status) = self.driver.find_optional("#gameStatus").await? {
            let text = self.driver.text(&status).await?;
            if !text.trim().is_empty() {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl GameUi for PageUi {
    #[instrument(skip(self))]
    async fn rendered_cell_mark(&self, index: usize) -> Result<Cell, UiError> {
        let selector = Self::cell_selector(index);
        // A missing cell button reads as empty, same as unmarked text.
        let Some(cell) = self.driver.find_optional(&selector).await? else {
            warn!(index, "Cell button not found");
            return Ok(Cell::Empty);
        };
        let text = self.driver.text(&cell).await?;
        let mark = match text.trim().to_lowercase().as_str() {
            "x" => Cell::Occupied(Mark::X),
            "o" => Cell::Occupied(Mark::O),
            _ => Cell::Empty,
        };
        Ok(mark)
    }

    #[instrument(skip(self))]
    async fn game_status_text(&self) -> Result<Option<String>, UiError> {
        self.announcement().await
    }

    #[instrument(skip(self))]
    async fn revealed_code(&self) -> Result<Option<String>, UiError> {
        let Some(text) = self.announcement().await? else {
            return Ok(None);
        };
        Ok(extract_code(&text))
    }

    #[instrument(skip(self))]
    async fn click_cell(&self, index: usize) -> Result<(), UiError> {
        let selector = Self::cell_selector(index);
        let cell = self.driver.find(&selector).await?;
        self.driver.click(&cell).await?;
        debug!(index, "Cell clicked");
        Ok(())
    }
}
