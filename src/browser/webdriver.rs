//! Minimal W3C WebDriver client over HTTP.
//!
//! Speaks the wire protocol directly with `reqwest` + `serde_json` against a
//! running chromedriver/geckodriver endpoint. Only the handful of commands
//! the game page needs are implemented: session create/delete, navigate,
//! find element, element text, element click, element displayed.

use super::UiError;
use tracing::{debug, error, info, instrument};

/// Key under which the W3C protocol nests an element reference.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Opaque reference to a located element.
#[derive(Debug, Clone)]
pub struct ElementRef(String);

/// Client for one WebDriver session.
#[derive(Debug, Clone)]
pub struct WebDriver {
    /// WebDriver server endpoint, e.g. `http://localhost:9515`.
    base_url: String,
    /// HTTP client.
    client: reqwest::Client,
    /// Session ID assigned by the server.
    session_id: String,
}

impl WebDriver {
    /// Opens a new browser session against a WebDriver server.
    #[instrument(skip_all, fields(base_url = %base_url, headless))]
    pub async fn connect(base_url: String, headless: bool) -> Result<Self, UiError> {
        info!("Opening WebDriver session");

        let mut args = vec!["--disable-gpu".to_string(), "--window-size=1280,800".to_string()];
        if headless {
            args.push("--headless=new".to_string());
        }
        let body = serde_json::json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": { "args": args }
                }
            }
        });

        let client = reqwest::Client::new();
        let url = format!("{}/session", base_url);
        let value = post_command(&client, &url, &body).await?;

        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| {
                error!(response = %value, "Missing sessionId in new-session response");
                UiError::new("Missing sessionId in new-session response".to_string())
            })?
            .to_string();

        info!(session_id = %session_id, "WebDriver session opened");
        Ok(Self {
            base_url,
            client,
            session_id,
        })
    }

    /// Navigates the session to `url`.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn goto(&self, url: &str) -> Result<(), UiError> {
        debug!("Navigating");
        let endpoint = format!("{}/session/{}/url", self.base_url, self.session_id);
        post_command(&self.client, &endpoint, &serde_json::json!({ "url": url })).await?;
        Ok(())
    }

    /// Finds the first element matching a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`UiError`] on transport failure or when no element matches;
    /// use [`WebDriver::find_optional`] when absence is expected.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn find(&self, css: &str) -> Result<ElementRef, UiError> {
        self.find_optional(css).await?.ok_or_else(|| {
            UiError::new(format!("No element matches selector: {}", css))
        })
    }

    /// Finds an element that may legitimately be absent.
    ///
    /// `no such element` responses become `Ok(None)`; every other failure is
    /// still an error.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn find_optional(&self, css: &str) -> Result<Option<ElementRef>, UiError> {
        let endpoint = format!("{}/session/{}/element", self.base_url, self.session_id);
        let body = serde_json::json!({ "using": "css selector", "value": css });

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Find-element request failed");
                UiError::new(format!("WebDriver request failed: {}", e))
            })?;
        let json = read_json(response).await?;

        if let Some(err) = json["value"]["error"].as_str() {
            if err == "no such element" {
                debug!(css, "Element not present");
                return Ok(None);
            }
            let message = json["value"]["message"].as_str().unwrap_or(err);
            error!(webdriver_error = err, message, "Find-element command failed");
            return Err(UiError::new(format!("WebDriver error {}: {}", err, message)));
        }

        let element = json["value"][ELEMENT_KEY]
            .as_str()
            .ok_or_else(|| {
                error!(response = %json, "Missing element reference in response");
                UiError::new("Missing element reference in find response".to_string())
            })?
            .to_string();

        Ok(Some(ElementRef(element)))
    }

    /// Reads the visible text of an element.
    #[instrument(skip(self, element), fields(session_id = %self.session_id))]
    pub async fn text(&self, element: &ElementRef) -> Result<String, UiError> {
        let endpoint = format!(
            "{}/session/{}/element/{}/text",
            self.base_url, self.session_id, element.0
        );
        let value = get_command(&self.client, &endpoint).await?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| UiError::new("Element text is not a string".to_string()))
    }

    /// Whether an element is currently displayed.
    #[instrument(skip(self, element), fields(session_id = %self.session_id))]
    pub async fn displayed(&self, element: &ElementRef) -> Result<bool, UiError> {
        let endpoint = format!(
            "{}/session/{}/element/{}/displayed",
            self.base_url, self.session_id, element.0
        );
        let value = get_command(&self.client, &endpoint).await?;
        value
            .as_bool()
            .ok_or_else(|| UiError::new("Displayed response is not a boolean".to_string()))
    }

    /// Clicks an element.
    #[instrument(skip(self, element), fields(session_id = %self.session_id))]
    pub async fn click(&self, element: &ElementRef) -> Result<(), UiError> {
        let endpoint = format!(
            "{}/session/{}/element/{}/click",
            self.base_url, self.session_id, element.0
        );
        post_command(&self.client, &endpoint, &serde_json::json!({})).await?;
        Ok(())
    }

    /// Ends the browser session.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn quit(self) -> Result<(), UiError> {
        info!("Closing WebDriver session");
        let endpoint = format!("{}/session/{}", self.base_url, self.session_id);
        let response = self.client.delete(&endpoint).send().await.map_err(|e| {
            error!(error = %e, "Delete-session request failed");
            UiError::new(format!("WebDriver request failed: {}", e))
        })?;
        read_json(response).await?;
        Ok(())
    }
}

/// Sends a POST command and returns the protocol `value` field.
async fn post_command(
    client: &reqwest::Client,
    endpoint: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value, UiError> {
    let response = client.post(endpoint).json(body).send().await.map_err(|e| {
        error!(error = %e, endpoint, "WebDriver request failed");
        UiError::new(format!("WebDriver request failed: {}", e))
    })?;
    let json = read_json(response).await?;
    check_value(json)
}

/// Sends a GET command and returns the protocol `value` field.
async fn get_command(
    client: &reqwest::Client,
    endpoint: &str,
) -> Result<serde_json::Value, UiError> {
    let response = client.get(endpoint).send().await.map_err(|e| {
        error!(error = %e, endpoint, "WebDriver request failed");
        UiError::new(format!("WebDriver request failed: {}", e))
    })?;
    let json = read_json(response).await?;
    check_value(json)
}

/// Reads a response body as JSON.
async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, UiError> {
    let status = response.status();
    let text = response.text().await.map_err(|e| {
        error!(error = %e, "Failed to read WebDriver response body");
        UiError::new(format!("Failed to read response: {}", e))
    })?;
    debug!(status = %status, body_length = text.len(), "WebDriver response");
    serde_json::from_str(&text).map_err(|e| {
        error!(error = %e, response = %text, "Failed to parse WebDriver response");
        UiError::new(format!("Invalid JSON response: {}", e))
    })
}

/// Extracts `value`, surfacing protocol-level errors.
fn check_value(json: serde_json::Value) -> Result<serde_json::Value, UiError> {
    if let Some(err) = json["value"]["error"].as_str() {
        let message = json["value"]["message"].as_str().unwrap_or(err);
        error!(webdriver_error = err, message, "WebDriver command failed");
        return Err(UiError::new(format!("WebDriver error {}: {}", err, message)));
    }
    Ok(json["value"].clone())
}
