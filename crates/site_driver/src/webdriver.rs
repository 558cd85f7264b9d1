//! Minimal W3C WebDriver client covering the commands the booking drivers
//! need: navigation, element lookup, clicks, typing and text reads.

use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::DriverError;

pub(crate) const WEB_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const REQUEST_HEADROOM: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    fn to_body(&self) -> Value {
        match self {
            Locator::Css(selector) => json!({ "using": "css selector", "value": selector }),
            Locator::XPath(expr) => json!({ "using": "xpath", "value": expr }),
        }
    }

    fn describe(&self) -> &str {
        match self {
            Locator::Css(value) | Locator::XPath(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(String);

impl ElementRef {
    fn from_value(value: &Value) -> Result<Self, DriverError> {
        value
            .get(WEB_ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| Self(id.to_string()))
            .ok_or_else(|| DriverError::Protocol(format!("not a web element reference: {value}")))
    }
}

pub struct WebDriverClient {
    http: Client,
    base: Url,
    session_id: Option<String>,
    element_timeout: Duration,
}

impl WebDriverClient {
    /// Starts a new browser session on the WebDriver endpoint at `base`.
    pub async fn connect(
        mut base: Url,
        capabilities: Value,
        element_timeout: Duration,
    ) -> Result<Self, DriverError> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = Client::builder()
            .timeout(element_timeout + REQUEST_HEADROOM)
            .build()?;
        let mut client = Self {
            http,
            base,
            session_id: None,
            element_timeout,
        };

        let value = client
            .command(
                Method::POST,
                "session",
                Some(json!({ "capabilities": { "alwaysMatch": capabilities } })),
            )
            .await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::Protocol("new session response lacks sessionId".into()))?
            .to_string();
        info!(%session_id, endpoint = %client.base, "webdriver: session started");
        client.session_id = Some(session_id);
        Ok(client)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn element_timeout(&self) -> Duration {
        self.element_timeout
    }

    pub async fn goto(&self, url: &str) -> Result<(), DriverError> {
        let path = self.session_path("url")?;
        self.command(Method::POST, &path, Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    pub async fn find(&self, locator: &Locator) -> Result<ElementRef, DriverError> {
        let path = self.session_path("element")?;
        let value = self
            .command(Method::POST, &path, Some(locator.to_body()))
            .await?;
        ElementRef::from_value(&value)
    }

    pub async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError> {
        let path = self.session_path("elements")?;
        let value = self
            .command(Method::POST, &path, Some(locator.to_body()))
            .await?;
        value
            .as_array()
            .ok_or_else(|| DriverError::Protocol(format!("expected element list, got {value}")))?
            .iter()
            .map(ElementRef::from_value)
            .collect()
    }

    /// Polls for `locator` until it appears or the element timeout elapses.
    pub async fn wait_for(&self, locator: &Locator) -> Result<ElementRef, DriverError> {
        self.find_before(locator, Instant::now() + self.element_timeout)
            .await
    }

    /// Like [`wait_for`](Self::wait_for) but also waits for the element to
    /// report itself enabled. Both waits share one element timeout.
    pub async fn wait_for_clickable(&self, locator: &Locator) -> Result<ElementRef, DriverError> {
        let deadline = Instant::now() + self.element_timeout;
        loop {
            let element = self.find_before(locator, deadline).await?;
            if self.is_enabled(&element).await? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout(format!(
                    "waiting for '{}' to become clickable",
                    locator.describe()
                )));
            }
            sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    async fn find_before(
        &self,
        locator: &Locator,
        deadline: Instant,
    ) -> Result<ElementRef, DriverError> {
        loop {
            match self.find(locator).await {
                Ok(element) => return Ok(element),
                Err(DriverError::ElementNotFound(_)) if Instant::now() < deadline => {
                    sleep(ELEMENT_POLL_INTERVAL).await;
                }
                Err(DriverError::ElementNotFound(_)) => {
                    return Err(DriverError::Timeout(format!(
                        "waiting for '{}'",
                        locator.describe()
                    )));
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        let path = self.element_path(element, "click")?;
        self.command(Method::POST, &path, Some(json!({}))).await?;
        Ok(())
    }

    pub async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        let path = self.element_path(element, "value")?;
        self.command(Method::POST, &path, Some(json!({ "text": text })))
            .await?;
        Ok(())
    }

    pub async fn text(&self, element: &ElementRef) -> Result<String, DriverError> {
        let path = self.element_path(element, "text")?;
        let value = self.command(Method::GET, &path, None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn is_enabled(&self, element: &ElementRef) -> Result<bool, DriverError> {
        let path = self.element_path(element, "enabled")?;
        let value = self.command(Method::GET, &path, None).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Ends the browser session. Later calls are no-ops.
    pub async fn quit(&mut self) -> Result<(), DriverError> {
        let Some(session_id) = self.session_id.take() else {
            return Ok(());
        };
        self.command(Method::DELETE, &format!("session/{session_id}"), None)
            .await?;
        info!(%session_id, "webdriver: session closed");
        Ok(())
    }

    fn session_path(&self, command: &str) -> Result<String, DriverError> {
        let session_id = self
            .session_id
            .as_deref()
            .ok_or_else(|| DriverError::Protocol("webdriver session already closed".into()))?;
        Ok(format!("session/{session_id}/{command}"))
    }

    fn element_path(&self, element: &ElementRef, command: &str) -> Result<String, DriverError> {
        self.session_path(&format!("element/{}/{command}", element.0))
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, DriverError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| DriverError::Protocol(format!("invalid command path '{path}': {e}")))?;
        debug!(%method, %url, "webdriver: command");

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let mut payload: Value = response.json().await?;
        let value = payload.get_mut("value").map(Value::take).unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(value);
        }

        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        warn!(%status, %error, "webdriver: command failed");
        Err(classify_error(&error, message))
    }
}

fn classify_error(error: &str, message: String) -> DriverError {
    match error {
        "no such element" | "stale element reference" => DriverError::ElementNotFound(message),
        "timeout" | "script timeout" => DriverError::Timeout(message),
        other => DriverError::Protocol(format!("{other}: {message}")),
    }
}

#[cfg(test)]
#[path = "tests/webdriver_tests.rs"]
mod tests;
