use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::info;

pub const PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification credentials are not configured")]
    MissingCredentials,
    #[error("notification service rejected the message ({status}): {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("notification transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str, title: &str) -> Result<(), NotifyError>;
}

/// Push notifications through the Pushover messages API.
#[derive(Debug, Clone)]
pub struct PushoverNotifier {
    http: Client,
    endpoint: String,
    token: Option<String>,
    user: Option<String>,
}

impl PushoverNotifier {
    pub fn new(token: Option<String>, user: Option<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: PUSHOVER_ENDPOINT.to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            user: user.filter(|u| !u.trim().is_empty()),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify(&self, message: &str, title: &str) -> Result<(), NotifyError> {
        let (Some(token), Some(user)) = (self.token.as_deref(), self.user.as_deref()) else {
            return Err(NotifyError::MissingCredentials);
        };

        let response = self
            .http
            .post(&self.endpoint)
            .form(&[
                ("token", token),
                ("user", user),
                ("message", message),
                ("title", title),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }
        info!(%title, "notification delivered");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/notify_tests.rs"]
mod tests;
