//! Browser-side collaborator for the scanner: one [`SiteDriver`] per booking
//! site, opened fresh for every run through a [`DriverFactory`].

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::time::TimeOfDay;
use thiserror::Error;

pub mod foreup;
pub mod webdriver;

pub use foreup::{ForeUpDriver, ForeUpFactory};
pub use webdriver::{Locator, WebDriverClient};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("element not found: {0}")]
    ElementNotFound(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("webdriver transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webdriver protocol error: {0}")]
    Protocol(String),
}

/// Interaction with one reservation site. Implementations own the browser
/// session; `release` must be safe to call more than once.
#[async_trait]
pub trait SiteDriver: Send {
    async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), DriverError>;

    /// Opens the tee sheet and picks the party size.
    async fn start_reservation(&mut self, num_people: u8) -> Result<(), DriverError>;

    /// Returns `false` when the date cell could not be reached within the
    /// driver's retry budget.
    async fn select_date(&mut self, date: NaiveDate) -> Result<bool, DriverError>;

    async fn list_visible_slots(&mut self) -> Result<Vec<String>, DriverError>;

    /// Opens the booking dialog for `time`. Returns `false` when no such tile
    /// is on the sheet.
    async fn activate_slot(&mut self, time: TimeOfDay) -> Result<bool, DriverError>;

    async fn refresh(&mut self, date: NaiveDate) -> Result<(), DriverError>;

    async fn release(&mut self) -> Result<(), DriverError>;
}

#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn SiteDriver>, DriverError>;
}

#[cfg(test)]
#[path = "tests/mock_webdriver.rs"]
pub(crate) mod mock_webdriver;
