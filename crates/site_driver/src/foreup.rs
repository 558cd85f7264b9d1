//! ForeUp tee sheet driver. The two supported courses share the page layout
//! and differ in booking URL and in the label of the reservation class button.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde_json::{json, Value};
use shared::{domain::Venue, time::TimeOfDay};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    webdriver::{Locator, WebDriverClient},
    DriverError, DriverFactory, SiteDriver,
};

const MONTH_ATTEMPTS: usize = 12;

pub(crate) const LOGIN_EMAIL: &str = "#login_email";
pub(crate) const LOGIN_PASSWORD: &str = "#login_password";
pub(crate) const LOGIN_SUBMIT: &str = "#submit_button";
pub(crate) const MONTH_HEADER: &str = "//th[@class='datepicker-switch']";
pub(crate) const NEXT_MONTH: &str = "//th[@class='next']";
pub(crate) const SLOT_LABELS: &str = "//div[contains(@class, 'booking-start-time-label')]";

pub fn booking_url(venue: Venue) -> &'static str {
    match venue {
        Venue::Mission => "https://foreupsoftware.com/index.php/booking/19346/1469#/teetimes",
        Venue::Torrey => "https://foreupsoftware.com/index.php/booking/19347/1468#/teetimes",
    }
}

fn reservation_class_label(venue: Venue) -> &'static str {
    match venue {
        Venue::Mission => "STANDARD TEE TIMES",
        Venue::Torrey => "Resident (0 - 7 Days)",
    }
}

pub(crate) fn reservation_class_xpath(venue: Venue) -> String {
    format!(
        "//button[contains(text(), '{}')]",
        reservation_class_label(venue)
    )
}

pub(crate) fn players_xpath(num_people: u8) -> String {
    format!("//a[@class='btn btn-primary' and @data-value='{num_people}']")
}

pub(crate) fn day_cell_xpath(day: u32) -> String {
    format!(
        "//td[contains(@class, 'day') and not(contains(@class, 'disabled')) \
         and not(contains(@class, 'old')) and not(contains(@class, 'new')) \
         and normalize-space(text())='{day}']"
    )
}

pub(crate) fn slot_tile_xpath(time: TimeOfDay) -> String {
    format!("//div[contains(@class, 'booking-start-time-label') and text()='{time}']")
}

pub struct ForeUpDriver {
    client: WebDriverClient,
    venue: Venue,
    settle: Duration,
}

impl ForeUpDriver {
    /// `settle` is the pause given to the page after each interaction.
    pub fn new(client: WebDriverClient, venue: Venue, settle: Duration) -> Self {
        Self {
            client,
            venue,
            settle,
        }
    }

    async fn settle(&self) {
        if !self.settle.is_zero() {
            sleep(self.settle).await;
        }
    }

    async fn click_next_month(&self) -> Result<bool, DriverError> {
        match self.client.find(&Locator::xpath(NEXT_MONTH)).await {
            Ok(next) => {
                self.client.click(&next).await?;
                sleep(self.settle / 2).await;
                Ok(true)
            }
            Err(DriverError::ElementNotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl SiteDriver for ForeUpDriver {
    async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), DriverError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(DriverError::Auth("username and password are required".into()));
        }

        self.client.goto(booking_url(self.venue)).await?;
        let email = self
            .client
            .wait_for(&Locator::css(LOGIN_EMAIL))
            .await
            .map_err(|e| DriverError::Auth(format!("login form did not load: {e}")))?;
        let secret = self.client.find(&Locator::css(LOGIN_PASSWORD)).await?;
        self.settle().await;

        self.client.send_keys(&email, username).await?;
        self.client.send_keys(&secret, password).await?;
        self.settle().await;

        let submit = self
            .client
            .wait_for_clickable(&Locator::css(LOGIN_SUBMIT))
            .await?;
        self.client.click(&submit).await?;
        self.settle().await;
        info!(venue = %self.venue, "foreup: credentials submitted");
        Ok(())
    }

    async fn start_reservation(&mut self, num_people: u8) -> Result<(), DriverError> {
        self.client.goto(booking_url(self.venue)).await?;
        self.settle().await;

        let class_button = self
            .client
            .wait_for_clickable(&Locator::xpath(reservation_class_xpath(self.venue)))
            .await?;
        self.client.click(&class_button).await?;
        self.settle().await;

        let players = self
            .client
            .wait_for_clickable(&Locator::xpath(players_xpath(num_people)))
            .await?;
        self.client.click(&players).await?;
        self.settle().await;
        info!(venue = %self.venue, num_people, "foreup: reservation started");
        Ok(())
    }

    async fn select_date(&mut self, date: NaiveDate) -> Result<bool, DriverError> {
        let wanted_month = date.format("%B %Y").to_string();
        let day_cell = Locator::xpath(day_cell_xpath(date.day()));

        for _ in 0..MONTH_ATTEMPTS {
            let header = match self.client.find(&Locator::xpath(MONTH_HEADER)).await {
                Ok(element) => self.client.text(&element).await?,
                Err(DriverError::ElementNotFound(msg)) => {
                    warn!(%msg, "foreup: calendar header missing");
                    break;
                }
                Err(err) => return Err(err),
            };
            let header = header.trim();
            debug!(current = header, wanted = %wanted_month, "foreup: calendar month");

            if header != wanted_month {
                if !self.click_next_month().await? {
                    break;
                }
                continue;
            }

            match self.client.wait_for_clickable(&day_cell).await {
                Ok(cell) => {
                    self.client.click(&cell).await?;
                    sleep(self.settle * 2).await;
                    return Ok(true);
                }
                Err(DriverError::Timeout(msg)) => {
                    warn!(%msg, %date, "foreup: day cell not clickable");
                    if !self.click_next_month().await? {
                        break;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        warn!(%date, "foreup: date not reachable on calendar");
        Ok(false)
    }

    async fn list_visible_slots(&mut self) -> Result<Vec<String>, DriverError> {
        self.settle().await;
        let labels = self.client.find_all(&Locator::xpath(SLOT_LABELS)).await?;
        let mut slots = Vec::with_capacity(labels.len());
        for label in &labels {
            let text = self.client.text(label).await?;
            let text = text.trim();
            if !text.is_empty() {
                slots.push(text.to_string());
            }
        }
        Ok(slots)
    }

    async fn activate_slot(&mut self, time: TimeOfDay) -> Result<bool, DriverError> {
        let tile = match self
            .client
            .wait_for_clickable(&Locator::xpath(slot_tile_xpath(time)))
            .await
        {
            Ok(tile) => tile,
            Err(DriverError::Timeout(_)) | Err(DriverError::ElementNotFound(_)) => {
                warn!(%time, "foreup: tee time tile not on sheet");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };
        self.client.click(&tile).await?;
        self.settle().await;
        info!(%time, "foreup: booking dialog opened");
        Ok(true)
    }

    async fn refresh(&mut self, date: NaiveDate) -> Result<(), DriverError> {
        if !self.select_date(date).await? {
            warn!(%date, "foreup: refresh could not reselect date");
        }
        Ok(())
    }

    async fn release(&mut self) -> Result<(), DriverError> {
        self.client.quit().await
    }
}

/// Opens a Chrome session through a chromedriver-compatible endpoint.
#[derive(Debug, Clone)]
pub struct ForeUpFactory {
    pub webdriver_url: Url,
    pub venue: Venue,
    pub element_timeout: Duration,
    pub settle: Duration,
    pub headless: bool,
}

impl ForeUpFactory {
    fn capabilities(&self) -> Value {
        let mut args = vec!["--window-size=1280,1024"];
        if self.headless {
            args.push("--headless=new");
        }
        json!({
            "browserName": "chrome",
            "goog:chromeOptions": { "args": args },
        })
    }
}

#[async_trait]
impl DriverFactory for ForeUpFactory {
    async fn open(&self) -> Result<Box<dyn SiteDriver>, DriverError> {
        let client = WebDriverClient::connect(
            self.webdriver_url.clone(),
            self.capabilities(),
            self.element_timeout,
        )
        .await?;
        Ok(Box::new(ForeUpDriver::new(client, self.venue, self.settle)))
    }
}

#[cfg(test)]
#[path = "tests/foreup_tests.rs"]
mod tests;
