//! The two run protocols.
//!
//! *Instant grab* waits for the release instant with a tight poll, then opens
//! the booking dialog for one tee time and keeps the browser up so a person
//! can finish checkout. *Continuous scan* re-reads the tee sheet every
//! `scan_interval` seconds and reports (or books) tee times inside a window.
//!
//! Both check the [`CancelFlag`] at every sleep and always release the
//! driver on the way out, whatever the reason for leaving.

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use chrono::{NaiveDate, Utc};
use shared::{
    domain::CompletionPolicy,
    time::{filter_in_range, TimeOfDay},
};
use site_driver::{DriverError, SiteDriver};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::{
    cancel::CancelFlag,
    notify::Notifier,
    request::{Credentials, GrabPlan, ScanPlan},
    status::StatusChannel,
};

const NOTIFICATION_TITLE: &str = "Tee time available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Poll period while waiting for the release instant.
    pub release_poll: Duration,
    /// Granularity of every other wait, and so the worst-case stop latency.
    pub tick: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            release_poll: Duration::from_millis(1),
            tick: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabPhase {
    AwaitingRelease,
    Triggered,
    HoldingOpen,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Ended by a stop request or by running out of work.
    Stopped,
    Failed(String),
}

pub struct ScanSession {
    driver: Box<dyn SiteDriver>,
    status: Arc<StatusChannel>,
    cancel: CancelFlag,
    notifier: Option<Arc<dyn Notifier>>,
    notified: BTreeSet<TimeOfDay>,
    timing: Timing,
}

impl ScanSession {
    pub fn new(
        driver: Box<dyn SiteDriver>,
        status: Arc<StatusChannel>,
        cancel: CancelFlag,
        timing: Timing,
    ) -> Self {
        Self {
            driver,
            status,
            cancel,
            notifier: None,
            notified: BTreeSet::new(),
            timing,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn run_instant_grab(mut self, plan: GrabPlan) -> RunOutcome {
        let result = self.instant_grab(&plan).await;
        self.finish(result).await
    }

    pub async fn run_continuous_scan(mut self, plan: ScanPlan) -> RunOutcome {
        let result = self.continuous_scan(&plan).await;
        self.finish(result).await
    }

    async fn finish(mut self, result: Result<(), DriverError>) -> RunOutcome {
        let outcome = match result {
            Ok(()) => RunOutcome::Stopped,
            Err(err) => {
                error!(%err, "run failed");
                self.status.publish(format!("Error: {err}"));
                RunOutcome::Failed(err.to_string())
            }
        };

        if let Err(err) = self.driver.release().await {
            warn!(%err, "failed to close browser session");
        }
        self.status.publish("Browser closed.");
        outcome
    }

    async fn prepare(&mut self, credentials: &Credentials, num_people: u8) -> Result<(), DriverError> {
        self.status.publish("Logging in...");
        self.driver
            .authenticate(&credentials.username, &credentials.password)
            .await?;
        self.status.publish("Logged in successfully!");

        self.status
            .publish(format!("Starting new reservation for {num_people} player(s)..."));
        self.driver.start_reservation(num_people).await
    }

    async fn select_date(&mut self, date: NaiveDate) -> Result<bool, DriverError> {
        self.status.publish(format!("Selecting date: {date}..."));
        let selected = self.driver.select_date(date).await?;
        if selected {
            self.status.publish(format!("Selected date: {date}"));
        } else {
            self.status.publish(format!("Could not find date: {date}"));
        }
        Ok(selected)
    }

    async fn instant_grab(&mut self, plan: &GrabPlan) -> Result<(), DriverError> {
        self.prepare(&plan.credentials, plan.num_people).await?;
        if self.cancel.is_cancelled() {
            return Ok(());
        }

        let release_at = plan.wait_until.with_timezone(&Utc);
        self.status.publish(format!(
            "Waiting for release time: {}...",
            plan.wait_until.format("%H:%M:%S %Z")
        ));

        let mut phase = GrabPhase::AwaitingRelease;
        loop {
            let next = match phase {
                GrabPhase::AwaitingRelease => {
                    if self.cancel.is_cancelled() {
                        GrabPhase::Stopped
                    } else if Utc::now() >= release_at {
                        self.status.publish("Release time reached! Selecting date...");
                        GrabPhase::Triggered
                    } else {
                        sleep(self.timing.release_poll).await;
                        GrabPhase::AwaitingRelease
                    }
                }
                GrabPhase::Triggered => {
                    self.open_booking(plan).await;
                    GrabPhase::HoldingOpen
                }
                GrabPhase::HoldingOpen => {
                    if self.cancel.is_cancelled() {
                        GrabPhase::Stopped
                    } else {
                        sleep(self.timing.tick).await;
                        GrabPhase::HoldingOpen
                    }
                }
                GrabPhase::Stopped => return Ok(()),
            };
            if next != phase {
                debug!(from = ?phase, to = ?next, "instant grab phase");
            }
            phase = next;
        }
    }

    /// One attempt at the booking dialog. Failures only produce status lines.
    async fn open_booking(&mut self, plan: &GrabPlan) {
        if let Err(err) = self.select_date(plan.target_date).await {
            self.status.publish(format!("Date selection failed: {err}"));
        }

        let time = plan.reservation_time;
        self.status.publish(format!("Clicking time tile: {time}..."));
        match self.driver.activate_slot(time).await {
            Ok(true) => {
                self.status
                    .publish("*** BOOKING MODAL OPEN - Complete the booking manually! ***");
            }
            Ok(false) => self
                .status
                .publish(format!("Tee time {time} is not on the sheet")),
            Err(err) => self
                .status
                .publish(format!("Could not open tee time {time}: {err}")),
        }
    }

    async fn continuous_scan(&mut self, plan: &ScanPlan) -> Result<(), DriverError> {
        self.prepare(&plan.credentials, plan.num_people).await?;
        if self.cancel.is_cancelled() {
            self.status.publish("Scan stopped.");
            return Ok(());
        }

        if !self.select_date(plan.target_date).await? {
            self.status.publish("Failed to select date. Stopping.");
            return Ok(());
        }

        let mut scan_count: u64 = 0;
        let mut booked = false;
        while !self.cancel.is_cancelled() {
            scan_count += 1;
            self.status.publish(format!(
                "Scan #{scan_count}: Looking for times between {} and {}...",
                plan.range.start, plan.range.end
            ));

            let visible = match self.driver.list_visible_slots().await {
                Ok(visible) => visible,
                Err(err) => {
                    self.status.publish(format!("Error getting times: {err}"));
                    Vec::new()
                }
            };
            let matching = filter_in_range(&visible, &plan.range);

            if matching.is_empty() {
                self.status.publish(format!(
                    "No times available in range. Next scan in {}s...",
                    plan.scan_interval_secs
                ));
            } else {
                self.status.publish(format!(
                    "*** FOUND AVAILABLE TIMES: {} ***",
                    matching.join(", ")
                ));
                if plan.notifications {
                    self.notify_new(plan.target_date, &matching).await;
                }
                if plan.policy == CompletionPolicy::AutoBookFirstMatch
                    && self.book_first(&matching).await?
                {
                    booked = true;
                    break;
                }
            }

            sleep_with_cancel(&self.cancel, self.timing.tick, plan.scan_interval_secs).await;

            if !self.cancel.is_cancelled() {
                self.status.publish("Refreshing tee times...");
                self.driver.refresh(plan.target_date).await?;
            }
        }

        if booked {
            self.status.publish("*** COMPLETE THE BOOKING MANUALLY NOW! ***");
            while !self.cancel.is_cancelled() {
                sleep(self.timing.tick).await;
            }
        }

        info!(scans = scan_count, booked, "continuous scan finished");
        self.status.publish("Scan stopped.");
        Ok(())
    }

    async fn book_first(&mut self, matching: &[String]) -> Result<bool, DriverError> {
        let Some(first) = matching.iter().find_map(|label| TimeOfDay::parse(label).ok()) else {
            return Ok(false);
        };
        self.status.publish(format!("Clicking time tile: {first}..."));
        if self.driver.activate_slot(first).await? {
            self.status
                .publish("*** BOOKING MODAL OPEN - Complete the booking manually! ***");
            Ok(true)
        } else {
            self.status
                .publish(format!("Tee time {first} was taken; continuing scan"));
            Ok(false)
        }
    }

    /// Sends one notification covering every match not reported earlier in
    /// this session.
    async fn notify_new(&mut self, date: NaiveDate, matching: &[String]) {
        let mut fresh: Vec<TimeOfDay> = Vec::new();
        for time in matching.iter().filter_map(|label| TimeOfDay::parse(label).ok()) {
            if !self.notified.contains(&time) && !fresh.contains(&time) {
                fresh.push(time);
            }
        }
        if fresh.is_empty() {
            return;
        }

        let listed = fresh
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let message = format!("Tee times open on {date}: {listed}");

        let Some(notifier) = &self.notifier else {
            debug!(%listed, "notifications not configured; skipping");
            return;
        };
        match notifier.notify(&message, NOTIFICATION_TITLE).await {
            Ok(()) => {
                self.notified.extend(fresh);
                self.status.publish(format!("Notification sent for {listed}"));
            }
            Err(err) => {
                warn!(%err, "notification failed");
                self.status.publish(format!("Notification failed: {err}"));
            }
        }
    }
}

async fn sleep_with_cancel(cancel: &CancelFlag, tick: Duration, ticks: u64) {
    for _ in 0..ticks {
        if cancel.is_cancelled() {
            break;
        }
        sleep(tick).await;
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
