//! Scripted collaborators shared by the controller and manager tests.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use shared::time::TimeOfDay;
use site_driver::{DriverError, DriverFactory, SiteDriver};

use crate::{
    cancel::CancelFlag,
    controller::Timing,
    notify::{Notifier, NotifyError},
};

pub fn fast_timing() -> Timing {
    Timing {
        release_poll: Duration::from_millis(1),
        tick: Duration::from_millis(5),
    }
}

#[derive(Debug, Default)]
pub struct DriverLog {
    pub calls: Vec<String>,
    pub releases: usize,
    pub scans: usize,
}

pub type SharedLog = Arc<Mutex<DriverLog>>;

pub struct FakeDriver {
    log: SharedLog,
    scans: VecDeque<Vec<String>>,
    last_scan: Vec<String>,
    pub select_ok: bool,
    pub fail_auth: bool,
    pub activate_ok: bool,
    pub fail_scan: bool,
    cancel_after: Option<(usize, CancelFlag)>,
}

impl FakeDriver {
    pub fn new(log: SharedLog) -> Self {
        Self {
            log,
            scans: VecDeque::new(),
            last_scan: Vec::new(),
            select_ok: true,
            fail_auth: false,
            activate_ok: true,
            fail_scan: false,
            cancel_after: None,
        }
    }

    /// Each scan pops the next entry; the final entry repeats afterwards.
    pub fn with_scans(mut self, scans: &[&[&str]]) -> Self {
        self.scans = scans
            .iter()
            .map(|scan| scan.iter().map(|s| s.to_string()).collect())
            .collect();
        self
    }

    /// Trips `cancel` right after the `n`th slot listing.
    pub fn cancel_after(mut self, n: usize, cancel: CancelFlag) -> Self {
        self.cancel_after = Some((n, cancel));
        self
    }

    fn record(&self, call: impl Into<String>) {
        self.log.lock().calls.push(call.into());
    }
}

#[async_trait]
impl SiteDriver for FakeDriver {
    async fn authenticate(&mut self, username: &str, _password: &str) -> Result<(), DriverError> {
        self.record(format!("authenticate {username}"));
        if self.fail_auth {
            return Err(DriverError::Auth("login form did not load".into()));
        }
        Ok(())
    }

    async fn start_reservation(&mut self, num_people: u8) -> Result<(), DriverError> {
        self.record(format!("start_reservation {num_people}"));
        Ok(())
    }

    async fn select_date(&mut self, date: NaiveDate) -> Result<bool, DriverError> {
        self.record(format!("select_date {date}"));
        Ok(self.select_ok)
    }

    async fn list_visible_slots(&mut self) -> Result<Vec<String>, DriverError> {
        let scans = {
            let mut log = self.log.lock();
            log.calls.push("list_visible_slots".into());
            log.scans += 1;
            log.scans
        };
        if let Some((n, cancel)) = &self.cancel_after {
            if scans >= *n {
                cancel.cancel();
            }
        }
        if self.fail_scan {
            return Err(DriverError::Timeout("tee sheet did not render".into()));
        }
        if let Some(next) = self.scans.pop_front() {
            self.last_scan = next;
        }
        Ok(self.last_scan.clone())
    }

    async fn activate_slot(&mut self, time: TimeOfDay) -> Result<bool, DriverError> {
        self.record(format!("activate_slot {time}"));
        Ok(self.activate_ok)
    }

    async fn refresh(&mut self, date: NaiveDate) -> Result<(), DriverError> {
        self.record(format!("refresh {date}"));
        Ok(())
    }

    async fn release(&mut self) -> Result<(), DriverError> {
        let mut log = self.log.lock();
        log.calls.push("release".into());
        log.releases += 1;
        Ok(())
    }
}

/// Hands out one prepared driver per `open`, or fails when none is left.
pub struct FakeFactory {
    drivers: Mutex<VecDeque<FakeDriver>>,
}

impl FakeFactory {
    pub fn new(drivers: Vec<FakeDriver>) -> Self {
        Self {
            drivers: Mutex::new(drivers.into()),
        }
    }
}

#[async_trait]
impl DriverFactory for FakeFactory {
    async fn open(&self) -> Result<Box<dyn SiteDriver>, DriverError> {
        let driver = self
            .drivers
            .lock()
            .pop_front()
            .ok_or_else(|| DriverError::Protocol("session not created: chrome unreachable".into()))?;
        Ok(Box::new(driver))
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(m, _)| m.clone()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str, title: &str) -> Result<(), NotifyError> {
        self.sent.lock().push((message.to_string(), title.to_string()));
        if self.fail {
            return Err(NotifyError::MissingCredentials);
        }
        Ok(())
    }
}
