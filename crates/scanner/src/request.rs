//! Turns loosely-typed start requests into validated run plans.

use std::fmt;

use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use shared::{
    domain::CompletionPolicy,
    protocol::{ContinuousScanRequest, InstantGrabRequest},
    time::{TimeOfDay, TimeRange},
};

use crate::error::StartError;

pub const DEFAULT_NUM_PEOPLE: u8 = 2;
pub const MAX_NUM_PEOPLE: u8 = 4;
pub const DEFAULT_RESERVATION_TIME: &str = "7:57am";
pub const DEFAULT_WAIT_HOUR: u32 = 19;
pub const DEFAULT_WAIT_MINUTE: u32 = 0;
pub const DEFAULT_START_TIME: &str = "10:00am";
pub const DEFAULT_END_TIME: &str = "2:00pm";
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, StartError> {
        let username = username.map(|u| u.trim().to_string()).unwrap_or_default();
        let password = password.unwrap_or_default();
        if username.is_empty() || password.is_empty() {
            return Err(StartError::validation("Username and password are required"));
        }
        Ok(Self { username, password })
    }
}

#[derive(Debug, Clone)]
pub struct GrabPlan {
    pub credentials: Credentials,
    pub num_people: u8,
    pub target_date: NaiveDate,
    pub reservation_time: TimeOfDay,
    pub wait_until: DateTime<Tz>,
}

impl GrabPlan {
    /// `zone` is the course's local time zone; hour/minute release times are
    /// read in it and rolled to the next day once already past `now`.
    pub fn from_request(
        req: InstantGrabRequest,
        zone: Tz,
        now: DateTime<Utc>,
    ) -> Result<Self, StartError> {
        let credentials = Credentials::new(req.username, req.password)?;
        let num_people = num_people(req.num_people)?;
        let target_date = target_date(req.target_date.as_deref())?;
        let reservation_time = TimeOfDay::parse(
            req.reservation_time
                .as_deref()
                .unwrap_or(DEFAULT_RESERVATION_TIME),
        )?;

        let wait_until = match req.wait_until {
            Some(explicit) => explicit.with_timezone(&zone),
            None => next_release(
                zone,
                now,
                req.wait_hour.unwrap_or(DEFAULT_WAIT_HOUR),
                req.wait_minute.unwrap_or(DEFAULT_WAIT_MINUTE),
            )?,
        };

        Ok(Self {
            credentials,
            num_people,
            target_date,
            reservation_time,
            wait_until,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub credentials: Credentials,
    pub num_people: u8,
    pub target_date: NaiveDate,
    pub range: TimeRange,
    pub scan_interval_secs: u64,
    pub notifications: bool,
    pub policy: CompletionPolicy,
}

impl ScanPlan {
    pub fn from_request(req: ContinuousScanRequest) -> Result<Self, StartError> {
        let credentials = Credentials::new(req.username, req.password)?;
        let num_people = num_people(req.num_people)?;
        let target_date = target_date(req.target_date.as_deref())?;
        let range = TimeRange::parse(
            req.start_time.as_deref().unwrap_or(DEFAULT_START_TIME),
            req.end_time.as_deref().unwrap_or(DEFAULT_END_TIME),
        )?;
        if range.is_inverted() {
            return Err(StartError::validation(format!(
                "start_time {} is after end_time {}",
                range.start, range.end
            )));
        }

        let scan_interval_secs = req.scan_interval.unwrap_or(DEFAULT_SCAN_INTERVAL_SECS);
        if scan_interval_secs == 0 {
            return Err(StartError::validation("scan_interval must be positive"));
        }

        Ok(Self {
            credentials,
            num_people,
            target_date,
            range,
            scan_interval_secs,
            notifications: req.enable_notifications,
            policy: req.completion_policy,
        })
    }
}

fn num_people(raw: Option<u8>) -> Result<u8, StartError> {
    let num_people = raw.unwrap_or(DEFAULT_NUM_PEOPLE);
    if !(1..=MAX_NUM_PEOPLE).contains(&num_people) {
        return Err(StartError::validation(format!(
            "num_people must be between 1 and {MAX_NUM_PEOPLE}"
        )));
    }
    Ok(num_people)
}

fn target_date(raw: Option<&str>) -> Result<NaiveDate, StartError> {
    let raw = raw
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| StartError::validation("target_date is required"))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| StartError::validation(format!("target_date '{raw}' is not YYYY-MM-DD")))
}

/// The next `hour:minute` in `zone` at or after `now`.
pub fn next_release(
    zone: Tz,
    now: DateTime<Utc>,
    hour: u32,
    minute: u32,
) -> Result<DateTime<Tz>, StartError> {
    let clock = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
        StartError::validation(format!("release time {hour:02}:{minute:02} is not a valid time"))
    })?;

    let today = now.with_timezone(&zone).date_naive();
    for date in [Some(today), today.checked_add_days(Days::new(1))]
        .into_iter()
        .flatten()
    {
        let candidate = match zone.from_local_datetime(&date.and_time(clock)) {
            LocalResult::Single(at) => at,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => continue,
        };
        if candidate.with_timezone(&Utc) >= now {
            return Ok(candidate);
        }
    }

    Err(StartError::validation(format!(
        "release time {hour:02}:{minute:02} does not exist in {zone}"
    )))
}

#[cfg(test)]
#[path = "tests/request_tests.rs"]
mod tests;
