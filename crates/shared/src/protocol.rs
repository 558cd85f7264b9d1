use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{domain::CompletionPolicy, time::TimeOfDay};

/// Body of `POST /api/instant-grab`. Fields stay optional so that missing
/// values surface as validation errors instead of body rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstantGrabRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub num_people: Option<u8>,
    pub target_date: Option<String>,
    pub reservation_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_until: Option<DateTime<FixedOffset>>,
    pub wait_hour: Option<u32>,
    pub wait_minute: Option<u32>,
}

/// Body of `POST /api/continuous-scan`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuousScanRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub num_people: Option<u8>,
    pub target_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub scan_interval: Option<u64>,
    pub enable_notifications: bool,
    pub completion_policy: CompletionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstantGrabStarted {
    pub message: String,
    pub wait_until: DateTime<FixedOffset>,
    pub target_date: String,
    pub reservation_time: TimeOfDay,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousScanStarted {
    pub message: String,
    pub target_date: String,
    pub time_range: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub is_running: bool,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimesResponse {
    pub times: Vec<TimeOfDay>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
