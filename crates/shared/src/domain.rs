use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// ForeUp booking page a driver works against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    #[default]
    Mission,
    Torrey,
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::Mission => f.write_str("mission"),
            Venue::Torrey => f.write_str("torrey"),
        }
    }
}

impl FromStr for Venue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mission" => Ok(Venue::Mission),
            "torrey" => Ok(Venue::Torrey),
            other => Err(format!("unknown venue '{other}'")),
        }
    }
}

/// What a continuous scan does once it sees a wanted slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    #[default]
    NotifyOnly,
    AutoBookFirstMatch,
}
