use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Facility-wide time of day against which every check-in is judged.
///
/// Only one value is in force at a time; records from earlier dates are
/// judged against the current value too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedStart(NaiveTime);

#[derive(Debug, Display, PartialEq, Eq)]
#[display(fmt = "Expected start must be a 24-hour HH:MM time, got {:?}", _0)]
pub struct ExpectedStartError(pub String);

impl std::error::Error for ExpectedStartError {}

impl ExpectedStart {
    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

impl FromStr for ExpectedStart {
    type Err = ExpectedStartError;

    /// Accepts `HH:MM`; a trailing `:SS` as returned by a TIME column is
    /// dropped.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let hh_mm = match trimmed.splitn(3, ':').collect::<Vec<_>>().as_slice() {
            [h, m] | [h, m, _] if h.len() == 2 && m.len() == 2 => format!("{}:{}", h, m),
            _ => return Err(ExpectedStartError(raw.to_string())),
        };

        NaiveTime::parse_from_str(&hh_mm, "%H:%M")
            .map(ExpectedStart)
            .map_err(|_| ExpectedStartError(raw.to_string()))
    }
}

impl fmt::Display for ExpectedStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// Row of the single-row `settings` table.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Settings {
    pub id: u64,
    pub enter: String,
}
