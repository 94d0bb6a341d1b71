use chrono::{DateTime, Datelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Calendar day of week, canonical across the crate. The stats tables,
/// deny-list, and volatility map are all keyed on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

pub const ALL_DAYS: [DayOfWeek; 7] = [
    DayOfWeek::Monday,
    DayOfWeek::Tuesday,
    DayOfWeek::Wednesday,
    DayOfWeek::Thursday,
    DayOfWeek::Friday,
    DayOfWeek::Saturday,
    DayOfWeek::Sunday,
];

impl DayOfWeek {
    /// Cyclic predecessor: Monday's previous day is Sunday.
    ///
    /// The stats tables answer "given yesterday's pattern, how does today
    /// move", so a decision taken on day D always reads the row for D-1.
    pub fn previous(&self) -> DayOfWeek {
        match self {
            DayOfWeek::Monday => DayOfWeek::Sunday,
            DayOfWeek::Tuesday => DayOfWeek::Monday,
            DayOfWeek::Wednesday => DayOfWeek::Tuesday,
            DayOfWeek::Thursday => DayOfWeek::Wednesday,
            DayOfWeek::Friday => DayOfWeek::Thursday,
            DayOfWeek::Saturday => DayOfWeek::Friday,
            DayOfWeek::Sunday => DayOfWeek::Saturday,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    /// The trading day for a given instant, in the exchange-local zone.
    pub fn from_instant(instant: DateTime<Utc>, tz: Tz) -> DayOfWeek {
        instant.with_timezone(&tz).weekday().into()
    }

    pub fn today_in(tz: Tz) -> DayOfWeek {
        Self::from_instant(Utc::now(), tz)
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(w: Weekday) -> Self {
        match w {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Monday" => Ok(DayOfWeek::Monday),
            "Tuesday" => Ok(DayOfWeek::Tuesday),
            "Wednesday" => Ok(DayOfWeek::Wednesday),
            "Thursday" => Ok(DayOfWeek::Thursday),
            "Friday" => Ok(DayOfWeek::Friday),
            "Saturday" => Ok(DayOfWeek::Saturday),
            "Sunday" => Ok(DayOfWeek::Sunday),
            other => Err(EngineError::InvalidArgument(format!(
                "unknown day of week: {other}"
            ))),
        }
    }
}
