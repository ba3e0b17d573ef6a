use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format used for every date key in the engine.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("invalid range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("`{0}` is not a yyyy-MM-dd date key")]
    InvalidDateKey(String),
}

/// Weekday tokens as stored in weekly rules. Index 0 is Sunday.
///
/// Parsing is exact: `"Mon"` is not a token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WeekdaySymbol {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl WeekdaySymbol {
    pub const ALL: [WeekdaySymbol; 7] = [
        WeekdaySymbol::Sun,
        WeekdaySymbol::Mon,
        WeekdaySymbol::Tue,
        WeekdaySymbol::Wed,
        WeekdaySymbol::Thu,
        WeekdaySymbol::Fri,
        WeekdaySymbol::Sat,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn token(self) -> &'static str {
        match self {
            WeekdaySymbol::Sun => "sun",
            WeekdaySymbol::Mon => "mon",
            WeekdaySymbol::Tue => "tue",
            WeekdaySymbol::Wed => "wed",
            WeekdaySymbol::Thu => "thu",
            WeekdaySymbol::Fri => "fri",
            WeekdaySymbol::Sat => "sat",
        }
    }
}

impl From<Weekday> for WeekdaySymbol {
    fn from(weekday: Weekday) -> Self {
        Self::ALL[weekday.num_days_from_sunday() as usize]
    }
}

impl fmt::Display for WeekdaySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for WeekdaySymbol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|symbol| symbol.token() == s)
            .ok_or(())
    }
}

/// Canonical `yyyy-MM-dd` key for a calendar day.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(key.trim(), DATE_KEY_FORMAT)
        .map_err(|_| CalendarError::InvalidDateKey(key.to_string()))
}

pub fn weekday_of(date: NaiveDate) -> WeekdaySymbol {
    date.weekday().into()
}

pub fn day_of_month(date: NaiveDate) -> u32 {
    date.day()
}

/// The current calendar day on the local clock.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Every day from `start` to `end`, both inclusive, ascending.
pub fn enumerate_days(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, CalendarError> {
    if start > end {
        return Err(CalendarError::InvalidRange { start, end });
    }
    Ok(start.iter_days().take_while(|day| *day <= end).collect())
}

/// The `span` days ending on `end`, ascending.
pub fn trailing_days(end: NaiveDate, span: u32) -> Vec<NaiveDate> {
    if span == 0 {
        return Vec::new();
    }
    let start = end
        .checked_sub_days(Days::new(u64::from(span - 1)))
        .unwrap_or(NaiveDate::MIN);
    start.iter_days().take_while(|day| *day <= end).collect()
}
