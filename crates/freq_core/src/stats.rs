use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{calendar::parse_date_key, mission::Mission};

/// Time-on-task rolled up over a trailing window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Seconds.
    pub total_time: u64,
    pub total_completions: usize,
    /// Seconds per logged day, 0 when nothing was logged.
    pub average_time_per_session: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    #[default]
    Week,
    Month,
    Year,
}

impl StatsPeriod {
    pub fn days(self) -> u64 {
        match self {
            StatsPeriod::Week => 7,
            StatsPeriod::Month => 30,
            StatsPeriod::Year => 365,
        }
    }

    /// First day of the window ending on `today`.
    pub fn window_start(self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(self.days() - 1))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for StatsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatsPeriod::Week => "week",
            StatsPeriod::Month => "month",
            StatsPeriod::Year => "year",
        };
        f.write_str(label)
    }
}

impl FromStr for StatsPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(StatsPeriod::Week),
            "month" => Ok(StatsPeriod::Month),
            "year" => Ok(StatsPeriod::Year),
            other => Err(format!("unknown stats period `{other}`")),
        }
    }
}

/// Sums logged durations for entries on or after `window_start`.
///
/// Keys that do not parse as dates are skipped.
pub fn session_stats(mission: &Mission, window_start: NaiveDate) -> SessionStats {
    let (total_time, total_completions) = mission
        .log
        .iter()
        .filter(|(key, _)| parse_date_key(key).is_ok_and(|date| date >= window_start))
        .fold((0u64, 0usize), |(time, count), (_, record)| {
            (time + record.duration_seconds, count + 1)
        });
    let average_time_per_session = if total_completions > 0 {
        total_time as f64 / total_completions as f64
    } else {
        0.0
    };
    SessionStats {
        total_time,
        total_completions,
        average_time_per_session,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{completion::CompletionRecord, mission::MissionType, recurrence::RecurrenceRule};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn timer_with(entries: &[(&str, u64)]) -> Mission {
        let mut mission = Mission::new("t", "Focus", MissionType::Timer, RecurrenceRule::every_day());
        for (key, seconds) in entries {
            mission.log = mission
                .log
                .record(*key, CompletionRecord::new(100).with_duration(*seconds));
        }
        mission
    }

    #[test]
    fn sums_and_averages_durations_in_window() {
        let mission = timer_with(&[("2024-03-01", 5000), ("2024-03-10", 600), ("2024-03-12", 1200)]);
        let stats = session_stats(&mission, ymd(2024, 3, 10));
        assert_eq!(stats.total_time, 1800);
        assert_eq!(stats.total_completions, 2);
        assert_eq!(stats.average_time_per_session, 900.0);
    }

    #[test]
    fn empty_window_is_all_zero() {
        let mission = timer_with(&[("2024-03-01", 600)]);
        assert_eq!(session_stats(&mission, ymd(2024, 4, 1)), SessionStats::default());
    }

    #[test]
    fn unparseable_keys_are_skipped() {
        let mission = timer_with(&[("garbage", 600), ("2024-03-10", 60)]);
        let stats = session_stats(&mission, ymd(2000, 1, 1));
        assert_eq!(stats.total_completions, 1);
        assert_eq!(stats.total_time, 60);
    }

    #[test]
    fn week_window_covers_seven_days() {
        let today = ymd(2024, 3, 10);
        assert_eq!(StatsPeriod::Week.window_start(today), ymd(2024, 3, 4));
        assert_eq!(StatsPeriod::Month.window_start(today), ymd(2024, 2, 10));
        assert_eq!("YEAR".parse::<StatsPeriod>(), Ok(StatsPeriod::Year));
        assert!("decade".parse::<StatsPeriod>().is_err());
    }
}
