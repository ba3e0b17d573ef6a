use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    calendar::{date_key, enumerate_days, CalendarError},
    completion::rounded_percent,
    mission::Mission,
    recurrence::is_due,
};

/// How a single day relates to the plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DayOutcome {
    /// Due and done.
    Hit,
    /// Due and not done.
    Miss,
    /// Neither due nor done.
    Rest,
    /// Done on a day that was not due.
    Extra,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub hits: u32,
    pub misses: u32,
    pub rest: u32,
    pub extra: u32,
    /// Rounded hit rate over due days, e.g. `"70%"`.
    pub accuracy: String,
}

impl ConsistencyReport {
    pub fn total_days(&self) -> u32 {
        self.hits + self.misses + self.rest + self.extra
    }

    pub fn planned_days(&self) -> u32 {
        self.hits + self.misses
    }

    /// The accuracy as a whole percentage.
    pub fn accuracy_percent(&self) -> u32 {
        accuracy_percent(self.hits, self.misses)
    }

    fn tally(&mut self, outcome: DayOutcome) {
        match outcome {
            DayOutcome::Hit => self.hits += 1,
            DayOutcome::Miss => self.misses += 1,
            DayOutcome::Rest => self.rest += 1,
            DayOutcome::Extra => self.extra += 1,
        }
    }
}

pub fn classify_day(mission: &Mission, date: NaiveDate) -> DayOutcome {
    let due = is_due(&mission.rule, date);
    let done = mission.log.has_completion(&date_key(date));
    match (due, done) {
        (true, true) => DayOutcome::Hit,
        (true, false) => DayOutcome::Miss,
        (false, false) => DayOutcome::Rest,
        (false, true) => DayOutcome::Extra,
    }
}

/// Classifies every day of `[start, end]` and tallies the outcomes.
pub fn consistency_report(
    mission: &Mission,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<ConsistencyReport, CalendarError> {
    let mut report = ConsistencyReport::default();
    for day in enumerate_days(start, end)? {
        report.tally(classify_day(mission, day));
    }
    report.accuracy = format!("{}%", report.accuracy_percent());
    Ok(report)
}

fn accuracy_percent(hits: u32, misses: u32) -> u32 {
    let planned = u64::from(hits) + u64::from(misses);
    if planned == 0 {
        return 0;
    }
    rounded_percent(u64::from(hits), planned) as u32
}
