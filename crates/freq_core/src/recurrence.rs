use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calendar::{date_key, day_of_month, weekday_of, WeekdaySymbol};

/// Which calendar dates a mission is due on.
///
/// Stored as `{ "type": "weekly" | "monthly" | "once", "days": [...] }`.
/// Loading never fails on odd data and saving writes odd data back untouched:
/// unknown kinds become [`RecurrenceRule::Unrecognized`] with their raw selector,
/// and selector entries of the wrong shape ride along in [`Selector::retained`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredFrequency", into = "StoredFrequency")]
pub enum RecurrenceRule {
    Weekly(Selector<WeekdaySymbol>),
    /// Days of the month, 1..=31. A day missing from a short month never fires there.
    Monthly(Selector<u32>),
    /// A single canonical `yyyy-MM-dd` key.
    Once(String),
    Unrecognized { kind: String, days: Vec<Value> },
}

/// Selector set of a weekly or monthly rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector<T: Ord> {
    days: BTreeSet<T>,
    retained: Vec<Value>,
}

impl<T: Ord> Selector<T> {
    pub fn contains(&self, day: &T) -> bool {
        self.days.contains(day)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.days.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Stored entries that could not be read as a selector value.
    pub fn retained(&self) -> &[Value] {
        &self.retained
    }
}

impl<T: Ord> Default for Selector<T> {
    fn default() -> Self {
        Self {
            days: BTreeSet::new(),
            retained: Vec::new(),
        }
    }
}

impl<T: Ord> FromIterator<T> for Selector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
            retained: Vec::new(),
        }
    }
}

impl RecurrenceRule {
    pub fn weekly(days: impl IntoIterator<Item = WeekdaySymbol>) -> Self {
        Self::Weekly(days.into_iter().collect())
    }

    pub fn every_day() -> Self {
        Self::weekly(WeekdaySymbol::ALL)
    }

    pub fn monthly(days: impl IntoIterator<Item = u32>) -> Self {
        Self::Monthly(days.into_iter().filter(|day| (1..=31).contains(day)).collect())
    }

    pub fn once(date: NaiveDate) -> Self {
        Self::Once(date_key(date))
    }

    pub fn kind(&self) -> &str {
        match self {
            RecurrenceRule::Weekly(_) => "weekly",
            RecurrenceRule::Monthly(_) => "monthly",
            RecurrenceRule::Once(_) => "once",
            RecurrenceRule::Unrecognized { kind, .. } => kind,
        }
    }
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self::Weekly(Selector::default())
    }
}

/// Whether `rule` schedules the mission on `date`.
pub fn is_due(rule: &RecurrenceRule, date: NaiveDate) -> bool {
    match rule {
        RecurrenceRule::Weekly(days) => days.contains(&weekday_of(date)),
        RecurrenceRule::Monthly(days) => days.contains(&day_of_month(date)),
        // Compared on the key so stored strings never go through date parsing.
        RecurrenceRule::Once(key) => *key == date_key(date),
        RecurrenceRule::Unrecognized { kind, .. } => {
            tracing::debug!(%kind, "unrecognized recurrence rule is never due");
            false
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredFrequency {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    days: Vec<Value>,
}

fn split_selector<T: Ord>(days: Vec<Value>, read: impl Fn(&Value) -> Option<T>) -> Selector<T> {
    let mut selector = Selector::default();
    for value in days {
        match read(&value) {
            Some(day) => {
                selector.days.insert(day);
            }
            None => selector.retained.push(value),
        }
    }
    selector
}

impl From<StoredFrequency> for RecurrenceRule {
    fn from(stored: StoredFrequency) -> Self {
        let StoredFrequency { kind, days } = stored;
        match kind.as_str() {
            "weekly" => RecurrenceRule::Weekly(split_selector(days, |value| {
                value.as_str().and_then(|token| token.parse().ok())
            })),
            "monthly" => RecurrenceRule::Monthly(split_selector(days, |value| {
                value
                    .as_u64()
                    .filter(|day| (1..=31).contains(day))
                    .map(|day| day as u32)
            })),
            "once" => match days.as_slice() {
                [Value::String(key)] => RecurrenceRule::Once(key.clone()),
                _ => RecurrenceRule::Unrecognized { kind, days },
            },
            _ => RecurrenceRule::Unrecognized { kind, days },
        }
    }
}

impl From<RecurrenceRule> for StoredFrequency {
    fn from(rule: RecurrenceRule) -> Self {
        let kind = rule.kind().to_string();
        let days = match rule {
            RecurrenceRule::Weekly(selector) => selector
                .days
                .into_iter()
                .map(|day| Value::from(day.token()))
                .chain(selector.retained)
                .collect(),
            RecurrenceRule::Monthly(selector) => selector
                .days
                .into_iter()
                .map(Value::from)
                .chain(selector.retained)
                .collect(),
            RecurrenceRule::Once(key) => vec![Value::from(key)],
            RecurrenceRule::Unrecognized { days, .. } => days,
        };
        StoredFrequency { kind, days }
    }
}
