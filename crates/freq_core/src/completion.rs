use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One day's outcome for one mission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    /// 0..=100, where 100 means fully done.
    pub intensity: u8,
    #[serde(rename = "duration", default)]
    pub duration_seconds: u64,
    #[serde(
        rename = "completedItems",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_item_ids: Option<BTreeSet<String>>,
}

impl CompletionRecord {
    pub fn new(intensity: u8) -> Self {
        Self {
            intensity: intensity.min(100),
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn with_items(mut self, item_ids: BTreeSet<String>) -> Self {
        self.completed_item_ids = Some(item_ids);
        self
    }
}

/// Sparse map from date key to the record for that day.
///
/// Updates never mutate in place; [`CompletionLog::record`] hands back a new log.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CompletionLog {
    entries: BTreeMap<String, CompletionRecord>,
}

impl CompletionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the record for `date_key`, replacing any previous record for that day whole.
    pub fn record(&self, date_key: impl Into<String>, record: CompletionRecord) -> Self {
        let mut entries = self.entries.clone();
        let record = CompletionRecord {
            intensity: record.intensity.min(100),
            ..record
        };
        entries.insert(date_key.into(), record);
        Self { entries }
    }

    pub fn get(&self, date_key: &str) -> Option<&CompletionRecord> {
        self.entries.get(date_key)
    }

    pub fn has_completion(&self, date_key: &str) -> bool {
        self.entries.contains_key(date_key)
    }

    /// Stored intensity for the day, or 0 when nothing was logged.
    pub fn intensity_for(&self, date_key: &str) -> u8 {
        self.get(date_key).map_or(0, |record| record.intensity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CompletionRecord)> {
        self.entries.iter().map(|(key, record)| (key.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, CompletionRecord)> for CompletionLog {
    fn from_iter<T: IntoIterator<Item = (String, CompletionRecord)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Free-function form of [`CompletionLog::record`].
pub fn record_completion(
    log: &CompletionLog,
    date_key: &str,
    intensity: u8,
    duration_seconds: Option<u64>,
    completed_item_ids: Option<BTreeSet<String>>,
) -> CompletionLog {
    let record = CompletionRecord {
        intensity,
        duration_seconds: duration_seconds.unwrap_or(0),
        completed_item_ids,
    };
    log.record(date_key, record)
}

pub fn has_completion(log: &CompletionLog, date_key: &str) -> bool {
    log.has_completion(date_key)
}

/// Checklist intensity: share of items done, rounded half up. No items at all counts as done.
pub fn checklist_intensity(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let completed = completed.min(total);
    rounded_percent(completed as u64, total as u64) as u8
}

/// `part / whole` as a percentage, rounded half up. `whole` must be non-zero.
pub(crate) fn rounded_percent(part: u64, whole: u64) -> u64 {
    (200 * part + whole) / (2 * whole)
}
