use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    completion::{checklist_intensity, CompletionLog, CompletionRecord},
    recurrence::{self, RecurrenceRule},
};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum MissionType {
    #[default]
    Checklist,
    Timer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
}

/// A trackable action with its recurrence rule and completion history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    #[serde(default)]
    pub habit_id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: MissionType,
    #[serde(rename = "frequency", default)]
    pub rule: RecurrenceRule,
    #[serde(rename = "completedDays", default)]
    pub log: CompletionLog,
    /// Target session length in seconds, used by timer missions.
    #[serde(rename = "targetTime", default, skip_serializing_if = "Option::is_none")]
    pub target_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<ChecklistItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Opaque random identifier for new missions, habits and checklist items.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub const DEFAULT_MISSION_ICON: &str = "🎯";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MissionEditError {
    #[error("mission name is required")]
    MissingName,
    #[error("habit name is required")]
    MissingHabit,
    #[error("a checklist mission needs at least one item")]
    EmptyChecklist,
}

/// User-entered fields for creating or editing a mission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionEdit {
    pub name: String,
    /// Habit to file the mission under, matched ignoring case.
    pub habit_name: String,
    pub class_id: String,
    pub kind: MissionType,
    pub rule: RecurrenceRule,
    /// Only kept for timer missions.
    pub target_seconds: u64,
    pub sub_item_texts: Vec<String>,
}

impl MissionEdit {
    pub fn validate(&self) -> Result<(), MissionEditError> {
        if self.name.is_empty() {
            return Err(MissionEditError::MissingName);
        }
        if self.habit_name.is_empty() {
            return Err(MissionEditError::MissingHabit);
        }
        if self.kind == MissionType::Checklist && self.sub_item_texts.is_empty() {
            return Err(MissionEditError::EmptyChecklist);
        }
        Ok(())
    }

    fn target(&self) -> Option<u64> {
        (self.kind == MissionType::Timer).then_some(self.target_seconds)
    }
}

impl Mission {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: MissionType, rule: RecurrenceRule) -> Self {
        Self {
            id: id.into(),
            habit_id: String::new(),
            name: name.into(),
            kind,
            rule,
            log: CompletionLog::new(),
            target_seconds: None,
            sub_items: Vec::new(),
            icon: None,
        }
    }

    pub fn with_habit(mut self, habit_id: impl Into<String>) -> Self {
        self.habit_id = habit_id.into();
        self
    }

    pub fn with_target(mut self, seconds: u64) -> Self {
        self.target_seconds = Some(seconds);
        self
    }

    pub fn with_sub_items(mut self, items: Vec<ChecklistItem>) -> Self {
        self.sub_items = items;
        self
    }

    pub fn with_log(mut self, log: CompletionLog) -> Self {
        self.log = log;
        self
    }

    /// Fresh mission with an empty log and new ids throughout.
    pub fn create(edit: &MissionEdit, habit_id: &str) -> Self {
        Self {
            id: generate_id(),
            habit_id: habit_id.to_string(),
            name: edit.name.clone(),
            kind: edit.kind,
            rule: edit.rule.clone(),
            log: CompletionLog::new(),
            target_seconds: edit.target(),
            sub_items: edit
                .sub_item_texts
                .iter()
                .map(|text| ChecklistItem {
                    id: generate_id(),
                    text: text.clone(),
                })
                .collect(),
            icon: Some(DEFAULT_MISSION_ICON.to_string()),
        }
    }

    /// Applies `edit`, keeping the id, log and icon.
    ///
    /// A sub-item whose text is unchanged keeps its id so logged ticks still count.
    pub fn edit(&self, edit: &MissionEdit, habit_id: &str) -> Self {
        let sub_items = edit
            .sub_item_texts
            .iter()
            .map(|text| {
                let id = self
                    .sub_items
                    .iter()
                    .find(|item| item.text == *text)
                    .map(|item| item.id.clone())
                    .unwrap_or_else(generate_id);
                ChecklistItem {
                    id,
                    text: text.clone(),
                }
            })
            .collect();
        Self {
            habit_id: habit_id.to_string(),
            name: edit.name.clone(),
            kind: edit.kind,
            rule: edit.rule.clone(),
            target_seconds: edit.target(),
            sub_items,
            ..self.clone()
        }
    }

    pub fn is_due(&self, date: NaiveDate) -> bool {
        recurrence::is_due(&self.rule, date)
    }

    /// Records a completion for `date_key` and returns the updated mission.
    ///
    /// Timer missions fall back to their target length when no duration is given.
    /// Without explicit item ids the ids already logged for that day are kept.
    pub fn complete(
        &self,
        date_key: &str,
        intensity: u8,
        duration_seconds: Option<u64>,
        completed_item_ids: Option<BTreeSet<String>>,
    ) -> Self {
        let duration_seconds = match duration_seconds.filter(|seconds| *seconds > 0) {
            Some(seconds) => seconds,
            None if self.kind == MissionType::Timer => self.target_seconds.unwrap_or(0),
            None => 0,
        };
        let completed_item_ids = completed_item_ids.or_else(|| {
            self.log
                .get(date_key)
                .and_then(|record| record.completed_item_ids.clone())
        });
        let record = CompletionRecord {
            intensity,
            duration_seconds,
            completed_item_ids,
        };
        Self {
            log: self.log.record(date_key, record),
            ..self.clone()
        }
    }

    /// Flips one checklist item for the day and re-derives the day's intensity.
    pub fn toggle_sub_item(&self, date_key: &str, item_id: &str) -> Self {
        let mut items = self
            .log
            .get(date_key)
            .and_then(|record| record.completed_item_ids.clone())
            .unwrap_or_default();
        if !items.remove(item_id) {
            items.insert(item_id.to_string());
        }
        let done = self
            .sub_items
            .iter()
            .filter(|item| items.contains(&item.id))
            .count();
        let intensity = checklist_intensity(done, self.sub_items.len());
        self.complete(date_key, intensity, None, Some(items))
    }

    /// All sub-items are ticked for the day, or the day is logged when there are none.
    pub fn is_fully_done(&self, date_key: &str) -> bool {
        let Some(record) = self.log.get(date_key) else {
            return false;
        };
        if self.sub_items.is_empty() {
            return true;
        }
        let items = record.completed_item_ids.as_ref();
        self.sub_items
            .iter()
            .all(|item| items.is_some_and(|ids| ids.contains(&item.id)))
    }
}

/// Intensity logged for the day, 0 when absent.
pub fn intensity_for(mission: &Mission, date_key: &str) -> u8 {
    mission.log.intensity_for(date_key)
}
