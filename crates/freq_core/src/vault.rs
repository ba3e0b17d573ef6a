use serde::{Deserialize, Serialize};

use crate::{
    completion::CompletionLog,
    mission::{generate_id, ChecklistItem, Mission, MissionType, DEFAULT_MISSION_ICON},
    recurrence::RecurrenceRule,
};

pub const DEFAULT_MISSION_NAME: &str = "Untitled";

/// Partial mission description shipped inside a protocol.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MissionTemplate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<MissionType>,
    #[serde(rename = "frequency")]
    pub rule: Option<RecurrenceRule>,
    #[serde(rename = "targetTime")]
    pub target_seconds: Option<u64>,
    pub icon: Option<String>,
    pub sub_items: Option<Vec<ChecklistItem>>,
}

/// A curated bundle of missions that can be imported in one go.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Protocol {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub icon: String,
    pub habits: Vec<MissionTemplate>,
}

impl MissionTemplate {
    pub fn instantiate(&self, habit_id: &str) -> Mission {
        Mission {
            id: generate_id(),
            habit_id: habit_id.to_string(),
            name: self
                .name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MISSION_NAME.to_string()),
            kind: self.kind.unwrap_or_default(),
            rule: self.rule.clone().unwrap_or_default(),
            log: CompletionLog::new(),
            target_seconds: Some(self.target_seconds.unwrap_or(0)),
            sub_items: self.sub_items.clone().unwrap_or_default(),
            icon: Some(
                self.icon
                    .clone()
                    .unwrap_or_else(|| DEFAULT_MISSION_ICON.to_string()),
            ),
        }
    }
}

/// Appends one fresh mission per template to `current`.
pub fn import_protocol(protocol: &Protocol, current: Vec<Mission>, habit_id: &str) -> Vec<Mission> {
    let mut missions = current;
    missions.extend(
        protocol
            .habits
            .iter()
            .map(|template| template.instantiate(habit_id)),
    );
    tracing::debug!(
        protocol = %protocol.id,
        imported = protocol.habits.len(),
        "imported protocol"
    );
    missions
}

pub fn builtin_protocols() -> Vec<Protocol> {
    let items = [("1", "Rice 5kg"), ("2", "Protein"), ("3", "Cleaning supplies")]
        .into_iter()
        .map(|(id, text)| ChecklistItem {
            id: id.to_string(),
            text: text.to_string(),
        })
        .collect();
    vec![Protocol {
        id: "resupply-basic".to_string(),
        title: "Resupply Operation".to_string(),
        description: "Household logistics protocol to keep supplies stocked.".to_string(),
        author: "Frequency Logistics".to_string(),
        icon: "🏠".to_string(),
        habits: vec![MissionTemplate {
            name: Some("Monthly shopping list".to_string()),
            kind: Some(MissionType::Checklist),
            rule: Some(RecurrenceRule::monthly([1, 15])),
            sub_items: Some(items),
            ..MissionTemplate::default()
        }],
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn import_fills_defaults() {
        let protocol = Protocol {
            id: "p".into(),
            title: "Blank".into(),
            description: String::new(),
            author: String::new(),
            icon: String::new(),
            habits: vec![MissionTemplate::default(), MissionTemplate::default()],
        };
        let existing = vec![Mission::new("keep", "Run", MissionType::Timer, RecurrenceRule::every_day())];
        let missions = import_protocol(&protocol, existing, "imported");
        assert_eq!(missions.len(), 3);
        assert_eq!(missions[0].id, "keep");

        let fresh = &missions[1];
        assert_eq!(fresh.name, DEFAULT_MISSION_NAME);
        assert_eq!(fresh.kind, MissionType::Checklist);
        assert_eq!(fresh.rule, RecurrenceRule::default());
        assert_eq!(fresh.habit_id, "imported");
        assert_eq!(fresh.icon.as_deref(), Some(DEFAULT_MISSION_ICON));
        assert!(fresh.log.is_empty());
        assert_ne!(missions[1].id, missions[2].id);
    }

    #[test]
    fn builtin_resupply_is_due_on_first_and_fifteenth() {
        let protocols = builtin_protocols();
        let missions = import_protocol(&protocols[0], Vec::new(), "logistics");
        let mission = &missions[0];
        assert_eq!(mission.sub_items.len(), 3);
        assert!(mission.is_due(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()));
        assert!(!mission.is_due(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()));
    }
}
