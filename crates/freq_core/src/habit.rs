use serde::{Deserialize, Serialize};

use crate::mission::{generate_id, Mission};

/// Named group of missions, filed under a class (sector).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub class_id: String,
}

/// Missions of one habit, in the order they appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitGroup<'a> {
    pub habit: &'a Habit,
    pub missions: Vec<&'a Mission>,
}

/// Looks up a habit by name, ignoring case, or creates it.
///
/// A found habit is moved to `class_id` when it sits under another class.
/// Returns the updated habit list together with the habit to link.
pub fn find_or_create_habit(habits: &[Habit], name: &str, class_id: &str) -> (Vec<Habit>, Habit) {
    let wanted = name.to_lowercase();
    let mut habits = habits.to_vec();
    if let Some(existing) = habits
        .iter_mut()
        .find(|habit| habit.name.to_lowercase() == wanted)
    {
        if existing.class_id != class_id {
            tracing::debug!(habit = %existing.id, from = %existing.class_id, to = %class_id, "moving habit to class");
            existing.class_id = class_id.to_string();
        }
        let habit = existing.clone();
        return (habits, habit);
    }
    let habit = Habit {
        id: generate_id(),
        name: name.to_string(),
        class_id: class_id.to_string(),
    };
    habits.push(habit.clone());
    (habits, habit)
}

/// Restricts missions to those whose habit belongs to one class.
#[derive(Debug, Clone, Copy)]
pub struct SectorFilter<'a> {
    habits: &'a [Habit],
    class_id: &'a str,
}

impl<'a> SectorFilter<'a> {
    pub fn new(habits: &'a [Habit], class_id: &'a str) -> Self {
        Self { habits, class_id }
    }

    pub fn class_id(&self) -> &str {
        self.class_id
    }

    /// Missions without a known habit never match.
    pub fn matches(&self, mission: &Mission) -> bool {
        self.habits
            .iter()
            .find(|habit| habit.id == mission.habit_id)
            .is_some_and(|habit| habit.class_id == self.class_id)
    }
}

/// Keeps everything when `filter` is `None`.
pub fn filter_missions<'m>(missions: &'m [Mission], filter: Option<&SectorFilter<'_>>) -> Vec<&'m Mission> {
    missions
        .iter()
        .filter(|mission| filter.map_or(true, |filter| filter.matches(mission)))
        .collect()
}

/// Buckets missions under their habit. Missions whose habit is unknown are left out.
pub fn group_by_habit<'a>(habits: &'a [Habit], missions: &[&'a Mission]) -> Vec<HabitGroup<'a>> {
    let mut groups: Vec<HabitGroup<'a>> = Vec::new();
    for &mission in missions {
        let Some(habit) = habits.iter().find(|habit| habit.id == mission.habit_id) else {
            continue;
        };
        match groups.iter_mut().find(|group| group.habit.id == habit.id) {
            Some(group) => group.missions.push(mission),
            None => groups.push(HabitGroup {
                habit,
                missions: vec![mission],
            }),
        }
    }
    groups
}
