use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::instrument;

use crate::{
    habit::{self, Habit, SectorFilter},
    heatmap::{self, HeatmapCell},
    mission::{Mission, MissionEdit},
    overview,
    report::{self, ConsistencyReport},
    stats::{self, SessionStats, StatsPeriod},
    store::MissionStore,
    vault::{self, Protocol},
};

/// Owns the mission and habit lists for the application and persists every change.
///
/// All calculations are delegated to the pure engine functions; the service only
/// serialises access and writes the store. A change becomes visible only after it
/// has been saved.
pub struct MissionService {
    store: Option<MissionStore>,
    state: RwLock<State>,
}

#[derive(Debug, Clone, Default)]
struct State {
    missions: Vec<Mission>,
    habits: Vec<Habit>,
}

/// Due missions of one habit, detached from the service lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueGroup {
    pub habit: Habit,
    pub missions: Vec<Mission>,
}

pub struct MissionServiceBuilder {
    data_dir: Option<PathBuf>,
    missions: Vec<Mission>,
    habits: Vec<Habit>,
}

impl MissionServiceBuilder {
    pub fn new() -> Self {
        Self {
            data_dir: None,
            missions: Vec::new(),
            habits: Vec::new(),
        }
    }

    pub fn data_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Missions to start from when no store is configured.
    pub fn with_missions(mut self, missions: Vec<Mission>) -> Self {
        self.missions = missions;
        self
    }

    /// Habits to start from when no store is configured.
    pub fn with_habits(mut self, habits: Vec<Habit>) -> Self {
        self.habits = habits;
        self
    }

    pub fn build(self) -> Result<MissionService> {
        let (store, state) = match self.data_dir {
            Some(dir) => {
                let store = MissionStore::open(&dir)?;
                let state = State {
                    missions: store.load()?,
                    habits: store.load_habits()?,
                };
                (Some(store), state)
            }
            None => (
                None,
                State {
                    missions: self.missions,
                    habits: self.habits,
                },
            ),
        };
        Ok(MissionService {
            store,
            state: RwLock::new(state),
        })
    }
}

impl Default for MissionServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MissionService {
    pub fn builder() -> MissionServiceBuilder {
        MissionServiceBuilder::new()
    }

    pub fn missions(&self) -> Vec<Mission> {
        self.state.read().missions.clone()
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.state.read().habits.clone()
    }

    pub fn mission(&self, id: &str) -> Result<Mission> {
        self.state
            .read()
            .missions
            .iter()
            .find(|mission| mission.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("mission `{id}` not found"))
    }

    pub fn add_mission(&self, mission: Mission) -> Result<()> {
        self.commit(|state| {
            if state.missions.iter().any(|existing| existing.id == mission.id) {
                return Err(anyhow!("mission `{}` already exists", mission.id));
            }
            tracing::info!(mission_id = %mission.id, name = %mission.name, "adding mission");
            state.missions.push(mission);
            Ok(())
        })
    }

    /// Replaces the mission with the same id, or appends it.
    pub fn upsert_mission(&self, mission: Mission) -> Result<()> {
        self.commit(|state| {
            match state.missions.iter_mut().find(|existing| existing.id == mission.id) {
                Some(slot) => *slot = mission,
                None => state.missions.push(mission),
            }
            Ok(())
        })
    }

    /// Creates a mission from `edit`, or applies it to the mission `editing`.
    ///
    /// The habit is found by name (ignoring case) or created, and moved to the
    /// edit's class when it sits elsewhere.
    #[instrument(skip(self, edit), fields(name = %edit.name, habit = %edit.habit_name))]
    pub fn save_mission(&self, edit: &MissionEdit, editing: Option<&str>) -> Result<Mission> {
        edit.validate()?;
        self.commit(|state| {
            let (habits, habit) = habit::find_or_create_habit(&state.habits, &edit.habit_name, &edit.class_id);
            state.habits = habits;
            let saved = match editing {
                Some(id) => {
                    let slot = state
                        .missions
                        .iter_mut()
                        .find(|mission| mission.id == id)
                        .ok_or_else(|| anyhow!("mission `{id}` not found"))?;
                    *slot = slot.edit(edit, &habit.id);
                    slot.clone()
                }
                None => {
                    let created = Mission::create(edit, &habit.id);
                    tracing::info!(mission_id = %created.id, "created mission");
                    state.missions.push(created.clone());
                    created
                }
            };
            Ok(saved)
        })
    }

    /// Drops the mission and its whole completion log.
    pub fn remove_mission(&self, id: &str) -> Result<Mission> {
        self.commit(|state| {
            let index = state
                .missions
                .iter()
                .position(|mission| mission.id == id)
                .ok_or_else(|| anyhow!("mission `{id}` not found"))?;
            tracing::info!(mission_id = %id, "removed mission");
            Ok(state.missions.remove(index))
        })
    }

    #[instrument(skip(self, completed_item_ids))]
    pub fn complete_mission(
        &self,
        id: &str,
        date_key: &str,
        intensity: u8,
        duration_seconds: Option<u64>,
        completed_item_ids: Option<BTreeSet<String>>,
    ) -> Result<Mission> {
        self.update(id, |mission| {
            mission.complete(date_key, intensity, duration_seconds, completed_item_ids)
        })
    }

    #[instrument(skip(self))]
    pub fn toggle_sub_item(&self, id: &str, date_key: &str, item_id: &str) -> Result<Mission> {
        self.update(id, |mission| mission.toggle_sub_item(date_key, item_id))
    }

    /// Missions due on `date`, limited to one class when `class_id` is given.
    pub fn due_on(&self, date: NaiveDate, class_id: Option<&str>) -> Vec<Mission> {
        let state = self.state.read();
        let sector = class_id.map(|class_id| SectorFilter::new(&state.habits, class_id));
        overview::due_missions(&state.missions, date, sector.as_ref())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Due missions bucketed by habit; missions without a known habit are left out.
    pub fn due_by_habit(&self, date: NaiveDate, class_id: Option<&str>) -> Vec<DueGroup> {
        let state = self.state.read();
        let sector = class_id.map(|class_id| SectorFilter::new(&state.habits, class_id));
        let due = overview::due_missions(&state.missions, date, sector.as_ref());
        habit::group_by_habit(&state.habits, &due)
            .into_iter()
            .map(|group| DueGroup {
                habit: group.habit.clone(),
                missions: group.missions.into_iter().cloned().collect(),
            })
            .collect()
    }

    pub fn daily_progress(&self, date: NaiveDate) -> u8 {
        overview::daily_progress(&self.state.read().missions, date)
    }

    #[instrument(skip(self))]
    pub fn consistency_report(
        &self,
        id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ConsistencyReport> {
        let mission = self.mission(id)?;
        Ok(report::consistency_report(&mission, start, end)?)
    }

    pub fn session_stats(&self, id: &str, period: StatsPeriod, today: NaiveDate) -> Result<SessionStats> {
        let mission = self.mission(id)?;
        Ok(stats::session_stats(&mission, period.window_start(today)))
    }

    pub fn heatmap(&self, end: NaiveDate, span: u32, class_id: Option<&str>) -> Vec<HeatmapCell> {
        let state = self.state.read();
        let sector = class_id.map(|class_id| SectorFilter::new(&state.habits, class_id));
        heatmap::heatmap(&state.missions, sector.as_ref(), end, span)
    }

    #[instrument(skip(self, protocol), fields(protocol = %protocol.id))]
    pub fn import_protocol(&self, protocol: &Protocol, habit_id: &str) -> Result<()> {
        self.commit(|state| {
            let current = std::mem::take(&mut state.missions);
            state.missions = vault::import_protocol(protocol, current, habit_id);
            Ok(())
        })
    }
}

impl MissionService {
    fn update(&self, id: &str, apply: impl FnOnce(&Mission) -> Mission) -> Result<Mission> {
        self.commit(|state| {
            let slot = state
                .missions
                .iter_mut()
                .find(|mission| mission.id == id)
                .ok_or_else(|| anyhow!("mission `{id}` not found"))?;
            *slot = apply(slot);
            Ok(slot.clone())
        })
    }

    /// Applies `change` to a copy of the state, saves the copy, then swaps it in.
    ///
    /// On any error, from `change` or from the store, the held state is untouched.
    fn commit<T>(&self, change: impl FnOnce(&mut State) -> Result<T>) -> Result<T> {
        let mut state = self.state.write();
        let mut next = state.clone();
        let value = change(&mut next)?;
        self.persist(&next)?;
        *state = next;
        Ok(value)
    }

    fn persist(&self, state: &State) -> Result<()> {
        if let Some(store) = &self.store {
            store.save(&state.missions)?;
            store.save_habits(&state.habits)?;
            tracing::debug!(
                path = %store.path().display(),
                missions = state.missions.len(),
                habits = state.habits.len(),
                "saved missions"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mission::MissionType,
        recurrence::RecurrenceRule,
        store::{HABITS_FILE_NAME, STORE_FILE_NAME},
    };
    use tempfile::tempdir;

    fn service() -> MissionService {
        MissionService::builder()
            .with_missions(vec![Mission::new(
                "run",
                "Run",
                MissionType::Checklist,
                RecurrenceRule::every_day(),
            )])
            .build()
            .unwrap()
    }

    #[test]
    fn complete_updates_the_owned_mission() {
        let service = service();
        let updated = service
            .complete_mission("run", "2024-03-15", 100, None, None)
            .unwrap();
        assert!(updated.log.has_completion("2024-03-15"));
        assert_eq!(service.mission("run").unwrap(), updated);
    }

    #[test]
    fn unknown_mission_is_an_error() {
        let service = service();
        assert!(service.complete_mission("nope", "2024-03-15", 100, None, None).is_err());
        assert!(service.remove_mission("nope").is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let service = service();
        let twin = Mission::new("run", "Run again", MissionType::Timer, RecurrenceRule::every_day());
        assert!(service.add_mission(twin).is_err());
        assert_eq!(service.missions().len(), 1);
    }

    #[test]
    fn reversed_report_interval_surfaces_error() {
        let service = service();
        let start = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let err = service.consistency_report("run", start, end).unwrap_err();
        assert!(err.downcast_ref::<crate::calendar::CalendarError>().is_some());
    }

    #[test]
    fn failed_save_leaves_state_unchanged() {
        let temp = tempdir().expect("tempdir");
        let service = MissionService::builder()
            .data_dir(temp.path())
            .build()
            .expect("build");
        // A non-empty directory where the store file goes makes the rename fail.
        let blocker = temp.path().join(STORE_FILE_NAME);
        std::fs::create_dir(&blocker).expect("mkdir");
        std::fs::write(blocker.join("keep"), "x").expect("write");

        let mission = Mission::new("run", "Run", MissionType::Checklist, RecurrenceRule::every_day());
        assert!(service.add_mission(mission).is_err());
        assert!(service.missions().is_empty());
        assert!(service.save_mission(&form("Read", "Mind"), None).is_err());
        assert!(service.missions().is_empty());
        assert!(service.habits().is_empty());
    }

    #[test]
    fn failed_update_keeps_the_old_log() {
        let temp = tempdir().expect("tempdir");
        let service = MissionService::builder()
            .data_dir(temp.path())
            .build()
            .expect("build");
        service
            .add_mission(Mission::new("run", "Run", MissionType::Checklist, RecurrenceRule::every_day()))
            .expect("add");
        std::fs::remove_file(temp.path().join(STORE_FILE_NAME)).expect("remove");
        let blocker = temp.path().join(STORE_FILE_NAME);
        std::fs::create_dir(&blocker).expect("mkdir");
        std::fs::write(blocker.join("keep"), "x").expect("write");

        assert!(service.complete_mission("run", "2024-03-15", 100, None, None).is_err());
        assert!(service.mission("run").expect("run").log.is_empty());
        assert!(service.remove_mission("run").is_err());
        assert_eq!(service.missions().len(), 1);
    }

    fn form(name: &str, habit_name: &str) -> MissionEdit {
        MissionEdit {
            name: name.into(),
            habit_name: habit_name.into(),
            class_id: "focus".into(),
            kind: MissionType::Timer,
            rule: RecurrenceRule::every_day(),
            target_seconds: 900,
            sub_item_texts: Vec::new(),
        }
    }

    #[test]
    fn saving_missions_files_them_under_habits() {
        let service = MissionService::builder().build().unwrap();
        let first = service.save_mission(&form("Read", "Mind"), None).unwrap();
        let second = service.save_mission(&form("Journal", "mind"), None).unwrap();
        assert_eq!(first.habit_id, second.habit_id);
        assert_eq!(service.habits().len(), 1);

        let mut moved = form("Read more", "MIND");
        moved.class_id = "study".into();
        let edited = service.save_mission(&moved, Some(&first.id)).unwrap();
        assert_eq!(edited.id, first.id);
        assert_eq!(edited.name, "Read more");
        assert_eq!(service.habits()[0].class_id, "study");
        assert_eq!(service.missions().len(), 2);

        assert!(service.save_mission(&form("Ghost", "Mind"), Some("missing")).is_err());
        assert_eq!(service.missions().len(), 2);
        let mut invalid = form("List", "Home");
        invalid.kind = MissionType::Checklist;
        assert!(service.save_mission(&invalid, None).is_err());
        assert_eq!(service.habits().len(), 1);
    }

    #[test]
    fn class_filter_narrows_due_and_heatmap() {
        let service = MissionService::builder().build().unwrap();
        let read = service.save_mission(&form("Read", "Mind"), None).unwrap();
        let mut lift = form("Lift", "Body");
        lift.class_id = "fitness".into();
        let lift = service.save_mission(&lift, None).unwrap();
        service.complete_mission(&lift.id, "2024-03-15", 100, None, None).unwrap();

        let friday = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(service.due_on(friday, None).len(), 2);
        let focus = service.due_on(friday, Some("focus"));
        assert_eq!(focus.len(), 1);
        assert_eq!(focus[0].id, read.id);

        assert_eq!(service.heatmap(friday, 1, None)[0].intensity, 50.0);
        assert_eq!(service.heatmap(friday, 1, Some("fitness"))[0].intensity, 100.0);
        assert_eq!(service.heatmap(friday, 1, Some("focus"))[0].intensity, 0.0);

        let groups = service.due_by_habit(friday, None);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].habit.name, "Mind");
        assert_eq!(groups[1].missions[0].id, lift.id);
    }

    #[test]
    fn habits_persist_across_reopen() {
        let temp = tempdir().expect("tempdir");
        let service = MissionService::builder()
            .data_dir(temp.path())
            .build()
            .expect("build");
        service.save_mission(&form("Read", "Mind"), None).expect("save");
        assert!(temp.path().join(HABITS_FILE_NAME).exists());

        let reopened = MissionService::builder()
            .data_dir(temp.path())
            .build()
            .expect("reopen");
        assert_eq!(reopened.habits(), service.habits());
        assert_eq!(reopened.missions()[0].habit_id, reopened.habits()[0].id);
    }
}
