use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

use crate::{habit::Habit, mission::Mission};

/// File name of the mission store inside the data directory.
pub const STORE_FILE_NAME: &str = "freq_missions.json";
/// File name of the habit list inside the data directory.
pub const HABITS_FILE_NAME: &str = "freq_habits_groups.json";

/// JSON files holding every mission (with its completion log) and the habits they belong to.
#[derive(Debug, Clone)]
pub struct MissionStore {
    path: PathBuf,
    habits_path: PathBuf,
}

impl MissionStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("creating data directory {}", dir.display()))?;
        Ok(Self {
            path: dir.join(STORE_FILE_NAME),
            habits_path: dir.join(HABITS_FILE_NAME),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn habits_path(&self) -> &Path {
        &self.habits_path
    }

    /// Missing store means no missions yet.
    pub fn load(&self) -> Result<Vec<Mission>> {
        let missions: Vec<Mission> = read_list(&self.path)?;
        tracing::debug!(path = %self.path.display(), count = missions.len(), "loaded missions");
        Ok(missions)
    }

    pub fn save(&self, missions: &[Mission]) -> Result<()> {
        write_list(&self.path, missions)
    }

    pub fn load_habits(&self) -> Result<Vec<Habit>> {
        read_list(&self.habits_path)
    }

    pub fn save_habits(&self, habits: &[Habit]) -> Result<()> {
        write_list(&self.habits_path, habits)
    }
}

fn read_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no store file yet");
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn write_list<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let payload = serde_json::to_string_pretty(items)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
