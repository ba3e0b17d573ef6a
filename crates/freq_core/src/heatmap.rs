use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    calendar::{date_key, trailing_days},
    habit::{filter_missions, SectorFilter},
    mission::Mission,
};

/// Display bucket for a heatmap cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum HeatLevel {
    None,
    Low,
    Medium,
    High,
    Full,
}

impl HeatLevel {
    pub fn from_intensity(intensity: f64) -> Self {
        if intensity <= 0.0 {
            HeatLevel::None
        } else if intensity < 25.0 {
            HeatLevel::Low
        } else if intensity < 50.0 {
            HeatLevel::Medium
        } else if intensity < 75.0 {
            HeatLevel::High
        } else {
            HeatLevel::Full
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub date_key: String,
    pub intensity: f64,
    pub level: HeatLevel,
}

/// Per-day intensity averaged across `missions`, capped at 100.
///
/// With a sector the average is taken over that sector's missions only.
pub fn combined_intensity(missions: &[Mission], sector: Option<&SectorFilter<'_>>) -> BTreeMap<String, f64> {
    let missions = filter_missions(missions, sector);
    let mut data: BTreeMap<String, f64> = BTreeMap::new();
    if missions.is_empty() {
        return data;
    }
    let share = missions.len() as f64;
    for mission in missions {
        for (key, record) in mission.log.iter() {
            let value = data.entry(key.to_string()).or_insert(0.0);
            *value = (*value + f64::from(record.intensity) / share).min(100.0);
        }
    }
    data
}

/// One cell per day of the `span` days ending on `end`.
pub fn heatmap(
    missions: &[Mission],
    sector: Option<&SectorFilter<'_>>,
    end: NaiveDate,
    span: u32,
) -> Vec<HeatmapCell> {
    let data = combined_intensity(missions, sector);
    trailing_days(end, span)
        .into_iter()
        .map(|day| {
            let key = date_key(day);
            let intensity = data.get(&key).copied().unwrap_or(0.0);
            HeatmapCell {
                date_key: key,
                intensity,
                level: HeatLevel::from_intensity(intensity),
            }
        })
        .collect()
}
