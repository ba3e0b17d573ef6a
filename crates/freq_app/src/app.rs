use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use freq_core::{
    calendar::{self, date_key},
    heatmap::HeatLevel,
    mission::{Mission, MissionType},
    recurrence::RecurrenceRule,
    stats::StatsPeriod,
    MissionService,
};
use tracing::{info, warn};

const DEFAULT_REPORT_SPAN_DAYS: u32 = 30;
const DEFAULT_HEATMAP_SPAN_DAYS: u32 = 210;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) report_span_days: u32,
    pub(crate) heatmap_span_days: u32,
    pub(crate) stats_period: StatsPeriod,
    /// Class id to narrow the day list and heatmap to.
    pub(crate) sector: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("FREQ_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Some(span) = span_from_env("FREQ_REPORT_SPAN_DAYS") {
            config.report_span_days = span;
        }
        if let Some(span) = span_from_env("FREQ_HEATMAP_SPAN_DAYS") {
            config.heatmap_span_days = span;
        }
        if let Ok(period) = std::env::var("FREQ_STATS_PERIOD") {
            match period.parse::<StatsPeriod>() {
                Ok(value) => config.stats_period = value,
                Err(err) => warn!(%err, "ignoring FREQ_STATS_PERIOD"),
            }
        }
        if let Ok(sector) = std::env::var("FREQ_SECTOR") {
            let sector = sector.trim();
            if !sector.is_empty() {
                config.sector = Some(sector.to_string());
            }
        }
        info!(data_dir = %config.data_dir.display(), sector = ?config.sector, "configuration loaded");
        Ok(config)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|dir| dir.join("freq"))
            .unwrap_or_else(|| PathBuf::from(".freq"));
        Self {
            data_dir,
            report_span_days: DEFAULT_REPORT_SPAN_DAYS,
            heatmap_span_days: DEFAULT_HEATMAP_SPAN_DAYS,
            stats_period: StatsPeriod::default(),
            sector: None,
        }
    }
}

fn span_from_env(name: &str) -> Option<u32> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            warn!(%name, value = %raw, "ignoring invalid span");
            None
        }
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    let service = MissionService::builder()
        .data_dir(&config.data_dir)
        .build()
        .with_context(|| format!("opening missions in {}", config.data_dir.display()))?;
    let today = calendar::today();
    print!("{}", render_summary(&service, &config, today)?);
    Ok(())
}

/// Text overview of the day plus per-mission reports over the configured spans.
pub fn render_summary(service: &MissionService, config: &AppConfig, today: NaiveDate) -> Result<String> {
    let mut out = String::new();
    let key = date_key(today);
    let sector = config.sector.as_deref();
    let due = service.due_on(today, sector);

    writeln!(out, "{key} ({})", calendar::weekday_of(today))?;
    if let Some(sector) = sector {
        writeln!(out, "sector: {sector}")?;
    }
    writeln!(out, "progress: {}%", service.daily_progress(today))?;
    if due.is_empty() {
        writeln!(out, "nothing due today")?;
    }
    let groups = service.due_by_habit(today, sector);
    let grouped: Vec<&str> = groups
        .iter()
        .flat_map(|group| group.missions.iter().map(|mission| mission.id.as_str()))
        .collect();
    for group in &groups {
        writeln!(out, "{}:", group.habit.name)?;
        for mission in &group.missions {
            write_due_line(&mut out, mission, &key)?;
        }
    }
    for mission in due.iter().filter(|mission| !grouped.contains(&mission.id.as_str())) {
        write_due_line(&mut out, mission, &key)?;
    }

    let start = today
        .checked_sub_days(Days::new(u64::from(config.report_span_days.saturating_sub(1))))
        .unwrap_or(today);
    writeln!(out)?;
    for mission in service.missions() {
        let report = service.consistency_report(&mission.id, start, today)?;
        let stats = service.session_stats(&mission.id, config.stats_period, today)?;
        writeln!(out, "{} [{}]", mission.name, describe_rule(&mission))?;
        writeln!(
            out,
            "  last {} days: {} hits, {} misses, {} rest, {} extra, accuracy {}",
            config.report_span_days,
            report.hits,
            report.misses,
            report.rest,
            report.extra,
            report.accuracy
        )?;
        if mission.kind == MissionType::Timer {
            writeln!(
                out,
                "  this {}: {} sessions, {}s total, {:.0}s average",
                config.stats_period,
                stats.total_completions,
                stats.total_time,
                stats.average_time_per_session
            )?;
        }
    }

    let active = service
        .heatmap(today, config.heatmap_span_days, sector)
        .iter()
        .filter(|cell| cell.level != HeatLevel::None)
        .count();
    writeln!(out)?;
    writeln!(
        out,
        "active days in the last {}: {active}",
        config.heatmap_span_days
    )?;
    Ok(out)
}

fn write_due_line(out: &mut String, mission: &Mission, key: &str) -> std::fmt::Result {
    let mark = if mission.is_fully_done(key) { "x" } else { " " };
    writeln!(
        out,
        "[{mark}] {} ({}%)",
        mission.name,
        mission.log.intensity_for(key)
    )
}

fn describe_rule(mission: &Mission) -> String {
    match &mission.rule {
        RecurrenceRule::Weekly(days) => {
            let days: Vec<String> = days.iter().map(ToString::to_string).collect();
            format!("weekly: {}", days.join(", "))
        }
        RecurrenceRule::Monthly(days) => {
            let days: Vec<String> = days.iter().map(ToString::to_string).collect();
            format!("monthly: {}", days.join(", "))
        }
        RecurrenceRule::Once(key) => format!("once: {key}"),
        RecurrenceRule::Unrecognized { kind, .. } => format!("unrecognized: {kind}"),
    }
}
