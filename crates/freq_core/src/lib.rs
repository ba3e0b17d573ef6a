pub mod calendar;
pub mod completion;
pub mod habit;
pub mod heatmap;
pub mod mission;
pub mod overview;
pub mod recurrence;
pub mod report;
pub mod service;
pub mod stats;
pub mod store;
pub mod vault;

pub use crate::calendar::{date_key, enumerate_days, CalendarError, WeekdaySymbol};
pub use crate::habit::{find_or_create_habit, Habit, SectorFilter};
pub use crate::mission::{intensity_for, Mission, MissionEdit, MissionType};
pub use crate::recurrence::{is_due, RecurrenceRule};
pub use crate::report::{consistency_report, ConsistencyReport};
pub use crate::service::{DueGroup, MissionService, MissionServiceBuilder};
pub use crate::stats::{session_stats, SessionStats, StatsPeriod};
