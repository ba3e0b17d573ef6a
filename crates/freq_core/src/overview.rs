use chrono::NaiveDate;

use crate::{
    calendar::date_key,
    completion::rounded_percent,
    habit::{filter_missions, SectorFilter},
    mission::Mission,
};

/// Missions scheduled on `date`, in their original order, optionally limited to one sector.
pub fn due_missions<'m>(
    missions: &'m [Mission],
    date: NaiveDate,
    sector: Option<&SectorFilter<'_>>,
) -> Vec<&'m Mission> {
    filter_missions(missions, sector)
        .into_iter()
        .filter(|mission| mission.is_due(date))
        .collect()
}

/// Percentage of the day's due missions that were acted on. A day with nothing due is complete.
///
/// Always counts every mission; the sector filter only narrows listings.
pub fn daily_progress(missions: &[Mission], date: NaiveDate) -> u8 {
    let due = due_missions(missions, date, None);
    if due.is_empty() {
        return 100;
    }
    let key = date_key(date);
    let done = due
        .iter()
        .filter(|mission| mission.log.has_completion(&key))
        .count();
    rounded_percent(done as u64, due.len() as u64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        calendar::WeekdaySymbol, habit::Habit, mission::MissionType, recurrence::RecurrenceRule,
    };

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn progress_counts_only_due_missions() {
        // 2024-03-15 was a Friday.
        let friday = ymd(2024, 3, 15);
        let missions = vec![
            Mission::new("a", "Run", MissionType::Checklist, RecurrenceRule::every_day())
                .complete("2024-03-15", 100, None, None),
            Mission::new("b", "Read", MissionType::Checklist, RecurrenceRule::every_day()),
            Mission::new("c", "Swim", MissionType::Checklist, RecurrenceRule::weekly([WeekdaySymbol::Mon]))
                .complete("2024-03-15", 100, None, None),
        ];
        let due: Vec<_> = due_missions(&missions, friday, None).into_iter().map(|m| m.id.as_str()).collect();
        assert_eq!(due, vec!["a", "b"]);
        assert_eq!(daily_progress(&missions, friday), 50);
    }

    #[test]
    fn nothing_due_is_full_progress() {
        let missions = vec![Mission::new("a", "Taxes", MissionType::Checklist, RecurrenceRule::once(ymd(2024, 4, 15)))];
        assert_eq!(daily_progress(&missions, ymd(2024, 3, 15)), 100);
        assert_eq!(daily_progress(&[], ymd(2024, 3, 15)), 100);
    }

    #[test]
    fn sector_narrows_due_missions_but_not_progress() {
        let friday = ymd(2024, 3, 15);
        let habits = vec![
            Habit {
                id: "h1".into(),
                name: "Fitness".into(),
                class_id: "body".into(),
            },
            Habit {
                id: "h2".into(),
                name: "Reading".into(),
                class_id: "mind".into(),
            },
        ];
        let missions = vec![
            Mission::new("a", "Run", MissionType::Checklist, RecurrenceRule::every_day())
                .with_habit("h1")
                .complete("2024-03-15", 100, None, None),
            Mission::new("b", "Read", MissionType::Checklist, RecurrenceRule::every_day())
                .with_habit("h2"),
        ];
        let sector = SectorFilter::new(&habits, "mind");
        let due: Vec<_> = due_missions(&missions, friday, Some(&sector))
            .into_iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(due, vec!["b"]);
        assert_eq!(daily_progress(&missions, friday), 50);
    }

    #[test]
    fn progress_rounds_to_nearest_percent() {
        let friday = ymd(2024, 3, 15);
        let missions: Vec<Mission> = (0..3)
            .map(|i| {
                let mission = Mission::new(i.to_string(), "Run", MissionType::Checklist, RecurrenceRule::every_day());
                if i == 0 {
                    mission.complete("2024-03-15", 100, None, None)
                } else {
                    mission
                }
            })
            .collect();
        assert_eq!(daily_progress(&missions, friday), 33);
    }
}
