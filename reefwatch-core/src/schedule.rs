//! Maintenance schedule generation. Each task's base interval is scaled by a
//! tank-volume coefficient and a stocking coefficient.

use chrono::{Duration, NaiveDate};
use reefwatch_schemas::{
    maintenance::{MaintenanceEvent, MaintenanceTask},
    tank::{StockingLevel, Tank},
};
use serde::Serialize;
use tracing::debug;

pub fn base_interval_days(task: MaintenanceTask) -> f64 {
    match task {
        MaintenanceTask::WaterChange => 7.0,
        MaintenanceTask::WaterTest => 7.0,
        MaintenanceTask::FilterMediaChange => 14.0,
        MaintenanceTask::GlassCleaning => 3.0,
        MaintenanceTask::SkimmerCleaning => 3.0,
        MaintenanceTask::DosingCheck => 1.0,
    }
}

/// Small tanks swing faster and need attention more often.
pub fn volume_coefficient(volume_gallons: f64) -> f64 {
    if volume_gallons < 30.0 {
        0.8
    } else if volume_gallons < 75.0 {
        1.0
    } else if volume_gallons < 150.0 {
        1.1
    } else {
        1.2
    }
}

pub fn stocking_coefficient(level: StockingLevel) -> f64 {
    match level {
        StockingLevel::Light => 1.2,
        StockingLevel::Moderate => 1.0,
        StockingLevel::Heavy => 0.8,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub task: MaintenanceTask,
    pub interval_days: i64,
    pub last_done: Option<NaiveDate>,
    pub next_due: NaiveDate,
    pub is_overdue: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceSchedule {
    pub tank_id: String,
    pub entries: Vec<ScheduleEntry>,
}

impl MaintenanceSchedule {
    pub fn overdue(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter().filter(|e| e.is_overdue)
    }
}

pub fn interval_days(task: MaintenanceTask, volume_gallons: f64, stocking: StockingLevel) -> i64 {
    let scaled = base_interval_days(task) * volume_coefficient(volume_gallons) * stocking_coefficient(stocking);
    (scaled.round() as i64).max(1)
}

/// Builds the schedule for `tank` from its maintenance log.
///
/// `extra_events` lets callers fold in activity recorded elsewhere, such as
/// the dates of logged water tests.
pub fn generate_schedule(tank: &Tank, extra_events: &[MaintenanceEvent], today: NaiveDate) -> MaintenanceSchedule {
    let events: Vec<&MaintenanceEvent> = tank.maintenance_log.iter().chain(extra_events).collect();

    let entries = MaintenanceTask::ALL
        .into_iter()
        .map(|task| {
            let interval_days = interval_days(task, tank.volume_gallons, tank.stocking_level);
            let last_done = events
                .iter()
                .filter(|e| e.task() == Some(task))
                .filter_map(|e| e.date())
                .max();
            let next_due = last_done.map_or(today, |d| d + Duration::days(interval_days));
            ScheduleEntry {
                task,
                interval_days,
                last_done,
                next_due,
                is_overdue: next_due <= today,
            }
        })
        .collect();

    let schedule = MaintenanceSchedule {
        tank_id: tank.tank_id.clone(),
        entries,
    };
    debug!(tank = %tank.tank_id, overdue = schedule.overdue().count(), "generated maintenance schedule");
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use reefwatch_schemas::parameters::ParameterSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tank(volume: f64, stocking: StockingLevel, log: Vec<MaintenanceEvent>) -> Tank {
        Tank {
            tank_id: "TANK-01".to_string(),
            tank_name: "Display".to_string(),
            volume_gallons: volume,
            stocking_level: stocking,
            salt_mix_id: None,
            target_parameters: ParameterSet::new(),
            maintenance_log: log,
            notes: None,
        }
    }

    #[test]
    fn intervals_scale_by_both_coefficients() {
        assert_eq!(interval_days(MaintenanceTask::WaterChange, 50.0, StockingLevel::Moderate), 7);
        // 7 * 0.8 * 0.8 = 4.48
        assert_eq!(interval_days(MaintenanceTask::WaterChange, 20.0, StockingLevel::Heavy), 4);
        // 14 * 1.2 * 1.2 = 20.16
        assert_eq!(interval_days(MaintenanceTask::FilterMediaChange, 200.0, StockingLevel::Light), 20);
        // 1 * 0.8 * 0.8 rounds to 1, never 0
        assert_eq!(interval_days(MaintenanceTask::DosingCheck, 10.0, StockingLevel::Heavy), 1);
    }

    #[test]
    fn next_due_follows_the_latest_matching_event() {
        let log = vec![
            MaintenanceEvent::WaterChange { date: date(2024, 3, 1), percent: 10.0, salt_mix_id: None },
            MaintenanceEvent::WaterChange { date: date(2024, 3, 8), percent: 10.0, salt_mix_id: None },
            MaintenanceEvent::Unknown,
        ];
        let schedule = generate_schedule(&tank(50.0, StockingLevel::Moderate, log), &[], date(2024, 3, 10));

        let water_change = schedule.entries.iter().find(|e| e.task == MaintenanceTask::WaterChange).unwrap();
        assert_eq!(water_change.last_done, Some(date(2024, 3, 8)));
        assert_eq!(water_change.next_due, date(2024, 3, 15));
        assert!(!water_change.is_overdue);
    }

    #[test]
    fn never_done_tasks_are_due_today() {
        let today = date(2024, 3, 10);
        let schedule = generate_schedule(&tank(50.0, StockingLevel::Moderate, vec![]), &[], today);
        assert_eq!(schedule.entries.len(), MaintenanceTask::ALL.len());
        assert!(schedule.entries.iter().all(|e| e.next_due == today && e.is_overdue));
    }

    #[test]
    fn extra_events_count_towards_the_schedule() {
        let today = date(2024, 3, 10);
        let tests = [MaintenanceEvent::WaterTest { date: date(2024, 3, 9) }];
        let schedule = generate_schedule(&tank(50.0, StockingLevel::Moderate, vec![]), &tests, today);
        let water_test = schedule.entries.iter().find(|e| e.task == MaintenanceTask::WaterTest).unwrap();
        assert_eq!(water_test.next_due, date(2024, 3, 16));
        assert_eq!(schedule.overdue().count(), MaintenanceTask::ALL.len() - 1);
    }
}
