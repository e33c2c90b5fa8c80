use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recurring upkeep tasks that the schedule generator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceTask {
    WaterChange,
    WaterTest,
    FilterMediaChange,
    GlassCleaning,
    SkimmerCleaning,
    DosingCheck,
}

impl MaintenanceTask {
    pub const ALL: [MaintenanceTask; 6] = [
        MaintenanceTask::WaterChange,
        MaintenanceTask::WaterTest,
        MaintenanceTask::FilterMediaChange,
        MaintenanceTask::GlassCleaning,
        MaintenanceTask::SkimmerCleaning,
        MaintenanceTask::DosingCheck,
    ];
}

impl fmt::Display for MaintenanceTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MaintenanceTask::WaterChange => "Water change",
            MaintenanceTask::WaterTest => "Water test",
            MaintenanceTask::FilterMediaChange => "Filter media change",
            MaintenanceTask::GlassCleaning => "Glass cleaning",
            MaintenanceTask::SkimmerCleaning => "Skimmer cleaning",
            MaintenanceTask::DosingCheck => "Dosing check",
        };
        f.write_str(name)
    }
}

/// A completed piece of maintenance recorded against a tank.
///
/// Kinds this build does not recognise deserialize to `Unknown` instead of
/// failing the whole tank file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaintenanceEvent {
    WaterChange {
        date: NaiveDate,
        percent: f64,
        salt_mix_id: Option<String>,
    },
    WaterTest {
        date: NaiveDate,
    },
    FilterMediaChange {
        date: NaiveDate,
        media: Option<String>,
    },
    GlassCleaning {
        date: NaiveDate,
    },
    SkimmerCleaning {
        date: NaiveDate,
    },
    Dosing {
        date: NaiveDate,
        additive: String,
        amount_ml: f64,
    },
    #[serde(other)]
    Unknown,
}

impl MaintenanceEvent {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            MaintenanceEvent::WaterChange { date, .. }
            | MaintenanceEvent::WaterTest { date }
            | MaintenanceEvent::FilterMediaChange { date, .. }
            | MaintenanceEvent::GlassCleaning { date }
            | MaintenanceEvent::SkimmerCleaning { date }
            | MaintenanceEvent::Dosing { date, .. } => Some(*date),
            MaintenanceEvent::Unknown => None,
        }
    }

    pub fn task(&self) -> Option<MaintenanceTask> {
        match self {
            MaintenanceEvent::WaterChange { .. } => Some(MaintenanceTask::WaterChange),
            MaintenanceEvent::WaterTest { .. } => Some(MaintenanceTask::WaterTest),
            MaintenanceEvent::FilterMediaChange { .. } => Some(MaintenanceTask::FilterMediaChange),
            MaintenanceEvent::GlassCleaning { .. } => Some(MaintenanceTask::GlassCleaning),
            MaintenanceEvent::SkimmerCleaning { .. } => Some(MaintenanceTask::SkimmerCleaning),
            MaintenanceEvent::Dosing { .. } => Some(MaintenanceTask::DosingCheck),
            MaintenanceEvent::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognised_event_kinds_fall_back_to_unknown() {
        let yaml = r#"
- type: water_change
  date: 2024-03-02
  percent: 15
  salt_mix_id: null
- type: coral_frag
  date: 2024-03-03
"#;
        let events: Vec<MaintenanceEvent> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].task(), Some(MaintenanceTask::WaterChange));
        assert_eq!(events[1], MaintenanceEvent::Unknown);
        assert_eq!(events[1].date(), None);
    }

    #[test]
    fn events_serialize_with_a_type_tag() {
        let event = MaintenanceEvent::GlassCleaning {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "glass_cleaning");
        assert_eq!(json["date"], "2024-05-01");
    }
}
