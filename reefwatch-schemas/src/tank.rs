use crate::{maintenance::MaintenanceEvent, parameters::ParameterSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockingLevel {
    Light,
    #[default]
    Moderate,
    Heavy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tank {
    pub tank_id: String,
    pub tank_name: String,
    pub volume_gallons: f64,
    #[serde(default)]
    pub stocking_level: StockingLevel,
    pub salt_mix_id: Option<String>,
    #[serde(default)]
    pub target_parameters: ParameterSet,
    #[serde(default)]
    pub maintenance_log: Vec<MaintenanceEvent>,
    pub notes: Option<String>,
}
