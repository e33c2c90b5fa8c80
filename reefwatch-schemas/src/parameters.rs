use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The ten water parameters tracked for every tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Ph,
    Salinity,
    Temperature,
    Ammonia,
    Nitrite,
    Nitrate,
    Kh,
    Calcium,
    Magnesium,
    Phosphate,
}

impl Parameter {
    pub const ALL: [Parameter; 10] = [
        Parameter::Ph,
        Parameter::Salinity,
        Parameter::Temperature,
        Parameter::Ammonia,
        Parameter::Nitrite,
        Parameter::Nitrate,
        Parameter::Kh,
        Parameter::Calcium,
        Parameter::Magnesium,
        Parameter::Phosphate,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Parameter::Ph => "ph",
            Parameter::Salinity => "salinity",
            Parameter::Temperature => "temperature",
            Parameter::Ammonia => "ammonia",
            Parameter::Nitrite => "nitrite",
            Parameter::Nitrate => "nitrate",
            Parameter::Kh => "kh",
            Parameter::Calcium => "calcium",
            Parameter::Magnesium => "magnesium",
            Parameter::Phosphate => "phosphate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Parameter::Ph => "pH",
            Parameter::Salinity => "Salinity",
            Parameter::Temperature => "Temperature",
            Parameter::Ammonia => "Ammonia",
            Parameter::Nitrite => "Nitrite",
            Parameter::Nitrate => "Nitrate",
            Parameter::Kh => "Alkalinity (KH)",
            Parameter::Calcium => "Calcium",
            Parameter::Magnesium => "Magnesium",
            Parameter::Phosphate => "Phosphate",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Parameter::Ph => "",
            Parameter::Salinity => "SG",
            Parameter::Temperature => "°F",
            Parameter::Kh => "dKH",
            _ => "ppm",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Parameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Parameter::ALL
            .into_iter()
            .find(|p| p.key() == needle)
            .or(match needle.as_str() {
                "alkalinity" | "dkh" => Some(Parameter::Kh),
                "temp" => Some(Parameter::Temperature),
                _ => None,
            })
            .ok_or_else(|| format!("unknown water parameter '{}'", s))
    }
}

/// One water test for one tank.
///
/// Numeric fields are optional because hobbyists rarely test everything at
/// once. Use [`WaterParameters::value`] to read a field; it hides non-finite
/// values so the analytics never have to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterParameters {
    pub id: String,
    pub tank_id: String,
    pub test_date: NaiveDate,
    pub ph: Option<f64>,
    pub salinity: Option<f64>,
    pub temperature: Option<f64>,
    pub ammonia: Option<f64>,
    pub nitrite: Option<f64>,
    pub nitrate: Option<f64>,
    pub kh: Option<f64>,
    pub calcium: Option<f64>,
    pub magnesium: Option<f64>,
    pub phosphate: Option<f64>,
    #[serde(default)]
    pub ai_insights: Option<String>,
}

impl WaterParameters {
    /// An empty test with every reading absent.
    pub fn new(id: impl Into<String>, tank_id: impl Into<String>, test_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            tank_id: tank_id.into(),
            test_date,
            ph: None,
            salinity: None,
            temperature: None,
            ammonia: None,
            nitrite: None,
            nitrate: None,
            kh: None,
            calcium: None,
            magnesium: None,
            phosphate: None,
            ai_insights: None,
        }
    }

    pub fn with(mut self, parameter: Parameter, value: f64) -> Self {
        *self.slot_mut(parameter) = Some(value);
        self
    }

    /// The reading for `parameter`, or `None` when absent or not a finite number.
    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        let raw = match parameter {
            Parameter::Ph => self.ph,
            Parameter::Salinity => self.salinity,
            Parameter::Temperature => self.temperature,
            Parameter::Ammonia => self.ammonia,
            Parameter::Nitrite => self.nitrite,
            Parameter::Nitrate => self.nitrate,
            Parameter::Kh => self.kh,
            Parameter::Calcium => self.calcium,
            Parameter::Magnesium => self.magnesium,
            Parameter::Phosphate => self.phosphate,
        };
        raw.filter(|v| v.is_finite())
    }

    fn slot_mut(&mut self, parameter: Parameter) -> &mut Option<f64> {
        match parameter {
            Parameter::Ph => &mut self.ph,
            Parameter::Salinity => &mut self.salinity,
            Parameter::Temperature => &mut self.temperature,
            Parameter::Ammonia => &mut self.ammonia,
            Parameter::Nitrite => &mut self.nitrite,
            Parameter::Nitrate => &mut self.nitrate,
            Parameter::Kh => &mut self.kh,
            Parameter::Calcium => &mut self.calcium,
            Parameter::Magnesium => &mut self.magnesium,
            Parameter::Phosphate => &mut self.phosphate,
        }
    }

    /// All present readings keyed by parameter.
    pub fn readings(&self) -> ParameterSet {
        Parameter::ALL
            .into_iter()
            .filter_map(|p| self.value(p).map(|v| (p, v)))
            .collect()
    }
}

/// A sparse set of parameter values, e.g. a tank's targets or a salt mix composition.
pub type ParameterSet = BTreeMap<Parameter, f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_hides_non_finite_readings() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let test = WaterParameters::new("t1", "tank", date)
            .with(Parameter::Ph, f64::NAN)
            .with(Parameter::Nitrate, 12.0);

        assert_eq!(test.value(Parameter::Ph), None);
        assert_eq!(test.value(Parameter::Nitrate), Some(12.0));
        assert_eq!(test.value(Parameter::Calcium), None);
        assert_eq!(test.readings().len(), 1);
    }

    #[test]
    fn parameters_parse_from_keys_and_aliases() {
        assert_eq!("nitrate".parse::<Parameter>(), Ok(Parameter::Nitrate));
        assert_eq!("pH".parse::<Parameter>(), Ok(Parameter::Ph));
        assert_eq!("alkalinity".parse::<Parameter>(), Ok(Parameter::Kh));
        assert!("chlorophyll".parse::<Parameter>().is_err());
    }

    #[test]
    fn parameter_sets_use_snake_case_keys() {
        let set: ParameterSet = serde_yaml::from_str("calcium: 420\nkh: 8.5\n").unwrap();
        assert_eq!(set.get(&Parameter::Calcium), Some(&420.0));
        assert_eq!(set.get(&Parameter::Kh), Some(&8.5));
    }
}
