use reefwatch_schemas::parameters::Parameter;
use serde::Serialize;

/// Closed interval of acceptable values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Ideal and critical bands for a parameter in a reef tank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterRange {
    pub ideal: Band,
    pub critical: Band,
}

pub fn reference_range(parameter: Parameter) -> ParameterRange {
    let (ideal, critical) = match parameter {
        Parameter::Ph => (Band::new(8.0, 8.4), Band::new(7.8, 8.6)),
        Parameter::Salinity => (Band::new(1.024, 1.026), Band::new(1.020, 1.028)),
        Parameter::Temperature => (Band::new(76.0, 80.0), Band::new(72.0, 84.0)),
        Parameter::Ammonia => (Band::new(0.0, 0.0), Band::new(0.0, 0.25)),
        Parameter::Nitrite => (Band::new(0.0, 0.0), Band::new(0.0, 0.1)),
        Parameter::Nitrate => (Band::new(0.0, 20.0), Band::new(0.0, 40.0)),
        Parameter::Kh => (Band::new(8.0, 12.0), Band::new(6.0, 14.0)),
        Parameter::Calcium => (Band::new(380.0, 450.0), Band::new(350.0, 500.0)),
        Parameter::Magnesium => (Band::new(1250.0, 1400.0), Band::new(1150.0, 1500.0)),
        Parameter::Phosphate => (Band::new(0.0, 0.03), Band::new(0.0, 0.2)),
    };
    ParameterRange { ideal, critical }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterAlert {
    pub parameter: Parameter,
    pub level: AlertLevel,
    pub value: f64,
    pub message: String,
}

/// Classifies one reading against the reference table and the tank's own history.
///
/// `history` is `(average, std_dev)` over all of the tank's readings for the parameter.
pub fn classify(parameter: Parameter, value: f64, history: (f64, f64)) -> Option<ParameterAlert> {
    let range = reference_range(parameter);
    let (average, std_dev) = history;
    let label = parameter.label();
    let unit = parameter.unit();

    if !range.critical.contains(value) {
        return Some(ParameterAlert {
            parameter,
            level: AlertLevel::Critical,
            value,
            message: format!(
                "{} at {}{} is outside the safe range ({} - {}). Act immediately.",
                label,
                fmt_value(value),
                suffix(unit),
                fmt_value(range.critical.min),
                fmt_value(range.critical.max)
            ),
        });
    }

    if !range.ideal.contains(value) {
        return Some(ParameterAlert {
            parameter,
            level: AlertLevel::Warning,
            value,
            message: format!(
                "{} at {}{} is outside the ideal range ({} - {}).",
                label,
                fmt_value(value),
                suffix(unit),
                fmt_value(range.ideal.min),
                fmt_value(range.ideal.max)
            ),
        });
    }

    if std_dev > 0.0 && (value - average).abs() > 2.0 * std_dev {
        return Some(ParameterAlert {
            parameter,
            level: AlertLevel::Warning,
            value,
            message: format!(
                "{} at {}{} is unusual for this tank (average {}).",
                label,
                fmt_value(value),
                suffix(unit),
                fmt_value(average)
            ),
        });
    }

    None
}

fn suffix(unit: &str) -> String {
    if unit.is_empty() {
        String::new()
    } else {
        format!(" {}", unit)
    }
}

fn fmt_value(value: f64) -> String {
    let text = format!("{:.3}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ammonia_above_quarter_ppm_is_critical() {
        let alert = classify(Parameter::Ammonia, 0.5, (0.0, 0.0)).unwrap();
        assert_eq!(alert.level, AlertLevel::Critical);
        assert!(alert.message.contains("Ammonia at 0.5 ppm"));
    }

    #[test]
    fn trace_ammonia_is_a_warning() {
        let alert = classify(Parameter::Ammonia, 0.1, (0.0, 0.0)).unwrap();
        assert_eq!(alert.level, AlertLevel::Warning);
    }

    #[test]
    fn ideal_ph_without_deviation_is_quiet() {
        assert_eq!(classify(Parameter::Ph, 8.2, (8.2, 0.05)), None);
    }

    #[test]
    fn ideal_value_far_from_tank_history_warns() {
        let alert = classify(Parameter::Calcium, 440.0, (400.0, 5.0)).unwrap();
        assert_eq!(alert.level, AlertLevel::Warning);
        assert!(alert.message.contains("unusual"));
    }

    #[test]
    fn bands_are_inclusive() {
        let range = reference_range(Parameter::Nitrate);
        assert!(range.ideal.contains(20.0));
        assert!(!range.ideal.contains(20.01));
        assert!(range.critical.contains(40.0));
    }
}
